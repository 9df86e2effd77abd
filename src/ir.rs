//! Intermediate representation records
//!
//! What a generation run hands to an emitter. Records are created once,
//! appended, sorted once and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::codegen::types::TypeExpr;
use crate::schema::HttpMethod;

/// A single model property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_expr: TypeExpr,
    #[serde(default)]
    pub required: bool,
}

/// A discovered or synthesized model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    /// Registry key
    pub name: String,
    /// Declared class name, `Result<T>` for generic wrappers
    pub class_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: Vec<PropertyDefinition>,
}

impl ModelDefinition {
    pub fn is_generic(&self) -> bool {
        self.class_name != self.name
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDefinition> {
        self.properties.iter().find(|p| p.name == name)
    }
}

/// Call style the emitter renders for an operation.
///
/// `Download` replaces the verb whenever no response type resolved, so the
/// client treats the body as a file/blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
    Download,
}

impl From<HttpMethod> for OperationMethod {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => OperationMethod::Get,
            HttpMethod::Put => OperationMethod::Put,
            HttpMethod::Post => OperationMethod::Post,
            HttpMethod::Delete => OperationMethod::Delete,
            HttpMethod::Options => OperationMethod::Options,
            HttpMethod::Head => OperationMethod::Head,
            HttpMethod::Patch => OperationMethod::Patch,
        }
    }
}

impl fmt::Display for OperationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OperationMethod::Get => "get",
            OperationMethod::Put => "put",
            OperationMethod::Post => "post",
            OperationMethod::Delete => "delete",
            OperationMethod::Options => "options",
            OperationMethod::Head => "head",
            OperationMethod::Patch => "patch",
            OperationMethod::Download => "download",
        };
        f.write_str(s)
    }
}

/// One resolved path + verb
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationDefinition {
    pub api_name: String,
    pub path: String,
    pub method: OperationMethod,
    pub name: String,
    pub full_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_type: Option<TypeExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params_required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<TypeExpr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_required: Option<bool>,
    pub return_type: TypeExpr,
    pub has_body: bool,
    pub has_args: bool,
    pub has_return: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_serializes_camel_case() {
        let op = OperationDefinition {
            api_name: "user".to_string(),
            path: "/user/get".to_string(),
            method: OperationMethod::Download,
            name: "get".to_string(),
            full_name: "user_get".to_string(),
            summary: None,
            params_type: None,
            params_required: None,
            data_type: None,
            data_required: None,
            return_type: TypeExpr::void(),
            has_body: false,
            has_args: false,
            has_return: false,
        };
        let value = serde_json::to_value(&op).unwrap();
        assert_eq!(value["apiName"], json!("user"));
        assert_eq!(value["method"], json!("download"));
        assert_eq!(value["returnType"], json!("void"));
        assert!(value.get("paramsType").is_none());
    }

    #[test]
    fn test_generic_model() {
        let model = ModelDefinition {
            name: "Result".to_string(),
            class_name: "Result<T>".to_string(),
            description: None,
            properties: vec![],
        };
        assert!(model.is_generic());
    }
}
