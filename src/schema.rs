//! Source document types
//!
//! A typed, read-only view of a Swagger 2.0 document. Only the subset the
//! resolver walks is modelled; unknown keys are ignored on deserialization.
//! Every map is an [`IndexMap`] so iteration follows document order, which
//! is the order operations and properties are discovered in.

use std::fmt;
use std::path::Path;

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};

use crate::checksum::Checksum;
use crate::error::{CodegenError, Result};

/// Prefix every local definition reference carries
pub const DEFINITIONS_PREFIX: &str = "#/definitions/";

/// Prefix of references to shared parameters
pub const PARAMETERS_PREFIX: &str = "#/parameters/";

/// Strip the document-relative prefix from a `$ref`, yielding the definition key
pub fn ref_key(reference: &str) -> &str {
    reference.strip_prefix(DEFINITIONS_PREFIX).unwrap_or(reference)
}

/// A loaded Swagger document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwaggerDocument {
    /// Declared Swagger version (e.g. "2.0")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swagger: Option<String>,
    /// Present on OpenAPI 3 documents, which must be converted before loading
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub openapi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<Info>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,
    /// Request path -> per-verb operations
    #[serde(default)]
    pub paths: IndexMap<String, PathItem>,
    /// Definition key -> schema
    #[serde(default)]
    pub definitions: IndexMap<String, Schema>,
    /// Shared parameters operations may `$ref`
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub parameters: IndexMap<String, Parameter>,
    /// Fingerprint of the bytes this document was parsed from
    #[serde(skip)]
    pub checksum: Option<Checksum>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Info {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl SwaggerDocument {
    /// Load a document from a local JSON file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_slice(&bytes)
    }

    /// Parse a document from raw JSON bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let mut doc: SwaggerDocument = serde_json::from_slice(bytes)?;
        doc.check_version()?;
        doc.checksum = Some(Checksum::from_bytes(bytes));
        Ok(doc)
    }

    /// Parse a document from a JSON string
    pub fn from_str(content: &str) -> Result<Self> {
        Self::from_slice(content.as_bytes())
    }

    /// Reject documents the resolver cannot walk.
    ///
    /// Documents that declare no version at all are accepted as 2.0.
    fn check_version(&self) -> Result<()> {
        if let Some(openapi) = &self.openapi {
            return Err(CodegenError::UnsupportedVersion(format!("openapi {}", openapi)));
        }
        match self.swagger.as_deref() {
            Some(v) if v == "2" || v.starts_with("2.") => Ok(()),
            Some(v) => Err(CodegenError::UnsupportedVersion(format!("swagger {}", v))),
            None => Ok(()),
        }
    }

    /// Look up the definition a `$ref` points at
    pub fn definition(&self, reference: &str) -> Option<&Schema> {
        self.definitions.get(ref_key(reference))
    }

    /// Follow a parameter entry to its declaration.
    ///
    /// `None` when a `$ref` does not name a shared parameter.
    pub fn parameter<'a>(&'a self, entry: &'a ParameterOrRef) -> Option<&'a Parameter> {
        match entry {
            ParameterOrRef::Parameter(parameter) => Some(parameter),
            ParameterOrRef::Ref { reference } => reference
                .strip_prefix(PARAMETERS_PREFIX)
                .and_then(|name| self.parameters.get(name)),
        }
    }
}

/// Operations available on one request path
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PathItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub get: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub put: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub head: Option<Operation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<Operation>,
}

impl PathItem {
    /// The operation declared for `method`, if any
    pub fn operation(&self, method: HttpMethod) -> Option<&Operation> {
        match method {
            HttpMethod::Get => self.get.as_ref(),
            HttpMethod::Put => self.put.as_ref(),
            HttpMethod::Post => self.post.as_ref(),
            HttpMethod::Delete => self.delete.as_ref(),
            HttpMethod::Options => self.options.as_ref(),
            HttpMethod::Head => self.head.as_ref(),
            HttpMethod::Patch => self.patch.as_ref(),
        }
    }
}

/// HTTP verbs a path item can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    Get,
    Put,
    Post,
    Delete,
    Options,
    Head,
    Patch,
}

impl HttpMethod {
    pub const ALL: [HttpMethod; 7] = [
        HttpMethod::Get,
        HttpMethod::Put,
        HttpMethod::Post,
        HttpMethod::Delete,
        HttpMethod::Options,
        HttpMethod::Head,
        HttpMethod::Patch,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "get",
            HttpMethod::Put => "put",
            HttpMethod::Post => "post",
            HttpMethod::Delete => "delete",
            HttpMethod::Options => "options",
            HttpMethod::Head => "head",
            HttpMethod::Patch => "patch",
        }
    }

    /// Read-only verbs never carry a request body
    pub fn is_read_only(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Options)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single operation under a path + verb
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ParameterOrRef>,
    #[serde(default)]
    pub responses: IndexMap<String, Response>,
}

impl Operation {
    /// The `200` response
    pub fn success_response(&self) -> Option<&Response> {
        self.responses.get("200")
    }
}

/// Where a parameter travels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ParameterLocation {
    Query,
    Body,
    Path,
    Header,
    FormData,
}

/// An operation's parameter entry: inline, or a reference to a shared one
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParameterOrRef {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Parameter(Parameter),
}

/// An operation parameter.
///
/// Non-body parameters describe their type inline (`type`, `format`,
/// `items`); body parameters carry a `schema`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "in")]
    pub location: ParameterLocation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Schema>,
}

impl Parameter {
    /// View the inline type description as an items-style schema node
    pub fn as_items(&self) -> Schema {
        Schema {
            type_name: self.type_name.clone(),
            format: self.format.clone(),
            items: self.items.clone(),
            ..Schema::default()
        }
    }
}

/// A response: either a reference or an inline object with an optional schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Response {
    Ref {
        #[serde(rename = "$ref")]
        reference: String,
    },
    Object {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        schema: Option<Schema>,
    },
}

/// A schema node: a scalar/array/object shape, a `$ref`, or an items descriptor
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<AdditionalProperties>,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,
    /// Required property names. A per-property `required: true` flag, as
    /// loose documents write it, is accepted and ignored.
    #[serde(
        default,
        deserialize_with = "required_names",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub required: Vec<String>,
}

fn required_names<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Required {
        Names(Vec<String>),
        Flag(bool),
    }

    Ok(match Required::deserialize(deserializer)? {
        Required::Names(names) => names,
        Required::Flag(_) => Vec::new(),
    })
}

impl Schema {
    /// A bare `type` node
    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    pub fn is_required(&self, property: &str) -> bool {
        self.required.iter().any(|r| r == property)
    }
}

/// `additionalProperties`: either a flag or a schema for the map values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AdditionalProperties {
    Allowed(bool),
    Schema(Box<Schema>),
}

impl AdditionalProperties {
    pub fn schema(&self) -> Option<&Schema> {
        match self {
            AdditionalProperties::Allowed(_) => None,
            AdditionalProperties::Schema(schema) => Some(schema),
        }
    }
}
