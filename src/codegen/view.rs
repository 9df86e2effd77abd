//! Emitter view data
//!
//! Template-ready projections of an [`Ir`]. Type expressions are rendered to
//! strings here, qualified with the model namespace, and every list item
//! carries `-first` / `-last` markers for separator handling in logic-less
//! templates. The IR itself is never touched.

use serde::Serialize;

use crate::ir::{ModelDefinition, OperationDefinition, OperationMethod, PropertyDefinition};

use super::types::TypeExpr;
use super::Ir;

// =============================================================================
// Positional Markers
// =============================================================================

/// A list item with its position flags flattened alongside its fields
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marked<T> {
    #[serde(flatten)]
    pub item: T,
    #[serde(rename = "-first")]
    pub first: bool,
    #[serde(rename = "-last")]
    pub last: bool,
}

/// A list whose items know whether they are first or last
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ViewList<T>(Vec<Marked<T>>);

impl<T> ViewList<T> {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Marked<T>> {
        self.0.iter()
    }
}

impl<T> FromIterator<T> for ViewList<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let items: Vec<T> = iter.into_iter().collect();
        let last = items.len().saturating_sub(1);
        ViewList(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| Marked {
                    item,
                    first: i == 0,
                    last: i == last,
                })
                .collect(),
        )
    }
}

// =============================================================================
// Views
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyView {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub type_name: String,
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelView {
    pub name: String,
    pub class_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub properties: ViewList<PropertyView>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationView {
    pub api_name: String,
    pub path: String,
    pub method: OperationMethod,
    pub name: String,
    pub full_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params_required: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_required: Option<bool>,
    pub return_type: String,
    pub has_body: bool,
    pub has_args: bool,
    pub has_return: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRef {
    pub name: String,
}

/// Data for one api group file
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiView {
    pub api: ApiRef,
    pub operations: ViewList<OperationView>,
}

/// Data for the api index file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexView {
    pub base_name: String,
    pub apis: ViewList<ApiRef>,
}

/// Everything an emitter renders from one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmitterView {
    pub index: IndexView,
    pub apis: Vec<ApiView>,
    pub models: ViewList<ModelView>,
}

impl EmitterView {
    /// Project `ir`, qualifying model names with `namespace`
    pub fn from_ir(ir: &Ir, namespace: Option<&str>) -> Self {
        let apis = ir
            .api_groups()
            .into_iter()
            .map(|(name, operations)| ApiView {
                api: ApiRef { name: name.to_string() },
                operations: operations
                    .into_iter()
                    .map(|op| operation_view(op, namespace))
                    .collect(),
            })
            .collect();

        Self {
            index: IndexView {
                base_name: ir.base_name.clone().unwrap_or_default(),
                apis: ir.apis.iter().map(|name| ApiRef { name: name.clone() }).collect(),
            },
            apis,
            models: ir.models.iter().map(|m| model_view(m, namespace)).collect(),
        }
    }
}

fn render(expr: &TypeExpr, namespace: Option<&str>) -> String {
    expr.render(namespace)
}

fn property_view(property: &PropertyDefinition, namespace: Option<&str>) -> PropertyView {
    PropertyView {
        name: property.name.clone(),
        description: property.description.clone(),
        type_name: render(&property.type_expr, namespace),
        required: property.required,
    }
}

fn model_view(model: &ModelDefinition, namespace: Option<&str>) -> ModelView {
    ModelView {
        name: model.name.clone(),
        class_name: model.class_name.clone(),
        description: model.description.clone(),
        properties: model.properties.iter().map(|p| property_view(p, namespace)).collect(),
    }
}

fn operation_view(op: &OperationDefinition, namespace: Option<&str>) -> OperationView {
    OperationView {
        api_name: op.api_name.clone(),
        path: op.path.clone(),
        method: op.method,
        name: op.name.clone(),
        full_name: op.full_name.clone(),
        summary: op.summary.clone(),
        params_type: op.params_type.as_ref().map(|t| render(t, namespace)),
        params_required: op.params_required,
        data_type: op.data_type.as_ref().map(|t| render(t, namespace)),
        data_required: op.data_required,
        return_type: render(&op.return_type, namespace),
        has_body: op.has_body,
        has_args: op.has_args,
        has_return: op.has_return,
    }
}
