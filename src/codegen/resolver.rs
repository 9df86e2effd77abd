//! Type Resolution
//!
//! Converts schema nodes into [`TypeExpr`] trees, registering every object
//! definition it walks into the run's [`ModelRegistry`].
//!
//! All mutable state lives in [`ResolveContext`], passed explicitly through
//! every call. The context tracks which definitions are currently being
//! resolved; meeting one of them again returns its canonical expression
//! without descending, so any reference cycle terminates, not only direct
//! self-reference.

use std::collections::{BTreeMap, HashSet};

use tracing::{debug, warn};

use crate::ir::{ModelDefinition, PropertyDefinition};
use crate::registry::ModelRegistry;
use crate::schema::{ref_key, AdditionalProperties, Schema, SwaggerDocument, DEFINITIONS_PREFIX};

use super::builtin::{convert_builtin_type, Builtin};
use super::diagnostics::Diagnostics;
use super::types::{extract_generic_names, is_generic_key, TypeExpr};

// =============================================================================
// Resolve Context
// =============================================================================

/// Mutable state of one generation run
#[derive(Debug, Default)]
pub struct ResolveContext {
    pub registry: ModelRegistry,
    pub diagnostics: Diagnostics,
    /// Definition keys being resolved, innermost last
    in_progress: Vec<String>,
    /// Definition keys already walked to completion
    resolved: HashSet<String>,
}

impl ResolveContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `key` is on the current resolution stack
    pub fn is_in_progress(&self, key: &str) -> bool {
        self.in_progress.iter().any(|k| k == key)
    }

    /// Depth of the current resolution stack
    pub fn depth(&self) -> usize {
        self.in_progress.len()
    }

    fn subject(&self, fallback: &str) -> String {
        self.in_progress.last().cloned().unwrap_or_else(|| fallback.to_string())
    }
}

// =============================================================================
// Generic Definitions
// =============================================================================

/// What a generic definition key (`Result«List«User»»`) encodes
#[derive(Debug, Clone, PartialEq)]
struct GenericKey {
    model_name: String,
    class_name: String,
    /// Top-level type arguments as parsed from the key
    args: Vec<TypeExpr>,
    /// Every identifier inside the key except the model itself
    names: HashSet<String>,
}

impl GenericKey {
    fn parse(key: &str) -> Option<Self> {
        if !is_generic_key(key) {
            return None;
        }
        let open = key.find(|c: char| c == '«' || c == '<')?;
        let model_name = key[..open].trim().to_string();
        let args = match TypeExpr::parse(key, None) {
            TypeExpr::Generic { params, .. } => params,
            _ => Vec::new(),
        };
        let names = extract_generic_names(key)
            .into_iter()
            .filter(|n| *n != model_name)
            .collect();
        Some(Self {
            class_name: format!("{}<T>", model_name),
            model_name,
            args,
            names,
        })
    }

    fn substitute(&self, expr: TypeExpr) -> TypeExpr {
        expr.substitute_placeholder(&self.args, &self.names)
    }
}

// =============================================================================
// Type Resolver
// =============================================================================

/// Resolves schema nodes of one document
pub struct TypeResolver<'a> {
    document: &'a SwaggerDocument,
    /// Generic class name -> property forced to the `T` placeholder
    generic_wrappers: &'a BTreeMap<String, String>,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        document: &'a SwaggerDocument,
        generic_wrappers: &'a BTreeMap<String, String>,
    ) -> Self {
        Self {
            document,
            generic_wrappers,
        }
    }

    /// The document references are resolved against
    pub fn document(&self) -> &'a SwaggerDocument {
        self.document
    }

    /// Resolve a schema that may be either a `$ref` or an inline shape
    pub fn resolve_schema_type(
        &self,
        schema: &Schema,
        ctx: &mut ResolveContext,
    ) -> Option<TypeExpr> {
        match &schema.reference {
            Some(reference) => Some(self.resolve_reference_type(reference, ctx)),
            None => self.resolve_schema_object_type(schema, ctx),
        }
    }

    /// Resolve an inline schema from its declared `type`/`format`.
    ///
    /// Returns `None` when no type is declared or the type is not a builtin
    /// (`file`, for instance).
    pub fn resolve_schema_object_type(
        &self,
        schema: &Schema,
        ctx: &mut ResolveContext,
    ) -> Option<TypeExpr> {
        let type_name = schema.type_name.as_deref()?;
        let Some(builtin) = convert_builtin_type(Some(type_name), schema.format.as_deref()) else {
            debug!(type_name, "no builtin for declared type");
            return None;
        };
        let expr = TypeExpr::from_builtin(builtin);
        Some(match &schema.items {
            Some(items) => expr.with_items(self.resolve_items_type(items, ctx)),
            None => expr,
        })
    }

    /// Resolve an items descriptor: builtin first, then `$ref`, wrapping
    /// nested `items` as the element type
    pub fn resolve_items_type(&self, item: &Schema, ctx: &mut ResolveContext) -> TypeExpr {
        let expr = match convert_builtin_type(item.type_name.as_deref(), item.format.as_deref()) {
            Some(builtin) => TypeExpr::from_builtin(builtin),
            None => match &item.reference {
                Some(reference) => self.resolve_reference_type(reference, ctx),
                None => TypeExpr::any(),
            },
        };
        match &item.items {
            Some(inner) => expr.with_items(self.resolve_items_type(inner, ctx)),
            None => expr,
        }
    }

    /// Resolve a `$ref`, registering the definition it names.
    ///
    /// Returns the canonical expression for the reference: `User`,
    /// `Result<User>`, or a builtin for definitions named after one. Missing
    /// definitions yield [`TypeExpr::Unresolved`].
    pub fn resolve_reference_type(&self, reference: &str, ctx: &mut ResolveContext) -> TypeExpr {
        let key = ref_key(reference);
        let Some(definition) = self.document.definition(reference) else {
            warn!(reference, "reference target not found");
            let subject = ctx.subject(reference);
            ctx.diagnostics.unresolved_ref(subject, reference);
            return TypeExpr::Unresolved(reference.to_string());
        };

        let canonical = TypeExpr::parse(key, None);
        if ctx.resolved.contains(key) || ctx.is_in_progress(key) {
            return canonical;
        }

        debug!(key, depth = ctx.depth(), "resolving definition");
        let generic = GenericKey::parse(key);
        let (model_name, class_name) = match &generic {
            Some(g) => (g.model_name.clone(), g.class_name.clone()),
            None => (key.to_string(), key.to_string()),
        };
        let payload_field = self.generic_wrappers.get(&class_name);

        ctx.in_progress.push(key.to_string());
        let mut properties = Vec::with_capacity(definition.properties.len());
        for (name, property) in &definition.properties {
            let mut type_expr = self.resolve_property_type(key, property, generic.as_ref(), ctx);
            if payload_field.is_some_and(|field| field == name) {
                type_expr = TypeExpr::placeholder();
            }
            properties.push(PropertyDefinition {
                name: name.clone(),
                description: property.description.clone(),
                type_expr,
                required: definition.is_required(name),
            });
        }
        ctx.in_progress.pop();
        ctx.resolved.insert(key.to_string());

        // Definitions named after a builtin stay builtins and keep their
        // arguments: `Map«string,Tag»` is `Record<string, Tag>`, not a bare
        // `Record`, since the tree has a slot for them.
        if !Builtin::is_builtin(&model_name) {
            ctx.registry.add_if_absent(ModelDefinition {
                name: model_name.clone(),
                class_name,
                description: definition.description.clone(),
                properties,
            });
        }

        // type arguments named in the key are models in their own right
        for name in canonical.model_names().into_iter().filter(|n| *n != model_name) {
            if self.document.definitions.contains_key(name) {
                self.resolve_reference_type(&format!("{}{}", DEFINITIONS_PREFIX, name), ctx);
            }
        }

        canonical
    }

    /// Type of one property of the definition `owner`
    fn resolve_property_type(
        &self,
        owner: &str,
        property: &Schema,
        generic: Option<&GenericKey>,
        ctx: &mut ResolveContext,
    ) -> TypeExpr {
        if let (None, Some(reference)) = (&property.type_name, &property.reference) {
            // a direct self-reference is the generic slot, never expanded
            if ref_key(reference) == owner {
                return TypeExpr::placeholder();
            }
            let expr = self.resolve_reference_type(reference, ctx);
            return match generic {
                Some(g) => g.substitute(expr),
                None => expr,
            };
        }

        let additional = property
            .additional_properties
            .as_ref()
            .filter(|a| !matches!(a, AdditionalProperties::Allowed(false)));
        if let Some(additional) = additional {
            // Map values are resolved so their models get registered, but the
            // value type is not carried into the property type.
            if let Some(values) = additional.schema() {
                let nested = values
                    .items
                    .as_ref()
                    .and_then(|items| items.reference.as_deref())
                    .or(values.reference.as_deref());
                if let Some(reference) = nested.filter(|r| ref_key(r) != owner) {
                    self.resolve_reference_type(reference, ctx);
                }
            }
            return match generic {
                Some(_) => TypeExpr::placeholder(),
                None => self.own_type(property, ctx),
            };
        }

        if let Some(items) = &property.items {
            if let Some(reference) = &items.reference {
                let element = self.resolve_reference_type(reference, ctx);
                let expr = TypeExpr::Array(Box::new(element));
                return match generic {
                    Some(g) => g.substitute(expr),
                    None => expr,
                };
            }
            if generic.is_some() && items.type_name.as_deref() == Some("any") {
                return TypeExpr::placeholder();
            }
        }

        self.own_type(property, ctx)
    }

    /// A property's own scalar/array type; untyped properties are `any`
    fn own_type(&self, property: &Schema, ctx: &mut ResolveContext) -> TypeExpr {
        self.resolve_schema_object_type(property, ctx)
            .unwrap_or_else(TypeExpr::any)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn document(definitions: serde_json::Value) -> SwaggerDocument {
        let value = json!({ "swagger": "2.0", "paths": {}, "definitions": definitions });
        SwaggerDocument::from_str(&value.to_string()).unwrap()
    }

    fn wrappers() -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        map.insert("Result<T>".to_string(), "result".to_string());
        map
    }

    #[test]
    fn test_simple_reference() {
        let doc = document(json!({
            "User": {
                "properties": {
                    "id": { "type": "integer", "format": "int64" },
                    "name": { "type": "string" }
                },
                "required": ["id"]
            }
        }));
        let wrappers = wrappers();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        let expr = resolver.resolve_reference_type("#/definitions/User", &mut ctx);
        assert_eq!(expr.to_string(), "User");

        let user = ctx.registry.get("User").unwrap();
        assert_eq!(user.class_name, "User");
        assert_eq!(user.properties[0].type_expr.to_string(), "number");
        assert!(user.properties[0].required);
        assert!(!user.properties[1].required);
    }

    #[test]
    fn test_generic_reference() {
        let doc = document(json!({
            "Result«User»": {
                "properties": {
                    "code": { "type": "integer" },
                    "data": { "$ref": "#/definitions/User" }
                }
            },
            "User": { "properties": { "id": { "type": "integer" } } }
        }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        let expr = resolver.resolve_reference_type("#/definitions/Result«User»", &mut ctx);
        assert_eq!(expr.to_string(), "Result<User>");

        let result = ctx.registry.get("Result").unwrap();
        assert_eq!(result.class_name, "Result<T>");
        assert_eq!(result.property("data").unwrap().type_expr, TypeExpr::placeholder());
        assert_eq!(result.property("code").unwrap().type_expr.to_string(), "number");
        assert!(ctx.registry.contains("User"));
    }

    #[test]
    fn test_generic_list_items_become_placeholder() {
        let doc = document(json!({
            "Page«Order»": {
                "properties": {
                    "records": { "type": "array", "items": { "$ref": "#/definitions/Order" } },
                    "total": { "type": "integer" }
                }
            },
            "Order": { "properties": { "no": { "type": "string" } } }
        }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        resolver.resolve_reference_type("#/definitions/Page«Order»", &mut ctx);
        let page = ctx.registry.get("Page").unwrap();
        assert_eq!(page.property("records").unwrap().type_expr.to_string(), "Array<T>");
        assert!(ctx.registry.contains("Order"));
    }

    #[test]
    fn test_result_payload_override() {
        let doc = document(json!({
            "Result«List«User»»": {
                "properties": {
                    "result": { "type": "object" },
                    "message": { "type": "string" }
                }
            },
            "User": {}
        }));
        let wrappers = wrappers();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        let expr =
            resolver.resolve_reference_type("#/definitions/Result«List«User»»", &mut ctx);
        assert_eq!(expr.to_string(), "Result<Array<User>>");
        let result = ctx.registry.get("Result").unwrap();
        assert_eq!(result.property("result").unwrap().type_expr, TypeExpr::placeholder());
        assert_eq!(result.property("message").unwrap().type_expr.to_string(), "string");
        // User only appears as a type argument and is still registered
        assert!(ctx.registry.contains("User"));
    }

    #[test]
    fn test_direct_self_reference() {
        let doc = document(json!({
            "Node": {
                "properties": {
                    "parent": { "$ref": "#/definitions/Node" },
                    "children": { "type": "array", "items": { "$ref": "#/definitions/Node" } }
                }
            }
        }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        resolver.resolve_reference_type("#/definitions/Node", &mut ctx);
        assert_eq!(ctx.registry.len(), 1);
        let node = ctx.registry.get("Node").unwrap();
        assert_eq!(node.property("parent").unwrap().type_expr, TypeExpr::placeholder());
        assert_eq!(node.property("children").unwrap().type_expr.to_string(), "Array<Node>");
        assert_eq!(ctx.depth(), 0);
    }

    #[test]
    fn test_mutual_reference_terminates() {
        let doc = document(json!({
            "Department": { "properties": { "manager": { "$ref": "#/definitions/Employee" } } },
            "Employee": {
                "properties": {
                    "department": { "$ref": "#/definitions/Department" },
                    "reports": { "type": "array", "items": { "$ref": "#/definitions/Employee" } }
                }
            }
        }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        resolver.resolve_reference_type("#/definitions/Department", &mut ctx);
        assert_eq!(ctx.registry.len(), 2);
        let employee = ctx.registry.get("Employee").unwrap();
        assert_eq!(employee.property("department").unwrap().type_expr.to_string(), "Department");
        assert_eq!(employee.property("reports").unwrap().type_expr.to_string(), "Array<Employee>");
    }

    #[test]
    fn test_unresolved_reference_propagates() {
        let doc = document(json!({
            "Order": {
                "properties": {
                    "items": { "type": "array", "items": { "$ref": "#/definitions/Missing" } }
                }
            }
        }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        resolver.resolve_reference_type("#/definitions/Order", &mut ctx);
        let order = ctx.registry.get("Order").unwrap();
        let items = &order.property("items").unwrap().type_expr;
        assert!(items.is_unresolved());
        assert_eq!(items.to_string(), "Array<>");
        assert_eq!(ctx.diagnostics.len(), 1);
        assert_eq!(ctx.diagnostics.all()[0].subject, "Order");

        let top = resolver.resolve_reference_type("#/definitions/Nope", &mut ctx);
        assert_eq!(top, TypeExpr::Unresolved("#/definitions/Nope".to_string()));
    }

    #[test]
    fn test_builtin_named_definition_is_not_registered() {
        let doc = document(json!({
            "Map«string,User»": { "properties": {} },
            "User": {}
        }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        let expr = resolver.resolve_reference_type("#/definitions/Map«string,User»", &mut ctx);
        assert_eq!(expr.to_string(), "Record<string, User>");
        assert!(!ctx.registry.contains("Map"));
        assert!(ctx.registry.contains("User"));
    }

    #[test]
    fn test_canonical_builtin_named_definition() {
        let doc = document(json!({
            "Record": { "properties": { "id": { "type": "integer" } } }
        }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        // reads as the builtin everywhere, so it never becomes an unreachable model
        let expr = resolver.resolve_reference_type("#/definitions/Record", &mut ctx);
        assert_eq!(expr.to_string(), "Record<string, any>");
        assert!(ctx.registry.is_empty());
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_additional_properties_registers_nested_model() {
        let doc = document(json!({
            "Catalog": {
                "properties": {
                    "byTag": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "array",
                            "items": { "$ref": "#/definitions/Tag" }
                        }
                    }
                }
            },
            "Box«Tag»": {
                "properties": {
                    "byTag": {
                        "type": "object",
                        "additionalProperties": {
                            "type": "array",
                            "items": { "$ref": "#/definitions/Tag" }
                        }
                    }
                }
            },
            "Tag": { "properties": { "label": { "type": "string" } } }
        }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        resolver.resolve_reference_type("#/definitions/Catalog", &mut ctx);
        assert!(ctx.registry.contains("Tag"));
        let catalog = ctx.registry.get("Catalog").unwrap();
        assert_eq!(catalog.property("byTag").unwrap().type_expr.to_string(), "any");

        resolver.resolve_reference_type("#/definitions/Box«Tag»", &mut ctx);
        let boxed = ctx.registry.get("Box").unwrap();
        assert_eq!(boxed.property("byTag").unwrap().type_expr, TypeExpr::placeholder());
    }

    #[test]
    fn test_items_types() {
        let doc = document(json!({ "User": {} }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        let nested: Schema = serde_json::from_value(json!({
            "type": "array",
            "items": { "type": "array", "items": { "$ref": "#/definitions/User" } }
        }))
        .unwrap();
        assert_eq!(
            resolver.resolve_items_type(&nested, &mut ctx).to_string(),
            "Array<Array<User>>"
        );

        let date: Schema =
            serde_json::from_value(json!({ "type": "string", "format": "date-time" })).unwrap();
        assert_eq!(resolver.resolve_items_type(&date, &mut ctx).to_string(), "number");

        let file = Schema::typed("file");
        assert_eq!(resolver.resolve_schema_object_type(&file, &mut ctx), None);
    }

    #[test]
    fn test_repeat_resolution_is_noop() {
        let doc = document(json!({ "User": { "properties": { "id": { "type": "integer" } } } }));
        let wrappers = BTreeMap::new();
        let resolver = TypeResolver::new(&doc, &wrappers);
        let mut ctx = ResolveContext::new();

        let first = resolver.resolve_reference_type("#/definitions/User", &mut ctx);
        let second = resolver.resolve_reference_type("#/definitions/User", &mut ctx);
        assert_eq!(first, second);
        assert_eq!(ctx.registry.len(), 1);
    }
}
