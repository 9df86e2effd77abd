//! Operation Builder
//!
//! Turns one path + verb of the document into an [`OperationDefinition`]:
//! query parameters are folded into a synthesized `<Name>Params` model, the
//! first body parameter becomes the request data, and the `200` response
//! becomes the return type.

use tracing::{debug, warn};

use crate::ir::{ModelDefinition, OperationDefinition, OperationMethod, PropertyDefinition};
use crate::schema::{
    HttpMethod, Operation, Parameter, ParameterLocation, ParameterOrRef, Response,
};

use super::names::{capitalize_first, NameResolver};
use super::resolver::{ResolveContext, TypeResolver};
use super::types::TypeExpr;

/// A resolved type plus whether the caller must supply it
#[derive(Debug, Clone, PartialEq)]
pub struct TypedArg {
    pub type_expr: TypeExpr,
    pub required: bool,
}

/// Builds operation records for one document
pub struct OperationBuilder<'a> {
    resolver: TypeResolver<'a>,
    names: &'a NameResolver,
    base_url: Option<&'a str>,
}

impl<'a> OperationBuilder<'a> {
    pub fn new(
        resolver: TypeResolver<'a>,
        names: &'a NameResolver,
        base_url: Option<&'a str>,
    ) -> Self {
        Self {
            resolver,
            names,
            base_url: base_url.filter(|u| !u.is_empty()),
        }
    }

    /// Resolve a single path + verb
    pub fn build(
        &self,
        path: &str,
        method: HttpMethod,
        operation: &Operation,
        ctx: &mut ResolveContext,
    ) -> OperationDefinition {
        let api_name = self.names.api_name(path);
        let name = self.names.operation_name(path);
        debug!(path, %method, api = %api_name, "building operation");

        let parameters = self.parameters(path, operation, ctx);
        let params = self.resolve_params_type(path, &name, operation, &parameters, ctx);
        let data = self.resolve_data_type(path, &parameters, ctx);
        let return_type = self.resolve_return_type(path, operation, ctx);

        let has_args = params.is_some() || data.as_ref().is_some_and(|d| d.type_expr.is_some());
        let has_body = !method.is_read_only();
        let has_return = !return_type.is_void();

        let full_path = match self.base_url {
            Some(base) => format!("{}{}", base, path),
            None => path.to_string(),
        };

        OperationDefinition {
            api_name,
            path: full_path,
            method: if has_return {
                OperationMethod::from(method)
            } else {
                OperationMethod::Download
            },
            full_name: self.names.full_name(path),
            name,
            summary: operation.summary.clone(),
            params_required: params.as_ref().map(|p| p.required),
            params_type: params.map(|p| p.type_expr),
            data_required: data.as_ref().map(|d| d.required),
            data_type: data.and_then(|d| d.type_expr),
            return_type,
            has_body,
            has_args,
            has_return,
        }
    }

    /// The operation's parameters with shared-parameter `$ref`s followed.
    ///
    /// A reference to a parameter the document does not declare is skipped.
    pub fn parameters<'o>(
        &self,
        path: &str,
        operation: &'o Operation,
        ctx: &mut ResolveContext,
    ) -> Vec<&'o Parameter>
    where
        'a: 'o,
    {
        let document = self.resolver.document();
        let mut parameters = Vec::with_capacity(operation.parameters.len());
        for entry in &operation.parameters {
            match (entry, document.parameter(entry)) {
                (_, Some(parameter)) => parameters.push(parameter),
                (ParameterOrRef::Ref { reference }, None) => {
                    warn!(path, reference = %reference, "parameter reference not found, skipping");
                    ctx.diagnostics.unresolved_ref(path, reference);
                }
                (ParameterOrRef::Parameter(_), None) => {}
            }
        }
        parameters
    }

    /// Fold query parameters into a `<Name>Params` model.
    ///
    /// Returns `None` when the operation declares no query parameters.
    pub fn resolve_params_type(
        &self,
        path: &str,
        operation_name: &str,
        operation: &Operation,
        parameters: &[&Parameter],
        ctx: &mut ResolveContext,
    ) -> Option<TypedArg> {
        let properties: Vec<PropertyDefinition> = parameters
            .iter()
            .filter(|parameter| parameter.location == ParameterLocation::Query)
            .map(|parameter| PropertyDefinition {
                name: parameter.name.clone(),
                description: parameter.description.clone(),
                type_expr: self.resolver.resolve_items_type(&parameter.as_items(), ctx),
                required: parameter.required,
            })
            .collect::<Vec<_>>();
        if properties.is_empty() {
            return None;
        }

        let model_name = format!("{}Params", capitalize_first(operation_name));
        let required = properties.iter().any(|p| p.required);
        let model = ModelDefinition {
            name: model_name.clone(),
            class_name: model_name.clone(),
            description: operation.summary.clone(),
            properties,
        };

        let existing = ctx
            .registry
            .get(&model_name)
            .map(|m| m.properties != model.properties);
        match existing {
            Some(true) => {
                warn!(path, model = %model_name, "params model name already taken");
                ctx.diagnostics.model_name_collision(path, &model_name);
            }
            Some(false) => {}
            None => {
                ctx.registry.add_if_absent(model);
            }
        }

        Some(TypedArg {
            type_expr: TypeExpr::ModelRef(model_name),
            required,
        })
    }

    /// Resolve the first body parameter.
    ///
    /// The outer `Option` is whether a body parameter exists at all; the inner
    /// type is `None` when its schema does not resolve.
    pub fn resolve_data_type(
        &self,
        path: &str,
        parameters: &[&Parameter],
        ctx: &mut ResolveContext,
    ) -> Option<BodyArg> {
        let bodies: Vec<&Parameter> = parameters
            .iter()
            .copied()
            .filter(|parameter| parameter.location == ParameterLocation::Body)
            .collect();
        let body = bodies.first()?;
        if bodies.len() > 1 {
            warn!(
                path,
                count = bodies.len(),
                "more than one body parameter, using the first"
            );
            ctx.diagnostics.multiple_body_params(path, bodies.len());
        }

        let type_expr = body
            .schema
            .as_ref()
            .and_then(|schema| self.resolver.resolve_schema_type(schema, ctx));
        Some(BodyArg {
            type_expr,
            required: body.required,
        })
    }

    /// Resolve the success response, falling back to `void`
    pub fn resolve_return_type(
        &self,
        path: &str,
        operation: &Operation,
        ctx: &mut ResolveContext,
    ) -> TypeExpr {
        let resolved = match operation.success_response() {
            Some(Response::Ref { reference }) => {
                Some(self.resolver.resolve_reference_type(reference, ctx))
            }
            Some(Response::Object {
                schema: Some(schema),
                ..
            }) => self.resolver.resolve_schema_type(schema, ctx),
            Some(Response::Object { schema: None, .. }) | None => None,
        };

        match resolved {
            Some(expr) if !matches!(expr, TypeExpr::Unresolved(_)) => expr,
            _ => {
                warn!(path, "response type is empty");
                ctx.diagnostics.missing_response_schema(path);
                TypeExpr::void()
            }
        }
    }
}

/// The request body of an operation
#[derive(Debug, Clone, PartialEq)]
pub struct BodyArg {
    pub type_expr: Option<TypeExpr>,
    pub required: bool,
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::codegen::config::NamingConfig;
    use crate::codegen::diagnostics::DiagnosticCode;
    use crate::schema::SwaggerDocument;
    use serde_json::json;

    fn document(value: serde_json::Value) -> SwaggerDocument {
        SwaggerDocument::from_str(&value.to_string()).unwrap()
    }

    fn build_all(
        doc: &SwaggerDocument,
        naming: NamingConfig,
    ) -> (Vec<OperationDefinition>, ResolveContext) {
        let wrappers = BTreeMap::new();
        let names = NameResolver::new(&naming);
        let builder = OperationBuilder::new(
            TypeResolver::new(doc, &wrappers),
            &names,
            naming.base_url.as_deref(),
        );
        let mut ctx = ResolveContext::new();
        let mut ops = Vec::new();
        for (path, item) in &doc.paths {
            for method in HttpMethod::ALL {
                if let Some(operation) = item.operation(method) {
                    ops.push(builder.build(path, method, operation, &mut ctx));
                }
            }
        }
        (ops, ctx)
    }

    #[test]
    fn test_get_returning_model() {
        let doc = document(json!({
            "swagger": "2.0",
            "paths": {
                "/user/get": {
                    "get": {
                        "responses": { "200": { "schema": { "$ref": "#/definitions/User" } } }
                    }
                }
            },
            "definitions": {
                "User": {
                    "properties": { "id": { "type": "integer" }, "name": { "type": "string" } }
                }
            }
        }));
        let (ops, ctx) = build_all(&doc, NamingConfig::default());

        let op = &ops[0];
        assert_eq!(op.api_name, "user");
        assert_eq!(op.name, "get");
        assert_eq!(op.method, OperationMethod::Get);
        assert_eq!(op.return_type.to_string(), "User");
        assert!(op.has_return);
        assert!(!op.has_body);
        assert!(!op.has_args);
        assert!(ctx.registry.contains("User"));
        assert!(ctx.diagnostics.is_empty());
    }

    #[test]
    fn test_query_params_model() {
        let doc = document(json!({
            "swagger": "2.0",
            "paths": {
                "/order/list": {
                    "get": {
                        "summary": "List orders",
                        "parameters": [
                            { "name": "page", "in": "query", "type": "integer", "required": true },
                            { "name": "size", "in": "query", "type": "integer" },
                            { "name": "X-Token", "in": "header", "type": "string" }
                        ],
                        "responses": {
                            "200": { "schema": { "type": "array", "items": { "type": "string" } } }
                        }
                    }
                }
            }
        }));
        let (ops, ctx) = build_all(&doc, NamingConfig::default());

        let op = &ops[0];
        assert_eq!(op.params_type, Some(TypeExpr::ModelRef("ListParams".to_string())));
        assert_eq!(op.params_required, Some(true));
        assert!(op.has_args);
        assert_eq!(op.return_type.to_string(), "Array<string>");

        let params = ctx.registry.get("ListParams").unwrap();
        assert_eq!(params.description.as_deref(), Some("List orders"));
        assert_eq!(params.properties.len(), 2);
        assert_eq!(params.properties[0].name, "page");
        assert_eq!(params.properties[0].type_expr.to_string(), "number");
        assert!(params.properties[0].required);
        assert!(!params.properties[1].required);
    }

    #[test]
    fn test_missing_response_schema_becomes_download() {
        let doc = document(json!({
            "swagger": "2.0",
            "paths": {
                "/report/export": {
                    "post": { "responses": { "200": { "description": "file" } } }
                },
                "/report/raw": {
                    "get": { "responses": { "200": { "schema": { "type": "file" } } } }
                }
            }
        }));
        let (ops, ctx) = build_all(&doc, NamingConfig::default());

        for op in &ops {
            assert_eq!(op.return_type, TypeExpr::void());
            assert_eq!(op.method, OperationMethod::Download);
            assert!(!op.has_return);
        }
        assert!(ops[0].has_body);
        assert_eq!(ctx.diagnostics.with_code(DiagnosticCode::MissingResponseSchema).count(), 2);
    }

    #[test]
    fn test_multiple_body_params_uses_first() {
        let doc = document(json!({
            "swagger": "2.0",
            "paths": {
                "/user/save": {
                    "post": {
                        "parameters": [
                            {
                                "name": "user",
                                "in": "body",
                                "required": true,
                                "schema": { "$ref": "#/definitions/User" }
                            },
                            { "name": "extra", "in": "body", "schema": { "type": "string" } }
                        ],
                        "responses": { "200": { "schema": { "type": "boolean" } } }
                    }
                }
            },
            "definitions": { "User": { "properties": { "id": { "type": "integer" } } } }
        }));
        let (ops, ctx) = build_all(&doc, NamingConfig::default());

        let op = &ops[0];
        assert_eq!(op.data_type, Some(TypeExpr::ModelRef("User".to_string())));
        assert_eq!(op.data_required, Some(true));
        assert!(op.has_args);
        assert!(op.has_body);
        assert_eq!(op.method, OperationMethod::Post);
        assert_eq!(ctx.diagnostics.with_code(DiagnosticCode::MultipleBodyParams).count(), 1);
    }

    #[test]
    fn test_base_url_prefix() {
        let doc = document(json!({
            "swagger": "2.0",
            "paths": {
                "/user/get": {
                    "get": { "responses": { "200": { "schema": { "type": "string" } } } }
                }
            }
        }));
        let naming = NamingConfig {
            base_url: Some("/mall-api".to_string()),
            ..NamingConfig::default()
        };
        let (ops, _) = build_all(&doc, naming);

        assert_eq!(ops[0].path, "/mall-api/user/get");
        assert_eq!(ops[0].full_name, "mallApi_user_get");
    }

    #[test]
    fn test_shared_parameter_refs() {
        let doc = document(json!({
            "swagger": "2.0",
            "parameters": {
                "page": { "name": "page", "in": "query", "type": "integer", "required": true },
                "order": {
                    "name": "order",
                    "in": "body",
                    "schema": { "$ref": "#/definitions/Order" }
                }
            },
            "paths": {
                "/order/save": {
                    "post": {
                        "parameters": [
                            { "$ref": "#/parameters/page" },
                            { "$ref": "#/parameters/order" },
                            { "$ref": "#/parameters/gone" }
                        ],
                        "responses": { "200": { "schema": { "type": "boolean" } } }
                    }
                }
            },
            "definitions": {
                "Order": {
                    "properties": { "no": { "type": "string", "required": true } },
                    "required": ["no"]
                }
            }
        }));
        let (ops, ctx) = build_all(&doc, NamingConfig::default());

        let op = &ops[0];
        assert_eq!(op.params_type, Some(TypeExpr::ModelRef("SaveParams".to_string())));
        assert_eq!(op.params_required, Some(true));
        assert_eq!(op.data_type, Some(TypeExpr::ModelRef("Order".to_string())));
        assert!(ctx.registry.get("Order").unwrap().properties[0].required);

        let missing: Vec<_> = ctx.diagnostics.with_code(DiagnosticCode::UnresolvedRef).collect();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0].subject, "/order/save");
        assert!(missing[0].message.contains("#/parameters/gone"));
    }

    #[test]
    fn test_record_named_definition_returns_builtin() {
        let doc = document(json!({
            "swagger": "2.0",
            "paths": {
                "/cache/dump": {
                    "get": {
                        "responses": { "200": { "schema": { "$ref": "#/definitions/Record" } } }
                    }
                }
            },
            "definitions": { "Record": { "properties": { "id": { "type": "integer" } } } }
        }));
        let (ops, ctx) = build_all(&doc, NamingConfig::default());

        assert_eq!(ops[0].return_type.to_string(), "Record<string, any>");
        assert!(ctx.registry.is_empty());
    }

    #[test]
    fn test_params_model_collision() {
        let doc = document(json!({
            "swagger": "2.0",
            "paths": {
                "/user/list": {
                    "get": {
                        "parameters": [{ "name": "page", "in": "query", "type": "integer" }],
                        "responses": { "200": { "schema": { "type": "string" } } }
                    }
                },
                "/order/list": {
                    "get": {
                        "parameters": [{ "name": "status", "in": "query", "type": "string" }],
                        "responses": { "200": { "schema": { "type": "string" } } }
                    }
                },
                "/shop/list": {
                    "get": {
                        "parameters": [{ "name": "page", "in": "query", "type": "integer" }],
                        "responses": { "200": { "schema": { "type": "string" } } }
                    }
                }
            }
        }));
        let (_, ctx) = build_all(&doc, NamingConfig::default());

        // json! objects iterate in key order: /order, /shop, /user
        assert_eq!(ctx.registry.len(), 1);
        assert!(ctx.registry.get("ListParams").unwrap().property("status").is_some());
        assert_eq!(ctx.diagnostics.with_code(DiagnosticCode::ModelNameCollision).count(), 2);
    }
}
