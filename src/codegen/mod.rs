//! Code Generation
//!
//! Resolves a loaded Swagger document into an [`Ir`]: the deduplicated
//! models it uses and one record per path + verb.
//!
//! Architecture:
//! - NameResolver: path -> group/operation/full names
//! - TypeResolver: schema nodes -> TypeExpr trees, registering models
//! - OperationBuilder: path + verb -> OperationDefinition
//! - Generator: drives one run and owns its ResolveContext
//!
//! The key constraint: a run is a pure function of the document and the
//! config. Nothing outlives it except the returned IR.

pub mod analysis;
pub mod builtin;
pub mod config;
pub mod diagnostics;
pub mod names;
pub mod operations;
pub mod resolver;
pub mod types;
pub mod view;

pub use analysis::{report_cycles, CycleGroup, ReferenceGraph};
pub use builtin::{convert_builtin_type, Builtin};
pub use config::{CodegenConfig, NamingConfig, PathFilter};
pub use diagnostics::{DiagnosticCode, DiagnosticItem, Diagnostics, Severity};
pub use names::NameResolver;
pub use operations::OperationBuilder;
pub use resolver::{ResolveContext, TypeResolver};
pub use types::{fix_model_type, TypeExpr};
pub use view::EmitterView;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::checksum::Checksum;
use crate::ir::{ModelDefinition, OperationDefinition};
use crate::schema::SwaggerDocument;

// =============================================================================
// Intermediate Representation
// =============================================================================

/// Output of one generation run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ir {
    /// Checksum of the source document bytes, when known
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_hash: Option<Checksum>,
    /// Service base name for the api index
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_name: Option<String>,
    /// Distinct api group names
    pub apis: BTreeSet<String>,
    /// Grouped by api name, discovery order within a group
    pub operations: Vec<OperationDefinition>,
    /// Sorted by name
    pub models: Vec<ModelDefinition>,
    #[serde(default)]
    pub diagnostics: Diagnostics,
}

impl Ir {
    pub fn operations_for<'a>(
        &'a self,
        api: &'a str,
    ) -> impl Iterator<Item = &'a OperationDefinition> + 'a {
        self.operations.iter().filter(move |op| op.api_name == api)
    }

    /// Every api group with its operations, groups in name order
    pub fn api_groups(&self) -> Vec<(&str, Vec<&OperationDefinition>)> {
        self.apis
            .iter()
            .map(|api| (api.as_str(), self.operations_for(api).collect()))
            .collect()
    }

    pub fn model(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn operation(&self, path: &str) -> Option<&OperationDefinition> {
        self.operations.iter().find(|op| op.path == path)
    }

    /// Template-ready projection
    pub fn view(&self, namespace: Option<&str>) -> EmitterView {
        EmitterView::from_ir(self, namespace)
    }
}

// =============================================================================
// Generator
// =============================================================================

/// Drives generation runs with a fixed configuration
pub struct Generator<'c> {
    config: &'c CodegenConfig,
    names: NameResolver,
}

impl<'c> Generator<'c> {
    pub fn new(config: &'c CodegenConfig) -> Self {
        Self {
            config,
            names: NameResolver::new(&config.naming),
        }
    }

    /// Resolve every selected path + verb of `document`
    pub fn generate(&self, document: &SwaggerDocument) -> Ir {
        let mut ctx = ResolveContext::new();
        report_cycles(document, &mut ctx.diagnostics);

        let builder = OperationBuilder::new(
            TypeResolver::new(document, &self.config.generic_wrappers),
            &self.names,
            self.config.naming.base_url.as_deref(),
        );

        let paths: Vec<_> = document
            .paths
            .iter()
            .filter(|(path, _)| self.config.filter.allows(path))
            .collect();
        info!(
            paths = paths.len(),
            total = document.paths.len(),
            filter = ?self.config.filter.paths,
            "resolving operations"
        );

        let mut apis = BTreeSet::new();
        let mut operations = Vec::new();
        for (path, item) in paths {
            for &method in &self.config.methods {
                let Some(operation) = item.operation(method) else {
                    continue;
                };
                let op = builder.build(path, method, operation, &mut ctx);
                apis.insert(op.api_name.clone());
                operations.push(op);
            }
        }
        // stable: discovery order survives within a group
        operations.sort_by(|a, b| a.api_name.cmp(&b.api_name));

        let ResolveContext {
            registry, diagnostics, ..
        } = ctx;
        let models = registry.into_sorted();

        info!(
            apis = apis.len(),
            operations = operations.len(),
            models = models.len(),
            warnings = diagnostics.warning_count(),
            "generation complete"
        );

        Ir {
            document_hash: document.checksum.clone(),
            base_name: self.names.base_name().map(str::to_string),
            apis,
            operations,
            models,
            diagnostics,
        }
    }
}
