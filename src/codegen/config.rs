//! Codegen Configuration
//!
//! The knobs the resolution core consumes:
//! - Naming (NamingConfig): grouping index, segment cuts, service base name/url
//! - Filtering (PathFilter): substring include/exclude lists over path keys
//! - Resolution: verbs to scan, model namespace, generic wrapper payload fields
//!
//! Loading from files and the environment lives in [`crate::config`]; this
//! module only describes the values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::HttpMethod;

// =============================================================================
// Global Configuration
// =============================================================================

/// Configuration for one generation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodegenConfig {
    /// Naming conventions
    #[serde(default)]
    pub naming: NamingConfig,

    /// Which path keys are resolved
    #[serde(default)]
    pub filter: PathFilter,

    /// Verbs scanned on every path item, in this order
    #[serde(default = "default_methods")]
    pub methods: Vec<HttpMethod>,

    /// Prefix qualifying model names in emitter-facing output (`models.User`)
    #[serde(default = "default_model_namespace")]
    pub model_namespace: Option<String>,

    /// Generic wrapper class name -> property that always holds the `T` payload
    #[serde(default = "default_generic_wrappers")]
    pub generic_wrappers: BTreeMap<String, String>,
}

impl Default for CodegenConfig {
    fn default() -> Self {
        Self {
            naming: NamingConfig::default(),
            filter: PathFilter::default(),
            methods: default_methods(),
            model_namespace: default_model_namespace(),
            generic_wrappers: default_generic_wrappers(),
        }
    }
}

/// Naming configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NamingConfig {
    /// Path segment index used as the api group name, when the path is long enough
    #[serde(default)]
    pub tag_index: Option<usize>,

    /// Segment indices dropped from the flattened full name
    #[serde(default)]
    pub api_cut: Vec<usize>,

    /// Service name prefixed to full names; derived from `base_url` when unset
    #[serde(default)]
    pub base_name: Option<String>,

    /// Prefix prepended to every operation path
    #[serde(default)]
    pub base_url: Option<String>,
}

/// Inclusion/exclusion filters over path keys (substring match)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathFilter {
    /// If non-empty, only paths containing one of these are kept
    #[serde(default)]
    pub paths: Vec<String>,

    /// Paths containing any of these are dropped
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

impl PathFilter {
    pub fn allows(&self, path: &str) -> bool {
        let included =
            self.paths.is_empty() || self.paths.iter().any(|p| path.contains(p.as_str()));
        included && !self.exclude_paths.iter().any(|p| path.contains(p.as_str()))
    }
}

// Default value functions
fn default_methods() -> Vec<HttpMethod> {
    vec![HttpMethod::Get, HttpMethod::Post]
}

fn default_model_namespace() -> Option<String> {
    Some("models".to_string())
}

fn default_generic_wrappers() -> BTreeMap<String, String> {
    let mut wrappers = BTreeMap::new();
    wrappers.insert("Result<T>".to_string(), "result".to_string());
    wrappers
}
