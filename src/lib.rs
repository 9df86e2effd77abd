//! Swagger Codegen
//!
//! Resolves a Swagger 2.0 document into a deduplicated intermediate
//! representation (IR) that client-code emitters render from.
//!
//! ## Features
//!
//! - **Structured Types**: every resolved type is a `TypeExpr` tree, rendered to
//!   text only at emission
//! - **Generic Wrappers**: definitions such as `Result«User»` become one `Result<T>` model
//! - **Cycle Safe**: any reference cycle terminates; cycles are reported as diagnostics
//! - **Deterministic**: models sorted by name, operations grouped by api name
//! - **Checksum Tracking**: SHA256 of the source document is carried on the IR
//!
//! ## Architecture
//!
//! ```text
//! SwaggerDocument ──► Generator ──► Ir ──► EmitterView
//!                       │
//!                       ├── NameResolver      (path → api / operation / full names)
//!                       ├── OperationBuilder  (path + verb → OperationDefinition)
//!                       └── TypeResolver      (schema → TypeExpr, fills ModelRegistry)
//! ```

pub mod checksum;
pub mod codegen;
pub mod config;
pub mod error;
pub mod ir;
pub mod registry;
pub mod schema;

pub use checksum::Checksum;
pub use codegen::{CodegenConfig, Diagnostics, EmitterView, Generator, Ir, TypeExpr};
pub use config::GeneratorConfig;
pub use error::{CodegenError, Result};
pub use ir::{ModelDefinition, OperationDefinition, OperationMethod, PropertyDefinition};
pub use registry::ModelRegistry;
pub use schema::{HttpMethod, SwaggerDocument};
