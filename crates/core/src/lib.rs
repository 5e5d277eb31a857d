//! Manifest compiler for cloud API SDKs.
//!
//! Turns a declarative service manifest (actions, objects, fields) plus an
//! optional error catalog into the decisions an SDK renderer needs:
//! - resolved field types ([`resolve`])
//! - a pagination decision per action ([`pagination`])
//! - an error taxonomy with common-error cross references ([`taxonomy`])
//!
//! [`pipeline::compile_manifest`] runs every stage for one manifest and
//! [`pipeline::compile_all`] runs independent manifests in parallel.

#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod manifest;
pub mod naming;
pub mod pagination;
pub mod pipeline;
pub mod resolve;
pub mod taxonomy;
pub mod validate;

pub use config::{CONFIG_FILENAME, CompilerConfig, ErrorsConfig, PaginationConfig};
pub use error::{CompileError, ConfigError, ManifestError, ManifestId, ManifestLabel};
pub use manifest::{Manifest, decode_json, decode_yaml};
pub use pagination::{PaginationDecision, PaginationEngine, PaginationKind};
pub use pipeline::{
    CompiledService, ManifestSource, SourceFormat, compile, compile_all, compile_manifest,
};
pub use resolve::{CallMode, FieldType, ResolvedType, resolve_field};
pub use taxonomy::{CommonErrorIndex, ErrorCatalog, ErrorTaxonomy};
pub use validate::{ObjectIndex, ValidatedManifest, validate};
