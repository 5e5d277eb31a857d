//! Manifest model and decoding.
//!
//! The pipeline is:
//! 1. Parse: JSON/YAML -> [`RawManifest`]
//! 2. Normalize: [`RawManifest`] -> [`Manifest`] (defaults, deprecation split, references)
//!
//! Usage assignment and graph invariants live in [`crate::validate`].

mod model;
mod normalize;
mod raw;

pub use model::{
    Action, ActionStatus, Field, FieldKind, Manifest, Metadata, Object, REQUEST_ID, Usage,
    starts_lowercase, starts_uppercase,
};
pub use normalize::{normalize_manifest, split_deprecation};
pub use raw::{RawAction, RawField, RawManifest, RawMetadata, RawObject};

use crate::error::ManifestError;

/// Decode and normalize a JSON manifest.
pub fn decode_json(json: &str) -> Result<Manifest, ManifestError> {
    normalize_manifest(RawManifest::from_json(json)?)
}

/// Decode and normalize a YAML manifest.
pub fn decode_yaml(yaml: &str) -> Result<Manifest, ManifestError> {
    normalize_manifest(RawManifest::from_yaml(yaml)?)
}
