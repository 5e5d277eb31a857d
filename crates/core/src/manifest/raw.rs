//! Manifest document structs for serde deserialization.
//!
//! These mirror the authored documents as loosely as possible: keys that are
//! required by the model are still `Option` here so normalization can report
//! exactly which one is missing and where.

use std::collections::BTreeMap;

use serde::Deserialize;

use super::model::{ActionStatus, FieldKind, Usage};
use crate::error::{ManifestError, ManifestId};

/// Root of a service manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct RawManifest {
    /// Service identity and descriptions.
    pub metadata: Option<RawMetadata>,
    /// Actions keyed by name.
    #[serde(default)]
    pub actions: BTreeMap<String, RawAction>,
    /// Objects keyed by name.
    #[serde(default)]
    pub objects: BTreeMap<String, RawObject>,
}

/// Service metadata block.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMetadata {
    /// Service short name, used as product identifier.
    #[serde(alias = "serviceShortName")]
    pub short_name: Option<String>,
    /// Human-readable service name.
    #[serde(alias = "serviceNameEN", alias = "serviceName")]
    pub display_name: Option<String>,
    /// API version.
    #[serde(alias = "apiVersion")]
    pub version: Option<String>,
    /// One-line service description.
    #[serde(alias = "apiBrief")]
    pub brief: Option<String>,
}

/// A single action (API call).
#[derive(Debug, Clone, Deserialize)]
pub struct RawAction {
    /// Action name; defaults to the mapping key.
    pub name: Option<String>,
    /// Raw document, possibly led by a deprecation paragraph.
    #[serde(default)]
    pub document: String,
    /// Request body object name.
    pub input: Option<String>,
    /// Response body object name.
    pub output: Option<String>,
    /// Lifecycle status.
    #[serde(default)]
    pub status: ActionStatus,
}

/// An object definition.
#[derive(Debug, Clone, Deserialize)]
pub struct RawObject {
    /// Fields in declaration order.
    #[serde(default, alias = "fields")]
    pub members: Vec<RawField>,
    /// Usage tag; absent for request/response bodies.
    pub usage: Option<Usage>,
    /// Object description.
    #[serde(default)]
    pub document: String,
}

/// A field of an object.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawField {
    /// Wire-level name.
    pub name: Option<String>,
    /// Primitive kind.
    #[serde(rename = "type", alias = "kind")]
    pub kind: Option<FieldKind>,
    /// Primitive name, object name, or list element name.
    pub member: Option<String>,
    /// Mandatory in requests.
    #[serde(default = "default_true")]
    pub required: bool,
    /// Guaranteed present in responses.
    #[serde(default = "default_true", alias = "output_required")]
    pub output_required: bool,
    /// Wire value may be an explicit null.
    #[serde(default, alias = "value_allowed_null")]
    pub nullable: bool,
    /// Excluded from the public surface.
    #[serde(default)]
    pub disabled: bool,
    /// Default value as authored.
    pub default: Option<String>,
    /// Field description.
    #[serde(default)]
    pub document: String,
    /// Example value as authored.
    pub example: Option<String>,
}

fn default_true() -> bool {
    true
}

impl RawManifest {
    /// Parse a manifest from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, ManifestError> {
        serde_json::from_str(json).map_err(|e| ManifestError::Parse {
            format: "JSON",
            message: e.to_string(),
        })
    }

    /// Parse a manifest from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ManifestError> {
        serde_yaml::from_str(yaml).map_err(|e| ManifestError::Parse {
            format: "YAML",
            message: e.to_string(),
        })
    }

    /// Identity from the metadata, when both parts are present.
    pub fn id(&self) -> Option<ManifestId> {
        let metadata = self.metadata.as_ref()?;
        Some(ManifestId::new(
            metadata.short_name.as_deref()?,
            metadata.version.as_deref()?,
        ))
    }
}
