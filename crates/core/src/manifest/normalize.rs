//! Normalization from raw manifest documents to the manifest model.
//!
//! This module handles all the authoring quirks:
//! - Required keys checked with precise locations
//! - Action names defaulted from their mapping key
//! - Deprecation paragraphs split out of action documents
//! - Object references checked for existence

use std::collections::{BTreeMap, HashSet};

use tracing::debug;

use super::model::{Action, ActionStatus, Field, Manifest, Metadata, Object};
use super::raw::{RawAction, RawField, RawManifest, RawMetadata, RawObject};
use crate::error::ManifestError;

/// Normalize a raw manifest into the model.
pub fn normalize_manifest(raw: RawManifest) -> Result<Manifest, ManifestError> {
    let metadata = normalize_metadata(raw.metadata)?;

    let mut objects = BTreeMap::new();
    for (name, raw_object) in raw.objects {
        let object = normalize_object(&name, raw_object)?;
        objects.insert(name, object);
    }

    // Field references are checked once every object is known
    for object in objects.values() {
        for field in &object.fields {
            if let Some(target) = field.object_ref()
                && !objects.contains_key(target)
            {
                return Err(ManifestError::DanglingReference {
                    referrer: format!("field '{}.{}'", object.name, field.name),
                    object: target.to_string(),
                });
            }
        }
    }

    let mut actions = BTreeMap::new();
    for (key, raw_action) in raw.actions {
        let action = normalize_action(&key, raw_action)?;
        for (slot, object) in [("input", &action.input), ("output", &action.output)] {
            if !objects.contains_key(object) {
                return Err(ManifestError::DanglingReference {
                    referrer: format!("action '{}' {slot}", action.name),
                    object: object.clone(),
                });
            }
        }
        actions.insert(key, action);
    }

    debug!(
        service = %metadata.short_name,
        version = %metadata.version,
        actions = actions.len(),
        objects = objects.len(),
        "Normalized manifest."
    );

    Ok(Manifest {
        metadata,
        actions,
        objects,
    })
}

fn normalize_metadata(raw: Option<RawMetadata>) -> Result<Metadata, ManifestError> {
    let raw = raw.ok_or_else(|| ManifestError::MissingKey {
        location: "manifest".into(),
        key: "metadata".into(),
    })?;
    let location = "metadata";

    Ok(Metadata {
        short_name: required(raw.short_name, location, "shortName")?,
        display_name: required(raw.display_name, location, "displayName")?,
        version: required(raw.version, location, "version")?,
        brief: raw.brief.filter(|b| !b.trim().is_empty()),
    })
}

fn normalize_object(name: &str, raw: RawObject) -> Result<Object, ManifestError> {
    let location = format!("object '{name}'");
    let mut seen = HashSet::new();
    let mut fields = Vec::with_capacity(raw.members.len());

    for raw_field in raw.members {
        let field = normalize_field(&location, raw_field)?;
        if !seen.insert(field.name.clone()) {
            return Err(ManifestError::Duplicate {
                what: format!("field in object '{name}'"),
                name: field.name,
            });
        }
        fields.push(field);
    }

    Ok(Object {
        name: name.to_string(),
        fields,
        usage: raw.usage,
        document: raw.document.trim().to_string(),
    })
}

fn normalize_field(object_location: &str, raw: RawField) -> Result<Field, ManifestError> {
    let name = required(raw.name, object_location, "name")?;
    let location = format!("{object_location} field '{name}'");
    let kind = raw.kind.ok_or_else(|| ManifestError::MissingKey {
        location: location.clone(),
        key: "type".into(),
    })?;
    let member = required(raw.member, &location, "member")?;

    Ok(Field {
        name,
        kind,
        member,
        required: raw.required,
        output_required: raw.output_required,
        nullable: raw.nullable,
        disabled: raw.disabled,
        default: raw.default,
        document: raw.document.trim().to_string(),
        example: raw.example,
    })
}

fn normalize_action(key: &str, raw: RawAction) -> Result<Action, ManifestError> {
    let name = match raw.name {
        Some(name) if !name.is_empty() => {
            if name != key {
                return Err(ManifestError::Duplicate {
                    what: format!("action name (declared under key '{key}')"),
                    name,
                });
            }
            name
        }
        _ => key.to_string(),
    };
    let location = format!("action '{name}'");
    let input = required(raw.input, &location, "input")?;
    let output = required(raw.output, &location, "output")?;

    let (deprecation_message, document) = split_deprecation(&raw.document, raw.status);

    Ok(Action {
        name,
        document,
        deprecation_message,
        input,
        output,
        status: raw.status,
    })
}

/// Split the leading deprecation paragraph off a non-online action document.
///
/// Returns `(deprecation_message, remaining_document)`.
pub fn split_deprecation(document: &str, status: ActionStatus) -> (Option<String>, String) {
    let document = document.trim();
    if status == ActionStatus::Online || document.is_empty() {
        return (None, document.to_string());
    }

    let normalized = document.replace("\r\n", "\n");
    match normalized.split_once("\n\n") {
        Some((head, rest)) => (Some(head.trim().to_string()), rest.trim().to_string()),
        None => (Some(normalized), String::new()),
    }
}

fn required(value: Option<String>, location: &str, key: &str) -> Result<String, ManifestError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ManifestError::MissingKey {
            location: location.to_string(),
            key: key.to_string(),
        }),
    }
}
