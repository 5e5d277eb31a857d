//! Normalized manifest model.
//!
//! Produced once per manifest by [`super::normalize_manifest`] and never
//! edited afterwards; later stages only derive decisions from it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::ManifestId;

/// Wire name of the request id every response carries. It is never part of
/// any generation decision.
pub const REQUEST_ID: &str = "RequestId";

/// Primitive kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// `true` / `false`
    #[serde(alias = "boolean")]
    Bool,
    /// Integer family (member names the width).
    #[serde(alias = "integer")]
    Int,
    /// Floating point.
    #[serde(alias = "double")]
    Float,
    /// Text, including date sentinels.
    String,
    /// Raw bytes (file upload).
    Binary,
    /// Sequence of `member`.
    List,
    /// Reference to another object named by `member`.
    Object,
}

/// Direction an object travels in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Usage {
    /// Only inside requests.
    #[serde(alias = "in")]
    Input,
    /// Only inside responses.
    #[serde(alias = "out")]
    Output,
    /// Both directions.
    Both,
}

impl Usage {
    /// Whether this usage covers everything `other` needs.
    pub fn covers(self, other: Usage) -> bool {
        self == Usage::Both || self == other
    }

    /// Union of two usages.
    pub fn merge(self, other: Usage) -> Usage {
        if self == other { self } else { Usage::Both }
    }
}

/// Lifecycle status of an action.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ActionStatus {
    /// Available.
    #[default]
    Online,
    /// Removed from service.
    Offline,
    /// Still callable but superseded.
    Deprecated,
}

/// Service metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Metadata {
    /// Product identifier.
    pub short_name: String,
    /// Human-readable name.
    pub display_name: String,
    /// API version.
    pub version: String,
    /// Optional one-line description.
    pub brief: Option<String>,
}

impl Metadata {
    /// Identity used in diagnostics and error catalog filtering.
    pub fn id(&self) -> ManifestId {
        ManifestId::new(&self.short_name, &self.version)
    }
}

/// A field of an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    /// Wire-level identifier.
    pub name: String,
    /// Primitive kind.
    pub kind: FieldKind,
    /// Primitive name, object name, or list element name.
    pub member: String,
    /// Mandatory in requests.
    pub required: bool,
    /// Guaranteed present in responses.
    pub output_required: bool,
    /// May be an explicit null on the wire.
    pub nullable: bool,
    /// Excluded from the public surface.
    pub disabled: bool,
    /// Authored default value.
    pub default: Option<String>,
    /// Description.
    pub document: String,
    /// Authored example value.
    pub example: Option<String>,
}

impl Field {
    /// Stored-value optionality: absent in requests, absent in responses, or
    /// explicitly nullable.
    pub fn optional(&self) -> bool {
        !self.required || !self.output_required || self.nullable
    }

    /// Integer-kind field.
    pub fn is_integer(&self) -> bool {
        self.kind == FieldKind::Int
    }

    /// List-kind field.
    pub fn is_list(&self) -> bool {
        self.kind == FieldKind::List
    }

    /// Object-kind field (not a list of objects).
    pub fn is_object(&self) -> bool {
        self.kind == FieldKind::Object
    }

    /// Name of the object this field refers to, directly or as list element.
    pub fn object_ref(&self) -> Option<&str> {
        match self.kind {
            FieldKind::Object => Some(&self.member),
            FieldKind::List if starts_uppercase(&self.member) => Some(&self.member),
            _ => None,
        }
    }

    /// Whether the field takes part in generated code. Disabled fields and
    /// binary upload fields are kept for validation only.
    pub fn is_code_member(&self) -> bool {
        !self.disabled && self.kind != FieldKind::Binary
    }

    /// Same kind and member type as `other`.
    pub fn same_type_as(&self, other: &Field) -> bool {
        self.kind == other.kind && self.member == other.member
    }
}

/// A named aggregate of fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Object {
    /// Object name (upper camel case).
    pub name: String,
    /// All fields in declaration order, including disabled and binary ones.
    pub fields: Vec<Field>,
    /// Usage tag; `None` means request/response body at the source level.
    pub usage: Option<Usage>,
    /// Description.
    pub document: String,
}

impl Object {
    /// Fields that take part in generated code, in declaration order.
    pub fn members(&self) -> impl Iterator<Item = &Field> {
        self.fields.iter().filter(|f| f.is_code_member())
    }

    /// Code members other than the request id.
    pub fn payload_members(&self) -> impl Iterator<Item = &Field> {
        self.members().filter(|f| f.name != REQUEST_ID)
    }

    /// Look up a code member by wire name.
    pub fn member(&self, name: &str) -> Option<&Field> {
        self.members().find(|f| f.name == name)
    }
}

/// One callable operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    /// Action name.
    pub name: String,
    /// User-facing document with any deprecation paragraph removed.
    pub document: String,
    /// Leading paragraph of the raw document when not online.
    pub deprecation_message: Option<String>,
    /// Request body object name.
    pub input: String,
    /// Response body object name.
    pub output: String,
    /// Lifecycle status.
    pub status: ActionStatus,
}

/// A decoded service manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Manifest {
    /// Service metadata.
    pub metadata: Metadata,
    /// Actions by name.
    pub actions: BTreeMap<String, Action>,
    /// Objects by name.
    pub objects: BTreeMap<String, Object>,
}

/// Upper-case leading character, the naming convention for object names.
pub fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_uppercase())
}

/// Lower-case leading character, the naming convention for primitive names.
pub fn starts_lowercase(name: &str) -> bool {
    name.chars().next().is_some_and(|c| c.is_lowercase())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn field(kind: FieldKind, member: &str) -> Field {
        Field {
            name: "F".into(),
            kind,
            member: member.into(),
            required: true,
            output_required: true,
            nullable: false,
            disabled: false,
            default: None,
            document: String::new(),
            example: None,
        }
    }

    #[test]
    fn test_optional_signals() {
        let mut f = field(FieldKind::String, "string");
        assert!(!f.optional());
        f.output_required = false;
        assert!(f.optional());
        f.output_required = true;
        f.nullable = true;
        assert!(f.optional());
        f.nullable = false;
        f.required = false;
        assert!(f.optional());
    }

    #[test]
    fn test_object_ref() {
        assert_eq!(field(FieldKind::Object, "Tag").object_ref(), Some("Tag"));
        assert_eq!(field(FieldKind::List, "Tag").object_ref(), Some("Tag"));
        assert_eq!(field(FieldKind::List, "string").object_ref(), None);
        assert_eq!(field(FieldKind::String, "string").object_ref(), None);
    }

    #[test]
    fn test_members_skip_binary_and_disabled() {
        let mut disabled = field(FieldKind::String, "string");
        disabled.name = "Hidden".into();
        disabled.disabled = true;
        let mut upload = field(FieldKind::Binary, "binary");
        upload.name = "File".into();
        let mut request_id = field(FieldKind::String, "string");
        request_id.name = REQUEST_ID.into();
        let object = Object {
            name: "UploadRequest".into(),
            fields: vec![disabled, upload, request_id, field(FieldKind::Int, "int64")],
            usage: None,
            document: String::new(),
        };
        let names: Vec<_> = object.members().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["RequestId", "F"]);
        let payload: Vec<_> = object.payload_members().map(|f| f.name.as_str()).collect();
        assert_eq!(payload, ["F"]);
        assert!(object.member("File").is_none());
    }

    #[test]
    fn test_usage_merge() {
        assert_eq!(Usage::Input.merge(Usage::Input), Usage::Input);
        assert_eq!(Usage::Input.merge(Usage::Output), Usage::Both);
        assert!(Usage::Both.covers(Usage::Output));
        assert!(!Usage::Input.covers(Usage::Output));
    }
}
