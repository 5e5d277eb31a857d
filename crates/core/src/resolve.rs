//! Type resolution: field kind + member name + optionality -> concrete type.
//!
//! Two call modes exist. [`CallMode::Stored`] is used for field declarations
//! and response values; [`CallMode::ConstructorParameter`] is used when a
//! request initializer is built, where only the request-side `required` flag
//! matters.

use std::fmt;

use serde::Serialize;

use crate::error::ManifestError;
use crate::manifest::{Field, FieldKind, starts_lowercase, starts_uppercase};
use crate::naming::normalize_primitive_name;

/// Wire encoding of a date-typed string field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DateEncoding {
    /// Calendar date (`date`).
    Date,
    /// Local timestamp (`datetime`).
    Timestamp,
    /// ISO-8601 timestamp (`datetime_iso`).
    TimestampIso8601,
}

impl DateEncoding {
    /// Match a member name against the date sentinels.
    pub fn from_member(member: &str) -> Option<Self> {
        match member {
            "date" => Some(DateEncoding::Date),
            "datetime" => Some(DateEncoding::Timestamp),
            "datetime_iso" => Some(DateEncoding::TimestampIso8601),
            _ => None,
        }
    }

    /// The sentinel member name for this encoding.
    pub fn sentinel(self) -> &'static str {
        match self {
            DateEncoding::Date => "date",
            DateEncoding::Timestamp => "datetime",
            DateEncoding::TimestampIso8601 => "datetime_iso",
        }
    }

    /// Format pattern of the wire value.
    pub fn wire_format(self) -> &'static str {
        match self {
            DateEncoding::Date => "yyyy-MM-dd",
            DateEncoding::Timestamp => "yyyy-MM-dd HH:mm:ss",
            DateEncoding::TimestampIso8601 => "yyyy-MM-dd'T'HH:mm:ssXXX",
        }
    }
}

/// Encoding tag for a date field, combining encoding and nullability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct DateWrapper {
    /// Wire encoding.
    pub encoding: DateEncoding,
    /// Whether the wrapped value is nullable.
    pub nullable: bool,
}

/// A resolved type, before nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "of", rename_all = "snake_case")]
pub enum ResolvedType {
    /// Date with a wire encoding.
    Date(DateEncoding),
    /// Raw bytes.
    Bytes,
    /// A manifest object, by name.
    Object(String),
    /// A primitive with its normalized name (`Int64`, `String`, ...).
    Scalar(String),
    /// Sequence of the element type.
    List(Box<ResolvedType>),
}

impl ResolvedType {
    /// Language-neutral type name: `[Element]` for lists.
    pub fn type_name(&self) -> String {
        match self {
            ResolvedType::Date(_) => "Date".to_string(),
            ResolvedType::Bytes => "Bytes".to_string(),
            ResolvedType::Object(name) | ResolvedType::Scalar(name) => name.clone(),
            ResolvedType::List(element) => format!("[{}]", element.type_name()),
        }
    }
}

impl fmt::Display for ResolvedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.type_name())
    }
}

/// How a field's nullability is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallMode {
    /// Field declarations and response values.
    Stored,
    /// Request initializer parameters.
    ConstructorParameter,
}

/// A field's resolved type plus nullability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FieldType {
    /// The resolved type.
    #[serde(rename = "type")]
    pub ty: ResolvedType,
    /// Whether the value may be absent.
    pub nullable: bool,
}

impl FieldType {
    /// Date encoding tag, for direct date fields only.
    pub fn date_wrapper(&self) -> Option<DateWrapper> {
        match self.ty {
            ResolvedType::Date(encoding) => Some(DateWrapper {
                encoding,
                nullable: self.nullable,
            }),
            _ => None,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "{}?", self.ty)
        } else {
            write!(f, "{}", self.ty)
        }
    }
}

/// Resolve a field of `object` under a call mode.
pub fn resolve_field(object: &str, field: &Field, mode: CallMode) -> Result<FieldType, ManifestError> {
    let ty = resolve_type(object, field)?;
    let nullable = match mode {
        CallMode::Stored => field.optional(),
        CallMode::ConstructorParameter => !field.required,
    };
    Ok(FieldType { ty, nullable })
}

/// Resolve a field's type without nullability.
pub fn resolve_type(object: &str, field: &Field) -> Result<ResolvedType, ManifestError> {
    let violation = |reason: String| ManifestError::FieldConvention {
        object: object.to_string(),
        field: field.name.clone(),
        reason,
    };
    let member = field.member.as_str();

    match field.kind {
        FieldKind::String => match DateEncoding::from_member(member) {
            Some(encoding) => Ok(ResolvedType::Date(encoding)),
            None => scalar(member).ok_or_else(|| {
                violation(format!("primitive member '{member}' must start lower-case"))
            }),
        },
        FieldKind::Binary => Ok(ResolvedType::Bytes),
        FieldKind::Object => {
            if starts_uppercase(member) {
                Ok(ResolvedType::Object(member.to_string()))
            } else {
                Err(violation(format!(
                    "object member '{member}' must start upper-case"
                )))
            }
        }
        FieldKind::List => list_element(member)
            .map(|element| ResolvedType::List(Box::new(element)))
            .ok_or_else(|| violation(format!("list member '{member}' is not a type name"))),
        FieldKind::Bool | FieldKind::Int | FieldKind::Float => {
            if DateEncoding::from_member(member).is_some() {
                return Err(violation(format!(
                    "date member '{member}' requires kind string"
                )));
            }
            scalar(member).ok_or_else(|| {
                violation(format!("primitive member '{member}' must start lower-case"))
            })
        }
    }
}

fn scalar(member: &str) -> Option<ResolvedType> {
    starts_lowercase(member).then(|| ResolvedType::Scalar(normalize_primitive_name(member)))
}

fn list_element(member: &str) -> Option<ResolvedType> {
    if let Some(encoding) = DateEncoding::from_member(member) {
        return Some(ResolvedType::Date(encoding));
    }
    if member == "binary" {
        return Some(ResolvedType::Bytes);
    }
    if starts_uppercase(member) {
        return Some(ResolvedType::Object(member.to_string()));
    }
    scalar(member)
}
