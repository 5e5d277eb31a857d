//! Next-request construction plans.
//!
//! A [`RequestPlan`] describes how to build the request for the next page
//! from the current request and the latest response: every field is copied
//! except the one addressed by the pagination key path, which is updated.
//! When the key path crosses an optional object, the plan branches into a
//! rebuild for the object being present and one for it being absent.

use serde::Serialize;

use super::path::{FieldPath, PathSegment};
use crate::error::ManifestError;
use crate::manifest::{Field, Object};
use crate::validate::ObjectIndex;

/// A value feeding a field update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "path", rename_all = "snake_case")]
pub enum Operand {
    /// The current request's value at the path, zero when unset.
    Prior(FieldPath),
    /// Literal zero.
    Zero,
    /// The latest response's value at the path.
    Response(FieldPath),
    /// Number of items in the response list at the path.
    ItemCount(FieldPath),
    /// Literal one.
    One,
}

impl Operand {
    /// The operand as seen when the enclosing request object is absent.
    fn absent(&self) -> Self {
        match self {
            Operand::Prior(_) => Operand::Zero,
            other => other.clone(),
        }
    }
}

/// How the paginated field gets its next value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldUpdate {
    /// Overwrite with one operand.
    Replace {
        /// New value.
        value: Operand,
    },
    /// Sum of two operands.
    Sum {
        /// Left operand.
        lhs: Operand,
        /// Right operand.
        rhs: Operand,
    },
}

impl FieldUpdate {
    /// The update as seen when the enclosing request object is absent.
    fn absent(&self) -> Self {
        match self {
            FieldUpdate::Replace { value } => FieldUpdate::Replace {
                value: value.absent(),
            },
            FieldUpdate::Sum { lhs, rhs } => FieldUpdate::Sum {
                lhs: lhs.absent(),
                rhs: rhs.absent(),
            },
        }
    }
}

/// Construction of one object literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestPlan {
    /// Object being built.
    pub object: String,
    /// Every code member of the object, in declaration order.
    pub fields: Vec<FieldPlan>,
}

/// Construction of one field inside a [`RequestPlan`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPlan {
    /// Wire name.
    pub field: String,
    /// How the value is produced; its `plan` tag sits next to `field`.
    #[serde(flatten)]
    pub value: ValuePlan,
}

/// How a field value is produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "plan", rename_all = "snake_case")]
pub enum ValuePlan {
    /// Copied unchanged from the current request.
    Copy {
        /// Location in the current request.
        from: FieldPath,
    },
    /// The authored default, used when the enclosing object is absent.
    Default {
        /// Authored default literal.
        value: String,
    },
    /// Left unset, used when the enclosing object is absent.
    Unset,
    /// The paginated field.
    Update {
        /// Update rule.
        update: FieldUpdate,
    },
    /// A required intermediate object, rebuilt.
    Nested {
        /// Rebuild of the intermediate object.
        rebuild: RequestPlan,
    },
    /// An optional intermediate object, rebuilt for both cases.
    Optional {
        /// Rebuild when the current request carries the object.
        present: RequestPlan,
        /// Construction when it does not.
        absent: RequestPlan,
    },
}

/// Build the next-request plan for `request`, updating the field at
/// `key_path` with `update`.
pub fn plan_next_request(
    index: &ObjectIndex,
    request: &Object,
    key_path: &FieldPath,
    update: &FieldUpdate,
) -> Result<RequestPlan, ManifestError> {
    let segments: Vec<&PathSegment> = key_path.segments().collect();
    let walk = Walk {
        index,
        root: &request.name,
        key_path,
        update,
    };
    walk.rebuild(request, &segments, None, true)
}

struct Walk<'a> {
    index: &'a ObjectIndex,
    root: &'a str,
    key_path: &'a FieldPath,
    update: &'a FieldUpdate,
}

impl Walk<'_> {
    /// Rebuild `object`, whose remaining key path is `segments`. `at` is the
    /// path of `object` inside the request; `present` is false inside an
    /// absent branch.
    fn rebuild(
        &self,
        object: &Object,
        segments: &[&PathSegment],
        at: Option<&FieldPath>,
        present: bool,
    ) -> Result<RequestPlan, ManifestError> {
        let Some((head, rest)) = segments.split_first() else {
            return Err(self.broken("empty key path"));
        };
        if object.member(&head.name).is_none() {
            return Err(self.broken(&format!(
                "'{}' is not a field of '{}'",
                head.name, object.name
            )));
        }

        let mut fields = Vec::new();
        for field in object.members() {
            let value = if field.name != head.name {
                sibling(field, at, present)
            } else if rest.is_empty() {
                ValuePlan::Update {
                    update: if present {
                        self.update.clone()
                    } else {
                        self.update.absent()
                    },
                }
            } else {
                self.descend(field, rest, at, present)?
            };
            fields.push(FieldPlan {
                field: field.name.clone(),
                value,
            });
        }

        Ok(RequestPlan {
            object: object.name.clone(),
            fields,
        })
    }

    fn descend(
        &self,
        field: &Field,
        rest: &[&PathSegment],
        at: Option<&FieldPath>,
        present: bool,
    ) -> Result<ValuePlan, ManifestError> {
        if !field.is_object() {
            return Err(self.broken(&format!("'{}' is not an object field", field.name)));
        }
        let nested = self.index.get(&field.member).ok_or_else(|| {
            self.broken(&format!("'{}' refers to unknown object '{}'", field.name, field.member))
        })?;
        let here = extend(at, field);

        let rebuilt = self.rebuild(nested, rest, Some(&here), present)?;
        if present && field.optional() {
            let absent = self.rebuild(nested, rest, Some(&here), false)?;
            Ok(ValuePlan::Optional {
                present: rebuilt,
                absent,
            })
        } else {
            Ok(ValuePlan::Nested { rebuild: rebuilt })
        }
    }

    fn broken(&self, reason: &str) -> ManifestError {
        ManifestError::KeyPath {
            object: self.root.to_string(),
            path: self.key_path.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// A field the update does not touch.
fn sibling(field: &Field, at: Option<&FieldPath>, present: bool) -> ValuePlan {
    if present {
        return ValuePlan::Copy {
            from: extend(at, field),
        };
    }
    match &field.default {
        Some(value) => ValuePlan::Default {
            value: value.clone(),
        },
        None => ValuePlan::Unset,
    }
}

/// Path of `field` inside the object at `at` (the request root when `None`).
fn extend(at: Option<&FieldPath>, field: &Field) -> FieldPath {
    at.map_or_else(|| FieldPath::of(field), |at| at.child(field))
}
