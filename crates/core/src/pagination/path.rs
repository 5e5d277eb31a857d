//! Field paths through nested objects.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::manifest::{Field, FieldKind, Object};
use crate::validate::ObjectIndex;

/// How many object levels a field search descends below its start object.
pub const MAX_DEPTH: usize = 4;

/// One step of a [`FieldPath`], with the field metadata plan building needs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PathSegment {
    /// Wire name of the field.
    pub name: String,
    /// Field kind.
    pub kind: FieldKind,
    /// Member name (object name for intermediate segments).
    pub member: String,
    /// Stored-value optionality.
    pub optional: bool,
}

impl PathSegment {
    /// Capture a field as a path segment.
    pub fn of(field: &Field) -> Self {
        Self {
            name: field.name.clone(),
            kind: field.kind,
            member: field.member.clone(),
            optional: field.optional(),
        }
    }
}

/// A non-empty, dot-separated path from an object to one of its (possibly
/// nested) fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    parents: Vec<PathSegment>,
    leaf: PathSegment,
}

impl FieldPath {
    /// Path to a direct field.
    pub fn of(field: &Field) -> Self {
        Self {
            parents: Vec::new(),
            leaf: PathSegment::of(field),
        }
    }

    /// The same path seen from the object owning `parent`.
    pub fn within(mut self, parent: &Field) -> Self {
        self.parents.insert(0, PathSegment::of(parent));
        self
    }

    /// Path to `field` inside the object this path addresses.
    pub fn child(&self, field: &Field) -> Self {
        let mut parents = self.parents.clone();
        parents.push(self.leaf.clone());
        Self {
            parents,
            leaf: PathSegment::of(field),
        }
    }

    /// The addressed field.
    pub fn leaf(&self) -> &PathSegment {
        &self.leaf
    }

    /// Intermediate object fields, outermost first.
    pub fn parents(&self) -> &[PathSegment] {
        &self.parents
    }

    /// All segments, outermost first.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.parents.iter().chain(std::iter::once(&self.leaf))
    }

    /// Whether the path goes through at least one intermediate object.
    pub fn is_nested(&self) -> bool {
        !self.parents.is_empty()
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for parent in &self.parents {
            write!(f, "{}.", parent.name)?;
        }
        f.write_str(&self.leaf.name)
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The sole non-list object member of `object`, if there is exactly one.
pub fn sole_object_member(object: &Object) -> Option<&Field> {
    let mut objects = object.payload_members().filter(|f| f.is_object());
    let first = objects.next()?;
    objects.next().is_none().then_some(first)
}

/// Find the first code member of `object` for which `probe` yields a value.
///
/// When no direct member matches and `object` has exactly one non-list
/// object member, the search continues inside that member, down to
/// [`MAX_DEPTH`] levels.
pub fn locate_map<'a, T>(
    index: &'a ObjectIndex,
    object: &'a Object,
    probe: &mut dyn FnMut(&'a Field) -> Option<T>,
) -> Option<(FieldPath, T)> {
    locate_at(index, object, probe, MAX_DEPTH)
}

/// Find the first code member of `object` matching `predicate`, descending
/// like [`locate_map`].
pub fn locate<'a>(
    index: &'a ObjectIndex,
    object: &'a Object,
    predicate: impl Fn(&Field) -> bool,
) -> Option<FieldPath> {
    locate_map(index, object, &mut |f| predicate(f).then_some(())).map(|(path, ())| path)
}

fn locate_at<'a, T>(
    index: &'a ObjectIndex,
    object: &'a Object,
    probe: &mut dyn FnMut(&'a Field) -> Option<T>,
    depth: usize,
) -> Option<(FieldPath, T)> {
    for field in object.payload_members() {
        if let Some(found) = probe(field) {
            return Some((FieldPath::of(field), found));
        }
    }
    if depth == 0 {
        return None;
    }
    let parent = sole_object_member(object)?;
    let nested = index.get(&parent.member)?;
    locate_at(index, nested, probe, depth - 1).map(|(path, found)| (path.within(parent), found))
}
