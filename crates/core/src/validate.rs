//! Object graph validation.
//!
//! Establishes the whole-manifest invariants and produces the read-only
//! [`ObjectIndex`] every later stage resolves object names through:
//! - Request/response bodies are used by exactly one action slot, carry no
//!   source usage tag and are never used as field types.
//! - Every other object (fragment) declares its usage.
//! - Fragments unreachable from any body are reported and left out of the
//!   canonical ordering.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, warn};

use crate::error::{ManifestError, ManifestId};
use crate::manifest::{Action, Manifest, Metadata, Object, Usage};

/// Read-only name index over a manifest's objects, with usage assigned.
#[derive(Debug, Clone)]
pub struct ObjectIndex {
    objects: BTreeMap<String, Object>,
}

impl ObjectIndex {
    /// Look up an object by name.
    pub fn get(&self, name: &str) -> Option<&Object> {
        self.objects.get(name)
    }

    /// Look up an object that must exist.
    pub fn require(&self, name: &str, referrer: &str) -> Result<&Object, ManifestError> {
        self.get(name)
            .ok_or_else(|| ManifestError::DanglingReference {
                referrer: referrer.to_string(),
                object: name.to_string(),
            })
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All objects, sorted by name.
    pub fn iter(&self) -> impl Iterator<Item = &Object> {
        self.objects.values()
    }
}

impl FromIterator<Object> for ObjectIndex {
    fn from_iter<I: IntoIterator<Item = Object>>(iter: I) -> Self {
        Self {
            objects: iter.into_iter().map(|o| (o.name.clone(), o)).collect(),
        }
    }
}

/// A manifest that passed graph validation.
#[derive(Debug, Clone)]
pub struct ValidatedManifest {
    /// Service metadata.
    pub metadata: Metadata,
    /// Actions sorted by name.
    pub actions: Vec<Action>,
    /// Objects with usage assigned.
    pub index: ObjectIndex,
    /// Canonical object ordering: each action's input and output body, then
    /// reachable fragments by name.
    pub order: Vec<String>,
    /// Fragments no body reaches, sorted by name.
    pub unreachable: Vec<String>,
}

impl ValidatedManifest {
    /// Identity of the validated manifest.
    pub fn id(&self) -> ManifestId {
        self.metadata.id()
    }

    /// Objects in canonical order.
    pub fn ordered_objects(&self) -> impl Iterator<Item = &Object> {
        self.order.iter().filter_map(|name| self.index.get(name))
    }
}

/// Validate the object graph and assign usage to request/response bodies.
pub fn validate(manifest: Manifest) -> Result<ValidatedManifest, ManifestError> {
    let Manifest {
        metadata,
        actions,
        objects,
    } = manifest;

    let bodies = collect_bodies(&actions)?;
    let member_refs = collect_member_refs(&objects);

    for object in objects.values() {
        match bodies.get(&object.name) {
            Some(_) => {
                if object.usage.is_some() {
                    return Err(ManifestError::Usage {
                        object: object.name.clone(),
                        reason: "request/response body must not declare a usage tag".into(),
                    });
                }
                if member_refs.contains(object.name.as_str()) {
                    return Err(ManifestError::Usage {
                        object: object.name.clone(),
                        reason: "request/response body is also used as a field type".into(),
                    });
                }
            }
            None => {
                if object.usage.is_none() {
                    return Err(ManifestError::Usage {
                        object: object.name.clone(),
                        reason: "object is not a request/response body and declares no usage tag"
                            .into(),
                    });
                }
            }
        }
    }

    let reached = reach_fragments(&objects, &bodies);

    let mut unreachable = Vec::new();
    let mut fragments = Vec::new();
    for object in objects.values().filter(|o| !bodies.contains_key(&o.name)) {
        match (reached.get(&object.name), object.usage) {
            (None, _) => {
                warn!(
                    service = %metadata.short_name,
                    object = %object.name,
                    "Object is not reachable from any action; skipping."
                );
                unreachable.push(object.name.clone());
            }
            (Some(actual), Some(declared)) => {
                if !declared.covers(*actual) {
                    warn!(
                        service = %metadata.short_name,
                        object = %object.name,
                        declared = ?declared,
                        actual = ?actual,
                        "Object usage tag is narrower than its actual usage."
                    );
                }
                fragments.push(object.name.clone());
            }
            (Some(_), None) => fragments.push(object.name.clone()),
        }
    }

    let mut order = Vec::with_capacity(bodies.len() + fragments.len());
    for action in actions.values() {
        order.push(action.input.clone());
        order.push(action.output.clone());
    }
    order.extend(fragments);

    let index = objects
        .into_values()
        .map(|mut object| {
            if let Some(usage) = bodies.get(&object.name) {
                object.usage = Some(*usage);
            }
            object
        })
        .collect::<ObjectIndex>();

    debug!(
        service = %metadata.short_name,
        bodies = bodies.len(),
        fragments = order.len() - bodies.len(),
        unreachable = unreachable.len(),
        "Validated object graph."
    );

    Ok(ValidatedManifest {
        metadata,
        actions: actions.into_values().collect(),
        index,
        order,
        unreachable,
    })
}

/// Map every body object to its direction, rejecting shared bodies.
fn collect_bodies(actions: &BTreeMap<String, Action>) -> Result<BTreeMap<String, Usage>, ManifestError> {
    let mut bodies = BTreeMap::new();
    for action in actions.values() {
        for (object, usage) in [(&action.input, Usage::Input), (&action.output, Usage::Output)] {
            if bodies.insert(object.clone(), usage).is_some() {
                return Err(ManifestError::Duplicate {
                    what: "request/response body".into(),
                    name: object.clone(),
                });
            }
        }
    }
    Ok(bodies)
}

/// Names of every object used as a code member type. Disabled fields do not
/// count, matching [`reach_fragments`].
fn collect_member_refs(objects: &BTreeMap<String, Object>) -> BTreeSet<&str> {
    objects
        .values()
        .flat_map(|o| o.members())
        .filter_map(|f| f.object_ref())
        .collect()
}

/// Breadth-first walk from every body, recording the directions each
/// fragment is reached from.
fn reach_fragments(
    objects: &BTreeMap<String, Object>,
    bodies: &BTreeMap<String, Usage>,
) -> BTreeMap<String, Usage> {
    let mut reached: BTreeMap<String, Usage> = BTreeMap::new();
    let mut queue: VecDeque<(&str, Usage)> = bodies
        .iter()
        .map(|(name, usage)| (name.as_str(), *usage))
        .collect();

    while let Some((name, usage)) = queue.pop_front() {
        let Some(object) = objects.get(name) else {
            continue;
        };
        for target in object.members().filter_map(|f| f.object_ref()) {
            let merged = match reached.get(target) {
                Some(existing) if existing.covers(usage) => continue,
                Some(existing) => existing.merge(usage),
                None => usage,
            };
            reached.insert(target.to_string(), merged);
            queue.push_back((target, merged));
        }
    }

    reached
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::manifest::decode_json;

    fn validate_json(objects: &str, actions: &str) -> Result<ValidatedManifest, ManifestError> {
        let json = format!(
            r#"{{"metadata": {{"shortName": "cvm", "displayName": "CVM", "version": "2017-03-12"}},
                "actions": {actions}, "objects": {objects}}}"#
        );
        validate(decode_json(&json).unwrap())
    }

    const ACTIONS: &str = r#"{"DescribeZones": {"input": "DescribeZonesRequest", "output": "DescribeZonesResponse"}}"#;

    #[test]
    fn test_assigns_body_usage_and_order() {
        let v = validate_json(
            r#"{
                "DescribeZonesRequest": {"members": [{"name": "Filters", "type": "list", "member": "Filter"}]},
                "DescribeZonesResponse": {"members": [{"name": "ZoneSet", "type": "list", "member": "ZoneInfo"}]},
                "ZoneInfo": {"usage": "out", "members": []},
                "Filter": {"usage": "in", "members": []},
                "Orphan": {"usage": "both", "members": []}
            }"#,
            ACTIONS,
        )
        .unwrap();

        assert_eq!(
            v.index.get("DescribeZonesRequest").unwrap().usage,
            Some(Usage::Input)
        );
        assert_eq!(
            v.index.get("DescribeZonesResponse").unwrap().usage,
            Some(Usage::Output)
        );
        assert_eq!(
            v.order,
            ["DescribeZonesRequest", "DescribeZonesResponse", "Filter", "ZoneInfo"]
        );
        assert_eq!(v.unreachable, ["Orphan"]);
        assert_eq!(v.ordered_objects().count(), 4);
    }

    #[test]
    fn test_body_with_usage_tag_rejected() {
        let err = validate_json(
            r#"{"DescribeZonesRequest": {"usage": "in"}, "DescribeZonesResponse": {}}"#,
            ACTIONS,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Usage { ref object, .. } if object == "DescribeZonesRequest"));
    }

    #[test]
    fn test_fragment_without_usage_rejected() {
        let err = validate_json(
            r#"{"DescribeZonesRequest": {}, "DescribeZonesResponse": {}, "Zone": {}}"#,
            ACTIONS,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Usage { ref object, .. } if object == "Zone"));
    }

    #[test]
    fn test_body_used_as_field_type_rejected() {
        let err = validate_json(
            r#"{
                "DescribeZonesRequest": {},
                "DescribeZonesResponse": {"members": [{"name": "Echo", "type": "object", "member": "DescribeZonesRequest"}]}
            }"#,
            ACTIONS,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Usage { ref object, .. } if object == "DescribeZonesRequest"));
    }

    #[test]
    fn test_disabled_fields_do_not_reference_objects() {
        let v = validate_json(
            r#"{
                "DescribeZonesRequest": {},
                "DescribeZonesResponse": {"members": [
                    {"name": "Echo", "type": "object", "member": "DescribeZonesRequest", "disabled": true},
                    {"name": "Legacy", "type": "object", "member": "LegacyZone", "disabled": true}
                ]},
                "LegacyZone": {"usage": "out", "members": []}
            }"#,
            ACTIONS,
        )
        .unwrap();
        assert_eq!(v.unreachable, ["LegacyZone"]);
        assert_eq!(v.order, ["DescribeZonesRequest", "DescribeZonesResponse"]);
    }

    #[test]
    fn test_shared_body_rejected() {
        let err = validate_json(
            r#"{"SharedRequest": {}, "AResponse": {}, "BResponse": {}}"#,
            r#"{"A": {"input": "SharedRequest", "output": "AResponse"},
                "B": {"input": "SharedRequest", "output": "BResponse"}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ManifestError::Duplicate { ref name, .. } if name == "SharedRequest"));
    }

    #[test]
    fn test_nested_fragments_reachable() {
        let v = validate_json(
            r#"{
                "DescribeZonesRequest": {},
                "DescribeZonesResponse": {"members": [{"name": "Zone", "type": "object", "member": "Zone"}]},
                "Zone": {"usage": "out", "members": [{"name": "Region", "type": "object", "member": "Region"}]},
                "Region": {"usage": "both", "members": [{"name": "Parent", "type": "object", "member": "Region"}]}
            }"#,
            ACTIONS,
        )
        .unwrap();
        assert!(v.unreachable.is_empty());
        assert_eq!(v.order[2..], ["Region", "Zone"]);
    }

    #[test]
    fn test_require_reports_referrer() {
        let index: ObjectIndex = Vec::<Object>::new().into_iter().collect();
        let err = index.require("Missing", "field 'A.B'").unwrap_err();
        assert_eq!(
            err,
            ManifestError::DanglingReference {
                referrer: "field 'A.B'".into(),
                object: "Missing".into()
            }
        );
        assert!(index.is_empty());
    }
}
