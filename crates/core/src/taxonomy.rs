//! Error taxonomy: flat dotted error codes -> two-level domain hierarchy.
//!
//! `AuthFailure.SignatureExpire` belongs to the `AuthFailure` domain with the
//! within-domain identifier `signatureExpire`. A code that equals a domain
//! name (`AuthFailure`) is that domain's catch-all and is always listed last
//! as `other`. Codes with more than one dot are malformed.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ErrorsConfig;
use crate::error::{ManifestError, ManifestId};
use crate::naming::{error_identifier, lowercase_first};

/// Within-domain identifier of a domain's catch-all code.
pub const OTHER_IDENTIFIER: &str = "other";

/// One error code of a service (or of the common platform taxonomy).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDefinition {
    /// Dotted code, e.g. `AuthFailure.SignatureExpire`.
    pub code: String,
    /// Localized description.
    pub description: String,
    /// Suggested resolution; absent when the catalog says there is none.
    pub solution: Option<String>,
    /// Product identifier (service short name).
    pub product: String,
    /// Product API version.
    pub product_version: String,
}

impl ErrorDefinition {
    /// Canonical identifier: `authFailure_SignatureExpire`.
    pub fn identifier(&self) -> String {
        error_identifier(&self.code)
    }

    fn belongs_to(&self, id: &ManifestId) -> bool {
        self.product == id.service && self.product_version == id.version
    }
}

#[derive(Debug, Deserialize)]
struct RawErrorDefinition {
    code: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    solution: Option<String>,
    #[serde(alias = "productName")]
    product: String,
    #[serde(default, alias = "productVersion", alias = "version")]
    product_version: String,
}

/// Error definitions across all services, as shipped in one document.
#[derive(Debug, Clone, Default)]
pub struct ErrorCatalog {
    definitions: Vec<ErrorDefinition>,
    common_product: String,
}

impl ErrorCatalog {
    /// Parse a JSON array of error records, normalizing "no solution"
    /// markers to absent.
    pub fn from_json(json: &str, config: &ErrorsConfig) -> Result<Self, ManifestError> {
        let raw: Vec<RawErrorDefinition> =
            serde_json::from_str(json).map_err(|e| ManifestError::Parse {
                format: "JSON",
                message: e.to_string(),
            })?;

        let definitions = raw
            .into_iter()
            .map(|r| ErrorDefinition {
                code: r.code.trim().to_string(),
                description: r.description.trim().to_string(),
                solution: r
                    .solution
                    .filter(|s| !config.is_no_solution(s))
                    .map(|s| s.trim().to_string()),
                product: r.product,
                product_version: r.product_version,
            })
            .collect();

        Ok(Self::from_definitions(definitions, config))
    }

    /// Wrap already-decoded definitions.
    pub fn from_definitions(definitions: Vec<ErrorDefinition>, config: &ErrorsConfig) -> Self {
        Self {
            definitions,
            common_product: config.common_product.clone(),
        }
    }

    /// Definitions belonging to one service version.
    pub fn for_service(&self, id: &ManifestId) -> Vec<ErrorDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.belongs_to(id))
            .cloned()
            .collect()
    }

    /// Index of the platform-wide common errors (any version).
    pub fn common(&self) -> CommonErrorIndex {
        CommonErrorIndex::new(
            self.definitions
                .iter()
                .filter(|d| d.product == self.common_product)
                .cloned(),
        )
    }

    /// Number of definitions in the catalog.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// A service error re-expressed as its common equivalent, carrying the
/// caller's context through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommonMatch<C> {
    /// Identifier of the common error.
    pub identifier: String,
    /// The shared raw code.
    pub code: String,
    /// Caller context, untouched.
    pub context: C,
}

/// Lookup table of platform-wide common errors by raw code.
#[derive(Debug, Clone, Default)]
pub struct CommonErrorIndex {
    by_code: BTreeMap<String, ErrorDefinition>,
}

impl CommonErrorIndex {
    /// Build the index; the first definition of a code wins.
    pub fn new(definitions: impl IntoIterator<Item = ErrorDefinition>) -> Self {
        let mut by_code = BTreeMap::new();
        for definition in definitions {
            by_code
                .entry(definition.code.clone())
                .or_insert(definition);
        }
        Self { by_code }
    }

    /// Whether a raw code is also a common error code.
    pub fn contains(&self, code: &str) -> bool {
        self.by_code.contains_key(code)
    }

    /// Map a service error code to its common equivalent. `None` means there
    /// is no common equivalent, which is a normal outcome.
    pub fn to_common<C>(&self, code: &str, context: C) -> Option<CommonMatch<C>> {
        self.by_code.get(code).map(|common| CommonMatch {
            identifier: common.identifier(),
            code: common.code.clone(),
            context,
        })
    }

    /// Number of common errors.
    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    /// Whether there are no common errors.
    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}

/// An entry of a domain's ordered error map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DomainError {
    /// Within-domain identifier (`signatureExpire`, or `other`).
    pub identifier: String,
    /// Canonical identifier in the all-errors map.
    pub full_identifier: String,
    /// Raw dotted code.
    pub code: String,
}

impl DomainError {
    /// Whether this is the domain's catch-all.
    pub fn is_other(&self) -> bool {
        self.identifier == OTHER_IDENTIFIER
    }
}

/// A node of the error hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorDomain {
    /// A dot-less code that is not a domain.
    TopLevel {
        /// Canonical identifier.
        identifier: String,
        /// Raw code.
        code: String,
    },
    /// A domain with its ordered sub-codes (`other` last).
    Domain {
        /// Domain name (left-hand segment).
        name: String,
        /// Ordered entries.
        errors: Vec<DomainError>,
    },
}

impl ErrorDomain {
    /// Domain name or top-level code, used for ordering.
    pub fn name(&self) -> &str {
        match self {
            ErrorDomain::TopLevel { code, .. } => code,
            ErrorDomain::Domain { name, .. } => name,
        }
    }
}

/// The error taxonomy of one service version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorTaxonomy {
    /// Every error by canonical identifier.
    pub all: BTreeMap<String, ErrorDefinition>,
    /// Domains and top-level codes, sorted by name.
    pub domains: Vec<ErrorDomain>,
    /// Canonical identifier -> common error identifier, where one exists.
    pub common: BTreeMap<String, String>,
}

impl ErrorTaxonomy {
    /// Build the taxonomy for `id` from its (already filtered) definitions.
    pub fn build(
        id: &ManifestId,
        definitions: &[ErrorDefinition],
        common: &CommonErrorIndex,
    ) -> Result<Self, ManifestError> {
        let mut seen = HashSet::new();
        let mut all = BTreeMap::new();

        for definition in definitions {
            if !definition.belongs_to(id) {
                return Err(ManifestError::ForeignErrorCode {
                    code: definition.code.clone(),
                    found: format!("{}@{}", definition.product, definition.product_version),
                    expected: id.to_string(),
                });
            }
            check_code(&definition.code)?;
            if !seen.insert(definition.code.as_str()) {
                warn!(
                    service = %id,
                    code = %definition.code,
                    "Duplicate error code; keeping the first definition."
                );
                continue;
            }
            let identifier = definition.identifier();
            if all.insert(identifier.clone(), definition.clone()).is_some() {
                return Err(ManifestError::Duplicate {
                    what: "error identifier".into(),
                    name: identifier,
                });
            }
        }

        let domain_names: BTreeSet<&str> = all
            .values()
            .filter_map(|d| d.code.split_once('.').map(|(domain, _)| domain))
            .collect();

        let mut domains = domain_names
            .iter()
            .map(|name| {
                Ok(ErrorDomain::Domain {
                    name: (*name).to_string(),
                    errors: domain_errors(name, &all)?,
                })
            })
            .collect::<Result<Vec<_>, ManifestError>>()?;
        domains.extend(
            all.iter()
                .filter(|(_, d)| !d.code.contains('.') && !domain_names.contains(d.code.as_str()))
                .map(|(identifier, d)| ErrorDomain::TopLevel {
                    identifier: identifier.clone(),
                    code: d.code.clone(),
                }),
        );
        domains.sort_by(|a, b| a.name().cmp(b.name()));

        let common_map: BTreeMap<String, String> = all
            .iter()
            .filter_map(|(identifier, d)| {
                common
                    .to_common(&d.code, ())
                    .map(|m| (identifier.clone(), m.identifier))
            })
            .collect();

        debug!(
            service = %id,
            errors = all.len(),
            domains = domain_names.len(),
            common = common_map.len(),
            "Built error taxonomy."
        );

        Ok(Self {
            all,
            domains,
            common: common_map,
        })
    }

    /// Ordered entries of one domain.
    pub fn domain(&self, name: &str) -> Option<&[DomainError]> {
        self.domains.iter().find_map(|d| match d {
            ErrorDomain::Domain { name: n, errors } if n == name => Some(errors.as_slice()),
            _ => None,
        })
    }

    /// Names of all domains, sorted.
    pub fn domain_names(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().filter_map(|d| match d {
            ErrorDomain::Domain { name, .. } => Some(name.as_str()),
            ErrorDomain::TopLevel { .. } => None,
        })
    }
}

/// Reject empty codes, empty segments and codes with more than one dot.
fn check_code(code: &str) -> Result<(), ManifestError> {
    let invalid = |reason: &str| ManifestError::InvalidErrorCode {
        code: code.to_string(),
        reason: reason.to_string(),
    };
    if code.is_empty() {
        return Err(invalid("code is empty"));
    }
    let segments: Vec<&str> = code.split('.').collect();
    if segments.len() > 2 {
        return Err(invalid("more than one dot"));
    }
    if segments.iter().any(|s| s.is_empty()) {
        return Err(invalid("empty segment"));
    }
    Ok(())
}

/// Entries of one domain, sorted by identifier with `other` moved last.
///
/// Identifiers must be unique within the domain: `Foo.A` and `Foo.a` both
/// map to `a`.
fn domain_errors(
    domain: &str,
    all: &BTreeMap<String, ErrorDefinition>,
) -> Result<Vec<DomainError>, ManifestError> {
    let mut errors: Vec<DomainError> = all
        .iter()
        .filter_map(|(full_identifier, d)| {
            let identifier = if d.code == domain {
                OTHER_IDENTIFIER.to_string()
            } else {
                let (prefix, rest) = d.code.split_once('.')?;
                if prefix != domain {
                    return None;
                }
                lowercase_first(rest)
            };
            Some(DomainError {
                identifier,
                full_identifier: full_identifier.clone(),
                code: d.code.clone(),
            })
        })
        .collect();

    errors.sort_by(|a, b| {
        (a.is_other(), &a.identifier, &a.code).cmp(&(b.is_other(), &b.identifier, &b.code))
    });
    if let Some(clash) = errors.windows(2).find_map(|pair| match pair {
        [a, b] if a.identifier == b.identifier => Some(b),
        _ => None,
    }) {
        return Err(ManifestError::Duplicate {
            what: format!("error identifier in domain '{domain}'"),
            name: clash.identifier.clone(),
        });
    }
    Ok(errors)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn id() -> ManifestId {
        ManifestId::new("cvm", "2017-03-12")
    }

    fn def(code: &str) -> ErrorDefinition {
        ErrorDefinition {
            code: code.into(),
            description: format!("{code} happened"),
            solution: None,
            product: "cvm".into(),
            product_version: "2017-03-12".into(),
        }
    }

    fn build(codes: &[&str]) -> Result<ErrorTaxonomy, ManifestError> {
        let defs: Vec<_> = codes.iter().map(|c| def(c)).collect();
        ErrorTaxonomy::build(&id(), &defs, &CommonErrorIndex::default())
    }

    fn identifiers(errors: &[DomainError]) -> Vec<&str> {
        errors.iter().map(|e| e.identifier.as_str()).collect()
    }

    #[test]
    fn test_other_is_last() {
        let taxonomy = build(&["Foo.Z", "Foo", "Foo.A"]).unwrap();
        assert_eq!(identifiers(taxonomy.domain("Foo").unwrap()), ["a", "z", "other"]);
    }

    #[test]
    fn test_other_last_regardless_of_input_order() {
        for codes in [
            ["Foo", "Foo.A", "Foo.Z"],
            ["Foo.A", "Foo.Z", "Foo"],
            ["Foo.Z", "Foo.A", "Foo"],
        ] {
            let taxonomy = build(&codes).unwrap();
            assert_eq!(identifiers(taxonomy.domain("Foo").unwrap()), ["a", "z", "other"]);
        }
    }

    #[test]
    fn test_all_errors_sorted_by_identifier() {
        let taxonomy = build(&["InvalidParameter.Zone", "AuthFailure", "InternalError"]).unwrap();
        let keys: Vec<_> = taxonomy.all.keys().map(String::as_str).collect();
        assert_eq!(keys, ["authFailure", "internalError", "invalidParameter_Zone"]);
    }

    #[test]
    fn test_domains_and_top_level() {
        let taxonomy = build(&[
            "ResourceNotFound",
            "AuthFailure.SignatureExpire",
            "AuthFailure.TokenFailure",
            "InternalError",
        ])
        .unwrap();
        let names: Vec<_> = taxonomy.domains.iter().map(|d| d.name()).collect();
        assert_eq!(names, ["AuthFailure", "InternalError", "ResourceNotFound"]);
        assert_eq!(taxonomy.domain_names().collect::<Vec<_>>(), ["AuthFailure"]);
        assert!(matches!(
            &taxonomy.domains[1],
            ErrorDomain::TopLevel { identifier, .. } if identifier == "internalError"
        ));
        let auth = taxonomy.domain("AuthFailure").unwrap();
        assert_eq!(identifiers(auth), ["signatureExpire", "tokenFailure"]);
        assert_eq!(auth[0].full_identifier, "authFailure_SignatureExpire");
    }

    #[test]
    fn test_two_dots_rejected() {
        let err = build(&["A.B", "A.B.C"]).unwrap_err();
        assert_eq!(
            err,
            ManifestError::InvalidErrorCode {
                code: "A.B.C".into(),
                reason: "more than one dot".into()
            }
        );
    }

    #[test]
    fn test_domain_identifier_collision_rejected() {
        let err = build(&["Foo.A", "Foo.a"]).unwrap_err();
        assert_eq!(
            err,
            ManifestError::Duplicate {
                what: "error identifier in domain 'Foo'".into(),
                name: "a".into()
            }
        );

        let err = build(&["Foo", "Foo.Other"]).unwrap_err();
        assert!(matches!(err, ManifestError::Duplicate { ref name, .. } if name == "other"));

        assert!(build(&["Foo.A", "Bar.a"]).is_ok());
    }

    #[test]
    fn test_empty_segment_rejected() {
        assert!(build(&["Foo."]).is_err());
        assert!(build(&[".Foo"]).is_err());
    }

    #[test]
    fn test_foreign_code_rejected() {
        let mut foreign = def("FailedOperation");
        foreign.product = "cbs".into();
        let err = ErrorTaxonomy::build(&id(), &[foreign], &CommonErrorIndex::default())
            .unwrap_err();
        assert!(matches!(err, ManifestError::ForeignErrorCode { ref found, .. } if found == "cbs@2017-03-12"));
    }

    #[test]
    fn test_duplicate_codes_collapsed() {
        let taxonomy = build(&["Foo.A", "Foo.A"]).unwrap();
        assert_eq!(taxonomy.all.len(), 1);
    }

    #[test]
    fn test_common_mapping() {
        let mut common_def = def("AuthFailure.SignatureExpire");
        common_def.product = "common".into();
        let common = CommonErrorIndex::new([common_def]);

        let defs = [def("AuthFailure.SignatureExpire"), def("FailedOperation.Quota")];
        let taxonomy = ErrorTaxonomy::build(&id(), &defs, &common).unwrap();
        assert_eq!(
            taxonomy.common.get("authFailure_SignatureExpire").map(String::as_str),
            Some("authFailure_SignatureExpire")
        );
        assert!(!taxonomy.common.contains_key("failedOperation_Quota"));

        let matched = common
            .to_common("AuthFailure.SignatureExpire", ("req-1", 42))
            .unwrap();
        assert_eq!(matched.identifier, "authFailure_SignatureExpire");
        assert_eq!(matched.context, ("req-1", 42));
        assert!(common.to_common("FailedOperation.Quota", ()).is_none());
    }

    #[test]
    fn test_catalog_from_json() {
        let config = ErrorsConfig::default();
        let catalog = ErrorCatalog::from_json(
            r#"[
                {"code": "FailedOperation", "description": "Failed.", "solution": "暂无",
                 "productName": "cvm", "productVersion": "2017-03-12"},
                {"code": "InternalError", "description": "Oops.", "solution": "Retry.",
                 "productName": "cvm", "productVersion": "2017-03-12"},
                {"code": "InternalError", "description": "Oops.", "productName": "cbs",
                 "productVersion": "2017-03-12"},
                {"code": "AuthFailure", "description": "Denied.", "productName": "common"}
            ]"#,
            &config,
        )
        .unwrap();
        assert_eq!(catalog.len(), 4);

        let cvm = catalog.for_service(&id());
        assert_eq!(cvm.len(), 2);
        assert_eq!(cvm[0].solution, None);
        assert_eq!(cvm[1].solution.as_deref(), Some("Retry."));

        let common = catalog.common();
        assert_eq!(common.len(), 1);
        assert!(common.contains("AuthFailure"));
    }
}
