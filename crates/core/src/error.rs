//! Error types for manifest compilation.
//!
//! Only malformed input is an error. Heuristics that find nothing (no
//! pagination pattern, no common-error equivalent) return `None` instead.

use std::fmt;

use thiserror::Error;

/// A malformed manifest or error catalog. Processing of the affected
/// manifest stops; there is no partial output.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ManifestError {
    /// The document could not be decoded at all.
    #[error("Failed to parse {format} document: {message}")]
    Parse {
        /// Input format name ("JSON", "YAML").
        format: &'static str,
        /// Decoder message, including line/column when available.
        message: String,
    },

    /// A required key is absent or empty.
    #[error("Missing required key '{key}' in {location}")]
    MissingKey {
        /// Where the key was expected (e.g. "metadata", "action 'DescribeFoo'").
        location: String,
        /// The absent key.
        key: String,
    },

    /// A name refers to an object the manifest does not define.
    #[error("{referrer} references undefined object '{object}'")]
    DanglingReference {
        /// Who holds the reference (action slot or object field).
        referrer: String,
        /// The undefined object name.
        object: String,
    },

    /// A name that must be unique appears more than once.
    #[error("Duplicate {what} '{name}'")]
    Duplicate {
        /// What kind of name collided.
        what: String,
        /// The colliding name.
        name: String,
    },

    /// Usage-tag invariants of the object graph are violated.
    #[error("Object '{object}': {reason}")]
    Usage {
        /// The offending object.
        object: String,
        /// What is wrong with its usage.
        reason: String,
    },

    /// A field's kind and member name contradict each other.
    #[error("Field '{object}.{field}': {reason}")]
    FieldConvention {
        /// Object owning the field.
        object: String,
        /// Wire name of the field.
        field: String,
        /// Which naming rule was broken.
        reason: String,
    },

    /// An error code has more than one dot or is empty.
    #[error("Invalid error code '{code}': {reason}")]
    InvalidErrorCode {
        /// The raw dotted code.
        code: String,
        /// Why it was rejected.
        reason: String,
    },

    /// An error definition does not belong to the service being compiled.
    #[error("Error code '{code}' belongs to {found}, expected {expected}")]
    ForeignErrorCode {
        /// The raw dotted code.
        code: String,
        /// `product@version` found on the definition.
        found: String,
        /// `product@version` of the manifest.
        expected: String,
    },

    /// A pagination key path does not lead through object fields.
    #[error("Invalid key path '{path}' in object '{object}': {reason}")]
    KeyPath {
        /// Object the path starts from.
        object: String,
        /// Dot-separated path.
        path: String,
        /// Where the walk broke down.
        reason: String,
    },
}

/// Identity of a manifest: service short name plus API version.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ManifestId {
    /// Service short name (product identifier).
    pub service: String,
    /// API version string.
    pub version: String,
}

impl ManifestId {
    /// Build an identity from its parts.
    pub fn new(service: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            version: version.into(),
        }
    }
}

impl fmt::Display for ManifestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.service, self.version)
    }
}

/// A [`ManifestError`] tagged with the manifest it aborted.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{manifest}: {source}")]
pub struct CompileError {
    /// Which manifest failed. [`ManifestLabel::Origin`] when the document was
    /// too broken to read its metadata.
    pub manifest: ManifestLabel,
    /// The underlying failure.
    #[source]
    pub source: ManifestError,
}

/// How a failing manifest is named in diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManifestLabel {
    /// Metadata was decoded.
    Known(ManifestId),
    /// Only a caller-supplied origin (usually a file path) is available.
    Origin(String),
}

impl fmt::Display for ManifestLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ManifestLabel::Known(id) => id.fmt(f),
            ManifestLabel::Origin(origin) => f.write_str(origin),
        }
    }
}

/// Failure to load a [`crate::CompilerConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        /// Path that was read.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for the config schema.
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        /// Path that was parsed.
        path: String,
        /// Underlying TOML error.
        #[source]
        source: toml::de::Error,
    },
}
