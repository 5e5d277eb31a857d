//! Compiler configuration.
//!
//! Stored as TOML (`sdkforge.toml`). Every key is optional:
//!
//! ```toml
//! [pagination]
//! associative_total_count = true
//!
//! [errors]
//! common_product = "common"
//! no_solution_markers = ["", "无", "暂无"]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default config filename looked up by the CLI.
pub const CONFIG_FILENAME: &str = "sdkforge.toml";

/// Top-level compiler configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompilerConfig {
    /// Pagination inference options.
    pub pagination: PaginationConfig,
    /// Error taxonomy options.
    pub errors: ErrorsConfig,
}

/// Options for the pagination inference engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PaginationConfig {
    /// Derive total-count field names from the item list name
    /// (`InstanceSet` -> `InstanceCount`) and look one object level deeper.
    pub associative_total_count: bool,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            associative_total_count: true,
        }
    }
}

/// Options for the error taxonomy builder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ErrorsConfig {
    /// Product name under which platform-wide common errors are catalogued.
    pub common_product: String,
    /// `solution` values that mean "no solution" and are dropped.
    pub no_solution_markers: Vec<String>,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            common_product: "common".to_string(),
            no_solution_markers: ["", "无", "暂无", "-", "N/A", "None"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl ErrorsConfig {
    /// Whether a raw solution text is one of the "no solution" markers.
    pub fn is_no_solution(&self, solution: &str) -> bool {
        let trimmed = solution.trim();
        self.no_solution_markers
            .iter()
            .any(|marker| marker.trim() == trimmed)
    }
}

impl CompilerConfig {
    /// Parse configuration from TOML text.
    pub fn from_toml(contents: &str, origin: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&contents, &path.display().to_string())
    }

    /// Load `sdkforge.toml` from `dir` if it exists, otherwise defaults.
    pub fn load_or_default(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILENAME);
        if path.exists() {
            Self::load(&path)
        } else {
            Ok(Self::default())
        }
    }
}
