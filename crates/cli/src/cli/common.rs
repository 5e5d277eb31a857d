//! Helpers shared across CLI commands

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use sdkforge_core::{
    CONFIG_FILENAME, CompiledService, CompilerConfig, ErrorCatalog, ManifestSource, SourceFormat,
};
use tempfile::NamedTempFile;
use tracing::debug;

/// Inputs every compiling command accepts.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Error catalog: JSON array of error definitions across services
    #[arg(long, value_name = "FILE")]
    pub errors: Option<PathBuf>,
    /// Config file (defaults to ./sdkforge.toml when present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

impl CommonArgs {
    /// Load the configuration and, if given, the error catalog.
    pub fn load(&self) -> Result<(CompilerConfig, Option<ErrorCatalog>), String> {
        let config = match &self.config {
            Some(path) => CompilerConfig::load(path),
            None => CompilerConfig::load_or_default(Path::new(".")),
        }
        .map_err(|e| e.to_string())?;
        if self.config.is_none() && Path::new(CONFIG_FILENAME).exists() {
            debug!("Using {CONFIG_FILENAME} from the current directory.");
        }

        let catalog = self
            .errors
            .as_deref()
            .map(|path| {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read error catalog {}: {e}", path.display()))?;
                ErrorCatalog::from_json(&contents, &config.errors)
                    .map_err(|e| format!("{}: {e}", path.display()))
            })
            .transpose()?;

        Ok((config, catalog))
    }
}

/// Read a manifest file, choosing the format by extension.
pub fn read_source(path: &Path) -> Result<ManifestSource, String> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        format!(
            "Unsupported manifest {} (expected .json, .yaml or .yml)",
            path.display()
        )
    })?;
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read manifest {}: {e}", path.display()))?;
    Ok(ManifestSource {
        origin: path.display().to_string(),
        format,
        contents,
    })
}

/// Serialize a decision document.
pub fn render(compiled: &CompiledService) -> Result<String, String> {
    let mut document = serde_json::to_string_pretty(compiled)
        .map_err(|e| format!("Failed to serialize {}: {e}", compiled.metadata.short_name))?;
    document.push('\n');
    Ok(document)
}

/// Write `contents` to `path` through a temporary file in the same
/// directory, so readers never see a partial document.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), String> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .map_err(|e| format!("Failed to create directory {}: {e}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| format!("Failed to create temp file in {}: {e}", dir.display()))?;
    tmp.write_all(contents.as_bytes())
        .map_err(|e| format!("Failed to write {}: {e}", path.display()))?;
    tmp.persist(path)
        .map_err(|e| format!("Failed to write {}: {}", path.display(), e.error))?;
    Ok(())
}

/// Spinner on stderr while a long step runs.
pub fn spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner.set_message(message.to_string());
    spinner
}
