use std::path::{Path, PathBuf};

use clap::Args;
use console::style;
use rayon::prelude::*;
use sdkforge_core::{CompiledService, SourceFormat, compile_all};
use tracing::debug;
use walkdir::WalkDir;

use super::common::{CommonArgs, read_source, render, spinner, write_atomic};

#[derive(Args, Debug, Clone)]
pub struct BatchArgs {
    /// Directory searched recursively for manifests
    #[arg(value_name = "DIR")]
    pub input: PathBuf,
    /// Directory receiving one decision document per manifest
    #[arg(long = "out-dir", value_name = "DIR")]
    pub out_dir: PathBuf,
    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn run(args: BatchArgs) -> i32 {
    match batch(&args) {
        Ok(0) => 0,
        Ok(failures) => {
            eprintln!(
                "{} {failures} manifest(s) failed",
                style("error:").red().bold()
            );
            1
        }
        Err(err) => {
            eprintln!("{} {err}", style("error:").red().bold());
            1
        }
    }
}

/// Compile every manifest and return the number of failures.
fn batch(args: &BatchArgs) -> Result<usize, String> {
    let (config, catalog) = args.common.load()?;
    let paths = discover(&args.input, &args.out_dir)?;
    if paths.is_empty() {
        return Err(format!("No manifests found under {}", args.input.display()));
    }

    let sources = paths
        .par_iter()
        .map(|path| read_source(path))
        .collect::<Result<Vec<_>, _>>()?;

    let progress = spinner(&format!("Compiling {} manifest(s)", sources.len()));
    let results = compile_all(&sources, catalog.as_ref(), &config);
    progress.finish_and_clear();

    let mut failures = 0;
    for (source, result) in sources.iter().zip(results) {
        let written = result
            .map_err(|e| e.to_string())
            .and_then(|compiled| write_document(&args.out_dir, &compiled));
        match written {
            Ok(path) => println!(
                "{} {} -> {}",
                style("✓").green(),
                source.origin,
                path.display()
            ),
            Err(err) => {
                failures += 1;
                eprintln!("{} {err}", style("✗").red());
            }
        }
    }
    Ok(failures)
}

/// Manifest files under `input`, sorted, skipping `out_dir`.
fn discover(input: &Path, out_dir: &Path) -> Result<Vec<PathBuf>, String> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(input)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.path() != out_dir)
    {
        let entry = entry.map_err(|e| format!("Failed to scan {}: {e}", input.display()))?;
        if entry.file_type().is_file() && SourceFormat::from_path(entry.path()).is_some() {
            paths.push(entry.into_path());
        }
    }
    debug!(count = paths.len(), dir = %input.display(), "Discovered manifests.");
    Ok(paths)
}

fn write_document(out_dir: &Path, compiled: &CompiledService) -> Result<PathBuf, String> {
    let path = out_dir.join(format!(
        "{}-{}.json",
        compiled.metadata.short_name, compiled.metadata.version
    ));
    write_atomic(&path, &render(compiled)?)?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_discover_filters_and_sorts() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(dir.path().join("b")).unwrap();
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(dir.path().join("b/cbs.yaml"), "").unwrap();
        std::fs::write(dir.path().join("a.json"), "").unwrap();
        std::fs::write(dir.path().join("notes.md"), "").unwrap();
        std::fs::write(out.join("old.json"), "").unwrap();

        let found = discover(dir.path(), &out).unwrap();
        let names: Vec<_> = found
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.json", "b/cbs.yaml"]);
    }
}
