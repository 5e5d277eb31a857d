use std::path::PathBuf;

use clap::Args;
use console::style;
use sdkforge_core::compile_manifest;

use super::common::{CommonArgs, read_source, render, write_atomic};

#[derive(Args, Debug, Clone)]
pub struct CompileArgs {
    /// Manifest file (.json, .yaml or .yml)
    #[arg(value_name = "MANIFEST")]
    pub manifest: PathBuf,
    /// Write the decision document here instead of stdout
    #[arg(long, short, value_name = "FILE")]
    pub output: Option<PathBuf>,
    #[command(flatten)]
    pub common: CommonArgs,
}

pub fn run(args: CompileArgs) -> i32 {
    match compile(&args) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{} {err}", style("error:").red().bold());
            1
        }
    }
}

fn compile(args: &CompileArgs) -> Result<(), String> {
    let (config, catalog) = args.common.load()?;
    let source = read_source(&args.manifest)?;
    let compiled =
        compile_manifest(&source, catalog.as_ref(), &config).map_err(|e| e.to_string())?;
    let document = render(&compiled)?;

    match &args.output {
        Some(path) => {
            write_atomic(path, &document)?;
            eprintln!(
                "{} {} -> {}",
                style("✓").green(),
                compiled.metadata.id(),
                path.display()
            );
        }
        None => print!("{document}"),
    }
    Ok(())
}
