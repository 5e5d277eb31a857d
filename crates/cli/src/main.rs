//! `sdkforge` command line: compile service manifests into decision documents.

#![forbid(unsafe_code)]

use clap::{CommandFactory, Parser, Subcommand};

mod cli;
mod logging;

#[derive(Parser, Debug)]
#[command(
    name = "sdkforge",
    version,
    about = "Compile cloud API manifests into SDK generation decisions"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile one manifest
    Compile(cli::compile::CompileArgs),
    /// Compile every manifest under a directory
    Batch(cli::batch::BatchArgs),
}

fn main() {
    logging::init_tracing();
    std::process::exit(run(std::env::args_os()));
}

fn run<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => match cli.command {
            Some(Commands::Compile(args)) => cli::compile::run(args),
            Some(Commands::Batch(args)) => cli::batch::run(args),
            None => {
                let mut cmd = Cli::command();
                let _ = cmd.print_help();
                println!();
                0
            }
        },
        Err(e) => {
            let code = e.exit_code();
            let _ = e.print();
            code
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parses_compile_args() {
        let cli = Cli::try_parse_from([
            "sdkforge",
            "compile",
            "cvm.json",
            "--errors",
            "errors.json",
            "--output",
            "out.json",
        ])
        .unwrap();
        let Some(Commands::Compile(args)) = cli.command else {
            unreachable!("compile subcommand expected");
        };
        assert_eq!(args.manifest.to_str(), Some("cvm.json"));
        assert!(args.common.errors.is_some());
    }

    #[test]
    fn test_unknown_subcommand_fails() {
        assert_ne!(run(["sdkforge", "frobnicate"]), 0);
    }
}
