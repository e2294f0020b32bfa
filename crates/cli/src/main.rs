//! # CLI - renormalize command line tool
//!
//! Combines particle files produced by independent simulation runs into one
//! file whose weights are renormalized to the summed particle count, and
//! reports installation details for build systems.
//!
//! ## Commands
//!
//! ```text
//! renormalize combine [-o FILE] [-v] FILE...   Merge MCPL files
//! renormalize config  [-v | -i | -s CHOICE]    Installation information
//! ```
//!
//! ## Configuration
//!
//! ```text
//! RENORMALIZE_OUTPUT  default output of `combine`  (default: "combined.mcpl")
//! RENORMALIZE_LOG     log filter directive         (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ renormalize combine -o all.mcpl.gz run1.mcpl run2.mcpl.gz run3.mcpl
//! $ renormalize config --show ldflags
//! -L/opt/renormalize/lib -lrenormalize
//! ```

use std::process::ExitCode;

use clap::{Parser, Subcommand};

mod combine;
mod config_cmd;
mod logging;

/// Combine MCPL particle files with renormalized weights
#[derive(Parser)]
#[command(name = "renormalize", version)]
#[command(after_help = "See 'renormalize <command> --help' for more information on a specific command.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Combine MCPL files created by independent runs
    ///
    /// Every particle's weight is scaled by its file's share of the summed
    /// particle count, so the result behaves like a single run.
    Combine(combine::CombineArgs),

    /// Print installation configuration information
    Config(config_cmd::ConfigArgs),
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            // --help and --version land here too
            return if e.use_stderr() {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let verbose = matches!(&cli.command, Commands::Combine(args) if args.verbose);
    logging::init(verbose);

    let result = match &cli.command {
        Commands::Combine(args) => combine::run(args),
        Commands::Config(args) => config_cmd::run(args),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
