use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Args;
use renormalize::{merge_files, MergeError};
use tracing::debug;

#[derive(Args, Debug)]
pub struct CombineArgs {
    /// Output file, ending in .mcpl or .mcpl.gz (compressed)
    #[arg(short, long, value_name = "FILE", env = config::OUTPUT_ENV, default_value = config::DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Print additional information
    #[arg(short, long)]
    pub verbose: bool,

    /// Files to combine
    #[arg(value_name = "FILE")]
    pub inputs: Vec<PathBuf>,
}

pub fn run(args: &CombineArgs) -> Result<ExitCode> {
    debug!(?args, "combine");
    if args.inputs.is_empty() {
        bail!("no input files provided");
    }
    if args.inputs.len() < 2 {
        bail!("at least two input files are required");
    }

    if args.verbose {
        let names: Vec<String> = args
            .inputs
            .iter()
            .map(|p| p.display().to_string())
            .collect();
        println!(
            "Combining files: {} into {}",
            names.join(" "),
            args.output.display()
        );
    }

    let summary = match merge_files(&args.output, &args.inputs) {
        Ok(summary) => summary,
        Err(MergeError::ZeroTotalCount { opened, unopened }) => {
            let mut message = format!("no particle counts found in {opened} files");
            if unopened > 0 {
                message.push_str(&format!(", {unopened} files were not opened"));
            }
            bail!(message);
        }
        Err(e) => return Err(e.into()),
    };

    if summary.unopened > 0 {
        eprintln!(
            "Warning: particles from {} of the files were not merged",
            summary.unopened
        );
    }
    if args.verbose {
        println!(
            "Wrote {} particles from {} files to {} (total particle count {})",
            summary.particles_written,
            summary.inputs_merged,
            summary.output.display(),
            summary.total_count
        );
    }

    Ok(ExitCode::SUCCESS)
}
