use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, CommandFactory};
use config::{executable_dir, Installation, Show};

#[derive(Args, Debug)]
#[command(
    disable_version_flag = true,
    after_help = "Resolved paths are only valid if this binary is installed."
)]
pub struct ConfigArgs {
    /// Print the library version
    #[arg(short = 'v', long = "version")]
    pub version: bool,

    /// Print the library version as an integer
    #[arg(short, long)]
    pub intversion: bool,

    /// Show information about the installation, CHOICE is one of
    /// libdir, includedir, compdir, libname, version, bindir, ldflags, cflags
    #[arg(short, long, value_name = "CHOICE")]
    pub show: Option<Show>,
}

pub fn run(args: &ConfigArgs) -> Result<ExitCode> {
    let install = Installation::default();

    if args.version {
        println!("{}", install.version);
        return Ok(ExitCode::SUCCESS);
    }
    if args.intversion {
        println!("{}", install.version_integer()?);
        return Ok(ExitCode::SUCCESS);
    }
    if let Some(choice) = args.show {
        let exe_dir = executable_dir()?;
        println!("{}", install.lookup(choice, &exe_dir));
        return Ok(ExitCode::SUCCESS);
    }

    let mut cli = crate::Cli::command();
    if let Some(sub) = cli.find_subcommand_mut("config") {
        sub.print_help()?;
    }
    println!();
    println!(
        "(Hint: select '-s' and one of the following choices: {})",
        Show::CHOICES
    );
    Ok(ExitCode::SUCCESS)
}
