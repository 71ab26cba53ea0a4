//! CLI argument definitions using clap

use camino::Utf8PathBuf;
use clap::{ArgAction, Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "apiprobe",
    author,
    version,
    about = "Run declarative HTTP test suites",
    long_about = None,
    propagate_version = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Engine configuration file (default: ./apiprobe.yaml if present)
    #[arg(short, long, global = true)]
    pub config: Option<Utf8PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Execute one or more test suites
    Run(RunArgs),

    /// Check suites for errors without sending any request
    Validate(ValidateArgs),
}

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Suite files to run
    #[arg(required = true)]
    pub suites: Vec<Utf8PathBuf>,

    /// Stop scheduling tests after the first failure
    #[arg(long)]
    pub fail_fast: bool,
}

#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Suite files to check
    #[arg(required = true)]
    pub suites: Vec<Utf8PathBuf>,
}
