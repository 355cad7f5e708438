//! Command line interface definition

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

pub(crate) const TOKEN_HELP: &str = "\
Getting an API token:
  1. Sign in to the build service dashboard
  2. Open Teams > Personal Account > Integrations
  3. Copy the API token shown under 'Codemagic API'

Workflows:
  ios-development   development build, no code signing required (default)
  ios-workflow      production build, requires signing certificates

Examples:
  cmbuild $TOKEN
  cmbuild $TOKEN ios-workflow release/2.1
  cmbuild $TOKEN --app getfit --output-dir ./dist --max-polls 120";

/// cmbuild - trigger a remote iOS build and collect its artifacts
#[derive(Parser)]
#[command(name = "cmbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Trigger a remote iOS build, follow it to completion and collect its artifacts")]
#[command(long_about = None)]
#[command(after_help = TOKEN_HELP)]
pub struct Cli {
    /// API token for the build service
    #[arg(value_name = "TOKEN")]
    pub token: String,

    /// Workflow to run [default: ios-development]
    #[arg(value_name = "WORKFLOW")]
    pub workflow: Option<String>,

    /// Branch to build [default: main]
    #[arg(value_name = "BRANCH")]
    pub branch: Option<String>,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Flags overriding configuration
#[derive(Parser)]
pub struct GlobalArgs {
    /// Fragment of the application name to build
    #[arg(long, value_name = "NAME")]
    pub app: Option<String>,

    /// Directory receiving the downloaded artifacts
    #[arg(long, value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Seconds between status polls
    #[arg(long, value_name = "SECS")]
    pub poll_interval: Option<u64>,

    /// Give up after this many status polls
    #[arg(long, value_name = "N")]
    pub max_polls: Option<u32>,

    /// Use alternate config file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Output the final report as JSON
    #[arg(long)]
    pub json: bool,

    /// Enable debug logging to the cmbuild log directory
    #[arg(long)]
    pub debug: bool,

    /// Color output control
    #[arg(long, value_enum, default_value_t = ColorChoice::Auto)]
    pub color: ColorChoice,
}

/// When to emit ANSI colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ColorChoice {
    Always,
    Auto,
    Never,
}

impl ColorChoice {
    /// Resolve against the attached terminal
    pub fn enabled(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::Term::stdout().features().colors_supported(),
        }
    }
}
