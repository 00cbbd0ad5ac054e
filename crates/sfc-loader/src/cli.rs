//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};

/// Load single-file components as plain script modules.
#[derive(Debug, Parser)]
#[command(name = "sfc-loader")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Workspace root, where the config file is looked up
    #[arg(long, default_value = ".", global = true)]
    pub workspace: Utf8PathBuf,

    /// Path to a config file, instead of the one in the workspace
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the sections of a component
    Extract {
        /// Component file
        file: Utf8PathBuf,

        /// Tags to extract (default: template, script, style)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        output: OutputFormat,
    },

    /// Compile a component and print its code and map
    Compile {
        /// Component file
        file: Utf8PathBuf,

        /// Do not generate a source map
        #[arg(long = "no-maps")]
        no_maps: bool,

        /// Output format
        #[arg(long, value_enum, default_value = "human")]
        output: OutputFormat,
    },

    /// Load every component under the given paths and report failures
    Check {
        /// Files or directories (default: the workspace)
        paths: Vec<Utf8PathBuf>,
    },
}

/// Output format options.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable output (default)
    #[default]
    Human,
    /// JSON output
    Json,
}
