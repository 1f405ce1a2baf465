//! Command line argument parsing for the Affinity CLI using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::codec::UserId;
use crate::config::DEFAULT_CONFIG_FILE;
use crate::error::AffinityError;

/// Affinity - top-N app recommendations from usage events
#[derive(Parser, Debug, Clone)]
#[command(name = "affinity")]
#[command(about = "Recommend unseen apps to users from a JSONL usage log")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct AffinityArgs {
    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE", default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Event log (JSONL); overrides source.file_path
    #[arg(short, long, value_name = "INPUT_FILE")]
    pub input: Option<PathBuf>,

    /// Number of worker threads; overrides execution.num_threads
    #[arg(short, long)]
    pub threads: Option<usize>,

    /// Number of recommendations per user
    #[arg(value_name = "N")]
    pub count: usize,

    /// Users to recommend for
    #[arg(value_name = "USER_ID", required = true, num_args = 1.., allow_negative_numbers = true)]
    pub users: Vec<UserId>,
}

impl AffinityArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }
}

/// Convert a clap parse failure into an invocation error carrying the rendered usage text.
pub fn invocation_error(err: clap::Error) -> AffinityError {
    AffinityError::invalid_invocation(err.render().to_string().trim_end().to_string())
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputFormat {
    /// One line per user: `<user>: key1, key2`
    Human,
    /// JSON array of recommendations
    Json,
    /// `user_id,rank,item,score` rows
    Csv,
}
