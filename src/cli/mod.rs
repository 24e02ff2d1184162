//! CLI module for Delve
//!
//! Provides command-line interface parsing for the `delve` binary.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod follow;
pub mod init;
pub mod output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Delve - plan, search, synthesize and deliver a research report
///
/// Turns one research question into a long-form report by planning a set of
/// web searches, running them concurrently, and writing up what they found.
#[derive(Parser, Debug)]
#[command(
    name = "delve",
    version,
    about = "Delve - deep research from a single query",
    long_about = "Plans a set of web searches for a query, runs them concurrently,\n\
                  synthesizes a long-form report and delivers it, streaming progress\n\
                  as it goes.",
    after_help = "EXAMPLES:\n    \
                  delve init                                       # Scaffold research.toml\n    \
                  delve check                                      # Validate the configuration\n    \
                  delve run \"impact of interest rates on tech stocks\"\n    \
                  delve run --searches 3 --json \"rust async runtimes\""
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "research.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Research a query and print progress followed by the report
    Run {
        /// The research question
        query: String,

        /// Number of searches to plan (overrides research.searches)
        #[arg(short = 'n', long)]
        searches: Option<usize>,

        /// Print progress events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Validate the configuration and list the configured collaborators
    Check,

    /// Create research.toml and .env.example in a directory
    Init {
        /// Directory to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Overwrite existing files
        #[arg(short, long)]
        force: bool,

        /// LLM provider to configure (ollama or openai)
        #[arg(long, default_value = "ollama")]
        provider: String,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
