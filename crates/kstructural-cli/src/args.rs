//! Command-line argument definitions for the kstructural CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. A subcommand selects between checking a document and
//! converting it; the remaining options select the configuration file, the
//! base directory and logging verbosity.

use clap::{Parser, Subcommand};

/// Command-line arguments for the kstructural document tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Path to configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Directory that imports and includes may not leave
    #[arg(short, long, global = true)]
    pub base_directory: Option<String>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info", global = true)]
    pub log_level: String,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Parse and evaluate a document, reporting every problem found
    Check {
        /// Path to the input document
        input: String,
    },

    /// Convert a document to another syntax
    Convert {
        /// Path to the input document
        input: String,

        /// Directory the converted files are written to
        #[arg(short, long, default_value = ".")]
        output: String,

        /// Output format (canonical, imperative, xml)
        #[arg(short, long)]
        format: Option<String>,

        /// Write imported blocks and included texts as separate files
        #[arg(long)]
        keep_imports: bool,
    },
}
