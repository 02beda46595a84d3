// src/cli/args.rs

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Stoat ahead-of-time translation backend
#[derive(Parser)]
#[command(name = "stoat")]
#[command(version = "0.1.0")]
#[command(about = "Translates assembly symbol inputs into native source trees", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Translate a symbol input into a native source tree
    Translate {
        /// Primary symbol input (.json source graph or metadata image)
        #[arg(value_name = "INPUT")]
        input: PathBuf,
        /// Root of the generated output tree
        #[arg(short, long, default_value = "out", value_name = "DIR")]
        out: PathBuf,
        /// Referenced assembly inputs, in reference order
        #[arg(short, long = "reference", value_name = "INPUT")]
        references: Vec<PathBuf>,
    },
    /// Dump the types a symbol input declares
    Inspect {
        /// Symbol input to dump
        #[arg(value_name = "INPUT")]
        input: PathBuf,
    },
}
