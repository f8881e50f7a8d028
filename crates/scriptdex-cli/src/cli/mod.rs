use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod args;


pub use args::{NameArg, QueryArgs, ScanArgs};

#[derive(Debug, Parser)]
#[command(name = "scriptdex")]
#[command(about = "Local command metadata index with multi-strategy search", version)]
pub struct Cli {
    /// Data root holding the snapshot and an optional scriptdex.toml.
    #[arg(long, default_value = ".scriptdex")]
    pub root: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the data root and an empty snapshot.
    Init,
    /// Scan a directory for annotated scripts and index them.
    Scan(ScanArgs),
    /// Run a multi-strategy query against the index.
    Query(QueryArgs),
    /// Print one command's stored record.
    Show(NameArg),
    /// Ask the configured semantic provider to explain a command.
    Explain(NameArg),
    /// List registered semantic provider ids.
    Providers,
    /// Print index statistics.
    Stats,
}
