//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Keep NLS open data products up to date from the Atom change feed.
///
/// Downloads only entries that are new, updated or missing on disk, verifies
/// every archive and remembers what was synced in the destination directory.
#[derive(Parser, Debug)]
#[command(name = "mml-sync")]
#[command(author, version, about)]
pub struct Cli {
    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Config file (defaults to ./mml-sync.toml, then the user config directory)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Number of concurrent download workers (1-64)
    #[arg(
        short = 'w',
        long,
        global = true,
        value_parser = clap::value_parser!(u16).range(1..=64)
    )]
    pub workers: Option<u16>,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a product and keep it up to date
    Load(LoadArgs),
    /// List available products
    List,
}

/// Arguments of `mml-sync load`.
#[derive(Args, Debug, Clone, Default)]
pub struct LoadArgs {
    /// Product to be processed, e.g. maastotietokanta
    #[arg(short, long)]
    pub product: Option<String>,

    /// Product version to be processed
    #[arg(short = 't', long = "type", value_name = "VERSION")]
    pub version: Option<String>,

    /// File format to request, e.g. gml
    #[arg(short, long)]
    pub format: Option<String>,

    /// Destination directory
    #[arg(short, long)]
    pub destination: Option<PathBuf>,

    /// Re-download every entry updated at or after --from-date
    #[arg(long)]
    pub force: bool,

    /// Only download entries missing from the destination
    #[arg(long)]
    pub missing_only: bool,

    /// Epoch for --force (YYYY-MM-DD or ISO-8601 timestamp)
    #[arg(long, value_name = "DATE", requires = "force")]
    pub from_date: Option<String>,
}
