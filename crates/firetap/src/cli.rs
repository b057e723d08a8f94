//! Clap derive structures for the `firetap` CLI.
//!
//! Global flags live in [`GlobalOpts`]; every subcommand gets its own
//! args struct so handlers receive exactly what they need.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-level CLI ───────────────────────────────────────────────────

/// firetap: replay and inspect smoke-detector telemetry
#[derive(Debug, Parser)]
#[command(
    name = "firetap",
    version,
    about = "Replay and inspect smoke-detector telemetry",
    long_about = "Normalize raw device payloads, replay recorded data-store traffic through \
        the reconciliation engine, and manage persisted device history.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ──────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "FIRETAP_OUTPUT",
        value_enum,
        global = true
    )]
    pub output: Option<OutputFormat>,

    /// Directory holding persisted device history
    #[arg(long, env = "FIRETAP_STORAGE_DIR", global = true)]
    pub storage_dir: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    JsonCompact,
    Plain,
}

impl OutputFormat {
    /// Parse the `defaults.output` value from the config file.
    pub fn from_config(raw: &str) -> Option<Self> {
        <Self as ValueEnum>::from_str(raw, true).ok()
    }
}

// ── Top-level Command Enum ──────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Normalize a raw device payload into a canonical reading
    Normalize(NormalizeArgs),

    /// Replay a recorded data-store script through a device monitor
    Replay(ReplayArgs),

    /// Inspect or clear persisted device history
    History(HistoryArgs),

    /// Inspect the resolved configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Normalize ───────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// JSON file holding the raw payload (`-` for stdin)
    pub file: PathBuf,

    /// Treat the payload as an archive entry stored under this key
    #[arg(long)]
    pub archive_key: Option<String>,
}

// ── Replay ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ReplayArgs {
    /// JSON script: an array of `{"path", "value"}` or `{"path", "error"}` steps
    pub script: PathBuf,

    /// Device to monitor while the script runs
    #[arg(long, short = 'd')]
    pub device: String,

    /// Pause before each step so live readings get distinct timestamps
    #[arg(long, default_value_t = 20, value_name = "MS")]
    pub step_delay_ms: u64,
}

// ── History ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct HistoryArgs {
    #[command(subcommand)]
    pub command: HistoryCommand,
}

#[derive(Debug, Subcommand)]
pub enum HistoryCommand {
    /// Show the persisted timeline of a device
    Show {
        /// Device ID
        device: String,
    },

    /// Delete the persisted timeline of a device
    Clear {
        /// Device ID
        device: String,
    },
}

// ── Config ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display current resolved configuration
    Show,

    /// Print the config file path
    Path,
}

// ── Completions ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
