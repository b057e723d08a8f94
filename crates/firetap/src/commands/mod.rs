//! Command handlers and the context they share.

pub mod config_cmd;
pub mod history;
pub mod normalize;
pub mod replay;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use firetap_config::Config;
use firetap_core::{DeviceId, FileKeyValueStore, HistoryStore};

use crate::cli::{Command, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

/// Resolved settings every handler needs: config file values with the
/// global flags layered on top.
#[derive(Debug)]
pub struct Context {
    pub config: Config,
    pub output: OutputFormat,
    pub storage_dir: PathBuf,
    pub quiet: bool,
    pub color: bool,
}

impl Context {
    pub fn new(global: &GlobalOpts, config: Config) -> Self {
        let output = global
            .output
            .or_else(|| OutputFormat::from_config(&config.defaults.output))
            .unwrap_or(OutputFormat::Table);
        let storage_dir = global
            .storage_dir
            .clone()
            .unwrap_or_else(|| config.resolved_storage_dir());
        Self {
            output,
            storage_dir,
            quiet: global.quiet,
            color: output == OutputFormat::Table && output::should_color(),
            config,
        }
    }

    /// File-backed history under the resolved storage directory.
    pub fn history_store(&self) -> HistoryStore {
        HistoryStore::new(
            Arc::new(FileKeyValueStore::new(&self.storage_dir)),
            self.config.monitor.storage_key_prefix.clone(),
            self.config.monitor.history_limit,
        )
    }
}

/// Route a parsed command to its handler.
pub async fn dispatch(cmd: Command, ctx: &Context) -> Result<(), CliError> {
    match cmd {
        Command::Normalize(args) => normalize::handle(&args, ctx),
        Command::Replay(args) => replay::handle(args, ctx).await,
        Command::History(args) => history::handle(args, ctx),
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "command should have been handled before dispatch".into(),
        )),
    }
}

// ── Shared helpers ──────────────────────────────────────────────────

pub(crate) fn device_id(raw: &str) -> Result<DeviceId, CliError> {
    Ok(DeviceId::new(raw)?)
}

/// Read and parse a JSON document. `-` reads stdin.
pub(crate) fn read_json(path: &Path) -> Result<Value, CliError> {
    let text = if path == Path::new("-") {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(|source| CliError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        buf
    } else {
        std::fs::read_to_string(path).map_err(|source| CliError::Read {
            path: path.to_path_buf(),
            source,
        })?
    };

    serde_json::from_str(&text).map_err(|source| CliError::InvalidJson {
        path: path.to_path_buf(),
        source,
    })
}
