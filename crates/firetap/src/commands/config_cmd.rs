//! Config subcommand handlers.
//!
//! Handled before the shared [`Context`] is built so that `config path`
//! still works when the file itself fails to load.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

use super::Context;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            output::print_output(
                &firetap_config::config_path().display().to_string(),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let ctx = Context::new(global, firetap_config::load_config()?);
            let mut resolved = ctx.config.clone();
            resolved.storage_dir = Some(ctx.storage_dir.clone());

            let out = match ctx.output {
                OutputFormat::Json => serde_json::to_string_pretty(&resolved)?,
                OutputFormat::JsonCompact => serde_json::to_string(&resolved)?,
                OutputFormat::Table | OutputFormat::Plain => {
                    toml::to_string_pretty(&resolved).map_err(firetap_config::ConfigError::from)?
                }
            };
            output::print_output(out.trim_end(), ctx.quiet);
            Ok(())
        }
    }
}
