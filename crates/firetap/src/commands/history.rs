//! `firetap history`: inspect or clear a device's persisted timeline.

use crate::cli::{HistoryArgs, HistoryCommand};
use crate::error::CliError;
use crate::output::{self, ReadingRow};

use super::{Context, device_id};

pub fn handle(args: HistoryArgs, ctx: &Context) -> Result<(), CliError> {
    let store = ctx.history_store();

    match args.command {
        HistoryCommand::Show { device } => {
            let device = device_id(&device)?;
            let timeline = store.load(&device);
            if timeline.is_empty() {
                return Err(CliError::NoHistory {
                    device: device.to_string(),
                    storage: ctx.storage_dir.display().to_string(),
                });
            }

            let out = output::render_list(
                ctx.output,
                timeline.as_slice(),
                |r| ReadingRow::new(r, ctx.color),
                |r| output::reading_id(r),
            )?;
            output::print_output(&out, ctx.quiet);
            Ok(())
        }

        HistoryCommand::Clear { device } => {
            let device = device_id(&device)?;
            store.clear(&device)?;
            tracing::info!(device_id = %device, "history cleared");
            if !ctx.quiet {
                eprintln!("Cleared history for {device}");
            }
            Ok(())
        }
    }
}
