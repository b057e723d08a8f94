//! `firetap normalize`: run one raw payload through the normalizer.

use chrono::Utc;

use firetap_core::{ReadingId, convert};

use crate::cli::NormalizeArgs;
use crate::error::CliError;
use crate::output;

use super::{Context, read_json};

pub fn handle(args: &NormalizeArgs, ctx: &Context) -> Result<(), CliError> {
    let raw = read_json(&args.file)?;
    let now = Utc::now();

    let reading = match &args.archive_key {
        Some(key) => convert::normalize(&raw, ReadingId::Archive(key.clone()), now),
        None => convert::normalize_current(&raw, now),
    };
    tracing::debug!(status = %reading.status, id = %reading.id, "normalized payload");

    let out = output::render_single(
        ctx.output,
        &reading,
        |r| output::reading_detail(r, ctx.color),
        output::reading_id,
    )?;
    output::print_output(&out, ctx.quiet);
    Ok(())
}
