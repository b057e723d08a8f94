//! Output formatting: table, JSON, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use firetap_core::{Reading, ReadingStatus};

use crate::cli::OutputFormat;
use crate::error::CliError;

// ── Color helpers ───────────────────────────────────────────────────

/// Color only when stdout is a terminal and `NO_COLOR` is unset.
pub fn should_color() -> bool {
    io::stdout().is_terminal() && std::env::var_os("NO_COLOR").is_none()
}

/// Status label, tinted by severity when `color` is set.
pub fn paint_status(status: ReadingStatus, color: bool) -> String {
    let label = status.to_string();
    if !color {
        return label;
    }
    match status {
        ReadingStatus::Safe => label.green().to_string(),
        ReadingStatus::Alert => label.red().bold().to_string(),
        ReadingStatus::SmokeDetected => label.yellow().bold().to_string(),
    }
}

// ── Render dispatchers ──────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
pub fn render_list<T, R>(
    format: OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => data.iter().map(id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses `detail_fn`, since single-item views are a
/// key/value listing rather than a `Tabled` row.
pub fn render_single<T>(
    format: OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize + ?Sized,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

// ── Readings ────────────────────────────────────────────────────────

#[derive(Tabled)]
pub struct ReadingRow {
    #[tabled(rename = "Time")]
    time: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Smoke")]
    smoke: String,
    #[tabled(rename = "Temp")]
    temperature: String,
    #[tabled(rename = "Humidity")]
    humidity: String,
    #[tabled(rename = "Gas")]
    gas: String,
    #[tabled(rename = "Message")]
    message: String,
}

impl ReadingRow {
    pub fn new(r: &Reading, color: bool) -> Self {
        Self {
            time: format_time(r),
            status: paint_status(r.status, color),
            smoke: format!(
                "{}{}",
                r.smoke_analog,
                if r.smoke_detected { " (detected)" } else { "" }
            ),
            temperature: r.temperature.map(|t| format!("{t:.1}")).unwrap_or_default(),
            humidity: r.humidity.map(|h| format!("{h:.0}%")).unwrap_or_default(),
            gas: r.gas_status.to_string(),
            message: r.message.clone(),
        }
    }
}

impl From<&Reading> for ReadingRow {
    fn from(r: &Reading) -> Self {
        Self::new(r, false)
    }
}

/// Key/value detail view of one reading.
pub fn reading_detail(r: &Reading, color: bool) -> String {
    let mut lines = vec![
        format!("ID:          {}", r.id),
        format!("Time:        {}", format_time(r)),
        format!("Status:      {}", paint_status(r.status, color)),
        format!("Smoke:       {}", r.smoke_analog),
        format!("Detected:    {}", yes_no(r.smoke_detected)),
        format!("Gas:         {}", r.gas_status),
    ];
    if let Some(t) = r.temperature {
        lines.push(format!("Temperature: {t:.1}"));
    }
    if let Some(h) = r.humidity {
        lines.push(format!("Humidity:    {h:.0}%"));
    }
    lines.push(format!("Button:      {} ({})", r.button_event, r.button_state));
    lines.push(format!("Sprinkler:   {}", yes_no(r.sprinkler_active)));
    lines.push(format!("Sensor err:  {}", yes_no(r.sensor_error)));
    if !r.message.is_empty() {
        lines.push(format!("Message:     {}", r.message));
    }
    lines.join("\n")
}

/// Plain-mode identifier: the reading's millisecond timestamp.
pub fn reading_id(r: &Reading) -> String {
    r.timestamp_millis().to_string()
}

fn format_time(r: &Reading) -> String {
    r.timestamp.format("%Y-%m-%d %H:%M:%S%.3f").to_string()
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "yes" } else { "no" }
}
