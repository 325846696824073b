//! CSV output.
//!
//! Every writer truncates its target: a second run with the same path
//! replaces the file instead of appending to it.
use std::path::Path;
use anyhow::{Context, Result};
use serde::Serialize;

/// One ERP peak, as written to `erp_peaks.csv`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakRow {
    pub channel: String,
    #[serde(rename = "amplitude_uV")]
    pub amplitude_uv: f64,
    pub latency_s: f64,
}

/// Write serde records with a header derived from the field names.
pub fn write_records<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        w.serialize(row).with_context(|| format!("write row to {}", path.display()))?;
    }
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    log::info!("wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}

/// Write a `channel,<value_column>` table.
pub fn write_channel_values(path: &Path, value_column: &str, rows: &[(String, f64)]) -> Result<()> {
    let mut w = csv::Writer::from_path(path)
        .with_context(|| format!("create {}", path.display()))?;
    w.write_record(["channel", value_column])?;
    for (channel, value) in rows {
        let value = value.to_string();
        w.write_record([channel.as_str(), value.as_str()])?;
    }
    w.flush().with_context(|| format!("flush {}", path.display()))?;
    log::info!("wrote {} row(s) to {}", rows.len(), path.display());
    Ok(())
}
