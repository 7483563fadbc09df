//! CSV export for simulation step records.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::types::StepRecord;

/// Column header for the step-record CSV export.
const HEADER: &str = "timestamp,load_kw,pv_kw,battery_kw,grid_kw,\
                      pv_to_load_kw,pv_to_battery_kw,pv_curtailed_kw,\
                      soe_kwh,soh,mode,shortfall_kw";

/// Exports step records to a CSV file at the given path.
///
/// Writes a header row followed by one data row per step. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[StepRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes step records as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[StepRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    // Header
    wtr.write_record(HEADER.split(',').map(str::trim))?;

    // Data rows
    for r in records {
        wtr.write_record(&[
            r.timestamp.format("%Y-%m-%d %H:%M:%S").to_string(),
            format!("{:.4}", r.load_kw),
            format!("{:.4}", r.pv_kw),
            format!("{:.4}", r.battery_kw),
            format!("{:.4}", r.grid_kw),
            format!("{:.4}", r.pv_to_load_kw),
            format!("{:.4}", r.pv_to_battery_kw),
            format!("{:.4}", r.pv_curtailed_kw),
            format!("{:.4}", r.soe_kwh),
            format!("{:.6}", r.soh),
            r.mode.as_str().to_string(),
            format!("{:.4}", r.shortfall_kw),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
