use std::io::Write;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::Result;
use crate::metrics::SweepReport;

/// Serializes an object to a JSON file.
pub fn object_to_json<T: Serialize>(output_path: &str, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &str) -> Result<T> {
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Per-frame tables of every combination, the skipped pairings and the
/// summary table, as plain text.
pub fn render_report(report: &SweepReport) -> String {
    let mut s = String::new();
    s += format!("Generated: {}\n", report.generated_at).as_str();
    s += report.to_string().as_str();
    s += render_skipped(report).as_str();
    s += "--------------------\nSummary:\n";
    s += report.summary_table().as_str();
    s
}

/// `Skipped:` section listing every pairing the compatibility rules
/// excluded, empty when nothing was skipped.
pub fn render_skipped(report: &SweepReport) -> String {
    let mut s = String::new();
    if !report.skipped.is_empty() {
        s += "--------------------\nSkipped:\n";
        for skip in &report.skipped {
            s += format!("    {} not compatible with {}\n", skip.descriptor, skip.detector).as_str();
        }
    }
    s
}

pub fn write_report(output_path: &str, report: &SweepReport) -> Result<()> {
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(render_report(report).as_bytes())?;
    Ok(())
}

/// JSON with the per-frame metrics plus the per-combination summaries.
pub fn write_json_report(output_path: &str, report: &SweepReport) -> Result<()> {
    #[derive(Serialize)]
    struct JsonReport<'a> {
        #[serde(flatten)]
        report: &'a SweepReport,
        summaries: Vec<crate::metrics::CombinationSummary>,
    }
    object_to_json(
        output_path,
        &JsonReport {
            report,
            summaries: report.summaries(),
        },
    )
}
