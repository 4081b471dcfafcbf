//! JSON report generation

use anyhow::Result;

use super::EvalReport;

/// JSON report generator
pub struct JsonReporter;

impl JsonReporter {
    /// Generate a JSON report
    pub fn generate(report: &EvalReport) -> Result<String> {
        let json = serde_json::to_string_pretty(report)?;
        Ok(json)
    }

    /// Generate a compact JSON report (no pretty printing)
    pub fn generate_compact(report: &EvalReport) -> Result<String> {
        let json = serde_json::to_string(report)?;
        Ok(json)
    }
}
