//! JSON reports.

use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A timestamped analysis result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// What was computed, e.g. `"analysis"` or `"optimization"`.
    pub kind: String,

    /// Symbols the report covers.
    pub symbols: Vec<String>,

    /// Report generation timestamp.
    pub generated_at: DateTime<Utc>,

    /// Report contents.
    pub contents: serde_json::Value,
}

impl Report {
    /// Create a new report stamped with the current time.
    pub fn new(kind: impl Into<String>, symbols: Vec<String>, contents: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            symbols,
            generated_at: Utc::now(),
            contents,
        }
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report as JSON to `path`.
    pub fn write_to(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

/// Builder for creating reports.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    kind: Option<String>,
    symbols: Vec<String>,
    contents: Option<serde_json::Value>,
}

impl ReportBuilder {
    /// Create a new report builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the report kind.
    pub fn kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Set the covered symbols.
    pub fn symbols(mut self, symbols: Vec<String>) -> Self {
        self.symbols = symbols;
        self
    }

    /// Serialize `value` as the report contents.
    pub fn contents<T: Serialize>(mut self, value: &T) -> Result<Self> {
        self.contents = Some(serde_json::to_value(value)?);
        Ok(self)
    }

    /// Build the report.
    pub fn build(self) -> Report {
        Report::new(
            self.kind.unwrap_or_else(|| "report".to_string()),
            self.symbols,
            self.contents.unwrap_or(serde_json::Value::Null),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tangent_risk::RiskMetrics;

    #[test]
    fn test_report_creation() {
        let report = Report::new("analysis", vec!["AAPL".to_string()], serde_json::json!({"a": 1}));
        assert_eq!(report.kind, "analysis");
        assert_eq!(report.symbols, vec!["AAPL".to_string()]);
    }

    #[test]
    fn test_report_builder() {
        let metrics = RiskMetrics {
            sharpe_ratio: 1.2,
            volatility: 0.18,
            value_at_risk: -0.017,
        };
        let report = ReportBuilder::new()
            .kind("analysis")
            .symbols(vec!["MSFT".to_string()])
            .contents(&metrics)
            .unwrap()
            .build();

        assert_eq!(report.contents["sharpe_ratio"], 1.2);
        assert_eq!(report.contents["value_at_risk"], -0.017);
    }

    #[test]
    fn test_report_round_trips_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let report = ReportBuilder::new().kind("projection").build();
        report.write_to(&path).unwrap();

        let read: Report = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(read, report);
        assert_eq!(read.contents, serde_json::Value::Null);
    }
}
