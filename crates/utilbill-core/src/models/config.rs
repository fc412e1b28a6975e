//! Configuration structures for the extraction pipeline.

use serde::{Deserialize, Serialize};

use crate::bill::rules::dates::DateFormat;

/// Main configuration for the utilbill pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UtilbillConfig {
    /// Field extraction configuration.
    pub extraction: ExtractionConfig,

    /// Batch run configuration.
    pub batch: BatchConfig,

    /// Document source configuration.
    pub source: SourceConfig,
}

/// Field extraction configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Date formats tried, in order, when reading emission and due dates.
    /// Empty means each provider's own list.
    pub date_formats: Vec<DateFormat>,

    /// Try the due date when the emission date is present but unparsable.
    pub fallback_on_date_error: bool,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            date_formats: Vec::new(),
            fallback_on_date_error: true,
        }
    }
}

/// Batch run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Number of parsing workers (1 = sequential).
    pub jobs: usize,

    /// Wall-clock budget for a whole run in seconds (none = unlimited).
    pub time_budget_secs: Option<u64>,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            jobs: 1,
            time_budget_secs: None,
        }
    }
}

/// Document source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// File extensions picked up from an input directory.
    pub extensions: Vec<String>,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            extensions: vec!["txt".to_string(), "pdf".to_string()],
        }
    }
}

impl UtilbillConfig {
    /// Load configuration from a JSON file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })
    }

    /// Save configuration to a JSON file.
    pub fn save(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        let content = serde_json::to_string_pretty(self).map_err(|e| {
            std::io::Error::new(std::io::ErrorKind::InvalidData, e.to_string())
        })?;
        std::fs::write(path, content)
    }

    /// Wall-clock budget as a duration.
    pub fn time_budget(&self) -> Option<std::time::Duration> {
        self.batch.time_budget_secs.map(std::time::Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: UtilbillConfig =
            serde_json::from_str(r#"{ "batch": { "jobs": 4 } }"#).unwrap();

        assert_eq!(config.batch.jobs, 4);
        assert_eq!(config.batch.time_budget_secs, None);
        assert!(config.extraction.fallback_on_date_error);
        assert_eq!(config.source.extensions, vec!["txt", "pdf"]);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = UtilbillConfig::default();
        config.batch.time_budget_secs = Some(30);
        config.extraction.date_formats = vec![DateFormat::DayMonthYearNumeric];
        config.save(&path).unwrap();

        let loaded = UtilbillConfig::from_file(&path).unwrap();
        assert_eq!(loaded.batch.time_budget_secs, Some(30));
        assert_eq!(loaded.extraction.date_formats, vec![DateFormat::DayMonthYearNumeric]);
        assert_eq!(loaded.time_budget(), Some(std::time::Duration::from_secs(30)));
    }
}
