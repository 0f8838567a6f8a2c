use serde::Deserialize;

use crate::error::{AnalyticsError, AnalyticsResult};

/// Root application configuration. Loaded from an optional TOML file and
/// environment variables with the prefix `INFLUENCER_ANALYTICS__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    /// Directory scanned for `<table>*.json` row files.
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_file_extension")]
    pub file_extension: String,
    /// Refuse to report when validation fails.
    #[serde(default = "default_strict")]
    pub strict: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_top_influencers")]
    pub top_influencers: usize,
    #[serde(default = "default_top_campaigns")]
    pub top_campaigns: usize,
    #[serde(default = "default_top_payees")]
    pub top_payees: usize,
    /// Decimal places used when rounding ratios for display.
    #[serde(default = "default_ratio_precision")]
    pub ratio_precision: u32,
}

// Default functions
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_file_extension() -> String {
    "json".to_string()
}
fn default_strict() -> bool {
    false
}
fn default_top_influencers() -> usize {
    5
}
fn default_top_campaigns() -> usize {
    5
}
fn default_top_payees() -> usize {
    10
}
fn default_ratio_precision() -> u32 {
    2
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            file_extension: default_file_extension(),
            strict: default_strict(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            top_influencers: default_top_influencers(),
            top_campaigns: default_top_campaigns(),
            top_payees: default_top_payees(),
            ratio_precision: default_ratio_precision(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from an optional config file and environment
    /// variables. Environment values take precedence over the file.
    pub fn load(path: Option<&str>) -> AnalyticsResult<Self> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix("INFLUENCER_ANALYTICS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder
            .build()
            .map_err(|e| AnalyticsError::Config(e.to_string()))?;
        config
            .try_deserialize()
            .map_err(|e| AnalyticsError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.dataset.data_dir, "data");
        assert!(!config.dataset.strict);
        assert_eq!(config.reporting.top_influencers, 5);
        assert_eq!(config.reporting.top_payees, 10);
        assert_eq!(config.reporting.ratio_precision, 2);
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = AppConfig::load(Some("/nonexistent/influencer-analytics")).unwrap_err();
        assert!(matches!(err, AnalyticsError::Config(_)));
    }
}
