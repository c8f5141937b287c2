//! Pipeline configuration.

use crate::error::Result;
use hobart_data::{AliasTable, NormalizerConfig};
use hobart_metrics::MetricsConfig;
use hobart_quality::QualityPolicy;
use hobart_valuation::ValuationParams;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Every table and parameter a pipeline run depends on.
///
/// Missing sections in a JSON file fall back to their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Tag aliases per canonical field
    pub aliases: AliasTable,
    /// Statement normalizer options
    pub normalizer: NormalizerConfig,
    /// Metrics calculator options
    pub metrics: MetricsConfig,
    /// Valuation parameters
    pub valuation: ValuationParams,
    /// Quality scoring policy
    pub quality: QualityPolicy,
}

impl PipelineConfig {
    /// Parse a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&content)?;
        tracing::debug!(path = %path.as_ref().display(), "loaded pipeline config");
        Ok(config)
    }

    /// Write the configuration as pretty JSON.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use hobart_data::FieldName;

    #[test]
    fn test_empty_json_is_default() {
        let config = PipelineConfig::from_json("{}").unwrap();
        assert_eq!(config, PipelineConfig::default());
    }

    #[test]
    fn test_partial_sections() {
        let config = PipelineConfig::from_json(
            r#"{
                "valuation": { "discount_rate": 0.12 },
                "quality": { "roic_target": 0.20 },
                "normalizer": { "allow_fallback": false }
            }"#,
        )
        .unwrap();

        assert_relative_eq!(config.valuation.discount_rate, 0.12);
        assert_relative_eq!(config.valuation.pe_cap, 20.0);
        assert_relative_eq!(config.quality.roic_target, 0.20);
        assert_eq!(config.quality.safety_margin.version, "v1");
        assert!(!config.normalizer.allow_fallback);
        assert_eq!(config.normalizer.min_annual_days, 300);
        assert_eq!(config.aliases, AliasTable::standard());
    }

    #[test]
    fn test_save_and_load() {
        let config = PipelineConfig {
            aliases: AliasTable::empty().with_aliases(FieldName::Revenue, &["Revenues"]),
            ..Default::default()
        };
        let path = std::env::temp_dir().join("hobart_config_test.json");
        config.save(&path).unwrap();
        let loaded = PipelineConfig::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
        assert_eq!(loaded.aliases.aliases(FieldName::Revenue), ["Revenues"]);
    }

    #[test]
    fn test_missing_file() {
        let err = PipelineConfig::load("/nonexistent/hobart.json").unwrap_err();
        assert!(matches!(err, crate::PipelineError::Io(_)));
    }
}
