//! Engine configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{LayoutError, Result};

/// Parameters of the built-in text measurement backend
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    /// Height of one wrapped line
    pub line_height: f64,
    /// Advance of one grapheme
    pub char_width: f64,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            line_height: 12.0,
            char_width: 6.0,
        }
    }
}

/// Pagination settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Tolerance of every fit comparison
    pub epsilon: f64,
    /// Abort with an error once this many pages have been produced
    pub max_pages: Option<usize>,
    /// Metrics for [`TextMetricsBackend`](crate::TextMetricsBackend)
    pub text: TextMetrics,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            epsilon: 1e-6,
            max_pages: None,
            text: TextMetrics::default(),
        }
    }
}

impl LayoutConfig {
    pub fn with_max_pages(mut self, max_pages: usize) -> Self {
        self.max_pages = Some(max_pages);
        self
    }

    pub fn with_text_metrics(mut self, line_height: f64, char_width: f64) -> Self {
        self.text = TextMetrics {
            line_height,
            char_width,
        };
        self
    }

    /// Parse a configuration from JSON; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: LayoutConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load a configuration file, falling back to defaults when it is missing or invalid
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            return Self::default();
        }
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load layout config {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon < 0.0 {
            return Err(LayoutError::Config(format!(
                "epsilon must be a non-negative number, got {}",
                self.epsilon
            )));
        }
        if self.max_pages == Some(0) {
            return Err(LayoutError::Config("max_pages must be at least 1".into()));
        }
        let positive = |v: f64| v.is_finite() && v > 0.0;
        if !positive(self.text.line_height) || !positive(self.text.char_width) {
            return Err(LayoutError::Config("text metrics must be positive".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = LayoutConfig::from_json_str(r#"{"max_pages": 50}"#).unwrap();
        assert_eq!(config.max_pages, Some(50));
        assert_eq!(config.epsilon, 1e-6);
        assert_eq!(config.text, TextMetrics::default());
    }

    #[test]
    fn test_nested_text_metrics() {
        let config =
            LayoutConfig::from_json_str(r#"{"text": {"line_height": 10.0}}"#).unwrap();
        assert_eq!(config.text.line_height, 10.0);
        assert_eq!(config.text.char_width, 6.0);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            LayoutConfig::from_json_str(r#"{"epsilon": -1.0}"#),
            Err(LayoutError::Config(_))
        ));
        assert!(matches!(
            LayoutConfig::from_json_str(r#"{"max_pages": 0}"#),
            Err(LayoutError::Config(_))
        ));
        assert!(matches!(
            LayoutConfig::from_json_str("not json"),
            Err(LayoutError::ConfigParse(_))
        ));
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = LayoutConfig::load_or_default("/nonexistent/layout.json");
        assert_eq!(config, LayoutConfig::default());
    }
}
