use serde::{Deserialize, Serialize};

use crate::error::ExtractError;

/// Upper bound accepted for `heuristics.lookahead_lines`.
pub const MAX_LOOKAHEAD_LINES: usize = 10;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default)]
    pub heuristics: HeuristicsConfig,
}

fn default_name() -> String {
    "default".into()
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            heuristics: HeuristicsConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Heuristics
// ---------------------------------------------------------------------------

/// Tunables for the line classifier and the strategies that drive it.
///
/// `hyphen_means_zero` and `isolated_capital_status` are both prone to false
/// positives on unrelated tokens. They stay switchable rather than tightened.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// How many lines the text strategy peeks ahead for a transaction row.
    #[serde(default = "default_lookahead")]
    pub lookahead_lines: usize,
    /// Table yield below this runs the enhanced text fallback.
    #[serde(default = "default_fallback_threshold")]
    pub fallback_threshold: usize,
    /// A lone `-` token with no amounts means gross = tax = deposit = 0.
    #[serde(default = "default_true")]
    pub hyphen_means_zero: bool,
    /// The first single capital letter between spaces is the booking status.
    #[serde(default = "default_true")]
    pub isolated_capital_status: bool,
    /// Status used when no isolated capital is found (or the heuristic is off).
    #[serde(default = "default_status")]
    pub default_status: String,
}

fn default_lookahead() -> usize {
    3
}

fn default_fallback_threshold() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn default_status() -> String {
    "F".into()
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            lookahead_lines: default_lookahead(),
            fallback_threshold: default_fallback_threshold(),
            hyphen_means_zero: true,
            isolated_capital_status: true,
            default_status: default_status(),
        }
    }
}

// ---------------------------------------------------------------------------
// Parse + Validate
// ---------------------------------------------------------------------------

impl ExtractConfig {
    pub fn from_toml(input: &str) -> Result<Self, ExtractError> {
        let config: ExtractConfig =
            toml::from_str(input).map_err(|e| ExtractError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml(&self) -> Result<String, ExtractError> {
        toml::to_string_pretty(self).map_err(|e| ExtractError::ConfigParse(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), ExtractError> {
        let h = &self.heuristics;

        if h.lookahead_lines == 0 || h.lookahead_lines > MAX_LOOKAHEAD_LINES {
            return Err(ExtractError::ConfigValidation(format!(
                "heuristics.lookahead_lines must be between 1 and {MAX_LOOKAHEAD_LINES}, got {}",
                h.lookahead_lines
            )));
        }

        let mut chars = h.default_status.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_ascii_uppercase() => {}
            _ => {
                return Err(ExtractError::ConfigValidation(format!(
                    "heuristics.default_status must be a single uppercase letter, got '{}'",
                    h.default_status
                )));
            }
        }

        Ok(())
    }

    /// The validated default status as a char.
    pub fn default_status_char(&self) -> char {
        self.heuristics.default_status.chars().next().unwrap_or('F')
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let config = ExtractConfig::from_toml("").unwrap();
        assert_eq!(config.name, "default");
        assert_eq!(config.heuristics.lookahead_lines, 3);
        assert_eq!(config.heuristics.fallback_threshold, 10);
        assert!(config.heuristics.hyphen_means_zero);
        assert!(config.heuristics.isolated_capital_status);
        assert_eq!(config.default_status_char(), 'F');
    }

    #[test]
    fn partial_heuristics_table() {
        let config = ExtractConfig::from_toml(
            r#"
name = "strict"

[heuristics]
hyphen_means_zero = false
fallback_threshold = 0
"#,
        )
        .unwrap();
        assert_eq!(config.name, "strict");
        assert!(!config.heuristics.hyphen_means_zero);
        assert_eq!(config.heuristics.fallback_threshold, 0);
        assert_eq!(config.heuristics.lookahead_lines, 3);
    }

    #[test]
    fn zero_lookahead_rejected() {
        let err = ExtractConfig::from_toml("[heuristics]\nlookahead_lines = 0\n").unwrap_err();
        assert!(matches!(err, ExtractError::ConfigValidation(_)));
    }

    #[test]
    fn oversized_lookahead_rejected() {
        let err = ExtractConfig::from_toml("[heuristics]\nlookahead_lines = 11\n").unwrap_err();
        assert!(err.to_string().contains("lookahead_lines"));
    }

    #[test]
    fn bad_status_rejected() {
        for bad in ["", "f", "FB", "1"] {
            let toml = format!("[heuristics]\ndefault_status = \"{bad}\"\n");
            let err = ExtractConfig::from_toml(&toml).unwrap_err();
            assert!(
                matches!(err, ExtractError::ConfigValidation(_)),
                "status '{bad}' should be rejected"
            );
        }
    }

    #[test]
    fn malformed_toml_is_parse_error() {
        let err = ExtractConfig::from_toml("heuristics = [").unwrap_err();
        assert!(matches!(err, ExtractError::ConfigParse(_)));
    }

    #[test]
    fn default_round_trips_through_toml() {
        let text = ExtractConfig::default().to_toml().unwrap();
        let back = ExtractConfig::from_toml(&text).unwrap();
        assert_eq!(back.heuristics.lookahead_lines, 3);
        assert_eq!(back.heuristics.default_status, "F");
    }
}
