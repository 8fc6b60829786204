//! # Insights Configuration
//!
//! Read from the environment only:
//!
//! | Variable                      | Default                  |
//! |-------------------------------|--------------------------|
//! | `GEMINI_API_KEY` or `API_KEY` | none (generator disabled)|
//! | `FRIGO_GEMINI_MODEL`          | `gemini-3-flash-preview` |
//! | `FRIGO_GEMINI_TIMEOUT_SECS`   | `60`                     |

use std::env;
use std::time::Duration;

pub const DEFAULT_MODEL: &str = "gemini-3-flash-preview";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Settings for the Gemini text generator.
#[derive(Debug, Clone, PartialEq)]
pub struct InsightsConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub timeout_secs: u64,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        InsightsConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl InsightsConfig {
    /// Loads from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads from any key lookup. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let defaults = Self::default();
        InsightsConfig {
            api_key: get("GEMINI_API_KEY").or_else(|| get("API_KEY")),
            model: get("FRIGO_GEMINI_MODEL").unwrap_or(defaults.model),
            timeout_secs: get("FRIGO_GEMINI_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.timeout_secs),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = InsightsConfig::from_lookup(lookup(&[]));
        assert_eq!(config, InsightsConfig::default());
        assert!(!config.is_configured());
    }

    #[test]
    fn test_gemini_key_wins_over_api_key() {
        let config = InsightsConfig::from_lookup(lookup(&[
            ("API_KEY", "generic"),
            ("GEMINI_API_KEY", "gemini"),
            ("FRIGO_GEMINI_MODEL", "gemini-2.0-flash"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("gemini"));
        assert_eq!(config.model, "gemini-2.0-flash");
    }

    #[test]
    fn test_blank_and_bad_values_fall_back() {
        let config = InsightsConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "  "),
            ("API_KEY", "k"),
            ("FRIGO_GEMINI_TIMEOUT_SECS", "soon"),
        ]));
        assert_eq!(config.api_key.as_deref(), Some("k"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }
}
