use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Environment variable naming a config file.
pub const CONFIG_ENV: &str = "PARTSEEK_CONFIG";

/// Lines scanned per document before the filter gives up.
pub const DEFAULT_MAX_SCAN_LINES: usize = 3000;

/// Candidates collected before scanning stops.
pub const DEFAULT_MAX_CANDIDATES: usize = 200;

/// Candidates that get a context window and a score.
pub const DEFAULT_MAX_SCORED: usize = 100;

/// Candidates scoring below this are dropped.
pub const DEFAULT_MIN_SCORE: i32 = 3;

pub const DEFAULT_MAX_RESULTS: usize = 25;

/// Work limits for one query against one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchBudget {
    pub max_scan_lines: usize,
    pub max_candidates: usize,
    pub max_scored: usize,
}

impl Default for SearchBudget {
    fn default() -> Self {
        Self {
            max_scan_lines: DEFAULT_MAX_SCAN_LINES,
            max_candidates: DEFAULT_MAX_CANDIDATES,
            max_scored: DEFAULT_MAX_SCORED,
        }
    }
}

/// Search tunables.
///
/// Every field is optional in the JSON file; missing fields take defaults.
///
/// ```
/// use partseek::config::SearchConfig;
///
/// let config: SearchConfig =
///     serde_json::from_str(r#"{ "min_score": 5 }"#).unwrap();
/// assert_eq!(config.min_score, 5);
/// assert_eq!(config.budget.max_scan_lines, 3000);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub budget: SearchBudget,
    pub min_score: i32,
    pub max_results: usize,
    /// Follow index and table-of-contents hits to their content page.
    pub follow_index: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            budget: SearchBudget::default(),
            min_score: DEFAULT_MIN_SCORE,
            max_results: DEFAULT_MAX_RESULTS,
            follow_index: true,
        }
    }
}

impl SearchConfig {
    /// Resolve the config from, in order of priority:
    /// 1. An explicit path (from --config), which must exist
    /// 2. The PARTSEEK_CONFIG environment variable
    /// 3. `config.json` in the XDG config directory, if present
    /// 4. Built-in defaults
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.is_file() {
                return Err(Error::Config(format!(
                    "config file does not exist: {}",
                    path.display()
                )));
            }
            return Self::load(path);
        }

        if let Ok(val) = std::env::var(CONFIG_ENV) {
            return Self::load(Path::new(&val));
        }

        match xdg_config_file() {
            Some(path) if path.is_file() => Self::load(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.budget.max_scored > self.budget.max_candidates {
            return Err(Error::Config(format!(
                "budget.max_scored ({}) exceeds budget.max_candidates ({})",
                self.budget.max_scored, self.budget.max_candidates
            )));
        }
        Ok(())
    }
}

fn xdg_config_file() -> Option<PathBuf> {
    xdg::BaseDirectories::with_prefix("partseek")
        .get_config_home()
        .map(|dir| dir.join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_budgets() {
        let config = SearchConfig::default();
        assert_eq!(config.budget.max_scan_lines, 3000);
        assert_eq!(config.budget.max_candidates, 200);
        assert_eq!(config.budget.max_scored, 100);
        assert_eq!(config.min_score, 3);
        assert!(config.follow_index);
    }

    #[test]
    fn load_partial_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "budget": { "max_scan_lines": 10 }, "follow_index": false }"#,
        )
        .unwrap();

        let config = SearchConfig::resolve(Some(&path)).unwrap();
        assert_eq!(config.budget.max_scan_lines, 10);
        assert_eq!(config.budget.max_candidates, 200);
        assert!(!config.follow_index);
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let err = SearchConfig::resolve(Some(Path::new("/nonexistent/cfg.json")))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn malformed_file_is_a_json_error() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(SearchConfig::load(&path), Err(Error::Json(_))));
    }

    #[test]
    fn inconsistent_budget_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(
            &path,
            r#"{ "budget": { "max_candidates": 10, "max_scored": 50 } }"#,
        )
        .unwrap();
        assert!(matches!(SearchConfig::load(&path), Err(Error::Config(_))));
    }
}
