//! Optional `torpedo.toml` configuration, loaded alongside the instance
//! file (or from an explicit `--config` path) and falling back to
//! defaults when absent.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub lookahead_cap: usize,
    pub emergency_swap_enabled: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config { lookahead_cap: 32, emergency_swap_enabled: true }
    }
}

/// Loads `path` if given and it exists, otherwise returns the default
/// configuration (e.g. when the instance itself came from stdin, there is
/// no directory to look for a sibling `torpedo.toml` in).
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let Some(path) = path else {
        return Ok(Config::default());
    };
    if !path.exists() {
        return Ok(Config::default());
    }
    let text = fs::read_to_string(path).with_context(|| format!("reading config file {}", path.display()))?;
    toml::from_str(&text).with_context(|| format!("parsing config file {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_config(Some(Path::new("/nonexistent/torpedo.toml"))).unwrap();
        assert_eq!(config.lookahead_cap, 32);
        assert!(config.emergency_swap_enabled);
    }

    #[test]
    fn no_path_yields_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.lookahead_cap, 32);
        assert!(config.emergency_swap_enabled);
    }

    #[test]
    fn parses_partial_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("torpedo.toml");
        fs::write(&path, "lookahead_cap = 8\n").unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.lookahead_cap, 8);
        assert!(config.emergency_swap_enabled);
    }
}
