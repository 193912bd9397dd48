use anyhow::{Context, Result};

use crate::assembler::search::{DEFAULT_BEAM_WIDTH, DEFAULT_MAX_DEPTH};
use crate::revision::{DEFAULT_HISTORY_CAP, DEFAULT_SESSION_TTL_SECS};

/// Application configuration loaded from environment variables.
/// Every variable is optional; invalid values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// JSON catalog file; `None` uses the built-in catalog.
    pub catalog_path: Option<String>,
    pub beam_width: usize,
    pub max_depth: usize,
    pub history_cap: usize,
    /// Seconds an edit session may sit idle before it is evicted.
    pub session_ttl_secs: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            port: std::env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            catalog_path: std::env::var("CATALOG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty()),
            beam_width: positive_env("BEAM_WIDTH", DEFAULT_BEAM_WIDTH)?,
            max_depth: positive_env("MAX_DEPTH", DEFAULT_MAX_DEPTH)?,
            history_cap: positive_env("HISTORY_CAP", DEFAULT_HISTORY_CAP)?,
            session_ttl_secs: positive_env("SESSION_TTL_SECS", DEFAULT_SESSION_TTL_SECS)?,
        })
    }
}

fn positive_env(key: &str, default: usize) -> Result<usize> {
    parse_positive(key, std::env::var(key).ok().as_deref(), default)
}

fn parse_positive(key: &str, raw: Option<&str>, default: usize) -> Result<usize> {
    let Some(raw) = raw else {
        return Ok(default);
    };
    let value = raw
        .trim()
        .parse::<usize>()
        .with_context(|| format!("{key} must be a positive integer, got '{raw}'"))?;
    anyhow::ensure!(value >= 1, "{key} must be at least 1");
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positive_default_when_unset() {
        assert_eq!(parse_positive("BEAM_WIDTH", None, 5).unwrap(), 5);
    }

    #[test]
    fn test_parse_positive_reads_value() {
        assert_eq!(parse_positive("BEAM_WIDTH", Some(" 12 "), 5).unwrap(), 12);
    }

    #[test]
    fn test_parse_positive_rejects_zero_and_garbage() {
        let zero = parse_positive("MAX_DEPTH", Some("0"), 7).unwrap_err();
        assert!(zero.to_string().contains("MAX_DEPTH must be at least 1"));
        let garbage = parse_positive("HISTORY_CAP", Some("lots"), 50).unwrap_err();
        assert!(garbage.to_string().contains("HISTORY_CAP must be a positive integer"));
    }
}
