use std::env;
use std::str::FromStr;

use anyhow::{Context, Result, bail};
use dotenvy::dotenv;
use strum_macros::{Display, EnumString};

use crate::sheet::payment::SkillRateTable;

/// Which [`crate::backend::Backend`] implementation serves the process.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendMode {
    Http,
    Fixture,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_addr: String,
    pub api_prefix: String,

    pub backend_mode: BackendMode,
    pub backend_base_url: Option<String>,

    // Day rates per designation
    pub rates: SkillRateTable,

    // Open-sheet drafts
    pub draft_ttl_secs: u64,
    pub draft_capacity: u64,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_protected_per_min: u32,

    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T>(key: &str, default: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var_or(key, default)
        .trim()
        .parse()
        .with_context(|| format!("{key} has an invalid value"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let backend_mode: BackendMode = parse_var("BACKEND_MODE", "http")?;
        let backend_base_url = env::var("BACKEND_BASE_URL")
            .ok()
            .filter(|u| !u.trim().is_empty());
        if backend_mode == BackendMode::Http && backend_base_url.is_none() {
            bail!("BACKEND_BASE_URL must be set when BACKEND_MODE=http");
        }

        Ok(Self {
            server_addr: var_or("SERVER_ADDR", "127.0.0.1:8080"),
            api_prefix: var_or("API_PREFIX", "/api"),

            backend_mode,
            backend_base_url,

            rates: SkillRateTable {
                high_skilled: parse_var("RATE_HIGH_SKILLED", "633")?,
                skilled: parse_var("RATE_SKILLED", "571")?,
                unskilled: parse_var("RATE_UNSKILLED", "466")?,
            },

            draft_ttl_secs: parse_var("DRAFT_TTL_SECS", "3600")?, // 1h
            draft_capacity: parse_var("DRAFT_CAPACITY", "10000")?,

            rate_login_per_min: parse_var("RATE_LOGIN_PER_MIN", "60")?,
            rate_protected_per_min: parse_var("RATE_PROTECTED_PER_MIN", "1000")?,

            log_dir: var_or("LOG_DIR", "logs"),
            log_level: parse_var("LOG_LEVEL", "debug")?,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            server_addr: "127.0.0.1:0".to_string(),
            api_prefix: "/api".to_string(),
            backend_mode: BackendMode::Fixture,
            backend_base_url: None,
            rates: SkillRateTable::default(),
            draft_ttl_secs: 60,
            draft_capacity: 100,
            rate_login_per_min: 60,
            rate_protected_per_min: 1000,
            log_dir: "logs".to_string(),
            log_level: tracing::Level::DEBUG,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_mode_parses_case_insensitively() {
        assert_eq!("Fixture".parse::<BackendMode>().ok(), Some(BackendMode::Fixture));
        assert_eq!("http".parse::<BackendMode>().ok(), Some(BackendMode::Http));
        assert!("mock".parse::<BackendMode>().is_err());
        assert_eq!(BackendMode::Fixture.to_string(), "fixture");
    }
}
