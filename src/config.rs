use std::time::Duration;

use anyhow::Context;

pub const DEFAULT_BASE_URL: &str = "https://web.spaggiari.eu";
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_REFRESH_WINDOW_HOURS: i64 = 8;

#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: String,
    pub timeout: Duration,
    pub refresh_window: chrono::Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            refresh_window: chrono::Duration::hours(DEFAULT_REFRESH_WINDOW_HOURS),
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("PORTAL_BASE_URL") {
            config.base_url = url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = lookup("PORTAL_TIMEOUT_SECS") {
            let secs: u64 = secs
                .parse()
                .with_context(|| format!("PORTAL_TIMEOUT_SECS is not a number: {secs}"))?;
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(hours) = lookup("REFRESH_WINDOW_HOURS") {
            let hours: i64 = hours
                .parse()
                .with_context(|| format!("REFRESH_WINDOW_HOURS is not a number: {hours}"))?;
            config.refresh_window = chrono::Duration::hours(hours);
        }

        Ok(config)
    }
}

pub fn database_url() -> anyhow::Result<String> {
    std::env::var("DATABASE_URL").context("DATABASE_URL must be set to a Postgres instance")
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.refresh_window, chrono::Duration::hours(8));
    }

    #[test]
    fn overrides_are_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("PORTAL_BASE_URL", "http://localhost:8080/"),
            ("PORTAL_TIMEOUT_SECS", "3"),
            ("REFRESH_WINDOW_HOURS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.timeout, Duration::from_secs(3));
        assert_eq!(config.refresh_window, chrono::Duration::hours(1));
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("PORTAL_TIMEOUT_SECS", "soon")])).is_err());
    }
}
