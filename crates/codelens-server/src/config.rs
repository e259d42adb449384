use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

pub const DEV_SESSION_SECRET: &str = "dev-secret-change-me";

/// Process configuration, read from the environment (and `.env`).
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub google_api_key: Option<String>,
    pub gemini_model: Option<String>,
    pub gemini_base_url: Option<String>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        // Blank values count as unset.
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var("CODELENS_PORT") {
            Some(raw) => raw
                .parse()
                .with_context(|| format!("CODELENS_PORT is not a valid port: {raw}"))?,
            None => 5000,
        };

        Ok(Self {
            host: var("CODELENS_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: PathBuf::from(var("CODELENS_DB_PATH").unwrap_or_else(|| "codelens.db".into())),
            session_secret: var("CODELENS_SESSION_SECRET")
                .unwrap_or_else(|| DEV_SESSION_SECRET.into()),
            google_api_key: var("GOOGLE_API_KEY"),
            gemini_model: var("GEMINI_MODEL"),
            gemini_base_url: var("GEMINI_BASE_URL"),
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        let addr = format!("{}:{}", self.host, self.port);
        addr.parse()
            .with_context(|| format!("invalid listen address {addr}"))
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.session_secret == DEV_SESSION_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.host, "0.0.0.0");
        assert_eq!(cfg.port, 5000);
        assert_eq!(cfg.db_path, PathBuf::from("codelens.db"));
        assert!(cfg.uses_dev_secret());
        assert!(cfg.google_api_key.is_none());
        assert_eq!(cfg.addr().unwrap().port(), 5000);
    }

    #[test]
    fn overrides_are_read() {
        let cfg = config(&[
            ("CODELENS_HOST", "127.0.0.1"),
            ("CODELENS_PORT", "8080"),
            ("CODELENS_SESSION_SECRET", "s3cret"),
            ("GOOGLE_API_KEY", "key-123"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
        ])
        .unwrap();
        assert_eq!(cfg.addr().unwrap().to_string(), "127.0.0.1:8080");
        assert!(!cfg.uses_dev_secret());
        assert_eq!(cfg.google_api_key.as_deref(), Some("key-123"));
        assert_eq!(cfg.gemini_model.as_deref(), Some("gemini-1.5-flash"));
        assert!(cfg.gemini_base_url.is_none());
    }

    #[test]
    fn blank_api_key_counts_as_unset() {
        let cfg = config(&[("GOOGLE_API_KEY", "  ")]).unwrap();
        assert!(cfg.google_api_key.is_none());
    }

    #[test]
    fn bad_port_is_an_error() {
        assert!(config(&[("CODELENS_PORT", "http")]).is_err());
        assert!(config(&[("CODELENS_PORT", "70000")]).is_err());
    }
}
