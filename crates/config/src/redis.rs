//! Cache / pub-sub endpoint configuration
//!
//! `REDIS_URL` takes precedence; otherwise the URL is assembled from
//! `REDIS_HOST` / `REDIS_PORT` / `REDIS_PASSWORD` / `REDIS_DB`.

use crate::{get_env, get_env_u16, get_env_u64, lookup_env, Result};

/// Redis connection settings.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    url: String,
}

impl RedisConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(&lookup_env)
    }

    fn from_lookup(lookup: &dyn Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(url) = lookup("REDIS_URL") {
            return Ok(Self { url });
        }

        let host = get_env(lookup, "REDIS_HOST", "localhost");
        let port = get_env_u16(lookup, "REDIS_PORT", 6379)?;
        let password = get_env(lookup, "REDIS_PASSWORD", "");
        let db = get_env_u64(lookup, "REDIS_DB", 0)?;

        let auth = if password.is_empty() {
            String::new()
        } else {
            format!(":{password}@")
        };

        Ok(Self {
            url: format!("redis://{auth}{host}:{port}/{db}"),
        })
    }

    /// Connection URL for the cache client.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_url() {
        let cfg = RedisConfig::from_lookup(&|_| None).unwrap();
        assert_eq!(cfg.url(), "redis://localhost:6379/0");
    }

    #[test]
    fn test_url_takes_precedence() {
        let lookup = |key: &str| {
            (key == "REDIS_URL").then(|| "redis://cache.internal:6380/2".to_string())
        };
        let cfg = RedisConfig::from_lookup(&lookup).unwrap();
        assert_eq!(cfg.url(), "redis://cache.internal:6380/2");
    }

    #[test]
    fn test_password_in_assembled_url() {
        let lookup = |key: &str| match key {
            "REDIS_PASSWORD" => Some("hunter2".to_string()),
            "REDIS_DB" => Some("1".to_string()),
            _ => None,
        };
        let cfg = RedisConfig::from_lookup(&lookup).unwrap();
        assert_eq!(cfg.url(), "redis://:hunter2@localhost:6379/1");
    }
}
