//! Query API configuration

use crate::{get_env, get_env_i64, get_env_u16, lookup_env, Result};

/// HTTP listener settings (`SERVER_PORT`, default 8080).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            port: get_env_u16(&lookup_env, "SERVER_PORT", 8080)?,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

/// Token signing settings (`JWT_SECRET`, `JWT_EXPIRY_HOURS`).
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub expiry_hours: i64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            secret: get_env(&lookup_env, "JWT_SECRET", "dev-secret-change-me"),
            expiry_hours: get_env_i64(&lookup_env, "JWT_EXPIRY_HOURS", 24)?,
        })
    }
}

/// Cross-origin policy (`CORS_ALLOWED_ORIGINS`, default `*`).
///
/// A single `*` allows every origin without credentials; an explicit
/// comma-separated list allows credentialed requests from those origins.
#[derive(Debug, Clone)]
pub struct CorsConfig {
    allowed_origins: String,
}

impl CorsConfig {
    pub fn from_env() -> Self {
        Self {
            allowed_origins: get_env(&lookup_env, "CORS_ALLOWED_ORIGINS", "*"),
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.allowed_origins.trim() == "*"
    }

    /// Explicit origin list (empty when wildcard).
    pub fn origins(&self) -> Vec<String> {
        if self.is_wildcard() {
            return Vec::new();
        }
        self.allowed_origins
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_wildcard() {
        let cfg = CorsConfig {
            allowed_origins: "*".into(),
        };
        assert!(cfg.is_wildcard());
        assert!(cfg.origins().is_empty());
    }

    #[test]
    fn test_cors_origin_list() {
        let cfg = CorsConfig {
            allowed_origins: "https://app.example.com, https://ops.example.com".into(),
        };
        assert!(!cfg.is_wildcard());
        assert_eq!(
            cfg.origins(),
            vec!["https://app.example.com", "https://ops.example.com"]
        );
    }
}
