/// Configuration management for the API server
///
/// Configuration comes from environment variables; a `.env` file is loaded
/// first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: bind host (default: 0.0.0.0)
/// - `API_PORT`: bind port (default: 8080)
/// - `DATABASE_URL`: PostgreSQL connection URL (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: token signing secret, at least 32 characters (required)
/// - `CORS_ORIGINS`: comma-separated allowed origins (default: `*`)
/// - `PRODUCTION`: `true` enables HSTS (default: false)
/// - `ADMIN_USERNAME`, `ADMIN_PASSWORD`, `ADMIN_EMAIL`: first admin account,
///   created at startup while the users table is empty
///
/// # Example
///
/// ```no_run
/// use xfinance_api::config::Config;
///
/// let config = Config::from_env().expect("Failed to load config");
/// println!("Listening on {}", config.bind_address());
/// ```

use serde::{Deserialize, Serialize};
use std::env;

/// Minimum length of `JWT_SECRET`
pub const MIN_JWT_SECRET_LEN: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,

    /// Bootstrap admin, if configured
    pub admin: Option<AdminConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    #[serde(skip_serializing)]
    pub secret: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,

    #[serde(skip_serializing)]
    pub password: String,

    pub email: String,
}

impl Config {
    /// Loads configuration from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("API_HOST", "0.0.0.0");
        let port = var("API_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is not a valid port: {}", e))?;

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is not a number: {}", e))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            anyhow::bail!("JWT_SECRET must be at least {} characters long", MIN_JWT_SECRET_LEN);
        }

        let cors_origins = parse_origins(&var("CORS_ORIGINS", "*"));
        let production = parse_bool(&var("PRODUCTION", "false"));

        let admin = match (lookup("ADMIN_USERNAME"), lookup("ADMIN_PASSWORD")) {
            (Some(username), Some(password)) if !username.trim().is_empty() => {
                let username = username.trim().to_string();
                let email = lookup("ADMIN_EMAIL").unwrap_or_else(|| format!("{}@localhost", username));
                Some(AdminConfig {
                    username,
                    password,
                    email,
                })
            }
            _ => None,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
            admin,
        })
    }

    /// `host:port` for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn allows_any_origin(&self) -> bool {
        self.api.cors_origins.iter().any(|o| o == "*")
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    let origins: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect();

    if origins.is_empty() {
        vec!["*".to_string()]
    } else {
        origins
    }
}

fn parse_bool(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgresql://localhost/xfinance"), ("JWT_SECRET", SECRET)]).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert_eq!(config.database.max_connections, 10);
        assert!(config.allows_any_origin());
        assert!(!config.api.production);
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_required_variables() {
        assert!(load(&[("JWT_SECRET", SECRET)]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://localhost/xfinance")]).is_err());

        let err = load(&[("DATABASE_URL", "postgresql://localhost/x"), ("JWT_SECRET", "short")]).unwrap_err();
        assert!(err.to_string().contains("at least 32"));
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/xfinance"),
            ("JWT_SECRET", SECRET),
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3001"),
            ("CORS_ORIGINS", "https://localhost:3000, https://addin.example.mn"),
            ("PRODUCTION", "TRUE"),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "changeme123"),
        ])
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3001");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://localhost:3000", "https://addin.example.mn"]
        );
        assert!(!config.allows_any_origin());
        assert!(config.api.production);

        let admin = config.admin.unwrap();
        assert_eq!(admin.username, "admin");
        assert_eq!(admin.email, "admin@localhost");
    }

    #[test]
    fn test_invalid_port() {
        let result = load(&[
            ("DATABASE_URL", "postgresql://localhost/xfinance"),
            ("JWT_SECRET", SECRET),
            ("API_PORT", "eighty"),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/xfinance"),
            ("JWT_SECRET", SECRET),
            ("ADMIN_USERNAME", "admin"),
            ("ADMIN_PASSWORD", "changeme123"),
        ])
        .unwrap();

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains(SECRET));
        assert!(!json.contains("changeme123"));
    }
}
