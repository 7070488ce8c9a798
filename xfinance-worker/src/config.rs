/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection URL (required)
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 2)
/// - `LOG_RETENTION_DAYS`: audit log rows older than this are deleted (default: 90, max: 36500)
/// - `RETENTION_INTERVAL_SECS`: pause between sweeps (default: 3600)

use std::env;

use crate::retention::{RetentionConfig, MAX_RETENTION_DAYS};

#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub max_connections: u32,
    pub retention: RetentionConfig,
}

impl WorkerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let number = |key: &str, default: u64| -> anyhow::Result<u64> {
            match lookup(key) {
                Some(raw) => raw
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| anyhow::anyhow!("{} is not a number: {}", key, e)),
                None => Ok(default),
            }
        };

        let max_connections = u32::try_from(number("DATABASE_MAX_CONNECTIONS", 2)?)
            .map_err(|_| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is too large"))?;
        let retention_days = number("LOG_RETENTION_DAYS", 90)?;
        let interval_secs = number("RETENTION_INTERVAL_SECS", 3600)?;

        if max_connections == 0 {
            anyhow::bail!("DATABASE_MAX_CONNECTIONS must be at least 1");
        }
        if retention_days == 0 {
            anyhow::bail!("LOG_RETENTION_DAYS must be at least 1");
        }
        let retention_days = i64::try_from(retention_days)
            .ok()
            .filter(|days| *days <= MAX_RETENTION_DAYS)
            .ok_or_else(|| {
                anyhow::anyhow!("LOG_RETENTION_DAYS must be at most {}", MAX_RETENTION_DAYS)
            })?;
        if interval_secs == 0 {
            anyhow::bail!("RETENTION_INTERVAL_SECS must be at least 1");
        }

        Ok(Self {
            database_url,
            max_connections,
            retention: RetentionConfig {
                retention_days,
                interval_secs,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<WorkerConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        WorkerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = load(&[("DATABASE_URL", "postgresql://localhost/xfinance")]).unwrap();

        assert_eq!(config.max_connections, 2);
        assert_eq!(config.retention.retention_days, 90);
        assert_eq!(config.retention.interval_secs, 3600);
    }

    #[test]
    fn test_overrides() {
        let config = load(&[
            ("DATABASE_URL", "postgresql://localhost/xfinance"),
            ("LOG_RETENTION_DAYS", "30"),
            ("RETENTION_INTERVAL_SECS", " 60 "),
        ])
        .unwrap();

        assert_eq!(config.retention.retention_days, 30);
        assert_eq!(config.retention.interval_secs, 60);
    }

    #[test]
    fn test_invalid_values() {
        assert!(load(&[]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://x"), ("LOG_RETENTION_DAYS", "forever")]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://x"), ("LOG_RETENTION_DAYS", "0")]).is_err());
        assert!(load(&[("DATABASE_URL", "postgresql://x"), ("RETENTION_INTERVAL_SECS", "0")]).is_err());
    }

    #[test]
    fn test_out_of_range_values() {
        for days in ["36501", "1000000000", "18446744073709551615"] {
            let err = load(&[("DATABASE_URL", "postgresql://x"), ("LOG_RETENTION_DAYS", days)])
                .unwrap_err();
            assert!(err.to_string().contains("at most 36500"), "{}: {}", days, err);
        }

        let config = load(&[("DATABASE_URL", "postgresql://x"), ("LOG_RETENTION_DAYS", "36500")]).unwrap();
        assert_eq!(config.retention.retention_days, MAX_RETENTION_DAYS);

        assert!(load(&[("DATABASE_URL", "postgresql://x"), ("DATABASE_MAX_CONNECTIONS", "4294967296")]).is_err());
    }
}
