/// Worker configuration
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `WORKER_POLL_INTERVAL_SECS`: queue poll interval (default: 5)
/// - `WORKER_BATCH_SIZE`: emails claimed per poll (default: 10)
/// - `WORKER_MAX_ATTEMPTS`: attempts before an email is marked failed
///   (default: 3)
/// - `PLAN_REFRESH_SECS`: hunt-plan mirror refresh interval (default: 60)
/// - `CREDIT_CHECK_URL`: broker credit service base URL; unset disables
///   checks (every broker rates `unknown`)

use loadline_shared::db::DatabaseConfig;
use std::env;

/// Complete worker configuration
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Database connection URL
    pub database_url: String,

    /// Queue poll interval in seconds
    pub poll_interval_secs: u64,

    /// Emails claimed per poll
    pub batch_size: i64,

    /// Attempts before a row goes to `failed`
    pub max_attempts: i32,

    /// Hunt-plan mirror refresh interval in seconds
    pub plan_refresh_secs: u64,

    /// Broker credit service base URL; None disables checks
    pub credit_check_url: Option<String>,
}

impl WorkerConfig {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error when required variables are missing or malformed.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let poll_interval_secs = env::var("WORKER_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse::<u64>()?;

        let batch_size = env::var("WORKER_BATCH_SIZE")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<i64>()?;

        let max_attempts = env::var("WORKER_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse::<i32>()?;

        let plan_refresh_secs = env::var("PLAN_REFRESH_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse::<u64>()?;

        let credit_check_url = env::var("CREDIT_CHECK_URL").ok().filter(|s| !s.is_empty());

        if batch_size < 1 {
            anyhow::bail!("WORKER_BATCH_SIZE must be at least 1");
        }
        if max_attempts < 1 {
            anyhow::bail!("WORKER_MAX_ATTEMPTS must be at least 1");
        }

        Ok(Self {
            database_url,
            poll_interval_secs,
            batch_size,
            max_attempts,
            plan_refresh_secs,
            credit_check_url,
        })
    }

    /// Database pool configuration
    pub fn database(&self) -> DatabaseConfig {
        DatabaseConfig {
            url: self.database_url.clone(),
            // The worker is one polling loop; it needs far fewer
            // connections than the API.
            max_connections: 5,
            ..Default::default()
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            poll_interval_secs: 5,
            batch_size: 10,
            max_attempts: 3,
            plan_refresh_secs: 60,
            credit_check_url: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = WorkerConfig::default();
        assert_eq!(config.poll_interval_secs, 5);
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.max_attempts, 3);
        assert!(config.credit_check_url.is_none());
    }
}
