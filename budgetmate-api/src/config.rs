/// Configuration for the API server
///
/// Everything comes from environment variables; a `.env` file in the working
/// directory is loaded first when present.
///
/// # Environment Variables
///
/// | Variable                   | Default                 |
/// |----------------------------|-------------------------|
/// | `DATABASE_URL`             | required                |
/// | `DATABASE_MAX_CONNECTIONS` | `10`                    |
/// | `API_HOST`                 | `0.0.0.0`               |
/// | `API_PORT` / `PORT`        | `8080`                  |
/// | `SESSION_TTL_DAYS`         | `7`                     |
/// | `SESSION_CACHE_TTL_SECS`   | `300`                   |
/// | `SECURE_COOKIES`           | `false`                 |
/// | `GROQ_API_KEY`             | unset (rules only)      |
/// | `GROQ_MODEL`               | `llama-3.1-8b-instant`  |
///
/// `SECURE_COOKIES=true` also turns on HSTS; set it whenever the app is
/// served over HTTPS.
///
/// # Example
///
/// ```no_run
/// use budgetmate_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use budgetmate_shared::auth::session::DEFAULT_SESSION_TTL_DAYS;
use budgetmate_shared::auth::session_cache::DEFAULT_CACHE_TTL_SECS;
use budgetmate_shared::categorize::DEFAULT_GROQ_MODEL;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub categorizer: CategorizerConfig,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Lifetime of a login
    pub ttl_days: i64,
    /// How long a resolved session is served from memory
    pub cache_ttl_secs: i64,
    /// Adds `Secure` to the session cookie and enables HSTS
    pub secure_cookies: bool,
}

#[derive(Debug, Clone)]
pub struct CategorizerConfig {
    /// Groq key; `None` means keyword rules only
    pub api_key: Option<String>,
    pub model: String,
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value {:?}: {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

fn parse_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `DATABASE_URL` is missing, a numeric variable
    /// does not parse, or a TTL is not positive.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        // PORT is what most hosting platforms inject
        let port = match env::var("API_PORT") {
            Ok(_) => parse_var("API_PORT", 8080u16)?,
            Err(_) => parse_var("PORT", 8080u16)?,
        };

        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 10u32)?;

        let ttl_days = parse_var("SESSION_TTL_DAYS", DEFAULT_SESSION_TTL_DAYS)?;
        let cache_ttl_secs = parse_var("SESSION_CACHE_TTL_SECS", DEFAULT_CACHE_TTL_SECS)?;
        if ttl_days <= 0 || cache_ttl_secs <= 0 {
            anyhow::bail!("SESSION_TTL_DAYS and SESSION_CACHE_TTL_SECS must be positive");
        }

        let api_key = env::var("GROQ_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());
        let model = env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string());

        Ok(Self {
            api: ApiConfig { host, port },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            session: SessionConfig {
                ttl_days,
                cache_ttl_secs,
                secure_cookies: parse_flag("SECURE_COOKIES"),
            },
            categorizer: CategorizerConfig { api_key, model },
        })
    }

    /// Configuration for tests: local defaults around the given database.
    pub fn for_database(url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
            },
            database: DatabaseConfig {
                url: url.into(),
                max_connections: 5,
            },
            session: SessionConfig {
                ttl_days: DEFAULT_SESSION_TTL_DAYS,
                cache_ttl_secs: DEFAULT_CACHE_TTL_SECS,
                secure_cookies: false,
            },
            categorizer: CategorizerConfig {
                api_key: None,
                model: DEFAULT_GROQ_MODEL.to_string(),
            },
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_address() {
        let mut config = Config::for_database("postgresql://localhost/test");
        config.api.port = 8080;
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_test_config_is_rules_only() {
        let config = Config::for_database("postgresql://localhost/test");
        assert!(config.categorizer.api_key.is_none());
        assert_eq!(config.session.ttl_days, 7);
        assert_eq!(config.session.cache_ttl_secs, 300);
        assert!(!config.session.secure_cookies);
    }
}
