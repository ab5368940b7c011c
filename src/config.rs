//! Environment-driven configuration.
//!
//! Every setting has a default suitable for local development. Blank
//! variables are treated as unset.

use crate::task::services::RetryPolicy;
use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Errors raised while reading configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was set to a value that cannot be used.
    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        /// Environment variable name.
        key: &'static str,
        /// Offending value.
        value: String,
        /// What was expected instead.
        reason: &'static str,
    },
}

/// TLS negotiation mode for database connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SslMode {
    /// Never use TLS.
    Disable,
    /// Use TLS when the server offers it.
    #[default]
    Prefer,
    /// Require TLS without verifying the server certificate.
    Require,
}

impl SslMode {
    /// Returns the libpq `sslmode` keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disable => "disable",
            Self::Prefer => "prefer",
            Self::Require => "require",
        }
    }
}

impl FromStr for SslMode {
    type Err = ();

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "disable" | "false" | "off" => Ok(Self::Disable),
            "prefer" => Ok(Self::Prefer),
            "require" | "true" | "on" => Ok(Self::Require),
            _ => Err(()),
        }
    }
}

/// Database connection settings.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    host: String,
    port: u16,
    database: String,
    user: String,
    password: Option<String>,
    ssl_mode: SslMode,
    pool_size: u32,
    connect_timeout: Duration,
}

impl DatabaseConfig {
    /// Returns the server host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the server port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Returns the database name.
    #[must_use]
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Returns the user name.
    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    /// Returns the TLS mode.
    #[must_use]
    pub const fn ssl_mode(&self) -> SslMode {
        self.ssl_mode
    }

    /// Returns the maximum number of pooled connections.
    #[must_use]
    pub const fn pool_size(&self) -> u32 {
        self.pool_size
    }

    /// Returns how long to wait for a pooled connection.
    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// Builds a libpq keyword/value connection string.
    #[must_use]
    pub fn connection_string(&self) -> String {
        let mut parts = vec![
            format!("host={}", quote_conninfo(&self.host)),
            format!("port={}", self.port),
            format!("dbname={}", quote_conninfo(&self.database)),
            format!("user={}", quote_conninfo(&self.user)),
            format!("sslmode={}", self.ssl_mode.as_str()),
            format!("connect_timeout={}", self.connect_timeout.as_secs().max(1)),
        ];
        if let Some(password) = &self.password {
            parts.push(format!("password={}", quote_conninfo(password)));
        }
        parts.join(" ")
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("ssl_mode", &self.ssl_mode)
            .field("pool_size", &self.pool_size)
            .field("connect_timeout", &self.connect_timeout)
            .finish()
    }
}

/// Quotes a libpq connection-string value.
fn quote_conninfo(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}

/// Error-reporting settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticsConfig {
    dsn: Option<String>,
    environment: String,
}

impl DiagnosticsConfig {
    /// Creates diagnostics settings.
    #[must_use]
    pub fn new(dsn: Option<String>, environment: impl Into<String>) -> Self {
        Self {
            dsn,
            environment: environment.into(),
        }
    }

    /// Returns the reporting sink DSN, if configured.
    #[must_use]
    pub fn dsn(&self) -> Option<&str> {
        self.dsn.as_deref()
    }

    /// Returns the deployment environment name.
    #[must_use]
    pub fn environment(&self) -> &str {
        &self.environment
    }
}

/// Local server listen settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    host: String,
    port: u16,
}

impl ServerConfig {
    /// Returns the bind host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the bind port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Database connection settings.
    pub database: DatabaseConfig,
    /// Connectivity retry policy.
    pub retry: RetryPolicy,
    /// Value of `Access-Control-Allow-Origin`.
    pub allowed_origin: String,
    /// Error-reporting settings.
    pub diagnostics: DiagnosticsConfig,
    /// Local server listen settings.
    pub server: ServerConfig,
}

impl AppConfig {
    /// Reads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable cannot be
    /// parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when a variable cannot be
    /// parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env { lookup };

        let database = DatabaseConfig {
            host: env.string("DB_HOST", "localhost"),
            port: env.parse("DB_PORT", 5432, "expected a port number")?,
            database: env.string("DB_NAME", "tasks_db"),
            user: env.string("DB_USER", "postgres"),
            password: env.get("DB_PASSWORD"),
            ssl_mode: env.parse(
                "DB_SSL_MODE",
                SslMode::Prefer,
                "expected disable, prefer, or require",
            )?,
            pool_size: env.positive("DB_POOL_SIZE", 10)?,
            connect_timeout: Duration::from_millis(u64::from(
                env.positive("DB_CONNECT_TIMEOUT_MS", 5000)?,
            )),
        };

        let attempts = env.positive("DB_RETRY_ATTEMPTS", RetryPolicy::DEFAULT_ATTEMPTS.get())?;
        let delay_ms: u64 = env.parse(
            "DB_RETRY_DELAY_MS",
            1000,
            "expected a delay in milliseconds",
        )?;
        let retry = NonZeroU32::new(attempts).map_or_else(RetryPolicy::default, |max_attempts| {
            RetryPolicy::new(max_attempts, Duration::from_millis(delay_ms))
        });

        Ok(Self {
            database,
            retry,
            allowed_origin: env.string("ALLOWED_ORIGIN", "*"),
            diagnostics: DiagnosticsConfig::new(
                env.get("DIAGNOSTICS_DSN"),
                env.string("APP_ENV", "development"),
            ),
            server: ServerConfig {
                host: env.string("HOST", "0.0.0.0"),
                port: env.parse("PORT", 3000, "expected a port number")?,
            },
        })
    }
}

struct Env<F> {
    lookup: F,
}

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.trim().is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or_else(|| default.to_owned())
    }

    fn parse<T: FromStr>(
        &self,
        key: &'static str,
        default: T,
        reason: &'static str,
    ) -> Result<T, ConfigError> {
        let Some(value) = self.get(key) else {
            return Ok(default);
        };
        value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value, reason })
    }

    fn positive(&self, key: &'static str, default: u32) -> Result<u32, ConfigError> {
        let reason = "expected a positive integer";
        let parsed: u32 = self.parse(key, default, reason)?;
        if parsed == 0 {
            return Err(ConfigError::InvalidValue {
                key,
                value: parsed.to_string(),
                reason,
            });
        }
        Ok(parsed)
    }
}
