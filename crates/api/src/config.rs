use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderValue;
use hotel_core::patch::PatchMode;
use hotel_core::policy::PathPattern;

/// Paths admitted without a bearer token unless `PUBLIC_PATHS` overrides them.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/health",
    "/metrics",
    "/swagger/*",
    "/v1/auth/login",
    "/v1/auth/register",
    "/v1/auth/verify-email",
];

/// Upper bound for `SESSION_TTL_HOURS` (one year).
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 365;
/// Upper bound for `SESSION_CACHE_TTL_SECS`.
pub const MAX_SESSION_CACHE_TTL_SECS: u64 = 3600;
/// Upper bound for `VERIFICATION_CODE_TTL_MINS` (one week).
pub const MAX_VERIFICATION_CODE_TTL_MINS: i64 = 7 * 24 * 60;

/// Invalid configuration value.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// PostgreSQL URL. When unset the server runs on the in-memory backend.
    pub database_url: Option<String>,
    /// Policy CSV file (default: `config/policy.csv`).
    pub policy_path: PathBuf,
    /// Path patterns that bypass the auth gate.
    pub public_paths: Vec<PathPattern>,
    pub session_ttl_hours: i64,
    pub session_cache_ttl_secs: u64,
    pub verification_code_ttl_mins: i64,
    pub patch_mode: PatchMode,
    pub log_format: LogFormat,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            cors_origins: vec!["http://localhost:5173".into()],
            request_timeout_secs: 30,
            database_url: None,
            policy_path: PathBuf::from("config/policy.csv"),
            public_paths: DEFAULT_PUBLIC_PATHS
                .iter()
                .filter_map(|p| PathPattern::parse(p).ok())
                .collect(),
            session_ttl_hours: 24,
            session_cache_ttl_secs: 60,
            verification_code_ttl_mins: 10,
            patch_mode: PatchMode::Sentinel,
            log_format: LogFormat::Pretty,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                      | Default                      |
    /// |------------------------------|------------------------------|
    /// | `HOST`                       | `0.0.0.0`                    |
    /// | `PORT`                       | `3000`                       |
    /// | `CORS_ORIGINS`               | `http://localhost:5173`      |
    /// | `REQUEST_TIMEOUT_SECS`       | `30`                         |
    /// | `DATABASE_URL`               | unset (in-memory storage)    |
    /// | `POLICY_PATH`                | `config/policy.csv`          |
    /// | `PUBLIC_PATHS`               | see [`DEFAULT_PUBLIC_PATHS`] |
    /// | `SESSION_TTL_HOURS`          | `24`                         |
    /// | `SESSION_CACHE_TTL_SECS`     | `60`                         |
    /// | `VERIFICATION_CODE_TTL_MINS` | `10`                         |
    /// | `PATCH_MODE`                 | `sentinel`                   |
    /// | `LOG_FORMAT`                 | `pretty`                     |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ServerConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let cors_origins = match var("CORS_ORIGINS") {
            Some(raw) => split_list(&raw),
            None => defaults.cors_origins,
        };
        for origin in &cors_origins {
            if HeaderValue::from_str(origin).is_err() {
                return Err(invalid("CORS_ORIGINS", "a list of valid origins", origin));
            }
        }

        let public_paths = match var("PUBLIC_PATHS") {
            Some(raw) => split_list(&raw)
                .iter()
                .map(|p| {
                    PathPattern::parse(p)
                        .map_err(|_| invalid("PUBLIC_PATHS", "a list of absolute paths", p))
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => defaults.public_paths,
        };

        let patch_mode = match var("PATCH_MODE") {
            Some(raw) => raw
                .parse()
                .map_err(|_| invalid("PATCH_MODE", "'sentinel' or 'explicit'", &raw))?,
            None => defaults.patch_mode,
        };

        let log_format = match var("LOG_FORMAT").map(|v| v.to_ascii_lowercase()).as_deref() {
            None | Some("pretty") => LogFormat::Pretty,
            Some("json") => LogFormat::Json,
            Some(other) => return Err(invalid("LOG_FORMAT", "'pretty' or 'json'", other)),
        };

        Ok(Self {
            host: var("HOST").unwrap_or(defaults.host),
            port: parse_or(var("PORT"), "PORT", "a valid u16", defaults.port)?,
            cors_origins,
            request_timeout_secs: parse_or(
                var("REQUEST_TIMEOUT_SECS"),
                "REQUEST_TIMEOUT_SECS",
                "a valid u64",
                defaults.request_timeout_secs,
            )?,
            database_url: var("DATABASE_URL"),
            policy_path: var("POLICY_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.policy_path),
            public_paths,
            session_ttl_hours: bounded(
                var("SESSION_TTL_HOURS"),
                "SESSION_TTL_HOURS",
                "an integer from 1 to 8760",
                1..=MAX_SESSION_TTL_HOURS,
                defaults.session_ttl_hours,
            )?,
            session_cache_ttl_secs: bounded(
                var("SESSION_CACHE_TTL_SECS"),
                "SESSION_CACHE_TTL_SECS",
                "an integer from 0 to 3600",
                0..=MAX_SESSION_CACHE_TTL_SECS,
                defaults.session_cache_ttl_secs,
            )?,
            verification_code_ttl_mins: bounded(
                var("VERIFICATION_CODE_TTL_MINS"),
                "VERIFICATION_CODE_TTL_MINS",
                "an integer from 1 to 10080",
                1..=MAX_VERIFICATION_CODE_TTL_MINS,
                defaults.verification_code_ttl_mins,
            )?,
            patch_mode,
            log_format,
        })
    }
}

fn invalid(name: &'static str, expected: &'static str, value: &str) -> ConfigError {
    ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    }
}

fn parse_or<T: FromStr>(
    raw: Option<String>,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        Some(raw) => raw.trim().parse().map_err(|_| invalid(name, expected, &raw)),
        None => Ok(default),
    }
}

fn bounded<T>(
    raw: Option<String>,
    name: &'static str,
    expected: &'static str,
    range: RangeInclusive<T>,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr + PartialOrd + ToString,
{
    let value = parse_or(raw, name, expected, default)?;
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(invalid(name, expected, &value.to_string()))
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
