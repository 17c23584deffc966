use std::{env, time::Duration};

use clap::Parser;
use gm_common::Secret;
use thiserror::Error;

const DEFAULT_ADDRESS: &str = "localhost:8080";
const DEFAULT_ACCRUAL_ADDRESS: &str = "http://localhost:8082";
const DEFAULT_ACCRUAL_WORKERS: usize = 3;
const DEFAULT_ACCRUAL_INTERVAL_SECS: u64 = 10;
const DEFAULT_ACCRUAL_HTTP_TIMEOUT_SECS: u64 = 10;
const DEFAULT_ACCRUAL_RETRY_AFTER_SECS: u64 = 60;
const DEFAULT_JWT_TOKEN_TTL_SECS: u64 = 3600;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 5;

/// Command-line flags. Environment variables take precedence over every flag.
#[derive(Debug, Parser)]
#[command(name = "gophermart", about = "Gophermart loyalty points service")]
pub struct CliArgs {
    /// Listen address for the HTTP server
    #[arg(short = 'a', long = "address")]
    pub address: Option<String>,
    /// Database DSN (required, e.g. sqlite://gophermart.db)
    #[arg(short = 'd', long = "database")]
    pub database_uri: Option<String>,
    /// Base URL of the external accrual service
    #[arg(short = 'r', long = "accrual-address")]
    pub accrual_address: Option<String>,
    /// Number of accrual workers
    #[arg(short = 'w', long = "workers")]
    pub accrual_workers: Option<usize>,
    /// JWT signing secret (required)
    #[arg(short = 'j', long = "jwt-secret")]
    pub jwt_secret: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub address: String,
    pub database_uri: String,
    pub accrual: AccrualConfig,
    pub auth: AuthConfig,
    /// Grace period for in-flight requests during shutdown.
    pub shutdown_timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AccrualConfig {
    /// Base URL of the accrual service, scheme included.
    pub address: String,
    pub workers: usize,
    /// Dispatcher tick interval.
    pub poll_interval: Duration,
    /// Per-request timeout towards the accrual service.
    pub http_timeout: Duration,
    /// Back-off applied on a 429 without a usable Retry-After header.
    pub default_retry_after: Duration,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
    pub token_ttl: Duration,
}

#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("the database DSN is missing; set DATABASE_URI or pass -d")]
    MissingDatabaseUri,
    #[error("the JWT signing secret is missing; set JWT or pass -j")]
    MissingJwtSecret,
    #[error("{value} is not a valid value for {name}")]
    InvalidValue { name: &'static str, value: String },
}

impl ServerConfig {
    /// Resolves the effective configuration: environment variables override
    /// CLI flags, flags override the built-in defaults.
    pub fn from_args(args: CliArgs) -> Result<Self, ConfigError> {
        let address =
            env::var("RUN_ADDRESS").ok().or(args.address).unwrap_or_else(|| DEFAULT_ADDRESS.to_string());

        let database_uri =
            env::var("DATABASE_URI").ok().or(args.database_uri).ok_or(ConfigError::MissingDatabaseUri)?;

        let mut accrual_address = env::var("ACCRUAL_SYSTEM_ADDRESS")
            .ok()
            .or(args.accrual_address)
            .unwrap_or_else(|| DEFAULT_ACCRUAL_ADDRESS.to_string());
        if !accrual_address.contains("://") {
            accrual_address = format!("http://{accrual_address}");
        }

        let workers = match env::var("ACCRUAL_WORKERS") {
            Ok(value) => value
                .parse::<usize>()
                .map_err(|_| ConfigError::InvalidValue { name: "ACCRUAL_WORKERS", value })?,
            Err(_) => args.accrual_workers.unwrap_or(DEFAULT_ACCRUAL_WORKERS),
        };

        let jwt_secret = env::var("JWT").ok().or(args.jwt_secret).ok_or(ConfigError::MissingJwtSecret)?;

        Ok(Self {
            address,
            database_uri,
            accrual: AccrualConfig {
                address: accrual_address,
                workers,
                poll_interval: seconds_from_env("ACCRUAL_INTERVAL", DEFAULT_ACCRUAL_INTERVAL_SECS)?,
                http_timeout: seconds_from_env("ACCRUAL_HTTP_TIMEOUT", DEFAULT_ACCRUAL_HTTP_TIMEOUT_SECS)?,
                default_retry_after: seconds_from_env("ACCRUAL_RETRY_AFTER", DEFAULT_ACCRUAL_RETRY_AFTER_SECS)?,
            },
            auth: AuthConfig {
                jwt_secret: Secret::new(jwt_secret),
                token_ttl: seconds_from_env("JWT_TOKEN_TTL", DEFAULT_JWT_TOKEN_TTL_SECS)?,
            },
            shutdown_timeout: seconds_from_env("SHUTDOWN_TIMEOUT", DEFAULT_SHUTDOWN_TIMEOUT_SECS)?,
        })
    }
}

fn seconds_from_env(name: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Ok(value) => {
            let secs = value.parse::<u64>().map_err(|_| ConfigError::InvalidValue { name, value })?;
            Ok(Duration::from_secs(secs))
        },
        Err(_) => Ok(Duration::from_secs(default)),
    }
}
