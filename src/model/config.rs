use anyhow::{anyhow, Context};
use derive_more::Display;
use std::env;
use std::net::SocketAddrV4;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_API_URL: &str = "http://localhost:8080/api";
const DEFAULT_POLL_SECS: u64 = 30;
const DEFAULT_HOST_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_PUBLIC_URL: &str = "http://localhost:3000";
const DEFAULT_TABLE_COUNT: u32 = 12;

#[derive(Debug, Display, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum Env {
    Dev,
    Stg,
    Prod,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "stg" => Ok(Self::Stg),
            "prod" => Ok(Self::Prod),
            s => Err(format!("Invalid Env: {s}")),
        }
    }
}

/// Resolve `APP_ENV` and, in dev, load `.env.dev` into the process environment.
///
/// Runs before logging is initialised, so a failed dotenv load is returned to the
/// caller to report once the logger is up.
pub fn bootstrap_env() -> (Env, Option<dotenvy::Error>) {
    let env = env::var("APP_ENV")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(Env::Dev); // default dev env if absent

    let dotenv_err = match env {
        Env::Prod | Env::Stg => None, // load in CI
        Env::Dev => dotenvy::from_path(Path::new(".env.dev")).err(),
    };
    (env, dotenv_err)
}

/// Dashboard configs
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// backend base url, the `splitqr` namespace is appended per request
    pub api_url: String,
    pub poll_interval: Duration,
}

impl DashboardConfig {
    pub fn new(api_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            api_url: api_url.into(),
            poll_interval,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let api_url = env::var("SPLITQR_API_URL").unwrap_or(DEFAULT_API_URL.to_string());
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(anyhow!("SPLITQR_API_URL must be an http(s) url, got {api_url}"));
        }
        let poll_secs = match env::var("SPLITQR_POLL_SECS") {
            Ok(v) => v
                .parse::<u64>()
                .context("failed to parse SPLITQR_POLL_SECS")?,
            Err(_) => DEFAULT_POLL_SECS,
        };
        if poll_secs == 0 {
            return Err(anyhow!("SPLITQR_POLL_SECS must be positive"));
        }
        Ok(Self::new(api_url, Duration::from_secs(poll_secs)))
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL, Duration::from_secs(DEFAULT_POLL_SECS))
    }
}

/// Sandbox server configs
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub addr: SocketAddrV4,
    /// origin of the guest payment page encoded into QR links
    pub public_url: String,
    pub table_count: u32,
}

impl SandboxConfig {
    pub fn new(addr: SocketAddrV4, public_url: impl Into<String>, table_count: u32) -> Self {
        Self {
            addr,
            public_url: public_url.into(),
            table_count,
        }
    }

    pub fn from_env() -> anyhow::Result<Self> {
        let addr = SocketAddrV4::from_str(
            env::var("HOST")
                .unwrap_or(DEFAULT_HOST_ADDR.to_string())
                .as_str(),
        )
        .context("failed to parse HOST")?;
        let public_url = env::var("SANDBOX_PUBLIC_URL").unwrap_or(DEFAULT_PUBLIC_URL.to_string());
        let table_count = match env::var("SANDBOX_TABLES") {
            Ok(v) => v.parse::<u32>().context("failed to parse SANDBOX_TABLES")?,
            Err(_) => DEFAULT_TABLE_COUNT,
        };
        Ok(Self::new(addr, public_url, table_count))
    }
}
