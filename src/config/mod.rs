/// Application configuration module
use crate::domain::{FetchMode, Quantity};
use anyhow::{anyhow, bail, Context};
use std::env;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub bind_addr: String,
    pub lightcurve_api_url: String,
    pub ephemeris_api_url: String,
    pub catalog_prefix: String,
    pub baseline_habitability: Quantity,
    pub default_fetch_mode: FetchMode,
    pub transports: Transports,
    pub cors_enabled: bool,
    pub http_timeout: Duration,
}

/// Which transport adapters are mounted
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transports {
    pub json: bool,
    pub html: bool,
}

impl Transports {
    pub fn parse(list: &str) -> anyhow::Result<Self> {
        let mut transports = Transports {
            json: false,
            html: false,
        };
        for name in list.split(',').map(|s| s.trim()).filter(|s| !s.is_empty()) {
            match name.to_ascii_lowercase().as_str() {
                "json" => transports.json = true,
                "html" => transports.html = true,
                other => bail!("unknown transport '{}'", other),
            }
        }
        if !transports.json && !transports.html {
            bail!("at least one transport must be enabled");
        }
        Ok(transports)
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let lightcurve_api_url = env::var("LIGHTCURVE_API_URL")
            .unwrap_or_else(|_| "http://127.0.0.1:8700".to_string());

        let ephemeris_api_url = env::var("EPHEMERIS_API_URL").unwrap_or_else(|_| {
            "https://exoplanetarchive.ipac.caltech.edu/TAP/sync".to_string()
        });

        let catalog_prefix = env::var("CATALOG_PREFIX").unwrap_or_else(|_| "TIC".to_string());

        let baseline_habitability = Quantity::Bare(env_f64("BASELINE_HABITABILITY", 50.0));

        let default_fetch_mode = match env::var("FETCH_MODE") {
            Ok(raw) => raw
                .parse::<FetchMode>()
                .map_err(|e| anyhow!(e))
                .context("invalid FETCH_MODE")?,
            Err(_) => FetchMode::All,
        };

        let transports = Transports::parse(
            &env::var("TRANSPORTS").unwrap_or_else(|_| "json,html".to_string()),
        )
        .context("invalid TRANSPORTS")?;

        let cors_enabled = env_bool("CORS_ENABLED", true);
        let http_timeout = Duration::from_secs(env_u64("HTTP_TIMEOUT_SECONDS", 30));

        Ok(Self {
            bind_addr,
            lightcurve_api_url,
            ephemeris_api_url,
            catalog_prefix,
            baseline_habitability,
            default_fetch_mode,
            transports,
            cors_enabled,
            http_timeout,
        })
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .and_then(|s| parse_bool(&s))
        .unwrap_or(default)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
