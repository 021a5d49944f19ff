use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use thiserror::Error;

use crate::backend::hosted::HostedConfig;
use crate::vocab::DayBoundary;

const DEFAULT_SWEEP_SCHEDULE: &str = "0 */5 * * * *";
const DEFAULT_IDLE_TTL_HOURS: i64 = 168;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendMode {
    Hosted,
    Memory,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown BACKEND_MODE: {0}")]
    UnknownBackendMode(String),
    #[error("BACKEND_MODE=hosted requires {0}")]
    MissingHostedSetting(&'static str),
    #[error("invalid {name}: {value}")]
    InvalidSetting { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub backend_mode: BackendMode,
    pub hosted: Option<HostedConfig>,
    pub public_origin: String,
    pub session_idle_ttl: chrono::Duration,
    pub session_sweep_schedule: String,
    pub secure_cookies: bool,
    pub day_boundary: DayBoundary,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: 3000,
            log_level: "info".to_string(),
            backend_mode: BackendMode::Memory,
            hosted: None,
            public_origin: "http://localhost:3000".to_string(),
            session_idle_ttl: chrono::Duration::hours(DEFAULT_IDLE_TTL_HOURS),
            session_sweep_schedule: DEFAULT_SWEEP_SCHEDULE.to_string(),
            secure_cookies: false,
            day_boundary: DayBoundary::Local,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(3000);

        let host = std::env::var("HOST")
            .ok()
            .and_then(|value| value.parse::<IpAddr>().ok())
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));

        let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let supabase_url = env_string("SUPABASE_URL");
        let backend_mode = match env_string("BACKEND_MODE").map(|v| v.to_ascii_lowercase()) {
            Some(mode) if mode == "hosted" => BackendMode::Hosted,
            Some(mode) if mode == "memory" => BackendMode::Memory,
            Some(other) => return Err(ConfigError::UnknownBackendMode(other)),
            None if supabase_url.is_some() => BackendMode::Hosted,
            None => BackendMode::Memory,
        };

        let hosted = match backend_mode {
            BackendMode::Hosted => {
                let url = supabase_url.ok_or(ConfigError::MissingHostedSetting("SUPABASE_URL"))?;
                let anon_key = env_string("SUPABASE_ANON_KEY")
                    .or_else(|| env_string("SUPABASE_PUBLISHABLE_KEY"))
                    .ok_or(ConfigError::MissingHostedSetting("SUPABASE_ANON_KEY"))?;
                let timeout = env_u64("BACKEND_TIMEOUT_MS").unwrap_or(10_000);
                Some(HostedConfig::new(url, anon_key).with_timeout(Duration::from_millis(timeout)))
            }
            BackendMode::Memory => None,
        };

        let public_origin = env_string("PUBLIC_ORIGIN")
            .map(|origin| origin.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://localhost:{port}"));

        let session_idle_ttl = match env_string("SESSION_IDLE_TTL_HOURS") {
            Some(raw) => parse_idle_ttl_hours(&raw)?,
            None => chrono::Duration::hours(DEFAULT_IDLE_TTL_HOURS),
        };

        let session_sweep_schedule = env_string("SESSION_SWEEP_SCHEDULE")
            .unwrap_or_else(|| DEFAULT_SWEEP_SCHEDULE.to_string());

        let secure_cookies = env_bool("COOKIE_SECURE").unwrap_or(false);

        let day_boundary = match env_string("DAY_BOUNDARY_OFFSET") {
            Some(raw) => DayBoundary::parse_offset(&raw).unwrap_or_else(|| {
                tracing::warn!(value = %raw, "invalid DAY_BOUNDARY_OFFSET, using local time");
                DayBoundary::Local
            }),
            None => DayBoundary::Local,
        };

        Ok(Self {
            host,
            port,
            log_level,
            backend_mode,
            hosted,
            public_origin,
            session_idle_ttl,
            session_sweep_schedule,
            secure_cookies,
            day_boundary,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Where the confirmation mail sends new users back to.
    pub fn sign_up_redirect(&self) -> String {
        format!("{}/", self.public_origin)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_u64(key: &str) -> Option<u64> {
    env_string(key)?.trim().parse().ok()
}

pub(crate) fn env_bool(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    let normalized = value.trim().to_ascii_lowercase();
    if normalized.is_empty() {
        return None;
    }
    match normalized.as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

/// Whole hours, at least one, within what `chrono` can represent.
fn parse_idle_ttl_hours(raw: &str) -> Result<chrono::Duration, ConfigError> {
    let invalid = || ConfigError::InvalidSetting {
        name: "SESSION_IDLE_TTL_HOURS",
        value: raw.to_string(),
    };

    let hours: u64 = raw.trim().parse().map_err(|_| invalid())?;
    let hours = i64::try_from(hours).map_err(|_| invalid())?;
    if hours == 0 {
        return Err(invalid());
    }
    chrono::Duration::try_hours(hours).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_ttl_accepts_hours() {
        assert_eq!(
            parse_idle_ttl_hours(" 24 ").unwrap(),
            chrono::Duration::hours(24)
        );
    }

    #[test]
    fn test_idle_ttl_rejects_out_of_range_values() {
        for raw in [
            "0",
            "-3",
            "soon",
            "3000000000000000",
            "18446744073709551615",
            "99999999999999999999",
        ] {
            assert!(
                matches!(
                    parse_idle_ttl_hours(raw),
                    Err(ConfigError::InvalidSetting {
                        name: "SESSION_IDLE_TTL_HOURS",
                        ..
                    })
                ),
                "{raw} should be rejected"
            );
        }
    }
}
