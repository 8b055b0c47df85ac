//! Process configuration for the probe.
//!
//! Defaults match a TWS trading terminal on the local machine. Every value can
//! be overridden by an environment variable, and the command line wins over
//! both (see the binary's `--help`).

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use log::warn;

/// Host running TWS or IB Gateway.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default API port of a TWS trading terminal.
pub const TWS_PORT: u16 = 7496;

/// Default API port of a headless IB Gateway.
pub const GATEWAY_PORT: u16 = 4001;

/// Client id the probe identifies itself with. Must be unique among
/// concurrent sessions against the same TWS/Gateway instance.
pub const DEFAULT_CLIENT_ID: i32 = 999;

/// Seconds to wait for the position snapshot before giving up.
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Connection settings for one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeConfig {
    pub host: String,
    pub port: u16,
    pub client_id: i32,
    pub timeout: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: TWS_PORT,
            client_id: DEFAULT_CLIENT_ID,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl ProbeConfig {
    /// Builds a configuration from the defaults with any `IBKR_HOST`,
    /// `IBKR_PORT`, `IBKR_CLIENT_ID` and `IBKR_PROBE_TIMEOUT` environment
    /// overrides applied. Unparseable values are logged and ignored.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: env_override("IBKR_HOST", defaults.host),
            port: env_override("IBKR_PORT", defaults.port),
            client_id: env_override("IBKR_CLIENT_ID", defaults.client_id),
            timeout: Duration::from_secs(env_override("IBKR_PROBE_TIMEOUT", DEFAULT_TIMEOUT_SECS)),
        }
    }

    /// Socket address in the `host:port` form the vendor client expects.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_override<T>(name: &str, current: T) -> T
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env::var(name) {
        Ok(value) => match value.parse() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!("ignoring {name}={value}: {err}");
                current
            }
        },
        Err(_) => current,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serial_test::serial;

    use super::*;

    const ENV_VARS: [&str; 4] = ["IBKR_HOST", "IBKR_PORT", "IBKR_CLIENT_ID", "IBKR_PROBE_TIMEOUT"];

    #[test]
    fn test_defaults() {
        let config = ProbeConfig::default();

        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, TWS_PORT);
        assert_eq!(config.client_id, 999);
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.address(), "127.0.0.1:7496");
    }

    #[test]
    #[serial]
    fn test_from_env_without_overrides() {
        temp_env::with_vars(ENV_VARS.map(|name| (name, None::<&str>)), || {
            assert_eq!(ProbeConfig::from_env(), ProbeConfig::default());
        });
    }

    #[test]
    #[serial]
    fn test_from_env_with_overrides() {
        temp_env::with_vars(
            [
                ("IBKR_HOST", Some("gateway.example.com")),
                ("IBKR_PORT", Some("4002")),
                ("IBKR_CLIENT_ID", Some("42")),
                ("IBKR_PROBE_TIMEOUT", Some("3")),
            ],
            || {
                let config = ProbeConfig::from_env();

                assert_eq!(config.host, "gateway.example.com");
                assert_eq!(config.port, 4002);
                assert_eq!(config.client_id, 42);
                assert_eq!(config.timeout, Duration::from_secs(3));
                assert_eq!(config.address(), "gateway.example.com:4002");
            },
        );
    }

    #[test]
    #[serial]
    fn test_unparseable_override_keeps_default() {
        temp_env::with_vars(
            [("IBKR_PORT", Some("not-a-port")), ("IBKR_CLIENT_ID", Some("7"))],
            || {
                let config = ProbeConfig::from_env();

                assert_eq!(config.port, TWS_PORT);
                assert_eq!(config.client_id, 7);
            },
        );
    }
}
