use std::{env, time::Duration};
use voicechat_network::COMPATIBILITY_VERSION;

/// Configuration for the voice chat server binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address and port the server binds to (e.g. `0.0.0.0:24454`).
    pub bind_address: String,
    /// How long a new connection may take to send its hello frame.
    pub handshake_timeout: Duration,
    /// Period of the metrics log line; `None` disables it.
    pub metrics_interval: Option<Duration>,
    /// Protocol version clients must match.
    pub compatibility_version: u32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:24454".to_string(),
            handshake_timeout: Duration::from_millis(5000),
            metrics_interval: Some(Duration::from_secs(30)),
            compatibility_version: COMPATIBILITY_VERSION,
        }
    }
}

impl ServerConfig {
    /// Builds a configuration from environment variables, falling back to
    /// [`ServerConfig::default`] for anything unset or unparsable.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();

        let bind_address = env::var("VOICECHAT_BIND").unwrap_or(defaults.bind_address);
        let handshake_timeout_ms: u64 = read_parsed("VOICECHAT_HANDSHAKE_TIMEOUT_MS")
            .unwrap_or(defaults.handshake_timeout.as_millis() as u64);
        let metrics_interval_secs: u64 =
            read_parsed("VOICECHAT_METRICS_INTERVAL_SECS").unwrap_or(30);
        let compatibility_version = read_parsed("VOICECHAT_COMPATIBILITY_VERSION")
            .unwrap_or(defaults.compatibility_version);

        anyhow::ensure!(handshake_timeout_ms > 0, "handshake timeout must be > 0");

        Ok(Self {
            bind_address,
            handshake_timeout: Duration::from_millis(handshake_timeout_ms),
            metrics_interval: interval_from_secs(metrics_interval_secs),
            compatibility_version,
        })
    }
}

/// Zero disables the periodic task.
pub fn interval_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}

fn read_parsed<T: std::str::FromStr>(var: &str) -> Option<T> {
    env::var(var).ok().and_then(|v| v.trim().parse().ok())
}
