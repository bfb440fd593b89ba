
use crate::registry::DEFAULT_MAX_CAPACITY;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Server configuration, loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface the HTTP server binds to.
    pub host: IpAddr,
    /// Port the HTTP server binds to.
    pub port: u16,
    /// Largest capacity `create` accepts.
    pub max_capacity: usize,
    /// Silence after which a connection is dropped. `None` disables the bound.
    pub idle_timeout: Option<Duration>,
    /// Age after which an empty room is reaped. `None` disables reaping.
    pub room_ttl: Option<Duration>,
    /// How often the reaper runs.
    pub reap_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            max_capacity: DEFAULT_MAX_CAPACITY,
            idle_timeout: Some(Duration::from_secs(600)),
            room_ttl: Some(Duration::from_secs(3600)),
            reap_interval: Duration::from_secs(60),
        }
    }
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// Missing or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let parsed = |name: &str| lookup(name).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            host: lookup("BLANCO_HOST")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.host),
            port: lookup("PORT")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.port),
            max_capacity: parsed("BLANCO_MAX_CAPACITY")
                .map(|v| v as usize)
                .unwrap_or(defaults.max_capacity),
            idle_timeout: parsed("BLANCO_IDLE_TIMEOUT_SECS")
                .map(secs_or_disabled)
                .unwrap_or(defaults.idle_timeout),
            room_ttl: parsed("BLANCO_ROOM_TTL_SECS")
                .map(secs_or_disabled)
                .unwrap_or(defaults.room_ttl),
            reap_interval: parsed("BLANCO_REAP_INTERVAL_SECS")
                .filter(|v| *v > 0)
                .map(Duration::from_secs)
                .unwrap_or(defaults.reap_interval),
        }
    }

    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn secs_or_disabled(secs: u64) -> Option<Duration> {
    (secs > 0).then(|| Duration::from_secs(secs))
}
