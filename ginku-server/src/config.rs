//! Process configuration, read from the command line or the environment.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use clap::Parser;
use ginku_reqwest::{ApiKey, DEFAULT_BASE_URL, Url};

use crate::logging::LogFormat;

/// Caching reverse proxy for the Ginko transit API.
///
/// Every option can also be set through the environment variable named in
/// its help, or through a `.env` file in the working directory.
#[derive(Parser, Debug, Clone)]
#[command(name = "ginku-server")]
#[command(version, about, long_about = None)]
pub struct Config {
    /// Key sent to the upstream API with every call
    #[arg(long, env = "APIKEY", hide_env_values = true)]
    pub api_key: ApiKey,

    /// Base URL of the upstream API
    #[arg(long, env = "UPSTREAM_URL", default_value = DEFAULT_BASE_URL)]
    pub upstream_url: Url,

    /// Address to listen on
    #[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "PORT", default_value_t = 3000)]
    pub port: u16,

    /// How long cached upstream responses are served (e.g. `60s`, `2m`)
    #[arg(
        long,
        env = "CACHE_TTL",
        default_value = "60s",
        value_parser = humantime::parse_duration
    )]
    pub cache_ttl: Duration,

    /// How long cached real-time wait times are served
    #[arg(
        long,
        env = "REALTIME_TTL",
        default_value = "30s",
        value_parser = humantime::parse_duration
    )]
    pub realtime_ttl: Duration,

    /// Upper bound on one upstream call
    #[arg(
        long,
        env = "UPSTREAM_TIMEOUT",
        default_value = "15s",
        value_parser = humantime::parse_duration
    )]
    pub upstream_timeout: Duration,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

impl Config {
    /// Address the server binds to.
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// TTLs applied to the two request classes.
    pub fn ttls(&self) -> Ttls {
        Ttls {
            default: self.cache_ttl,
            realtime: self.realtime_ttl,
        }
    }
}

/// Freshness windows per request class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ttls {
    /// Reference data: stops, lines, variants, line status.
    pub default: Duration,
    /// Real-time wait times.
    pub realtime: Duration,
}

impl Default for Ttls {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(60),
            realtime: Duration::from_secs(30),
        }
    }
}
