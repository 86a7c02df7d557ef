use serde::{Deserialize, Serialize};
use std::net::IpAddr;

use crate::dispatch::DispatchConfig;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub bench: BenchConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Initial benchmark settings used until a settings document is imported.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BenchConfig {
    /// Number of competitors created at startup.
    #[serde(default = "default_competitor_count")]
    pub competitor_count: usize,
    /// Ring capacity per competitor.
    #[serde(default = "default_items_per_competitor")]
    pub items_per_competitor: usize,
    /// Default action rate.
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            competitor_count: default_competitor_count(),
            items_per_competitor: default_items_per_competitor(),
            requests_per_minute: default_requests_per_minute(),
        }
    }
}

fn default_competitor_count() -> usize {
    3
}

fn default_items_per_competitor() -> usize {
    2000
}

fn default_requests_per_minute() -> u32 {
    60
}

/// Outbound HTTP client configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HttpConfig {
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u32 {
    30
}

/// Report generation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReportConfig {
    /// Window from the actual test start that bounds exported detail rows.
    #[serde(default = "default_matrix_duration")]
    pub matrix_duration_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            matrix_duration_secs: default_matrix_duration(),
        }
    }
}

fn default_matrix_duration() -> u64 {
    120
}
