//! Proxy data models

use crate::proxy::geo::GeoLocation;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Header row written at the top of detailed output files
pub const DETAILED_HEADER: &str = "Proxy|IP|Location|Response Time|Anonymous";

/// Proxy family enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ProxyType {
    #[default]
    Http,
    Socks5,
}

impl ProxyType {
    /// Both families, in the order they are scraped and reported
    pub const ALL: [ProxyType; 2] = [ProxyType::Http, ProxyType::Socks5];

    /// URL scheme used when routing requests through a proxy of this family.
    ///
    /// SOCKS5 uses `socks5h` so target host names are resolved by the proxy.
    pub fn scheme(&self) -> &'static str {
        match self {
            ProxyType::Http => "http",
            ProxyType::Socks5 => "socks5h",
        }
    }

    /// File name of this family's source list and output list
    pub fn list_file_name(&self) -> &'static str {
        match self {
            ProxyType::Http => "http.txt",
            ProxyType::Socks5 => "socks5.txt",
        }
    }
}

impl fmt::Display for ProxyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProxyType::Http => write!(f, "HTTP"),
            ProxyType::Socks5 => write!(f, "SOCKS5"),
        }
    }
}

/// A candidate proxy: a canonical `ip:port` address tagged with its family
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Proxy {
    pub address: String,
    pub proxy_type: ProxyType,
}

impl Proxy {
    pub fn new(address: impl Into<String>, proxy_type: ProxyType) -> Self {
        Self {
            address: address.into(),
            proxy_type,
        }
    }

    /// Get the proxy URL string
    pub fn url(&self) -> String {
        format!("{}://{}", self.proxy_type.scheme(), self.address)
    }
}

impl fmt::Display for Proxy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

/// Result of proxy check operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProxyCheckStatus {
    Working,
    Failed(String),
    Timeout,
}

/// Detailed result of a proxy check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyCheckResult {
    pub proxy: Proxy,
    pub status: ProxyCheckStatus,
    /// Round-trip time of the probe(s), when a response was received
    pub response_time: Option<Duration>,
    /// Egress IP reported by the geolocation probe (strict mode only)
    pub egress_ip: Option<String>,
    /// Whether no echoed header revealed the egress IP (strict mode only)
    pub anonymous: bool,
    pub location: Option<GeoLocation>,
}

impl ProxyCheckResult {
    pub fn working(proxy: Proxy, response_time: Duration) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Working,
            response_time: Some(response_time),
            egress_ip: None,
            anonymous: false,
            location: None,
        }
    }

    pub fn failed(proxy: Proxy, error: String) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Failed(error),
            response_time: None,
            egress_ip: None,
            anonymous: false,
            location: None,
        }
    }

    pub fn timeout(proxy: Proxy) -> Self {
        Self {
            proxy,
            status: ProxyCheckStatus::Timeout,
            response_time: None,
            egress_ip: None,
            anonymous: false,
            location: None,
        }
    }

    /// Attach the data gathered by the strict probes
    pub fn with_strict_report(
        mut self,
        egress_ip: String,
        location: GeoLocation,
        anonymous: bool,
        response_time: Duration,
    ) -> Self {
        self.egress_ip = Some(egress_ip);
        self.location = Some(location);
        self.anonymous = anonymous;
        self.response_time = Some(response_time);
        self
    }

    pub fn is_working(&self) -> bool {
        matches!(self.status, ProxyCheckStatus::Working)
    }

    /// Pipe-delimited record: address, egress IP, location, latency, anonymity
    pub fn to_detailed_line(&self) -> String {
        let location = self
            .location
            .as_ref()
            .map_or_else(|| String::from("Unknown"), GeoLocation::short_display);

        format!(
            "{}|{}|{}|{}|{}",
            self.proxy.address,
            self.egress_ip.as_deref().unwrap_or_default(),
            location,
            format_latency(self.response_time.unwrap_or_default()),
            if self.anonymous { "Yes" } else { "No" },
        )
    }
}

/// Render a duration rounded to the millisecond, e.g. `850ms`, `1.5s`, `2s`
pub fn format_latency(duration: Duration) -> String {
    let millis = (duration.as_micros() + 500) / 1000;
    if millis == 0 {
        return String::from("0s");
    }
    if millis < 1000 {
        return format!("{}ms", millis);
    }

    let secs = millis / 1000;
    let frac = millis % 1000;
    if frac == 0 {
        format!("{}s", secs)
    } else {
        let frac = format!("{:03}", frac);
        format!("{}.{}s", secs, frac.trim_end_matches('0'))
    }
}
