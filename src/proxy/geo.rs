//! Geolocation and header-echo payloads returned by the strict-mode probes

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Geographic location of a proxy's egress IP
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct GeoLocation {
    pub country: String,
    pub country_code: String,
    pub city: String,
    pub region: String,
}

impl GeoLocation {
    /// Check if the location has any meaningful data
    pub fn is_empty(&self) -> bool {
        self.country.is_empty()
            && self.country_code.is_empty()
            && self.city.is_empty()
            && self.region.is_empty()
    }

    /// `City, Country` when the city is known, else the country, else `Unknown`
    pub fn short_display(&self) -> String {
        match (self.city.is_empty(), self.country.is_empty()) {
            (false, _) => format!("{}, {}", self.city, self.country),
            (true, false) => self.country.clone(),
            (true, true) => String::from("Unknown"),
        }
    }
}

impl std::fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.short_display())
    }
}

/// Response of an ip-api.com style lookup
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct IpLookup {
    pub status: String,
    pub country: String,
    #[serde(rename = "countryCode")]
    pub country_code: String,
    #[serde(rename = "regionName")]
    pub region: String,
    pub city: String,
    /// The address the lookup service saw the request coming from
    pub query: String,
}

impl IpLookup {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }

    pub fn location(&self) -> GeoLocation {
        GeoLocation {
            country: self.country.clone(),
            country_code: self.country_code.clone(),
            city: self.city.clone(),
            region: self.region.clone(),
        }
    }
}

/// Response of an httpbin.org/headers style echo
#[derive(Debug, Clone, Deserialize, Default)]
pub struct HeadersEcho {
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl HeadersEcho {
    /// A proxy is anonymous when no forwarded header carries the egress IP
    pub fn reveals(&self, ip: &str) -> bool {
        self.headers.values().any(|value| value.contains(ip))
    }
}
