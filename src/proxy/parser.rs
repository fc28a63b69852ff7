//! Address normalizer: turns raw source lines into canonical `ip:port` strings

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

/// Scheme prefixes stripped before parsing
const SCHEMES: [&str; 4] = ["http://", "https://", "socks4://", "socks5://"];

/// Port field names accepted in JSON payloads, in priority order
const JSON_PORT_FIELDS: [&str; 4] = ["port", "proxy_port", "port_num", "port_number"];

/// Port assumed when a JSON payload carries an IP but no port
const DEFAULT_JSON_PORT: &str = "80";

static IP_PORT_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}):(\d+)").expect("Invalid IP:PORT regex")
});

static IP_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,3}\.\d{1,3}\.\d{1,3}\.\d{1,3}").expect("Invalid IP regex"));

static PORT_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{1,5}").expect("Invalid port regex"));

/// Knobs for how forgiving the normalizer is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Combine the first dotted quad and the first digit run found anywhere in
    /// the line when no `ip:port` pattern matches. May pair unrelated text.
    pub loose_fallback: bool,
    /// Reject octets above 255 and ports outside 1..=65535
    pub strict_ranges: bool,
}

#[derive(Debug, Deserialize)]
struct JsonPayload {
    #[serde(default)]
    data: Vec<JsonEntry>,
}

#[derive(Debug, Deserialize)]
struct JsonEntry {
    #[serde(default)]
    ip: String,
    #[serde(flatten)]
    rest: serde_json::Map<String, Value>,
}

impl JsonEntry {
    fn port(&self) -> Option<String> {
        JSON_PORT_FIELDS.iter().find_map(|field| match self.rest.get(*field) {
            Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
            Some(Value::Number(n)) => Some(n.to_string()),
            _ => None,
        })
    }
}

/// Proxy parser for normalizing and validating candidate addresses
pub struct ProxyParser;

impl ProxyParser {
    /// Normalize a raw line into `ip:port`, without validating the result
    ///
    /// Tried in order:
    /// - JSON object with a `data` array (`{"data":[{"ip":..,"port":..}]}`)
    /// - the first `ip:port` pattern anywhere in the line
    /// - with `loose_fallback`, the first dotted quad plus the first digit run
    pub fn normalize(line: &str, options: ParseOptions) -> Option<String> {
        let line = Self::strip_scheme(line.trim());

        if line.starts_with('{') {
            if let Some(address) = Self::parse_json(line) {
                return Some(address);
            }
        }

        if let Some(caps) = IP_PORT_REGEX.captures(line) {
            return Some(format!("{}:{}", &caps[1], &caps[2]));
        }

        if options.loose_fallback {
            let ip = IP_REGEX.find(line)?;
            let port = PORT_REGEX.find(line)?;
            return Some(format!("{}:{}", ip.as_str(), port.as_str()));
        }

        None
    }

    /// Normalize and validate a raw line; `None` means the line is rejected
    pub fn parse_line(line: &str, options: ParseOptions) -> Option<String> {
        let normalized = Self::normalize(line, options)?;
        Self::is_valid(&normalized, options).then_some(normalized)
    }

    /// Parse every line of a response body, keeping accepted candidates in order
    pub fn parse_string(content: &str, options: ParseOptions) -> Vec<String> {
        content
            .lines()
            .filter_map(|line| Self::parse_line(line, options))
            .collect()
    }

    /// Check the canonical form: exactly one colon, non-empty host, 1-5 digit port.
    ///
    /// Without `strict_ranges` no numeric range is enforced, so `1.2.3.4:99999`
    /// is accepted.
    pub fn is_valid(address: &str, options: ParseOptions) -> bool {
        let parts: Vec<&str> = address.split(':').collect();
        let [host, port] = parts.as_slice() else {
            return false;
        };

        if host.is_empty() || port.is_empty() || port.len() > 5 {
            return false;
        }
        if !port.bytes().all(|b| b.is_ascii_digit()) {
            return false;
        }

        if options.strict_ranges {
            return Self::in_range(host, port);
        }

        true
    }

    fn in_range(host: &str, port: &str) -> bool {
        let octets: Vec<&str> = host.split('.').collect();
        if octets.len() != 4 {
            return false;
        }
        for octet in octets {
            match octet.parse::<u32>() {
                Ok(n) if n <= 255 => {}
                _ => return false,
            }
        }

        matches!(port.parse::<u32>(), Ok(p) if (1..=65535).contains(&p))
    }

    fn strip_scheme(line: &str) -> &str {
        SCHEMES
            .iter()
            .find_map(|scheme| line.strip_prefix(scheme))
            .unwrap_or(line)
    }

    fn parse_json(line: &str) -> Option<String> {
        let payload: JsonPayload = serde_json::from_str(line).ok()?;
        let entry = payload.data.first()?;
        let port = entry
            .port()
            .unwrap_or_else(|| DEFAULT_JSON_PORT.to_string());
        Some(format!("{}:{}", entry.ip, port))
    }
}
