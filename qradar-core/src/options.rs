//! User options: the host's raw options bag, validation, and typed options

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

pub const URL_MESSAGE: &str = "You must provide a valid host for the IBM QRadar server.";
pub const USERNAME_MESSAGE: &str =
    "You must provide a valid username for authentication with the IBM QRadar server.";
pub const PASSWORD_MESSAGE: &str =
    "You must provide a valid password for authentication with the IBM QRadar server.";

/// Required string fields, in the order their errors are reported
const REQUIRED_FIELDS: [(&str, &str); 3] = [
    ("url", URL_MESSAGE),
    ("username", USERNAME_MESSAGE),
    ("password", PASSWORD_MESSAGE),
];

/// A single option as the host delivers it: `{ "value": ... }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawOption {
    #[serde(default)]
    pub value: Value,
}

/// The host's options bag, keyed by option name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawOptions(HashMap<String, RawOption>);

impl RawOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(
            key.to_string(),
            RawOption {
                value: value.into(),
            },
        );
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key).map(|o| &o.value)
    }

    fn non_blank_str(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    }

    fn string(&self, key: &str) -> String {
        self.get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
            _ => false,
        }
    }

    fn severity(&self, key: &str) -> Option<u32> {
        let value = self.get(key)?;
        let parsed = match value {
            Value::Null => return None,
            Value::String(s) if s.trim().is_empty() => return None,
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().and_then(whole_number)),
            Value::String(s) => {
                let s = s.trim();
                s.parse::<u64>()
                    .ok()
                    .or_else(|| s.parse::<f64>().ok().and_then(whole_number))
            }
            _ => None,
        }
        .and_then(|v| u32::try_from(v).ok());
        if parsed.is_none() {
            warn!("Ignoring {}={}: not a non-negative whole number", key, value);
        }
        parsed
    }
}

fn whole_number(f: f64) -> Option<u64> {
    (f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u64::MAX as f64).then_some(f as u64)
}

/// A user configuration defect, keyed by option name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationError {
    pub key: String,
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.key, self.message)
    }
}

/// Check the raw bag and collect every field error (url, username, password order).
pub fn validate_options(raw: &RawOptions) -> Vec<ValidationError> {
    REQUIRED_FIELDS
        .iter()
        .filter(|(key, _)| raw.non_blank_str(key).is_none())
        .map(|(key, message)| ValidationError {
            key: key.to_string(),
            message: message.to_string(),
        })
        .collect()
}

/// Typed per-call options
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub url: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub ignore_private_ips: bool,
    #[serde(default)]
    pub open_only: bool,
    #[serde(default)]
    pub minimum_severity: Option<u32>,
}

impl Options {
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            ..Default::default()
        }
    }

    /// Shape a raw bag into typed options. Missing or malformed optional
    /// values fall back to their defaults. Only `url` is trimmed; credentials
    /// are sent exactly as entered.
    pub fn from_raw(raw: &RawOptions) -> Self {
        Self {
            url: raw.string("url").trim().to_string(),
            username: raw.string("username"),
            password: raw.string("password"),
            ignore_private_ips: raw.flag("ignorePrivateIps"),
            open_only: raw.flag("openOnly"),
            minimum_severity: raw.severity("minimumSeverity"),
        }
    }
}

// Password stays out of any {:?} that ends up in a log line.
impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("ignore_private_ips", &self.ignore_private_ips)
            .field("open_only", &self.open_only)
            .field("minimum_severity", &self.minimum_severity)
            .finish()
    }
}
