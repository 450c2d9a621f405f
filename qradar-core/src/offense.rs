//! QRadar offense records as returned by `GET /api/siem/offenses`

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Offense workflow status. QRadar reports these upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OffenseStatus {
    Open,
    Hidden,
    Closed,
    Other(String),
}

impl From<String> for OffenseStatus {
    fn from(s: String) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "OPEN" => OffenseStatus::Open,
            "HIDDEN" => OffenseStatus::Hidden,
            "CLOSED" => OffenseStatus::Closed,
            _ => OffenseStatus::Other(s),
        }
    }
}

impl From<OffenseStatus> for String {
    fn from(status: OffenseStatus) -> Self {
        status.to_string()
    }
}

impl fmt::Display for OffenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OffenseStatus::Open => write!(f, "OPEN"),
            OffenseStatus::Hidden => write!(f, "HIDDEN"),
            OffenseStatus::Closed => write!(f, "CLOSED"),
            OffenseStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

/// One offense. `id`, `status` and `severity` must be present or the
/// payload is rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offense {
    pub id: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    pub status: OffenseStatus,
    pub severity: u32,
    #[serde(default)]
    pub magnitude: Option<u32>,
    #[serde(default)]
    pub credibility: Option<u32>,
    #[serde(default)]
    pub relevance: Option<u32>,
    #[serde(default)]
    pub offense_source: Option<String>,
    #[serde(default)]
    pub offense_type: Option<i64>,
    #[serde(default)]
    pub event_count: Option<u64>,
    #[serde(default)]
    pub flow_count: Option<u64>,
    /// Epoch milliseconds
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Epoch milliseconds
    #[serde(default)]
    pub last_updated_time: Option<i64>,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub categories: Vec<String>,
    #[serde(default)]
    pub source_network: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub destination_networks: Vec<String>,
    #[serde(default)]
    pub follow_up: Option<bool>,
    #[serde(default)]
    pub protected: Option<bool>,
}

// QRadar sends explicit nulls for unset text and list fields.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Offense {
    pub fn is_open(&self) -> bool {
        self.status == OffenseStatus::Open
    }
}

/// Test-support helper: parse an offense search response body.
///
/// `#[doc(hidden)]` so fixture tests can exercise deserialization without a
/// live server. Anything other than a JSON array of offenses is an error.
#[doc(hidden)]
pub fn parse_offenses_json(json: &str) -> Result<Vec<Offense>, serde_json::Error> {
    serde_json::from_str(json)
}
