//! Lookup data model: entities in, per-entity results out

use crate::offense::Offense;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single indicator submitted for lookup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    #[serde(rename = "isIP", default)]
    pub is_ip: bool,
    pub value: String,
}

impl Entity {
    pub fn ip(value: impl Into<String>) -> Self {
        Self {
            is_ip: true,
            value: value.into(),
        }
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

/// Offenses that survived filtering for one entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapedData {
    /// Short tags for list display, e.g. "Offenses: 3"
    pub summary: Vec<String>,
    pub details: Vec<Offense>,
}

/// Result for one input entity; `data` is `None` when nothing matched
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    pub entity: Entity,
    pub data: Option<ShapedData>,
}

impl LookupResult {
    pub fn empty(entity: Entity) -> Self {
        Self { entity, data: None }
    }
}
