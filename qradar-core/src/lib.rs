//! QRadar Core library
//! IP entity lookups against the IBM QRadar offense API

pub mod client;
pub mod config;
pub mod entity;
pub mod offense;
pub mod options;
pub mod pipeline;
pub mod private_ip;
pub mod shaping;

pub use client::{ApiError, OffenseSource, QRadarClient};
pub use config::{ConfigError, RequestConfig};
pub use entity::{Entity, LookupResult, ShapedData};
pub use offense::{Offense, OffenseStatus};
pub use options::{validate_options, Options, RawOptions, ValidationError};
pub use pipeline::{Integration, LookupError};

/// Get the library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
