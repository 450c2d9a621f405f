//! QRadar offense search client

use crate::config::RequestConfig;
use crate::offense::{parse_offenses_json, Offense};
use crate::options::Options;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{StatusCode, Url};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use thiserror::Error;

const OFFENSES_PATH: &str = "/api/siem/offenses";
const RATE_LIMIT_COOLDOWN_SECS: u64 = 60;
const MAX_LOGGED_BODY: usize = 500;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("http client build error: {0}")]
    ClientBuild(#[source] reqwest::Error),

    #[error("invalid QRadar url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("request error: {0}")]
    Request(#[source] reqwest::Error),

    #[error("authentication rejected (HTTP {0})")]
    Unauthorized(u16),

    #[error("rate limited")]
    RateLimited,

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("unexpected offense payload: {0}")]
    Parse(#[source] serde_json::Error),
}

/// Anything that can answer "which offenses involve this IP".
///
/// Implementations are shared across concurrent lookups and must be
/// `Send + Sync`.
#[async_trait]
pub trait OffenseSource: Send + Sync {
    /// Source name for log lines
    fn name(&self) -> &'static str;

    async fn fetch_offenses(&self, ip: &str, options: &Options) -> Result<Vec<Offense>, ApiError>;
}

/// Build the offense search URL for `ip` against the server in `base`.
/// A bare host gets `https://`.
pub fn offenses_url(base: &str, ip: &str) -> Result<Url, ApiError> {
    let base = base.trim().trim_end_matches('/');
    let base = if base.contains("://") {
        base.to_string()
    } else {
        format!("https://{}", base)
    };
    let filter = format!("offense_source=\"{}\"", ip.replace('"', "\\\""));
    Url::parse_with_params(&format!("{}{}", base, OFFENSES_PATH), &[("filter", filter)]).map_err(
        |e| ApiError::InvalidUrl {
            url: base.clone(),
            reason: e.to_string(),
        },
    )
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_LOGGED_BODY).collect()
}

/// Client for the QRadar REST API using HTTP Basic authentication
pub struct QRadarClient {
    http: reqwest::Client,
    config: RequestConfig,
    rate_limit_until: Mutex<Option<Instant>>,
}

impl QRadarClient {
    pub fn new(config: RequestConfig) -> Result<Self, ApiError> {
        if !config.reject_unauthorized {
            warn!("TLS certificate verification disabled for QRadar requests");
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.reject_unauthorized)
            .build()
            .map_err(ApiError::ClientBuild)?;
        Ok(Self {
            http,
            config,
            rate_limit_until: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    fn is_rate_limited(&self) -> bool {
        if let Ok(rate_limit) = self.rate_limit_until.lock() {
            if let Some(until) = *rate_limit {
                if Instant::now() < until {
                    return true;
                }
            }
        }
        false
    }

    fn set_rate_limited(&self) {
        if let Ok(mut rate_limit) = self.rate_limit_until.lock() {
            *rate_limit = Some(Instant::now() + Duration::from_secs(RATE_LIMIT_COOLDOWN_SECS));
        }
    }

    fn range_header(&self) -> String {
        format!("items=0-{}", self.config.max_results.max(1) - 1)
    }
}

#[async_trait]
impl OffenseSource for QRadarClient {
    fn name(&self) -> &'static str {
        "QRadar"
    }

    async fn fetch_offenses(&self, ip: &str, options: &Options) -> Result<Vec<Offense>, ApiError> {
        if self.is_rate_limited() {
            return Err(ApiError::RateLimited);
        }

        let url = offenses_url(&options.url, ip)?;
        debug!(
            "QRadar offense search for {} as user '{}' (password len={})",
            ip,
            options.username,
            options.password.len()
        );

        let start = Instant::now();
        let resp = self
            .http
            .get(url)
            .basic_auth(&options.username, Some(&options.password))
            .header("Accept", "application/json")
            .header("Version", self.config.api_version.as_str())
            .header("Range", self.range_header())
            .send()
            .await
            .map_err(|e| {
                warn!("QRadar request error for {}: {}", ip, e);
                ApiError::Request(e)
            })?;

        let status = resp.status();
        let elapsed_ms = start.elapsed().as_millis();
        debug!(
            "QRadar offense search HTTP {} for {} ({} ms)",
            status.as_u16(),
            ip,
            elapsed_ms
        );

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            warn!("QRadar rejected credentials for user '{}'", options.username);
            return Err(ApiError::Unauthorized(status.as_u16()));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let body = resp.text().await.unwrap_or_default();
            warn!("QRadar rate limited. body: {}", truncate(&body));
            self.set_rate_limited();
            return Err(ApiError::RateLimited);
        }

        if !status.is_success() {
            let body = truncate(&resp.text().await.unwrap_or_default());
            warn!(
                "QRadar HTTP {} for {}. elapsed={}ms body: {}",
                status.as_u16(),
                ip,
                elapsed_ms,
                body
            );
            return Err(ApiError::Http {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.text().await.map_err(ApiError::Request)?;
        match parse_offenses_json(&text) {
            Ok(offenses) => {
                debug!("QRadar returned {} offenses for {}", offenses.len(), ip);
                Ok(offenses)
            }
            Err(e) => {
                warn!(
                    "QRadar payload parse error for {}: {}. body: {}",
                    ip,
                    e,
                    truncate(&text)
                );
                Err(ApiError::Parse(e))
            }
        }
    }
}
