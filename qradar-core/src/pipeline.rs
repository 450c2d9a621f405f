//! Batch lookup: skip, fetch, filter and shape, one result per entity in input order

use crate::client::{ApiError, OffenseSource, QRadarClient};
use crate::config::RequestConfig;
use crate::entity::{Entity, LookupResult};
use crate::options::{validate_options, Options, RawOptions, ValidationError};
use crate::private_ip::should_skip;
use crate::shaping::shape;

use futures::stream::{self, StreamExt, TryStreamExt};
use log::{debug, info, warn};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("cannot create QRadar client: {0}")]
    Setup(#[source] ApiError),

    #[error("lookup failed for {entity}: {source}")]
    Api {
        entity: Entity,
        #[source]
        source: ApiError,
    },

    #[error("lookup cancelled")]
    Cancelled,
}

/// Entry point used by the host: option validation and batch lookups
pub struct Integration {
    config: RequestConfig,
    source: OnceLock<Arc<dyn OffenseSource>>,
}

impl Integration {
    pub fn new(config: RequestConfig) -> Self {
        Self {
            config,
            source: OnceLock::new(),
        }
    }

    /// Use `source` instead of a real QRadar client
    pub fn with_source(config: RequestConfig, source: Arc<dyn OffenseSource>) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(source);
        Self {
            config,
            source: cell,
        }
    }

    pub fn config(&self) -> &RequestConfig {
        &self.config
    }

    fn source(&self) -> Result<Arc<dyn OffenseSource>, ApiError> {
        if let Some(source) = self.source.get() {
            return Ok(Arc::clone(source));
        }
        let client: Arc<dyn OffenseSource> = Arc::new(QRadarClient::new(self.config.clone())?);
        Ok(Arc::clone(self.source.get_or_init(|| client)))
    }

    /// Build the shared HTTP client up front. Lookups before `startup` build
    /// it on first use.
    pub fn startup(&self) -> Result<(), ApiError> {
        let source = self.source()?;
        info!(
            "QRadar integration started (source={}, verify_tls={}, max_concurrent={})",
            source.name(),
            self.config.reject_unauthorized,
            self.config.max_concurrent_lookups
        );
        Ok(())
    }

    /// Shape the host's options bag and report every field error.
    pub fn validate_options(&self, raw: &RawOptions) -> (Options, Vec<ValidationError>) {
        let errors = validate_options(raw);
        for err in &errors {
            debug!("Option validation failed: {}", err);
        }
        (Options::from_raw(raw), errors)
    }

    /// Look up every entity. Results come back in input order; the first
    /// API failure fails the whole batch.
    pub async fn do_lookup(
        &self,
        entities: &[Entity],
        options: &Options,
    ) -> Result<Vec<LookupResult>, LookupError> {
        let source = self.source().map_err(LookupError::Setup)?;
        let limit = self.config.max_concurrent_lookups.max(1);
        debug!(
            "Looking up {} entities (concurrency={}, options={:?})",
            entities.len(),
            limit,
            options
        );

        // `buffered` yields in submission order regardless of completion order.
        stream::iter(entities.iter().cloned())
            .map(|entity| lookup_entity(source.as_ref(), entity, options))
            .buffered(limit)
            .try_collect()
            .await
    }

    /// Like [`Integration::do_lookup`], but gives up with
    /// [`LookupError::Cancelled`] once `cancel` fires. In-flight requests are
    /// dropped and no partial results are returned.
    pub async fn do_lookup_with_cancel(
        &self,
        entities: &[Entity],
        options: &Options,
        cancel: CancellationToken,
    ) -> Result<Vec<LookupResult>, LookupError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Lookup of {} entities cancelled", entities.len());
                Err(LookupError::Cancelled)
            }
            res = self.do_lookup(entities, options) => res,
        }
    }
}

async fn lookup_entity(
    src: &dyn OffenseSource,
    entity: Entity,
    options: &Options,
) -> Result<LookupResult, LookupError> {
    if !entity.is_ip {
        debug!("Skipping non-IP entity {}", entity);
        return Ok(LookupResult::empty(entity));
    }
    if should_skip(&entity, options) {
        debug!("Skipping private IP {}", entity);
        return Ok(LookupResult::empty(entity));
    }

    match src.fetch_offenses(&entity.value, options).await {
        Ok(offenses) => {
            let data = shape(&offenses, options);
            debug!(
                "{}: {} offenses fetched, {} shown",
                entity,
                offenses.len(),
                data.as_ref().map(|d| d.details.len()).unwrap_or(0)
            );
            Ok(LookupResult { entity, data })
        }
        Err(source) => {
            warn!("{} lookup failed for {}: {}", src.name(), entity, source);
            Err(LookupError::Api { entity, source })
        }
    }
}
