//! Application state for the Dataset ID API.

use std::sync::Arc;

use crate::aggregator::HierarchyAggregator;
use crate::config::ServiceConfig;
use crate::error::{AggregateError, Result};
use crate::response::DatasetRecord;
use crate::upstream::UpstreamClient;

/// Shared application state for Axum handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServiceConfig>,
    /// Upstream catalog client.
    pub upstream: UpstreamClient,
    pub aggregator: HierarchyAggregator,
}

impl AppState {
    /// Creates a new application state.
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let upstream = UpstreamClient::new(&config.upstream)?;
        let aggregator = HierarchyAggregator::new(config.fan_out);

        Ok(Self {
            config: Arc::new(config),
            upstream,
            aggregator,
        })
    }

    /// Runs one aggregation against the upstream catalog.
    ///
    /// The session token is resolved first so a rotated token file applies
    /// to this run.
    pub async fn aggregate(&self) -> std::result::Result<Vec<DatasetRecord>, AggregateError> {
        let token = self.config.upstream.resolve_token().await.map_err(|e| {
            AggregateError::Internal(format!("cannot read session token: {e}"))
        })?;

        let session = self.upstream.session(token.as_deref()).map_err(|e| {
            AggregateError::Internal(format!("session token is not a valid header value: {e}"))
        })?;

        self.aggregator.run(&session).await
    }
}
