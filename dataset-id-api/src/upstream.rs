//! HTTP client for the upstream dataset catalog.
//!
//! Every catalog request goes to one fixed URL: a plain GET lists the root
//! categories, a form POST with `parentId` lists the children of one node.
//! Failures never reach the caller as errors. They are logged and counted,
//! and the caller sees an absent envelope.

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, COOKIE, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Client, Url};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::UpstreamConfig;
use crate::error::{ApiError, Result, UpstreamError};
use crate::telemetry::Telemetry;

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Form field naming the node whose children are requested.
pub const PARENT_ID_FIELD: &str = "parentId";

/// Source of catalog envelopes for the aggregator.
///
/// `None` for `parent_id` requests the root level. `None` as a result means
/// the request failed and the branch should be skipped.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    async fn fetch(&self, parent_id: Option<&str>) -> Option<Value>;
}

/// Shared upstream client, built once at startup.
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    client: Client,
    catalog_url: Url,
    token_cookie: String,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout()).build()?;
        let catalog_url = Url::parse(&config.catalog_url())
            .map_err(|e| ApiError::Configuration(format!("invalid upstream URL: {e}")))?;

        Ok(Self {
            client,
            catalog_url,
            token_cookie: config.token_cookie.clone(),
        })
    }

    pub fn catalog_url(&self) -> &Url {
        &self.catalog_url
    }

    /// Binds the current session token for one aggregation run.
    pub fn session(
        &self,
        token: Option<&str>,
    ) -> std::result::Result<CatalogSession<'_>, InvalidHeaderValue> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE));
        if let Some(token) = token {
            let mut cookie = HeaderValue::from_str(&format!("{}={token}", self.token_cookie))?;
            cookie.set_sensitive(true);
            headers.insert(COOKIE, cookie);
        }

        Ok(CatalogSession {
            upstream: self,
            headers,
        })
    }

    /// Issues one request and parses the body as JSON.
    ///
    /// GET when `form` is `None`, form-encoded POST otherwise.
    pub async fn fetch_json(
        &self,
        url: &Url,
        headers: &HeaderMap,
        form: Option<&[(&str, &str)]>,
    ) -> std::result::Result<Value, UpstreamError> {
        let request = match form {
            Some(fields) => self.client.post(url.clone()).form(fields),
            None => self.client.get(url.clone()),
        };

        let response = request
            .headers(headers.clone())
            .send()
            .await
            .map_err(UpstreamError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Status {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(UpstreamError::Transport)?;
        serde_json::from_slice(&body).map_err(UpstreamError::Parse)
    }
}

/// Upstream client plus the headers for one aggregation run.
pub struct CatalogSession<'a> {
    upstream: &'a UpstreamClient,
    headers: HeaderMap,
}

#[async_trait]
impl CatalogSource for CatalogSession<'_> {
    async fn fetch(&self, parent_id: Option<&str>) -> Option<Value> {
        let form = parent_id.map(|id| [(PARENT_ID_FIELD, id)]);
        let result = self
            .upstream
            .fetch_json(
                &self.upstream.catalog_url,
                &self.headers,
                form.as_ref().map(|f| f.as_slice()),
            )
            .await;

        match result {
            Ok(envelope) => {
                debug!(parent_id = parent_id.unwrap_or("<root>"), "Catalog request succeeded");
                Telemetry::record_upstream("ok");
                Some(envelope)
            }
            Err(e) => {
                warn!(
                    parent_id = parent_id.unwrap_or("<root>"),
                    kind = e.kind(),
                    error = %e,
                    "Catalog request failed, skipping branch"
                );
                Telemetry::record_upstream(e.kind());
                None
            }
        }
    }
}
