//! # Dataset ID API
//!
//! A small HTTP service that flattens the upstream dataset catalog, a fixed
//! three-level taxonomy (category → subcategory → dataset), into one list of
//! leaf dataset ids.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐  GET / POST parentId  ┌─────────────────┐
//! │ Upstream catalog│◄──────────────────────│ Dataset ID API  │◄──── HTTP clients
//! │  (pageList)     │──────────────────────►│  (This crate)   │
//! └─────────────────┘  {code, data.items}   └─────────────────┘
//! ```
//!
//! ## Endpoints
//!
//! - `GET /` - Service banner and endpoint map
//! - `GET /health` - Liveness check, never calls the upstream
//! - `GET /api/dataset-ids` - Aggregated `{code, msg, data: {items, count}}`

pub mod aggregator;
pub mod config;
pub mod error;
pub mod extractor;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod server;
pub mod state;
pub mod telemetry;
pub mod upstream;

pub use aggregator::HierarchyAggregator;
pub use config::{ServiceConfig, StatusMode};
pub use error::{AggregateError, ApiError};
pub use response::{AggregateResponse, DatasetRecord};
pub use server::DatasetApiServer;
pub use state::AppState;
pub use upstream::{CatalogSource, UpstreamClient};
