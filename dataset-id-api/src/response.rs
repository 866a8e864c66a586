//! Response envelope returned by the aggregation endpoint.

use serde::{Deserialize, Serialize};

use crate::error::AggregateError;

/// One leaf-level dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(rename = "datasetId")]
    pub dataset_id: String,
}

impl DatasetRecord {
    pub fn new(dataset_id: impl Into<String>) -> Self {
        Self {
            dataset_id: dataset_id.into(),
        }
    }
}

/// `data` section of the envelope. `count` always equals `items.len()`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetPage {
    pub items: Vec<DatasetRecord>,
    pub count: usize,
}

impl DatasetPage {
    pub fn new(items: Vec<DatasetRecord>) -> Self {
        let count = items.len();
        Self { items, count }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }
}

/// Uniform body for every outcome of `GET /api/dataset-ids`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateResponse {
    /// Domain status: 200, 404 or 500.
    pub code: u16,
    pub msg: String,
    pub data: DatasetPage,
}

impl AggregateResponse {
    pub fn success(items: Vec<DatasetRecord>) -> Self {
        let data = DatasetPage::new(items);
        Self {
            code: 200,
            msg: format!("successfully retrieved {} records", data.count),
            data,
        }
    }

    pub fn failure(err: &AggregateError) -> Self {
        Self {
            code: err.code(),
            msg: err.to_string(),
            data: DatasetPage::empty(),
        }
    }
}

impl From<Result<Vec<DatasetRecord>, AggregateError>> for AggregateResponse {
    fn from(outcome: Result<Vec<DatasetRecord>, AggregateError>) -> Self {
        match outcome {
            Ok(items) => Self::success(items),
            Err(err) => Self::failure(&err),
        }
    }
}
