//! Three-level catalog walk.
//!
//! Root ids come from a plain catalog request. Every root id is expanded to
//! its children, and every child to its datasets. Output order is traversal
//! order at every level. A failed request for one id only drops that branch;
//! an empty level 1 or level 2 ends the run with a reportable error, while
//! an empty level 3 is still a success.

use futures_util::{StreamExt, stream};
use tracing::{debug, info};

use crate::error::AggregateError;
use crate::extractor::extract_ids;
use crate::response::DatasetRecord;
use crate::upstream::CatalogSource;

/// Walks the catalog hierarchy and flattens it into dataset records.
#[derive(Debug, Clone, Copy)]
pub struct HierarchyAggregator {
    fan_out: usize,
}

impl Default for HierarchyAggregator {
    fn default() -> Self {
        Self { fan_out: 1 }
    }
}

impl HierarchyAggregator {
    /// `fan_out` bounds in-flight requests per level; 1 walks sequentially.
    pub fn new(fan_out: usize) -> Self {
        Self {
            fan_out: fan_out.max(1),
        }
    }

    pub fn fan_out(&self) -> usize {
        self.fan_out
    }

    pub async fn run<S>(&self, source: &S) -> Result<Vec<DatasetRecord>, AggregateError>
    where
        S: CatalogSource + ?Sized,
    {
        let root = source
            .fetch(None)
            .await
            .ok_or(AggregateError::SourceUnreachable)?;

        let level_one = extract_ids(Some(&root));
        debug!(count = level_one.len(), "Level-1 ids extracted");
        if level_one.is_empty() {
            return Err(AggregateError::NoLevelOneIds);
        }

        let level_two = self.expand(source, &level_one).await;
        debug!(count = level_two.len(), "Level-2 ids extracted");
        if level_two.is_empty() {
            return Err(AggregateError::NoLevelTwoData);
        }

        let records: Vec<DatasetRecord> = self
            .expand(source, &level_two)
            .await
            .into_iter()
            .map(DatasetRecord::new)
            .collect();

        info!(
            level_one = level_one.len(),
            level_two = level_two.len(),
            datasets = records.len(),
            "Catalog aggregation complete"
        );
        Ok(records)
    }

    /// Fetches the children of every parent and concatenates them in parent
    /// order. `buffered` yields results in input order regardless of which
    /// request finishes first.
    async fn expand<S>(&self, source: &S, parents: &[String]) -> Vec<String>
    where
        S: CatalogSource + ?Sized,
    {
        stream::iter(parents.iter().cloned())
            .map(|parent| async move {
                extract_ids(source.fetch(Some(parent.as_str())).await.as_ref())
            })
            .buffered(self.fan_out)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect()
    }
}
