//! Grid listing service
//!
//! Runs the count and page queries of one grid request and assembles the
//! page for the caller. Both queries are composed before anything is
//! executed, so rejected criteria never reach the datastore.

use serde_json::Value as JsonValue;
use sg_core::PaginatedResult;
use sg_queries::{QueryComposer, SearchCriteria};
use tracing::{debug, warn};

use crate::datastore::Datastore;
use crate::error::ListingError;

pub struct GridListing<D> {
    datastore: D,
}

impl<D: Datastore> GridListing<D> {
    pub fn new(datastore: D) -> Self {
        Self { datastore }
    }

    pub fn datastore(&self) -> &D {
        &self.datastore
    }

    /// Fetch one page of rows plus the total number of matching rows
    pub async fn list(
        &self,
        composer: &QueryComposer,
        criteria: &SearchCriteria,
    ) -> Result<PaginatedResult<JsonValue>, ListingError> {
        let composed = composer
            .build_list_query(criteria)
            .and_then(|list| Ok((list, composer.build_count_query(criteria)?)));

        let (list_query, count_query) = match composed {
            Ok(queries) => queries,
            Err(err) => {
                warn!(grid = composer.grid().name, error = %err, "Rejected grid criteria");
                return Err(err.into());
            }
        };

        let total = self.datastore.fetch_count(&count_query).await?;
        let items = self.datastore.fetch_rows(&list_query).await?;

        debug!(
            grid = composer.grid().name,
            total,
            returned = items.len(),
            "Listed grid page"
        );

        Ok(PaginatedResult::new(items, total, criteria.pagination))
    }

    /// Count matching rows; sorting and pagination in `criteria` are ignored
    pub async fn count(
        &self,
        composer: &QueryComposer,
        criteria: &SearchCriteria,
    ) -> Result<i64, ListingError> {
        let query = composer.build_count_query(criteria).map_err(|err| {
            warn!(grid = composer.grid().name, error = %err, "Rejected grid criteria");
            err
        })?;

        Ok(self.datastore.fetch_count(&query).await?)
    }
}
