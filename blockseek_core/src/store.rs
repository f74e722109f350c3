use std::collections::HashSet;

use alloy_primitives::U256;
use async_trait::async_trait;

use crate::document::{BlockDocument, Document, IndexKind};

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("document {id} already exists in {index}")]
    Conflict { index: IndexKind, id: String },
    #[error("index store unreachable: {0}")]
    Unreachable(String),
    #[error("bulk write to {index} failed for {failed} document(s): {reason}")]
    PartialFailure {
        index: IndexKind,
        failed: usize,
        reason: String,
    },
    #[error("index store rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },
    #[error("malformed index store response: {0}")]
    Malformed(String),
}

/// Outcome of a create-only bulk write.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BulkSummary {
    pub created: usize,
    /// Documents skipped because their ID was already indexed.
    pub conflicts: usize,
}

/// Write side of the search backend. Every write is create-only.
#[async_trait]
pub trait IndexStore: Send + Sync {
    async fn latest_indexed_height(&self) -> Result<Option<U256>, StoreError>;

    /// Fails with [`StoreError::Conflict`] when the height is already indexed.
    async fn create_block(&self, doc: &BlockDocument) -> Result<(), StoreError>;

    async fn bulk_create<D: Document>(&self, docs: &[D]) -> Result<BulkSummary, StoreError>;

    async fn find_existing_ids(
        &self,
        index: IndexKind,
        ids: &[String],
    ) -> Result<HashSet<String>, StoreError>;
}
