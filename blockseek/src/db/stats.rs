use alloy_primitives::U256;
use blockseek_core::{IndexKind, IndexStore, StoreError};

use super::ElasticStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub index_height: Option<U256>,
    pub blocks: u64,
    pub transactions: u64,
    pub addresses: u64,
}

pub async fn index_stats(store: &ElasticStore) -> Result<IndexStats, StoreError> {
    Ok(IndexStats {
        index_height: store.latest_indexed_height().await?,
        blocks: store.count(IndexKind::Block).await?,
        transactions: store.count(IndexKind::Transaction).await?,
        addresses: store.count(IndexKind::Address).await?,
    })
}
