use std::{convert::Infallible, time::Duration};

use alloy_primitives::U256;

use crate::{
    builder::{BuildError, DocumentBuilder},
    chain::{ChainError, ChainSource},
    dedup::AddressDeduplicator,
    store::{BulkSummary, IndexStore, StoreError},
    util::format_time,
};

#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error(transparent)]
    Chain(#[from] ChainError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("block {height} missing below chain head {head}: {source}")]
    MissingBlock {
        height: U256,
        head: U256,
        #[source]
        source: ChainError,
    },
    #[error("building documents for block {height}: {source}")]
    Build {
        height: U256,
        #[source]
        source: BuildError,
    },
    #[error("indexing block {height}: {source}")]
    Write {
        height: U256,
        #[source]
        source: StoreError,
    },
}

/// Result of one catch-up pass.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CatchUp {
    pub start: U256,
    pub head: U256,
    /// Heights processed, including the re-checked latest one.
    pub visited: u64,
    /// Heights whose block document was new.
    pub indexed: u64,
    /// Documents of any kind that did not exist before the pass.
    pub created: usize,
}

/// What a single height wrote to the index.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct HeightReport {
    pub block_created: bool,
    pub transactions: BulkSummary,
    pub addresses: BulkSummary,
}

impl HeightReport {
    /// Number of documents that did not exist before this height was processed.
    pub fn created(&self) -> usize {
        usize::from(self.block_created) + self.transactions.created + self.addresses.created
    }
}

pub struct SyncEngine<C, S> {
    chain: C,
    store: S,
    delay: Duration,
}

impl<C: ChainSource, S: IndexStore> SyncEngine<C, S> {
    pub fn new(chain: C, store: S, delay: Duration) -> SyncEngine<C, S> {
        SyncEngine {
            chain,
            store,
            delay,
        }
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Catch up, idle for the configured delay, repeat. Only returns on a fatal error.
    pub async fn run(&self) -> Result<Infallible, SyncError> {
        loop {
            let catch_up = self.catch_up().await?;
            if catch_up.created > 0 {
                tracing::info!(
                    "Indexed {} new block(s), {} new document(s), chain head is {}.",
                    catch_up.indexed,
                    catch_up.created,
                    catch_up.head
                );
            }
            tokio::time::sleep(self.delay).await;
        }
    }

    /// Indexes every height from the latest indexed one up to, not including, the
    /// chain head read at the start of the pass.
    ///
    /// The latest indexed height is processed again so that a height interrupted
    /// after its block document was written gets completed.
    pub async fn catch_up(&self) -> Result<CatchUp, SyncError> {
        let start = self
            .store
            .latest_indexed_height()
            .await?
            .unwrap_or(U256::ZERO);
        let head = self.chain.latest_height().await?;

        let mut catch_up = CatchUp {
            start,
            head,
            visited: 0,
            indexed: 0,
            created: 0,
        };
        if start > head {
            tracing::debug!("Index at {start} is ahead of chain head {head}, idling.");
            return Ok(catch_up);
        }

        let mut height = start;
        while height < head {
            let report = self.index_height(height, head).await?;
            catch_up.visited += 1;
            catch_up.indexed += u64::from(report.block_created);
            catch_up.created += report.created();
            height += U256::from(1);
        }

        Ok(catch_up)
    }

    /// Writes one height. Nothing past the failing step is written on error.
    pub async fn index_height(&self, height: U256, head: U256) -> Result<HeightReport, SyncError> {
        let block = match self.chain.block_at(height).await {
            Ok(block) => block,
            Err(source @ ChainError::NotFound(_)) => {
                return Err(SyncError::MissingBlock {
                    height,
                    head,
                    source,
                })
            }
            Err(err) => return Err(err.into()),
        };

        let built = DocumentBuilder::new(&self.chain)
            .build(&block)
            .await
            .map_err(|source| SyncError::Build { height, source })?;
        let write_err = |source| SyncError::Write { height, source };

        let mut report = HeightReport::default();
        match self.store.create_block(&built.block).await {
            Ok(()) => report.block_created = true,
            Err(StoreError::Conflict { .. }) => {
                tracing::debug!("Block {height} already indexed.");
            }
            Err(err) => return Err(write_err(err)),
        }

        if !built.transactions.is_empty() {
            report.transactions = self
                .store
                .bulk_create(&built.transactions)
                .await
                .map_err(write_err)?;
        }

        let addresses = AddressDeduplicator::new(&self.store)
            .resolve(&built.references)
            .await
            .map_err(write_err)?;
        if !addresses.is_empty() {
            report.addresses = self
                .store
                .bulk_create(&addresses)
                .await
                .map_err(write_err)?;
        }

        if report.created() == 0 {
            tracing::debug!("Block {height} re-checked, nothing new.");
        } else {
            let time = format_time(block.header.timestamp).unwrap_or_default();
            tracing::info!(
                "Index block height {height} ({time}): {} tx, {} new tx docs, {} new addresses",
                built.transactions.len(),
                report.transactions.created,
                report.addresses.created,
            );
        }

        Ok(report)
    }
}
