use std::{fmt::Display, future::IntoFuture, time::Duration};

use alloy_consensus::Transaction as _;
use alloy_eips::{BlockNumberOrTag, Typed2718 as _};
use alloy_primitives::{B256, U256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types_eth::{Block, BlockTransactions, Log, Transaction, TransactionReceipt};
use async_trait::async_trait;
use blockseek_core::{
    AccessEntry, ChainBlock, ChainError, ChainHeader, ChainLog, ChainReceipt, ChainSource,
    ChainTransaction, GasPricing, TxSignature,
};
use url::Url;

/// [`ChainSource`] backed by a node's JSON-RPC API over HTTP.
#[derive(Clone)]
pub struct RpcChainSource {
    provider: RootProvider,
    timeout: Duration,
}

impl RpcChainSource {
    pub fn new(url: Url, timeout: Duration) -> RpcChainSource {
        RpcChainSource {
            provider: RootProvider::new_http(url),
            timeout,
        }
    }

    async fn call<T, E, F>(&self, method: &str, request: F) -> Result<T, ChainError>
    where
        E: Display,
        F: IntoFuture<Output = Result<T, E>>,
    {
        tracing::debug!("RPC {method}");
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(err)) => Err(ChainError::Unreachable(format!("{method}: {err}"))),
            Err(_) => Err(ChainError::Unreachable(format!(
                "{method}: no response within {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[async_trait]
impl ChainSource for RpcChainSource {
    async fn latest_height(&self) -> Result<U256, ChainError> {
        let number = self
            .call("eth_blockNumber", self.provider.get_block_number())
            .await?;
        Ok(U256::from(number))
    }

    async fn block_at(&self, height: U256) -> Result<ChainBlock, ChainError> {
        let number = block_number(height)?;
        let block = self
            .call(
                "eth_getBlockByNumber",
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(number))
                    .full(),
            )
            .await?
            .ok_or_else(|| ChainError::NotFound(format!("block {height}")))?;
        convert_block(block)
    }

    async fn receipt_for(&self, tx_hash: B256) -> Result<ChainReceipt, ChainError> {
        let receipt = self
            .call(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(tx_hash),
            )
            .await?
            .ok_or_else(|| ChainError::NotFound(format!("receipt for {tx_hash}")))?;
        Ok(convert_receipt(receipt))
    }
}

/// Heights past the node's 64-bit block numbers cannot exist on that chain.
fn block_number(height: U256) -> Result<u64, ChainError> {
    u64::try_from(height).map_err(|_| ChainError::NotFound(format!("block {height}")))
}

/// `v` as the node's legacy API reports it.
fn signature_v(tx_type: u8, y_parity: bool, chain_id: Option<u64>) -> U256 {
    let parity = U256::from(u8::from(y_parity));
    match (tx_type, chain_id) {
        (0, Some(chain_id)) => U256::from(chain_id) * U256::from(2) + U256::from(35) + parity,
        (0, None) => U256::from(27) + parity,
        _ => parity,
    }
}

fn convert_block(block: Block) -> Result<ChainBlock, ChainError> {
    let header = ChainHeader {
        number: U256::from(block.header.number),
        hash: block.header.hash,
        parent_hash: block.header.parent_hash,
        uncles_hash: block.header.ommers_hash,
        state_root: block.header.state_root,
        transactions_root: block.header.transactions_root,
        receipts_root: block.header.receipts_root,
        logs_bloom: block.header.logs_bloom,
        miner: block.header.beneficiary,
        difficulty: block.header.difficulty,
        gas_limit: U256::from(block.header.gas_limit),
        gas_used: U256::from(block.header.gas_used),
        timestamp: block.header.timestamp,
        extra_data: block.header.extra_data.clone(),
        mix_hash: Some(block.header.mix_hash),
        nonce: Some(block.header.nonce),
        base_fee_per_gas: block.header.base_fee_per_gas.map(U256::from),
        size: block.header.size,
    };

    let transactions = match block.transactions {
        BlockTransactions::Full(txs) => txs.iter().map(convert_transaction).collect(),
        BlockTransactions::Hashes(hashes) if hashes.is_empty() => vec![],
        BlockTransactions::Uncle => vec![],
        BlockTransactions::Hashes(_) => {
            return Err(ChainError::Unreachable(format!(
                "block {} returned without transaction bodies",
                header.number
            )))
        }
    };

    Ok(ChainBlock {
        header,
        transactions,
    })
}

fn convert_transaction(tx: &Transaction) -> ChainTransaction {
    let pricing = match tx.max_priority_fee_per_gas() {
        Some(tip) => GasPricing::FeeMarket {
            max_priority_fee_per_gas: U256::from(tip),
            max_fee_per_gas: U256::from(tx.max_fee_per_gas()),
        },
        None => GasPricing::Legacy {
            gas_price: U256::from(tx.gas_price().unwrap_or_else(|| tx.max_fee_per_gas())),
        },
    };
    let signature = tx.inner.signature();

    ChainTransaction {
        hash: *tx.inner.tx_hash(),
        tx_type: tx.ty(),
        nonce: U256::from(tx.nonce()),
        from: tx.inner.signer(),
        to: tx.to(),
        value: tx.value(),
        input: tx.input().clone(),
        gas_limit: U256::from(tx.gas_limit()),
        pricing,
        signature: TxSignature {
            v: signature_v(tx.ty(), signature.v(), tx.chain_id()),
            r: signature.r(),
            s: signature.s(),
        },
        chain_id: tx.chain_id().map(U256::from),
        access_list: tx
            .access_list()
            .map(|list| {
                list.0
                    .iter()
                    .map(|item| AccessEntry {
                        address: item.address,
                        storage_keys: item.storage_keys.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default(),
        transaction_index: tx.transaction_index,
    }
}

fn convert_log(log: &Log) -> ChainLog {
    ChainLog {
        address: log.address(),
        topics: log.topics().to_vec(),
        data: log.data().data.clone(),
        log_index: log.log_index,
    }
}

fn convert_receipt(receipt: TransactionReceipt) -> ChainReceipt {
    ChainReceipt {
        transaction_hash: receipt.transaction_hash,
        tx_type: receipt.inner.tx_type() as u8,
        status: receipt.inner.status(),
        cumulative_gas_used: U256::from(receipt.inner.cumulative_gas_used()),
        gas_used: U256::from(receipt.gas_used),
        effective_gas_price: Some(U256::from(receipt.effective_gas_price)),
        contract_address: receipt.contract_address,
        logs_bloom: *receipt.inner.logs_bloom(),
        logs: receipt.inner.logs().iter().map(convert_log).collect(),
    }
}
