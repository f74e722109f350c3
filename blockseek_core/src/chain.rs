use alloy_primitives::{Address, Bloom, Bytes, B256, B64, U256};
use async_trait::async_trait;

#[derive(thiserror::Error, Debug)]
pub enum ChainError {
    #[error("chain source unreachable: {0}")]
    Unreachable(String),
    #[error("not found on chain: {0}")]
    NotFound(String),
}

/// Read-only view of a chain node.
#[async_trait]
pub trait ChainSource: Send + Sync {
    async fn latest_height(&self) -> Result<U256, ChainError>;
    async fn block_at(&self, height: U256) -> Result<ChainBlock, ChainError>;
    async fn receipt_for(&self, tx_hash: B256) -> Result<ChainReceipt, ChainError>;
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainBlock {
    pub header: ChainHeader,
    pub transactions: Vec<ChainTransaction>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChainHeader {
    pub number: U256,
    pub hash: B256,
    pub parent_hash: B256,
    pub uncles_hash: B256,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub miner: Address,
    pub difficulty: U256,
    pub gas_limit: U256,
    pub gas_used: U256,
    pub timestamp: u64,
    pub extra_data: Bytes,
    pub mix_hash: Option<B256>,
    pub nonce: Option<B64>,
    /// Present only on fee-market blocks.
    pub base_fee_per_gas: Option<U256>,
    pub size: Option<U256>,
}

impl ChainHeader {
    pub fn is_fee_market(&self) -> bool {
        self.base_fee_per_gas.is_some()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GasPricing {
    Legacy {
        gas_price: U256,
    },
    FeeMarket {
        max_priority_fee_per_gas: U256,
        max_fee_per_gas: U256,
    },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct TxSignature {
    pub v: U256,
    pub r: U256,
    pub s: U256,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessEntry {
    pub address: Address,
    pub storage_keys: Vec<B256>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainTransaction {
    pub hash: B256,
    pub tx_type: u8,
    pub nonce: U256,
    pub from: Address,
    /// `None` for contract creation.
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    pub gas_limit: U256,
    pub pricing: GasPricing,
    pub signature: TxSignature,
    pub chain_id: Option<U256>,
    pub access_list: Vec<AccessEntry>,
    pub transaction_index: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    pub log_index: Option<u64>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChainReceipt {
    pub transaction_hash: B256,
    pub tx_type: u8,
    pub status: bool,
    pub cumulative_gas_used: U256,
    pub gas_used: U256,
    pub effective_gas_price: Option<U256>,
    pub contract_address: Option<Address>,
    pub logs_bloom: Bloom,
    pub logs: Vec<ChainLog>,
}
