use alloy_primitives::{Address, Bloom, Bytes, B256, B64, U256};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};

use crate::chain::{AccessEntry, ChainLog};

/// The three indices the core writes to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum IndexKind {
    #[display(fmt = "block")]
    Block,
    #[display(fmt = "tx")]
    Transaction,
    #[display(fmt = "address")]
    Address,
}

pub trait Document: Serialize + DeserializeOwned + Send + Sync {
    const KIND: IndexKind;

    fn id(&self) -> String;
}

/// Canonical string form of an address, used for IDs and address fields alike.
pub fn address_id(address: &Address) -> String {
    address.to_checksum(None)
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockDocument {
    #[serde_as(as = "DisplayFromStr")]
    pub number: U256,
    pub block_hash: B256,
    pub parent_hash: B256,
    pub sha3_uncles: B256,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub miner: String,
    #[serde_as(as = "DisplayFromStr")]
    pub difficulty: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_used: U256,
    pub timestamp: u64,
    pub extra_data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mix_hash: Option<B256>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nonce: Option<B64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,
    pub txns: usize,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burnt_fees: Option<U256>,
}

impl Document for BlockDocument {
    const KIND: IndexKind = IndexKind::Block;

    fn id(&self) -> String {
        self.number.to_string()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessListDocument {
    pub address: String,
    pub storage_keys: Vec<B256>,
}

impl From<&AccessEntry> for AccessListDocument {
    fn from(entry: &AccessEntry) -> Self {
        AccessListDocument {
            address: address_id(&entry.address),
            storage_keys: entry.storage_keys.clone(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogDocument {
    pub address: String,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
}

impl From<&ChainLog> for LogDocument {
    fn from(log: &ChainLog) -> Self {
        LogDocument {
            address: address_id(&log.address),
            topics: log.topics.clone(),
            data: log.data.clone(),
            log_index: log.log_index,
        }
    }
}

#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionDocument {
    pub hash: B256,
    #[serde(rename = "type")]
    pub tx_type: u8,
    #[serde_as(as = "DisplayFromStr")]
    pub nonce: U256,
    pub from: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde_as(as = "DisplayFromStr")]
    pub value: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_limit: U256,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gas_price: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_priority_fee_per_gas: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_fee_per_gas: Option<U256>,
    pub input: Bytes,
    #[serde_as(as = "DisplayFromStr")]
    pub v: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub r: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub s: U256,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain_id: Option<U256>,
    #[serde(default)]
    pub access_list: Vec<AccessListDocument>,

    // Inclusion
    #[serde_as(as = "DisplayFromStr")]
    pub number: U256,
    pub block_hash: B256,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_index: Option<u64>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_fee_per_gas: Option<U256>,

    // Receipt
    pub receipt_type: u8,
    pub status: String,
    #[serde_as(as = "DisplayFromStr")]
    pub cumulative_gas_used: U256,
    #[serde_as(as = "DisplayFromStr")]
    pub gas_used: U256,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_gas_price: Option<U256>,
    pub logs_bloom: Bloom,
    pub logs: Vec<LogDocument>,
    pub log_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contract_address: Option<String>,

    // Fees
    #[serde_as(as = "DisplayFromStr")]
    pub transaction_fee: U256,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub burnt_fees: Option<U256>,
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_savings_fee: Option<U256>,
}

impl Document for TransactionDocument {
    const KIND: IndexKind = IndexKind::Transaction;

    fn id(&self) -> String {
        self.hash.to_string()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum AddressKind {
    ExternallyOwned,
    Contract,
}

impl From<AddressKind> for u8 {
    fn from(value: AddressKind) -> Self {
        match value {
            AddressKind::ExternallyOwned => 1,
            AddressKind::Contract => 2,
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("unknown address kind {0}")]
pub struct UnknownAddressKind(u8);

impl TryFrom<u8> for AddressKind {
    type Error = UnknownAddressKind;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AddressKind::ExternallyOwned),
            2 => Ok(AddressKind::Contract),
            _ => Err(UnknownAddressKind(value)),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressDocument {
    pub address: String,
    #[serde(rename = "type")]
    pub kind: AddressKind,
}

impl AddressDocument {
    pub fn new(address: &Address, kind: AddressKind) -> AddressDocument {
        AddressDocument {
            address: address_id(address),
            kind,
        }
    }
}

impl Document for AddressDocument {
    const KIND: IndexKind = IndexKind::Address;

    fn id(&self) -> String {
        self.address.clone()
    }
}
