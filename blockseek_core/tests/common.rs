#![allow(unused)]

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::Mutex,
};

use alloy_primitives::{address, Address, Bloom, Bytes, B256, U256};
use async_trait::async_trait;
use blockseek_core::{
    AddressDocument, AddressKind, BlockDocument, BulkSummary, ChainBlock, ChainError, ChainHeader,
    ChainReceipt, ChainSource, ChainTransaction, Document, GasPricing, IndexKind, IndexStore,
    StoreError, TransactionDocument, TxSignature,
};
use serde::de::DeserializeOwned;

pub const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
pub const BOB: Address = address!("0000000000000000000000000000000000000b0b");
pub const CAROL: Address = address!("00000000000000000000000000000000000ca201");
pub const DAVE: Address = address!("000000000000000000000000000000000000da7e");
pub const ERIN: Address = address!("00000000000000000000000000000000000e5175");
pub const TOKEN: Address = address!("00000000000000000000000000000000c0ffee00");

pub fn height(h: u64) -> U256 {
    U256::from(h)
}

#[derive(Default)]
pub struct MemoryChain {
    pub blocks: Vec<ChainBlock>,
    pub receipts: HashMap<B256, ChainReceipt>,
    pub head: Mutex<U256>,
    /// `latest_height` fails while set.
    pub head_unreachable: Mutex<bool>,
    /// `block_at` fails for this height and above.
    pub unreachable_from: Mutex<Option<U256>>,
}

impl MemoryChain {
    pub fn new(blocks: Vec<ChainBlock>, receipts: Vec<ChainReceipt>, head: u64) -> MemoryChain {
        MemoryChain {
            blocks,
            receipts: receipts
                .into_iter()
                .map(|r| (r.transaction_hash, r))
                .collect(),
            head: Mutex::new(height(head)),
            ..Default::default()
        }
    }

    pub fn set_head(&self, head: u64) {
        *self.head.lock().unwrap() = height(head);
    }
}

#[async_trait]
impl ChainSource for MemoryChain {
    async fn latest_height(&self) -> Result<U256, ChainError> {
        if *self.head_unreachable.lock().unwrap() {
            return Err(ChainError::Unreachable("connection refused".into()));
        }
        Ok(*self.head.lock().unwrap())
    }

    async fn block_at(&self, height: U256) -> Result<ChainBlock, ChainError> {
        if matches!(*self.unreachable_from.lock().unwrap(), Some(from) if height >= from) {
            return Err(ChainError::Unreachable(format!("block {height}: timed out")));
        }
        self.blocks
            .iter()
            .find(|b| b.header.number == height)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("block {height}")))
    }

    async fn receipt_for(&self, tx_hash: B256) -> Result<ChainReceipt, ChainError> {
        self.receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| ChainError::NotFound(format!("receipt {tx_hash}")))
    }
}

/// A write that fails: any write to `index` that includes the document `id`.
pub struct WriteFailure {
    pub index: IndexKind,
    pub id: String,
    pub error: fn() -> StoreError,
}

/// Create-only document store keyed by index and ID.
#[derive(Default)]
pub struct MemoryStore {
    pub docs: Mutex<BTreeMap<(IndexKind, String), serde_json::Value>>,
    pub created: Mutex<usize>,
    pub conflicts: Mutex<usize>,
    pub lookups: Mutex<usize>,
    pub fail_on: Mutex<Option<WriteFailure>>,
}

impl MemoryStore {
    pub fn fail_on(&self, index: IndexKind, id: String, error: fn() -> StoreError) {
        *self.fail_on.lock().unwrap() = Some(WriteFailure { index, id, error });
    }

    /// Nothing of the batch is written when it fails.
    fn check_write<'a>(
        &self,
        index: IndexKind,
        mut ids: impl Iterator<Item = &'a String>,
    ) -> Result<(), StoreError> {
        match &*self.fail_on.lock().unwrap() {
            Some(failure) if failure.index == index && ids.any(|id| *id == failure.id) => {
                Err((failure.error)())
            }
            _ => Ok(()),
        }
    }

    pub fn insert<D: Document>(&self, doc: &D) {
        self.docs.lock().unwrap().insert(
            (D::KIND, doc.id()),
            serde_json::to_value(doc).unwrap(),
        );
    }

    pub fn ids(&self, index: IndexKind) -> Vec<String> {
        self.docs
            .lock()
            .unwrap()
            .keys()
            .filter(|(kind, _)| *kind == index)
            .map(|(_, id)| id.clone())
            .collect()
    }

    pub fn get<D: DeserializeOwned>(&self, index: IndexKind, id: &str) -> Option<D> {
        self.docs
            .lock()
            .unwrap()
            .get(&(index, id.to_string()))
            .map(|v| serde_json::from_value(v.clone()).unwrap())
    }

    pub fn created(&self) -> usize {
        *self.created.lock().unwrap()
    }

    pub fn conflicts(&self) -> usize {
        *self.conflicts.lock().unwrap()
    }

    fn create(&self, index: IndexKind, id: String, value: serde_json::Value) -> bool {
        let mut docs = self.docs.lock().unwrap();
        if docs.contains_key(&(index, id.clone())) {
            *self.conflicts.lock().unwrap() += 1;
            return false;
        }
        docs.insert((index, id), value);
        *self.created.lock().unwrap() += 1;
        true
    }
}

#[async_trait]
impl IndexStore for MemoryStore {
    async fn latest_indexed_height(&self) -> Result<Option<U256>, StoreError> {
        Ok(self
            .docs
            .lock()
            .unwrap()
            .iter()
            .filter(|((kind, _), _)| *kind == IndexKind::Block)
            .map(|(_, v)| v["number"].as_str().unwrap().parse::<U256>().unwrap())
            .max())
    }

    async fn create_block(&self, doc: &BlockDocument) -> Result<(), StoreError> {
        self.check_write(IndexKind::Block, [doc.id()].iter())?;
        if self.create(IndexKind::Block, doc.id(), serde_json::to_value(doc).unwrap()) {
            Ok(())
        } else {
            Err(StoreError::Conflict {
                index: IndexKind::Block,
                id: doc.id(),
            })
        }
    }

    async fn bulk_create<D: Document>(&self, docs: &[D]) -> Result<BulkSummary, StoreError> {
        let ids = docs.iter().map(|doc| doc.id()).collect::<Vec<_>>();
        self.check_write(D::KIND, ids.iter())?;
        let mut summary = BulkSummary::default();
        for doc in docs {
            if self.create(D::KIND, doc.id(), serde_json::to_value(doc).unwrap()) {
                summary.created += 1;
            } else {
                summary.conflicts += 1;
            }
        }
        Ok(summary)
    }

    async fn find_existing_ids(
        &self,
        index: IndexKind,
        ids: &[String],
    ) -> Result<HashSet<String>, StoreError> {
        *self.lookups.lock().unwrap() += 1;
        let docs = self.docs.lock().unwrap();
        Ok(ids
            .iter()
            .filter(|id| docs.contains_key(&(index, (*id).clone())))
            .cloned()
            .collect())
    }
}

pub fn header(number: u64, base_fee: Option<u64>) -> ChainHeader {
    ChainHeader {
        number: height(number),
        hash: B256::with_last_byte(number as u8 + 0x80),
        parent_hash: B256::with_last_byte(number.saturating_sub(1) as u8 + 0x80),
        miner: address!("00000000000000000000000000000000000000ff"),
        gas_limit: height(30_000_000),
        gas_used: height(50),
        timestamp: 1_438_269_973 + number * 12,
        base_fee_per_gas: base_fee.map(U256::from),
        size: Some(height(540)),
        ..Default::default()
    }
}

pub fn legacy_tx(hash: u8, from: Address, to: Option<Address>, gas_price: u64) -> ChainTransaction {
    ChainTransaction {
        hash: B256::repeat_byte(hash),
        tx_type: 0,
        nonce: U256::ZERO,
        from,
        to,
        value: height(1_000),
        input: Bytes::new(),
        gas_limit: height(21_000),
        pricing: GasPricing::Legacy {
            gas_price: height(gas_price),
        },
        signature: TxSignature {
            v: height(37),
            r: height(1),
            s: height(2),
        },
        chain_id: Some(height(1)),
        access_list: vec![],
        transaction_index: Some(0),
    }
}

pub fn dynamic_tx(
    hash: u8,
    from: Address,
    to: Option<Address>,
    tip_cap: u64,
    fee_cap: u64,
) -> ChainTransaction {
    ChainTransaction {
        tx_type: 2,
        gas_limit: height(50),
        pricing: GasPricing::FeeMarket {
            max_priority_fee_per_gas: height(tip_cap),
            max_fee_per_gas: height(fee_cap),
        },
        signature: TxSignature {
            v: height(1),
            r: height(3),
            s: height(4),
        },
        ..legacy_tx(hash, from, to, 0)
    }
}

pub fn receipt(hash: u8, gas_used: u64, contract: Option<Address>) -> ChainReceipt {
    ChainReceipt {
        transaction_hash: B256::repeat_byte(hash),
        tx_type: 0,
        status: true,
        cumulative_gas_used: height(gas_used),
        gas_used: height(gas_used),
        effective_gas_price: None,
        contract_address: contract,
        logs_bloom: Bloom::ZERO,
        logs: vec![],
    }
}

/// Four blocks; the head is 3 so block 3 stays unindexed.
///
/// - 0: genesis, empty
/// - 1: legacy; ALICE -> BOB, ALICE creates TOKEN
/// - 2: fee market (base fee 100); BOB -> TOKEN, CAROL -> ALICE, CAROL's failed creation
/// - 3: DAVE -> ERIN
pub fn fixture() -> MemoryChain {
    let blocks = vec![
        ChainBlock {
            header: header(0, None),
            transactions: vec![],
        },
        ChainBlock {
            header: header(1, None),
            transactions: vec![
                legacy_tx(0x11, ALICE, Some(BOB), 20),
                legacy_tx(0x12, ALICE, None, 20),
            ],
        },
        ChainBlock {
            header: header(2, Some(100)),
            transactions: vec![
                dynamic_tx(0x21, BOB, Some(TOKEN), 2, 150),
                dynamic_tx(0x22, CAROL, Some(ALICE), 10, 200),
                dynamic_tx(0x23, CAROL, None, 1, 120),
            ],
        },
        ChainBlock {
            header: header(3, Some(90)),
            transactions: vec![dynamic_tx(0x31, DAVE, Some(ERIN), 1, 100)],
        },
    ];
    let receipts = vec![
        receipt(0x11, 21_000, None),
        receipt(0x12, 40_000, Some(TOKEN)),
        receipt(0x21, 30_000, None),
        receipt(0x22, 50, None),
        receipt(0x23, 60_000, Some(Address::ZERO)),
        receipt(0x31, 21_000, None),
    ];
    MemoryChain::new(blocks, receipts, 3)
}

pub fn tx_hash(hash: u8) -> String {
    B256::repeat_byte(hash).to_string()
}

pub fn address_doc(store: &MemoryStore, address: &Address) -> Option<AddressDocument> {
    store.get(IndexKind::Address, &blockseek_core::address_id(address))
}

pub fn tx_doc(store: &MemoryStore, hash: u8) -> Option<TransactionDocument> {
    store.get(IndexKind::Transaction, &tx_hash(hash))
}
