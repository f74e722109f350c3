use alloy_primitives::{Address, B256};
use futures::{stream, StreamExt, TryStreamExt};
use itertools::Itertools;

use crate::{
    chain::{
        ChainBlock, ChainError, ChainHeader, ChainReceipt, ChainSource, ChainTransaction,
        GasPricing,
    },
    dedup::AddressReferences,
    document::{address_id, BlockDocument, LogDocument, TransactionDocument},
    fees::{block_burnt_fees, FeeError, FeeSchedule},
};

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("fetching receipt for {tx_hash}: {source}")]
    Receipt {
        tx_hash: B256,
        #[source]
        source: ChainError,
    },
    #[error("requested receipt for {requested} but node returned {received}")]
    ReceiptMismatch { requested: B256, received: B256 },
    #[error(transparent)]
    Fee(#[from] FeeError),
}

/// Receipt requests kept in flight per block.
pub const MAX_RECEIPT_REQUESTS: usize = 16;

/// Everything one height contributes to the index.
#[derive(Clone, Debug)]
pub struct BuiltBlock {
    pub block: BlockDocument,
    pub transactions: Vec<TransactionDocument>,
    pub references: AddressReferences,
}

pub struct DocumentBuilder<'a, C> {
    chain: &'a C,
}

impl<'a, C: ChainSource> DocumentBuilder<'a, C> {
    pub fn new(chain: &'a C) -> DocumentBuilder<'a, C> {
        DocumentBuilder { chain }
    }

    /// Builds all documents for a block. Any failing transaction fails the whole block.
    pub async fn build(&self, block: &ChainBlock) -> Result<BuiltBlock, BuildError> {
        let requests = block.transactions.iter().map(|tx| self.receipt(tx.hash));
        let receipts = stream::iter(requests)
            .buffered(MAX_RECEIPT_REQUESTS)
            .try_collect::<Vec<_>>()
            .await?;

        let mut references = AddressReferences::default();
        let transactions = block
            .transactions
            .iter()
            .zip(receipts.iter())
            .map(|(tx, receipt)| {
                let doc = transaction_document(&block.header, tx, receipt)?;
                references.record(tx.from, tx.to, created_contract(receipt));
                Ok(doc)
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        Ok(BuiltBlock {
            block: block_document(&block.header, block.transactions.len())?,
            transactions,
            references,
        })
    }

    async fn receipt(&self, tx_hash: B256) -> Result<ChainReceipt, BuildError> {
        let receipt = self
            .chain
            .receipt_for(tx_hash)
            .await
            .map_err(|source| BuildError::Receipt { tx_hash, source })?;
        if receipt.transaction_hash != tx_hash {
            return Err(BuildError::ReceiptMismatch {
                requested: tx_hash,
                received: receipt.transaction_hash,
            });
        }
        Ok(receipt)
    }
}

/// The contract a receipt reports as created, ignoring the zero-address sentinel.
pub fn created_contract(receipt: &ChainReceipt) -> Option<Address> {
    receipt
        .contract_address
        .filter(|address| !address.is_zero())
}

pub fn block_document(header: &ChainHeader, txns: usize) -> Result<BlockDocument, FeeError> {
    Ok(BlockDocument {
        number: header.number,
        block_hash: header.hash,
        parent_hash: header.parent_hash,
        sha3_uncles: header.uncles_hash,
        state_root: header.state_root,
        transactions_root: header.transactions_root,
        receipts_root: header.receipts_root,
        logs_bloom: header.logs_bloom,
        miner: address_id(&header.miner),
        difficulty: header.difficulty,
        gas_limit: header.gas_limit,
        gas_used: header.gas_used,
        timestamp: header.timestamp,
        extra_data: header.extra_data.clone(),
        mix_hash: header.mix_hash,
        nonce: header.nonce,
        base_fee_per_gas: header.base_fee_per_gas,
        txns,
        size: header.size,
        burnt_fees: block_burnt_fees(header)?,
    })
}

pub fn transaction_document(
    header: &ChainHeader,
    tx: &ChainTransaction,
    receipt: &ChainReceipt,
) -> Result<TransactionDocument, FeeError> {
    let fees = FeeSchedule::for_transaction(header, &tx.pricing).fees(receipt.gas_used)?;
    let (gas_price, max_priority_fee_per_gas, max_fee_per_gas) = match tx.pricing {
        GasPricing::Legacy { gas_price } => (Some(gas_price), None, None),
        GasPricing::FeeMarket {
            max_priority_fee_per_gas,
            max_fee_per_gas,
        } => (None, Some(max_priority_fee_per_gas), Some(max_fee_per_gas)),
    };
    let logs = receipt.logs.iter().map(LogDocument::from).collect_vec();

    Ok(TransactionDocument {
        hash: tx.hash,
        tx_type: tx.tx_type,
        nonce: tx.nonce,
        from: address_id(&tx.from),
        to: tx.to.as_ref().map(address_id),
        value: tx.value,
        gas_limit: tx.gas_limit,
        gas_price,
        max_priority_fee_per_gas,
        max_fee_per_gas,
        input: tx.input.clone(),
        v: tx.signature.v,
        r: tx.signature.r,
        s: tx.signature.s,
        chain_id: tx.chain_id,
        access_list: tx.access_list.iter().map(Into::into).collect(),
        number: header.number,
        block_hash: header.hash,
        timestamp: header.timestamp,
        transaction_index: tx.transaction_index,
        base_fee_per_gas: header.base_fee_per_gas,
        receipt_type: receipt.tx_type,
        status: if receipt.status { "1" } else { "0" }.to_string(),
        cumulative_gas_used: receipt.cumulative_gas_used,
        gas_used: receipt.gas_used,
        effective_gas_price: receipt.effective_gas_price,
        logs_bloom: receipt.logs_bloom,
        log_length: logs.len(),
        logs,
        contract_address: created_contract(receipt).as_ref().map(address_id),
        transaction_fee: fees.transaction_fee,
        burnt_fees: fees.burnt_fee,
        tx_savings_fee: fees.savings_fee,
    })
}
