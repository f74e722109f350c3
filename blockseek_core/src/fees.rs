use alloy_primitives::U256;

use crate::chain::{ChainHeader, GasPricing};

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
#[error("fee arithmetic overflowed computing {0}")]
pub struct FeeError(&'static str);

/// Fee rules a transaction was charged under. New rule sets get a new variant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FeeSchedule {
    Legacy {
        gas_price: U256,
    },
    /// EIP-1559 fee market.
    FeeMarket {
        base_fee: U256,
        gas_tip_cap: U256,
        gas_fee_cap: U256,
    },
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Fees {
    pub transaction_fee: U256,
    pub burnt_fee: Option<U256>,
    pub savings_fee: Option<U256>,
}

impl FeeSchedule {
    /// Picks the schedule from the block header; legacy-priced transactions in a
    /// fee-market block use their gas price for both caps.
    pub fn for_transaction(header: &ChainHeader, pricing: &GasPricing) -> FeeSchedule {
        match (header.base_fee_per_gas, *pricing) {
            (None, GasPricing::Legacy { gas_price }) => FeeSchedule::Legacy { gas_price },
            (None, GasPricing::FeeMarket { max_fee_per_gas, .. }) => FeeSchedule::Legacy {
                gas_price: max_fee_per_gas,
            },
            (Some(base_fee), GasPricing::Legacy { gas_price }) => FeeSchedule::FeeMarket {
                base_fee,
                gas_tip_cap: gas_price,
                gas_fee_cap: gas_price,
            },
            (
                Some(base_fee),
                GasPricing::FeeMarket {
                    max_priority_fee_per_gas,
                    max_fee_per_gas,
                },
            ) => FeeSchedule::FeeMarket {
                base_fee,
                gas_tip_cap: max_priority_fee_per_gas,
                gas_fee_cap: max_fee_per_gas,
            },
        }
    }

    pub fn fees(&self, gas_used: U256) -> Result<Fees, FeeError> {
        match *self {
            FeeSchedule::Legacy { gas_price } => Ok(Fees {
                transaction_fee: mul(gas_price, gas_used, "transaction fee")?,
                burnt_fee: None,
                savings_fee: None,
            }),
            FeeSchedule::FeeMarket {
                base_fee,
                gas_tip_cap,
                gas_fee_cap,
            } => {
                let per_gas = base_fee
                    .checked_add(gas_tip_cap)
                    .ok_or(FeeError("transaction fee"))?;
                // Negative savings are clamped to zero.
                let savings_per_gas = gas_fee_cap
                    .saturating_sub(gas_tip_cap)
                    .saturating_sub(base_fee);
                Ok(Fees {
                    transaction_fee: mul(per_gas, gas_used, "transaction fee")?,
                    burnt_fee: Some(mul(base_fee, gas_used, "burnt fee")?),
                    savings_fee: Some(mul(savings_per_gas, gas_used, "savings fee")?),
                })
            }
        }
    }
}

fn mul(a: U256, b: U256, what: &'static str) -> Result<U256, FeeError> {
    a.checked_mul(b).ok_or(FeeError(what))
}

/// Fees burnt by a whole block; `None` before the fee market.
pub fn block_burnt_fees(header: &ChainHeader) -> Result<Option<U256>, FeeError> {
    header
        .base_fee_per_gas
        .map(|base_fee| mul(base_fee, header.gas_used, "block burnt fees"))
        .transpose()
}
