//! Funding selection: which coins pay for a lock transaction, and at what fee.
//!
//! The fee is proportional to the serialized size at a configurable rate,
//! carried in milli-satoshis per byte so fractional per-byte rates stay in
//! integer arithmetic: `fee = ceil(size * rate / 1000) + 1`. The size
//! estimate counts the fixed transaction framing, the lock outputs, a
//! change output, and one standard P2PKH input per selected coin, and is
//! recomputed every time a coin is added.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use drip_core::address::Address;
use drip_core::constants::{P2PKH_INPUT_SIZE, P2PKH_OUTPUT_SIZE, TX_OVERHEAD_SIZE};
use drip_core::types::{TxOutput, Utxo};

use crate::error::WalletError;
use crate::traits::UtxoProvider;

/// Default fee rate: 50 milli-satoshis per byte (0.05 sat/byte).
pub const DEFAULT_FEE_RATE_MSAT_PER_BYTE: u64 = 50;

/// Result of funding selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Funding {
    /// Coins to spend, in provider order.
    pub inputs: Vec<Utxo>,
    /// Total value of the selected coins.
    pub total_input: u64,
    /// Fee in satoshis at the final input count.
    pub fee: u64,
    /// Satoshis returned to the payer. Zero means no change output.
    pub change: u64,
}

/// Size-proportional greedy funding selector.
///
/// Queries the provider once for the output total plus a one-input fee,
/// then adds the returned coins in order, recomputing the fee per added
/// input, until outputs plus fee are covered.
#[derive(Debug, Clone)]
pub struct FundingSelector {
    fee_rate_msat: u64,
}

impl FundingSelector {
    pub fn new() -> Self {
        Self {
            fee_rate_msat: DEFAULT_FEE_RATE_MSAT_PER_BYTE,
        }
    }

    /// Use a custom fee rate in milli-satoshis per byte.
    pub fn with_fee_rate(fee_rate_msat: u64) -> Self {
        Self { fee_rate_msat }
    }

    /// Fee for a transaction of `size` bytes: ceiling of size times rate,
    /// plus one satoshi.
    pub fn fee_for_size(&self, size: usize) -> u64 {
        (size as u64 * self.fee_rate_msat).div_ceil(1000) + 1
    }

    /// Select coins from `payer` to fund `outputs`.
    ///
    /// Deterministic for identical provider responses. Fails with
    /// [`WalletError::InsufficientFunds`] when the provider's coins cannot
    /// cover the outputs plus the fee at the final input count.
    pub async fn select<P: UtxoProvider + ?Sized>(
        &self,
        outputs: &[TxOutput],
        payer: &Address,
        provider: &P,
    ) -> Result<Funding, WalletError> {
        let output_total = outputs
            .iter()
            .try_fold(0u64, |acc, o| acc.checked_add(o.value))
            .ok_or(WalletError::ValueOverflow)?;

        // Inputs are the only size component that varies during selection.
        let base_size = TX_OVERHEAD_SIZE
            + outputs.iter().map(TxOutput::serialized_size).sum::<usize>()
            + P2PKH_OUTPUT_SIZE;

        let initial_fee = self.fee_for_size(base_size + P2PKH_INPUT_SIZE);
        let candidates = provider
            .list_spendable(payer, output_total.saturating_add(initial_fee))
            .await?;

        let mut inputs: Vec<Utxo> = Vec::new();
        let mut total_input: u64 = 0;

        for utxo in candidates {
            total_input = total_input.saturating_add(utxo.value);
            inputs.push(utxo);

            let fee = self.fee_for_size(base_size + inputs.len() * P2PKH_INPUT_SIZE);
            let needed = output_total.saturating_add(fee);
            if total_input >= needed {
                let change = total_input - needed;
                debug!(
                    inputs = inputs.len(),
                    fee, change, "funding selection complete"
                );
                return Ok(Funding {
                    inputs,
                    total_input,
                    fee,
                    change,
                });
            }
        }

        let fee = self.fee_for_size(base_size + inputs.len().max(1) * P2PKH_INPUT_SIZE);
        Err(WalletError::InsufficientFunds {
            have: total_input,
            need: output_total.saturating_add(fee),
        })
    }
}

impl Default for FundingSelector {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-address funding serialization.
///
/// Holding the guard returned by [`AddressLocks::acquire`] across a funding
/// attempt guarantees at most one in-flight build per payer address, so two
/// concurrent builds cannot select the same coins.
#[derive(Default)]
pub struct AddressLocks {
    inner: parking_lot::Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl AddressLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the funding lock for one address.
    pub async fn acquire(&self, address: &Address) -> OwnedMutexGuard<()> {
        let mutex = {
            let mut map = self.inner.lock();
            map.entry(address.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        mutex.lock_owned().await
    }
}
