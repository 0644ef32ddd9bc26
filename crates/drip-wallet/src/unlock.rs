//! Unlock spends: moving a matured locked output to a destination address.
//!
//! The spending transaction sets `lock_time` to the output's unlock height
//! and a non-final sequence on its single input, which is what lets
//! OP_CHECKLOCKTIMEVERIFY pass once the chain reaches that height.
//! Construction is pure: no height check, no broadcast, no record
//! mutation. Callers who want to pre-check maturity use
//! [`LockedOutput::is_unlockable`].

use tracing::info;

use drip_core::address::Address;
use drip_core::constants::{P2PKH_INPUT_SIZE, P2PKH_OUTPUT_SIZE, SEQUENCE_ENABLE_LOCKTIME, TX_OVERHEAD_SIZE, TX_VERSION};
use drip_core::crypto::{sign_input, KeyPair};
use drip_core::script;
use drip_core::types::{OutPoint, Transaction, TxInput, TxOutput, Txid};

use crate::error::WalletError;
use crate::funding::FundingSelector;
use crate::records::LockedOutput;

/// Caller-supplied reference to one locked output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlockReference {
    /// Display-form txid of the lock transaction.
    pub txid: String,
    /// Output index within the lock transaction.
    pub vout: u32,
}

/// A signed unlock transaction.
#[derive(Debug, Clone)]
pub struct BuiltUnlockTransaction {
    /// The signed transaction.
    pub tx: Transaction,
    /// Its transaction ID.
    pub txid: Txid,
    /// Hex serialization ready for a broadcaster.
    pub raw: String,
    /// Fee deducted from the locked value.
    pub fee: u64,
}

/// Builds unlock spends of matured lock outputs.
#[derive(Debug, Clone, Default)]
pub struct UnlockBuilder {
    selector: FundingSelector,
}

impl UnlockBuilder {
    pub fn new() -> Self {
        Self {
            selector: FundingSelector::new(),
        }
    }

    /// Use a custom fee rate via a configured selector.
    pub fn with_selector(selector: FundingSelector) -> Self {
        Self { selector }
    }

    /// Build and sign a transaction spending one locked output to
    /// `destination`.
    ///
    /// `keypair` must be the recipient key whose hash the lock script
    /// commits to. The fee comes out of the locked value; the reference
    /// must parse and match `locked`, otherwise
    /// [`WalletError::InvalidReference`].
    pub fn build(
        &self,
        reference: &UnlockReference,
        locked: &LockedOutput,
        destination: &Address,
        keypair: &KeyPair,
    ) -> Result<BuiltUnlockTransaction, WalletError> {
        let txid: Txid = reference
            .txid
            .parse()
            .map_err(|e| WalletError::InvalidReference(format!("{e}")))?;
        if reference.vout != locked.vout {
            return Err(WalletError::InvalidReference(format!(
                "vout {} does not match locked output {}",
                reference.vout, locked.vout
            )));
        }

        // One lock-template input, one P2PKH output.
        let size = TX_OVERHEAD_SIZE + P2PKH_INPUT_SIZE + P2PKH_OUTPUT_SIZE;
        let fee = self.selector.fee_for_size(size);
        let Some(send_value) = locked.value.checked_sub(fee).filter(|v| *v > 0) else {
            return Err(WalletError::InsufficientFunds {
                have: locked.value,
                need: fee + 1,
            });
        };

        let mut tx = Transaction {
            version: TX_VERSION,
            inputs: vec![TxInput {
                previous_output: OutPoint {
                    txid,
                    vout: reference.vout,
                },
                script_sig: vec![],
                sequence: SEQUENCE_ENABLE_LOCKTIME,
            }],
            outputs: vec![TxOutput {
                value: send_value,
                script_pubkey: destination.script_pubkey(),
            }],
            lock_time: locked.unlock_height,
        };

        // The spent script commits to this key's hash and the unlock height.
        let prev_script = script::lock_script(&keypair.pubkey_hash(), locked.unlock_height);
        sign_input(&mut tx, 0, &prev_script, keypair)?;

        let unlock_txid = tx.txid();
        info!(txid = %unlock_txid, unlock_height = locked.unlock_height, "unlock spend assembled");
        Ok(BuiltUnlockTransaction {
            raw: tx.to_hex(),
            txid: unlock_txid,
            fee,
            tx,
        })
    }
}
