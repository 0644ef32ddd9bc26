//! Lock stream assembly: schedule in, signed raw transaction out.
//!
//! One output per lock point, paying the recipient's pubkey hash through
//! the CLTV lock template; funding inputs from the payer; change back to
//! the payer when positive; every input signed SIGHASH_ALL. The builder
//! never broadcasts and never persists; it hands back the raw hex and a
//! [`LockRecord`] for the caller's collaborators.

use tracing::{debug, info};

use drip_core::address::Address;
use drip_core::constants::{SEQUENCE_FINAL, TX_VERSION};
use drip_core::crypto::{hash160, signature_hash, SIGHASH_ALL};
use drip_core::error::CryptoError;
use drip_core::script;
use drip_core::types::{Transaction, TxInput, TxOutput, Txid};

use crate::error::WalletError;
use crate::funding::{Funding, FundingSelector};
use crate::records::{LockRecord, LockedOutput};
use crate::schedule::LockSchedule;
use crate::traits::{Signer, UtxoProvider};

/// A fully signed lock transaction and its bookkeeping.
#[derive(Debug, Clone)]
pub struct BuiltLockTransaction {
    /// The signed transaction.
    pub tx: Transaction,
    /// Its transaction ID.
    pub txid: Txid,
    /// Hex serialization ready for a broadcaster.
    pub raw: String,
    /// Funding breakdown: inputs, fee, change.
    pub funding: Funding,
    /// Record of the locked outputs for the persistence collaborator.
    pub record: LockRecord,
}

/// Assembles signed lock stream transactions.
#[derive(Debug, Clone, Default)]
pub struct LockStreamBuilder {
    selector: FundingSelector,
}

impl LockStreamBuilder {
    pub fn new() -> Self {
        Self {
            selector: FundingSelector::new(),
        }
    }

    /// Use a custom funding selector (e.g. a different fee rate).
    pub fn with_selector(selector: FundingSelector) -> Self {
        Self { selector }
    }

    /// Build and sign a lock stream transaction.
    ///
    /// `signer` must hold the key for `payer`, the address whose coins
    /// fund the stream. Fails without side effects; nothing is broadcast
    /// or stored.
    pub async fn build<P, S>(
        &self,
        schedule: &LockSchedule,
        recipient: &Address,
        payer: &Address,
        signer: &S,
        provider: &P,
    ) -> Result<BuiltLockTransaction, WalletError>
    where
        P: UtxoProvider + ?Sized,
        S: Signer + ?Sized,
    {
        if schedule.is_empty() {
            return Err(WalletError::NoLocks);
        }
        if hash160(&signer.public_key()) != payer.pubkey_hash() {
            return Err(WalletError::Signing(CryptoError::PubkeyHashMismatch));
        }

        // One CLTV output per lock point, in schedule order.
        let recipient_pkh = recipient.pubkey_hash();
        let mut outputs: Vec<TxOutput> = schedule
            .points()
            .iter()
            .map(|point| TxOutput {
                value: point.value,
                script_pubkey: script::lock_script(&recipient_pkh, point.unlock_height),
            })
            .collect();

        let funding = self.selector.select(&outputs, payer, provider).await?;
        debug!(
            locks = schedule.len(),
            total_locked = schedule.total_locked(),
            fee = funding.fee,
            change = funding.change,
            "lock stream funded"
        );

        if funding.change > 0 {
            outputs.push(TxOutput {
                value: funding.change,
                script_pubkey: payer.script_pubkey(),
            });
        }

        let mut tx = Transaction {
            version: TX_VERSION,
            inputs: funding
                .inputs
                .iter()
                .map(|utxo| TxInput {
                    previous_output: utxo.outpoint,
                    script_sig: vec![],
                    sequence: SEQUENCE_FINAL,
                })
                .collect(),
            outputs,
            lock_time: 0,
        };

        let pubkey = signer.public_key();
        for index in 0..tx.inputs.len() {
            let digest = signature_hash(&tx, index, &funding.inputs[index].script_pubkey)
                .map_err(WalletError::Signing)?;
            let mut sig = signer.sign_digest(&digest).map_err(WalletError::Signing)?;
            sig.push(SIGHASH_ALL as u8);
            tx.inputs[index].script_sig = script::p2pkh_script_sig(&sig, &pubkey);
        }

        let txid = tx.txid();
        let record = LockRecord {
            txid,
            recipient: *recipient,
            outputs: schedule
                .points()
                .iter()
                .enumerate()
                .map(|(vout, point)| LockedOutput {
                    vout: vout as u32,
                    value: point.value,
                    unlock_height: point.unlock_height,
                    spent: false,
                })
                .collect(),
        };

        info!(%txid, locks = schedule.len(), "lock stream assembled");
        Ok(BuiltLockTransaction {
            raw: tx.to_hex(),
            txid,
            funding,
            record,
            tx,
        })
    }
}
