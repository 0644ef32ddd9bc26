//! Collaborator traits at the edges of the engine.
//!
//! The engine never talks to a chain, an index, or a key store directly;
//! callers inject implementations of these traits. Errors cross the
//! boundary as [`WalletError`] so the taxonomy stays unified.

use async_trait::async_trait;

use drip_core::address::Address;
use drip_core::crypto::KeyPair;
use drip_core::error::CryptoError;
use drip_core::types::{Txid, Utxo};

use crate::error::WalletError;

/// Source of spendable coins for a funding address.
#[async_trait]
pub trait UtxoProvider: Send + Sync {
    /// List spendable outputs for `address`, aiming to cover
    /// `minimum_total` satoshis.
    ///
    /// Implementations return whatever they have; an address with too few
    /// coins is not an error here, the selector reports the shortfall.
    async fn list_spendable(
        &self,
        address: &Address,
        minimum_total: u64,
    ) -> Result<Vec<Utxo>, WalletError>;
}

/// Submission of raw transactions to the network.
#[async_trait]
pub trait Broadcaster: Send + Sync {
    /// Submit a hex-encoded transaction, returning its txid on acceptance.
    ///
    /// A refusal surfaces as [`WalletError::BroadcastRejected`] with the
    /// network's reason.
    async fn submit(&self, raw_tx_hex: &str) -> Result<Txid, WalletError>;
}

/// Producer of input signatures over sighash digests.
pub trait Signer: Send + Sync {
    /// Compressed public key the signatures verify against.
    fn public_key(&self) -> [u8; 33];

    /// Sign a 32-byte sighash digest, returning a DER-encoded signature
    /// without the hash type byte.
    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>, CryptoError>;
}

impl Signer for KeyPair {
    fn public_key(&self) -> [u8; 33] {
        self.public_key_bytes()
    }

    fn sign_digest(&self, digest: &[u8; 32]) -> Result<Vec<u8>, CryptoError> {
        Ok(KeyPair::sign_digest(self, digest))
    }
}

#[cfg(test)]
pub(crate) mod mocks {
    use super::*;
    use drip_core::types::OutPoint;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory provider: a fixed coin list per address, returned in
    /// insertion order regardless of the requested minimum.
    pub struct MemoryProvider {
        coins: HashMap<String, Vec<Utxo>>,
    }

    impl MemoryProvider {
        pub fn new() -> Self {
            Self {
                coins: HashMap::new(),
            }
        }

        pub fn add_coin(&mut self, address: &Address, txid: Txid, vout: u32, value: u64) {
            self.coins.entry(address.to_string()).or_default().push(Utxo {
                outpoint: OutPoint { txid, vout },
                value,
                script_pubkey: address.script_pubkey(),
            });
        }
    }

    #[async_trait]
    impl UtxoProvider for MemoryProvider {
        async fn list_spendable(
            &self,
            address: &Address,
            _minimum_total: u64,
        ) -> Result<Vec<Utxo>, WalletError> {
            Ok(self
                .coins
                .get(&address.to_string())
                .cloned()
                .unwrap_or_default())
        }
    }

    /// Provider that always fails, for error path tests.
    pub struct FailingProvider;

    #[async_trait]
    impl UtxoProvider for FailingProvider {
        async fn list_spendable(
            &self,
            _address: &Address,
            _minimum_total: u64,
        ) -> Result<Vec<Utxo>, WalletError> {
            Err(WalletError::Provider("backend unreachable".into()))
        }
    }

    /// Broadcaster that records submissions and accepts everything.
    pub struct MemoryBroadcaster {
        pub submitted: Mutex<Vec<String>>,
    }

    impl MemoryBroadcaster {
        pub fn new() -> Self {
            Self {
                submitted: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Broadcaster for MemoryBroadcaster {
        async fn submit(&self, raw_tx_hex: &str) -> Result<Txid, WalletError> {
            let bytes = hex::decode(raw_tx_hex)
                .map_err(|e| WalletError::BroadcastRejected(e.to_string()))?;
            self.submitted.lock().unwrap().push(raw_tx_hex.to_string());
            let digest = drip_core::crypto::double_sha256(&bytes);
            Ok(Txid::from_bytes(digest))
        }
    }
}
