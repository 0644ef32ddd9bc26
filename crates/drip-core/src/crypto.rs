//! secp256k1 keys, HASH160, WIF, and legacy SIGHASH_ALL signing.
//!
//! Public keys are compressed (33 bytes) and identified on chain by their
//! HASH160 (RIPEMD-160 over SHA-256). Input signatures use the legacy
//! scheme: every script_sig in the transaction is cleared, the signed
//! input's script_sig is replaced by the locking script of the output it
//! spends, the 4-byte hash type is appended to the serialization, and the
//! result is double SHA-256 hashed. The DER signature plus a one-byte hash
//! type goes into the `<sig> <pubkey>` unlocking script.

use ripemd::Ripemd160;
use secp256k1::{ecdsa, Message, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::address::{Address, Network};
use crate::error::CryptoError;
use crate::script;
use crate::types::Transaction;

/// Hash type committing to all inputs and outputs.
pub const SIGHASH_ALL: u32 = 0x01;

/// secp256k1 keypair for signing transaction inputs.
///
/// Use [`KeyPair::generate`] for random keys, [`KeyPair::from_secret_bytes`]
/// for deterministic derivation, or [`KeyPair::from_wif`] to restore an
/// exported key.
#[derive(Clone)]
pub struct KeyPair {
    secret_key: SecretKey,
    public_key: secp256k1::PublicKey,
}

impl KeyPair {
    /// Generate a random keypair using the OS cryptographic RNG.
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut rand::thread_rng());
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a keypair from 32-byte secret key material.
    pub fn from_secret_bytes(bytes: [u8; 32]) -> Result<Self, CryptoError> {
        let secret_key =
            SecretKey::from_slice(&bytes).map_err(|_| CryptoError::InvalidSecretKey)?;
        let secp = Secp256k1::signing_only();
        let public_key = secp256k1::PublicKey::from_secret_key(&secp, &secret_key);
        Ok(Self {
            secret_key,
            public_key,
        })
    }

    /// Restore a keypair from WIF, returning the network it was exported on.
    ///
    /// Only compressed-key WIF (34-byte payload with the 0x01 flag) is
    /// accepted, since addresses here always commit to compressed pubkeys.
    pub fn from_wif(wif: &str) -> Result<(Self, Network), CryptoError> {
        let payload = bs58::decode(wif)
            .with_check(None)
            .into_vec()
            .map_err(|e| CryptoError::InvalidWif(e.to_string()))?;
        if payload.len() != 34 {
            return Err(CryptoError::InvalidWif(format!(
                "payload length {}",
                payload.len()
            )));
        }
        let network = match payload[0] {
            0x80 => Network::Mainnet,
            0xEF => Network::Testnet,
            other => {
                return Err(CryptoError::InvalidWif(format!("prefix {other:#04x}")));
            }
        };
        if payload[33] != 0x01 {
            return Err(CryptoError::InvalidWif("missing compression flag".into()));
        }
        let mut secret = [0u8; 32];
        secret.copy_from_slice(&payload[1..33]);
        Ok((Self::from_secret_bytes(secret)?, network))
    }

    /// Export the secret key as compressed-key WIF for the given network.
    pub fn to_wif(&self, network: Network) -> String {
        let mut payload = Vec::with_capacity(33);
        payload.extend_from_slice(&self.secret_key.secret_bytes());
        payload.push(0x01);
        bs58::encode(payload)
            .with_check_version(network.wif_prefix())
            .into_string()
    }

    /// Raw secret key bytes. Handle with care.
    pub fn secret_bytes(&self) -> [u8; 32] {
        self.secret_key.secret_bytes()
    }

    /// Compressed 33-byte public key.
    pub fn public_key_bytes(&self) -> [u8; 33] {
        self.public_key.serialize()
    }

    /// HASH160 of the compressed public key.
    pub fn pubkey_hash(&self) -> [u8; 20] {
        hash160(&self.public_key_bytes())
    }

    /// P2PKH address for this key on the given network.
    pub fn address(&self, network: Network) -> Address {
        Address::from_pubkey_hash(self.pubkey_hash(), network)
    }

    /// Sign a 32-byte digest, returning the DER-encoded ECDSA signature.
    pub fn sign_digest(&self, digest: &[u8; 32]) -> Vec<u8> {
        let secp = Secp256k1::signing_only();
        let message = Message::from_digest(*digest);
        secp.sign_ecdsa(&message, &self.secret_key)
            .serialize_der()
            .to_vec()
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &hex::encode(self.public_key_bytes()))
            .finish_non_exhaustive()
    }
}

impl PartialEq for KeyPair {
    fn eq(&self, other: &Self) -> bool {
        self.secret_key == other.secret_key
    }
}

impl Eq for KeyPair {}

/// HASH160: RIPEMD-160 over SHA-256.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    Ripemd160::digest(Sha256::digest(data)).into()
}

/// Double SHA-256.
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    Sha256::digest(Sha256::digest(data)).into()
}

/// Compute the legacy SIGHASH_ALL digest for one input.
///
/// `prev_script` is the locking script of the output the input spends.
pub fn signature_hash(
    tx: &Transaction,
    input_index: usize,
    prev_script: &[u8],
) -> Result<[u8; 32], CryptoError> {
    if input_index >= tx.inputs.len() {
        return Err(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.inputs.len(),
        });
    }

    let mut copy = tx.clone();
    for input in &mut copy.inputs {
        input.script_sig.clear();
    }
    copy.inputs[input_index].script_sig = prev_script.to_vec();

    let mut data = copy.serialize();
    data.extend_from_slice(&SIGHASH_ALL.to_le_bytes());
    Ok(double_sha256(&data))
}

/// Sign a transaction input in place.
///
/// Writes a `<sig+hashtype> <pubkey>` script_sig into the input. Inputs can
/// be signed in any order since the sighash ignores other script_sigs.
pub fn sign_input(
    tx: &mut Transaction,
    input_index: usize,
    prev_script: &[u8],
    keypair: &KeyPair,
) -> Result<(), CryptoError> {
    let digest = signature_hash(tx, input_index, prev_script)?;
    let mut signature = keypair.sign_digest(&digest);
    signature.push(SIGHASH_ALL as u8);
    tx.inputs[input_index].script_sig =
        script::p2pkh_script_sig(&signature, &keypair.public_key_bytes());
    Ok(())
}

/// Verify a transaction input's signature against the script it spends.
///
/// Checks that:
/// 1. The script_sig is a well-formed `<sig+hashtype> <pubkey>` pair with
///    hash type SIGHASH_ALL
/// 2. The pubkey's HASH160 matches the hash committed in `prev_script`
///    (P2PKH or lock template)
/// 3. The ECDSA signature verifies against the sighash
pub fn verify_input(
    tx: &Transaction,
    input_index: usize,
    prev_script: &[u8],
) -> Result<(), CryptoError> {
    if input_index >= tx.inputs.len() {
        return Err(CryptoError::InputIndexOutOfBounds {
            index: input_index,
            len: tx.inputs.len(),
        });
    }

    let (mut signature, pubkey_bytes) =
        script::parse_script_sig(&tx.inputs[input_index].script_sig)
            .ok_or(CryptoError::MalformedScriptSig)?;
    let hash_type = signature.pop().ok_or(CryptoError::MalformedScriptSig)?;
    if hash_type as u32 != SIGHASH_ALL {
        return Err(CryptoError::UnsupportedSighash(hash_type));
    }

    let pubkey = secp256k1::PublicKey::from_slice(&pubkey_bytes)
        .map_err(|_| CryptoError::InvalidPublicKey)?;

    if let Some(expected) = script::expected_pubkey_hash(prev_script) {
        if hash160(&pubkey_bytes) != expected {
            return Err(CryptoError::PubkeyHashMismatch);
        }
    }

    let digest = signature_hash(tx, input_index, prev_script)?;
    let message = Message::from_digest(digest);
    let sig = ecdsa::Signature::from_der(&signature).map_err(|_| CryptoError::InvalidSignature)?;

    let secp = Secp256k1::verification_only();
    secp.verify_ecdsa(&message, &sig, &pubkey)
        .map_err(|_| CryptoError::VerificationFailed)
}
