//! Error types for the driplock protocol layer.
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScriptError {
    #[error("number encoding too long: {0} bytes")] EncodingTooLong(usize),
    #[error("non-minimal number encoding")] NonMinimal,
    #[error("negative number where a height is required")] Negative,
    #[error("height out of range: {0}")] HeightOutOfRange(u64),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid base58: {0}")] InvalidBase58(String),
    #[error("invalid checksum")] InvalidChecksum,
    #[error("invalid payload length: {0}")] InvalidLength(usize),
    #[error("unknown version byte: {0:#04x}")] UnknownVersion(u8),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("invalid secret key bytes")] InvalidSecretKey,
    #[error("invalid public key bytes")] InvalidPublicKey,
    #[error("invalid signature encoding")] InvalidSignature,
    #[error("signature verification failed")] VerificationFailed,
    #[error("pubkey hash does not match the spent script")] PubkeyHashMismatch,
    #[error("unsupported sighash type: {0:#04x}")] UnsupportedSighash(u8),
    #[error("malformed unlocking script")] MalformedScriptSig,
    #[error("input index out of bounds: {index} >= {len}")] InputIndexOutOfBounds { index: usize, len: usize },
    #[error("invalid WIF: {0}")] InvalidWif(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransactionError {
    #[error("invalid txid: {0}")] InvalidTxid(String),
    #[error("value overflow")] ValueOverflow,
}
