//! Wallet error types.

use drip_core::error::{AddressError, CryptoError};
use thiserror::Error;

/// Errors that can occur while computing, funding, or assembling lock
/// streams and unlock spends.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WalletError {
    /// The interval does not divide the lock window: zero, or larger than
    /// the span between start and end heights.
    #[error("invalid interval: {interval} over a span of {span} blocks")]
    InvalidInterval {
        /// Requested interval in blocks.
        interval: u32,
        /// Blocks between start and end height.
        span: u32,
    },

    /// A lock point would carry less than the minimum output value.
    #[error("lock value below minimum: {value} < {min}")]
    InvalidLock {
        /// Per-point value in satoshis.
        value: u64,
        /// Minimum allowed value in satoshis.
        min: u64,
    },

    /// The schedule contains no lock points.
    #[error("no locks")]
    NoLocks,

    /// Insufficient funds to cover the locked amount plus fees.
    #[error("insufficient funds: have {have}, need {need}")]
    InsufficientFunds {
        /// Total satoshis available from the provider.
        have: u64,
        /// Required satoshis including fee.
        need: u64,
    },

    /// Invalid address string.
    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// Malformed reference to a locked output.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Signing or signature verification failure.
    #[error(transparent)]
    Signing(#[from] CryptoError),

    /// The network refused a submitted transaction.
    #[error("broadcast rejected: {0}")]
    BroadcastRejected(String),

    /// The UTXO provider failed (network, backend).
    #[error("utxo provider: {0}")]
    Provider(String),

    /// Monetary arithmetic overflowed.
    #[error("value overflow")]
    ValueOverflow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_interval() {
        let e = WalletError::InvalidInterval {
            interval: 10,
            span: 9,
        };
        assert_eq!(e.to_string(), "invalid interval: 10 over a span of 9 blocks");
    }

    #[test]
    fn display_insufficient_funds() {
        let e = WalletError::InsufficientFunds {
            have: 100,
            need: 250,
        };
        assert_eq!(e.to_string(), "insufficient funds: have 100, need 250");
    }

    #[test]
    fn display_no_locks() {
        assert_eq!(WalletError::NoLocks.to_string(), "no locks");
    }

    #[test]
    fn from_crypto_error() {
        let e: WalletError = CryptoError::VerificationFailed.into();
        assert_eq!(e, WalletError::Signing(CryptoError::VerificationFailed));
    }

    #[test]
    fn from_address_error() {
        let e: WalletError = AddressError::InvalidChecksum.into();
        assert_eq!(e, WalletError::InvalidAddress(AddressError::InvalidChecksum));
    }

    #[test]
    fn clone_and_eq() {
        let e1 = WalletError::InvalidReference("bad txid".into());
        assert_eq!(e1.clone(), e1);
    }
}
