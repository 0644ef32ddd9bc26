//! Core transaction types and canonical wire serialization.
//!
//! All monetary values are in satoshis. Integers serialize little-endian,
//! element counts as Bitcoin-style varints, and txid bytes are reversed on
//! the wire relative to their display form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::TransactionError;

/// A transaction identifier: double SHA-256 of the serialized transaction.
///
/// Stored in internal (hash output) byte order. Displayed and parsed in the
/// conventional reversed-hex form, which is also the serde representation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Txid(pub [u8; 32]);

impl Txid {
    /// The zero txid (32 zero bytes).
    pub const ZERO: Self = Self([0u8; 32]);

    /// Create a Txid from internal-order bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Return the internal-order bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Txid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0.iter().rev() {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

impl FromStr for Txid {
    type Err = TransactionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = hex::decode(s).map_err(|e| TransactionError::InvalidTxid(e.to_string()))?;
        let mut bytes: [u8; 32] = raw
            .try_into()
            .map_err(|_| TransactionError::InvalidTxid(format!("wrong length: {s}")))?;
        bytes.reverse();
        Ok(Self(bytes))
    }
}

impl Serialize for Txid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Txid {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Reference to a specific output of a previous transaction.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct OutPoint {
    /// Transaction containing the referenced output.
    pub txid: Txid,
    /// Index of the output within that transaction.
    pub vout: u32,
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// A transaction input, spending a previous output.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxInput {
    /// The outpoint being spent.
    pub previous_output: OutPoint,
    /// Unlocking script. Empty until the input is signed.
    pub script_sig: Vec<u8>,
    /// Sequence number. Non-final values make lock_time binding.
    pub sequence: u32,
}

/// A transaction output, creating a new spendable coin.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TxOutput {
    /// Value in satoshis.
    pub value: u64,
    /// Locking script that must be satisfied to spend this output.
    pub script_pubkey: Vec<u8>,
}

impl TxOutput {
    /// Serialized size of this output: value, script length varint, script.
    pub fn serialized_size(&self) -> usize {
        8 + varint_size(self.script_pubkey.len() as u64) + self.script_pubkey.len()
    }
}

/// A transaction transferring value between scripts.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Transaction {
    /// Protocol version.
    pub version: u32,
    /// Inputs consuming previous outputs.
    pub inputs: Vec<TxInput>,
    /// New outputs created by this transaction.
    pub outputs: Vec<TxOutput>,
    /// Block height (or timestamp) before which this tx is invalid,
    /// provided at least one input carries a non-final sequence.
    pub lock_time: u32,
}

impl Transaction {
    /// Serialize to canonical wire bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(self.serialized_size());

        data.extend_from_slice(&self.version.to_le_bytes());

        write_varint(&mut data, self.inputs.len() as u64);
        for input in &self.inputs {
            // Txid bytes go out in internal order, i.e. reversed display order.
            data.extend_from_slice(input.previous_output.txid.as_bytes());
            data.extend_from_slice(&input.previous_output.vout.to_le_bytes());
            write_varint(&mut data, input.script_sig.len() as u64);
            data.extend_from_slice(&input.script_sig);
            data.extend_from_slice(&input.sequence.to_le_bytes());
        }

        write_varint(&mut data, self.outputs.len() as u64);
        for output in &self.outputs {
            data.extend_from_slice(&output.value.to_le_bytes());
            write_varint(&mut data, output.script_pubkey.len() as u64);
            data.extend_from_slice(&output.script_pubkey);
        }

        data.extend_from_slice(&self.lock_time.to_le_bytes());
        data
    }

    /// Exact size in bytes of the canonical serialization.
    pub fn serialized_size(&self) -> usize {
        let mut size = 4 + 4;
        size += varint_size(self.inputs.len() as u64);
        for input in &self.inputs {
            size += 36
                + varint_size(input.script_sig.len() as u64)
                + input.script_sig.len()
                + 4;
        }
        size += varint_size(self.outputs.len() as u64);
        for output in &self.outputs {
            size += output.serialized_size();
        }
        size
    }

    /// Hex-encoded canonical serialization, ready for broadcast.
    pub fn to_hex(&self) -> String {
        hex::encode(self.serialize())
    }

    /// Compute the transaction ID: double SHA-256 of the wire bytes.
    pub fn txid(&self) -> Txid {
        let first = Sha256::digest(self.serialize());
        Txid(Sha256::digest(first).into())
    }

    /// Sum of all output values. Returns None on overflow.
    pub fn total_output_value(&self) -> Option<u64> {
        self.outputs
            .iter()
            .try_fold(0u64, |acc, out| acc.checked_add(out.value))
    }
}

/// An unspent output available for funding, as reported by a UTXO provider.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Utxo {
    /// The outpoint identifying this coin.
    pub outpoint: OutPoint,
    /// Value in satoshis.
    pub value: u64,
    /// The locking script this coin pays to.
    pub script_pubkey: Vec<u8>,
}

/// Append a Bitcoin-style varint to a buffer.
pub fn write_varint(buf: &mut Vec<u8>, value: u64) {
    match value {
        0..=0xFC => buf.push(value as u8),
        0xFD..=0xFFFF => {
            buf.push(0xFD);
            buf.extend_from_slice(&(value as u16).to_le_bytes());
        }
        0x1_0000..=0xFFFF_FFFF => {
            buf.push(0xFE);
            buf.extend_from_slice(&(value as u32).to_le_bytes());
        }
        _ => {
            buf.push(0xFF);
            buf.extend_from_slice(&value.to_le_bytes());
        }
    }
}

/// Encoded size of a Bitcoin-style varint.
pub fn varint_size(value: u64) -> usize {
    match value {
        0..=0xFC => 1,
        0xFD..=0xFFFF => 3,
        0x1_0000..=0xFFFF_FFFF => 5,
        _ => 9,
    }
}
