//! Base58Check P2PKH addresses.
//!
//! An address is a network version byte plus a 20-byte pubkey hash, encoded
//! with a 4-byte double-SHA-256 checksum. Version 0x00 on mainnet, 0x6F on
//! testnet.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::AddressError;
use crate::script;

/// Network an address or key belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// Production network.
    #[default]
    Mainnet,
    /// Public test network.
    Testnet,
}

impl Network {
    /// Address version byte for this network.
    pub fn address_version(&self) -> u8 {
        match self {
            Self::Mainnet => 0x00,
            Self::Testnet => 0x6F,
        }
    }

    /// WIF prefix byte for secret key export on this network.
    pub fn wif_prefix(&self) -> u8 {
        match self {
            Self::Mainnet => 0x80,
            Self::Testnet => 0xEF,
        }
    }

    fn from_address_version(version: u8) -> Result<Self, AddressError> {
        match version {
            0x00 => Ok(Self::Mainnet),
            0x6F => Ok(Self::Testnet),
            other => Err(AddressError::UnknownVersion(other)),
        }
    }
}

/// A P2PKH address: network plus the HASH160 of the holder's public key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Address {
    network: Network,
    pubkey_hash: [u8; 20],
}

impl Address {
    /// Create an address from a pubkey hash.
    pub fn from_pubkey_hash(pubkey_hash: [u8; 20], network: Network) -> Self {
        Self {
            network,
            pubkey_hash,
        }
    }

    /// The 20-byte pubkey hash this address commits to.
    pub fn pubkey_hash(&self) -> [u8; 20] {
        self.pubkey_hash
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Standard P2PKH locking script paying this address.
    pub fn script_pubkey(&self) -> Vec<u8> {
        script::p2pkh_script(&self.pubkey_hash)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bs58::encode(&self.pubkey_hash)
            .with_check_version(self.network.address_version())
            .into_string();
        f.write_str(&encoded)
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let payload = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| match e {
                bs58::decode::Error::InvalidChecksum { .. } => AddressError::InvalidChecksum,
                other => AddressError::InvalidBase58(other.to_string()),
            })?;
        if payload.len() != 21 {
            return Err(AddressError::InvalidLength(payload.len()));
        }
        let network = Network::from_address_version(payload[0])?;
        let mut pubkey_hash = [0u8; 20];
        pubkey_hash.copy_from_slice(&payload[1..]);
        Ok(Self {
            network,
            pubkey_hash,
        })
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
