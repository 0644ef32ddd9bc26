//! Records of locked outputs, handed to the persistence collaborator.
//!
//! The engine produces a [`LockRecord`] alongside every assembled lock
//! transaction and reads records back when building unlock spends. Storage,
//! schema migration, and spent-flag updates belong to the caller.

use serde::{Deserialize, Serialize};

use drip_core::address::Address;
use drip_core::types::Txid;

/// One time-locked output of a lock transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LockedOutput {
    /// Output index within the lock transaction.
    pub vout: u32,
    /// Locked value in satoshis.
    pub value: u64,
    /// Height at which the output becomes spendable.
    pub unlock_height: u32,
    /// Whether an unlock spend of this output has been broadcast.
    pub spent: bool,
}

impl LockedOutput {
    /// Whether this output can be spent at the given chain height.
    pub fn is_unlockable(&self, current_height: u32) -> bool {
        !self.spent && current_height >= self.unlock_height
    }
}

/// Everything a caller needs to later unlock the outputs of one lock
/// transaction.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LockRecord {
    /// Txid of the lock transaction.
    pub txid: Txid,
    /// Address whose key can spend the locked outputs.
    pub recipient: Address,
    /// The locked outputs, ascending by unlock height.
    pub outputs: Vec<LockedOutput>,
}

impl LockRecord {
    /// Look up a locked output by its index in the lock transaction.
    pub fn output(&self, vout: u32) -> Option<&LockedOutput> {
        self.outputs.iter().find(|o| o.vout == vout)
    }

    /// Total value across outputs not yet marked spent.
    pub fn unspent_value(&self) -> u64 {
        self.outputs
            .iter()
            .filter(|o| !o.spent)
            .map(|o| o.value)
            .sum()
    }

    /// Outputs spendable at the given chain height.
    pub fn unlockable_at(&self, current_height: u32) -> impl Iterator<Item = &LockedOutput> {
        self.outputs
            .iter()
            .filter(move |o| o.is_unlockable(current_height))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use drip_core::address::Network;

    fn sample_record() -> LockRecord {
        LockRecord {
            txid: Txid([0x77; 32]),
            recipient: Address::from_pubkey_hash([0x11; 20], Network::Testnet),
            outputs: vec![
                LockedOutput {
                    vout: 0,
                    value: 50,
                    unlock_height: 100_004,
                    spent: false,
                },
                LockedOutput {
                    vout: 1,
                    value: 50,
                    unlock_height: 100_008,
                    spent: false,
                },
            ],
        }
    }

    #[test]
    fn unlockable_respects_height_and_spent_flag() {
        let mut out = LockedOutput {
            vout: 0,
            value: 10,
            unlock_height: 500,
            spent: false,
        };
        assert!(!out.is_unlockable(499));
        assert!(out.is_unlockable(500));
        assert!(out.is_unlockable(501));

        out.spent = true;
        assert!(!out.is_unlockable(501));
    }

    #[test]
    fn output_lookup_by_vout() {
        let record = sample_record();
        assert_eq!(record.output(1).unwrap().unlock_height, 100_008);
        assert!(record.output(2).is_none());
    }

    #[test]
    fn unspent_value_skips_spent_outputs() {
        let mut record = sample_record();
        assert_eq!(record.unspent_value(), 100);
        record.outputs[0].spent = true;
        assert_eq!(record.unspent_value(), 50);
    }

    #[test]
    fn unlockable_at_filters_by_height() {
        let record = sample_record();
        assert_eq!(record.unlockable_at(100_000).count(), 0);
        assert_eq!(record.unlockable_at(100_004).count(), 1);
        assert_eq!(record.unlockable_at(100_008).count(), 2);
    }

    #[test]
    fn serde_roundtrip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: LockRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        // Txid serializes in display form inside the record.
        assert!(json.contains(&record.txid.to_string()));
    }
}
