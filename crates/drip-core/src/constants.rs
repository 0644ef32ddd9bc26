//! Protocol constants. All monetary values in satoshis (1 coin = 10^8 satoshis).

pub const COIN: u64 = 100_000_000;

/// Lock-time values below this are block heights; at or above, Unix timestamps.
pub const LOCKTIME_THRESHOLD: u32 = 500_000_000;

/// Sequence value that makes an input final (lock_time ignored).
pub const SEQUENCE_FINAL: u32 = 0xFFFF_FFFF;

/// Non-final sequence: lock_time is enforced, no relative timelock (BIP-68 bit set).
pub const SEQUENCE_ENABLE_LOCKTIME: u32 = 0xFFFF_FFFE;

pub const TX_VERSION: u32 = 1;

/// Serialized size of a signed P2PKH input: outpoint (36) + script length (1)
/// + signature push (~72) + pubkey push (34) + sequence (4), rounded up.
pub const P2PKH_INPUT_SIZE: usize = 148;

/// Serialized size of a P2PKH output: value (8) + script length (1) + script (25).
pub const P2PKH_OUTPUT_SIZE: usize = 34;

/// Fixed transaction framing: version (4) + lock_time (4) + two count varints.
pub const TX_OVERHEAD_SIZE: usize = 10;

/// Smallest value a single locked output may carry, in satoshis.
pub const MIN_LOCK_VALUE: u64 = 2;

/// Target seconds between blocks, used for unlock time estimates.
pub const BLOCK_TIME_SECS: u64 = 600;
