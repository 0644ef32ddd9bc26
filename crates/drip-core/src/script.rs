//! Script construction and parsing for time-locked P2PKH outputs.
//!
//! The locking template produced by [`lock_script`] is:
//!
//! ```text
//! OP_DUP OP_HASH160 <pkh:20> <height> OP_CHECKLOCKTIMEVERIFY OP_DROP
//! OP_EQUALVERIFY OP_CHECKSIG
//! ```
//!
//! Spending requires the chain to have reached `height` (enforced by
//! OP_CHECKLOCKTIMEVERIFY against the spending transaction's lock_time) and
//! a signature from the key whose HASH160 is committed in the script.
//!
//! Heights are encoded as minimal script numbers: little-endian magnitude
//! with trailing zero bytes trimmed, plus a 0x00 pad byte when the top
//! magnitude byte would otherwise read as a sign bit. Values 1..=16 pushed
//! onto the stack use the OP_1..OP_16 shortcut.

use crate::constants::LOCKTIME_THRESHOLD;
use crate::error::ScriptError;

/// Script opcodes used by the lock and P2PKH templates.
pub mod opcodes {
    pub const OP_0: u8 = 0x00;
    pub const OP_PUSHDATA1: u8 = 0x4C;
    pub const OP_1: u8 = 0x51;
    pub const OP_16: u8 = 0x60;
    pub const OP_DROP: u8 = 0x75;
    pub const OP_DUP: u8 = 0x76;
    pub const OP_EQUALVERIFY: u8 = 0x88;
    pub const OP_HASH160: u8 = 0xA9;
    pub const OP_CHECKSIG: u8 = 0xAC;
    pub const OP_CHECKLOCKTIMEVERIFY: u8 = 0xB1;
}

/// Encode a block height as a minimal script number.
///
/// Zero encodes as the empty byte string. The result is the push payload,
/// not a complete push operation; see [`push_data`].
pub fn encode_height(height: u32) -> Vec<u8> {
    if height == 0 {
        return Vec::new();
    }
    let mut bytes = height.to_le_bytes().to_vec();
    while bytes.len() > 1 && bytes.last() == Some(&0) {
        bytes.pop();
    }
    // A set high bit on the top byte would read back as negative.
    if bytes.last().is_some_and(|b| b & 0x80 != 0) {
        bytes.push(0x00);
    }
    bytes
}

/// Decode a minimal script number back into a block height.
///
/// Rejects oversized, non-minimal, and negative encodings, and any value at
/// or above [`LOCKTIME_THRESHOLD`] (which would be a timestamp, not a
/// height). Inverse of [`encode_height`] for all valid heights.
pub fn decode_height(bytes: &[u8]) -> Result<u32, ScriptError> {
    if bytes.is_empty() {
        return Ok(0);
    }
    if bytes.len() > 5 {
        return Err(ScriptError::EncodingTooLong(bytes.len()));
    }

    let last = bytes[bytes.len() - 1];
    if last & 0x80 != 0 {
        return Err(ScriptError::Negative);
    }
    if last == 0 {
        // A trailing zero is only a valid sign pad when the byte below it
        // has its high bit set.
        if bytes.len() < 2 || bytes[bytes.len() - 2] & 0x80 == 0 {
            return Err(ScriptError::NonMinimal);
        }
    }

    let mut value: u64 = 0;
    for (i, byte) in bytes.iter().enumerate() {
        value |= (*byte as u64) << (8 * i);
    }
    if value >= LOCKTIME_THRESHOLD as u64 {
        return Err(ScriptError::HeightOutOfRange(value));
    }
    Ok(value as u32)
}

/// Append a minimal push of `data` to a script.
///
/// Empty data pushes OP_0; a single byte 1..=16 uses OP_1..OP_16; anything
/// else uses a direct length byte or OP_PUSHDATA1.
pub fn push_data(script: &mut Vec<u8>, data: &[u8]) {
    match data {
        [] => script.push(opcodes::OP_0),
        [n @ 1..=16] => script.push(opcodes::OP_1 + n - 1),
        _ => {
            if data.len() < opcodes::OP_PUSHDATA1 as usize {
                script.push(data.len() as u8);
            } else {
                script.push(opcodes::OP_PUSHDATA1);
                script.push(data.len() as u8);
            }
            script.extend_from_slice(data);
        }
    }
}

/// Build the time-locked P2PKH locking script for a pubkey hash and height.
pub fn lock_script(pubkey_hash: &[u8; 20], height: u32) -> Vec<u8> {
    let mut script = Vec::with_capacity(32);
    script.push(opcodes::OP_DUP);
    script.push(opcodes::OP_HASH160);
    push_data(&mut script, pubkey_hash);
    push_data(&mut script, &encode_height(height));
    script.push(opcodes::OP_CHECKLOCKTIMEVERIFY);
    script.push(opcodes::OP_DROP);
    script.push(opcodes::OP_EQUALVERIFY);
    script.push(opcodes::OP_CHECKSIG);
    script
}

/// Build a standard P2PKH locking script.
pub fn p2pkh_script(pubkey_hash: &[u8; 20]) -> Vec<u8> {
    let mut script = Vec::with_capacity(25);
    script.push(opcodes::OP_DUP);
    script.push(opcodes::OP_HASH160);
    push_data(&mut script, pubkey_hash);
    script.push(opcodes::OP_EQUALVERIFY);
    script.push(opcodes::OP_CHECKSIG);
    script
}

/// Build the `<sig> <pubkey>` unlocking script satisfying either P2PKH or
/// the lock template.
pub fn p2pkh_script_sig(signature: &[u8], pubkey: &[u8]) -> Vec<u8> {
    let mut script = Vec::with_capacity(signature.len() + pubkey.len() + 2);
    push_data(&mut script, signature);
    push_data(&mut script, pubkey);
    script
}

/// Split a `<sig> <pubkey>` unlocking script back into its two pushes.
pub fn parse_script_sig(script: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
    let mut s = script;
    let signature = read_push(&mut s)?;
    let pubkey = read_push(&mut s)?;
    if !s.is_empty() {
        return None;
    }
    Some((signature, pubkey))
}

/// Parse a locking script against the lock template, recovering the
/// committed pubkey hash and unlock height. Returns None for anything that
/// is not byte-for-byte an instance of the template.
pub fn parse_lock_script(script: &[u8]) -> Option<([u8; 20], u32)> {
    let mut s = script;
    expect_op(&mut s, opcodes::OP_DUP)?;
    expect_op(&mut s, opcodes::OP_HASH160)?;
    let pkh: [u8; 20] = read_push(&mut s)?.try_into().ok()?;
    let height = decode_height(&read_push(&mut s)?).ok()?;
    expect_op(&mut s, opcodes::OP_CHECKLOCKTIMEVERIFY)?;
    expect_op(&mut s, opcodes::OP_DROP)?;
    expect_op(&mut s, opcodes::OP_EQUALVERIFY)?;
    expect_op(&mut s, opcodes::OP_CHECKSIG)?;
    if !s.is_empty() {
        return None;
    }
    Some((pkh, height))
}

/// Parse a standard P2PKH locking script, recovering the pubkey hash.
pub fn parse_p2pkh_script(script: &[u8]) -> Option<[u8; 20]> {
    let mut s = script;
    expect_op(&mut s, opcodes::OP_DUP)?;
    expect_op(&mut s, opcodes::OP_HASH160)?;
    let pkh: [u8; 20] = read_push(&mut s)?.try_into().ok()?;
    expect_op(&mut s, opcodes::OP_EQUALVERIFY)?;
    expect_op(&mut s, opcodes::OP_CHECKSIG)?;
    if !s.is_empty() {
        return None;
    }
    Some(pkh)
}

/// Pubkey hash a spending key must match, for either recognized template.
pub fn expected_pubkey_hash(script: &[u8]) -> Option<[u8; 20]> {
    parse_p2pkh_script(script).or_else(|| parse_lock_script(script).map(|(pkh, _)| pkh))
}

fn expect_op(s: &mut &[u8], op: u8) -> Option<()> {
    let (&first, rest) = s.split_first()?;
    if first != op {
        return None;
    }
    *s = rest;
    Some(())
}

/// Read one minimal push operation, returning its payload.
fn read_push(s: &mut &[u8]) -> Option<Vec<u8>> {
    let (&first, rest) = s.split_first()?;
    match first {
        opcodes::OP_0 => {
            *s = rest;
            Some(Vec::new())
        }
        1..=0x4B => {
            let len = first as usize;
            if rest.len() < len {
                return None;
            }
            let (payload, tail) = rest.split_at(len);
            *s = tail;
            Some(payload.to_vec())
        }
        opcodes::OP_PUSHDATA1 => {
            let (&len, rest) = rest.split_first()?;
            let len = len as usize;
            if rest.len() < len {
                return None;
            }
            let (payload, tail) = rest.split_at(len);
            *s = tail;
            Some(payload.to_vec())
        }
        opcodes::OP_1..=opcodes::OP_16 => {
            *s = rest;
            Some(vec![first - opcodes::OP_1 + 1])
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // --- Height encoding ---

    #[test]
    fn encode_known_values() {
        assert_eq!(encode_height(0), Vec::<u8>::new());
        assert_eq!(encode_height(1), vec![0x01]);
        assert_eq!(encode_height(127), vec![0x7F]);
        // High bit set: sign pad required.
        assert_eq!(encode_height(128), vec![0x80, 0x00]);
        assert_eq!(encode_height(255), vec![0xFF, 0x00]);
        assert_eq!(encode_height(256), vec![0x00, 0x01]);
        assert_eq!(encode_height(100_008), vec![0xA8, 0x86, 0x01]);
        assert_eq!(encode_height(499_999_999), vec![0xFF, 0x64, 0xCD, 0x1D]);
    }

    #[test]
    fn decode_known_values() {
        assert_eq!(decode_height(&[]).unwrap(), 0);
        assert_eq!(decode_height(&[0x01]).unwrap(), 1);
        assert_eq!(decode_height(&[0x80, 0x00]).unwrap(), 128);
        assert_eq!(decode_height(&[0xA8, 0x86, 0x01]).unwrap(), 100_008);
    }

    #[test]
    fn decode_rejects_non_minimal() {
        // 1 padded to two bytes.
        assert_eq!(
            decode_height(&[0x01, 0x00]).unwrap_err(),
            ScriptError::NonMinimal
        );
        // Bare zero byte: zero encodes as empty.
        assert_eq!(decode_height(&[0x00]).unwrap_err(), ScriptError::NonMinimal);
    }

    #[test]
    fn decode_rejects_negative() {
        assert_eq!(decode_height(&[0x80]).unwrap_err(), ScriptError::Negative);
        assert_eq!(
            decode_height(&[0x01, 0x81]).unwrap_err(),
            ScriptError::Negative
        );
    }

    #[test]
    fn decode_rejects_timestamp_range() {
        let bytes = encode_height_unchecked(500_000_000);
        assert_eq!(
            decode_height(&bytes).unwrap_err(),
            ScriptError::HeightOutOfRange(500_000_000)
        );
    }

    #[test]
    fn decode_rejects_oversized() {
        assert_eq!(
            decode_height(&[1, 2, 3, 4, 5, 6]).unwrap_err(),
            ScriptError::EncodingTooLong(6)
        );
    }

    // Same trimming rules without the height range limit, for range tests.
    fn encode_height_unchecked(value: u64) -> Vec<u8> {
        let mut bytes = value.to_le_bytes().to_vec();
        while bytes.len() > 1 && bytes.last() == Some(&0) {
            bytes.pop();
        }
        if bytes.last().is_some_and(|b| b & 0x80 != 0) {
            bytes.push(0x00);
        }
        bytes
    }

    proptest! {
        #[test]
        fn height_roundtrip(h in 0u32..500_000_000) {
            prop_assert_eq!(decode_height(&encode_height(h)).unwrap(), h);
        }
    }

    // --- Push encoding ---

    #[test]
    fn push_small_numbers_use_op_n() {
        let mut s = Vec::new();
        push_data(&mut s, &[16]);
        assert_eq!(s, vec![opcodes::OP_16]);

        let mut s = Vec::new();
        push_data(&mut s, &[1]);
        assert_eq!(s, vec![opcodes::OP_1]);
    }

    #[test]
    fn push_empty_uses_op_0() {
        let mut s = Vec::new();
        push_data(&mut s, &[]);
        assert_eq!(s, vec![opcodes::OP_0]);
    }

    #[test]
    fn push_direct_length() {
        let mut s = Vec::new();
        push_data(&mut s, &[0xAA; 20]);
        assert_eq!(s[0], 20);
        assert_eq!(s.len(), 21);
    }

    #[test]
    fn push_pushdata1_for_long_payloads() {
        let mut s = Vec::new();
        push_data(&mut s, &[0xAA; 0x50]);
        assert_eq!(s[0], opcodes::OP_PUSHDATA1);
        assert_eq!(s[1], 0x50);
        assert_eq!(s.len(), 0x52);
    }

    #[test]
    fn read_push_inverts_push_data() {
        for payload in [vec![], vec![5], vec![17], vec![0xAB; 33], vec![0xCD; 80]] {
            let mut s = Vec::new();
            push_data(&mut s, &payload);
            let mut slice = s.as_slice();
            assert_eq!(read_push(&mut slice).unwrap(), payload);
            assert!(slice.is_empty());
        }
    }

    // --- Templates ---

    #[test]
    fn lock_script_layout() {
        let pkh = [0x5A; 20];
        let script = lock_script(&pkh, 100_008);
        assert_eq!(script[0], opcodes::OP_DUP);
        assert_eq!(script[1], opcodes::OP_HASH160);
        assert_eq!(script[2], 20);
        assert_eq!(&script[3..23], &pkh);
        // 3-byte height push follows the pkh.
        assert_eq!(script[23], 3);
        assert_eq!(&script[24..27], &[0xA8, 0x86, 0x01]);
        assert_eq!(
            &script[27..],
            &[
                opcodes::OP_CHECKLOCKTIMEVERIFY,
                opcodes::OP_DROP,
                opcodes::OP_EQUALVERIFY,
                opcodes::OP_CHECKSIG,
            ]
        );
    }

    #[test]
    fn lock_script_parses_back() {
        let pkh = [0x77; 20];
        for height in [1u32, 16, 17, 128, 100_008, 499_999_999] {
            let script = lock_script(&pkh, height);
            assert_eq!(parse_lock_script(&script), Some((pkh, height)));
        }
    }

    #[test]
    fn lock_script_deterministic() {
        let pkh = [0x01; 20];
        assert_eq!(lock_script(&pkh, 5000), lock_script(&pkh, 5000));
    }

    #[test]
    fn parse_lock_rejects_p2pkh() {
        assert_eq!(parse_lock_script(&p2pkh_script(&[0x22; 20])), None);
    }

    #[test]
    fn parse_lock_rejects_trailing_bytes() {
        let mut script = lock_script(&[0x22; 20], 700);
        script.push(opcodes::OP_DROP);
        assert_eq!(parse_lock_script(&script), None);
    }

    #[test]
    fn parse_lock_rejects_truncation() {
        let script = lock_script(&[0x22; 20], 700);
        assert_eq!(parse_lock_script(&script[..script.len() - 1]), None);
    }

    #[test]
    fn p2pkh_script_parses_back() {
        let pkh = [0x33; 20];
        let script = p2pkh_script(&pkh);
        assert_eq!(script.len(), 25);
        assert_eq!(parse_p2pkh_script(&script), Some(pkh));
        assert_eq!(parse_p2pkh_script(&lock_script(&pkh, 10)), None);
    }

    #[test]
    fn expected_pubkey_hash_handles_both_templates() {
        let pkh = [0x44; 20];
        assert_eq!(expected_pubkey_hash(&p2pkh_script(&pkh)), Some(pkh));
        assert_eq!(expected_pubkey_hash(&lock_script(&pkh, 42)), Some(pkh));
        assert_eq!(expected_pubkey_hash(&[opcodes::OP_CHECKSIG]), None);
    }

    #[test]
    fn script_sig_pushes_sig_then_pubkey() {
        let sig = vec![0x30; 71];
        let pubkey = vec![0x02; 33];
        let script = p2pkh_script_sig(&sig, &pubkey);

        let mut s = script.as_slice();
        assert_eq!(read_push(&mut s).unwrap(), sig);
        assert_eq!(read_push(&mut s).unwrap(), pubkey);
        assert!(s.is_empty());
    }
}
