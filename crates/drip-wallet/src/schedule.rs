//! Lock schedule calculation.
//!
//! Splits a total value across evenly spaced unlock heights. The number of
//! points is `floor(span / interval)` and every point carries
//! `floor(total / points)` satoshis; any division remainder is deliberately
//! not locked (it stays with the payer as change or fee headroom).

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use drip_core::constants::{BLOCK_TIME_SECS, MIN_LOCK_VALUE};

use crate::error::WalletError;

/// A single unlock point: height at which `value` becomes spendable.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct LockPoint {
    /// Block height at which the locked value becomes spendable.
    pub unlock_height: u32,
    /// Value locked until that height, in satoshis.
    pub value: u64,
}

/// An ordered series of lock points, ascending by height.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct LockSchedule {
    points: Vec<LockPoint>,
}

impl LockSchedule {
    /// The lock points in ascending height order.
    pub fn points(&self) -> &[LockPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Sum of all locked values. The schedule is built with checked
    /// arithmetic, so this cannot overflow.
    pub fn total_locked(&self) -> u64 {
        self.points.iter().map(|p| p.value).sum()
    }

    /// Height of the earliest unlock, if any.
    pub fn first_unlock_height(&self) -> Option<u32> {
        self.points.first().map(|p| p.unlock_height)
    }

    /// Height of the final unlock, if any.
    pub fn last_unlock_height(&self) -> Option<u32> {
        self.points.last().map(|p| p.unlock_height)
    }
}

impl<'a> IntoIterator for &'a LockSchedule {
    type Item = &'a LockPoint;
    type IntoIter = std::slice::Iter<'a, LockPoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}

/// Compute the lock schedule for a total value over a height window.
///
/// Points sit at `start_height + i * interval` for `i` in
/// `1..=floor(span / interval)`, each carrying `total / points` satoshis
/// (floor division, remainder unlocked). Fails with `InvalidInterval` when
/// the interval is zero or exceeds the span, and with `InvalidLock` when a
/// point would carry less than [`MIN_LOCK_VALUE`].
pub fn compute_schedule(
    total_value: u64,
    start_height: u32,
    end_height: u32,
    interval: u32,
) -> Result<LockSchedule, WalletError> {
    let span = end_height.saturating_sub(start_height);
    if interval == 0 || interval > span {
        return Err(WalletError::InvalidInterval { interval, span });
    }

    let num_points = span / interval;
    let value_per_point = total_value / num_points as u64;
    if value_per_point < MIN_LOCK_VALUE {
        return Err(WalletError::InvalidLock {
            value: value_per_point,
            min: MIN_LOCK_VALUE,
        });
    }

    let points = (1..=num_points)
        .map(|i| LockPoint {
            unlock_height: start_height + i * interval,
            value: value_per_point,
        })
        .collect();
    Ok(LockSchedule { points })
}

/// Rough wall-clock duration for a number of blocks, at the target block time.
pub fn estimate_duration(blocks: u32) -> Duration {
    Duration::seconds(blocks as i64 * BLOCK_TIME_SECS as i64)
}

/// Estimated wall-clock time at which `unlock_height` is reached, given the
/// current height and time.
pub fn estimate_unlock_time(
    now: DateTime<Utc>,
    current_height: u32,
    unlock_height: u32,
) -> DateTime<Utc> {
    now + estimate_duration(unlock_height.saturating_sub(current_height))
}
