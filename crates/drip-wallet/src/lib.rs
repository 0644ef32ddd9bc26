//! Lock stream construction and funding.
//!
//! Turns an amount and a height window into a schedule of time-locked
//! outputs, funds and signs the transaction that creates them, and builds
//! the spends that release matured outputs.
//!
//! # Modules
//!
//! - [`error`]: `WalletError` enum
//! - [`schedule`]: lock schedule calculation and time estimates
//! - [`traits`]: UTXO provider, broadcaster, and signer seams
//! - [`funding`]: fee-aware coin selection and per-address serialization
//! - [`builder`]: lock stream assembly and signing
//! - [`unlock`]: unlock spend construction
//! - [`records`]: locked output records for persistence collaborators

pub mod builder;
pub mod error;
pub mod funding;
pub mod records;
pub mod schedule;
pub mod traits;
pub mod unlock;

// Re-exports for convenient access
pub use builder::{BuiltLockTransaction, LockStreamBuilder};
pub use error::WalletError;
pub use funding::{AddressLocks, Funding, FundingSelector};
pub use records::{LockRecord, LockedOutput};
pub use schedule::{compute_schedule, LockPoint, LockSchedule};
pub use traits::{Broadcaster, Signer, UtxoProvider};
pub use unlock::{BuiltUnlockTransaction, UnlockBuilder, UnlockReference};
