//! # drip-core
//! Transaction, script, address, and key primitives for driplock.

pub mod address;
pub mod constants;
pub mod crypto;
pub mod error;
pub mod script;
pub mod types;
