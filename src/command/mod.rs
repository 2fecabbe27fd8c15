//! Command module
//!
//! The input side of the ledger: the raw command contract callers submit,
//! the normalizer that turns it into an immutable validated command, and
//! the group-transfer workflow that manufactures commands in bulk.

mod group_transfer;
mod normalizer;
mod raw;

pub use group_transfer::{GroupTransfer, GroupTransferItem, GroupTransferPosition};
pub use normalizer::{normalize, Impact, MovementCommand};
pub use raw::{ImpactRequest, MovementRequest};
