#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! The registry lock is only ever held for structural edits or to copy out a
//! single callable. It is **never** held while user code runs, so slots may
//! re-enter the registry (connect, disconnect, emit) without deadlocking.

mod blocking;
mod combine;
mod packed;
mod signature;
mod store;

pub use blocking::{BlockState, BlockToken};
pub use combine::{Collect, Combine, LastValue};
pub use packed::{PackedFn, UnboundFnError};
pub use signature::{IntoArgs, Signature, Slot};
pub use store::{Disconnect, ReadySlot, SlotCursor, SlotId, SlotStore};

#[doc = include_str!("../README.md")]
mod readme {}
