#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(unreachable_pub)]
#![doc = include_str!("../README.md")]
//!
//! # Threading Notes
//!
//! Emission runs on the calling thread and holds no lock while a slot
//! executes. Disconnecting a slot that a concurrent emission has already
//! fetched lets it finish its in-flight run; blocking has the same accepted
//! race. See [`Signal::emit`] for the exact mid-emission rules.

mod connection;
mod signal;

pub use clapper::{
	BlockToken, Collect, Combine, IntoArgs, LastValue, PackedFn, Signature, Slot, UnboundFnError,
};

pub use self::{
	connection::{AdvancedConnection, Connection, ScopedConnection, SharedConnectionBlock},
	signal::Signal,
};

#[doc = include_str!("../README.md")]
mod readme {}
