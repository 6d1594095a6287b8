//! Handles for the lifetime of one signal-slot link.
//!
//! A connection holds a weak reference to the registry plus the slot's id,
//! nothing more. It never keeps the signal alive; once the signal is gone,
//! disconnecting degrades to clearing local state. Disconnecting from a
//! thread other than the emitting one is safe, but a single handle is not
//! meant to be *shared* across threads concurrently; clone it instead.

use std::sync::{Arc, Weak};

use clapper::{BlockState, BlockToken, Disconnect, SlotId};
use tracing::trace;

/// Handle capable of disconnecting one specific slot.
///
/// Cloned handles refer to the same slot; disconnecting through any of them
/// disconnects the slot, and the others keep reporting [`connected`] until
/// their own `disconnect` clears them.
///
/// [`connected`]: Self::connected
#[derive(Debug, Clone, Default)]
pub struct Connection {
	link: Option<Link>,
}

#[derive(Debug, Clone)]
struct Link {
	registry: Weak<dyn Disconnect>,
	id: SlotId,
}

impl Connection {
	pub(crate) fn new(registry: Weak<dyn Disconnect>, id: SlotId) -> Self {
		Self {
			link: Some(Link { registry, id }),
		}
	}

	/// Whether this handle still refers to a slot.
	///
	/// Purely local: this does **not** probe whether the signal (and with it
	/// the slot) is still alive.
	#[must_use]
	pub fn connected(&self) -> bool {
		self.link.is_some()
	}

	/// Removes the slot if the registry is still alive, then clears this
	/// handle. Idempotent: repeat calls, and calls on never-connected or
	/// outlived handles, are no-ops.
	pub fn disconnect(&mut self) {
		if let Some(link) = self.link.take() {
			if let Some(registry) = link.registry.upgrade() {
				registry.remove(link.id);
				trace!(id = link.id.get(), "slot disconnected");
			}
		}
	}
}

/// Single-owner connection that disconnects its slot when dropped.
///
/// Overwriting one by assignment drops (and thereby disconnects) the
/// previous value first. Not cloneable.
#[derive(Debug, Default)]
pub struct ScopedConnection {
	connection: Connection,
}

impl ScopedConnection {
	/// Whether this handle still refers to a slot. See
	/// [`Connection::connected`].
	#[must_use]
	pub fn connected(&self) -> bool {
		self.connection.connected()
	}

	/// Disconnects the slot now instead of at scope exit. See
	/// [`Connection::disconnect`].
	pub fn disconnect(&mut self) {
		self.connection.disconnect();
	}

	/// Hands the plain connection back without disconnecting, transferring
	/// that responsibility to the caller.
	#[must_use = "dropping the returned connection leaks the slot's registration"]
	pub fn release(mut self) -> Connection {
		core::mem::take(&mut self.connection)
	}
}

impl Drop for ScopedConnection {
	fn drop(&mut self) {
		self.connection.disconnect();
	}
}

impl From<Connection> for ScopedConnection {
	fn from(connection: Connection) -> Self {
		Self { connection }
	}
}

/// Connection that can additionally suppress its slot temporarily.
///
/// Blocking state lives in the connection's control block behind its own
/// lock; the registry is not involved. Obtained from
/// [`Signal::connect_advanced`](crate::Signal::connect_advanced).
#[derive(Debug, Clone)]
pub struct AdvancedConnection {
	connection: Connection,
	block: Arc<BlockState>,
}

impl AdvancedConnection {
	pub(crate) fn new(connection: Connection, block: Arc<BlockState>) -> Self {
		Self { connection, block }
	}

	/// Whether this handle still refers to a slot. See
	/// [`Connection::connected`].
	#[must_use]
	pub fn connected(&self) -> bool {
		self.connection.connected()
	}

	/// See [`Connection::disconnect`].
	pub fn disconnect(&mut self) {
		self.connection.disconnect();
	}

	/// Acquires a block token. Emissions skip the slot for as long as at
	/// least one token is alive.
	///
	/// A slot already fetched by a concurrent emission may still run once;
	/// that race is accepted.
	#[must_use = "the slot is only blocked while the token is held"]
	pub fn block(&self) -> Arc<BlockToken> {
		self.block.acquire()
	}

	/// Whether any block token for this slot is currently alive.
	#[must_use]
	pub fn is_blocked(&self) -> bool {
		self.block.is_blocked()
	}

	pub(crate) fn block_state(&self) -> &Arc<BlockState> {
		&self.block
	}
}

/// RAII holder of a block token.
///
/// While this instance (or a clone of its token) is alive and blocking, the
/// connection's slot is skipped by emissions. Dropping it, or calling
/// [`unblock`](Self::unblock), releases its token.
#[derive(Debug)]
pub struct SharedConnectionBlock {
	block: Arc<BlockState>,
	token: Option<Arc<BlockToken>>,
}

impl SharedConnectionBlock {
	/// Creates a blocker for `connection`'s slot, immediately acquiring a
	/// token iff `initially_blocked`.
	#[must_use]
	pub fn new(connection: &AdvancedConnection, initially_blocked: bool) -> Self {
		let block = Arc::clone(connection.block_state());
		let token = initially_blocked.then(|| block.acquire());
		Self { block, token }
	}

	/// Acquires a token if this instance does not hold one yet.
	pub fn block(&mut self) {
		if self.token.is_none() {
			self.token = Some(self.block.acquire());
		}
	}

	/// Releases this instance's token, if any.
	pub fn unblock(&mut self) {
		self.token = None;
	}

	/// Whether *this instance* currently holds a token. (The slot may still
	/// be blocked through other holders.)
	#[must_use]
	pub fn blocking(&self) -> bool {
		self.token.is_some()
	}
}

impl Clone for SharedConnectionBlock {
	/// The clone holds its own token iff `self` currently does.
	fn clone(&self) -> Self {
		Self {
			block: Arc::clone(&self.block),
			token: self.token.clone(),
		}
	}
}
