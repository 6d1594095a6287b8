//! The user-facing signal façade.

use core::{
	fmt::{self, Debug, Formatter},
	marker::PhantomData,
};
use std::sync::{Arc, Weak};

use clapper::{Combine, Disconnect, IntoArgs, LastValue, Signature, Slot, SlotStore};
use tracing::trace;

use crate::connection::{AdvancedConnection, Connection};

/// A typed signal: one-to-many dispatch from emissions to connected slots.
///
/// `S` is the call signature, spelled as a `fn` pointer type; `C` is the
/// result combiner, defaulting to "last slot's value wins".
///
/// ```
/// use chime::Signal;
///
/// let abs_last: Signal<fn(i32) -> i32> = Signal::new();
/// let _square = abs_last.connect(|x: i32| x * x);
/// let _abs = abs_last.connect(|x: i32| x.abs());
///
/// // The later-connected slot's result wins under the default combiner.
/// assert_eq!(abs_last.emit(-4), 4);
/// ```
///
/// Cloning a `Signal` clones the *handle*: both handles share one slot
/// registry. The registry is destroyed when the last handle drops;
/// surviving connections then observe it as gone and disconnect into
/// no-ops.
pub struct Signal<S: Signature, C = LastValue<<S as Signature>::Ret>> {
	slots: Arc<SlotStore<S>>,
	_combine: PhantomData<fn() -> C>,
}

impl<S: Signature, C: Combine<S::Ret>> Signal<S, C> {
	/// A signal with no connected slots.
	#[must_use]
	pub fn new() -> Self {
		Self {
			slots: Arc::new(SlotStore::new()),
			_combine: PhantomData,
		}
	}

	/// Subscribes `slot` to emissions of this signal.
	///
	/// Slots run in connection order. The returned [`Connection`] manages
	/// the link's lifetime; dropping it does *not* disconnect (use
	/// [`ScopedConnection`](crate::ScopedConnection) for that).
	pub fn connect<F: Slot<S>>(&self, slot: F) -> Connection {
		let (id, _block) = self.slots.add(slot);
		trace!(id = id.get(), "slot connected");
		Connection::new(self.registry(), id)
	}

	/// Like [`connect`](Self::connect), returning a handle that can also
	/// temporarily block the slot.
	pub fn connect_advanced<F: Slot<S>>(&self, slot: F) -> AdvancedConnection {
		let (id, block) = self.slots.add(slot);
		trace!(id = id.get(), "slot connected");
		AdvancedConnection::new(Connection::new(self.registry(), id), block)
	}

	/// Disconnects every currently connected slot.
	pub fn disconnect_all(&self) {
		self.slots.remove_all();
		trace!("all slots disconnected");
	}

	/// The number of currently connected slots.
	#[must_use]
	pub fn slot_count(&self) -> usize {
		self.slots.len()
	}

	/// Invokes all currently connected, unblocked slots with `args`, in
	/// connection order, on the calling thread, combining their return
	/// values with `C`.
	///
	/// Single-argument signals accept the bare value (`emit(10)`,
	/// `emit(&mut text)`); others take the argument tuple. By-value
	/// arguments are cloned for each slot except the last reached, which
	/// receives the caller's value by move; mutable-reference arguments are
	/// reborrowed, so slots observe each other's mutations in order.
	///
	/// Mid-emission registry changes (from slots or other threads) follow
	/// two rules: a slot disconnected before its turn does not run, and a
	/// slot connected during the emission runs only from the next emission
	/// on. A panicking slot aborts the remaining slots of this emission and
	/// propagates to the caller; the signal stays usable.
	pub fn emit<'a>(&self, args: impl IntoArgs<S::Args<'a>>) -> C::Output {
		self.slots.invoke::<C>(args.into_args())
	}

	fn registry(&self) -> Weak<dyn Disconnect> {
		let registry: Weak<dyn Disconnect> = Arc::downgrade(&self.slots);
		registry
	}
}

impl<S: Signature, C: Combine<S::Ret>> Default for Signal<S, C> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Signature, C> Clone for Signal<S, C> {
	fn clone(&self) -> Self {
		Self {
			slots: Arc::clone(&self.slots),
			_combine: PhantomData,
		}
	}
}

impl<S: Signature, C> Debug for Signal<S, C> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Signal")
			.field("slot_count", &self.slots.len())
			.finish_non_exhaustive()
	}
}
