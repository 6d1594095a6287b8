//! The concurrent slot registry.
//!
//! A [`SlotStore`] keeps `(id, callable, block state)` entries sorted
//! ascending by id, where id order equals registration order. All structural
//! operations serialise on one mutex, held only for the edit or for copying
//! out a single callable, never while a slot runs. Emissions therefore
//! cannot deadlock against re-entrant connects, disconnects, or nested
//! emissions from inside a slot.

use core::sync::atomic::{AtomicU64, Ordering};
use std::{
	fmt::{self, Debug, Formatter},
	num::NonZeroU64,
	sync::Arc,
};

use parking_lot::Mutex;

use crate::{
	blocking::BlockState,
	combine::Combine,
	packed::Packed,
	signature::{Signature, Slot},
};

/// Identifier of one registered slot.
///
/// Strictly positive, assigned ascending per registry, never reused, not
/// even after `remove_all`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SlotId(NonZeroU64);

impl SlotId {
	/// The raw id value.
	#[must_use]
	pub fn get(self) -> u64 {
		self.0.get()
	}
}

/// Removal surface for handles that must not know the registry's signature.
///
/// Connections hold a `Weak<dyn Disconnect>`, so a registry outliving its
/// signal is never required and a dead registry is observed as a failed
/// upgrade rather than a dangling pointer.
pub trait Disconnect: Send + Sync {
	/// Removes the slot `id` refers to. Absent ids are a silent no-op.
	fn remove(&self, id: SlotId);
}

struct SlotEntry<S: Signature> {
	id: SlotId,
	callable: Packed<S>,
	block: Arc<BlockState>,
}

/// Thread-safe ordered registry of slots sharing one signature.
pub struct SlotStore<S: Signature> {
	slots: Mutex<Vec<SlotEntry<S>>>,
	next_id: AtomicU64,
}

impl<S: Signature> SlotStore<S> {
	/// An empty registry. Ids start at 1.
	#[must_use]
	pub fn new() -> Self {
		Self {
			slots: Mutex::new(Vec::new()),
			next_id: AtomicU64::new(0),
		}
	}

	/// Registers `slot`, returning its id and blocking control.
	///
	/// The id is assigned under the lock, so ascending ids and append order
	/// stay in step even under concurrent registration.
	pub fn add<F: Slot<S>>(&self, slot: F) -> (SlotId, Arc<BlockState>) {
		let callable = Packed::new(slot);
		let block = Arc::new(BlockState::new());
		let mut slots = self.slots.lock();
		let id = SlotId(
			(self.next_id.fetch_add(1, Ordering::Relaxed) + 1)
				.try_into()
				.expect("id counter overflow"),
		);
		slots.push(SlotEntry {
			id,
			callable,
			block: Arc::clone(&block),
		});
		(id, block)
	}

	/// Removes the slot `id` refers to, preserving the relative order of the
	/// remainder. Absent ids are a silent no-op.
	pub fn remove(&self, id: SlotId) {
		let mut slots = self.slots.lock();
		if let Ok(index) = slots.binary_search_by_key(&id, |entry| entry.id) {
			slots.remove(index);
		}
	}

	/// Clears the registry. The id counter is not reset.
	pub fn remove_all(&self) {
		self.slots.lock().clear();
	}

	/// The number of currently registered slots.
	#[must_use]
	pub fn len(&self) -> usize {
		self.slots.lock().len()
	}

	/// Whether no slot is currently registered.
	#[must_use]
	pub fn is_empty(&self) -> bool {
		self.slots.lock().is_empty()
	}

	/// Copies out the current callables in id order.
	///
	/// The lock is held only for the copy, so the returned slots can be
	/// invoked freely; this is the whole-copy emission strategy. Registry
	/// changes after the copy do not affect it.
	#[must_use]
	pub fn snapshot(&self) -> Vec<ReadySlot<S>> {
		self.slots
			.lock()
			.iter()
			.map(|entry| ReadySlot {
				callable: entry.callable.clone(),
				block: Arc::clone(&entry.block),
			})
			.collect()
	}

	/// Starts an incremental walk over the registry.
	///
	/// The cursor is bounded by the highest id present right now: slots
	/// added later are never yielded, so an in-flight emission observes
	/// re-entrant additions only on the *next* emission, exactly like the
	/// whole-copy strategy. Removals are observed immediately: a slot
	/// removed before its turn is skipped.
	#[must_use]
	pub fn cursor(&self) -> SlotCursor {
		let slots = self.slots.lock();
		SlotCursor {
			expected_index: 0,
			next_id: 1,
			end_id: slots.last().map_or(0, |entry| entry.id.get()),
		}
	}

	/// Invokes all currently registered, unblocked slots in id order,
	/// folding their return values with `C`.
	///
	/// Arguments are forked (cloned or reborrowed, per the signature) for
	/// every slot except the last one reached, which receives the caller's
	/// value by move.
	pub fn invoke<C: Combine<S::Ret>>(&self, mut args: S::Args<'_>) -> C::Output {
		let mut combine = C::default();
		let mut cursor = self.cursor();
		let mut current = cursor.next(self);
		while let Some(mut slot) = current {
			match cursor.next(self) {
				Some(following) => {
					combine.fold(slot.invoke(S::fork(&mut args)));
					current = Some(following);
				}
				None => {
					combine.fold(slot.invoke(args));
					break;
				}
			}
		}
		combine.finish()
	}
}

impl<S: Signature> Default for SlotStore<S> {
	fn default() -> Self {
		Self::new()
	}
}

impl<S: Signature> Debug for SlotStore<S> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("SlotStore")
			.field("len", &self.len())
			.finish_non_exhaustive()
	}
}

impl<S: Signature> Disconnect for SlotStore<S> {
	fn remove(&self, id: SlotId) {
		SlotStore::remove(self, id);
	}
}

/// One slot captured for invocation outside the registry lock.
pub struct ReadySlot<S: Signature> {
	callable: Packed<S>,
	block: Arc<BlockState>,
}

impl<S: Signature> ReadySlot<S> {
	/// Whether the slot's block token is held right now.
	#[must_use]
	pub fn is_blocked(&self) -> bool {
		self.block.is_blocked()
	}

	/// Calls the captured callable.
	pub fn invoke(&mut self, args: S::Args<'_>) -> S::Ret {
		self.callable.invoke(args)
	}
}

/// Incremental registry walk, the alternative to [`SlotStore::snapshot`]
/// that avoids copying the whole sequence up front.
///
/// Retains `(expected_index, next_id)` across repeated short lock/unlock
/// cycles. Each step re-validates `expected_index` under the lock and falls
/// back to binary search by `next_id` if the registry shifted since the
/// previous step; blocked slots are skipped; the walk ends once no slot with
/// `next_id ≤ id ≤ end` remains.
#[derive(Debug, Clone, Copy)]
pub struct SlotCursor {
	expected_index: usize,
	next_id: u64,
	end_id: u64,
}

impl SlotCursor {
	/// Copies out the next unblocked slot at or after the cursor position,
	/// or `None` once the walk is exhausted.
	pub fn next<S: Signature>(&mut self, store: &SlotStore<S>) -> Option<ReadySlot<S>> {
		let slots = store.slots.lock();
		loop {
			if self.next_id > self.end_id {
				return None;
			}
			// Fast path: the registry did not shift since the previous step.
			let index = match slots.get(self.expected_index) {
				Some(entry) if entry.id.get() == self.next_id => self.expected_index,
				_ => slots.partition_point(|entry| entry.id.get() < self.next_id),
			};
			let entry = slots.get(index)?;
			if entry.id.get() > self.end_id {
				return None;
			}
			self.expected_index = index + 1;
			self.next_id = entry.id.get() + 1;
			if entry.block.is_blocked() {
				continue;
			}
			return Some(ReadySlot {
				callable: entry.callable.clone(),
				block: Arc::clone(&entry.block),
			});
		}
	}
}
