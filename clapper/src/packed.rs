//! The compact type-erased callable.
//!
//! [`PackedFn`] replaces a general-purpose boxed closure where code bloat and
//! per-callable allocations matter: captures of up to four pointer-widths are
//! stored inline in the value itself, and only larger (or over-aligned)
//! captures go through the heap. Which of the two applies is tracked by an
//! explicit discriminant, decided once per instance at construction and
//! re-decided on every clone.

use core::{
	fmt::{self, Debug, Formatter},
	marker::PhantomData,
	mem::{self, MaybeUninit},
	ptr,
};

use thiserror::Error;

use crate::signature::{IntoArgs, Signature, Slot};

/// Width of the inline capture buffer, in pointer-sized words.
const INLINE_WORDS: usize = 4;

/// Backing storage for inline captures. `usize`-aligned; anything needing
/// stricter alignment is heap-boxed instead.
type InlineBuffer = MaybeUninit<[usize; INLINE_WORDS]>;

/// Whether a value of type `T` may live in the inline buffer.
const fn fits_inline<T>() -> bool {
	mem::size_of::<T>() <= mem::size_of::<InlineBuffer>()
		&& mem::align_of::<T>() <= mem::align_of::<InlineBuffer>()
}

/// Error of calling a [`PackedFn`] that holds no callable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("call through an unbound packed function")]
pub struct UnboundFnError;

/// The capability surface of an erased callable, implemented exactly once per
/// concrete captured type by [`Thunk`].
pub(crate) trait ErasedSlot<S: Signature>: Send {
	fn invoke(&mut self, args: S::Args<'_>) -> S::Ret;

	fn clone_boxed(&self) -> Box<dyn ErasedSlot<S>>;

	/// Writes an independent copy of `self` to `dst`.
	///
	/// # Safety
	///
	/// `dst` must be valid for writes of `Self`'s size and alignment and must
	/// not overlap `self`.
	unsafe fn clone_into(&self, dst: *mut u8);
}

/// Adapter from a concrete [`Slot`] implementor to [`ErasedSlot`].
struct Thunk<S, F> {
	slot: F,
	_signature: PhantomData<fn(S) -> S>,
}

impl<S, F> Thunk<S, F> {
	fn new(slot: F) -> Self {
		Self {
			slot,
			_signature: PhantomData,
		}
	}
}

impl<S: Signature, F: Slot<S>> ErasedSlot<S> for Thunk<S, F> {
	fn invoke(&mut self, args: S::Args<'_>) -> S::Ret {
		self.slot.call(args)
	}

	fn clone_boxed(&self) -> Box<dyn ErasedSlot<S>> {
		Box::new(Self::new(self.slot.clone()))
	}

	unsafe fn clone_into(&self, dst: *mut u8) {
		// SAFETY: The caller promises `dst` is valid for a `Self`.
		unsafe { dst.cast::<Self>().write(Self::new(self.slot.clone())) };
	}
}

/// An erased callable living in the inline buffer.
///
/// The occupant is always a [`Thunk`], written in `new` or `clone` and
/// dropped in place exactly once. Moving this struct moves the buffer bytes,
/// which *is* a valid relocation of the occupant: nothing inside a `Thunk`
/// points back into the buffer.
pub(crate) struct InlineSlot<S: Signature> {
	/// Recovers the occupant as a trait object. Monomorphised per captured
	/// type; the only place the erased type is still known.
	as_dyn: unsafe fn(*mut u8) -> *mut dyn ErasedSlot<S>,
	buffer: InlineBuffer,
}

unsafe fn as_dyn_raw<S: Signature, F: Slot<S>>(occupant: *mut u8) -> *mut dyn ErasedSlot<S> {
	occupant.cast::<Thunk<S, F>>() as *mut dyn ErasedSlot<S>
}

// SAFETY: The occupant is always a `Thunk<S, F>` with `F: Slot<S>`, and
// `Slot` requires `Send`.
unsafe impl<S: Signature> Send for InlineSlot<S> {}

impl<S: Signature> InlineSlot<S> {
	fn new<F: Slot<S>>(slot: F) -> Self {
		debug_assert!(fits_inline::<Thunk<S, F>>());
		let mut buffer = InlineBuffer::uninit();
		// SAFETY: `fits_inline` vouches for size and alignment.
		unsafe {
			buffer.as_mut_ptr().cast::<Thunk<S, F>>().write(Thunk::new(slot));
		}
		Self {
			as_dyn: as_dyn_raw::<S, F>,
			buffer,
		}
	}

	fn occupant(&self) -> &dyn ErasedSlot<S> {
		let data = ptr::addr_of!(self.buffer).cast_mut().cast::<u8>();
		// SAFETY: The buffer holds a live occupant; shared access only reads.
		unsafe { &*(self.as_dyn)(data) }
	}

	fn occupant_mut(&mut self) -> &mut dyn ErasedSlot<S> {
		let data = ptr::addr_of_mut!(self.buffer).cast::<u8>();
		// SAFETY: The buffer holds a live occupant; access is exclusive
		// through `&mut self`.
		unsafe { &mut *(self.as_dyn)(data) }
	}
}

impl<S: Signature> Clone for InlineSlot<S> {
	fn clone(&self) -> Self {
		let mut buffer = InlineBuffer::uninit();
		// SAFETY: Same concrete occupant type, so the same fit decision
		// holds for the fresh buffer.
		unsafe {
			self.occupant().clone_into(buffer.as_mut_ptr().cast::<u8>());
		}
		Self {
			as_dyn: self.as_dyn,
			buffer,
		}
	}
}

impl<S: Signature> Drop for InlineSlot<S> {
	fn drop(&mut self) {
		let data = ptr::addr_of_mut!(self.buffer).cast::<u8>();
		// SAFETY: The occupant is live and dropped only here.
		unsafe { ptr::drop_in_place((self.as_dyn)(data)) };
	}
}

/// An always-bound erased callable with its storage discriminant.
pub(crate) enum Packed<S: Signature> {
	Inline(InlineSlot<S>),
	Heap(Box<dyn ErasedSlot<S>>),
}

impl<S: Signature> Packed<S> {
	pub(crate) fn new<F: Slot<S>>(slot: F) -> Self {
		if fits_inline::<Thunk<S, F>>() {
			Self::Inline(InlineSlot::new(slot))
		} else {
			Self::Heap(Box::new(Thunk::new(slot)))
		}
	}

	pub(crate) fn invoke(&mut self, args: S::Args<'_>) -> S::Ret {
		match self {
			Self::Inline(inline) => inline.occupant_mut().invoke(args),
			Self::Heap(boxed) => boxed.invoke(args),
		}
	}
}

impl<S: Signature> Clone for Packed<S> {
	fn clone(&self) -> Self {
		match self {
			Self::Inline(inline) => Self::Inline(inline.clone()),
			Self::Heap(boxed) => Self::Heap(boxed.clone_boxed()),
		}
	}
}

/// A compact boxed callable matching signature `S`.
///
/// The replacement for a general-purpose boxed closure throughout this
/// library: small captures are stored inline (no allocation), large or
/// over-aligned ones on the heap. A `PackedFn` is either *bound* (holding
/// exactly one live callable) or *unbound*; calling an unbound one reports
/// [`UnboundFnError`] rather than doing anything silently.
///
/// Replacing a bound value (by assignment) drops the old occupant before the
/// new one moves in. If the old occupant's `Drop` panics, the value is left
/// unbound, not half-replaced; there is no stronger all-or-nothing guarantee
/// across that transition.
pub struct PackedFn<S: Signature> {
	packed: Option<Packed<S>>,
}

impl<S: Signature> PackedFn<S> {
	/// Type-erases `slot`.
	///
	/// The storage decision (inline vs. heap) happens here, from the erased
	/// wrapper's size and alignment, and is re-made independently whenever
	/// the value is cloned.
	pub fn new<F: Slot<S>>(slot: F) -> Self {
		Self {
			packed: Some(Packed::new(slot)),
		}
	}

	/// The empty value. Equivalent to `Self::default()`.
	#[must_use]
	pub fn unbound() -> Self {
		Self { packed: None }
	}

	/// Whether a callable is currently held.
	#[must_use]
	pub fn is_bound(&self) -> bool {
		self.packed.is_some()
	}

	/// Calls the held callable.
	///
	/// Internal mutable state of the callable persists across successive
	/// calls on the same `PackedFn`.
	///
	/// # Errors
	///
	/// [`UnboundFnError`] if no callable is held.
	pub fn call<'a>(
		&mut self,
		args: impl IntoArgs<S::Args<'a>>,
	) -> Result<S::Ret, UnboundFnError> {
		match &mut self.packed {
			Some(packed) => Ok(packed.invoke(args.into_args())),
			None => Err(UnboundFnError),
		}
	}

	/// Moves the held callable out, leaving `self` unbound.
	#[must_use = "the moved-out callable is the only remaining handle to it"]
	pub fn take(&mut self) -> Self {
		Self {
			packed: self.packed.take(),
		}
	}

	#[cfg(test)]
	fn is_inline(&self) -> Option<bool> {
		match &self.packed {
			Some(Packed::Inline(_)) => Some(true),
			Some(Packed::Heap(_)) => Some(false),
			None => None,
		}
	}
}

impl<S: Signature> Clone for PackedFn<S> {
	fn clone(&self) -> Self {
		Self {
			packed: self.packed.clone(),
		}
	}
}

impl<S: Signature> Default for PackedFn<S> {
	fn default() -> Self {
		Self::unbound()
	}
}

impl<S: Signature> Debug for PackedFn<S> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("PackedFn")
			.field("bound", &self.is_bound())
			.finish_non_exhaustive()
	}
}
