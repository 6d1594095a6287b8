//! Type-level call signatures and the traits connecting callables to them.
//!
//! A signature is spelled as a `fn` pointer type, e.g. `fn(i32) -> bool` or
//! `fn(&mut String)`. The pointer type itself is never called; it only names
//! the parameter list and return type, the way a signature template argument
//! would elsewhere. Mismatched callables fail to satisfy [`Slot`] and are
//! rejected at compile time.

/// A type-level call signature.
///
/// Implemented for `fn` pointer types: by-value parameter lists of arity
/// 0 through 6 (each parameter `'static + Clone`), plus the single-parameter
/// reference forms `fn(&T) -> R` and `fn(&mut T) -> R`.
pub trait Signature: 'static {
	/// The return type slots produce.
	type Ret;

	/// The argument tuple slots receive.
	///
	/// `(&'a mut T,)` for the mutable-reference form; a plain owned tuple for
	/// by-value forms.
	type Args<'a>;

	/// Lends `args` to one slot invocation while retaining them for later
	/// ones.
	///
	/// By-value forms clone; reference forms reborrow, which is what lets
	/// consecutive slots observe each other's in-place mutations in order.
	fn fork<'s>(args: &'s mut Self::Args<'_>) -> Self::Args<'s>;
}

/// A callable that can be connected under signature `S`.
///
/// Blanket-implemented for every `FnMut` whose parameter list matches `S` and
/// that is `Clone + Send + 'static`. `Clone` is load-bearing: emission
/// operates on independent copies of the registered callables so the registry
/// lock never outlives a structural edit.
pub trait Slot<S: Signature>: Send + Clone + Sized + 'static {
	/// Calls the underlying callable with the unpacked arguments.
	fn call(&mut self, args: S::Args<'_>) -> S::Ret;
}

/// Conversion from ergonomic emit arguments to a signature's argument tuple.
///
/// Argument tuples convert as themselves; a lone value converts into the
/// matching single-element tuple, so `emit(10)` and `emit(&mut text)` work
/// without tuple noise.
pub trait IntoArgs<A> {
	/// Performs the conversion.
	fn into_args(self) -> A;
}

impl<T> IntoArgs<(T,)> for T {
	fn into_args(self) -> (T,) {
		(self,)
	}
}

impl<R: 'static> Signature for fn() -> R {
	type Ret = R;
	type Args<'a> = ();

	fn fork<'s>(args: &'s mut Self::Args<'_>) -> Self::Args<'s> {
		*args
	}
}

impl<F, R> Slot<fn() -> R> for F
where
	F: FnMut() -> R + Clone + Send + 'static,
	R: 'static,
{
	fn call(&mut self, (): ()) -> R {
		self()
	}
}

impl IntoArgs<()> for () {
	fn into_args(self) {}
}

macro_rules! by_value_signature {
	($($ty:ident $arg:ident),+) => {
		impl<$($ty,)+ R> Signature for fn($($ty),+) -> R
		where
			$($ty: 'static + Clone,)+
			R: 'static,
		{
			type Ret = R;
			type Args<'a> = ($($ty,)+);

			fn fork<'s>(args: &'s mut Self::Args<'_>) -> Self::Args<'s> {
				args.clone()
			}
		}

		impl<F, $($ty,)+ R> Slot<fn($($ty),+) -> R> for F
		where
			F: FnMut($($ty),+) -> R + Clone + Send + 'static,
			$($ty: 'static + Clone,)+
			R: 'static,
		{
			fn call(&mut self, ($($arg,)+): ($($ty,)+)) -> R {
				self($($arg),+)
			}
		}

		impl<$($ty),+> IntoArgs<($($ty,)+)> for ($($ty,)+) {
			fn into_args(self) -> ($($ty,)+) {
				self
			}
		}
	};
}

by_value_signature!(A1 a1);
by_value_signature!(A1 a1, A2 a2);
by_value_signature!(A1 a1, A2 a2, A3 a3);
by_value_signature!(A1 a1, A2 a2, A3 a3, A4 a4);
by_value_signature!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5);
by_value_signature!(A1 a1, A2 a2, A3 a3, A4 a4, A5 a5, A6 a6);

impl<T: 'static, R: 'static> Signature for fn(&T) -> R {
	type Ret = R;
	type Args<'a> = (&'a T,);

	fn fork<'s>(args: &'s mut Self::Args<'_>) -> Self::Args<'s> {
		(args.0,)
	}
}

impl<F, T, R> Slot<fn(&T) -> R> for F
where
	F: FnMut(&T) -> R + Clone + Send + 'static,
	T: 'static,
	R: 'static,
{
	fn call(&mut self, (arg,): (&T,)) -> R {
		self(arg)
	}
}

impl<T: 'static, R: 'static> Signature for fn(&mut T) -> R {
	type Ret = R;
	type Args<'a> = (&'a mut T,);

	fn fork<'s>(args: &'s mut Self::Args<'_>) -> Self::Args<'s> {
		(&mut *args.0,)
	}
}

impl<F, T, R> Slot<fn(&mut T) -> R> for F
where
	F: FnMut(&mut T) -> R + Clone + Send + 'static,
	T: 'static,
	R: 'static,
{
	fn call(&mut self, (arg,): (&mut T,)) -> R {
		self(arg)
	}
}
