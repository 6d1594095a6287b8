//! Folding the return values of an emission into one result.

/// Policy merging the return values of the slots one emission invoked.
///
/// A fresh combiner is default-constructed per emission, fed every return
/// value in invocation order, and finished into the emission's result.
pub trait Combine<R>: Default {
	/// The emission's overall result type.
	type Output;

	/// Feeds one slot's return value.
	fn fold(&mut self, value: R);

	/// Produces the overall result after the last slot ran.
	fn finish(self) -> Self::Output;
}

/// The default combiner: the most recent slot's return value wins.
///
/// Yields `R::default()` when no slot ran (or every slot was blocked).
#[derive(Debug)]
pub struct LastValue<R>(Option<R>);

impl<R> Default for LastValue<R> {
	fn default() -> Self {
		Self(None)
	}
}

impl<R: Default> Combine<R> for LastValue<R> {
	type Output = R;

	fn fold(&mut self, value: R) {
		self.0 = Some(value);
	}

	fn finish(self) -> R {
		self.0.unwrap_or_default()
	}
}

/// Gathers every slot's return value, in invocation order.
#[derive(Debug)]
pub struct Collect<R>(Vec<R>);

impl<R> Default for Collect<R> {
	fn default() -> Self {
		Self(Vec::new())
	}
}

impl<R> Combine<R> for Collect<R> {
	type Output = Vec<R>;

	fn fold(&mut self, value: R) {
		self.0.push(value);
	}

	fn finish(self) -> Vec<R> {
		self.0
	}
}
