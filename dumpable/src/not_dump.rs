use std::ops;

use crate::{Dump, Dumper};

/// Wrapper excluding a field from dumped output.
///
/// In process, `NoDump<T>` is transparent: it derefs to `T` and takes part
/// in normal construction and mutation. When its containing value is dumped,
/// the field's footprint in the output is zeroed instead of staged, so the
/// loaded view reads as an empty/default value and whatever transient state
/// the field held never reaches the buffer.
///
/// The zeroed form must be a meaningful `T`: all of this crate's container
/// types and the primitive types read zeroed memory as their empty/zero
/// value. Do not wrap types for which all-zeroes is not a valid bit pattern
/// (e.g. `NonZero*`) if the loaded view will be read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct NoDump<T>(pub T);

impl<T> NoDump<T> {
	/// Take the wrapped value.
	#[inline]
	pub fn into_inner(self) -> T {
		self.0
	}
}

impl<T> From<T> for NoDump<T> {
	#[inline]
	fn from(value: T) -> Self {
		Self(value)
	}
}

impl<T> ops::Deref for NoDump<T> {
	type Target = T;

	#[inline]
	fn deref(&self) -> &T {
		&self.0
	}
}

impl<T> ops::DerefMut for NoDump<T> {
	#[inline]
	fn deref_mut(&mut self) -> &mut T {
		&mut self.0
	}
}

impl<T> Dump for NoDump<T> {
	fn dump_data(&self, dumper: &mut Dumper) {
		// Stage nothing; erase the raw source bytes already pushed as part
		// of the containing allocation.
		dumper.patch_zeroed(self);
	}
}
