use std::num;

use crate::Dump;

/// Implement no-op `Dump` for types which are pure data: their raw bytes in
/// the root/slice push are already the complete dumped representation.
macro_rules! impl_pure_data {
	($($ty:ty),* $(,)?) => {$(
		impl Dump for $ty {}
	)*};
}

impl_pure_data!(
	(),
	bool,
	char,
	u8,
	u16,
	u32,
	u64,
	u128,
	usize,
	i8,
	i16,
	i32,
	i64,
	i128,
	isize,
	f32,
	f64,
	num::NonZeroU8,
	num::NonZeroU16,
	num::NonZeroU32,
	num::NonZeroU64,
	num::NonZeroU128,
	num::NonZeroUsize,
	num::NonZeroI8,
	num::NonZeroI16,
	num::NonZeroI32,
	num::NonZeroI64,
	num::NonZeroI128,
	num::NonZeroIsize,
);
