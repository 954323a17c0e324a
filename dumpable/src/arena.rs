use std::{
	alloc::{self, Layout},
	marker::PhantomData,
	mem, ops,
	ptr::{self, NonNull},
	slice,
};

use crate::util::align_up_to;

/// Alignment of the arena's backing allocation. Also the maximum alignment
/// of any type stored in a dumped buffer.
pub const ARENA_ALIGNMENT: usize = 16;

/// Append-only aligned byte buffer: the staging area of a dump pass, and the
/// buffer type a finished dump hands back.
///
/// The root object's bytes are written first, then every staged chunk in
/// allocation order. Concatenation order *is* the offset basis the relative
/// references depend on, so the arena never reorders or removes bytes; the
/// only in-place mutation is patching words that were already written
/// ([`write_at`](Arena::write_at)).
///
/// Padding the arena itself inserts to align a chunk is zero-filled.
/// Interior padding within pushed values is copied from the source verbatim,
/// like the rest of their bytes.
///
/// The backing allocation is aligned to [`ARENA_ALIGNMENT`], which makes
/// [`as_slice`](Arena::as_slice) a valid home for
/// [`from_dumped_buffer`](crate::from_dumped_buffer) of any type the arena
/// will accept.
pub struct Arena {
	ptr: NonNull<u8>,
	cap: usize,
	len: usize,
}

// The arena exclusively owns its allocation, like `Vec<u8>`.
unsafe impl Send for Arena {}
unsafe impl Sync for Arena {}

impl Arena {
	/// Create a new `Arena` with no pre-allocated capacity.
	#[inline]
	pub fn new() -> Self {
		Self {
			// Dangling but well-aligned; never dereferenced while `cap == 0`.
			ptr: unsafe { NonNull::new_unchecked(ARENA_ALIGNMENT as *mut u8) },
			cap: 0,
			len: 0,
		}
	}

	/// Create a new `Arena` with at least `capacity` bytes pre-allocated.
	///
	/// If the size of the output can be estimated in advance, allocating
	/// upfront avoids regrowing mid-dump.
	pub fn with_capacity(capacity: usize) -> Self {
		let mut arena = Self::new();
		if capacity > 0 {
			arena.grow_to(capacity.next_power_of_two());
		}
		arena
	}

	/// Re-home an existing byte buffer into aligned storage.
	///
	/// A dumped buffer read back from disk (or received over any byte
	/// channel) has no alignment guarantee; copying it through `from_slice`
	/// yields storage that satisfies
	/// [`from_dumped_buffer`](crate::from_dumped_buffer)'s alignment
	/// requirement.
	pub fn from_slice(bytes: &[u8]) -> Self {
		let mut arena = Self::with_capacity(bytes.len());
		// Capacity reserved above; raw byte copy needs no alignment step.
		unsafe {
			ptr::copy_nonoverlapping(bytes.as_ptr(), arena.ptr.as_ptr(), bytes.len());
			arena.len = bytes.len();
		}
		arena
	}

	/// Number of bytes written so far. This is the output position the next
	/// pushed chunk will start at (after alignment).
	#[inline]
	pub fn len(&self) -> usize {
		self.len
	}

	/// Returns `true` if nothing has been written yet.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// Current capacity in bytes.
	#[inline]
	pub fn capacity(&self) -> usize {
		self.cap
	}

	/// Ensure space for at least `additional` more bytes.
	#[inline]
	pub fn reserve(&mut self, additional: usize) {
		// Cannot wrap because capacity always exceeds len, but avoids having
		// to handle potential overflow here.
		let remaining = self.cap.wrapping_sub(self.len);
		if additional > remaining {
			self.grow_for_reserve(additional);
		}
	}

	/// Extend capacity after `reserve` has found it's necessary.
	///
	/// Kept out of line and `#[cold]` so the common already-has-capacity path
	/// of `reserve` stays small enough to inline.
	#[cold]
	fn grow_for_reserve(&mut self, additional: usize) {
		let needed = self
			.len
			.checked_add(additional)
			.expect("Cannot grow Arena further");
		self.grow_to(needed.next_power_of_two());
	}

	fn grow_to(&mut self, new_cap: usize) {
		debug_assert!(new_cap > self.cap);
		let new_cap = new_cap.max(ARENA_ALIGNMENT);

		// `Layout` is valid: `ARENA_ALIGNMENT` is a power of 2 and `new_cap`
		// was overflow-checked by the caller.
		let new_layout = Layout::from_size_align(new_cap, ARENA_ALIGNMENT).unwrap();
		let new_ptr = if self.cap == 0 {
			unsafe { alloc::alloc(new_layout) }
		} else {
			let old_layout = Layout::from_size_align(self.cap, ARENA_ALIGNMENT).unwrap();
			unsafe { alloc::realloc(self.ptr.as_ptr(), old_layout, new_cap) }
		};

		// Allocation failure is fatal by contract; nothing in a dump pass is
		// recoverable mid-way.
		let Some(new_ptr) = NonNull::new(new_ptr) else {
			alloc::handle_alloc_error(new_layout);
		};
		self.ptr = new_ptr;
		self.cap = new_cap;
	}

	/// Advance to the next position aligned for `T`, zero-filling the gap.
	#[inline(always)] // Usually a no-op after constant folding
	pub fn align_for<T>(&mut self) {
		// Compile-time rejection of types the buffer cannot host.
		let _ = AlignmentCheck::<T>::ASSERT_ALIGNMENT_DOES_NOT_EXCEED;

		if mem::align_of::<T>() > 1 {
			self.align(mem::align_of::<T>());
		}
	}

	/// Advance to the next position aligned to `alignment`, zero-filling the
	/// gap. `alignment` must be a power of 2 and at most [`ARENA_ALIGNMENT`].
	#[inline]
	fn align(&mut self, alignment: usize) {
		debug_assert!(alignment.is_power_of_two());
		debug_assert!(alignment <= ARENA_ALIGNMENT);

		let new_len = align_up_to(self.len, alignment);
		let gap = new_len - self.len;
		if gap > 0 {
			self.reserve(gap);
			// Padding must be initialized: these bytes are emitted verbatim.
			unsafe { ptr::write_bytes(self.ptr.as_ptr().add(self.len), 0, gap) };
			self.len = new_len;
		}
	}

	/// Append the raw bytes of `slice`, aligned for `T`. Returns the output
	/// position the slice's bytes start at.
	pub fn push_slice<T>(&mut self, slice: &[T]) -> usize {
		self.align_for::<T>();
		let pos = self.len;

		// Cannot overflow: a slice of more than `usize::MAX` bytes cannot exist.
		let size = mem::size_of::<T>() * slice.len();
		self.reserve(size);

		// Capacity reserved above; `pos` is aligned for `T` by `align_for`.
		unsafe {
			ptr::copy_nonoverlapping(
				slice.as_ptr() as *const u8,
				self.ptr.as_ptr().add(pos),
				size,
			);
		}
		self.len = pos + size;
		pos
	}

	/// Overwrite already-written bytes at `pos` with the raw bytes of
	/// `value`. The store is byte-wise, so `pos` need not be aligned for `T`.
	///
	/// # Safety
	///
	/// `pos..pos + size_of::<T>()` must lie within the written region
	/// (asserted), and `pos` must be the output position of a `T`-shaped
	/// field. Patching anything else corrupts the buffer.
	#[inline]
	pub unsafe fn write_at<T>(&mut self, pos: usize, value: &T) {
		let size = mem::size_of::<T>();
		assert!(pos + size <= self.len, "patch outside written region");
		ptr::copy_nonoverlapping(
			value as *const T as *const u8,
			self.ptr.as_ptr().add(pos),
			size,
		);
	}

	/// Overwrite `size` already-written bytes at `pos` with zeros.
	///
	/// # Safety
	///
	/// Same contract as [`write_at`](Arena::write_at).
	#[inline]
	pub unsafe fn zero_at(&mut self, pos: usize, size: usize) {
		assert!(pos + size <= self.len, "patch outside written region");
		ptr::write_bytes(self.ptr.as_ptr().add(pos), 0, size);
	}

	/// The written bytes.
	#[inline]
	pub fn as_slice(&self) -> &[u8] {
		// `len` bytes starting at `ptr` are always initialized: pushes copy
		// from live values and alignment gaps are zero-filled.
		unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
	}

	/// Raw pointer to the start of the buffer, aligned to
	/// [`ARENA_ALIGNMENT`].
	#[inline]
	pub fn as_ptr(&self) -> *const u8 {
		self.ptr.as_ptr()
	}
}

impl Default for Arena {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}

impl ops::Deref for Arena {
	type Target = [u8];

	#[inline]
	fn deref(&self) -> &[u8] {
		self.as_slice()
	}
}

impl Drop for Arena {
	fn drop(&mut self) {
		if self.cap > 0 {
			// Same layout the buffer was allocated with.
			let layout = Layout::from_size_align(self.cap, ARENA_ALIGNMENT).unwrap();
			unsafe { alloc::dealloc(self.ptr.as_ptr(), layout) };
		}
	}
}

/// Static assertion that types stored in a dumped buffer do not require
/// higher alignment than the buffer itself guarantees.
struct AlignmentCheck<T> {
	_marker: PhantomData<T>,
}

impl<T> AlignmentCheck<T> {
	const ASSERT_ALIGNMENT_DOES_NOT_EXCEED: () =
		assert!(mem::align_of::<T>() <= ARENA_ALIGNMENT);
}
