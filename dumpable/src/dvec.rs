use std::{
	alloc::{self, Layout},
	fmt, mem, ops,
	ptr::{self, NonNull},
	slice,
};

use crate::{layout::DumpSize, rel_ptr::DataPtr, Dump, Dumper};

/// Allocate an array of `cap` `T`s. Allocation failure is fatal.
pub(crate) fn allocate<T>(cap: usize) -> NonNull<T> {
	debug_assert!(cap > 0 && mem::size_of::<T>() > 0);
	let layout = Layout::array::<T>(cap).expect("allocation too large");
	let ptr = unsafe { alloc::alloc(layout) };
	match NonNull::new(ptr as *mut T) {
		Some(ptr) => ptr,
		None => alloc::handle_alloc_error(layout),
	}
}

/// Free an array previously obtained from [`allocate`] with the same `cap`.
pub(crate) unsafe fn deallocate<T>(ptr: *mut T, cap: usize) {
	debug_assert!(cap > 0 && mem::size_of::<T>() > 0);
	let layout = Layout::array::<T>(cap).expect("allocation too large");
	alloc::dealloc(ptr as *mut u8, layout);
}

/// Relocatable dynamic array.
///
/// A `DVec` operates in one of two modes, recorded in its `pooled` flag:
///
/// * **Owning**: the normal heap-backed value used to build data in
///   process. Supports mutation ([`push`](DVec::push),
///   [`resize`](DVec::resize), [`clear`](DVec::clear)); releases its storage
///   on drop.
/// * **Pooled**: a staged copy inside a dump pass, or a view inside a
///   loaded buffer. Its storage word is a self-relative displacement, so the
///   containing buffer can be relocated freely. Pooled storage belongs to
///   the arena/buffer, is immutable, and is not touched on drop.
///
/// Only pooled instances ever appear in dumped output; the dump pass flips
/// the flag in the staged copy. User code never constructs a pooled `DVec`
/// directly.
///
/// Owning capacity is derived, not stored: every owning allocation holds
/// exactly `max(8, len.next_power_of_two())` elements (none when empty).
/// Growth therefore doubles from the next power of two, and shrinking
/// operations re-allocate down to the policy size.
///
/// Reading (`Deref` to `[T]`, iteration, indexing) works identically in both
/// modes.
///
/// # Example
///
/// ```
/// use dumpable::DVec;
///
/// let mut v = DVec::from(vec![1u32, 2, 3]);
/// v.push(4);
/// assert_eq!(v.as_slice(), &[1, 2, 3, 4]);
/// ```
#[repr(C)]
pub struct DVec<T> {
	ptr: DataPtr<T>,
	len: DumpSize,
	pooled: u8,
}

// An owning `DVec` owns its elements like `Vec<T>`; a pooled one is a
// read-only view into bytes it does not free.
unsafe impl<T: Send> Send for DVec<T> {}
unsafe impl<T: Sync> Sync for DVec<T> {}

impl<T> DVec<T> {
	/// Create an empty owning `DVec`. Does not allocate.
	#[inline]
	pub const fn new() -> Self {
		Self {
			ptr: DataPtr::null(),
			len: 0,
			pooled: 0,
		}
	}

	/// Owning allocation size for a vector of `len` elements.
	#[inline]
	fn capacity_for(len: usize) -> usize {
		if len == 0 {
			0
		} else {
			len.next_power_of_two().max(8)
		}
	}

	/// Copy `slice` into a freshly allocated owning `DVec`.
	pub fn from_slice(slice: &[T]) -> Self
	where T: Clone {
		let mut v = Self::new();
		v.assign(slice);
		v
	}

	/// Contents as a slice. Works in both modes.
	#[inline]
	pub fn as_slice(&self) -> &[T] {
		// Invariant: `data_ptr` addresses `len` live `T`s (or is a dangling
		// well-aligned pointer when `len == 0` / `T` is zero-sized).
		unsafe { slice::from_raw_parts(self.data_ptr(), self.len as usize) }
	}

	/// Append an element. Owning mode only.
	///
	/// # Panics
	///
	/// Panics if this `DVec` is arena-backed (staged or loaded).
	pub fn push(&mut self, value: T) {
		self.assert_owning();
		let len = self.len as usize;
		if mem::size_of::<T>() != 0 && len == Self::capacity_for(len) {
			self.grow(Self::capacity_for(len + 1));
		}
		// Slot `len` is within the (possibly new) allocation.
		unsafe { self.data_ptr_mut().add(len).write(value) };
		self.len = (len + 1) as DumpSize;
	}

	/// Resize to `new_len` elements, filling new slots with clones of
	/// `value`. Owning mode only.
	///
	/// # Panics
	///
	/// Panics if this `DVec` is arena-backed (staged or loaded).
	pub fn resize(&mut self, new_len: usize, value: T)
	where T: Clone {
		self.assert_owning();
		let len = self.len as usize;
		if new_len < len {
			// Drop the tail, then re-allocate down so the allocation size
			// stays derivable from `len`.
			unsafe {
				ptr::drop_in_place(slice::from_raw_parts_mut(
					self.data_ptr_mut().add(new_len),
					len - new_len,
				));
			}
			if mem::size_of::<T>() != 0 {
				let old_cap = Self::capacity_for(len);
				let new_cap = Self::capacity_for(new_len);
				if new_cap == 0 {
					unsafe { deallocate(self.ptr.owned_ptr(), old_cap) };
					self.ptr = DataPtr::null();
				} else if new_cap != old_cap {
					let new_ptr = allocate::<T>(new_cap);
					unsafe {
						ptr::copy_nonoverlapping(self.ptr.owned_ptr(), new_ptr.as_ptr(), new_len);
						deallocate(self.ptr.owned_ptr(), old_cap);
					}
					self.ptr.set_owned(new_ptr.as_ptr());
				}
			}
			self.len = new_len as DumpSize;
		} else if new_len > len {
			if mem::size_of::<T>() != 0 && Self::capacity_for(new_len) != Self::capacity_for(len) {
				self.grow(Self::capacity_for(new_len));
			}
			for i in len..new_len {
				unsafe { self.data_ptr_mut().add(i).write(value.clone()) };
			}
			self.len = new_len as DumpSize;
		}
	}

	/// Drop all elements and release owning storage. After `clear` the
	/// `DVec` is an empty owning vector regardless of its previous mode
	/// (pooled storage is left to its arena/buffer).
	pub fn clear(&mut self) {
		if self.pooled == 0 && self.len != 0 {
			let len = self.len as usize;
			unsafe {
				ptr::drop_in_place(slice::from_raw_parts_mut(self.data_ptr_mut(), len));
				if mem::size_of::<T>() != 0 {
					deallocate(self.ptr.owned_ptr(), Self::capacity_for(len));
				}
			}
		}
		self.ptr = DataPtr::null();
		self.len = 0;
		self.pooled = 0;
	}

	/// Copy `slice` into this empty owning `DVec`.
	fn assign(&mut self, slice: &[T])
	where T: Clone {
		debug_assert!(self.pooled == 0 && self.len == 0);
		if slice.is_empty() {
			return;
		}
		if mem::size_of::<T>() != 0 {
			let ptr = allocate::<T>(Self::capacity_for(slice.len()));
			self.ptr.set_owned(ptr.as_ptr());
		}
		for (i, value) in slice.iter().enumerate() {
			unsafe { self.data_ptr_mut().add(i).write(value.clone()) };
		}
		self.len = slice.len() as DumpSize;
	}

	/// Move live elements into a fresh allocation of `new_cap` elements.
	fn grow(&mut self, new_cap: usize) {
		debug_assert!(self.pooled == 0 && mem::size_of::<T>() != 0);
		let len = self.len as usize;
		let new_ptr = allocate::<T>(new_cap);
		if !self.ptr.is_null() {
			// Bitwise relocation is exactly a Rust move of each live
			// element; the old allocation is freed without running drops.
			unsafe {
				ptr::copy_nonoverlapping(self.ptr.owned_ptr(), new_ptr.as_ptr(), len);
				deallocate(self.ptr.owned_ptr(), Self::capacity_for(len));
			}
		}
		self.ptr.set_owned(new_ptr.as_ptr());
	}

	#[inline]
	fn data_ptr(&self) -> *const T {
		if mem::size_of::<T>() == 0 || self.len == 0 {
			return NonNull::dangling().as_ptr();
		}
		if self.pooled != 0 {
			// Pooled invariant: displacement written by the dump protocol.
			unsafe { self.ptr.pooled_ptr() }
		} else {
			self.ptr.owned_ptr()
		}
	}

	/// Mutable element pointer. Owning mode only.
	#[inline]
	fn data_ptr_mut(&mut self) -> *mut T {
		debug_assert!(self.pooled == 0);
		if mem::size_of::<T>() == 0 {
			NonNull::dangling().as_ptr()
		} else {
			self.ptr.owned_ptr()
		}
	}

	#[inline]
	fn assert_owning(&self) {
		assert!(self.pooled == 0, "cannot mutate an arena-backed DVec");
	}
}

impl<T> ops::Deref for DVec<T> {
	type Target = [T];

	#[inline]
	fn deref(&self) -> &[T] {
		self.as_slice()
	}
}

impl<T> Default for DVec<T> {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}

impl<T> Drop for DVec<T> {
	fn drop(&mut self) {
		self.clear();
	}
}

impl<T: Clone> Clone for DVec<T> {
	/// Deep copy into a fresh owning `DVec`, never aliasing.
	fn clone(&self) -> Self {
		Self::from_slice(self.as_slice())
	}
}

impl<T: Clone> From<&[T]> for DVec<T> {
	fn from(slice: &[T]) -> Self {
		Self::from_slice(slice)
	}
}

impl<T: Clone> From<&Vec<T>> for DVec<T> {
	fn from(vec: &Vec<T>) -> Self {
		Self::from_slice(vec.as_slice())
	}
}

impl<T> From<Vec<T>> for DVec<T> {
	/// Move the elements of `vec` into a fresh owning `DVec`.
	fn from(vec: Vec<T>) -> Self {
		let mut v = Self::new();
		if vec.is_empty() {
			return v;
		}
		let len = vec.len();
		if mem::size_of::<T>() != 0 {
			let ptr = allocate::<T>(Self::capacity_for(len));
			// Elements are moved out bitwise; `vec` then frees only its
			// (now logically empty) buffer.
			unsafe { ptr::copy_nonoverlapping(vec.as_ptr(), ptr.as_ptr(), len) };
			v.ptr.set_owned(ptr.as_ptr());
		}
		v.len = len as DumpSize;
		let mut vec = vec;
		unsafe { vec.set_len(0) };
		v
	}
}

impl<T> FromIterator<T> for DVec<T> {
	fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
		iter.into_iter().collect::<Vec<T>>().into()
	}
}

impl<'a, T> IntoIterator for &'a DVec<T> {
	type Item = &'a T;
	type IntoIter = slice::Iter<'a, T>;

	#[inline]
	fn into_iter(self) -> Self::IntoIter {
		self.as_slice().iter()
	}
}

impl<T: PartialEq> PartialEq for DVec<T> {
	fn eq(&self, other: &Self) -> bool {
		self.as_slice() == other.as_slice()
	}
}

impl<T: Eq> Eq for DVec<T> {}

impl<T: fmt::Debug> fmt::Debug for DVec<T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_list().entries(self.as_slice()).finish()
	}
}

impl<T: Dump> Dump for DVec<T> {
	fn dump_data(&self, dumper: &mut Dumper) {
		// The staged copy is arena-backed: its storage word becomes a
		// self-relative displacement and must never be freed or mutated.
		dumper.patch(&self.pooled, &1u8);

		if mem::size_of::<T>() == 0 || self.len == 0 {
			// No bytes to stage; null the storage word rather than carry a
			// source address into the output.
			dumper.patch(&self.ptr, &DataPtr::null());
			return;
		}

		let ptr_addr = &self.ptr as *const DataPtr<T> as usize;
		dumper.push_and_process_slice(self.as_slice(), ptr_addr, |dumper| {
			for value in self.as_slice() {
				value.dump_data(dumper);
			}
		});
	}
}
