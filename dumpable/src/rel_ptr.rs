use std::{fmt, marker::PhantomData, ptr};

use crate::{layout::DumpOffset, Dump, Dumper};

/// A reference stored as a signed byte displacement from its own address.
///
/// `RelPtr` is the building block of dumped buffers: because the displacement
/// is measured from the `RelPtr`'s own storage location, a whole memory block
/// containing both the `RelPtr` and its referent stays internally consistent
/// when relocated to any other base address.
///
/// A displacement of 0 means null, so zeroed memory reads as a null `RelPtr`.
///
/// A `RelPtr` is meaningful only at the address it was written at, so it is
/// deliberately neither `Clone` nor `Copy`: a bitwise copy at a different
/// address would silently retarget the reference. Dumping a `RelPtr` stages a
/// fresh copy of its referent instead (see the [`Dump`] impl below).
///
/// # Example
///
/// ```
/// use dumpable::RelPtr;
///
/// struct Node {
/// 	value: u32,
/// 	next: RelPtr<Node>,
/// }
///
/// let mut a = Node { value: 1, next: RelPtr::null() };
/// let b = Node { value: 2, next: RelPtr::null() };
///
/// // Safety: `a` and `b` live (and stay put) for the whole scope
/// unsafe {
/// 	a.next.set(&b);
/// 	assert_eq!(a.next.as_ref().unwrap().value, 2);
/// }
/// ```
#[repr(transparent)]
pub struct RelPtr<T> {
	offset: DumpOffset,
	_marker: PhantomData<*const T>,
}

impl<T> RelPtr<T> {
	/// Create a null `RelPtr`.
	#[inline]
	pub const fn null() -> Self {
		Self {
			offset: 0,
			_marker: PhantomData,
		}
	}

	/// Returns `true` if this reference is null.
	#[inline]
	pub fn is_null(&self) -> bool {
		self.offset == 0
	}

	/// Point this reference at `target`, storing the displacement
	/// `target - address_of(self)`. A null `target` stores 0.
	///
	/// # Safety
	///
	/// The link is only valid while neither `self` nor the referent moves.
	/// `target` must not equal the address of `self` (displacement 0 is the
	/// null encoding).
	#[inline]
	pub unsafe fn set(&mut self, target: *const T) {
		if target.is_null() {
			self.offset = 0;
		} else {
			let diff = (target as usize).wrapping_sub(self as *mut Self as usize);
			debug_assert!(diff != 0, "a RelPtr cannot point at itself");
			self.offset = diff as DumpOffset;
		}
	}

	/// Resolve this reference to a raw pointer.
	///
	/// Returns a null pointer for a null reference, otherwise
	/// `address_of(self) + displacement`, with no bounds checking.
	///
	/// # Safety
	///
	/// The displacement must have been produced by [`set`](RelPtr::set) at
	/// this address, or by the dump protocol for a buffer containing `self`.
	#[inline]
	pub unsafe fn as_ptr(&self) -> *const T {
		if self.offset == 0 {
			ptr::null()
		} else {
			(self as *const Self as *const u8).offset(self.offset as isize) as *const T
		}
	}

	/// Resolve this reference to `Option<&T>`.
	///
	/// # Safety
	///
	/// Same contract as [`as_ptr`](RelPtr::as_ptr), and the referent must be
	/// a live `T` for the returned lifetime.
	#[inline]
	pub unsafe fn as_ref(&self) -> Option<&T> {
		self.as_ptr().as_ref()
	}
}

impl<T> Default for RelPtr<T> {
	#[inline]
	fn default() -> Self {
		Self::null()
	}
}

impl<T> fmt::Debug for RelPtr<T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("RelPtr").field("offset", &self.offset).finish()
	}
}

impl<T: Dump> Dump for RelPtr<T> {
	fn dump_data(&self, dumper: &mut Dumper) {
		// Offset 0 is position-independent as-is, so a null source needs no
		// fixup in the output copy.
		if self.is_null() {
			return;
		}

		// The referent of a ZST carries no bytes to stage. Null the output
		// copy rather than leave it holding the source's displacement.
		if std::mem::size_of::<T>() == 0 {
			dumper.patch(&self.offset, &0);
			return;
		}

		// The source graph was linked with `RelPtr::set`, whose contract
		// keeps the referent alive and in place for the link's lifetime.
		let value = unsafe { &*self.as_ptr() };
		let ptr_addr = self as *const Self as usize;
		dumper.push_and_process(value, ptr_addr, |dumper| value.dump_data(dumper));
	}
}

/// Backing-storage word of the dual-mode containers.
///
/// Owning containers hold an absolute heap address here (Rust moves are
/// bitwise, so a self-relative offset could not survive a move of an owning
/// value). Pooled containers (staged copies in an arena, and views inside a
/// loaded buffer) hold a self-relative displacement, the same encoding as
/// [`RelPtr`]. The container's `pooled` flag selects the interpretation.
#[repr(transparent)]
pub(crate) struct DataPtr<T> {
	bits: DumpOffset,
	_marker: PhantomData<*const T>,
}

impl<T> DataPtr<T> {
	#[inline]
	pub(crate) const fn null() -> Self {
		Self {
			bits: 0,
			_marker: PhantomData,
		}
	}

	#[inline]
	pub(crate) fn is_null(&self) -> bool {
		self.bits == 0
	}

	/// Store an absolute heap address (owning mode).
	#[inline]
	pub(crate) fn set_owned(&mut self, ptr: *mut T) {
		self.bits = ptr as usize as DumpOffset;
	}

	/// Read back the absolute heap address (owning mode only).
	#[inline]
	pub(crate) fn owned_ptr(&self) -> *mut T {
		self.bits as usize as *mut T
	}

	/// Resolve the self-relative displacement (pooled mode only).
	///
	/// # Safety
	///
	/// `self` must be pooled: either a staged copy whose displacement was
	/// written by the dump protocol, or part of a loaded buffer.
	#[inline]
	pub(crate) unsafe fn pooled_ptr(&self) -> *const T {
		debug_assert!(self.bits != 0);
		(self as *const Self as *const u8).offset(self.bits as isize) as *const T
	}
}

impl<T> fmt::Debug for DataPtr<T> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_struct("DataPtr").field("bits", &self.bits).finish()
	}
}
