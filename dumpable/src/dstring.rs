use std::{borrow::Borrow, cmp::Ordering, fmt, hash, ops, ptr, slice, str};

use crate::{
	dvec::{allocate, deallocate},
	layout::DumpSize,
	rel_ptr::DataPtr,
	Dump, Dumper,
};

/// Terminator returned for the empty string, so `as_bytes_with_nul` is valid
/// without an allocation backing it.
static EMPTY: [u8; 1] = [0];

/// Relocatable UTF-8 string.
///
/// Same dual-mode storage shape as [`DVec`](crate::DVec): an owning
/// `DString` holds its bytes on the heap; a pooled one (staged copy or
/// loaded view) reaches them through a self-relative displacement. The
/// backing bytes are always terminated by a trailing `0` at `len`, and
/// [`as_bytes_with_nul`](DString::as_bytes_with_nul) returns a valid
/// null-terminated sequence even for the empty string.
///
/// Construction copies from `&str`/`String`; there are no in-place editing
/// operations. Reading (`Deref` to `str`, comparison, display) works
/// identically in both modes.
///
/// # Example
///
/// ```
/// use dumpable::DString;
///
/// let s = DString::from("hello");
/// assert_eq!(s.len(), 5);
/// assert_eq!(&*s, "hello");
/// assert_eq!(s.as_bytes_with_nul(), b"hello\0");
/// ```
#[repr(C)]
pub struct DString {
	ptr: DataPtr<u8>,
	len: DumpSize,
	pooled: u8,
}

// Same ownership story as `DVec<u8>`.
unsafe impl Send for DString {}
unsafe impl Sync for DString {}

impl DString {
	/// Create an empty owning `DString`. Does not allocate.
	#[inline]
	pub const fn new() -> Self {
		Self {
			ptr: DataPtr::null(),
			len: 0,
			pooled: 0,
		}
	}

	/// Length in bytes, excluding the terminator.
	#[inline]
	pub fn len(&self) -> usize {
		self.len as usize
	}

	/// Returns `true` for the empty string.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.len == 0
	}

	/// String contents.
	#[inline]
	pub fn as_str(&self) -> &str {
		// Contents were copied from `&str` (or written by the dump protocol
		// from such a copy), so they are valid UTF-8.
		unsafe { str::from_utf8_unchecked(self.as_bytes()) }
	}

	/// Contents as bytes, excluding the terminator.
	#[inline]
	pub fn as_bytes(&self) -> &[u8] {
		unsafe { slice::from_raw_parts(self.data_ptr(), self.len as usize) }
	}

	/// Contents as bytes including the trailing `0`. Never empty: the empty
	/// string yields a one-byte slice holding the terminator.
	#[inline]
	pub fn as_bytes_with_nul(&self) -> &[u8] {
		unsafe { slice::from_raw_parts(self.data_ptr(), self.len as usize + 1) }
	}

	/// Release owning storage. After `clear` this is the empty owning
	/// string regardless of its previous mode.
	pub fn clear(&mut self) {
		if self.pooled == 0 && !self.ptr.is_null() {
			// Owning allocation is always `len + 1` bytes.
			unsafe { deallocate(self.ptr.owned_ptr(), self.len as usize + 1) };
		}
		self.ptr = DataPtr::null();
		self.len = 0;
		self.pooled = 0;
	}

	/// Copy `s` into this empty owning `DString`, appending the terminator.
	fn assign(&mut self, s: &str) {
		debug_assert!(self.pooled == 0 && self.len == 0);
		if s.is_empty() {
			return;
		}
		let len = s.len();
		let ptr = allocate::<u8>(len + 1);
		unsafe {
			ptr::copy_nonoverlapping(s.as_ptr(), ptr.as_ptr(), len);
			ptr.as_ptr().add(len).write(0);
		}
		self.ptr.set_owned(ptr.as_ptr());
		self.len = len as DumpSize;
	}

	#[inline]
	fn data_ptr(&self) -> *const u8 {
		if self.len == 0 {
			// Static terminator keeps `as_bytes_with_nul` valid with no
			// allocation behind it.
			return EMPTY.as_ptr();
		}
		if self.pooled != 0 {
			// Pooled invariant: displacement written by the dump protocol.
			unsafe { self.ptr.pooled_ptr() }
		} else {
			self.ptr.owned_ptr()
		}
	}
}

impl ops::Deref for DString {
	type Target = str;

	#[inline]
	fn deref(&self) -> &str {
		self.as_str()
	}
}

impl Default for DString {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}

impl Drop for DString {
	fn drop(&mut self) {
		self.clear();
	}
}

impl Clone for DString {
	/// Deep copy into a fresh owning `DString`, never aliasing.
	fn clone(&self) -> Self {
		Self::from(self.as_str())
	}
}

impl From<&str> for DString {
	fn from(s: &str) -> Self {
		let mut v = Self::new();
		v.assign(s);
		v
	}
}

impl From<&String> for DString {
	fn from(s: &String) -> Self {
		Self::from(s.as_str())
	}
}

impl From<String> for DString {
	fn from(s: String) -> Self {
		Self::from(s.as_str())
	}
}

impl PartialEq for DString {
	#[inline]
	fn eq(&self, other: &Self) -> bool {
		self.as_bytes() == other.as_bytes()
	}
}

impl Eq for DString {}

impl PartialEq<str> for DString {
	#[inline]
	fn eq(&self, other: &str) -> bool {
		self.as_bytes() == other.as_bytes()
	}
}

impl PartialEq<&str> for DString {
	#[inline]
	fn eq(&self, other: &&str) -> bool {
		self.as_bytes() == other.as_bytes()
	}
}

impl PartialOrd for DString {
	#[inline]
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		Some(self.cmp(other))
	}
}

impl Ord for DString {
	#[inline]
	fn cmp(&self, other: &Self) -> Ordering {
		self.as_str().cmp(other.as_str())
	}
}

impl hash::Hash for DString {
	#[inline]
	fn hash<H: hash::Hasher>(&self, state: &mut H) {
		self.as_str().hash(state);
	}
}

impl Borrow<str> for DString {
	#[inline]
	fn borrow(&self) -> &str {
		self.as_str()
	}
}

impl fmt::Display for DString {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

impl fmt::Debug for DString {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		fmt::Debug::fmt(self.as_str(), f)
	}
}

impl Dump for DString {
	fn dump_data(&self, dumper: &mut Dumper) {
		dumper.patch(&self.pooled, &1u8);

		if self.len == 0 {
			dumper.patch(&self.ptr, &DataPtr::null());
			return;
		}

		// Stage contents and terminator together; the loaded view's
		// `as_bytes_with_nul` reads both through one displacement.
		let ptr_addr = &self.ptr as *const DataPtr<u8> as usize;
		dumper.push_slice(self.as_bytes_with_nul(), ptr_addr);
	}
}
