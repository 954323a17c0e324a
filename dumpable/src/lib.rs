//! Zero-copy, position-independent serialization.
//!
//! A value built from this crate's relocatable types ([`DVec`], [`DString`],
//! [`DMap`], [`RelPtr`]) can be dumped to a byte buffer and later
//! reinterpreted *in place* as a live `&T` at any base address, with no
//! parse pass. Every reference in the buffer is stored as a signed displacement
//! from its own location, so the whole blob stays valid when memory-mapped,
//! copied, or loaded into another process.
//!
//! # Example
//!
//! ```
//! use dumpable::{dump, from_dumped_buffer, DString, DVec, Dump};
//!
//! #[derive(Dump)]
//! #[repr(C)]
//! struct Record {
//! 	name: DString,
//! 	scores: DVec<u32>,
//! }
//!
//! let record = Record {
//! 	name: DString::from("Alice"),
//! 	scores: DVec::from(vec![90, 85, 99]),
//! };
//!
//! let buffer = dump(&record);
//! drop(record); // the buffer is self-contained
//!
//! // Safety: `buffer` was produced by `dump::<Record>` on this platform
//! let loaded: &Record = unsafe { from_dumped_buffer(&buffer) };
//! assert_eq!(loaded.name, "Alice");
//! assert_eq!(loaded.scores.as_slice(), &[90, 85, 99]);
//! ```
//!
//! # Output format
//!
//! `[root object bytes][staged chunks, in allocation order]`, with
//! zero-filled alignment padding between chunks. No magic number, no schema
//! hash, no endianness marker: the format is the root type's in-memory
//! layout on the writing platform, and the load path trusts the buffer
//! completely. Enable the `compatible_layout` feature to pin header fields
//! at 8 bytes across 32- and 64-bit builds.
//!
//! Tag dumped types `#[repr(C)]` if buffers must be readable by a different
//! binary than the one that wrote them.

#[cfg(feature = "derive")]
pub use dumpable_derive::Dump;

mod arena;
pub use arena::{Arena, ARENA_ALIGNMENT};

mod dumper;
pub use dumper::Dumper;

mod layout;
pub use layout::{DumpOffset, DumpSize};

mod rel_ptr;
pub use rel_ptr::RelPtr;

mod dvec;
pub use dvec::DVec;

mod dstring;
pub use dstring::DString;

mod dmap;
pub use dmap::DMap;

mod not_dump;
pub use not_dump::NoDump;

mod impls;
mod util;

use std::{io, mem};

/// Types which can be dumped to a relocatable buffer.
///
/// `dump_data` stages everything the value references and patches the
/// value's output copy; the value's own bytes are pushed by the caller
/// ([`Dumper::dump_value`] for the root, the containing slice push for
/// nested values). Leaf types whose bytes are already position-independent
/// use the default no-op body.
///
/// Derive this with `#[derive(Dump)]`, which dumps every field in order.
/// Hand-written impls that pass wrong field addresses produce a garbage
/// buffer (loading one is undefined behavior), so prefer the derive.
pub trait Dump {
	#[allow(unused_variables)]
	#[inline]
	fn dump_data(&self, dumper: &mut Dumper) {}
}

/// Dump a foreign type through a proxy.
///
/// For fields whose type cannot implement [`Dump`] itself, implement
/// `DumpWith<Field>` on a proxy type and annotate the field with
/// `#[dump_with(Proxy)]`.
pub trait DumpWith<T> {
	fn dump_data_with(value: &T, dumper: &mut Dumper);
}

/// Dump `value` and everything it references into a relocatable buffer.
///
/// The returned [`Arena`] derefs to the output bytes and satisfies
/// [`from_dumped_buffer`]'s alignment requirement, so it can be loaded
/// directly or emitted to any sink.
pub fn dump<T: Dump>(value: &T) -> Arena {
	let mut dumper = Dumper::new();
	dumper.dump_value(value);
	dumper.into_arena()
}

/// Dump `value` and write the buffer to `writer`.
///
/// The only failure path is the sink's own: the dump itself raises no
/// errors.
pub fn write<T: Dump, W: io::Write>(value: &T, writer: &mut W) -> io::Result<()> {
	writer.write_all(dump(value).as_slice())
}

/// Reinterpret the first bytes of `buffer` as a `&T`. O(1), no copy, no
/// validation.
///
/// The result is valid for as long as `buffer`'s memory stays alive and
/// unmoved. The buffer may be relocated as a whole unit (one `memcpy`/`mmap`
/// of the entire blob) and loaded again at the new address; splitting it or
/// growing it in place invalidates interior displacements.
///
/// # Safety
///
/// * `buffer` must hold output produced by [`dump`]/[`write`] for this exact
///   `T`, by a matching build on a matching platform. Nothing is checked:
///   loading a foreign, truncated or corrupted buffer is undefined behavior.
/// * `buffer.as_ptr()` must be aligned to `align_of::<T>()`. A buffer read
///   back from a byte channel can be re-homed with [`Arena::from_slice`].
pub unsafe fn from_dumped_buffer<T>(buffer: &[u8]) -> &T {
	debug_assert!(buffer.len() >= mem::size_of::<T>());
	debug_assert!(util::is_aligned_to(
		buffer.as_ptr() as usize,
		mem::align_of::<T>()
	));
	&*(buffer.as_ptr() as *const T)
}
