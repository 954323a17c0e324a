use std::{mem, slice};

use crate::{arena::Arena, layout::DumpOffset, Dump};

/// Mapping from input address (the memory address of the allocation being
/// dumped) to output position (where that allocation's bytes landed in the
/// arena).
///
/// Exactly one mapping is live at a time: the one for the allocation whose
/// interior is currently being processed. [`Dumper`] saves and restores it
/// around nested pushes, so a reference buried arbitrarily deep in staged
/// data is always resolved against the allocation that actually contains it.
#[derive(Copy, Clone, Debug)]
pub(crate) struct PosMapping {
	input_addr: usize,
	input_len: usize,
	output_pos: usize,
}

impl PosMapping {
	#[inline]
	pub(crate) fn new(input_addr: usize, input_len: usize, output_pos: usize) -> Self {
		Self {
			input_addr,
			input_len,
			output_pos,
		}
	}

	/// Placeholder used before the root value is pushed.
	#[inline]
	pub(crate) fn dummy() -> Self {
		Self {
			input_addr: 0,
			input_len: 0,
			output_pos: 0,
		}
	}

	/// Output position of an address interior to the mapped allocation.
	///
	/// `addr` must lie within the allocation this mapping describes. That is
	/// a caller invariant: it holds by construction for addresses of fields
	/// of the value currently being dumped, and is checked against both ends
	/// of the allocation in debug builds; in release a foreign address would
	/// silently produce a garbage displacement. The upper bound is inclusive
	/// so a zero-sized field at the very end of the allocation resolves.
	#[inline]
	pub(crate) fn pos_for_addr(&self, addr: usize) -> usize {
		debug_assert!(
			addr >= self.input_addr && addr - self.input_addr <= self.input_len,
			"address outside dumped allocation"
		);
		addr - self.input_addr + self.output_pos
	}

	/// Output position of a field of the mapped allocation.
	#[inline]
	pub(crate) fn pos_for<T>(&self, value: &T) -> usize {
		self.pos_for_addr(value as *const T as usize)
	}
}

/// Serializer for one dump pass.
///
/// A `Dumper` owns the staging [`Arena`] and the current [`PosMapping`].
/// Container and reference types drive it from their [`Dump`] impls:
/// [`push_and_process_slice`](Dumper::push_and_process_slice) stages an
/// allocation's bytes and rewrites the referring field in the output to a
/// self-relative displacement; [`patch`](Dumper::patch) fixes up header
/// fields (mode flags, nulled pointers) in the staged copy.
///
/// Each `Dumper` is a self-contained value. Dumps on different threads never
/// share state.
///
/// # Example
///
/// ```
/// use dumpable::{from_dumped_buffer, DString, Dumper};
///
/// let name = DString::from("arena");
/// let mut dumper = Dumper::new();
/// dumper.dump_value(&name);
/// let buffer = dumper.into_arena();
///
/// // Safety: buffer produced by `dump_value::<DString>` above
/// let loaded: &DString = unsafe { from_dumped_buffer(&buffer) };
/// assert_eq!(loaded, "arena");
/// ```
pub struct Dumper {
	arena: Arena,
	pos_mapping: PosMapping,
}

impl Dumper {
	/// Create a new `Dumper` with no memory pre-allocated.
	#[inline]
	pub fn new() -> Self {
		Self {
			arena: Arena::new(),
			pos_mapping: PosMapping::dummy(),
		}
	}

	/// Create a new `Dumper` with at least `capacity` bytes of staging space
	/// pre-allocated.
	pub fn with_capacity(capacity: usize) -> Self {
		Self {
			arena: Arena::with_capacity(capacity),
			pos_mapping: PosMapping::dummy(),
		}
	}

	/// Dump a value and everything it references.
	///
	/// The value's own bytes become the root segment of the output; every
	/// allocation reached from it is staged behind the root in allocation
	/// order, with all reference fields rewritten to displacements.
	pub fn dump_value<T: Dump>(&mut self, value: &T) {
		self.arena.align_for::<T>();
		self.pos_mapping = PosMapping::new(
			value as *const T as usize,
			mem::size_of::<T>(),
			self.arena.len(),
		);
		self.arena.push_slice(slice::from_ref(value));
		value.dump_data(self);
	}

	/// Stage a slice reached from the field at `ptr_addr`, then process its
	/// elements.
	///
	/// `ptr_addr` is the address of the displacement field *in the source
	/// value*; it must lie within the allocation currently being dumped. The
	/// field's output copy is overwritten with the displacement from itself
	/// to the staged slice. While `process` runs, the position mapping
	/// describes the staged slice, so element fields resolve correctly; the
	/// previous mapping is restored afterwards.
	pub fn push_and_process_slice<T, P: FnOnce(&mut Self)>(
		&mut self,
		slice: &[T],
		ptr_addr: usize,
		process: P,
	) {
		debug_assert!(!slice.is_empty());
		debug_assert!(mem::size_of::<T>() != 0);

		// Resolve the referring field under the mapping of its containing
		// allocation, before the mapping is switched to the new slice.
		let mapping_before = self.pos_mapping;
		let ptr_pos = mapping_before.pos_for_addr(ptr_addr);

		self.arena.align_for::<T>();
		let target_pos = self.arena.len();

		// "Final address of new data minus final address of the requesting
		// field", both measured from the start of the output stream, so the
		// displacement survives relocation of the whole buffer.
		let offset = (target_pos - ptr_pos) as DumpOffset;
		// `ptr_pos` was written as part of an earlier push; a `DumpOffset`
		// field lives there by this method's contract.
		unsafe { self.arena.write_at(ptr_pos, &offset) };

		self.pos_mapping = PosMapping::new(
			slice.as_ptr() as usize,
			mem::size_of::<T>() * slice.len(),
			target_pos,
		);
		self.arena.push_slice(slice);
		process(self);
		self.pos_mapping = mapping_before;
	}

	/// Stage a single value reached from the field at `ptr_addr`, then
	/// process it. See
	/// [`push_and_process_slice`](Dumper::push_and_process_slice).
	#[inline]
	pub fn push_and_process<T, P: FnOnce(&mut Self)>(
		&mut self,
		value: &T,
		ptr_addr: usize,
		process: P,
	) {
		self.push_and_process_slice(slice::from_ref(value), ptr_addr, process);
	}

	/// Stage a slice whose elements need no further processing.
	#[inline]
	pub fn push_slice<T>(&mut self, slice: &[T], ptr_addr: usize) {
		self.push_and_process_slice(slice, ptr_addr, |_| {});
	}

	/// Overwrite the output copy of `field` with `value`'s bytes.
	///
	/// `field` must be a field of the allocation currently being dumped (the
	/// root value, or the slice element being processed). Used by container
	/// impls to flip the staged copy into pooled mode and to null pointer
	/// words that must not carry source addresses into the output.
	#[inline]
	pub fn patch<F>(&mut self, field: &F, value: &F) {
		let pos = self.pos_mapping.pos_for(field);
		// `pos` is the output copy of `field`, pushed earlier in this pass.
		unsafe { self.arena.write_at(pos, value) };
	}

	/// Overwrite the output copy of `field` with zeros.
	#[inline]
	pub fn patch_zeroed<F>(&mut self, field: &F) {
		let pos = self.pos_mapping.pos_for(field);
		// `pos` is the output copy of `field`, pushed earlier in this pass.
		unsafe { self.arena.zero_at(pos, mem::size_of::<F>()) };
	}

	/// Current output position.
	#[inline]
	pub fn pos(&self) -> usize {
		self.arena.len()
	}

	/// Finish the pass and take the output buffer.
	#[inline]
	pub fn into_arena(self) -> Arena {
		self.arena
	}
}

impl Default for Dumper {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}
