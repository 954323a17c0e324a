use std::{collections::BTreeMap, mem};

use dumpable::{
	dump, from_dumped_buffer, write, Arena, DMap, DString, DVec, Dump, Dumper, NoDump, RelPtr,
};

mod common;
use common::{generate_school, Class, School, Student};

#[test]
fn load_after_source_dropped() {
	let mut enrollment_years = BTreeMap::new();
	enrollment_years.insert(DString::from("alice"), 2021u32);
	enrollment_years.insert(DString::from("bob"), 2022);

	let class = Class {
		name: DString::from("algebra"),
		room: 101,
		students: DVec::from(vec![
			Student {
				name: DString::from("alice"),
				id: 1,
				scores: DVec::from(vec![90u16, 85, 99]),
			},
			Student {
				name: DString::from("bob"),
				id: 2,
				scores: DVec::new(),
			},
		]),
		enrollment_years: DMap::from(enrollment_years),
	};

	let buffer = dump(&class);
	drop(class);

	let loaded: &Class = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.name, "algebra");
	assert_eq!(loaded.room, 101);
	assert_eq!(loaded.students.len(), 2);
	assert_eq!(loaded.students[0].name, "alice");
	assert_eq!(loaded.students[0].scores.as_slice(), &[90, 85, 99]);
	assert_eq!(loaded.students[1].name, "bob");
	assert!(loaded.students[1].scores.is_empty());
	assert_eq!(loaded.enrollment_years.get("alice"), Some(&2021));
	assert_eq!(loaded.enrollment_years.get("bob"), Some(&2022));
	assert_eq!(loaded.enrollment_years.get("mallory"), None);
}

#[test]
fn buffer_relocates() {
	let school = generate_school();
	let buffer = dump(&school);

	// Round trip through a plain byte vec, as if written to disk and read
	// back. `from_slice` re-homes the bytes into aligned storage.
	let bytes: Vec<u8> = buffer.as_slice().to_vec();
	drop(buffer);

	let arena = Arena::from_slice(&bytes);
	let loaded: &School = unsafe { from_dumped_buffer(&arena) };
	assert_eq!(loaded, &school);

	// A second home at a different address reads identically
	let arena2 = Arena::from_slice(&bytes);
	let loaded2: &School = unsafe { from_dumped_buffer(&arena2) };
	assert_ne!(arena.as_ptr(), arena2.as_ptr());
	assert_eq!(loaded2, loaded);

	// Map lookups work against the loaded view
	let class = &loaded.classes[0];
	for (key, year) in class.enrollment_years.iter() {
		assert_eq!(class.enrollment_years.get(key.as_str()), Some(year));
		assert_eq!(class.enrollment_years.count(key.as_str()), 1);
	}
}

#[test]
fn write_matches_dump() {
	let school = generate_school();

	let mut sink: Vec<u8> = Vec::new();
	write(&school, &mut sink).unwrap();

	assert_eq!(sink.as_slice(), dump(&school).as_slice());
}

#[test]
fn empty_containers() {
	#[derive(Dump, Debug, PartialEq)]
	#[repr(C)]
	struct Empties {
		name: DString,
		items: DVec<u32>,
		map: DMap<u32, u32>,
	}

	let buffer = dump(&Empties {
		name: DString::new(),
		items: DVec::new(),
		map: DMap::new(),
	});

	// Nothing to stage beyond the root object itself
	assert_eq!(buffer.len(), mem::size_of::<Empties>());

	let loaded: &Empties = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.name.as_str(), "");
	assert_eq!(loaded.name.as_bytes_with_nul(), &[0]);
	assert!(loaded.items.is_empty());
	assert!(loaded.map.is_empty());
	assert_eq!(loaded.map.get(&1), None);
}

#[test]
fn rel_ptr_chain() {
	#[derive(Dump)]
	#[repr(C)]
	struct Node {
		value: u32,
		next: RelPtr<Node>,
	}

	let tail = Node {
		value: 3,
		next: RelPtr::null(),
	};
	let mut mid = Node {
		value: 2,
		next: RelPtr::null(),
	};
	unsafe { mid.next.set(&tail) };
	let mut head = Node {
		value: 1,
		next: RelPtr::null(),
	};
	unsafe { head.next.set(&mid) };

	let buffer = dump(&head);
	drop(head);
	drop(mid);
	drop(tail);

	let loaded: &Node = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.value, 1);
	let second = unsafe { loaded.next.as_ref() }.unwrap();
	assert_eq!(second.value, 2);
	let third = unsafe { second.next.as_ref() }.unwrap();
	assert_eq!(third.value, 3);
	assert!(third.next.is_null());
	assert!(unsafe { third.next.as_ref() }.is_none());
}

#[test]
fn no_dump_field_zeroed() {
	#[derive(Dump)]
	#[repr(C)]
	struct Cached {
		name: DString,
		hits: NoDump<u64>,
		scratch: NoDump<DVec<u32>>,
	}

	let cached = Cached {
		name: DString::from("lookup"),
		hits: NoDump(0xdead_beef_dead_beef),
		scratch: NoDump(DVec::from(vec![7u32, 8, 9])),
	};

	let buffer = dump(&cached);
	drop(cached);

	let loaded: &Cached = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.name, "lookup");
	assert_eq!(*loaded.hits, 0);
	assert!(loaded.scratch.is_empty());
}

#[test]
fn staged_chunks_are_aligned() {
	#[derive(Dump)]
	#[repr(C)]
	struct Wide {
		tag: DString,
		wide: DVec<u128>,
	}

	// The 2-byte string chunk lands first; the u128 chunk after it must
	// still start at a correctly aligned position.
	let wide = Wide {
		tag: DString::from("a"),
		wide: DVec::from(vec![1u128, 2, 3]),
	};

	let buffer = dump(&wide);
	let loaded: &Wide = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.tag, "a");
	assert_eq!(loaded.wide.as_slice(), &[1, 2, 3]);
	assert_eq!(
		loaded.wide.as_slice().as_ptr() as usize % mem::align_of::<u128>(),
		0
	);

	// The gap inserted between the string chunk and the aligned u128 chunk
	// is zero-filled, not left as whatever the allocator handed out.
	let align = mem::align_of::<u128>();
	let gap_start = mem::size_of::<Wide>() + 2;
	let chunk_start = (gap_start + align - 1) & !(align - 1);
	assert!(buffer[gap_start..chunk_start].iter().all(|&b| b == 0));
}

#[test]
#[should_panic(expected = "address outside dumped allocation")]
fn patch_outside_dumped_value_is_rejected() {
	struct Stray(u64);

	impl Dump for Stray {
		fn dump_data(&self, dumper: &mut Dumper) {
			// A local copy is never part of the allocation being dumped.
			let foreign = self.0;
			dumper.patch(&foreign, &1u64);
		}
	}

	dump(&Stray(7));
}

#[cfg(all(target_pointer_width = "64", not(feature = "compatible_layout")))]
#[test]
fn output_layout() {
	#[derive(Dump)]
	#[repr(C)]
	struct Entry {
		name: DString,
		score: u32,
	}

	let entry = Entry {
		name: DString::from("alice"),
		score: 90,
	};
	let buffer = dump(&entry);

	// [Entry bytes][b"alice\0"], with no trailing padding
	assert_eq!(buffer.len(), mem::size_of::<Entry>() + 6);
	assert_eq!(&buffer[mem::size_of::<Entry>()..], b"alice\0");

	// The string's storage word holds the chunk's position minus its own
	let displacement = isize::from_ne_bytes(buffer[0..8].try_into().unwrap());
	assert_eq!(displacement as usize, mem::size_of::<Entry>());
	// Length excludes the terminator
	let len = usize::from_ne_bytes(buffer[8..16].try_into().unwrap());
	assert_eq!(len, 5);
	// The staged copy is flagged as arena-backed
	assert_eq!(buffer[16], 1);
}
