use std::time::Duration;

use dumpable::{dump, from_dumped_buffer, DString, DVec, Dump, DumpWith, Dumper};

#[test]
fn tuple_struct() {
	#[derive(Dump, Debug, PartialEq)]
	#[repr(C)]
	struct Pair(DString, u32);

	let buffer = dump(&Pair(DString::from("answer"), 42));
	let loaded: &Pair = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.0, "answer");
	assert_eq!(loaded.1, 42);
}

#[test]
fn unit_struct() {
	#[derive(Dump)]
	struct Marker;

	let buffer = dump(&Marker);
	assert!(buffer.is_empty());
}

#[test]
fn enum_fieldless() {
	#[derive(Dump, Debug, PartialEq)]
	enum Direction {
		North,
		South,
		East,
		West,
	}

	for direction in [
		Direction::North,
		Direction::South,
		Direction::East,
		Direction::West,
	] {
		let buffer = dump(&direction);
		let loaded: &Direction = unsafe { from_dumped_buffer(&buffer) };
		assert_eq!(loaded, &direction);
	}
}

#[test]
fn enum_with_payloads() {
	#[derive(Dump, Debug, PartialEq)]
	enum Shape {
		Point,
		Label(DString),
		Segment { length: u32, name: DString },
	}

	let buffer = dump(&Shape::Point);
	let loaded: &Shape = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded, &Shape::Point);

	let label = Shape::Label(DString::from("origin"));
	let buffer = dump(&label);
	drop(label);
	let loaded: &Shape = unsafe { from_dumped_buffer(&buffer) };
	match loaded {
		Shape::Label(name) => assert_eq!(*name, "origin"),
		other => panic!("expected Label, got {:?}", other),
	}

	let segment = Shape::Segment {
		length: 12,
		name: DString::from("diagonal"),
	};
	let buffer = dump(&segment);
	drop(segment);
	let loaded: &Shape = unsafe { from_dumped_buffer(&buffer) };
	match loaded {
		Shape::Segment { length, name } => {
			assert_eq!(*length, 12);
			assert_eq!(*name, "diagonal");
		}
		other => panic!("expected Segment, got {:?}", other),
	}
}

#[test]
fn generic_struct() {
	#[derive(Dump, Debug, PartialEq)]
	#[repr(C)]
	struct Wrapper<T> {
		items: DVec<T>,
	}

	let wrapper = Wrapper {
		items: DVec::from(vec![DString::from("ab"), DString::from("cd")]),
	};
	let buffer = dump(&wrapper);
	drop(wrapper);

	let loaded: &Wrapper<DString> = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.items[0], "ab");
	assert_eq!(loaded.items[1], "cd");
}

#[test]
fn option_field() {
	#[derive(Dump, Debug, PartialEq)]
	#[repr(C)]
	struct Labelled {
		id: u32,
		label: Option<DString>,
	}

	let labelled = Labelled {
		id: 7,
		label: Some(DString::from("seven")),
	};
	let buffer = dump(&labelled);
	drop(labelled);
	let loaded: &Labelled = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.id, 7);
	assert_eq!(loaded.label.as_ref().unwrap(), "seven");
}

#[test]
fn dump_with_proxy() {
	struct DurationDump;

	impl DumpWith<Duration> for DurationDump {
		fn dump_data_with(_value: &Duration, _dumper: &mut Dumper) {
			// Two plain integers; the raw bytes are already complete.
		}
	}

	#[derive(Dump)]
	#[repr(C)]
	struct Timing {
		label: DString,
		#[dump_with(DurationDump)]
		elapsed: Duration,
	}

	let timing = Timing {
		label: DString::from("parse"),
		elapsed: Duration::from_millis(250),
	};
	let buffer = dump(&timing);
	drop(timing);

	let loaded: &Timing = unsafe { from_dumped_buffer(&buffer) };
	assert_eq!(loaded.label, "parse");
	assert_eq!(loaded.elapsed, Duration::from_millis(250));
}
