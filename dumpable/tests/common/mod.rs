use std::{collections::BTreeMap, ops};

use dumpable::{DMap, DString, DVec, Dump};
use rand::Rng;
use rand_pcg::Lcg64Xsh32;

#[derive(Dump, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct Student {
	pub name: DString,
	pub id: u32,
	pub scores: DVec<u16>,
}

impl Generate for Student {
	fn generate<R: Rng>(rng: &mut R) -> Self {
		const NAMES: [&str; 8] = [
			"alice", "bob", "carol", "dave", "erin", "frank", "grace", "heidi",
		];
		Self {
			name: DString::from(NAMES[rng.gen_range(0..NAMES.len())]),
			id: rng.gen(),
			scores: generate_dvec(rng, 0..12),
		}
	}
}

#[derive(Dump, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct Class {
	pub name: DString,
	pub room: u16,
	pub students: DVec<Student>,
	pub enrollment_years: DMap<DString, u32>,
}

impl Generate for Class {
	fn generate<R: Rng>(rng: &mut R) -> Self {
		const SUBJECTS: [&str; 6] = [
			"algebra",
			"history",
			"biology",
			"literature",
			"chemistry",
			"music",
		];

		let students: DVec<Student> = generate_dvec(rng, 1..20);

		// Keys come from a `BTreeMap`, so they are unique and sorted.
		let mut enrollment_years = BTreeMap::new();
		for student in &students {
			enrollment_years.insert(student.name.clone(), rng.gen_range(2018..2026));
		}

		Self {
			name: DString::from(SUBJECTS[rng.gen_range(0..SUBJECTS.len())]),
			room: rng.gen_range(100..400),
			students,
			enrollment_years: DMap::from(enrollment_years),
		}
	}
}

#[derive(Dump, Clone, Debug, PartialEq)]
#[repr(C)]
pub struct School {
	pub name: DString,
	pub classes: DVec<Class>,
}

pub trait Generate {
	fn generate<R: Rng>(rng: &mut R) -> Self;
}

impl Generate for u16 {
	fn generate<R: Rng>(rng: &mut R) -> Self {
		rng.gen()
	}
}

fn generate_dvec<R: Rng, T: Generate>(rng: &mut R, range: ops::Range<usize>) -> DVec<T> {
	let len = rng.gen_range(range);
	let mut result = DVec::new();
	for _ in 0..len {
		result.push(T::generate(rng));
	}
	result
}

pub fn generate_school() -> School {
	const STATE: u64 = 2718281828;
	const STREAM: u64 = 4590452353;

	let mut rng = Lcg64Xsh32::new(STATE, STREAM);

	const CLASSES: usize = 40;
	let mut classes = DVec::new();
	for _ in 0..CLASSES {
		classes.push(Class::generate(&mut rng));
	}

	School {
		name: DString::from("springfield high"),
		classes,
	}
}
