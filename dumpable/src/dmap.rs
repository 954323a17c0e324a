use std::{borrow::Borrow, collections::BTreeMap, fmt, ops, slice};

use crate::{DVec, Dump, Dumper};

/// Relocatable ordered map, implemented as a sorted array of pairs.
///
/// Keys are unique and strictly ascending. Both invariants are established
/// at construction time: a `DMap` is bulk-built from an already-ordered
/// unique source such as a [`BTreeMap`], and the type exposes lookup only,
/// no insertion by key.
///
/// Storage is a [`DVec`] of `(K, V)` pairs, so a `DMap` inherits the
/// dual-mode (owning / pooled) behavior and relocatability of its vector.
///
/// # Example
///
/// ```
/// use std::collections::BTreeMap;
/// use dumpable::DMap;
///
/// let mut src = BTreeMap::new();
/// src.insert(3u32, "three");
/// src.insert(1u32, "one");
///
/// let map: DMap<u32, &str> = DMap::from(src);
/// assert_eq!(map.get(&1), Some(&"one"));
/// assert_eq!(map.get(&2), None);
/// assert_eq!(map.count(&3), 1);
/// ```
#[repr(transparent)]
pub struct DMap<K, V> {
	items: DVec<(K, V)>,
}

impl<K, V> DMap<K, V> {
	/// Create an empty owning `DMap`. Does not allocate.
	#[inline]
	pub const fn new() -> Self {
		Self { items: DVec::new() }
	}

	/// Build from pairs already sorted by strictly ascending unique key.
	///
	/// Order and uniqueness are the caller's responsibility (checked in
	/// debug builds); a violation leaves lookups unreliable.
	pub fn from_sorted_pairs(pairs: Vec<(K, V)>) -> Self
	where K: Ord {
		debug_assert!(pairs.windows(2).all(|w| w[0].0 < w[1].0));
		Self {
			items: DVec::from(pairs),
		}
	}

	/// Number of entries.
	#[inline]
	pub fn len(&self) -> usize {
		self.items.len()
	}

	/// Returns `true` if the map has no entries.
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.items.is_empty()
	}

	/// Entries as a slice of pairs, in ascending key order.
	#[inline]
	pub fn as_slice(&self) -> &[(K, V)] {
		self.items.as_slice()
	}

	/// Iterate entries in ascending key order.
	#[inline]
	pub fn iter(&self) -> slice::Iter<'_, (K, V)> {
		self.items.iter()
	}

	/// Binary search for `key`; returns the mapped value if present.
	pub fn get<Q>(&self, key: &Q) -> Option<&V>
	where
		K: Borrow<Q> + Ord,
		Q: Ord + ?Sized,
	{
		self.get_key_value(key).map(|(_, v)| v)
	}

	/// Binary search for `key`; returns the full entry if present.
	pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
	where
		K: Borrow<Q> + Ord,
		Q: Ord + ?Sized,
	{
		let items = self.items.as_slice();
		match items.binary_search_by(|(k, _)| k.borrow().cmp(key)) {
			Ok(index) => {
				let (k, v) = &items[index];
				Some((k, v))
			}
			Err(_) => None,
		}
	}

	/// Returns `true` if `key` has an entry.
	pub fn contains_key<Q>(&self, key: &Q) -> bool
	where
		K: Borrow<Q> + Ord,
		Q: Ord + ?Sized,
	{
		self.get_key_value(key).is_some()
	}

	/// Number of entries for `key`: 0 or 1.
	pub fn count<Q>(&self, key: &Q) -> usize
	where
		K: Borrow<Q> + Ord,
		Q: Ord + ?Sized,
	{
		self.get_key_value(key).is_some() as usize
	}

	/// Drop all entries and release owning storage.
	#[inline]
	pub fn clear(&mut self) {
		self.items.clear();
	}
}

impl<K: Clone + Ord, V: Clone> From<&BTreeMap<K, V>> for DMap<K, V> {
	/// Copy entries out of `map`; `BTreeMap` iteration order is the sorted
	/// unique order the array representation requires.
	fn from(map: &BTreeMap<K, V>) -> Self {
		Self {
			items: map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
		}
	}
}

impl<K: Ord, V> From<BTreeMap<K, V>> for DMap<K, V> {
	/// Move entries out of `map`.
	fn from(map: BTreeMap<K, V>) -> Self {
		Self {
			items: map.into_iter().collect(),
		}
	}
}

impl<K, V> ops::Deref for DMap<K, V> {
	type Target = [(K, V)];

	#[inline]
	fn deref(&self) -> &[(K, V)] {
		self.items.as_slice()
	}
}

impl<'a, K, V> IntoIterator for &'a DMap<K, V> {
	type Item = &'a (K, V);
	type IntoIter = slice::Iter<'a, (K, V)>;

	#[inline]
	fn into_iter(self) -> Self::IntoIter {
		self.iter()
	}
}

impl<K, V> Default for DMap<K, V> {
	#[inline]
	fn default() -> Self {
		Self::new()
	}
}

impl<K: Clone, V: Clone> Clone for DMap<K, V> {
	/// Deep copy into a fresh owning `DMap`, never aliasing.
	fn clone(&self) -> Self {
		Self {
			items: self.items.clone(),
		}
	}
}

impl<K: PartialEq, V: PartialEq> PartialEq for DMap<K, V> {
	fn eq(&self, other: &Self) -> bool {
		self.items == other.items
	}
}

impl<K: Eq, V: Eq> Eq for DMap<K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for DMap<K, V> {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		f.debug_map()
			.entries(self.iter().map(|(k, v)| (k, v)))
			.finish()
	}
}

impl<K: Dump, V: Dump> Dump for DMap<K, V> {
	fn dump_data(&self, dumper: &mut Dumper) {
		// `repr(transparent)`: the pair vector is this map, so its header
		// fixups resolve at the map's own output position.
		self.items.dump_data(dumper);
	}
}
