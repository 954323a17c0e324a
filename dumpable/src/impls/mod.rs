//! [`Dump`](crate::Dump) impls for foreign types.
//!
//! Deliberately absent: `Box`, `Vec`, `String` and friends. Their heap
//! pointers cannot survive relocation of a dumped buffer, so giving them
//! impls would produce output that loads as garbage. The resulting compile
//! error steers users to [`RelPtr`](crate::RelPtr), [`DVec`](crate::DVec)
//! and [`DString`](crate::DString).

mod other;
mod primitives;
