//! Width of the integer fields baked into dumped output.
//!
//! Container headers ([`DVec`], [`DString`], [`DMap`]) and [`RelPtr`] store
//! their length and displacement fields using these aliases. With the
//! `compatible_layout` feature enabled they are fixed at 8 bytes, so 32-bit
//! and 64-bit builds produce and accept the same buffer layout, at the cost
//! of slightly larger output on 32-bit targets.
//!
//! This is a layout toggle only. It does not make buffers portable across
//! endianness or across differing `repr` of user types.
//!
//! [`DVec`]: crate::DVec
//! [`DString`]: crate::DString
//! [`DMap`]: crate::DMap
//! [`RelPtr`]: crate::RelPtr

/// Element/byte count field type used in dumped container headers.
#[cfg(feature = "compatible_layout")]
pub type DumpSize = u64;

/// Signed self-relative displacement field type used in dumped references.
#[cfg(feature = "compatible_layout")]
pub type DumpOffset = i64;

/// Element/byte count field type used in dumped container headers.
#[cfg(not(feature = "compatible_layout"))]
pub type DumpSize = usize;

/// Signed self-relative displacement field type used in dumped references.
#[cfg(not(feature = "compatible_layout"))]
pub type DumpOffset = isize;
