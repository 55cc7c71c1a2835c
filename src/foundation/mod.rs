//! Integer geometry, damage regions and the crate error type.

/// Integer and float geometry primitives plus premultiplied color.
pub mod core;
/// Crate error type.
pub mod error;
/// Damage regions as sets of disjoint rectangles.
pub mod region;
