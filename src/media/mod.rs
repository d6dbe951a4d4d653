//! # Media Module
//!
//! Media types and acceptance lists for content negotiation.
//!
//! [`MediaType`] is a type/subtype pair with wildcard semantics: `x/y` is more
//! specific than `x/*`, which is more specific than `*/*`. [`AcceptList`] is
//! the client's ranked acceptance preferences, ordered by quality value
//! descending and, within equal quality, by supplied order.

mod core;
#[cfg(test)]
mod tests;

pub use core::{AcceptEntry, AcceptList, InvalidMediaType, MediaType};
