//! # Pattern Module
//!
//! URI-template compilation and matching.
//!
//! A [`PathPattern`] is compiled once, when a resource class or method
//! descriptor is registered, and is shared by every request afterwards. The
//! template grammar is the JSR-311 one: literal segments, `{name}` variables
//! and `{name: regexp}` variables with a custom expression. Compilation
//! appends an implicit "match everything remaining" group, so a pattern for
//! `/a` matches `/a`, `/a/` and `/a/b/c`, reporting the leftover path as the
//! match remainder.
//!
//! Two specificity metrics are retained per pattern, the number of literal
//! characters and the number of capturing groups, and are used by the
//! resolution stages to prefer more concrete templates over more generic ones.

mod core;

pub use core::{InvalidTemplate, PathMatch, PathPattern, RemainingPath, VarVec, MAX_INLINE_VARS};
