//! # Resolve Module
//!
//! The resolution engine: maps one HTTP request to a concrete handler method
//! on a resource object, or to one of a closed set of routing failures.
//!
//! Resolution follows the JSR-311 matching algorithm in three stages over one
//! consistent registry snapshot:
//!
//! 1. **Root selection**: find the most specific root resource class whose
//!    template matches the request path.
//! 2. **Sub-resource walk**: starting from the root resource instance,
//!    follow sub-resource locators (through the caller-supplied
//!    [`ResourceFactory`]) until the remaining path is exhausted or a
//!    terminal method claims it.
//! 3. **Method selection**: among the terminal methods matching the
//!    remaining path, filter by HTTP verb (HEAD falls back to GET), request
//!    content type and acceptable response types, then rank by media-type
//!    specificity.
//!
//! Each stage fails fast with a [`RoutingFailure`]; the transport layer maps
//! the failure tag to an HTTP status through a [`StatusPolicy`].

mod core;
mod error;
mod method;
mod root;
#[cfg(test)]
mod tests;
mod walker;

pub use core::{Outcome, PathVars, Resolution, Resolver, ResourceFactory, RouteRequest};
pub use error::{FactoryError, RoutingFailure, StatusPolicy};
