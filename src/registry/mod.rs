//! # Registry Module
//!
//! Resource-class descriptors and the shared candidate registry.
//!
//! A [`ResourceClass`] is declared once through its builder (the equivalent
//! of introspecting an annotated class) and is immutable afterwards; nothing
//! is re-discovered per request. The [`CandidateRegistry`] holds the currently
//! attached root resources and publishes copy-on-write snapshots so that an
//! in-flight resolution always observes a consistent view, even while other
//! threads attach or detach classes.

mod core;
mod descriptor;

pub use core::{CandidateRegistry, RegistryError, RegistrySnapshot};
pub use descriptor::{
    ClassKey, DescriptorError, MethodDescriptor, MethodKind, ResourceClass, ResourceClassBuilder,
};
