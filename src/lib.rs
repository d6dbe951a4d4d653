//! # Resolute
//!
//! **Resolute** is a JAX-RS-style resource resolution engine: it maps one HTTP
//! request (verb, path, content type, acceptance preferences) to a concrete
//! handler method on a resource object, following the JSR-311 matching
//! algorithm.
//!
//! ## Overview
//!
//! Applications register *root resource classes*, each declaring a URI
//! template, terminal methods and sub-resource locators. Per request, the
//! engine selects the most specific matching root, walks locators down the
//! path (instantiating resource objects through a caller-supplied
//! [`resolve::ResourceFactory`]), then picks the handler method by verb and
//! media-type negotiation. Every way resolution can fail is one tag of the
//! closed [`resolve::RoutingFailure`] set, mapped to an HTTP status by a
//! configurable [`resolve::StatusPolicy`].
//!
//! ## Architecture
//!
//! - **[`pattern`]** - URI-template compilation and regex-based path matching
//! - **[`media`]** - media types, wildcard inclusion and `Accept` header lists
//! - **[`registry`]** - resource class descriptors and the copy-on-write
//!   registry of attached roots
//! - **[`resolve`]** - the three-stage resolution engine and its failure set
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use http::Method;
//! use resolute::registry::{CandidateRegistry, MethodDescriptor, ResourceClass};
//! use resolute::resolve::{
//!     FactoryError, Outcome, Resolver, ResourceFactory, RouteRequest,
//! };
//! use resolute::pattern::VarVec;
//!
//! struct UnitFactory;
//!
//! impl ResourceFactory for UnitFactory {
//!     type Object = ();
//!
//!     fn instantiate_root(
//!         &self,
//!         _class: &Arc<ResourceClass>,
//!         _vars: &VarVec,
//!     ) -> Result<(), FactoryError> {
//!         Ok(())
//!     }
//!
//!     fn locate(
//!         &self,
//!         locator: &Arc<MethodDescriptor>,
//!         _parent: &(),
//!         _vars: &VarVec,
//!     ) -> Result<((), Arc<ResourceClass>), FactoryError> {
//!         Err(format!("no sub-resource behind {}", locator.name()).into())
//!     }
//! }
//!
//! let widgets = ResourceClass::builder("Widgets", "/widgets")
//!     .method("list_widgets", Method::GET, "")
//!     .method("get_widget", Method::GET, "/{id}")
//!     .build()
//!     .unwrap();
//!
//! let registry = Arc::new(CandidateRegistry::new());
//! registry.attach(widgets).unwrap();
//!
//! let resolver = Resolver::new(registry, UnitFactory);
//! let outcome = resolver
//!     .resolve(&RouteRequest::new(Method::GET, "/widgets/42"))
//!     .unwrap();
//! match outcome {
//!     Outcome::Method(resolution) => {
//!         assert_eq!(resolution.method.name(), "get_widget");
//!         assert_eq!(resolution.vars.first("id"), Some("42"));
//!     }
//!     Outcome::OptionsProbe { .. } => unreachable!("a GET was resolved"),
//! }
//! ```
//!
//! ## Concurrency
//!
//! Resolution is synchronous and lock-free: each request reads one immutable
//! registry snapshot, so concurrent [`registry::CandidateRegistry::attach`] /
//! `detach` calls never become partially visible mid-resolution.

pub mod media;
pub mod pattern;
pub mod registry;
pub mod resolve;

pub use registry::{CandidateRegistry, ResourceClass};
pub use resolve::{Outcome, Resolver, ResourceFactory, RouteRequest, RoutingFailure};
