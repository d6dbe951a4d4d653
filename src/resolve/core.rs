use super::error::{FactoryError, RoutingFailure, StatusPolicy};
use super::method::{select_method, MethodOutcome};
use super::root::select_root;
use super::walker::walk;
use crate::media::{AcceptList, MediaType};
use crate::pattern::{RemainingPath, VarVec};
use crate::registry::{CandidateRegistry, MethodDescriptor, ResourceClass};
use http::Method;
use std::sync::Arc;
use tracing::{debug, warn};

/// Instantiation callback: the one external collaborator of the engine.
///
/// `instantiate_root` builds the root resource object from its matched
/// variables; `locate` follows a sub-resource locator from a parent object and
/// reports which class resolution continues on. Both are single bounded
/// synchronous calls; an error is wrapped as
/// [`RoutingFailure::InstantiationFailed`] and never retried, since resource
/// construction is assumed to have side effects.
pub trait ResourceFactory {
    type Object;

    fn instantiate_root(
        &self,
        class: &Arc<ResourceClass>,
        vars: &VarVec,
    ) -> Result<Self::Object, FactoryError>;

    fn locate(
        &self,
        locator: &Arc<MethodDescriptor>,
        parent: &Self::Object,
        vars: &VarVec,
    ) -> Result<(Self::Object, Arc<ResourceClass>), FactoryError>;
}

/// Per-request input to resolution.
#[derive(Debug, Clone)]
pub struct RouteRequest {
    /// HTTP method token.
    pub verb: Method,
    /// Percent-encoded path, relative to the application's mount point.
    pub path: String,
    /// Media type of the request entity, if any.
    pub content_type: Option<MediaType>,
    /// Ranked acceptance preferences; empty accepts anything.
    pub accept: AcceptList,
}

impl RouteRequest {
    #[must_use]
    pub fn new(verb: Method, path: &str) -> RouteRequest {
        RouteRequest {
            verb,
            path: path.to_string(),
            content_type: None,
            accept: AcceptList::default(),
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: MediaType) -> RouteRequest {
        self.content_type = Some(content_type);
        self
    }

    #[must_use]
    pub fn with_accept(mut self, accept: AcceptList) -> RouteRequest {
        self.accept = accept;
        self
    }
}

/// The variables captured across every template matched during resolution.
///
/// Ordered and multi-valued: later captures of an already-seen name are
/// additional values, never overwrites, and the first capture fixes the
/// name's position.
#[derive(Debug, Clone, Default)]
pub struct PathVars(VarVec);

impl PathVars {
    pub(crate) fn from_parts(mut walk_vars: VarVec, method_vars: VarVec) -> PathVars {
        walk_vars.extend(method_vars);
        PathVars(walk_vars)
    }

    /// First captured value for the name, in capture order.
    #[must_use]
    pub fn first(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Every captured value for the name, in capture order.
    pub fn all<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> {
        self.0
            .iter()
            .filter(move |(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// All `(name, value)` pairs in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_ref(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Successful resolution: the method to invoke, the object to invoke it on
/// and the variables captured along the way.
pub struct Resolution<O> {
    pub method: Arc<MethodDescriptor>,
    pub object: O,
    pub vars: PathVars,
}

/// What a resolution attempt produced when it did not fail.
pub enum Outcome<O> {
    /// A concrete method was selected.
    Method(Resolution<O>),
    /// A bare OPTIONS probe: the transport should answer with an Allow header
    /// listing these verbs.
    OptionsProbe { allow: Vec<Method> },
}

/// Orchestrates root selection, the sub-resource walk and method selection
/// over one consistent registry snapshot per request.
pub struct Resolver<F: ResourceFactory> {
    registry: Arc<CandidateRegistry>,
    factory: F,
    policy: StatusPolicy,
}

impl<F: ResourceFactory> Resolver<F> {
    #[must_use]
    pub fn new(registry: Arc<CandidateRegistry>, factory: F) -> Resolver<F> {
        Resolver::with_policy(registry, factory, StatusPolicy::default())
    }

    /// Builds a resolver with explicit status-code choices.
    #[must_use]
    pub fn with_policy(
        registry: Arc<CandidateRegistry>,
        factory: F,
        policy: StatusPolicy,
    ) -> Resolver<F> {
        Resolver {
            registry,
            factory,
            policy,
        }
    }

    #[must_use]
    pub fn policy(&self) -> &StatusPolicy {
        &self.policy
    }

    #[must_use]
    pub fn registry(&self) -> &Arc<CandidateRegistry> {
        &self.registry
    }

    /// Resolves one request to a method, an object and the captured
    /// variables, or one tagged routing failure.
    ///
    /// Purely synchronous; the only external call is the instantiation
    /// callback. The registry is read once, so concurrent attach/detach never
    /// becomes partially visible mid-resolution.
    pub fn resolve(&self, request: &RouteRequest) -> Result<Outcome<F::Object>, RoutingFailure> {
        debug!(verb = %request.verb, path = %request.path, "Resolution attempt");
        let snapshot = self.registry.snapshot();
        let path = RemainingPath::new(&request.path);

        let result = select_root(&snapshot, &path)
            .and_then(|selection| walk(&self.factory, selection))
            .and_then(|terminal| {
                let outcome = select_method(
                    &terminal.class,
                    &terminal.remainder,
                    &request.verb,
                    request.content_type.as_ref(),
                    &request.accept,
                )?;
                Ok(match outcome {
                    MethodOutcome::Selected { method, vars } => Outcome::Method(Resolution {
                        method,
                        object: terminal.object,
                        vars: PathVars::from_parts(terminal.vars, vars),
                    }),
                    MethodOutcome::OptionsProbe { allow } => Outcome::OptionsProbe { allow },
                })
            });

        if let Err(failure) = &result {
            warn!(
                verb = %request.verb,
                path = %request.path,
                failure = %failure,
                "Resolution failed"
            );
        }
        result
    }
}
