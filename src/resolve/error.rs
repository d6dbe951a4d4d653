use crate::media::MediaType;
use crate::registry::ClassKey;
use http::{Method, StatusCode};
use thiserror::Error;

/// Opaque error from the instantiation callback.
pub type FactoryError = Box<dyn std::error::Error + Send + Sync>;

/// The closed set of routing failures.
///
/// Every variant is a terminal, synchronous outcome of one resolution attempt;
/// nothing is retried. Each carries enough context for logging and for the
/// status-code mapping in [`StatusPolicy`].
#[derive(Debug, Error)]
pub enum RoutingFailure {
    /// No registered root template matches the path.
    #[error("no root resource class found for path \"/{path}\"")]
    RootResourceNotFound { path: String },

    /// Two distinct root templates tie on specificity.
    #[error("root resource templates {first} and {second} tie for path \"/{path}\"")]
    AmbiguousRootResource {
        path: String,
        first: String,
        second: String,
    },

    /// Walking sub-resources hit a dead end.
    #[error("resource class {class} has no member matching \"/{path}\"")]
    ResourceNotFound { class: ClassKey, path: String },

    /// Two distinct sub-resource templates tie on specificity.
    #[error("sub-resource templates {first} and {second} on {class} tie for \"/{path}\"")]
    AmbiguousSubResource {
        class: ClassKey,
        path: String,
        first: String,
        second: String,
    },

    /// No method matches the remaining path at all.
    #[error("no resource method on {class} matches \"/{path}\"")]
    ResourceMethodNotFound { class: ClassKey, path: String },

    /// Methods exist for the path but none handles this verb.
    /// `allow` lists the verbs the path does support, for an `Allow` header.
    #[error("{verb} is not allowed on {class} at \"/{path}\"")]
    MethodNotAllowed {
        verb: Method,
        class: ClassKey,
        path: String,
        allow: Vec<Method>,
    },

    /// No method accepts the request body type.
    #[error("no method on {class} at \"/{path}\" consumes {content_type}")]
    UnsupportedMediaType {
        verb: Method,
        class: ClassKey,
        path: String,
        content_type: MediaType,
    },

    /// No method can produce any type the client accepts.
    #[error("no method on {class} at \"/{path}\" produces an acceptable type")]
    NotAcceptable {
        verb: Method,
        class: ClassKey,
        path: String,
    },

    /// Two methods tie on verb and media-type specificity.
    #[error("methods {first} and {second} on {class} tie for {verb} \"/{path}\"")]
    AmbiguousMethod {
        verb: Method,
        class: ClassKey,
        path: String,
        first: String,
        second: String,
    },

    /// The external object-construction callback raised.
    #[error("could not instantiate resource {class} for \"/{path}\"")]
    InstantiationFailed {
        class: ClassKey,
        path: String,
        #[source]
        source: FactoryError,
    },
}

impl RoutingFailure {
    /// Maps this failure to an HTTP status under the given policy.
    #[must_use]
    pub fn status(&self, policy: &StatusPolicy) -> StatusCode {
        match self {
            RoutingFailure::RootResourceNotFound { .. } => policy.root_resource_not_found,
            RoutingFailure::AmbiguousRootResource { .. } => policy.ambiguous_root_resource,
            RoutingFailure::ResourceNotFound { .. } => policy.resource_not_found,
            RoutingFailure::AmbiguousSubResource { .. } => policy.ambiguous_sub_resource,
            RoutingFailure::ResourceMethodNotFound { .. } => policy.resource_method_not_found,
            RoutingFailure::MethodNotAllowed { .. } => policy.method_not_allowed,
            RoutingFailure::UnsupportedMediaType { .. } => policy.unsupported_media_type,
            RoutingFailure::NotAcceptable { .. } => policy.not_acceptable,
            RoutingFailure::AmbiguousMethod { .. } => policy.ambiguous_method,
            RoutingFailure::InstantiationFailed { .. } => policy.instantiation_failed,
        }
    }

    /// The allowed-verb set for an `Allow` header, present on
    /// [`RoutingFailure::MethodNotAllowed`].
    #[must_use]
    pub fn allow(&self) -> Option<&[Method]> {
        match self {
            RoutingFailure::MethodNotAllowed { allow, .. } => Some(allow),
            _ => None,
        }
    }
}

/// Status-code choices per failure tag.
///
/// Passed into the resolver at construction; there is no global mutable
/// default. `Default` matches the conventional mapping.
#[derive(Debug, Clone)]
pub struct StatusPolicy {
    pub root_resource_not_found: StatusCode,
    pub ambiguous_root_resource: StatusCode,
    pub resource_not_found: StatusCode,
    pub ambiguous_sub_resource: StatusCode,
    pub resource_method_not_found: StatusCode,
    pub method_not_allowed: StatusCode,
    pub unsupported_media_type: StatusCode,
    pub not_acceptable: StatusCode,
    pub ambiguous_method: StatusCode,
    pub instantiation_failed: StatusCode,
}

impl Default for StatusPolicy {
    fn default() -> Self {
        StatusPolicy {
            root_resource_not_found: StatusCode::NOT_FOUND,
            ambiguous_root_resource: StatusCode::INTERNAL_SERVER_ERROR,
            resource_not_found: StatusCode::NOT_FOUND,
            ambiguous_sub_resource: StatusCode::INTERNAL_SERVER_ERROR,
            resource_method_not_found: StatusCode::NOT_FOUND,
            method_not_allowed: StatusCode::METHOD_NOT_ALLOWED,
            unsupported_media_type: StatusCode::UNSUPPORTED_MEDIA_TYPE,
            not_acceptable: StatusCode::NOT_ACCEPTABLE,
            ambiguous_method: StatusCode::INTERNAL_SERVER_ERROR,
            instantiation_failed: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}
