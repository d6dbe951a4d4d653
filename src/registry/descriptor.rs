use crate::media::{AcceptList, InvalidMediaType, MediaType};
use crate::pattern::{InvalidTemplate, PathPattern, RemainingPath};
use http::Method;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Identity of a resource class, the registry's uniqueness key.
///
/// Attaching the same key twice is a no-op; attaching a different key at an
/// already-registered template is a configuration error.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassKey(Arc<str>);

impl ClassKey {
    pub fn new(name: &str) -> ClassKey {
        ClassKey(Arc::from(name))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Error raised while building a [`ResourceClass`].
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("invalid template on {class}.{member}")]
    Template {
        class: String,
        member: String,
        #[source]
        source: InvalidTemplate,
    },
    #[error("invalid media type on {class}.{member}")]
    Media {
        class: String,
        member: String,
        #[source]
        source: InvalidMediaType,
    },
    #[error("locator {class}.{member} must declare a non-empty template")]
    LocatorWithoutTemplate { class: String, member: String },
}

/// Whether a descriptor terminally handles requests or locates a sub-resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodKind {
    /// A (sub-)resource method handling one HTTP verb.
    Resource { verb: Method },
    /// A sub-resource locator: resolution continues on the object it returns.
    Locator,
}

/// One sub-resource method or locator declared on a resource class.
///
/// Immutable once the owning class is built. An empty `produces` list means
/// the method can produce any type; same for `consumes`.
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    name: Arc<str>,
    pattern: PathPattern,
    kind: MethodKind,
    consumes: Vec<MediaType>,
    produces: Vec<MediaType>,
}

impl MethodDescriptor {
    /// The handler name, used for diagnostics and dispatch lookup.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    #[must_use]
    pub fn kind(&self) -> &MethodKind {
        &self.kind
    }

    #[must_use]
    pub fn is_locator(&self) -> bool {
        matches!(self.kind, MethodKind::Locator)
    }

    /// The HTTP verb a terminal method handles; `None` for locators.
    #[must_use]
    pub fn verb(&self) -> Option<&Method> {
        match &self.kind {
            MethodKind::Resource { verb } => Some(verb),
            MethodKind::Locator => None,
        }
    }

    #[must_use]
    pub fn consumes(&self) -> &[MediaType] {
        &self.consumes
    }

    #[must_use]
    pub fn produces(&self) -> &[MediaType] {
        &self.produces
    }

    /// Verb filter. With `also_get` set (a HEAD request), GET handlers are
    /// accepted as fallback candidates.
    pub(crate) fn supports_verb(&self, verb: &Method, also_get: bool) -> bool {
        match self.verb() {
            Some(own) => own == verb || (also_get && *own == Method::GET),
            None => false,
        }
    }

    /// True if the method can consume a request body of the given type.
    /// An empty consumes list counts as `*/*`.
    pub(crate) fn consumes_type(&self, given: &MediaType) -> bool {
        if self.consumes.is_empty() {
            return true;
        }
        self.consumes.iter().any(|c| c.includes(given))
    }

    /// True if the method can produce something the client accepts.
    /// An empty produces list counts as `*/*`; an empty acceptance list
    /// accepts anything.
    pub(crate) fn produces_acceptable(&self, accept: &AcceptList) -> bool {
        if accept.is_empty() || self.produces.is_empty() {
            return true;
        }
        self.produces
            .iter()
            .any(|p| accept.types().any(|a| a.compatible(p)))
    }
}

struct RawDescriptor {
    name: String,
    template: String,
    kind: MethodKind,
    consumes: Vec<String>,
    produces: Vec<String>,
}

/// Builder for a [`ResourceClass`]; the explicit-registration stand-in for
/// annotation scanning. Descriptors are compiled once in [`build`], never per
/// request.
///
/// [`build`]: ResourceClassBuilder::build
pub struct ResourceClassBuilder {
    name: String,
    template: String,
    members: Vec<RawDescriptor>,
}

impl ResourceClassBuilder {
    /// Declares a terminal method without media-type constraints.
    #[must_use]
    pub fn method(self, name: &str, verb: Method, template: &str) -> Self {
        self.method_with_media(name, verb, template, &[], &[])
    }

    /// Declares a terminal method with consumed and produced media types.
    /// Empty slices mean "any".
    #[must_use]
    pub fn method_with_media(
        mut self,
        name: &str,
        verb: Method,
        template: &str,
        consumes: &[&str],
        produces: &[&str],
    ) -> Self {
        self.members.push(RawDescriptor {
            name: name.to_string(),
            template: template.to_string(),
            kind: MethodKind::Resource { verb },
            consumes: consumes.iter().map(|s| s.to_string()).collect(),
            produces: produces.iter().map(|s| s.to_string()).collect(),
        });
        self
    }

    /// Declares a sub-resource locator. The object it locates (and that
    /// object's class) comes from the instantiation callback at request time.
    #[must_use]
    pub fn locator(mut self, name: &str, template: &str) -> Self {
        self.members.push(RawDescriptor {
            name: name.to_string(),
            template: template.to_string(),
            kind: MethodKind::Locator,
            consumes: Vec::new(),
            produces: Vec::new(),
        });
        self
    }

    /// Compiles every declared template and media type.
    pub fn build(self) -> Result<Arc<ResourceClass>, DescriptorError> {
        let class = self.name;
        let pattern =
            PathPattern::compile(&self.template).map_err(|source| DescriptorError::Template {
                class: class.clone(),
                member: "<class>".to_string(),
                source,
            })?;

        let mut descriptors = Vec::with_capacity(self.members.len());
        for raw in self.members {
            if raw.kind == MethodKind::Locator && raw.template.trim_matches('/').is_empty() {
                return Err(DescriptorError::LocatorWithoutTemplate {
                    class,
                    member: raw.name,
                });
            }
            let pattern =
                PathPattern::compile(&raw.template).map_err(|source| DescriptorError::Template {
                    class: class.clone(),
                    member: raw.name.clone(),
                    source,
                })?;
            let parse_all = |list: &[String]| -> Result<Vec<MediaType>, InvalidMediaType> {
                list.iter().map(|s| MediaType::parse(s)).collect()
            };
            let consumes = parse_all(&raw.consumes).map_err(|source| DescriptorError::Media {
                class: class.clone(),
                member: raw.name.clone(),
                source,
            })?;
            let produces = parse_all(&raw.produces).map_err(|source| DescriptorError::Media {
                class: class.clone(),
                member: raw.name.clone(),
                source,
            })?;
            descriptors.push(Arc::new(MethodDescriptor {
                name: Arc::from(raw.name.as_str()),
                pattern,
                kind: raw.kind,
                consumes,
                produces,
            }));
        }

        let has_sub_resources = descriptors
            .iter()
            .any(|d| d.is_locator() || !d.pattern.is_empty_or_slash());

        Ok(Arc::new(ResourceClass {
            key: ClassKey::new(&class),
            pattern,
            descriptors,
            has_sub_resources,
        }))
    }
}

/// A registered resource class: its URI template plus the method and locator
/// descriptors declared on it. Introspected once at build time and shared by
/// all requests.
#[derive(Debug)]
pub struct ResourceClass {
    key: ClassKey,
    pattern: PathPattern,
    descriptors: Vec<Arc<MethodDescriptor>>,
    has_sub_resources: bool,
}

impl ResourceClass {
    /// Starts a root resource class at the given URI template.
    #[must_use]
    pub fn builder(name: &str, template: &str) -> ResourceClassBuilder {
        ResourceClassBuilder {
            name: name.to_string(),
            template: template.to_string(),
            members: Vec::new(),
        }
    }

    /// Starts a class that is only reachable through a locator; it has no
    /// root template of its own.
    #[must_use]
    pub fn sub_resource(name: &str) -> ResourceClassBuilder {
        ResourceClass::builder(name, "")
    }

    #[must_use]
    pub fn key(&self) -> &ClassKey {
        &self.key
    }

    #[must_use]
    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    /// All descriptors in declaration order. Order is not a correctness
    /// requirement; the resolution stages re-sort by specificity.
    #[must_use]
    pub fn descriptors(&self) -> &[Arc<MethodDescriptor>] {
        &self.descriptors
    }

    /// Whether this class has sub-resource methods or locators, i.e. can
    /// consume path segments beyond its own template.
    #[must_use]
    pub fn has_sub_resources(&self) -> bool {
        self.has_sub_resources
    }

    /// Descriptors eligible for the sub-resource walk: locators and methods
    /// with a non-empty template.
    pub(crate) fn sub_resource_descriptors(
        &self,
    ) -> impl Iterator<Item = &Arc<MethodDescriptor>> {
        self.descriptors
            .iter()
            .filter(|d| d.is_locator() || !d.pattern().is_empty_or_slash())
    }

    /// Terminal methods whose template consumes the whole remaining path.
    pub(crate) fn methods_for_path(&self, u: &RemainingPath) -> Vec<Arc<MethodDescriptor>> {
        self.descriptors
            .iter()
            .filter(|d| !d.is_locator() && d.pattern().matches_with_empty(u))
            .map(Arc::clone)
            .collect()
    }
}
