use super::error::RoutingFailure;
use crate::media::{AcceptList, MediaType};
use crate::pattern::{RemainingPath, VarVec};
use crate::registry::{MethodDescriptor, ResourceClass};
use http::Method;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

/// Stand-in media-type list for descriptors that declare none.
static ANY_LIST: Lazy<Vec<MediaType>> = Lazy::new(|| vec![MediaType::any()]);

/// Outcome of method selection.
#[derive(Debug)]
pub(crate) enum MethodOutcome {
    Selected {
        method: Arc<MethodDescriptor>,
        vars: VarVec,
    },
    /// A bare OPTIONS probe: no OPTIONS handler exists, the caller synthesizes
    /// an Allow-header response from the pre-verb-filter candidate verbs.
    OptionsProbe { allow: Vec<Method> },
}

/// Identifies the method that will handle the request.
///
/// Filters the terminal methods matching the remaining path by verb (HEAD
/// falls back to GET), by consumed media type against the request body and by
/// produced media type against the acceptance list, then ranks the survivors:
/// consumed-type specificity is the primary key, produced-type specificity
/// against the acceptance list (scanned in preference order) the secondary.
pub(crate) fn select_method(
    class: &Arc<ResourceClass>,
    remainder: &RemainingPath,
    verb: &Method,
    content_type: Option<&MediaType>,
    accept: &AcceptList,
) -> Result<MethodOutcome, RoutingFailure> {
    let candidates = class.methods_for_path(remainder);
    if candidates.is_empty() {
        return Err(RoutingFailure::ResourceMethodNotFound {
            class: class.key().clone(),
            path: remainder.as_str().to_string(),
        });
    }

    // Verbs supported at this path, before the verb filter. Needed for the
    // Allow header on 405 and for bare OPTIONS probes.
    let mut allow: Vec<Method> = Vec::new();
    for m in &candidates {
        if let Some(v) = m.verb() {
            if !allow.contains(v) {
                allow.push(v.clone());
            }
        }
    }

    let also_get = *verb == Method::HEAD;
    let mut survivors: Vec<Arc<MethodDescriptor>> = candidates
        .into_iter()
        .filter(|m| m.supports_verb(verb, also_get))
        .collect();
    if survivors.is_empty() {
        if *verb == Method::OPTIONS {
            debug!(class = %class.key(), allow = ?allow, "Bare OPTIONS probe");
            return Ok(MethodOutcome::OptionsProbe { allow });
        }
        return Err(RoutingFailure::MethodNotAllowed {
            verb: verb.clone(),
            class: class.key().clone(),
            path: remainder.as_str().to_string(),
            allow,
        });
    }

    if let Some(given) = content_type {
        survivors.retain(|m| m.consumes_type(given));
        if survivors.is_empty() {
            return Err(RoutingFailure::UnsupportedMediaType {
                verb: verb.clone(),
                class: class.key().clone(),
                path: remainder.as_str().to_string(),
                content_type: given.clone(),
            });
        }
    }

    survivors.retain(|m| m.produces_acceptable(accept));
    if survivors.is_empty() {
        return Err(RoutingFailure::NotAcceptable {
            verb: verb.clone(),
            class: class.key().clone(),
            path: remainder.as_str().to_string(),
        });
    }

    let winner = rank(survivors, verb, content_type, accept).map_err(|(first, second)| {
        RoutingFailure::AmbiguousMethod {
            verb: verb.clone(),
            class: class.key().clone(),
            path: remainder.as_str().to_string(),
            first,
            second,
        }
    })?;

    let vars = winner
        .pattern()
        .matches(remainder)
        .map(|m| m.vars)
        .unwrap_or_default();
    debug!(class = %class.key(), method = %winner.name(), "Resource method selected");
    Ok(MethodOutcome::Selected {
        method: winner,
        vars,
    })
}

#[derive(Clone, Copy)]
enum MimeSide {
    Consumes,
    Produces,
}

fn effective(side: MimeSide, m: &MethodDescriptor) -> &[MediaType] {
    let own = match side {
        MimeSide::Consumes => m.consumes(),
        MimeSide::Produces => m.produces(),
    };
    if own.is_empty() {
        &ANY_LIST
    } else {
        own
    }
}

/// Media-type specificity tiers: an exact type/subtype listing outranks a
/// main-type match, which outranks `*/*`.
fn exact(a: &MediaType, b: &MediaType) -> bool {
    a == b
}

fn main_type(a: &MediaType, b: &MediaType) -> bool {
    a.main_type() == b.main_type()
}

fn any_type(a: &MediaType, _b: &MediaType) -> bool {
    a.is_any() && a.is_wildcard_sub()
}

/// Keeps the subset of methods whose media-type list matches one of the
/// targets at the most specific non-empty tier. With no targets, methods
/// listing `*/*` are preferred. Returns the input unchanged when no tier
/// discriminates.
fn tier_subset(
    methods: Vec<Arc<MethodDescriptor>>,
    side: MimeSide,
    targets: &[&MediaType],
) -> Vec<Arc<MethodDescriptor>> {
    let tiers: &[fn(&MediaType, &MediaType) -> bool] = if targets.is_empty() {
        &[any_type]
    } else {
        &[exact, main_type, any_type]
    };
    let dummy = MediaType::any();
    for tier in tiers {
        let subset: Vec<Arc<MethodDescriptor>> = methods
            .iter()
            .filter(|m| {
                effective(side, m).iter().any(|own| {
                    if targets.is_empty() {
                        tier(own, &dummy)
                    } else {
                        targets.iter().any(|t| tier(own, t))
                    }
                })
            })
            .map(Arc::clone)
            .collect();
        if !subset.is_empty() {
            return subset;
        }
    }
    methods
}

/// Ranks the filtered survivors. Primary key: consumed-type specificity
/// against the request body type. Secondary key: produced-type specificity
/// against the acceptance list, scanning the client's preferences in order.
/// A same-tier tie between a GET and a HEAD method under a HEAD request
/// prefers HEAD; any other tie is reported as `(first, second)` names.
fn rank(
    survivors: Vec<Arc<MethodDescriptor>>,
    verb: &Method,
    content_type: Option<&MediaType>,
    accept: &AcceptList,
) -> Result<Arc<MethodDescriptor>, (String, String)> {
    if survivors.len() == 1 {
        return take_single(survivors);
    }

    let consume_targets: Vec<&MediaType> = content_type.into_iter().collect();
    let c1 = tier_subset(survivors, MimeSide::Consumes, &consume_targets);
    if c1.len() == 1 {
        return take_single(c1);
    }

    let wildcard = MediaType::any();
    let accept_eff: Vec<&MediaType> = if accept.is_empty() {
        vec![&wildcard]
    } else {
        accept.types().collect()
    };
    let c2 = tier_subset(c1, MimeSide::Produces, &accept_eff);
    if c2.len() == 1 {
        return take_single(c2);
    }

    for accepted in &accept_eff {
        let mut best: Option<&Arc<MethodDescriptor>> = None;
        for m in &c2 {
            let matches = effective(MimeSide::Produces, m)
                .iter()
                .any(|p| accepted.compatible(p));
            if !matches {
                continue;
            }
            best = match best {
                None => Some(m),
                Some(current) if Arc::ptr_eq(current, m) => Some(current),
                Some(current) => {
                    if *verb == Method::HEAD {
                        // GET survived only as a HEAD fallback; the explicit
                        // HEAD handler wins the tie.
                        match (current.verb(), m.verb()) {
                            (Some(cv), Some(mv))
                                if *cv == Method::GET && *mv == Method::HEAD =>
                            {
                                Some(m)
                            }
                            (Some(cv), Some(mv))
                                if *cv == Method::HEAD && *mv == Method::GET =>
                            {
                                Some(current)
                            }
                            _ => {
                                return Err((
                                    current.name().to_string(),
                                    m.name().to_string(),
                                ))
                            }
                        }
                    } else {
                        return Err((current.name().to_string(), m.name().to_string()));
                    }
                }
            };
        }
        if let Some(winner) = best {
            return Ok(Arc::clone(winner));
        }
    }

    // Post-filter survivors always share at least one compatible type with
    // the effective acceptance list, so the scan above found a winner.
    take_single(c2)
}

fn take_single(
    mut methods: Vec<Arc<MethodDescriptor>>,
) -> Result<Arc<MethodDescriptor>, (String, String)> {
    if methods.len() == 1 {
        return Ok(methods.remove(0));
    }
    let first = methods
        .first()
        .map(|m| m.name().to_string())
        .unwrap_or_default();
    let second = methods
        .get(1)
        .map(|m| m.name().to_string())
        .unwrap_or_default();
    Err((first, second))
}
