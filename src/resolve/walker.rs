use super::core::ResourceFactory;
use super::error::RoutingFailure;
use super::root::RootSelection;
use crate::pattern::{PathMatch, RemainingPath, VarVec};
use crate::registry::{MethodDescriptor, ResourceClass};
use std::sync::Arc;
use tracing::debug;

/// Endpoint of the sub-resource walk: the object that will handle the
/// request, its class, the path still to be matched by method selection, and
/// every variable captured so far.
#[derive(Debug)]
pub(crate) struct Terminal<O> {
    pub object: O,
    pub class: Arc<ResourceClass>,
    pub remainder: RemainingPath,
    pub vars: VarVec,
}

/// Walks sub-resource locators from the root resource instance until the
/// remaining path is exhausted or a terminal method claims it.
///
/// Loop invariant: a locator is never invoked with an empty remaining path;
/// emptiness is checked before candidates are collected. Variables captured
/// by a terminal-method winner are not recorded here; method selection
/// captures them for the method it finally picks.
pub(crate) fn walk<F: ResourceFactory>(
    factory: &F,
    selection: RootSelection,
) -> Result<Terminal<F::Object>, RoutingFailure> {
    let RootSelection { class, matched } = selection;
    let mut vars = matched.vars;
    let mut remainder = matched.remainder;

    let mut object =
        factory
            .instantiate_root(&class, &vars)
            .map_err(|source| RoutingFailure::InstantiationFailed {
                class: class.key().clone(),
                path: remainder.as_str().to_string(),
                source,
            })?;
    let mut class = class;

    loop {
        if remainder.is_empty_or_slash() {
            return Ok(Terminal {
                object,
                class,
                remainder,
                vars,
            });
        }

        let mut candidates: Vec<(&Arc<MethodDescriptor>, PathMatch)> = Vec::new();
        for descriptor in class.sub_resource_descriptors() {
            let Some(m) = descriptor.pattern().matches(&remainder) else {
                continue;
            };
            // A terminal method must consume the whole remaining path; a
            // locator may leave a remainder for the next hop.
            if m.remainder.is_empty_or_slash() || descriptor.is_locator() {
                candidates.push((descriptor, m));
            }
        }

        if candidates.is_empty() {
            return Err(RoutingFailure::ResourceNotFound {
                class: class.key().clone(),
                path: remainder.as_str().to_string(),
            });
        }

        let (winner, winner_match) = pick_best(candidates, &class, &remainder)?;

        if !winner.is_locator() {
            debug!(
                class = %class.key(),
                method = %winner.name(),
                "Sub-resource walk reached a terminal method"
            );
            return Ok(Terminal {
                object,
                class,
                remainder,
                vars,
            });
        }

        debug!(
            class = %class.key(),
            locator = %winner.name(),
            remainder = %winner_match.remainder,
            "Following sub-resource locator"
        );
        vars.extend(winner_match.vars.iter().cloned());
        let (next_object, next_class) = factory
            .locate(winner, &object, &winner_match.vars)
            .map_err(|source| RoutingFailure::InstantiationFailed {
                class: class.key().clone(),
                path: remainder.as_str().to_string(),
                source,
            })?;
        object = next_object;
        class = next_class;
        remainder = winner_match.remainder;
    }
}

/// Specificity pick among sub-resource candidates. A tie on identical
/// template strings is legal (verb overloads of one template); on an exact
/// tie a terminal method is preferred over a locator; any other tie is
/// ambiguous.
fn pick_best<'a>(
    candidates: Vec<(&'a Arc<MethodDescriptor>, PathMatch)>,
    class: &ResourceClass,
    remainder: &RemainingPath,
) -> Result<(&'a Arc<MethodDescriptor>, PathMatch), RoutingFailure> {
    let mut iter = candidates.into_iter();
    let Some((mut winner, mut winner_match)) = iter.next() else {
        return Err(RoutingFailure::ResourceNotFound {
            class: class.key().clone(),
            path: remainder.as_str().to_string(),
        });
    };
    let mut tied: Option<&Arc<MethodDescriptor>> = None;
    for (descriptor, m) in iter {
        let best_key = specificity(winner);
        let key = specificity(descriptor);
        if key > best_key {
            winner = descriptor;
            winner_match = m;
            tied = None;
        } else if key == best_key {
            if descriptor.pattern() == winner.pattern() {
                // Same template: verb overloads. Prefer a terminal method so
                // the walk stops here and method selection sees every overload.
                if winner.is_locator() && !descriptor.is_locator() {
                    winner = descriptor;
                    winner_match = m;
                }
            } else {
                tied = Some(descriptor);
            }
        }
    }
    if let Some(other) = tied {
        return Err(RoutingFailure::AmbiguousSubResource {
            class: class.key().clone(),
            path: remainder.as_str().to_string(),
            first: winner.pattern().template().to_string(),
            second: other.pattern().template().to_string(),
        });
    }
    Ok((winner, winner_match))
}

fn specificity(descriptor: &MethodDescriptor) -> (usize, usize) {
    (
        descriptor.pattern().literal_char_count(),
        descriptor.pattern().capturing_group_count(),
    )
}
