use super::error::RoutingFailure;
use crate::pattern::{PathMatch, RemainingPath};
use crate::registry::{RegistrySnapshot, ResourceClass};
use std::sync::Arc;
use tracing::debug;

/// Output of root-resource selection: the winning class, its match and the
/// path left for the sub-resource walk.
pub(crate) struct RootSelection {
    pub class: Arc<ResourceClass>,
    pub matched: PathMatch,
}

/// Identifies the root resource class for a request path.
///
/// Every attached class whose pattern matches is a candidate, except those
/// that leave a non-empty remainder without having sub-resource members to
/// consume it. The most specific candidate wins; a specificity tie between
/// distinct templates is an error.
pub(crate) fn select_root(
    snapshot: &RegistrySnapshot,
    path: &RemainingPath,
) -> Result<RootSelection, RoutingFailure> {
    let mut candidates: Vec<(&Arc<ResourceClass>, PathMatch)> = Vec::new();
    for class in snapshot.roots() {
        let Some(matched) = class.pattern().matches(path) else {
            continue;
        };
        if matched.remainder.is_empty_or_slash() || class.has_sub_resources() {
            candidates.push((class, matched));
        }
    }

    // Most literal characters first, capturing groups as tie-breaker.
    let mut iter = candidates.into_iter();
    let Some((mut winner, mut matched)) = iter.next() else {
        return Err(RoutingFailure::RootResourceNotFound {
            path: path.as_str().to_string(),
        });
    };
    let mut tied: Option<&Arc<ResourceClass>> = None;
    for (class, class_match) in iter {
        let (best_key, key) = (specificity(winner), specificity(class));
        if key > best_key {
            winner = class;
            matched = class_match;
            tied = None;
        } else if key == best_key && class.pattern() != winner.pattern() {
            // Equal template strings are the same path reached twice, not a tie.
            tied = Some(class);
        }
    }
    if let Some(other) = tied {
        return Err(RoutingFailure::AmbiguousRootResource {
            path: path.as_str().to_string(),
            first: winner.pattern().template().to_string(),
            second: other.pattern().template().to_string(),
        });
    }

    debug!(
        class = %winner.key(),
        template = %winner.pattern(),
        remainder = %matched.remainder,
        "Root resource selected"
    );
    Ok(RootSelection {
        class: Arc::clone(winner),
        matched,
    })
}

fn specificity(class: &ResourceClass) -> (usize, usize) {
    (
        class.pattern().literal_char_count(),
        class.pattern().capturing_group_count(),
    )
}
