//! Set algebra over comma-separated feature lists.
//!
//! The reconciler replaces this engine's previous contribution to a list
//! with its current one, leaving every foreign token in place. Inputs are
//! never modified; `None` and `Some("")` both read as an empty list.

use tracing::debug;

use super::codec::is_owned;
use crate::logging::event_names;

fn non_empty(list: Option<&str>) -> Option<&str> {
    list.filter(|l| !l.is_empty())
}

/// Merge `new_features` into `orig_features`.
///
/// The result holds `new_features` followed by each non-empty token of
/// `orig_features` that is not owned and not already present. Owned tokens
/// of `orig_features` are dropped. `avail_features` does not influence the
/// result.
pub fn xlate(
    new_features: Option<&str>,
    orig_features: Option<&str>,
    avail_features: Option<&str>,
) -> Option<String> {
    debug!(
        event = event_names::RECONCILE_XLATE,
        new = new_features,
        orig = orig_features,
        avail = avail_features,
        "reconciling feature list"
    );

    let Some(new) = non_empty(new_features) else {
        return orig_features.map(str::to_string);
    };
    let Some(orig) = non_empty(orig_features) else {
        return Some(new.to_string());
    };

    let mut merged = new.to_string();
    for token in orig.split(',').filter(|t| !t.is_empty()) {
        if is_owned(token) || merged.split(',').any(|t| t == token) {
            continue;
        }
        append_list(&mut merged, token);
    }
    Some(merged)
}

/// Keep only the owned tokens of an `&`-joined job constraint.
///
/// Order and the `&` delimiter are preserved. When no token is owned the
/// expression is returned unchanged.
pub fn job_xlate(job_features: Option<&str>) -> Option<String> {
    debug!(
        event = event_names::RECONCILE_JOB_XLATE,
        job_features,
        "filtering job constraint"
    );
    let expr = non_empty(job_features)?;

    let owned: Vec<&str> = expr.split('&').filter(|t| is_owned(t)).collect();
    if owned.is_empty() {
        Some(expr.to_string())
    } else {
        Some(owned.join("&"))
    }
}

/// Identity reordering; returns an independent copy.
pub fn reorder(features: Option<&str>) -> Option<String> {
    features.map(str::to_string)
}

/// Append `item` to a comma-joined list.
pub fn append_list(list: &mut String, item: &str) {
    if !list.is_empty() {
        list.push(',');
    }
    list.push_str(item);
}

/// Append `item` to an optional list, creating it when absent.
pub fn append_optional(list: &mut Option<String>, item: &str) {
    match list {
        Some(existing) => append_list(existing, item),
        None => *list = Some(item.to_string()),
    }
}
