//! Sanitizers applied to terminal actions before they are dispatched

use crate::action::Action;
use serde_json::Value;

/// A transformation applied to a SUCCESS or FAILURE action
pub type Sanitizer = fn(Action) -> Action;

/// Sanitizers applied by default, in order
pub const DEFAULT_SANITIZERS: &[Sanitizer] = &[strip_blank_meta];

/// Drop `meta` when it is an empty object
#[must_use]
pub fn strip_blank_meta(mut action: Action) -> Action {
    if matches!(&action.meta, Some(Value::Object(meta)) if meta.is_empty()) {
        action.meta = None;
    }
    action
}

/// Fold `sanitizers` over `action`, left to right
#[must_use]
pub fn sanitize_action(action: Action, sanitizers: &[Sanitizer]) -> Action {
    sanitizers
        .iter()
        .fold(action, |action, sanitizer| sanitizer(action))
}
