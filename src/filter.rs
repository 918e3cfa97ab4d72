//! State filter stage.
//!
//! An unset filter means "everything": the full slice is passed through
//! borrowed, so the common no-filter run copies nothing.

use std::borrow::Cow;

use crate::domain::DataPoint;

/// Narrow `points` to the states named in `states`, case-insensitively.
/// An empty `states` list returns the input unchanged.
pub fn filter_by_states<'a>(points: &'a [DataPoint], states: &[String]) -> Cow<'a, [DataPoint]> {
    if states.is_empty() {
        return Cow::Borrowed(points);
    }

    Cow::Owned(
        points
            .iter()
            .filter(|p| matches_any_state(&p.state, states))
            .cloned()
            .collect(),
    )
}

fn matches_any_state(state: &str, states: &[String]) -> bool {
    states
        .iter()
        .any(|s| s.trim().eq_ignore_ascii_case(state.trim()))
}
