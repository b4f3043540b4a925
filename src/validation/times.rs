//! Validity-time resolution

use super::ValidityTimeResult;
use super::dispatcher::ConditionDispatcher;
use crate::calendar;
use crate::model::{BusinessRule, ValidityTime};
use chrono::{DateTime, Utc};

const LOG_TARGET: &str = "     times";

/// Sort order of resolved candidates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Earliest first
    From,

    /// Latest first
    Until,
}

/// Resolves validity-time candidates into concrete instants.
///
/// Candidates whose guard is not fulfilled, or whose value cannot be resolved, are skipped.
pub fn resolve(
    dispatcher: &ConditionDispatcher<'_>,
    rule: &BusinessRule,
    candidates: &[ValidityTime],
    direction: Direction,
) -> Vec<ValidityTimeResult> {
    let mut results: Vec<ValidityTimeResult> = candidates
        .iter()
        .filter_map(|candidate| resolve_one(dispatcher, rule, candidate))
        .collect();

    match direction {
        Direction::From => results.sort_by_key(|result| result.time),
        Direction::Until => results.sort_by(|a, b| b.time.cmp(&a.time)),
    }

    results
}

fn resolve_one(dispatcher: &ConditionDispatcher<'_>, rule: &BusinessRule, candidate: &ValidityTime) -> Option<ValidityTimeResult> {
    let conditions = match candidate.guard() {
        Some(guard) => Some(dispatcher.first_fulfilled(guard, rule)?.clone()),
        None => None,
    };

    resolve_value(dispatcher, candidate).map(|time| ValidityTimeResult {
        time,
        format: candidate.format(),
        conditions,
    })
}

fn resolve_value(dispatcher: &ConditionDispatcher<'_>, candidate: &ValidityTime) -> Option<DateTime<Utc>> {
    let base = match candidate.placeholder() {
        Some(path) => dispatcher.context.lookup_instant(path),
        None => calendar::parse_instant(&candidate.value),
    };

    let Some(mut time) = base else {
        log::debug!(target: LOG_TARGET, "Validity time '{}' does not resolve to an instant", candidate.value);
        return None;
    };

    if let Some((unit, interval)) = candidate.offset() {
        time = calendar::add(time, unit, interval);
    }

    if let Some(modifier) = candidate.modifier() {
        time = calendar::apply_modifier(time, modifier);
    }

    Some(calendar::clamp(time, candidate.max()))
}
