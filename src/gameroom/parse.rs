use crate::Chips;
use crate::engine::Action;
use regex::Regex;
use std::sync::LazyLock;

static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<action>\s*(.+?)\s*</action>").expect("valid regex"));
static ALL_IN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:all.?in|allin|shove)\b").expect("valid regex"));
static FOLD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:f|fold)\b").expect("valid regex"));
static PASSIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:cc|call|check)\b").expect("valid regex"));
static RAISE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\b(?:cbr|bet|raise)\s*(\d+)").expect("valid regex"));

/// Reads an agent's decision out of its free-form reply.
///
/// Only the text inside `<action>…</action>` counts when a tag is present.
/// Keywords are tried strongest first; anything unrecognised checks when
/// checking is free and folds otherwise.
pub fn parse(reply: &str, can_check: bool, stack: Chips) -> Action {
    let text = TAG
        .captures(reply)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(reply);
    if ALL_IN.is_match(text) {
        return Action::shove(stack);
    }
    if FOLD.is_match(text) {
        return Action::fold();
    }
    if PASSIVE.is_match(text) {
        return if can_check { Action::check() } else { Action::call() };
    }
    if let Some(to) = RAISE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<Chips>().ok())
    {
        return Action::raise(to);
    }
    if can_check { Action::check() } else { Action::fold() }
}
