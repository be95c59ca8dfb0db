use std::sync::LazyLock;

use regex::Regex;

use crate::schema::TaskIdFormat;

// Bounded by non-alphanumerics rather than `\b`, so `__T001__` still counts.
static TASK_ID_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:^|[^A-Za-z0-9])(?P<id>(?P<prefix>[A-Z]+)[-_]?(?P<digits>\d{1,4}))(?:[^A-Za-z0-9]|$)")
        .unwrap()
});

/// Only emphasized or heading lines are considered; plain prose mentions of
/// ids ("blocked by T004") would otherwise skew the count.
fn has_marker(line: &str) -> bool {
    line.contains("**") || line.contains("__") || line.trim_start().starts_with('#')
}

/// Task-id candidates in document order, one per marked line.
pub fn candidates(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|l| has_marker(l))
        .filter_map(|l| TASK_ID_RE.captures(l).map(|c| c["id"].to_string()))
        .collect()
}

/// Derive the id convention from a single candidate. Separator detection is
/// by literal presence: hyphen first, then underscore.
pub fn infer_format(candidate: &str) -> Option<TaskIdFormat> {
    let caps = TASK_ID_RE.captures(candidate)?;
    let separator = if candidate.contains('-') {
        Some('-')
    } else if candidate.contains('_') {
        Some('_')
    } else {
        None
    };
    Some(TaskIdFormat::new(
        &caps["prefix"],
        separator,
        caps["digits"].len(),
    ))
}
