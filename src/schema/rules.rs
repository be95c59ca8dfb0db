//! Ordered classification tables. Each table is evaluated top to bottom and
//! the first rule that fires wins, so table order is the tie-break order.

use std::sync::LazyLock;

use regex::Regex;

use super::{FormatType, TaskState};

static CHECKLIST_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*[-*+]\s+\[[ xX]\]").unwrap());
static NUMBERED_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+[.)]\s+").unwrap());

/// Share of non-blank lines a shape needs before it names the format.
pub const FORMAT_SHARE_THRESHOLD: f64 = 0.3;

/// Labels worth keeping when harvesting `label: [value]` pairs.
pub const STATUS_LABEL_KEYWORDS: &[&str] = &[
    "status",
    "state",
    "dev",
    "qa",
    "test",
    "verification",
    "review",
    "progress",
];

#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<L: 'static> {
    pub label: L,
    pub keywords: &'static [&'static str],
}

pub const FIELD_RULES: &[KeywordRule<&str>] = &[
    KeywordRule {
        label: "dev",
        keywords: &["dev"],
    },
    KeywordRule {
        label: "qa",
        keywords: &["qa", "quality", "test"],
    },
    KeywordRule {
        label: "user_verification",
        keywords: &["user", "verification", "uv"],
    },
];

pub const STATE_RULES: &[KeywordRule<TaskState>] = &[
    KeywordRule {
        label: TaskState::NotStarted,
        keywords: &["not start", "pending", "todo", "waiting"],
    },
    KeywordRule {
        label: TaskState::InProgress,
        keywords: &["progress", "working", "active", "ongoing", "implementing"],
    },
    KeywordRule {
        label: TaskState::Complete,
        keywords: &["complete", "done", "finish", "pass", "verified", "approved"],
    },
];

/// Case-insensitive substring match against an ordered rule table.
pub fn first_match<L: Copy>(rules: &[KeywordRule<L>], text: &str) -> Option<L> {
    let lower = text.to_lowercase();
    rules
        .iter()
        .find(|rule| rule.keywords.iter().any(|kw| lower.contains(kw)))
        .map(|rule| rule.label)
}

pub fn format_rules() -> [(FormatType, &'static Regex); 2] {
    [
        (FormatType::Checklist, &*CHECKLIST_RE),
        (FormatType::NumberedList, &*NUMBERED_RE),
    ]
}

pub fn classify_format(lines: &[String]) -> FormatType {
    let non_blank: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|l| !l.trim().is_empty())
        .collect();
    if non_blank.is_empty() {
        return FormatType::Custom;
    }

    for (format, shape) in format_rules() {
        let hits = non_blank.iter().filter(|l| shape.is_match(l)).count();
        if hits as f64 / non_blank.len() as f64 > FORMAT_SHARE_THRESHOLD {
            return format;
        }
    }
    FormatType::Custom
}

pub fn is_status_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    STATUS_LABEL_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

/// Map a raw field name onto its semantic field. Unknown names become a new
/// field named after the raw text.
pub fn semantic_field(raw: &str) -> String {
    match first_match(FIELD_RULES, raw) {
        Some(label) => label.to_string(),
        None => raw
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect::<Vec<_>>()
            .join("_"),
    }
}

pub fn semantic_state(raw: &str) -> Option<TaskState> {
    first_match(STATE_RULES, raw)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn checklist_checked_before_numbered() {
        // Both shapes clear the threshold; the checklist rule comes first.
        let doc = lines("- [ ] a\n- [x] b\n1. c\n2. d");
        assert_eq!(classify_format(&doc), FormatType::Checklist);
    }

    #[test]
    fn numbered_when_checklist_share_is_low() {
        let doc = lines("# Plan\n1. one\n2. two\nprose\n- [ ] stray");
        assert_eq!(classify_format(&doc), FormatType::NumberedList);
    }

    #[test]
    fn share_must_exceed_threshold() {
        // 3 of 10 lines is exactly 0.3, which does not exceed it.
        let doc = lines("- [ ] a\n- [ ] b\n- [ ] c\nx\nx\nx\nx\nx\nx\nx");
        assert_eq!(classify_format(&doc), FormatType::Custom);
    }

    #[test]
    fn blank_document_is_custom() {
        assert_eq!(classify_format(&lines("\n  \n")), FormatType::Custom);
    }

    #[test]
    fn field_rules_in_order() {
        assert_eq!(semantic_field("Dev Status"), "dev");
        assert_eq!(semantic_field("QA Status"), "qa");
        assert_eq!(semantic_field("Quality Gate"), "qa");
        assert_eq!(semantic_field("Test Status"), "qa");
        assert_eq!(semantic_field("User Verification Status"), "user_verification");
        assert_eq!(semantic_field("UV"), "user_verification");
        // "dev" wins over "test" because it is listed first.
        assert_eq!(semantic_field("Dev Test"), "dev");
    }

    #[test]
    fn unknown_field_becomes_new_field() {
        assert_eq!(semantic_field("Review Status"), "review_status");
        assert_eq!(semantic_field("Status"), "status");
    }

    #[test]
    fn state_rules() {
        assert_eq!(semantic_state("Not Started"), Some(TaskState::NotStarted));
        assert_eq!(semantic_state("TODO"), Some(TaskState::NotStarted));
        assert_eq!(semantic_state("In Progress"), Some(TaskState::InProgress));
        assert_eq!(semantic_state("Implementing"), Some(TaskState::InProgress));
        assert_eq!(semantic_state("Done"), Some(TaskState::Complete));
        assert_eq!(semantic_state("Passed"), Some(TaskState::Complete));
        assert_eq!(semantic_state("Blocked"), None);
    }

    #[test]
    fn status_labels() {
        assert!(is_status_label("Dev Status"));
        assert!(is_status_label("Review"));
        assert!(!is_status_label("Owner"));
    }
}
