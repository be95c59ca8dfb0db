use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::Regex;

use crate::schema::rules;
use crate::schema::{StateTable, StatusSemantics, TaskState};

// Tolerates leading markdown noise: indentation, bullets, quotes, headings,
// ordinals, checkboxes and bold markers.
static LABEL_VALUE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:\s|[>#*+\-]|\d+[.)]|\[[ xX]\])*\**(?P<label>[A-Za-z][A-Za-z0-9 _/\-]*?)\**\s*:\s*\[(?P<value>[^\]]+)\]",
    )
    .unwrap()
});

/// Raw label → sorted, deduplicated values seen for it.
pub type Observations = BTreeMap<String, BTreeSet<String>>;

pub fn extract_pairs(lines: &[String]) -> Vec<(String, String)> {
    lines
        .iter()
        .filter_map(|l| LABEL_VALUE_RE.captures(l))
        .map(|c| (c["label"].trim().to_string(), c["value"].trim().to_string()))
        .filter(|(label, value)| !value.is_empty() && rules::is_status_label(label))
        .collect()
}

pub fn group_pairs(pairs: Vec<(String, String)>) -> Observations {
    let mut grouped = Observations::new();
    for (label, value) in pairs {
        grouped.entry(label).or_default().insert(value);
    }
    grouped
}

/// Fold raw labels into semantic fields and bucket their values by state.
pub fn normalize(observed: &Observations) -> StatusSemantics {
    let mut field_mapping: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    let mut values: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for (raw, seen) in observed {
        let field = rules::semantic_field(raw);
        field_mapping
            .entry(field.clone())
            .or_default()
            .insert(raw.clone());
        values.entry(field).or_default().extend(seen.iter().cloned());
    }

    StatusSemantics {
        field_mapping: field_mapping
            .into_iter()
            .map(|(field, raws)| (field, raws.into_iter().collect()))
            .collect(),
        states: values
            .into_iter()
            .map(|(field, seen)| (field, bucket_states(&seen)))
            .collect(),
    }
}

fn bucket_states(values: &BTreeSet<String>) -> StateTable {
    let mut table: StateTable = TaskState::ALL.iter().map(|s| (*s, Vec::new())).collect();
    for value in values {
        let state = rules::semantic_state(value).unwrap_or_default();
        table.entry(state).or_default().push(value.clone());
    }

    let no_progress = table
        .get(&TaskState::InProgress)
        .is_some_and(Vec::is_empty);
    if values.len() <= 2 && no_progress {
        table.remove(&TaskState::InProgress);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(text: &str) -> Vec<String> {
        text.lines().map(str::to_string).collect()
    }

    #[test]
    fn pairs_tolerate_markdown_noise() {
        let doc = lines(
            "- [ ] - Dev Status: [Not Started]\n   - QA Status: [Done]\n**Review**: [Approved]\n> State: [active]\nOwner: [alice]\n- [ ] - **T001: Add login**",
        );
        let pairs = extract_pairs(&doc);
        assert_eq!(
            pairs,
            vec![
                ("Dev Status".to_string(), "Not Started".to_string()),
                ("QA Status".to_string(), "Done".to_string()),
                ("Review".to_string(), "Approved".to_string()),
                ("State".to_string(), "active".to_string()),
            ]
        );
    }

    #[test]
    fn grouping_sorts_and_dedups() {
        let pairs = vec![
            ("Dev Status".to_string(), "Done".to_string()),
            ("Dev Status".to_string(), "Blocked".to_string()),
            ("Dev Status".to_string(), "Done".to_string()),
        ];
        let grouped = group_pairs(pairs);
        let values: Vec<_> = grouped["Dev Status"].iter().cloned().collect();
        assert_eq!(values, vec!["Blocked", "Done"]);
    }

    #[test]
    fn raw_labels_merge_into_one_field() {
        let observed = group_pairs(vec![
            ("QA Status".to_string(), "Passed".to_string()),
            ("Test Status".to_string(), "Testing".to_string()),
            ("Test Status".to_string(), "In Progress".to_string()),
        ]);
        let semantics = normalize(&observed);
        assert_eq!(
            semantics.field_mapping["qa"],
            vec!["QA Status".to_string(), "Test Status".to_string()]
        );
        let qa = &semantics.states["qa"];
        assert_eq!(qa[&TaskState::Complete], vec!["Passed"]);
        assert_eq!(qa[&TaskState::InProgress], vec!["In Progress"]);
        // Unrecognized values fall back to not_started.
        assert_eq!(qa[&TaskState::NotStarted], vec!["Testing"]);
    }

    #[test]
    fn empty_progress_bucket_dropped_for_small_vocabularies() {
        let observed = group_pairs(vec![
            ("User Verification".to_string(), "Pending".to_string()),
            ("User Verification".to_string(), "Verified".to_string()),
        ]);
        let table = &normalize(&observed).states["user_verification"];
        assert!(!table.contains_key(&TaskState::InProgress));
        assert!(table.contains_key(&TaskState::NotStarted));
        assert!(table.contains_key(&TaskState::Complete));
    }

    #[test]
    fn empty_progress_bucket_kept_for_larger_vocabularies() {
        let observed = group_pairs(vec![
            ("Dev".to_string(), "Pending".to_string()),
            ("Dev".to_string(), "Blocked".to_string()),
            ("Dev".to_string(), "Done".to_string()),
        ]);
        let table = &normalize(&observed).states["dev"];
        assert_eq!(table.get(&TaskState::InProgress), Some(&Vec::new()));
    }
}
