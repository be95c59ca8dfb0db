use std::collections::BTreeMap;

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::schema::TaskState;

pub const MAX_KEYWORDS: usize = 10;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "from", "that", "this", "into", "onto", "are", "was", "were",
    "will", "should", "must", "have", "has", "not", "but", "all", "any", "its", "our", "your",
    "their", "via", "per", "when", "then", "than", "also", "can",
];

/// One parsed task block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub task_id: String,
    pub description: String,
    pub states: BTreeMap<String, TaskState>,
    pub keywords: Vec<String>,
    /// 1-based line of the task line.
    pub line: usize,
}

impl Task {
    pub(crate) fn open(task_id: &str, description: &str, fields: &[String], line: usize) -> Self {
        Self {
            task_id: task_id.to_string(),
            description: description.to_string(),
            states: fields
                .iter()
                .map(|f| (f.clone(), TaskState::NotStarted))
                .collect(),
            keywords: extract_keywords(description),
            line,
        }
    }

    pub fn state(&self, field: &str) -> TaskState {
        self.states.get(field).copied().unwrap_or_default()
    }

    /// True when every tracked field is complete.
    pub fn is_complete(&self) -> bool {
        !self.states.is_empty() && self.states.values().all(|s| *s == TaskState::Complete)
    }
}

/// Up to ten distinct lowercase words of three or more characters, in order
/// of first appearance, minus stop-words.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 3 && !STOP_WORDS.contains(w))
        .unique()
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_drop_short_and_stop_words() {
        assert_eq!(
            extract_keywords("Add the OAuth login for an API"),
            vec!["add", "oauth", "login", "api"]
        );
    }

    #[test]
    fn keywords_dedup_and_cap() {
        let text = "alpha beta gamma delta alpha epsilon zeta theta iota kappa lambda omicron";
        let words = extract_keywords(text);
        assert_eq!(words.len(), MAX_KEYWORDS);
        assert_eq!(words[0], "alpha");
        assert_eq!(words.iter().filter(|w| *w == "alpha").count(), 1);
        assert!(!words.contains(&"omicron".to_string()));
    }

    #[test]
    fn new_task_starts_not_started() {
        let fields = vec!["dev".to_string(), "qa".to_string()];
        let task = Task::open("T001", "Add login", &fields, 3);
        assert_eq!(task.state("dev"), TaskState::NotStarted);
        assert_eq!(task.state("qa"), TaskState::NotStarted);
        assert_eq!(task.state("unknown"), TaskState::NotStarted);
        assert!(!task.is_complete());
    }

    #[test]
    fn complete_requires_every_field() {
        let fields = vec!["dev".to_string(), "qa".to_string()];
        let mut task = Task::open("T001", "Add login", &fields, 1);
        task.states.insert("dev".to_string(), TaskState::Complete);
        assert!(!task.is_complete());
        task.states.insert("qa".to_string(), TaskState::Complete);
        assert!(task.is_complete());
    }
}
