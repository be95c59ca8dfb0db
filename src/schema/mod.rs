pub mod patterns;
pub mod rules;

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SchemaError};

pub const SCHEMA_VERSION: &str = "1.0";
pub const SUPPORTED_VERSIONS: &[&str] = &[SCHEMA_VERSION];

pub const TASK_LINE: &str = "task_line";
pub const STATUS_LINE: &str = "status_line";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatType {
    Checklist,
    NumberedList,
    Custom,
}

/// Semantic state every raw status value normalizes into.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    #[default]
    NotStarted,
    InProgress,
    Complete,
}

impl TaskState {
    pub const ALL: [TaskState; 3] = [Self::NotStarted, Self::InProgress, Self::Complete];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Complete => "complete",
        }
    }
}

impl fmt::Display for TaskState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which line shape a pattern recognizes. Drives the required-group check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    TaskLine,
    StatusLine,
}

impl PatternKind {
    pub const ALL: [PatternKind; 2] = [Self::TaskLine, Self::StatusLine];

    pub fn key(self) -> &'static str {
        match self {
            Self::TaskLine => TASK_LINE,
            Self::StatusLine => STATUS_LINE,
        }
    }

    pub fn required_groups(self) -> &'static [&'static str] {
        match self {
            Self::TaskLine => &["task_id", "description"],
            Self::StatusLine => &["field", "status"],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternSpec {
    pub regex: String,
    pub groups: Vec<String>,
    pub example: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskIdFormat {
    pub prefix: String,
    pub separator: Option<char>,
    pub digits: usize,
    pub pattern: String,
    pub example: String,
}

impl TaskIdFormat {
    pub fn new(prefix: &str, separator: Option<char>, digits: usize) -> Self {
        let sep = separator.map(String::from).unwrap_or_default();
        Self {
            prefix: prefix.to_string(),
            separator,
            digits,
            pattern: format!(
                r"{}{}\d{{{}}}",
                regex::escape(prefix),
                regex::escape(&sep),
                digits
            ),
            example: format!("{}{}{:0width$}", prefix, sep, 1, width = digits),
        }
    }
}

impl Default for TaskIdFormat {
    fn default() -> Self {
        Self::new("T", None, 3)
    }
}

pub type StateTable = BTreeMap<TaskState, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSemantics {
    pub field_mapping: BTreeMap<String, Vec<String>>,
    pub states: BTreeMap<String, StateTable>,
}

impl StatusSemantics {
    /// The dev / qa / user_verification convention.
    pub fn builtin() -> Self {
        let strings = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let field_mapping = BTreeMap::from([
            (
                "dev".to_string(),
                strings(&["Dev Status", "Development Status", "Dev"]),
            ),
            (
                "qa".to_string(),
                strings(&["QA Status", "QA", "Quality Assurance", "Test Status"]),
            ),
            (
                "user_verification".to_string(),
                strings(&[
                    "User Verification Status",
                    "User Verification",
                    "UV Status",
                    "Verification",
                ]),
            ),
        ]);

        let table = StateTable::from([
            (
                TaskState::NotStarted,
                strings(&["Not Started", "Pending", "TODO", "Waiting"]),
            ),
            (
                TaskState::InProgress,
                strings(&["In Progress", "Working", "Active", "Ongoing"]),
            ),
            (
                TaskState::Complete,
                strings(&[
                    "Complete", "Completed", "Done", "Passed", "Verified", "Approved",
                ]),
            ),
        ]);
        let states = field_mapping
            .keys()
            .map(|field| (field.clone(), table.clone()))
            .collect();

        Self {
            field_mapping,
            states,
        }
    }

    /// Every semantic field named under either table, in sorted order.
    pub fn semantic_fields(&self) -> Vec<String> {
        self.field_mapping
            .keys()
            .chain(self.states.keys())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub generated_at: DateTime<Utc>,
    pub sample_size: usize,
    pub tasks_found: usize,
    pub confidence: f64,
    pub source: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationInfo {
    pub match_rate: f64,
    pub sample_size: usize,
    pub passed: bool,
    pub validated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub schema_version: String,
    pub format_type: FormatType,
    pub patterns: BTreeMap<String, PatternSpec>,
    pub task_id_format: TaskIdFormat,
    pub status_semantics: StatusSemantics,
    pub metadata: Metadata,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationInfo>,
}

impl Schema {
    /// Zero-configuration schema: `- [ ] - **T001: ...**` checklists with
    /// dev / qa / user verification status lines.
    pub fn builtin() -> Self {
        let format_type = FormatType::Checklist;
        let task_id_format = TaskIdFormat::default();
        let patterns = BTreeMap::from([
            (
                TASK_LINE.to_string(),
                patterns::task_line(format_type, &task_id_format),
            ),
            (
                STATUS_LINE.to_string(),
                patterns::status_line(format_type, None),
            ),
        ]);

        Self {
            schema_version: SCHEMA_VERSION.to_string(),
            format_type,
            patterns,
            task_id_format,
            status_semantics: StatusSemantics::builtin(),
            metadata: Metadata {
                generated_at: DateTime::<Utc>::default(),
                sample_size: 0,
                tasks_found: 0,
                confidence: 1.0,
                source: "builtin".to_string(),
            },
            validation: None,
        }
    }

    pub fn pattern(&self, kind: PatternKind) -> Option<&PatternSpec> {
        self.patterns.get(kind.key())
    }

    /// Read a persisted schema, rejecting documents that lack required keys
    /// before attempting typed deserialization.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        let doc: serde_json::Value = serde_json::from_str(&raw)?;
        Self::from_value(doc)
    }

    pub fn from_value(doc: serde_json::Value) -> Result<Self> {
        crate::parser::structure::check_document(&doc)?;
        Ok(serde_json::from_value(doc)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|e| SchemaError::io(path, e))
    }
}
