pub mod machine;
pub mod structure;
pub mod task;

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{Result, SchemaError};
use crate::schema::{Schema, TaskState};
use machine::LineMachine;
use structure::CompiledPatterns;

pub use machine::{Diagnostic, ParseReport};
pub use task::Task;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskLineMatch {
    pub task_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLineMatch {
    pub field: String,
    pub status: String,
}

fn lookup_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Parses task documents with a schema that was structurally validated once,
/// at construction. The schema is shared read-only.
#[derive(Debug, Clone)]
pub struct SchemaParser {
    schema: Arc<Schema>,
    patterns: CompiledPatterns,
    fields: Vec<String>,
    field_lookup: HashMap<String, String>,
    state_lookup: HashMap<String, HashMap<String, TaskState>>,
}

impl SchemaParser {
    pub fn new(schema: impl Into<Arc<Schema>>) -> Result<Self> {
        let schema = schema.into();
        let patterns = structure::compile(&schema)?;
        let semantics = &schema.status_semantics;

        // First semantic field listing a raw name keeps it.
        let mut field_lookup = HashMap::new();
        for (field, raws) in &semantics.field_mapping {
            for raw in raws {
                field_lookup
                    .entry(lookup_key(raw))
                    .or_insert_with(|| field.clone());
            }
        }

        let state_lookup = semantics
            .states
            .iter()
            .map(|(field, table)| {
                let mut values = HashMap::new();
                for (state, raws) in table {
                    for raw in raws {
                        values.entry(lookup_key(raw)).or_insert(*state);
                    }
                }
                (field.clone(), values)
            })
            .collect();

        Ok(Self {
            fields: semantics.semantic_fields(),
            schema,
            patterns,
            field_lookup,
            state_lookup,
        })
    }

    /// Parser over the built-in checklist convention.
    pub fn builtin() -> Result<Self> {
        Self::new(Schema::builtin())
    }

    /// Checks required keys on the raw document before typed decoding.
    pub fn from_value(doc: serde_json::Value) -> Result<Self> {
        Self::new(Schema::from_value(doc)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        Self::new(Schema::load(path)?)
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn shared_schema(&self) -> Arc<Schema> {
        Arc::clone(&self.schema)
    }

    pub fn semantic_fields(&self) -> &[String] {
        &self.fields
    }

    /// Occurrences of the bare task-id pattern anywhere in `text`.
    pub fn count_task_ids(&self, text: &str) -> usize {
        self.patterns.task_id.find_iter(text).count()
    }

    pub fn match_task_line(&self, line: &str) -> Option<TaskLineMatch> {
        let caps = self.patterns.task_line.captures(line)?;
        Some(TaskLineMatch {
            task_id: caps.name("task_id")?.as_str().trim().to_string(),
            description: caps
                .name("description")
                .map(|m| m.as_str().trim().to_string())
                .unwrap_or_default(),
        })
    }

    pub fn match_status_line(&self, line: &str) -> Option<StatusLineMatch> {
        let caps = self.patterns.status_line.captures(line)?;
        Some(StatusLineMatch {
            field: caps.name("field")?.as_str().trim().to_string(),
            status: caps.name("status")?.as_str().trim().to_string(),
        })
    }

    /// Raw field name → semantic field, case-insensitive.
    pub fn normalize_field(&self, raw: &str) -> Option<&str> {
        self.field_lookup.get(&lookup_key(raw)).map(String::as_str)
    }

    /// Raw value → semantic state within one field's table, case-insensitive.
    pub fn normalize_state(&self, field: &str, raw: &str) -> Option<TaskState> {
        self.state_lookup.get(field)?.get(&lookup_key(raw)).copied()
    }

    pub fn parse_str(&self, text: &str) -> ParseReport {
        let mut machine = LineMachine::new(self);
        for (idx, line) in text.lines().enumerate() {
            machine.feed(idx + 1, line);
        }
        machine.finish()
    }

    pub fn parse_report(&self, path: &Path) -> Result<ParseReport> {
        let text = fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        let report = self.parse_str(&text);
        info!(
            path = %path.display(),
            tasks = report.tasks.len(),
            diagnostics = report.diagnostics.len(),
            "parsed task document"
        );
        Ok(report)
    }

    pub fn parse(&self, path: &Path) -> Result<Vec<Task>> {
        Ok(self.parse_report(path)?.tasks)
    }
}
