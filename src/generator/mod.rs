pub mod fields;
pub mod task_ids;

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use chrono::Utc;
use itertools::Itertools;
use tracing::{debug, info};

use crate::error::{Result, SchemaError};
use crate::schema::{
    patterns, rules, Metadata, Schema, StatusSemantics, SCHEMA_VERSION, STATUS_LINE, TASK_LINE,
};

pub const DEFAULT_SAMPLE_LINES: usize = 500;

/// Infers a schema from a bounded prefix of a task document.
#[derive(Debug, Clone)]
pub struct SchemaGenerator {
    sample_lines: usize,
}

impl Default for SchemaGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_LINES)
    }
}

impl SchemaGenerator {
    pub fn new(sample_lines: usize) -> Self {
        Self { sample_lines }
    }

    pub fn sample_lines(&self) -> usize {
        self.sample_lines
    }

    /// `source` labels the schema's origin; defaults to the document path.
    pub fn generate(&self, path: &Path, source: Option<&str>) -> Result<Schema> {
        let file = File::open(path).map_err(|e| SchemaError::io(path, e))?;
        let lines = BufReader::new(file)
            .lines()
            .take(self.sample_lines)
            .map(|l| l.map(|l| l.trim_end().to_string()))
            .collect::<std::io::Result<Vec<_>>>()
            .map_err(|e| SchemaError::io(path, e))?;

        let source = source
            .map(str::to_string)
            .unwrap_or_else(|| path.display().to_string());
        Ok(self.generate_from_lines(&lines, &source))
    }

    /// Never fails: documents without tasks or status pairs yield a schema
    /// built from the defaults.
    pub fn generate_from_lines(&self, lines: &[String], source: &str) -> Schema {
        let lines = &lines[..lines.len().min(self.sample_lines)];
        let format_type = rules::classify_format(lines);

        let candidates = task_ids::candidates(lines);
        let task_id_format = candidates
            .first()
            .and_then(|c| task_ids::infer_format(c))
            .unwrap_or_default();
        let tasks_found = candidates.iter().unique().count();
        if candidates.is_empty() {
            debug!(source, "no task id candidates, using default id format");
        }

        let observed = fields::group_pairs(fields::extract_pairs(lines));
        let example_pair = observed
            .first_key_value()
            .and_then(|(label, values)| values.iter().next().map(|v| (label.as_str(), v.as_str())));

        let patterns = BTreeMap::from([
            (
                TASK_LINE.to_string(),
                patterns::task_line(format_type, &task_id_format),
            ),
            (
                STATUS_LINE.to_string(),
                patterns::status_line(format_type, example_pair),
            ),
        ]);

        let status_semantics = if observed.is_empty() {
            debug!(source, "no status pairs found, using builtin status semantics");
            StatusSemantics::builtin()
        } else {
            fields::normalize(&observed)
        };

        let confidence = confidence_for(tasks_found);
        info!(
            source,
            format = ?format_type,
            task_id = %task_id_format.example,
            tasks_found,
            fields = status_semantics.field_mapping.len(),
            confidence,
            "generated schema"
        );

        Schema {
            schema_version: SCHEMA_VERSION.to_string(),
            format_type,
            patterns,
            task_id_format,
            status_semantics,
            metadata: Metadata {
                generated_at: Utc::now(),
                sample_size: lines.len(),
                tasks_found,
                confidence,
                source: source.to_string(),
            },
            validation: None,
        }
    }
}

/// Piecewise evidence score: 0.5 below 5 tasks, 0.6 for 5-9, a linear ramp
/// from 0.7 to 1.0 across 10-50, and 1.0 from 50 up.
pub fn confidence_for(tasks_found: usize) -> f64 {
    match tasks_found {
        n if n >= 50 => 1.0,
        n @ 10..=49 => 0.7 + 0.3 * (n - 10) as f64 / 40.0,
        5..=9 => 0.6,
        _ => 0.5,
    }
}

pub fn generate(path: &Path, source: Option<&str>) -> Result<Schema> {
    SchemaGenerator::default().generate(path, source)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::schema::{FormatType, TaskState};

    fn fixture(name: &str) -> Schema {
        generate(Path::new(&format!("tests/fixtures/{}.md", name)), Some(name)).unwrap()
    }

    #[test]
    fn confidence_piecewise() {
        assert_eq!(confidence_for(0), 0.5);
        assert_eq!(confidence_for(4), 0.5);
        assert_eq!(confidence_for(5), 0.6);
        assert_eq!(confidence_for(7), 0.6);
        assert_eq!(confidence_for(10), 0.7);
        let mid = confidence_for(30);
        assert!(mid > 0.7 && mid < 1.0, "{mid}");
        assert!((mid - 0.85).abs() < 1e-9);
        assert_eq!(confidence_for(50), 1.0);
        assert_eq!(confidence_for(60), 1.0);
    }

    #[test]
    fn checklist_fixture() {
        let schema = fixture("checklist");
        assert_eq!(schema.format_type, FormatType::Checklist);
        assert_eq!(schema.task_id_format.example, "T001");
        assert_eq!(schema.metadata.tasks_found, 12);
        assert_eq!(schema.metadata.source, "checklist");
        assert!((schema.metadata.confidence - 0.715).abs() < 1e-9);

        let mapping = &schema.status_semantics.field_mapping;
        assert_eq!(mapping["dev"], vec!["Dev Status"]);
        assert_eq!(mapping["qa"], vec!["QA Status"]);
        assert_eq!(mapping["user_verification"], vec!["User Verification Status"]);

        let dev = &schema.status_semantics.states["dev"];
        assert_eq!(dev[&TaskState::InProgress], vec!["In Progress"]);
        let uv = &schema.status_semantics.states["user_verification"];
        assert!(!uv.contains_key(&TaskState::InProgress));
    }

    #[test]
    fn numbered_fixture() {
        let schema = fixture("numbered");
        assert_eq!(schema.format_type, FormatType::NumberedList);
        let id = &schema.task_id_format;
        assert_eq!((id.prefix.as_str(), id.separator, id.digits), ("TASK", Some('-'), 2));
        assert_eq!(schema.metadata.tasks_found, 6);
        assert_eq!(schema.metadata.confidence, 0.6);
        let mapping = &schema.status_semantics.field_mapping;
        assert!(mapping.contains_key("status"));
        assert!(mapping.contains_key("review"));
    }

    #[test]
    fn custom_fixture() {
        let schema = fixture("custom");
        assert_eq!(schema.format_type, FormatType::Custom);
        assert_eq!(schema.task_id_format.pattern, r"FEAT_\d{4}");
        assert_eq!(schema.metadata.tasks_found, 4);
        assert_eq!(schema.metadata.confidence, 0.5);
        let qa = &schema.status_semantics.states["qa"];
        assert!(qa[&TaskState::NotStarted].contains(&"Testing".to_string()));
    }

    #[test]
    fn prose_only_document_falls_back_to_defaults() {
        let schema = fixture("prose");
        assert_eq!(schema.format_type, FormatType::Custom);
        assert_eq!(schema.task_id_format.example, "T001");
        assert_eq!(schema.metadata.tasks_found, 0);
        assert_eq!(schema.metadata.confidence, 0.5);
        assert_eq!(schema.status_semantics, StatusSemantics::builtin());
    }

    #[test]
    fn empty_file_yields_valid_schema() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let schema = generate(file.path(), None).unwrap();
        assert_eq!(schema.metadata.sample_size, 0);
        assert_eq!(schema.metadata.source, file.path().display().to_string());
        crate::parser::SchemaParser::new(schema).unwrap();
    }

    #[test]
    fn sample_is_bounded() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for i in 1..=40 {
            writeln!(file, "- [ ] - **T{:03}: task {}**", i, i).unwrap();
        }
        let schema = SchemaGenerator::new(15).generate(file.path(), None).unwrap();
        assert_eq!(schema.metadata.sample_size, 15);
        assert_eq!(schema.metadata.tasks_found, 15);
    }

    #[test]
    fn generation_is_deterministic() {
        let mut first = fixture("checklist");
        let second = fixture("checklist");
        first.metadata.generated_at = second.metadata.generated_at;
        pretty_assertions::assert_eq!(first, second);
    }

    #[test]
    fn missing_document_is_io_error() {
        let err = generate(Path::new("tests/fixtures/missing.md"), None).unwrap_err();
        assert!(matches!(err, SchemaError::Io { .. }));
    }
}
