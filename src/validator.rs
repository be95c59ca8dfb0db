use std::fs;
use std::path::Path;

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::error::{Result, SchemaError};
use crate::parser::SchemaParser;
use crate::schema::{Schema, ValidationInfo};

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.95;
pub const DEFAULT_MIN_SAMPLE_SIZE: usize = 10;

const PASS_CONFIDENCE_BOOST: f64 = 1.1;
const FAIL_CONFIDENCE: f64 = 0.5;

/// Outcome of checking a schema against a document. A failed check is a
/// fitness judgment, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub passed: bool,
    pub match_rate: f64,
    pub matched: usize,
    pub expected: usize,
    pub errors: Vec<String>,
}

impl ValidationReport {
    fn rejected(matched: usize, expected: usize, error: String) -> Self {
        Self {
            passed: false,
            match_rate: 0.0,
            matched,
            expected,
            errors: vec![error],
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchemaValidator {
    threshold: f64,
    min_sample_size: usize,
}

impl Default for SchemaValidator {
    fn default() -> Self {
        Self::new(DEFAULT_MATCH_THRESHOLD, DEFAULT_MIN_SAMPLE_SIZE)
    }
}

impl SchemaValidator {
    pub fn new(threshold: f64, min_sample_size: usize) -> Self {
        Self {
            threshold,
            min_sample_size,
        }
    }

    /// Parse `path` with `schema` and compare the recovered task count with
    /// `expected`, or with a raw count of task-id occurrences when omitted.
    /// Only I/O failures are returned as errors.
    pub fn validate(
        &self,
        schema: &Schema,
        path: &Path,
        expected: Option<usize>,
    ) -> Result<ValidationReport> {
        let parser = match SchemaParser::new(schema.clone()) {
            Ok(parser) => parser,
            Err(err) => {
                warn!(error = %err, "schema failed structural validation");
                return Ok(ValidationReport::rejected(0, expected.unwrap_or(0), err.to_string()));
            }
        };

        let text = fs::read_to_string(path).map_err(|e| SchemaError::io(path, e))?;
        let matched = parser.parse_str(&text).tasks.len();

        let expected = expected.unwrap_or_else(|| parser.count_task_ids(&text));

        if expected == 0 {
            return Ok(ValidationReport::rejected(
                matched,
                0,
                "no tasks found in document (expected count is zero)".to_string(),
            ));
        }

        let match_rate = matched as f64 / expected as f64;
        let mut errors = Vec::new();
        if match_rate < self.threshold {
            errors.push(format!(
                "match rate {:.1}% is below threshold {:.1}% ({} of {} tasks)",
                match_rate * 100.0,
                self.threshold * 100.0,
                matched,
                expected
            ));
        }
        if matched < self.min_sample_size {
            errors.push(format!(
                "only {} tasks matched, minimum sample size is {}",
                matched, self.min_sample_size
            ));
        }

        let report = ValidationReport {
            passed: errors.is_empty(),
            match_rate,
            matched,
            expected,
            errors,
        };
        info!(
            path = %path.display(),
            passed = report.passed,
            matched,
            expected,
            match_rate,
            "validated schema"
        );
        Ok(report)
    }
}

/// New schema carrying the validation outcome. Passing boosts confidence by
/// 10% (capped at 1.0); failing resets it to 0.5.
pub fn annotate(schema: &Schema, report: &ValidationReport) -> Schema {
    let mut annotated = schema.clone();
    annotated.metadata.confidence = if report.passed {
        (schema.metadata.confidence * PASS_CONFIDENCE_BOOST).min(1.0)
    } else {
        FAIL_CONFIDENCE
    };
    annotated.validation = Some(ValidationInfo {
        match_rate: report.match_rate,
        sample_size: report.matched,
        passed: report.passed,
        validated_at: Utc::now(),
    });
    annotated
}

pub fn validate(schema: &Schema, path: &Path, expected: Option<usize>) -> Result<ValidationReport> {
    SchemaValidator::default().validate(schema, path, expected)
}
