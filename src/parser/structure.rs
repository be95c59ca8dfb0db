use std::collections::HashSet;

use regex::Regex;
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::schema::{PatternKind, Schema, SUPPORTED_VERSIONS};

const TASK_ID_FORMAT: &str = "task_id_format";

/// Compiled patterns of a schema that passed structural validation.
#[derive(Debug, Clone)]
pub struct CompiledPatterns {
    pub task_line: Regex,
    pub status_line: Regex,
    pub task_id: Regex,
}

pub fn check_version(version: &str) -> Result<()> {
    if SUPPORTED_VERSIONS.contains(&version) {
        Ok(())
    } else {
        Err(SchemaError::UnsupportedVersion {
            found: version.to_string(),
            supported: SUPPORTED_VERSIONS.join(", "),
        })
    }
}

/// Required-key checks on an untyped schema document. Runs before serde so a
/// missing key is reported by name instead of as a generic decode failure.
pub fn check_document(doc: &Value) -> Result<()> {
    let obj = doc
        .as_object()
        .ok_or_else(|| SchemaError::Malformed("schema document must be an object".to_string()))?;

    let version = obj
        .get("schema_version")
        .ok_or_else(|| SchemaError::missing_key("schema_version"))?
        .as_str()
        .ok_or_else(|| SchemaError::Malformed("`schema_version` must be a string".to_string()))?;
    check_version(version)?;

    let patterns = obj
        .get("patterns")
        .ok_or_else(|| SchemaError::missing_key("patterns"))?;
    for kind in PatternKind::ALL {
        let pattern = patterns
            .get(kind.key())
            .ok_or_else(|| SchemaError::MissingPattern(kind.key().to_string()))?;
        if !pattern.get("regex").is_some_and(Value::is_string) {
            return Err(SchemaError::missing_key(format!(
                "patterns.{}.regex",
                kind.key()
            )));
        }
    }

    let semantics = obj
        .get("status_semantics")
        .ok_or_else(|| SchemaError::missing_key("status_semantics"))?;
    for key in ["field_mapping", "states"] {
        if semantics.get(key).is_none() {
            return Err(SchemaError::missing_key(format!("status_semantics.{}", key)));
        }
    }

    Ok(())
}

/// Version check plus compile-and-inspect of both line patterns and the
/// bare task-id pattern.
pub fn compile(schema: &Schema) -> Result<CompiledPatterns> {
    check_version(&schema.schema_version)?;
    Ok(CompiledPatterns {
        task_line: compile_pattern(schema, PatternKind::TaskLine)?,
        status_line: compile_pattern(schema, PatternKind::StatusLine)?,
        task_id: Regex::new(&schema.task_id_format.pattern).map_err(|source| {
            SchemaError::InvalidPattern {
                pattern: TASK_ID_FORMAT.to_string(),
                source,
            }
        })?,
    })
}

fn compile_pattern(schema: &Schema, kind: PatternKind) -> Result<Regex> {
    let name = kind.key();
    let spec = schema
        .pattern(kind)
        .ok_or_else(|| SchemaError::MissingPattern(name.to_string()))?;

    let re = Regex::new(&spec.regex).map_err(|source| SchemaError::InvalidPattern {
        pattern: name.to_string(),
        source,
    })?;

    // Declared groups must exist too, not only the ones the parser reads.
    let exposed: HashSet<&str> = re.capture_names().flatten().collect();
    let wanted = kind
        .required_groups()
        .iter()
        .copied()
        .chain(spec.groups.iter().map(String::as_str));
    for group in wanted {
        if !exposed.contains(group) {
            return Err(SchemaError::MissingGroup {
                pattern: name.to_string(),
                group: group.to_string(),
            });
        }
    }
    Ok(re)
}
