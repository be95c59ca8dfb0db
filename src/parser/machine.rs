use std::collections::HashSet;
use std::fmt;
use std::mem;

use serde::Serialize;
use tracing::{debug, warn};

use super::task::Task;
use super::SchemaParser;
use crate::schema::TaskState;

/// Advisory findings from a parse. Never fatal; callers may ignore them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    UnknownField {
        line: usize,
        raw_field: String,
    },
    UnknownStatus {
        line: usize,
        field: String,
        raw_status: String,
    },
    DuplicateTaskId {
        line: usize,
        task_id: String,
    },
}

impl Diagnostic {
    pub fn line(&self) -> usize {
        match self {
            Self::UnknownField { line, .. }
            | Self::UnknownStatus { line, .. }
            | Self::DuplicateTaskId { line, .. } => *line,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownField { line, raw_field } => {
                write!(f, "line {}: unknown status field {:?} ignored", line, raw_field)
            }
            Self::UnknownStatus {
                line,
                field,
                raw_status,
            } => write!(
                f,
                "line {}: unknown {} status {:?}, treated as not_started",
                line, field, raw_status
            ),
            Self::DuplicateTaskId { line, task_id } => {
                write!(f, "line {}: duplicate task id {} dropped", line, task_id)
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParseReport {
    pub tasks: Vec<Task>,
    pub diagnostics: Vec<Diagnostic>,
}

enum LineState {
    NoCurrentTask,
    HasCurrentTask(Task),
}

/// Single forward pass over a document. A task line closes whatever task is
/// open and opens a new one; status lines only apply while a task is open;
/// end of input flushes the open task.
pub(crate) struct LineMachine<'p> {
    parser: &'p SchemaParser,
    state: LineState,
    seen_ids: HashSet<String>,
    report: ParseReport,
}

impl<'p> LineMachine<'p> {
    pub(crate) fn new(parser: &'p SchemaParser) -> Self {
        Self {
            parser,
            state: LineState::NoCurrentTask,
            seen_ids: HashSet::new(),
            report: ParseReport::default(),
        }
    }

    pub(crate) fn feed(&mut self, line_no: usize, line: &str) {
        if let Some(m) = self.parser.match_task_line(line) {
            let task = Task::open(
                &m.task_id,
                &m.description,
                self.parser.semantic_fields(),
                line_no,
            );
            self.open(task);
            return;
        }

        let LineState::HasCurrentTask(task) = &mut self.state else {
            return;
        };
        let Some(m) = self.parser.match_status_line(line) else {
            return;
        };

        let Some(field) = self.parser.normalize_field(&m.field) else {
            debug!(line = line_no, field = %m.field, "unknown status field");
            self.report.diagnostics.push(Diagnostic::UnknownField {
                line: line_no,
                raw_field: m.field,
            });
            return;
        };

        let state = match self.parser.normalize_state(field, &m.status) {
            Some(state) => state,
            None => {
                debug!(line = line_no, field, status = %m.status, "unknown status value");
                self.report.diagnostics.push(Diagnostic::UnknownStatus {
                    line: line_no,
                    field: field.to_string(),
                    raw_status: m.status,
                });
                TaskState::NotStarted
            }
        };
        task.states.insert(field.to_string(), state);
    }

    pub(crate) fn finish(mut self) -> ParseReport {
        if let LineState::HasCurrentTask(task) =
            mem::replace(&mut self.state, LineState::NoCurrentTask)
        {
            self.emit(task);
        }
        self.report
    }

    fn open(&mut self, task: Task) {
        if let LineState::HasCurrentTask(previous) =
            mem::replace(&mut self.state, LineState::HasCurrentTask(task))
        {
            self.emit(previous);
        }
    }

    fn emit(&mut self, task: Task) {
        if self.seen_ids.insert(task.task_id.clone()) {
            self.report.tasks.push(task);
        } else {
            warn!(line = task.line, task_id = %task.task_id, "duplicate task id dropped");
            self.report.diagnostics.push(Diagnostic::DuplicateTaskId {
                line: task.line,
                task_id: task.task_id,
            });
        }
    }
}
