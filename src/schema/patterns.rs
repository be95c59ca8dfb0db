use super::{FormatType, PatternSpec, TaskIdFormat};

const CHECKLIST_TASK_HEAD: &str = r"^\s*[-*+]\s+\[(?P<checkbox>[ xX])\]\s*(?:-\s*)?";
const NUMBERED_TASK_HEAD: &str = r"^\s*(?P<ordinal>\d+)[.)]\s+";
const CUSTOM_TASK_HEAD: &str = r"^\s*(?:#{1,6}\s+)?(?:[-*+]\s+)?";
// The id must be followed by a separator, whitespace or end of line, so a
// longer number is never split into id and description.
const TASK_TAIL: &str =
    r"(?:\*\*|__)?(?:\s*[:.\-]\s*|\s+|$)(?P<description>.*?)\s*(?:\*\*|__)?\s*$";

// Checkbox is optional: status lines are often plain bullets under a task.
const CHECKLIST_STATUS_HEAD: &str = r"^\s*(?:[-*+]\s+)?(?:\[[ xX]\]\s*)?(?:-\s*)?";
const LOOSE_STATUS_HEAD: &str = r"^\s*(?:(?:\d+[.)]|[-*+>])\s+)?";
const STATUS_TAIL: &str =
    r"\**(?P<field>[A-Za-z][A-Za-z0-9 _/\-]*?)\**\s*:\s*\[(?P<status>[^\]]+)\]";

const DEFAULT_FIELD: &str = "Status";
const DEFAULT_VALUE: &str = "Not Started";

pub fn task_line(format: FormatType, id: &TaskIdFormat) -> PatternSpec {
    let (head, extra_group, example) = match format {
        FormatType::Checklist => (
            CHECKLIST_TASK_HEAD,
            Some("checkbox"),
            format!("- [ ] - **{}: Example task**", id.example),
        ),
        FormatType::NumberedList => (
            NUMBERED_TASK_HEAD,
            Some("ordinal"),
            format!("1. **{}**: Example task", id.example),
        ),
        FormatType::Custom => (
            CUSTOM_TASK_HEAD,
            None,
            format!("## {}: Example task", id.example),
        ),
    };

    let regex = [head, r"(?:\*\*|__)?(?P<task_id>", id.pattern.as_str(), ")", TASK_TAIL].concat();
    let groups = extra_group
        .into_iter()
        .chain(["task_id", "description"])
        .map(str::to_string)
        .collect();

    PatternSpec {
        regex,
        groups,
        example,
    }
}

/// `observed` is one (field, value) pair seen in the document, used for the example.
pub fn status_line(format: FormatType, observed: Option<(&str, &str)>) -> PatternSpec {
    let (field, value) = observed.unwrap_or((DEFAULT_FIELD, DEFAULT_VALUE));
    let (head, example) = match format {
        FormatType::Checklist => (
            CHECKLIST_STATUS_HEAD,
            format!("- [ ] - {}: [{}]", field, value),
        ),
        FormatType::NumberedList => (LOOSE_STATUS_HEAD, format!("   - {}: [{}]", field, value)),
        FormatType::Custom => (LOOSE_STATUS_HEAD, format!("{}: [{}]", field, value)),
    };

    PatternSpec {
        regex: [head, STATUS_TAIL].concat(),
        groups: vec!["field".to_string(), "status".to_string()],
        example,
    }
}
