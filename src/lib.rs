//! Schema-driven task status extraction.
//!
//! Three pieces: [`generator`] infers a [`Schema`] from a sample of a
//! markdown task document, [`validator`] checks that schema against a
//! document, and [`parser`] turns documents into [`Task`] records.

pub mod error;
pub mod generator;
pub mod parser;
pub mod schema;
pub mod settings;
pub mod validator;

pub use error::{Result, SchemaError};
pub use generator::{generate, SchemaGenerator};
pub use parser::{Diagnostic, ParseReport, SchemaParser, Task};
pub use schema::{FormatType, Schema, TaskState};
pub use settings::Settings;
pub use validator::{annotate, validate, SchemaValidator, ValidationReport};
