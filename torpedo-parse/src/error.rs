use thiserror::Error;

/// Failures the line-oriented instance parser can produce. Kept distinct
/// from `torpedo_core::SchedulingError` since these are about the text
/// format, not the instance's own semantics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("line {line}: unknown property {name:?}")]
    UnknownProperty { line: usize, name: String },

    #[error("line {line}: malformed property line {raw:?}")]
    MalformedProperty { line: usize, raw: String },

    #[error("line {line}: malformed BF line {raw:?}")]
    MalformedBf { line: usize, raw: String },

    #[error("line {line}: malformed converter line {raw:?}")]
    MalformedConverter { line: usize, raw: String },

    #[error("line {line}: unrecognized line kind {raw:?}")]
    UnrecognizedLine { line: usize, raw: String },

    #[error("missing required property {0:?}")]
    MissingProperty(&'static str),

    #[error(transparent)]
    Instance(#[from] torpedo_core::SchedulingError),
}
