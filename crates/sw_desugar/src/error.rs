use sw_parser::{EmitError, ParseError};

/// Why a transform call produced no output.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    #[error(transparent)]
    Parse(#[from] ParseError),
    /// The tree had a shape the transforms do not handle. Raised instead of
    /// emitting code that might be silently wrong.
    #[error("internal invariant violated at byte offset {offset}: {message}")]
    Invariant { offset: u32, message: String },
    #[error(transparent)]
    Emit(#[from] EmitError),
}
