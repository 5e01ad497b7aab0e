use thiserror::Error;

/// Errors raised by the compositing core and the control surface.
///
/// Device failures stay in `anyhow` at the application seams; these are the
/// failures that callers may want to match on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CloakError {
    #[error("dimension mismatch: {what} is {actual:?}, expected {expected:?}")]
    DimensionMismatch {
        what: &'static str,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    #[error("unrecognised command: {0:?}")]
    InvalidCommand(String),

    #[error("invalid value for {field}: {value:?}")]
    InvalidValue { field: &'static str, value: String },
}
