//! Errors raised inside the layout engine.
//!
//! None of these reach the user. Engine entry points log them and leave the
//! layout exactly as it was before the failing operation started.

use thiserror::Error;

use crate::types::WindowId;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TilingError {
    #[error("no geometry record for tiled window 0x{0:x}")]
    MissingRecord(WindowId),
    #[error("window 0x{0:x} is not tiled")]
    NotTiled(WindowId),
    #[error("column index {0} out of range")]
    ColumnOutOfRange(usize),
    #[error("keyboard grab failed: {0}")]
    GrabFailed(String),
}

impl TilingError {
    /// Short machine-readable name, used in IPC error responses.
    pub fn code(&self) -> &'static str {
        match self {
            TilingError::MissingRecord(_) => "missing_record",
            TilingError::NotTiled(_) => "not_tiled",
            TilingError::ColumnOutOfRange(_) => "column_out_of_range",
            TilingError::GrabFailed(_) => "grab_failed",
        }
    }
}

pub type Result<T> = std::result::Result<T, TilingError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            TilingError::MissingRecord(0x2a).to_string(),
            "no geometry record for tiled window 0x2a"
        );
        assert_eq!(TilingError::GrabFailed("busy".into()).code(), "grab_failed");
    }
}
