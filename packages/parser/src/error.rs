use thiserror::Error;

pub type ParseResult<T> = Result<T, ParseError>;

/// Text could not be read as a block tree; callers fall back to raw-text editing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("No phase markers found in {lines} line(s) of text")]
    NoPhaseMarkers { lines: usize },
}

impl ParseError {
    pub fn no_phase_markers(text: &str) -> Self {
        Self::NoPhaseMarkers {
            lines: text.lines().count(),
        }
    }
}
