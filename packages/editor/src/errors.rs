//! Error types for the editor

use crate::reconcile::ReconcileState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EditorError {
    #[error("Parse error: {0}")]
    Parse(#[from] callscript_parser::ParseError),

    #[error("Mutation error: {0}")]
    Mutation(#[from] crate::mutations::MutationError),

    #[error("Validation error: {0}")]
    Validation(#[from] callscript_parser::ValidationError),

    #[error("Generation error: {0}")]
    Generation(#[from] crate::generation::GenerationError),

    #[error("No document loaded")]
    NoDocument,

    #[error("Block editing unavailable in {0} state")]
    StructureUnavailable(ReconcileState),

    #[error("Raw text editing unavailable in {0} state")]
    RawTextUnavailable(ReconcileState),
}
