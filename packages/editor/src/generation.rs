//! AI-assisted generation seam.
//!
//! The generator is an opaque producer of block trees. Whatever it returns
//! is validated before the session adopts it.

use callscript_parser::ast::{ScriptBlockStructure, ScriptType};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationRequest {
    pub target_script_type: ScriptType,
    pub base_structure: Option<ScriptBlockStructure>,
    pub freeform_instructions: String,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GenerationError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Generator returned an unusable response: {0}")]
    InvalidResponse(String),
}

pub trait ScriptGenerator {
    fn generate(&self, request: &GenerationRequest) -> Result<ScriptBlockStructure, GenerationError>;
}

impl<F> ScriptGenerator for F
where
    F: Fn(&GenerationRequest) -> Result<ScriptBlockStructure, GenerationError>,
{
    fn generate(&self, request: &GenerationRequest) -> Result<ScriptBlockStructure, GenerationError> {
        self(request)
    }
}
