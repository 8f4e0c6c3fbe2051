//! # Callscript Parser
//!
//! Block tree model for sales call scripts and the two-way transcoder
//! between that tree and its flat-text form.
//!
//! ```text
//! text ──parse──▶ ScriptBlockStructure ──serialize──▶ text
//!                 (Phase → Step → Question)
//! ```
//!
//! `serialize` is total and deterministic. `parse` is heuristic and mints
//! fresh ids through [`IdAllocator`]; it fails with
//! [`ParseError::NoPhaseMarkers`] when the text has no phase boundary.

pub mod ast;
pub mod error;
pub mod id_generator;
pub mod parser;
pub mod serializer;
pub mod validator;

#[cfg(test)]
mod tests_serializer;

pub use ast::{Block, BlockCounts, BlockKind, BlockRef, ScriptBlockStructure, ScriptMetadata, ScriptType};
pub use error::{ParseError, ParseResult};
pub use id_generator::{get_document_seed, IdAllocator};
pub use parser::{parse, parse_with, ParseOptions, Parser};
pub use serializer::{serialize, Serializer};
pub use validator::{validate, ValidationError};
