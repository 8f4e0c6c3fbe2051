//! # Document Handle
//!
//! A loaded script and its editing state.
//!
//! The document holds either a live block tree (`StructureTrusted`,
//! `Empty`) or raw text only (`TextFallback`). Every edit marks it dirty;
//! the default-filling done at load time does not.
//!
//! ## Lifecycle
//!
//! ```text
//! Record → Reconcile → Edit → Save payload → Record
//!            ↓          ↓          ↓
//!          state    Mutations  content + structure
//! ```

use crate::reconcile::{ReconcileState, Reconciliation};
use crate::record::{SavePayload, ScriptRecord};
use crate::EditorError;
use callscript_parser::ast::{ScriptBlockStructure, ScriptType};
use callscript_parser::{parse_with, serialize, IdAllocator, ParseOptions};

#[derive(Debug, Clone)]
pub struct Document {
    /// Stable document id
    pub id: String,

    pub name: String,

    pub script_type: ScriptType,

    /// Increments on every accepted edit
    pub version: u64,

    state: ReconcileState,
    structure: Option<ScriptBlockStructure>,
    content: String,
    dirty: bool,
}

impl Document {
    /// Build the document a reconciliation decided on
    pub fn from_reconciliation(record: &ScriptRecord, reconciliation: Reconciliation) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            script_type: record.script_type,
            version: 0,
            state: reconciliation.state,
            structure: reconciliation.structure,
            content: record.content.clone(),
            dirty: false,
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    /// Live tree, absent in `TextFallback`
    pub fn structure(&self) -> Option<&ScriptBlockStructure> {
        self.structure.as_ref()
    }

    /// Raw text as loaded or as last edited in `TextFallback`
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Install a new tree produced by a mutation or generator
    pub fn replace_structure(&mut self, structure: ScriptBlockStructure) {
        self.structure = Some(structure);
        self.state = ReconcileState::StructureTrusted;
        self.touch();
    }

    /// Replace the raw text; only meaningful in `TextFallback`
    pub fn set_content(&mut self, content: String) -> Result<(), EditorError> {
        if self.state != ReconcileState::TextFallback {
            return Err(EditorError::RawTextUnavailable(self.state));
        }
        self.content = content;
        self.touch();
        Ok(())
    }

    /// Try to lift the raw text into a tree with fresh ids
    pub fn promote_text(&mut self, options: &ParseOptions, ids: &mut IdAllocator) -> Result<(), EditorError> {
        if self.state != ReconcileState::TextFallback {
            return Err(EditorError::RawTextUnavailable(self.state));
        }

        let options = ParseOptions {
            script_type: self.script_type,
            ..options.clone()
        };
        let mut tree = parse_with(&self.content, &options, ids)?;
        if tree.metadata.name.is_empty() {
            tree.metadata.name = self.name.clone();
        }

        self.replace_structure(tree);
        Ok(())
    }

    /// Content and structure to persist
    pub fn save_payload(&self) -> SavePayload {
        match &self.structure {
            Some(tree) => SavePayload {
                content: serialize(tree),
                structure: Some(tree.clone()),
            },
            None => SavePayload {
                content: self.content.clone(),
                structure: None,
            },
        }
    }

    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    fn touch(&mut self) {
        self.version += 1;
        self.dirty = true;
    }
}
