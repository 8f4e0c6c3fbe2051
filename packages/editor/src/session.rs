//! # Edit Session Management
//!
//! One user's view of one script: the reconciled document, the current
//! selection and the allocator that mints ids for new blocks.
//!
//! The session is the only place a new tree is installed. Mutations that
//! miss their target or hit a boundary are absorbed as [`Applied::Noop`].

use crate::document::Document;
use crate::generation::{GenerationRequest, ScriptGenerator};
use crate::mutations::{Mutation, MutationError};
use crate::reconcile::{LoadOutcome, ReconcileState, Reconciler};
use crate::record::{SavePayload, ScriptRecord};
use crate::EditorError;
use callscript_parser::ast::{Block, ScriptBlockStructure};
use callscript_parser::{validate, IdAllocator, ParseOptions};
use tracing::{debug, info, warn};

/// Single edit session
pub struct EditSession {
    /// Unique session identifier
    pub id: String,

    options: ParseOptions,
    reconciler: Reconciler,
    document: Option<Document>,
    selection: Option<String>,
    ids: IdAllocator,
}

/// Result of applying a mutation through the session
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    Changed {
        affected: Block,
        removed_ids: Vec<String>,
    },
    /// Target missing or at a boundary; tree untouched
    Noop(MutationError),
}

impl Applied {
    pub fn is_noop(&self) -> bool {
        matches!(self, Applied::Noop(_))
    }
}

impl EditSession {
    pub fn new(id: impl Into<String>) -> Self {
        Self::with_options(id, ParseOptions::default())
    }

    pub fn with_options(id: impl Into<String>, options: ParseOptions) -> Self {
        Self {
            id: id.into(),
            reconciler: Reconciler::new(options.clone()),
            options,
            document: None,
            selection: None,
            ids: IdAllocator::new(),
        }
    }

    /// Report that a record is available.
    ///
    /// Reconciliation runs once per document id, and only once metadata is
    /// ready. Repeat notifications for the loaded id keep in-progress edits.
    pub fn load(&mut self, record: &ScriptRecord, metadata_ready: bool) -> LoadOutcome {
        let outcome = self.reconciler.notify(record, metadata_ready);

        if let LoadOutcome::Reconciled(reconciliation) = &outcome {
            info!(
                session = %self.id,
                document = %record.id,
                state = %reconciliation.state,
                "Document loaded"
            );
            self.document = Some(Document::from_reconciliation(record, reconciliation.clone()));
            self.selection = None;
        }

        if outcome == LoadOutcome::Suspended && self.document.as_ref().is_some_and(|doc| doc.id != record.id) {
            info!(session = %self.id, document = %record.id, "Previous document released, waiting for metadata");
            self.document = None;
            self.selection = None;
        }

        outcome
    }

    pub fn state(&self) -> ReconcileState {
        self.document
            .as_ref()
            .map_or(ReconcileState::Uninitialized, |doc| doc.state())
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn structure(&self) -> Option<&ScriptBlockStructure> {
        self.document.as_ref().and_then(|doc| doc.structure())
    }

    pub fn is_dirty(&self) -> bool {
        self.document.as_ref().map_or(false, |doc| doc.is_dirty())
    }

    pub fn selection(&self) -> Option<&str> {
        self.selection.as_deref()
    }

    /// Select a block; ignored unless the id exists in the live tree
    pub fn select(&mut self, id: &str) -> bool {
        let exists = self.structure().map_or(false, |tree| tree.contains_id(id));
        if exists {
            self.selection = Some(id.to_string());
        }
        exists
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Apply a mutation to the live tree
    pub fn apply(&mut self, mutation: Mutation) -> Result<Applied, EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;

        let state = document.state();
        if !state.allows_mutations() {
            return Err(EditorError::StructureUnavailable(state));
        }
        let tree = document
            .structure()
            .ok_or(EditorError::StructureUnavailable(state))?;

        let outcome = match mutation.apply(tree, &mut self.ids) {
            Ok(outcome) => outcome,
            Err(err) if err.is_noop() => {
                debug!(session = %self.id, error = %err, "Mutation absorbed as no-op");
                return Ok(Applied::Noop(err));
            }
            Err(err) => return Err(err.into()),
        };

        if outcome.clears_selection(self.selection.as_deref()) {
            self.selection = None;
        }
        if let Mutation::AddBlock { .. } = mutation {
            self.selection = Some(outcome.affected.id().to_string());
        }

        document.replace_structure(outcome.structure);

        Ok(Applied::Changed {
            affected: outcome.affected,
            removed_ids: outcome.removed_ids,
        })
    }

    /// Edit the raw text of a `TextFallback` document
    pub fn set_raw_text(&mut self, text: impl Into<String>) -> Result<(), EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        document.set_content(text.into())
    }

    /// Re-parse the raw text; on success block editing becomes available
    pub fn promote_text(&mut self) -> Result<(), EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;
        document.promote_text(&self.options, &mut self.ids)?;
        info!(session = %self.id, document = %document.id, "Raw text promoted to structure");
        Ok(())
    }

    /// Both `content` and `structure` whenever a tree exists
    pub fn save_payload(&self) -> Result<SavePayload, EditorError> {
        self.document
            .as_ref()
            .map(|doc| doc.save_payload())
            .ok_or(EditorError::NoDocument)
    }

    pub fn mark_saved(&mut self) {
        if let Some(document) = self.document.as_mut() {
            document.mark_saved();
        }
    }

    /// Ask a generator for a new tree and adopt it if it validates
    pub fn apply_generated(
        &mut self,
        generator: &dyn ScriptGenerator,
        instructions: &str,
    ) -> Result<(), EditorError> {
        let document = self.document.as_mut().ok_or(EditorError::NoDocument)?;

        let request = GenerationRequest {
            target_script_type: document.script_type,
            base_structure: document.structure().cloned(),
            freeform_instructions: instructions.to_string(),
        };

        let generated = generator.generate(&request)?;
        if let Err(err) = validate(&generated) {
            warn!(session = %self.id, error = %err, "Rejected generated structure");
            return Err(err.into());
        }

        info!(
            session = %self.id,
            phases = generated.phases.len(),
            "Adopted generated structure"
        );
        if let Some(selected) = self.selection.as_deref() {
            if !generated.contains_id(selected) {
                self.selection = None;
            }
        }
        document.replace_structure(generated);
        Ok(())
    }
}
