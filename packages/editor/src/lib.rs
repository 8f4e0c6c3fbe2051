//! # Callscript Editor
//!
//! Editing engine for call scripts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │ parser: text ⇄ block tree, ids, validation  │
//! └─────────────────────────────────────────────┘
//!                     ↓
//! ┌─────────────────────────────────────────────┐
//! │ editor: document lifecycle + mutations      │
//! │  - Reconcile a persisted record on load     │
//! │  - Apply mutations, producing new trees     │
//! │  - Track selection and dirty state          │
//! │  - Build save payloads (text + structure)   │
//! │  - Adopt validated generated structures     │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Core Principles
//!
//! 1. **Structure is source of truth**: the text form is a derived view
//! 2. **Ids survive only through the structure**: text round trips mint new ids
//! 3. **Value semantics**: mutations return a new tree or leave the old one
//! 4. **Once per document**: reconciliation never reruns for a loaded id
//!
//! ## Usage
//!
//! ```rust,ignore
//! use callscript_editor::{EditSession, Mutation, ScriptRecord};
//! use callscript_parser::BlockKind;
//!
//! let mut session = EditSession::new("client-1");
//! session.load(&record, true);
//!
//! session.apply(Mutation::AddBlock { kind: BlockKind::Phase, parent_id: None })?;
//!
//! let payload = session.save_payload()?;
//! record.apply_save(payload);
//! session.mark_saved();
//! ```

mod document;
mod errors;
mod generation;
mod mutations;
mod patch;
mod reconcile;
mod record;
mod session;

pub use document::Document;
pub use errors::EditorError;
pub use generation::{GenerationError, GenerationRequest, ScriptGenerator};
pub use mutations::{
    add_block, delete_block, move_block, reparent_block, update_block, Direction, Mutation,
    MutationError, MutationOutcome,
};
pub use patch::{BlockPatch, PhasePatch, QuestionPatch, RulePatch, StepPatch};
pub use reconcile::{reconcile, LoadOutcome, ReconcileState, Reconciler, Reconciliation};
pub use record::{SavePayload, ScriptRecord, StoredStructure};
pub use session::{Applied, EditSession};

// Re-export common types for convenience
pub use callscript_parser::ast::ScriptBlockStructure;
