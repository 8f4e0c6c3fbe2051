//! # Load Reconciliation
//!
//! Decides, once per document id, whether a loaded record is edited as a
//! trusted block tree, as raw text only, or as a fresh empty document.
//!
//! ```text
//! structure with phases ──▶ StructureTrusted (ids preserved)
//! non-empty content ──parse ok──▶ StructureTrusted (ids from the doc seed)
//!                   └─parse err─▶ TextFallback
//! neither ──▶ Empty
//! ```
//!
//! The text path draws ids from [`IdAllocator::for_document`], so running
//! reconciliation again on the same inputs yields an identical tree.

use crate::record::ScriptRecord;
use callscript_parser::ast::{ScriptBlockStructure, ScriptMetadata};
use callscript_parser::{IdAllocator, ParseOptions, Parser};
use serde::Serialize;
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReconcileState {
    Uninitialized,
    StructureTrusted,
    TextFallback,
    Empty,
}

impl ReconcileState {
    /// Whether block-level mutations are permitted
    pub fn allows_mutations(&self) -> bool {
        matches!(self, ReconcileState::StructureTrusted | ReconcileState::Empty)
    }
}

impl fmt::Display for ReconcileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ReconcileState::Uninitialized => "uninitialized",
            ReconcileState::StructureTrusted => "structure-trusted",
            ReconcileState::TextFallback => "text-fallback",
            ReconcileState::Empty => "empty",
        };
        f.write_str(label)
    }
}

/// Outcome of reconciling one record
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub state: ReconcileState,
    /// Adopted tree; `None` only in `TextFallback`
    pub structure: Option<ScriptBlockStructure>,
    /// Missing metadata or global rules were filled with defaults
    pub upgraded: bool,
}

/// Run the transition rule against a record
pub fn reconcile(record: &ScriptRecord, options: &ParseOptions) -> Reconciliation {
    if let Some(stored) = record.structure.as_ref().filter(|s| s.has_phases()) {
        let (tree, upgraded) = stored.upgrade(record);
        info!(
            document = %record.id,
            phases = tree.phases.len(),
            upgraded,
            "Adopted persisted structure"
        );
        return Reconciliation {
            state: ReconcileState::StructureTrusted,
            structure: Some(tree),
            upgraded,
        };
    }

    if !record.content.trim().is_empty() {
        let options = ParseOptions {
            script_type: record.script_type,
            ..options.clone()
        };
        let mut ids = IdAllocator::for_document(&record.id);
        // Blank metadata marks what the text itself did not declare
        let undeclared = ScriptMetadata {
            name: String::new(),
            script_type: record.script_type,
            version: String::new(),
        };
        let parsed = Parser::new(&options, &mut ids)
            .with_metadata(undeclared)
            .parse_document(&record.content);

        return match parsed {
            Ok(mut tree) => {
                let mut upgraded = false;
                if tree.metadata.name.is_empty() {
                    tree.metadata.name = record.name.clone();
                    upgraded = true;
                }
                if tree.metadata.version.is_empty() {
                    tree.metadata.version = record.version.clone();
                    upgraded = true;
                }
                info!(
                    document = %record.id,
                    phases = tree.phases.len(),
                    "Parsed structure from content"
                );
                Reconciliation {
                    state: ReconcileState::StructureTrusted,
                    structure: Some(tree),
                    upgraded,
                }
            }
            Err(err) => {
                info!(document = %record.id, error = %err, "Falling back to text editing");
                Reconciliation {
                    state: ReconcileState::TextFallback,
                    structure: None,
                    upgraded: false,
                }
            }
        };
    }

    // A phaseless stored structure still carries metadata and rules worth keeping
    let (tree, upgraded) = match &record.structure {
        Some(stored) => stored.upgrade(record),
        None => (ScriptBlockStructure::empty(record.metadata()), false),
    };
    info!(document = %record.id, "Starting from an empty document");

    Reconciliation {
        state: ReconcileState::Empty,
        structure: Some(tree),
        upgraded,
    }
}

/// What a load notification led to
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Metadata still loading; nothing ran
    Suspended,
    /// Same document id as last time; nothing ran
    AlreadyLoaded,
    /// Transition ran for a new document id
    Reconciled(Reconciliation),
}

/// Gate that runs reconciliation once per document id
#[derive(Debug, Default)]
pub struct Reconciler {
    options: ParseOptions,
    document_id: Option<String>,
}

impl Reconciler {
    pub fn new(options: ParseOptions) -> Self {
        Self {
            options,
            document_id: None,
        }
    }

    /// Id of the last reconciled document
    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    /// Handle a "document available" notification
    pub fn notify(&mut self, record: &ScriptRecord, metadata_ready: bool) -> LoadOutcome {
        if self.document_id.as_deref() == Some(record.id.as_str()) {
            debug!(document = %record.id, "Document already reconciled");
            return LoadOutcome::AlreadyLoaded;
        }

        if !metadata_ready {
            // A different document is pending; the previous one is released
            if let Some(previous) = self.document_id.take() {
                debug!(document = %record.id, previous = %previous, "Document changed while metadata loads");
            }
            debug!(document = %record.id, "Metadata not ready, suspending reconciliation");
            return LoadOutcome::Suspended;
        }

        let reconciliation = reconcile(record, &self.options);
        self.document_id = Some(record.id.clone());
        LoadOutcome::Reconciled(reconciliation)
    }
}
