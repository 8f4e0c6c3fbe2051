//! Structural checks for trees produced outside the mutation engine
//! (generated structures, files on disk).

use crate::ast::ScriptBlockStructure;
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Block with empty id")]
    EmptyId,

    #[error("Duplicate block id: {0}")]
    DuplicateId(String),

    #[error("Phase {phase_id} has step numbered {found}, expected {expected}")]
    StepNumbering {
        phase_id: String,
        expected: u32,
        found: u32,
    },

    #[error("Phase at position {position} is numbered {found:?}")]
    PhaseNumbering { position: usize, found: String },

    #[error("Step {step_id} has ladder level numbered {found}, expected {expected}")]
    LadderNumbering {
        step_id: String,
        expected: u32,
        found: u32,
    },
}

/// Check id uniqueness and sequential numbering
pub fn validate(doc: &ScriptBlockStructure) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for id in doc.all_ids() {
        if id.trim().is_empty() {
            return Err(ValidationError::EmptyId);
        }
        if !seen.insert(id) {
            return Err(ValidationError::DuplicateId(id.to_string()));
        }
    }

    // Phase labels are free-form; only enforce order when they are all numeric
    let numeric: Option<Vec<u64>> = doc
        .phases
        .iter()
        .map(|p| p.number.trim().parse::<u64>().ok())
        .collect();
    if let Some(numbers) = numeric {
        for (i, number) in numbers.iter().enumerate() {
            if *number != (i + 1) as u64 {
                return Err(ValidationError::PhaseNumbering {
                    position: i + 1,
                    found: doc.phases[i].number.clone(),
                });
            }
        }
    }

    for phase in &doc.phases {
        for (i, step) in phase.steps.iter().enumerate() {
            let expected = (i + 1) as u32;
            if step.number != expected {
                return Err(ValidationError::StepNumbering {
                    phase_id: phase.id.clone(),
                    expected,
                    found: step.number,
                });
            }

            let Some(ladder) = &step.ladder else { continue };
            for (j, level) in ladder.levels.iter().enumerate() {
                let expected = (j + 1) as u32;
                if level.number != expected {
                    return Err(ValidationError::LadderNumbering {
                        step_id: step.id.clone(),
                        expected,
                        found: level.number,
                    });
                }
            }
        }
    }

    Ok(())
}
