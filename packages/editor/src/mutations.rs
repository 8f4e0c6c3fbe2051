//! # Block Tree Mutations
//!
//! Semantic operations on a script's block tree.
//!
//! Every operation takes the current tree by reference and returns a new
//! tree in a [`MutationOutcome`]. On `Err` the caller still holds the
//! untouched previous tree, so a failed operation can never leave a
//! half-applied edit behind.
//!
//! ## Mutation Semantics
//!
//! ### Add
//! - Appends to the end of the owning sequence
//! - New phase number is `count + 1`, new step number is `count + 1`
//! - Steps need a phase parent, questions need a step parent
//!
//! ### Update
//! - Shallow merge of a typed patch, children untouched
//!
//! ### Delete
//! - Cascades: phase → steps → questions
//! - Renumbers the sequence it removed from
//!
//! ### Move
//! - Swaps with the immediate sibling, renumbering phases/steps
//! - First-up and last-down fail with `Boundary`
//!
//! ### Reparent
//! - Step to another phase, question to another step
//! - Ids and annotations travel with the node

use crate::patch::BlockPatch;
use callscript_parser::ast::{
    Block, BlockKind, BlockRef, GlobalRule, Phase, Question, ScriptBlockStructure, Step,
};
use callscript_parser::IdAllocator;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const NEW_PHASE_NAME: &str = "Nuova fase";
const NEW_STEP_NAME: &str = "Nuovo step";
const NEW_QUESTION_TEXT: &str = "Nuova domanda";
const NEW_RULE_TITLE: &str = "Nuova regola";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => f.write_str("up"),
            Direction::Down => f.write_str("down"),
        }
    }
}

/// Semantic mutations on the block tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Mutation {
    /// Append a new node of `kind` under `parent_id`
    AddBlock {
        kind: BlockKind,
        parent_id: Option<String>,
    },

    /// Merge a patch into the node with `id`
    UpdateBlock { id: String, patch: BlockPatch },

    /// Remove a node and everything under it
    DeleteBlock { id: String },

    /// Swap a node with its neighbour
    MoveBlock { id: String, direction: Direction },

    /// Move a step or question under a different parent
    ReparentBlock { id: String, new_parent_id: String },
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MutationError {
    #[error("Block not found: {0}")]
    TargetNotFound(String),

    #[error("Parent not found: {0}")]
    ParentNotFound(String),

    #[error("A {0} needs a parent id")]
    MissingParent(BlockKind),

    #[error("A {kind} cannot be placed under {parent_id}")]
    InvalidParent { kind: BlockKind, parent_id: String },

    #[error("Block {id} is a {found}, patch is for a {expected}")]
    KindMismatch {
        id: String,
        expected: BlockKind,
        found: BlockKind,
    },

    #[error("Block {id} cannot move {direction}")]
    Boundary { id: String, direction: Direction },
}

impl MutationError {
    /// Errors an editor absorbs silently instead of reporting
    pub fn is_noop(&self) -> bool {
        matches!(
            self,
            MutationError::TargetNotFound(_)
                | MutationError::ParentNotFound(_)
                | MutationError::MissingParent(_)
                | MutationError::Boundary { .. }
        )
    }
}

/// Result of a successful mutation
#[derive(Debug, Clone, PartialEq)]
pub struct MutationOutcome {
    /// The new tree
    pub structure: ScriptBlockStructure,

    /// Node that was added, updated, moved, reparented or removed
    pub affected: Block,

    /// Every id that no longer exists (target plus cascaded descendants)
    pub removed_ids: Vec<String>,
}

impl MutationOutcome {
    fn changed(structure: ScriptBlockStructure, affected: Block) -> Self {
        Self {
            structure,
            affected,
            removed_ids: Vec::new(),
        }
    }

    /// Whether the given selection pointed at a node this mutation removed
    pub fn clears_selection(&self, selection: Option<&str>) -> bool {
        selection.map_or(false, |selected| self.removed_ids.iter().any(|id| id == selected))
    }
}

impl Mutation {
    /// Apply mutation to a tree, producing a new tree
    pub fn apply(
        &self,
        tree: &ScriptBlockStructure,
        ids: &mut IdAllocator,
    ) -> Result<MutationOutcome, MutationError> {
        match self {
            Mutation::AddBlock { kind, parent_id } => add_block(tree, *kind, parent_id.as_deref(), ids),
            Mutation::UpdateBlock { id, patch } => update_block(tree, id, patch),
            Mutation::DeleteBlock { id } => delete_block(tree, id),
            Mutation::MoveBlock { id, direction } => move_block(tree, id, *direction),
            Mutation::ReparentBlock { id, new_parent_id } => reparent_block(tree, id, new_parent_id),
        }
    }

    /// Id of the existing node this mutation targets
    pub fn target_id(&self) -> Option<&str> {
        match self {
            Mutation::AddBlock { .. } => None,
            Mutation::UpdateBlock { id, .. }
            | Mutation::DeleteBlock { id }
            | Mutation::MoveBlock { id, .. }
            | Mutation::ReparentBlock { id, .. } => Some(id),
        }
    }
}

/// Append a fresh node of `kind`
pub fn add_block(
    tree: &ScriptBlockStructure,
    kind: BlockKind,
    parent_id: Option<&str>,
    ids: &mut IdAllocator,
) -> Result<MutationOutcome, MutationError> {
    let mut next = tree.clone();

    let affected = match kind {
        BlockKind::Phase => {
            let number = (next.phases.len() + 1).to_string();
            let phase = Phase::new(ids.allocate(BlockKind::Phase), number, NEW_PHASE_NAME);
            next.phases.push(phase.clone());
            Block::Phase(phase)
        }

        BlockKind::Step => {
            let parent_id = expect_parent(tree, kind, parent_id, BlockKind::Phase)?;
            let phase = next
                .find_phase_mut(parent_id)
                .ok_or_else(|| MutationError::ParentNotFound(parent_id.to_string()))?;

            let number = (phase.steps.len() + 1) as u32;
            let step = Step::new(ids.allocate(BlockKind::Step), number, NEW_STEP_NAME);
            phase.steps.push(step.clone());
            Block::Step(step)
        }

        BlockKind::Question => {
            let parent_id = expect_parent(tree, kind, parent_id, BlockKind::Step)?;
            let step = next
                .find_step_mut(parent_id)
                .ok_or_else(|| MutationError::ParentNotFound(parent_id.to_string()))?;

            let question = Question::new(ids.allocate(BlockKind::Question), NEW_QUESTION_TEXT);
            step.questions.push(question.clone());
            Block::Question(question)
        }

        BlockKind::Rule => {
            let rule = GlobalRule::new(ids.allocate(BlockKind::Rule), NEW_RULE_TITLE);
            next.global_rules.push(rule.clone());
            Block::Rule(rule)
        }
    };

    Ok(MutationOutcome::changed(next, affected))
}

/// Merge `patch` into the node with `id`
pub fn update_block(
    tree: &ScriptBlockStructure,
    id: &str,
    patch: &BlockPatch,
) -> Result<MutationOutcome, MutationError> {
    let found = tree
        .find_block(id)
        .ok_or_else(|| MutationError::TargetNotFound(id.to_string()))?
        .kind();

    if found != patch.kind() {
        return Err(MutationError::KindMismatch {
            id: id.to_string(),
            expected: patch.kind(),
            found,
        });
    }

    let mut next = tree.clone();
    let not_found = || MutationError::TargetNotFound(id.to_string());

    let affected = match patch {
        BlockPatch::Phase(fields) => {
            let phase = next.find_phase_mut(id).ok_or_else(not_found)?;
            fields.merge_into(phase);
            Block::Phase(phase.clone())
        }
        BlockPatch::Step(fields) => {
            let step = next.find_step_mut(id).ok_or_else(not_found)?;
            fields.merge_into(step);
            Block::Step(step.clone())
        }
        BlockPatch::Question(fields) => {
            let question = next.find_question_mut(id).ok_or_else(not_found)?;
            fields.merge_into(question);
            Block::Question(question.clone())
        }
        BlockPatch::Rule(fields) => {
            let rule = next.find_rule_mut(id).ok_or_else(not_found)?;
            fields.merge_into(rule);
            Block::Rule(rule.clone())
        }
    };

    Ok(MutationOutcome::changed(next, affected))
}

/// Remove the node with `id` and all of its descendants
pub fn delete_block(tree: &ScriptBlockStructure, id: &str) -> Result<MutationOutcome, MutationError> {
    let target = tree
        .find_block(id)
        .ok_or_else(|| MutationError::TargetNotFound(id.to_string()))?;

    let mut removed_ids = vec![id.to_string()];
    match target {
        BlockRef::Phase(phase) => {
            removed_ids.extend(phase.descendant_ids().into_iter().map(str::to_string));
        }
        BlockRef::Step(step) => {
            removed_ids.extend(step.questions.iter().map(|q| q.id.clone()));
        }
        BlockRef::Question(_) | BlockRef::Rule(_) => {}
    }

    let affected = target.to_owned_block();
    let mut next = tree.clone();

    match affected.kind() {
        BlockKind::Phase => {
            next.phases.retain(|p| p.id != id);
            next.renumber_phases();
        }
        BlockKind::Step => {
            for phase in &mut next.phases {
                if let Some(index) = phase.steps.iter().position(|s| s.id == id) {
                    phase.steps.remove(index);
                    phase.renumber_steps();
                    break;
                }
            }
        }
        BlockKind::Question => {
            for step in next.phases.iter_mut().flat_map(|p| p.steps.iter_mut()) {
                step.questions.retain(|q| q.id != id);
            }
        }
        BlockKind::Rule => {
            next.global_rules.retain(|r| r.id != id);
        }
    }

    Ok(MutationOutcome {
        structure: next,
        affected,
        removed_ids,
    })
}

/// Swap the node with its neighbour in `direction`
pub fn move_block(
    tree: &ScriptBlockStructure,
    id: &str,
    direction: Direction,
) -> Result<MutationOutcome, MutationError> {
    let kind = tree
        .find_block(id)
        .ok_or_else(|| MutationError::TargetNotFound(id.to_string()))?
        .kind();

    let mut next = tree.clone();

    let swapped = match kind {
        BlockKind::Phase => {
            let swapped = swap_sibling(&mut next.phases, |p| p.id == id, direction);
            next.renumber_phases();
            swapped
        }
        BlockKind::Step => match next.phases.iter_mut().find(|p| p.steps.iter().any(|s| s.id == id)) {
            Some(phase) => {
                let swapped = swap_sibling(&mut phase.steps, |s| s.id == id, direction);
                phase.renumber_steps();
                swapped
            }
            None => false,
        },
        BlockKind::Question => next
            .phases
            .iter_mut()
            .flat_map(|p| p.steps.iter_mut())
            .find(|s| s.questions.iter().any(|q| q.id == id))
            .map_or(false, |step| swap_sibling(&mut step.questions, |q| q.id == id, direction)),
        BlockKind::Rule => swap_sibling(&mut next.global_rules, |r| r.id == id, direction),
    };

    if !swapped {
        return Err(MutationError::Boundary {
            id: id.to_string(),
            direction,
        });
    }

    let affected = next
        .find_block(id)
        .map(|block| block.to_owned_block())
        .ok_or_else(|| MutationError::TargetNotFound(id.to_string()))?;

    Ok(MutationOutcome::changed(next, affected))
}

/// Move a step to another phase or a question to another step
pub fn reparent_block(
    tree: &ScriptBlockStructure,
    id: &str,
    new_parent_id: &str,
) -> Result<MutationOutcome, MutationError> {
    let kind = tree
        .find_block(id)
        .ok_or_else(|| MutationError::TargetNotFound(id.to_string()))?
        .kind();

    let mut next = tree.clone();
    let not_found = || MutationError::TargetNotFound(id.to_string());
    let parent_not_found = || MutationError::ParentNotFound(new_parent_id.to_string());

    let affected = match kind {
        BlockKind::Step => {
            expect_parent(tree, kind, Some(new_parent_id), BlockKind::Phase)?;

            let mut detached = None;
            for phase in &mut next.phases {
                if let Some(index) = phase.steps.iter().position(|s| s.id == id) {
                    detached = Some(phase.steps.remove(index));
                    phase.renumber_steps();
                    break;
                }
            }
            let step = detached.ok_or_else(not_found)?;

            let parent = next.find_phase_mut(new_parent_id).ok_or_else(parent_not_found)?;
            parent.steps.push(step);
            parent.renumber_steps();
            parent
                .steps
                .last()
                .map(|s| Block::Step(s.clone()))
                .ok_or_else(not_found)?
        }

        BlockKind::Question => {
            expect_parent(tree, kind, Some(new_parent_id), BlockKind::Step)?;

            let mut detached = None;
            for step in next.phases.iter_mut().flat_map(|p| p.steps.iter_mut()) {
                if let Some(index) = step.questions.iter().position(|q| q.id == id) {
                    detached = Some(step.questions.remove(index));
                    break;
                }
            }
            let question = detached.ok_or_else(not_found)?;

            let parent = next.find_step_mut(new_parent_id).ok_or_else(parent_not_found)?;
            parent.questions.push(question.clone());
            Block::Question(question)
        }

        BlockKind::Phase | BlockKind::Rule => {
            return Err(MutationError::InvalidParent {
                kind,
                parent_id: new_parent_id.to_string(),
            });
        }
    };

    Ok(MutationOutcome::changed(next, affected))
}

/// Check that `parent_id` names an existing node of `parent_kind`
fn expect_parent<'p>(
    tree: &ScriptBlockStructure,
    kind: BlockKind,
    parent_id: Option<&'p str>,
    parent_kind: BlockKind,
) -> Result<&'p str, MutationError> {
    let parent_id = parent_id.ok_or(MutationError::MissingParent(kind))?;

    match tree.find_block(parent_id) {
        Some(parent) if parent.kind() == parent_kind => Ok(parent_id),
        Some(_) => Err(MutationError::InvalidParent {
            kind,
            parent_id: parent_id.to_string(),
        }),
        None => Err(MutationError::ParentNotFound(parent_id.to_string())),
    }
}

/// Swap the matching item with its neighbour; false at the boundary
fn swap_sibling<T>(items: &mut [T], is_target: impl Fn(&T) -> bool, direction: Direction) -> bool {
    let Some(index) = items.iter().position(is_target) else {
        return false;
    };

    let neighbour = match direction {
        Direction::Up => index.checked_sub(1),
        Direction::Down => Some(index + 1).filter(|n| *n < items.len()),
    };

    match neighbour {
        Some(neighbour) => {
            items.swap(index, neighbour);
            true
        }
        None => false,
    }
}
