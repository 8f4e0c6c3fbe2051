//! Comprehensive mutation tests

use callscript_editor::{
    BlockPatch, Direction, Mutation, MutationError, PhasePatch, QuestionPatch, StepPatch,
};
use callscript_parser::ast::{Block, BlockKind, EnergyLevel, EnergySettings, ScriptMetadata};
use callscript_parser::{parse, IdAllocator, ScriptBlockStructure, ScriptType};

fn empty() -> ScriptBlockStructure {
    ScriptBlockStructure::empty(ScriptMetadata::new("Test", ScriptType::Discovery))
}

fn sample() -> ScriptBlockStructure {
    parse(
        r#"
## FASE #1 - Apertura
### STEP 1 - Saluto
❓ Come stai?
❓ Da dove chiami?
### STEP 2 - Contesto
❓ Di cosa ti occupi?

## FASE #2 - Scoperta
### STEP 1 - Dolore
❓ Qual è la sfida più grande?

## FASE #3 - Chiusura
"#,
        ScriptType::Discovery,
    )
    .unwrap()
}

fn add(tree: &ScriptBlockStructure, kind: BlockKind, parent: Option<&str>, ids: &mut IdAllocator) -> (ScriptBlockStructure, Block) {
    let outcome = Mutation::AddBlock {
        kind,
        parent_id: parent.map(str::to_string),
    }
    .apply(tree, ids)
    .unwrap();
    (outcome.structure, outcome.affected)
}

fn phase_numbers(tree: &ScriptBlockStructure) -> Vec<&str> {
    tree.phases.iter().map(|p| p.number.as_str()).collect()
}

#[test]
fn test_scenario_a_add_phase_to_empty_document() {
    let mut ids = IdAllocator::new();
    let (tree, added) = add(&empty(), BlockKind::Phase, None, &mut ids);

    assert_eq!(tree.phases.len(), 1);
    assert_eq!(tree.phases[0].number, "1");
    assert!(tree.phases[0].steps.is_empty());
    assert_eq!(added.id(), tree.phases[0].id);
}

#[test]
fn test_scenario_b_add_step_numbers_sequentially() {
    let mut ids = IdAllocator::new();
    let (tree, phase) = add(&empty(), BlockKind::Phase, None, &mut ids);
    let (tree, _) = add(&tree, BlockKind::Step, Some(phase.id()), &mut ids);
    let (tree, second) = add(&tree, BlockKind::Step, Some(phase.id()), &mut ids);

    let steps = &tree.phases[0].steps;
    assert_eq!(steps.len(), 2);
    assert_eq!(steps[0].number, 1);
    assert_eq!(steps[1].number, 2);
    assert_eq!(steps[1].id, second.id());
}

#[test]
fn test_scenario_c_move_phase_up_then_boundary() {
    let mut ids = IdAllocator::new();
    let (tree, first) = add(&empty(), BlockKind::Phase, None, &mut ids);
    let (tree, second) = add(&tree, BlockKind::Phase, None, &mut ids);
    assert_eq!(phase_numbers(&tree), vec!["1", "2"]);

    let moved = Mutation::MoveBlock {
        id: second.id().to_string(),
        direction: Direction::Up,
    }
    .apply(&tree, &mut ids)
    .unwrap()
    .structure;

    assert_eq!(moved.phases[0].id, second.id());
    assert_eq!(moved.phases[1].id, first.id());
    assert_eq!(phase_numbers(&moved), vec!["1", "2"]);

    let err = Mutation::MoveBlock {
        id: second.id().to_string(),
        direction: Direction::Up,
    }
    .apply(&moved, &mut ids)
    .unwrap_err();
    assert!(matches!(err, MutationError::Boundary { direction: Direction::Up, .. }));
    assert!(err.is_noop());
}

#[test]
fn test_scenario_e_delete_step_removes_its_questions() {
    let tree = sample();
    let step = &tree.phases[0].steps[0];
    let question_ids: Vec<String> = step.questions.iter().map(|q| q.id.clone()).collect();
    assert_eq!(question_ids.len(), 2);

    let outcome = Mutation::DeleteBlock { id: step.id.clone() }
        .apply(&tree, &mut IdAllocator::new())
        .unwrap();

    for id in &question_ids {
        assert!(!outcome.structure.contains_id(id));
        assert!(outcome.removed_ids.contains(id));
    }
    assert!(!outcome.structure.contains_id(&step.id));
}

#[test]
fn test_add_with_missing_parent_leaves_tree_untouched() {
    let tree = sample();
    let before = tree.clone();
    let err = Mutation::AddBlock {
        kind: BlockKind::Question,
        parent_id: Some("step_nope".to_string()),
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap_err();

    assert_eq!(err, MutationError::ParentNotFound("step_nope".to_string()));
    assert!(err.is_noop());
    assert_eq!(tree, before);
}

#[test]
fn test_add_question_appends_to_step() {
    let tree = sample();
    let step_id = tree.phases[1].steps[0].id.clone();
    let mut ids = IdAllocator::new();

    let (next, added) = add(&tree, BlockKind::Question, Some(&step_id), &mut ids);
    let questions = &next.phases[1].steps[0].questions;

    assert_eq!(questions.len(), 2);
    assert_eq!(questions[1].id, added.id());
    assert!(added.id().starts_with("question_"));
    assert_eq!(tree.phases[1].steps[0].questions.len(), 1, "input tree is not modified");
}

#[test]
fn test_update_merges_fields_only() {
    let tree = sample();
    let phase = &tree.phases[0];

    let outcome = Mutation::UpdateBlock {
        id: phase.id.clone(),
        patch: BlockPatch::Phase(PhasePatch {
            name: Some("Apertura calda".to_string()),
            energy: Some(Some(EnergySettings {
                level: EnergyLevel::Alto,
                tone: "Entusiasta".to_string(),
                ..Default::default()
            })),
            ..Default::default()
        }),
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap();

    let updated = &outcome.structure.phases[0];
    assert_eq!(updated.name, "Apertura calda");
    assert_eq!(updated.energy.as_ref().map(|e| e.level), Some(EnergyLevel::Alto));
    assert_eq!(updated.steps, phase.steps);
    assert_eq!(updated.number, "1");
    assert_eq!(outcome.structure.phases[1..], tree.phases[1..]);
}

#[test]
fn test_update_nested_question() {
    let tree = sample();
    let question_id = tree.phases[0].steps[1].questions[0].id.clone();

    let outcome = Mutation::UpdateBlock {
        id: question_id.clone(),
        patch: BlockPatch::Question(QuestionPatch {
            text: Some("Di cosa ti occupi esattamente?".to_string()),
            is_key: Some(true),
            ..Default::default()
        }),
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap();

    let Block::Question(question) = outcome.affected else {
        panic!("expected a question");
    };
    assert_eq!(question.id, question_id);
    assert_eq!(question.text, "Di cosa ti occupi esattamente?");
    assert!(question.is_key);
}

#[test]
fn test_update_missing_id_is_noop_error() {
    let tree = sample();
    let err = Mutation::UpdateBlock {
        id: "step_missing".to_string(),
        patch: BlockPatch::Step(StepPatch::default()),
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap_err();

    assert_eq!(err, MutationError::TargetNotFound("step_missing".to_string()));
    assert!(err.is_noop());
}

#[test]
fn test_update_with_wrong_patch_kind() {
    let tree = sample();
    let step_id = tree.phases[0].steps[0].id.clone();

    let err = Mutation::UpdateBlock {
        id: step_id.clone(),
        patch: BlockPatch::Phase(PhasePatch::default()),
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap_err();

    assert_eq!(
        err,
        MutationError::KindMismatch {
            id: step_id,
            expected: BlockKind::Phase,
            found: BlockKind::Step,
        }
    );
    assert!(!err.is_noop());
}

#[test]
fn test_delete_phase_renumbers_remaining() {
    let tree = sample();
    let middle = tree.phases[1].id.clone();

    let outcome = Mutation::DeleteBlock { id: middle }
        .apply(&tree, &mut IdAllocator::new())
        .unwrap();

    assert_eq!(phase_numbers(&outcome.structure), vec!["1", "2"]);
    assert_eq!(outcome.structure.phases[1].name, "Chiusura");
}

#[test]
fn test_delete_step_renumbers_siblings() {
    let tree = sample();
    let first = tree.phases[0].steps[0].id.clone();

    let outcome = Mutation::DeleteBlock { id: first }
        .apply(&tree, &mut IdAllocator::new())
        .unwrap();

    let steps = &outcome.structure.phases[0].steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].name, "Contesto");
    assert_eq!(steps[0].number, 1);
}

#[test]
fn test_delete_reports_selection_to_clear() {
    let tree = sample();
    let phase = &tree.phases[0];
    let nested_question = phase.steps[1].questions[0].id.clone();

    let outcome = Mutation::DeleteBlock { id: phase.id.clone() }
        .apply(&tree, &mut IdAllocator::new())
        .unwrap();

    assert!(outcome.clears_selection(Some(phase.id.as_str())));
    assert!(outcome.clears_selection(Some(nested_question.as_str())));
    assert!(!outcome.clears_selection(Some(tree.phases[1].id.as_str())));
}

#[test]
fn test_move_phase_down_at_end_is_boundary() {
    let tree = sample();
    let last = tree.phases[2].id.clone();

    let err = Mutation::MoveBlock {
        id: last.clone(),
        direction: Direction::Down,
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap_err();

    assert_eq!(
        err,
        MutationError::Boundary {
            id: last,
            direction: Direction::Down
        }
    );
}

#[test]
fn test_move_step_within_phase() {
    let tree = sample();
    let second = tree.phases[0].steps[1].id.clone();

    let outcome = Mutation::MoveBlock {
        id: second.clone(),
        direction: Direction::Up,
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap();

    let steps = &outcome.structure.phases[0].steps;
    assert_eq!(steps[0].id, second);
    assert_eq!(steps[0].number, 1);
    assert_eq!(steps[1].number, 2);
    assert_eq!(steps[1].name, "Saluto");
}

#[test]
fn test_move_question_within_step() {
    let tree = sample();
    let first = tree.phases[0].steps[0].questions[0].id.clone();

    let outcome = Mutation::MoveBlock {
        id: first.clone(),
        direction: Direction::Down,
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap();

    let questions = &outcome.structure.phases[0].steps[0].questions;
    assert_eq!(questions[1].id, first);
    assert_eq!(questions[0].text, "Da dove chiami?");
}

#[test]
fn test_reparent_step_keeps_id_and_annotations() {
    let mut tree = sample();
    tree.phases[0].steps[1].notes = Some("Non dimenticare".to_string());
    let step_id = tree.phases[0].steps[1].id.clone();
    let target = tree.phases[2].id.clone();

    let outcome = Mutation::ReparentBlock {
        id: step_id.clone(),
        new_parent_id: target,
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap();

    let moved = &outcome.structure.phases[2].steps[0];
    assert_eq!(moved.id, step_id);
    assert_eq!(moved.number, 1);
    assert_eq!(moved.notes.as_deref(), Some("Non dimenticare"));
    assert_eq!(moved.questions.len(), 1);
    assert_eq!(outcome.structure.phases[0].steps.len(), 1);
    assert!(outcome.removed_ids.is_empty());
}

#[test]
fn test_reparent_question_to_other_step() {
    let tree = sample();
    let question_id = tree.phases[0].steps[0].questions[0].id.clone();
    let target = tree.phases[1].steps[0].id.clone();

    let outcome = Mutation::ReparentBlock {
        id: question_id.clone(),
        new_parent_id: target.clone(),
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap();

    assert_eq!(outcome.structure.step_of_question(&question_id), Some(target.as_str()));
    assert_eq!(outcome.structure.phases[0].steps[0].questions.len(), 1);
}

#[test]
fn test_reparent_rejects_wrong_parent_kind() {
    let tree = sample();
    let step_id = tree.phases[0].steps[0].id.clone();
    let other_step = tree.phases[1].steps[0].id.clone();
    let phase_id = tree.phases[0].id.clone();

    let err = Mutation::ReparentBlock {
        id: step_id,
        new_parent_id: other_step,
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap_err();
    assert!(matches!(err, MutationError::InvalidParent { kind: BlockKind::Step, .. }));

    let err = Mutation::ReparentBlock {
        id: phase_id,
        new_parent_id: "anything".to_string(),
    }
    .apply(&tree, &mut IdAllocator::new())
    .unwrap_err();
    assert!(matches!(err, MutationError::InvalidParent { kind: BlockKind::Phase, .. }));
}
