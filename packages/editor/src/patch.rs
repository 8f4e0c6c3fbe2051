//! # Partial Updates
//!
//! Typed field patches for `update`. Every field is optional; a missing
//! field leaves the node alone. Optional node fields use `Option<Option<T>>`
//! so a patch can also clear them (`null` in JSON).
//!
//! Ids, step numbers and child sequences are never patched.

use callscript_parser::ast::{
    Biscottino, BlockKind, Checkpoint, EnergySettings, GlobalRule, Ladder, Phase, Question,
    QuestionInstructions, ResistanceHandling, Step,
};
use serde::{Deserialize, Deserializer, Serialize};

/// Patch for one node kind
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BlockPatch {
    Phase(PhasePatch),
    Step(StepPatch),
    Question(QuestionPatch),
    Rule(RulePatch),
}

impl BlockPatch {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockPatch::Phase(_) => BlockKind::Phase,
            BlockPatch::Step(_) => BlockKind::Step,
            BlockPatch::Question(_) => BlockKind::Question,
            BlockPatch::Rule(_) => BlockKind::Rule,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhasePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub transition: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub energy: Option<Option<EnergySettings>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Option<Checkpoint>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub transition: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub energy: Option<Option<EnergySettings>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub ladder: Option<Option<Ladder>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub biscottino: Option<Option<Biscottino>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub resistance_handling: Option<Option<ResistanceHandling>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub marker: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub condition: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_key: Option<bool>,
    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    pub instructions: Option<Option<QuestionInstructions>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RulePatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// A present field (even `null`) becomes `Some`, an absent one stays `None`
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn merge<T: Clone>(slot: &mut T, value: &Option<T>) {
    if let Some(value) = value {
        *slot = value.clone();
    }
}

impl PhasePatch {
    pub fn merge_into(&self, phase: &mut Phase) {
        merge(&mut phase.number, &self.number);
        merge(&mut phase.name, &self.name);
        merge(&mut phase.description, &self.description);
        merge(&mut phase.transition, &self.transition);
        merge(&mut phase.energy, &self.energy);
        merge(&mut phase.checkpoint, &self.checkpoint);
    }
}

impl StepPatch {
    pub fn merge_into(&self, step: &mut Step) {
        merge(&mut step.name, &self.name);
        merge(&mut step.objective, &self.objective);
        merge(&mut step.transition, &self.transition);
        merge(&mut step.notes, &self.notes);
        merge(&mut step.energy, &self.energy);
        merge(&mut step.ladder, &self.ladder);
        merge(&mut step.biscottino, &self.biscottino);
        merge(&mut step.resistance_handling, &self.resistance_handling);
    }
}

impl QuestionPatch {
    pub fn merge_into(&self, question: &mut Question) {
        merge(&mut question.text, &self.text);
        merge(&mut question.marker, &self.marker);
        merge(&mut question.condition, &self.condition);
        merge(&mut question.is_key, &self.is_key);
        merge(&mut question.instructions, &self.instructions);
    }
}

impl RulePatch {
    pub fn merge_into(&self, rule: &mut GlobalRule) {
        merge(&mut rule.title, &self.title);
        merge(&mut rule.content, &self.content);
    }
}
