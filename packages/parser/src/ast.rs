use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of script the document describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptType {
    #[default]
    Discovery,
    Demo,
    Objections,
}

impl ScriptType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScriptType::Discovery => "discovery",
            ScriptType::Demo => "demo",
            ScriptType::Objections => "objections",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "discovery" => Some(ScriptType::Discovery),
            "demo" => Some(ScriptType::Demo),
            "objections" | "obiezioni" => Some(ScriptType::Objections),
            _ => None,
        }
    }
}

impl fmt::Display for ScriptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Root document node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptBlockStructure {
    pub metadata: ScriptMetadata,
    #[serde(default)]
    pub global_rules: Vec<GlobalRule>,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptMetadata {
    pub name: String,
    #[serde(rename = "type")]
    pub script_type: ScriptType,
    pub version: String,
}

impl ScriptMetadata {
    pub fn new(name: impl Into<String>, script_type: ScriptType) -> Self {
        Self {
            name: name.into(),
            script_type,
            version: "1.0".to_string(),
        }
    }
}

/// Document-wide behavioural rule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalRule {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
}

/// Top-level section of a call flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
    pub id: String,
    /// Display label, usually the 1-based position
    pub number: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checkpoint: Option<Checkpoint>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// Sub-goal within a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub id: String,
    /// Position within the owning phase, starting at 1
    pub number: u32,
    pub name: String,
    #[serde(default)]
    pub objective: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<EnergySettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ladder: Option<Ladder>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub biscottino: Option<Biscottino>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance_handling: Option<ResistanceHandling>,
    #[serde(default)]
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub marker: Option<String>,
    /// When to ask it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    #[serde(default)]
    pub is_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<QuestionInstructions>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInstructions {
    #[serde(default)]
    pub wait: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wait_details: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub listen: Option<String>,
    #[serde(default)]
    pub react: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub react_context: Option<String>,
    #[serde(default)]
    pub additional_instructions: Vec<String>,
}

impl QuestionInstructions {
    pub fn is_empty(&self) -> bool {
        !self.wait
            && self.wait_details.is_none()
            && self.listen.is_none()
            && self.react.is_empty()
            && self.react_context.is_none()
            && self.additional_instructions.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnergyLevel {
    Basso,
    #[default]
    Medio,
    Alto,
}

impl EnergyLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnergyLevel::Basso => "BASSO",
            EnergyLevel::Medio => "MEDIO",
            EnergyLevel::Alto => "ALTO",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_uppercase().as_str() {
            "BASSO" | "LOW" => Some(EnergyLevel::Basso),
            "MEDIO" | "MEDIUM" => Some(EnergyLevel::Medio),
            "ALTO" | "HIGH" => Some(EnergyLevel::Alto),
            _ => None,
        }
    }
}

/// Tone/volume/rhythm guidance for a phase or step
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnergySettings {
    pub level: EnergyLevel,
    #[serde(default)]
    pub tone: String,
    #[serde(default)]
    pub volume: String,
    #[serde(default)]
    pub rhythm: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inflections: Option<String>,
    #[serde(default)]
    pub vocabulary: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub negative_vocabulary: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mindset: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

/// Escalating probing questions for vague answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ladder {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_to_use: Option<Vec<String>>,
    #[serde(default)]
    pub levels: Vec<LadderLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_when: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dont_stop_when: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub helpful_phrases: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_signals: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance_handling: Option<ResistanceHandling>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderLevel {
    pub number: u32,
    pub name: String,
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub objective: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default)]
    pub examples: Vec<LadderExample>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LadderExample {
    pub client_says: String,
    pub you_say: String,
}

/// Verification gate before leaving a phase
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub title: String,
    #[serde(default)]
    pub checks: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance_handling: Option<ResistanceHandling>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_finale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_finale_examples: Option<Vec<String>>,
}

/// Short redirect phrase to pull a rambling conversation back on track
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Biscottino {
    pub trigger: String,
    pub phrase: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResistanceHandling {
    pub trigger: String,
    pub response: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steps: Option<Vec<ResistanceStep>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResistanceStep {
    pub action: String,
    pub script: String,
}

/// Closed set of identifiable node kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BlockKind {
    Phase,
    Step,
    Question,
    Rule,
}

impl BlockKind {
    /// Tag used as the id prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            BlockKind::Phase => "phase",
            BlockKind::Step => "step",
            BlockKind::Question => "question",
            BlockKind::Rule => "rule",
        }
    }
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

/// Borrowed view of any identifiable node
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlockRef<'a> {
    Phase(&'a Phase),
    Step(&'a Step),
    Question(&'a Question),
    Rule(&'a GlobalRule),
}

impl<'a> BlockRef<'a> {
    pub fn kind(&self) -> BlockKind {
        match self {
            BlockRef::Phase(_) => BlockKind::Phase,
            BlockRef::Step(_) => BlockKind::Step,
            BlockRef::Question(_) => BlockKind::Question,
            BlockRef::Rule(_) => BlockKind::Rule,
        }
    }

    pub fn id(&self) -> &'a str {
        match self {
            BlockRef::Phase(p) => &p.id,
            BlockRef::Step(s) => &s.id,
            BlockRef::Question(q) => &q.id,
            BlockRef::Rule(r) => &r.id,
        }
    }

    pub fn to_owned_block(&self) -> Block {
        match self {
            BlockRef::Phase(p) => Block::Phase((*p).clone()),
            BlockRef::Step(s) => Block::Step((*s).clone()),
            BlockRef::Question(q) => Block::Question((*q).clone()),
            BlockRef::Rule(r) => Block::Rule((*r).clone()),
        }
    }
}

/// Owned copy of a node, handed back to callers for selection follow-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Block {
    Phase(Phase),
    Step(Step),
    Question(Question),
    Rule(GlobalRule),
}

impl Block {
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Phase(_) => BlockKind::Phase,
            Block::Step(_) => BlockKind::Step,
            Block::Question(_) => BlockKind::Question,
            Block::Rule(_) => BlockKind::Rule,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Block::Phase(p) => &p.id,
            Block::Step(s) => &s.id,
            Block::Question(q) => &q.id,
            Block::Rule(r) => &r.id,
        }
    }
}

/// Phase/step/question totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BlockCounts {
    pub phases: usize,
    pub steps: usize,
    pub questions: usize,
}

impl ScriptBlockStructure {
    /// Document with zero phases
    pub fn empty(metadata: ScriptMetadata) -> Self {
        Self {
            metadata,
            global_rules: Vec::new(),
            phases: Vec::new(),
        }
    }

    /// Find any node by id, at any depth
    pub fn find_block(&self, id: &str) -> Option<BlockRef<'_>> {
        if let Some(rule) = self.global_rules.iter().find(|r| r.id == id) {
            return Some(BlockRef::Rule(rule));
        }

        for phase in &self.phases {
            if phase.id == id {
                return Some(BlockRef::Phase(phase));
            }
            for step in &phase.steps {
                if step.id == id {
                    return Some(BlockRef::Step(step));
                }
                if let Some(question) = step.questions.iter().find(|q| q.id == id) {
                    return Some(BlockRef::Question(question));
                }
            }
        }

        None
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.find_block(id).is_some()
    }

    pub fn find_phase_mut(&mut self, id: &str) -> Option<&mut Phase> {
        self.phases.iter_mut().find(|p| p.id == id)
    }

    pub fn find_step_mut(&mut self, id: &str) -> Option<&mut Step> {
        self.phases
            .iter_mut()
            .flat_map(|p| p.steps.iter_mut())
            .find(|s| s.id == id)
    }

    pub fn find_question_mut(&mut self, id: &str) -> Option<&mut Question> {
        self.phases
            .iter_mut()
            .flat_map(|p| p.steps.iter_mut())
            .flat_map(|s| s.questions.iter_mut())
            .find(|q| q.id == id)
    }

    pub fn find_rule_mut(&mut self, id: &str) -> Option<&mut GlobalRule> {
        self.global_rules.iter_mut().find(|r| r.id == id)
    }

    /// Id of the phase that owns the given step
    pub fn phase_of_step(&self, step_id: &str) -> Option<&str> {
        self.phases
            .iter()
            .find(|p| p.steps.iter().any(|s| s.id == step_id))
            .map(|p| p.id.as_str())
    }

    /// Id of the step that owns the given question
    pub fn step_of_question(&self, question_id: &str) -> Option<&str> {
        self.phases
            .iter()
            .flat_map(|p| p.steps.iter())
            .find(|s| s.questions.iter().any(|q| q.id == question_id))
            .map(|s| s.id.as_str())
    }

    /// Every id in document order (rules first, then depth-first)
    pub fn all_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.global_rules.iter().map(|r| r.id.as_str()).collect();
        for phase in &self.phases {
            ids.push(&phase.id);
            ids.extend(phase.descendant_ids());
        }
        ids
    }

    pub fn counts(&self) -> BlockCounts {
        BlockCounts {
            phases: self.phases.len(),
            steps: self.phases.iter().map(|p| p.steps.len()).sum(),
            questions: self
                .phases
                .iter()
                .flat_map(|p| p.steps.iter())
                .map(|s| s.questions.len())
                .sum(),
        }
    }

    /// Rewrite every phase number to its 1-based position
    pub fn renumber_phases(&mut self) {
        for (i, phase) in self.phases.iter_mut().enumerate() {
            phase.number = (i + 1).to_string();
        }
    }
}

impl Phase {
    pub fn new(id: String, number: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            number: number.into(),
            name: name.into(),
            description: String::new(),
            transition: None,
            energy: None,
            checkpoint: None,
            steps: Vec::new(),
        }
    }

    /// Ids of all steps and their questions
    pub fn descendant_ids(&self) -> Vec<&str> {
        let mut ids = Vec::new();
        for step in &self.steps {
            ids.push(step.id.as_str());
            ids.extend(step.questions.iter().map(|q| q.id.as_str()));
        }
        ids
    }

    /// Rewrite every step number to its 1-based position
    pub fn renumber_steps(&mut self) {
        for (i, step) in self.steps.iter_mut().enumerate() {
            step.number = (i + 1) as u32;
        }
    }
}

impl Step {
    pub fn new(id: String, number: u32, name: impl Into<String>) -> Self {
        Self {
            id,
            number,
            name: name.into(),
            objective: String::new(),
            transition: None,
            notes: None,
            energy: None,
            ladder: None,
            biscottino: None,
            resistance_handling: None,
            questions: Vec::new(),
        }
    }
}

impl Question {
    pub fn new(id: String, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            marker: None,
            condition: None,
            is_key: false,
            instructions: None,
        }
    }
}

impl GlobalRule {
    pub fn new(id: String, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            content: String::new(),
        }
    }
}
