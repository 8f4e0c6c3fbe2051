use crate::ast::*;
use crate::error::{ParseError, ParseResult};
use crate::id_generator::IdAllocator;
use crate::serializer::{KEY_FLAG, QUESTION_GLYPH};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static PHASE_HEADER_RE: OnceLock<Regex> = OnceLock::new();
static STEP_HEADER_RE: OnceLock<Regex> = OnceLock::new();
static LEVEL_HEADER_RE: OnceLock<Regex> = OnceLock::new();
static QUESTION_LINE_RE: OnceLock<Regex> = OnceLock::new();

fn phase_header_re() -> &'static Regex {
    PHASE_HEADER_RE.get_or_init(|| {
        Regex::new(r"(?i)^[#=═━─*\s]*(?:FASE|PHASE)\s*(?:#\s*\[((?:[^\]\\]|\\.)*)\]|#\s*(\S+?)|(\d[\w.]*))(?:\s*[:\-–—]\s*|\s+|$)(.*)$")
            .expect("phase header pattern is valid")
    })
}

fn step_header_re() -> &'static Regex {
    STEP_HEADER_RE.get_or_init(|| {
        Regex::new(r"(?i)^[#=═━─*\s]*(?:STEP|PASSO)\s*#?\s*(\d+)(?:\s*[:\-–—.)]\s*|\s+|$)(.*)$")
            .expect("step header pattern is valid")
    })
}

fn level_header_re() -> &'static Regex {
    LEVEL_HEADER_RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:LIVELLO|LEVEL)\s*(\d+)?\s*(?:[:\-–—]\s*|\s+|$)(.*)$")
            .expect("ladder level pattern is valid")
    })
}

fn question_line_re() -> &'static Regex {
    QUESTION_LINE_RE.get_or_init(|| {
        Regex::new(r"^(?:[-*•]\s+|\d+[.)]\s+)?(.+\?)$").expect("question line pattern is valid")
    })
}

/// Acceptance policy for the heuristic parser
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ParseOptions {
    /// Type stamped into the parsed metadata
    pub script_type: ScriptType,
    /// Read unmarked lines ending in `?` as questions
    pub bullet_questions: bool,
    /// Open an unnamed step for questions found before any step header
    pub implicit_steps: bool,
}

impl ParseOptions {
    pub fn for_type(script_type: ScriptType) -> Self {
        Self {
            script_type,
            ..Self::default()
        }
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            script_type: ScriptType::Discovery,
            bullet_questions: true,
            implicit_steps: true,
        }
    }
}

/// Where an energy block attaches
#[derive(Debug, Clone, Copy, PartialEq)]
enum Owner {
    Phase,
    Step,
}

/// Nested block inside a ladder, with the indent of its opening line
#[derive(Debug, Clone, Copy, PartialEq)]
enum LadderSub {
    Level(usize),
    Resistance(usize),
}

/// Annotation block currently receiving indented lines
#[derive(Debug, Clone, Copy, PartialEq)]
enum OpenBlock {
    Energy(Owner),
    Checkpoint { resistance_indent: Option<usize> },
    Ladder(Option<LadderSub>),
    Biscottino,
    Resistance,
    Question,
}

/// Line-oriented parser for flat script text
pub struct Parser<'a> {
    options: &'a ParseOptions,
    ids: &'a mut IdAllocator,
    doc: ScriptBlockStructure,
    block: Option<OpenBlock>,
    in_rules: bool,
}

impl<'a> Parser<'a> {
    pub fn new(options: &'a ParseOptions, ids: &'a mut IdAllocator) -> Self {
        Self {
            options,
            ids,
            doc: ScriptBlockStructure::empty(ScriptMetadata::new("", options.script_type)),
            block: None,
            in_rules: false,
        }
    }

    /// Start from `metadata` instead of a blank one; the preamble still
    /// overrides name and version, the type always comes from the options
    pub fn with_metadata(mut self, metadata: ScriptMetadata) -> Self {
        self.doc.metadata = ScriptMetadata {
            script_type: self.options.script_type,
            ..metadata
        };
        self
    }

    /// Parse a complete document
    pub fn parse_document(mut self, text: &str) -> ParseResult<ScriptBlockStructure> {
        for raw in text.lines() {
            self.parse_line(raw);
        }

        if self.doc.phases.is_empty() {
            return Err(ParseError::no_phase_markers(text));
        }

        Ok(self.doc)
    }

    fn parse_line(&mut self, raw: &str) {
        let line = raw.trim();
        if line.is_empty() {
            return;
        }
        let indent = raw.chars().take_while(|c| c.is_whitespace()).count();

        let framed = line.starts_with(FRAME_CHARS);

        if let Some(caps) = phase_header_re().captures(line) {
            let number = match caps.get(1) {
                Some(label) => unescape_value(label.as_str().trim()),
                None => caps
                    .get(2)
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_string())
                    .unwrap_or_default(),
            };
            let name = caps.get(4).map(|m| m.as_str()).unwrap_or_default();
            self.start_phase(number, header_name(name, framed));
            return;
        }

        if self.doc.phases.is_empty() {
            self.parse_preamble(line);
            return;
        }

        if let Some(caps) = step_header_re().captures(line) {
            let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
            self.start_step(header_name(name, framed));
            return;
        }

        if let Some(text) = line.strip_prefix(QUESTION_GLYPH) {
            self.add_question(unescape_value(text.trim()));
            return;
        }

        if indent > 0 {
            if let Some(mut block) = self.block {
                if self.feed_block(&mut block, indent, line) {
                    self.block = Some(block);
                    return;
                }
            }
        }

        self.block = None;
        self.parse_body_line(line);
    }

    /// Lines before the first phase: metadata and global rules
    fn parse_preamble(&mut self, line: &str) {
        if self.in_rules {
            if let Some(title) = line.strip_prefix(['-', '•', '*']) {
                let id = self.ids.allocate(BlockKind::Rule);
                let title = unescape_value(title.trim());
                self.doc.global_rules.push(GlobalRule::new(id, title));
                return;
            }
            if let Some(content) = line.strip_prefix('>') {
                if let Some(rule) = self.doc.global_rules.last_mut() {
                    append_line(&mut rule.content, &unescape_value(content.trim()));
                }
                return;
            }
        }

        if is_rules_header(line) {
            self.in_rules = true;
            return;
        }

        if let Some((key, value)) = split_key(line) {
            match key.as_str() {
                "script" | "nome" | "name" => self.doc.metadata.name = unescape_value(value),
                "versione" | "version" => self.doc.metadata.version = unescape_value(value),
                _ => {}
            }
        }
    }

    fn start_phase(&mut self, number: String, name: String) {
        let id = self.ids.allocate(BlockKind::Phase);
        let number = if number.is_empty() {
            (self.doc.phases.len() + 1).to_string()
        } else {
            number
        };
        self.doc.phases.push(Phase::new(id, number, name));
        self.block = None;
        self.in_rules = false;
    }

    fn start_step(&mut self, name: String) {
        let id = self.ids.allocate(BlockKind::Step);
        if let Some(phase) = self.doc.phases.last_mut() {
            let number = phase.steps.len() as u32 + 1;
            phase.steps.push(Step::new(id, number, name));
        }
        self.block = None;
    }

    fn phase_mut(&mut self) -> Option<&mut Phase> {
        self.doc.phases.last_mut()
    }

    fn step_mut(&mut self) -> Option<&mut Step> {
        self.doc.phases.last_mut().and_then(|p| p.steps.last_mut())
    }

    fn has_step(&self) -> bool {
        self.doc.phases.last().is_some_and(|p| !p.steps.is_empty())
    }

    /// Current step, opening an unnamed one when policy allows
    fn step_or_implicit(&mut self) -> Option<&mut Step> {
        if !self.has_step() && self.options.implicit_steps {
            self.start_step(String::new());
        }
        self.step_mut()
    }

    fn add_question(&mut self, text: String) {
        if !self.has_step() && !self.options.implicit_steps {
            if let Some(phase) = self.phase_mut() {
                append_line(&mut phase.description, &text);
            }
            self.block = None;
            return;
        }

        let id = self.ids.allocate(BlockKind::Question);
        if let Some(step) = self.step_or_implicit() {
            step.questions.push(Question::new(id, text));
        }
        self.block = Some(OpenBlock::Question);
    }

    /// Column-0 line inside a phase
    fn parse_body_line(&mut self, line: &str) {
        if let Some((key, value)) = split_key(line) {
            let value = unescape_value(value);
            if self.apply_body_key(&key, value) {
                return;
            }
        }

        let in_step = self.has_step();
        let question = if self.options.bullet_questions {
            question_line_re()
                .captures(line)
                .and_then(|caps| caps.get(1))
                .map(|m| unescape_value(m.as_str().trim()))
        } else {
            None
        };

        match (question, in_step) {
            (Some(text), true) => self.add_question(text),
            (Some(text), false) if self.options.implicit_steps => self.add_question(text),
            (_, true) => {
                if let Some(step) = self.step_mut() {
                    let notes = step.notes.get_or_insert_with(String::new);
                    append_line(notes, &unescape_value(line));
                }
            }
            (_, false) => {
                if let Some(phase) = self.phase_mut() {
                    append_line(&mut phase.description, &unescape_value(line));
                }
            }
        }
    }

    fn apply_body_key(&mut self, key: &str, value: String) -> bool {
        match key {
            "descrizione" | "description" => {
                if let Some(phase) = self.phase_mut() {
                    phase.description = value;
                }
            }
            "obiettivo" | "objective" if self.has_step() => {
                if let Some(step) = self.step_mut() {
                    step.objective = value;
                }
            }
            "note" | "nota" | "notes" if self.has_step() => {
                if let Some(step) = self.step_mut() {
                    step.notes = Some(value);
                }
            }
            "transizione" | "transition" => {
                if let Some(step) = self.step_mut() {
                    step.transition = Some(value);
                } else if let Some(phase) = self.phase_mut() {
                    phase.transition = Some(value);
                }
            }
            "energia" | "energy" => {
                let energy = EnergySettings {
                    level: EnergyLevel::from_label(&value).unwrap_or_default(),
                    ..Default::default()
                };
                let owner = if let Some(step) = self.step_mut() {
                    step.energy = Some(energy);
                    Owner::Step
                } else {
                    if let Some(phase) = self.phase_mut() {
                        phase.energy = Some(energy);
                    }
                    Owner::Phase
                };
                self.block = Some(OpenBlock::Energy(owner));
            }
            "checkpoint" => {
                if let Some(phase) = self.phase_mut() {
                    phase.checkpoint = Some(Checkpoint {
                        title: value,
                        ..Default::default()
                    });
                }
                self.block = Some(OpenBlock::Checkpoint { resistance_indent: None });
            }
            "ladder" | "scala" => {
                if let Some(step) = self.step_or_implicit() {
                    step.ladder = Some(Ladder {
                        title: value,
                        ..Default::default()
                    });
                    self.block = Some(OpenBlock::Ladder(None));
                }
            }
            "biscottino" => {
                if let Some(step) = self.step_or_implicit() {
                    step.biscottino = Some(Biscottino {
                        trigger: value,
                        phrase: String::new(),
                    });
                    self.block = Some(OpenBlock::Biscottino);
                }
            }
            "resistenza" | "resistance" | "gestione resistenza" => {
                if let Some(step) = self.step_or_implicit() {
                    step.resistance_handling = Some(ResistanceHandling {
                        trigger: value,
                        ..Default::default()
                    });
                    self.block = Some(OpenBlock::Resistance);
                }
            }
            "domanda" | "question" => self.add_question(value),
            _ => return false,
        }
        true
    }

    /// Indented line offered to the open block; false if it does not belong
    fn feed_block(&mut self, block: &mut OpenBlock, indent: usize, line: &str) -> bool {
        match block {
            OpenBlock::Energy(owner) => {
                let owner = *owner;
                let energy = match owner {
                    Owner::Step => self.step_mut().and_then(|s| s.energy.as_mut()),
                    Owner::Phase => self.phase_mut().and_then(|p| p.energy.as_mut()),
                };
                match (energy, split_key(line)) {
                    (Some(energy), Some((key, value))) => feed_energy(energy, &key, unescape_value(value)),
                    _ => false,
                }
            }
            OpenBlock::Checkpoint { resistance_indent } => {
                let Some(checkpoint) = self.phase_mut().and_then(|p| p.checkpoint.as_mut()) else {
                    return false;
                };
                let Some((key, value)) = split_key(line) else {
                    return false;
                };
                let value = unescape_value(value);

                if let Some(nested) = *resistance_indent {
                    if indent > nested {
                        if let Some(resistance) = checkpoint.resistance_handling.as_mut() {
                            if feed_resistance(resistance, &key, value.clone()) {
                                return true;
                            }
                        }
                    } else {
                        *resistance_indent = None;
                    }
                }

                if is_resistance_key(&key) {
                    checkpoint.resistance_handling = Some(ResistanceHandling {
                        trigger: value,
                        ..Default::default()
                    });
                    *resistance_indent = Some(indent);
                    return true;
                }
                feed_checkpoint(checkpoint, &key, value)
            }
            OpenBlock::Ladder(sub) => {
                let Some(ladder) = self.step_mut().and_then(|s| s.ladder.as_mut()) else {
                    return false;
                };
                feed_ladder(ladder, sub, indent, line)
            }
            OpenBlock::Biscottino => {
                let Some(biscottino) = self.step_mut().and_then(|s| s.biscottino.as_mut()) else {
                    return false;
                };
                match split_key(line) {
                    Some((key, value)) => match key.as_str() {
                        "frase" | "phrase" => {
                            biscottino.phrase = unescape_value(value);
                            true
                        }
                        "trigger" | "quando" => {
                            biscottino.trigger = unescape_value(value);
                            true
                        }
                        _ => false,
                    },
                    None => false,
                }
            }
            OpenBlock::Resistance => {
                let Some(resistance) = self.step_mut().and_then(|s| s.resistance_handling.as_mut()) else {
                    return false;
                };
                match split_key(line) {
                    Some((key, value)) => feed_resistance(resistance, &key, unescape_value(value)),
                    None => false,
                }
            }
            OpenBlock::Question => {
                let Some(question) = self.step_mut().and_then(|s| s.questions.last_mut()) else {
                    return false;
                };
                feed_question(question, line)
            }
        }
    }
}

fn feed_energy(energy: &mut EnergySettings, key: &str, value: String) -> bool {
    match key {
        "tono" | "tone" => energy.tone = value,
        "volume" => energy.volume = value,
        "ritmo" | "rhythm" => energy.rhythm = value,
        "inflessioni" | "inflections" => energy.inflections = Some(value),
        "vocabolario" | "vocabulary" => energy.vocabulary.push(value),
        "da evitare" | "vocabolario da evitare" | "negative vocabulary" | "avoid" => {
            energy.negative_vocabulary.get_or_insert_with(Vec::new).push(value)
        }
        "mindset" => energy.mindset = Some(value),
        "esempio" | "example" => energy.example = Some(value),
        _ => return false,
    }
    true
}

fn feed_checkpoint(checkpoint: &mut Checkpoint, key: &str, value: String) -> bool {
    match key {
        "verifica" | "check" => checkpoint.checks.push(value),
        "promemoria" | "reminder" => checkpoint.reminder = Some(value),
        "test finale" | "final test" => checkpoint.test_finale = Some(value),
        "esempio test" | "test example" => checkpoint
            .test_finale_examples
            .get_or_insert_with(Vec::new)
            .push(value),
        _ => return false,
    }
    true
}

fn is_resistance_key(key: &str) -> bool {
    matches!(key, "resistenza" | "resistance" | "gestione resistenza")
}

fn feed_resistance(resistance: &mut ResistanceHandling, key: &str, value: String) -> bool {
    match key {
        "risposta" | "response" => resistance.response = value,
        "trigger" => resistance.trigger = value,
        "azione" | "action" => resistance.steps.get_or_insert_with(Vec::new).push(ResistanceStep {
            action: value,
            script: String::new(),
        }),
        "script" => {
            let steps = resistance.steps.get_or_insert_with(Vec::new);
            match steps.last_mut() {
                Some(step) if step.script.is_empty() => step.script = value,
                _ => steps.push(ResistanceStep {
                    action: String::new(),
                    script: value,
                }),
            }
        }
        _ => return false,
    }
    true
}

fn feed_ladder(ladder: &mut Ladder, sub: &mut Option<LadderSub>, indent: usize, line: &str) -> bool {
    match *sub {
        Some(LadderSub::Level(opened)) if indent > opened => {
            if let (Some(level), Some((key, value))) = (ladder.levels.last_mut(), split_key(line)) {
                if feed_ladder_level(level, &key, unescape_value(value)) {
                    return true;
                }
            }
        }
        Some(LadderSub::Resistance(opened)) if indent > opened => {
            if let (Some(resistance), Some((key, value))) =
                (ladder.resistance_handling.as_mut(), split_key(line))
            {
                if feed_resistance(resistance, &key, unescape_value(value)) {
                    return true;
                }
            }
        }
        _ => {}
    }

    let stripped = strip_glyphs(line);
    if let Some(caps) = level_header_re().captures(stripped) {
        let number = caps
            .get(1)
            .and_then(|m| m.as_str().parse::<u32>().ok())
            .unwrap_or(ladder.levels.len() as u32 + 1);
        let name = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
        ladder.levels.push(LadderLevel {
            number,
            name: unescape_value(name.trim()),
            ..Default::default()
        });
        *sub = Some(LadderSub::Level(indent));
        return true;
    }

    let Some((key, value)) = split_key(line) else {
        return false;
    };
    let value = unescape_value(value);

    if is_resistance_key(&key) {
        ladder.resistance_handling = Some(ResistanceHandling {
            trigger: value,
            ..Default::default()
        });
        *sub = Some(LadderSub::Resistance(indent));
        return true;
    }

    let list = match key.as_str() {
        "quando usarlo" | "quando" | "when to use" => &mut ladder.when_to_use,
        "stop quando" | "stop when" => &mut ladder.stop_when,
        "non fermarti quando" | "non fermarti" | "don't stop when" => &mut ladder.dont_stop_when,
        "frase utile" | "helpful phrase" => &mut ladder.helpful_phrases,
        "segnale d'oro" | "segnale d’oro" | "gold signal" => &mut ladder.gold_signals,
        _ => return false,
    };
    list.get_or_insert_with(Vec::new).push(value);
    *sub = None;
    true
}

fn feed_ladder_level(level: &mut LadderLevel, key: &str, value: String) -> bool {
    match key {
        "domanda" | "question" => level.question = value,
        "obiettivo" | "objective" => level.objective = Some(value),
        "tono" | "tone" => level.tone = Some(value),
        "note" | "notes" => level.notes = Some(value),
        "cliente" | "client" => level.examples.push(LadderExample {
            client_says: value,
            you_say: String::new(),
        }),
        "tu" | "you" => match level.examples.last_mut() {
            Some(example) if example.you_say.is_empty() => example.you_say = value,
            _ => level.examples.push(LadderExample {
                client_says: String::new(),
                you_say: value,
            }),
        },
        _ => return false,
    }
    true
}

fn feed_question(question: &mut Question, line: &str) -> bool {
    if is_key_flag(line) {
        question.is_key = true;
        return true;
    }

    let Some((key, value)) = split_key(line) else {
        return false;
    };
    let value = unescape_value(value);

    match key.as_str() {
        "marker" => question.marker = Some(value),
        "condizione" | "condition" => question.condition = Some(value),
        _ => {
            let mut instructions = question.instructions.take().unwrap_or_default();
            let handled = feed_instructions(&mut instructions, &key, value);
            if !instructions.is_empty() {
                question.instructions = Some(instructions);
            }
            return handled;
        }
    }
    true
}

fn feed_instructions(instructions: &mut QuestionInstructions, key: &str, value: String) -> bool {
    let non_empty = |v: String| if v.is_empty() { None } else { Some(v) };

    match key {
        "attendi" | "wait" => {
            instructions.wait = true;
            instructions.wait_details = non_empty(value);
        }
        "dettagli attesa" | "wait details" => instructions.wait_details = non_empty(value),
        "ascolta" | "listen" => instructions.listen = Some(value),
        "reazione" | "react" => instructions.react.push(value),
        "contesto reazione" | "react context" => instructions.react_context = Some(value),
        "istruzione" | "instruction" => instructions.additional_instructions.push(value),
        _ => return false,
    }
    true
}

fn is_key_flag(line: &str) -> bool {
    let flag = strip_glyphs(KEY_FLAG);
    let stripped = strip_glyphs(line);
    stripped.eq_ignore_ascii_case(flag) || stripped.eq_ignore_ascii_case("domanda chiave") || stripped.eq_ignore_ascii_case("key")
}

fn is_rules_header(line: &str) -> bool {
    let stripped = strip_glyphs(line).trim_end_matches(|c: char| !c.is_alphanumeric());
    stripped.eq_ignore_ascii_case("regole globali") || stripped.eq_ignore_ascii_case("global rules")
}

/// Drop leading decoration (emoji, box drawing, bullets) before a keyword
fn strip_glyphs(line: &str) -> &str {
    line.trim_start_matches(|c: char| !c.is_alphanumeric())
}

/// Split `KEY: value` into a lowercased key and the raw value
fn split_key(line: &str) -> Option<(String, &str)> {
    let rest = strip_glyphs(line);
    let colon = rest.find(':')?;
    let key = rest[..colon].trim();

    let is_key_char = |c: char| c.is_alphanumeric() || c == ' ' || c == '\'' || c == '’';
    if key.is_empty() || key.chars().count() > 32 || !key.chars().all(is_key_char) {
        return None;
    }

    Some((key.to_lowercase(), rest[colon + 1..].trim()))
}

/// Box-drawing rule that frames legacy headers like `═══ FASE 1 ═══`
const FRAME_CHARS: [char; 4] = ['═', '━', '─', '='];

/// Header name; closing frame is dropped only when the line opened with one
fn header_name(raw: &str, framed: bool) -> String {
    let trimmed = raw.trim();
    let trimmed = if framed {
        trimmed.trim_end_matches(FRAME_CHARS).trim()
    } else {
        trimmed
    };
    unescape_value(trimmed)
}

fn append_line(target: &mut String, line: &str) {
    if !target.is_empty() {
        target.push('\n');
    }
    target.push_str(line);
}

/// Reverse of the serializer's value escaping
pub(crate) fn unescape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(']') => out.push(']'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Parse text into a block tree with fresh ids
pub fn parse(text: &str, script_type: ScriptType) -> ParseResult<ScriptBlockStructure> {
    let mut ids = IdAllocator::new();
    parse_with(text, &ParseOptions::for_type(script_type), &mut ids)
}

/// Parse with an explicit policy and id source
pub fn parse_with(
    text: &str,
    options: &ParseOptions,
    ids: &mut IdAllocator,
) -> ParseResult<ScriptBlockStructure> {
    Parser::new(options, ids).parse_document(text)
}
