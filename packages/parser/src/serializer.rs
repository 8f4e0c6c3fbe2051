use crate::ast::*;

pub(crate) const PHASE_HEADER: &str = "## FASE";
pub(crate) const STEP_HEADER: &str = "### STEP";
pub(crate) const RULES_HEADER: &str = "REGOLE GLOBALI";
pub(crate) const QUESTION_GLYPH: &str = "❓";
pub(crate) const KEY_FLAG: &str = "⭐ CHIAVE";

/// Serializer renders a block tree as canonical flat text
///
/// Output is a pure function of the tree: the same tree always produces the
/// same bytes. Block-opening lines sit at column 0 and their content is
/// indented, which is what the parser uses to attach nested annotations.
pub struct Serializer {
    indent_level: usize,
    indent_string: String,
}

impl Serializer {
    pub fn new() -> Self {
        Self {
            indent_level: 0,
            indent_string: "   ".to_string(), // 3 spaces
        }
    }

    /// Serialize a document to text
    pub fn serialize(&mut self, doc: &ScriptBlockStructure) -> String {
        let mut output = String::new();

        self.write_field(&mut output, "SCRIPT", &doc.metadata.name);
        self.write_field(&mut output, "TIPO", doc.metadata.script_type.as_str());
        self.write_field(&mut output, "VERSIONE", &doc.metadata.version);

        if !doc.global_rules.is_empty() {
            output.push('\n');
            output.push_str(RULES_HEADER);
            output.push('\n');
            for rule in &doc.global_rules {
                self.serialize_rule(rule, &mut output);
            }
        }

        for (i, phase) in doc.phases.iter().enumerate() {
            output.push('\n');
            self.serialize_phase(phase, i + 1, &mut output);
        }

        output
    }

    fn serialize_rule(&mut self, rule: &GlobalRule, output: &mut String) {
        output.push_str("- ");
        output.push_str(&escape_value(&rule.title));
        output.push('\n');
        if !rule.content.is_empty() {
            output.push_str("  > ");
            output.push_str(&escape_value(&rule.content));
            output.push('\n');
        }
    }

    fn serialize_phase(&mut self, phase: &Phase, position: usize, output: &mut String) {
        let number = if phase.number.trim().is_empty() {
            position.to_string()
        } else {
            phase_label(&phase.number)
        };
        self.write_header(output, &format!("{} #{}", PHASE_HEADER, number), &phase.name);

        self.write_optional(output, "DESCRIZIONE", Some(&phase.description));
        if let Some(energy) = &phase.energy {
            self.serialize_energy(energy, output);
        }
        if let Some(checkpoint) = &phase.checkpoint {
            self.serialize_checkpoint(checkpoint, output);
        }
        self.write_optional(output, "➡️ TRANSIZIONE", phase.transition.as_ref());

        for step in &phase.steps {
            output.push('\n');
            self.serialize_step(step, output);
        }
    }

    fn serialize_step(&mut self, step: &Step, output: &mut String) {
        self.write_header(output, &format!("{} {}", STEP_HEADER, step.number), &step.name);

        self.write_optional(output, "🎯 OBIETTIVO", Some(&step.objective));
        self.write_optional(output, "📝 NOTE", step.notes.as_ref());
        self.write_optional(output, "➡️ TRANSIZIONE", step.transition.as_ref());

        if let Some(energy) = &step.energy {
            self.serialize_energy(energy, output);
        }
        if let Some(ladder) = &step.ladder {
            self.serialize_ladder(ladder, output);
        }
        if let Some(biscottino) = &step.biscottino {
            self.write_field(output, "🍪 BISCOTTINO", &biscottino.trigger);
            self.indent_level += 1;
            self.write_optional(output, "Frase", Some(&biscottino.phrase));
            self.indent_level -= 1;
        }
        if let Some(resistance) = &step.resistance_handling {
            self.serialize_resistance(resistance, output);
        }

        for question in &step.questions {
            self.serialize_question(question, output);
        }
    }

    fn serialize_question(&mut self, question: &Question, output: &mut String) {
        output.push_str(QUESTION_GLYPH);
        output.push(' ');
        output.push_str(&escape_value(&question.text));
        output.push('\n');

        self.indent_level += 1;
        self.write_optional(output, "Marker", question.marker.as_ref());
        self.write_optional(output, "Condizione", question.condition.as_ref());
        if question.is_key {
            self.write_indent(output);
            output.push_str(KEY_FLAG);
            output.push('\n');
        }
        if let Some(instructions) = &question.instructions {
            if instructions.wait {
                let details = instructions.wait_details.as_deref().unwrap_or_default();
                self.write_field(output, "Attendi", details);
            } else {
                self.write_optional(output, "Dettagli attesa", instructions.wait_details.as_ref());
            }
            self.write_optional(output, "Ascolta", instructions.listen.as_ref());
            self.write_list(output, "Reazione", &instructions.react);
            self.write_optional(output, "Contesto reazione", instructions.react_context.as_ref());
            self.write_list(output, "Istruzione", &instructions.additional_instructions);
        }
        self.indent_level -= 1;
    }

    fn serialize_energy(&mut self, energy: &EnergySettings, output: &mut String) {
        self.write_field(output, "⚡ ENERGIA", energy.level.as_str());

        self.indent_level += 1;
        self.write_optional(output, "Tono", Some(&energy.tone));
        self.write_optional(output, "Volume", Some(&energy.volume));
        self.write_optional(output, "Ritmo", Some(&energy.rhythm));
        self.write_optional(output, "Inflessioni", energy.inflections.as_ref());
        self.write_list(output, "Vocabolario", &energy.vocabulary);
        if let Some(negative) = &energy.negative_vocabulary {
            self.write_list(output, "Da evitare", negative);
        }
        self.write_optional(output, "Mindset", energy.mindset.as_ref());
        self.write_optional(output, "Esempio", energy.example.as_ref());
        self.indent_level -= 1;
    }

    fn serialize_checkpoint(&mut self, checkpoint: &Checkpoint, output: &mut String) {
        self.write_field(output, "✅ CHECKPOINT", &checkpoint.title);

        self.indent_level += 1;
        self.write_list(output, "Verifica", &checkpoint.checks);
        self.write_optional(output, "Promemoria", checkpoint.reminder.as_ref());
        self.write_optional(output, "Test finale", checkpoint.test_finale.as_ref());
        if let Some(examples) = &checkpoint.test_finale_examples {
            self.write_list(output, "Esempio test", examples);
        }
        if let Some(resistance) = &checkpoint.resistance_handling {
            self.serialize_resistance(resistance, output);
        }
        self.indent_level -= 1;
    }

    fn serialize_ladder(&mut self, ladder: &Ladder, output: &mut String) {
        self.write_field(output, "🪜 LADDER", &ladder.title);

        self.indent_level += 1;
        if let Some(when) = &ladder.when_to_use {
            self.write_list(output, "Quando usarlo", when);
        }
        for level in &ladder.levels {
            self.write_field(output, &format!("LIVELLO {}", level.number), &level.name);

            self.indent_level += 1;
            self.write_optional(output, "Domanda", Some(&level.question));
            self.write_optional(output, "Obiettivo", level.objective.as_ref());
            self.write_optional(output, "Tono", level.tone.as_ref());
            self.write_optional(output, "Note", level.notes.as_ref());
            for example in &level.examples {
                self.write_field(output, "Cliente", &example.client_says);
                self.write_field(output, "Tu", &example.you_say);
            }
            self.indent_level -= 1;
        }
        let lists = [
            ("Stop quando", &ladder.stop_when),
            ("Non fermarti quando", &ladder.dont_stop_when),
            ("Frase utile", &ladder.helpful_phrases),
            ("Segnale d'oro", &ladder.gold_signals),
        ];
        for (key, items) in lists {
            if let Some(items) = items {
                self.write_list(output, key, items);
            }
        }
        if let Some(resistance) = &ladder.resistance_handling {
            self.serialize_resistance(resistance, output);
        }
        self.indent_level -= 1;
    }

    fn serialize_resistance(&mut self, resistance: &ResistanceHandling, output: &mut String) {
        self.write_field(output, "🛡️ RESISTENZA", &resistance.trigger);

        self.indent_level += 1;
        self.write_optional(output, "Risposta", Some(&resistance.response));
        for step in resistance.steps.iter().flatten() {
            self.write_field(output, "Azione", &step.action);
            self.write_field(output, "Script", &step.script);
        }
        self.indent_level -= 1;
    }

    fn write_header(&self, output: &mut String, header: &str, name: &str) {
        output.push_str(header);
        output.push_str(" - ");
        output.push_str(&escape_value(name));
        output.push('\n');
    }

    /// `Key: value`, always written
    fn write_field(&self, output: &mut String, key: &str, value: &str) {
        self.write_indent(output);
        output.push_str(key);
        output.push(':');
        let value = escape_value(value);
        if !value.is_empty() {
            output.push(' ');
            output.push_str(&value);
        }
        output.push('\n');
    }

    /// `Key: value`, skipped when absent or empty
    fn write_optional(&self, output: &mut String, key: &str, value: Option<&String>) {
        if let Some(value) = value.filter(|v| !v.trim().is_empty()) {
            self.write_field(output, key, value);
        }
    }

    /// One `Key: item` line per item
    fn write_list(&self, output: &mut String, key: &str, items: &[String]) {
        for item in items {
            self.write_field(output, key, item);
        }
    }

    fn write_indent(&self, output: &mut String) {
        for _ in 0..self.indent_level {
            output.push_str(&self.indent_string);
        }
    }
}

impl Default for Serializer {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function to serialize a document
pub fn serialize(doc: &ScriptBlockStructure) -> String {
    let mut serializer = Serializer::new();
    serializer.serialize(doc)
}

/// Keep a value on one line: `\` becomes `\\`, line breaks become `\n` and `\r`
pub(crate) fn escape_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.trim().chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Phase label as written after `#`; anything beyond word characters and
/// dots is bracketed so separators inside it are not read as the name
fn phase_label(number: &str) -> String {
    let number = number.trim();
    if number.chars().all(|c| c.is_alphanumeric() || c == '.' || c == '_') {
        return number.to_string();
    }
    format!("[{}]", escape_value(number).replace(']', "\\]"))
}
