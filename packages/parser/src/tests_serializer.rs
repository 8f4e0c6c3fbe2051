/// Round-trip tests: serialize then parse keeps shape and text, not ids
use crate::ast::*;
use crate::*;

fn rich_document() -> ScriptBlockStructure {
    let mut ids = IdAllocator::from_seed("rt".to_string());
    let mut doc = ScriptBlockStructure::empty(ScriptMetadata::new("Discovery Call Premium", ScriptType::Discovery));
    doc.metadata.version = "2.4".to_string();

    let mut rule = GlobalRule::new(ids.allocate(BlockKind::Rule), "Non vendere mai nella prima fase");
    rule.content = "Ascolta prima,\nproponi dopo".to_string();
    doc.global_rules.push(rule);

    let mut opening = Phase::new(ids.allocate(BlockKind::Phase), "1", "Apertura & Rapport");
    opening.description = "Creare un clima sereno.\nPresentarsi in 30 secondi.".to_string();
    opening.transition = Some("Perfetto, allora partiamo da te".to_string());
    opening.energy = Some(EnergySettings {
        level: EnergyLevel::Alto,
        tone: "Caldo".to_string(),
        volume: "Medio-alto".to_string(),
        rhythm: "Sostenuto".to_string(),
        inflections: Some("Sorriso nella voce".to_string()),
        vocabulary: vec!["Fantastico".to_string(), "Perfetto".to_string()],
        negative_vocabulary: Some(vec!["Forse".to_string()]),
        mindset: Some("Sono qui per aiutare".to_string()),
        example: Some("Ciao Marco! Come stai?".to_string()),
    });
    opening.checkpoint = Some(Checkpoint {
        title: "Rapport creato?".to_string(),
        checks: vec!["Il cliente ha riso".to_string(), "Ha detto il suo ruolo".to_string()],
        resistance_handling: Some(ResistanceHandling {
            trigger: "Ho poco tempo".to_string(),
            response: "Ci metto 10 minuti".to_string(),
            steps: Some(vec![ResistanceStep {
                action: "Rassicura".to_string(),
                script: "Se non è utile chiudiamo subito".to_string(),
            }]),
        }),
        reminder: Some("Non saltare".to_string()),
        test_finale: Some("Ti torna?".to_string()),
        test_finale_examples: Some(vec!["Sì, chiarissimo".to_string()]),
    });

    let mut greeting = Step::new(ids.allocate(BlockKind::Step), 1, "Saluto");
    greeting.objective = "Rompere il ghiaccio".to_string();
    greeting.notes = Some("Usa il nome".to_string());
    let mut q = Question::new(ids.allocate(BlockKind::Question), "Come stai oggi?");
    q.marker = Some("👋".to_string());
    q.is_key = true;
    q.instructions = Some(QuestionInstructions {
        wait: true,
        wait_details: Some("3 secondi".to_string()),
        listen: Some("Tono di voce".to_string()),
        react: vec!["Che bello!".to_string(), "Capisco".to_string()],
        react_context: Some("Se risponde male".to_string()),
        additional_instructions: vec!["Sorridi".to_string()],
    });
    greeting.questions.push(q);
    greeting.questions.push(Question::new(ids.allocate(BlockKind::Question), "Da dove mi chiami?"));
    opening.steps.push(greeting);

    let mut context = Step::new(ids.allocate(BlockKind::Step), 2, "Contesto");
    let mut cq = Question::new(ids.allocate(BlockKind::Question), "Cosa fai: ruolo e azienda?");
    cq.condition = Some("Solo se non l'ha già detto".to_string());
    context.questions.push(cq);
    opening.steps.push(context);
    doc.phases.push(opening);

    let mut pain = Phase::new(ids.allocate(BlockKind::Phase), "2", "Scoperta del dolore");
    let mut dig = Step::new(ids.allocate(BlockKind::Step), 1, "Scavare");
    dig.transition = Some("E quindi?".to_string());
    dig.energy = Some(EnergySettings {
        level: EnergyLevel::Basso,
        tone: "Riflessivo".to_string(),
        ..Default::default()
    });
    dig.ladder = Some(Ladder {
        title: "Ladder del dolore".to_string(),
        when_to_use: Some(vec!["Risposta vaga".to_string()]),
        levels: vec![
            LadderLevel {
                number: 1,
                name: "Superficie".to_string(),
                question: "Cosa intendi esattamente?".to_string(),
                objective: Some("Chiarire".to_string()),
                tone: Some("Curioso".to_string()),
                notes: Some("Breve".to_string()),
                examples: vec![LadderExample {
                    client_says: "Non va benissimo".to_string(),
                    you_say: "In che senso?".to_string(),
                }],
            },
            LadderLevel {
                number: 2,
                name: "Impatto".to_string(),
                question: "Quanto vi costa?".to_string(),
                ..Default::default()
            },
        ],
        stop_when: Some(vec!["Emerge un numero".to_string()]),
        dont_stop_when: Some(vec!["Risponde a monosillabi".to_string()]),
        helpful_phrases: Some(vec!["Dimmi di più".to_string()]),
        gold_signals: Some(vec!["Parla di budget".to_string()]),
        resistance_handling: Some(ResistanceHandling {
            trigger: "Perché lo chiedi?".to_string(),
            response: "Per capire se posso aiutarti".to_string(),
            steps: None,
        }),
    });
    dig.biscottino = Some(Biscottino {
        trigger: "Il cliente divaga".to_string(),
        phrase: "Torniamo un attimo a te".to_string(),
    });
    dig.resistance_handling = Some(ResistanceHandling {
        trigger: "Va tutto bene".to_string(),
        response: "Ottimo, allora cosa migliorereste?".to_string(),
        steps: None,
    });
    dig.questions.push(Question::new(ids.allocate(BlockKind::Question), "Qual è la sfida più grande?"));
    pain.steps.push(dig);
    doc.phases.push(pain);

    doc.phases.push(Phase::new(ids.allocate(BlockKind::Phase), "3", "Chiusura"));
    doc
}

/// Everything except ids must match
fn strip_ids(mut doc: ScriptBlockStructure) -> ScriptBlockStructure {
    for rule in &mut doc.global_rules {
        rule.id.clear();
    }
    for phase in &mut doc.phases {
        phase.id.clear();
        for step in &mut phase.steps {
            step.id.clear();
            for question in &mut step.questions {
                question.id.clear();
            }
        }
    }
    doc
}

#[test]
fn test_roundtrip_preserves_shape_and_text() {
    let doc = rich_document();
    let text = serialize(&doc);
    let reparsed = parse(&text, doc.metadata.script_type).expect("serialized text should parse");

    assert_eq!(reparsed.counts(), doc.counts());
    for (original, parsed) in doc.phases.iter().zip(&reparsed.phases) {
        assert_eq!(original.name, parsed.name);
        assert_eq!(original.steps.len(), parsed.steps.len());
        for (os, ps) in original.steps.iter().zip(&parsed.steps) {
            assert_eq!(os.name, ps.name);
            let texts: Vec<&str> = os.questions.iter().map(|q| q.text.as_str()).collect();
            let reparsed_texts: Vec<&str> = ps.questions.iter().map(|q| q.text.as_str()).collect();
            assert_eq!(texts, reparsed_texts);
        }
    }
}

#[test]
fn test_roundtrip_preserves_every_annotation() {
    let doc = rich_document();
    let reparsed = parse(&serialize(&doc), ScriptType::Discovery).unwrap();

    assert_eq!(strip_ids(reparsed), strip_ids(doc));
}

#[test]
fn test_roundtrip_mints_fresh_ids() {
    let doc = rich_document();
    let reparsed = parse(&serialize(&doc), ScriptType::Discovery).unwrap();

    for id in reparsed.all_ids() {
        assert!(!doc.contains_id(id), "id {} leaked through the text path", id);
    }
}

#[test]
fn test_roundtrip_multiline_and_marker_like_text() {
    let mut doc = rich_document();
    doc.phases[0].name = "Apertura\nseconda riga".to_string();
    doc.phases[0].steps[0].questions[0].text = "FASE 9 - non è un header?".to_string();
    doc.phases[1].steps[0].notes = Some("❓ non è una domanda\n### STEP 4 - neanche".to_string());

    let reparsed = parse(&serialize(&doc), ScriptType::Discovery).unwrap();
    assert_eq!(strip_ids(reparsed), strip_ids(doc));
}

#[test]
fn test_serialize_parse_serialize_is_stable() {
    let doc = rich_document();
    let first = serialize(&doc);
    let second = serialize(&parse(&first, ScriptType::Discovery).unwrap());
    assert_eq!(first, second);
}

#[test]
fn test_roundtrip_script_type_comes_from_caller() {
    let doc = rich_document();
    let reparsed = parse(&serialize(&doc), ScriptType::Objections).unwrap();
    assert_eq!(reparsed.metadata.script_type, ScriptType::Objections);
    assert_eq!(reparsed.metadata.name, "Discovery Call Premium");
    assert_eq!(reparsed.metadata.version, "2.4");
}

#[test]
fn test_roundtrip_phase_labels_with_separators() {
    for label in ["1-bis", "1 bis", "2: extra", "[3]", "A\\B", "IV.b"] {
        let mut doc = rich_document();
        doc.phases[0].number = label.to_string();

        let reparsed = parse(&serialize(&doc), ScriptType::Discovery).unwrap();
        assert_eq!(reparsed.phases[0].number, label, "label {:?}", label);
        assert_eq!(reparsed.phases[0].name, "Apertura & Rapport", "label {:?}", label);
    }
}

#[test]
fn test_plain_phase_labels_stay_bare() {
    let mut doc = rich_document();
    doc.phases[0].number = "1-bis".to_string();
    doc.phases[1].number = "2B".to_string();
    let text = serialize(&doc);

    assert!(text.contains("## FASE #[1-bis] - Apertura & Rapport\n"));
    assert!(text.contains("## FASE #2B - "));
}

#[test]
fn test_roundtrip_names_ending_in_box_drawing() {
    let mut doc = rich_document();
    doc.phases[2].name = "Chiusura ═".to_string();
    doc.phases[0].steps[0].name = "Saluto ───".to_string();

    let reparsed = parse(&serialize(&doc), ScriptType::Discovery).unwrap();
    assert_eq!(strip_ids(reparsed), strip_ids(doc));
}

#[test]
fn test_roundtrip_rule_titled_like_the_rules_header() {
    let mut doc = rich_document();
    let mut ids = IdAllocator::from_seed("hdr".to_string());
    doc.global_rules.push(GlobalRule::new(ids.allocate(BlockKind::Rule), "Regole globali"));
    doc.global_rules.push(GlobalRule::new(ids.allocate(BlockKind::Rule), "GLOBAL RULES:"));

    let reparsed = parse(&serialize(&doc), ScriptType::Discovery).unwrap();
    let titles: Vec<&str> = reparsed.global_rules.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(
        titles,
        vec!["Non vendere mai nella prima fase", "Regole globali", "GLOBAL RULES:"]
    );
}

#[test]
fn test_roundtrip_carriage_returns() {
    let mut doc = rich_document();
    doc.phases[0].description = "riga\r\nseconda".to_string();
    doc.phases[0].steps[0].questions[0].text = "Prima\rdopo?".to_string();

    let reparsed = parse(&serialize(&doc), ScriptType::Discovery).unwrap();
    assert_eq!(strip_ids(reparsed), strip_ids(doc));
}
