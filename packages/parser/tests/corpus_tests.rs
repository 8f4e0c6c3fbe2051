// Parser behaviour on hand-written scripts as they show up in practice

use callscript_parser::{parse, parse_with, serialize, validate, BlockCounts, IdAllocator, ParseOptions, ScriptType};

const LEGACY_SCRIPT: &str = "\
═══ FASE 1: APERTURA ═══
Obiettivo della fase è creare fiducia.
STEP 1 - Presentazione
1. Come ti chiami?
2) Di cosa si occupa la tua azienda?
Ricorda di sorridere.
STEP 2: Contesto
- Quanti siete in team?
═══ FASE 2: QUALIFICA ═══
• Qual è il budget?
";

const ANNOTATED_SCRIPT: &str = "\
## FASE #1 - Scoperta
### STEP 1 - Dolore
🪜 LADDER: Scava il problema
   Quando usarlo: Risposta vaga
   LIVELLO 1: Superficie
      Domanda: Cosa non funziona?
      Cliente: Un po' tutto
      Tu: Per esempio?
   LIVELLO 2: Impatto
      Domanda: Quanto vi costa?
   Stop quando: Emerge un numero
❓ Quanto tempo perdete ogni settimana?
   Attendi: 3 secondi
   Reazione: Annuisci
";

fn parse_policy(text: &str, options: ParseOptions) -> callscript_parser::ScriptBlockStructure {
    let mut ids = IdAllocator::from_seed("corpus".to_string());
    parse_with(text, &options, &mut ids).unwrap()
}

#[test]
fn test_legacy_script_default_policy() {
    let doc = parse(LEGACY_SCRIPT, ScriptType::Discovery).unwrap();

    assert_eq!(doc.counts(), BlockCounts { phases: 2, steps: 3, questions: 4 });
    assert_eq!(validate(&doc), Ok(()));

    let apertura = &doc.phases[0];
    assert_eq!(apertura.name, "APERTURA");
    assert_eq!(apertura.number, "1");
    assert_eq!(apertura.description, "Obiettivo della fase è creare fiducia.");
    assert_eq!(apertura.steps[0].questions[0].text, "Come ti chiami?");
    assert_eq!(apertura.steps[0].questions[1].text, "Di cosa si occupa la tua azienda?");
    assert_eq!(apertura.steps[0].notes.as_deref(), Some("Ricorda di sorridere."));
    assert_eq!(apertura.steps[1].number, 2);
    assert_eq!(apertura.steps[1].name, "Contesto");

    // Question before any step header opens an unnamed step
    let qualifica = &doc.phases[1];
    assert_eq!(qualifica.steps.len(), 1);
    assert_eq!(qualifica.steps[0].name, "");
    assert_eq!(qualifica.steps[0].questions[0].text, "Qual è il budget?");
}

#[test]
fn test_legacy_script_without_implicit_steps() {
    let options = ParseOptions {
        implicit_steps: false,
        ..ParseOptions::default()
    };
    let doc = parse_policy(LEGACY_SCRIPT, options);

    assert_eq!(doc.counts(), BlockCounts { phases: 2, steps: 2, questions: 3 });
    assert!(doc.phases[1].steps.is_empty());
    assert!(doc.phases[1].description.contains("Qual è il budget?"));
}

#[test]
fn test_legacy_script_without_bullet_questions() {
    let options = ParseOptions {
        bullet_questions: false,
        ..ParseOptions::default()
    };
    let doc = parse_policy(LEGACY_SCRIPT, options);

    assert_eq!(doc.counts(), BlockCounts { phases: 2, steps: 2, questions: 0 });
    let notes = doc.phases[0].steps[0].notes.as_deref().unwrap_or_default();
    assert!(notes.contains("1. Come ti chiami?"));
    assert!(notes.contains("Ricorda di sorridere."));
}

#[test]
fn test_annotated_script_fills_ladder_and_instructions() {
    let doc = parse(ANNOTATED_SCRIPT, ScriptType::Discovery).unwrap();
    assert_eq!(validate(&doc), Ok(()));

    let step = &doc.phases[0].steps[0];
    let ladder = step.ladder.as_ref().unwrap();
    assert_eq!(ladder.title, "Scava il problema");
    assert_eq!(ladder.when_to_use, Some(vec!["Risposta vaga".to_string()]));
    assert_eq!(ladder.levels.len(), 2);
    assert_eq!(ladder.levels[0].question, "Cosa non funziona?");
    assert_eq!(ladder.levels[0].examples[0].client_says, "Un po' tutto");
    assert_eq!(ladder.levels[0].examples[0].you_say, "Per esempio?");
    assert_eq!(ladder.levels[1].name, "Impatto");
    assert_eq!(ladder.stop_when, Some(vec!["Emerge un numero".to_string()]));

    // Ladder level questions are not tree questions
    assert_eq!(step.questions.len(), 1);
    let instructions = step.questions[0].instructions.as_ref().unwrap();
    assert!(instructions.wait);
    assert_eq!(instructions.wait_details.as_deref(), Some("3 secondi"));
    assert_eq!(instructions.react, vec!["Annuisci".to_string()]);
}

#[test]
fn test_legacy_text_normalises_through_canonical_form() {
    let doc = parse(LEGACY_SCRIPT, ScriptType::Demo).unwrap();
    let canonical = serialize(&doc);
    let reparsed = parse(&canonical, ScriptType::Demo).unwrap();

    assert_eq!(reparsed.counts(), doc.counts());
    assert_eq!(serialize(&reparsed), canonical);
    assert_eq!(reparsed.phases[0].steps[0].notes, doc.phases[0].steps[0].notes);
}

#[test]
fn test_document_allocator_parses_identically() {
    let options = ParseOptions::for_type(ScriptType::Objections);
    let first = parse_with(ANNOTATED_SCRIPT, &options, &mut IdAllocator::for_document("doc-9")).unwrap();
    let second = parse_with(ANNOTATED_SCRIPT, &options, &mut IdAllocator::for_document("doc-9")).unwrap();
    let other = parse_with(ANNOTATED_SCRIPT, &options, &mut IdAllocator::for_document("doc-10")).unwrap();

    assert_eq!(first, second);
    assert_ne!(first.phases[0].id, other.phases[0].id);
    assert_eq!(first.metadata.script_type, ScriptType::Objections);
}
