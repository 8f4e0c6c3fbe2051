use super::{read_script_json, ScriptJson};
use crate::config::Config;
use anyhow::{anyhow, Result};
use callscript_editor::{reconcile as reconcile_record, ReconcileState};
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct ReconcileArgs {
    /// Persisted record JSON file
    pub input: PathBuf,

    /// Print the adopted structure as JSON instead of a summary
    #[arg(long)]
    pub json: bool,
}

pub fn reconcile(args: ReconcileArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;

    let record = match read_script_json(&args.input)? {
        ScriptJson::Record(record) => record,
        ScriptJson::Structure(_) => {
            return Err(anyhow!(
                "{} is a bare structure, not a record",
                args.input.display()
            ))
        }
    };

    let result = reconcile_record(&record, &config.parser);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.structure)?);
        return Ok(());
    }

    let state = match result.state {
        ReconcileState::StructureTrusted => result.state.to_string().green().bold(),
        ReconcileState::TextFallback => result.state.to_string().yellow().bold(),
        _ => result.state.to_string().normal(),
    };

    println!("📄 {} ({})", record.name.bright_white(), record.id);
    println!("   State: {}", state);

    match &result.structure {
        Some(structure) => {
            let counts = structure.counts();
            println!("   Phases: {}", counts.phases);
            println!("   Steps: {}", counts.steps);
            println!("   Questions: {}", counts.questions);
            println!("   Global rules: {}", structure.global_rules.len());
        }
        None => {
            println!("   Text lines: {}", record.content.lines().count());
        }
    }

    if result.upgraded {
        println!("   {} Missing metadata/rules filled with defaults", "ℹ".blue());
    }

    Ok(())
}
