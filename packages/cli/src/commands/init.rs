use crate::config::{Config, DEFAULT_CONFIG_NAME};
use anyhow::Result;
use callscript_parser::ScriptType;
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

const EXAMPLE_SCRIPT: &str = r#"SCRIPT: Discovery di esempio
VERSIONE: 1.0

REGOLE GLOBALI
- Ascolta più di quanto parli
  > Lascia sempre finire il cliente

## FASE #1 - Apertura
DESCRIZIONE: Creare un clima sereno
⚡ ENERGIA: ALTO
   Tono: Caldo
   Ritmo: Sostenuto

### STEP 1 - Saluto
🎯 OBIETTIVO: Rompere il ghiaccio
❓ Come stai oggi?
   ⭐ CHIAVE
   Ascolta: Il tono della risposta

## FASE #2 - Scoperta
### STEP 1 - Situazione attuale
❓ Come gestite oggi questo processo?
🍪 BISCOTTINO: Il cliente divaga
   Frase: Torniamo un attimo a te
"#;

#[derive(Debug, Args)]
pub struct InitArgs {
    /// Scripts directory
    #[arg(short, long, default_value = "scripts")]
    pub scripts_dir: String,

    /// Default script type (discovery, demo, objections)
    #[arg(short = 't', long = "type", default_value = "discovery", value_parser = super::parse::parse_script_type)]
    pub script_type: ScriptType,

    /// Force overwrite existing config
    #[arg(short, long)]
    pub force: bool,
}

pub fn init(args: InitArgs, cwd: &str) -> Result<()> {
    let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

    // Check if config already exists
    if config_path.exists() && !args.force {
        println!(
            "{} {} already exists",
            "⚠️".yellow(),
            DEFAULT_CONFIG_NAME.bright_white()
        );
        println!("Use --force to overwrite");
        return Ok(());
    }

    println!("{}", "📝 Initializing Callscript project...".bright_blue().bold());

    let scripts_dir = PathBuf::from(cwd).join(&args.scripts_dir);
    if !scripts_dir.exists() {
        fs::create_dir_all(&scripts_dir)?;
        println!("  {} Created {}/", "✓".green(), args.scripts_dir);
    }

    let example_file = scripts_dir.join("esempio.txt");
    if !example_file.exists() {
        fs::write(&example_file, EXAMPLE_SCRIPT)?;
        println!("  {} Created {}/esempio.txt", "✓".green(), args.scripts_dir);
    }

    let config = Config {
        scripts_dir: args.scripts_dir.clone(),
        default_script_type: args.script_type,
        ..Config::default()
    };
    fs::write(&config_path, serde_json::to_string_pretty(&config)?)?;
    println!("  {} Created {}", "✓".green(), DEFAULT_CONFIG_NAME);

    println!();
    println!("{}", "✨ Project initialized!".green().bold());
    println!("Next: callscript parse {}/esempio.txt", args.scripts_dir);

    Ok(())
}
