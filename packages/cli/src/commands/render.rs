use super::{emit, read_script_json, ScriptJson};
use crate::config::Config;
use anyhow::{anyhow, Result};
use callscript_editor::reconcile as reconcile_record;
use callscript_parser::serialize;
use clap::Args;
use colored::Colorize;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Structure or record JSON file
    pub input: PathBuf,

    /// Output text file (defaults to stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn render(args: RenderArgs, cwd: &str) -> Result<()> {
    let structure = match read_script_json(&args.input)? {
        ScriptJson::Structure(structure) => structure,
        ScriptJson::Record(record) => {
            let config = Config::load(cwd)?;
            reconcile_record(&record, &config.parser)
                .structure
                .ok_or_else(|| anyhow!("{} holds only unstructured text", args.input.display()))?
        }
    };

    emit(&serialize(&structure), args.out.as_deref())?;

    if let Some(path) = &args.out {
        println!("  {} {} → {}", "✓".green(), args.input.display(), path.display());
    }

    Ok(())
}
