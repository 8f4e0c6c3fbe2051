use super::emit;
use crate::config::Config;
use anyhow::{Context, Result};
use callscript_parser::{parse_with, IdAllocator, ScriptType};
use clap::Args;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;
use tracing::debug;

#[derive(Debug, Args)]
pub struct ParseArgs {
    /// Script text file to parse
    pub input: PathBuf,

    /// Script type (discovery, demo, objections); defaults to config
    #[arg(short = 't', long = "type", value_parser = parse_script_type)]
    pub script_type: Option<ScriptType>,

    /// Output file for the structure JSON (defaults to outDir or stdout)
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

pub fn parse_script_type(value: &str) -> Result<ScriptType, String> {
    ScriptType::from_label(value)
        .ok_or_else(|| format!("unknown script type '{}' (discovery, demo, objections)", value))
}

pub fn parse(args: ParseArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let options = config.parse_options(args.script_type);

    let text = fs::read_to_string(&args.input)
        .with_context(|| format!("Cannot read {}", args.input.display()))?;

    let mut ids = IdAllocator::new();
    let structure = parse_with(&text, &options, &mut ids)
        .with_context(|| format!("{} has no phase markers; edit it as plain text", args.input.display()))?;
    debug!(seed = ids.seed(), "Parsed {}", args.input.display());

    let out = args.out.clone().or_else(|| {
        let stem = args.input.file_stem()?;
        config
            .get_out_dir(cwd)
            .map(|dir| dir.join(format!("{}.json", stem.to_string_lossy())))
    });

    let json = serde_json::to_string_pretty(&structure)?;
    emit(&json, out.as_deref())?;

    if let Some(path) = &out {
        let counts = structure.counts();
        println!(
            "  {} {} → {} ({} phases, {} steps, {} questions)",
            "✓".green(),
            args.input.display(),
            path.display(),
            counts.phases,
            counts.steps,
            counts.questions
        );
    }

    Ok(())
}
