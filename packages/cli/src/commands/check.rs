use super::{find_files, read_script_json, ScriptJson};
use crate::config::Config;
use anyhow::{anyhow, Result};
use callscript_editor::{reconcile as reconcile_record, ReconcileState};
use callscript_parser::{validate, BlockCounts, ParseOptions};
use clap::Args;
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Debug, Args)]
pub struct CheckArgs {
    /// File or directory to check (defaults to scriptsDir from config)
    pub path: Option<PathBuf>,

    /// Show passing files too
    #[arg(short, long)]
    pub verbose: bool,
}

/// Result of checking one file
#[derive(Debug, PartialEq)]
enum FileStatus {
    Valid(BlockCounts),
    TextOnly,
    Invalid(String),
}

pub fn check(args: CheckArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let root = args.path.clone().unwrap_or_else(|| config.get_scripts_dir(cwd));

    let files = if root.is_file() {
        vec![root.clone()]
    } else if root.is_dir() {
        find_files(&root, "json")
    } else {
        return Err(anyhow!("Path does not exist: {}", root.display()));
    };

    println!("🔍 {} {} script file(s)", "Checking".green().bold(), files.len());
    println!();

    let mut failures = 0;
    let mut text_only = 0;

    for file in &files {
        let relative = file.strip_prefix(&root).unwrap_or(file);
        match check_file(file, &config.parse_options(None)) {
            FileStatus::Valid(counts) => {
                if args.verbose {
                    println!(
                        "  {} {} ({} phases, {} steps, {} questions)",
                        "✓".green(),
                        relative.display(),
                        counts.phases,
                        counts.steps,
                        counts.questions
                    );
                }
            }
            FileStatus::TextOnly => {
                text_only += 1;
                println!("  {} {} - text only, no structure", "⚠".yellow(), relative.display());
            }
            FileStatus::Invalid(reason) => {
                failures += 1;
                eprintln!("  {} {} - {}", "✗".red(), relative.display(), reason);
            }
        }
    }

    println!();
    println!("   Files checked: {}", files.len());
    if text_only > 0 {
        println!("   {} {}", "Text only:".yellow(), text_only);
    }

    if failures > 0 {
        return Err(anyhow!("{} file(s) failed validation", failures));
    }

    println!("   {} No issues found!", "✓".green());
    Ok(())
}

fn check_file(path: &Path, options: &ParseOptions) -> FileStatus {
    let structure = match read_script_json(path) {
        Ok(ScriptJson::Structure(structure)) => structure,
        Ok(ScriptJson::Record(record)) => {
            let result = reconcile_record(&record, options);
            match (result.state, result.structure) {
                (ReconcileState::TextFallback, _) | (_, None) => return FileStatus::TextOnly,
                (_, Some(structure)) => structure,
            }
        }
        Err(err) => return FileStatus::Invalid(format!("{:#}", err)),
    };

    match validate(&structure) {
        Ok(()) => FileStatus::Valid(structure.counts()),
        Err(err) => FileStatus::Invalid(err.to_string()),
    }
}
