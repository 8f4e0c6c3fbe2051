pub mod check;
pub mod init;
pub mod parse;
pub mod reconcile;
pub mod render;

pub use check::{check, CheckArgs};
pub use init::{init, InitArgs};
pub use parse::{parse, ParseArgs};
pub use reconcile::{reconcile, ReconcileArgs};
pub use render::{render, RenderArgs};

use anyhow::{Context, Result};
use callscript_editor::ScriptRecord;
use callscript_parser::ScriptBlockStructure;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A JSON file holding either a full record or a bare structure
#[derive(Debug)]
pub enum ScriptJson {
    Record(ScriptRecord),
    Structure(ScriptBlockStructure),
}

pub fn read_script_json(path: &Path) -> Result<ScriptJson> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("Invalid JSON in {}", path.display()))?;

    // Records nest the tree under "structure"; bare trees carry "phases" at the top
    if value.get("phases").is_some() {
        let structure = serde_json::from_value(value)
            .with_context(|| format!("Invalid structure in {}", path.display()))?;
        Ok(ScriptJson::Structure(structure))
    } else {
        let record = serde_json::from_value(value)
            .with_context(|| format!("Invalid record in {}", path.display()))?;
        Ok(ScriptJson::Record(record))
    }
}

/// Write to `out` or print to stdout
pub fn emit(output: &str, out: Option<&Path>) -> Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, output).with_context(|| format!("Cannot write {}", path.display()))?;
        }
        None => println!("{}", output),
    }
    Ok(())
}

pub fn find_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && path.extension().map(|e| e == extension).unwrap_or(false))
        .collect();
    files.sort();
    files
}
