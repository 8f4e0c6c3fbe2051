use callscript_parser::{ParseOptions, ScriptType};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "callscript.config.json";

/// Callscript configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Directory holding script records and text files
    #[serde(default = "default_scripts_dir")]
    pub scripts_dir: String,

    /// Script type used when a command gets no `--type`
    #[serde(default)]
    pub default_script_type: ScriptType,

    /// Where `parse` writes structures when no `--out` is given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Parser acceptance policy
    #[serde(default)]
    pub parser: ParseOptions,
}

fn default_scripts_dir() -> String {
    "scripts".to_string()
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    /// Get absolute path to scripts directory
    pub fn get_scripts_dir(&self, cwd: &str) -> PathBuf {
        PathBuf::from(cwd).join(&self.scripts_dir)
    }

    pub fn get_out_dir(&self, cwd: &str) -> Option<PathBuf> {
        self.out_dir.as_ref().map(|dir| Path::new(cwd).join(dir))
    }

    /// Parser policy with the script type resolved
    pub fn parse_options(&self, script_type: Option<ScriptType>) -> ParseOptions {
        ParseOptions {
            script_type: script_type.unwrap_or(self.default_script_type),
            ..self.parser.clone()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            scripts_dir: default_scripts_dir(),
            default_script_type: ScriptType::Discovery,
            out_dir: None,
            parser: ParseOptions::default(),
        }
    }
}
