//! Persisted script record, as exchanged with the storage layer.

use callscript_parser::ast::{GlobalRule, Phase, ScriptBlockStructure, ScriptMetadata, ScriptType};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptRecord {
    /// Stable document id, distinct from any block id
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub script_type: ScriptType,
    #[serde(default = "default_version")]
    pub version: String,
    /// Canonical text rendering of the structure
    #[serde(default)]
    pub content: String,
    /// Block tree; absent on legacy records
    #[serde(default)]
    pub structure: Option<StoredStructure>,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl ScriptRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, script_type: ScriptType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            script_type,
            version: default_version(),
            content: String::new(),
            structure: None,
            is_active: true,
            updated_at: Utc::now(),
        }
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Metadata derived from the record itself
    pub fn metadata(&self) -> ScriptMetadata {
        ScriptMetadata {
            name: self.name.clone(),
            script_type: self.script_type,
            version: self.version.clone(),
        }
    }

    /// Store a save payload and bump the timestamp
    pub fn apply_save(&mut self, payload: SavePayload) {
        self.content = payload.content;
        self.structure = payload.structure.map(StoredStructure::from);
        self.updated_at = Utc::now();
    }
}

/// Structure as stored; older records may lack metadata and global rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredStructure {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ScriptMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_rules: Option<Vec<GlobalRule>>,
    #[serde(default)]
    pub phases: Vec<Phase>,
}

impl StoredStructure {
    pub fn has_phases(&self) -> bool {
        !self.phases.is_empty()
    }

    /// Fill missing metadata and global rules from the record.
    ///
    /// Returns the full tree and whether anything had to be filled in.
    pub fn upgrade(&self, record: &ScriptRecord) -> (ScriptBlockStructure, bool) {
        let filled = self.metadata.is_none() || self.global_rules.is_none();

        let tree = ScriptBlockStructure {
            metadata: self.metadata.clone().unwrap_or_else(|| record.metadata()),
            global_rules: self.global_rules.clone().unwrap_or_default(),
            phases: self.phases.clone(),
        };

        (tree, filled)
    }
}

impl From<ScriptBlockStructure> for StoredStructure {
    fn from(tree: ScriptBlockStructure) -> Self {
        Self {
            metadata: Some(tree.metadata),
            global_rules: Some(tree.global_rules),
            phases: tree.phases,
        }
    }
}

/// What the editor sends back on save: always both forms when a tree exists
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavePayload {
    pub content: String,
    pub structure: Option<ScriptBlockStructure>,
}
