use super::collaborator::Tool;
use super::error::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const RECORD_FILENAME: &str = "provenance.toml";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputRecord {
    pub link: String,
    /// Location inside the sandbox.
    pub path: String,
    pub source: PathBuf,
    pub sha256: String,
}

/// What ran, with which inputs, and what it left behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JobRecord {
    pub id: String,
    pub tool: Tool,
    pub description: String,
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub expected_outputs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(default)]
    pub retrieved: Vec<String>,
    #[serde(default)]
    pub inputs: Vec<InputRecord>,
}

impl JobRecord {
    pub fn path_in(dir: &Path) -> PathBuf {
        dir.join(RECORD_FILENAME)
    }

    pub fn write_to(&self, dir: &Path) -> Result<(), EngineError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| EngineError::Provenance(e.to_string()))?;
        let path = Self::path_in(dir);
        fs::write(&path, content).map_err(EngineError::sandbox(path))
    }

    pub fn read_from(dir: &Path) -> Result<Self, EngineError> {
        let path = Self::path_in(dir);
        let content = fs::read_to_string(&path).map_err(EngineError::sandbox(&path))?;
        toml::from_str(&content).map_err(|e| {
            EngineError::Provenance(format!("'{}' is not a valid record: {}", path.display(), e))
        })
    }
}
