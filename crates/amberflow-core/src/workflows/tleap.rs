use super::{JobPlan, file_name};
use crate::core::script::directive::Dialect;
use crate::core::script::scanner::scan_file;
use crate::engine::collaborator::{CommandLine, Tool};
use crate::engine::error::EngineError;
use crate::engine::resolver::ArtifactResolver;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub const SCRIPT_LINK: &str = "tleapscript";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TleapParameters {
    /// The tleap script passed with `-f`.
    pub script: PathBuf,
    /// Directories passed with `-I`; every file below each is staged.
    pub include_dirs: Vec<PathBuf>,
}

impl TleapParameters {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        Self {
            script: script.into(),
            include_dirs: Vec::new(),
        }
    }

    pub fn with_include_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.include_dirs.push(dir.into());
        self
    }
}

/// Scans the script and resolves everything it loads and saves.
///
/// Paths inside the script resolve against the script's own directory. The
/// script and include directories resolve against `base_dir`.
#[instrument(skip_all, name = "tleap_prepare")]
pub fn prepare(params: &TleapParameters, base_dir: &Path) -> Result<JobPlan, EngineError> {
    let script = base_dir.join(&params.script);
    let scanned = scan_file(&script, Dialect::Tleap)?;
    let script_dir = script.parent().unwrap_or(base_dir);

    let mut manifest = ArtifactResolver::new(script_dir).resolve(&scanned)?;
    let mut command_line = CommandLine::new().option("-f", file_name(&script));

    let include_resolver = ArtifactResolver::new(base_dir);
    for dir in &params.include_dirs {
        let (bundle, members) = include_resolver.resolve_directory(dir)?;
        for member in members {
            manifest.insert(member)?;
        }
        command_line = command_line.option("-I", bundle);
    }

    info!(
        "Prepared tleap job with {} staged input(s) and {} expected output(s).",
        manifest.input_count() + 1,
        manifest.outfiles().len()
    );

    let mut primary_inputs = IndexMap::new();
    primary_inputs.insert(SCRIPT_LINK.to_string(), script);

    Ok(JobPlan {
        tool: Tool::Tleap,
        command_line,
        primary_inputs,
        manifest,
    })
}
