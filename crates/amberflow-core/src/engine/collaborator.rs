use super::error::EngineError;
use crate::core::models::declaration::DeclarationSet;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Tleap,
    Cpptraj,
    Pdb4amber,
}

impl Tool {
    pub fn executable_name(self) -> &'static str {
        match self {
            Tool::Tleap => "tleap",
            Tool::Cpptraj => "cpptraj",
            Tool::Pdb4amber => "pdb4amber",
        }
    }

    /// File the tool's standard output is captured to inside the sandbox.
    pub fn stdout_filename(self) -> String {
        format!("{}.out", self.executable_name())
    }

    pub fn stderr_filename(self) -> String {
        format!("{}.err", self.executable_name())
    }

    pub fn default_description(self) -> String {
        format!(
            "record {} data provenance via amberflow",
            self.executable_name()
        )
    }
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable_name())
    }
}

/// Ordered argument list for a tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<String>,
}

impl CommandLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<String>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn option(mut self, name: &str, value: impl ToString) -> Self {
        self.args.push(name.to_string());
        self.args.push(value.to_string());
        self
    }

    pub fn option_opt<T: ToString>(self, name: &str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.option(name, value),
            None => self,
        }
    }

    /// Emits `name value` once per value.
    pub fn repeated<T: ToString>(self, name: &str, values: impl IntoIterator<Item = T>) -> Self {
        values
            .into_iter()
            .fold(self, |cmd, value| cmd.option(name, value))
    }

    pub fn switch(mut self, name: &str, enabled: bool) -> Self {
        if enabled {
            self.args.push(name.to_string());
        }
        self
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn into_args(self) -> Vec<String> {
        self.args
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}

/// Everything a collaborator needs to run one tool invocation.
#[derive(Debug, Clone)]
pub struct JobRequest<H> {
    pub tool: Tool,
    pub description: String,
    pub executable: PathBuf,
    pub command_line: CommandLine,
    /// The tool's own inputs (its script or structure), keyed by link label.
    pub primary_inputs: IndexMap<String, H>,
    pub declarations: DeclarationSet<H>,
    pub stdout_filename: String,
}

impl<H> JobRequest<H> {
    /// Declared outfiles followed by the stdout capture, without repeats.
    pub fn expected_outputs(&self) -> Vec<String> {
        let mut expected: Vec<String> = Vec::with_capacity(self.declarations.outfiles.len() + 1);
        for name in self
            .declarations
            .outfiles
            .iter()
            .chain(std::iter::once(&self.stdout_filename))
        {
            if !expected.contains(name) {
                expected.push(name.clone());
            }
        }
        expected
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Retrieved {
    pub files: Vec<RetrievedFile>,
}

impl Retrieved {
    pub fn get(&self, name: &str) -> Option<&Path> {
        self.files
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.path.as_path())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.name.as_str())
    }
}

/// The seam between job assembly and whatever actually runs jobs.
///
/// Implementors decide what a staged file is (a copy, a database node, an upload
/// receipt) and how a job is identified. Assembly only relies on these three
/// capabilities and never calls `submit` with a partially staged request.
pub trait JobCollaborator {
    /// Opaque handle for a staged file.
    type Handle: Clone + fmt::Debug;

    /// Identifies a submitted job for later retrieval.
    type JobId;

    /// Makes the file at `path` available for staging into a job.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Stage`] if the file cannot be read.
    fn stage_file(&self, path: &Path) -> Result<Self::Handle, EngineError>;

    /// Runs (or enqueues) the job described by `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the job environment cannot be prepared or the executable
    /// cannot be started.
    fn submit(&self, request: JobRequest<Self::Handle>) -> Result<Self::JobId, EngineError>;

    /// Collects the expected outputs of a finished job.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MissingExpectedOutput`] when a declared output was not
    /// produced.
    fn retrieve(&self, job: &Self::JobId) -> Result<Retrieved, EngineError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_builds_in_order() {
        let cmd = CommandLine::new()
            .option("-i", "cpptraj.inp")
            .repeated("-p", ["a.prmtop", "b.prmtop"])
            .option_opt("-o", None::<&str>)
            .option_opt("-debug", Some(2))
            .switch("-tl", true)
            .switch("--interactive", false);

        assert_eq!(
            cmd.args(),
            [
                "-i",
                "cpptraj.inp",
                "-p",
                "a.prmtop",
                "-p",
                "b.prmtop",
                "-debug",
                "2",
                "-tl"
            ]
        );
        assert_eq!(
            cmd.to_string(),
            "-i cpptraj.inp -p a.prmtop -p b.prmtop -debug 2 -tl"
        );
    }

    #[test]
    fn expected_outputs_append_stdout_once() {
        let mut declarations: DeclarationSet<()> = DeclarationSet::new();
        declarations.outfiles = vec!["a.prmtop".into(), "a.inpcrd".into(), "tleap.out".into()];
        let request = JobRequest {
            tool: Tool::Tleap,
            description: String::new(),
            executable: PathBuf::from("tleap"),
            command_line: CommandLine::new(),
            primary_inputs: IndexMap::new(),
            declarations,
            stdout_filename: Tool::Tleap.stdout_filename(),
        };

        assert_eq!(
            request.expected_outputs(),
            vec!["a.prmtop", "a.inpcrd", "tleap.out"]
        );
    }

    #[test]
    fn tool_names_and_capture_files() {
        assert_eq!(Tool::Pdb4amber.to_string(), "pdb4amber");
        assert_eq!(Tool::Cpptraj.stdout_filename(), "cpptraj.out");
        assert_eq!(Tool::Tleap.stderr_filename(), "tleap.err");
    }
}
