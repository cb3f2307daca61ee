//! # Workflows Module
//!
//! Per-tool entry points that turn user parameters into a runnable job.
//!
//! ## Overview
//!
//! Each workflow reads the tool's own input (its script or structure), scans it
//! for file references where the tool has a script language, resolves every
//! reference against a base directory and builds the tool's command line. The
//! result is a [`JobPlan`]: a fully checked description of the job that has not
//! touched any collaborator yet.
//!
//! [`run`] then drives a plan through any [`JobCollaborator`] in three phases
//! (staging, submission, retrieval), reporting progress along the way.
//!
//! ## Architecture
//!
//! - **tleap** ([`tleap`]) - Script-driven topology building with `-I` include bundles.
//! - **cpptraj** ([`cpptraj`]) - Trajectory analysis with input files on both the
//!   command line and inside the script.
//! - **pdb4amber** ([`pdb4amber`]) - Structure clean-up driven purely by options.

use crate::engine::collaborator::{CommandLine, JobCollaborator, JobRequest, Retrieved, Tool};
use crate::engine::error::EngineError;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::resolver::ArtifactManifest;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

pub mod cpptraj;
pub mod pdb4amber;
pub mod tleap;

/// A resolved job that is ready to be staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobPlan {
    pub tool: Tool,
    pub command_line: CommandLine,
    /// The tool's own inputs, keyed by link label.
    pub primary_inputs: IndexMap<String, PathBuf>,
    pub manifest: ArtifactManifest,
}

/// How a plan should be launched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSettings {
    pub executable: PathBuf,
    pub description: String,
}

impl JobSettings {
    pub fn new(tool: Tool, executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            description: tool.default_description(),
        }
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        if let Some(description) = description {
            self.description = description;
        }
        self
    }
}

impl JobPlan {
    pub fn total_inputs(&self) -> usize {
        self.primary_inputs.len() + self.manifest.input_count()
    }

    /// Outputs the job must produce, including the captured standard output.
    pub fn expected_outputs(&self) -> Vec<String> {
        let stdout = self.tool.stdout_filename();
        let mut expected: Vec<String> = self.manifest.outfiles().to_vec();
        if !expected.contains(&stdout) {
            expected.push(stdout);
        }
        expected
    }

    /// Stages every input through `collaborator` and assembles the request.
    ///
    /// The request is only returned once every file has staged.
    pub fn stage<C: JobCollaborator>(
        &self,
        collaborator: &C,
        settings: &JobSettings,
        reporter: &ProgressReporter,
    ) -> Result<JobRequest<C::Handle>, EngineError> {
        reporter.report(Progress::StagingStart {
            total_files: self.total_inputs() as u64,
        });

        let mut primary_inputs = IndexMap::with_capacity(self.primary_inputs.len());
        for (label, path) in &self.primary_inputs {
            primary_inputs.insert(label.clone(), collaborator.stage_file(path)?);
            reporter.report(Progress::FileStaged);
        }
        let declarations = self.manifest.declare(collaborator, reporter)?;

        reporter.report(Progress::StagingFinish);

        Ok(JobRequest {
            tool: self.tool,
            description: settings.description.clone(),
            executable: settings.executable.clone(),
            command_line: self.command_line.clone(),
            primary_inputs,
            declarations,
            stdout_filename: self.tool.stdout_filename(),
        })
    }
}

/// Stages, submits and retrieves `plan` through `collaborator`.
#[instrument(skip_all, name = "job_workflow", fields(tool = %plan.tool))]
pub fn run<C: JobCollaborator>(
    plan: &JobPlan,
    collaborator: &C,
    settings: &JobSettings,
    reporter: &ProgressReporter,
) -> Result<Retrieved, EngineError> {
    // === Phase 1: Staging ===
    reporter.report(Progress::PhaseStart {
        name: "Staging inputs",
    });
    let request = plan.stage(collaborator, settings, reporter)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 2: Execution ===
    reporter.report(Progress::PhaseStart { name: "Running" });
    info!("Submitting {} {}", plan.tool, plan.command_line);
    let job = collaborator.submit(request)?;
    reporter.report(Progress::PhaseFinish);

    // === Phase 3: Retrieval ===
    reporter.report(Progress::PhaseStart {
        name: "Retrieving outputs",
    });
    let retrieved = collaborator.retrieve(&job)?;
    reporter.report(Progress::PhaseFinish);

    info!(
        "{} finished with {} retrieved file(s).",
        plan.tool,
        retrieved.files.len()
    );
    Ok(retrieved)
}

/// Final component of `path` as an owned string, for command-line use.
pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::collaborator::RetrievedFile;
    use crate::engine::resolver::ResolvedInput;
    use std::cell::RefCell;
    use std::sync::{Arc, Mutex};

    /// Records every call instead of running anything.
    #[derive(Default)]
    struct RecordingCollaborator {
        staged: RefCell<Vec<PathBuf>>,
        submitted: RefCell<Vec<JobRequest<String>>>,
        fail_on: Option<PathBuf>,
    }

    impl JobCollaborator for RecordingCollaborator {
        type Handle = String;
        type JobId = usize;

        fn stage_file(&self, path: &Path) -> Result<String, EngineError> {
            if self.fail_on.as_deref() == Some(path) {
                return Err(EngineError::Stage {
                    path: path.to_path_buf(),
                    source: std::io::Error::other("unreadable"),
                });
            }
            self.staged.borrow_mut().push(path.to_path_buf());
            Ok(format!("handle:{}", path.display()))
        }

        fn submit(&self, request: JobRequest<String>) -> Result<usize, EngineError> {
            let mut submitted = self.submitted.borrow_mut();
            submitted.push(request);
            Ok(submitted.len() - 1)
        }

        fn retrieve(&self, job: &usize) -> Result<Retrieved, EngineError> {
            let submitted = self.submitted.borrow();
            let files = submitted[*job]
                .expected_outputs()
                .into_iter()
                .map(|name| RetrievedFile {
                    path: PathBuf::from("/out").join(&name),
                    name,
                })
                .collect();
            Ok(Retrieved { files })
        }
    }

    fn sample_plan() -> JobPlan {
        let mut manifest = ArtifactManifest::new();
        manifest
            .insert(ResolvedInput::PlainFile {
                label: "complex_pdb".into(),
                source: PathBuf::from("/data/complex.pdb"),
            })
            .unwrap();
        manifest
            .insert(ResolvedInput::TreeMember {
                bundle: "leap".into(),
                relative: "frcmod.ions".into(),
                source: PathBuf::from("/data/leap/frcmod.ions"),
            })
            .unwrap();
        manifest.push_outfile("out/complex.prmtop");

        let mut primary_inputs = IndexMap::new();
        primary_inputs.insert("tleapscript".to_string(), PathBuf::from("/data/tleap.in"));

        JobPlan {
            tool: Tool::Tleap,
            command_line: CommandLine::new().option("-f", "tleap.in"),
            primary_inputs,
            manifest,
        }
    }

    #[test]
    fn settings_fall_back_to_the_default_description() {
        let settings = JobSettings::new(Tool::Cpptraj, "/usr/bin/cpptraj").with_description(None);
        assert_eq!(
            settings.description,
            "record cpptraj data provenance via amberflow"
        );
        let custom = settings.with_description(Some("rmsd".into()));
        assert_eq!(custom.description, "rmsd");
    }

    #[test]
    fn plan_lists_stdout_among_expected_outputs() {
        assert_eq!(
            sample_plan().expected_outputs(),
            vec!["complex.prmtop", "tleap.out"]
        );
    }

    #[test]
    fn run_stages_everything_before_submitting() {
        let plan = sample_plan();
        let collaborator = RecordingCollaborator::default();
        let settings = JobSettings::new(Tool::Tleap, "/opt/amber/bin/tleap");
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        let reporter = ProgressReporter::with_callback(Box::new(move |p| {
            sink.lock().unwrap().push(p);
        }));

        let retrieved = run(&plan, &collaborator, &settings, &reporter).unwrap();

        assert_eq!(
            *collaborator.staged.borrow(),
            vec![
                PathBuf::from("/data/tleap.in"),
                PathBuf::from("/data/complex.pdb"),
                PathBuf::from("/data/leap/frcmod.ions"),
            ]
        );
        let submitted = collaborator.submitted.borrow();
        assert_eq!(submitted.len(), 1);
        let request = &submitted[0];
        assert_eq!(request.primary_inputs["tleapscript"], "handle:/data/tleap.in");
        assert_eq!(
            request.declarations.files["complex_pdb"],
            "handle:/data/complex.pdb"
        );
        assert_eq!(
            request.declarations.dirs["leap"].get("frcmod.ions"),
            Some(&"handle:/data/leap/frcmod.ions".to_string())
        );
        assert_eq!(
            retrieved.names().collect::<Vec<_>>(),
            vec!["complex.prmtop", "tleap.out"]
        );

        let events = events.lock().unwrap();
        assert_eq!(events[0], Progress::PhaseStart { name: "Staging inputs" });
        assert_eq!(events[1], Progress::StagingStart { total_files: 3 });
        assert_eq!(
            events.iter().filter(|e| **e == Progress::FileStaged).count(),
            3
        );
        assert_eq!(events.last(), Some(&Progress::PhaseFinish));
    }

    #[test]
    fn staging_failure_prevents_submission() {
        let plan = sample_plan();
        let collaborator = RecordingCollaborator {
            fail_on: Some(PathBuf::from("/data/leap/frcmod.ions")),
            ..Default::default()
        };
        let settings = JobSettings::new(Tool::Tleap, "tleap");

        let result = run(&plan, &collaborator, &settings, &ProgressReporter::new());

        assert!(matches!(result, Err(EngineError::Stage { .. })));
        assert!(collaborator.submitted.borrow().is_empty());
    }
}
