use super::collaborator::{JobCollaborator, JobRequest, Retrieved, RetrievedFile, Tool};
use super::error::EngineError;
use super::provenance::{InputRecord, JobRecord};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// A file made available to a local sandbox, identified by its content digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedFile {
    pub source: PathBuf,
    pub sha256: String,
}

impl StagedFile {
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone)]
pub struct LocalJob {
    pub id: Uuid,
    pub tool: Tool,
    pub sandbox: PathBuf,
    pub exit_code: Option<i32>,
    pub success: bool,
    pub status: String,
    pub expected_outputs: Vec<String>,
}

/// Runs jobs as child processes inside fresh directories under `work_root`.
///
/// Each job directory receives copies of the declared inputs only, the tool runs
/// with that directory as its working directory, and `provenance.toml` records the
/// invocation next to its outputs.
#[derive(Debug, Clone)]
pub struct LocalSandbox {
    work_root: PathBuf,
    output_dir: Option<PathBuf>,
}

impl LocalSandbox {
    pub fn new(work_root: impl Into<PathBuf>) -> Self {
        Self {
            work_root: work_root.into(),
            output_dir: None,
        }
    }

    /// Retrieved outputs are also copied into `dir`.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    fn place(staged: &StagedFile, target: &Path) -> Result<(), EngineError> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).map_err(EngineError::sandbox(parent))?;
        }
        fs::copy(&staged.source, target).map_err(EngineError::sandbox(target))?;
        debug!(
            "Placed '{}' at '{}'",
            staged.source.display(),
            target.display()
        );
        Ok(())
    }

    fn list_files(sandbox: &Path) -> Result<Vec<String>, EngineError> {
        let mut names = Vec::new();
        for entry in fs::read_dir(sandbox).map_err(EngineError::sandbox(sandbox))? {
            let entry = entry.map_err(EngineError::sandbox(sandbox))?;
            if entry.path().is_file() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }
}

fn sha256_of(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

impl JobCollaborator for LocalSandbox {
    type Handle = StagedFile;
    type JobId = LocalJob;

    fn stage_file(&self, path: &Path) -> Result<StagedFile, EngineError> {
        let stage_err = |source| EngineError::Stage {
            path: path.to_path_buf(),
            source,
        };
        let source = path.canonicalize().map_err(stage_err)?;
        if !source.is_file() {
            return Err(stage_err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "not a regular file",
            )));
        }
        let sha256 = sha256_of(&source).map_err(stage_err)?;
        debug!("Staged '{}' (sha256 {})", source.display(), sha256);
        Ok(StagedFile { source, sha256 })
    }

    #[instrument(skip_all, fields(tool = %request.tool))]
    fn submit(&self, request: JobRequest<StagedFile>) -> Result<LocalJob, EngineError> {
        let id = Uuid::new_v4();
        let sandbox = self.work_root.join(format!("{}-{}", request.tool, id));
        fs::create_dir_all(&sandbox).map_err(EngineError::sandbox(&sandbox))?;
        info!("Created sandbox {:?}", &sandbox);

        let mut inputs = Vec::new();
        for (link, staged) in request
            .primary_inputs
            .iter()
            .chain(request.declarations.files.iter())
        {
            let name = staged.file_name();
            Self::place(staged, &sandbox.join(&name))?;
            inputs.push(InputRecord {
                link: link.clone(),
                path: name,
                source: staged.source.clone(),
                sha256: staged.sha256.clone(),
            });
        }
        for (bundle_name, bundle) in &request.declarations.dirs {
            for (relative, staged) in bundle.iter() {
                Self::place(staged, &sandbox.join(bundle_name).join(relative))?;
                inputs.push(InputRecord {
                    link: bundle_name.clone(),
                    path: format!("{bundle_name}/{relative}"),
                    source: staged.source.clone(),
                    sha256: staged.sha256.clone(),
                });
            }
        }

        let stdout_path = sandbox.join(&request.stdout_filename);
        let stderr_path = sandbox.join(request.tool.stderr_filename());
        let stdout = File::create(&stdout_path).map_err(EngineError::sandbox(&stdout_path))?;
        let stderr = File::create(&stderr_path).map_err(EngineError::sandbox(&stderr_path))?;

        info!(
            "Running {} {}",
            request.executable.display(),
            request.command_line
        );
        let status = Command::new(&request.executable)
            .args(request.command_line.args())
            .current_dir(&sandbox)
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr)
            .status()
            .map_err(|source| EngineError::Launch {
                executable: request.executable.clone(),
                source,
            })?;

        if status.success() {
            info!("{} finished with {}", request.tool, status);
        } else {
            warn!(
                "{} finished with {}; see {:?}",
                request.tool, status, &stderr_path
            );
        }

        let expected_outputs = request.expected_outputs();
        let record = JobRecord {
            id: id.to_string(),
            tool: request.tool,
            description: request.description.clone(),
            executable: request.executable.clone(),
            arguments: request.command_line.args().to_vec(),
            expected_outputs: expected_outputs.clone(),
            exit_code: status.code(),
            retrieved: Vec::new(),
            inputs,
        };
        record.write_to(&sandbox)?;

        Ok(LocalJob {
            id,
            tool: request.tool,
            sandbox,
            exit_code: status.code(),
            success: status.success(),
            status: status.to_string(),
            expected_outputs,
        })
    }

    fn retrieve(&self, job: &LocalJob) -> Result<Retrieved, EngineError> {
        if !job.success {
            return Err(EngineError::ToolFailed {
                tool: job.tool.to_string(),
                status: job.status.clone(),
            });
        }

        let found = Self::list_files(&job.sandbox)?;
        let missing: Vec<String> = job
            .expected_outputs
            .iter()
            .filter(|name| !found.contains(name))
            .cloned()
            .collect();
        if !missing.is_empty() {
            error!(
                "Found files '{:?}', expected to find '{:?}'",
                found, job.expected_outputs
            );
            return Err(EngineError::MissingExpectedOutput { missing, found });
        }

        let mut retrieved = Retrieved::default();
        for name in &job.expected_outputs {
            let produced = job.sandbox.join(name);
            let path = match &self.output_dir {
                Some(dir) => {
                    fs::create_dir_all(dir).map_err(EngineError::sandbox(dir))?;
                    let target = dir.join(name);
                    fs::copy(&produced, &target).map_err(EngineError::sandbox(&target))?;
                    target
                }
                None => produced,
            };
            info!("Retrieved '{}'", name);
            retrieved.files.push(RetrievedFile {
                name: name.clone(),
                path,
            });
        }

        let mut record = JobRecord::read_from(&job.sandbox)?;
        record.retrieved = retrieved.names().map(str::to_string).collect();
        record.write_to(&job.sandbox)?;

        Ok(retrieved)
    }
}
