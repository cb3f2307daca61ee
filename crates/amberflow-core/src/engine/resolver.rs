use super::collaborator::JobCollaborator;
use super::error::{EngineError, InputKind};
use super::progress::{Progress, ProgressReporter};
use crate::core::models::declaration::{Bundle, DeclarationSet};
use crate::core::models::reference::ScannedScript;
use crate::core::utils::identifiers::format_link_label;
use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

const SEPARATOR: char = '/';

/// An input reference after classification and existence checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedInput {
    PlainFile {
        label: String,
        source: PathBuf,
    },
    TreeMember {
        bundle: String,
        relative: String,
        source: PathBuf,
    },
}

impl ResolvedInput {
    pub fn source(&self) -> &Path {
        match self {
            ResolvedInput::PlainFile { source, .. } | ResolvedInput::TreeMember { source, .. } => {
                source
            }
        }
    }

    /// Where the file appears relative to the job's working directory.
    pub fn sandbox_path(&self) -> String {
        match self {
            ResolvedInput::PlainFile { source, .. } => file_name_of(source),
            ResolvedInput::TreeMember {
                bundle, relative, ..
            } => format!("{bundle}{SEPARATOR}{relative}"),
        }
    }
}

/// Existence-checked declarations that have not been staged yet.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArtifactManifest {
    files: IndexMap<String, PathBuf>,
    dirs: IndexMap<String, IndexMap<String, PathBuf>>,
    outfiles: Vec<String>,
}

impl ArtifactManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &IndexMap<String, PathBuf> {
        &self.files
    }

    pub fn dirs(&self) -> &IndexMap<String, IndexMap<String, PathBuf>> {
        &self.dirs
    }

    pub fn outfiles(&self) -> &[String] {
        &self.outfiles
    }

    pub fn input_count(&self) -> usize {
        self.files.len() + self.dirs.values().map(IndexMap::len).sum::<usize>()
    }

    /// Adds a resolved input. Re-adding the same source is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::LabelCollision`] when a different file already holds the
    /// sanitized label, or the same member path of a bundle.
    pub fn insert(&mut self, input: ResolvedInput) -> Result<(), EngineError> {
        match input {
            ResolvedInput::PlainFile { label, source } => match self.files.get(&label) {
                Some(existing) if *existing == source => {
                    debug!("'{}' is already declared as '{}'", source.display(), label);
                    Ok(())
                }
                Some(existing) => Err(EngineError::LabelCollision {
                    label,
                    first: existing.clone(),
                    second: source,
                }),
                None => {
                    self.files.insert(label, source);
                    Ok(())
                }
            },
            ResolvedInput::TreeMember {
                bundle,
                relative,
                source,
            } => {
                let label = format!("{bundle}{SEPARATOR}{relative}");
                let members = self.dirs.entry(bundle).or_default();
                match members.get(&relative) {
                    Some(existing) if *existing == source => {
                        debug!("'{}' is already declared as '{}'", source.display(), label);
                        Ok(())
                    }
                    Some(existing) => Err(EngineError::LabelCollision {
                        label,
                        first: existing.clone(),
                        second: source,
                    }),
                    None => {
                        members.insert(relative, source);
                        Ok(())
                    }
                }
            }
        }
    }

    /// Records an output the job will produce, keeping only its final path component.
    pub fn push_outfile(&mut self, reference: &str) {
        self.outfiles.push(output_name(reference));
    }

    /// Stages every declared input through `collaborator`.
    ///
    /// Nothing is returned unless every file stages successfully.
    pub fn declare<C: JobCollaborator>(
        &self,
        collaborator: &C,
        reporter: &ProgressReporter,
    ) -> Result<DeclarationSet<C::Handle>, EngineError> {
        let mut declarations = DeclarationSet::new();

        for (label, source) in &self.files {
            declarations
                .files
                .insert(label.clone(), collaborator.stage_file(source)?);
            reporter.report(Progress::FileStaged);
        }

        for (name, members) in &self.dirs {
            let mut bundle = Bundle::new();
            for (relative, source) in members {
                bundle.insert(relative.clone(), collaborator.stage_file(source)?);
                reporter.report(Progress::FileStaged);
            }
            declarations.dirs.insert(name.clone(), bundle);
        }

        declarations.outfiles = self.outfiles.clone();
        Ok(declarations)
    }
}

/// Classifies input references against a base directory and checks they exist.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    base_dir: PathBuf,
}

impl ArtifactResolver {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Builds the manifest for a scanned script.
    ///
    /// Every input is checked before anything is returned, so a missing file yields an
    /// error and no declarations at all.
    pub fn resolve(&self, script: &ScannedScript) -> Result<ArtifactManifest, EngineError> {
        let mut manifest = ArtifactManifest::new();

        for reference in &script.input_files {
            let resolved = self.resolve_reference(&reference.path)?;
            manifest.insert(resolved)?;
        }
        for reference in &script.output_files {
            manifest.push_outfile(&reference.path);
        }

        info!(
            "Resolved {} staged file(s) in {} bundle(s) and {} expected output(s).",
            manifest.files.len(),
            manifest.dirs.len(),
            manifest.outfiles.len()
        );
        Ok(manifest)
    }

    /// Classifies one input reference and checks that it exists.
    ///
    /// # Errors
    ///
    /// Relative references containing `..` yield [`EngineError::EscapingReference`]; the
    /// sandbox only holds paths below its root.
    pub fn resolve_reference(&self, reference: &str) -> Result<ResolvedInput, EngineError> {
        let normalized = normalize_reference(reference);
        let candidate = Path::new(normalized);

        if !candidate.is_absolute()
            && candidate
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(EngineError::EscapingReference {
                reference: reference.to_string(),
            });
        }

        if candidate.is_absolute() || !normalized.contains(SEPARATOR) {
            let source = self.base_dir.join(candidate);
            if !source.is_file() {
                return Err(EngineError::MissingInputFile {
                    reference: reference.to_string(),
                    kind: InputKind::File,
                });
            }
            let label = format_link_label(&file_name_of(&source));
            debug!("Input '{}' resolved as plain file '{}'", reference, label);
            return Ok(ResolvedInput::PlainFile { label, source });
        }

        let (bundle, relative) = normalized
            .split_once(SEPARATOR)
            .unwrap_or((normalized, ""));
        let source = self.base_dir.join(candidate);
        if relative.is_empty() || !source.is_file() {
            return Err(EngineError::MissingInputFile {
                reference: reference.to_string(),
                kind: InputKind::Subdirectory,
            });
        }
        debug!(
            "Input '{}' resolved as member '{}' of bundle '{}'",
            reference, relative, bundle
        );
        Ok(ResolvedInput::TreeMember {
            bundle: bundle.to_string(),
            relative: relative.to_string(),
            source,
        })
    }

    /// Resolves every regular file below `dir` as members of one bundle named after the
    /// directory's final component. Returns the bundle name with its members.
    pub fn resolve_directory(
        &self,
        dir: &Path,
    ) -> Result<(String, Vec<ResolvedInput>), EngineError> {
        let root = self.base_dir.join(dir);
        let missing = || EngineError::MissingInputFile {
            reference: dir.display().to_string(),
            kind: InputKind::Directory,
        };
        if !root.is_dir() {
            return Err(missing());
        }
        let bundle = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(missing)?;

        let mut members = Vec::new();
        for entry in WalkDir::new(&root).sort_by_file_name() {
            let entry = entry.map_err(|e| EngineError::Sandbox {
                path: root.clone(),
                source: e.into(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&root) else {
                continue;
            };
            let relative = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            members.push(ResolvedInput::TreeMember {
                bundle: bundle.clone(),
                relative,
                source: entry.path().to_path_buf(),
            });
        }

        if members.is_empty() {
            warn!("Directory '{}' contains no files to stage.", dir.display());
        }
        Ok((bundle, members))
    }
}

fn normalize_reference(reference: &str) -> &str {
    let mut trimmed = reference;
    while let Some(rest) = trimmed.strip_prefix("./") {
        trimmed = rest.trim_start_matches(SEPARATOR);
    }
    trimmed
}

/// Final path component of an output reference.
pub fn output_name(reference: &str) -> String {
    reference
        .rsplit(SEPARATOR)
        .next()
        .unwrap_or(reference)
        .to_string()
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
