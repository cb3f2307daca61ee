use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Input,
    Output,
}

impl fmt::Display for ReferenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceKind::Input => write!(f, "input"),
            ReferenceKind::Output => write!(f, "output"),
        }
    }
}

/// A path named by a script directive or a command-line option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileReference {
    pub path: String,
    pub kind: ReferenceKind,
    /// Script line the reference was read from; `None` for command-line references.
    pub line: Option<usize>,
}

impl FileReference {
    pub fn input(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ReferenceKind::Input,
            line: None,
        }
    }

    pub fn output(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: ReferenceKind::Output,
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// The ordered references found in one script. Duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedScript {
    pub input_files: Vec<FileReference>,
    pub output_files: Vec<FileReference>,
}

impl ScannedScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, reference: FileReference) {
        match reference.kind {
            ReferenceKind::Input => self.input_files.push(reference),
            ReferenceKind::Output => self.output_files.push(reference),
        }
    }

    pub fn input_paths(&self) -> impl Iterator<Item = &str> {
        self.input_files.iter().map(|r| r.path.as_str())
    }

    pub fn output_paths(&self) -> impl Iterator<Item = &str> {
        self.output_files.iter().map(|r| r.path.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.input_files.is_empty() && self.output_files.is_empty()
    }
}
