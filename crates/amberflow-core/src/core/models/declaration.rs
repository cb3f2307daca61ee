use indexmap::IndexMap;

/// Staged files that live under one top-level directory, keyed by their path
/// relative to that directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bundle<H> {
    entries: IndexMap<String, H>,
}

impl<H> Default for Bundle<H> {
    fn default() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }
}

impl<H> Bundle<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, relative: impl Into<String>, handle: H) -> Option<H> {
        self.entries.insert(relative.into(), handle)
    }

    pub fn get(&self, relative: &str) -> Option<&H> {
        self.entries.get(relative)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &H)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The input/output manifest handed to a job collaborator before submission.
///
/// `H` is the collaborator's opaque staged-file handle. Every map preserves the order
/// in which references were first seen so repeated runs declare identical manifests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclarationSet<H> {
    /// Standalone files keyed by their sanitized link label.
    pub files: IndexMap<String, H>,
    /// Directory bundles keyed by top-level directory name. Empty when the script
    /// references no files below a directory.
    pub dirs: IndexMap<String, Bundle<H>>,
    /// Bare file names the job is expected to produce.
    pub outfiles: Vec<String>,
}

impl<H> Default for DeclarationSet<H> {
    fn default() -> Self {
        Self {
            files: IndexMap::new(),
            dirs: IndexMap::new(),
            outfiles: Vec::new(),
        }
    }
}

impl<H> DeclarationSet<H> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_dirs(&self) -> bool {
        !self.dirs.is_empty()
    }

    /// Number of staged handles across `files` and all bundles.
    pub fn staged_count(&self) -> usize {
        self.files.len() + self.dirs.values().map(Bundle::len).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundle_preserves_insertion_order() {
        let mut bundle = Bundle::new();
        bundle.insert("leaprc", 1);
        bundle.insert("frcmod", 2);
        assert_eq!(bundle.keys().collect::<Vec<_>>(), vec!["leaprc", "frcmod"]);
        assert_eq!(bundle.get("frcmod"), Some(&2));
        assert_eq!(bundle.len(), 2);
    }

    #[test]
    fn staged_count_includes_bundle_members() {
        let mut declarations: DeclarationSet<u8> = DeclarationSet::new();
        assert!(!declarations.has_dirs());
        declarations.files.insert("complex_pdb".into(), 0);
        let mut ff = Bundle::new();
        ff.insert("leaprc", 1);
        ff.insert("frcmod", 2);
        declarations.dirs.insert("ff".into(), ff);

        assert!(declarations.has_dirs());
        assert_eq!(declarations.staged_count(), 3);
    }
}
