//! The file I/O collaborator contract (spec §6): read input file
//! bytes, write merged bytes, and recurse directories by path so the
//! strategy dispatcher can pair files across revisions.

use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::errors::{MergeError, Result};

/// A single file or directory entry on one side of a merge scenario.
/// Mirrors the minimal surface spec §6 requires of a file artifact:
/// `is_file`, `is_directory`, `list_children`, `read`, `write`.
#[derive(Debug, Clone)]
pub struct FileArtifact {
    path: PathBuf,
}

impl FileArtifact {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_file(&self) -> bool {
        self.path.is_file()
    }

    pub fn is_directory(&self) -> bool {
        self.path.is_dir()
    }

    /// Lists immediate children by name, sorted for deterministic
    /// pairing across revisions (spec §8 testable property 7:
    /// determinism given fixed inputs).
    pub fn list_children(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.path).map_err(|source| self.inaccessible(source))?;
        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort_unstable();
        Ok(names)
    }

    pub fn child(&self, name: &str) -> FileArtifact {
        FileArtifact::new(self.path.join(name))
    }

    pub fn read(&self) -> Result<String> {
        if !self.path.exists() {
            return Err(MergeError::InputMissing(self.path.clone()));
        }
        fs::read_to_string(&self.path).map_err(|source| self.inaccessible(source))
    }

    pub fn write(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| self.inaccessible(source))?;
        }
        fs::write(&self.path, contents).map_err(|source| self.inaccessible(source))
    }

    fn inaccessible(&self, source: std::io::Error) -> MergeError {
        MergeError::InputInaccessible { path: self.path.clone(), source }
    }
}

/// Pairs children of a BASE/LEFT/RIGHT directory triple by name, per
/// spec §4.8: "the dispatcher recurses pairing files by path; files
/// present in some revisions only are handled by add/delete rules
/// mirroring §4.6 at the filesystem level." A name present in fewer
/// than all three directories yields `None` for the missing sides.
pub fn pair_directory_children(
    base: &FileArtifact,
    left: &FileArtifact,
    right: &FileArtifact,
) -> Result<Vec<(String, Option<FileArtifact>, Option<FileArtifact>, Option<FileArtifact>)>> {
    let mut names: Vec<String> = Vec::new();
    for dir in [base, left, right] {
        if dir.is_directory() {
            for name in dir.list_children()? {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
    }
    names.sort_unstable();

    Ok(names
        .into_iter()
        .map(|name| {
            let b = base.child(&name);
            let l = left.child(&name);
            let r = right.child(&name);
            (
                name,
                b.path().exists().then_some(b),
                l.path().exists().then_some(l),
                r.path().exists().then_some(r),
            )
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_reported_distinctly_from_inaccessible() {
        let artifact = FileArtifact::new("/nonexistent/path/that/should/not/exist.txt");
        assert!(matches!(artifact.read(), Err(MergeError::InputMissing(_))));
    }
}
