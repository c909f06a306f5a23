//! Candidate packages: files in a local folder or lines of a build manifest.

use std::path::Path;

use walkdir::WalkDir;

use crate::extension::contains_ignore_case;
use crate::{Result, UpdaterError};

/// Where a candidate was discovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Origin {
    /// A file on disk; its size is known at listing time
    Local,
    /// A manifest line pointing at a remote package
    Remote,
}

/// One discoverable package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    text: String,
    origin: Origin,
    size: Option<u64>,
}

impl Candidate {
    pub fn local(path: impl Into<String>, size: Option<u64>) -> Self {
        Self {
            text: path.into(),
            origin: Origin::Local,
            size,
        }
    }

    pub fn remote(line: impl Into<String>) -> Self {
        Self {
            text: line.into(),
            origin: Origin::Remote,
            size: None,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_remote(&self) -> bool {
        self.origin == Origin::Remote
    }

    pub fn size(&self) -> Option<u64> {
        self.size
    }

    pub fn contains(&self, needle: &str) -> bool {
        contains_ignore_case(&self.text, needle)
    }
}

/// Ordered candidate listing. Iteration order decides ties between matches.
#[derive(Debug, Clone, Default)]
pub struct CandidateList {
    entries: Vec<Candidate>,
}

impl CandidateList {
    pub fn new(entries: Vec<Candidate>) -> Self {
        Self { entries }
    }

    /// Parse manifest text, one package URL per line. Blank lines are dropped.
    pub fn from_manifest(content: &str) -> Self {
        let entries = content
            .split('\n')
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(Candidate::remote)
            .collect();
        Self { entries }
    }

    /// List every file below `folder`, sorted by path
    pub fn from_folder(folder: &Path) -> Result<Self> {
        if !folder.is_dir() {
            return Err(UpdaterError::FolderNotFound {
                path: folder.to_path_buf(),
            });
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(folder).sort_by_file_name() {
            let entry = entry.map_err(std::io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }
            let size = entry.metadata().ok().map(|m| m.len());
            entries.push(Candidate::local(entry.path().to_string_lossy(), size));
        }

        log::debug!("Found {} files in {}", entries.len(), folder.display());
        Ok(Self { entries })
    }

    /// Build a listing from remote lines, for tests and callers holding manifest lines
    pub fn remote<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: lines.into_iter().map(Candidate::remote).collect(),
        }
    }

    /// First candidate whose text contains `needle`, ignoring case
    pub fn find(&self, needle: &str) -> Option<&Candidate> {
        self.entries.iter().find(|c| c.contains(needle))
    }

    /// Every candidate whose text contains `needle`, in listing order
    pub fn find_all<'a>(&'a self, needle: &'a str) -> impl Iterator<Item = &'a Candidate> + 'a {
        self.entries.iter().filter(move |c| c.contains(needle))
    }

    /// Whether any candidate carries an extension of the family
    pub fn has_any(&self, extensions: &[&str]) -> bool {
        extensions.iter().any(|ext| self.find(ext).is_some())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
