//! Download targets: selected manifest entries bound to a local destination.

use std::path::{Component, Path, PathBuf};

use url::Url;

use crate::selection::SelectionSet;
use crate::{Result, UpdaterError};

/// Packages for a device land in `<root>/<serial>/Packages`
pub fn package_dir(root: &Path, serial: &str) -> PathBuf {
    root.join(serial).join("Packages")
}

/// One package to download
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTarget {
    pub url: Url,
    pub file_name: String,
    pub destination: PathBuf,
}

impl DownloadTarget {
    /// Bind a manifest entry to `dest_dir/<last path segment>`
    pub fn resolve(entry: &str, dest_dir: &Path) -> Result<Self> {
        let entry = entry.trim();
        let url = Url::parse(entry).map_err(|e| UpdaterError::InvalidUrl {
            url: entry.to_string(),
            reason: e.to_string(),
        })?;

        let segment = url
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| UpdaterError::InvalidUrl {
                url: entry.to_string(),
                reason: "no file name in path".to_string(),
            })?;
        let file_name = urlencoding::decode(segment)
            .map(|name| name.into_owned())
            .unwrap_or_else(|_| segment.to_string());
        if !is_plain_file_name(&file_name) {
            return Err(UpdaterError::InvalidUrl {
                url: entry.to_string(),
                reason: format!("file name {:?} leaves the package directory", file_name),
            });
        }

        Ok(Self {
            destination: dest_dir.join(&file_name),
            file_name,
            url,
        })
    }

    /// Resolve every non-blank selected entry, keeping selection order
    pub fn from_selection(selection: &SelectionSet, dest_dir: &Path) -> Result<Vec<Self>> {
        selection
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| Self::resolve(entry, dest_dir))
            .collect()
    }
}

/// A single normal path component with no separators of either platform
fn is_plain_file_name(name: &str) -> bool {
    if name.contains(['/', '\\']) || name.contains("..") {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
