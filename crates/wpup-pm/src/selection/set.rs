//! The ordered, duplicate-free selection.

use std::ffi::OsStr;
use std::path::Path;

use indexmap::IndexSet;

use crate::extension::contains_ignore_case;

/// Selected package entries in discovery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    entries: IndexSet<String>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Returns false when it is already selected.
    pub fn insert(&mut self, entry: impl Into<String>) -> bool {
        self.entries.insert(entry.into())
    }

    pub fn contains(&self, entry: &str) -> bool {
        self.entries.contains(entry)
    }

    /// Whether `needle` appears anywhere in the joined selection text, ignoring case
    pub fn mentions(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| contains_ignore_case(e, needle))
    }

    pub fn first(&self) -> Option<&str> {
        self.entries.first().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Whether a selected path already ends in the file name `name`
    pub fn contains_file_name(&self, name: &OsStr) -> bool {
        self.entries
            .iter()
            .any(|e| Path::new(e).file_name() == Some(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for SelectionSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        let mut set = SelectionSet::new();
        for entry in iter {
            set.insert(entry);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_keeps_order_and_uniqueness() {
        let mut set = SelectionSet::new();
        assert!(set.insert("b.cab"));
        assert!(set.insert("a.cab"));
        assert!(!set.insert("b.cab"));

        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["b.cab", "a.cab"]);
        assert_eq!(set.first(), Some("b.cab"));
    }

    #[test]
    fn test_mentions_ignores_case() {
        let set: SelectionSet = ["x/MicrosoftPhoneFM.PlatformManifest.MainOS.cab"].into_iter().collect();
        assert!(set.mentions("microsoftphonefm.platformmanifest.mainos"));
        assert!(!set.mentions("microsoftphonefm.platformmanifest.efiesp"));
    }
}
