//! Package extension families.
//!
//! Update packages come in two container formats: CBS cabinets (Windows 10 Mobile)
//! and SPKG packages (Windows Phone 8). Each format has a finalized extension and an
//! in-progress variant with a trailing underscore. A selection pass works on exactly
//! one family.

use std::fmt;

const CBS_EXTENSIONS: &[&str] = &[".cab", ".cbs_"];
const SPKG_EXTENSIONS: &[&str] = &[".spkg", ".spkg_"];
const ALL_EXTENSIONS: &[&str] = &[".cab", ".cbs_", ".spkg", ".spkg_"];

/// Package container family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    /// `.cab` / `.cbs_`
    Cbs,
    /// `.spkg` / `.spkg_`
    Spkg,
}

impl Family {
    /// Extension variants belonging to this family, finalized first
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Family::Cbs => CBS_EXTENSIONS,
            Family::Spkg => SPKG_EXTENSIONS,
        }
    }

    pub fn other(self) -> Family {
        match self {
            Family::Cbs => Family::Spkg,
            Family::Spkg => Family::Cbs,
        }
    }

    /// Whether the given name carries one of this family's extension variants
    pub fn matches(self, name: &str) -> bool {
        self.extensions().iter().any(|ext| contains_ignore_case(name, ext))
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Family::Cbs => "cbs",
            Family::Spkg => "spkg",
        }
    }
}

impl fmt::Display for Family {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered extension variants searched during one selection pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    family: Option<Family>,
    extensions: &'static [&'static str],
}

impl ExtensionSet {
    pub fn for_family(family: Family) -> Self {
        Self {
            family: Some(family),
            extensions: family.extensions(),
        }
    }

    /// Both families, CBS first. Used for build manifests, which only list
    /// packages of the right family already.
    pub fn combined() -> Self {
        Self {
            family: None,
            extensions: ALL_EXTENSIONS,
        }
    }

    pub fn family(&self) -> Option<Family> {
        self.family
    }

    pub fn iter(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.extensions.iter().copied()
    }

    /// True when the name belongs to the family that is not active.
    ///
    /// The combined set never excludes anything.
    pub fn excludes(&self, name: &str) -> bool {
        match self.family {
            Some(family) => family.other().matches(name),
            None => false,
        }
    }
}

/// Chooses the active extension set from the "CBS only" flag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtensionPolicy {
    cbs_only: bool,
}

impl ExtensionPolicy {
    pub fn new(cbs_only: bool) -> Self {
        Self { cbs_only }
    }

    pub fn for_family(family: Family) -> Self {
        Self::new(family == Family::Cbs)
    }

    pub fn family(&self) -> Family {
        if self.cbs_only {
            Family::Cbs
        } else {
            Family::Spkg
        }
    }

    pub fn active_extensions(&self) -> ExtensionSet {
        ExtensionSet::for_family(self.family())
    }
}

/// ASCII case-insensitive substring search, returning the byte offset of the first match
pub fn find_ignore_case(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > haystack.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window.eq_ignore_ascii_case(needle))
}

pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    find_ignore_case(haystack, needle).is_some()
}
