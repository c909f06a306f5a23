//! Maps the installed inventory onto a candidate listing.

use std::path::Path;

use serde::Deserialize;

use super::candidate::{Candidate, CandidateList};
use super::set::SelectionSet;
use crate::extension::{find_ignore_case, ExtensionSet};
use crate::inventory::Inventory;

/// Packages forced into every selection when they can be found
pub const KNOWN_REQUIREMENTS: &[&str] = &[
    "ms_commsenhancementglobal.mainos",
    "ms_commsmessagingglobal.mainos",
    "microsoftphonefm.platformmanifest.efiesp",
    "microsoftphonefm.platformmanifest.mainos",
    "microsoftphonefm.platformmanifest.updateos",
    "UserInstallableFM.PlatformManifest",
];

/// Optional feature packages; their presence in a listing also flags the feature
pub const FEATURE_PACKAGES: &[&str] = &["MS_RCS_FEATURE_PACK.MainOS.cbsr", "ms_projecta.mainos"];

/// Fixed identifier lists driving a selection pass
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct SelectionRules {
    pub known_requirements: Vec<String>,
    pub feature_packages: Vec<String>,
    /// Identifiers that are never selected
    pub excluded: Vec<String>,
}

impl Default for SelectionRules {
    fn default() -> Self {
        Self {
            known_requirements: KNOWN_REQUIREMENTS.iter().map(|s| s.to_string()).collect(),
            feature_packages: FEATURE_PACKAGES.iter().map(|s| s.to_string()).collect(),
            excluded: Vec::new(),
        }
    }
}

/// How an offline folder is turned into a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterAction {
    /// Match against the installed inventory
    #[default]
    Filter,
    /// Take every file carrying an active extension
    IncludeAll,
}

/// Result of one selection pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MatchOutcome {
    pub selection: SelectionSet,
    pub feature_present: bool,
}

/// Package matcher
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    rules: SelectionRules,
}

impl Matcher {
    pub fn new(rules: SelectionRules) -> Self {
        Self { rules }
    }

    /// Select packages from build manifest lines.
    ///
    /// Manifests are family-consistent, so both families are searched and no
    /// size check applies.
    pub fn select_online(&self, inventory: &Inventory, candidates: &CandidateList) -> MatchOutcome {
        let extensions = ExtensionSet::combined();
        let mut selection = SelectionSet::new();

        self.match_inventory(inventory, candidates, &extensions, &mut selection);
        self.add_known_requirements(candidates, &extensions, &mut selection);

        let outcome = MatchOutcome {
            feature_present: self.feature_present(candidates),
            selection,
        };
        log::info!(
            "Selected {} of {} manifest entries (feature present: {})",
            outcome.selection.len(),
            candidates.len(),
            outcome.feature_present
        );
        outcome
    }

    /// Select packages from a local folder listing for one extension family
    pub fn select_offline(
        &self,
        inventory: &Inventory,
        candidates: &CandidateList,
        extensions: &ExtensionSet,
        action: FilterAction,
        push_features: bool,
    ) -> MatchOutcome {
        let mut selection = SelectionSet::new();

        match action {
            FilterAction::Filter => {
                self.match_inventory(inventory, candidates, extensions, &mut selection);
                self.add_known_requirements(candidates, extensions, &mut selection);
                if push_features {
                    self.add_feature_packages(candidates, &mut selection);
                }
            }
            FilterAction::IncludeAll => {
                self.include_all(candidates, extensions, &mut selection);
            }
        }

        let outcome = MatchOutcome {
            feature_present: self.feature_present(candidates),
            selection,
        };
        log::info!(
            "Selected {} of {} files ({:?}, family {:?})",
            outcome.selection.len(),
            candidates.len(),
            action,
            extensions.family()
        );
        outcome
    }

    /// Whether any candidate names one of the feature packages
    pub fn feature_present(&self, candidates: &CandidateList) -> bool {
        self.rules
            .feature_packages
            .iter()
            .any(|feature| candidates.find(feature).is_some())
    }

    /// Skip policy applied before a candidate is appended.
    ///
    /// Excluded identifiers only count when they occur past the first character.
    /// Local files need a known, positive size. Already selected entries are
    /// rejected last, as are local files whose name is already staged from
    /// another subfolder.
    pub fn should_skip(&self, candidate: &Candidate, selection: &SelectionSet) -> bool {
        let text = candidate.text();

        for excluded in &self.rules.excluded {
            if find_ignore_case(text, excluded).is_some_and(|pos| pos > 0) {
                log::debug!("Skipping {} (excluded by {})", text, excluded);
                return true;
            }
        }

        if !candidate.is_remote() && candidate.size().unwrap_or(0) == 0 {
            log::debug!("Skipping {} (empty or unreadable file)", text);
            return true;
        }

        // Extension and prefix matches can land on the same file twice
        if selection.contains(text) {
            return true;
        }

        // Local files are staged flat, so a name seen in another subfolder would collide
        if !candidate.is_remote() {
            if let Some(name) = Path::new(text).file_name() {
                if selection.contains_file_name(name) {
                    log::warn!("Skipping {} (a file with the same name is already selected)", text);
                    return true;
                }
            }
        }

        false
    }

    fn match_inventory(
        &self,
        inventory: &Inventory,
        candidates: &CandidateList,
        extensions: &ExtensionSet,
        selection: &mut SelectionSet,
    ) {
        for record in inventory.records() {
            for extension in extensions.iter() {
                let name = format!("{}{}", record.key, extension);
                if let Some(candidate) = candidates.find(&name) {
                    if !self.should_skip(candidate, selection) {
                        log::debug!("Matched {} -> {}", name, candidate.text());
                        selection.insert(candidate.text());
                    }
                }
            }
        }
    }

    fn add_known_requirements(
        &self,
        candidates: &CandidateList,
        extensions: &ExtensionSet,
        selection: &mut SelectionSet,
    ) {
        for requirement in &self.rules.known_requirements {
            if selection.mentions(requirement) {
                continue;
            }
            let Some(candidate) = candidates.find(requirement) else {
                continue;
            };
            if extensions.excludes(candidate.text()) {
                log::debug!("Ignoring {} (other package family)", candidate.text());
                continue;
            }
            if !self.should_skip(candidate, selection) {
                log::debug!("Added required package {}", candidate.text());
                selection.insert(candidate.text());
            }
        }
    }

    fn add_feature_packages(&self, candidates: &CandidateList, selection: &mut SelectionSet) {
        for feature in &self.rules.feature_packages {
            if let Some(candidate) = candidates.find(feature) {
                log::debug!("Added feature package {}", candidate.text());
                selection.insert(candidate.text());
            }
        }
    }

    fn include_all(
        &self,
        candidates: &CandidateList,
        extensions: &ExtensionSet,
        selection: &mut SelectionSet,
    ) {
        for extension in extensions.iter() {
            for candidate in candidates.find_all(extension) {
                if extensions.excludes(candidate.text()) {
                    continue;
                }
                if !self.should_skip(candidate, selection) {
                    selection.insert(candidate.text());
                }
            }
        }
    }
}
