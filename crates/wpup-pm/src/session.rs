//! Interactive selection runs.
//!
//! A session owns everything one selection needs (rules, inventory,
//! inspectors) and asks an [`Operator`] whenever a decision is needed. A retry
//! always starts a fresh selection pass; nothing from the previous attempt is
//! kept.

use std::path::Path;

use crate::extension::{ExtensionPolicy, Family};
use crate::inventory::Inventory;
use crate::selection::{CandidateList, FilterAction, MatchOutcome, Matcher, SelectionSet};
use crate::signer::{inspect_timestamp, FileTimestampProbe, SignerInfo, SignerInspector, TimestampReport};
use crate::Result;

/// Decisions taken by the person running the update
pub trait Operator {
    /// The folder holds both CBS and SPKG packages
    fn choose_family(&mut self) -> Result<Family>;

    fn choose_action(&mut self) -> Result<FilterAction>;

    /// Feature packages were found; whether to push them too
    fn push_features(&mut self) -> Result<bool>;

    /// Nothing matched; true to run the selection again, false to give up
    fn retry_empty(&mut self) -> Result<bool>;

    /// Review the selection; true to push it, false to run the selection again
    fn confirm(&mut self, summary: &SelectionSummary) -> Result<bool>;
}

/// What the operator sees before confirming a selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionSummary {
    pub count: usize,
    pub family: Option<Family>,
    pub feature_present: bool,
    pub signer: Option<SignerInfo>,
    /// `None` when no local file was inspected
    pub timestamp: Option<TimestampReport>,
}

impl SelectionSummary {
    /// Whether the operator should set the device clock before pushing
    pub fn needs_clock_warning(&self) -> bool {
        let test_signed = self.signer.as_ref().is_some_and(SignerInfo::is_test_signed);
        let dated = self.timestamp.as_ref().is_some_and(|t| t.modified.is_some());
        test_signed && dated
    }
}

/// Selection from a local folder of packages
pub struct OfflineSession<'a> {
    matcher: &'a Matcher,
    inventory: &'a Inventory,
    signer: &'a dyn SignerInspector,
    probe: &'a dyn FileTimestampProbe,
}

impl<'a> OfflineSession<'a> {
    pub fn new(
        matcher: &'a Matcher,
        inventory: &'a Inventory,
        signer: &'a dyn SignerInspector,
        probe: &'a dyn FileTimestampProbe,
    ) -> Self {
        Self {
            matcher,
            inventory,
            signer,
            probe,
        }
    }

    /// Run selection attempts until the operator confirms one or gives up.
    ///
    /// Returns `None` when the operator aborted after an empty selection.
    pub fn run(
        &self,
        candidates: &CandidateList,
        operator: &mut dyn Operator,
    ) -> Result<Option<SelectionSet>> {
        loop {
            match self.attempt(candidates, operator)? {
                Attempt::Confirmed(selection) => return Ok(Some(selection)),
                Attempt::Rejected => continue,
                Attempt::Empty => {
                    if !operator.retry_empty()? {
                        return Ok(None);
                    }
                }
            }
        }
    }

    fn attempt(&self, candidates: &CandidateList, operator: &mut dyn Operator) -> Result<Attempt> {
        let family = detect_family(candidates, operator)?;
        let action = operator.choose_action()?;

        let feature_present = self.matcher.feature_present(candidates);
        let push_features = if action == FilterAction::Filter && feature_present {
            operator.push_features()?
        } else {
            false
        };

        let extensions = ExtensionPolicy::for_family(family).active_extensions();
        let outcome = self.matcher.select_offline(
            self.inventory,
            candidates,
            &extensions,
            action,
            push_features,
        );

        let Some(first) = outcome.selection.first() else {
            return Ok(Attempt::Empty);
        };

        let sample = Path::new(first);
        let summary = SelectionSummary {
            count: outcome.selection.len(),
            family: Some(family),
            feature_present: outcome.feature_present,
            signer: self.signer.inspect(sample),
            timestamp: Some(inspect_timestamp(self.probe, sample)),
        };

        if operator.confirm(&summary)? {
            Ok(Attempt::Confirmed(outcome.selection))
        } else {
            Ok(Attempt::Rejected)
        }
    }
}

/// Selection from a build manifest
pub struct OnlineSession<'a> {
    matcher: &'a Matcher,
    inventory: &'a Inventory,
}

impl<'a> OnlineSession<'a> {
    pub fn new(matcher: &'a Matcher, inventory: &'a Inventory) -> Self {
        Self { matcher, inventory }
    }

    /// Select from freshly loaded manifest lines until the operator confirms.
    ///
    /// Returns `None` when the operator aborted after an empty selection.
    pub fn run<L>(&self, mut load: L, operator: &mut dyn Operator) -> Result<Option<MatchOutcome>>
    where
        L: FnMut() -> Result<CandidateList>,
    {
        loop {
            let candidates = load()?;
            let outcome = self.matcher.select_online(self.inventory, &candidates);

            if outcome.selection.is_empty() {
                if operator.retry_empty()? {
                    continue;
                }
                return Ok(None);
            }

            let summary = SelectionSummary {
                count: outcome.selection.len(),
                family: None,
                feature_present: outcome.feature_present,
                signer: None,
                timestamp: None,
            };
            if operator.confirm(&summary)? {
                return Ok(Some(outcome));
            }
        }
    }
}

enum Attempt {
    Confirmed(SelectionSet),
    Rejected,
    Empty,
}

/// Pick the family for a folder, asking only when both are present
pub fn detect_family(candidates: &CandidateList, operator: &mut dyn Operator) -> Result<Family> {
    let has_cbs = candidates.has_any(Family::Cbs.extensions());
    let has_spkg = candidates.has_any(Family::Spkg.extensions());

    if has_cbs && has_spkg {
        operator.choose_family()
    } else if has_cbs {
        Ok(Family::Cbs)
    } else {
        Ok(Family::Spkg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Candidate;
    use crate::signer::Signing;
    use std::collections::VecDeque;
    use std::io;

    #[derive(Default)]
    struct ScriptedOperator {
        families: VecDeque<Family>,
        actions: VecDeque<FilterAction>,
        push: bool,
        retries: VecDeque<bool>,
        confirms: VecDeque<bool>,
        summaries: Vec<SelectionSummary>,
        family_prompts: usize,
    }

    impl Operator for ScriptedOperator {
        fn choose_family(&mut self) -> Result<Family> {
            self.family_prompts += 1;
            Ok(self.families.pop_front().unwrap_or(Family::Cbs))
        }

        fn choose_action(&mut self) -> Result<FilterAction> {
            Ok(self.actions.pop_front().unwrap_or_default())
        }

        fn push_features(&mut self) -> Result<bool> {
            Ok(self.push)
        }

        fn retry_empty(&mut self) -> Result<bool> {
            Ok(self.retries.pop_front().unwrap_or(false))
        }

        fn confirm(&mut self, summary: &SelectionSummary) -> Result<bool> {
            self.summaries.push(summary.clone());
            Ok(self.confirms.pop_front().unwrap_or(true))
        }
    }

    struct FixedSigner(Option<SignerInfo>);

    impl SignerInspector for FixedSigner {
        fn inspect(&self, _path: &Path) -> Option<SignerInfo> {
            self.0.clone()
        }
    }

    struct FixedProbe(io::Result<&'static str>);

    impl FileTimestampProbe for FixedProbe {
        fn modified_text(&self, _package: &Path) -> io::Result<String> {
            match &self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(e) => Err(io::Error::new(e.kind(), e.to_string())),
            }
        }
    }

    fn folder(names: &[&str]) -> CandidateList {
        CandidateList::new(names.iter().map(|n| Candidate::local(*n, Some(10))).collect())
    }

    fn test_signer() -> SignerInfo {
        SignerInfo::from_issuer("CN=Microsoft Development PCA 2014, O=Microsoft", None, None)
    }

    #[test]
    fn test_offline_confirmed_selection() {
        let matcher = Matcher::default();
        let inventory = Inventory::from_keys(["foo"]);
        let signer = FixedSigner(Some(test_signer()));
        let probe = FixedProbe(Ok("10/26/2017 15:07:10"));
        let session = OfflineSession::new(&matcher, &inventory, &signer, &probe);
        let mut operator = ScriptedOperator::default();

        let selection = session
            .run(&folder(&["d/foo.cab", "d/bar.cab"]), &mut operator)
            .unwrap()
            .unwrap();

        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["d/foo.cab"]);
        assert_eq!(operator.family_prompts, 0);

        let summary = &operator.summaries[0];
        assert_eq!(summary.count, 1);
        assert_eq!(summary.family, Some(Family::Cbs));
        assert_eq!(summary.signer.as_ref().map(|s| s.signing), Some(Signing::Test));
        assert!(summary.needs_clock_warning());
    }

    #[test]
    fn test_offline_inspection_failures_do_not_stop_selection() {
        let matcher = Matcher::default();
        let inventory = Inventory::from_keys(["foo"]);
        let signer = FixedSigner(None);
        let probe = FixedProbe(Err(io::Error::new(io::ErrorKind::InvalidData, "not a cabinet")));
        let session = OfflineSession::new(&matcher, &inventory, &signer, &probe);
        let mut operator = ScriptedOperator::default();

        let selection = session.run(&folder(&["foo.spkg"]), &mut operator).unwrap();
        assert_eq!(selection.map(|s| s.len()), Some(1));

        let summary = &operator.summaries[0];
        assert_eq!(summary.signer, None);
        assert_eq!(summary.timestamp, Some(TimestampReport::default()));
        assert!(!summary.needs_clock_warning());
    }

    #[test]
    fn test_offline_mixed_folder_asks_for_family() {
        let matcher = Matcher::default();
        let inventory = Inventory::from_keys(["foo"]);
        let signer = FixedSigner(None);
        let probe = FixedProbe(Ok(""));
        let session = OfflineSession::new(&matcher, &inventory, &signer, &probe);
        let mut operator = ScriptedOperator {
            families: VecDeque::from([Family::Spkg]),
            ..ScriptedOperator::default()
        };

        let selection = session
            .run(&folder(&["foo.cab", "foo.spkg"]), &mut operator)
            .unwrap()
            .unwrap();
        assert_eq!(operator.family_prompts, 1);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["foo.spkg"]);
    }

    #[test]
    fn test_offline_retry_rebuilds_selection() {
        let matcher = Matcher::default();
        let inventory = Inventory::from_keys(["foo"]);
        let signer = FixedSigner(None);
        let probe = FixedProbe(Ok(""));
        let session = OfflineSession::new(&matcher, &inventory, &signer, &probe);
        let mut operator = ScriptedOperator {
            actions: VecDeque::from([FilterAction::IncludeAll, FilterAction::Filter]),
            confirms: VecDeque::from([false, true]),
            ..ScriptedOperator::default()
        };

        let selection = session
            .run(&folder(&["foo.cab", "bar.cab"]), &mut operator)
            .unwrap()
            .unwrap();

        assert_eq!(operator.summaries[0].count, 2);
        assert_eq!(operator.summaries[1].count, 1);
        assert_eq!(selection.iter().collect::<Vec<_>>(), vec!["foo.cab"]);
    }

    #[test]
    fn test_offline_empty_selection_abort() {
        let matcher = Matcher::default();
        let inventory = Inventory::from_keys(["missing"]);
        let signer = FixedSigner(None);
        let probe = FixedProbe(Ok(""));
        let session = OfflineSession::new(&matcher, &inventory, &signer, &probe);
        let mut operator = ScriptedOperator {
            retries: VecDeque::from([true, false]),
            ..ScriptedOperator::default()
        };

        let result = session.run(&folder(&["foo.cab"]), &mut operator).unwrap();
        assert!(result.is_none());
        assert!(operator.retries.is_empty());
        assert!(operator.summaries.is_empty());
    }

    #[test]
    fn test_offline_feature_push_prompt() {
        let matcher = Matcher::default();
        let inventory = Inventory::default();
        let signer = FixedSigner(None);
        let probe = FixedProbe(Ok(""));
        let session = OfflineSession::new(&matcher, &inventory, &signer, &probe);
        let mut operator = ScriptedOperator {
            push: true,
            ..ScriptedOperator::default()
        };

        let selection = session
            .run(&folder(&["ms_projecta.mainos.cab"]), &mut operator)
            .unwrap()
            .unwrap();
        assert_eq!(selection.len(), 1);
        assert!(operator.summaries[0].feature_present);
    }

    #[test]
    fn test_online_reloads_manifest_on_retry() {
        let matcher = Matcher::default();
        let inventory = Inventory::from_keys(["foo"]);
        let session = OnlineSession::new(&matcher, &inventory);
        let mut operator = ScriptedOperator {
            retries: VecDeque::from([true]),
            ..ScriptedOperator::default()
        };

        let mut manifests = VecDeque::from([
            CandidateList::remote(["http://h/bar.cab"]),
            CandidateList::remote(["http://h/foo.spkg", "http://h/ms_projecta.mainos.spkg"]),
        ]);
        let mut loads = 0;
        let outcome = session
            .run(
                || {
                    loads += 1;
                    Ok(manifests.pop_front().unwrap_or_default())
                },
                &mut operator,
            )
            .unwrap()
            .unwrap();

        assert_eq!(loads, 2);
        assert_eq!(outcome.selection.iter().collect::<Vec<_>>(), vec!["http://h/foo.spkg"]);
        assert!(outcome.feature_present);
        assert_eq!(operator.summaries[0].timestamp, None);
    }
}
