//! Package selection.
//!
//! Turns an installed inventory plus a candidate listing (build manifest lines or
//! the files of a local folder) into an ordered, duplicate-free set of packages.

mod candidate;
mod matcher;
mod set;

pub use candidate::{Candidate, CandidateList};
pub use matcher::{
    FilterAction, MatchOutcome, Matcher, SelectionRules, FEATURE_PACKAGES, KNOWN_REQUIREMENTS,
};
pub use set::SelectionSet;
