//! Best-effort package signature and timestamp inspection.
//!
//! Test-signed packages only install when the device clock falls inside the
//! signing certificate's validity window, so before pushing packages the operator
//! is shown who signed them and when the files were built. None of this is
//! allowed to stop the pipeline: every inspector returns `Option` and logs its
//! failures.

mod command;
mod timestamp;

use std::fmt;
use std::path::Path;

use chrono::{NaiveDate, NaiveDateTime};
use lazy_static::lazy_static;
use regex::Regex;

use crate::extension::contains_ignore_case;

pub use command::{parse_verify_output, CommandSignerInspector, DEFAULT_SIGNER_PROGRAM};
pub use timestamp::{
    inspect_timestamp, CabinetTimestampProbe, FileTimestampProbe, TimestampReport,
};

lazy_static! {
    static ref COMMON_NAME: Regex = Regex::new(r"CN=(.*?),").unwrap();
}

/// Issuer keywords that mark a non-production certificate
const TEST_KEYWORDS: &[&str] = &["Development", "Test"];

/// Signing classification derived from the issuer name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signing {
    Test,
    Production,
}

impl fmt::Display for Signing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signing::Test => f.write_str("Test signed"),
            Signing::Production => f.write_str("Production signed"),
        }
    }
}

/// Signer details of one package
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignerInfo {
    /// Issuer common name
    pub issuer: String,
    pub effective: Option<NaiveDateTime>,
    pub expires: Option<NaiveDateTime>,
    pub signing: Signing,
}

impl SignerInfo {
    /// Build signer details from the full issuer string and raw validity dates
    pub fn from_issuer(issuer: &str, effective: Option<&str>, expires: Option<&str>) -> Self {
        let issuer = common_name(issuer).to_string();
        Self {
            signing: classify(&issuer),
            issuer,
            effective: effective.and_then(parse_date),
            expires: expires.and_then(parse_date),
        }
    }

    pub fn is_test_signed(&self) -> bool {
        self.signing == Signing::Test
    }
}

/// Reads the signer of a package file
pub trait SignerInspector {
    /// Returns `None` when the file is unsigned or cannot be inspected
    fn inspect(&self, path: &Path) -> Option<SignerInfo>;
}

/// Extract the common name from an issuer distinguished name.
///
/// Takes the text between `CN=` and the next comma; issuers without such a
/// match are returned unchanged.
pub fn common_name(issuer: &str) -> &str {
    COMMON_NAME
        .captures(issuer)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(issuer)
}

pub fn classify(issuer: &str) -> Signing {
    if TEST_KEYWORDS.iter().any(|k| contains_ignore_case(issuer, k)) {
        Signing::Test
    } else {
        Signing::Production
    }
}

const DATE_TIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%b %d %H:%M:%S %Y",
    "%d.%m.%Y %H:%M:%S",
    "%d.%m.%Y %H:%M",
];

const DATE_FORMATS: &[&str] = &["%m/%d/%Y", "%Y-%m-%d", "%d.%m.%Y"];

/// Parse a date as printed by signing tools or file browsers.
///
/// Direction marks and `?` placeholders left by lossy encodings are removed,
/// whitespace is collapsed and a trailing `GMT`/`UTC` is dropped first.
pub fn parse_date(text: &str) -> Option<NaiveDateTime> {
    let cleaned = clean_date_text(text);
    let cleaned = cleaned
        .strip_suffix(" GMT")
        .or_else(|| cleaned.strip_suffix(" UTC"))
        .unwrap_or(&cleaned);

    DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(cleaned, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

fn clean_date_text(text: &str) -> String {
    text.chars()
        .filter(|c| !matches!(c, '?' | '\u{200e}' | '\u{200f}' | '\u{202a}'..='\u{202e}'))
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
