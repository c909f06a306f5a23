//! Signer inspection through an external Authenticode verifier.

use std::path::{Path, PathBuf};
use std::process::Command;

use super::{SignerInfo, SignerInspector};

pub const DEFAULT_SIGNER_PROGRAM: &str = "osslsigncode";

/// Runs `<program> verify -in <file>` and reads the signer certificate from its report
#[derive(Debug, Clone)]
pub struct CommandSignerInspector {
    program: PathBuf,
}

impl CommandSignerInspector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for CommandSignerInspector {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNER_PROGRAM)
    }
}

impl SignerInspector for CommandSignerInspector {
    fn inspect(&self, path: &Path) -> Option<SignerInfo> {
        let output = match Command::new(&self.program)
            .arg("verify")
            .arg("-in")
            .arg(path)
            .output()
        {
            Ok(output) => output,
            Err(e) => {
                log::warn!("Could not run {}: {}", self.program.display(), e);
                return None;
            }
        };

        // Verification fails for test chains the host does not trust, but the
        // signer block is still printed.
        let mut report = String::from_utf8_lossy(&output.stdout).into_owned();
        report.push('\n');
        report.push_str(&String::from_utf8_lossy(&output.stderr));

        let info = parse_verify_output(&report);
        if info.is_none() {
            log::warn!("No signer certificate found in {}", path.display());
        }
        info
    }
}

/// Parse a verifier report.
///
/// The first `Issuer` line names the signer's issuer; `notBefore`/`notAfter`
/// (or `Not before`/`Not after`) give the validity window. Slash-separated
/// distinguished names are rewritten as `CN=..., O=..., C=...`.
pub fn parse_verify_output(report: &str) -> Option<SignerInfo> {
    let mut issuer = None;
    let mut effective = None;
    let mut expires = None;

    for line in report.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_ascii_lowercase();
        let value = value.trim();

        match key.as_str() {
            "issuer" if issuer.is_none() => issuer = Some(normalize_dn(value)),
            "notbefore" | "not before" if effective.is_none() => effective = Some(value),
            "notafter" | "not after" if expires.is_none() => expires = Some(value),
            _ => {}
        }
    }

    issuer.map(|issuer| SignerInfo::from_issuer(&issuer, effective, expires))
}

fn normalize_dn(dn: &str) -> String {
    if !dn.starts_with('/') {
        return dn.to_string();
    }
    let mut parts: Vec<_> = dn.split('/').filter(|p| !p.is_empty()).collect();
    parts.reverse();
    parts.join(", ")
}
