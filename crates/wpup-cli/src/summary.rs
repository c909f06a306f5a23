//! Text shown before packages are pushed.

use chrono::NaiveDateTime;
use wpup_pm::{SelectionSummary, SignerInfo, TimestampReport};

use crate::output::Output;

const DISPLAY_FORMAT: &str = "%m/%d/%Y %H:%M:%S";

fn display_date(date: &NaiveDateTime) -> String {
    date.format(DISPLAY_FORMAT).to_string()
}

/// `label: value` rows describing a package's signer and build date
pub fn package_fields(
    signer: Option<&SignerInfo>,
    timestamp: Option<&TimestampReport>,
) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();

    match signer {
        Some(info) => {
            fields.push(("Signing", info.signing.to_string()));
            fields.push(("Issuer", info.issuer.clone()));
            if let Some(effective) = &info.effective {
                fields.push(("Valid from", display_date(effective)));
            }
            if let Some(expires) = &info.expires {
                fields.push(("Valid until", display_date(expires)));
            }
        }
        None => fields.push(("Signing", "unknown".to_string())),
    }

    if let Some(report) = timestamp {
        let date = match &report.modified {
            Some(modified) => display_date(modified),
            None if !report.raw.is_empty() => format!("Could not parse date ({})", report.raw),
            None => "unknown".to_string(),
        };
        fields.push(("Package date", date));
    }

    fields
}

/// Heading line for a selection
pub fn headline(summary: &SelectionSummary) -> String {
    let noun = if summary.count == 1 { "package" } else { "packages" };
    match summary.family {
        Some(family) => format!(
            "{} {} {} selected",
            summary.count,
            family.as_str().to_uppercase(),
            noun
        ),
        None => format!("{} {} selected", summary.count, noun),
    }
}

/// Reminder shown for test-signed packages with a known build date
pub fn clock_warning(summary: &SelectionSummary) -> Option<String> {
    if !summary.needs_clock_warning() {
        return None;
    }
    let modified = summary.timestamp.as_ref()?.modified.as_ref()?;
    Some(format!(
        "Packages are test signed. Set the device clock to {} before pushing them.",
        display_date(modified)
    ))
}

pub fn print_summary(output: &Output, summary: &SelectionSummary) {
    output.section(&headline(summary));

    // Online selections have no local file to inspect
    if summary.timestamp.is_some() {
        for (label, value) in package_fields(summary.signer.as_ref(), summary.timestamp.as_ref()) {
            output.field(label, &value);
        }
    }
    if summary.feature_present {
        output.field("Features", "feature packages available");
    }
    if let Some(warning) = clock_warning(summary) {
        output.warning(&warning);
    }
}
