//! Inspect command - show who signed a package and when it was built.

use anyhow::{bail, Result};
use clap::Args;
use std::path::PathBuf;
use wpup_pm::signer::inspect_timestamp;
use wpup_pm::{
    CabinetTimestampProbe, CommandSignerInspector, Family, SelectionSummary, SignerInspector,
    UpdaterConfig,
};

use crate::output::Output;
use crate::summary::{clock_warning, package_fields};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Package file (.cab, .cbs_, .spkg or .spkg_)
    #[arg(value_name = "PACKAGE")]
    pub package: PathBuf,
}

pub fn execute(args: InspectArgs, config: &UpdaterConfig, output: &Output) -> Result<i32> {
    if !args.package.is_file() {
        bail!("Package not found: {}", args.package.display());
    }

    let signer = CommandSignerInspector::new(&config.signer.program).inspect(&args.package);
    let timestamp = inspect_timestamp(&CabinetTimestampProbe, &args.package);

    let name = args.package.to_string_lossy();
    let summary = SelectionSummary {
        count: 1,
        family: [Family::Cbs, Family::Spkg].into_iter().find(|f| f.matches(&name)),
        feature_present: false,
        signer,
        timestamp: Some(timestamp),
    };

    output.section(&args.package.display().to_string());
    if let Some(family) = summary.family {
        output.field("Family", &family.as_str().to_uppercase());
    }
    for (label, value) in package_fields(summary.signer.as_ref(), summary.timestamp.as_ref()) {
        output.field(label, &value);
    }
    if let Some(warning) = clock_warning(&summary) {
        output.warning(&warning);
    }

    Ok(0)
}
