//! Offline command - stage packages from a local folder.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use std::io::IsTerminal;
use std::path::PathBuf;
use wpup_pm::{
    package_dir, stage_packages, CabinetTimestampProbe, CandidateList, CommandSignerInspector,
    Family, FilterAction, Inventory, Matcher, OfflineSession, UpdaterConfig,
};

use crate::output::Output;
use crate::progress::ProgressManager;
use crate::prompt::ConsoleOperator;

#[derive(Args, Debug)]
pub struct OfflineArgs {
    /// Folder holding CBS or SPKG packages
    #[arg(value_name = "FOLDER")]
    pub folder: PathBuf,

    /// Device serial; packages are copied to `<out>/<serial>/Packages`
    #[arg(long)]
    pub serial: String,

    /// Output root directory
    #[arg(short = 'o', long, default_value = ".")]
    pub out: PathBuf,

    /// Installed package export (overrides the configured path)
    #[arg(long, value_name = "FILE")]
    pub inventory: Option<PathBuf>,

    /// Package family to use when the folder holds both
    #[arg(long, value_enum)]
    pub family: Option<FamilyChoice>,

    /// Take every package of the family instead of matching the inventory
    #[arg(long)]
    pub include_all: bool,

    /// Push feature packages found in the folder
    #[arg(long)]
    pub push_features: bool,

    /// Copy without asking for confirmation
    #[arg(short = 'y', long)]
    pub yes: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyChoice {
    Cbs,
    Spkg,
}

impl From<FamilyChoice> for Family {
    fn from(choice: FamilyChoice) -> Self {
        match choice {
            FamilyChoice::Cbs => Family::Cbs,
            FamilyChoice::Spkg => Family::Spkg,
        }
    }
}

pub fn execute(args: OfflineArgs, config: &UpdaterConfig, output: &Output) -> Result<i32> {
    run(args, config, output, std::io::stdin().is_terminal())
}

fn run(args: OfflineArgs, config: &UpdaterConfig, output: &Output, interactive: bool) -> Result<i32> {
    let inventory_path = args.inventory.as_ref().unwrap_or(&config.inventory.path);
    let inventory = Inventory::load(inventory_path, config.inventory.key_field)
        .context("Failed to read the installed package inventory")?;

    let candidates = CandidateList::from_folder(&args.folder)?;
    output.verbose(&format!(
        "{} files in {}, {} installed components",
        candidates.len(),
        args.folder.display(),
        inventory.len()
    ));

    let matcher = Matcher::new(config.selection.clone());
    let signer = CommandSignerInspector::new(&config.signer.program);
    let session = OfflineSession::new(&matcher, &inventory, &signer, &CabinetTimestampProbe);

    let mut operator = ConsoleOperator::new(output.clone(), interactive, args.yes)
        .with_family(args.family.map(Family::from))
        .with_action(args.include_all.then_some(FilterAction::IncludeAll))
        .with_push_features(args.push_features.then_some(true));

    let Some(selection) = session.run(&candidates, &mut operator)? else {
        output.warning("Nothing selected, no packages were copied");
        return Ok(1);
    };

    let dest = package_dir(&args.out, &args.serial);
    let bar = ProgressManager::new(output.is_term()).create_operation_bar(selection.len() as u64);
    let staged = stage_packages(&selection, &dest, |index, _total, name| {
        bar.set_position(index as u64 - 1);
        bar.set_message(name.to_string());
    })
    .with_context(|| format!("Failed to copy packages to {}", dest.display()))?;
    bar.finish_and_clear();

    output.success(&format!(
        "Copied {} packages to {}",
        staged.len(),
        dest.display()
    ));
    Ok(0)
}
