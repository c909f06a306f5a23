//! Terminal prompts for selection decisions.

use dialoguer::{theme::ColorfulTheme, Confirm, Select};
use wpup_pm::{Family, FilterAction, Operator, Result, SelectionSummary, UpdaterError};

use crate::output::Output;
use crate::summary::print_summary;

/// Asks on the terminal, or answers with defaults when it cannot.
///
/// Answers given as command-line flags are used for the first selection
/// attempt only; a retry asks again.
pub struct ConsoleOperator {
    output: Output,
    interactive: bool,
    assume_yes: bool,
    family: Option<Family>,
    action: Option<FilterAction>,
    push_features: Option<bool>,
}

impl ConsoleOperator {
    pub fn new(output: Output, interactive: bool, assume_yes: bool) -> Self {
        Self {
            output,
            interactive,
            assume_yes,
            family: None,
            action: None,
            push_features: None,
        }
    }

    pub fn with_family(mut self, family: Option<Family>) -> Self {
        self.family = family;
        self
    }

    pub fn with_action(mut self, action: Option<FilterAction>) -> Self {
        self.action = action;
        self
    }

    pub fn with_push_features(mut self, push: Option<bool>) -> Self {
        self.push_features = push;
        self
    }

    fn select(&self, prompt: &str, items: &[&str]) -> Result<usize> {
        Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()
            .map_err(prompt_error)?
            .ok_or_else(|| UpdaterError::Prompt("selection cancelled".to_string()))
    }

    fn confirm_prompt(&self, prompt: &str, default: bool) -> Result<bool> {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact()
            .map_err(prompt_error)
    }
}

fn prompt_error(e: dialoguer::Error) -> UpdaterError {
    UpdaterError::Prompt(e.to_string())
}

impl Operator for ConsoleOperator {
    fn choose_family(&mut self) -> Result<Family> {
        if let Some(family) = self.family.take() {
            return Ok(family);
        }
        if !self.interactive {
            self.output
                .warning("Folder holds both CBS and SPKG packages, using CBS (pass --family to choose)");
            return Ok(Family::Cbs);
        }

        let choice = self.select(
            "The folder holds both CBS and SPKG packages. Which should be used?",
            &["CBS (.cab)", "SPKG (.spkg)"],
        )?;
        Ok(if choice == 0 { Family::Cbs } else { Family::Spkg })
    }

    fn choose_action(&mut self) -> Result<FilterAction> {
        if let Some(action) = self.action.take() {
            return Ok(action);
        }
        if !self.interactive {
            return Ok(FilterAction::Filter);
        }

        let choice = self.select(
            "Which packages should be pushed?",
            &["Only packages installed on the device", "Every package in the folder"],
        )?;
        Ok(if choice == 0 {
            FilterAction::Filter
        } else {
            FilterAction::IncludeAll
        })
    }

    fn push_features(&mut self) -> Result<bool> {
        if let Some(push) = self.push_features.take() {
            return Ok(push);
        }
        if !self.interactive {
            return Ok(false);
        }
        self.confirm_prompt("Feature packages were found. Push them as well?", false)
    }

    fn retry_empty(&mut self) -> Result<bool> {
        self.output.warning("No packages matched the installed inventory");
        if !self.interactive {
            return Ok(false);
        }
        self.confirm_prompt("Run the selection again?", true)
    }

    fn confirm(&mut self, summary: &SelectionSummary) -> Result<bool> {
        print_summary(&self.output, summary);
        if self.assume_yes || !self.interactive {
            return Ok(true);
        }
        self.confirm_prompt("Push these packages? (no runs the selection again)", true)
    }
}
