//! `quill check` command implementation.

use clap::Args;
use quill_pages::PageState;
use quill_storage::Title;

use super::StoreArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the check command.
#[derive(Args)]
pub(crate) struct CheckArgs {
    #[command(flatten)]
    store: StoreArgs,
}

impl CheckArgs {
    /// Execute the check command.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or any page needs attention.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let pages = self.store.open_read_only()?;

        let audit = pages.audit()?;
        let attention = needs_attention(&audit);

        if attention.is_empty() {
            output.success(&format!("All {} page(s) are consistent.", audit.len()));
            return Ok(());
        }

        output.warning(&format!(
            "{} of {} page(s) need attention:",
            attention.len(),
            audit.len()
        ));
        for (title, state) in &attention {
            output.info(&format!("  - {title}: {state}"));
        }
        output.info("\nRun `quill rebuild` to regenerate rendered output from source.");

        Err(CliError::Validation(format!(
            "{} page(s) need attention",
            attention.len()
        )))
    }
}

fn needs_attention(audit: &[(Title, PageState)]) -> Vec<(Title, PageState)> {
    audit
        .iter()
        .filter(|(_, state)| state.needs_attention())
        .cloned()
        .collect()
}
