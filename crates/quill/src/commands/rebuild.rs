//! `quill rebuild` command implementation.

use clap::Args;
use quill_pages::RebuildReport;
use quill_storage::Title;

use super::StoreArgs;
use crate::error::CliError;
use crate::output::Output;

/// Arguments for the rebuild command.
#[derive(Args)]
pub(crate) struct RebuildArgs {
    #[command(flatten)]
    store: StoreArgs,

    /// Page to rebuild (default: every page with a stored source).
    title: Option<String>,
}

impl RebuildArgs {
    /// Execute the rebuild command.
    ///
    /// # Errors
    ///
    /// Returns an error if the title is invalid or any page fails to rebuild.
    pub(crate) fn execute(self) -> Result<(), CliError> {
        let output = Output::new();
        let title = self.title.map(Title::new).transpose()?;
        let pages = self.store.open_exclusive()?;

        if let Some(title) = title {
            pages.rebuild(&title)?;
            output.success(&format!("Rebuilt '{title}'."));
            return Ok(());
        }

        let report = pages.rebuild_all();
        print_report(&output, &report);

        if report.failed.is_empty() {
            Ok(())
        } else {
            Err(CliError::Validation(format!(
                "{} page(s) failed to rebuild",
                report.failed.len()
            )))
        }
    }
}

fn print_report(output: &Output, report: &RebuildReport) {
    output.success(&format!("Rebuilt {} page(s).", report.rebuilt.len()));

    if !report.failed.is_empty() {
        output.warning(&format!("\nFailed ({}):", report.failed.len()));
        for (title, err) in &report.failed {
            output.info(&format!("  - {title}: {err}"));
        }
    }
}
