//! Shared helpers for command handlers.

use std::io::{self, IsTerminal};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::debug;

use dockboard_core::{ActionDescriptor, DashboardController, DashboardItem, DashboardItems};

use crate::dialogs::TerminalDialogs;
use crate::error::CliError;

/// Stderr spinner while waiting on the host; `None` when quiet or not a terminal.
pub fn spinner(message: &str, quiet: bool) -> Option<ProgressBar> {
    if quiet || !io::stderr().is_terminal() {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message.to_owned());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

/// Generate the dashboard and return its partitioned items.
pub async fn items(controller: &DashboardController, quiet: bool) -> Result<DashboardItems, CliError> {
    let spinner = spinner("Reading registry", quiet);
    let generated = controller.generate_view().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    Ok(generated?.items.clone())
}

/// Find a container by id or name.
pub fn resolve_container<'a>(items: &'a DashboardItems, identifier: &str) -> Result<&'a DashboardItem, CliError> {
    items
        .containers
        .iter()
        .find(|c| c.id == identifier)
        .or_else(|| items.containers.iter().find(|c| c.name == identifier))
        .ok_or_else(|| CliError::NotFound {
            resource_type: "container".into(),
            identifier: identifier.into(),
            list_command: "containers list".into(),
        })
}

/// Run one action through a terminal-backed dispatcher and wait for it.
///
/// Service failures from the error surface become the command's error.
/// Returns the dialogs so callers can serve any dialog the action opened.
pub async fn run_action(
    controller: &DashboardController,
    action: ActionDescriptor,
    yes: bool,
) -> Result<Arc<TerminalDialogs>, CliError> {
    let dialogs = Arc::new(TerminalDialogs::new(yes));
    let (dispatcher, mut errors) = controller.dispatcher(Arc::clone(&dialogs)).await?;

    debug!(?action, "dispatching action");
    dispatcher.dispatch(action).finished().await;

    if let Some(refusal) = dialogs.take_refusal() {
        return Err(refusal);
    }
    if let Ok(err) = errors.try_recv() {
        return Err(err.into());
    }
    Ok(dialogs)
}

/// Prompt for confirmation, auto-approving if `--yes` was passed.
pub fn confirm(message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(crate::error::prompt_err)
}
