//! Terminal rendition of the dashboard's dialogs.
//!
//! Confirmation prompts go through `dialoguer` on a blocking thread so the
//! dispatcher's task keeps running; `--yes` confirms without asking.
//! Opened dialogs are queued for the command that triggered them.

use std::io::{self, IsTerminal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use dialoguer::{Confirm, Input};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use dockboard_core::{ConfirmPrompt, ConfirmResponder, CreateContainerRequest, DialogHost};

use crate::cli::CreateArgs;
use crate::error::{CliError, prompt_err};

/// A dialog the dashboard asked to open.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenedDialog {
    pub dialog_id: String,
    pub params: Map<String, Value>,
}

/// `DialogHost` backed by the controlling terminal.
pub struct TerminalDialogs {
    yes: bool,
    interactive: bool,
    declined: Arc<AtomicUsize>,
    refused: Mutex<Option<String>>,
    opened: Mutex<Vec<OpenedDialog>>,
}

impl TerminalDialogs {
    pub fn new(yes: bool) -> Self {
        Self::with_terminal(yes, io::stdin().is_terminal() && io::stderr().is_terminal())
    }

    fn with_terminal(yes: bool, interactive: bool) -> Self {
        Self {
            yes,
            interactive,
            declined: Arc::new(AtomicUsize::new(0)),
            refused: Mutex::new(None),
            opened: Mutex::new(Vec::new()),
        }
    }

    /// Prompts answered with "no".
    pub fn declined(&self) -> usize {
        self.declined.load(Ordering::SeqCst)
    }

    /// Error for a prompt that could not be shown without `--yes`.
    pub fn take_refusal(&self) -> Option<CliError> {
        let title = self.refused.lock().unwrap_or_else(PoisonError::into_inner).take()?;
        Some(CliError::NonInteractiveRequiresYes { action: title })
    }

    pub fn take_opened(&self) -> Vec<OpenedDialog> {
        std::mem::take(&mut *self.opened.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl DialogHost for TerminalDialogs {
    fn confirm(&self, prompt: ConfirmPrompt, responder: ConfirmResponder) {
        if self.yes {
            debug!(title = %prompt.title, "confirmed by --yes");
            responder.confirm();
            return;
        }
        if !self.interactive {
            *self.refused.lock().unwrap_or_else(PoisonError::into_inner) = Some(prompt.title);
            responder.cancel();
            return;
        }

        let declined = Arc::clone(&self.declined);
        tokio::task::spawn_blocking(move || {
            let answer = Confirm::new()
                .with_prompt(format!("{}: {}", prompt.title, prompt.message))
                .default(false)
                .interact();
            match answer {
                Ok(true) => responder.confirm(),
                Ok(false) => {
                    declined.fetch_add(1, Ordering::SeqCst);
                    responder.cancel();
                }
                Err(e) => {
                    warn!(error = %e, "confirmation prompt failed");
                    declined.fetch_add(1, Ordering::SeqCst);
                    responder.cancel();
                }
            }
        });
    }

    fn open(&self, dialog_id: &str, params: &Map<String, Value>) {
        self.opened
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OpenedDialog {
                dialog_id: dialog_id.to_owned(),
                params: params.clone(),
            });
    }
}

// ── Create container form ────────────────────────────────────────────

/// Build a create request from flags, prompting for a missing image or
/// name when attached to a terminal.
pub fn create_container_form(args: CreateArgs, interactive: bool) -> Result<CreateContainerRequest, CliError> {
    let image = required(args.image, "image", "Image", interactive)?;
    let name = required(args.name, "name", "Container name", interactive)?;

    let request = CreateContainerRequest {
        image,
        name,
        network: args.network,
        ports: args.ports,
        volumes: args.volumes,
        restart_policy: args.restart_policy,
    };
    request.validate()?;
    Ok(request)
}

fn required(value: Option<String>, field: &str, label: &str, interactive: bool) -> Result<String, CliError> {
    match value {
        Some(v) => Ok(v),
        None if interactive => Input::<String>::new()
            .with_prompt(label)
            .interact_text()
            .map_err(prompt_err),
        None => Err(CliError::Validation {
            field: field.into(),
            reason: format!("--{field} is required when not running interactively"),
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dockboard_core::ConfirmOutcome;
    use dockboard_core::action::confirm_channel;

    use super::*;

    fn prompt() -> ConfirmPrompt {
        ConfirmPrompt {
            title: "Prune images".into(),
            message: "Remove all unused images?".into(),
        }
    }

    #[tokio::test]
    async fn yes_flag_confirms() {
        let dialogs = TerminalDialogs::with_terminal(true, false);
        let (responder, outcome) = confirm_channel();

        dialogs.confirm(prompt(), responder);

        assert_eq!(outcome.await.unwrap(), ConfirmOutcome::Confirmed);
        assert!(dialogs.take_refusal().is_none());
    }

    #[tokio::test]
    async fn non_interactive_cancels_and_reports() {
        let dialogs = TerminalDialogs::with_terminal(false, false);
        let (responder, outcome) = confirm_channel();

        dialogs.confirm(prompt(), responder);

        assert_eq!(outcome.await.unwrap(), ConfirmOutcome::Cancelled);
        let err = dialogs.take_refusal().unwrap();
        assert!(matches!(err, CliError::NonInteractiveRequiresYes { ref action } if action == "Prune images"));
        assert!(dialogs.take_refusal().is_none());
    }

    #[test]
    fn opened_dialogs_are_queued() {
        let dialogs = TerminalDialogs::with_terminal(false, false);
        let mut params = Map::new();
        params.insert("id".into(), Value::from("c1"));

        dialogs.open("container-logs", &params);

        let opened = dialogs.take_opened();
        assert_eq!(opened.len(), 1);
        assert_eq!(opened[0].dialog_id, "container-logs");
        assert!(dialogs.take_opened().is_empty());
    }

    #[test]
    fn form_requires_image_without_terminal() {
        let args = CreateArgs {
            image: None,
            name: Some("web".into()),
            network: None,
            ports: Vec::new(),
            volumes: Vec::new(),
            restart_policy: None,
        };
        let err = create_container_form(args, false).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "image"));
    }

    #[test]
    fn form_validates_ports() {
        let args = CreateArgs {
            image: Some("nginx".into()),
            name: Some("web".into()),
            network: None,
            ports: vec!["80".into()],
            volumes: Vec::new(),
            restart_policy: Some("always".into()),
        };
        assert!(create_container_form(args, false).is_err());
    }
}
