// ── Action dispatch ──
//
// Maps a UI-triggered action descriptor to a service call, a
// confirmation-gated service call, or a dialog open request.
// `dispatch` returns immediately; the work runs on the tokio runtime
// and failures go to the host's error surface, never retried.

use std::future::Future;
use std::sync::Arc;

use serde::{Deserialize, Deserializer, Serialize, de};
use serde_json::{Map, Value};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::CoreError;
use crate::model::EntityId;

// ── Descriptors ──────────────────────────────────────────────────────

/// Who a plain service call is aimed at.
///
/// Decoding fails when `entity_id` or `id` is present but malformed, so a
/// bad target never degrades into an untargeted call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ServiceTarget {
    Entity { entity_id: EntityId },
    Resource { id: String },
    Unspecified {},
}

#[derive(Deserialize)]
struct TargetFields {
    #[serde(default)]
    entity_id: Option<EntityId>,
    #[serde(default)]
    id: Option<String>,
}

impl<'de> Deserialize<'de> for ServiceTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let TargetFields { entity_id, id } = TargetFields::deserialize(deserializer)?;
        match (entity_id, id) {
            (Some(entity_id), None) => Ok(Self::Entity { entity_id }),
            (None, Some(id)) => Ok(Self::Resource { id }),
            (None, None) => Ok(Self::Unspecified {}),
            (Some(_), Some(_)) => Err(de::Error::custom("service call targets both `entity_id` and `id`")),
        }
    }
}

impl ServiceTarget {
    /// The service payload carrying this target.
    pub fn payload(&self) -> Value {
        let mut payload = Map::new();
        match self {
            Self::Entity { entity_id } => {
                payload.insert("entity_id".into(), Value::from(entity_id.as_str()));
            }
            Self::Resource { id } => {
                payload.insert("id".into(), Value::from(id.as_str()));
            }
            Self::Unspecified {} => {}
        }
        Value::Object(payload)
    }
}

/// What a button does when pressed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum ActionDescriptor {
    ServiceCall {
        domain: String,
        service: String,
        #[serde(flatten)]
        target: ServiceTarget,
    },
    ConfirmedServiceCall {
        title: String,
        message: String,
        domain: String,
        service: String,
        #[serde(default)]
        args: Map<String, Value>,
    },
    DialogOpen {
        dialog_id: String,
        #[serde(default)]
        params: Map<String, Value>,
    },
}

// ── Capabilities ─────────────────────────────────────────────────────

/// Backend service invocation. May fail; the dispatcher never retries.
pub trait ServiceCaller: Send + Sync + 'static {
    fn call(
        &self,
        domain: &str,
        service: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, CoreError>> + Send;
}

/// Text shown in a confirmation dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    pub title: String,
    pub message: String,
}

/// The single outcome of one confirmation dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmOutcome {
    Confirmed,
    Cancelled,
}

/// Answer slot handed to the dialog host.
///
/// Consumed by [`confirm`](Self::confirm) or [`cancel`](Self::cancel), so
/// one dialog produces at most one outcome. Dropping it unanswered
/// counts as cancel.
#[derive(Debug)]
pub struct ConfirmResponder {
    tx: oneshot::Sender<ConfirmOutcome>,
}

impl ConfirmResponder {
    pub fn respond(self, outcome: ConfirmOutcome) {
        // The dispatcher side may have gone away; nothing to do then.
        let _ = self.tx.send(outcome);
    }

    pub fn confirm(self) {
        self.respond(ConfirmOutcome::Confirmed);
    }

    pub fn cancel(self) {
        self.respond(ConfirmOutcome::Cancelled);
    }
}

/// Create a linked responder and outcome receiver.
pub fn confirm_channel() -> (ConfirmResponder, oneshot::Receiver<ConfirmOutcome>) {
    let (tx, rx) = oneshot::channel();
    (ConfirmResponder { tx }, rx)
}

/// Dialog presentation owned by the host.
pub trait DialogHost: Send + Sync + 'static {
    /// Present a confirmation and answer through `responder`.
    fn confirm(&self, prompt: ConfirmPrompt, responder: ConfirmResponder);

    /// Open a named dialog. Its result is the dialog's own business.
    fn open(&self, dialog_id: &str, params: &Map<String, Value>);
}

// ── Dispatcher ───────────────────────────────────────────────────────

/// Completion handle for one dispatched action.
///
/// Dropping it detaches the work; awaiting [`finished`](Self::finished)
/// is only useful for callers that want to sequence on completion.
#[derive(Debug)]
pub struct DispatchHandle(Option<JoinHandle<()>>);

impl DispatchHandle {
    pub async fn finished(self) {
        if let Some(handle) = self.0 {
            if let Err(e) = handle.await {
                warn!(error = %e, "dispatched action task failed");
            }
        }
    }
}

/// Routes action descriptors to the host capabilities.
pub struct Dispatcher<S, D> {
    services: Arc<S>,
    dialogs: Arc<D>,
    errors: mpsc::UnboundedSender<CoreError>,
}

impl<S, D> Clone for Dispatcher<S, D> {
    fn clone(&self) -> Self {
        Self {
            services: Arc::clone(&self.services),
            dialogs: Arc::clone(&self.dialogs),
            errors: self.errors.clone(),
        }
    }
}

impl<S: ServiceCaller, D: DialogHost> Dispatcher<S, D> {
    /// Build a dispatcher and the receiving end of its error surface.
    pub fn new(services: Arc<S>, dialogs: Arc<D>) -> (Self, mpsc::UnboundedReceiver<CoreError>) {
        let (errors, errors_rx) = mpsc::unbounded_channel();
        (
            Self {
                services,
                dialogs,
                errors,
            },
            errors_rx,
        )
    }

    /// Route one action. Must be called within a tokio runtime.
    pub fn dispatch(&self, action: ActionDescriptor) -> DispatchHandle {
        match action {
            ActionDescriptor::ServiceCall {
                domain,
                service,
                target,
            } => {
                let payload = target.payload();
                DispatchHandle(Some(self.spawn_call(domain, service, payload)))
            }
            ActionDescriptor::ConfirmedServiceCall {
                title,
                message,
                domain,
                service,
                args,
            } => {
                let (responder, outcome) = confirm_channel();
                self.dialogs.confirm(ConfirmPrompt { title, message }, responder);

                let this = self.clone();
                DispatchHandle(Some(tokio::spawn(async move {
                    // A dropped responder reads as cancel.
                    let outcome = outcome.await.unwrap_or(ConfirmOutcome::Cancelled);
                    match outcome {
                        ConfirmOutcome::Confirmed => {
                            this.call(&domain, &service, Value::Object(args)).await;
                        }
                        ConfirmOutcome::Cancelled => {
                            debug!(domain, service, "confirmation dismissed, no call made");
                        }
                    }
                })))
            }
            ActionDescriptor::DialogOpen { dialog_id, params } => {
                debug!(dialog_id, "opening dialog");
                self.dialogs.open(&dialog_id, &params);
                DispatchHandle(None)
            }
        }
    }

    fn spawn_call(&self, domain: String, service: String, payload: Value) -> JoinHandle<()> {
        let this = self.clone();
        tokio::spawn(async move { this.call(&domain, &service, payload).await })
    }

    async fn call(&self, domain: &str, service: &str, payload: Value) {
        debug!(domain, service, "calling service");
        if let Err(e) = self.services.call(domain, service, payload).await {
            warn!(domain, service, error = %e, "service call failed");
            let failure = CoreError::ServiceCall {
                domain: domain.to_owned(),
                service: service.to_owned(),
                source: Box::new(e),
            };
            if self.errors.send(failure).is_err() {
                debug!("error surface closed");
            }
        }
    }
}
