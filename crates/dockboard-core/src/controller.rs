// ── Dashboard controller ──
//
// Connection lifecycle for one host: authentication, initial state
// load, the state-change pump, view generation and action dispatch.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use dockboard_api::WsClient;
use serde_json::{Value, json};
use tokio::sync::{Mutex, broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::action::{DialogHost, Dispatcher};
use crate::config::HostConfig;
use crate::error::CoreError;
use crate::model::{DashboardItems, StateSnapshot};
use crate::registry::fetch_snapshot;
use crate::services::{DOMAIN, DockerService};
use crate::store::StateStore;
use crate::strategy;
use crate::stream::StateStream;
use crate::view::DashboardView;

// ── ConnectionState ──────────────────────────────────────────────────

/// Connection state observable by consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Failed,
}

/// One completed view generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedView {
    /// Monotonic request number; higher supersedes lower.
    pub generation: u64,
    pub items: DashboardItems,
    pub view: DashboardView,
}

// ── Controller ───────────────────────────────────────────────────────

/// Entry point for hosts rendering the dashboard.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct DashboardController {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: HostConfig,
    store: Arc<StateStore>,
    connection_state: watch::Sender<ConnectionState>,
    client: Mutex<Option<WsClient>>,
    generation: AtomicU64,
    latest_view: watch::Sender<Option<Arc<GeneratedView>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl DashboardController {
    /// Create a controller. Does NOT connect; call
    /// [`connect()`](Self::connect) to authenticate and load states.
    pub fn new(config: HostConfig) -> Self {
        let (connection_state, _) = watch::channel(ConnectionState::Disconnected);
        let (latest_view, _) = watch::channel(None);
        Self {
            inner: Arc::new(ControllerInner {
                config,
                store: Arc::new(StateStore::new()),
                connection_state,
                client: Mutex::new(None),
                generation: AtomicU64::new(0),
                latest_view,
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &HostConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<StateStore> {
        &self.inner.store
    }

    pub fn connection_state(&self) -> watch::Receiver<ConnectionState> {
        self.inner.connection_state.subscribe()
    }

    // ── Connection lifecycle ─────────────────────────────────────────

    /// Authenticate, load all states and start the state-change pump.
    pub async fn connect(&self) -> Result<(), CoreError> {
        self.inner.connection_state.send_replace(ConnectionState::Connecting);

        let client = match self.open_session().await {
            Ok(client) => client,
            Err(e) => {
                self.inner.connection_state.send_replace(ConnectionState::Failed);
                return Err(e);
            }
        };

        *self.inner.client.lock().await = Some(client);
        self.inner.connection_state.send_replace(ConnectionState::Connected);
        info!(url = %self.inner.config.url, "connected to host");
        Ok(())
    }

    async fn open_session(&self) -> Result<WsClient, CoreError> {
        let config = &self.inner.config;
        let client = WsClient::connect(&config.url, &config.token, &config.transport()).await?;
        debug!(version = client.host_version().unwrap_or("unknown"), "host session open");

        // Subscribe before the initial load so no change slips between them.
        let events = client.events();
        let loaded = async {
            if config.live_states {
                client.subscribe_state_changes().await?;
            }
            client.get_states().await
        };
        match loaded.await {
            Ok(raw) => self.inner.store.replace_raw(raw),
            Err(e) => {
                client.close();
                return Err(e.into());
            }
        }

        if config.live_states {
            let pump = state_pump(
                client.clone(),
                events,
                Arc::clone(&self.inner.store),
                self.inner.connection_state.clone(),
                self.inner.cancel.clone(),
            );
            self.inner.task_handles.lock().await.push(tokio::spawn(pump));
        }
        Ok(client)
    }

    /// Cancel background tasks and close the session.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            if let Err(e) = handle.await {
                warn!(error = %e, "background task ended abnormally");
            }
        }

        if let Some(client) = self.inner.client.lock().await.take() {
            client.close();
        }
        self.inner.connection_state.send_replace(ConnectionState::Disconnected);
        debug!("disconnected");
    }

    async fn client(&self) -> Result<WsClient, CoreError> {
        self.inner.client.lock().await.clone().ok_or(CoreError::Disconnected)
    }

    // ── Views ────────────────────────────────────────────────────────

    /// Fetch the registry and synthesize a fresh dashboard.
    ///
    /// Each call takes the next generation number. The result is
    /// published to [`latest_view`](Self::latest_view) only if no newer
    /// call has started meanwhile; the caller always gets its own result.
    pub async fn generate_view(&self) -> Result<Arc<GeneratedView>, CoreError> {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let client = self.client().await?;

        let snapshot = fetch_snapshot(&client).await?;
        let items = strategy::partition(&snapshot, &self.inner.config.strategy)?;
        let view = strategy::assemble(&items);
        let generated = Arc::new(GeneratedView {
            generation,
            items,
            view,
        });

        self.publish(Arc::clone(&generated));
        Ok(generated)
    }

    fn publish(&self, generated: Arc<GeneratedView>) -> bool {
        let newest = self.inner.generation.load(Ordering::SeqCst);
        let published = self.inner.latest_view.send_if_modified(|slot| {
            let superseded = slot.as_ref().is_some_and(|cur| cur.generation >= generated.generation);
            if generated.generation != newest || superseded {
                return false;
            }
            *slot = Some(Arc::clone(&generated));
            true
        });
        if !published {
            debug!(generation = generated.generation, newest, "discarding stale view");
        }
        published
    }

    /// Most recently published view, if any.
    pub fn latest_view(&self) -> Option<Arc<GeneratedView>> {
        self.inner.latest_view.borrow().clone()
    }

    // ── States ───────────────────────────────────────────────────────

    pub fn states(&self) -> Arc<StateSnapshot> {
        self.inner.store.snapshot()
    }

    pub fn subscribe_states(&self) -> StateStream {
        self.inner.store.subscribe()
    }

    // ── Actions ──────────────────────────────────────────────────────

    /// Dispatcher bound to this host's service calls, plus the receiving
    /// end of its error surface.
    pub async fn dispatcher<D: DialogHost>(
        &self,
        dialogs: Arc<D>,
    ) -> Result<(Dispatcher<WsClient, D>, mpsc::UnboundedReceiver<CoreError>), CoreError> {
        let client = self.client().await?;
        Ok(Dispatcher::new(Arc::new(client), dialogs))
    }

    /// Log tail of one container through the `logs` service.
    pub async fn container_logs(&self, container_id: &str) -> Result<String, CoreError> {
        let client = self.client().await?;
        let service = DockerService::Logs.as_str();
        let response = client
            .call_service_with_response(DOMAIN, service, json!({ "id": container_id }))
            .await
            .map_err(|e| CoreError::ServiceCall {
                domain: DOMAIN.to_owned(),
                service: service.to_owned(),
                source: Box::new(e.into()),
            })?;
        Ok(logs_text(&response["logs"]))
    }

    /// Call a service directly, outside any dispatcher.
    pub async fn call_service(&self, domain: &str, service: &str, payload: Value) -> Result<Value, CoreError> {
        let client = self.client().await?;
        client
            .call_service(domain, service, payload)
            .await
            .map_err(|e| CoreError::ServiceCall {
                domain: domain.to_owned(),
                service: service.to_owned(),
                source: Box::new(e.into()),
            })
    }
}

/// The integration returns logs as one string or as a list of lines.
fn logs_text(logs: &Value) -> String {
    match logs {
        Value::String(text) => text.clone(),
        Value::Array(lines) => lines
            .iter()
            .map(|line| line.as_str().map_or_else(|| line.to_string(), str::to_owned))
            .collect::<Vec<_>>()
            .join("\n"),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ── Background tasks ─────────────────────────────────────────────────

/// Feed `state_changed` events into the store until cancelled or the
/// session closes. A lagged receiver triggers a full reload.
async fn state_pump(
    client: WsClient,
    mut events: broadcast::Receiver<Arc<dockboard_api::HostEvent>>,
    store: Arc<StateStore>,
    connection_state: watch::Sender<ConnectionState>,
    cancel: CancellationToken,
) {
    loop {
        let event = tokio::select! {
            () = cancel.cancelled() => break,
            () = client.closed() => {
                info!("host session closed");
                connection_state.send_replace(ConnectionState::Disconnected);
                break;
            }
            event = events.recv() => event,
        };
        match event {
            Ok(event) => {
                let Some(change) = event.state_changed() else {
                    continue;
                };
                if let Err(e) = store.apply_change(change) {
                    warn!(error = %e, "ignoring state change");
                }
            }
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                warn!(skipped, "state events lagged, reloading all states");
                match client.get_states().await {
                    Ok(raw) => store.replace_raw(raw),
                    Err(e) => warn!(error = %e, "state reload failed"),
                }
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
    debug!("state pump stopped");
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::logs_text;

    #[test]
    fn logs_accept_string_or_lines() {
        assert_eq!(logs_text(&json!("a\nb")), "a\nb");
        assert_eq!(logs_text(&json!(["a", "b"])), "a\nb");
        assert_eq!(logs_text(&json!(null)), "");
    }
}
