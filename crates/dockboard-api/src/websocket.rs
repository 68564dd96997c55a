//! Authenticated command channel over the host WebSocket API.
//!
//! Connects to `/api/websocket`, completes the `auth_required` →
//! `auth` → `auth_ok` handshake, then multiplexes id-correlated commands
//! over one socket. Replies are routed back to the caller through
//! one-shot channels; subscription events fan out through a
//! [`tokio::sync::broadcast`] channel.
//!
//! # Example
//!
//! ```rust,ignore
//! use dockboard_api::{TransportConfig, WsClient};
//!
//! let client = WsClient::connect(url, &token, &TransportConfig::default()).await?;
//! let devices = client.list_devices().await?;
//! client.close();
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_tungstenite::tungstenite::{self, ClientRequestBuilder, Message};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::error::Error;
use crate::models::{HostEvent, RawState};
use crate::transport::TransportConfig;

// ── Channel capacity ─────────────────────────────────────────────────

const EVENT_CHANNEL_CAPACITY: usize = 1024;

type Reply = Result<Value, Error>;
type PendingMap = Mutex<HashMap<u64, oneshot::Sender<Reply>>>;

// ── Frames ───────────────────────────────────────────────────────────

/// Error object inside a failed `result` frame.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct CommandError {
    pub code: String,
    #[serde(default)]
    pub message: String,
}

/// Every frame type the host sends us.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub(crate) enum Frame {
    AuthRequired {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthOk {
        #[serde(default)]
        ha_version: Option<String>,
    },
    AuthInvalid {
        #[serde(default)]
        message: Option<String>,
    },
    Result {
        id: u64,
        success: bool,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<CommandError>,
    },
    Event {
        id: u64,
        event: HostEvent,
    },
    Pong {
        id: u64,
    },
}

/// Parse one text frame. Unknown or malformed frames are logged and dropped.
pub(crate) fn parse_frame(text: &str) -> Option<Frame> {
    match serde_json::from_str(text) {
        Ok(frame) => Some(frame),
        Err(e) => {
            tracing::debug!(error = %e, "unrecognized WebSocket frame");
            None
        }
    }
}

/// Turn a `result` frame into the caller's reply.
fn reply_from_result(success: bool, result: Value, error: Option<CommandError>) -> Reply {
    if success {
        return Ok(result);
    }
    let error = error.unwrap_or_else(|| CommandError {
        code: "unknown_error".into(),
        message: String::new(),
    });
    Err(Error::Command {
        code: error.code,
        message: error.message,
    })
}

/// Derive the WebSocket endpoint from the host base URL.
///
/// `http` maps to `ws`, `https` to `wss`; an existing `ws`/`wss` scheme is kept.
pub fn websocket_url(base: &Url) -> Result<Url, Error> {
    let scheme = match base.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(Error::WebSocketConnect(format!(
                "unsupported URL scheme: {other}"
            )));
        }
    };
    let rest = &base.as_str()[base.scheme().len()..];
    let root = format!("{scheme}{rest}");
    let root = root.trim_end_matches('/');
    Ok(Url::parse(&format!("{root}/api/websocket"))?)
}

// ── WsClient ─────────────────────────────────────────────────────────

struct Inner {
    outgoing: mpsc::UnboundedSender<Message>,
    pending: Arc<PendingMap>,
    events: broadcast::Sender<Arc<HostEvent>>,
    next_id: AtomicU64,
    timeout: Duration,
    cancel: CancellationToken,
    host_version: Option<String>,
}

/// An authenticated WebSocket session.
///
/// Cheaply cloneable; every clone shares the same socket. Call
/// [`close`](Self::close) to tear down the reader and writer tasks.
#[derive(Clone)]
pub struct WsClient {
    inner: Arc<Inner>,
}

impl WsClient {
    /// Connect, authenticate, and spawn the reader/writer tasks.
    pub async fn connect(base_url: &Url, token: &SecretString, transport: &TransportConfig) -> Result<Self, Error> {
        let ws_url = websocket_url(base_url)?;
        tracing::info!(url = %ws_url, "connecting to host WebSocket");

        let uri: tungstenite::http::Uri = ws_url
            .as_str()
            .parse()
            .map_err(|e: tungstenite::http::uri::InvalidUri| Error::WebSocketConnect(e.to_string()))?;
        let request = ClientRequestBuilder::new(uri);
        let connector = transport.websocket_connector()?;
        let timeout_secs = transport.timeout.as_secs();

        let connect = tokio_tungstenite::connect_async_tls_with_config(request, None, false, connector);
        let (stream, _response) = tokio::time::timeout(transport.timeout, connect)
            .await
            .map_err(|_| Error::Timeout { timeout_secs })?
            .map_err(|e| Error::WebSocketConnect(e.to_string()))?;

        let (mut write, mut read) = stream.split();

        let handshake = async {
            expect_auth_required(&mut read).await?;
            let auth = json!({ "type": "auth", "access_token": token.expose_secret() });
            write
                .send(Message::text(auth.to_string()))
                .await
                .map_err(|e| Error::WebSocketConnect(e.to_string()))?;
            await_auth_result(&mut read).await
        };
        let host_version = tokio::time::timeout(transport.timeout, handshake)
            .await
            .map_err(|_| Error::Timeout { timeout_secs })??;

        tracing::info!(version = host_version.as_deref().unwrap_or("unknown"), "WebSocket authenticated");

        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let pending: Arc<PendingMap> = Arc::new(Mutex::new(HashMap::new()));
        let cancel = CancellationToken::new();

        tokio::spawn(write_loop(write, outgoing_rx, cancel.clone()));
        tokio::spawn(read_loop(read, Arc::clone(&pending), events.clone(), cancel.clone()));

        Ok(Self {
            inner: Arc::new(Inner {
                outgoing,
                pending,
                events,
                next_id: AtomicU64::new(1),
                timeout: transport.timeout,
                cancel,
                host_version,
            }),
        })
    }

    /// Host version reported during the handshake.
    pub fn host_version(&self) -> Option<&str> {
        self.inner.host_version.as_deref()
    }

    /// Subscribe to events from every active subscription.
    pub fn events(&self) -> broadcast::Receiver<Arc<HostEvent>> {
        self.inner.events.subscribe()
    }

    /// Whether the session has been closed locally or by the host.
    pub fn is_closed(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Resolves once the session is closed.
    pub async fn closed(&self) {
        self.inner.cancel.cancelled().await;
    }

    /// Stop the background tasks. Outstanding requests fail with
    /// [`Error::ConnectionClosed`].
    pub fn close(&self) {
        self.inner.cancel.cancel();
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// `config/device_registry/list`
    pub async fn list_devices(&self) -> Result<Vec<Value>, Error> {
        self.command_rows("config/device_registry/list").await
    }

    /// `config/entity_registry/list`
    pub async fn list_entities(&self) -> Result<Vec<Value>, Error> {
        self.command_rows("config/entity_registry/list").await
    }

    /// `get_states`
    pub async fn get_states(&self) -> Result<Vec<RawState>, Error> {
        let value = self.request(json!({ "type": "get_states" })).await?;
        decode(value)
    }

    /// `call_service`
    pub async fn call_service(&self, domain: &str, service: &str, service_data: Value) -> Result<Value, Error> {
        self.request(json!({
            "type": "call_service",
            "domain": domain,
            "service": service,
            "service_data": service_data,
        }))
        .await
    }

    /// `call_service` with `return_response`, for services that reply
    /// with data. Returns the `response` member of the result.
    pub async fn call_service_with_response(
        &self,
        domain: &str,
        service: &str,
        service_data: Value,
    ) -> Result<Value, Error> {
        let mut result = self
            .request(json!({
                "type": "call_service",
                "domain": domain,
                "service": service,
                "service_data": service_data,
                "return_response": true,
            }))
            .await?;
        Ok(result.get_mut("response").map(Value::take).unwrap_or_default())
    }

    /// `subscribe_events` for one event type. Returns the subscription id;
    /// matching events arrive on [`events`](Self::events).
    pub async fn subscribe_events(&self, event_type: &str) -> Result<u64, Error> {
        let (id, reply) = self
            .send_command(json!({ "type": "subscribe_events", "event_type": event_type }))?;
        self.await_reply(id, reply).await?;
        Ok(id)
    }

    /// Subscribe to `state_changed`.
    pub async fn subscribe_state_changes(&self) -> Result<u64, Error> {
        self.subscribe_events(HostEvent::STATE_CHANGED).await
    }

    /// Send one command and wait for its `result` frame.
    pub async fn request(&self, command: Value) -> Result<Value, Error> {
        let (id, reply) = self.send_command(command)?;
        self.await_reply(id, reply).await
    }

    async fn command_rows(&self, command_type: &str) -> Result<Vec<Value>, Error> {
        let value = self.request(json!({ "type": command_type })).await?;
        decode(value)
    }

    fn send_command(&self, mut command: Value) -> Result<(u64, oneshot::Receiver<Reply>), Error> {
        if self.is_closed() {
            return Err(Error::ConnectionClosed);
        }

        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        if let Value::Object(map) = &mut command {
            map.insert("id".into(), Value::from(id));
        }

        let (tx, rx) = oneshot::channel();
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, tx);

        tracing::trace!(id, "sending command");
        if self.inner.outgoing.send(Message::text(command.to_string())).is_err() {
            self.forget(id);
            return Err(Error::ConnectionClosed);
        }
        Ok((id, rx))
    }

    async fn await_reply(&self, id: u64, reply: oneshot::Receiver<Reply>) -> Result<Value, Error> {
        match tokio::time::timeout(self.inner.timeout, reply).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) => Err(Error::ConnectionClosed),
            Err(_) => {
                self.forget(id);
                Err(Error::Timeout {
                    timeout_secs: self.inner.timeout.as_secs(),
                })
            }
        }
    }

    fn forget(&self, id: u64) {
        self.inner
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_json::from_value(value.clone()).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body: value.to_string(),
    })
}

// ── Handshake ────────────────────────────────────────────────────────

async fn next_frame<S>(read: &mut S) -> Result<Frame, Error>
where
    S: futures_util::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        match read.next().await {
            Some(Ok(Message::Text(text))) => {
                if let Some(frame) = parse_frame(&text) {
                    return Ok(frame);
                }
            }
            Some(Ok(Message::Close(frame))) => {
                let (code, reason) = frame
                    .map(|f| (u16::from(f.code), f.reason.to_string()))
                    .unwrap_or((1005, String::new()));
                return Err(Error::WebSocketClosed { code, reason });
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(Error::WebSocketConnect(e.to_string())),
            None => return Err(Error::ConnectionClosed),
        }
    }
}

async fn expect_auth_required<S>(read: &mut S) -> Result<(), Error>
where
    S: futures_util::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    match next_frame(read).await? {
        Frame::AuthRequired { ha_version } => {
            tracing::debug!(version = ha_version.as_deref().unwrap_or("unknown"), "host requested auth");
            Ok(())
        }
        other => Err(Error::UnexpectedFrame(format!("{other:?}"))),
    }
}

async fn await_auth_result<S>(read: &mut S) -> Result<Option<String>, Error>
where
    S: futures_util::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    match next_frame(read).await? {
        Frame::AuthOk { ha_version } => Ok(ha_version),
        Frame::AuthInvalid { message } => Err(Error::Authentication {
            message: message.unwrap_or_else(|| "invalid access token".into()),
        }),
        other => Err(Error::UnexpectedFrame(format!("{other:?}"))),
    }
}

// ── Background tasks ─────────────────────────────────────────────────

async fn write_loop<S>(mut write: S, mut outgoing: mpsc::UnboundedReceiver<Message>, cancel: CancellationToken)
where
    S: futures_util::Sink<Message, Error = tungstenite::Error> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                break;
            }
            msg = outgoing.recv() => {
                let Some(msg) = msg else { break };
                if let Err(e) = write.send(msg).await {
                    tracing::warn!(error = %e, "WebSocket write failed");
                    cancel.cancel();
                    break;
                }
            }
        }
    }
    tracing::debug!("WebSocket writer exiting");
}

async fn read_loop<S>(
    mut read: S,
    pending: Arc<PendingMap>,
    events: broadcast::Sender<Arc<HostEvent>>,
    cancel: CancellationToken,
) where
    S: futures_util::Stream<Item = Result<Message, tungstenite::Error>> + Unpin,
{
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            frame = read.next() => {
                match frame {
                    Some(Ok(Message::Text(text))) => {
                        if let Some(frame) = parse_frame(&text) {
                            route_frame(frame, &pending, &events);
                        }
                    }
                    Some(Ok(Message::Close(frame))) => {
                        if let Some(ref cf) = frame {
                            tracing::info!(code = %cf.code, reason = %cf.reason, "WebSocket closed by host");
                        }
                        break;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::warn!(error = %e, "WebSocket read failed");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    cancel.cancel();
    // Dropping the senders wakes every waiter with ConnectionClosed.
    pending.lock().unwrap_or_else(PoisonError::into_inner).clear();
    tracing::debug!("WebSocket reader exiting");
}

fn route_frame(frame: Frame, pending: &PendingMap, events: &broadcast::Sender<Arc<HostEvent>>) {
    match frame {
        Frame::Result {
            id,
            success,
            result,
            error,
        } => {
            let waiter = pending.lock().unwrap_or_else(PoisonError::into_inner).remove(&id);
            match waiter {
                Some(tx) => {
                    let _ = tx.send(reply_from_result(success, result, error));
                }
                None => tracing::debug!(id, "reply for unknown or expired request"),
            }
        }
        Frame::Event { id, event } => {
            tracing::trace!(id, event_type = %event.event_type, "event");
            // No receivers is fine.
            let _ = events.send(Arc::new(event));
        }
        Frame::Pong { id } => tracing::trace!(id, "pong"),
        other => tracing::debug!(frame = ?other, "unexpected frame after handshake"),
    }
}

// ── Tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn parse_result_frame() {
        let frame = parse_frame(r#"{"id":3,"type":"result","success":true,"result":[{"id":"d1"}]}"#).unwrap();
        assert_eq!(
            frame,
            Frame::Result {
                id: 3,
                success: true,
                result: json!([{ "id": "d1" }]),
                error: None,
            }
        );
    }

    #[test]
    fn parse_failed_result_into_command_error() {
        let Some(Frame::Result {
            success,
            result,
            error,
            ..
        }) = parse_frame(
            r#"{"id":4,"type":"result","success":false,"error":{"code":"not_found","message":"Service not found."}}"#,
        )
        else {
            panic!("expected result frame");
        };
        let err = reply_from_result(success, result, error).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn parse_event_frame() {
        let frame = parse_frame(
            r#"{"id":2,"type":"event","event":{"event_type":"state_changed","data":{"entity_id":"switch.web"}}}"#,
        )
        .unwrap();
        let Frame::Event { id, event } = frame else {
            panic!("expected event frame");
        };
        assert_eq!(id, 2);
        assert_eq!(event.event_type, "state_changed");
    }

    #[test]
    fn parse_auth_frames() {
        assert_eq!(
            parse_frame(r#"{"type":"auth_required","ha_version":"2024.6.0"}"#),
            Some(Frame::AuthRequired {
                ha_version: Some("2024.6.0".into())
            })
        );
        assert_eq!(
            parse_frame(r#"{"type":"auth_invalid","message":"Invalid password"}"#),
            Some(Frame::AuthInvalid {
                message: Some("Invalid password".into())
            })
        );
    }

    #[test]
    fn malformed_frames_are_dropped() {
        assert!(parse_frame("not json at all").is_none());
        assert!(parse_frame(r#"{"type":"mystery"}"#).is_none());
    }

    #[test]
    fn websocket_url_maps_schemes() {
        let http = Url::parse("http://ha.local:8123").unwrap();
        assert_eq!(websocket_url(&http).unwrap().as_str(), "ws://ha.local:8123/api/websocket");

        let https = Url::parse("https://ha.example.com/").unwrap();
        assert_eq!(
            websocket_url(&https).unwrap().as_str(),
            "wss://ha.example.com/api/websocket"
        );

        let ftp = Url::parse("ftp://ha.local").unwrap();
        assert!(websocket_url(&ftp).is_err());
    }

    #[test]
    fn route_result_wakes_waiter() {
        let pending: PendingMap = Mutex::new(HashMap::new());
        let (events, _) = broadcast::channel(4);
        let (tx, mut rx) = oneshot::channel();
        pending.lock().unwrap().insert(7, tx);

        route_frame(
            Frame::Result {
                id: 7,
                success: true,
                result: json!("ok"),
                error: None,
            },
            &pending,
            &events,
        );

        assert_eq!(rx.try_recv().unwrap().unwrap(), json!("ok"));
        assert!(pending.lock().unwrap().is_empty());
    }
}
