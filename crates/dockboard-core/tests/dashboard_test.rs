#![allow(clippy::unwrap_used)]
// End-to-end tests for `DashboardController` against an in-process host.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use secrecy::SecretString;
use serde_json::{Map, Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use dockboard_core::{
    ConfirmPrompt, ConfirmResponder, ConnectionState, ContainerGrid, ContainerRow, CoreError, DashboardController,
    DialogHost, EntityNaming, GroupedGrid, HostConfig, ReactiveRow, RenderEntry,
};

// ── Fake host ───────────────────────────────────────────────────────

const TOKEN: &str = "long-lived-token";
const SWITCH: &str = "switch.docker_integration_containers_c1";
const SENSOR: &str = "sensor.docker_integration_containers_c1";

async fn send_json(ws: &mut WebSocketStream<TcpStream>, value: Value) {
    ws.send(Message::text(value.to_string())).await.unwrap();
}

async fn next_json(ws: &mut WebSocketStream<TcpStream>) -> Option<Value> {
    while let Some(Ok(msg)) = ws.next().await {
        if let Message::Text(text) = msg {
            return Some(serde_json::from_str(&text).unwrap());
        }
    }
    None
}

fn ok(id: u64, result: Value) -> Value {
    json!({ "id": id, "type": "result", "success": true, "result": result })
}

fn devices() -> Value {
    json!([
        { "id": "d1", "name": "web", "model": "container", "identifiers": [["docker_integration", "c1"]] },
        { "id": "d2", "name": "db", "model": "container", "identifiers": [["docker_integration", "c2"]] },
        { "id": "di", "name": "Images", "model": "image", "identifiers": [["docker_integration", "images"]] },
        { "id": "dv", "name": "Volumes", "model": "volume", "identifiers": [["docker_integration", "volumes"]] }
    ])
}

fn entities() -> Value {
    json!([
        { "entity_id": SWITCH, "device_id": "d1", "original_name": "web" },
        { "entity_id": SENSOR, "device_id": "d1", "original_name": "web" },
        { "entity_id": "binary_sensor.nginx_latest", "device_id": "di", "name": "nginx:latest" },
        { "entity_id": "binary_sensor.pg_data", "device_id": "dv", "original_name": "pg_data" }
    ])
}

fn states() -> Value {
    json!([
        { "entity_id": SWITCH, "state": "off", "attributes": {} },
        {
            "entity_id": SENSOR,
            "state": "exited",
            "attributes": { "sid": "3f2a9c", "status": "Exited (0)", "ports": [], "project": "blog" }
        },
        {
            "entity_id": "sensor.docker_integration_containers_c2",
            "state": "running",
            "attributes": { "sid": "9b1e44", "status": "Up 2 hours", "ports": ["5432:5432/tcp"], "project": "blog" }
        },
        { "entity_id": "switch.docker_integration_containers_c2", "state": "on", "attributes": {} },
        { "entity_id": "binary_sensor.nginx_latest", "state": "on", "attributes": { "description": "nginx:latest" } }
    ])
}

/// Serve one client. A `toggle` call flips the c1 switch on and pushes
/// the matching `state_changed` event; `remove` is rejected.
async fn serve(mut ws: WebSocketStream<TcpStream>) {
    send_json(&mut ws, json!({ "type": "auth_required", "ha_version": "2024.6.0" })).await;
    let auth = next_json(&mut ws).await.unwrap();
    if auth["access_token"] != TOKEN {
        send_json(&mut ws, json!({ "type": "auth_invalid", "message": "Invalid access token" })).await;
        return;
    }
    send_json(&mut ws, json!({ "type": "auth_ok", "ha_version": "2024.6.0" })).await;

    let mut subscription = None;
    while let Some(cmd) = next_json(&mut ws).await {
        let id = cmd["id"].as_u64().unwrap();
        match cmd["type"].as_str().unwrap() {
            "config/device_registry/list" => send_json(&mut ws, ok(id, devices())).await,
            "config/entity_registry/list" => send_json(&mut ws, ok(id, entities())).await,
            "get_states" => send_json(&mut ws, ok(id, states())).await,
            "subscribe_events" => {
                subscription = Some(id);
                send_json(&mut ws, ok(id, Value::Null)).await;
            }
            "call_service" if cmd["service"] == "remove" => {
                send_json(
                    &mut ws,
                    json!({
                        "id": id, "type": "result", "success": false,
                        "error": { "code": "home_assistant_error", "message": "Container is running" }
                    }),
                )
                .await;
            }
            "call_service" if cmd["return_response"] == true => {
                let logs = json!({ "context": {}, "response": { "logs": ["starting", "ready"] } });
                send_json(&mut ws, ok(id, logs)).await;
            }
            "call_service" => {
                send_json(&mut ws, ok(id, json!({ "context": {} }))).await;
                if let (Some(sub), "toggle") = (subscription, cmd["service"].as_str().unwrap()) {
                    send_json(
                        &mut ws,
                        json!({
                            "id": sub,
                            "type": "event",
                            "event": {
                                "event_type": "state_changed",
                                "data": {
                                    "entity_id": SWITCH,
                                    "old_state": { "entity_id": SWITCH, "state": "off" },
                                    "new_state": { "entity_id": SWITCH, "state": "on" }
                                }
                            }
                        }),
                    )
                    .await;
                }
            }
            _ => send_json(&mut ws, ok(id, Value::Null)).await,
        }
    }
}

async fn spawn_host() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let ws = tokio_tungstenite::accept_async(tcp).await.unwrap();
        serve(ws).await;
    });
    Url::parse(&format!("http://{addr}")).unwrap()
}

async fn connected() -> DashboardController {
    let url = spawn_host().await;
    let token: SecretString = TOKEN.to_string().into();
    let mut config = HostConfig::new(url, token);
    config.timeout = Duration::from_secs(2);

    let controller = DashboardController::new(config);
    controller.connect().await.unwrap();
    controller
}

/// Confirms every prompt and records what it was asked.
#[derive(Default)]
struct AlwaysConfirm {
    prompts: Mutex<Vec<ConfirmPrompt>>,
}

impl DialogHost for AlwaysConfirm {
    fn confirm(&self, prompt: ConfirmPrompt, responder: ConfirmResponder) {
        self.prompts.lock().unwrap().push(prompt);
        responder.confirm();
    }

    fn open(&self, _dialog_id: &str, _params: &Map<String, Value>) {}
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_generate_view_partitions_registry() {
    let controller = connected().await;

    let generated = controller.generate_view().await.unwrap();

    let containers: Vec<_> = generated.items.containers.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(containers, ["c1", "c2"]);
    assert_eq!(generated.items.images[0].name, "nginx:latest");
    assert_eq!(generated.items.volumes[0].name, "pg_data");
    assert_eq!(controller.latest_view().unwrap().generation, generated.generation);
    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Connected);

    controller.disconnect().await;
}

#[tokio::test]
async fn test_newest_generation_wins() {
    let controller = connected().await;

    let (first, second) = tokio::join!(controller.generate_view(), controller.generate_view());
    let (first, second) = (first.unwrap(), second.unwrap());

    assert!(second.generation > first.generation);
    assert_eq!(controller.latest_view().unwrap().generation, second.generation);

    controller.disconnect().await;
}

#[tokio::test]
async fn test_toggle_rerenders_tracking_row_only() {
    let controller = connected().await;
    let naming = EntityNaming::default();

    let web = ReactiveRow::new(ContainerRow::new("c1", "web", &naming).unwrap());
    let db = ReactiveRow::new(ContainerRow::new("c2", "db", &naming).unwrap());
    let mut states = controller.subscribe_states();

    assert!(web.update(states.latest()));
    assert!(db.update(states.latest()));
    assert!(!web.row().view(&states.latest()).unwrap().running);

    let (dispatcher, _errors) = controller.dispatcher(Arc::new(AlwaysConfirm::default())).await.unwrap();
    dispatcher.dispatch(web.row().toggle()).finished().await;

    let updated = tokio::time::timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = states.changed().await.unwrap();
            if snapshot.get(SWITCH).is_some_and(|s| s.is_on()) {
                return snapshot;
            }
        }
    })
    .await
    .unwrap();

    assert!(web.update(Arc::clone(&updated)));
    assert!(!db.update(Arc::clone(&updated)));
    assert!(web.row().view(&updated).unwrap().running);

    controller.disconnect().await;
}

#[tokio::test]
async fn test_rejected_service_reaches_error_surface() {
    let controller = connected().await;
    let dialogs = Arc::new(AlwaysConfirm::default());
    let row = ContainerRow::new("c1", "web", &EntityNaming::default()).unwrap();

    let (dispatcher, mut errors) = controller.dispatcher(Arc::clone(&dialogs)).await.unwrap();
    dispatcher.dispatch(row.remove()).finished().await;

    let err = errors.recv().await.unwrap();
    assert!(matches!(err, CoreError::ServiceCall { ref service, .. } if service == "remove"));
    assert!(err.to_string().contains("Container is running"));
    assert_eq!(dialogs.prompts.lock().unwrap()[0].title, "Remove container");

    controller.disconnect().await;
}

#[tokio::test]
async fn test_container_logs_joins_lines() {
    let controller = connected().await;

    let logs = controller.container_logs("c1").await.unwrap();

    assert_eq!(logs, "starting\nready");
    controller.disconnect().await;
}

#[tokio::test]
async fn test_grid_groups_live_states() {
    let controller = connected().await;
    let generated = controller.generate_view().await.unwrap();

    let mut grid = GroupedGrid::new(ContainerGrid::new(
        generated.items.containers.clone(),
        EntityNaming::default(),
    ));
    let states = controller.states();

    // c1 is stopped and hidden; c2 runs under project "blog"
    let entries = grid.entries(&states);
    assert_eq!(entries.len(), 1);
    assert!(matches!(&entries[0], RenderEntry::Group { key, items } if key == "blog" && items.len() == 1));

    grid.set_show_inactive(true);
    let entries = grid.entries(&states);
    assert!(matches!(&entries[0], RenderEntry::Group { items, .. } if items.len() == 2));

    controller.disconnect().await;
}

#[tokio::test]
async fn test_disconnect_stops_generation() {
    let controller = connected().await;
    controller.disconnect().await;

    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Disconnected);
    let err = controller.generate_view().await.unwrap_err();
    assert!(matches!(err, CoreError::Disconnected));
}

#[tokio::test]
async fn test_wrong_token_fails_connect() {
    let url = spawn_host().await;
    let controller = DashboardController::new(HostConfig::new(url, "nope".to_string().into()));

    let err = controller.connect().await.unwrap_err();

    assert!(matches!(err, CoreError::AuthenticationFailed { .. }));
    assert_eq!(*controller.connection_state().borrow(), ConnectionState::Failed);
}
