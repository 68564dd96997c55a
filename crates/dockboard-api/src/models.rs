// Wire models for the host's registry, state and event payloads.
//
// These mirror the JSON the host sends. Unknown fields are ignored so
// newer host versions keep deserializing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One row of `config/device_registry/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDevice {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub name_by_user: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub manufacturer: Option<String>,
    /// `(namespace, key)` pairs, in registration order.
    #[serde(default)]
    pub identifiers: Vec<(String, String)>,
    #[serde(default)]
    pub via_device_id: Option<String>,
}

/// One row of `config/entity_registry/list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEntity {
    pub entity_id: String,
    #[serde(default)]
    pub device_id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub original_name: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub disabled_by: Option<String>,
}

/// A live state object as returned by `get_states` or `/api/states`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawState {
    pub entity_id: String,
    pub state: String,
    #[serde(default)]
    pub attributes: Map<String, Value>,
    #[serde(default)]
    pub last_changed: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
}

/// Response of `GET /api/`.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiStatus {
    pub message: String,
}

/// An event pushed on a subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostEvent {
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub time_fired: Option<String>,
}

/// Payload of a `state_changed` event.
///
/// `new_state` is `None` when the entity was removed.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StateChanged {
    pub entity_id: String,
    #[serde(default)]
    pub old_state: Option<RawState>,
    #[serde(default)]
    pub new_state: Option<RawState>,
}

impl HostEvent {
    pub const STATE_CHANGED: &'static str = "state_changed";

    /// Decode the payload if this is a `state_changed` event.
    pub fn state_changed(&self) -> Option<StateChanged> {
        if self.event_type != Self::STATE_CHANGED {
            return None;
        }
        match serde_json::from_value(self.data.clone()) {
            Ok(change) => Some(change),
            Err(e) => {
                tracing::debug!(error = %e, "malformed state_changed payload");
                None
            }
        }
    }
}
