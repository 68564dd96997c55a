// ── Wire → domain conversion ──
//
// Translates dockboard-api's raw rows into canonical domain types.
// A single malformed row is skipped with a warning; the rest of the
// collection survives.

use chrono::{DateTime, Utc};
use dockboard_api::{RawDevice, RawEntity, RawState};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

use crate::error::CoreError;
use crate::model::{EntityId, RegistryDevice, RegistryEntity, StateObject};

impl From<RawDevice> for RegistryDevice {
    fn from(raw: RawDevice) -> Self {
        let name = raw
            .name_by_user
            .filter(|n| !n.is_empty())
            .or(raw.name)
            .unwrap_or_else(|| raw.id.clone());
        Self {
            id: raw.id,
            name,
            model: raw.model,
            identifiers: raw.identifiers,
        }
    }
}

impl TryFrom<RawEntity> for RegistryEntity {
    type Error = CoreError;

    fn try_from(raw: RawEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            entity_id: raw.entity_id.try_into()?,
            device_id: raw.device_id,
            name: raw.name,
            original_name: raw.original_name,
        })
    }
}

/// Split a host state into its id and domain state object.
pub(crate) fn state_entry(raw: RawState) -> Result<(EntityId, StateObject), CoreError> {
    let entity_id = EntityId::try_from(raw.entity_id)?;
    let state = StateObject {
        state: raw.state,
        attributes: raw.attributes,
        last_changed: raw.last_changed.as_deref().and_then(parse_timestamp),
    };
    Ok((entity_id, state))
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Decode raw JSON rows through `R` into domain type `T`, skipping
/// rows that fail either step.
pub(crate) fn decode_rows<R, T, F>(rows: Vec<Value>, what: &'static str, convert: F) -> Vec<T>
where
    R: DeserializeOwned,
    F: Fn(R) -> Result<T, CoreError>,
{
    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .filter_map(|row| {
            let raw = match serde_json::from_value::<R>(row) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!(what, error = %e, "skipping undecodable registry row");
                    return None;
                }
            };
            match convert(raw) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!(what, error = %e, "skipping invalid registry row");
                    None
                }
            }
        })
        .collect();

    if decoded.len() < total {
        tracing::debug!(what, total, kept = decoded.len(), "registry rows filtered");
    }
    decoded
}

/// Convert host states into domain pairs, dropping malformed ids.
pub(crate) fn states_from_raw(raw: Vec<RawState>) -> Vec<(EntityId, StateObject)> {
    raw.into_iter()
        .filter_map(|state| match state_entry(state) {
            Ok(pair) => Some(pair),
            Err(e) => {
                warn!(error = %e, "skipping state with invalid entity id");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn device_prefers_user_name() {
        let raw: RawDevice = serde_json::from_value(json!({
            "id": "d1",
            "name": "web-1",
            "name_by_user": "Web",
            "model": "container",
            "identifiers": [["docker_integration", "c1"]]
        }))
        .unwrap();
        let device = RegistryDevice::from(raw);
        assert_eq!(device.name, "Web");
        assert_eq!(device.primary_key(), Some("c1"));
    }

    #[test]
    fn invalid_rows_are_skipped() {
        let rows = vec![
            json!({ "entity_id": "binary_sensor.pg", "device_id": "v" }),
            json!({ "entity_id": "not-an-entity-id", "device_id": "v" }),
            json!({ "device_id": "v" }),
        ];
        let entities = decode_rows::<RawEntity, _, _>(rows, "entity", RegistryEntity::try_from);
        assert_eq!(entities.len(), 1);
        assert_eq!(entities[0].entity_id.as_str(), "binary_sensor.pg");
    }

    #[test]
    fn state_timestamp_is_parsed() {
        let raw = RawState {
            entity_id: "switch.web".into(),
            state: "on".into(),
            attributes: serde_json::Map::new(),
            last_changed: Some("2026-02-10T12:00:00+00:00".into()),
            last_updated: None,
        };
        let (id, state) = state_entry(raw).unwrap();
        assert_eq!(id.as_str(), "switch.web");
        assert!(state.last_changed.is_some());
    }
}
