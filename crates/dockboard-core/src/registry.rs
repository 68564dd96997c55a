// ── Registry snapshot fetcher ──
//
// Issues the device-list and entity-list reads concurrently and hands
// back both collections once both complete. Either failure fails the
// whole fetch; no partial snapshot is ever returned.

use std::future::Future;

use dockboard_api::{RawDevice, RawEntity};
use serde::Serialize;
use serde_json::Value;
use strum::{Display, IntoStaticStr};
use tracing::debug;

use crate::convert::decode_rows;
use crate::error::CoreError;
use crate::model::{RegistryDevice, RegistryEntity, RegistrySnapshot};

/// The two registry reads. Displays as the host command type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, IntoStaticStr)]
pub enum RegistryRequest {
    #[strum(serialize = "config/device_registry/list")]
    DeviceList,
    #[strum(serialize = "config/entity_registry/list")]
    EntityList,
}

/// Read access to the host registry.
///
/// Implementations must be idempotent and side-effect free. The core
/// adds no retry and no timeout on top.
pub trait RegistryQuery: Send + Sync {
    fn query(&self, request: RegistryRequest) -> impl Future<Output = Result<Vec<Value>, CoreError>> + Send;
}

/// Fetch a fresh registry snapshot.
pub async fn fetch_snapshot<Q: RegistryQuery>(registry: &Q) -> Result<RegistrySnapshot, CoreError> {
    let (devices, entities) = tokio::join!(
        registry.query(RegistryRequest::DeviceList),
        registry.query(RegistryRequest::EntityList),
    );

    let devices = devices.map_err(|e| fetch_failed(RegistryRequest::DeviceList, e))?;
    let entities = entities.map_err(|e| fetch_failed(RegistryRequest::EntityList, e))?;

    let snapshot = RegistrySnapshot {
        devices: decode_rows::<RawDevice, _, _>(devices, "device", |raw| Ok(RegistryDevice::from(raw))),
        entities: decode_rows::<RawEntity, _, _>(entities, "entity", RegistryEntity::try_from),
    };
    debug!(
        devices = snapshot.devices.len(),
        entities = snapshot.entities.len(),
        "registry snapshot fetched"
    );
    Ok(snapshot)
}

fn fetch_failed(request: RegistryRequest, source: CoreError) -> CoreError {
    CoreError::RegistryFetch {
        request,
        source: Box::new(source),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use super::*;

    struct FakeRegistry {
        devices: Result<Vec<Value>, ()>,
        entities: Result<Vec<Value>, ()>,
        calls: AtomicUsize,
    }

    impl RegistryQuery for FakeRegistry {
        async fn query(&self, request: RegistryRequest) -> Result<Vec<Value>, CoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let rows = match request {
                RegistryRequest::DeviceList => &self.devices,
                RegistryRequest::EntityList => &self.entities,
            };
            rows.clone().map_err(|()| CoreError::Timeout { timeout_secs: 30 })
        }
    }

    fn registry(devices: Result<Vec<Value>, ()>, entities: Result<Vec<Value>, ()>) -> FakeRegistry {
        FakeRegistry {
            devices,
            entities,
            calls: AtomicUsize::new(0),
        }
    }

    #[test]
    fn request_displays_as_command_type() {
        assert_eq!(RegistryRequest::DeviceList.to_string(), "config/device_registry/list");
        let raw: &'static str = RegistryRequest::EntityList.into();
        assert_eq!(raw, "config/entity_registry/list");
    }

    #[tokio::test]
    async fn fetches_both_collections() {
        let fake = registry(
            Ok(vec![json!({
                "id": "d1",
                "name": "web",
                "model": "container",
                "identifiers": [["docker", "c1"]]
            })]),
            Ok(vec![json!({ "entity_id": "sensor.x", "device_id": "d1", "name": "web" })]),
        );

        let snapshot = fetch_snapshot(&fake).await.unwrap();

        assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
        assert_eq!(snapshot.devices.len(), 1);
        assert_eq!(snapshot.entities[0].device_id.as_deref(), Some("d1"));
    }

    #[tokio::test]
    async fn entity_failure_fails_whole_fetch() {
        let fake = registry(Ok(Vec::new()), Err(()));

        let err = fetch_snapshot(&fake).await.unwrap_err();

        assert!(matches!(
            err,
            CoreError::RegistryFetch {
                request: RegistryRequest::EntityList,
                ..
            }
        ));
        // both reads were still issued
        assert_eq!(fake.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn device_failure_is_reported_first() {
        let fake = registry(Err(()), Err(()));
        let err = fetch_snapshot(&fake).await.unwrap_err();
        assert!(matches!(
            err,
            CoreError::RegistryFetch {
                request: RegistryRequest::DeviceList,
                ..
            }
        ));
    }
}
