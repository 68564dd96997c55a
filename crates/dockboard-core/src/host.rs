// ── Host capability adapters ──
//
// Binds the core's registry-query and service-call seams to the
// transport clients from dockboard-api.

use dockboard_api::{RestClient, WsClient};
use serde_json::Value;

use crate::action::ServiceCaller;
use crate::error::CoreError;
use crate::registry::{RegistryQuery, RegistryRequest};

impl RegistryQuery for WsClient {
    async fn query(&self, request: RegistryRequest) -> Result<Vec<Value>, CoreError> {
        let rows = match request {
            RegistryRequest::DeviceList => self.list_devices().await?,
            RegistryRequest::EntityList => self.list_entities().await?,
        };
        Ok(rows)
    }
}

impl ServiceCaller for WsClient {
    async fn call(&self, domain: &str, service: &str, payload: Value) -> Result<Value, CoreError> {
        Ok(self.call_service(domain, service, payload).await?)
    }
}

impl ServiceCaller for RestClient {
    async fn call(&self, domain: &str, service: &str, payload: Value) -> Result<Value, CoreError> {
        Ok(self.call_service(domain, service, &payload).await?)
    }
}
