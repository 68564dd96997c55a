// ── Backend services and entity naming ──
//
// The Docker integration registers its services under one domain and
// names its per-container entities after the container's short id.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString, IntoStaticStr};

use crate::action::{ActionDescriptor, ServiceTarget};
use crate::error::CoreError;
use crate::model::EntityId;

/// Service domain of the Docker integration.
pub const DOMAIN: &str = "docker_integration";

/// Host-wide service domain (toggle, turn_on, ...).
pub const HOST_DOMAIN: &str = "homeassistant";

/// Dialog that collects a [`CreateContainerRequest`] and submits it itself.
pub const CREATE_CONTAINER_DIALOG: &str = "create-container";

/// Dialog that shows a container's log tail.
pub const CONTAINER_LOGS_DIALOG: &str = "container-logs";

/// Services exposed by the integration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum DockerService {
    Create,
    Start,
    Stop,
    Restart,
    Remove,
    Logs,
    PruneContainers,
    PruneImages,
    PruneVolumes,
}

impl DockerService {
    pub fn as_str(self) -> &'static str {
        self.into()
    }

    /// Immediate call targeting one container by id.
    pub fn for_container(self, container_id: &str) -> ActionDescriptor {
        ActionDescriptor::ServiceCall {
            domain: DOMAIN.into(),
            service: self.as_str().into(),
            target: ServiceTarget::Resource {
                id: container_id.into(),
            },
        }
    }

    /// Confirmation-gated call with the given prompt and payload.
    pub fn confirmed(self, title: &str, message: &str, args: Map<String, Value>) -> ActionDescriptor {
        ActionDescriptor::ConfirmedServiceCall {
            title: title.into(),
            message: message.into(),
            domain: DOMAIN.into(),
            service: self.as_str().into(),
            args,
        }
    }
}

// ── Entity naming ────────────────────────────────────────────────────

/// Entity id conventions of the integration.
///
/// Per container the integration registers
/// `switch.<integration>_containers_<id>` (running toggle),
/// `sensor.<integration>_containers_<id>` (status and attributes) and
/// `button.<integration>_containers_<id>_restart`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityNaming {
    pub integration: String,
}

impl Default for EntityNaming {
    fn default() -> Self {
        Self {
            integration: DOMAIN.into(),
        }
    }
}

impl EntityNaming {
    fn container_object(&self, container_id: &str) -> String {
        format!("{}_containers_{container_id}", self.integration)
    }

    pub fn container_switch(&self, container_id: &str) -> Result<EntityId, CoreError> {
        EntityId::new("switch", &self.container_object(container_id))
    }

    pub fn container_sensor(&self, container_id: &str) -> Result<EntityId, CoreError> {
        EntityId::new("sensor", &self.container_object(container_id))
    }

    pub fn container_restart_button(&self, container_id: &str) -> Result<EntityId, CoreError> {
        EntityId::new("button", &format!("{}_restart", self.container_object(container_id)))
    }
}

// ── Create container ─────────────────────────────────────────────────

/// Payload of the `create` service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateContainerRequest {
    pub image: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// `host:container[/proto]` mappings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<String>,
    /// `source:target[:mode]` bind or volume mounts.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<String>,
}

impl CreateContainerRequest {
    pub fn new(image: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Image and name are required; port mappings must name both sides.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.image.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "image is required".into(),
            });
        }
        if self.name.trim().is_empty() {
            return Err(CoreError::ValidationFailed {
                message: "container name is required".into(),
            });
        }
        if let Some(bad) = self.ports.iter().find(|p| !is_port_mapping(p)) {
            return Err(CoreError::ValidationFailed {
                message: format!("invalid port mapping \"{bad}\" (expected host:container)"),
            });
        }
        Ok(())
    }

    /// Validated JSON payload for the `create` service.
    pub fn to_payload(&self) -> Result<Value, CoreError> {
        self.validate()?;
        serde_json::to_value(self).map_err(|e| CoreError::Internal(format!("create payload: {e}")))
    }
}

fn is_port_mapping(raw: &str) -> bool {
    let mapping = raw.split_once('/').map_or(raw, |(ports, _proto)| ports);
    let Some((host, container)) = mapping.rsplit_once(':') else {
        return false;
    };
    !host.is_empty() && container.parse::<u16>().is_ok()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn service_names_are_snake_case() {
        assert_eq!(DockerService::PruneContainers.as_str(), "prune_containers");
        assert_eq!("restart".parse::<DockerService>().unwrap(), DockerService::Restart);
    }

    #[test]
    fn container_entity_names() {
        let naming = EntityNaming::default();
        assert_eq!(
            naming.container_switch("c1").unwrap().as_str(),
            "switch.docker_integration_containers_c1"
        );
        assert_eq!(
            naming.container_restart_button("c1").unwrap().as_str(),
            "button.docker_integration_containers_c1_restart"
        );
        assert!(naming.container_sensor("").is_ok());
        assert!(naming.container_sensor("a.b").is_err());
    }

    #[test]
    fn create_request_requires_image_and_name() {
        assert!(CreateContainerRequest::new("", "web").validate().is_err());
        assert!(CreateContainerRequest::new("nginx", " ").validate().is_err());
        assert!(CreateContainerRequest::new("nginx", "web").validate().is_ok());
    }

    #[test]
    fn create_request_checks_ports() {
        let mut request = CreateContainerRequest::new("nginx", "web");
        request.ports = vec!["8080:80".into(), "127.0.0.1:8443:443/tcp".into()];
        assert!(request.validate().is_ok());

        request.ports.push("80".into());
        assert!(request.validate().is_err());
    }

    #[test]
    fn create_payload_shape() {
        let mut request = CreateContainerRequest::new("nginx:latest", "web");
        request.ports = vec!["8080:80".into()];
        request.restart_policy = Some("unless-stopped".into());

        let payload = request.to_payload().unwrap();
        assert_eq!(payload["image"], "nginx:latest");
        assert_eq!(payload["ports"], json!(["8080:80"]));
        assert_eq!(payload["restart_policy"], "unless-stopped");
        assert!(payload.get("network").is_none());
    }

    #[test]
    fn unset_options_are_left_out_of_create_payload() {
        // The host rejects null for optional string fields.
        let payload = CreateContainerRequest::new("nginx", "web").to_payload().unwrap();
        assert_eq!(payload, json!({ "image": "nginx", "name": "web" }));
    }
}
