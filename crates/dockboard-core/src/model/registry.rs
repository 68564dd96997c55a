// ── Registry rows ──
//
// Immutable snapshot rows owned by the host. Fetched fresh on every
// synthesis; never cached across calls.

use serde::Serialize;
use strum::{AsRefStr, Display, EnumIter, EnumString};

use super::entity_id::EntityId;

/// The three resource categories the dashboard visualizes.
///
/// Parsed from a device's `model` tag, which must match exactly.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, AsRefStr, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ResourceKind {
    Container,
    Image,
    Volume,
}

/// One device from the host's device registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryDevice {
    pub id: String,
    pub name: String,
    pub model: Option<String>,
    /// `(namespace, key)` pairs in registration order.
    pub identifiers: Vec<(String, String)>,
}

impl RegistryDevice {
    /// Resource kind from the model tag; `None` for anything unrecognized.
    pub fn kind(&self) -> Option<ResourceKind> {
        self.model.as_deref()?.parse().ok()
    }

    pub fn has_model(&self, kind: ResourceKind) -> bool {
        self.model.as_deref() == Some(kind.as_ref())
    }

    /// Key half of the first identifier pair.
    pub fn primary_key(&self) -> Option<&str> {
        self.identifiers.first().map(|(_, key)| key.as_str())
    }
}

/// One entity from the host's entity registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryEntity {
    pub entity_id: EntityId,
    /// Back-reference to [`RegistryDevice::id`].
    pub device_id: Option<String>,
    pub name: Option<String>,
    pub original_name: Option<String>,
}

impl RegistryEntity {
    /// `name`, else `original_name`, else the entity id itself.
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.original_name.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or_else(|| self.entity_id.as_str())
    }
}

/// Both registry collections, as returned by one fetch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    pub devices: Vec<RegistryDevice>,
    pub entities: Vec<RegistryEntity>,
}
