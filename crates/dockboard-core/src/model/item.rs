// ── Dashboard items ──

use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::registry::ResourceKind;

/// One displayable resource derived from the registry.
///
/// For containers `id` is the registry identifier key and `entity_id`
/// the container's status sensor; for images and volumes `id` equals
/// the entity id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardItem {
    pub id: String,
    pub name: String,
    pub entity_id: EntityId,
}

/// The three disjoint typed item lists, in registry order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardItems {
    pub containers: Vec<DashboardItem>,
    pub images: Vec<DashboardItem>,
    pub volumes: Vec<DashboardItem>,
}

impl DashboardItems {
    pub fn of_kind(&self, kind: ResourceKind) -> &[DashboardItem] {
        match kind {
            ResourceKind::Container => &self.containers,
            ResourceKind::Image => &self.images,
            ResourceKind::Volume => &self.volumes,
        }
    }

    pub fn total(&self) -> usize {
        self.containers.len() + self.images.len() + self.volumes.len()
    }
}
