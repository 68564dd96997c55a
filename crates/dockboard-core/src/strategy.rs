// ── View synthesis ──
//
// Pure transformation from a registry snapshot to a dashboard
// description. Output depends only on the snapshot and the options;
// registry order is preserved throughout.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Map;
use strum::{Display, EnumString};
use tracing::{debug, warn};

use crate::action::ActionDescriptor;
use crate::error::CoreError;
use crate::model::{DashboardItem, DashboardItems, RegistrySnapshot, ResourceKind};
use crate::services::{CREATE_CONTAINER_DIALOG, DockerService, EntityNaming};
use crate::view::{Card, DashboardView, HeadingAction, Section};

/// Domain kept for entity-derived resources.
const RESOURCE_ENTITY_DOMAIN: &str = "binary_sensor";

/// What to do when no device carries the model an entity-derived
/// resource kind hangs off.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MissingModelPolicy {
    /// Render an empty section.
    #[default]
    Lenient,
    /// Fail synthesis with [`CoreError::MissingResourceModel`].
    Strict,
}

/// Knobs for [`partition`] and [`synthesize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrategyOptions {
    pub missing_models: MissingModelPolicy,
    /// Keep only `binary_sensor.*` entities for images and volumes.
    pub domain_filter: bool,
    pub naming: EntityNaming,
}

impl Default for StrategyOptions {
    fn default() -> Self {
        Self {
            missing_models: MissingModelPolicy::default(),
            domain_filter: true,
            naming: EntityNaming::default(),
        }
    }
}

// ── Partitioning ─────────────────────────────────────────────────────

/// Split a registry snapshot into the three typed item lists.
///
/// Rows with an unrecognized model are ignored. Containers come from
/// devices; images and volumes from the entities of every device that
/// carries the matching model.
pub fn partition(snapshot: &RegistrySnapshot, options: &StrategyOptions) -> Result<DashboardItems, CoreError> {
    let items = DashboardItems {
        containers: containers(snapshot, &options.naming),
        images: entity_items(snapshot, ResourceKind::Image, options)?,
        volumes: entity_items(snapshot, ResourceKind::Volume, options)?,
    };
    debug!(
        containers = items.containers.len(),
        images = items.images.len(),
        volumes = items.volumes.len(),
        "registry partitioned"
    );
    Ok(items)
}

fn containers(snapshot: &RegistrySnapshot, naming: &EntityNaming) -> Vec<DashboardItem> {
    snapshot
        .devices
        .iter()
        .filter(|device| device.has_model(ResourceKind::Container))
        .filter_map(|device| {
            let Some(key) = device.primary_key() else {
                debug!(device_id = %device.id, "container device without identifiers");
                return None;
            };
            match naming.container_sensor(key) {
                Ok(entity_id) => Some(DashboardItem {
                    id: key.to_owned(),
                    name: device.name.clone(),
                    entity_id,
                }),
                Err(e) => {
                    warn!(device_id = %device.id, error = %e, "skipping container");
                    None
                }
            }
        })
        .collect()
}

fn entity_items(
    snapshot: &RegistrySnapshot,
    kind: ResourceKind,
    options: &StrategyOptions,
) -> Result<Vec<DashboardItem>, CoreError> {
    let parents: HashSet<&str> = snapshot
        .devices
        .iter()
        .filter(|device| device.has_model(kind))
        .map(|device| device.id.as_str())
        .collect();

    if parents.is_empty() {
        return match options.missing_models {
            MissingModelPolicy::Lenient => {
                debug!(model = %kind, "no device for model, section left empty");
                Ok(Vec::new())
            }
            MissingModelPolicy::Strict => Err(CoreError::MissingResourceModel { model: kind }),
        };
    }

    Ok(snapshot
        .entities
        .iter()
        .filter(|entity| {
            entity
                .device_id
                .as_deref()
                .is_some_and(|device_id| parents.contains(device_id))
        })
        .filter(|entity| !options.domain_filter || entity.entity_id.has_domain(RESOURCE_ENTITY_DOMAIN))
        .map(|entity| DashboardItem {
            id: entity.entity_id.to_string(),
            name: entity.display_name().to_owned(),
            entity_id: entity.entity_id.clone(),
        })
        .collect())
}

// ── Assembly ─────────────────────────────────────────────────────────

/// Partition and assemble the full dashboard description.
pub fn synthesize(snapshot: &RegistrySnapshot, options: &StrategyOptions) -> Result<DashboardView, CoreError> {
    let items = partition(snapshot, options)?;
    Ok(assemble(&items))
}

/// Lay out already-partitioned items as one grid section.
pub fn assemble(items: &DashboardItems) -> DashboardView {
    let mut cards = Vec::with_capacity(items.total() + 3);

    cards.push(Card::Title {
        heading: "Containers".into(),
        actions: vec![
            HeadingAction::button(
                "Create Container",
                Some("mdi:plus"),
                ActionDescriptor::DialogOpen {
                    dialog_id: CREATE_CONTAINER_DIALOG.into(),
                    params: Map::new(),
                },
            ),
            HeadingAction::button(
                "Prune Containers",
                Some("mdi:delete-outline"),
                DockerService::PruneContainers.confirmed(
                    "Prune containers",
                    "Remove all stopped containers?",
                    Map::new(),
                ),
            ),
        ],
    });
    cards.extend(items.containers.iter().map(|it| Card::Container {
        container_id: it.id.clone(),
        name: it.name.clone(),
    }));

    cards.push(Card::Heading {
        heading: "Images".into(),
        actions: vec![HeadingAction::button(
            "Prune Images",
            None,
            DockerService::PruneImages.confirmed("Prune images", "Remove all unused images?", Map::new()),
        )],
    });
    cards.extend(items.images.iter().map(|it| Card::Image {
        entity_id: it.entity_id.to_string(),
        name: it.name.clone(),
    }));

    cards.push(Card::Heading {
        heading: "Volumes".into(),
        actions: vec![HeadingAction::button(
            "Prune Volumes",
            None,
            DockerService::PruneVolumes.confirmed("Prune volumes", "Remove all unused volumes?", Map::new()),
        )],
    });
    cards.extend(items.volumes.iter().map(|it| Card::Volume {
        entity_id: it.entity_id.to_string(),
        name: it.name.clone(),
    }));

    DashboardView {
        sections: vec![Section::grid(cards)],
    }
}
