// ── Row behaviours ──
//
// One row per dashboard card. A row is configured from its card's
// config mapping, declares the entities it observes, and projects the
// current state snapshot into a plain view. Missing state never fails
// the row; it renders as absent.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::action::{ActionDescriptor, ServiceTarget};
use crate::error::CoreError;
use crate::model::{DashboardItem, EntityId, StateObject, StateSnapshot};
use crate::reactive::{TrackedKeySet, TrackedRow};
use crate::services::{CONTAINER_LOGS_DIALOG, DockerService, EntityNaming, HOST_DOMAIN};
use crate::view::{Card, DashboardView};

/// A card's configuration mapping as handed over by the host.
pub type CardConfig = Map<String, Value>;

/// Required non-empty string field of a card config.
fn required_field<'a>(config: &'a CardConfig, card: &str, field: &str) -> Result<&'a str, CoreError> {
    config
        .get(field)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| CoreError::Configuration {
            card: card.to_owned(),
            field: field.to_owned(),
        })
}

fn usage_label(in_use: bool) -> &'static str {
    if in_use { "In use" } else { "Not used" }
}

// ── Container ────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRow {
    pub container_id: String,
    pub name: String,
    switch: EntityId,
    sensor: EntityId,
    restart_button: EntityId,
}

/// Projection of a container row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContainerView {
    pub id: String,
    pub name: String,
    pub short_id: Option<String>,
    pub state: String,
    pub status: Option<String>,
    pub ports: Vec<String>,
    pub project: Option<String>,
    pub mounts: Vec<String>,
    pub running: bool,
}

impl ContainerRow {
    pub const CARD: &'static str = "docker-container-card";

    pub fn new(container_id: &str, name: &str, naming: &EntityNaming) -> Result<Self, CoreError> {
        Ok(Self {
            container_id: container_id.to_owned(),
            name: name.to_owned(),
            switch: naming.container_switch(container_id)?,
            sensor: naming.container_sensor(container_id)?,
            restart_button: naming.container_restart_button(container_id)?,
        })
    }

    pub fn from_config(config: &CardConfig, naming: &EntityNaming) -> Result<Self, CoreError> {
        let container_id = required_field(config, Self::CARD, "container_id")?;
        let name = required_field(config, Self::CARD, "name")?;
        Self::new(container_id, name, naming)
    }

    pub fn from_item(item: &DashboardItem, naming: &EntityNaming) -> Result<Self, CoreError> {
        Self::new(&item.id, &item.name, naming)
    }

    pub fn switch(&self) -> &EntityId {
        &self.switch
    }

    pub fn sensor(&self) -> &EntityId {
        &self.sensor
    }

    pub fn restart_button(&self) -> &EntityId {
        &self.restart_button
    }

    /// Current projection; `None` until the status sensor has a state.
    pub fn view(&self, states: &StateSnapshot) -> Option<ContainerView> {
        let sensor = states.get(&self.sensor)?;
        let running = states
            .get(&self.switch)
            .map_or(sensor.state == "running", |switch| switch.is_on());
        Some(ContainerView {
            id: self.container_id.clone(),
            name: self.name.clone(),
            short_id: sensor.attr_text("sid"),
            state: sensor.state.clone(),
            status: sensor.attr_text("status"),
            ports: sensor.attr_list("ports"),
            project: sensor.attr_text("project"),
            mounts: sensor.attr_list("mounts"),
            running,
        })
    }

    /// Flip the running switch.
    pub fn toggle(&self) -> ActionDescriptor {
        ActionDescriptor::ServiceCall {
            domain: HOST_DOMAIN.into(),
            service: "toggle".into(),
            target: ServiceTarget::Entity {
                entity_id: self.switch.clone(),
            },
        }
    }

    pub fn start(&self) -> ActionDescriptor {
        DockerService::Start.for_container(&self.container_id)
    }

    pub fn stop(&self) -> ActionDescriptor {
        DockerService::Stop.for_container(&self.container_id)
    }

    pub fn restart(&self) -> ActionDescriptor {
        DockerService::Restart.for_container(&self.container_id)
    }

    pub fn remove(&self) -> ActionDescriptor {
        let mut args = Map::new();
        args.insert("id".into(), Value::from(self.container_id.as_str()));
        DockerService::Remove.confirmed(
            "Remove container",
            &format!("Remove container \"{}\"? This cannot be undone.", self.name),
            args,
        )
    }

    pub fn logs(&self) -> ActionDescriptor {
        let mut params = Map::new();
        params.insert("id".into(), Value::from(self.container_id.as_str()));
        params.insert("name".into(), Value::from(self.name.as_str()));
        ActionDescriptor::DialogOpen {
            dialog_id: CONTAINER_LOGS_DIALOG.into(),
            params,
        }
    }
}

impl TrackedRow for ContainerRow {
    fn tracked_keys(&self) -> TrackedKeySet {
        [self.switch.clone(), self.sensor.clone()].into_iter().collect()
    }
}

// ── Image / volume ───────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRow {
    pub entity_id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub id: String,
    pub name: String,
    pub in_use: bool,
    pub usage: &'static str,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeRow {
    pub entity_id: EntityId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VolumeView {
    pub id: String,
    pub name: String,
    pub in_use: bool,
    pub usage: &'static str,
    pub mount: Option<String>,
    pub size: Option<String>,
}

/// Parse the `entity_id` and `name` fields shared by image and volume cards.
fn entity_card(config: &CardConfig, card: &str) -> Result<(EntityId, String), CoreError> {
    let entity_id = required_field(config, card, "entity_id")?.parse()?;
    let name = required_field(config, card, "name")?.to_owned();
    Ok((entity_id, name))
}

fn lookup<'a>(states: &'a StateSnapshot, entity_id: &EntityId) -> Option<&'a StateObject> {
    states.get(entity_id).map(AsRef::as_ref)
}

impl ImageRow {
    pub const CARD: &'static str = "docker-image-card";

    pub fn from_config(config: &CardConfig) -> Result<Self, CoreError> {
        let (entity_id, name) = entity_card(config, Self::CARD)?;
        Ok(Self { entity_id, name })
    }

    pub fn from_item(item: &DashboardItem) -> Self {
        Self {
            entity_id: item.entity_id.clone(),
            name: item.name.clone(),
        }
    }

    pub fn view(&self, states: &StateSnapshot) -> Option<ImageView> {
        let state = lookup(states, &self.entity_id)?;
        Some(ImageView {
            id: self.entity_id.to_string(),
            name: self.name.clone(),
            in_use: state.is_on(),
            usage: usage_label(state.is_on()),
            description: state.attr_text("description"),
        })
    }
}

impl VolumeRow {
    pub const CARD: &'static str = "docker-volume-card";

    pub fn from_config(config: &CardConfig) -> Result<Self, CoreError> {
        let (entity_id, name) = entity_card(config, Self::CARD)?;
        Ok(Self { entity_id, name })
    }

    pub fn from_item(item: &DashboardItem) -> Self {
        Self {
            entity_id: item.entity_id.clone(),
            name: item.name.clone(),
        }
    }

    pub fn view(&self, states: &StateSnapshot) -> Option<VolumeView> {
        let state = lookup(states, &self.entity_id)?;
        Some(VolumeView {
            id: self.entity_id.to_string(),
            name: self.name.clone(),
            in_use: state.is_on(),
            usage: usage_label(state.is_on()),
            mount: state.attr_text("mount"),
            size: state.attr_text("size"),
        })
    }
}

impl TrackedRow for ImageRow {
    fn tracked_keys(&self) -> TrackedKeySet {
        std::iter::once(self.entity_id.clone()).collect()
    }
}

impl TrackedRow for VolumeRow {
    fn tracked_keys(&self) -> TrackedKeySet {
        std::iter::once(self.entity_id.clone()).collect()
    }
}

// ── Dispatch by card type ────────────────────────────────────────────

/// Any configured resource row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Row {
    Container(ContainerRow),
    Image(ImageRow),
    Volume(VolumeRow),
}

impl Row {
    /// Build the row for a card config by its `type`.
    ///
    /// Heading cards and unknown types yield `Ok(None)`.
    pub fn from_card_config(config: &CardConfig, naming: &EntityNaming) -> Result<Option<Self>, CoreError> {
        let card_type = config.get("type").and_then(Value::as_str).unwrap_or_default();
        let card = card_type.strip_prefix("custom:").unwrap_or(card_type);
        let row = match card {
            ContainerRow::CARD => Self::Container(ContainerRow::from_config(config, naming)?),
            ImageRow::CARD => Self::Image(ImageRow::from_config(config)?),
            VolumeRow::CARD => Self::Volume(VolumeRow::from_config(config)?),
            _ => return Ok(None),
        };
        Ok(Some(row))
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Container(row) => &row.name,
            Self::Image(row) => &row.name,
            Self::Volume(row) => &row.name,
        }
    }
}

impl TrackedRow for Row {
    fn tracked_keys(&self) -> TrackedKeySet {
        match self {
            Self::Container(row) => row.tracked_keys(),
            Self::Image(row) => row.tracked_keys(),
            Self::Volume(row) => row.tracked_keys(),
        }
    }
}

/// Configure one row per resource card of a view.
///
/// Each card is configured on its own, so one bad card yields one
/// `Err` entry and its siblings are unaffected.
pub fn rows_from_view(view: &DashboardView, naming: &EntityNaming) -> Vec<Result<Row, CoreError>> {
    view.cards()
        .filter_map(|card| match card_config(card) {
            Ok(config) => Row::from_card_config(&config, naming).transpose(),
            Err(e) => Some(Err(e)),
        })
        .collect()
}

/// Card config for `card`, as a host would hand it to the row.
pub fn card_config(card: &Card) -> Result<CardConfig, CoreError> {
    match serde_json::to_value(card) {
        Ok(Value::Object(config)) => Ok(config),
        Ok(_) => Err(CoreError::Internal("card did not serialize to a mapping".into())),
        Err(e) => Err(CoreError::Internal(e.to_string())),
    }
}
