//! Image and volume command handlers.

use serde::Serialize;
use tabled::Tabled;

use dockboard_core::{
    DashboardController, DashboardItem, GroupedGrid, ImageRow, ResourceGrid, ResourceKind, StateSnapshot, VolumeRow,
};

use crate::cli::{GlobalOpts, OutputFormat, ResourceArgs, ResourceCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Listing ─────────────────────────────────────────────────────────

/// One listed image or volume.
#[derive(Debug, Serialize)]
struct ResourceListing {
    id: String,
    name: String,
    in_use: bool,
    usage: &'static str,
    /// Image description, or volume mount point.
    detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<String>,
}

#[derive(Tabled)]
struct ResourceTableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Usage")]
    usage: &'static str,
    #[tabled(rename = "Detail")]
    detail: String,
    #[tabled(rename = "Entity")]
    id: String,
}

impl From<&ResourceListing> for ResourceTableRow {
    fn from(r: &ResourceListing) -> Self {
        let detail = match (&r.detail, &r.size) {
            (Some(detail), Some(size)) => format!("{detail} ({size})"),
            (Some(detail), None) => detail.clone(),
            (None, Some(size)) => size.clone(),
            (None, None) => String::new(),
        };
        Self {
            name: r.name.clone(),
            usage: r.usage,
            detail,
            id: r.id.clone(),
        }
    }
}

fn listing(kind: ResourceKind, item: &DashboardItem, states: &StateSnapshot) -> Option<ResourceListing> {
    match kind {
        ResourceKind::Image => ImageRow::from_item(item).view(states).map(|v| ResourceListing {
            id: v.id,
            name: v.name,
            in_use: v.in_use,
            usage: v.usage,
            detail: v.description,
            size: None,
        }),
        ResourceKind::Volume => VolumeRow::from_item(item).view(states).map(|v| ResourceListing {
            id: v.id,
            name: v.name,
            in_use: v.in_use,
            usage: v.usage,
            detail: v.mount,
            size: v.size,
        }),
        ResourceKind::Container => None,
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &DashboardController,
    kind: ResourceKind,
    args: ResourceArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let ResourceCommand::List(list) = args.command;

    let items = util::items(controller, global.quiet).await?;
    let states = controller.states();

    let mut grid = GroupedGrid::new(ResourceGrid::new(items.of_kind(kind).to_vec()));
    grid.set_show_inactive(list.all || global.show_inactive);

    let listed: Vec<ResourceListing> = grid
        .entries(&states)
        .iter()
        .flat_map(|entry| entry.items().iter().filter_map(|item| listing(kind, item, &states)))
        .collect();

    let out = output::render_list(global.output(), &listed, |r| ResourceTableRow::from(r), |r| r.id.clone())?;
    output::print_output(&out, global.quiet);

    let hidden = grid.hidden_count(&states);
    if hidden > 0 && global.output() == OutputFormat::Table {
        let note = format!("{hidden} unused {kind}(s) hidden, use --all to show");
        output::print_status(&output::paint_dim(&note, output::should_color(global.color())), global.quiet);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dockboard_core::{EntityId, StateObject};

    use super::*;

    fn volume() -> DashboardItem {
        DashboardItem {
            id: "binary_sensor.pg_data".into(),
            name: "pg_data".into(),
            entity_id: "binary_sensor.pg_data".parse().unwrap(),
        }
    }

    #[test]
    fn volume_listing_carries_mount_and_size() {
        let states: StateSnapshot = [(
            "binary_sensor.pg_data".parse::<EntityId>().unwrap(),
            StateObject::new("on")
                .with_attribute("mount", "/var/lib/docker/volumes/pg_data")
                .with_attribute("size", "1.2 GB"),
        )]
        .into_iter()
        .collect();

        let listed = listing(ResourceKind::Volume, &volume(), &states).unwrap();
        assert!(listed.in_use);

        let row = ResourceTableRow::from(&listed);
        assert_eq!(row.detail, "/var/lib/docker/volumes/pg_data (1.2 GB)");
        assert_eq!(row.usage, "In use");
    }

    #[test]
    fn resources_without_state_are_skipped() {
        assert!(listing(ResourceKind::Image, &volume(), &StateSnapshot::new()).is_none());
    }
}
