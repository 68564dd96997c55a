//! `view`: the synthesized dashboard description.

use serde::Serialize;
use tabled::Tabled;

use dockboard_core::{Card, DashboardController, DashboardItem, DashboardView, HeadingAction, ResourceKind, Section};

use crate::cli::{GlobalOpts, ViewArgs};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Item listing ────────────────────────────────────────────────────

#[derive(Serialize)]
struct ItemListing<'a> {
    kind: ResourceKind,
    #[serde(flatten)]
    item: &'a DashboardItem,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Kind")]
    kind: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Entity")]
    entity: String,
}

impl From<&ItemListing<'_>> for ItemRow {
    fn from(l: &ItemListing<'_>) -> Self {
        Self {
            kind: l.kind.to_string(),
            id: l.item.id.clone(),
            name: l.item.name.clone(),
            entity: l.item.entity_id.to_string(),
        }
    }
}

// ── Card outline ────────────────────────────────────────────────────

fn action_labels(actions: &[HeadingAction]) -> String {
    actions
        .iter()
        .map(|HeadingAction::Button { name, .. }| format!("[{name}]"))
        .collect::<Vec<_>>()
        .join(" ")
}

fn outline(view: &DashboardView) -> String {
    let mut lines = Vec::new();
    for section in &view.sections {
        let Section::Grid { column_span, cards } = section;
        lines.push(format!("grid (span {column_span})"));
        for card in cards {
            lines.push(match card {
                Card::Title { heading, actions } | Card::Heading { heading, actions } => {
                    format!("  {heading}  {}", action_labels(actions)).trim_end().to_owned()
                }
                Card::Container { container_id, name } => format!("    {name} ({container_id})"),
                Card::Image { entity_id, name } | Card::Volume { entity_id, name } => {
                    format!("    {name} ({entity_id})")
                }
            });
        }
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(controller: &DashboardController, args: ViewArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let spinner = util::spinner("Reading registry", global.quiet);
    let generated = controller.generate_view().await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    let generated = generated?;

    let out = if args.items {
        let items = &generated.items;
        let listing: Vec<ItemListing<'_>> = [ResourceKind::Container, ResourceKind::Image, ResourceKind::Volume]
            .into_iter()
            .flat_map(|kind| items.of_kind(kind).iter().map(move |item| ItemListing { kind, item }))
            .collect();
        output::render_list(global.output(), &listing, |l| ItemRow::from(l), |l| l.item.id.clone())?
    } else {
        output::render_single(global.output(), &generated.view, outline, |v| {
            v.cards().count().to_string()
        })?
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
