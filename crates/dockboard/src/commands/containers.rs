//! Container command handlers.

use std::io::{self, IsTerminal};

use tabled::Tabled;

use dockboard_core::services::{CONTAINER_LOGS_DIALOG, DOMAIN};
use dockboard_core::{
    ContainerGrid, ContainerRow, ContainerView, DashboardController, DashboardItem, DockerService, EntityNaming,
    GroupedGrid, StateSnapshot,
};

use crate::cli::{ContainersArgs, ContainersCommand, GlobalOpts, ListArgs};
use crate::dialogs;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct ContainerTableRow {
    #[tabled(rename = "Project")]
    project: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Ports")]
    ports: String,
    #[tabled(rename = "ID")]
    id: String,
}

impl From<&ContainerView> for ContainerTableRow {
    fn from(c: &ContainerView) -> Self {
        Self {
            project: c.project.clone().unwrap_or_else(|| "-".into()),
            name: c.name.clone(),
            state: c.state.clone(),
            status: c.status.clone().unwrap_or_default(),
            ports: c.ports.join(", "),
            id: c.short_id.clone().unwrap_or_else(|| c.id.clone()),
        }
    }
}

/// Projection of one listed container; items whose sensor has no state
/// yet are listed as unavailable.
fn project(item: &DashboardItem, naming: &EntityNaming, states: &StateSnapshot) -> ContainerView {
    ContainerRow::from_item(item, naming)
        .ok()
        .and_then(|row| row.view(states))
        .unwrap_or_else(|| ContainerView {
            id: item.id.clone(),
            name: item.name.clone(),
            short_id: None,
            state: "unavailable".into(),
            status: None,
            ports: Vec::new(),
            project: None,
            mounts: Vec::new(),
            running: false,
        })
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(controller: &DashboardController, args: ContainersArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ContainersCommand::List(list) => list_containers(controller, &list, global).await,

        ContainersCommand::Start { container } => {
            let row = resolve_row(controller, &container, global).await?;
            util::run_action(controller, row.start(), global.yes).await?;
            output::print_success(&format!("Started {}", row.name), global.color(), global.quiet);
            Ok(())
        }

        ContainersCommand::Stop { container } => {
            let row = resolve_row(controller, &container, global).await?;
            util::run_action(controller, row.stop(), global.yes).await?;
            output::print_success(&format!("Stopped {}", row.name), global.color(), global.quiet);
            Ok(())
        }

        ContainersCommand::Restart { container } => {
            let row = resolve_row(controller, &container, global).await?;
            util::run_action(controller, row.restart(), global.yes).await?;
            output::print_success(&format!("Restarted {}", row.name), global.color(), global.quiet);
            Ok(())
        }

        ContainersCommand::Remove { container } => {
            let row = resolve_row(controller, &container, global).await?;
            let dialogs = util::run_action(controller, row.remove(), global.yes).await?;
            if dialogs.declined() > 0 {
                output::print_status("Cancelled", global.quiet);
            } else {
                output::print_success(&format!("Removed {}", row.name), global.color(), global.quiet);
            }
            Ok(())
        }

        ContainersCommand::Logs { container } => {
            let row = resolve_row(controller, &container, global).await?;
            let dialogs = util::run_action(controller, row.logs(), global.yes).await?;
            for dialog in dialogs.take_opened() {
                if dialog.dialog_id != CONTAINER_LOGS_DIALOG {
                    continue;
                }
                let id = dialog
                    .params
                    .get("id")
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or(&row.container_id);
                let logs = controller.container_logs(id).await?;
                output::print_output(&logs, global.quiet);
            }
            Ok(())
        }

        ContainersCommand::Create(args) => {
            let interactive = io::stdin().is_terminal() && io::stderr().is_terminal();
            let request = dialogs::create_container_form(args, interactive)?;
            controller
                .call_service(DOMAIN, DockerService::Create.as_str(), request.to_payload()?)
                .await?;
            output::print_success(&format!("Created {}", request.name), global.color(), global.quiet);
            Ok(())
        }
    }
}

async fn resolve_row(controller: &DashboardController, identifier: &str, global: &GlobalOpts) -> Result<ContainerRow, CliError> {
    let items = util::items(controller, global.quiet).await?;
    let item = util::resolve_container(&items, identifier)?;
    Ok(ContainerRow::from_item(item, &controller.config().strategy.naming)?)
}

async fn list_containers(controller: &DashboardController, list: &ListArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let items = util::items(controller, global.quiet).await?;
    let naming = controller.config().strategy.naming.clone();
    let states = controller.states();

    let mut grid = GroupedGrid::new(ContainerGrid::new(items.containers, naming.clone()));
    grid.set_show_inactive(list.all || global.show_inactive);

    let listed: Vec<ContainerView> = grid
        .entries(&states)
        .iter()
        .flat_map(|entry| entry.items().iter().map(|item| project(item, &naming, &states)))
        .collect();

    let out = output::render_list(global.output(), &listed, |c| ContainerTableRow::from(c), |c| c.id.clone())?;
    output::print_output(&out, global.quiet);

    let hidden = grid.hidden_count(&states);
    if hidden > 0 && global.output() == crate::cli::OutputFormat::Table {
        let note = format!("{hidden} stopped container(s) hidden, use --all to show");
        output::print_status(&output::paint_dim(&note, output::should_color(global.color())), global.quiet);
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use dockboard_core::{EntityId, StateObject};

    use super::*;

    fn item() -> DashboardItem {
        DashboardItem {
            id: "c1".into(),
            name: "web".into(),
            entity_id: "sensor.docker_integration_containers_c1".parse().unwrap(),
        }
    }

    #[test]
    fn missing_state_lists_as_unavailable() {
        let view = project(&item(), &EntityNaming::default(), &StateSnapshot::new());
        assert_eq!(view.state, "unavailable");
        assert!(!view.running);
    }

    #[test]
    fn table_row_prefers_short_id() {
        let states: StateSnapshot = [(
            "sensor.docker_integration_containers_c1".parse::<EntityId>().unwrap(),
            StateObject::new("running")
                .with_attribute("sid", "3f2a9c")
                .with_attribute("ports", vec!["8080:80/tcp", "8443:443/tcp"]),
        )]
        .into_iter()
        .collect();

        let view = project(&item(), &EntityNaming::default(), &states);
        let row = ContainerTableRow::from(&view);

        assert_eq!(row.id, "3f2a9c");
        assert_eq!(row.ports, "8080:80/tcp, 8443:443/tcp");
        assert_eq!(row.project, "-");
        assert!(view.running);
    }
}
