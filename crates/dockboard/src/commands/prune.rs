//! `prune`: the dashboard's confirmation-gated prune buttons.

use dockboard_core::{ActionDescriptor, Card, DashboardController, DashboardView, DockerService, HeadingAction};

use crate::cli::{GlobalOpts, PruneArgs, PruneTarget};
use crate::error::CliError;
use crate::output;

use super::util;

fn service(target: PruneTarget) -> DockerService {
    match target {
        PruneTarget::Containers => DockerService::PruneContainers,
        PruneTarget::Images => DockerService::PruneImages,
        PruneTarget::Volumes => DockerService::PruneVolumes,
    }
}

fn noun(target: PruneTarget) -> &'static str {
    match target {
        PruneTarget::Containers => "stopped containers",
        PruneTarget::Images => "unused images",
        PruneTarget::Volumes => "unused volumes",
    }
}

/// The heading button that calls `service`.
fn prune_action(view: &DashboardView, service: DockerService) -> Option<&ActionDescriptor> {
    view.cards()
        .flat_map(|card| match card {
            Card::Title { actions, .. } | Card::Heading { actions, .. } => actions.as_slice(),
            _ => &[][..],
        })
        .map(HeadingAction::action)
        .find(|action| {
            matches!(action, ActionDescriptor::ConfirmedServiceCall { service: s, .. } if s == service.as_str())
        })
}

pub async fn handle(controller: &DashboardController, args: PruneArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let generated = controller.generate_view().await?;
    let service = service(args.target);
    let action = prune_action(&generated.view, service)
        .cloned()
        .ok_or_else(|| CliError::ApiError {
            code: "internal".into(),
            message: format!("dashboard has no {service} action"),
        })?;

    let dialogs = util::run_action(controller, action, global.yes).await?;
    if dialogs.declined() > 0 {
        output::print_status("Cancelled", global.quiet);
    } else {
        output::print_success(&format!("Pruned {}", noun(args.target)), global.color(), global.quiet);
    }
    Ok(())
}
