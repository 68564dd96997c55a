//! Command dispatch: bridges CLI args -> controller -> output formatting.

pub mod config_cmd;
pub mod containers;
pub mod prune;
pub mod resources;
pub mod util;
pub mod view;
pub mod watch;

use dockboard_core::{DashboardController, ResourceKind};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a host-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, controller: &DashboardController, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::View(args) => view::handle(controller, args, global).await,
        Command::Containers(args) => containers::handle(controller, args, global).await,
        Command::Images(args) => resources::handle(controller, ResourceKind::Image, args, global).await,
        Command::Volumes(args) => resources::handle(controller, ResourceKind::Volume, args, global).await,
        Command::Prune(args) => prune::handle(controller, args, global).await,
        Command::Watch(args) => watch::handle(controller, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
