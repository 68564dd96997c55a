//! `watch`: follow state changes and report the rows they affect.
//!
//! Every resource card of the dashboard becomes a `ReactiveRow`; a
//! snapshot only produces output for rows whose tracked entities changed.

use std::sync::Arc;

use chrono::{DateTime, Local};
use serde::Serialize;
use tracing::warn;

use dockboard_core::rows::rows_from_view;
use dockboard_core::{ConnectionState, CoreError, DashboardController, ReactiveRow, Row, StateSnapshot};

use crate::cli::{GlobalOpts, OutputFormat, WatchArgs};
use crate::error::CliError;
use crate::output;

/// One re-rendered row.
#[derive(Debug, Serialize)]
struct RowUpdate {
    at: DateTime<Local>,
    kind: &'static str,
    name: String,
    state: String,
    active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

fn summarize(row: &Row, states: &StateSnapshot, at: DateTime<Local>) -> RowUpdate {
    let (kind, state, active, detail) = match row {
        Row::Container(r) => match r.view(states) {
            Some(v) => ("container", v.state, v.running, v.status),
            None => ("container", "unavailable".into(), false, None),
        },
        Row::Image(r) => match r.view(states) {
            Some(v) => ("image", v.usage.into(), v.in_use, v.description),
            None => ("image", "unavailable".into(), false, None),
        },
        Row::Volume(r) => match r.view(states) {
            Some(v) => ("volume", v.usage.into(), v.in_use, v.mount),
            None => ("volume", "unavailable".into(), false, None),
        },
    };
    RowUpdate {
        at,
        kind,
        name: row.name().to_owned(),
        state,
        active,
        detail,
    }
}

fn render(update: &RowUpdate, format: OutputFormat, color: bool) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Plain => {
            let state = output::paint_state(&update.state, update.active, color);
            let line = format!(
                "{} {:<9} {:<28} {state}",
                output::paint_dim(&update.at.format("%H:%M:%S").to_string(), color),
                update.kind,
                update.name,
            );
            Ok(match &update.detail {
                Some(detail) => format!("{line}  {}", output::paint_dim(detail, color)),
                None => line,
            })
        }
        // One document per update so the stream stays parseable line by line.
        OutputFormat::Json | OutputFormat::JsonCompact => {
            serde_json::to_string(update).map_err(|e| CliError::Serialization(e.to_string()))
        }
        OutputFormat::Yaml => serde_yaml::to_string(update)
            .map(|doc| format!("---\n{}", doc.trim_end()))
            .map_err(|e| CliError::Serialization(e.to_string())),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(controller: &DashboardController, args: WatchArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let generated = controller.generate_view().await?;
    let naming = &controller.config().strategy.naming;

    let rows: Vec<ReactiveRow<Row>> = rows_from_view(&generated.view, naming)
        .into_iter()
        .filter_map(|row| match row {
            Ok(row) => Some(ReactiveRow::new(row)),
            Err(e) => {
                warn!(error = %e, "skipping card");
                None
            }
        })
        .collect();

    let mut states = controller.subscribe_states();
    let initial = states.latest();
    for row in &rows {
        row.update(Arc::clone(&initial));
    }

    let color = output::should_color(global.color());
    output::print_status(
        &format!("Watching {} rows, Ctrl-C to stop", rows.len()),
        global.quiet || global.output() != OutputFormat::Table,
    );

    let mut connection = controller.connection_state();
    let mut updates = 0usize;
    loop {
        let snapshot = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            lost = connection.wait_for(|s| *s == ConnectionState::Disconnected) => {
                if lost.is_ok() {
                    return Err(CoreError::Disconnected.into());
                }
                break;
            }
            snapshot = states.changed() => match snapshot {
                Some(snapshot) => snapshot,
                None => break,
            },
        };

        let at = Local::now();
        for row in &rows {
            if !row.update(Arc::clone(&snapshot)) {
                continue;
            }
            let update = summarize(row.row(), &snapshot, at);
            output::print_output(&render(&update, global.output(), color)?, global.quiet);

            updates += 1;
            if args.count.is_some_and(|limit| updates >= limit) {
                return Ok(());
            }
        }
    }
    Ok(())
}
