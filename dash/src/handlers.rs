use crate::commands::Commands;
use crate::output::*;
use dash_core::WorkspaceController;
use layout::DockArea;
use std::path::Path;
use std::time::Duration;

pub fn handle_command(data_dir: &Path, command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    let mut workspace = WorkspaceController::open(data_dir)?;
    for warning in workspace.registry_mut().take_warnings() {
        print_warning(&warning);
    }

    let changed = match command {
        Commands::Widgets { json_query } => {
            if json_query {
                let list: Vec<serde_json::Value> = workspace
                    .registry()
                    .list()
                    .iter()
                    .map(|d| {
                        serde_json::json!({
                            "module_name": d.module_name,
                            "name": d.display_name,
                            "description": d.description,
                            "supports_multiple": d.supports_multiple,
                            "bundled": d.is_bundled(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&list)?);
            } else {
                print_widget_list(workspace.registry().list());
            }
            false
        }
        Commands::Show { json_query } => {
            if json_query {
                let snapshot = workspace.snapshot();
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            } else {
                print_dashboards(workspace.dashboards(), workspace.current_index());
            }
            false
        }
        Commands::Add {
            module,
            title,
            area,
            dashboard,
        } => {
            let area = match area.as_deref() {
                Some(name) => Some(
                    DockArea::parse(name).ok_or_else(|| format!("unknown dock area '{name}'"))?,
                ),
                None => None,
            };
            workspace.select_dashboard(dashboard.unwrap_or(0))?;
            let id = workspace.add_widget(&module, title.as_deref(), area)?;
            print_info(&format!("Added widget '{id}'"));
            true
        }
        Commands::Remove { id } => {
            workspace.remove_widget(&id)?;
            print_info(&format!("Removed widget '{id}'"));
            true
        }
        Commands::RenameWidget { id, title } => {
            let new_id = workspace.rename_widget(&id, &title)?;
            if new_id == id {
                print_info(&format!("Renamed widget '{id}'"));
            } else {
                print_info(&format!("Renamed widget '{id}' to '{new_id}'"));
            }
            true
        }
        Commands::Refresh { dashboard, wait_ms } => {
            workspace.select_dashboard(dashboard.unwrap_or(0))?;
            let refreshed = workspace.refresh_current();
            let mut delivered = 0;
            let deadline = Duration::from_millis(wait_ms);
            let started = std::time::Instant::now();
            while delivered < refreshed && started.elapsed() < deadline {
                delivered += workspace.wait_for_ingest(deadline.saturating_sub(started.elapsed()));
            }
            print_info(&format!(
                "Refreshed {refreshed} widget(s), {delivered} update(s) received"
            ));
            print_dashboards(workspace.dashboards(), workspace.current_index());
            true
        }
        Commands::NewDashboard { title } => {
            let index = workspace.add_dashboard(title.as_deref());
            print_info(&format!("Created dashboard [{index}]"));
            true
        }
        Commands::CloseDashboard { index } => {
            workspace.close_dashboard(index)?;
            print_info(&format!("Closed dashboard [{index}]"));
            true
        }
        Commands::RenameDashboard { index, title } => {
            workspace.rename_dashboard(index, &title)?;
            print_info(&format!("Renamed dashboard [{index}]"));
            true
        }
        Commands::Export { path } => {
            workspace.export_snapshot(&path)?;
            print_info(&format!("Exported workspace to {}", path.display()));
            false
        }
        Commands::Import { path } => {
            let summary = workspace.import_snapshot(&path)?;
            print_restore_warnings(&summary);
            print_info(&format!(
                "Imported {} dashboard(s) with {} widget(s)",
                summary.dashboards, summary.widgets
            ));
            true
        }
        Commands::Reset => {
            workspace.reset()?;
            print_info("Workspace reset");
            false
        }
    };

    if changed {
        workspace.save()?;
    }
    workspace.shutdown();
    Ok(())
}
