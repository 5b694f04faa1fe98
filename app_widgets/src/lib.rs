//! Bundled dashboard widgets.
//!
//! Every widget here is the state model behind a dock; drawing it is the
//! host toolkit's concern.

pub mod calculator;
pub mod clock;
pub mod code_viewer;
pub mod custom_list;
pub mod markdown_viewer;
pub mod rest_api_table;
pub mod stock_market;
pub mod tree_list;
pub mod weather_forecast;
pub mod web_view;
pub mod wysiwyg_editor;

use dash_widget::ingest::{IngestEvent, IngestPayload};
use dash_widget::PluginRegistration;

/// Progress of data a widget waits on from the ingestion pool.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FetchStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Failed(String),
}

impl FetchStatus {
    pub fn label(&self) -> String {
        match self {
            FetchStatus::Idle => "idle".to_string(),
            FetchStatus::Loading => "loading...".to_string(),
            FetchStatus::Ready => "ready".to_string(),
            FetchStatus::Failed(err) => format!("failed: {err}"),
        }
    }
}

/// Returns the payload when `event` answers `source_id`, recording failures
/// in `status`.
pub(crate) fn accept_event<'a>(
    event: &'a IngestEvent,
    source_id: &str,
    status: &mut FetchStatus,
) -> Option<&'a IngestPayload> {
    if event.source_id != source_id {
        return None;
    }
    match &event.result {
        Ok(payload) => Some(payload),
        Err(err) => {
            *status = FetchStatus::Failed(err.clone());
            None
        }
    }
}

/// Bundled widgets in menu order.
pub fn register_plugins() -> Vec<PluginRegistration> {
    let mut plugins = vec![
        clock::register_plugin(),
        markdown_viewer::register_plugin(),
        rest_api_table::register_plugin(),
        custom_list::register_plugin(),
        web_view::register_plugin(),
        weather_forecast::register_plugin(),
        stock_market::register_plugin(),
        code_viewer::register_plugin(),
        wysiwyg_editor::register_plugin(),
    ];
    plugins.extend(calculator::register_plugins());
    plugins.push(tree_list::register_plugin());
    plugins
}
