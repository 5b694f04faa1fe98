pub mod controller;
pub mod settings;

pub use controller::{RestoreSummary, WorkspaceController};
pub use settings::ShellSettings;

use crate::dock::DockError;
use dash_widget::WidgetError;
use layout::LayoutError;
use store::StoreError;

#[derive(thiserror::Error, Debug)]
pub enum WorkspaceError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),
    #[error("widget error: {0}")]
    Widget(#[from] WidgetError),
    #[error("dock error: {0}")]
    Dock(#[from] DockError),
    #[error("unknown widget module '{0}'")]
    UnknownModule(String),
    #[error("no widget with id '{0}'")]
    UnknownWidget(String),
    #[error("no dashboard at index {0}")]
    NoSuchDashboard(usize),
    #[error("the last dashboard cannot be closed")]
    LastDashboard,
    #[error("title must not be blank")]
    BlankTitle,
}
