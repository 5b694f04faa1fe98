pub mod dock;
pub mod engine;
pub mod naming;
pub mod plugin;
pub mod workspace;

pub use dock::{DockError, DockState, DockSurface, HeadlessSurface, SurfaceFactory};
pub use engine::{Dashboard, DashboardLayoutEngine, RestorePhase, RestoreReport, WidgetInstance};
pub use naming::WidgetInstanceNamer;
pub use plugin::{PluginDescriptor, PluginRegistry, PluginSource, RegistryError};
pub use workspace::{RestoreSummary, ShellSettings, WorkspaceController, WorkspaceError};
