use super::settings::ShellSettings;
use super::WorkspaceError;
use crate::dock::{headless_factory, SurfaceFactory};
use crate::engine::{Dashboard, DashboardLayoutEngine, RestoreReport, WidgetInstance};
use crate::naming::WidgetInstanceNamer;
use crate::plugin::PluginRegistry;
use dash_widget::WidgetContext;
use ingest::{IngestHandle, IngestPool, SourceFetcher};
use layout::{DockArea, LayoutSnapshot, SNAPSHOT_KEY, SNAPSHOT_SCOPE};
use std::path::Path;
use std::sync::Arc;
use store::{JsonFileStore, KeyValueStore};

/// Outcome of [`WorkspaceController::restore`].
#[derive(Debug, Clone, Default)]
pub struct RestoreSummary {
    pub dashboards: usize,
    pub widgets: usize,
    /// Set when no saved dashboard could be used and a blank one was created.
    pub used_default: bool,
    pub reports: Vec<RestoreReport>,
    pub warnings: Vec<String>,
}

/// Owns every dashboard of the main window and persists them as one
/// snapshot.
pub struct WorkspaceController {
    registry: PluginRegistry,
    store: Arc<dyn KeyValueStore>,
    ingest: IngestHandle,
    pool: Option<IngestPool>,
    namer: WidgetInstanceNamer,
    dashboards: Vec<Dashboard>,
    current: usize,
    window_geometry: Vec<u8>,
    surface_factory: SurfaceFactory,
    settings: ShellSettings,
}

impl WorkspaceController {
    pub fn new(
        registry: PluginRegistry,
        store: Arc<dyn KeyValueStore>,
        settings: ShellSettings,
    ) -> Self {
        Self {
            registry,
            store,
            ingest: IngestHandle::disconnected(),
            pool: None,
            namer: WidgetInstanceNamer::new(),
            dashboards: Vec::new(),
            current: 0,
            window_geometry: Vec::new(),
            surface_factory: headless_factory(),
            settings,
        }
    }

    /// Controller for a data directory with the saved workspace restored.
    /// Widgets fetch local files and http urls through the ingest pool.
    pub fn open(data_dir: &Path) -> Result<Self, WorkspaceError> {
        std::fs::create_dir_all(data_dir)?;
        let settings = ShellSettings::load_or_create(data_dir);
        let store: Arc<dyn KeyValueStore> =
            Arc::new(JsonFileStore::open(settings.store_path(data_dir))?);

        let mut registry = PluginRegistry::with_bundled();
        registry.scan_manifest_dirs(&settings.resolved_plugin_dirs(data_dir));

        let fetcher = SourceFetcher::with_http(settings.http_timeout(), settings.retry_policy());
        let pool = IngestPool::new(Arc::new(fetcher), settings.ingest_workers);
        let mut controller = Self::new(registry, store, settings).with_ingest(pool);
        controller.restore()?;
        Ok(controller)
    }

    pub fn with_ingest(mut self, pool: IngestPool) -> Self {
        self.ingest = pool.handle();
        self.pool = Some(pool);
        self
    }

    pub fn with_surface_factory(mut self, factory: SurfaceFactory) -> Self {
        self.surface_factory = factory;
        self
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut PluginRegistry {
        &mut self.registry
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    pub fn settings(&self) -> &ShellSettings {
        &self.settings
    }

    pub fn dashboards(&self) -> &[Dashboard] {
        &self.dashboards
    }

    pub fn dashboard(&self, index: usize) -> Option<&Dashboard> {
        self.dashboards.get(index)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_dashboard(&self) -> Option<&Dashboard> {
        self.dashboards.get(self.current)
    }

    pub fn widget_count(&self) -> usize {
        self.dashboards.iter().map(Dashboard::len).sum()
    }

    /// Dashboard index and instance of a live widget.
    pub fn find_widget(&self, widget_id: &str) -> Option<(usize, &WidgetInstance)> {
        self.dashboards
            .iter()
            .enumerate()
            .find_map(|(index, dashboard)| dashboard.widget(widget_id).map(|w| (index, w)))
    }

    pub fn window_geometry(&self) -> &[u8] {
        &self.window_geometry
    }

    pub fn set_window_geometry(&mut self, geometry: &[u8]) {
        self.window_geometry = geometry.to_vec();
    }

    fn context(&self) -> WidgetContext {
        WidgetContext {
            store: Arc::clone(&self.store),
            ingest: self.ingest.clone(),
        }
    }

    fn new_dashboard(&self, title: &str) -> Dashboard {
        Dashboard::new(title, (self.surface_factory)())
    }

    /// Current arrangement, with every savable widget persisted first.
    pub fn snapshot(&mut self) -> LayoutSnapshot {
        let engine = DashboardLayoutEngine::new(&self.registry, self.settings.geometry_bounds);
        let dashboards = self
            .dashboards
            .iter_mut()
            .map(|dashboard| engine.capture(dashboard))
            .collect();
        let mut snapshot = LayoutSnapshot {
            dashboards,
            window_geometry: String::new(),
        };
        snapshot.set_window_geometry(&self.window_geometry);
        snapshot
    }

    pub fn save(&mut self) -> Result<(), WorkspaceError> {
        let snapshot = self.snapshot();
        let data = snapshot.to_json_bytes()?;
        self.store.set(SNAPSHOT_SCOPE, SNAPSHOT_KEY, &data)?;
        log::info!(
            "saved {} dashboard(s) with {} widget(s)",
            snapshot.dashboards.len(),
            snapshot.widget_count()
        );
        Ok(())
    }

    /// Replaces every dashboard with the saved workspace.
    ///
    /// A dashboard whose widgets all fail to restore keeps its tab, empty.
    /// When no saved dashboard restores, a single default one is created.
    /// Always leaves at least one dashboard, the first one selected.
    pub fn restore(&mut self) -> Result<RestoreSummary, WorkspaceError> {
        let mut summary = RestoreSummary::default();
        let saved = self.store.get(SNAPSHOT_SCOPE, SNAPSHOT_KEY)?;

        self.dashboards.clear();
        self.namer.clear();
        self.current = 0;

        let snapshot = match saved {
            None => None,
            Some(data) => match LayoutSnapshot::decode_lenient(&data) {
                Ok(decoded) => {
                    summary.warnings.extend(decoded.warnings);
                    Some(decoded.snapshot)
                }
                Err(err) => {
                    let warning = format!("saved workspace unreadable: {err}");
                    log::warn!("{warning}");
                    summary.warnings.push(warning);
                    None
                }
            },
        };

        let mut restored = 0;
        if let Some(snapshot) = snapshot {
            self.window_geometry = match snapshot.window_geometry_bytes() {
                Ok(geometry) => geometry,
                Err(err) => {
                    summary.warnings.push(format!("window geometry skipped: {err}"));
                    Vec::new()
                }
            };
            let context = self.context();
            for record in &snapshot.dashboards {
                let mut dashboard = self.new_dashboard(&record.title);
                let engine =
                    DashboardLayoutEngine::new(&self.registry, self.settings.geometry_bounds);
                let report = engine.restore(record, &mut dashboard, &mut self.namer, &context)?;
                if report.succeeded() {
                    restored += 1;
                } else {
                    let warning = format!(
                        "dashboard '{}' kept empty: none of its widgets could be restored",
                        record.title
                    );
                    log::warn!("{warning}");
                    summary.warnings.push(warning);
                }
                self.dashboards.push(dashboard);
                summary.reports.push(report);
            }
        }

        if restored == 0 {
            self.dashboards.clear();
            self.add_dashboard(None);
            self.current = 0;
            summary.used_default = true;
        }
        summary.dashboards = self.dashboards.len();
        summary.widgets = self.widget_count();
        log::info!(
            "workspace restored: {} dashboard(s), {} widget(s)",
            summary.dashboards,
            summary.widgets
        );
        Ok(summary)
    }

    /// Appends a dashboard and selects it; returns its index.
    pub fn add_dashboard(&mut self, title: Option<&str>) -> usize {
        let title = match title.map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Dashboard {}", self.dashboards.len() + 1),
        };
        let dashboard = self.new_dashboard(&title);
        self.dashboards.push(dashboard);
        self.current = self.dashboards.len() - 1;
        self.current
    }

    pub fn close_dashboard(&mut self, index: usize) -> Result<(), WorkspaceError> {
        if index >= self.dashboards.len() {
            return Err(WorkspaceError::NoSuchDashboard(index));
        }
        if self.dashboards.len() == 1 {
            return Err(WorkspaceError::LastDashboard);
        }
        let dashboard = self.dashboards.remove(index);
        for id in dashboard.widget_ids() {
            self.namer.release(&id);
        }
        if self.current >= self.dashboards.len() || self.current > index {
            self.current = self.current.saturating_sub(1);
        }
        log::info!("closed dashboard '{}'", dashboard.title());
        Ok(())
    }

    pub fn rename_dashboard(&mut self, index: usize, title: &str) -> Result<(), WorkspaceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(WorkspaceError::BlankTitle);
        }
        let dashboard = self
            .dashboards
            .get_mut(index)
            .ok_or(WorkspaceError::NoSuchDashboard(index))?;
        dashboard.set_title(title);
        Ok(())
    }

    pub fn select_dashboard(&mut self, index: usize) -> Result<(), WorkspaceError> {
        if index >= self.dashboards.len() {
            return Err(WorkspaceError::NoSuchDashboard(index));
        }
        self.current = index;
        Ok(())
    }

    /// Creates a widget in the current dashboard and returns its id.
    pub fn add_widget(
        &mut self,
        module_name: &str,
        title: Option<&str>,
        area: Option<DockArea>,
    ) -> Result<String, WorkspaceError> {
        if self.dashboards.is_empty() {
            self.add_dashboard(None);
        }
        let context = self.context();
        let descriptor = self
            .registry
            .resolve(module_name)
            .ok_or_else(|| WorkspaceError::UnknownModule(module_name.to_string()))?;

        let title = match title.map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => descriptor.title.clone(),
        };
        let id = self.namer.allocate(descriptor, Some(&title));
        let mut widget = match descriptor.construct(context, &id, &title) {
            Ok(widget) => widget,
            Err(err) => {
                self.namer.release(&id);
                return Err(err.into());
            }
        };
        if widget.capabilities().save_state {
            if let Err(err) = widget.save_state() {
                log::warn!("initial save of '{id}' failed: {err}");
            }
        }

        let instance = WidgetInstance {
            dock_name: WidgetInstance::dock_name_for(&id),
            id: id.clone(),
            kind: descriptor.module_name.clone(),
            widget,
        };
        let area = area.unwrap_or(self.settings.default_area);
        let dashboard = &mut self.dashboards[self.current];
        if let Err(err) = dashboard.insert(instance, area) {
            self.namer.release(&id);
            return Err(err.into());
        }
        log::info!("added widget '{id}' to '{}'", dashboard.title());
        Ok(id)
    }

    pub fn remove_widget(&mut self, widget_id: &str) -> Result<(), WorkspaceError> {
        let removed = self
            .dashboards
            .iter_mut()
            .find_map(|dashboard| dashboard.remove(widget_id))
            .ok_or_else(|| WorkspaceError::UnknownWidget(widget_id.to_string()))?;
        self.namer.release(&removed.id);
        log::info!("removed widget '{}'", removed.id);
        Ok(())
    }

    /// Retitles a widget; multi-instance widgets also move to a new id and
    /// carry their stored keys along. Returns the resulting id.
    ///
    /// The dock follows the id as `dock_{id}` unless that name belongs to
    /// another dock, in which case the old dock name is kept. Nothing changes
    /// when the dock rename or the store migration fails.
    pub fn rename_widget(&mut self, widget_id: &str, title: &str) -> Result<String, WorkspaceError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(WorkspaceError::BlankTitle);
        }
        let (index, kind, old_dock) = self
            .find_widget(widget_id)
            .map(|(index, instance)| (index, instance.kind.clone(), instance.dock_name.clone()))
            .ok_or_else(|| WorkspaceError::UnknownWidget(widget_id.to_string()))?;
        let descriptor = self
            .registry
            .resolve(&kind)
            .ok_or_else(|| WorkspaceError::UnknownModule(kind.clone()))?;

        let new_id = self.namer.preview_rename(descriptor, widget_id, title);
        let dashboard = &mut self.dashboards[index];
        if new_id == widget_id {
            if let Some(instance) = dashboard.widget_mut(widget_id) {
                instance.widget.rebind(widget_id, title);
            }
            return Ok(new_id);
        }

        let wanted_dock = WidgetInstance::dock_name_for(&new_id);
        let new_dock = if dashboard.surface().has_dock(&wanted_dock) {
            log::warn!("dock '{wanted_dock}' is taken, '{new_id}' keeps dock '{old_dock}'");
            old_dock.clone()
        } else {
            wanted_dock
        };
        if new_dock != old_dock {
            dashboard.surface_mut().rename_dock(&old_dock, &new_dock)?;
        }
        let moved = match store::migrate_scope(self.store.as_ref(), widget_id, &new_id) {
            Ok(moved) => moved,
            Err(err) => {
                if new_dock != old_dock {
                    let _ = dashboard.surface_mut().rename_dock(&new_dock, &old_dock);
                }
                return Err(err.into());
            }
        };

        self.namer.rename(descriptor, widget_id, title);
        let Some(instance) = dashboard.widget_mut(widget_id) else {
            return Err(WorkspaceError::UnknownWidget(widget_id.to_string()));
        };
        instance.id = new_id.clone();
        instance.dock_name = new_dock;
        instance.widget.rebind(&new_id, title);
        log::info!("renamed widget '{widget_id}' to '{new_id}' ({moved} key(s) moved)");
        Ok(new_id)
    }

    /// Refreshes every refreshable widget of the current dashboard.
    pub fn refresh_current(&mut self) -> usize {
        let Some(dashboard) = self.dashboards.get_mut(self.current) else {
            return 0;
        };
        let mut refreshed = 0;
        for instance in dashboard.widgets_mut() {
            if !instance.widget.capabilities().refresh {
                continue;
            }
            match instance.widget.refresh() {
                Ok(()) => refreshed += 1,
                Err(err) => log::warn!("refresh of '{}' failed: {err}", instance.id),
            }
        }
        refreshed
    }

    /// Hands queued ingestion results to their widgets. Results for widgets
    /// that no longer exist are dropped.
    pub fn pump_ingest(&mut self) -> usize {
        let Some(pool) = self.pool.as_ref() else {
            return 0;
        };
        let mut delivered = 0;
        for event in pool.drain() {
            let target = self
                .dashboards
                .iter_mut()
                .find_map(|dashboard| dashboard.widget_mut(&event.target));
            match target {
                Some(instance) => {
                    instance.widget.on_ingest(&event);
                    delivered += 1;
                }
                None => log::debug!(
                    "dropping '{}' result for missing widget '{}'",
                    event.source_id,
                    event.target
                ),
            }
        }
        delivered
    }

    /// Blocks up to `timeout` for ingestion results, then delivers them.
    pub fn wait_for_ingest(&mut self, timeout: std::time::Duration) -> usize {
        let first = match self.pool.as_ref() {
            Some(pool) => pool.recv_timeout(timeout),
            None => return 0,
        };
        let mut delivered = 0;
        if let Some(event) = first {
            if let Some(instance) = self
                .dashboards
                .iter_mut()
                .find_map(|dashboard| dashboard.widget_mut(&event.target))
            {
                instance.widget.on_ingest(&event);
                delivered += 1;
            }
        }
        delivered + self.pump_ingest()
    }

    pub fn export_snapshot(&mut self, path: &Path) -> Result<(), WorkspaceError> {
        let snapshot = self.snapshot();
        snapshot.save_to_file(path)?;
        log::info!("exported workspace to {}", path.display());
        Ok(())
    }

    /// Loads a snapshot file into the store and restores from it.
    pub fn import_snapshot(&mut self, path: &Path) -> Result<RestoreSummary, WorkspaceError> {
        let snapshot = LayoutSnapshot::load_from_file(path)?;
        self.store
            .set(SNAPSHOT_SCOPE, SNAPSHOT_KEY, &snapshot.to_json_bytes()?)?;
        log::info!("imported workspace from {}", path.display());
        self.restore()
    }

    /// Forgets the saved workspace and starts over with one blank dashboard.
    pub fn reset(&mut self) -> Result<(), WorkspaceError> {
        self.store.delete(SNAPSHOT_SCOPE, SNAPSHOT_KEY)?;
        self.restore()?;
        Ok(())
    }

    pub fn shutdown(mut self) {
        if let Some(pool) = self.pool.take() {
            pool.shutdown();
        }
    }
}
