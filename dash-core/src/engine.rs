use crate::dock::{DockError, DockSurface};
use crate::naming::WidgetInstanceNamer;
use crate::plugin::PluginRegistry;
use dash_widget::{Widget, WidgetContext, STATE_KEY};
use layout::{DashboardRecord, DockArea, Geometry, GeometryBounds, WidgetRecord};
use std::collections::HashMap;
use store::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    Empty,
    WidgetsCreating,
    WidgetsCreated,
    GeometryApplied,
    VisibilityReconciled,
    Done,
}

/// A live widget and the dock hosting it.
pub struct WidgetInstance {
    pub id: String,
    pub kind: String,
    pub dock_name: String,
    pub widget: Box<dyn Widget>,
}

impl WidgetInstance {
    pub fn dock_name_for(id: &str) -> String {
        format!("dock_{id}")
    }
}

impl std::fmt::Debug for WidgetInstance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetInstance")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("dock_name", &self.dock_name)
            .finish()
    }
}

/// One tab: a dock surface plus the widgets docked in it.
pub struct Dashboard {
    title: String,
    surface: Box<dyn DockSurface>,
    widgets: Vec<WidgetInstance>,
}

impl Dashboard {
    pub fn new(title: impl Into<String>, surface: Box<dyn DockSurface>) -> Self {
        Self {
            title: title.into(),
            surface,
            widgets: Vec::new(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    pub fn surface(&self) -> &dyn DockSurface {
        self.surface.as_ref()
    }

    pub fn surface_mut(&mut self) -> &mut dyn DockSurface {
        self.surface.as_mut()
    }

    pub fn widgets(&self) -> &[WidgetInstance] {
        &self.widgets
    }

    pub fn widgets_mut(&mut self) -> &mut [WidgetInstance] {
        &mut self.widgets
    }

    pub fn widget_ids(&self) -> Vec<String> {
        self.widgets.iter().map(|w| w.id.clone()).collect()
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetInstance> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut WidgetInstance> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// Docks `instance` at `area`; the instance is dropped if the dock
    /// cannot be created.
    pub fn insert(&mut self, instance: WidgetInstance, area: DockArea) -> Result<(), DockError> {
        self.surface.add_dock(&instance.dock_name, area)?;
        if area == DockArea::Floating {
            self.surface.set_floating(&instance.dock_name, true)?;
        }
        self.widgets.push(instance);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<WidgetInstance> {
        let pos = self.widgets.iter().position(|w| w.id == id)?;
        let instance = self.widgets.remove(pos);
        self.surface.remove_dock(&instance.dock_name);
        Some(instance)
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("title", &self.title)
            .field("widgets", &self.widgets)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RestoreReport {
    pub phase: RestorePhase,
    pub restored: usize,
    /// Ids of saved widgets that could not be brought back.
    pub skipped: Vec<String>,
    pub warnings: Vec<String>,
}

impl RestoreReport {
    fn new() -> Self {
        Self {
            phase: RestorePhase::Empty,
            restored: 0,
            skipped: Vec::new(),
            warnings: Vec::new(),
        }
    }

    fn skip(&mut self, id: &str, warning: String) {
        log::warn!("{warning}");
        self.skipped.push(id.to_string());
        self.warnings.push(warning);
    }

    fn warn(&mut self, warning: String) {
        log::warn!("{warning}");
        self.warnings.push(warning);
    }

    /// A dashboard that had widgets but restored none counts as failed.
    pub fn succeeded(&self) -> bool {
        self.restored > 0 || self.skipped.is_empty()
    }
}

struct Placement {
    dock_name: String,
    floating: bool,
    geometry: Option<Geometry>,
}

/// Saves and restores single dashboards.
pub struct DashboardLayoutEngine<'a> {
    registry: &'a PluginRegistry,
    bounds: GeometryBounds,
}

impl<'a> DashboardLayoutEngine<'a> {
    pub fn new(registry: &'a PluginRegistry, bounds: GeometryBounds) -> Self {
        Self { registry, bounds }
    }

    /// Rebuilds `record` into `dashboard`, claiming ids through `namer`.
    ///
    /// Widgets that cannot be resolved, constructed or fed their saved state
    /// are skipped; only store failures abort the restore.
    pub fn restore(
        &self,
        record: &DashboardRecord,
        dashboard: &mut Dashboard,
        namer: &mut WidgetInstanceNamer,
        context: &WidgetContext,
    ) -> Result<RestoreReport, StoreError> {
        let mut report = RestoreReport::new();
        dashboard.set_title(record.title.clone());

        report.phase = RestorePhase::WidgetsCreating;
        let mut placements = Vec::with_capacity(record.widgets.len());
        for saved in &record.widgets {
            let restored = self.restore_widget(saved, dashboard, namer, context, &mut report)?;
            if let Some(placement) = restored {
                placements.push(placement);
            }
        }
        report.restored = placements.len();
        report.phase = RestorePhase::WidgetsCreated;

        if !placements.is_empty() && !record.docking_state.trim().is_empty() {
            self.apply_docking_state(record, dashboard, &mut report);
        }
        for placement in &placements {
            let surface = dashboard.surface_mut();
            let dock = placement.dock_name.as_str();
            if let Err(err) = surface.set_floating(dock, placement.floating) {
                report.warn(format!("floating state of '{dock}' not applied: {err}"));
            }
            if let Some(geometry) = placement.geometry {
                if let Err(err) = surface.set_geometry(dock, geometry.clamped(&self.bounds)) {
                    report.warn(format!("geometry of '{dock}' not applied: {err}"));
                }
            }
        }
        report.phase = RestorePhase::GeometryApplied;

        for placement in &placements {
            let dock = placement.dock_name.as_str();
            if let Err(err) = dashboard.surface_mut().set_visible(dock, true) {
                report.warn(format!("'{dock}' could not be shown: {err}"));
            }
        }
        for instance in dashboard.widgets_mut() {
            if !instance.widget.capabilities().refresh {
                continue;
            }
            if let Err(err) = instance.widget.refresh() {
                report.warn(format!("refresh of '{}' failed: {err}", instance.id));
            }
        }
        report.phase = RestorePhase::VisibilityReconciled;

        report.phase = RestorePhase::Done;
        log::info!(
            "restored dashboard '{}' with {} widget(s), {} skipped",
            record.title,
            report.restored,
            report.skipped.len()
        );
        Ok(report)
    }

    fn restore_widget(
        &self,
        saved: &WidgetRecord,
        dashboard: &mut Dashboard,
        namer: &mut WidgetInstanceNamer,
        context: &WidgetContext,
        report: &mut RestoreReport,
    ) -> Result<Option<Placement>, StoreError> {
        let saved_id = saved.widget_id().trim();
        if saved_id.is_empty() {
            report.skip(saved_id, "widget record without an id skipped".to_string());
            return Ok(None);
        }
        let Some(descriptor) = self
            .registry
            .resolve_instance(saved_id, saved.base_module.as_deref())
        else {
            report.skip(saved_id, format!("no plugin for widget '{saved_id}', skipped"));
            return Ok(None);
        };

        let id = namer.claim(saved_id, &descriptor.module_name);
        let dock_name = if id == saved_id && !saved.dock_name.is_empty() {
            saved.dock_name.clone()
        } else {
            WidgetInstance::dock_name_for(&id)
        };
        let title = if saved.title.is_empty() {
            descriptor.title.clone()
        } else {
            saved.title.clone()
        };

        let mut widget = match descriptor.construct(context.clone(), &id, &title) {
            Ok(widget) => widget,
            Err(err) => {
                namer.release(&id);
                report.skip(saved_id, format!("cannot create widget '{id}': {err}"));
                return Ok(None);
            }
        };

        if widget.capabilities().restore_state {
            if let Some(data) = widget.base().store().get(STATE_KEY)? {
                let applied = serde_json::from_slice::<serde_json::Value>(&data)
                    .map_err(|err| err.to_string())
                    .and_then(|state| {
                        widget
                            .restore_state(&id, state)
                            .map_err(|err| err.to_string())
                    });
                if let Err(err) = applied {
                    namer.release(&id);
                    report.skip(saved_id, format!("state of widget '{id}' rejected: {err}"));
                    return Ok(None);
                }
            }
        }

        let instance = WidgetInstance {
            id: id.clone(),
            kind: descriptor.module_name.clone(),
            dock_name: dock_name.clone(),
            widget,
        };
        if let Err(err) = dashboard.insert(instance, saved.area) {
            namer.release(&id);
            report.skip(saved_id, format!("cannot dock widget '{id}': {err}"));
            return Ok(None);
        }
        log::debug!("restored widget '{id}' ({})", descriptor.module_name);
        Ok(Some(Placement {
            dock_name,
            floating: saved.floating,
            geometry: saved.geometry,
        }))
    }

    fn apply_docking_state(
        &self,
        record: &DashboardRecord,
        dashboard: &mut Dashboard,
        report: &mut RestoreReport,
    ) {
        let blob = match record.docking_state_bytes() {
            Ok(blob) => blob,
            Err(err) => {
                report.warn(format!("docking state of '{}' skipped: {err}", record.title));
                return;
            }
        };
        let surface = dashboard.surface_mut();
        let before: HashMap<String, bool> = surface
            .dock_names()
            .into_iter()
            .map(|name| {
                let visible = surface.is_visible(&name);
                (name, visible)
            })
            .collect();
        if let Err(err) = surface.restore_state(&blob) {
            report.warn(format!("docking state of '{}' not applied: {err}", record.title));
        }
        for (name, visible) in before {
            if visible && !surface.is_visible(&name) {
                if let Err(err) = surface.set_visible(&name, true) {
                    report.warn(format!("'{name}' could not be shown again: {err}"));
                }
            }
        }
    }

    /// Snapshot of `dashboard`, asking widgets with the save capability to
    /// persist first.
    ///
    /// A widget whose save fails is logged and keeps its layout entry; its
    /// previously stored state stays in place.
    pub fn capture(&self, dashboard: &mut Dashboard) -> DashboardRecord {
        for instance in dashboard.widgets_mut() {
            if !instance.widget.capabilities().save_state {
                continue;
            }
            if let Err(err) = instance.widget.save_state() {
                log::warn!("saving state of '{}' failed: {err}", instance.id);
            }
        }

        let mut record = DashboardRecord::new(dashboard.title());
        let surface = dashboard.surface();
        for dock_name in surface.dock_names() {
            let Some(instance) = dashboard.widgets().iter().find(|w| w.dock_name == dock_name)
            else {
                continue;
            };
            let Some(dock) = surface.dock(&dock_name) else {
                continue;
            };
            record.widgets.push(WidgetRecord {
                module_name: instance.id.clone(),
                base_module: Some(instance.kind.clone()),
                dock_name,
                title: instance.widget.title().to_string(),
                area: dock.area,
                floating: dock.floating,
                visible: dock.visible,
                geometry: Some(dock.geometry),
            });
        }
        if !dashboard.is_empty() {
            record.set_docking_state(&surface.save_state());
        }
        record
    }
}
