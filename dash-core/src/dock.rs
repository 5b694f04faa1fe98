//! Dock surfaces: the windowing toolkit side of a dashboard.

use layout::{DockArea, Geometry};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(thiserror::Error, Debug)]
pub enum DockError {
    #[error("unknown dock '{0}'")]
    UnknownDock(String),
    #[error("dock '{0}' already exists")]
    DuplicateDock(String),
    #[error("invalid docking state: {0}")]
    InvalidState(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DockState {
    pub name: String,
    pub area: DockArea,
    pub floating: bool,
    pub visible: bool,
    pub geometry: Geometry,
}

/// One dashboard's docking area.
///
/// `save_state` returns an opaque blob that `restore_state` accepts back;
/// docks missing from a restored blob may end up hidden.
pub trait DockSurface {
    fn add_dock(&mut self, name: &str, area: DockArea) -> Result<(), DockError>;
    fn remove_dock(&mut self, name: &str) -> bool;
    fn rename_dock(&mut self, name: &str, new_name: &str) -> Result<(), DockError>;
    /// Dock names in dock order.
    fn dock_names(&self) -> Vec<String>;
    fn dock(&self, name: &str) -> Option<DockState>;
    fn set_area(&mut self, name: &str, area: DockArea) -> Result<(), DockError>;
    fn set_floating(&mut self, name: &str, floating: bool) -> Result<(), DockError>;
    fn set_visible(&mut self, name: &str, visible: bool) -> Result<(), DockError>;
    fn set_geometry(&mut self, name: &str, geometry: Geometry) -> Result<(), DockError>;
    fn save_state(&self) -> Vec<u8>;
    fn restore_state(&mut self, state: &[u8]) -> Result<(), DockError>;

    fn has_dock(&self, name: &str) -> bool {
        self.dock(name).is_some()
    }

    fn is_visible(&self, name: &str) -> bool {
        self.dock(name).is_some_and(|dock| dock.visible)
    }
}

pub type SurfaceFactory = Arc<dyn Fn() -> Box<dyn DockSurface> + Send + Sync>;

pub fn headless_factory() -> SurfaceFactory {
    Arc::new(|| Box::new(HeadlessSurface::new()) as Box<dyn DockSurface>)
}

/// In-memory surface; its state blob is the JSON list of dock states.
#[derive(Debug, Clone)]
pub struct HeadlessSurface {
    docks: Vec<DockState>,
    default_geometry: Geometry,
}

impl Default for HeadlessSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessSurface {
    pub fn new() -> Self {
        Self {
            docks: Vec::new(),
            default_geometry: Geometry::new(0, 0, 300, 200),
        }
    }

    fn dock_mut(&mut self, name: &str) -> Result<&mut DockState, DockError> {
        self.docks
            .iter_mut()
            .find(|dock| dock.name == name)
            .ok_or_else(|| DockError::UnknownDock(name.to_string()))
    }
}

impl DockSurface for HeadlessSurface {
    fn add_dock(&mut self, name: &str, area: DockArea) -> Result<(), DockError> {
        if self.has_dock(name) {
            return Err(DockError::DuplicateDock(name.to_string()));
        }
        self.docks.push(DockState {
            name: name.to_string(),
            area,
            floating: area == DockArea::Floating,
            visible: true,
            geometry: self.default_geometry,
        });
        Ok(())
    }

    fn remove_dock(&mut self, name: &str) -> bool {
        let before = self.docks.len();
        self.docks.retain(|dock| dock.name != name);
        before != self.docks.len()
    }

    fn rename_dock(&mut self, name: &str, new_name: &str) -> Result<(), DockError> {
        if name != new_name && self.has_dock(new_name) {
            return Err(DockError::DuplicateDock(new_name.to_string()));
        }
        self.dock_mut(name)?.name = new_name.to_string();
        Ok(())
    }

    fn dock_names(&self) -> Vec<String> {
        self.docks.iter().map(|dock| dock.name.clone()).collect()
    }

    fn dock(&self, name: &str) -> Option<DockState> {
        self.docks.iter().find(|dock| dock.name == name).cloned()
    }

    fn set_area(&mut self, name: &str, area: DockArea) -> Result<(), DockError> {
        self.dock_mut(name)?.area = area;
        Ok(())
    }

    fn set_floating(&mut self, name: &str, floating: bool) -> Result<(), DockError> {
        self.dock_mut(name)?.floating = floating;
        Ok(())
    }

    fn set_visible(&mut self, name: &str, visible: bool) -> Result<(), DockError> {
        self.dock_mut(name)?.visible = visible;
        Ok(())
    }

    fn set_geometry(&mut self, name: &str, geometry: Geometry) -> Result<(), DockError> {
        self.dock_mut(name)?.geometry = geometry;
        Ok(())
    }

    fn save_state(&self) -> Vec<u8> {
        serde_json::to_vec(&self.docks).unwrap_or_default()
    }

    fn restore_state(&mut self, state: &[u8]) -> Result<(), DockError> {
        let saved: Vec<DockState> = serde_json::from_slice(state)
            .map_err(|err| DockError::InvalidState(err.to_string()))?;

        let mut ordered = Vec::with_capacity(self.docks.len());
        for entry in &saved {
            if let Some(pos) = self.docks.iter().position(|dock| dock.name == entry.name) {
                let mut dock = self.docks.remove(pos);
                dock.area = entry.area;
                dock.floating = entry.floating;
                dock.visible = entry.visible;
                dock.geometry = entry.geometry;
                ordered.push(dock);
            }
        }
        for mut dock in self.docks.drain(..) {
            dock.visible = false;
            ordered.push(dock);
        }
        self.docks = ordered;
        Ok(())
    }
}
