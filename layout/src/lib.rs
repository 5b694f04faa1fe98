use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::Path;

/// Store scope holding the workspace snapshot.
pub const SNAPSHOT_SCOPE: &str = "main_window";
/// Store key holding the workspace snapshot.
pub const SNAPSHOT_KEY: &str = "dashboards";

/// Dock placement, numbered the way the windowing toolkit numbers its areas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum DockArea {
    Floating,
    Left,
    #[default]
    Right,
    Top,
    Bottom,
}

impl From<i64> for DockArea {
    fn from(value: i64) -> Self {
        match value {
            0 => DockArea::Floating,
            1 => DockArea::Left,
            2 => DockArea::Right,
            4 => DockArea::Top,
            8 => DockArea::Bottom,
            _ => DockArea::Right,
        }
    }
}

impl From<DockArea> for i64 {
    fn from(area: DockArea) -> Self {
        match area {
            DockArea::Floating => 0,
            DockArea::Left => 1,
            DockArea::Right => 2,
            DockArea::Top => 4,
            DockArea::Bottom => 8,
        }
    }
}

impl DockArea {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "floating" => Some(DockArea::Floating),
            "left" => Some(DockArea::Left),
            "right" => Some(DockArea::Right),
            "top" => Some(DockArea::Top),
            "bottom" => Some(DockArea::Bottom),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DockArea::Floating => "floating",
            DockArea::Left => "left",
            DockArea::Right => "right",
            DockArea::Top => "top",
            DockArea::Bottom => "bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Geometry {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Geometry {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn clamped(self, bounds: &GeometryBounds) -> Self {
        Self {
            x: self.x.max(0),
            y: self.y.max(0),
            width: self.width.clamp(bounds.min_width, bounds.max_width),
            height: self.height.clamp(bounds.min_height, bounds.max_height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryBounds {
    pub min_width: i32,
    pub max_width: i32,
    pub min_height: i32,
    pub max_height: i32,
}

impl Default for GeometryBounds {
    fn default() -> Self {
        Self {
            min_width: 100,
            max_width: 2000,
            min_height: 100,
            max_height: 1200,
        }
    }
}

/// One dock entry of a dashboard.
///
/// `module_name` carries the widget instance id for compatibility with
/// documents written before `base_module` was persisted separately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WidgetRecord {
    pub module_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_module: Option<String>,
    #[serde(default)]
    pub dock_name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub area: DockArea,
    #[serde(default)]
    pub floating: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

fn default_visible() -> bool {
    true
}

impl WidgetRecord {
    pub fn widget_id(&self) -> &str {
        &self.module_name
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardRecord {
    #[serde(default = "default_dashboard_title")]
    pub title: String,
    /// Hex-encoded docking state blob, opaque to this crate.
    #[serde(default, rename = "state")]
    pub docking_state: String,
    #[serde(default)]
    pub widgets: Vec<WidgetRecord>,
}

fn default_dashboard_title() -> String {
    "Dashboard".to_string()
}

impl DashboardRecord {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            docking_state: String::new(),
            widgets: Vec::new(),
        }
    }

    pub fn docking_state_bytes(&self) -> Result<Vec<u8>, LayoutError> {
        decode_hex(&self.docking_state)
    }

    pub fn set_docking_state(&mut self, state: &[u8]) {
        self.docking_state = hex::encode(state);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub dashboards: Vec<DashboardRecord>,
    /// Hex-encoded main window geometry, opaque to this crate.
    #[serde(default)]
    pub window_geometry: String,
}

/// Result of a lenient decode: entries that could not be read are dropped and
/// described in `warnings`.
#[derive(Debug, Clone, Default)]
pub struct DecodedSnapshot {
    pub snapshot: LayoutSnapshot,
    pub warnings: Vec<String>,
}

#[derive(thiserror::Error, Debug)]
pub enum LayoutError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid hex state: {0}")]
    Hex(String),
    #[error("snapshot document must be a list of dashboards or an object")]
    Shape,
}

fn decode_hex(text: &str) -> Result<Vec<u8>, LayoutError> {
    hex::decode(text.trim()).map_err(|err| LayoutError::Hex(err.to_string()))
}

impl LayoutSnapshot {
    pub fn is_empty(&self) -> bool {
        self.dashboards.is_empty()
    }

    pub fn widget_count(&self) -> usize {
        self.dashboards.iter().map(|d| d.widgets.len()).sum()
    }

    pub fn window_geometry_bytes(&self) -> Result<Vec<u8>, LayoutError> {
        decode_hex(&self.window_geometry)
    }

    pub fn set_window_geometry(&mut self, geometry: &[u8]) {
        self.window_geometry = hex::encode(geometry);
    }

    /// Compact, deterministic encoding used for the store.
    pub fn to_json_bytes(&self) -> Result<Vec<u8>, LayoutError> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Strict decode of a whole document.
    pub fn from_json_bytes(data: &[u8]) -> Result<Self, LayoutError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Decodes a document, skipping dashboards and widgets that do not parse.
    ///
    /// Accepts both the object form and a bare list of dashboards.
    pub fn decode_lenient(data: &[u8]) -> Result<DecodedSnapshot, LayoutError> {
        let root: Value = serde_json::from_slice(data)?;
        let (dashboards, window_geometry) = match root {
            Value::Array(items) => (items, String::new()),
            Value::Object(mut map) => {
                let dashboards = match map.remove("dashboards") {
                    Some(Value::Array(items)) => items,
                    Some(Value::Null) | None => Vec::new(),
                    Some(_) => return Err(LayoutError::Shape),
                };
                let window_geometry = map
                    .remove("window_geometry")
                    .and_then(|v| v.as_str().map(str::to_string))
                    .unwrap_or_default();
                (dashboards, window_geometry)
            }
            _ => return Err(LayoutError::Shape),
        };

        let mut warnings = Vec::new();
        let mut records = Vec::with_capacity(dashboards.len());
        for (index, dashboard) in dashboards.into_iter().enumerate() {
            let Value::Object(mut map) = dashboard else {
                warnings.push(format!("dashboard #{index} is not an object"));
                continue;
            };
            let widgets = match map.remove("widgets") {
                Some(Value::Array(items)) => items,
                Some(Value::Null) | None => Vec::new(),
                Some(_) => {
                    warnings.push(format!("dashboard #{index} has a malformed widget list"));
                    Vec::new()
                }
            };
            let mut record: DashboardRecord = match serde_json::from_value(Value::Object(map)) {
                Ok(record) => record,
                Err(err) => {
                    warnings.push(format!("dashboard #{index} skipped: {err}"));
                    continue;
                }
            };
            for (widget_index, widget) in widgets.into_iter().enumerate() {
                match serde_json::from_value::<WidgetRecord>(widget) {
                    Ok(widget) => record.widgets.push(widget),
                    Err(err) => warnings.push(format!(
                        "widget #{widget_index} of '{}' skipped: {err}",
                        record.title
                    )),
                }
            }
            records.push(record);
        }

        for warning in &warnings {
            log::warn!("{warning}");
        }
        Ok(DecodedSnapshot {
            snapshot: LayoutSnapshot {
                dashboards: records,
                window_geometry,
            },
            warnings,
        })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), LayoutError> {
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, LayoutError> {
        let data = fs::read(path)?;
        Ok(Self::decode_lenient(&data)?.snapshot)
    }
}
