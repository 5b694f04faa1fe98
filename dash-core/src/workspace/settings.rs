use ingest::RetryPolicy;
use layout::{DockArea, GeometryBounds};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellSettings {
    /// Store file name, relative to the data directory.
    pub store_file: String,
    /// Folders scanned for `plugin.toml` presets; relative entries are
    /// resolved against the data directory.
    pub plugin_dirs: Vec<PathBuf>,
    pub ingest_workers: usize,
    /// Per-request timeout for url sources.
    pub http_timeout_secs: u64,
    /// Attempts per url request, retries included.
    pub fetch_attempts: u32,
    pub default_area: DockArea,
    pub geometry_bounds: GeometryBounds,
}

impl Default for ShellSettings {
    fn default() -> Self {
        Self {
            store_file: "store.json".to_string(),
            plugin_dirs: vec![PathBuf::from("plugins")],
            ingest_workers: 4,
            http_timeout_secs: 10,
            fetch_attempts: 3,
            default_area: DockArea::Right,
            geometry_bounds: GeometryBounds::default(),
        }
    }
}

impl ShellSettings {
    pub fn path_for(data_dir: &Path) -> PathBuf {
        data_dir.join(SETTINGS_FILE)
    }

    pub fn load_file(path: &Path) -> Result<Self, String> {
        let data = std::fs::read(path)
            .map_err(|e| format!("Failed to read settings file '{}': {e}", path.display()))?;
        let settings: ShellSettings = serde_json::from_slice(&data)
            .map_err(|e| format!("Failed to parse settings file '{}': {e}", path.display()))?;
        Ok(settings.normalized())
    }

    pub fn save_file(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let data = serde_json::to_vec_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {e}"))?;
        std::fs::write(path, data)
            .map_err(|e| format!("Failed to write settings file '{}': {e}", path.display()))
    }

    /// Settings of `data_dir`, writing the defaults when the file is missing.
    /// An unreadable file falls back to the defaults and is left untouched.
    pub fn load_or_create(data_dir: &Path) -> Self {
        let path = Self::path_for(data_dir);
        if !path.exists() {
            let defaults = Self::default();
            if let Err(err) = defaults.save_file(&path) {
                log::warn!("{err}");
            }
            return defaults;
        }
        match Self::load_file(&path) {
            Ok(settings) => settings,
            Err(err) => {
                log::warn!("{err}; using defaults");
                Self::default()
            }
        }
    }

    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.store_file)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.fetch_attempts,
            ..RetryPolicy::default()
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn resolved_plugin_dirs(&self, data_dir: &Path) -> Vec<PathBuf> {
        self.plugin_dirs
            .iter()
            .map(|dir| {
                if dir.is_absolute() {
                    dir.clone()
                } else {
                    data_dir.join(dir)
                }
            })
            .collect()
    }

    fn normalized(mut self) -> Self {
        self.ingest_workers = self.ingest_workers.clamp(1, 64);
        self.http_timeout_secs = self.http_timeout_secs.clamp(1, 300);
        self.fetch_attempts = self.fetch_attempts.clamp(1, 10);
        if self.store_file.trim().is_empty() {
            self.store_file = Self::default().store_file;
        }
        let bounds = &mut self.geometry_bounds;
        bounds.min_width = bounds.min_width.max(0);
        bounds.min_height = bounds.min_height.max(0);
        bounds.max_width = bounds.max_width.max(bounds.min_width);
        bounds.max_height = bounds.max_height.max(bounds.min_height);
        self
    }
}
