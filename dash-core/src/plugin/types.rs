use dash_widget::{PluginRegistration, Widget, WidgetConfig, WidgetContext, WidgetError, WidgetFactory};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginSource {
    Bundled,
    /// Folder holding the `plugin.toml` the descriptor was read from.
    Manifest(PathBuf),
}

/// Immutable registry entry; `module_name` is its key.
#[derive(Clone)]
pub struct PluginDescriptor {
    pub module_name: String,
    pub display_name: String,
    pub title: String,
    pub description: String,
    pub supports_multiple: bool,
    pub preset: Map<String, Value>,
    pub source: PluginSource,
    factory: WidgetFactory,
}

impl PluginDescriptor {
    pub fn from_registration(registration: PluginRegistration) -> Self {
        Self {
            module_name: registration.canonical_module_name(),
            display_name: registration.name,
            title: registration.title,
            description: registration.description,
            supports_multiple: registration.supports_multiple,
            preset: Map::new(),
            source: PluginSource::Bundled,
            factory: registration.factory,
        }
    }

    /// A descriptor sharing `base`'s factory, configured by `manifest`.
    pub(crate) fn from_manifest(
        base: &PluginDescriptor,
        manifest: PluginManifest,
        folder: PathBuf,
    ) -> Self {
        let module_name = match manifest.module_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => manifest.name.trim().to_lowercase().replace(' ', "_"),
        };
        let mut preset = base.preset.clone();
        preset.extend(manifest.preset);
        Self {
            module_name,
            title: manifest.title.unwrap_or_else(|| manifest.name.clone()),
            display_name: manifest.name,
            description: manifest.description,
            supports_multiple: manifest.supports_multiple.unwrap_or(base.supports_multiple),
            preset,
            source: PluginSource::Manifest(folder),
            factory: base.factory.clone(),
        }
    }

    pub fn is_bundled(&self) -> bool {
        self.source == PluginSource::Bundled
    }

    /// Builds a widget bound to `widget_id`, merging the preset into its
    /// config.
    pub fn construct(
        &self,
        context: WidgetContext,
        widget_id: &str,
        title: &str,
    ) -> Result<Box<dyn Widget>, WidgetError> {
        let mut config = WidgetConfig::new(widget_id, title);
        config.preset = Value::Object(self.preset.clone());
        (self.factory)(context, config)
    }
}

impl std::fmt::Debug for PluginDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginDescriptor")
            .field("module_name", &self.module_name)
            .field("display_name", &self.display_name)
            .field("supports_multiple", &self.supports_multiple)
            .field("source", &self.source)
            .finish()
    }
}

/// `plugin.toml` of a preset widget.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    #[serde(default)]
    pub module_name: Option<String>,
    pub base: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub supports_multiple: Option<bool>,
    #[serde(default)]
    pub preset: Map<String, Value>,
}
