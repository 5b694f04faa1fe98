//! Widget plugin interface shared by the shell core and widget crates.
//!
//! A widget is a headless model of one dock's content. The core never looks
//! at concrete widget types; it only asks for the optional capabilities a
//! widget advertises through [`Capabilities`].

use ingest::{IngestEvent, IngestHandle, IngestRequest, IngestSource};
use serde_json::{Map, Value};
use std::sync::Arc;
use store::{KeyValueStore, ScopedStore, StoreError};

pub use ingest;
pub use store;

/// Key under which widgets keep the state applied through `restore_state`.
pub const STATE_KEY: &str = "state";

#[derive(thiserror::Error, Debug)]
pub enum WidgetError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("ingest error: {0}")]
    Ingest(#[from] ingest::IngestError),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("cannot construct widget: {0}")]
    Construct(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub save_state: bool,
    pub restore_state: bool,
    pub refresh: bool,
}

impl Capabilities {
    pub const NONE: Capabilities = Capabilities {
        save_state: false,
        restore_state: false,
        refresh: false,
    };

    pub const PERSISTENT: Capabilities = Capabilities {
        save_state: true,
        restore_state: true,
        refresh: false,
    };

    pub fn with_refresh(mut self) -> Self {
        self.refresh = true;
        self
    }
}

/// Services handed to a factory.
#[derive(Clone)]
pub struct WidgetContext {
    pub store: Arc<dyn KeyValueStore>,
    pub ingest: IngestHandle,
}

/// Construction parameters handed to a factory.
#[derive(Debug, Clone)]
pub struct WidgetConfig {
    pub widget_id: String,
    pub title: String,
    /// Preset values from a manifest plugin; an empty object otherwise.
    pub preset: Value,
}

impl WidgetConfig {
    pub fn new(widget_id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            widget_id: widget_id.into(),
            title: title.into(),
            preset: Value::Object(Map::new()),
        }
    }
}

/// Identity, storage and ingestion access common to every widget.
#[derive(Debug, Clone)]
pub struct WidgetBase {
    id: String,
    title: String,
    store: ScopedStore,
    ingest: IngestHandle,
    preset: Value,
}

impl WidgetBase {
    pub fn new(context: WidgetContext, config: WidgetConfig) -> Self {
        Self {
            store: ScopedStore::new(context.store, config.widget_id.clone()),
            id: config.widget_id,
            title: config.title,
            ingest: context.ingest,
            preset: config.preset,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn store(&self) -> &ScopedStore {
        &self.store
    }

    pub fn preset(&self) -> &Value {
        &self.preset
    }

    pub fn preset_str(&self, key: &str) -> Option<&str> {
        self.preset.get(key).and_then(Value::as_str)
    }

    pub fn rebind(&mut self, id: &str, title: &str) {
        self.id = id.to_string();
        self.title = title.to_string();
        self.store.rebind(id);
    }

    pub fn request(&self, source_id: &str, source: IngestSource) -> Result<(), WidgetError> {
        self.ingest.submit(IngestRequest {
            target: self.id.clone(),
            source_id: source_id.to_string(),
            source,
        })?;
        Ok(())
    }

    pub fn load_state<T: serde::de::DeserializeOwned>(&self) -> Result<Option<T>, WidgetError> {
        Ok(self.store.get_json(STATE_KEY)?)
    }

    pub fn write_state<T: serde::Serialize>(&self, state: &T) -> Result<(), WidgetError> {
        Ok(self.store.set_json(STATE_KEY, state)?)
    }
}

pub trait Widget {
    fn base(&self) -> &WidgetBase;
    fn base_mut(&mut self) -> &mut WidgetBase;

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    /// Persists the widget's state through its own scope.
    fn save_state(&mut self) -> Result<(), WidgetError> {
        Ok(())
    }

    /// Applies state previously written by `save_state`.
    fn restore_state(&mut self, _id: &str, _state: Value) -> Result<(), WidgetError> {
        Ok(())
    }

    fn refresh(&mut self) -> Result<(), WidgetError> {
        Ok(())
    }

    fn on_ingest(&mut self, _event: &IngestEvent) {}

    /// One-line description of the current content.
    fn summary(&self) -> String {
        String::new()
    }

    fn id(&self) -> &str {
        self.base().id()
    }

    fn title(&self) -> &str {
        self.base().title()
    }

    fn rebind(&mut self, id: &str, title: &str) {
        self.base_mut().rebind(id, title);
    }
}

pub type WidgetFactory =
    Arc<dyn Fn(WidgetContext, WidgetConfig) -> Result<Box<dyn Widget>, WidgetError> + Send + Sync>;

/// Wraps a concrete constructor into a [`WidgetFactory`].
pub fn factory<W, F>(construct: F) -> WidgetFactory
where
    W: Widget + 'static,
    F: Fn(WidgetContext, WidgetConfig) -> Result<W, WidgetError> + Send + Sync + 'static,
{
    Arc::new(move |context, config| {
        construct(context, config).map(|widget| Box::new(widget) as Box<dyn Widget>)
    })
}

/// What a widget crate hands to the registry.
#[derive(Clone)]
pub struct PluginRegistration {
    pub module_name: Option<String>,
    pub name: String,
    pub title: String,
    pub description: String,
    pub supports_multiple: bool,
    pub factory: WidgetFactory,
}

impl PluginRegistration {
    pub fn new(name: impl Into<String>, factory: WidgetFactory) -> Self {
        let name = name.into();
        Self {
            module_name: None,
            title: name.clone(),
            name,
            description: String::new(),
            supports_multiple: false,
            factory,
        }
    }

    pub fn module_name(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = Some(module_name.into());
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn multiple(mut self) -> Self {
        self.supports_multiple = true;
        self
    }

    /// Declared module name, else the display name lower-cased with spaces
    /// replaced by underscores.
    pub fn canonical_module_name(&self) -> String {
        match self.module_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => self.name.trim().to_lowercase().replace(' ', "_"),
        }
    }
}

impl std::fmt::Debug for PluginRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginRegistration")
            .field("module_name", &self.module_name)
            .field("name", &self.name)
            .field("supports_multiple", &self.supports_multiple)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Blank {
        base: WidgetBase,
    }

    impl Widget for Blank {
        fn base(&self) -> &WidgetBase {
            &self.base
        }
        fn base_mut(&mut self) -> &mut WidgetBase {
            &mut self.base
        }
    }

    fn blank_factory() -> WidgetFactory {
        factory(|context, config| {
            Ok(Blank {
                base: WidgetBase::new(context, config),
            })
        })
    }

    #[test]
    fn canonical_name_prefers_declared_module_name() {
        let declared = PluginRegistration::new("Calculator", blank_factory()).module_name("calc");
        assert_eq!(declared.canonical_module_name(), "calc");

        let derived = PluginRegistration::new("Scientific Calculator", blank_factory());
        assert_eq!(derived.canonical_module_name(), "scientific_calculator");
    }

    #[test]
    fn rebind_moves_the_storage_scope() {
        let context = WidgetContext {
            store: Arc::new(store::MemoryStore::new()),
            ingest: IngestHandle::disconnected(),
        };
        let mut widget = (blank_factory())(context, WidgetConfig::new("custom_list_foo", "Foo"))
            .expect("construct");
        widget.rebind("custom_list_bar", "Bar");
        assert_eq!(widget.id(), "custom_list_bar");
        assert_eq!(widget.title(), "Bar");
        assert_eq!(widget.base().store().scope(), "custom_list_bar");
        assert_eq!(widget.capabilities(), Capabilities::NONE);
    }
}
