use super::types::PluginDescriptor;
use dash_widget::PluginRegistration;
use std::collections::HashMap;

#[derive(thiserror::Error, Debug)]
pub enum RegistryError {
    #[error("module '{0}' is already registered")]
    DuplicateRegistration(String),
    #[error("unknown base module '{0}'")]
    UnknownBase(String),
    #[error("invalid manifest '{path}': {message}")]
    Manifest { path: String, message: String },
}

/// Legacy id prefixes still found in saved layouts.
const BUILTIN_ALIASES: [(&str, &str); 1] = [("treelist", "tree_list")];

pub struct PluginRegistry {
    descriptors: Vec<PluginDescriptor>,
    index: HashMap<String, usize>,
    aliases: HashMap<String, String>,
    pub(crate) warnings: Vec<String>,
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PluginRegistry {
    pub fn new() -> Self {
        let aliases = BUILTIN_ALIASES
            .iter()
            .map(|(alias, target)| (alias.to_string(), target.to_string()))
            .collect();
        Self {
            descriptors: Vec::new(),
            index: HashMap::new(),
            aliases,
            warnings: Vec::new(),
        }
    }

    /// Registry holding every bundled widget.
    pub fn with_bundled() -> Self {
        let mut registry = Self::new();
        registry.load_bundled();
        registry
    }

    pub fn load_bundled(&mut self) -> usize {
        self.register_family(app_widgets::register_plugins())
    }

    /// First registration of a module name wins.
    pub fn register(&mut self, descriptor: PluginDescriptor) -> Result<(), RegistryError> {
        if self.index.contains_key(&descriptor.module_name) {
            log::warn!(
                "duplicate registration of '{}' ignored",
                descriptor.module_name
            );
            return Err(RegistryError::DuplicateRegistration(
                descriptor.module_name,
            ));
        }
        log::debug!("registered widget module '{}'", descriptor.module_name);
        self.index
            .insert(descriptor.module_name.clone(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Flattens a family of registrations into the registry and returns how
    /// many were accepted.
    pub fn register_family(&mut self, family: Vec<PluginRegistration>) -> usize {
        family
            .into_iter()
            .map(PluginDescriptor::from_registration)
            .filter(|descriptor| self.register(descriptor.clone()).is_ok())
            .count()
    }

    pub fn add_alias(&mut self, alias: &str, module_name: &str) {
        self.aliases
            .insert(alias.to_string(), module_name.to_string());
    }

    pub fn resolve(&self, module_name: &str) -> Option<&PluginDescriptor> {
        let key = self
            .aliases
            .get(module_name)
            .map(String::as_str)
            .unwrap_or(module_name);
        self.index.get(key).map(|&i| &self.descriptors[i])
    }

    /// Resolves the kind of a persisted widget id.
    ///
    /// `base_module`, when present and registered, wins. Otherwise the
    /// longest registered name or alias equal to the id, or followed in it
    /// by `_`, is taken.
    pub fn resolve_instance(
        &self,
        widget_id: &str,
        base_module: Option<&str>,
    ) -> Option<&PluginDescriptor> {
        if let Some(descriptor) = base_module.and_then(|base| self.resolve(base)) {
            return Some(descriptor);
        }
        let matches = |name: &str| {
            widget_id == name
                || (widget_id.len() > name.len()
                    && widget_id.starts_with(name)
                    && widget_id.as_bytes()[name.len()] == b'_')
        };
        self.index
            .keys()
            .chain(self.aliases.keys())
            .filter(|name| matches(name))
            .max_by_key(|name| name.len())
            .and_then(|name| self.resolve(name))
    }

    /// Descriptors in registration order.
    pub fn list(&self) -> &[PluginDescriptor] {
        &self.descriptors
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.warnings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn longest_prefix_wins() {
        let registry = PluginRegistry::with_bundled();
        let calc = registry
            .resolve_instance("scientific_calculator", None)
            .unwrap();
        assert_eq!(calc.module_name, "scientific_calculator");
        let list = registry
            .resolve_instance("custom_list_groceries", None)
            .unwrap();
        assert_eq!(list.module_name, "custom_list");
        assert!(registry.resolve_instance("clockwork", None).is_none());
    }

    #[test]
    fn legacy_alias_resolves() {
        let registry = PluginRegistry::with_bundled();
        let tree = registry.resolve_instance("treelist_2", None).unwrap();
        assert_eq!(tree.module_name, "tree_list");
    }
}
