pub mod discovery;
pub mod registry;
pub mod types;

pub use registry::{PluginRegistry, RegistryError};
pub use types::{PluginDescriptor, PluginManifest, PluginSource};

/// Title-cases a module name for display, e.g. `custom_list` -> `Custom List`.
pub fn display_module_name(module_name: &str) -> String {
    module_name
        .split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
