use super::registry::{PluginRegistry, RegistryError};
use super::types::{PluginDescriptor, PluginManifest};
use std::fs;
use std::path::Path;

impl PluginRegistry {
    /// Registers the preset widgets found in sub-folders of `bases`.
    ///
    /// Folders without a `plugin.toml` are ignored; broken manifests are
    /// skipped and reported through [`PluginRegistry::take_warnings`].
    pub fn scan_manifest_dirs<P: AsRef<Path>>(&mut self, bases: &[P]) -> usize {
        let mut registered = 0;
        for base in bases {
            let Ok(entries) = fs::read_dir(base.as_ref()) else {
                continue;
            };
            let mut folders: Vec<_> = entries
                .flatten()
                .map(|entry| entry.path())
                .filter(|path| path.is_dir())
                .collect();
            folders.sort();
            for folder in folders {
                let folder_name = folder
                    .file_name()
                    .and_then(|s| s.to_str())
                    .unwrap_or_default();
                if folder_name.eq_ignore_ascii_case("template") {
                    continue;
                }
                let manifest_path = folder.join("plugin.toml");
                if !manifest_path.is_file() {
                    continue;
                }
                match self.register_manifest(&folder) {
                    Ok(module_name) => {
                        log::info!(
                            "registered '{module_name}' from {}",
                            manifest_path.display()
                        );
                        registered += 1;
                    }
                    Err(err) => {
                        let warning = format!(
                            "Ignoring plugin at '{}': {err}",
                            folder.display()
                        );
                        log::warn!("{warning}");
                        self.warnings.push(warning);
                    }
                }
            }
        }
        registered
    }

    /// Reads `folder/plugin.toml` and registers it on top of its base kind.
    pub fn register_manifest(&mut self, folder: &Path) -> Result<String, RegistryError> {
        let manifest_path = folder.join("plugin.toml");
        let manifest_error = |message: String| RegistryError::Manifest {
            path: manifest_path.display().to_string(),
            message,
        };
        let data = fs::read_to_string(&manifest_path)
            .map_err(|err| manifest_error(format!("failed to read: {err}")))?;
        let manifest: PluginManifest =
            toml::from_str(&data).map_err(|err| manifest_error(err.to_string()))?;

        let base = self
            .resolve(manifest.base.trim())
            .filter(|base| base.is_bundled())
            .ok_or_else(|| RegistryError::UnknownBase(manifest.base.clone()))?;
        let descriptor = PluginDescriptor::from_manifest(base, manifest, folder.to_path_buf());
        if descriptor.module_name.is_empty() {
            return Err(manifest_error("empty module name".to_string()));
        }
        let module_name = descriptor.module_name.clone();
        self.register(descriptor)?;
        Ok(module_name)
    }
}
