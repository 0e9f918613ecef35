use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::folder::Folder;
use crate::io::{Errors, TextOptions};
use crate::models::{BackendType, LocalStorageConfig};
use crate::storage::StorageManager;

/// Library configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub folder: FolderConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub text: TextConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FolderConfig {
    #[serde(default = "default_lookup")]
    pub lookup: String,
    #[serde(default)]
    pub project_key: Option<String>,
    #[serde(default)]
    pub ignore_flow: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: BackendType,
    #[serde(default = "default_local_path")]
    pub local_path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct TextConfig {
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub errors: Errors,
}

// Default values
fn default_lookup() -> String {
    "default".to_string()
}

fn default_local_path() -> String {
    LocalStorageConfig::default().base_path
}

impl Default for FolderConfig {
    fn default() -> Self {
        Self {
            lookup: default_lookup(),
            project_key: None,
            ignore_flow: false,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendType::default(),
            local_path: default_local_path(),
        }
    }
}

impl Config {
    /// Load configuration from the first config file found, then the environment
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from an explicit file, then the environment
    pub fn load_from(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        tracing::info!("Loaded configuration from {}", path.display());
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["folderpath.toml", "config.toml", "data/folderpath.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: FP_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    fn apply_overrides(&mut self, var: impl Fn(&str) -> Option<String>) {
        // Folder overrides
        if let Some(val) = var("FP_CONF_FOLDER_LOOKUP") {
            if !val.trim().is_empty() {
                self.folder.lookup = val;
            }
        }
        if let Some(val) = var("FP_CONF_FOLDER_PROJECT_KEY") {
            self.folder.project_key = Some(val).filter(|v| !v.trim().is_empty());
        }
        if let Some(val) = var("FP_CONF_FOLDER_IGNORE_FLOW") {
            if let Ok(v) = val.parse() {
                self.folder.ignore_flow = v;
            }
        }

        // Storage overrides
        if let Some(val) = var("FP_CONF_STORAGE_BACKEND") {
            match BackendType::parse(&val) {
                Some(backend) => self.storage.backend = backend,
                None => tracing::warn!("Ignoring unknown storage backend {:?}", val),
            }
        }
        if let Some(val) = var("FP_CONF_STORAGE_LOCAL_PATH") {
            self.storage.local_path = val;
        }

        // Text overrides
        if let Some(val) = var("FP_CONF_TEXT_ENCODING") {
            self.text.encoding = Some(val).filter(|v| !v.trim().is_empty());
        }
        if let Some(val) = var("FP_CONF_TEXT_ERRORS") {
            match val.parse() {
                Ok(errors) => self.text.errors = errors,
                Err(e) => tracing::warn!("Ignoring FP_CONF_TEXT_ERRORS: {}", e),
            }
        }
    }

    /// Default text options for reads and writes
    pub fn text_options(&self) -> TextOptions {
        let options = TextOptions::new().errors(self.text.errors);
        match &self.text.encoding {
            Some(encoding) => options.encoding(encoding.clone()),
            None => options,
        }
    }

    /// Build the configured backend and wrap it in a `Folder`
    pub fn open_folder(&self) -> Folder {
        let local = LocalStorageConfig {
            base_path: self.storage.local_path.clone(),
        };
        let backend = StorageManager::get_backend(self.storage.backend, &local);
        tracing::info!(
            "Opening folder {} on {} storage",
            self.folder.lookup,
            backend.storage_type()
        );

        let mut folder = Folder::new(self.folder.lookup.clone(), backend)
            .with_ignore_flow(self.folder.ignore_flow);
        if let Some(project_key) = &self.folder.project_key {
            folder = folder.with_project_key(project_key.clone());
        }
        folder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.folder.lookup, "default");
        assert_eq!(config.storage.backend, BackendType::Local);
        assert_eq!(config.storage.local_path, "data/folders");
        assert_eq!(config.text.errors, Errors::Strict);
        assert!(config.text.encoding.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let config: Config = toml::from_str(
            r#"
            [folder]
            lookup = "images"
            project_key = "PROJ"
            ignore_flow = true

            [storage]
            backend = "memory"

            [text]
            encoding = "latin-1"
            errors = "replace"
            "#,
        )
        .unwrap();

        assert_eq!(config.folder.lookup, "images");
        assert_eq!(config.folder.project_key.as_deref(), Some("PROJ"));
        assert!(config.folder.ignore_flow);
        assert_eq!(config.storage.backend, BackendType::Memory);
        assert_eq!(config.storage.local_path, "data/folders");
        assert_eq!(config.text.encoding.as_deref(), Some("latin-1"));
        assert_eq!(config.text.errors, Errors::Replace);
    }

    #[test]
    fn test_overrides() {
        let vars: HashMap<&str, &str> = [
            ("FP_CONF_FOLDER_LOOKUP", "renamed"),
            ("FP_CONF_FOLDER_IGNORE_FLOW", "true"),
            ("FP_CONF_STORAGE_BACKEND", "Memory"),
            ("FP_CONF_TEXT_ERRORS", "ignore"),
            ("FP_CONF_TEXT_ENCODING", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.text.encoding = Some("utf-16".to_string());
        config.apply_overrides(|key| vars.get(key).map(|v| v.to_string()));

        assert_eq!(config.folder.lookup, "renamed");
        assert!(config.folder.ignore_flow);
        assert_eq!(config.storage.backend, BackendType::Memory);
        assert_eq!(config.text.errors, Errors::Ignore);
        assert!(config.text.encoding.is_none());
    }

    #[test]
    fn test_bad_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(|key| match key {
            "FP_CONF_STORAGE_BACKEND" => Some("cos".to_string()),
            "FP_CONF_TEXT_ERRORS" => Some("surrogateescape".to_string()),
            _ => None,
        });
        assert_eq!(config.storage.backend, BackendType::Local);
        assert_eq!(config.text.errors, Errors::Strict);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("folderpath.toml");
        fs::write(&path, "[folder]\nlookup = \"from-file\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.folder.lookup, "from-file");
        assert!(Config::load_from(dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_open_folder_uses_configured_backend() {
        let mut config = Config::default();
        config.folder.lookup = "scratch".to_string();
        config.folder.project_key = Some("PROJ".to_string());
        config.storage.backend = BackendType::Memory;

        let folder = config.open_folder();
        assert_eq!(folder.lookup(), "scratch");
        assert_eq!(folder.project_key(), Some("PROJ"));
        assert_eq!(folder.backend().storage_type(), "memory");

        let path = folder.path("notes.txt");
        path.write_text("hi", &config.text_options()).unwrap();
        assert_eq!(path.read_text(&config.text_options()).unwrap(), "hi");
    }

    #[test]
    fn test_text_options() {
        let mut config = Config::default();
        config.text.encoding = Some("latin-1".to_string());
        config.text.errors = Errors::Replace;

        let options = config.text_options();
        assert_eq!(options.encoding.as_deref(), Some("latin-1"));
        assert_eq!(options.errors, Errors::Replace);
    }
}
