use serde::{Deserialize, Serialize};

/// Storage backend type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackendType {
    #[default]
    Local,
    Memory,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Local => "local",
            BackendType::Memory => "memory",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "local" => Some(BackendType::Local),
            "memory" => Some(BackendType::Memory),
            _ => None,
        }
    }
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalStorageConfig {
    #[serde(default = "default_local_path")]
    pub base_path: String,
}

fn default_local_path() -> String {
    "data/folders".to_string()
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            base_path: default_local_path(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_type_parse() {
        assert_eq!(BackendType::parse("Local"), Some(BackendType::Local));
        assert_eq!(BackendType::parse(" memory "), Some(BackendType::Memory));
        assert_eq!(BackendType::parse("cos"), None);
        assert_eq!(BackendType::Memory.as_str(), "memory");
    }
}
