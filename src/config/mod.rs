mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::path::Path;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            language: default_language(),
            prompts_dir: default_prompts_dir(),
            output_dir: default_output_dir(),
            on_failure: FailurePolicy::default(),
            outline: OutlineConfig::default(),
            chat: ChatConfig::default(),
            document: DocumentConfig::default(),
            search: SearchConfig::default(),
            fetch: FetchConfig::default(),
            store: StoreConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        let outline = &self.outline;
        if outline.min_bullets == 0 || outline.min_bullets > outline.max_bullets {
            return Err(ConfigError::InvalidBulletRange {
                min: outline.min_bullets,
                max: outline.max_bullets,
            });
        }

        if self.search.engines.is_empty() {
            return Err(ConfigError::Invalid {
                field: "search.engines",
                reason: "at least one engine is required".to_string(),
            });
        }

        if self.search.max_sources == 0 {
            return Err(ConfigError::Invalid {
                field: "search.max_sources",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid {
                field: "retry.max_attempts",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Resolve a path from the config relative to `base` unless it is absolute
    pub fn resolve(base: &Path, path: &Path) -> std::path::PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }
}
