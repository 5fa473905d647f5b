//! Suite configuration

use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};

use crate::browser::BrowserConfig;
use crate::client::ApiConfig;
use crate::error::CrudResult;
use crate::record::BookFields;

/// Everything a run needs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SuiteConfig {
    /// Hosted collection
    pub api: ApiConfig,

    /// Values submitted by the create stage
    pub record: BookFields,

    /// Replacement values submitted by the update stage
    pub update: BookFields,

    /// Browser session fixture
    pub browser: BrowserConfig,

    /// Output directory for the JSON report
    pub output_dir: PathBuf,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            record: BookFields::default(),
            update: BookFields::replacement(),
            browser: BrowserConfig::default(),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

impl SuiteConfig {
    /// Load configuration from a TOML file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> CrudResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> CrudResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce a collection URL
    pub fn validate(&self) -> CrudResult<()> {
        self.api.collection_url()?;
        Ok(())
    }
}
