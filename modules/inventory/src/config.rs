//! Configuration for the inventory module (`modules.inventory.config`).

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::store::DEFAULT_CAPACITY;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct InventoryConfig {
    /// Backing file holding the serialized inventory.
    pub data_file: PathBuf,
    /// Maximum number of items. Default: 1000
    pub capacity: usize,
    pub insight: InsightConfig,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("inventory.csv"),
            capacity: DEFAULT_CAPACITY,
            insight: InsightConfig::default(),
        }
    }
}

/// OpenAI-compatible chat-completions endpoint used by `POST /insight`.
/// The feature is disabled while `endpoint` is unset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct InsightConfig {
    /// Full URL, e.g. `https://api.openai.com/v1/chat/completions`
    pub endpoint: Option<String>,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            model: "gpt-4o-mini".to_owned(),
            api_key: None,
            timeout_secs: 30,
        }
    }
}
