use crate::retry::RetryPolicy;
use crate::transport::TransportOptions;
use crate::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Client configuration, usually loaded from `dataintel.json`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ClientConfig {
    pub uri: String,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Passed through to the HTTP client builder
    #[serde(default)]
    pub transport: TransportOptions,

    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_timeout_secs() -> u64 {
    300
}

impl ClientConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            headers: HashMap::new(),
            timeout_secs: default_timeout_secs(),
            transport: TransportOptions::default(),
            retry: RetryPolicy::default(),
        }
    }

    pub fn load(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ClientError::Config(format!("cannot read {}: {}", path, e)))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self> {
        let config: ClientConfig = serde_json::from_str(contents)
            .map_err(|e| ClientError::Config(e.to_string()))?;
        if config.uri.trim().is_empty() {
            return Err(ClientError::Config("`uri` must not be empty".to_string()));
        }
        Ok(config)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
