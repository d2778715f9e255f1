//! Key=value properties file handling for the simulation driver.

use std::collections::HashMap;
use std::fs;

use crate::error::{Error, Result};

/// Loaded configuration properties. Lines are `key=value`; blank lines and
/// lines starting with `#` or `!` are skipped.
pub struct Config {
    properties: HashMap<String, String>,
}

impl Config {
    pub fn load(config_file_path: &str) -> Result<Self> {
        let content = fs::read_to_string(config_file_path).map_err(|error| {
            Error::ConfigMissing(format!("{}: {}", config_file_path, error))
        })?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut properties = HashMap::new();
        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                properties.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        Self { properties }
    }

    /// Returns the value for a required key.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.properties
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| Error::ConfigMissing(format!("required key not found: {}", key)))
    }
}
