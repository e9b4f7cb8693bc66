//! Repository and ingestion configuration file support.
//!
//! This module provides utilities for reading backend selection and
//! ingestion tunables from TOML configuration files.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use super::factory::RepositoryType;
use super::repository::RepositoryError;
use crate::models::TimeOfDay;

/// Repository configuration from file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    pub repository: RepositorySettings,
    #[serde(default)]
    pub ingest: IngestSettings,
}

/// Repository type settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositorySettings {
    #[serde(rename = "type")]
    pub repo_type: String,
}

/// Ingestion tunables, all with conservative defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestSettings {
    /// Maximum parsed entries returned in a dry-run preview.
    #[serde(default = "default_preview_limit")]
    pub preview_limit: usize,
    /// Daily teaching-minutes cap per faculty member.
    #[serde(default = "default_max_daily_faculty_minutes")]
    pub max_daily_faculty_minutes: u32,
    /// Start of the fixed lunch window no class may overlap.
    #[serde(default = "default_break_start")]
    pub break_start: TimeOfDay,
    /// End of the fixed lunch window.
    #[serde(default = "default_break_end")]
    pub break_end: TimeOfDay,
}

fn default_preview_limit() -> usize {
    10
}

fn default_max_daily_faculty_minutes() -> u32 {
    8 * 60
}

fn default_break_start() -> TimeOfDay {
    TimeOfDay::from_hm(12, 30).unwrap()
}

fn default_break_end() -> TimeOfDay {
    TimeOfDay::from_hm(13, 30).unwrap()
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            preview_limit: default_preview_limit(),
            max_daily_faculty_minutes: default_max_daily_faculty_minutes(),
            break_start: default_break_start(),
            break_end: default_break_end(),
        }
    }
}

impl RepositoryConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    /// * `Ok(RepositoryConfig)` if successful
    /// * `Err(RepositoryError)` if file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            RepositoryError::ConfigurationError(format!("Failed to read config file: {}", e))
        })?;

        let config: RepositoryConfig = toml::from_str(&content).map_err(|e| {
            RepositoryError::ConfigurationError(format!("Failed to parse config file: {}", e))
        })?;

        Ok(config)
    }

    /// Load configuration from the default location.
    ///
    /// Searches for `repository.toml` in the current directory, then the
    /// parent directory.
    pub fn from_default_location() -> Result<Self, RepositoryError> {
        let search_paths = [
            PathBuf::from("repository.toml"),
            PathBuf::from("../repository.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(RepositoryError::ConfigurationError(
            "No repository.toml found in standard locations".to_string(),
        ))
    }

    /// Get the repository type from configuration.
    pub fn repository_type(&self) -> Result<RepositoryType, String> {
        RepositoryType::from_str(&self.repository.repo_type)
    }
}
