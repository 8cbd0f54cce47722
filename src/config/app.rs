//! Application configuration loading from config.toml
//!
//! The file describes the agency letterhead printed on reports, where reports
//! are written, and optionally the database URL. Every section except
//! `[agency]` has defaults.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Database settings
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Agency details for the report letterhead
    pub agency: AgencyConfig,
    /// Report export settings
    #[serde(default)]
    pub report: ReportConfig,
}

/// `[database]` section
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Connection URL; `DATABASE_URL` takes precedence when set
    pub url: Option<String>,
}

/// `[agency]` section
#[derive(Debug, Clone, Deserialize)]
pub struct AgencyConfig {
    /// Agency name, first line of the letterhead
    pub name: String,
    /// Street address
    pub address: Option<String>,
    /// Contact phone
    pub phone: Option<String>,
    /// Contact email
    pub email: Option<String>,
}

/// `[report]` section
#[derive(Debug, Clone, Deserialize)]
pub struct ReportConfig {
    /// Prefix printed before amounts, e.g. "PKR"
    #[serde(default = "default_currency_prefix")]
    pub currency_prefix: String,
    /// Directory exported reports are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            currency_prefix: default_currency_prefix(),
            output_dir: default_output_dir(),
        }
    }
}

fn default_currency_prefix() -> String {
    "PKR".to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("reports")
}

/// Loads configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - Required fields are missing
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading configuration from {}", path_ref.display());
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_config(&contents)
}

/// Parses configuration from TOML text
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}
