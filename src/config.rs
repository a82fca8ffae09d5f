use std::{fs, path::{Path, PathBuf}};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::pipeline::{DEFAULT_SIGNER, default_sprint_reflexes, routing::RoutingTable};

/// Process-wide pipeline configuration, loaded once at startup.
///
/// The `clients` table is the client matrix: every client the pipeline may
/// dispatch for must appear here with its tracker project id.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub clients: RoutingTable,
    #[serde(default = "default_signer")]
    pub signer: String,
    #[serde(default = "default_sprint_reflex_names")]
    pub sprint_reflexes: Vec<String>,
    #[serde(default)]
    pub notifier: NotifierConfig,
    #[serde(default = "default_audit_log_path")]
    pub audit_log_path: PathBuf,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Chat webhook endpoint. When unset, the pipeline runs without a
    /// notifier and the notification step is skipped.
    #[serde(default)]
    pub webhook_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_dir")]
    pub dir: PathBuf,
    #[serde(default = "default_logging_filter")]
    pub filter: String,
    #[serde(default = "default_enabled_true")]
    pub stderr_warn_enabled: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            dir: default_logging_dir(),
            filter: default_logging_filter(),
            stderr_warn_enabled: true,
        }
    }
}

fn default_signer() -> String {
    DEFAULT_SIGNER.to_string()
}

fn default_sprint_reflex_names() -> Vec<String> {
    default_sprint_reflexes().into_iter().collect()
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./logs/custodian_hub.log")
}

fn default_logging_dir() -> PathBuf {
    PathBuf::from("./logs/pipeline")
}

fn default_logging_filter() -> String {
    "info".to_string()
}

fn default_enabled_true() -> bool {
    true
}

pub fn load_config(path: &Path) -> Result<PipelineConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    let config: PipelineConfig = json5::from_str(&raw)
        .with_context(|| format!("failed to parse config file {}", path.display()))?;
    if config.clients.is_empty() {
        tracing::warn!(
            target: "config",
            path = %path.display(),
            "client matrix is empty; every dispatch will fail client resolution"
        );
    }
    Ok(config)
}
