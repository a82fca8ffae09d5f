use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::pipeline::{
    error::{PipelineError, collaborator_error, internal_error},
    ports::AuditPort,
};

/// Audit sink appending one JSON line per record to a log file.
///
/// Writes are serialized behind a mutex so concurrent dispatches cannot
/// interleave partial lines. Keys serialize in sorted order, which keeps
/// the log diffable and grep-friendly.
pub struct JsonlAuditLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlAuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create audit log directory {}", parent.display())
            })?;
        }
        Ok(Self {
            path,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AuditPort for JsonlAuditLog {
    async fn record(&self, fields: Map<String, Value>) -> Result<(), PipelineError> {
        let line = serde_json::to_string(&Value::Object(fields))
            .map_err(|err| internal_error(format!("failed to serialize audit record: {err}")))?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| internal_error("audit log mutex poisoned"))?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|err| {
                collaborator_error(format!(
                    "failed to open audit log {}: {err}",
                    self.path.display()
                ))
            })?;
        writeln!(file, "{line}")
            .map_err(|err| collaborator_error(format!("failed to append audit record: {err}")))
    }
}
