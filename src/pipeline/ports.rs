use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::pipeline::{error::PipelineError, intent::ExecutionIntent};

/// Request to create one primary task in a tracker project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskSpec {
    pub project_id: String,
    pub name: String,
    pub description: String,
    pub due_date: Option<String>,
    pub tags: Vec<String>,
    pub evidence_urls: Vec<String>,
    pub assignees: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskSpec {
    pub parent_id: String,
    pub name: String,
    pub project_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SprintSpec {
    pub project_id: String,
    pub name: String,
    pub tasks: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Task-tracker capability required by the dispatch pipeline.
///
/// Implementations must be safe for concurrent use; the pipeline may be
/// driven from multiple tasks at once and performs no locking of its own.
#[async_trait]
pub trait TrackerPort: Send + Sync {
    async fn create_task(&self, spec: TaskSpec) -> Result<String, PipelineError>;

    async fn create_subtask(&self, spec: SubtaskSpec) -> Result<String, PipelineError>;

    async fn create_sprint(&self, spec: SprintSpec) -> Result<String, PipelineError>;
}

/// Writer agent that renders the human-readable brief for a task body.
#[async_trait]
pub trait BriefWriterPort: Send + Sync {
    async fn render(&self, intent: &ExecutionIntent) -> Result<String, PipelineError>;
}

/// Append-only audit sink. Transport failures are the sink's own concern;
/// a returned error still aborts the dispatch that triggered it.
#[async_trait]
pub trait AuditPort: Send + Sync {
    async fn record(&self, fields: Map<String, Value>) -> Result<(), PipelineError>;
}

/// Role-id addressed notification transport. Absence of a notifier is a
/// valid pipeline configuration.
#[async_trait]
pub trait NotifierPort: Send + Sync {
    async fn notify(
        &self,
        role_ids: &[String],
        message: &str,
        metadata: Map<String, Value>,
    ) -> Result<(), PipelineError>;
}
