use std::fmt;

use serde::{Deserialize, Serialize};

/// Dispatch stage at which a collaborator call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStage {
    ResolveClient,
    RenderBrief,
    CreateTask,
    CreateSubtask,
    CreateSprint,
    Notify,
    Audit,
}

impl DispatchStage {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchStage::ResolveClient => "resolve_client",
            DispatchStage::RenderBrief => "render_brief",
            DispatchStage::CreateTask => "create_task",
            DispatchStage::CreateSubtask => "create_subtask",
            DispatchStage::CreateSprint => "create_sprint",
            DispatchStage::Notify => "notify",
            DispatchStage::Audit => "audit",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineErrorKind {
    /// The raw payload failed execution-intent schema validation.
    InvalidIntent,
    /// The client id has no entry in the routing table.
    UnknownClient,
    /// The routing entry exists but lacks a tracker project id.
    MisconfiguredClient,
    /// A collaborator call failed; `stage` names which one.
    Collaborator,
    Internal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineError {
    pub kind: PipelineErrorKind,
    pub message: String,
    pub stage: Option<DispatchStage>,
}

impl PipelineError {
    pub fn new(kind: PipelineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stage: None,
        }
    }

    pub fn with_stage(mut self, stage: DispatchStage) -> Self {
        self.stage = Some(stage);
        self
    }

    /// Tags the error with a stage only if no earlier stage claimed it.
    pub fn at_stage(mut self, stage: DispatchStage) -> Self {
        if self.stage.is_none() {
            self.stage = Some(stage);
        }
        self
    }
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(f, "{} (stage={})", self.message, stage.as_str()),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for PipelineError {}

pub fn invalid_intent(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::InvalidIntent, message)
}

pub fn unknown_client(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::UnknownClient, message)
}

pub fn misconfigured_client(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::MisconfiguredClient, message)
}

pub fn collaborator_error(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::Collaborator, message)
}

pub fn internal_error(message: impl Into<String>) -> PipelineError {
    PipelineError::new(PipelineErrorKind::Internal, message)
}
