use std::{collections::BTreeMap, sync::Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::pipeline::{
    error::{PipelineError, collaborator_error, internal_error},
    ports::{SprintSpec, SubtaskSpec, TaskSpec, TrackerPort},
};

#[derive(Debug, Clone)]
pub struct TaskRecord {
    pub spec: TaskSpec,
    pub subtasks: Vec<SubtaskSpec>,
}

/// In-memory tracker used for development and tests.
///
/// Mutations are serialized behind a mutex, so the same instance can back
/// concurrent dispatches. Production deployments replace this with an HTTP
/// client for the real Teamwork Projects API.
#[derive(Default)]
pub struct InMemoryTracker {
    inner: Mutex<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    tasks: BTreeMap<String, TaskRecord>,
    sprints: BTreeMap<String, SprintSpec>,
}

impl InMemoryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn task(&self, task_id: &str) -> Option<TaskRecord> {
        self.inner
            .lock()
            .ok()
            .and_then(|state| state.tasks.get(task_id).cloned())
    }

    pub fn subtask_names(&self, task_id: &str) -> Vec<String> {
        self.inner
            .lock()
            .ok()
            .and_then(|state| {
                state
                    .tasks
                    .get(task_id)
                    .map(|record| record.subtasks.iter().map(|sub| sub.name.clone()).collect())
            })
            .unwrap_or_default()
    }

    pub fn task_count(&self) -> usize {
        self.inner.lock().map(|state| state.tasks.len()).unwrap_or(0)
    }

    pub fn sprints(&self) -> Vec<SprintSpec> {
        self.inner
            .lock()
            .map(|state| state.sprints.values().cloned().collect())
            .unwrap_or_default()
    }
}

fn next_id(prefix: &str) -> String {
    format!("{prefix}:{}", Uuid::now_v7().simple())
}

#[async_trait]
impl TrackerPort for InMemoryTracker {
    async fn create_task(&self, spec: TaskSpec) -> Result<String, PipelineError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| internal_error("tracker state mutex poisoned"))?;
        let task_id = next_id("task");
        state.tasks.insert(
            task_id.clone(),
            TaskRecord {
                spec,
                subtasks: Vec::new(),
            },
        );
        Ok(task_id)
    }

    async fn create_subtask(&self, spec: SubtaskSpec) -> Result<String, PipelineError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| internal_error("tracker state mutex poisoned"))?;
        let record = state
            .tasks
            .get_mut(&spec.parent_id)
            .ok_or_else(|| collaborator_error(format!("parent task {} not found", spec.parent_id)))?;
        let subtask_id = next_id("subtask");
        record.subtasks.push(spec);
        Ok(subtask_id)
    }

    async fn create_sprint(&self, spec: SprintSpec) -> Result<String, PipelineError> {
        let mut state = self
            .inner
            .lock()
            .map_err(|_| internal_error("tracker state mutex poisoned"))?;
        let sprint_id = next_id("sprint");
        state.sprints.insert(sprint_id.clone(), spec);
        Ok(sprint_id)
    }
}
