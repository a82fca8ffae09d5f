use std::{collections::BTreeSet, sync::Arc};

use serde_json::{Map, Value, json};
use time::{OffsetDateTime, macros::format_description};

use crate::pipeline::{
    error::{DispatchStage, PipelineError, internal_error},
    intent::ExecutionIntent,
    ports::{AuditPort, BriefWriterPort, NotifierPort, SprintSpec, SubtaskSpec, TaskSpec, TrackerPort},
    routing::{ClientRoute, RoutingTable},
};

pub const DEFAULT_SIGNER: &str = "teamwork_pipeline_v1";

pub const AUDIT_EVENT: &str = "teamwork_pipeline_dispatch";

/// Reflex classes that escalate to a sprint window at high urgency.
pub fn default_sprint_reflexes() -> BTreeSet<String> {
    ["algorithm_reflex", "competitor_reflex", "market_reflex"]
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Input accepted by [`DispatchPipeline::dispatch`]: either an already
/// validated intent or a raw payload validated on entry.
#[derive(Debug, Clone)]
pub enum DispatchInput {
    Intent(ExecutionIntent),
    Payload(Value),
}

impl From<ExecutionIntent> for DispatchInput {
    fn from(intent: ExecutionIntent) -> Self {
        DispatchInput::Intent(intent)
    }
}

impl From<Value> for DispatchInput {
    fn from(payload: Value) -> Self {
        DispatchInput::Payload(payload)
    }
}

/// Converts reflex execution intents into structured tracker work.
///
/// Holds no per-call mutable state; `dispatch` is reentrant provided the
/// collaborators behind the ports are themselves safe for concurrent use.
/// No step is retried and nothing is rolled back on failure: a collaborator
/// error after task creation leaves the task in place and surfaces the
/// failing stage to the caller.
pub struct DispatchPipeline {
    tracker: Arc<dyn TrackerPort>,
    writer: Arc<dyn BriefWriterPort>,
    audit: Arc<dyn AuditPort>,
    notifier: Option<Arc<dyn NotifierPort>>,
    routing: RoutingTable,
    signer: String,
    sprint_reflexes: BTreeSet<String>,
}

impl DispatchPipeline {
    pub fn new(
        tracker: Arc<dyn TrackerPort>,
        routing: RoutingTable,
        writer: Arc<dyn BriefWriterPort>,
        audit: Arc<dyn AuditPort>,
    ) -> Self {
        Self {
            tracker,
            writer,
            audit,
            notifier: None,
            routing,
            signer: DEFAULT_SIGNER.to_string(),
            sprint_reflexes: default_sprint_reflexes(),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotifierPort>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn with_signer(mut self, signer: impl Into<String>) -> Self {
        self.signer = signer.into();
        self
    }

    pub fn with_sprint_reflexes(mut self, reflexes: impl IntoIterator<Item = String>) -> Self {
        self.sprint_reflexes = reflexes.into_iter().collect();
        self
    }

    /// Primary entry point: turns one execution intent into a tracker
    /// task, its subtasks, an optional sprint, an optional notification,
    /// and exactly one audit record. Returns the created task id.
    #[tracing::instrument(name = "pipeline_dispatch", target = "teamwork_pipeline", skip(self, input))]
    pub async fn dispatch(&self, input: impl Into<DispatchInput>) -> Result<String, PipelineError> {
        let intent = match input.into() {
            DispatchInput::Intent(intent) => intent,
            DispatchInput::Payload(payload) => ExecutionIntent::from_payload(&payload)?,
        };

        let (route, project_id) = self.routing.resolve(intent.client_id())?;
        tracing::debug!(
            target: "teamwork_pipeline",
            client_id = %intent.client_id(),
            reflex = %intent.reflex(),
            urgency = intent.urgency(),
            project_id = %project_id,
            "dispatch_started"
        );

        let description = self
            .writer
            .render(&intent)
            .await
            .map_err(|err| err.at_stage(DispatchStage::RenderBrief))?;

        let task_id = self
            .tracker
            .create_task(TaskSpec {
                project_id: project_id.to_string(),
                name: intent.title().to_string(),
                description,
                due_date: intent.due_date().map(str::to_string),
                tags: intent.merged_tags(),
                evidence_urls: intent.evidence_urls().to_vec(),
                assignees: route.default_assignees.clone(),
            })
            .await
            .map_err(|err| err.at_stage(DispatchStage::CreateTask))?;
        tracing::info!(
            target: "teamwork_pipeline",
            client_id = %intent.client_id(),
            task_id = %task_id,
            "task_created"
        );

        for action in intent.actions() {
            self.tracker
                .create_subtask(SubtaskSpec {
                    parent_id: task_id.clone(),
                    name: action.clone(),
                    project_id: project_id.to_string(),
                })
                .await
                .map_err(|err| err.at_stage(DispatchStage::CreateSubtask))?;
        }

        let sprint_id = if self.should_create_sprint(&intent) {
            let sprint_id = self
                .tracker
                .create_sprint(self.build_sprint_spec(&intent, project_id, &task_id)?)
                .await
                .map_err(|err| err.at_stage(DispatchStage::CreateSprint))?;
            tracing::info!(
                target: "teamwork_pipeline",
                client_id = %intent.client_id(),
                sprint_id = %sprint_id,
                "sprint_created"
            );
            Some(sprint_id)
        } else {
            None
        };

        self.notify_roles(&intent, route, &task_id, sprint_id.as_deref())
            .await?;
        self.log_dispatch(&intent, &task_id, sprint_id.as_deref())
            .await?;

        Ok(task_id)
    }

    fn should_create_sprint(&self, intent: &ExecutionIntent) -> bool {
        intent.urgency() >= 4 && self.sprint_reflexes.contains(intent.reflex())
    }

    fn build_sprint_spec(
        &self,
        intent: &ExecutionIntent,
        project_id: &str,
        task_id: &str,
    ) -> Result<SprintSpec, PipelineError> {
        let due = match intent.due_date() {
            Some(due) => due.to_string(),
            None => today_iso()?,
        };
        let window = |key: &str| {
            intent
                .metadata()
                .get(key)
                .and_then(Value::as_str)
                .filter(|text| !text.trim().is_empty())
                .map(str::to_string)
        };
        Ok(SprintSpec {
            project_id: project_id.to_string(),
            name: format!("{} – Reflex Window – {}", intent.client_id(), due),
            tasks: vec![task_id.to_string()],
            start_date: window("window_start"),
            end_date: window("window_end").or_else(|| intent.due_date().map(str::to_string)),
        })
    }

    async fn notify_roles(
        &self,
        intent: &ExecutionIntent,
        route: &ClientRoute,
        task_id: &str,
        sprint_id: Option<&str>,
    ) -> Result<(), PipelineError> {
        let Some(notifier) = &self.notifier else {
            return Ok(());
        };
        let Some(role_ids) = route.notify_roles() else {
            tracing::debug!(
                target: "teamwork_pipeline",
                client_id = %intent.client_id(),
                "notify_skipped_no_roles"
            );
            return Ok(());
        };

        let metadata = json_object(json!({
            "task_id": task_id,
            "client_id": intent.client_id(),
            "sprint_id": sprint_id,
            "source_event": intent.source_event(),
            "urgency": intent.urgency(),
        }))?;
        let message = format!(
            "[Reflex:{}] {} is live in Teamwork for client {}",
            intent.reflex(),
            intent.title(),
            intent.client_id()
        );

        notifier
            .notify(role_ids, &message, metadata)
            .await
            .map_err(|err| err.at_stage(DispatchStage::Notify))
    }

    async fn log_dispatch(
        &self,
        intent: &ExecutionIntent,
        task_id: &str,
        sprint_id: Option<&str>,
    ) -> Result<(), PipelineError> {
        let mut fields = json_object(json!({
            "event": AUDIT_EVENT,
            "client": intent.client_id(),
            "task_id": task_id,
            "sprint_id": sprint_id,
            "event_id": intent.source_event(),
            "confidence": intent.confidence(),
            "due": intent.due_date(),
            "signer": self.signer,
            "content_hash": intent.content_fingerprint(),
            "tags": intent.merged_tags(),
        }))?;
        // Intent metadata is merged last and may overwrite the fixed
        // fields; this passthrough is deliberate.
        for (key, value) in intent.metadata() {
            fields.insert(key.clone(), value.clone());
        }

        self.audit
            .record(fields)
            .await
            .map_err(|err| err.at_stage(DispatchStage::Audit))
    }
}

fn json_object(value: Value) -> Result<Map<String, Value>, PipelineError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(internal_error("expected a JSON object")),
    }
}

fn today_iso() -> Result<String, PipelineError> {
    let format = format_description!("[year]-[month]-[day]");
    OffsetDateTime::now_utc()
        .date()
        .format(&format)
        .map_err(|err| internal_error(format!("failed to format dispatch date: {err}")))
}
