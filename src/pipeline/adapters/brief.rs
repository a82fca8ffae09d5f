use async_trait::async_trait;
use serde_json::json;

use crate::pipeline::{
    error::{PipelineError, collaborator_error},
    intent::ExecutionIntent,
    ports::BriefWriterPort,
};

/// Default writer producing the charter-standard brief body.
#[derive(Debug, Clone, Copy, Default)]
pub struct CharterBriefWriter;

#[async_trait]
impl BriefWriterPort for CharterBriefWriter {
    async fn render(&self, intent: &ExecutionIntent) -> Result<String, PipelineError> {
        let summary = json!({
            "title": intent.title(),
            "description": intent.description(),
            "actions": intent.actions(),
            "evidence": intent.evidence_urls(),
        });
        let payload = serde_json::to_string_pretty(&summary)
            .map_err(|err| collaborator_error(format!("failed to render brief payload: {err}")))?;

        Ok(format!(
            "## Charter Brief\n\
             **Reflex:** {}\n\
             **Urgency:** {}\n\
             **Source Event:** {}\n\n\
             {}\n\n\
             ### Operational Payload\n\
             ```json\n{}\n```",
            intent.reflex(),
            intent.urgency(),
            intent.source_event(),
            intent.description(),
            payload
        ))
    }
}
