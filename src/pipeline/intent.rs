use std::collections::BTreeSet;

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::{Date, macros::format_description};

use crate::pipeline::error::{PipelineError, invalid_intent};

const REQUIRED_KEYS: [&str; 11] = [
    "client_id",
    "reflex",
    "urgency",
    "title",
    "description",
    "actions",
    "due_date",
    "tags",
    "evidence_urls",
    "source_event",
    "confidence",
];

/// Validated, immutable representation of one reflex event.
///
/// Construction goes through [`ExecutionIntent::from_payload`], which
/// enforces the full intent schema; a value of this type always satisfies
/// it. Fields are private so no partially-valid instance can be assembled
/// or mutated after the fact.
#[derive(Debug, Clone, Serialize)]
pub struct ExecutionIntent {
    client_id: String,
    reflex: String,
    urgency: u8,
    title: String,
    description: String,
    actions: Vec<String>,
    due_date: Option<String>,
    tags: Vec<String>,
    evidence_urls: Vec<String>,
    source_event: String,
    confidence: f64,
    metadata: Map<String, Value>,
}

impl ExecutionIntent {
    /// Validates an untrusted payload and converts it into an intent.
    ///
    /// The payload must be a JSON object carrying every required key; the
    /// `due_date` key itself is required but its value may be null or
    /// blank. The error message names every missing key at once.
    pub fn from_payload(payload: &Value) -> Result<Self, PipelineError> {
        let object = payload
            .as_object()
            .ok_or_else(|| invalid_intent("execution intent payload must be an object"))?;

        let missing: Vec<&str> = REQUIRED_KEYS
            .iter()
            .copied()
            .filter(|key| !object.contains_key(*key))
            .collect();
        if !missing.is_empty() {
            return Err(invalid_intent(format!(
                "execution intent missing required fields: {}",
                missing.join(", ")
            )));
        }

        let actions = normalize_list(&object["actions"], "actions")?;
        let tags = normalize_list(&object["tags"], "tags")?;
        let evidence_urls = normalize_list(&object["evidence_urls"], "evidence_urls")?;

        let urgency = coerce_int(&object["urgency"], "urgency")?;
        if !(0..=5).contains(&urgency) {
            return Err(invalid_intent("urgency must be between 0 and 5"));
        }

        let confidence = coerce_float(&object["confidence"], "confidence")?;
        if !(0.0..=1.0).contains(&confidence) {
            return Err(invalid_intent("confidence must be between 0 and 1"));
        }

        let due_date = parse_due_date(&object["due_date"])?;

        let metadata = match object.get("metadata") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(map)) => map.clone(),
            Some(_) => return Err(invalid_intent("metadata must be a mapping")),
        };

        Ok(Self {
            client_id: coerce_string(&object["client_id"], "client_id")?,
            reflex: coerce_string(&object["reflex"], "reflex")?,
            urgency: urgency as u8,
            title: coerce_string(&object["title"], "title")?,
            description: coerce_string(&object["description"], "description")?,
            actions,
            due_date,
            tags,
            evidence_urls,
            source_event: coerce_string(&object["source_event"], "source_event")?,
            confidence,
            metadata,
        })
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn reflex(&self) -> &str {
        &self.reflex
    }

    pub fn urgency(&self) -> u8 {
        self.urgency
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn actions(&self) -> &[String] {
        &self.actions
    }

    pub fn due_date(&self) -> Option<&str> {
        self.due_date.as_deref()
    }

    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    pub fn evidence_urls(&self) -> &[String] {
        &self.evidence_urls
    }

    pub fn source_event(&self) -> &str {
        &self.source_event
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Tag set extended with the mandatory reflex markers, sorted and
    /// deduplicated.
    pub fn merged_tags(&self) -> Vec<String> {
        let mut merged = BTreeSet::new();
        merged.insert("reflex".to_string());
        merged.insert("auto".to_string());
        merged.insert(self.reflex.clone());
        merged.extend(self.tags.iter().cloned());
        merged.into_iter().collect()
    }

    /// Stable SHA-256 hex digest over the canonical serialization of all
    /// fields. Key order in the source payload does not affect the digest;
    /// used for audit correlation only.
    pub fn content_fingerprint(&self) -> String {
        let value = serde_json::to_value(self).unwrap_or(Value::Null);
        let canonical = canonicalize_json(&value);
        let mut hasher = Sha256::new();
        hasher.update(canonical.to_string().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

fn coerce_string(value: &Value, field: &str) -> Result<String, PipelineError> {
    match value {
        Value::String(text) => Ok(text.clone()),
        Value::Number(number) => Ok(number.to_string()),
        Value::Bool(flag) => Ok(flag.to_string()),
        _ => Err(invalid_intent(format!("{field} must be a string"))),
    }
}

fn coerce_int(value: &Value, field: &str) -> Result<i64, PipelineError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|float| float.trunc() as i64))
            .ok_or_else(|| invalid_intent(format!("{field} must be an integer"))),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid_intent(format!("{field} must be an integer"))),
        _ => Err(invalid_intent(format!("{field} must be an integer"))),
    }
}

fn coerce_float(value: &Value, field: &str) -> Result<f64, PipelineError> {
    match value {
        Value::Number(number) => number
            .as_f64()
            .ok_or_else(|| invalid_intent(format!("{field} must be a number"))),
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid_intent(format!("{field} must be a number"))),
        _ => Err(invalid_intent(format!("{field} must be a number"))),
    }
}

fn normalize_list(value: &Value, field: &str) -> Result<Vec<String>, PipelineError> {
    let items = value
        .as_array()
        .ok_or_else(|| invalid_intent(format!("{field} must be a list of strings")))?;

    let mut normalized = Vec::with_capacity(items.len());
    for item in items {
        let text = match item {
            Value::String(text) => text.clone(),
            Value::Number(number) => number.to_string(),
            Value::Bool(flag) => flag.to_string(),
            _ => return Err(invalid_intent(format!("{field} must be a list of strings"))),
        };
        let trimmed = text.trim();
        if !trimmed.is_empty() {
            normalized.push(trimmed.to_string());
        }
    }

    if normalized.is_empty() {
        return Err(invalid_intent(format!(
            "{field} must contain at least one entry"
        )));
    }
    Ok(normalized)
}

fn parse_due_date(value: &Value) -> Result<Option<String>, PipelineError> {
    let text = match value {
        Value::Null => return Ok(None),
        Value::String(text) => text.trim(),
        _ => return Err(invalid_intent("due_date must be an ISO-8601 date string")),
    };
    if text.is_empty() {
        return Ok(None);
    }

    let format = format_description!("[year]-[month]-[day]");
    Date::parse(text, &format)
        .map_err(|_| invalid_intent("due_date must be ISO-8601 formatted"))?;
    Ok(Some(text.to_string()))
}

fn canonicalize_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut keys = map.keys().cloned().collect::<Vec<_>>();
            keys.sort();
            let mut sorted = Map::new();
            for key in keys {
                if let Some(item) = map.get(&key) {
                    sorted.insert(key, canonicalize_json(item));
                }
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize_json).collect()),
        primitive => primitive.clone(),
    }
}
