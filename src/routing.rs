//! Natural-language request routing.
//!
//! Turns an operator's free-text turn into a tool call: keyword intent
//! classification, patient-id extraction, and per-session patient context.

use regex::Regex;
use serde_json::{json, Value};
use std::sync::OnceLock;

use crate::handlers::{ANALYZE_XRAY, CHAT_WITH_AGENT, GET_PATIENT_INFO};
use crate::tools::{CallArguments, ToolDispatcher};
use crate::types::{PatientId, Result, Role, SessionId};

const RECORD_KEYWORDS: [&str; 7] = [
    "notes",
    "information",
    "summary",
    "details",
    "record",
    "history",
    "data",
];

const IMAGING_KEYWORDS: [&str; 6] = ["xray", "x-ray", "scan", "imaging", "radiolog", "chest"];

/// Reply used when a tool returns no text.
pub const EMPTY_REPLY: &str = "I apologize, but I couldn't generate a proper response.";

#[allow(clippy::expect_used)]
fn patient_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)\b(?:patient(?:\s+id)?\s+|pt\s+|patient_)(\d+)")
            .expect("patient id pattern is valid")
    })
}

/// What the operator is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    PatientRecord,
    Imaging,
    Chat,
}

/// Classify a request by keyword. Record keywords take precedence over imaging ones.
pub fn classify(text: &str) -> Intent {
    let lower = text.to_lowercase();
    if RECORD_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Intent::PatientRecord
    } else if IMAGING_KEYWORDS.iter().any(|k| lower.contains(k)) {
        Intent::Imaging
    } else {
        Intent::Chat
    }
}

/// First patient id mentioned as `patient 7`, `patient id 7`, `pt 7` or `patient_7`.
pub fn extract_patient_id(text: &str) -> Option<PatientId> {
    let captures = patient_id_pattern().captures(text)?;
    PatientId::parse(captures.get(1)?.as_str()).ok()
}

/// A tool name plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolCall {
    pub name: String,
    pub arguments: CallArguments,
}

impl ToolCall {
    fn new(name: &str, arguments: Value) -> Self {
        Self {
            name: name.to_string(),
            arguments: arguments.as_object().cloned().unwrap_or_default(),
        }
    }
}

/// Outcome of routing one turn.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    Call(ToolCall),
    /// The request needs a patient and none is known yet.
    NeedsPatient(String),
}

/// One operator's conversation: fixed role, remembered patient.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    role: Role,
    current_patient: Option<PatientId>,
}

impl Session {
    pub fn new(role: Role) -> Self {
        Self {
            id: SessionId::new(),
            role,
            current_patient: None,
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn current_patient(&self) -> Option<&PatientId> {
        self.current_patient.as_ref()
    }

    pub fn set_current_patient(&mut self, patient_id: Option<PatientId>) {
        self.current_patient = patient_id;
    }

    /// Route one turn. A mentioned patient id becomes the session's current patient.
    pub fn route(&mut self, text: &str) -> Routed {
        if let Some(id) = extract_patient_id(text) {
            self.current_patient = Some(id);
        }
        let role = self.role.as_str();

        match (classify(text), &self.current_patient) {
            (Intent::PatientRecord, Some(id)) => Routed::Call(ToolCall::new(
                GET_PATIENT_INFO,
                json!({"patient_id": id.as_str(), "role": role, "query": text}),
            )),
            (Intent::PatientRecord, None) => Routed::NeedsPatient(
                "Please specify which patient you'd like information about (e.g., 'patient 1')."
                    .to_string(),
            ),
            (Intent::Imaging, Some(id)) => Routed::Call(ToolCall::new(
                ANALYZE_XRAY,
                json!({"patient_id": id.as_str(), "role": role, "query": text}),
            )),
            (Intent::Imaging, None) => Routed::NeedsPatient(
                "Please specify which patient's X-ray you'd like me to analyze (e.g., 'analyze xray for patient 1')."
                    .to_string(),
            ),
            (Intent::Chat, current) => Routed::Call(ToolCall::new(
                CHAT_WITH_AGENT,
                json!({
                    "role": role,
                    "message": text,
                    "patient_context": current.as_ref().map(|id| id.as_str()).unwrap_or(""),
                }),
            )),
        }
    }

    /// Route one turn and run it, returning the reply text.
    pub async fn ask(&mut self, dispatcher: &ToolDispatcher, text: &str) -> Result<String> {
        let call = match self.route(text) {
            Routed::Call(call) => call,
            Routed::NeedsPatient(prompt) => return Ok(prompt),
        };
        tracing::debug!(session = %self.id, tool = %call.name, "Routed request");

        let result = dispatcher.dispatch(&call.name, call.arguments).await?;
        Ok(result.first_text().unwrap_or(EMPTY_REPLY).to_string())
    }
}
