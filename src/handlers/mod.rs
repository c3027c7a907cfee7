//! Request handlers: the clinical capabilities exposed as tools.
//!
//! Each handler validates its arguments, writes an audit event, loads and
//! redacts whatever patient data it needs, builds a prompt, invokes the
//! external model, logs the prompt/response pair and returns the reply.
//! Validation failures and missing data come back as plain text results.

pub mod conversation;
pub mod imaging;
pub mod patient_record;
pub mod prompt;

pub use conversation::ConversationalAssistant;
pub use imaging::ImagingAnalysis;
pub use patient_record::PatientRecordLookup;

use serde_json::{json, Value};
use std::sync::Arc;

use crate::compliance::{AuditTrail, RedactionPolicy};
use crate::model::{ImagingModel, ModelInvoker, ProcessImagingModel, ProcessModelInvoker};
use crate::store::{FileImageStore, FileRecordStore, ImageStore, RecordStore};
use crate::tools::{CallArguments, ParamDef, ParamType, ToolDefinition, ToolDispatcher, ToolResult};
use crate::types::{Config, Error, PatientId, Result, Role};
use crate::validation::{parse_role, role_field};

pub const GET_PATIENT_INFO: &str = "get_patient_info";
pub const ANALYZE_XRAY: &str = "analyze_xray";
pub const CHAT_WITH_AGENT: &str = "chat_with_agent";

/// Collaborators shared by every handler.
#[derive(Debug, Clone)]
pub struct HandlerContext {
    pub audit: Arc<AuditTrail>,
    pub redaction: Arc<RedactionPolicy>,
    pub model: Arc<dyn ModelInvoker>,
    pub records: Arc<dyn RecordStore>,
}

impl HandlerContext {
    /// Normalize and validate call arguments, returning the caller's role.
    ///
    /// An unrecognized role is also written to the violation log.
    pub(crate) async fn prepare(
        &self,
        definition: &ToolDefinition,
        arguments: &mut CallArguments,
    ) -> Result<Role> {
        if !arguments.contains_key("role") {
            if let Some(legacy) = arguments.get("user_role").cloned() {
                arguments.insert("role".to_string(), legacy);
            }
        }
        definition.fill_defaults(arguments);

        if let Some(raw) = arguments.get("role").and_then(Value::as_str) {
            if let Err(e) = parse_role(raw) {
                tracing::warn!(tool = %definition.name, role = %raw, "Rejected unrecognized role");
                self.audit
                    .log_violation(
                        raw,
                        "invalid_role",
                        json!({"tool": definition.name, "reason": e.to_string()}),
                    )
                    .await;
            }
        }

        let errors = definition.validate_arguments(arguments);
        if !errors.is_empty() {
            return Err(Error::validation(errors.join("; ")));
        }
        parse_role(&role_field(arguments)?)
    }

    /// Best-effort redacted record: `None` when the patient has no record.
    pub(crate) async fn redacted_record(
        &self,
        patient_id: &PatientId,
        role: Role,
    ) -> Option<Value> {
        let record = self.records.load(patient_id).await?;
        Some(self.redaction.apply(&record, role))
    }
}

/// Text result describing a rejected call.
pub(crate) fn rejected(tool: &str, err: Error) -> ToolResult {
    let reason = match err {
        Error::Validation(msg) => msg,
        other => other.to_string(),
    };
    tracing::info!(tool = %tool, reason = %reason, "Tool call rejected");
    ToolResult::text(format!("Invalid request for {}: {}", tool, reason))
}

/// Text result for a record or image that does not exist.
pub(crate) fn missing(err: Error) -> ToolResult {
    let message = match err {
        Error::NotFound(msg) => msg,
        other => other.to_string(),
    };
    tracing::info!(reason = %message, "Requested data not found");
    ToolResult::text(message)
}

pub(crate) fn role_param() -> ParamDef {
    ParamDef::required("role", "User role (doctor/administrator)").with_type(ParamType::Enum(
        Role::ALL.iter().map(|r| r.as_str().to_string()).collect(),
    ))
}

/// Dispatcher with the three clinical tools registered.
pub fn build_dispatcher(
    context: HandlerContext,
    images: Arc<dyn ImageStore>,
    imaging_model: Arc<dyn ImagingModel>,
) -> ToolDispatcher {
    let mut dispatcher = ToolDispatcher::new();
    dispatcher.register(Arc::new(PatientRecordLookup::new(context.clone())));
    dispatcher.register(Arc::new(ImagingAnalysis::new(
        context.clone(),
        images,
        imaging_model,
    )));
    dispatcher.register(Arc::new(ConversationalAssistant::new(context)));
    dispatcher
}

/// Wire file-backed stores, the audit trail and the model processes from
/// configuration.
pub fn dispatcher_from_config(config: &Config) -> Result<ToolDispatcher> {
    let context = HandlerContext {
        audit: Arc::new(AuditTrail::from_config(&config.audit)),
        redaction: Arc::new(RedactionPolicy::new()),
        model: Arc::new(ProcessModelInvoker::from_config(&config.model)?),
        records: Arc::new(FileRecordStore::new(&config.storage.records_dir)),
    };
    let images = Arc::new(FileImageStore::new(&config.storage.images_dir));
    let imaging_model = ProcessImagingModel::from_config(&config.imaging)?;

    tracing::info!(
        records = %config.storage.records_dir.display(),
        images = %config.storage.images_dir.display(),
        logs = %config.audit.log_dir.display(),
        "Clinical tools configured"
    );
    Ok(build_dispatcher(context, images, imaging_model))
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::compliance::LogKind;
    use crate::model::UnloadedImagingModel;
    use crate::tools::ToolHandler;

    #[tokio::test]
    async fn test_prepare_accepts_legacy_user_role() {
        let fx = Fixture::new();
        let definition = PatientRecordLookup::new(fx.context.clone()).definition();
        let mut arguments = args(json!({
            "patient_id": "1",
            "user_role": "Administrator",
            "query": "q",
        }));

        let role = fx.context.prepare(&definition, &mut arguments).await.unwrap();
        assert_eq!(role, Role::Administrator);
    }

    #[tokio::test]
    async fn test_prepare_logs_violation_for_unknown_role() {
        let fx = Fixture::new();
        let definition = ConversationalAssistant::new(fx.context.clone()).definition();
        let mut arguments = args(json!({"role": "nurse", "message": "hi"}));

        let err = fx.context.prepare(&definition, &mut arguments).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let violations = fx.context.audit.entries(LogKind::Violation).await.unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0]["user_role"], "nurse");
        assert_eq!(violations[0]["violation_type"], "invalid_role");
        assert_eq!(fx.context.audit.count(LogKind::Audit).await.unwrap(), 0);
    }

    #[test]
    fn test_build_dispatcher_registers_three_tools() {
        let fx = Fixture::new();
        let dispatcher = build_dispatcher(
            fx.context.clone(),
            Arc::new(FileImageStore::new(fx.dir.path())),
            Arc::new(UnloadedImagingModel),
        );
        let names: Vec<String> = dispatcher
            .list_definitions()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec![GET_PATIENT_INFO, ANALYZE_XRAY, CHAT_WITH_AGENT]);
    }

    #[test]
    fn test_dispatcher_from_config_rejects_empty_model_command() {
        let mut config = Config::default();
        config.model.command.clear();
        assert!(dispatcher_from_config(&config).is_err());

        config.model.command = vec!["cat".to_string()];
        let dispatcher = dispatcher_from_config(&config).unwrap();
        assert_eq!(dispatcher.len(), 3);
    }
}
