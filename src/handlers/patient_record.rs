//! `get_patient_info`: redacted record lookup answered by the model.

use async_trait::async_trait;

use crate::compliance::audit::details;
use crate::handlers::{missing, prompt, rejected, role_param, HandlerContext, GET_PATIENT_INFO};
use crate::tools::{CallArguments, ParamDef, ToolDefinition, ToolHandler, ToolResult};
use crate::types::{Error, PatientId, Result, Role};
use crate::validation::{patient_id_field, str_field};

#[derive(Debug)]
pub struct PatientRecordLookup {
    context: HandlerContext,
    definition: ToolDefinition,
}

impl PatientRecordLookup {
    pub fn new(context: HandlerContext) -> Self {
        let definition = ToolDefinition::new(
            GET_PATIENT_INFO,
            "Get patient information from EHR system",
            vec![
                ParamDef::required("patient_id", "Patient ID"),
                role_param(),
                ParamDef::required("query", "Specific information requested"),
            ],
        );
        Self { context, definition }
    }

    async fn parse(&self, arguments: &mut CallArguments) -> Result<(Role, PatientId, String)> {
        let role = self.context.prepare(&self.definition, arguments).await?;
        let patient_id = patient_id_field(arguments, "patient_id")?;
        let query = str_field(arguments, "query")?;
        Ok((role, patient_id, query))
    }
}

#[async_trait]
impl ToolHandler for PatientRecordLookup {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, mut arguments: CallArguments) -> Result<ToolResult> {
        let ctx = &self.context;
        let (role, patient_id, query) = match self.parse(&mut arguments).await {
            Ok(parsed) => parsed,
            Err(e) => return Ok(rejected(GET_PATIENT_INFO, e)),
        };

        ctx.audit
            .log_audit(
                role.as_str(),
                GET_PATIENT_INFO,
                patient_id.as_str(),
                details("query", query.as_str()),
            )
            .await;

        let Some(record) = ctx.redacted_record(&patient_id, role).await else {
            return Ok(missing(Error::not_found(format!(
                "Patient {} not found",
                patient_id
            ))));
        };

        let prompt = prompt::patient_record_prompt(role, &record, &query);
        let response = ctx.model.invoke(&prompt).await;
        ctx.audit.log_prompt(role.as_str(), &query, &response).await;

        Ok(ToolResult::text(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compliance::LogKind;
    use crate::handlers::testing::{args, Fixture};
    use serde_json::json;

    #[tokio::test]
    async fn test_doctor_lookup_redacts_and_answers() {
        let fx = Fixture::new();
        fx.write_record("7", json!({"name": "Jane Doe", "diagnosis": "asthma"}));
        let handler = PatientRecordLookup::new(fx.context.clone());

        let result = handler
            .execute(args(json!({"patient_id": "7", "role": "doctor", "query": "summary"})))
            .await
            .unwrap();
        assert_eq!(result.first_text(), Some("model reply"));

        let prompts = fx.model.calls();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("\"name\": \"Ja****oe\""));
        assert!(prompts[0].contains("\"diagnosis\": \"asthma\""));
        assert!(!prompts[0].contains("Jane Doe"));

        let audits = fx.context.audit.entries(LogKind::Audit).await.unwrap();
        assert_eq!(audits.len(), 1);
        assert_eq!(audits[0]["action"], "get_patient_info");
        assert_eq!(audits[0]["patient_id"], "7");
        assert_eq!(audits[0]["details"]["query"], "summary");

        let logged = fx.context.audit.entries(LogKind::Prompt).await.unwrap();
        assert_eq!(logged[0]["prompt"], "summary");
        assert_eq!(logged[0]["response"], "model reply");
    }

    #[tokio::test]
    async fn test_administrator_sees_unmasked_record() {
        let fx = Fixture::new();
        fx.write_record("7", json!({"name": "Jane Doe"}));
        let handler = PatientRecordLookup::new(fx.context.clone());

        handler
            .execute(args(json!({"patient_id": "7", "role": "administrator", "query": "q"})))
            .await
            .unwrap();
        assert!(fx.model.calls()[0].contains("Jane Doe"));
    }

    #[tokio::test]
    async fn test_missing_patient_audits_once_and_skips_model() {
        let fx = Fixture::new();
        let handler = PatientRecordLookup::new(fx.context.clone());

        let result = handler
            .execute(args(json!({"patient_id": "42", "role": "doctor", "query": "q"})))
            .await
            .unwrap();

        assert_eq!(result.first_text(), Some("Patient 42 not found"));
        assert!(!result.is_error);
        assert_eq!(fx.context.audit.count(LogKind::Audit).await.unwrap(), 1);
        assert_eq!(fx.context.audit.count(LogKind::Prompt).await.unwrap(), 0);
        assert!(fx.model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_argument_is_text_result() {
        let fx = Fixture::new();
        let handler = PatientRecordLookup::new(fx.context.clone());

        let result = handler
            .execute(args(json!({"patient_id": "7", "role": "doctor"})))
            .await
            .unwrap();

        let text = result.first_text().unwrap();
        assert!(text.contains("Missing required parameter: query"), "{}", text);
        assert_eq!(fx.context.audit.count(LogKind::Audit).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_path_like_patient_id_is_rejected() {
        let fx = Fixture::new();
        let handler = PatientRecordLookup::new(fx.context.clone());

        let result = handler
            .execute(args(json!({"patient_id": "../secrets", "role": "doctor", "query": "q"})))
            .await
            .unwrap();
        assert!(result.first_text().unwrap().contains("invalid patient_id"));
        assert!(fx.model.calls().is_empty());
    }
}
