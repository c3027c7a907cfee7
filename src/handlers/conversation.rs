//! `chat_with_agent`: free-form clinical chat with optional patient context.

use async_trait::async_trait;
use serde_json::json;

use crate::compliance::audit::details;
use crate::handlers::{prompt, rejected, role_param, HandlerContext, CHAT_WITH_AGENT};
use crate::tools::{CallArguments, ParamDef, ToolDefinition, ToolHandler, ToolResult};
use crate::types::{PatientId, Result, Role};
use crate::validation::{optional_str_field, str_field};

#[derive(Debug)]
pub struct ConversationalAssistant {
    context: HandlerContext,
    definition: ToolDefinition,
}

impl ConversationalAssistant {
    pub fn new(context: HandlerContext) -> Self {
        let definition = ToolDefinition::new(
            CHAT_WITH_AGENT,
            "Chat with medical AI agent",
            vec![
                role_param(),
                ParamDef::required("message", "User message"),
                ParamDef::optional("patient_context", "Patient ID if relevant", json!("")),
            ],
        );
        Self { context, definition }
    }

    async fn parse(&self, arguments: &mut CallArguments) -> Result<(Role, String, String)> {
        let role = self.context.prepare(&self.definition, arguments).await?;
        let message = str_field(arguments, "message")?;
        Ok((role, message, optional_str_field(arguments, "patient_context")))
    }
}

#[async_trait]
impl ToolHandler for ConversationalAssistant {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, mut arguments: CallArguments) -> Result<ToolResult> {
        let ctx = &self.context;
        let (role, message, patient_context) = match self.parse(&mut arguments).await {
            Ok(parsed) => parsed,
            Err(e) => return Ok(rejected(CHAT_WITH_AGENT, e)),
        };

        ctx.audit
            .log_audit(
                role.as_str(),
                "chat",
                &patient_context,
                details("message", message.as_str()),
            )
            .await;

        // Context is supplementary: an unusable id or a missing record is ignored.
        let context = match PatientId::parse(&patient_context) {
            Ok(id) => ctx.redacted_record(&id, role).await.map(|record| (id, record)),
            Err(_) => {
                if !patient_context.is_empty() {
                    tracing::debug!(
                        patient_context = %patient_context,
                        "Ignoring unusable patient context"
                    );
                }
                None
            }
        };

        let prompt = prompt::chat_prompt(
            role,
            context.as_ref().map(|(id, record)| (id, record)),
            &message,
        );
        let response = ctx.model.invoke(&prompt).await;
        ctx.audit.log_prompt(role.as_str(), &message, &response).await;

        Ok(ToolResult::text(response))
    }
}
