//! `analyze_xray`: imaging classifier scores interpreted by the model.
//!
//! Imaging availability is intermittent, so every failure reaching or
//! running the classifier is returned as text rather than an error.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::compliance::audit::details;
use crate::handlers::{missing, prompt, rejected, role_param, HandlerContext, ANALYZE_XRAY};
use crate::model::ImagingModel;
use crate::store::ImageStore;
use crate::tools::{CallArguments, ParamDef, ToolDefinition, ToolHandler, ToolResult};
use crate::types::{Error, PatientId, Result, Role};
use crate::validation::{patient_id_field, str_field};

#[derive(Debug)]
pub struct ImagingAnalysis {
    context: HandlerContext,
    images: Arc<dyn ImageStore>,
    model: Arc<dyn ImagingModel>,
    definition: ToolDefinition,
}

impl ImagingAnalysis {
    pub fn new(
        context: HandlerContext,
        images: Arc<dyn ImageStore>,
        model: Arc<dyn ImagingModel>,
    ) -> Self {
        let definition = ToolDefinition::new(
            ANALYZE_XRAY,
            "Analyze X-ray images with HIPAA compliance",
            vec![
                ParamDef::required("patient_id", "Patient ID"),
                role_param(),
                ParamDef::required("query", "Analysis request"),
            ],
        );
        Self {
            context,
            images,
            model,
            definition,
        }
    }

    async fn parse(&self, arguments: &mut CallArguments) -> Result<(Role, PatientId, String)> {
        let role = self.context.prepare(&self.definition, arguments).await?;
        let patient_id = patient_id_field(arguments, "patient_id")?;
        let query = str_field(arguments, "query")?;
        Ok((role, patient_id, query))
    }
}

#[async_trait]
impl ToolHandler for ImagingAnalysis {
    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, mut arguments: CallArguments) -> Result<ToolResult> {
        let ctx = &self.context;
        let (role, patient_id, query) = match self.parse(&mut arguments).await {
            Ok(parsed) => parsed,
            Err(e) => return Ok(rejected(ANALYZE_XRAY, e)),
        };

        ctx.audit
            .log_audit(
                role.as_str(),
                ANALYZE_XRAY,
                patient_id.as_str(),
                details("query", query.as_str()),
            )
            .await;

        let Some(image) = self.images.resolve(&patient_id).await else {
            return Ok(missing(Error::not_found(format!(
                "X-ray image for patient {} not found",
                patient_id
            ))));
        };

        if !self.model.is_ready() {
            tracing::warn!("Imaging model requested but not loaded");
            return Ok(ToolResult::text("X-ray analysis model is not loaded"));
        }

        let scores = match self.model.infer(&image).await {
            Ok(scores) => scores,
            Err(e) => {
                tracing::error!(patient_id = %patient_id, error = %e, "X-ray analysis failed");
                return Ok(ToolResult::text(format!("X-ray analysis failed: {}", e)));
            }
        };

        let record: Value = ctx
            .redacted_record(&patient_id, role)
            .await
            .unwrap_or_else(|| json!({}));

        let prompt = prompt::imaging_prompt(role, &patient_id, &record, &scores, &query);
        let response = ctx.model.invoke(&prompt).await;
        ctx.audit
            .log_prompt(role.as_str(), &format!("X-ray analysis: {}", query), &response)
            .await;

        Ok(ToolResult::text(response))
    }
}
