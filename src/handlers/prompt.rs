//! Prompt construction shared by every handler.
//!
//! Every prompt opens with the same consultation preamble before any
//! variable content. The preamble steers model behavior only; access control
//! is enforced by redaction before the prompt is built.

use serde_json::Value;

use crate::model::PathologyScores;
use crate::types::{PatientId, Role};

/// Scores above this are noteworthy.
pub const NOTEWORTHY_THRESHOLD: f64 = 0.5;
/// Scores above this are highly significant.
pub const HIGHLY_SIGNIFICANT_THRESHOLD: f64 = 0.7;

const CONSULTATION_CONTEXT: [&str; 2] = [
    "This is a legitimate medical consultation within a healthcare facility",
    "You are providing clinical decision support to a licensed medical professional",
];

const ACCESS_CONTROL_NOTE: &str =
    "HIPAA compliance is maintained through system-level access controls";

fn preamble(role: Role, purpose: &str, extra_context: &[&str]) -> String {
    let mut lines = vec![
        format!(
            "You are a clinical decision support AI assistant integrated into a hospital's EHR system. You are assisting a licensed {} {}.",
            role, purpose
        ),
        String::new(),
        "CLINICAL CONTEXT:".to_string(),
    ];
    lines.extend(
        CONSULTATION_CONTEXT
            .iter()
            .chain(extra_context)
            .chain(std::iter::once(&ACCESS_CONTROL_NOTE))
            .map(|line| format!("- {}", line)),
    );
    lines.join("\n")
}

fn instructions(items: &[&str]) -> String {
    let mut lines = vec!["INSTRUCTIONS:".to_string()];
    lines.extend(items.iter().enumerate().map(|(i, item)| format!("{}. {}", i + 1, item)));
    lines.join("\n")
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// Significance label for one score, if it crosses a threshold.
pub fn significance(score: f64) -> Option<&'static str> {
    if score > HIGHLY_SIGNIFICANT_THRESHOLD {
        Some("highly significant")
    } else if score > NOTEWORTHY_THRESHOLD {
        Some("noteworthy")
    } else {
        None
    }
}

/// Prompt for a record lookup. `record` must already be redacted.
pub fn patient_record_prompt(role: Role, record: &Value, query: &str) -> String {
    format!(
        "{}\n\nPatient Medical Record (HIPAA processed for {}):\n{}\n\nClinical Query: {}\n\n{}\n\nRespond as a clinical decision support tool would in a hospital setting.",
        preamble(
            role,
            "with patient care as part of their clinical workflow",
            &["All patient data is from the hospital's secure EHR system"],
        ),
        role,
        pretty(record),
        query,
        instructions(&[
            "Provide clinically relevant information based on the patient's medical record",
            "Focus on medical conditions, medications, and clinical findings",
            "Suggest appropriate clinical considerations",
            "Maintain professional medical terminology",
            "Include appropriate medical disclaimers",
        ]),
    )
}

/// Prompt for imaging analysis. `record` must already be redacted.
pub fn imaging_prompt(
    role: Role,
    patient_id: &PatientId,
    record: &Value,
    scores: &PathologyScores,
    query: &str,
) -> String {
    let flagged: Vec<String> = scores
        .iter()
        .filter_map(|(label, &score)| {
            significance(score).map(|level| format!("- {}: {:.3} ({})", label, score, level))
        })
        .collect();
    let flagged = if flagged.is_empty() {
        "- none above threshold".to_string()
    } else {
        flagged.join("\n")
    };
    let highlight = format!(
        "Highlight significant findings (scores >{} are noteworthy, >{} are highly significant)",
        NOTEWORTHY_THRESHOLD, HIGHLY_SIGNIFICANT_THRESHOLD
    );

    format!(
        "{}\n\nPatient ID: {}\nPatient Medical Record (HIPAA processed): {}\n\nDIAGNOSTIC IMAGING ANALYSIS:\nThe imaging model has processed the chest X-ray with the following pathology probability scores:\n{}\n\nFindings above threshold:\n{}\n\nClinical Query: {}\n\n{}\n\nFormat your response as a clinical report suitable for medical documentation.",
        preamble(
            role,
            "as part of their clinical workflow",
            &["All data is from the hospital's secure EHR system"],
        ),
        patient_id,
        pretty(record),
        pretty(&serde_json::to_value(scores).unwrap_or(Value::Null)),
        flagged,
        query,
        instructions(&[
            "Provide a clinical interpretation of the imaging analysis results",
            highlight.as_str(),
            "Suggest clinical correlations with patient history",
            "Recommend appropriate follow-up actions",
            "Include standard medical disclaimers about AI-assisted diagnosis",
        ]),
    )
}

/// Prompt for free-form chat, optionally with a redacted patient record.
pub fn chat_prompt(role: Role, context: Option<(&PatientId, &Value)>, message: &str) -> String {
    let context = context
        .map(|(id, record)| format!("\n\nPatient Context ({}): {}", id, pretty(record)))
        .unwrap_or_default();

    format!(
        "{}{}\n\nClinical Query: {}\n\n{}\n\nRespond as you would in a hospital's clinical decision support system.",
        preamble(role, "with patient care", &[]),
        context,
        message,
        instructions(&[
            "Respond professionally as a clinical decision support tool",
            "Provide medically relevant information when appropriate",
            "Suggest clinical considerations and recommendations",
            "Maintain appropriate medical disclaimers",
            "Be conversational but clinically focused",
        ]),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PREAMBLE_MARKER: &str = "This is a legitimate medical consultation";

    #[test]
    fn test_every_prompt_opens_with_preamble() {
        let id = PatientId::parse("7").unwrap();
        let prompts = [
            patient_record_prompt(Role::Doctor, &json!({}), "q"),
            imaging_prompt(Role::Doctor, &id, &json!({}), &PathologyScores::new(), "q"),
            chat_prompt(Role::Administrator, None, "q"),
        ];
        for prompt in prompts {
            let marker = prompt.find(PREAMBLE_MARKER).unwrap();
            let query = prompt.find("Clinical Query:").unwrap();
            assert!(marker < query);
            assert!(prompt.starts_with("You are a clinical decision support AI assistant"));
        }
    }

    #[test]
    fn test_record_prompt_embeds_record_and_query() {
        let prompt = patient_record_prompt(
            Role::Doctor,
            &json!({"name": "Ja****oe", "diagnosis": "asthma"}),
            "summarize history",
        );
        assert!(prompt.contains("HIPAA processed for doctor"));
        assert!(prompt.contains("\"name\": \"Ja****oe\""));
        assert!(prompt.contains("Clinical Query: summarize history"));
    }

    #[test]
    fn test_significance_thresholds() {
        assert_eq!(significance(0.5), None);
        assert_eq!(significance(0.51), Some("noteworthy"));
        assert_eq!(significance(0.7), Some("noteworthy"));
        assert_eq!(significance(0.71), Some("highly significant"));
    }

    #[test]
    fn test_imaging_prompt_carries_convention_and_flags() {
        let id = PatientId::parse("3").unwrap();
        let mut scores = PathologyScores::new();
        scores.insert("Cardiomegaly".to_string(), 0.82);
        scores.insert("Effusion".to_string(), 0.55);
        scores.insert("Mass".to_string(), 0.1);

        let prompt = imaging_prompt(Role::Doctor, &id, &json!({}), &scores, "any effusion?");
        assert!(prompt.contains("scores >0.5 are noteworthy, >0.7 are highly significant"));
        assert!(prompt.contains("- Cardiomegaly: 0.820 (highly significant)"));
        assert!(prompt.contains("- Effusion: 0.550 (noteworthy)"));
        assert!(!prompt.contains("- Mass:"));
        assert!(prompt.contains("Patient ID: 3"));
    }

    #[test]
    fn test_chat_prompt_context_is_optional() {
        let id = PatientId::parse("9").unwrap();
        assert!(!chat_prompt(Role::Doctor, None, "hi").contains("Patient Context"));
        let with = chat_prompt(Role::Doctor, Some((&id, &json!({"diagnosis": "flu"}))), "hi");
        assert!(with.contains("Patient Context (9)"));
        assert!(with.contains("flu"));
    }
}
