//! End-to-end tests: configuration → dispatcher → routed session → files on disk.
//!
//! `cat` stands in for the language model, so each reply is the exact prompt
//! the model would have seen.

#![cfg(unix)]

use medgate::compliance::{AuditTrail, LogKind};
use medgate::routing::Session;
use medgate::types::{LogFormat, Role};
use medgate::{dispatcher_from_config, Config};
use serde_json::json;
use std::path::Path;
use std::time::Duration;

fn config(root: &Path) -> Config {
    let mut config = Config::default();
    config.storage.records_dir = root.join("ehr");
    config.storage.images_dir = root.join("normalized_patients");
    config.audit.log_dir = root.join("logs");
    config.model.command = vec!["cat".to_string()];
    config.model.timeout = Duration::from_secs(10);
    config
}

fn seed(root: &Path) {
    std::fs::create_dir_all(root.join("ehr")).unwrap();
    std::fs::create_dir_all(root.join("normalized_patients")).unwrap();
    std::fs::write(
        root.join("ehr/Patient_1.json"),
        json!({
            "name": "Jane Doe",
            "ssn": "123-45-6789",
            "diagnosis": "type 2 diabetes",
        })
        .to_string(),
    )
    .unwrap();
}

#[tokio::test]
async fn test_doctor_sees_masked_record() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let dispatcher = dispatcher_from_config(&config(dir.path())).unwrap();
    let mut session = Session::new(Role::Doctor);

    let reply = session
        .ask(&dispatcher, "show me the history for patient 1")
        .await
        .unwrap();

    assert!(reply.contains("Ja****oe"), "{}", reply);
    assert!(reply.contains("12*******89"), "{}", reply);
    assert!(!reply.contains("Jane Doe"));
    assert!(reply.contains("type 2 diabetes"));
    assert_eq!(session.current_patient().map(|p| p.as_str()), Some("1"));

    let audit = AuditTrail::new(dir.path().join("logs"), LogFormat::JsonArray);
    let entries = audit.entries(LogKind::Audit).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["action"], "get_patient_info");
    assert_eq!(audit.count(LogKind::Prompt).await.unwrap(), 1);
}

#[tokio::test]
async fn test_administrator_sees_full_record() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let dispatcher = dispatcher_from_config(&config(dir.path())).unwrap();
    let mut session = Session::new(Role::Administrator);

    let reply = session
        .ask(&dispatcher, "patient 1 summary please")
        .await
        .unwrap();

    assert!(reply.contains("Jane Doe"), "{}", reply);
    assert!(reply.contains("123-45-6789"));
}

#[tokio::test]
async fn test_follow_up_chat_carries_patient_context() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let dispatcher = dispatcher_from_config(&config(dir.path())).unwrap();
    let mut session = Session::new(Role::Doctor);

    session.ask(&dispatcher, "patient 1 history").await.unwrap();
    let reply = session
        .ask(&dispatcher, "is metformin appropriate?")
        .await
        .unwrap();

    assert!(reply.contains("is metformin appropriate?"));
    assert!(reply.contains("type 2 diabetes"));
    assert!(!reply.contains("Jane Doe"));

    let audit = AuditTrail::new(dir.path().join("logs"), LogFormat::JsonArray);
    let entries = audit.entries(LogKind::Audit).await.unwrap();
    assert_eq!(entries[1]["action"], "chat");
    assert_eq!(entries[1]["patient_id"], "1");
}

#[tokio::test]
async fn test_imaging_without_classifier() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    std::fs::write(dir.path().join("normalized_patients/Patient_1.png"), b"\x89PNG").unwrap();
    let dispatcher = dispatcher_from_config(&config(dir.path())).unwrap();
    let mut session = Session::new(Role::Doctor);

    let reply = session
        .ask(&dispatcher, "analyze the x-ray for patient 1")
        .await
        .unwrap();
    assert_eq!(reply, "X-ray analysis model is not loaded");

    let missing = session
        .ask(&dispatcher, "analyze the x-ray for patient 2")
        .await
        .unwrap();
    assert_eq!(missing, "X-ray image for patient 2 not found");
}

#[tokio::test]
async fn test_unreachable_model_degrades_to_fallback() {
    let dir = tempfile::tempdir().unwrap();
    seed(dir.path());
    let mut config = config(dir.path());
    config.model.command = vec!["/nonexistent/medgate-model".to_string()];
    let dispatcher = dispatcher_from_config(&config).unwrap();
    let mut session = Session::new(Role::Doctor);

    let reply = session.ask(&dispatcher, "patient 1 history").await.unwrap();
    assert_eq!(reply, medgate::model::UNAVAILABLE_MESSAGE);

    let audit = AuditTrail::new(dir.path().join("logs"), LogFormat::JsonArray);
    let prompts = audit.entries(LogKind::Prompt).await.unwrap();
    assert_eq!(prompts[0]["response"], medgate::model::UNAVAILABLE_MESSAGE);
}
