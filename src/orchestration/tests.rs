use std::sync::Mutex;

use async_trait::async_trait;
use uuid::Uuid;

use scorestream_client::{Document, DocumentKind, RecordingDiagnostics};

use super::*;
use crate::backend::{ScriptedBackend, ScriptedCall};
use crate::interfaces::StorageError;
use crate::storage::MockDocumentStore;

const SCALE: &str = "X:1\nT:C Major Scale\nM:4/4\nL:1/4\nK:C\nCDEF|GABc|";

/// Writer that keeps every part it receives.
#[derive(Default)]
struct RecordingWriter {
    parts: Mutex<Vec<StreamPart>>,
}

impl RecordingWriter {
    fn parts(&self) -> Vec<StreamPart> {
        self.parts.lock().unwrap().clone()
    }

    fn contents(&self) -> Vec<String> {
        self.parts()
            .into_iter()
            .filter_map(|part| match part {
                StreamPart::Content(content) => Some(content),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl StreamWriter for RecordingWriter {
    async fn write(&self, part: StreamPart) -> Result<(), TransportError> {
        self.parts.lock().unwrap().push(part);
        Ok(())
    }
}

/// Writer whose consumer has already gone away.
struct ClosedWriter;

#[async_trait]
impl StreamWriter for ClosedWriter {
    async fn write(&self, _part: StreamPart) -> Result<(), TransportError> {
        Err(TransportError::Closed)
    }
}

fn score_json(content: &str) -> String {
    serde_json::json!({
        "abcNotation": content,
        "metadata": {"title": "C Major Scale", "composer": "Traditional"}
    })
    .to_string()
}

fn orchestrator(calls: Vec<ScriptedCall>) -> (Orchestrator, Arc<RecordingDiagnostics>) {
    let diagnostics = Arc::new(RecordingDiagnostics::new());
    let orchestrator = Orchestrator::new(Arc::new(ScriptedBackend::new(calls)))
        .with_diagnostics(diagnostics.clone());
    (orchestrator, diagnostics)
}

fn create(title: &str) -> GenerationRequest {
    GenerationRequest::Create {
        title: title.to_string(),
    }
}

fn update(existing: &str) -> GenerationRequest {
    GenerationRequest::Update {
        description: "Add a second voice".to_string(),
        existing_content: existing.to_string(),
    }
}

// ============================================================================
// Orchestrator
// ============================================================================

#[tokio::test]
async fn test_create_streams_growing_content() {
    let (orchestrator, diagnostics) = orchestrator(vec![ScriptedCall::chunked(&score_json(SCALE), 7)]);
    let writer = RecordingWriter::default();

    let content = orchestrator.run(&create("C Major Scale"), &writer).await.unwrap();

    assert_eq!(content, SCALE);
    let contents = writer.contents();
    assert!(contents.len() > 1);
    assert_eq!(contents.last().map(String::as_str), Some(SCALE));
    for pair in contents.windows(2) {
        assert!(pair[1].starts_with(&pair[0]), "content regressed: {pair:?}");
    }
    assert!(diagnostics.recorded().is_empty());
}

#[tokio::test]
async fn test_create_emits_decoded_metadata() {
    let (orchestrator, _) = orchestrator(vec![ScriptedCall::deltas([score_json(SCALE)])]);
    let writer = RecordingWriter::default();

    orchestrator.run(&create("C Major Scale"), &writer).await.unwrap();

    assert_eq!(
        writer.parts(),
        vec![
            StreamPart::Content(SCALE.to_string()),
            StreamPart::Metadata(MetadataFragment {
                title: Some("C Major Scale".to_string()),
                composer: Some("Traditional".to_string()),
                ..Default::default()
            }),
        ]
    );
}

#[tokio::test]
async fn test_rejected_metadata_fields_become_diagnostics() {
    let json = r#"{"abcNotation":"X:1\nK:C","metadata":{"title":"Etude","tempo":120}}"#;
    let (orchestrator, diagnostics) = orchestrator(vec![ScriptedCall::deltas([json])]);
    let writer = RecordingWriter::default();

    orchestrator.run(&create("Etude"), &writer).await.unwrap();

    assert_eq!(
        diagnostics.recorded(),
        vec![Diagnostic::MetadataFieldRejected {
            field: "tempo".to_string(),
            reason: "unknown field".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_create_failure_before_start_emits_placeholder() {
    let (orchestrator, diagnostics) = orchestrator(vec![ScriptedCall::failing("overloaded")]);
    let writer = RecordingWriter::default();

    let content = orchestrator.run(&create("Etude"), &writer).await.unwrap();

    assert_eq!(content, placeholder_score("Etude"));
    assert_eq!(writer.contents(), vec![placeholder_score("Etude")]);
    let recorded = diagnostics.recorded();
    assert!(matches!(
        &recorded[0],
        Diagnostic::GenerationFailed { mode: GenerationMode::Create, content_parts: 0, .. }
    ));
    assert!(recorded.contains(&Diagnostic::PlaceholderEmitted {
        title: "Etude".to_string()
    }));
}

#[tokio::test]
async fn test_create_failure_mid_stream_replaces_partial_content() {
    let (orchestrator, diagnostics) = orchestrator(vec![
        ScriptedCall::deltas([r#"{"abcNotation":"X:1\nK:C\nCD"#]).then_fail("connection reset"),
    ]);
    let writer = RecordingWriter::default();

    let content = orchestrator.run(&create("Etude"), &writer).await.unwrap();

    assert_eq!(content, placeholder_score("Etude"));
    assert_eq!(
        writer.contents(),
        vec!["X:1\nK:C\nCD".to_string(), placeholder_score("Etude")]
    );
    assert!(matches!(
        &diagnostics.recorded()[0],
        Diagnostic::GenerationFailed { content_parts: 1, .. }
    ));
}

#[tokio::test]
async fn test_create_empty_generation_emits_placeholder() {
    let (orchestrator, diagnostics) = orchestrator(vec![ScriptedCall::deltas([r#"{"abcNotation":""}"#])]);
    let writer = RecordingWriter::default();

    let content = orchestrator.run(&create("Etude"), &writer).await.unwrap();

    assert_eq!(content, placeholder_score("Etude"));
    assert_eq!(writer.contents(), vec![placeholder_score("Etude")]);
    assert_eq!(
        diagnostics.recorded()[0],
        Diagnostic::EmptyGeneration {
            mode: GenerationMode::Create
        }
    );
}

#[tokio::test]
async fn test_update_failure_reemits_existing_content() {
    let (orchestrator, _) = orchestrator(vec![ScriptedCall::failing("overloaded")]);
    let writer = RecordingWriter::default();

    let content = orchestrator.run(&update(SCALE), &writer).await.unwrap();

    assert_eq!(content, SCALE);
    assert_eq!(writer.parts(), vec![StreamPart::Content(SCALE.to_string())]);
}

#[tokio::test]
async fn test_update_failure_mid_stream_restores_existing_content() {
    let (orchestrator, diagnostics) = orchestrator(vec![
        ScriptedCall::deltas([r#"{"abcNotation":"X:1\nK:D\nDE"#]).then_fail("connection reset"),
    ]);
    let writer = RecordingWriter::default();

    let content = orchestrator.run(&update(SCALE), &writer).await.unwrap();

    assert_eq!(content, SCALE);
    assert_eq!(
        writer.parts(),
        vec![
            StreamPart::Content("X:1\nK:D\nDE".to_string()),
            StreamPart::Content(SCALE.to_string()),
        ]
    );
    assert!(matches!(
        &diagnostics.recorded()[..],
        [Diagnostic::GenerationFailed { mode: GenerationMode::Update, content_parts: 1, .. }]
    ));
}

#[tokio::test]
async fn test_failure_is_reported_once() {
    let (orchestrator, diagnostics) = orchestrator(vec![ScriptedCall::failing("overloaded")]);

    orchestrator
        .run(&update(SCALE), &RecordingWriter::default())
        .await
        .unwrap();

    let failures = diagnostics
        .recorded()
        .into_iter()
        .filter(|d| matches!(d, Diagnostic::GenerationFailed { .. }))
        .count();
    assert_eq!(failures, 1);
}

#[tokio::test]
async fn test_update_empty_generation_keeps_existing_silently() {
    let (orchestrator, diagnostics) = orchestrator(vec![ScriptedCall::deltas(["{}"])]);
    let writer = RecordingWriter::default();

    let content = orchestrator.run(&update(SCALE), &writer).await.unwrap();

    assert_eq!(content, SCALE);
    assert!(writer.parts().is_empty());
    assert_eq!(
        diagnostics.recorded(),
        vec![Diagnostic::EmptyGeneration {
            mode: GenerationMode::Update
        }]
    );
}

#[tokio::test]
async fn test_update_prompt_carries_existing_content() {
    let backend = Arc::new(ScriptedBackend::new(vec![ScriptedCall::deltas([score_json(SCALE)])]));
    let orchestrator = Orchestrator::new(backend.clone());

    orchestrator
        .run(&update("X:1\nK:G\nGABc|"), &RecordingWriter::default())
        .await
        .unwrap();

    let received = backend.received().await;
    assert_eq!(received.len(), 1);
    assert!(received[0].system.contains("X:1\nK:G\nGABc|"));
    assert_eq!(received[0].prompt, "Add a second voice");
}

#[tokio::test]
async fn test_closed_consumer_is_returned() {
    let (orchestrator, _) = orchestrator(vec![ScriptedCall::deltas([score_json(SCALE)])]);

    let result = orchestrator.run(&create("Etude"), &ClosedWriter).await;

    assert!(matches!(result, Err(TransportError::Closed)));
}

// ============================================================================
// DocumentService
// ============================================================================

fn service(calls: Vec<ScriptedCall>) -> (DocumentService, Arc<MockDocumentStore>) {
    let store = Arc::new(MockDocumentStore::new());
    let (orchestrator, _) = orchestrator(calls);
    (DocumentService::new(store.clone(), orchestrator), store)
}

#[tokio::test]
async fn test_create_document_brackets_run_and_saves() {
    let (service, store) = service(vec![ScriptedCall::deltas([score_json(SCALE)])]);
    let writer = RecordingWriter::default();

    let summary = service
        .create_document("C Major Scale", DocumentKind::Music, &writer)
        .await
        .unwrap();

    let parts = writer.parts();
    assert_eq!(parts.first(), Some(&StreamPart::Clear("C Major Scale".to_string())));
    assert_eq!(parts.last(), Some(&StreamPart::Finish));
    assert_eq!(summary.versions, 1);
    assert_eq!(summary.content, document::CREATED_MESSAGE);

    let stored = service.get_document(summary.id).await.unwrap();
    assert_eq!(stored.latest_content(), SCALE);
    assert_eq!(store.stored_count().await, 1);
}

#[tokio::test]
async fn test_create_document_with_id_saves_under_that_id() {
    let (service, _) = service(vec![ScriptedCall::deltas([score_json(SCALE)])]);
    let id = Uuid::new_v4();

    let summary = service
        .create_document_with_id(
            id,
            "C Major Scale",
            DocumentKind::Music,
            &RecordingWriter::default(),
        )
        .await
        .unwrap();

    assert_eq!(summary.id, id);
    assert_eq!(service.get_document(id).await.unwrap().latest_content(), SCALE);
}

#[tokio::test]
async fn test_update_failing_mid_stream_streams_and_keeps_original() {
    let (service, store) = service(vec![
        ScriptedCall::deltas([r#"{"abcNotation":"X:1\nK:D\nDE"#]).then_fail("connection reset"),
    ]);
    let document = Document::with_content(Uuid::new_v4(), "Scale", DocumentKind::Music, SCALE);
    let id = document.id;
    store.insert(document).await;
    let writer = RecordingWriter::default();

    let summary = service.update_document(id, "Move to D", &writer).await.unwrap();

    assert_eq!(
        writer.parts(),
        vec![
            StreamPart::Clear("Scale".to_string()),
            StreamPart::Content("X:1\nK:D\nDE".to_string()),
            StreamPart::Content(SCALE.to_string()),
            StreamPart::Finish,
        ]
    );
    assert_eq!(summary.versions, 1);
    let stored = service.get_document(id).await.unwrap();
    assert_eq!(stored.history.len(), 1);
    assert_eq!(stored.latest_content(), SCALE);
}

#[tokio::test]
async fn test_update_missing_document_writes_nothing() {
    let (service, _) = service(vec![]);
    let writer = RecordingWriter::default();

    let err = service
        .update_document(Uuid::new_v4(), "Add a bass line", &writer)
        .await
        .unwrap_err();

    assert!(err.is_not_found());
    assert!(writer.parts().is_empty());
}

#[tokio::test]
async fn test_updates_append_versions() {
    let versions = ["X:1\nK:C\nCDEF|", "X:1\nK:C\nCDEF|GABc|", "X:1\nK:C\nc4|"];
    let (service, store) = service(
        versions
            .iter()
            .map(|v| ScriptedCall::deltas([score_json(v)]))
            .collect(),
    );
    let document = Document::with_content(Uuid::new_v4(), "Scale", DocumentKind::Music, SCALE);
    let id = document.id;
    store.insert(document).await;

    for _ in &versions {
        service
            .update_document(id, "Extend it", &RecordingWriter::default())
            .await
            .unwrap();
    }

    let stored = service.get_document(id).await.unwrap();
    assert_eq!(stored.history.len(), 4);
    assert_eq!(stored.latest_content(), "X:1\nK:C\nc4|");
}

#[tokio::test]
async fn test_failed_update_adds_no_version() {
    let (service, store) = service(vec![ScriptedCall::failing("overloaded")]);
    let document = Document::with_content(Uuid::new_v4(), "Scale", DocumentKind::Music, SCALE);
    let id = document.id;
    store.insert(document).await;

    let summary = service
        .update_document(id, "Extend it", &RecordingWriter::default())
        .await
        .unwrap();

    assert_eq!(summary.versions, 1);
    assert_eq!(service.get_document(id).await.unwrap().latest_content(), SCALE);
}

#[tokio::test]
async fn test_storage_failure_is_not_not_found() {
    let (service, store) = service(vec![]);
    store.set_fail_on_load(true).await;

    let err = service
        .update_document(Uuid::new_v4(), "Extend it", &RecordingWriter::default())
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Storage(StorageError::Unavailable(_))));
}
