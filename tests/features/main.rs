//! Acceptance tests using cucumber-rs (Gherkin).
//!
//! Drives the document service, part channel and client reducer end to end
//! against the scripted backend and in-memory storage.

use std::sync::Arc;

use cucumber::gherkin::Step;
use cucumber::{given, then, when, World};
use futures::{stream, StreamExt};
use uuid::Uuid;

use scorestream::backend::{ScriptedBackend, ScriptedCall};
use scorestream::generation::placeholder_score;
use scorestream::interfaces::DocumentStore;
use scorestream::storage::MockDocumentStore;
use scorestream::transport::part_channel;
use scorestream::{DocumentService, Orchestrator, ServiceError};
use scorestream_client::{
    ArtifactState, ConsumeSummary, Document, DocumentKind, MusicMetadata, StreamPart,
};

fn score(name: &str) -> &'static str {
    match name {
        "C major scale" => "X:1\nT:C Major Scale\nM:4/4\nL:1/4\nK:C\nCDEF|GABc|",
        "G major scale" => "X:1\nT:G Major Scale\nM:4/4\nL:1/4\nK:G\nGABc|defg|",
        "two voices" => "X:1\nT:Scale\nK:G\nV:1\nGABc|\nV:2 clef=bass\nG,,4|",
        "whole notes" => "X:1\nT:Scale\nL:1\nK:G\nG|A|B|c|",
        other => panic!("unknown score {other}"),
    }
}

/// Unescape `\n` in step arguments.
fn unescape(text: &str) -> String {
    text.replace("\\n", "\n")
}

#[derive(World)]
#[world(init = Self::new)]
pub struct ScoreWorld {
    calls: Vec<ScriptedCall>,
    store: Arc<MockDocumentStore>,
    document_id: Option<Uuid>,
    artifact: Option<ArtifactState>,
    streamed: usize,
    last_error: Option<String>,
    not_found: bool,
    consumed: Option<ConsumeSummary>,
    metadata_before_update: Option<MusicMetadata>,
    drafts: Vec<String>,
}

impl std::fmt::Debug for ScoreWorld {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoreWorld")
            .field("queued_calls", &self.calls.len())
            .field("document_id", &self.document_id)
            .field("streamed", &self.streamed)
            .field("last_error", &self.last_error)
            .finish()
    }
}

impl ScoreWorld {
    fn new() -> Self {
        Self {
            calls: Vec::new(),
            store: Arc::new(MockDocumentStore::new()),
            document_id: None,
            artifact: None,
            streamed: 0,
            last_error: None,
            not_found: false,
            consumed: None,
            metadata_before_update: None,
            drafts: Vec::new(),
        }
    }

    /// Service over the calls queued so far; later calls stay queued.
    fn service(&mut self, calls: usize) -> DocumentService {
        let take = calls.min(self.calls.len());
        let backend = ScriptedBackend::new(self.calls.drain(..take).collect());
        DocumentService::new(self.store.clone(), Orchestrator::new(Arc::new(backend)))
    }

    fn artifact(&self) -> &ArtifactState {
        self.artifact.as_ref().expect("no artifact yet")
    }
}

// ============================================================================
// Given
// ============================================================================

#[given(expr = "the backend will stream the {string} score")]
async fn given_streamed_score(world: &mut ScoreWorld, name: String) {
    let json = serde_json::json!({
        "abcNotation": score(&name),
        "metadata": {"title": score(&name).lines().nth(1).unwrap_or("T:").trim_start_matches("T:")},
    });
    world.calls.push(ScriptedCall::chunked(&json.to_string(), 9));
}

#[given("the backend fails before streaming")]
async fn given_fails_before(world: &mut ScoreWorld) {
    world.calls.push(ScriptedCall::failing("overloaded"));
}

#[given(expr = "the backend fails after streaming {string}")]
async fn given_fails_after(world: &mut ScoreWorld, content: String) {
    let json = serde_json::json!({ "abcNotation": unescape(&content) }).to_string();
    // Leave the object open, as a cut-off stream would.
    let open = json.trim_end_matches('}').to_string();
    world
        .calls
        .push(ScriptedCall::deltas([open]).then_fail("connection reset"));
}

#[given("a fresh music artifact")]
async fn given_fresh_artifact(world: &mut ScoreWorld) {
    world.artifact = Some(ArtifactState::new(Document::new(
        Uuid::new_v4(),
        "Etude",
        DocumentKind::Music,
    )));
}

// ============================================================================
// When
// ============================================================================

#[when(expr = "I create a music document titled {string}")]
async fn when_create(world: &mut ScoreWorld, title: String) {
    let service = world.service(1);
    let (writer, receiver) = part_channel(16);
    let artifact = ArtifactState::new(Document::new(Uuid::nil(), title.clone(), DocumentKind::Music));

    let consumer = tokio::spawn(async move {
        let mut artifact = artifact;
        let summary = artifact.consume(receiver).await;
        (artifact, summary)
    });
    let result = service
        .create_document(&title, DocumentKind::Music, &writer)
        .await;
    drop(writer);
    let (artifact, summary) = consumer.await.expect("consumer panicked");

    world.streamed += summary.applied + summary.skipped;
    world.artifact = Some(artifact);
    match result {
        Ok(summary) => world.document_id = Some(summary.id),
        Err(e) => world.last_error = Some(e.to_string()),
    }
}

#[when(expr = "I update the document with {string}")]
async fn when_update(world: &mut ScoreWorld, description: String) {
    let id = world.document_id.expect("no document created");
    let service = world.service(1);
    let (writer, receiver) = part_channel(16);
    let artifact = match world.artifact.take() {
        Some(artifact) => artifact,
        None => ArtifactState::new(world.store.load(id).await.expect("document missing")),
    };

    world.metadata_before_update = Some(artifact.metadata().clone());

    let consumer = tokio::spawn(async move {
        let mut artifact = artifact;
        let mut drafts = Vec::new();
        let parts = receiver.inspect(|part| {
            if let StreamPart::Content(content) = part {
                drafts.push(content.clone());
            }
        });
        let summary = artifact.consume(parts).await;
        (artifact, summary, drafts)
    });
    let result = service.update_document(id, &description, &writer).await;
    drop(writer);
    let (artifact, summary, drafts) = consumer.await.expect("consumer panicked");

    world.drafts = drafts;

    world.streamed += summary.applied + summary.skipped;
    world.artifact = Some(artifact);
    if let Err(e) = result {
        world.last_error = Some(e.to_string());
    }
}

#[when("I update a document that does not exist")]
async fn when_update_missing(world: &mut ScoreWorld) {
    let service = world.service(0);
    let (writer, receiver) = part_channel(16);

    let result = service
        .update_document(Uuid::new_v4(), "Add a bass line", &writer)
        .await;
    drop(writer);
    let parts: Vec<_> = receiver.collect().await;

    world.streamed += parts.len();
    if let Err(e) = result {
        world.not_found = e.is_not_found();
        world.last_error = Some(e.to_string());
    }
}

#[when("I go to the previous version")]
async fn when_previous(world: &mut ScoreWorld) {
    world.artifact.as_mut().expect("no artifact yet").previous();
}

#[when("I go to the next version")]
async fn when_next(world: &mut ScoreWorld) {
    world.artifact.as_mut().expect("no artifact yet").next();
}

#[when("the consumer receives the lines:")]
async fn when_receive_lines(world: &mut ScoreWorld, step: &Step) {
    let text = step.docstring.clone().expect("missing docstring");
    let lines: Vec<String> = text.lines().map(str::to_string).collect();

    let artifact = world.artifact.as_mut().expect("no artifact yet");
    world.consumed = Some(artifact.consume_lines(stream::iter(lines)).await);
}

// ============================================================================
// Then
// ============================================================================

#[then(expr = "the artifact shows the {string} score")]
async fn then_shows_score(world: &mut ScoreWorld, name: String) {
    assert_eq!(world.artifact().displayed_content(), score(&name));
}

#[then(expr = "the artifact shows the placeholder for {string}")]
async fn then_shows_placeholder(world: &mut ScoreWorld, title: String) {
    assert_eq!(world.artifact().displayed_content(), placeholder_score(&title));
}

#[then(expr = "the artifact shows {string}")]
async fn then_shows(world: &mut ScoreWorld, content: String) {
    assert_eq!(world.artifact().displayed_content(), unescape(&content));
}

#[then("the artifact is idle")]
async fn then_idle(world: &mut ScoreWorld) {
    assert!(!world.artifact().is_streaming());
}

#[then(expr = "the document has {int} version(s)")]
async fn then_versions(world: &mut ScoreWorld, versions: usize) {
    assert_eq!(world.artifact().document().history.len(), versions);
    if let Some(id) = world.document_id {
        let stored = world.store.load(id).await.expect("document not stored");
        assert_eq!(stored.history.len(), versions);
    }
}

#[then(expr = "the metadata title is {string}")]
async fn then_metadata_title(world: &mut ScoreWorld, title: String) {
    assert_eq!(world.artifact().metadata().title, title);
}

#[then("the metadata is unchanged")]
async fn then_metadata_unchanged(world: &mut ScoreWorld) {
    let before = world
        .metadata_before_update
        .as_ref()
        .expect("no update was run");
    assert_eq!(world.artifact().metadata(), before);
}

#[then(expr = "the artifact streamed {string} before recovering")]
async fn then_streamed_before_recovering(world: &mut ScoreWorld, partial: String) {
    let partial = unescape(&partial);
    let position = world
        .drafts
        .iter()
        .position(|draft| *draft == partial)
        .unwrap_or_else(|| panic!("{partial:?} never streamed: {:?}", world.drafts));
    assert!(position + 1 < world.drafts.len(), "no content after the partial draft");
}

#[then(expr = "the viewed version index is {int}")]
async fn then_version_index(world: &mut ScoreWorld, index: usize) {
    assert_eq!(
        world.artifact().document().history.current_version_index(),
        index
    );
}

#[then("the request fails with not found")]
async fn then_not_found(world: &mut ScoreWorld) {
    assert!(world.not_found, "expected not found, got {:?}", world.last_error);
}

#[then("no parts were streamed")]
async fn then_nothing_streamed(world: &mut ScoreWorld) {
    assert_eq!(world.streamed, 0);
}

#[then(expr = "{int} line(s) was/were skipped")]
async fn then_lines_skipped(world: &mut ScoreWorld, skipped: usize) {
    let consumed = world.consumed.as_ref().expect("nothing consumed");
    assert_eq!(consumed.skipped, skipped);
}

#[tokio::main]
async fn main() {
    ScoreWorld::cucumber()
        .fail_on_skipped()
        .run("tests/features/artifact_stream.feature")
        .await;
}
