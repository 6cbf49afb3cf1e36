use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use docqa_core::config::{GenerationSettings, Settings};
use docqa_core::error::Error;
use docqa_core::traits::Embedder;
use docqa_core::types::{Chunk, IndexEntry, Vector};
use docqa_embed::FakeEmbedder;
use docqa_rag::{
    render_answer, AnswerGenerator, BackendError, Completion, CompletionBackend, GenerationError, HfChatBackend,
    Message, RagContext, RetrievalService, Role,
};
use docqa_vector::FlatIndex;

/// Replies with a fixed completion and remembers what it was asked.
struct ScriptedBackend {
    reply: Completion,
    seen: Mutex<Vec<(Vec<Message>, f32, u32)>>,
}

impl ScriptedBackend {
    fn answering(text: &str) -> Self {
        Self::with(Completion::Candidates(vec![Message { role: Role::Assistant, content: text.into() }]))
    }

    fn with(reply: Completion) -> Self {
        Self { reply, seen: Mutex::new(Vec::new()) }
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, messages: Vec<Message>, temperature: f32, max_tokens: u32) -> Result<Completion, BackendError> {
        self.seen.lock().unwrap().push((messages, temperature, max_tokens));
        Ok(self.reply.clone())
    }
}

struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn complete(&self, _: Vec<Message>, _: f32, _: u32) -> Result<Completion, BackendError> {
        Err(BackendError::Api { status: 503, body: "model is loading".into() })
    }
}

struct StuckBackend;

#[async_trait]
impl CompletionBackend for StuckBackend {
    async fn complete(&self, _: Vec<Message>, _: f32, _: u32) -> Result<Completion, BackendError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Completion::Empty)
    }
}

/// Stands in for an embedding service that cannot be reached.
struct UnreachableEmbedder;

impl Embedder for UnreachableEmbedder {
    fn embedder_id(&self) -> &str {
        "unreachable:d64"
    }

    fn dim(&self) -> usize {
        64
    }

    fn embed_batch(&self, _: &[String]) -> docqa_core::Result<Vec<Vector>> {
        Err(Error::ModelUnavailable("backend unreachable".into()))
    }
}

const PASSAGES: [&str; 3] = [
    "the capital of france is paris",
    "rust has ownership and borrowing",
    "tokio runs async tasks",
];

fn fake_index(embedder: &FakeEmbedder) -> FlatIndex {
    let texts: Vec<String> = PASSAGES.iter().map(|s| s.to_string()).collect();
    let vectors = embedder.embed_batch(&texts).unwrap();
    let entries = texts
        .into_iter()
        .zip(vectors)
        .enumerate()
        .map(|(i, (text, vector))| IndexEntry { chunk: Chunk::new(text, Some("facts.txt".into()), i), vector })
        .collect();
    FlatIndex::build(entries, embedder.embedder_id()).unwrap()
}

fn retrieval() -> RetrievalService {
    let embedder = FakeEmbedder::new(64);
    let index = fake_index(&embedder);
    RetrievalService::new(Arc::new(index), Arc::new(embedder))
}

#[test]
fn retrieve_ranks_the_matching_chunk_first() {
    let chunks = retrieval().retrieve("rust has ownership and borrowing", 2).unwrap();
    assert_eq!(chunks.len(), 2);
    assert_eq!(chunks[0], "rust has ownership and borrowing");
}

#[test]
fn retrieve_returns_what_exists_when_top_k_is_large() {
    assert_eq!(retrieval().retrieve("anything", 10).unwrap().len(), 3);
}

#[test]
fn retrieve_rejects_zero_top_k() {
    assert!(matches!(retrieval().retrieve("anything", 0), Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn answer_sends_context_and_settings() {
    let backend = Arc::new(ScriptedBackend::answering("Paris"));
    let generator = AnswerGenerator::new(backend.clone(), &GenerationSettings::default());

    let answer = generator.answer("What is the capital?", &["a".to_string(), "b".to_string()]).await.unwrap();
    assert_eq!(answer, "Paris");

    let seen = backend.seen.lock().unwrap();
    let (messages, temperature, max_tokens) = &seen[0];
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.contains("only the provided context"));
    assert_eq!(messages[1].content, "Context: a\nb\n\nQuestion: What is the capital?");
    assert_eq!(*max_tokens, 200);
    assert!((*temperature - 0.7).abs() < f32::EPSILON);
}

#[tokio::test]
async fn empty_completion_renders_placeholder() {
    let generator = AnswerGenerator::new(Arc::new(ScriptedBackend::with(Completion::Empty)), &GenerationSettings::default());
    let result = generator.answer("q", &[]).await;
    assert!(matches!(result, Err(GenerationError::NoAnswer)));
    assert_eq!(render_answer(result), "No answer found.");

    let blank = AnswerGenerator::new(Arc::new(ScriptedBackend::answering("   ")), &GenerationSettings::default());
    assert_eq!(render_answer(blank.answer("q", &[]).await), "No answer found.");
}

#[tokio::test]
async fn backend_failure_renders_description() {
    let generator = AnswerGenerator::new(Arc::new(FailingBackend), &GenerationSettings::default());
    let rendered = render_answer(generator.answer("q", &["ctx".to_string()]).await);
    assert!(rendered.starts_with("Error during inference: "));
    assert!(rendered.contains("503"));
}

#[tokio::test]
async fn stuck_backend_times_out() {
    let generator = AnswerGenerator::new(Arc::new(StuckBackend), &GenerationSettings::default())
        .with_timeout(Duration::from_millis(50));
    let result = generator.answer("q", &[]).await;
    assert!(matches!(result, Err(GenerationError::Timeout(_))));
    assert!(!render_answer(result).is_empty());
}

#[tokio::test]
async fn missing_token_is_reported_without_a_request() {
    let backend =
        HfChatBackend::new(None, "DOCQA_TEST_TOKEN", "some/model", "http://127.0.0.1:9", Duration::from_secs(1)).unwrap();
    assert!(!backend.has_token());
    let err = backend.complete(vec![Message::user("hi")], 0.7, 10).await.unwrap_err();
    match err {
        BackendError::NotConfigured(msg) => assert!(msg.contains("DOCQA_TEST_TOKEN"), "{msg}"),
        other => panic!("expected NotConfigured, got {other}"),
    }
}

#[tokio::test]
async fn context_answers_end_to_end() {
    let embedder = FakeEmbedder::new(64);
    let index = fake_index(&embedder);
    let backend = Arc::new(ScriptedBackend::answering("Paris."));
    let mut settings = Settings::default();
    settings.retrieval.top_k = 1;
    let ctx = RagContext::new(Arc::new(index), Arc::new(embedder), backend.clone(), settings);

    assert_eq!(ctx.answer_text("the capital of france is paris").await.unwrap(), "Paris.");
    let seen = backend.seen.lock().unwrap();
    assert_eq!(seen[0].0[1].content, "Context: the capital of france is paris\n\nQuestion: the capital of france is paris");
}

#[tokio::test]
async fn retrieval_errors_propagate_instead_of_rendering() {
    let embedder = FakeEmbedder::new(64);
    let index = fake_index(&embedder);
    let backend = Arc::new(ScriptedBackend::answering("unused"));
    let ctx = RagContext::new(Arc::new(index), Arc::new(FakeEmbedder::new(32)), backend.clone(), Settings::default());

    assert!(matches!(ctx.ask("q").await, Err(Error::InvalidArgument(_))));
    assert!(matches!(ctx.answer_text("q").await, Err(Error::InvalidArgument(_))));
    assert!(backend.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_embedder_fails_the_query() {
    let index = fake_index(&FakeEmbedder::new(64));
    let backend = Arc::new(ScriptedBackend::answering("unused"));
    let ctx = RagContext::new(Arc::new(index), Arc::new(UnreachableEmbedder), backend.clone(), Settings::default());

    match ctx.answer_text("q").await {
        Err(Error::ModelUnavailable(msg)) => assert!(msg.contains("unreachable"), "{msg}"),
        Err(other) => panic!("expected ModelUnavailable, got {other}"),
        Ok(text) => panic!("query should fail, got answer {text:?}"),
    }
    assert!(backend.seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn generation_failure_still_renders_inside_a_successful_query() {
    let embedder = FakeEmbedder::new(64);
    let index = fake_index(&embedder);
    let ctx = RagContext::new(Arc::new(index), Arc::new(embedder), Arc::new(FailingBackend), Settings::default());

    let outcome = ctx.ask("rust has ownership and borrowing").await.unwrap();
    assert!(matches!(outcome, Err(GenerationError::Backend(BackendError::Api { status: 503, .. }))));
    assert!(ctx.answer_text("q").await.unwrap().starts_with("Error during inference: "));
}

#[test]
fn open_loads_a_persisted_index_with_the_configured_embedder() {
    let dir = tempfile::tempdir().unwrap();
    let embedder = FakeEmbedder::default();
    docqa_vector::persist(&fake_index(&embedder), dir.path()).unwrap();

    let mut settings = Settings::default();
    settings.embedding.use_fake = true;
    let ctx = RagContext::open(settings, dir.path()).unwrap();
    let chunks = ctx.retrieval().retrieve("tokio runs async tasks", 1).unwrap();
    assert_eq!(chunks, vec!["tokio runs async tasks".to_string()]);
}

#[test]
fn open_refuses_an_index_from_another_embedder() {
    let dir = tempfile::tempdir().unwrap();
    docqa_vector::persist(&fake_index(&FakeEmbedder::new(16)), dir.path()).unwrap();

    let mut settings = Settings::default();
    settings.embedding.use_fake = true;
    let err = RagContext::open(settings, dir.path()).err().unwrap();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::ModelMismatch { .. })));
}
