use std::path::Path;
use std::sync::Arc;

use anyhow::Context as _;

use docqa_core::config::Settings;
use docqa_core::traits::{Embedder, VectorSearch};
use docqa_embed::get_default_embedder;

use crate::answer::{render_answer, AnswerGenerator};
use crate::completion::{CompletionBackend, HfChatBackend};
use crate::error::GenerationError;
use crate::retrieval::RetrievalService;

/// Everything a query needs, built once at startup and shared by reference.
pub struct RagContext {
    settings: Settings,
    retrieval: RetrievalService,
    generator: AnswerGenerator,
}

impl RagContext {
    pub fn new(
        index: Arc<dyn VectorSearch>,
        embedder: Arc<dyn Embedder>,
        backend: Arc<dyn CompletionBackend>,
        settings: Settings,
    ) -> Self {
        let retrieval = RetrievalService::new(index, embedder);
        let generator = AnswerGenerator::new(backend, &settings.generation);
        Self { settings, retrieval, generator }
    }

    /// Load the configured embedder and the index in `index_dir`, and connect
    /// the Hugging Face backend.
    pub fn open(settings: Settings, index_dir: &Path) -> anyhow::Result<Self> {
        let embedder: Arc<dyn Embedder> = Arc::from(get_default_embedder(&settings.embedding)?);
        let index = docqa_vector::load_for(index_dir, embedder.as_ref())
            .with_context(|| format!("loading index from {}", index_dir.display()))?;
        tracing::info!(entries = index.len(), embedder_id = %index.embedder_id(), "index ready");
        let backend = HfChatBackend::from_settings(&settings.generation).context("creating completion client")?;
        Ok(Self::new(Arc::new(index), embedder, Arc::new(backend), settings))
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    pub fn generator(&self) -> &AnswerGenerator {
        &self.generator
    }

    /// Retrieve the configured number of chunks and answer from them.
    ///
    /// Retrieval failures (embedder down, bad index) are returned as the
    /// outer error. Only generation failures end up in the inner result.
    pub async fn ask(&self, question: &str) -> docqa_core::Result<Result<String, GenerationError>> {
        let chunks = self.retrieval.retrieve(question, self.settings.retrieval.top_k)?;
        Ok(self.generator.answer(question, &chunks).await)
    }

    /// [`Self::ask`] with the generation outcome rendered for display.
    pub async fn answer_text(&self, question: &str) -> docqa_core::Result<String> {
        Ok(render_answer(self.ask(question).await?))
    }
}
