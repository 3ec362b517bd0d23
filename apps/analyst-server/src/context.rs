use std::sync::Arc;

use anyhow::Context as _;
use tracing::info;

use analyst_agents::{ExtractorAgent, GeminiGenerator, QaAgent, Retriever, RouterAgent, SummarizerAgent};
use analyst_core::chunker::Chunker;
use analyst_core::config::{Config, Settings};
use analyst_core::loader::load_document;
use analyst_core::traits::{TextGenerator, VectorStore};
use analyst_embed::{get_default_embedder, Embedder};
use analyst_vector::{index_if_empty, LanceVectorStore};

/// Process-wide state built once at startup; handlers only read it.
pub struct AppContext {
    pub settings: Settings,
    pub document: String,
    pub retriever: Retriever,
    pub qa: QaAgent,
    pub summarizer: SummarizerAgent,
    pub extractor: ExtractorAgent,
    pub router: RouterAgent,
    generation_model: String,
}

impl AppContext {
    pub fn new(
        settings: Settings,
        document: String,
        embedder: Embedder,
        store: Arc<dyn VectorStore>,
        generator: Arc<dyn TextGenerator>,
    ) -> Self {
        let temperature = settings.gemini.temperature;
        Self {
            settings,
            document,
            retriever: Retriever::new(embedder, store),
            qa: QaAgent::new(generator.clone(), temperature),
            summarizer: SummarizerAgent::new(generator.clone()),
            extractor: ExtractorAgent::new(generator.clone()),
            generation_model: generator.model_id().to_string(),
            router: RouterAgent::new(generator),
        }
    }

    /// Build live clients, open the on-disk store, load the report and index it when the store is empty.
    pub async fn bootstrap(config: &Config) -> anyhow::Result<Self> {
        let settings = config.settings()?;
        let embedder = get_default_embedder(&settings.gemini).context("building embedder")?;
        let generator: Arc<dyn TextGenerator> =
            Arc::new(GeminiGenerator::new(&settings.gemini).context("building generation client")?);

        let store_dir = config.resolve(&settings.vector_store.path);
        let store = LanceVectorStore::open(&store_dir, &settings.vector_store.collection, embedder.dim())
            .await
            .with_context(|| format!("opening vector store at {}", store_dir.display()))?;
        let store: Arc<dyn VectorStore> = Arc::new(store);

        let doc_path = config.resolve(&settings.document.path);
        let document = load_document(&doc_path).with_context(|| format!("loading {}", doc_path.display()))?;
        info!(path = %doc_path.display(), chars = document.chars().count(), "loaded document");

        let chunker = Chunker::from_settings(&settings.chunking)?;
        if let Some(report) = index_if_empty(&document, &chunker, &embedder, store.as_ref()).await? {
            info!(chunks = report.chunks, "indexed document at startup");
        }

        Ok(Self::new(settings, document, embedder, store, generator))
    }

    pub fn store(&self) -> &Arc<dyn VectorStore> {
        self.retriever.store()
    }

    pub fn embedding_model(&self) -> &str {
        self.retriever.embedder().model_id()
    }

    pub fn generation_model(&self) -> &str {
        &self.generation_model
    }
}
