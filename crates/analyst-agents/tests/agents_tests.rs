use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use analyst_agents::{QaAgent, Retriever, RouterAgent, SummarizerAgent, Tool};
use analyst_core::chunker::Chunker;
use analyst_core::traits::{TextGenerator, VectorStore};
use analyst_core::types::{GenerationParams, MetadataFilter};
use analyst_core::{Error, Result};
use analyst_embed::{Embedder, FakeEmbedder, EMBEDDING_DIM};
use analyst_vector::{index_document, MemoryVectorStore};

const REPORT: &str = "Innovate Inc. holds twelve percent of the workflow automation market.\n\n\
The total addressable market is projected to reach fifteen billion dollars by 2030.\n\n\
Competitors include Synergy Systems and FutureFlow with larger shares.\n\n\
Threats include aggressive pricing from larger incumbents.";

struct Canned {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl Canned {
    fn new(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl TextGenerator for Canned {
    fn model_id(&self) -> &str {
        "canned"
    }

    async fn generate(&self, prompt: &str, _params: GenerationParams) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies.lock().unwrap().pop_front().ok_or_else(|| Error::Upstream("no reply left".into()))
    }
}

async fn indexed_retriever() -> Retriever {
    let embedder = Embedder::new(Arc::new(FakeEmbedder::new(EMBEDDING_DIM)));
    let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new("market_research"));
    let chunker = Chunker::new(100, 10).unwrap();
    let report = index_document(REPORT, &chunker, &embedder, store.as_ref()).await.unwrap();
    assert_eq!(report.chunks, 4);
    Retriever::new(embedder, store)
}

#[tokio::test]
async fn retrieval_ranks_the_matching_paragraph_first() {
    let retriever = indexed_retriever().await;

    let hits = retriever
        .retrieve("Competitors include Synergy Systems and FutureFlow with larger shares.", 2)
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert!(hits.documents[0].starts_with("Competitors include Synergy Systems"));
    assert!(hits.distances[0] < 1e-4);
    assert!(hits.distances[0] <= hits.distances[1]);
    assert_eq!(hits.metadatas[0].chunk_index, 2);
}

#[tokio::test]
async fn retrieval_honours_metadata_filter() {
    let retriever = indexed_retriever().await;
    let filter = MetadataFilter { chunk_index: Some(3), ..Default::default() };

    let hits = retriever.retrieve_filtered("market share", 5, Some(&filter)).await.unwrap();

    assert_eq!(hits.len(), 1);
    assert_eq!(hits.metadatas[0].chunk_index, 3);
}

#[tokio::test]
async fn retrieved_chunks_flow_into_grounded_answer() {
    let retriever = indexed_retriever().await;
    let generator = Canned::new(&["Innovate Inc. holds twelve percent of the market [Source 1] per the report."]);
    let qa = QaAgent::new(generator.clone(), 0.2);

    let hits = retriever.retrieve("What share does Innovate Inc. hold?", 3).await.unwrap();
    let answer = qa.answer("What share does Innovate Inc. hold?", &hits.documents, Some(&hits.metadatas)).await.unwrap();

    assert_eq!(answer.sources.len(), 3);
    assert_eq!(answer.source_metadata, hits.metadatas);
    assert_eq!(answer.confidence, 0.85);
    let prompts = generator.prompts.lock().unwrap();
    assert!(prompts[0].contains("[Source 3]"));
    assert!(!prompts[0].contains("[Source 4]"));
}

#[tokio::test]
async fn router_then_summarizer() {
    let generator = Canned::new(&[
        "{\"tool\": \"summarize\", \"confidence\": 0.9, \"reasoning\": \"overview requested\"}",
        "Innovate Inc. is a challenger in workflow automation.",
    ]);
    let router = RouterAgent::new(generator.clone());
    let summarizer = SummarizerAgent::new(generator.clone());

    let decision = router.route("Summarize the report").await;
    assert_eq!(decision.tool, Tool::Summarize);

    let summary = summarizer.summarize(REPORT, "comprehensive", 200).await.unwrap();
    assert_eq!(summary.word_count, 8);
    assert_eq!(generator.prompts.lock().unwrap().len(), 2);
}
