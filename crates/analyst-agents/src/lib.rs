//! Generation-backed tools for the market analyst: grounded QA, summaries,
//! structured extraction and query routing, plus the retriever that feeds QA.

#![deny(dead_code)]

pub mod extractor;
pub mod gemini;
pub mod json;
pub mod qa;
pub mod retrieval;
pub mod router;
pub mod summarizer;

pub use extractor::{Extraction, ExtractorAgent};
pub use gemini::GeminiGenerator;
pub use qa::{QaAgent, QaAnswer};
pub use retrieval::Retriever;
pub use router::{RouterAgent, RoutingDecision, Tool};
pub use summarizer::{Insights, Summary, SummarizerAgent, SummaryType};
