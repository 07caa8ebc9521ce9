//! kgqa Core Library
//!
//! Question answering over a knowledge graph of topics, including:
//! - Intent classification, entity extraction and Cypher compilation (`qa`)
//! - Graph store access (Neo4j HTTP API)
//! - LLM integration (Ollama chat API)
//! - Follow-up enrichment with retry and an append-only answer log
//! - LLM-assisted query generation (`assist`)

pub mod assist;
pub mod config;
pub mod enrich;
pub mod error;
pub mod graph;
pub mod llm;
pub mod qa;
pub mod session;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::enrich::{Enricher, FollowupRecord, RetryPolicy};
    pub use crate::error::{Error, Result};
    pub use crate::graph::{GraphStore, Neo4jClient, ResultRow};
    pub use crate::llm::{Generator, OllamaClient};
    pub use crate::qa::{Answer, CypherQuery, Intent, QaOutcome, QaPipeline, QueryPlan};
    pub use crate::session::{QaSession, SessionReport};
    pub use crate::storage::{AnswerLog, LogFormat};
}
