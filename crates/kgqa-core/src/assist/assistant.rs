//! LLM-assisted querying: question → generated Cypher → triples → prose

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::graph::{GraphStore, ResultRow};
use crate::llm::Generator;
use crate::qa::{CypherQuery, NOT_FOUND_TEXT};

use super::prompts::{Triple, description_prompt, query_generation_prompt};

const LABELS_QUERY: &str = "CALL db.labels() YIELD label RETURN label";
const RELATIONSHIP_TYPES_QUERY: &str =
    "CALL db.relationshipTypes() YIELD relationshipType RETURN relationshipType";

/// Entity labels and relationship types present in the graph
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GraphSchema {
    pub labels: Vec<String>,
    pub relation_types: Vec<String>,
}

/// Result of an assisted question
#[derive(Debug, Clone, Serialize)]
pub struct AssistOutcome {
    pub question: String,
    pub query: String,
    pub triples: Vec<Triple>,
    pub description: String,
}

/// Lets the generator write the graph query, then describe what came back
pub struct GraphAssistant<S: GraphStore, G: Generator> {
    store: Arc<S>,
    generator: Arc<G>,
    database: Option<String>,
}

impl<S: GraphStore, G: Generator> GraphAssistant<S, G> {
    pub fn new(store: Arc<S>, generator: Arc<G>) -> Self {
        Self {
            store,
            generator,
            database: None,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Read labels and relationship types from the store
    pub async fn schema(&self) -> Result<GraphSchema> {
        let labels = self
            .store
            .run(&CypherQuery::raw(LABELS_QUERY), self.database.as_deref())
            .await?;
        let relation_types = self
            .store
            .run(
                &CypherQuery::raw(RELATIONSHIP_TYPES_QUERY),
                self.database.as_deref(),
            )
            .await?;

        Ok(GraphSchema {
            labels: string_column(&labels, "label"),
            relation_types: string_column(&relation_types, "relationshipType"),
        })
    }

    pub async fn ask(&self, question: &str) -> Result<AssistOutcome> {
        let schema = self.schema().await?;
        debug!(
            labels = schema.labels.len(),
            relation_types = schema.relation_types.len(),
            "Loaded graph schema"
        );

        let prompt = query_generation_prompt(question, &schema.labels, &schema.relation_types);
        let response = self.generator.generate(&prompt).await?;
        let query = extract_cypher(&response);
        if query.is_empty() {
            return Err(Error::EmptyGeneratedQuery);
        }
        info!(query = %query, "Generated Cypher");

        let rows = self
            .store
            .run(&CypherQuery::raw(&query), self.database.as_deref())
            .await?;
        let triples = triples_from_rows(&rows);

        let description = if triples.is_empty() {
            NOT_FOUND_TEXT.to_string()
        } else {
            self.generator
                .generate(&description_prompt(&triples))
                .await?
        };

        info!(triples = triples.len(), "Assisted question answered");
        Ok(AssistOutcome {
            question: question.to_string(),
            query,
            triples,
            description,
        })
    }
}

/// Pull the Cypher statement out of a model reply.
///
/// Strips Markdown code fences, surrounding whitespace and a trailing `;`.
pub fn extract_cypher(response: &str) -> String {
    let trimmed = response.trim();

    let body = match trimmed.find("```") {
        Some(start) => {
            let after_fence = &trimmed[start + 3..];
            // skip the language tag line
            let code = after_fence
                .split_once('\n')
                .map(|(_, rest)| rest)
                .unwrap_or(after_fence);
            code.split("```").next().unwrap_or(code)
        }
        None => trimmed,
    };

    body.trim().trim_end_matches(';').trim().to_string()
}

/// Rows carrying string `entity_1`, `relation` and `entity_2` columns
pub fn triples_from_rows(rows: &[ResultRow]) -> Vec<Triple> {
    rows.iter()
        .filter_map(|row| {
            let field = |name: &str| row.get(name).and_then(Value::as_str).map(str::to_string);
            Some(Triple {
                entity_1: field("entity_1")?,
                relation: field("relation")?,
                entity_2: field("entity_2")?,
            })
        })
        .collect()
}

fn string_column(rows: &[ResultRow], column: &str) -> Vec<String> {
    rows.iter()
        .filter_map(|row| row.get(column).and_then(Value::as_str))
        .map(str::to_string)
        .collect()
}
