//! Question → answer pipeline

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::graph::GraphStore;

use super::answer::{Answer, interpret};
use super::entity::extract_entity;
use super::intent::{Intent, classify};
use super::query::{CypherQuery, QueryStyle, compile};

/// The offline part of answering: what would be asked of the graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryPlan {
    pub intent: Intent,
    pub entity: Option<String>,
    pub query: Option<CypherQuery>,
}

impl QueryPlan {
    /// Classify, extract and compile without touching the graph
    pub fn for_question(question: &str) -> Self {
        let intent = classify(question);
        let entity = extract_entity(intent, question);
        let query = entity
            .as_deref()
            .and_then(|entity| compile(intent, entity));

        Self {
            intent,
            entity,
            query,
        }
    }
}

/// A question together with how it was answered
#[derive(Debug, Clone, Serialize)]
pub struct QaOutcome {
    pub question: String,
    #[serde(flatten)]
    pub plan: QueryPlan,
    pub answer: Answer,
}

impl QaOutcome {
    pub fn intent(&self) -> Intent {
        self.plan.intent
    }
}

/// Answers questions from a graph store
pub struct QaPipeline<S: GraphStore> {
    store: Arc<S>,
    database: Option<String>,
    style: QueryStyle,
}

impl<S: GraphStore> QaPipeline<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            database: None,
            style: QueryStyle::default(),
        }
    }

    /// Target a named database instead of the store default
    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_query_style(mut self, style: QueryStyle) -> Self {
        self.style = style;
        self
    }

    /// Answer a question, surfacing graph store failures
    pub async fn try_answer(&self, question: &str) -> Result<QaOutcome> {
        let plan = QueryPlan::for_question(question);

        let answer = match &plan.query {
            None => {
                debug!(question = %question, "No intent matched");
                Answer::IntentUnknown
            }
            Some(query) => {
                let sent = query.styled(self.style);
                let rows = self.store.run(&sent, self.database.as_deref()).await?;
                interpret(&rows)
            }
        };

        info!(
            intent = %plan.intent,
            entity = plan.entity.as_deref().unwrap_or(""),
            found = answer.is_found(),
            "Answered question"
        );

        Ok(QaOutcome {
            question: question.to_string(),
            plan,
            answer,
        })
    }

    /// Answer a question; a graph store failure degrades to "not found"
    pub async fn answer(&self, question: &str) -> QaOutcome {
        match self.try_answer(question).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(question = %question, error = %e, "Graph query failed");
                QaOutcome {
                    question: question.to_string(),
                    plan: QueryPlan::for_question(question),
                    answer: Answer::NotFound,
                }
            }
        }
    }
}
