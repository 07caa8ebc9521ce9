//! Graph store access
//!
//! The [`GraphStore`] trait is the seam between query compilation and the
//! property graph. [`Neo4jClient`] implements it over Neo4j's HTTP
//! transactional endpoint.

mod neo4j;

pub use neo4j::{Neo4jClient, Neo4jClientBuilder};

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::qa::CypherQuery;

/// One result row: column name to value, in the order the query returned them
pub type ResultRow = Map<String, Value>;

/// A property graph that can run Cypher
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Run a query and return its rows.
    ///
    /// `database` selects a named database; `None` uses the store's default.
    async fn run(&self, query: &CypherQuery, database: Option<&str>) -> Result<Vec<ResultRow>>;
}
