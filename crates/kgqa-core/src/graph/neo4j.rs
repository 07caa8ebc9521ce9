//! Neo4j client over the HTTP transactional API
//!
//! Each [`GraphStore::run`] call is one auto-commit transaction against
//! `POST {uri}/db/{database}/tx/commit`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::qa::CypherQuery;

use super::{GraphStore, ResultRow};

/// Database used when neither the call nor the config names one
const DEFAULT_DATABASE: &str = "neo4j";

#[derive(Debug, Serialize)]
struct CommitRequest<'a> {
    statements: Vec<Statement<'a>>,
}

#[derive(Debug, Serialize)]
struct Statement<'a> {
    statement: &'a str,
    parameters: &'a Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    #[serde(default)]
    results: Vec<StatementResult>,
    #[serde(default)]
    errors: Vec<ServerError>,
}

#[derive(Debug, Deserialize)]
struct StatementResult {
    columns: Vec<String>,
    #[serde(default)]
    data: Vec<RowData>,
}

#[derive(Debug, Deserialize)]
struct RowData {
    row: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ServerError {
    code: String,
    message: String,
}

/// Neo4j HTTP client
///
/// Created once at the composition root with [`Neo4jClient::connect`] and
/// released with [`Neo4jClient::close`].
#[derive(Clone)]
pub struct Neo4jClient {
    http_client: HttpClient,
    base_url: String,
    user: String,
    password: Option<String>,
    database: String,
}

impl std::fmt::Debug for Neo4jClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Neo4jClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .field("database", &self.database)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

/// Builder for creating a Neo4jClient
#[derive(Default)]
pub struct Neo4jClientBuilder {
    config: Option<GraphConfig>,
    password: Option<String>,
}

impl Neo4jClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the graph configuration
    pub fn config(mut self, config: GraphConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the password (read from the environment by callers)
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Build the client without contacting the server
    pub fn build(self) -> Result<Neo4jClient> {
        let config = self.config.unwrap_or_default();
        if config.password.is_some() {
            return Err(Error::ConfigError(
                "graph password must come from the environment".to_string(),
            ));
        }

        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(Error::NetworkError)?;

        Ok(Neo4jClient {
            http_client,
            base_url: config.uri.trim_end_matches('/').to_string(),
            user: config.user,
            password: self.password,
            database: config
                .database
                .unwrap_or_else(|| DEFAULT_DATABASE.to_string()),
        })
    }
}

impl Neo4jClient {
    pub fn builder() -> Neo4jClientBuilder {
        Neo4jClientBuilder::new()
    }

    /// Build a client and verify the server answers a trivial query
    pub async fn connect(config: GraphConfig, password: Option<String>) -> Result<Self> {
        let mut builder = Self::builder().config(config);
        if let Some(password) = password {
            builder = builder.password(password);
        }
        let client = builder.build()?;

        client
            .run(&CypherQuery::raw("RETURN 1 AS ok"), None)
            .await
            .map_err(|e| match e {
                Error::NetworkError(inner) => Error::GraphUnavailable(inner.to_string()),
                other => other,
            })?;

        info!(url = %client.base_url, database = %client.database, "Connected to Neo4j");
        Ok(client)
    }

    /// Release the client
    pub fn close(self) {
        info!(url = %self.base_url, "Closed Neo4j connection");
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn commit_url(&self, database: &str) -> String {
        format!("{}/db/{}/tx/commit", self.base_url, database)
    }
}

#[async_trait]
impl GraphStore for Neo4jClient {
    async fn run(&self, query: &CypherQuery, database: Option<&str>) -> Result<Vec<ResultRow>> {
        let database = database.unwrap_or(&self.database);
        let url = self.commit_url(database);

        debug!(
            database = %database,
            statement = %query.statement,
            params = query.parameters.len(),
            "Running Cypher statement"
        );

        let body = CommitRequest {
            statements: vec![Statement {
                statement: &query.statement,
                parameters: &query.parameters,
            }],
        };

        let mut request = self
            .http_client
            .post(&url)
            .header("Accept", "application/json;charset=UTF-8")
            .json(&body);
        if let Some(password) = &self.password {
            request = request.basic_auth(&self.user, Some(password));
        }

        let response = request.send().await.map_err(Error::NetworkError)?;
        let status = response.status();

        match status.as_u16() {
            401 | 403 => return Err(Error::GraphUnauthorized),
            404 => {
                return Err(Error::GraphUnavailable(format!(
                    "database '{}' not found at {}",
                    database, self.base_url
                )));
            }
            _ if !status.is_success() => {
                let text = response.text().await.unwrap_or_default();
                return Err(Error::GraphProtocol(format!("HTTP {}: {}", status, text)));
            }
            _ => {}
        }

        let parsed: CommitResponse = response
            .json()
            .await
            .map_err(|e| Error::GraphProtocol(format!("Failed to parse response: {}", e)))?;

        let rows = rows_from_response(parsed)?;
        debug!(rows = rows.len(), "Cypher statement returned");
        Ok(rows)
    }
}

fn rows_from_response(response: CommitResponse) -> Result<Vec<ResultRow>> {
    if let Some(error) = response.errors.into_iter().next() {
        warn!(code = %error.code, "Neo4j rejected statement");
        return Err(Error::GraphQuery {
            code: error.code,
            message: error.message,
        });
    }

    let Some(result) = response.results.into_iter().next() else {
        return Ok(Vec::new());
    };

    result
        .data
        .into_iter()
        .map(|data| {
            if data.row.len() != result.columns.len() {
                return Err(Error::GraphProtocol(format!(
                    "row has {} values for {} columns",
                    data.row.len(),
                    result.columns.len()
                )));
            }
            Ok(result.columns.iter().cloned().zip(data.row).collect())
        })
        .collect()
}
