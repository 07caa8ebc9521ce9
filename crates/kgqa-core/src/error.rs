//! Error types for kgqa

use thiserror::Error;

/// Result type alias using kgqa's Error
pub type Result<T> = std::result::Result<T, Error>;

/// kgqa error types with helpful messages and suggestions
#[derive(Error, Debug)]
pub enum Error {
    // Graph errors (E100-E199)
    #[error("Graph store error [{code}]: {message}")]
    GraphQuery { code: String, message: String },

    #[error("Graph store unavailable: {0}. Check `kgqa config get graph.uri` and that Neo4j is running.")]
    GraphUnavailable(String),

    #[error("Graph store rejected credentials. Set KGQA_GRAPH_PASSWORD or NEO4J_PASSWORD.")]
    GraphUnauthorized,

    #[error("Unexpected graph store response: {0}")]
    GraphProtocol(String),

    // Network errors (E200-E299)
    #[error("Network error: {0}. Check that the service is reachable.")]
    NetworkError(#[from] reqwest::Error),

    // Generator errors (E300-E399)
    #[error("LLM API error: {0}. Check `kgqa config get llm.base_url` and that the model is pulled.")]
    LLMError(String),

    #[error("LLM server error ({status}): {message}")]
    LLMServerError { status: u16, message: String },

    #[error("Rate limited. Waiting {0} seconds before retry.")]
    RateLimited(u64),

    #[error("LLM request timed out after {0} seconds")]
    LLMTimeout(u64),

    // Assist errors (E400-E499)
    #[error("Generated query was empty")]
    EmptyGeneratedQuery,

    // Config errors (E600-E699)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    // Generic errors
    #[error("{0}")]
    Other(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Get error code for this error type
    pub fn code(&self) -> &'static str {
        match self {
            Self::GraphQuery { .. } => "E100",
            Self::GraphUnavailable(_) => "E101",
            Self::GraphUnauthorized => "E102",
            Self::GraphProtocol(_) => "E103",
            Self::NetworkError(_) => "E200",
            Self::LLMError(_) => "E300",
            Self::RateLimited(_) => "E301",
            Self::LLMTimeout(_) => "E302",
            Self::LLMServerError { .. } => "E303",
            Self::EmptyGeneratedQuery => "E400",
            Self::ConfigError(_) => "E600",
            Self::Other(_) | Self::Json(_) | Self::Io(_) => "E9999",
        }
    }

    /// Get suggestion for how to fix this error
    pub fn suggestion(&self) -> Option<String> {
        match self {
            Self::GraphUnavailable(_) => Some("kgqa config get graph.uri".to_string()),
            Self::GraphUnauthorized => Some("export KGQA_GRAPH_PASSWORD=...".to_string()),
            Self::NetworkError(_) => Some("Check network connectivity".to_string()),
            Self::LLMError(_) | Self::LLMTimeout(_) | Self::LLMServerError { .. } => {
                Some("kgqa config get llm.base_url".to_string())
            }
            Self::EmptyGeneratedQuery => Some("Rephrase the question".to_string()),
            _ => None,
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited(_)
            | Self::LLMTimeout(_)
            | Self::LLMServerError { .. }
            | Self::NetworkError(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::GraphUnauthorized.code(), "E102");
        assert_eq!(Error::LLMError("x".into()).code(), "E300");
        assert_eq!(
            Error::LLMServerError {
                status: 500,
                message: "x".into()
            }
            .code(),
            "E303"
        );
        assert_eq!(Error::EmptyGeneratedQuery.code(), "E400");
        assert_eq!(Error::Other("x".into()).code(), "E9999");
    }

    #[test]
    fn test_graph_query_display() {
        let err = Error::GraphQuery {
            code: "Neo.ClientError.Statement.SyntaxError".into(),
            message: "bad".into(),
        };
        assert_eq!(
            err.to_string(),
            "Graph store error [Neo.ClientError.Statement.SyntaxError]: bad"
        );
    }

    #[test]
    fn test_suggestions() {
        assert!(Error::GraphUnauthorized.suggestion().is_some());
        assert!(Error::ConfigError("x".into()).suggestion().is_none());
    }

    #[test]
    fn test_transient() {
        assert!(Error::RateLimited(3).is_transient());
        assert!(Error::LLMTimeout(600).is_transient());
        assert!(
            Error::LLMServerError {
                status: 502,
                message: "bad gateway".into()
            }
            .is_transient()
        );
        // Classification never depends on message wording
        assert!(!Error::LLMError("Server error (502): bad gateway".into()).is_transient());
        assert!(!Error::LLMError("Bad request: nope".into()).is_transient());
        assert!(!Error::EmptyGeneratedQuery.is_transient());
    }
}
