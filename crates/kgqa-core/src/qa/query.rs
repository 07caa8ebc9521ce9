//! Cypher query compilation for the fixed Topic schema
//!
//! The graph schema is `(:Topic {name, description})`, with
//! `-[:HAS_IMAGE]->(:Image {image})` and `-[:RELATED_TO]->(:Topic)` edges.
//! Entities are bound as the `$name` parameter. The literal form produced by
//! [`CypherQuery::inline`] is the only place that escapes entity text.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::intent::Intent;

/// Parameter the entity is bound to
pub const ENTITY_PARAM: &str = "name";

const DEFINITION_TEMPLATE: &str =
    "MATCH (n:Topic {name: $name}) RETURN n.description AS description";
const IMAGE_TEMPLATE: &str =
    "MATCH (n:Topic {name: $name})-[:HAS_IMAGE]->(img:Image) RETURN img.image AS image_url";
const RELATION_TEMPLATE: &str =
    "MATCH (n:Topic {name: $name})-[r:RELATED_TO]->(m) RETURN m.name AS related_topics";

/// How compiled queries are sent to the graph store
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStyle {
    /// Entity travels as a bound parameter
    #[default]
    Parameterized,
    /// Entity is embedded as an escaped string literal
    Inline,
}

impl std::fmt::Display for QueryStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryStyle::Parameterized => write!(f, "parameterized"),
            QueryStyle::Inline => write!(f, "inline"),
        }
    }
}

impl std::str::FromStr for QueryStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "parameterized" | "params" => Ok(QueryStyle::Parameterized),
            "inline" | "literal" => Ok(QueryStyle::Inline),
            other => Err(format!(
                "Invalid query style: {}. Valid options: parameterized, inline",
                other
            )),
        }
    }
}

/// A Cypher statement plus its named parameters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CypherQuery {
    pub statement: String,
    pub parameters: Map<String, Value>,
}

impl CypherQuery {
    /// A statement with no parameters
    pub fn raw(statement: impl Into<String>) -> Self {
        Self {
            statement: statement.into(),
            parameters: Map::new(),
        }
    }

    /// Bind a named parameter
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(name.into(), value.into());
        self
    }

    /// The entity bound to `$name`, if any
    pub fn entity(&self) -> Option<&str> {
        self.parameters.get(ENTITY_PARAM).and_then(Value::as_str)
    }

    /// Render with string parameters substituted as quoted literals
    pub fn inline(&self) -> String {
        let mut statement = self.statement.clone();
        for (name, value) in &self.parameters {
            if let Value::String(text) = value {
                statement = statement.replace(&format!("${name}"), &quote_literal(text));
            }
        }
        statement
    }

    /// Produce the form to send for the given style
    pub fn styled(&self, style: QueryStyle) -> CypherQuery {
        match style {
            QueryStyle::Parameterized => self.clone(),
            QueryStyle::Inline => CypherQuery::raw(self.inline()),
        }
    }
}

impl std::fmt::Display for CypherQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inline())
    }
}

/// Compile an intent and entity into a query. `None` for [`Intent::Unknown`].
pub fn compile(intent: Intent, entity: &str) -> Option<CypherQuery> {
    let template = match intent {
        Intent::Definition => DEFINITION_TEMPLATE,
        Intent::Image => IMAGE_TEMPLATE,
        Intent::Relation => RELATION_TEMPLATE,
        Intent::Unknown => return None,
    };

    Some(CypherQuery::raw(template).with_param(ENTITY_PARAM, entity))
}

/// Single-quoted Cypher string literal
fn quote_literal(text: &str) -> String {
    let escaped = text.replace('\\', "\\\\").replace('\'', "\\'");
    format!("'{escaped}'")
}
