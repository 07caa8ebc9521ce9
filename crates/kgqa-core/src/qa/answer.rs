//! Answers and result-row interpretation

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::ResultRow;

/// Shown when the graph has no matching node
pub const NOT_FOUND_TEXT: &str = "对不起，未找到相关信息。";

/// Shown when no intent marker matched
pub const INTENT_UNKNOWN_TEXT: &str = "我不确定如何回答这个问题。";

/// Column carrying a topic description
pub const DESCRIPTION_COLUMN: &str = "description";
/// Column carrying an image URL
pub const IMAGE_URL_COLUMN: &str = "image_url";
/// Column carrying related topic names, one per row
pub const RELATED_TOPICS_COLUMN: &str = "related_topics";

/// The answer to a single question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Answer {
    /// A description or image URL
    Text(String),
    /// Related topic names, in row order
    List(Vec<String>),
    /// The node matched but the requested property was null
    Null,
    /// The graph returned no rows
    NotFound,
    /// The question matched no intent
    IntentUnknown,
}

impl Answer {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Answer::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    /// Text answers starting with an `http://` or `https://` scheme
    pub fn as_url(&self) -> Option<&str> {
        self.as_text().filter(|text| is_url(text))
    }

    /// Whether the answer came from a matching graph node
    pub fn is_found(&self) -> bool {
        matches!(self, Answer::Text(_) | Answer::List(_) | Answer::Null)
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Answer::Text(text) => write!(f, "{text}"),
            Answer::List(items) => {
                let quoted: Vec<String> = items.iter().map(|item| format!("'{item}'")).collect();
                write!(f, "[{}]", quoted.join(", "))
            }
            Answer::Null => write!(f, "null"),
            Answer::NotFound => write!(f, "{NOT_FOUND_TEXT}"),
            Answer::IntentUnknown => write!(f, "{INTENT_UNKNOWN_TEXT}"),
        }
    }
}

/// Case-sensitive check for an `http://` or `https://` prefix
pub fn is_url(text: &str) -> bool {
    text.starts_with("http://") || text.starts_with("https://")
}

/// Turn result rows into an answer.
///
/// The first row's columns decide the shape: `description` and `image_url`
/// read the first row only, `related_topics` collects every row.
pub fn interpret(rows: &[ResultRow]) -> Answer {
    let Some(first) = rows.first() else {
        return Answer::NotFound;
    };

    if let Some(value) = first.get(DESCRIPTION_COLUMN) {
        scalar_answer(value)
    } else if let Some(value) = first.get(IMAGE_URL_COLUMN) {
        scalar_answer(value)
    } else if first.contains_key(RELATED_TOPICS_COLUMN) {
        Answer::List(
            rows.iter()
                .map(|row| {
                    row.get(RELATED_TOPICS_COLUMN)
                        .map(value_text)
                        .unwrap_or_else(|| "null".to_string())
                })
                .collect(),
        )
    } else {
        Answer::NotFound
    }
}

fn scalar_answer(value: &Value) -> Answer {
    match value {
        Value::Null => Answer::Null,
        other => Answer::Text(value_text(other)),
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
