//! Question answering over the Topic graph
//!
//! - `intent`: ordered marker rules that pick an [`Intent`]
//! - `entity`: entity slicing and normalization
//! - `query`: Cypher compilation for each intent
//! - `answer`: result-row interpretation into an [`Answer`]
//! - `keywords`: keyword extraction from prior answers
//! - `pipeline`: the composed question → answer flow

mod answer;
mod entity;
mod intent;
mod keywords;
mod pipeline;
mod query;

pub use answer::{
    Answer, DESCRIPTION_COLUMN, IMAGE_URL_COLUMN, INTENT_UNKNOWN_TEXT, NOT_FOUND_TEXT,
    RELATED_TOPICS_COLUMN, interpret, is_url,
};
pub use entity::{IMAGE_SUFFIX, RELATION_SUFFIX, extract_entity, normalize};
pub use intent::{INTENT_RULES, Intent, IntentRule, classify};
pub use keywords::extract_keywords;
pub use pipeline::{QaOutcome, QaPipeline, QueryPlan};
pub use query::{CypherQuery, ENTITY_PARAM, QueryStyle, compile};
