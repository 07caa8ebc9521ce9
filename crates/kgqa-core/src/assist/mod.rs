//! LLM-assisted graph querying
//!
//! For questions the fixed intents do not cover: the generator writes a
//! Cypher statement from a few-shot prompt describing the graph schema, the
//! statement runs against the store, and the resulting triples are handed
//! back to the generator to be described in prose.

mod assistant;
mod prompts;

pub use assistant::{AssistOutcome, GraphAssistant, GraphSchema, extract_cypher, triples_from_rows};
pub use prompts::{Triple, description_prompt, example_query, query_generation_prompt};
