//! Follow-up enrichment through the generative model

mod orchestrator;
mod retry;

pub use orchestrator::{
    Enricher, FAILURE_PLACEHOLDER, FollowupRecord, link_prompt, topic_prompt,
};
pub use retry::RetryPolicy;
