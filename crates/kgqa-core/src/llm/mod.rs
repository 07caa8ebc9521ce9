//! LLM integration - Ollama chat API
//!
//! This module provides:
//! - The [`Generator`] trait the enrichment cascade and assistant talk to
//! - An Ollama HTTP client implementing it
//! - Request/response types for `/api/chat`

mod client;
mod types;

pub use client::{OllamaClient, OllamaClientBuilder};
pub use types::{ChatOptions, ChatRequest, ChatResponse, LlmResponse, Message, MessageRole};

use async_trait::async_trait;

use crate::error::Result;

/// A generative model that answers a prompt with text
#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}
