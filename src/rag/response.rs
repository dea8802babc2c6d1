//! RAG response generation.

use super::{context::format_context_for_prompt, ChatModel, ContextBuilder, ContextChunk, OpenAIChatModel};
use crate::config::{LlmSettings, Prompts};
use crate::embedding::Embedder;
use crate::error::{HowieError, Result};
use crate::vector_store::VectorStore;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Answer given when retrieval finds nothing to ground a reply in.
pub const NO_CONTEXT_ANSWER: &str =
    "I couldn't find any relevant information in the video or the manual for this question.";

/// Turns kept in a chat session. A turn is one user message and its answer.
const MAX_HISTORY_TURNS: usize = 20;

/// RAG engine for question answering.
pub struct RagEngine {
    chat_model: Arc<dyn ChatModel>,
    context_builder: ContextBuilder,
    prompts: Prompts,
    conversation_history: Vec<ChatCompletionRequestMessage>,
}

impl RagEngine {
    /// Create an engine that answers with the configured OpenAI chat model.
    pub fn new(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        llm: &LlmSettings,
        top_k: usize,
    ) -> Result<Self> {
        let chat_model = Arc::new(OpenAIChatModel::new(llm)?);
        Ok(Self::with_components(vector_store, embedder, chat_model, top_k))
    }

    /// Create an engine with custom components.
    pub fn with_components(
        vector_store: Arc<dyn VectorStore>,
        embedder: Arc<dyn Embedder>,
        chat_model: Arc<dyn ChatModel>,
        top_k: usize,
    ) -> Self {
        let context_builder = ContextBuilder::new(vector_store, embedder).with_max_chunks(top_k);

        Self {
            chat_model,
            context_builder,
            prompts: Prompts::default(),
            conversation_history: Vec::new(),
        }
    }

    /// Set custom prompts (with user-defined variables).
    pub fn with_prompts(mut self, prompts: Prompts) -> Self {
        self.prompts = prompts;
        self
    }

    /// Answer a single question, citing the retrieved sources.
    #[instrument(skip(self), fields(question = %question))]
    pub async fn answer(&self, question: &str) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let context_chunks = self.context_builder.build(question).await?;

        if context_chunks.is_empty() {
            return Ok(RagResponse {
                answer: NO_CONTEXT_ANSWER.to_string(),
                sources: Vec::new(),
            });
        }

        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), format_context_for_prompt(&context_chunks));

        let user_prompt = self.prompts.render_with_custom(&self.prompts.rag.user, &vars);
        let system_prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.qa_system_prompt, &HashMap::new());

        let messages = vec![system_message(system_prompt)?, user_message(user_prompt)?];
        let answer = self.chat_model.complete(messages).await?;

        debug!("Generated response with {} sources", context_chunks.len());

        Ok(RagResponse {
            answer,
            sources: context_chunks,
        })
    }

    /// Start or continue a chat session.
    #[instrument(skip(self), fields(message = %message))]
    pub async fn chat(&mut self, message: &str) -> Result<RagResponse> {
        info!("Chat message: {}", message);

        let context_chunks = self.context_builder.build(message).await?;

        let user_content = if context_chunks.is_empty() {
            format!(
                "Question: {}\n\n(No relevant context found in the video or the manual)",
                message
            )
        } else {
            format!(
                "Question: {}\n\nRelevant context:\n{}",
                message,
                format_context_for_prompt(&context_chunks)
            )
        };

        let system_prompt = self
            .prompts
            .render_with_custom(&self.prompts.rag.chat_system, &HashMap::new());
        let mut messages = vec![system_message(system_prompt)?];
        messages.extend(self.conversation_history.iter().cloned());
        let user = user_message(user_content)?;
        messages.push(user.clone());

        let answer = self.chat_model.complete(messages).await?;

        // History only grows once the turn succeeded.
        self.conversation_history.push(user);
        self.conversation_history.push(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(answer.clone())
                .build()
                .map_err(|e| HowieError::InvalidInput(e.to_string()))?
                .into(),
        );
        let max_messages = 2 * MAX_HISTORY_TURNS;
        if self.conversation_history.len() > max_messages {
            let excess = self.conversation_history.len() - max_messages;
            self.conversation_history.drain(..excess);
        }

        Ok(RagResponse {
            answer,
            sources: context_chunks,
        })
    }

    /// Clear conversation history.
    pub fn clear_history(&mut self) {
        self.conversation_history.clear();
    }

    pub fn history_len(&self) -> usize {
        self.conversation_history.len()
    }
}

fn system_message(content: String) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestSystemMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| HowieError::InvalidInput(e.to_string()))?
        .into())
}

fn user_message(content: String) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| HowieError::InvalidInput(e.to_string()))?
        .into())
}

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Retrieved chunks, best first.
    pub sources: Vec<ContextChunk>,
}

impl RagResponse {
    /// The wire shape returned by the HTTP API.
    pub fn into_query_response(self) -> QueryResponse {
        QueryResponse {
            answer: self.answer,
            sources: self.sources.into_iter().map(|c| c.metadata).collect(),
        }
    }
}

/// `{answer, sources}` where each source is the metadata of a retrieved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<Map<String, Value>>,
}
