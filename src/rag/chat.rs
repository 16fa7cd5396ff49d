//! Interactive conversational retrieval.

use super::context::{format_context_for_prompt, Retriever};
use super::{ChatMessage, ChatModel, ConversationHistory, ConversationTurn, RagResponse};
use crate::config::{ChatSettings, Prompts};
use crate::error::Result;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Shown to the model in place of an empty context or history.
const NOTHING: &str = "(none)";

/// A chat over the indexed documents.
///
/// Every successful [`ChatSession::ask`] appends exactly one turn; a failed
/// call leaves the history untouched.
pub struct ChatSession {
    retriever: Retriever,
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    condense_question: bool,
    history_window: usize,
    history: ConversationHistory,
}

impl ChatSession {
    pub fn new(
        retriever: Retriever,
        model: Arc<dyn ChatModel>,
        prompts: Prompts,
        settings: &ChatSettings,
    ) -> Self {
        Self {
            retriever,
            model,
            prompts,
            condense_question: settings.condense_question,
            history_window: settings.history_window,
            history: ConversationHistory::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    #[instrument(skip(self), fields(turn = self.history.len() + 1))]
    pub async fn ask(&mut self, question: &str) -> Result<RagResponse> {
        info!("Chat message: {}", question);

        let standalone = self.condense(question).await?;
        let context = self.retriever.retrieve(&standalone).await?;

        let context_text = if context.is_empty() {
            NOTHING.to_string()
        } else {
            format_context_for_prompt(&context)
        };
        let chat_history = if self.history.is_empty() {
            NOTHING.to_string()
        } else {
            self.history.render(self.history_window)
        };

        let mut vars = HashMap::new();
        vars.insert("context".to_string(), context_text);
        vars.insert("chat_history".to_string(), chat_history);
        vars.insert("question".to_string(), standalone.clone());

        let messages = [
            ChatMessage::system(self.prompts.render_with_custom(&self.prompts.chat.system, &vars)),
            ChatMessage::user(self.prompts.render_with_custom(&self.prompts.chat.user, &vars)),
        ];
        let answer = self.model.complete(&messages).await?;

        self.history.push(ConversationTurn::new(question, answer.clone()));
        debug!("History now has {} turns", self.history.len());

        let mut response = RagResponse::new(answer, context);
        if standalone != question {
            response.standalone_question = Some(standalone);
        }
        Ok(response)
    }

    /// Rewrite a follow-up into a standalone question using the history.
    async fn condense(&self, question: &str) -> Result<String> {
        if !self.condense_question || self.history.is_empty() {
            return Ok(question.to_string());
        }

        let mut vars = HashMap::new();
        vars.insert(
            "chat_history".to_string(),
            self.history.render(self.history_window),
        );
        vars.insert("question".to_string(), question.to_string());

        let messages = [
            ChatMessage::system(self.prompts.chat.condense_system.clone()),
            ChatMessage::user(self.prompts.render_with_custom(&self.prompts.chat.condense_user, &vars)),
        ];
        let rewritten = self.model.complete(&messages).await?;
        let rewritten = rewritten.trim();

        if rewritten.is_empty() {
            Ok(question.to_string())
        } else {
            debug!("Condensed question: {}", rewritten);
            Ok(rewritten.to_string())
        }
    }
}
