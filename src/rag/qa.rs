//! One-shot question answering over retrieved context.

use super::context::{format_context_for_prompt, Retriever};
use super::{ChatMessage, ChatModel, ContextChunk, RagResponse};
use crate::config::{ChainType, PromptStyle, Prompts};
use crate::error::Result;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Returned without calling the model when nothing relevant was retrieved.
pub const NO_CONTEXT_ANSWER: &str =
    "I don't know. No relevant passages were found in the indexed documents.";

/// Answers single questions with a configurable combine chain.
pub struct QaEngine {
    retriever: Retriever,
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
    chain_type: ChainType,
    style: PromptStyle,
}

impl QaEngine {
    pub fn new(retriever: Retriever, model: Arc<dyn ChatModel>, prompts: Prompts) -> Self {
        Self {
            retriever,
            model,
            prompts,
            chain_type: ChainType::Stuff,
            style: PromptStyle::Concise,
        }
    }

    pub fn with_chain_type(mut self, chain_type: ChainType) -> Self {
        self.chain_type = chain_type;
        self
    }

    pub fn with_style(mut self, style: PromptStyle) -> Self {
        self.style = style;
        self
    }

    /// Answer a question.
    ///
    /// `template_override` replaces the style template; it sees `{{context}}`
    /// and `{{question}}`.
    #[instrument(skip(self, template_override), fields(chain = %self.chain_type))]
    pub async fn ask(&self, question: &str, template_override: Option<&str>) -> Result<RagResponse> {
        info!("Processing question: {}", question);

        let context = self.retriever.retrieve(question).await?;
        if context.is_empty() {
            return Ok(RagResponse::new(NO_CONTEXT_ANSWER.to_string(), Vec::new()));
        }

        let template = template_override.unwrap_or_else(|| self.prompts.qa.for_style(self.style));

        let answer = match self.chain_type {
            ChainType::Stuff => self.stuff(question, template, &context).await?,
            ChainType::MapReduce => self.map_reduce(question, template_override, &context).await?,
            ChainType::Refine => self.refine(question, template, &context).await?,
        };

        debug!("Answered from {} chunks", context.len());
        Ok(RagResponse::new(answer, context))
    }

    async fn stuff(&self, question: &str, template: &str, context: &[ContextChunk]) -> Result<String> {
        let prompt = self.render(template, question, &format_context_for_prompt(context), &[]);
        self.model.complete(&[ChatMessage::user(prompt)]).await
    }

    async fn map_reduce(
        &self,
        question: &str,
        template_override: Option<&str>,
        context: &[ContextChunk],
    ) -> Result<String> {
        let extractions = try_join_all(context.iter().map(|chunk| {
            let prompt = self.render(&self.prompts.qa.map, question, &chunk.content, &[]);
            async move { self.model.complete(&[ChatMessage::user(prompt)]).await }
        }))
        .await?;

        let kept: Vec<&str> = extractions
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        debug!("Map step kept {} of {} chunks", kept.len(), context.len());
        let summaries = kept.join("\n\n");

        let template = template_override.unwrap_or(self.prompts.qa.reduce.as_str());
        let prompt = self.render(template, question, &summaries, &[("summaries", &summaries)]);
        self.model.complete(&[ChatMessage::user(prompt)]).await
    }

    async fn refine(&self, question: &str, template: &str, context: &[ContextChunk]) -> Result<String> {
        let (first, rest) = match context.split_first() {
            Some(split) => split,
            None => return Ok(NO_CONTEXT_ANSWER.to_string()),
        };

        let mut answer = self.stuff(question, template, std::slice::from_ref(first)).await?;
        for chunk in rest {
            let prompt = self.render(
                &self.prompts.qa.refine,
                question,
                &chunk.content,
                &[("existing_answer", &answer)],
            );
            answer = self.model.complete(&[ChatMessage::user(prompt)]).await?;
        }
        Ok(answer)
    }

    fn render(&self, template: &str, question: &str, context: &str, extra: &[(&str, &str)]) -> String {
        let mut vars = HashMap::new();
        vars.insert("question".to_string(), question.to_string());
        vars.insert("context".to_string(), context.to_string());
        for (key, value) in extra {
            vars.insert(key.to_string(), value.to_string());
        }
        self.prompts.render_with_custom(template, &vars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RetrievalSettings;
    use crate::embedding::Embedder;
    use crate::testing::{stored, FakeChatModel, KeywordEmbedder};
    use crate::vector_store::{MemoryVectorStore, VectorStore};

    async fn retriever(texts: &[&str]) -> Retriever {
        let embedder = Arc::new(KeywordEmbedder::new());
        let store: Arc<dyn VectorStore> = Arc::new(MemoryVectorStore::new());
        let mut chunks = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            chunks.push(stored("policy.pdf", i as u32, text, embedder.embed(text).await.unwrap()));
        }
        store.upsert_batch(&chunks).await.unwrap();
        Retriever::new(store, embedder, &RetrievalSettings::default())
    }

    #[tokio::test]
    async fn test_stuff_chain_single_call_with_all_context() {
        let model = Arc::new(FakeChatModel::new("Answer. thanks for asking!"));
        let engine = QaEngine::new(
            retriever(&["kyc means know your customer", "kyc applies to banks"]).await,
            model.clone(),
            Prompts::default(),
        );

        let response = engine.ask("what is kyc", None).await.unwrap();
        assert_eq!(response.answer, "Answer. thanks for asking!");
        assert_eq!(response.sources.len(), 2);

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        let prompt = &calls[0][0].content;
        assert!(prompt.contains("Question: what is kyc"));
        assert!(prompt.contains("know your customer"));
        assert!(prompt.contains("applies to banks"));
        assert!(prompt.contains("thanks for asking!"));
    }

    #[tokio::test]
    async fn test_no_context_skips_model() {
        let model = Arc::new(FakeChatModel::new("unused"));
        let engine = QaEngine::new(retriever(&[]).await, model.clone(), Prompts::default());

        let response = engine.ask("anything", None).await.unwrap();
        assert_eq!(response.answer, NO_CONTEXT_ANSWER);
        assert!(model.calls().is_empty());
    }

    #[tokio::test]
    async fn test_template_override() {
        let model = Arc::new(FakeChatModel::new("ok"));
        let engine = QaEngine::new(retriever(&["kyc rules"]).await, model.clone(), Prompts::default());

        engine
            .ask("kyc", Some("CTX={{context}} Q={{question}}"))
            .await
            .unwrap();
        assert_eq!(model.calls()[0][0].content, "CTX=kyc rules Q=kyc");
    }

    #[tokio::test]
    async fn test_map_reduce_chain() {
        let model = Arc::new(FakeChatModel::new("final"));
        model.queue(&["extract one", "  ", "extract three"]);
        let engine = QaEngine::new(
            retriever(&["kyc one", "kyc two", "kyc three"]).await,
            model.clone(),
            Prompts::default(),
        )
        .with_chain_type(ChainType::MapReduce);

        let response = engine.ask("kyc", None).await.unwrap();
        assert_eq!(response.answer, "final");

        let calls = model.calls();
        assert_eq!(calls.len(), 4);
        let reduce = &calls[3][0].content;
        assert!(reduce.contains("extract one\n\nextract three"));
        assert!(reduce.contains("Final Answer:"));
    }

    #[tokio::test]
    async fn test_refine_chain() {
        let model = Arc::new(FakeChatModel::new("unused"));
        model.queue(&["draft", "better", "best"]);
        let engine = QaEngine::new(
            retriever(&["kyc one", "kyc two", "kyc three"]).await,
            model.clone(),
            Prompts::default(),
        )
        .with_chain_type(ChainType::Refine);

        let response = engine.ask("kyc", None).await.unwrap();
        assert_eq!(response.answer, "best");

        let calls = model.calls();
        assert_eq!(calls.len(), 3);
        assert!(calls[1][0].content.contains("existing answer: draft"));
        assert!(calls[2][0].content.contains("existing answer: better"));
    }
}
