//! Contextual compression of retrieved chunks.

use super::{ChatMessage, ChatModel, ContextChunk};
use crate::config::Prompts;
use crate::error::Result;
use futures::future::try_join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Marker the model returns when a chunk has nothing relevant.
pub const NO_OUTPUT: &str = "NO_OUTPUT";

/// Asks the model to keep only the relevant part of each chunk.
///
/// Chunks with nothing relevant are dropped; the rest keep their metadata and
/// score with the extracted text as content.
pub struct ContextCompressor {
    model: Arc<dyn ChatModel>,
    prompts: Prompts,
}

impl ContextCompressor {
    pub fn new(model: Arc<dyn ChatModel>, prompts: Prompts) -> Self {
        Self { model, prompts }
    }

    #[instrument(skip(self, chunks), fields(model = self.model.model(), chunks = chunks.len()))]
    pub async fn compress(&self, question: &str, chunks: Vec<ContextChunk>) -> Result<Vec<ContextChunk>> {
        let extractions = try_join_all(chunks.iter().map(|chunk| {
            let mut vars = HashMap::new();
            vars.insert("question".to_string(), question.to_string());
            vars.insert("context".to_string(), chunk.content.clone());
            vars.insert("no_output".to_string(), NO_OUTPUT.to_string());
            let prompt = self.prompts.render_with_custom(&self.prompts.qa.extract, &vars);
            async move { self.model.complete(&[ChatMessage::user(prompt)]).await }
        }))
        .await?;

        let total = chunks.len();
        let kept: Vec<ContextChunk> = chunks
            .into_iter()
            .zip(extractions)
            .filter_map(|(mut chunk, extracted)| {
                let extracted = extracted.trim();
                if extracted.is_empty() || extracted == NO_OUTPUT {
                    return None;
                }
                chunk.content = extracted.to_string();
                Some(chunk)
            })
            .collect();

        debug!("Compression kept {} of {} chunks", kept.len(), total);
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeChatModel;

    #[tokio::test]
    async fn test_keeps_extracted_text_and_drops_irrelevant() {
        let model = Arc::new(FakeChatModel::new(""));
        model.queue(&["Verify identity documents.", "NO_OUTPUT", "  "]);
        let compressor = ContextCompressor::new(model.clone(), Prompts::default());

        let chunks = vec![
            ContextChunk::for_test("kyc.pdf", "Intro. Verify identity documents. Other text."),
            ContextChunk::for_test("aml.pdf", "Unrelated."),
            ContextChunk::for_test("misc.pdf", "Also unrelated."),
        ];
        let kept = compressor.compress("How is identity checked?", chunks).await.unwrap();

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].source, "kyc.pdf");
        assert_eq!(kept[0].content, "Verify identity documents.");

        let calls = model.calls();
        assert_eq!(calls.len(), 3);
        let prompt = &calls[0][0].content;
        assert!(prompt.contains("How is identity checked?"));
        assert!(prompt.contains("Intro. Verify identity documents. Other text."));
        assert!(prompt.contains("return NO_OUTPUT"));
    }

    #[tokio::test]
    async fn test_model_failure_is_an_error() {
        let model = Arc::new(FakeChatModel::new("x"));
        model.fail_next();
        let compressor = ContextCompressor::new(model, Prompts::default());
        let chunks = vec![ContextChunk::for_test("kyc.pdf", "text")];
        assert!(compressor.compress("q", chunks).await.is_err());
    }
}
