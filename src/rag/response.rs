//! Answers and the context they were grounded on.

use super::context::format_context_for_display;
use super::ContextChunk;

/// A RAG response with answer and sources.
#[derive(Debug, Clone)]
pub struct RagResponse {
    /// The generated answer.
    pub answer: String,
    /// Source chunks used for the answer.
    pub sources: Vec<ContextChunk>,
    /// The rewritten question used for retrieval, when it differs from the input.
    pub standalone_question: Option<String>,
}

impl RagResponse {
    pub fn new(answer: String, sources: Vec<ContextChunk>) -> Self {
        Self {
            answer,
            sources,
            standalone_question: None,
        }
    }

    /// Format the response for display.
    pub fn format_for_display(&self) -> String {
        let mut output = self.answer.clone();

        if !self.sources.is_empty() {
            output.push_str("\n\n--- Sources ---\n");
            output.push_str(&format_context_for_display(&self.sources));
        }

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_for_display() {
        let response = RagResponse::new(
            "The answer.".to_string(),
            vec![ContextChunk::for_test("guide.pdf", "text")],
        );
        let shown = response.format_for_display();
        assert!(shown.starts_with("The answer."));
        assert!(shown.contains("--- Sources ---"));
        assert!(shown.contains("[1] guide.pdf p.1"));

        let bare = RagResponse::new("Only.".to_string(), Vec::new());
        assert_eq!(bare.format_for_display(), "Only.");
    }
}
