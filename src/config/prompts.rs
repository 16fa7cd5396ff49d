//! Prompt templates for docchat.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory
//! (`qa.toml`, `chat.toml`).

use super::PromptStyle;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::OnceLock;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub qa: QaPrompts,
    pub chat: ChatPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: HashMap<String, String>,
}

/// Prompts for one-shot question answering.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QaPrompts {
    /// Short answers, at most three sentences.
    pub concise: String,
    /// Longer answers with examples and quotes.
    pub detailed: String,
    /// Map step of the map-reduce chain, run once per chunk.
    pub map: String,
    /// Reduce step of the map-reduce chain.
    pub reduce: String,
    /// Refine step, run for every chunk after the first.
    pub refine: String,
    /// Pulls the relevant part out of one retrieved chunk when compression is on.
    pub extract: String,
}

impl Default for QaPrompts {
    fn default() -> Self {
        Self {
            concise: r#"Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer. Use three sentences maximum. Keep the answer as concise as possible. Always say "thanks for asking!" at the end of the answer.

{{context}}
Question: {{question}}
Helpful Answer:"#.to_string(),

            detailed: r#"Use the following pieces of context to answer the question at the end.
If you don't know the answer, just say that you don't know, don't try to make up an answer.
Provide a detailed explanation with examples if possible.
Include relevant quotes from the context if available.

{{context}}
Question: {{question}}
Detailed Answer:"#.to_string(),

            map: r#"Use the following portion of a document to see if any of the text is relevant to answer the question.
Return any relevant text verbatim. If nothing is relevant, return an empty response.

{{context}}
Question: {{question}}
Relevant text, if any:"#.to_string(),

            reduce: r#"Given the following extracted parts of several documents and a question, create a final answer.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

{{summaries}}
Question: {{question}}
Final Answer:"#.to_string(),

            refine: r#"The original question is as follows: {{question}}
We have provided an existing answer: {{existing_answer}}
We have the opportunity to refine the existing answer (only if needed) with some more context below.
------------
{{context}}
------------
Given the new context, refine the original answer to better answer the question.
If the context isn't useful, return the original answer."#.to_string(),

            extract: r#"Given the following question and context, extract any part of the context *AS IS* that is relevant to answer the question. If none of the context is relevant return {{no_output}}.

Remember, *DO NOT* edit the extracted parts of the context.

> Question: {{question}}
> Context:
>>>
{{context}}
>>>
Extracted relevant parts:"#.to_string(),
        }
    }
}

impl QaPrompts {
    /// Template for a built-in answer style.
    pub fn for_style(&self, style: PromptStyle) -> &str {
        match style {
            PromptStyle::Concise => &self.concise,
            PromptStyle::Detailed => &self.detailed,
        }
    }
}

/// Prompts for the interactive chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatPrompts {
    /// Rewrites a follow-up into a standalone question.
    pub condense_system: String,
    pub condense_user: String,
    /// System message for answering.
    pub system: String,
    /// User message carrying history, context and the question.
    pub user: String,
}

impl Default for ChatPrompts {
    fn default() -> Self {
        Self {
            condense_system: "Given the following conversation and a follow up question, rephrase the follow up question to be a standalone question.".to_string(),

            condense_user: "{{chat_history}}\nFollow up: {{question}}".to_string(),

            system: r#"Use the following pieces of context to answer the user's question.
If you don't know the answer, just say that you don't know, don't try to make up an answer.

Context: {{context}}"#.to_string(),

            user: r#"Previous conversation:
{{chat_history}}

Question: {{question}}"#.to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let qa_path = custom_path.join("qa.toml");
            if qa_path.exists() {
                let content = std::fs::read_to_string(&qa_path)?;
                prompts.qa = toml::from_str(&content)?;
            }

            let chat_path = custom_path.join("chat.toml");
            if chat_path.exists() {
                let content = std::fs::read_to_string(&chat_path)?;
                prompts.chat = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    ///
    /// Placeholders are filled in a single pass, so `{{...}}` inside a value is
    /// left as written. Unknown placeholders are kept.
    pub fn render(template: &str, vars: &HashMap<String, String>) -> String {
        placeholder_regex()
            .replace_all(template, |caps: &regex::Captures| match vars.get(&caps[1]) {
                Some(value) => value.clone(),
                None => caps[0].to_string(),
            })
            .into_owned()
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(&self, template: &str, vars: &HashMap<String, String>) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| Regex::new(r"\{\{(\w+)\}\}").expect("valid placeholder regex"))
}
