//! Deterministic stand-ins for the remote API, shared by unit tests.

use crate::embedding::Embedder;
use crate::error::{DocchatError, Result};
use crate::loader::{SourceKind, SourceMetadata};
use crate::rag::{ChatMessage, ChatModel};
use crate::splitter::TextChunk;
use crate::vector_store::StoredChunk;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

const DIMENSIONS: usize = 64;

/// Bag-of-words embedder: each lowercase word adds one to a hashed bucket.
pub struct KeywordEmbedder;

impl KeywordEmbedder {
    pub fn new() -> Self {
        Self
    }

    fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; DIMENSIONS];
        for word in text.split_whitespace() {
            let word = word.to_lowercase();
            // FNV-1a
            let mut hash: u64 = 0xcbf29ce484222325;
            for byte in word.bytes() {
                hash ^= byte as u64;
                hash = hash.wrapping_mul(0x100000001b3);
            }
            vector[(hash % DIMENSIONS as u64) as usize] += 1.0;
        }
        vector
    }
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(Self::vector(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| Self::vector(t)).collect())
    }

    fn dimensions(&self) -> usize {
        DIMENSIONS
    }

    fn model(&self) -> &str {
        "keyword-test"
    }
}

/// Chat model that records every call and replies from a queue, falling back
/// to a fixed answer.
pub struct FakeChatModel {
    default_answer: String,
    queued: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<Vec<ChatMessage>>>,
    fail_next: Mutex<bool>,
}

impl FakeChatModel {
    pub fn new(default_answer: &str) -> Self {
        Self {
            default_answer: default_answer.to_string(),
            queued: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            fail_next: Mutex::new(false),
        }
    }

    pub fn queue(&self, answers: &[&str]) {
        self.queued
            .lock()
            .unwrap()
            .extend(answers.iter().map(|a| a.to_string()));
    }

    pub fn fail_next(&self) {
        *self.fail_next.lock().unwrap() = true;
    }

    pub fn calls(&self) -> Vec<Vec<ChatMessage>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChatModel for FakeChatModel {
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String> {
        {
            let mut fail = self.fail_next.lock().unwrap();
            if *fail {
                *fail = false;
                return Err(DocchatError::OpenAI("simulated outage".to_string()));
            }
        }
        self.calls.lock().unwrap().push(messages.to_vec());
        Ok(self
            .queued
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.default_answer.clone()))
    }

    fn model(&self) -> &str {
        "fake-chat"
    }
}

/// A stored PDF chunk on page 1.
pub fn stored(source: &str, index: u32, content: &str, embedding: Vec<f32>) -> StoredChunk {
    StoredChunk::new(
        TextChunk {
            content: content.to_string(),
            metadata: SourceMetadata {
                source: source.to_string(),
                kind: SourceKind::Pdf,
                title: source.trim_end_matches(".pdf").to_string(),
                page: Some(1),
            },
            index,
        },
        embedding,
    )
}

/// Write a PDF with one page per entry; empty entries produce pages without text.
pub fn write_pdf(path: &std::path::Path, pages: &[&str]) {
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Document, Object, Stream};

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for text in pages {
        let operations = if text.is_empty() {
            Vec::new()
        } else {
            vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]
        };
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path).unwrap();
}
