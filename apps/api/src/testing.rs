// In-memory doubles for the four service seams. Unit tests exercise the
// pipeline, repository and cache against these instead of live Redis/S3/API.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bytes::Bytes;

use crate::inference::{
    ChatMessage, ChatOptions, ChatResponse, InferenceError, InferenceService, MessageContent,
    RequestBlock, ResponseMessage,
};
use crate::kv::{KeyValueStore, KvEntry};
use crate::rasterize::{DocumentRasterizer, RasterPage, RasterizeError};
use crate::storage::ObjectStore;

/// Matches a glob pattern where `*` stands for any run of characters.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let parts: Vec<&str> = pattern.split('*').collect();
    if parts.len() == 1 {
        return pattern == text;
    }

    let mut rest = text;
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            if !rest.starts_with(part) {
                return false;
            }
            rest = &rest[part.len()..];
        } else if i == parts.len() - 1 {
            return part.is_empty() || rest.ends_with(part);
        } else if !part.is_empty() {
            match rest.find(part) {
                Some(pos) => rest = &rest[pos + part.len()..],
                None => return false,
            }
        }
    }
    true
}

/// `KeyValueStore` over a plain map.
#[derive(Default)]
pub struct MemoryKv {
    map: Mutex<BTreeMap<String, String>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.map
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn len(&self) -> usize {
        self.map.lock().unwrap().len()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKv {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.map.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool> {
        let mut map = self.map.lock().unwrap();
        if map.contains_key(key) {
            return Ok(false);
        }
        map.insert(key.to_string(), value.to_string());
        Ok(true)
    }

    async fn list(&self, pattern: &str, with_values: bool) -> Result<Vec<KvEntry>> {
        Ok(self
            .map
            .lock()
            .unwrap()
            .iter()
            .filter(|(key, _)| glob_match(pattern, key))
            .map(|(key, value)| KvEntry {
                key: key.clone(),
                value: with_values.then(|| value.clone()),
            })
            .collect())
    }

    async fn flush(&self) -> Result<()> {
        self.map.lock().unwrap().clear();
        Ok(())
    }
}

/// `ObjectStore` over a plain map, with knobs for injecting upload and
/// delete failures.
#[derive(Default)]
pub struct MemoryStore {
    pub objects: Mutex<BTreeMap<String, Vec<u8>>>,
    pub uploads: AtomicUsize,
    /// Uploads with a zero-based index >= this value fail.
    pub fail_uploads_from: Option<usize>,
    /// Deleting any of these paths fails (the object stays put).
    pub undeletable: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().unwrap().len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.objects.lock().unwrap().contains_key(path)
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn upload(&self, filename: &str, _content_type: &str, bytes: Bytes) -> Result<String> {
        let index = self.uploads.fetch_add(1, Ordering::SeqCst);
        if self.fail_uploads_from.is_some_and(|from| index >= from) {
            return Err(anyhow!("stubbed upload failure"));
        }
        let path = format!("uploads/{index}/{filename}");
        self.objects
            .lock()
            .unwrap()
            .insert(path.clone(), bytes.to_vec());
        Ok(path)
    }

    async fn list_root(&self) -> Result<Vec<String>> {
        Ok(self.objects.lock().unwrap().keys().cloned().collect())
    }

    async fn delete(&self, path: &str) -> Result<()> {
        if self.undeletable.iter().any(|p| p == path) {
            return Err(anyhow!("stubbed delete failure for {path}"));
        }
        self.objects.lock().unwrap().remove(path);
        Ok(())
    }
}

/// Rasterizer returning a fixed fake PNG, or failing on demand.
#[derive(Default)]
pub struct StubRasterizer {
    pub fail: bool,
}

impl DocumentRasterizer for StubRasterizer {
    fn rasterize_first_page(&self, _document: &[u8]) -> Result<RasterPage, RasterizeError> {
        if self.fail {
            return Err(RasterizeError::Parse("stubbed parse failure".to_string()));
        }
        Ok(RasterPage {
            png: vec![0x89, b'P', b'N', b'G'],
            width: 1024,
            height: 1325,
        })
    }
}

/// Scripted inference service with call counters.
///
/// `feedback` replays `feedback_content` (`None` scripts a transport
/// failure); `chat` always answers `chat_text`. When `watch_store` is set,
/// the number of stored objects at the moment of the feedback call is
/// recorded, so tests can assert ordering against the upload stages.
#[derive(Default)]
pub struct StubInference {
    pub feedback_content: Option<MessageContent>,
    pub chat_text: String,
    pub watch_store: Option<Arc<MemoryStore>>,
    pub feedback_calls: AtomicUsize,
    pub chat_calls: AtomicUsize,
    pub objects_at_feedback: AtomicUsize,
    pub last_chat_prompt: Mutex<Option<String>>,
    pub last_chat_model: Mutex<Option<String>>,
}

impl StubInference {
    pub fn with_feedback_text(text: &str) -> Self {
        Self {
            feedback_content: Some(MessageContent::PlainText(text.to_string())),
            ..Self::default()
        }
    }

    pub fn with_chat_text(text: &str) -> Self {
        Self {
            chat_text: text.to_string(),
            ..Self::default()
        }
    }

    fn respond(content: MessageContent) -> ChatResponse {
        ChatResponse {
            message: ResponseMessage { content },
        }
    }
}

#[async_trait]
impl InferenceService for StubInference {
    async fn feedback(
        &self,
        _document: &[u8],
        _instructions: &str,
    ) -> Result<ChatResponse, InferenceError> {
        self.feedback_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(store) = &self.watch_store {
            self.objects_at_feedback
                .store(store.object_count(), Ordering::SeqCst);
        }
        match &self.feedback_content {
            Some(content) => Ok(Self::respond(content.clone())),
            None => Err(InferenceError::Api {
                status: 500,
                message: "stubbed feedback failure".to_string(),
            }),
        }
    }

    async fn chat(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<ChatResponse, InferenceError> {
        self.chat_calls.fetch_add(1, Ordering::SeqCst);
        let prompt = messages.first().and_then(|m| {
            m.content.iter().find_map(|block| match block {
                RequestBlock::Text { text } => Some(text.clone()),
                _ => None,
            })
        });
        *self.last_chat_prompt.lock().unwrap() = prompt;
        *self.last_chat_model.lock().unwrap() = Some(options.model.to_string());
        Ok(Self::respond(MessageContent::PlainText(
            self.chat_text.clone(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_glob_star_suffix() {
        assert!(glob_match("resume:*", "resume:abc123"));
        assert!(glob_match("resume:*", "resume:"));
        assert!(!glob_match("resume:*", "abc123_plan"));
    }

    #[test]
    fn test_glob_exact_without_star() {
        assert!(glob_match("resume:1", "resume:1"));
        assert!(!glob_match("resume:1", "resume:12"));
    }

    #[test]
    fn test_glob_interior_star() {
        assert!(glob_match("uploads/*/resume.pdf", "uploads/7/resume.pdf"));
        assert!(!glob_match("uploads/*/resume.pdf", "uploads/7/resume.png"));
    }
}
