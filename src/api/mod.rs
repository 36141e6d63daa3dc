use serde::{Deserialize, Serialize};

/// The two HTTP surfaces a local inference server may expose. Requests are
/// attempted against [`ApiFlavor::Native`] first and fall back to
/// [`ApiFlavor::OpenAiCompat`] when the native endpoint is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiFlavor {
    /// The server's own API (Ollama-style).
    Native,
    /// OpenAI-compatible completions surface.
    OpenAiCompat,
}

impl ApiFlavor {
    pub fn models_endpoint(self) -> &'static str {
        match self {
            ApiFlavor::Native => "api/tags",
            ApiFlavor::OpenAiCompat => "v1/models",
        }
    }

    pub fn generate_endpoint(self) -> &'static str {
        match self {
            ApiFlavor::Native => "api/generate",
            ApiFlavor::OpenAiCompat => "v1/completions",
        }
    }
}

/// Request body shared by both generate endpoints.
#[derive(Serialize, Clone)]
pub struct GenerateRequest {
    pub model: String,
    pub prompt: String,
    pub stream: bool,
}

/// One parsed line of a native streaming response.
///
/// Both fields are optional so that interleaved status lines (which carry
/// neither) still deserialize and are simply skipped.
#[derive(Deserialize)]
pub struct GenerateChunk {
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub done: Option<bool>,
}

impl GenerateChunk {
    pub fn is_done(&self) -> bool {
        self.done.unwrap_or(false)
    }
}

/// One parsed line of an OpenAI-compatible streaming response.
#[derive(Deserialize)]
pub struct CompletionChunk {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub delta: Option<CompletionDelta>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Deserialize)]
pub struct CompletionDelta {
    #[serde(default)]
    pub content: Option<String>,
}

impl CompletionChunk {
    /// Incremental text of the first choice: `delta.content` for chat-style
    /// streams, `text` for plain completion streams.
    pub fn first_fragment(&self) -> Option<&str> {
        let choice = self.choices.first()?;
        choice
            .delta
            .as_ref()
            .and_then(|delta| delta.content.as_deref())
            .or(choice.text.as_deref())
    }
}

pub mod models;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_chunk_prefers_delta_content() {
        let chunk: CompletionChunk =
            serde_json::from_str(r#"{"choices":[{"delta":{"content":"hi"},"text":"ignored"}]}"#)
                .unwrap();
        assert_eq!(chunk.first_fragment(), Some("hi"));
    }

    #[test]
    fn completion_chunk_falls_back_to_text() {
        let chunk: CompletionChunk =
            serde_json::from_str(r#"{"choices":[{"text":"plain"}]}"#).unwrap();
        assert_eq!(chunk.first_fragment(), Some("plain"));
    }

    #[test]
    fn completion_chunk_without_choices_yields_nothing() {
        let chunk: CompletionChunk = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert_eq!(chunk.first_fragment(), None);
    }

    #[test]
    fn generate_chunk_tolerates_status_lines() {
        let chunk: GenerateChunk =
            serde_json::from_str(r#"{"model":"m","created_at":"now"}"#).unwrap();
        assert!(chunk.response.is_none());
        assert!(!chunk.is_done());
    }
}
