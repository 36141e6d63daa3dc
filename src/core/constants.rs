//! Shared constants used across the application

use std::time::Duration;

/// Default inference server base URL (local Ollama instance).
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Environment variable consulted for the server base URL when no CLI
/// override is given.
pub const BASE_URL_ENV_VAR: &str = "OLLAMA_HOST";

/// Models assumed to exist when discovery fails or returns nothing.
pub const FALLBACK_MODELS: [&str; 3] = [
    "deepseek-r1:14b",
    "deepseek-coder:6.7b",
    "qwen2.5-coder:latest",
];

/// Per-request timeout for the model listing endpoints.
pub const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Shown in place of an assistant reply when the stream completed without
/// producing any content.
pub const NO_RESPONSE_PLACEHOLDER: &str = "No response received.";

/// Shown when the user stops an exchange before it completes.
pub const REQUEST_STOPPED_PLACEHOLDER: &str = "Request stopped.";
