// Paw Voice Engine — Generative Backend Registry
// Backends implement the GenerativeBackend Golden Trait; the dispatcher only
// ever sees `Arc<dyn GenerativeBackend>`.

pub mod openai;

pub use openai::OpenAiBackend;

use crate::atoms::traits::GenerativeBackend;
use crate::engine::config::BackendConfig;
use std::sync::Arc;

/// Build the configured backend. Every supported server speaks the
/// OpenAI-compatible chat-completions protocol.
pub fn backend_from_config(config: &BackendConfig) -> Arc<dyn GenerativeBackend> {
    Arc::new(OpenAiBackend::new(config))
}
