// Paw Voice Engine — OpenAI-Compatible Streaming Backend
// Handles OpenAI, Ollama, OpenRouter, llama.cpp server and any other
// `/chat/completions` endpoint that speaks SSE.
// Implements the GenerativeBackend Golden Trait.

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::traits::{GenerativeBackend, TokenStream};
use crate::atoms::types::GenerationOptions;
use crate::engine::config::BackendConfig;
use crate::engine::http::{
    is_retryable_status, parse_retry_after, retry_delay, CircuitBreaker, MAX_RETRIES,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use futures::StreamExt;
use log::{error, info, warn};
use reqwest::Client;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

const BACKEND_NAME: &str = "openai";

// ── SSE decoding ───────────────────────────────────────────────────────────

#[derive(Debug, PartialEq)]
pub(crate) enum SseEvent {
    Token(String),
    Done,
    Error(String),
    /// Keep-alives, role-only deltas, usage chunks.
    Skip,
}

/// Decode the payload of one `data:` line.
pub(crate) fn parse_sse_data(data: &str) -> SseEvent {
    if data == "[DONE]" {
        return SseEvent::Done;
    }
    let Ok(v) = serde_json::from_str::<Value>(data) else {
        return SseEvent::Skip;
    };
    if let Some(err) = v.get("error") {
        let message = err["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        return SseEvent::Error(message);
    }
    match v["choices"].get(0).and_then(|c| c["delta"]["content"].as_str()) {
        Some(text) if !text.is_empty() => SseEvent::Token(text.to_string()),
        _ => SseEvent::Skip,
    }
}

fn truncate_utf8(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Incremental line splitter over the response body. Bytes are buffered until
/// a full line arrives so multi-byte characters split across chunks survive.
struct SseReader {
    bytes: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    buffer: Vec<u8>,
    pending: VecDeque<EngineResult<String>>,
    done: bool,
    circuit: Arc<CircuitBreaker>,
}

impl SseReader {
    fn drain_lines(&mut self) {
        while !self.done {
            let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') else {
                break;
            };
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.handle_line(&String::from_utf8_lossy(&line));
        }
    }

    fn handle_line(&mut self, line: &str) {
        let Some(data) = line.trim().strip_prefix("data:") else {
            return;
        };
        match parse_sse_data(data.trim()) {
            SseEvent::Token(token) => self.pending.push_back(Ok(token)),
            SseEvent::Done => {
                self.done = true;
                self.circuit.record_success();
            }
            SseEvent::Error(message) => {
                self.done = true;
                self.circuit.record_failure();
                error!("[backend] {} stream error: {}", BACKEND_NAME, message);
                self.pending.push_back(Err(EngineError::backend(BACKEND_NAME, message)));
            }
            SseEvent::Skip => {}
        }
    }

    fn into_stream(self) -> TokenStream {
        futures::stream::unfold(self, |mut reader| async move {
            loop {
                if let Some(item) = reader.pending.pop_front() {
                    return Some((item, reader));
                }
                if reader.done {
                    return None;
                }
                match reader.bytes.next().await {
                    Some(Ok(chunk)) => {
                        reader.buffer.extend_from_slice(&chunk);
                        reader.drain_lines();
                    }
                    Some(Err(e)) => {
                        reader.done = true;
                        reader.circuit.record_failure();
                        let err = EngineError::backend(BACKEND_NAME, format!("stream read error: {e}"));
                        return Some((Err(err), reader));
                    }
                    None => {
                        // Body ended without [DONE]; flush a final unterminated line.
                        let rest = std::mem::take(&mut reader.buffer);
                        reader.handle_line(&String::from_utf8_lossy(&rest));
                        if !reader.done {
                            reader.done = true;
                            reader.circuit.record_success();
                        }
                    }
                }
            }
        })
        .boxed()
    }
}

// ── Backend struct ─────────────────────────────────────────────────────────

pub struct OpenAiBackend {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
    circuit: Arc<CircuitBreaker>,
}

impl OpenAiBackend {
    pub fn new(config: &BackendConfig) -> Self {
        OpenAiBackend {
            client: Client::builder()
                .connect_timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            model: config.model.clone(),
            circuit: Arc::new(CircuitBreaker::default()),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    pub(crate) fn request_body(&self, prompt: &str, options: &GenerationOptions) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = &options.system_prompt {
            messages.push(json!({"role": "system", "content": system}));
        }
        messages.push(json!({"role": "user", "content": prompt}));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": true,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
        });
        if !options.stop_sequences.is_empty() {
            body["stop"] = json!(options.stop_sequences);
        }
        body
    }

    /// POST with retry on transient failures. Returns the successful response
    /// with its body still unread.
    async fn send_with_retry(&self, body: &Value) -> EngineResult<reqwest::Response> {
        let url = self.endpoint();
        let mut last_error = String::new();
        let mut retry_after: Option<u64> = None;

        for attempt in 0..=MAX_RETRIES {
            if attempt > 0 {
                let delay = retry_delay(attempt - 1, retry_after.take()).await;
                warn!(
                    "[backend] {} retry {}/{} after {}ms",
                    BACKEND_NAME,
                    attempt,
                    MAX_RETRIES,
                    delay.as_millis()
                );
            }

            let mut req = self.client.post(&url).header("Content-Type", "application/json");
            if let Some(key) = &self.api_key {
                req = req.header("Authorization", format!("Bearer {}", key));
            }

            let response = match req.json(body).send().await {
                Ok(r) => r,
                Err(e) => {
                    self.circuit.record_failure();
                    last_error = format!("HTTP request failed: {}", e);
                    if attempt < MAX_RETRIES {
                        continue;
                    }
                    break;
                }
            };

            if response.status().is_success() {
                return Ok(response);
            }

            let status = response.status().as_u16();
            retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            let body_text = response.text().await.unwrap_or_default();
            last_error = format!("API error {}: {}", status, truncate_utf8(&body_text, 200));
            error!("[backend] {} error {}: {}", BACKEND_NAME, status, truncate_utf8(&body_text, 500));
            self.circuit.record_failure();

            if is_retryable_status(status) && attempt < MAX_RETRIES {
                continue;
            }
            break;
        }

        Err(EngineError::backend(BACKEND_NAME, last_error))
    }
}

// ── GenerativeBackend implementation ───────────────────────────────────────

#[async_trait]
impl GenerativeBackend for OpenAiBackend {
    fn name(&self) -> &str {
        BACKEND_NAME
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> EngineResult<TokenStream> {
        self.circuit.check(BACKEND_NAME)?;

        let body = self.request_body(prompt, options);
        info!("[backend] {} request to {} model={}", BACKEND_NAME, self.endpoint(), self.model);

        let response = self.send_with_retry(&body).await?;
        let reader = SseReader {
            bytes: response.bytes_stream().map(|r| r.map(|b| b.to_vec())).boxed(),
            buffer: Vec::new(),
            pending: VecDeque::new(),
            done: false,
            circuit: Arc::clone(&self.circuit),
        };
        Ok(reader.into_stream())
    }
}
