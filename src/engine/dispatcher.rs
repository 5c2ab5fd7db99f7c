// Paw Voice Engine — Dispatcher
// One dispatcher per session. Classifies each utterance, then either hands it
// to the instant executor or runs the generative path:
//   prompt → backend stream → parse → action executor | plain text.
//
// A per-session async mutex owns the ContextWindow and is held for the whole
// turn, so concurrent process() calls on the same session run one at a time.
// The context is only mutated inside the turn that resolves it: the user entry
// when the generative path starts, the assistant entry as the last step of a
// successful turn. Failures and cancellations never append an assistant entry.

use crate::atoms::error::{EngineError, EngineResult};
use crate::atoms::traits::{GenerativeActionExecutor, GenerativeBackend, InstantActionExecutor};
use crate::atoms::types::{ActionCategory, ContextEntry, ParsedOutput, Response};
use crate::engine::classifier::PatternClassifier;
use crate::engine::config::{EngineConfig, GenerationConfig};
use crate::engine::context::ContextWindow;
use crate::engine::parser::OutputParser;
use futures::StreamExt;
use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

// ── State machine ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Classifying,
    InstantExecuting,
    PromptBuilding,
    Streaming,
    Parsing,
    ActionExecuting,
    Returning,
    Failed,
}

// ── Dispatcher ─────────────────────────────────────────────────────────────

pub struct Dispatcher {
    session_id: String,
    classifier: PatternClassifier,
    parser: OutputParser,
    instant: Arc<dyn InstantActionExecutor>,
    backend: Arc<dyn GenerativeBackend>,
    actions: Arc<dyn GenerativeActionExecutor>,
    generation: GenerationConfig,
    /// Turn lock. Whoever holds it owns the conversation for the turn.
    context: AsyncMutex<ContextWindow>,
    state: parking_lot::Mutex<DispatchState>,
}

impl Dispatcher {
    pub fn new(
        session_id: impl Into<String>,
        config: &EngineConfig,
        instant: Arc<dyn InstantActionExecutor>,
        backend: Arc<dyn GenerativeBackend>,
        actions: Arc<dyn GenerativeActionExecutor>,
    ) -> Self {
        Dispatcher {
            session_id: session_id.into(),
            classifier: PatternClassifier::new(),
            parser: OutputParser::new(),
            instant,
            backend,
            actions,
            generation: config.generation.clone(),
            context: AsyncMutex::new(ContextWindow::new(config.context.max_entries)),
            state: parking_lot::Mutex::new(DispatchState::Idle),
        }
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// State of the in-flight turn, or `Idle`.
    pub fn state(&self) -> DispatchState {
        *self.state.lock()
    }

    fn transition(&self, next: DispatchState) {
        let mut state = self.state.lock();
        debug!("[dispatcher] {} {:?} → {:?}", self.session_id, *state, next);
        *state = next;
    }

    /// Resolve one utterance. Never panics and never returns an error: backend
    /// and executor failures come back as `Response::Failure`.
    pub async fn process(&self, utterance: &str) -> Response {
        self.process_with_cancel(utterance, &CancellationToken::new()).await
    }

    /// Like `process`, but the generative call stops as soon as `cancel` fires.
    pub async fn process_with_cancel(
        &self,
        utterance: &str,
        cancel: &CancellationToken,
    ) -> Response {
        let mut window = self.context.lock().await;

        self.transition(DispatchState::Classifying);
        let result = self.classifier.classify(utterance);

        let response = if self.classifier.is_instant(result.category) {
            self.transition(DispatchState::InstantExecuting);
            info!(
                "[dispatcher] {} instant {} ({:.2})",
                self.session_id,
                result.category.as_str(),
                result.confidence
            );
            self.instant.execute(&result).await
        } else if result.category == ActionCategory::Unknown {
            // Blank input: nothing to ask the backend and nothing to remember.
            Response::Text { text: String::new() }
        } else {
            self.run_generative(&mut window, utterance, cancel).await
        };

        self.transition(DispatchState::Idle);
        response
    }

    async fn run_generative(
        &self,
        window: &mut ContextWindow,
        utterance: &str,
        cancel: &CancellationToken,
    ) -> Response {
        self.transition(DispatchState::PromptBuilding);
        // Prompt is rendered from prior history; the utterance becomes its final line.
        let prompt = window.build_prompt(utterance);
        window.add_entry(ContextEntry::user(utterance));

        self.transition(DispatchState::Streaming);
        let raw = match self.stream_text(&prompt, cancel).await {
            Ok(raw) => raw,
            Err(e) => {
                self.transition(DispatchState::Failed);
                warn!("[dispatcher] {} generation failed: {}", self.session_id, e);
                return Response::failure(e);
            }
        };

        self.transition(DispatchState::Parsing);
        match self.parser.parse(&raw) {
            ParsedOutput::Action(action) => {
                self.transition(DispatchState::ActionExecuting);
                info!(
                    "[dispatcher] {} executing {}",
                    self.session_id,
                    action.kind.wire_name()
                );
                match self.actions.execute(&action).await {
                    Ok(success) => {
                        window.add_entry(ContextEntry::assistant(success.message.clone()));
                        Response::from(success)
                    }
                    Err(e) => {
                        self.transition(DispatchState::Failed);
                        warn!(
                            "[dispatcher] {} action {} failed: {}",
                            self.session_id,
                            action.kind.wire_name(),
                            e
                        );
                        Response::failure(e)
                    }
                }
            }
            ParsedOutput::Conversation(text) => {
                self.transition(DispatchState::Returning);
                window.add_entry(ContextEntry::assistant(text.clone()));
                Response::Text { text }
            }
        }
    }

    /// Drain the backend stream into one string, bounded by the configured
    /// timeout and the cancellation token. Dropping the stream stops it.
    async fn stream_text(&self, prompt: &str, cancel: &CancellationToken) -> EngineResult<String> {
        let timeout = self.generation.timeout();
        let options = self.generation.options();

        let consume = async {
            let mut stream = self.backend.generate_stream(prompt, &options).await?;
            let mut text = String::new();
            while let Some(token) = stream.next().await {
                text.push_str(&token?);
            }
            Ok::<String, EngineError>(text)
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                info!("[dispatcher] {} generation cancelled", self.session_id);
                Err(EngineError::Cancelled)
            }
            outcome = tokio::time::timeout(timeout, consume) => match outcome {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout(timeout)),
            },
        }
    }

    // ── Context access ─────────────────────────────────────────────────────
    // These wait for any in-flight turn to finish.

    pub async fn context_snapshot(&self) -> Vec<ContextEntry> {
        self.context.lock().await.entries().to_vec()
    }

    pub async fn context_len(&self) -> usize {
        self.context.lock().await.count()
    }

    pub async fn clear_context(&self) {
        self.context.lock().await.clear();
        info!("[dispatcher] {} context cleared", self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atoms::traits::TokenStream;
    use crate::atoms::types::{
        ActionSuccess, ClassificationResult, GenerationOptions, GenerativeAction, Role,
    };
    use async_trait::async_trait;

    struct EchoInstant;

    #[async_trait]
    impl InstantActionExecutor for EchoInstant {
        async fn execute(&self, result: &ClassificationResult) -> Response {
            Response::action(format!("instant {}", result.category.as_str()))
        }
    }

    struct FixedBackend(&'static str);

    #[async_trait]
    impl GenerativeBackend for FixedBackend {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn generate_stream(
            &self,
            _prompt: &str,
            _options: &GenerationOptions,
        ) -> EngineResult<TokenStream> {
            let tokens: Vec<EngineResult<String>> =
                self.0.split_inclusive(' ').map(|t| Ok(t.to_string())).collect();
            Ok(futures::stream::iter(tokens).boxed())
        }
    }

    struct OkActions;

    #[async_trait]
    impl GenerativeActionExecutor for OkActions {
        async fn execute(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
            Ok(ActionSuccess::new(format!("did {}", action.kind.wire_name())))
        }
    }

    fn dispatcher(reply: &'static str) -> Dispatcher {
        Dispatcher::new(
            "test",
            &EngineConfig::default(),
            Arc::new(EchoInstant),
            Arc::new(FixedBackend(reply)),
            Arc::new(OkActions),
        )
    }

    #[tokio::test]
    async fn test_instant_path_leaves_context_alone() {
        let d = dispatcher("unused");
        let response = d.process("turn on flashlight").await;
        assert_eq!(response.text(), Some("instant toggle_flashlight"));
        assert_eq!(d.context_len().await, 0);
        assert_eq!(d.state(), DispatchState::Idle);
    }

    #[tokio::test]
    async fn test_conversation_path_records_both_turns() {
        let d = dispatcher("Hello there, friend.");
        let response = d.process("hey, how are you").await;
        assert_eq!(response.text(), Some("Hello there, friend."));
        let history = d.context_snapshot().await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[0].text, "hey, how are you");
        assert_eq!(history[1].role, Role::Assistant);
        assert_eq!(history[1].text, "Hello there, friend.");
    }

    #[tokio::test]
    async fn test_action_path_records_executor_message() {
        let d = dispatcher(r#"{"type":"action","action":"LIST_TASKS","parameters":{}}"#);
        let response = d.process("what's on my list").await;
        assert_eq!(response.text(), Some("did LIST_TASKS"));
        let history = d.context_snapshot().await;
        assert_eq!(history.last().map(|e| e.text.as_str()), Some("did LIST_TASKS"));
    }

    #[tokio::test]
    async fn test_blank_input_is_a_no_op() {
        let d = dispatcher("should not be called");
        let response = d.process("   ").await;
        assert_eq!(response.text(), Some(""));
        assert_eq!(d.context_len().await, 0);
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_fails_without_assistant_entry() {
        let d = dispatcher("never seen");
        let cancel = CancellationToken::new();
        cancel.cancel();
        let response = d.process_with_cancel("tell me a story", &cancel).await;
        assert!(matches!(response, Response::Failure { error: EngineError::Cancelled }));
        let history = d.context_snapshot().await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].role, Role::User);
    }

    #[tokio::test]
    async fn test_clear_context() {
        let d = dispatcher("ok");
        d.process("hello").await;
        assert_eq!(d.context_len().await, 2);
        d.clear_context().await;
        assert_eq!(d.context_len().await, 0);
        d.process("hello again").await;
        assert_eq!(d.context_len().await, 2);
    }
}
