// End-to-end dispatcher scenarios against scripted collaborators.

use async_trait::async_trait;
use futures::StreamExt;
use openpawz_voice::atoms::traits::TokenStream;
use openpawz_voice::{
    ActionCategory, ActionSuccess, ClassificationResult, Dispatcher, EngineConfig, EngineError,
    EngineResult, GenerationOptions, GenerativeAction, GenerativeActionExecutor,
    GenerativeActionKind, GenerativeBackend, InstantActionExecutor, RepositoryActionExecutor,
    Response, Role, SessionManager,
};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

// ── Scripted collaborators ─────────────────────────────────────────────────

#[derive(Clone)]
enum Script {
    Reply(&'static str),
    Fail,
    /// Emits one token, then errors mid-stream.
    BreakMidStream,
    /// Never produces a token.
    Hang,
}

#[derive(Default)]
struct ScriptedBackend {
    script: Mutex<VecDeque<Script>>,
    prompts: Mutex<Vec<String>>,
    delay: Option<Duration>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedBackend {
    fn new(script: Vec<Script>) -> Self {
        ScriptedBackend { script: Mutex::new(script.into()), ..Default::default() }
    }

    fn with_delay(script: Vec<Script>, delay: Duration) -> Self {
        ScriptedBackend { delay: Some(delay), ..Self::new(script) }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().len()
    }
}

#[async_trait]
impl GenerativeBackend for ScriptedBackend {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate_stream(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> EngineResult<TokenStream> {
        self.prompts.lock().push(prompt.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let next = self.script.lock().pop_front().unwrap_or(Script::Reply("ok"));
        match next {
            Script::Reply(text) => {
                let tokens: Vec<EngineResult<String>> =
                    text.split_inclusive(' ').map(|t| Ok(t.to_string())).collect();
                Ok(futures::stream::iter(tokens).boxed())
            }
            Script::Fail => Err(EngineError::backend("scripted", "connection refused")),
            Script::BreakMidStream => Ok(futures::stream::iter(vec![
                Ok("partial ".to_string()),
                Err(EngineError::backend("scripted", "stream reset")),
            ])
            .boxed()),
            Script::Hang => Ok(futures::stream::pending().boxed()),
        }
    }
}

#[derive(Default)]
struct RecordingInstant {
    seen: Mutex<Vec<ActionCategory>>,
}

#[async_trait]
impl InstantActionExecutor for RecordingInstant {
    async fn execute(&self, result: &ClassificationResult) -> Response {
        self.seen.lock().push(result.category);
        Response::action(format!("done {}", result.category.as_str()))
    }
}

struct FailingActions;

#[async_trait]
impl GenerativeActionExecutor for FailingActions {
    async fn execute(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess> {
        Err(EngineError::action(action.kind.wire_name(), "storage offline"))
    }
}

struct Harness {
    dispatcher: Arc<Dispatcher>,
    backend: Arc<ScriptedBackend>,
    instant: Arc<RecordingInstant>,
}

fn harness_with(
    backend: ScriptedBackend,
    actions: Arc<dyn GenerativeActionExecutor>,
    config: EngineConfig,
) -> Harness {
    let backend = Arc::new(backend);
    let instant = Arc::new(RecordingInstant::default());
    let dispatcher = Arc::new(Dispatcher::new(
        "it",
        &config,
        instant.clone(),
        backend.clone(),
        actions,
    ));
    Harness { dispatcher, backend, instant }
}

fn harness(script: Vec<Script>) -> Harness {
    harness_with(
        ScriptedBackend::new(script),
        Arc::new(RepositoryActionExecutor::in_memory()),
        EngineConfig::default(),
    )
}

// ── Instant path ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_instant_utterances_skip_backend_and_context() {
    let h = harness(vec![]);
    for utterance in ["turn on the flashlight", "set a timer for 5 minutes", "open camera"] {
        let response = h.dispatcher.process(utterance).await;
        assert!(!response.is_failure());
    }
    assert_eq!(
        *h.instant.seen.lock(),
        vec![ActionCategory::ToggleFlashlight, ActionCategory::SetTimer, ActionCategory::OpenApp]
    );
    assert_eq!(h.backend.calls(), 0);
    assert_eq!(h.dispatcher.context_len().await, 0);
}

// ── Generative path ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_conversation_turns_build_on_history() {
    let h = harness(vec![Script::Reply("Hi! How can I help?"), Script::Reply("Paris.")]);

    let first = h.dispatcher.process("hello there").await;
    assert_eq!(first.text(), Some("Hi! How can I help?"));

    let second = h.dispatcher.process("what is the capital of France").await;
    assert_eq!(second.text(), Some("Paris."));

    let prompts = h.backend.prompts.lock().clone();
    assert_eq!(prompts[0], "hello there");
    assert_eq!(
        prompts[1],
        "User: hello there\nAssistant: Hi! How can I help?\nUser: what is the capital of France"
    );

    let history = h.dispatcher.context_snapshot().await;
    let roles: Vec<Role> = history.iter().map(|e| e.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn test_backend_action_is_executed() {
    let h = harness(vec![
        Script::Reply(r#"Okay! {"type":"action","action":"CREATE_TASK","parameters":{"title":"buy milk"}}"#),
        Script::Reply(r#"{"type":"action","action":"LIST_TASKS","parameters":{}}"#),
    ]);

    let created = h.dispatcher.process("can you add buy milk to my tasks").await;
    assert_eq!(created.text(), Some("Task added: buy milk"));

    let listed = h.dispatcher.process("what tasks do I have").await;
    match listed {
        Response::Action { message, data } => {
            assert_eq!(message, "You have 1 task (1 open)");
            let data = data.expect("task list data");
            assert_eq!(data[0]["title"], "buy milk");
        }
        other => panic!("expected action, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unparseable_backend_output_is_conversation() {
    let h = harness(vec![Script::Reply(r#"{"type":"action","action":"SELF_DESTRUCT"}"#)]);
    let response = h.dispatcher.process("why is the sky blue").await;
    assert_eq!(response.text(), Some(r#"{"type":"action","action":"SELF_DESTRUCT"}"#));
}

// ── Failures ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_backend_error_keeps_user_entry_only() {
    let h = harness(vec![Script::Fail, Script::BreakMidStream, Script::Reply("recovered")]);

    let response = h.dispatcher.process("tell me a joke").await;
    assert!(matches!(response, Response::Failure { error: EngineError::Backend { .. } }));

    let response = h.dispatcher.process("tell me another").await;
    assert!(matches!(response, Response::Failure { error: EngineError::Backend { .. } }));

    let history = h.dispatcher.context_snapshot().await;
    assert_eq!(history.len(), 2);
    assert!(history.iter().all(|e| e.role == Role::User));

    // The session stays usable.
    let response = h.dispatcher.process("one more try").await;
    assert_eq!(response.text(), Some("recovered"));
}

#[tokio::test]
async fn test_generation_timeout() {
    let mut config = EngineConfig::default();
    config.generation.timeout_secs = 1;
    let h = harness_with(
        ScriptedBackend::new(vec![Script::Hang]),
        Arc::new(RepositoryActionExecutor::in_memory()),
        config,
    );

    let response = h.dispatcher.process("tell me a long story").await;
    assert!(matches!(response, Response::Failure { error: EngineError::Timeout(_) }));
    let history = h.dispatcher.context_snapshot().await;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].role, Role::User);
}

#[tokio::test]
async fn test_cancellation_stops_generation() {
    let h = harness(vec![Script::Hang]);
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let response = h.dispatcher.process_with_cancel("tell me a long story", &cancel).await;
    assert!(matches!(response, Response::Failure { error: EngineError::Cancelled }));
    assert_eq!(h.dispatcher.context_len().await, 1);
}

#[tokio::test]
async fn test_executor_failure_is_not_fatal() {
    let h = harness_with(
        ScriptedBackend::new(vec![
            Script::Reply(r#"{"type":"action","action":"DELETE_REMINDER","parameters":{"id":"r1"}}"#),
            Script::Reply("Anything else?"),
        ]),
        Arc::new(FailingActions),
        EngineConfig::default(),
    );

    let response = h.dispatcher.process("could you drop that one").await;
    match response {
        Response::Failure { error: EngineError::Action { action, message } } => {
            assert_eq!(action, GenerativeActionKind::DeleteReminder.wire_name());
            assert_eq!(message, "storage offline");
        }
        other => panic!("expected action failure, got {other:?}"),
    }
    assert_eq!(h.dispatcher.context_len().await, 1);

    let response = h.dispatcher.process("hello").await;
    assert_eq!(response.text(), Some("Anything else?"));
}

// ── Concurrency ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_same_session_turns_are_serialised() {
    let h = harness_with(
        ScriptedBackend::with_delay(
            vec![Script::Reply("first"), Script::Reply("second")],
            Duration::from_millis(50),
        ),
        Arc::new(RepositoryActionExecutor::in_memory()),
        EngineConfig::default(),
    );

    let a = h.dispatcher.clone();
    let b = h.dispatcher.clone();
    let (ra, rb) = tokio::join!(
        async move { a.process("hello one").await },
        async move { b.process("hello two").await },
    );
    assert!(!ra.is_failure() && !rb.is_failure());
    assert_eq!(h.backend.max_in_flight.load(Ordering::SeqCst), 1);

    // Each turn appended its user and assistant entries back to back.
    let history = h.dispatcher.context_snapshot().await;
    let roles: Vec<Role> = history.iter().map(|e| e.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
}

#[tokio::test]
async fn test_independent_sessions_run_in_parallel() {
    let backend = Arc::new(ScriptedBackend::with_delay(vec![], Duration::from_millis(100)));
    let manager = SessionManager::new(
        EngineConfig::default(),
        Arc::new(RecordingInstant::default()),
        backend.clone(),
        Arc::new(RepositoryActionExecutor::in_memory()),
    );
    let kitchen = manager.get_or_create("kitchen");
    let garage = manager.get_or_create("garage");

    let (rk, rg) = tokio::join!(kitchen.process("hello kitchen"), garage.process("hello garage"));
    assert_eq!(rk.text(), Some("ok"));
    assert_eq!(rg.text(), Some("ok"));
    assert_eq!(backend.max_in_flight.load(Ordering::SeqCst), 2);

    assert_eq!(kitchen.context_snapshot().await[0].text, "hello kitchen");
    assert_eq!(garage.context_snapshot().await[0].text, "hello garage");
    assert_eq!(manager.len(), 2);
}

#[tokio::test]
async fn test_context_window_bounds_prompt() {
    let mut config = EngineConfig::default();
    config.context.max_entries = 2;
    let h = harness_with(
        ScriptedBackend::new(vec![Script::Reply("a"), Script::Reply("b"), Script::Reply("c")]),
        Arc::new(RepositoryActionExecutor::in_memory()),
        config,
    );
    h.dispatcher.process("hello one").await;
    h.dispatcher.process("hello two").await;
    h.dispatcher.process("hello three").await;

    let prompts = h.backend.prompts.lock().clone();
    assert_eq!(prompts[2], "User: hello two\nAssistant: b\nUser: hello three");
    assert_eq!(h.dispatcher.context_len().await, 6);
}
