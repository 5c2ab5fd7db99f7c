// ── Paw Atoms: Core Types ──────────────────────────────────────────────────
// The data structures that flow through the voice engine: classification
// results, parsed backend output, context entries and dispatcher responses.
// Independent of any specific backend or executor.

use crate::atoms::error::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Instant;

/// String-keyed parameters extracted from an utterance or a backend action.
/// Ordered by key so logs and assertions are deterministic.
pub type Parameters = BTreeMap<String, String>;

// ── Action categories ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionCategory {
    // Instant set: device-executable without the backend.
    ToggleFlashlight,
    TakePhoto,
    RecordVideo,
    SetTimer,
    SetAlarm,
    PlayMusic,
    SetReminder,
    OpenApp,
    // Generative set.
    KnowledgeQuery,
    Conversation,
    Unknown,
}

/// Which dispatch path a category belongs to. Every category maps to exactly one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Partition {
    Instant,
    Generative,
    Unknown,
}

impl ActionCategory {
    pub const ALL: [ActionCategory; 11] = [
        ActionCategory::ToggleFlashlight,
        ActionCategory::TakePhoto,
        ActionCategory::RecordVideo,
        ActionCategory::SetTimer,
        ActionCategory::SetAlarm,
        ActionCategory::PlayMusic,
        ActionCategory::SetReminder,
        ActionCategory::OpenApp,
        ActionCategory::KnowledgeQuery,
        ActionCategory::Conversation,
        ActionCategory::Unknown,
    ];

    pub fn partition(self) -> Partition {
        match self {
            ActionCategory::ToggleFlashlight
            | ActionCategory::TakePhoto
            | ActionCategory::RecordVideo
            | ActionCategory::SetTimer
            | ActionCategory::SetAlarm
            | ActionCategory::PlayMusic
            | ActionCategory::SetReminder
            | ActionCategory::OpenApp => Partition::Instant,
            ActionCategory::KnowledgeQuery | ActionCategory::Conversation => Partition::Generative,
            ActionCategory::Unknown => Partition::Unknown,
        }
    }

    pub fn is_instant(self) -> bool {
        self.partition() == Partition::Instant
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ActionCategory::ToggleFlashlight => "toggle_flashlight",
            ActionCategory::TakePhoto => "take_photo",
            ActionCategory::RecordVideo => "record_video",
            ActionCategory::SetTimer => "set_timer",
            ActionCategory::SetAlarm => "set_alarm",
            ActionCategory::PlayMusic => "play_music",
            ActionCategory::SetReminder => "set_reminder",
            ActionCategory::OpenApp => "open_app",
            ActionCategory::KnowledgeQuery => "knowledge_query",
            ActionCategory::Conversation => "conversation",
            ActionCategory::Unknown => "unknown",
        }
    }
}

// ── Classification ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub category: ActionCategory,
    /// Match-certainty tier in [0, 1]; see `atoms::constants`.
    pub confidence: f32,
    pub parameters: Parameters,
}

impl ClassificationResult {
    pub fn new(category: ActionCategory, confidence: f32) -> Self {
        ClassificationResult { category, confidence, parameters: Parameters::new() }
    }

    pub fn with_param(mut self, key: &str, value: impl Into<String>) -> Self {
        self.parameters.insert(key.to_string(), value.into());
        self
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

// ── Generative actions ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenerativeActionKind {
    CreateReminder,
    UpdateReminder,
    DeleteReminder,
    ListReminders,
    CreateTask,
    UpdateTask,
    CompleteTask,
    DeleteTask,
    ListTasks,
    Unknown,
}

impl GenerativeActionKind {
    const KNOWN: [GenerativeActionKind; 9] = [
        GenerativeActionKind::CreateReminder,
        GenerativeActionKind::UpdateReminder,
        GenerativeActionKind::DeleteReminder,
        GenerativeActionKind::ListReminders,
        GenerativeActionKind::CreateTask,
        GenerativeActionKind::UpdateTask,
        GenerativeActionKind::CompleteTask,
        GenerativeActionKind::DeleteTask,
        GenerativeActionKind::ListTasks,
    ];

    /// Name used on the wire, e.g. `CREATE_REMINDER`.
    pub fn wire_name(self) -> &'static str {
        match self {
            GenerativeActionKind::CreateReminder => "CREATE_REMINDER",
            GenerativeActionKind::UpdateReminder => "UPDATE_REMINDER",
            GenerativeActionKind::DeleteReminder => "DELETE_REMINDER",
            GenerativeActionKind::ListReminders => "LIST_REMINDERS",
            GenerativeActionKind::CreateTask => "CREATE_TASK",
            GenerativeActionKind::UpdateTask => "UPDATE_TASK",
            GenerativeActionKind::CompleteTask => "COMPLETE_TASK",
            GenerativeActionKind::DeleteTask => "DELETE_TASK",
            GenerativeActionKind::ListTasks => "LIST_TASKS",
            GenerativeActionKind::Unknown => "UNKNOWN",
        }
    }

    /// Resolve a wire name. Case, `_`, `-` and spaces are ignored so
    /// `CREATE_REMINDER`, `create-reminder` and `CreateReminder` all match.
    /// Anything unrecognised is `Unknown`.
    pub fn from_wire_name(name: &str) -> GenerativeActionKind {
        let folded: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_uppercase())
            .collect();
        if folded.is_empty() {
            return GenerativeActionKind::Unknown;
        }
        Self::KNOWN
            .iter()
            .copied()
            .find(|kind| kind.wire_name().replace('_', "") == folded)
            .unwrap_or(GenerativeActionKind::Unknown)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerativeAction {
    pub kind: GenerativeActionKind,
    pub parameters: Parameters,
}

impl GenerativeAction {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str).filter(|v| !v.trim().is_empty())
    }
}

/// Result of parsing raw backend text. Exactly one variant is always produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedOutput {
    Action(GenerativeAction),
    Conversation(String),
}

// ── Context ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn label(self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextEntry {
    pub role: Role,
    pub text: String,
    pub created_at: Instant,
}

impl ContextEntry {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        ContextEntry { role, text: text.into(), created_at: Instant::now() }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text)
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text)
    }
}

// ── Executor / dispatcher results ──────────────────────────────────────────

/// Successful generative action, as reported by an executor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionSuccess {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl ActionSuccess {
    pub fn new(message: impl Into<String>) -> Self {
        ActionSuccess { message: message.into(), data: None }
    }

    pub fn with_data(message: impl Into<String>, data: Value) -> Self {
        ActionSuccess { message: message.into(), data: Some(data) }
    }
}

/// What a single `process()` turn resolves to.
#[derive(Debug)]
pub enum Response {
    /// An instant or generative action ran.
    Action { message: String, data: Option<Value> },
    /// Conversational text from the backend.
    Text { text: String },
    /// Backend, timeout, cancellation or executor failure.
    Failure { error: EngineError },
}

impl Response {
    pub fn action(message: impl Into<String>) -> Self {
        Response::Action { message: message.into(), data: None }
    }

    pub fn failure(error: EngineError) -> Self {
        Response::Failure { error }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Response::Failure { .. })
    }

    /// The user-facing text of a successful response.
    pub fn text(&self) -> Option<&str> {
        match self {
            Response::Action { message, .. } => Some(message),
            Response::Text { text } => Some(text),
            Response::Failure { .. } => None,
        }
    }
}

impl From<ActionSuccess> for Response {
    fn from(ok: ActionSuccess) -> Self {
        Response::Action { message: ok.message, data: ok.data }
    }
}

// ── Generation options ─────────────────────────────────────────────────────

/// Passed through to the backend untouched; the core never interprets it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    pub max_tokens: u32,
    pub temperature: f64,
    #[serde(default)]
    pub stop_sequences: Vec<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            max_tokens: crate::atoms::constants::DEFAULT_MAX_TOKENS,
            temperature: crate::atoms::constants::DEFAULT_TEMPERATURE,
            stop_sequences: Vec::new(),
            system_prompt: None,
        }
    }
}
