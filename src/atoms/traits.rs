// ── Paw Atoms: Golden Traits ───────────────────────────────────────────────
// The narrow seams between the voice engine and its external collaborators.
// Device actions, the generative backend and persistence all live behind
// these traits; the engine never depends on a concrete implementation.

use crate::atoms::error::EngineResult;
use crate::atoms::types::{
    ActionSuccess, ClassificationResult, GenerationOptions, GenerativeAction, Response,
};
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};

/// Incremental text tokens from a generative backend.
pub type TokenStream = BoxStream<'static, EngineResult<String>>;

/// Executes device-level actions (flashlight, camera, timers…) without the backend.
/// Implementations must stay within the instant latency budget.
#[async_trait]
pub trait InstantActionExecutor: Send + Sync {
    async fn execute(&self, result: &ClassificationResult) -> Response;
}

/// A text-completion backend that streams its output.
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    /// Short identifier used in logs and error messages.
    fn name(&self) -> &str;

    /// Start a generation. Connection failures surface here; failures after
    /// the stream opens surface as `Err` items on the stream.
    async fn generate_stream(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> EngineResult<TokenStream>;
}

/// Executes structured actions parsed from backend output.
#[async_trait]
pub trait GenerativeActionExecutor: Send + Sync {
    async fn execute(&self, action: &GenerativeAction) -> EngineResult<ActionSuccess>;
}

// ── Repository contracts ───────────────────────────────────────────────────
// Consumed only by action executors.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due: Option<String>,
    pub completed: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[async_trait]
pub trait ReminderRepository: Send + Sync {
    async fn insert(&self, reminder: Reminder) -> EngineResult<()>;
    /// Replace an existing reminder. Returns false when the id is unknown.
    async fn update(&self, reminder: Reminder) -> EngineResult<bool>;
    async fn get(&self, id: &str) -> EngineResult<Option<Reminder>>;
    /// Returns false when the id is unknown.
    async fn delete(&self, id: &str) -> EngineResult<bool>;
    async fn list(&self) -> EngineResult<Vec<Reminder>>;
}

#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn insert(&self, task: Task) -> EngineResult<()>;
    async fn update(&self, task: Task) -> EngineResult<bool>;
    async fn get(&self, id: &str) -> EngineResult<Option<Task>>;
    async fn delete(&self, id: &str) -> EngineResult<bool>;
    async fn list(&self) -> EngineResult<Vec<Task>>;
}
