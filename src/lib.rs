// OpenPawz Voice — intent engine for spoken commands.
//
// Layout:
//   atoms/   — pure types, constants, error enum, Golden Traits
//   engine/  — classifier, context window, parser, dispatcher and the
//              concrete backend / executor implementations

pub mod atoms;
pub mod engine;

pub use atoms::error::{EngineError, EngineResult};
pub use atoms::traits::{
    GenerativeActionExecutor, GenerativeBackend, InstantActionExecutor, ReminderRepository,
    TaskRepository, TokenStream,
};
pub use atoms::types::{
    ActionCategory, ActionSuccess, ClassificationResult, ContextEntry, GenerationOptions,
    GenerativeAction, GenerativeActionKind, ParsedOutput, Response, Role,
};
pub use engine::classifier::PatternClassifier;
pub use engine::config::EngineConfig;
pub use engine::context::ContextWindow;
pub use engine::dispatcher::{DispatchState, Dispatcher};
pub use engine::executors::{MemoryReminderStore, MemoryTaskStore, RepositoryActionExecutor};
pub use engine::parser::OutputParser;
pub use engine::providers::OpenAiBackend;
pub use engine::sessions::SessionManager;
