// ── Paw Atoms: Constants ───────────────────────────────────────────────────
// All named constants for the crate live here.

// ── Classification confidence tiers ───────────────────────────────────────
// Confidence is a match-certainty tier, not a probability. Each rule has one
// fixed value; nothing computes these dynamically.
pub const CONFIDENCE_BLANK: f32 = 1.0;
pub const CONFIDENCE_FLASHLIGHT: f32 = 0.95;
pub const CONFIDENCE_MEDIA_CAPTURE: f32 = 0.95;
pub const CONFIDENCE_CAMERA_OPEN: f32 = 0.95;
pub const CONFIDENCE_TIMER: f32 = 0.9;
pub const CONFIDENCE_MUSIC: f32 = 0.85;
pub const CONFIDENCE_REMINDER: f32 = 0.85;
pub const CONFIDENCE_APP_LAUNCH: f32 = 0.9;
pub const CONFIDENCE_KNOWLEDGE_QUERY: f32 = 0.9;
pub const CONFIDENCE_CONVERSATION: f32 = 0.7;

// ── Fuzzy keyword matching ────────────────────────────────────────────────
// A token may differ from a keyword by a single edit only when both are at
// least this long. Shorter words ("on"/"of", "play"/"pay") must match exactly.
pub const FUZZY_MIN_LEN: usize = 5;
pub const FUZZY_MAX_DISTANCE: usize = 1;

// ── Context window ────────────────────────────────────────────────────────
pub const DEFAULT_CONTEXT_MAX_ENTRIES: usize = 10;

// ── Generation defaults ───────────────────────────────────────────────────
pub const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_TOKENS: u32 = 256;
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Paw, a concise voice assistant. \
When the user asks to create, update, complete, delete or list reminders or tasks, reply with \
a single JSON object: {\"type\":\"action\",\"action\":\"<ACTION>\",\"parameters\":{...}} where \
<ACTION> is one of CREATE_REMINDER, UPDATE_REMINDER, DELETE_REMINDER, LIST_REMINDERS, \
CREATE_TASK, UPDATE_TASK, COMPLETE_TASK, DELETE_TASK, LIST_TASKS. Otherwise reply with \
{\"type\":\"conversation\",\"text\":\"<answer>\"} or plain text.";

// ── Backend adapter ───────────────────────────────────────────────────────
pub const DEFAULT_BACKEND_BASE_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_BACKEND_MODEL: &str = "llama3.2";
