// Paw Voice Engine — Pattern Classifier
// Maps an utterance to an action category, a confidence tier and extracted
// parameters using a fixed-priority rule chain. First match wins; a rule that
// cannot extract what it needs returns None and the chain moves on.
//
// Pure and synchronous: no I/O, no shared state, cost linear in input length.
// The dispatcher calls this before anything else on every turn.

pub mod corrections;
pub mod extract;
pub mod fuzzy;

use crate::atoms::constants::*;
use crate::atoms::types::{ActionCategory, ClassificationResult};
use corrections::correct_app_name;
use fuzzy::matches_any;
use log::debug;

// ── Keyword sets ───────────────────────────────────────────────────────────

const FLASHLIGHT_WORDS: &[&str] = &["flashlight", "torch"];
const STATE_ON_WORDS: &[&str] = &["on", "enable", "activate"];
const STATE_OFF_WORDS: &[&str] = &["off", "disable", "deactivate"];

const PHOTO_NOUNS: &[&str] = &[
    "camera", "photo", "photos", "picture", "pictures", "pic", "selfie", "snapshot", "photograph",
];
const VIDEO_NOUNS: &[&str] = &["video", "videos"];
const CAPTURE_VERBS: &[&str] = &["take", "capture", "snap", "shoot", "click", "record", "film"];
const OPEN_VERBS: &[&str] = &["open", "launch", "start", "show"];

const TIMER_WORDS: &[&str] = &["timer", "countdown"];
const ALARM_WORDS: &[&str] = &["alarm", "wake"];

const PLAY_VERBS: &[&str] = &["play", "playing", "start", "put", "resume", "shuffle"];
const MUSIC_NOUNS: &[&str] = &[
    "music", "song", "songs", "track", "tracks", "playlist", "album", "tunes", "radio",
];
const MUSIC_FILLERS: &[&str] = &[
    "some", "me", "a", "an", "the", "my", "please", "on", "by", "from", "for", "of", "to",
];

const REMIND_WORDS: &[&str] = &["remind", "reminder", "reminders"];
const REMIND_LEADING_FILLERS: &[&str] = &["me", "us", "to", "that", "about", "for"];

const LAUNCH_WORDS: &[&str] = &["open", "launch", "start", "run"];
const APP_LEADING_FILLERS: &[&str] = &["the", "my", "up"];
const APP_TRAILING_FILLERS: &[&str] = &["app", "application", "please", "now"];

const QUERY_WORDS: &[&str] = &[
    "what", "what's", "whats", "how", "how's", "why", "when", "where", "who", "who's", "which",
    "whose", "explain", "define", "describe", "meaning", "calculate",
];

// ── Utterance ──────────────────────────────────────────────────────────────

/// One whitespace-delimited word: original casing plus a lowercase form with
/// surrounding punctuation removed.
#[derive(Debug, Clone)]
struct Token<'a> {
    original: &'a str,
    lower: String,
}

/// Input prepared once for all rules.
struct Utterance<'a> {
    /// Trimmed input, original casing.
    original: &'a str,
    tokens: Vec<Token<'a>>,
}

impl<'a> Utterance<'a> {
    fn new(input: &'a str) -> Self {
        let original = input.trim();
        let tokens = original
            .split_whitespace()
            .filter_map(|word| {
                let core = word.trim_matches(|c: char| !c.is_alphanumeric() && c != '\'');
                let core = core.trim_matches('\'');
                if core.is_empty() {
                    None
                } else {
                    Some(Token { original: core, lower: core.to_lowercase() })
                }
            })
            .collect();
        Utterance { original, tokens }
    }

    /// Index of the first token matching any keyword (fuzzy).
    fn find(&self, keywords: &[&str]) -> Option<usize> {
        self.tokens.iter().position(|t| matches_any(&t.lower, keywords))
    }

    fn has(&self, keywords: &[&str]) -> bool {
        self.find(keywords).is_some()
    }

    /// Exact whole-word presence, no fuzzy correction.
    fn has_exact(&self, words: &[&str]) -> bool {
        self.tokens.iter().any(|t| words.contains(&t.lower.as_str()))
    }

    /// Adjacent two-word phrase, e.g. "flash light".
    fn has_phrase(&self, first: &str, second: &str) -> bool {
        self.tokens
            .windows(2)
            .any(|pair| pair[0].lower == first && pair[1].lower == second)
    }
}

/// Join tokens after trimming filler words off both ends.
fn join_trimmed(
    tokens: &[Token<'_>],
    leading: &[&str],
    trailing: &[&str],
    lowercase: bool,
) -> String {
    let mut start = 0;
    let mut end = tokens.len();
    while start < end && leading.contains(&tokens[start].lower.as_str()) {
        start += 1;
    }
    while end > start && trailing.contains(&tokens[end - 1].lower.as_str()) {
        end -= 1;
    }
    tokens[start..end]
        .iter()
        .map(|t| if lowercase { t.lower.as_str() } else { t.original })
        .collect::<Vec<_>>()
        .join(" ")
}

// ── Rule chain ─────────────────────────────────────────────────────────────

struct Rule {
    name: &'static str,
    apply: fn(&Utterance<'_>) -> Option<ClassificationResult>,
}

/// Evaluation order is the contract. Do not reorder without updating callers
/// that depend on e.g. "open camera" resolving before the generic app launcher.
const RULES: &[Rule] = &[
    Rule { name: "device_toggle", apply: rule_flashlight },
    Rule { name: "media_capture", apply: rule_media_capture },
    Rule { name: "timer_alarm", apply: rule_timer_alarm },
    Rule { name: "music", apply: rule_music },
    Rule { name: "reminder", apply: rule_reminder },
    Rule { name: "app_launch", apply: rule_app_launch },
    Rule { name: "knowledge_query", apply: rule_knowledge_query },
];

fn rule_flashlight(u: &Utterance<'_>) -> Option<ClassificationResult> {
    if !u.has(FLASHLIGHT_WORDS) && !u.has_phrase("flash", "light") {
        return None;
    }
    // First explicit on/off word in reading order decides; otherwise toggle.
    let state = u
        .tokens
        .iter()
        .find_map(|t| {
            if matches_any(&t.lower, STATE_ON_WORDS) {
                Some("on")
            } else if matches_any(&t.lower, STATE_OFF_WORDS) {
                Some("off")
            } else {
                None
            }
        })
        .unwrap_or("toggle");
    Some(
        ClassificationResult::new(ActionCategory::ToggleFlashlight, CONFIDENCE_FLASHLIGHT)
            .with_param("state", state),
    )
}

fn rule_media_capture(u: &Utterance<'_>) -> Option<ClassificationResult> {
    let photo_noun = u.find(PHOTO_NOUNS);
    let video_noun = u.find(VIDEO_NOUNS);
    if photo_noun.is_none() && video_noun.is_none() {
        return None;
    }

    // Capture verbs take precedence over open verbs.
    if u.has(CAPTURE_VERBS) {
        if video_noun.is_some() {
            return Some(
                ClassificationResult::new(ActionCategory::RecordVideo, CONFIDENCE_MEDIA_CAPTURE)
                    .with_param("mode", "video"),
            );
        }
        let mode = if u.has(&["selfie"]) { "selfie" } else { "photo" };
        return Some(
            ClassificationResult::new(ActionCategory::TakePhoto, CONFIDENCE_MEDIA_CAPTURE)
                .with_param("mode", mode),
        );
    }

    let camera_noun = u.has(&["camera"]);
    if camera_noun && u.has(OPEN_VERBS) {
        return Some(
            ClassificationResult::new(ActionCategory::OpenApp, CONFIDENCE_CAMERA_OPEN)
                .with_param("appName", "camera"),
        );
    }
    None
}

fn rule_timer_alarm(u: &Utterance<'_>) -> Option<ClassificationResult> {
    let category = if u.has(TIMER_WORDS) {
        ActionCategory::SetTimer
    } else if u.has(ALARM_WORDS) {
        ActionCategory::SetAlarm
    } else {
        return None;
    };
    // No duration, no match: fall through rather than return a partial result.
    let duration = extract::extract_duration(u.original)?;
    Some(
        ClassificationResult::new(category, CONFIDENCE_TIMER)
            .with_param("duration", duration.amount.to_string())
            .with_param("unit", duration.unit),
    )
}

fn rule_music(u: &Utterance<'_>) -> Option<ClassificationResult> {
    let verb = u.find(PLAY_VERBS)?;
    let noun = u.find(MUSIC_NOUNS)?;

    let rest: Vec<Token<'_>> = u
        .tokens
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != verb && *i != noun)
        .map(|(_, t)| t.clone())
        .collect();
    let query = join_trimmed(&rest, MUSIC_FILLERS, MUSIC_FILLERS, false);

    let mut result = ClassificationResult::new(ActionCategory::PlayMusic, CONFIDENCE_MUSIC);
    if !query.is_empty() {
        result = result.with_param("query", query);
    }
    Some(result)
}

fn rule_reminder(u: &Utterance<'_>) -> Option<ClassificationResult> {
    let keyword = u.find(REMIND_WORDS)?;
    let mut start = keyword + 1;
    while start < u.tokens.len() && REMIND_LEADING_FILLERS.contains(&u.tokens[start].lower.as_str())
    {
        start += 1;
    }
    let remainder = u.tokens[start..]
        .iter()
        .map(|t| t.original)
        .collect::<Vec<_>>()
        .join(" ");

    let (task, time) = extract::split_time_clause(&remainder);
    let mut result = ClassificationResult::new(ActionCategory::SetReminder, CONFIDENCE_REMINDER);
    if !task.is_empty() {
        result = result.with_param("task", task);
    }
    if let Some(time) = time {
        result = result.with_param("time", time);
    }
    Some(result)
}

fn rule_app_launch(u: &Utterance<'_>) -> Option<ClassificationResult> {
    let keyword = u.find(LAUNCH_WORDS)?;
    let name = join_trimmed(
        &u.tokens[keyword + 1..],
        APP_LEADING_FILLERS,
        APP_TRAILING_FILLERS,
        true,
    );
    if name.is_empty() {
        return None;
    }
    Some(
        ClassificationResult::new(ActionCategory::OpenApp, CONFIDENCE_APP_LAUNCH)
            .with_param("appName", correct_app_name(&name)),
    )
}

fn rule_knowledge_query(u: &Utterance<'_>) -> Option<ClassificationResult> {
    if u.original.ends_with('?') || u.has_exact(QUERY_WORDS) {
        Some(ClassificationResult::new(ActionCategory::KnowledgeQuery, CONFIDENCE_KNOWLEDGE_QUERY))
    } else {
        None
    }
}

// ── Public API ─────────────────────────────────────────────────────────────

/// Stateless rule engine. Cheap to copy; holds no data.
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternClassifier;

impl PatternClassifier {
    pub fn new() -> Self {
        PatternClassifier
    }

    pub fn classify(&self, utterance: &str) -> ClassificationResult {
        classify(utterance)
    }

    pub fn is_instant(&self, category: ActionCategory) -> bool {
        category.is_instant()
    }
}

/// Classify an utterance. Never fails: blank input is `Unknown`, anything the
/// rules do not claim is `Conversation`.
pub fn classify(utterance: &str) -> ClassificationResult {
    let u = Utterance::new(utterance);
    if u.tokens.is_empty() && u.original.is_empty() {
        return ClassificationResult::new(ActionCategory::Unknown, CONFIDENCE_BLANK);
    }

    for rule in RULES {
        if let Some(result) = (rule.apply)(&u) {
            debug!(
                "[classifier] rule '{}' → {} ({:.2}) {:?}",
                rule.name,
                result.category.as_str(),
                result.confidence,
                result.parameters
            );
            return result;
        }
    }

    debug!("[classifier] no rule matched, falling back to conversation");
    ClassificationResult::new(ActionCategory::Conversation, CONFIDENCE_CONVERSATION)
}
