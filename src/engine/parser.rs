// Paw Voice Engine — Output Parser
// Turns raw backend text into a structured action or conversational text.
// Total: every input, including empty, truncated or huge text, yields a
// ParsedOutput. Malformed output degrades to Conversation(raw.trim()).
//
// Wire format:
//   {"type":"action","action":"CREATE_REMINDER","parameters":{...}}
//   {"type":"conversation","text":"..."}

use crate::atoms::types::{GenerativeAction, GenerativeActionKind, Parameters, ParsedOutput};
use log::debug;
use serde_json::{Map, Value};

/// Locate the first balanced `{...}` span. Brace matching ignores braces
/// inside JSON strings and honours backslash escapes. Single linear pass.
pub fn find_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = bytes.iter().position(|&b| b == b'{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, &b) in bytes[start..].iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + 1;
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }
    None
}

fn conversation_fallback(raw: &str) -> ParsedOutput {
    ParsedOutput::Conversation(raw.trim().to_string())
}

fn value_to_param(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        // Nested structures are kept as compact JSON for the executor to decode.
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}

fn parameters_from(object: &Map<String, Value>) -> Parameters {
    match object.get("parameters") {
        Some(Value::Object(params)) => params
            .iter()
            .filter_map(|(key, value)| value_to_param(value).map(|v| (key.clone(), v)))
            .collect(),
        _ => Parameters::new(),
    }
}

/// Parse raw backend output. Never panics, never errors.
pub fn parse(raw: &str) -> ParsedOutput {
    let Some(candidate) = find_json_object(raw) else {
        return conversation_fallback(raw);
    };
    let object = match serde_json::from_str::<Value>(candidate) {
        Ok(Value::Object(object)) => object,
        Ok(_) => return conversation_fallback(raw),
        Err(e) => {
            debug!("[parser] JSON candidate did not decode: {}", e);
            return conversation_fallback(raw);
        }
    };

    match object.get("type").and_then(Value::as_str) {
        Some("conversation") => match object.get("text").and_then(Value::as_str) {
            Some(text) => ParsedOutput::Conversation(text.to_string()),
            None => conversation_fallback(raw),
        },
        Some("action") => {
            let name = object.get("action").and_then(Value::as_str).unwrap_or_default();
            let kind = GenerativeActionKind::from_wire_name(name);
            if kind == GenerativeActionKind::Unknown {
                debug!("[parser] Unrecognised action name '{}'", name);
                return conversation_fallback(raw);
            }
            ParsedOutput::Action(GenerativeAction { kind, parameters: parameters_from(&object) })
        }
        _ => conversation_fallback(raw),
    }
}

/// True exactly when `parse` would return an `Action`.
pub fn is_action_response(raw: &str) -> bool {
    matches!(parse(raw), ParsedOutput::Action(_))
}

/// Stateless wrapper for callers that prefer a value to free functions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputParser;

impl OutputParser {
    pub fn new() -> Self {
        OutputParser
    }

    pub fn parse(&self, raw: &str) -> ParsedOutput {
        parse(raw)
    }

    pub fn is_action_response(&self, raw: &str) -> bool {
        is_action_response(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(text: &str) -> ParsedOutput {
        ParsedOutput::Conversation(text.to_string())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse("not json at all"), conversation("not json at all"));
        assert_eq!(parse("  padded reply \n"), conversation("padded reply"));
        assert!(!is_action_response("not json at all"));
    }

    #[test]
    fn test_create_reminder_action() {
        let raw = r#"{"type":"action","action":"CREATE_REMINDER","parameters":{"title":"x"}}"#;
        match parse(raw) {
            ParsedOutput::Action(action) => {
                assert_eq!(action.kind, GenerativeActionKind::CreateReminder);
                assert_eq!(action.parameters.len(), 1);
                assert_eq!(action.param("title"), Some("x"));
            }
            other => panic!("expected action, got {other:?}"),
        }
        assert!(is_action_response(raw));
    }

    #[test]
    fn test_action_wrapped_in_prose() {
        let raw = "Sure! Here you go:\n```json\n{\"type\": \"action\", \"action\": \"CREATE_TASK\", \"parameters\": {\"title\": \"Pay {rent}\", \"priority\": 2, \"urgent\": true, \"note\": null}}\n```\nAnything else?";
        let ParsedOutput::Action(action) = parse(raw) else {
            panic!("expected action");
        };
        assert_eq!(action.kind, GenerativeActionKind::CreateTask);
        assert_eq!(action.param("title"), Some("Pay {rent}"));
        assert_eq!(action.param("priority"), Some("2"));
        assert_eq!(action.param("urgent"), Some("true"));
        assert!(!action.parameters.contains_key("note"));
    }

    #[test]
    fn test_nested_parameter_kept_as_json() {
        let raw = r#"{"type":"action","action":"UPDATE_TASK","parameters":{"id":"t1","tags":["a","b"]}}"#;
        let ParsedOutput::Action(action) = parse(raw) else {
            panic!("expected action");
        };
        assert_eq!(action.param("tags"), Some(r#"["a","b"]"#));
    }

    #[test]
    fn test_missing_parameters_is_empty_map() {
        let ParsedOutput::Action(action) = parse(r#"{"type":"action","action":"LIST_TASKS"}"#) else {
            panic!("expected action");
        };
        assert_eq!(action.kind, GenerativeActionKind::ListTasks);
        assert!(action.parameters.is_empty());
    }

    #[test]
    fn test_conversation_discriminator() {
        let raw = r#"Answer: {"type":"conversation","text":"Paris is the capital."}"#;
        assert_eq!(parse(raw), conversation("Paris is the capital."));
        assert!(!is_action_response(raw));
    }

    #[test]
    fn test_conversation_without_text_falls_back() {
        let raw = r#"{"type":"conversation"}"#;
        assert_eq!(parse(raw), conversation(raw));
    }

    #[test]
    fn test_unknown_action_falls_back() {
        let raw = r#"{"type":"action","action":"LAUNCH_ROCKET","parameters":{}}"#;
        assert_eq!(parse(raw), conversation(raw));
        let raw = r#"{"type":"action","parameters":{}}"#;
        assert_eq!(parse(raw), conversation(raw));
    }

    #[test]
    fn test_json_without_discriminator_falls_back() {
        let raw = r#" {"action":"CREATE_TASK","parameters":{"title":"x"}} "#;
        assert_eq!(parse(raw), conversation(raw.trim()));
        let raw = r#"{"type":"ACTION","action":"CREATE_TASK"}"#;
        assert_eq!(parse(raw), conversation(raw));
    }

    #[test]
    fn test_invalid_json_falls_back() {
        let raw = "{type: action, action: CREATE_TASK}";
        assert_eq!(parse(raw), conversation(raw));
        // First balanced span is not JSON; no second chance.
        let raw = r#"use {braces} then {"type":"action","action":"LIST_TASKS"}"#;
        assert_eq!(parse(raw), conversation(raw));
    }

    #[test]
    fn test_degenerate_inputs() {
        assert_eq!(parse(""), conversation(""));
        assert_eq!(parse("   "), conversation(""));
        assert_eq!(parse("{"), conversation("{"));
        assert_eq!(parse("}}}{"), conversation("}}}{"));
        assert_eq!(parse(r#"{"type":"action","action":"CREATE_TASK""#), conversation(r#"{"type":"action","action":"CREATE_TASK""#));
        assert_eq!(parse(r#"{"a":"unterminated string}"#), conversation(r#"{"a":"unterminated string}"#));
        assert_eq!(parse("{}"), conversation("{}"));
    }

    #[test]
    fn test_escaped_quotes_inside_strings() {
        let raw = r#"{"type":"conversation","text":"she said \"hi {there}\""}"#;
        assert_eq!(parse(raw), conversation(r#"she said "hi {there}""#));
    }

    #[test]
    fn test_megabyte_inputs() {
        let open = "{".repeat(1_000_000);
        assert_eq!(parse(&open), conversation(&open));

        let prose = "lorem ipsum ".repeat(100_000);
        let raw = format!(
            "{prose}{{\"type\":\"action\",\"action\":\"DELETE_REMINDER\",\"parameters\":{{\"id\":\"r9\"}}}}"
        );
        assert!(is_action_response(&raw));
    }

    #[test]
    fn test_find_json_object() {
        assert_eq!(find_json_object("x {\"a\":{\"b\":1}} y"), Some("{\"a\":{\"b\":1}}"));
        assert_eq!(find_json_object("no braces"), None);
        assert_eq!(find_json_object("{ \"}\" }"), Some("{ \"}\" }"));
    }

    #[test]
    fn test_is_action_response_agrees_with_parse() {
        let samples = [
            "",
            "hello",
            r#"{"type":"action","action":"COMPLETE_TASK","parameters":{"id":"1"}}"#,
            r#"{"type":"conversation","text":"ok"}"#,
            r#"{"type":"action","action":"NOPE"}"#,
            "{{{{",
        ];
        for raw in samples {
            assert_eq!(is_action_response(raw), matches!(parse(raw), ParsedOutput::Action(_)));
        }
    }
}
