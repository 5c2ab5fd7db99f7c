// Paw Voice Engine — Parameter extraction
// Bounded regexes for durations and reminder time clauses. Patterns are
// compiled once and are linear-time (regex crate guarantees no backtracking).

use log::warn;
use regex::Regex;
use std::sync::LazyLock;

const NUMBER_WORDS: &[(&str, u32)] = &[
    ("a", 1),
    ("an", 1),
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
    ("fifteen", 15),
    ("twenty", 20),
    ("thirty", 30),
    ("forty", 40),
    ("forty-five", 45),
    ("fifty", 50),
    ("sixty", 60),
    ("ninety", 90),
];

// Quantity capped at five digits so the match length stays bounded.
static DURATION_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(
        r"(?i)\b(\d{1,5}|forty-five|an|a|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty|thirty|forty|fifty|sixty|ninety)\s*-?\s*(seconds?|secs?|minutes?|mins?|hours?|hrs?)\b",
    )
});

// Time clause: a preposition at the start of the text or after whitespace,
// whose next word looks like a time. Leftmost qualifying preposition wins, so
// "turn on the lights at 5" splits at "at", not "on".
static TIME_CLAUSE_PATTERN: LazyLock<Option<Regex>> = LazyLock::new(|| {
    compile(
        r"(?i)(?:^|\s)(at|in|on|after)\s+((?:\d|(?:noon|midnight|tomorrow|tonight|today|morning|afternoon|evening|night|monday|tuesday|wednesday|thursday|friday|saturday|sunday|next|this|half|an?\s+(?:second|minute|hour|day|week|month)|the\s+(?:morning|afternoon|evening|night|weekend)|one|two|three|four|five|six|seven|eight|nine|ten|eleven|twelve|fifteen|twenty|thirty|forty|fifty|sixty)\b).*)$",
    )
});

fn compile(pattern: &str) -> Option<Regex> {
    match Regex::new(pattern) {
        Ok(re) => Some(re),
        Err(e) => {
            warn!("[classifier] Failed to compile pattern '{}': {}", pattern, e);
            None
        }
    }
}

/// A parsed `<quantity> <unit>` pair, unit singularised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Duration {
    pub amount: u32,
    pub unit: &'static str,
}

/// First `<quantity> <unit>` in the text. Number words are converted to digits.
pub fn extract_duration(text: &str) -> Option<Duration> {
    let re = DURATION_PATTERN.as_ref()?;
    // "1.5 hours" or "1,000 seconds": the digits after the separator are not a quantity.
    let caps = re.captures_iter(text).find(|caps| {
        caps.get(1)
            .map(|q| !text[..q.start()].ends_with(|c: char| c == '.' || c == ','))
            .unwrap_or(false)
    })?;
    let quantity = caps.get(1)?.as_str().to_lowercase();
    let amount = match quantity.parse::<u32>() {
        Ok(n) => n,
        Err(_) => NUMBER_WORDS
            .iter()
            .find(|(word, _)| *word == quantity)
            .map(|(_, n)| *n)?,
    };
    let unit = normalize_unit(caps.get(2)?.as_str())?;
    Some(Duration { amount, unit })
}

fn normalize_unit(raw: &str) -> Option<&'static str> {
    let lower = raw.to_lowercase();
    if lower.starts_with("sec") {
        Some("second")
    } else if lower.starts_with("min") {
        Some("minute")
    } else if lower.starts_with("h") {
        Some("hour")
    } else {
        None
    }
}

/// Split `text` into (task, time clause). The clause keeps its preposition,
/// e.g. `("call mom", Some("at 5 pm"))`. Casing of the input is preserved.
/// A clause that opens the text may be followed by `to <task>`
/// ("in 10 minutes to stretch"). Only `at|in|on|after` introduce a clause;
/// "for tomorrow" stays in the task.
pub fn split_time_clause(text: &str) -> (String, Option<String>) {
    let Some(re) = TIME_CLAUSE_PATTERN.as_ref() else {
        return (text.trim().to_string(), None);
    };
    match re.captures(text) {
        Some(caps) => {
            let (Some(whole), Some(prep), Some(time)) = (caps.get(0), caps.get(1), caps.get(2))
            else {
                return (text.trim().to_string(), None);
            };
            let prep = prep.as_str().to_lowercase();
            let mut task = text[..whole.start()].trim().to_string();
            let mut time = time.as_str().trim();
            if task.is_empty() {
                if let Some(idx) = time.to_ascii_lowercase().find(" to ") {
                    task = time[idx + 4..].trim().to_string();
                    time = time[..idx].trim();
                }
            }
            (task, Some(format!("{} {}", prep, time)))
        }
        None => (text.trim().to_string(), None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digit_duration() {
        let d = extract_duration("set timer for 5 minutes").unwrap();
        assert_eq!(d, Duration { amount: 5, unit: "minute" });
    }

    #[test]
    fn test_word_duration() {
        assert_eq!(
            extract_duration("timer for ten seconds"),
            Some(Duration { amount: 10, unit: "second" })
        );
        assert_eq!(
            extract_duration("wake me up in an hour"),
            Some(Duration { amount: 1, unit: "hour" })
        );
        assert_eq!(
            extract_duration("countdown forty-five mins"),
            Some(Duration { amount: 45, unit: "minute" })
        );
    }

    #[test]
    fn test_compact_and_abbreviated_units() {
        assert_eq!(extract_duration("timer 90sec"), Some(Duration { amount: 90, unit: "second" }));
        assert_eq!(extract_duration("alarm in 2 hrs"), Some(Duration { amount: 2, unit: "hour" }));
    }

    #[test]
    fn test_no_duration() {
        assert_eq!(extract_duration("set a timer"), None);
        assert_eq!(extract_duration("timer for 5"), None);
        // Unit glued to other letters is not a unit.
        assert_eq!(extract_duration("5 minutesque"), None);
    }

    #[test]
    fn test_split_time_clause() {
        assert_eq!(
            split_time_clause("call mom at 5 pm"),
            ("call mom".to_string(), Some("at 5 pm".to_string()))
        );
        assert_eq!(
            split_time_clause("turn on the lights at 7"),
            ("turn on the lights".to_string(), Some("at 7".to_string()))
        );
        assert_eq!(
            split_time_clause("Buy Milk in 20 minutes"),
            ("Buy Milk".to_string(), Some("in 20 minutes".to_string()))
        );
        assert_eq!(
            split_time_clause("dentist on Monday"),
            ("dentist".to_string(), Some("on Monday".to_string()))
        );
    }

    #[test]
    fn test_split_clause_at_start() {
        assert_eq!(split_time_clause("at 5 pm"), (String::new(), Some("at 5 pm".to_string())));
        assert_eq!(
            split_time_clause("in 10 minutes"),
            (String::new(), Some("in 10 minutes".to_string()))
        );
        assert_eq!(
            split_time_clause("in 10 minutes to Stretch"),
            ("Stretch".to_string(), Some("in 10 minutes".to_string()))
        );
    }

    #[test]
    fn test_for_clause_stays_in_task() {
        assert_eq!(split_time_clause("for tomorrow"), ("for tomorrow".to_string(), None));
    }

    #[test]
    fn test_decimal_quantity_rejected() {
        assert_eq!(extract_duration("set timer for 1.5 hours"), None);
        assert_eq!(extract_duration("timer for 1,000 seconds"), None);
        assert_eq!(
            extract_duration("timer at 1.5 then 3 minutes"),
            Some(Duration { amount: 3, unit: "minute" })
        );
    }

    #[test]
    fn test_split_without_time() {
        assert_eq!(split_time_clause("check in on grandma"), ("check in on grandma".to_string(), None));
        assert_eq!(split_time_clause("  water plants "), ("water plants".to_string(), None));
    }
}
