//! Configuration validation with unknown field detection.
//!
//! Used by `baitbot config check` to report typos in the raw JSON before
//! serde's defaults silently swallow them.

use serde_json::Value;
use std::collections::HashSet;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["own_id", "chats", "agent", "provider", "logging"];

/// Known fields for each section.
const KNOWN_CHAT: &[&str] = &["chat", "preamble"];
const KNOWN_AGENT: &[&str] = &[
    "response_wait_secs",
    "max_silence_secs",
    "silence_jitter_secs",
    "history_fetch_limit",
    "max_input_tokens",
];
const KNOWN_PROVIDER: &[&str] = &["api_key", "api_base", "model", "max_tokens", "temperature"];
const KNOWN_LOGGING: &[&str] = &["format", "level", "file"];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            row[j + 1] = (prev[j + 1] + 1).min(row[j] + 1).min(prev[j] + cost);
        }
        prev = row;
    }
    prev[b.len()]
}

/// Suggest the closest known field name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

fn check_keys(
    obj: &serde_json::Map<String, Value>,
    known: &[&str],
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let known_set: HashSet<&str> = known.iter().copied().collect();
    let mut has_unknown = false;
    for key in obj.keys() {
        if known_set.contains(key.as_str()) {
            continue;
        }
        has_unknown = true;
        let message = match suggest_field(key, known) {
            Some(suggestion) => format!("Unknown field '{}', {}", key, suggestion),
            None => format!("Unknown field '{}'", key),
        };
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Error,
            path: format!("{}{}", prefix, key),
            message,
        });
    }
    has_unknown
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic {
                level: DiagnosticLevel::Error,
                path: String::new(),
                message: "Config must be a JSON object".to_string(),
            });
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic {
        level: DiagnosticLevel::Ok,
        path: String::new(),
        message: "Valid JSON".to_string(),
    });

    let mut has_unknown = check_keys(obj, KNOWN_TOP_LEVEL, "", &mut diagnostics);

    for (section, known) in [
        ("agent", KNOWN_AGENT),
        ("provider", KNOWN_PROVIDER),
        ("logging", KNOWN_LOGGING),
    ] {
        if let Some(section_obj) = obj.get(section).and_then(|v| v.as_object()) {
            has_unknown |= check_keys(
                section_obj,
                known,
                &format!("{}.", section),
                &mut diagnostics,
            );
        }
    }

    if let Some(chats) = obj.get("chats").and_then(|v| v.as_array()) {
        for (i, chat) in chats.iter().enumerate() {
            if let Some(chat_obj) = chat.as_object() {
                has_unknown |=
                    check_keys(chat_obj, KNOWN_CHAT, &format!("chats[{}].", i), &mut diagnostics);
            }
        }
    }

    if !has_unknown {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Ok,
            path: String::new(),
            message: "All fields recognized".to_string(),
        });
    }

    let api_key_set = obj
        .get("provider")
        .and_then(|p| p.get("api_key"))
        .and_then(|k| k.as_str())
        .is_some_and(|k| !k.is_empty());
    if !api_key_set {
        diagnostics.push(Diagnostic {
            level: DiagnosticLevel::Warn,
            path: "provider.api_key".to_string(),
            message: "Not set, replies will be canned echo text".to_string(),
        });
    }

    diagnostics
}
