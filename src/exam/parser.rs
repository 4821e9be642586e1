// src/exam/parser.rs
// Total parsers for model output. Decode-or-fallback: callers never branch
// on parse failure, only on gateway failure. A malformed reply degrades to
// a usable result instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Asked when the model's structured reply can't supply a follow-up.
pub const FALLBACK_NEXT_QUESTION: &str =
    "Can you tell me more about that?";

/// One turn's worth of structured feedback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnResult {
    pub feedback: String,
    pub corrected_answer: String,
    pub tip: String,
    /// 1-10 when the model behaves; out-of-range values pass through
    /// unchanged rather than being clamped.
    pub score: Option<i64>,
    pub next_question: String,
}

/// Internal decode outcome. Collapsed to a plain TurnResult at the module
/// boundary; the distinction exists only for logging and tests.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnDecode {
    Decoded(TurnResult),
    Fallback(TurnResult),
}

impl TurnDecode {
    pub fn into_result(self) -> TurnResult {
        match self {
            Self::Decoded(r) | Self::Fallback(r) => r,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }
}

/// Decode a raw model reply into a TurnResult. Never fails: non-JSON text
/// becomes the feedback of a degraded result with defaulted fields.
pub fn decode_turn(raw: &str) -> TurnDecode {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(map)) => TurnDecode::Decoded(TurnResult {
            feedback: str_field(&map, "feedback"),
            corrected_answer: str_field(&map, "corrected_answer"),
            tip: str_field(&map, "tip"),
            score: map.get("score").and_then(Value::as_i64),
            next_question: match str_field(&map, "next_question") {
                q if q.is_empty() => FALLBACK_NEXT_QUESTION.to_string(),
                q => q,
            },
        }),
        _ => TurnDecode::Fallback(TurnResult {
            feedback: raw.to_string(),
            corrected_answer: String::new(),
            tip: String::new(),
            score: None,
            next_question: FALLBACK_NEXT_QUESTION.to_string(),
        }),
    }
}

/// Boundary form of `decode_turn`.
pub fn parse_turn(raw: &str) -> TurnResult {
    decode_turn(raw).into_result()
}

/// Dictionary record for the plain lookup endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub headword: String,
    pub part_of_speech: String,
    pub meaning: String,
    pub examples: Vec<String>,
    pub synonyms: Vec<String>,
}

/// Decode a dictionary reply with the same decode-or-fallback contract.
/// List fields are normalized: bare string -> single-element list, missing
/// -> empty list, list -> pass-through (non-string elements dropped).
pub fn parse_dictionary(raw: &str, term: &str) -> DictionaryEntry {
    match serde_json::from_str::<Value>(raw.trim()) {
        Ok(Value::Object(map)) => DictionaryEntry {
            headword: match str_field(&map, "headword") {
                h if h.is_empty() => term.to_string(),
                h => h,
            },
            part_of_speech: str_field(&map, "part_of_speech"),
            meaning: str_field(&map, "meaning"),
            examples: string_list(map.get("examples")),
            synonyms: string_list(map.get("synonyms")),
        },
        _ => DictionaryEntry {
            headword: term.to_string(),
            part_of_speech: String::new(),
            meaning: raw.to_string(),
            examples: Vec::new(),
            synonyms: Vec::new(),
        },
    }
}

fn str_field(map: &serde_json::Map<String, Value>, key: &str) -> String {
    map.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}
