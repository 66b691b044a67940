//! Retrieval-augmented prompt assembly.
//!
//! Turns ranked [`SearchResult`]s into one context line each and wraps them,
//! together with the user's question, into the prompt sent to the language model.

use serde_json::Value;

use crate::memory::types::{EventType, SearchResult};

/// Reply used when the index returns nothing for a question. The language model
/// is not consulted in that case.
pub const NO_MEMORIES_RESPONSE: &str = "I don't have any relevant memories about that. \
Try browsing some websites or copying some text first, and then ask me again!";

/// Sentence the model is told to answer with when the context is irrelevant.
pub const NOTHING_RELEVANT_REPLY: &str =
    "I don’t have any relevant information about that right now.";

/// Copied text longer than this many characters is cut in context lines.
pub const SNIPPET_CHARS: usize = 100;

/// Render one search hit as a line of prompt context.
pub fn context_line(result: &SearchResult) -> String {
    let payload = &result.payload;
    let score = result.score;
    let url = str_field(payload, "url").unwrap_or("");

    let event_type = str_field(payload, "type").and_then(|t| t.parse::<EventType>().ok());
    match event_type {
        Some(EventType::UrlVisit) => {
            let title = str_field(payload, "title").unwrap_or("Unknown");
            format!("Visited: '{title}' at {url} (score: {score:.2})")
        }
        Some(EventType::CopyEvent) => {
            let snippet = truncate_chars(str_field(payload, "text").unwrap_or(""), SNIPPET_CHARS);
            format!("Copied: '{snippet}' from {url} (score: {score:.2})")
        }
        None => format!("Memory: {payload} (score: {score:.2})"),
    }
}

/// Build the full prompt for `query` from already-ranked search hits.
pub fn build_prompt(query: &str, results: &[SearchResult]) -> String {
    let context = results
        .iter()
        .map(|r| format!("- {}", context_line(r)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        r#"
You are a personal assistant that helps the user reflect on their digital memory log.

User's question: "{query}"

Relevant memory entries:
{context}

Instructions:
- Only use the information above.
- If nothing is relevant, respond with:
  "{NOTHING_RELEVANT_REPLY}"
- Format your reply with clear headings, bullet points, or numbered steps when possible.
- Always sound thoughtful and helpful. Avoid hallucinating facts or assuming context beyond the data.

Now provide a structured and helpful response to the user.
"#
    )
}

fn str_field<'a>(payload: &'a Value, key: &str) -> Option<&'a str> {
    payload.get(key).and_then(Value::as_str)
}

/// First `max` characters of `s`, never splitting a UTF-8 sequence.
fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
