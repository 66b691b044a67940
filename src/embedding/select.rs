use crate::memory::types::LogItem;

/// Embedded when an event carries no text, title or URL.
pub const FALLBACK_EMBEDDING_TEXT: &str = "generic memory event";

/// Pick the one field of `item` that represents it in the vector index.
///
/// Priority is `text`, then `title`, then `url`, then [`FALLBACK_EMBEDDING_TEXT`].
/// A field counts only when it is non-empty; whitespace is kept as content.
/// The chosen text is handed to the embedding model unmodified.
pub fn select_embedding_text(item: &LogItem) -> &str {
    [item.text.as_deref(), item.title.as_deref(), Some(item.url.as_str())]
        .into_iter()
        .flatten()
        .find(|field| !field.is_empty())
        .unwrap_or(FALLBACK_EMBEDDING_TEXT)
}
