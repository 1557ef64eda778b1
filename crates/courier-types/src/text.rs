/// Maximum number of characters kept in notification previews and thread snippets
pub const PREVIEW_MAX_CHARS: usize = 100;

const ELLIPSIS: &str = "...";

/// Cut `text` to at most `max_chars` characters, appending `...` when cut
///
/// Counts Unicode scalar values, never bytes, so the result is always valid
/// UTF-8 regardless of where the limit falls.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => {
            let mut out = String::with_capacity(byte_idx + ELLIPSIS.len());
            out.push_str(&text[..byte_idx]);
            out.push_str(ELLIPSIS);
            out
        }
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_long_text_is_cut_to_limit() {
        let text = "a".repeat(150);
        let preview = truncate_text(&text, PREVIEW_MAX_CHARS);

        assert!(preview.ends_with("..."));
        assert_eq!(preview.chars().count(), PREVIEW_MAX_CHARS + 3);
        assert_eq!(&preview[..PREVIEW_MAX_CHARS], "a".repeat(100));
    }

    #[test]
    fn test_short_text_is_unchanged() {
        let text = "b".repeat(90);
        assert_eq!(truncate_text(&text, PREVIEW_MAX_CHARS), text);
    }

    #[test]
    fn test_text_at_exact_limit_is_unchanged() {
        let text = "c".repeat(100);
        assert_eq!(truncate_text(&text, PREVIEW_MAX_CHARS), text);
    }

    #[test]
    fn test_multibyte_characters_are_not_split() {
        let text = "é".repeat(120);
        let preview = truncate_text(&text, PREVIEW_MAX_CHARS);
        assert_eq!(preview.chars().filter(|c| *c == 'é').count(), 100);
        assert!(preview.ends_with("..."));
    }
}
