//! Greedy JSON span extraction from free-form model output.
//!
//! Models are told to answer with bare JSON but routinely wrap it in prose
//! or code fences. The scan takes the widest plausible span, first opening
//! brace to last closing brace, and leaves syntax checking to the parser.

/// Returns the span from the first `{` to the last `}`, or `None` when no
/// such span exists.
pub(crate) fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

/// Returns the span from the first `[` to the last `]`, or `None` when no
/// such span exists.
pub(crate) fn first_json_array(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}
