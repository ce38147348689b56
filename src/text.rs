//! Character-offset helpers shared by the commands.
//!
//! Every position the engine deals with counts Unicode scalar values, so a
//! splice never lands inside a multi-byte character.

/// Number of characters in `s`.
pub fn len(s: &str) -> usize {
    s.chars().count()
}

/// Byte index of the character at `index`.
///
/// `index == len(s)` maps to the end of the string; anything past that is `None`.
pub fn byte_offset(s: &str, index: usize) -> Option<usize> {
    s.char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(s.len()))
        .nth(index)
}

/// The outcome of replacing a character range.
#[derive(Debug, PartialEq, Eq)]
pub struct Splice {
    pub content: String,
    pub removed: String,
}

/// Replaces `length` characters starting at `start` with `replacement`.
///
/// Returns `None` if the range does not fit inside `s`.
pub fn splice(s: &str, start: usize, length: usize, replacement: &str) -> Option<Splice> {
    let from = byte_offset(s, start)?;
    let to = byte_offset(s, start.checked_add(length)?)?;

    let mut content = String::with_capacity(s.len() - (to - from) + replacement.len());
    content.push_str(&s[..from]);
    content.push_str(replacement);
    content.push_str(&s[to..]);

    Some(Splice {
        content,
        removed: s[from..to].to_string(),
    })
}
