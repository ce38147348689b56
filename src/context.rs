use crate::error::ApplyError;

/// The per-call view of the surface being edited.
///
/// Commands read the current text through it and push their result back
/// with [`apply`](EditorContext::apply). Nothing in this crate keeps hold of
/// a context once the call that received it returns.
pub trait EditorContext {
    /// The current buffer text.
    fn content(&self) -> &str;

    /// Cursor offset, in characters.
    fn cursor_position(&self) -> usize;

    /// Selection as `(start, end)` character offsets.
    fn selection_range(&self) -> (usize, usize);

    /// Replaces the visible text and moves the cursor.
    ///
    /// # Errors
    ///
    /// Will return `Err` if the underlying widget rejects the mutation
    fn apply(&mut self, content: String, cursor_position: usize) -> Result<(), ApplyError>;
}
