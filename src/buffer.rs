use crate::context::EditorContext;
use crate::error::ApplyError;
use crate::text;

/// An in-memory text buffer that commands can be run against.
#[derive(Debug, Default, Clone)]
pub struct Buffer {
    content: String,
    cursor_position: usize,
    selection: (usize, usize),
    dirty: bool,
    read_only: bool,
}

impl From<&str> for Buffer {
    fn from(content: &str) -> Self {
        Self {
            content: String::from(content),
            ..Self::default()
        }
    }
}

impl Buffer {
    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Selects the range between `start` and `end`, clamped to the buffer.
    pub fn select(&mut self, start: usize, end: usize) {
        let len = self.len();
        let (start, end) = (start.min(len), end.min(len));
        self.selection = (start.min(end), start.max(end));
        self.cursor_position = end;
    }

    /// While read-only, every mutation is rejected.
    pub fn set_read_only(&mut self, read_only: bool) {
        self.read_only = read_only;
    }

    pub fn len(&self) -> usize {
        text::len(&self.content)
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

impl EditorContext for Buffer {
    fn content(&self) -> &str {
        &self.content
    }

    fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    fn selection_range(&self) -> (usize, usize) {
        self.selection
    }

    fn apply(&mut self, content: String, cursor_position: usize) -> Result<(), ApplyError> {
        if self.read_only {
            return Err(ApplyError("buffer is read-only".to_string()));
        }

        self.content = content;
        self.cursor_position = cursor_position.min(self.len());
        self.selection = (self.cursor_position, self.cursor_position);
        self.dirty = true;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_collapses_selection_and_marks_dirty() {
        let mut buffer = Buffer::from("Hello");
        buffer.select(1, 3);
        assert_eq!(buffer.selection_range(), (1, 3));

        buffer.apply("Hello!".to_string(), 6).unwrap();
        assert_eq!(buffer.content(), "Hello!");
        assert_eq!(buffer.selection_range(), (6, 6));
        assert!(buffer.is_dirty());

        buffer.mark_clean();
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn select_is_clamped_and_ordered() {
        let mut buffer = Buffer::from("abc");
        buffer.select(10, 1);
        assert_eq!(buffer.selection_range(), (1, 3));
        assert_eq!(buffer.cursor_position(), 1);
    }

    #[test]
    fn converts_from_str() {
        let buffer: Buffer = "héllo".into();
        assert_eq!(buffer.content(), "héllo");
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.cursor_position(), 0);
        assert!(!buffer.is_dirty());
    }

    #[test]
    fn read_only_buffer_rejects_apply() {
        let mut buffer = Buffer::from("abc");
        buffer.set_read_only(true);
        assert!(buffer.apply(String::new(), 0).is_err());
        assert_eq!(buffer.content(), "abc");
        assert!(!buffer.is_dirty());
    }
}
