use crate::ui::text_layout::floor_char_boundary;

/// Single prompt buffer with a byte cursor that always sits on a char
/// boundary, plus recall of previously submitted lines.
#[derive(Debug, Default)]
pub struct InputEditor {
    buffer: String,
    cursor: usize,
    history: Vec<String>,
    history_index: Option<usize>,
    stash: Option<String>,
}

impl InputEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    fn prev_char_boundary(&self, idx: usize) -> usize {
        let i = floor_char_boundary(&self.buffer, idx);
        self.buffer[..i]
            .char_indices()
            .next_back()
            .map(|(start, _)| start)
            .unwrap_or(0)
    }

    fn next_char_boundary(&self, idx: usize) -> usize {
        let i = floor_char_boundary(&self.buffer, idx);
        match self.buffer[i..].chars().next() {
            Some(ch) => i + ch.len_utf8(),
            None => self.buffer.len(),
        }
    }

    pub fn insert_str(&mut self, value: &str) {
        let cursor = floor_char_boundary(&self.buffer, self.cursor);
        self.buffer.insert_str(cursor, value);
        self.cursor = cursor + value.len();
        self.history_index = None;
    }

    pub fn backspace(&mut self) {
        let end = floor_char_boundary(&self.buffer, self.cursor);
        if end == 0 {
            return;
        }
        let start = self.prev_char_boundary(end);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn delete(&mut self) {
        let start = floor_char_boundary(&self.buffer, self.cursor);
        if start >= self.buffer.len() {
            return;
        }
        let end = self.next_char_boundary(start);
        self.buffer.replace_range(start..end, "");
        self.cursor = start;
    }

    pub fn move_left(&mut self) {
        self.cursor = self.prev_char_boundary(self.cursor);
    }

    pub fn move_right(&mut self) {
        self.cursor = self.next_char_boundary(self.cursor);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer.len();
    }

    /// Returns the buffer as typed. It is cleared and recorded in history only
    /// when `accept` agrees; a refused submit leaves the draft in place.
    /// Blank input returns `None`.
    pub fn submit(&mut self, accept: impl FnOnce(&str) -> bool) -> Option<String> {
        if self.buffer.trim().is_empty() {
            return None;
        }
        let value = self.buffer.clone();
        if !accept(&value) {
            return Some(value);
        }
        if self.history.last() != Some(&value) {
            self.history.push(value.clone());
        }
        self.buffer.clear();
        self.cursor = 0;
        self.history_index = None;
        self.stash = None;
        Some(value)
    }

    pub fn history_prev(&mut self) {
        if self.history.is_empty() {
            return;
        }
        let index = match self.history_index {
            None => {
                self.stash = Some(self.buffer.clone());
                self.history.len() - 1
            }
            Some(0) => 0,
            Some(i) => i - 1,
        };
        self.history_index = Some(index);
        self.set_buffer(self.history[index].clone());
    }

    pub fn history_next(&mut self) {
        let Some(index) = self.history_index else {
            return;
        };
        if index + 1 < self.history.len() {
            self.history_index = Some(index + 1);
            self.set_buffer(self.history[index + 1].clone());
        } else {
            self.history_index = None;
            let stash = self.stash.take().unwrap_or_default();
            self.set_buffer(stash);
        }
    }

    fn set_buffer(&mut self, value: String) {
        self.buffer = value;
        self.cursor = self.buffer.len();
    }
}
