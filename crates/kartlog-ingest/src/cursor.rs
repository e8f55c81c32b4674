//! Forward-only cursor over the lines of a decoded document.

/// Peek/advance access to a slice of lines with bounded lookahead.
#[derive(Debug, Clone)]
pub struct LineCursor<'a> {
    lines: &'a [String],
    pos: usize,
}

impl<'a> LineCursor<'a> {
    pub fn new(lines: &'a [String]) -> Self {
        Self { lines, pos: 0 }
    }

    /// Start at `pos`, clamped to the end.
    pub fn at(lines: &'a [String], pos: usize) -> Self {
        Self {
            lines,
            pos: pos.min(lines.len()),
        }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_done(&self) -> bool {
        self.pos >= self.lines.len()
    }

    pub fn peek(&self) -> Option<&'a str> {
        self.peek_at(0)
    }

    /// The line `offset` lines past the current one.
    pub fn peek_at(&self, offset: usize) -> Option<&'a str> {
        self.lines.get(self.pos + offset).map(String::as_str)
    }

    /// Return the current line and move past it.
    pub fn advance(&mut self) -> Option<&'a str> {
        let line = self.peek()?;
        self.pos += 1;
        Some(line)
    }

    pub fn advance_by(&mut self, n: usize) {
        self.pos = (self.pos + n).min(self.lines.len());
    }

    /// The following lines (offsets `1..=max_ahead`) paired with their offset.
    pub fn lookahead(&self, max_ahead: usize) -> impl Iterator<Item = (usize, &'a str)> + '_ {
        (1..=max_ahead).map_while(move |offset| self.peek_at(offset).map(|line| (offset, line)))
    }

    /// Lines not yet consumed.
    pub fn remaining(&self) -> &'a [String] {
        &self.lines[self.pos..]
    }
}
