use std::ops::Range;

pub use pegparse_derive::Span;

/// Position (offset) in a source.
///
/// For text sources this is a byte offset, for slice sources it is an element index.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position(usize);

impl Position {
    /// Makes a new [`Position`] instance.
    pub const fn new(offset: usize) -> Self {
        Self(offset)
    }

    /// Gets the offset.
    pub const fn get(self) -> usize {
        self.0
    }

    /// Returns the (1-based) line and column numbers at where this position is located in the given text.
    ///
    /// Columns count characters, not bytes.
    pub fn line_and_column(self, text: &str) -> (usize, usize) {
        let offset = std::cmp::min(self.0, text.len());
        let mut line = 1;
        let mut column = 1;
        for c in text[..offset].chars() {
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        (line, column)
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// This trait allows for representing a parsed item that has start and end positions in a source.
pub trait Span {
    /// Returns the start position of this item.
    fn start_position(&self) -> Position;

    /// Returns the end position of this item.
    fn end_position(&self) -> Position;

    /// Returns `true` if the span is empty, otherwise `false`.
    fn is_empty(&self) -> bool {
        self.start_position().get() >= self.end_position().get()
    }

    /// Returns the length of this span.
    fn len(&self) -> usize {
        if self.is_empty() {
            0
        } else {
            self.end_position().get() - self.start_position().get()
        }
    }

    /// Returns the span as a position range.
    fn range(&self) -> Range<Position> {
        self.start_position()..self.end_position()
    }

    /// Returns the text representation of this item.
    fn text<'a>(&self, text: &'a str) -> &'a str {
        &text[self.start_position().get()..self.end_position().get()]
    }

    /// Returns the elements of a slice source covered by this item.
    fn elements<'a, T>(&self, source: &'a [T]) -> &'a [T] {
        &source[self.start_position().get()..self.end_position().get()]
    }
}

impl Span for Position {
    fn start_position(&self) -> Position {
        *self
    }

    fn end_position(&self) -> Position {
        *self
    }
}

impl Span for Range<Position> {
    fn start_position(&self) -> Position {
        self.start
    }

    fn end_position(&self) -> Position {
        self.end
    }
}

impl<T: Span> Span for Box<T> {
    fn start_position(&self) -> Position {
        (**self).start_position()
    }

    fn end_position(&self) -> Position {
        (**self).end_position()
    }
}

impl<T: Span> Span for std::rc::Rc<T> {
    fn start_position(&self) -> Position {
        (**self).start_position()
    }

    fn end_position(&self) -> Position {
        (**self).end_position()
    }
}

impl<T: Span> Span for &T {
    fn start_position(&self) -> Position {
        (**self).start_position()
    }

    fn end_position(&self) -> Position {
        (**self).end_position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_and_column_counts_chars() {
        let text = "ab\ncdé\nf";
        assert_eq!(Position::new(0).line_and_column(text), (1, 1));
        assert_eq!(Position::new(2).line_and_column(text), (1, 3));
        assert_eq!(Position::new(3).line_and_column(text), (2, 1));
        // 'é' is two bytes wide but one column
        assert_eq!(Position::new(7).line_and_column(text), (2, 4));
        assert_eq!(Position::new(8).line_and_column(text), (3, 1));
    }

    #[test]
    fn range_span() {
        let span = Position::new(2)..Position::new(5);
        assert_eq!(span.len(), 3);
        assert!(!span.is_empty());
        assert_eq!(span.text("0123456"), "234");
        assert_eq!(span.elements(&[0, 1, 2, 3, 4, 5]), &[2, 3, 4]);
        assert!((Position::new(4)..Position::new(4)).is_empty());
    }
}
