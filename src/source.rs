use crate::Position;

/// An in-memory input sequence that can be parsed.
///
/// A source is addressed by [`Position`]s; each element occupies a `width` of one or more
/// positions (UTF-8 byte length for text, always one for slices).
pub trait Source {
    /// Type of the elements that terminal parsers inspect.
    type Element: Clone;

    /// Returns the end position of the source.
    fn end_position(&self) -> Position;

    /// Returns the element starting at `position` together with its width,
    /// or `None` at (or beyond) the end of the source.
    fn element_at(&self, position: Position) -> Option<(Self::Element, usize)>;
}

impl Source for str {
    type Element = char;

    fn end_position(&self) -> Position {
        Position::new(self.len())
    }

    fn element_at(&self, position: Position) -> Option<(char, usize)> {
        let c = self.get(position.get()..)?.chars().next()?;
        Some((c, c.len_utf8()))
    }
}

impl<T: Clone> Source for [T] {
    type Element = T;

    fn end_position(&self) -> Position {
        Position::new(self.len())
    }

    fn element_at(&self, position: Position) -> Option<(T, usize)> {
        self.get(position.get()).map(|t| (t.clone(), 1))
    }
}
