use crate::{Position, Span};

/// A tagged portion of the source recognized by a `tag`ged expression.
///
/// The children are the matches recorded while the tagged expression was being parsed,
/// in source order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Span)]
pub struct Match<Id> {
    id: Id,
    start: Position,
    end: Position,
    children: Vec<Match<Id>>,
}

impl<Id> Match<Id> {
    pub fn new(id: Id, start: Position, end: Position, children: Vec<Match<Id>>) -> Self {
        Self {
            id,
            start,
            end,
            children,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn children(&self) -> &[Match<Id>] {
        &self.children
    }

    pub fn into_children(self) -> Vec<Match<Id>> {
        self.children
    }

    /// Returns the first descendant (including `self`) with the given id, in pre-order.
    pub fn find(&self, id: &Id) -> Option<&Match<Id>>
    where
        Id: PartialEq,
    {
        if &self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Returns the number of matches in this tree.
    pub fn count(&self) -> usize {
        1 + self.children.iter().map(Match::count).sum::<usize>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: u8, start: usize, end: usize) -> Match<u8> {
        Match::new(id, Position::new(start), Position::new(end), Vec::new())
    }

    #[test]
    fn find_descends_in_pre_order() {
        let m = Match::new(
            0,
            Position::new(0),
            Position::new(5),
            vec![leaf(1, 0, 1), Match::new(2, Position::new(2), Position::new(5), vec![leaf(1, 4, 5)])],
        );
        assert_eq!(m.find(&1).map(|m| m.start_position()), Some(Position::new(0)));
        assert_eq!(m.find(&2).map(|m| m.len()), Some(3));
        assert!(m.find(&7).is_none());
        assert_eq!(m.count(), 4);
        assert_eq!(m.text("abcde"), "abcde");
    }
}
