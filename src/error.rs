use crate::Position;
use thiserror::Error;

/// Errors reported by the [`Grammar`](crate::Grammar) entry points.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("rule `{name}` is declared but never defined")]
    UndefinedRule { name: String },

    #[error("rule `{name}` is already defined")]
    RedefinedRule { name: String },

    #[error("parse stopped at {position} (furthest position reached: {furthest})")]
    Incomplete { position: Position, furthest: Position },

    #[error("{count} syntax error(s), the first at {position}")]
    Syntax { count: usize, position: Position },
}

impl Error {
    /// Returns the source position this error refers to, if any.
    pub fn position(&self) -> Option<Position> {
        match self {
            Self::Incomplete { furthest, .. } => Some(*furthest),
            Self::Syntax { position, .. } => Some(*position),
            Self::UndefinedRule { .. } | Self::RedefinedRule { .. } => None,
        }
    }
}
