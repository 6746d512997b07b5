//! Two-stage parsing: a text grammar produces tokens, and a second grammar parses the tokens.
use crate::components::predicate;
use crate::{Error, Expr, Grammar, Position, Span, SyntaxError};
use log::debug;
use std::ops::Range;

/// A token recognized by the first stage, positioned in the source text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Span)]
pub struct Token<Id> {
    id: Id,
    start: Position,
    end: Position,
}

impl<Id> Token<Id> {
    pub fn new(id: Id, start: Position, end: Position) -> Self {
        Self { id, start, end }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    pub fn is(&self, id: &Id) -> bool
    where
        Id: PartialEq,
    {
        &self.id == id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tokenized<Id> {
    pub success: bool,
    pub tokens: Vec<Token<Id>>,
    pub stop_position: Position,
    pub errors: Vec<SyntaxError<Id>>,
}

/// Runs `grammar` over `text` and turns each top-level match into a [`Token`].
///
/// Nested matches are not turned into tokens.
pub fn tokenize<Id: Clone>(
    grammar: &Grammar<str, Id>,
    text: &str,
    start: impl Into<Expr<str, Id>>,
) -> Result<Tokenized<Id>, Error> {
    let outcome = grammar.parse(text, start)?;
    let tokens: Vec<_> = outcome
        .matches
        .iter()
        .map(|m| Token::new(m.id().clone(), m.start_position(), m.end_position()))
        .collect();
    debug!(
        "tokenize: {} tokens, success={}, stop={}",
        tokens.len(),
        outcome.success,
        outcome.stop_position
    );
    Ok(Tokenized {
        success: outcome.success,
        tokens,
        stop_position: outcome.stop_position,
        errors: outcome.errors,
    })
}

/// Matches a single token with the given id.
pub fn token<TokenId, Id>(id: TokenId) -> Expr<[Token<TokenId>], Id>
where
    TokenId: Clone + PartialEq + 'static,
    Id: 'static,
{
    predicate(move |t: &Token<TokenId>| t.is(&id))
}

/// Maps a span over a token slice (e.g. a second-stage match) back to the text it covers.
pub fn text_span<Id>(tokens: &[Token<Id>], span: &impl Span) -> Range<Position> {
    let start_index = span.start_position().get();
    let start = match tokens.get(start_index) {
        Some(t) => t.start,
        None => tokens.last().map_or(Position::default(), |t| t.end),
    };
    if span.is_empty() {
        return start..start;
    }
    let end = tokens
        .get(span.end_position().get() - 1)
        .map_or(start, |t| t.end);
    start..end
}
