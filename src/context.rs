use crate::rule::{Grammar, RuleFrame, RuleId, RuleMode};
use crate::{Match, Position, Source, Span};
use std::ops::Range;

/// Reason why an expression did not match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseError {
    /// Ordinary mismatch; the caller may backtrack and try something else.
    Mismatch,

    /// The rule was re-entered at the position it is already being parsed at.
    ///
    /// This never escapes the rule that owns the cycle.
    LeftRecursion(RuleId),
}

pub type ParseResult<T = ()> = Result<T, ParseError>;

/// A diagnostic recorded by an error-recovery expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Span)]
pub struct SyntaxError<Id> {
    id: Id,
    position: Position,
    #[span]
    skipped: Range<Position>,
}

impl<Id> SyntaxError<Id> {
    /// `skipped` runs from where the failed grammar started to where parsing resumed.
    pub fn new(id: Id, position: Position, skipped: Range<Position>) -> Self {
        let skipped = skipped.start..std::cmp::max(skipped.start, skipped.end);
        Self {
            id,
            position,
            skipped,
        }
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Furthest position reached by the failed grammar.
    pub fn position(&self) -> Position {
        self.position
    }

    /// The input discarded before parsing resumed.
    pub fn skipped(&self) -> Range<Position> {
        self.skipped.clone()
    }
}

/// A snapshot of a [`ParseContext`], see [`ParseContext::save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct State {
    position: Position,
    match_count: usize,
    error_count: usize,
}

impl State {
    pub fn position(&self) -> Position {
        self.position
    }

    pub fn match_count(&self) -> usize {
        self.match_count
    }

    pub fn error_count(&self) -> usize {
        self.error_count
    }
}

/// The mutable state threaded through every expression during a single parse.
pub struct ParseContext<'a, S: ?Sized, Id> {
    grammar: &'a Grammar<S, Id>,
    source: &'a S,
    position: Position,
    furthest: Position,
    matches: Vec<Match<Id>>,
    errors: Vec<SyntaxError<Id>>,
    rule_frames: Vec<Vec<RuleFrame<Id>>>,
}

impl<'a, S: Source + ?Sized, Id> ParseContext<'a, S, Id> {
    pub fn new(grammar: &'a Grammar<S, Id>, source: &'a S) -> Self {
        Self {
            grammar,
            source,
            position: Position::default(),
            furthest: Position::default(),
            matches: Vec::new(),
            errors: Vec::new(),
            rule_frames: std::iter::repeat_with(Vec::new)
                .take(grammar.len())
                .collect(),
        }
    }

    pub fn grammar(&self) -> &'a Grammar<S, Id> {
        self.grammar
    }

    pub fn source(&self) -> &'a S {
        self.source
    }

    pub fn current_position(&self) -> Position {
        self.position
    }

    pub fn set_current_position(&mut self, position: Position) {
        self.position = std::cmp::min(self.source.end_position(), position);
    }

    /// Returns the rightmost position ever reached by [`ParseContext::advance`],
    /// regardless of later backtracking.
    pub fn furthest_position(&self) -> Position {
        self.furthest
    }

    pub fn end_position(&self) -> Position {
        self.source.end_position()
    }

    pub fn is_valid(&self) -> bool {
        self.position < self.source.end_position()
    }

    pub fn is_end(&self) -> bool {
        !self.is_valid()
    }

    pub fn peek(&self) -> Option<S::Element> {
        self.source.element_at(self.position).map(|(e, _)| e)
    }

    /// Returns the element `n` elements ahead of the current one, without consuming anything.
    pub fn peek_nth(&self, n: usize) -> Option<S::Element> {
        let mut position = self.position;
        for _ in 0..n {
            let (_, width) = self.source.element_at(position)?;
            position = Position::new(position.get() + width);
        }
        self.source.element_at(position).map(|(e, _)| e)
    }

    pub fn read(&mut self) -> Option<S::Element> {
        let element = self.peek()?;
        self.advance(1);
        Some(element)
    }

    /// Consumes up to `n` elements, returning the positions before and after.
    pub fn advance(&mut self, n: usize) -> (Position, Position) {
        let before = self.position;
        for _ in 0..n {
            let Some((_, width)) = self.source.element_at(self.position) else {
                break;
            };
            self.position = Position::new(self.position.get() + width);
        }
        if self.position > self.furthest {
            self.furthest = self.position;
        }
        (before, self.position)
    }

    pub fn save(&self) -> State {
        State {
            position: self.position,
            match_count: self.matches.len(),
            error_count: self.errors.len(),
        }
    }

    /// Rewinds to `state`, dropping every match and error recorded after it was saved.
    pub fn restore(&mut self, state: State) {
        self.position = state.position;
        self.matches.truncate(state.match_count);
        self.errors.truncate(state.error_count);
    }

    /// Runs `f`, restoring the current state if it fails.
    pub fn attempt<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let state = self.save();
        let result = f(self);
        if result.is_err() {
            self.restore(state);
        }
        result
    }

    /// Runs `f` and always restores the current state afterwards.
    pub fn lookahead<T>(&mut self, f: impl FnOnce(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        let state = self.save();
        let result = f(self);
        self.restore(state);
        result
    }

    pub fn matches(&self) -> &[Match<Id>] {
        &self.matches
    }

    pub fn errors(&self) -> &[SyntaxError<Id>] {
        &self.errors
    }

    /// Pops the last `child_count` matches and appends a new match that owns them as children.
    ///
    /// A `child_count` larger than the number of recorded matches takes all of them.
    pub fn add_match(&mut self, id: Id, start: Position, end: Position, child_count: usize) {
        let child_count = std::cmp::min(child_count, self.matches.len());
        let children = self.matches.split_off(self.matches.len() - child_count);
        self.matches.push(Match::new(id, start, end, children));
    }

    pub fn add_error(&mut self, id: Id, position: Position, skipped: Range<Position>) {
        self.errors.push(SyntaxError::new(id, position, skipped));
    }

    pub(crate) fn into_parts(self) -> (Vec<Match<Id>>, Vec<SyntaxError<Id>>) {
        (self.matches, self.errors)
    }

    /// Resets the furthest position to the current one and returns the previous value.
    pub(crate) fn reset_furthest(&mut self) -> Position {
        std::mem::replace(&mut self.furthest, self.position)
    }

    pub(crate) fn merge_furthest(&mut self, furthest: Position) {
        self.furthest = std::cmp::max(self.furthest, furthest);
    }

    pub(crate) fn rule_frame(&self, rule: RuleId) -> Option<&RuleFrame<Id>> {
        self.rule_frames.get(rule.index())?.last()
    }

    /// Returns `false` if `rule` does not belong to this context's grammar.
    pub(crate) fn push_rule_frame(&mut self, rule: RuleId, position: Position) -> bool {
        match self.rule_frames.get_mut(rule.index()) {
            Some(frames) => {
                frames.push(RuleFrame::new(position));
                true
            }
            None => false,
        }
    }

    pub(crate) fn pop_rule_frame(&mut self, rule: RuleId) {
        if let Some(frames) = self.rule_frames.get_mut(rule.index()) {
            frames.pop();
        }
    }

    pub(crate) fn set_rule_mode(&mut self, rule: RuleId, mode: RuleMode<Id>) {
        if let Some(frame) = self
            .rule_frames
            .get_mut(rule.index())
            .and_then(|frames| frames.last_mut())
        {
            frame.mode = mode;
        }
    }

    /// Removes and returns everything recorded since `state` was saved.
    pub(crate) fn take_since(&mut self, state: State) -> (Vec<Match<Id>>, Vec<SyntaxError<Id>>) {
        let matches = self.matches.split_off(state.match_count);
        let errors = self.errors.split_off(state.error_count);
        (matches, errors)
    }

    /// Re-applies a previously accepted result: jumps to `end` and re-appends its records.
    pub(crate) fn replay(
        &mut self,
        end: Position,
        matches: &[Match<Id>],
        errors: &[SyntaxError<Id>],
    ) where
        Id: Clone,
    {
        self.position = end;
        self.merge_furthest(end);
        self.matches.extend_from_slice(matches);
        self.errors.extend_from_slice(errors);
    }
}

impl<'a, S: ?Sized, Id> std::fmt::Debug for ParseContext<'a, S, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParseContext")
            .field("position", &self.position)
            .field("furthest", &self.furthest)
            .field("matches", &self.matches.len())
            .field("errors", &self.errors.len())
            .finish()
    }
}

impl<'a, Id> ParseContext<'a, str, Id> {
    pub fn remaining_text(&self) -> &'a str {
        &self.source[self.position.get()..]
    }
}
