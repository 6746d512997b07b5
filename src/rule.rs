//! Named, possibly self-referential grammar slots.
//!
//! Rules live in a [`Grammar`] arena and are addressed by index, so a rule that refers to itself
//! (directly or through other rules) forms an index cycle rather than an ownership cycle.
//!
//! Left recursion (`add = add '+' mul | mul`) is resolved by seed-and-grow:
//!
//! 1. A rule re-entered at the position it is already being parsed at fails with
//!    [`ParseError::LeftRecursion`], which unwinds to the rule that owns the cycle.
//! 2. The owner re-parses its expression with the recursive reference failing plainly,
//!    so that a non-recursive alternative provides the seed.
//! 3. It then re-parses repeatedly, resolving the recursive reference to the previously
//!    accepted result, for as long as each iteration consumes more input.
use crate::ast::{AstNode, DefaultFactory};
use crate::{
    Error, Expr, Match, Parse, ParseContext, ParseError, ParseResult, Position, Source,
    SyntaxError,
};
use log::{debug, trace};
use std::marker::PhantomData;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    pub const fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a rule declared in a [`Grammar`].
pub struct Rule<S: ?Sized, Id> {
    id: RuleId,
    _grammar: PhantomData<fn(&S) -> Id>,
}

impl<S: ?Sized, Id> Rule<S, Id> {
    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn expr(self) -> Expr<S, Id> {
        self.into()
    }

    pub fn tag(self, id: Id) -> Expr<S, Id>
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        self.expr().tag(id)
    }

    pub fn zero_or_more(self) -> Expr<S, Id>
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        self.expr().zero_or_more()
    }

    pub fn one_or_more(self) -> Expr<S, Id>
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        self.expr().one_or_more()
    }

    pub fn on_error(self, id: Id, fallback: impl Into<Expr<S, Id>>) -> Expr<S, Id>
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        self.expr().on_error(id, fallback)
    }
}

impl<S: ?Sized, Id> Clone for Rule<S, Id> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S: ?Sized, Id> Copy for Rule<S, Id> {}

impl<S: ?Sized, Id> std::fmt::Debug for Rule<S, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Rule").field(&self.id).finish()
    }
}

struct RuleDefinition<S: ?Sized, Id> {
    name: String,
    expr: Option<Expr<S, Id>>,
}

/// An owned set of rules.
pub struct Grammar<S: ?Sized, Id> {
    rules: Vec<RuleDefinition<S, Id>>,
}

impl<S: ?Sized, Id> Default for Grammar<S, Id> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<S: ?Sized, Id> std::fmt::Debug for Grammar<S, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries(self.rules.iter().map(|r| &r.name))
            .finish()
    }
}

impl<S: ?Sized, Id> Grammar<S, Id> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Declares a rule whose expression is given later by [`Grammar::define`].
    pub fn rule(&mut self, name: impl Into<String>) -> Rule<S, Id> {
        let id = RuleId(self.rules.len());
        self.rules.push(RuleDefinition {
            name: name.into(),
            expr: None,
        });
        Rule {
            id,
            _grammar: PhantomData,
        }
    }

    pub fn define(&mut self, rule: Rule<S, Id>, expr: impl Into<Expr<S, Id>>) -> Result<(), Error> {
        let Some(definition) = self.rules.get_mut(rule.id.0) else {
            return Err(Error::UndefinedRule {
                name: rule.id.to_string(),
            });
        };
        if definition.expr.is_some() {
            return Err(Error::RedefinedRule {
                name: definition.name.clone(),
            });
        }
        definition.expr = Some(expr.into());
        Ok(())
    }

    /// Declares and defines a non-recursive rule in one step.
    pub fn define_rule(
        &mut self,
        name: impl Into<String>,
        expr: impl Into<Expr<S, Id>>,
    ) -> Rule<S, Id> {
        let rule = self.rule(name);
        self.rules[rule.id.0].expr = Some(expr.into());
        rule
    }

    pub fn name(&self, rule: RuleId) -> &str {
        self.rules.get(rule.0).map_or("<unknown>", |r| r.name.as_str())
    }

    pub fn validate(&self) -> Result<(), Error> {
        match self.rules.iter().find(|r| r.expr.is_none()) {
            Some(r) => Err(Error::UndefinedRule {
                name: r.name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn expr(&self, rule: RuleId) -> Option<&Expr<S, Id>> {
        self.rules.get(rule.0)?.expr.as_ref()
    }
}

impl<S: Source + ?Sized, Id: Clone> Grammar<S, Id> {
    /// Parses `source` starting from `start`; success requires all input to be consumed.
    pub fn parse(
        &self,
        source: &S,
        start: impl Into<Expr<S, Id>>,
    ) -> Result<ParseOutcome<Id>, Error> {
        self.parse_with(source, start, &ParseOptions::default())
    }

    pub fn parse_with(
        &self,
        source: &S,
        start: impl Into<Expr<S, Id>>,
        options: &ParseOptions,
    ) -> Result<ParseOutcome<Id>, Error> {
        self.validate()?;
        let start = start.into();
        let mut ctx = ParseContext::new(self, source);
        debug!("parse start: rules={}, end={}", self.len(), ctx.end_position());
        let result = start.parse(&mut ctx);
        debug_assert!(
            !matches!(result, Err(ParseError::LeftRecursion(_))),
            "left recursion signal escaped its rule"
        );
        let success = result.is_ok() && (!options.require_end || ctx.is_end());
        let stop_position = ctx.current_position();
        let furthest_position = ctx.furthest_position();
        let (matches, errors) = ctx.into_parts();
        debug!(
            "parse finished: success={success}, stop={stop_position}, furthest={furthest_position}, matches={}, errors={}",
            matches.len(),
            errors.len()
        );
        Ok(ParseOutcome {
            success,
            matches,
            stop_position,
            furthest_position,
            errors,
        })
    }

    /// Like [`Grammar::parse`] but treats an incomplete parse or any recorded syntax error as an error.
    pub fn parse_complete(
        &self,
        source: &S,
        start: impl Into<Expr<S, Id>>,
    ) -> Result<Vec<Match<Id>>, Error> {
        let outcome = self.parse(source, start)?;
        if let Some(first) = outcome.errors.first() {
            return Err(Error::Syntax {
                count: outcome.errors.len(),
                position: first.position(),
            });
        }
        if !outcome.success {
            return Err(Error::Incomplete {
                position: outcome.stop_position,
                furthest: outcome.furthest_position,
            });
        }
        Ok(outcome.matches)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Whether a successful parse must also consume the whole source.
    pub require_end: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self { require_end: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOutcome<Id> {
    pub success: bool,
    pub matches: Vec<Match<Id>>,
    pub stop_position: Position,
    pub furthest_position: Position,
    pub errors: Vec<SyntaxError<Id>>,
}

impl<Id> ParseOutcome<Id> {
    /// Successful, and no syntax errors were recorded along the way.
    pub fn is_clean(&self) -> bool {
        self.success && self.errors.is_empty()
    }

    /// Builds a generic AST from the matches.
    pub fn ast(&self) -> Vec<std::rc::Rc<AstNode<Id>>>
    where
        Id: Clone,
    {
        match crate::ast::build(&self.matches, &mut DefaultFactory) {
            Ok(nodes) => nodes,
            Err(never) => match never {},
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) enum RuleMode<Id> {
    Normal,
    Seed,
    Grow {
        end: Position,
        matches: Vec<Match<Id>>,
        errors: Vec<SyntaxError<Id>>,
    },
}

/// One active invocation of a rule on the current call path.
#[derive(Debug, Clone)]
pub(crate) struct RuleFrame<Id> {
    pub(crate) position: Position,
    pub(crate) mode: RuleMode<Id>,
}

impl<Id> RuleFrame<Id> {
    pub(crate) fn new(position: Position) -> Self {
        Self {
            position,
            mode: RuleMode::Normal,
        }
    }
}

pub(crate) fn parse_rule<S, Id>(rule: RuleId, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult
where
    S: Source + ?Sized,
    Id: Clone,
{
    let grammar = ctx.grammar();
    let Some(expr) = grammar.expr(rule) else {
        return Err(ParseError::Mismatch);
    };
    let position = ctx.current_position();

    if let Some(frame) = ctx.rule_frame(rule).filter(|f| f.position == position) {
        return match &frame.mode {
            RuleMode::Normal => {
                trace!("left recursion: `{}` at {position}", grammar.name(rule));
                Err(ParseError::LeftRecursion(rule))
            }
            RuleMode::Seed => Err(ParseError::Mismatch),
            RuleMode::Grow {
                end,
                matches,
                errors,
            } => {
                let (end, matches, errors) = (*end, matches.clone(), errors.clone());
                ctx.replay(end, &matches, &errors);
                Ok(())
            }
        };
    }

    if !ctx.push_rule_frame(rule, position) {
        return Err(ParseError::Mismatch);
    }
    trace!("enter `{}` at {position}", grammar.name(rule));
    let result = match expr.parse(ctx) {
        Err(ParseError::LeftRecursion(cycle)) if cycle == rule => grow(rule, expr, position, ctx),
        result => result,
    };
    ctx.pop_rule_frame(rule);
    trace!("leave `{}` at {position}: {result:?}", grammar.name(rule));
    result
}

fn grow<S, Id>(
    rule: RuleId,
    expr: &Expr<S, Id>,
    position: Position,
    ctx: &mut ParseContext<'_, S, Id>,
) -> ParseResult
where
    S: Source + ?Sized,
    Id: Clone,
{
    let name = ctx.grammar().name(rule);
    let start = ctx.save();
    debug_assert_eq!(start.position(), position);

    ctx.set_rule_mode(rule, RuleMode::Seed);
    expr.parse(ctx)?;

    let mut iteration = 0;
    loop {
        let end = ctx.current_position();
        let (matches, errors) = ctx.take_since(start);
        if end >= ctx.end_position() {
            ctx.replay(end, &matches, &errors);
            break;
        }

        iteration += 1;
        trace!("grow `{name}` from {position}: iteration {iteration}, accepted up to {end}");
        ctx.restore(start);
        ctx.set_rule_mode(
            rule,
            RuleMode::Grow {
                end,
                matches: matches.clone(),
                errors: errors.clone(),
            },
        );
        match expr.parse(ctx) {
            Ok(()) if ctx.current_position() > end => {}
            Ok(()) | Err(ParseError::Mismatch) => {
                ctx.restore(start);
                ctx.replay(end, &matches, &errors);
                break;
            }
            Err(e) => {
                ctx.restore(start);
                return Err(e);
            }
        }
    }
    trace!(
        "grow `{name}` from {position}: fixpoint at {}",
        ctx.current_position()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{digit, one_or_more};
    use crate::Span;
    use pretty_assertions::assert_eq;

    #[test]
    fn undefined_rule_is_reported() {
        let mut grammar = Grammar::<str, u8>::new();
        let a = grammar.rule("a");
        let _b = grammar.rule("b");
        grammar.define(a, 'x').unwrap();
        assert_eq!(
            grammar.parse("x", a).unwrap_err(),
            Error::UndefinedRule {
                name: "b".to_owned()
            }
        );
    }

    #[test]
    fn redefinition_is_rejected() {
        let mut grammar = Grammar::<str, u8>::new();
        let a = grammar.rule("a");
        grammar.define(a, 'x').unwrap();
        assert_eq!(
            grammar.define(a, 'y').unwrap_err(),
            Error::RedefinedRule {
                name: "a".to_owned()
            }
        );
    }

    #[test]
    fn ordinary_recursion() {
        // nested = '(' nested ')' | 'x'
        let mut grammar = Grammar::<str, u8>::new();
        let nested = grammar.rule("nested");
        grammar
            .define(nested, ('(' >> nested >> ')' | 'x').tag(1))
            .unwrap();
        let outcome = grammar.parse("((x))", nested).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].count(), 3);
    }

    #[test]
    fn direct_left_recursion_is_left_associative() {
        // list = list ',' num | num
        let mut grammar = Grammar::<str, &'static str>::new();
        let num = grammar.define_rule("num", one_or_more(digit()).tag("num"));
        let list = grammar.rule("list");
        grammar
            .define(list, (list >> ',' >> num).tag("list") | num)
            .unwrap();
        let outcome = grammar.parse("1,22,3", list).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.matches.len(), 1);

        let outer = &outcome.matches[0];
        assert_eq!(*outer.id(), "list");
        assert_eq!(outer.text("1,22,3"), "1,22,3");
        let inner = &outer.children()[0];
        assert_eq!(*inner.id(), "list");
        assert_eq!(inner.text("1,22,3"), "1,22");
        assert_eq!(*inner.children()[0].id(), "num");
        assert_eq!(outer.children()[1].text("1,22,3"), "3");
    }

    #[test]
    fn indirect_left_recursion() {
        // a = b 'x' | 'a' ; b = a 'y' | 'b'
        let mut grammar = Grammar::<str, u8>::new();
        let a = grammar.rule("a");
        let b = grammar.rule("b");
        grammar.define(a, (b >> 'x').tag(1) | 'a').unwrap();
        grammar.define(b, (a >> 'y').tag(2) | 'b').unwrap();

        let outcome = grammar.parse("bxyx", a).unwrap();
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.matches.len(), 1);
        // (((b) x) y) x
        let m = &outcome.matches[0];
        assert_eq!((*m.id(), m.len()), (1, 4));
        let m = &m.children()[0];
        assert_eq!((*m.id(), m.len()), (2, 3));
        let m = &m.children()[0];
        assert_eq!((*m.id(), m.len()), (1, 2));
        assert!(m.children().is_empty());
    }

    #[test]
    fn left_recursive_rule_without_seed_fails() {
        let mut grammar = Grammar::<str, u8>::new();
        let a = grammar.rule("a");
        grammar.define(a, a >> 'x').unwrap();
        let outcome = grammar.parse("xx", a).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.stop_position, Position::new(0));
    }

    #[test]
    fn rule_from_another_grammar_is_rejected() {
        let mut first = Grammar::<str, u8>::new();
        let _a = first.rule("a");
        let foreign = first.rule("b");
        let mut second = Grammar::<str, u8>::new();
        assert_eq!(
            second.define(foreign, 'x').unwrap_err(),
            Error::UndefinedRule {
                name: "#1".to_owned()
            }
        );
        let outcome = second.parse("x", foreign).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.stop_position, Position::new(0));
    }

    #[test]
    fn left_recursion_passes_through_optional_and_recovery() {
        // list = (list ',')? num, with a recovery around the recursive prefix whose fallback
        // never matches, so the seed pass falls through to `num` alone
        let mut grammar = Grammar::<str, &'static str>::new();
        let num = grammar.define_rule("num", one_or_more(digit()).tag("num"));
        let list = grammar.rule("list");
        let prefix = (list >> ',').on_error("prefix", '!');
        grammar.define(list, (-prefix >> num).tag("list")).unwrap();

        let text = "1,2,3";
        let outcome = grammar.parse(text, list).unwrap();
        assert!(outcome.success, "{outcome:?}");
        assert!(outcome.errors.is_empty());
        let outer = &outcome.matches[0];
        assert_eq!(outer.text(text), "1,2,3");
        let inner = &outer.children()[0];
        assert_eq!((*inner.id(), inner.text(text)), ("list", "1,2"));
        assert_eq!(inner.children()[0].text(text), "1");
    }

    #[test]
    fn left_recursion_passes_through_lookahead() {
        // e = &e e 'x' | 'y'
        let mut grammar = Grammar::<str, u8>::new();
        let e = grammar.rule("e");
        grammar
            .define(e, (e.expr().logical_and() >> e >> 'x').tag(1) | 'y')
            .unwrap();
        let outcome = grammar.parse("yx", e).unwrap();
        assert!(outcome.success, "{outcome:?}");
        assert_eq!(outcome.matches.len(), 1);
        assert_eq!(outcome.matches[0].len(), 2);
    }

    #[test]
    fn grammar_is_reusable_across_parses() {
        let mut grammar = Grammar::<str, u8>::new();
        let e = grammar.rule("e");
        grammar
            .define(e, (e >> '-' >> digit()).tag(1) | digit())
            .unwrap();
        for (text, count) in [("1-2", 1), ("1-2-3-4", 3), ("5", 0)] {
            let outcome = grammar.parse(text, e).unwrap();
            assert!(outcome.success);
            assert_eq!(outcome.matches.iter().map(Match::count).sum::<usize>(), count);
        }
    }
}
