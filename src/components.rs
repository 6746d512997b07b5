//! Primitive expressions and the combinators that compose them.
use crate::{Expr, Parse, ParseContext, ParseError, ParseResult, Position, Source};

#[derive(Debug, Clone)]
pub struct Terminal<V> {
    value: V,
}

impl<V> Terminal<V> {
    pub const fn new(value: V) -> Self {
        Self { value }
    }
}

impl<S, Id, V> Parse<S, Id> for Terminal<V>
where
    S: Source + ?Sized,
    S::Element: PartialEq<V>,
{
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        match ctx.peek() {
            Some(e) if e == self.value => {
                ctx.advance(1);
                Ok(())
            }
            _ => Err(ParseError::Mismatch),
        }
    }
}

/// Exact subsequence of elements.
#[derive(Debug, Clone)]
pub struct Literal<V> {
    values: Vec<V>,
}

impl<V> Literal<V> {
    pub fn new(values: impl IntoIterator<Item = V>) -> Self {
        Self {
            values: values.into_iter().collect(),
        }
    }
}

impl<S, Id, V> Parse<S, Id> for Literal<V>
where
    S: Source + ?Sized,
    S::Element: PartialEq<V>,
{
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        let source = ctx.source();
        let mut position = ctx.current_position();
        for value in &self.values {
            match source.element_at(position) {
                Some((e, width)) if e == *value => {
                    position = Position::new(position.get() + width);
                }
                _ => return Err(ParseError::Mismatch),
            }
        }
        ctx.advance(self.values.len());
        Ok(())
    }
}

/// Subsequence of characters compared without regard to case.
#[derive(Debug, Clone)]
pub struct CaseInsensitive {
    chars: Vec<char>,
}

impl<S, Id> Parse<S, Id> for CaseInsensitive
where
    S: Source<Element = char> + ?Sized,
{
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        let source = ctx.source();
        let mut position = ctx.current_position();
        for c in &self.chars {
            match source.element_at(position) {
                Some((e, width)) if e.to_lowercase().eq(c.to_lowercase()) => {
                    position = Position::new(position.get() + width);
                }
                _ => return Err(ParseError::Mismatch),
            }
        }
        ctx.advance(self.chars.len());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OneOf<V> {
    values: Vec<V>,
}

impl<S, Id, V> Parse<S, Id> for OneOf<V>
where
    S: Source + ?Sized,
    S::Element: PartialEq<V>,
{
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        match ctx.peek() {
            Some(e) if self.values.iter().any(|v| e == *v) => {
                ctx.advance(1);
                Ok(())
            }
            _ => Err(ParseError::Mismatch),
        }
    }
}

/// Inclusive element range.
#[derive(Debug, Clone)]
pub struct InRange<V> {
    min: V,
    max: V,
}

impl<S, Id, V> Parse<S, Id> for InRange<V>
where
    S: Source + ?Sized,
    S::Element: PartialOrd<V>,
{
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        match ctx.peek() {
            Some(e) if e >= self.min && e <= self.max => {
                ctx.advance(1);
                Ok(())
            }
            _ => Err(ParseError::Mismatch),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Predicate<F> {
    f: F,
}

impl<S, Id, F> Parse<S, Id> for Predicate<F>
where
    S: Source + ?Sized,
    F: Fn(&S::Element) -> bool,
{
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        match ctx.peek() {
            Some(e) if (self.f)(&e) => {
                ctx.advance(1);
                Ok(())
            }
            _ => Err(ParseError::Mismatch),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Any;

impl<S: Source + ?Sized, Id> Parse<S, Id> for Any {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        ctx.read().map(|_| ()).ok_or(ParseError::Mismatch)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct End;

impl<S: Source + ?Sized, Id> Parse<S, Id> for End {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        if ctx.is_end() {
            Ok(())
        } else {
            Err(ParseError::Mismatch)
        }
    }
}

/// A hand-written recognizer.
#[derive(Clone)]
pub struct Function<F> {
    f: F,
}

impl<S, Id, F> Parse<S, Id> for Function<F>
where
    S: Source + ?Sized,
    F: Fn(&mut ParseContext<'_, S, Id>) -> ParseResult,
{
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        ctx.attempt(|ctx| (self.f)(ctx))
    }
}

pub struct Sequence<S: ?Sized, Id> {
    items: Vec<Expr<S, Id>>,
}

impl<S: ?Sized, Id> Sequence<S, Id> {
    pub fn new(items: Vec<Expr<S, Id>>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Expr<S, Id>] {
        &self.items
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for Sequence<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        let state = ctx.save();
        for item in &self.items {
            if let Err(e) = item.parse(ctx) {
                ctx.restore(state);
                return Err(e);
            }
        }
        Ok(())
    }
}

/// Ordered choice: the first alternative that succeeds wins.
pub struct Choice<S: ?Sized, Id> {
    items: Vec<Expr<S, Id>>,
}

impl<S: ?Sized, Id> Choice<S, Id> {
    pub fn new(items: Vec<Expr<S, Id>>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[Expr<S, Id>] {
        &self.items
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for Choice<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        let state = ctx.save();
        for item in &self.items {
            match item.parse(ctx) {
                Ok(()) => return Ok(()),
                Err(ParseError::Mismatch) => ctx.restore(state),
                Err(e) => {
                    ctx.restore(state);
                    return Err(e);
                }
            }
        }
        Err(ParseError::Mismatch)
    }
}

// Shared loop body: stops at the first mismatch or at the first iteration that consumes nothing.
fn parse_repeatedly<S, Id>(expr: &Expr<S, Id>, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult
where
    S: Source + ?Sized,
    Id: Clone,
{
    let start = ctx.save();
    loop {
        let state = ctx.save();
        match expr.parse(ctx) {
            Ok(()) if ctx.current_position() == state.position() => return Ok(()),
            Ok(()) => {}
            Err(ParseError::Mismatch) => {
                ctx.restore(state);
                return Ok(());
            }
            Err(e) => {
                ctx.restore(start);
                return Err(e);
            }
        }
    }
}

pub struct ZeroOrMore<S: ?Sized, Id> {
    expr: Expr<S, Id>,
}

impl<S: ?Sized, Id> ZeroOrMore<S, Id> {
    pub fn new(expr: Expr<S, Id>) -> Self {
        Self { expr }
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for ZeroOrMore<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        parse_repeatedly(&self.expr, ctx)
    }
}

pub struct OneOrMore<S: ?Sized, Id> {
    expr: Expr<S, Id>,
}

impl<S: ?Sized, Id> OneOrMore<S, Id> {
    pub fn new(expr: Expr<S, Id>) -> Self {
        Self { expr }
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for OneOrMore<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        let state = ctx.save();
        ctx.attempt(|ctx| self.expr.parse(ctx))?;
        if ctx.current_position() == state.position() {
            return Ok(());
        }
        ctx.attempt(|ctx| parse_repeatedly(&self.expr, ctx)).map_err(|e| {
            ctx.restore(state);
            e
        })
    }
}

pub struct Optional<S: ?Sized, Id> {
    expr: Expr<S, Id>,
}

impl<S: ?Sized, Id> Optional<S, Id> {
    pub fn new(expr: Expr<S, Id>) -> Self {
        Self { expr }
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for Optional<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        match ctx.attempt(|ctx| self.expr.parse(ctx)) {
            Err(ParseError::Mismatch) => Ok(()),
            result => result,
        }
    }
}

/// Positive lookahead; never consumes input.
pub struct LogicalAnd<S: ?Sized, Id> {
    expr: Expr<S, Id>,
}

impl<S: ?Sized, Id> LogicalAnd<S, Id> {
    pub fn new(expr: Expr<S, Id>) -> Self {
        Self { expr }
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for LogicalAnd<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        ctx.lookahead(|ctx| self.expr.parse(ctx))
    }
}

/// Negative lookahead; never consumes input.
pub struct LogicalNot<S: ?Sized, Id> {
    expr: Expr<S, Id>,
}

impl<S: ?Sized, Id> LogicalNot<S, Id> {
    pub fn new(expr: Expr<S, Id>) -> Self {
        Self { expr }
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for LogicalNot<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        match ctx.lookahead(|ctx| self.expr.parse(ctx)) {
            Ok(()) => Err(ParseError::Mismatch),
            Err(ParseError::Mismatch) => Ok(()),
            Err(e) => Err(e),
        }
    }
}

pub struct Tag<S: ?Sized, Id> {
    expr: Expr<S, Id>,
    id: Id,
}

impl<S: ?Sized, Id> Tag<S, Id> {
    pub fn new(expr: Expr<S, Id>, id: Id) -> Self {
        Self { expr, id }
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for Tag<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        let state = ctx.save();
        ctx.attempt(|ctx| self.expr.parse(ctx))?;
        let child_count = ctx.matches().len() - state.match_count();
        let end = ctx.current_position();
        ctx.add_match(self.id.clone(), state.position(), end, child_count);
        Ok(())
    }
}

/// Exactly `times` repetitions.
pub struct Repeat<S: ?Sized, Id> {
    expr: Expr<S, Id>,
    times: usize,
}

impl<S: ?Sized, Id> Repeat<S, Id> {
    pub fn new(expr: Expr<S, Id>, times: usize) -> Self {
        Self { expr, times }
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for Repeat<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        ctx.attempt(|ctx| {
            for _ in 0..self.times {
                self.expr.parse(ctx)?;
            }
            Ok(())
        })
    }
}

pub fn terminal<S, Id, V>(value: V) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    S::Element: PartialEq<V>,
    V: 'static,
{
    Expr::new(Terminal::new(value))
}

pub fn string<S, Id>(s: &str) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    S::Element: PartialEq<char>,
{
    Expr::new(Literal::new(s.chars()))
}

/// Like [`string`], but `"<?xml"` also matches `"<?XML"`.
pub fn case_insensitive<S, Id>(s: &str) -> Expr<S, Id>
where
    S: Source<Element = char> + ?Sized + 'static,
{
    Expr::new(CaseInsensitive {
        chars: s.chars().collect(),
    })
}

pub fn sequence_of<S, Id, V>(values: impl IntoIterator<Item = V>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    S::Element: PartialEq<V>,
    V: 'static,
{
    Expr::new(Literal::new(values))
}

pub fn one_of<S, Id, V>(values: impl IntoIterator<Item = V>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    S::Element: PartialEq<V>,
    V: 'static,
{
    Expr::new(OneOf {
        values: values.into_iter().collect(),
    })
}

pub fn range<S, Id, V>(min: V, max: V) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    S::Element: PartialOrd<V>,
    V: 'static,
{
    Expr::new(InRange { min, max })
}

pub fn predicate<S, Id, F>(f: F) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    F: Fn(&S::Element) -> bool + 'static,
{
    Expr::new(Predicate { f })
}

pub fn any<S: Source + ?Sized + 'static, Id>() -> Expr<S, Id> {
    Expr::new(Any)
}

pub fn end<S: Source + ?Sized + 'static, Id>() -> Expr<S, Id> {
    Expr::new(End)
}

pub fn function<S, Id, F>(f: F) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    F: Fn(&mut ParseContext<'_, S, Id>) -> ParseResult + 'static,
{
    Expr::new(Function { f })
}

pub fn digit<S, Id>() -> Expr<S, Id>
where
    S: Source<Element = char> + ?Sized + 'static,
{
    predicate(|c: &char| c.is_ascii_digit())
}

pub fn whitespace<S, Id>() -> Expr<S, Id>
where
    S: Source<Element = char> + ?Sized + 'static,
{
    predicate(|c: &char| c.is_whitespace())
}

pub fn zero_or_more<S, Id>(expr: impl Into<Expr<S, Id>>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    expr.into().zero_or_more()
}

pub fn one_or_more<S, Id>(expr: impl Into<Expr<S, Id>>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    expr.into().one_or_more()
}

pub fn optional<S, Id>(expr: impl Into<Expr<S, Id>>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    expr.into().optional()
}

pub fn logical_and<S, Id>(expr: impl Into<Expr<S, Id>>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    expr.into().logical_and()
}

pub fn logical_not<S, Id>(expr: impl Into<Expr<S, Id>>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    expr.into().logical_not()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Grammar, Match, Span, State};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn run(expr: &Expr<str, &'static str>, text: &str) -> (ParseResult, State, Vec<Match<&'static str>>) {
        let grammar = Grammar::new();
        let mut ctx = ParseContext::new(&grammar, text);
        let result = expr.parse(&mut ctx);
        (result, ctx.save(), ctx.matches().to_vec())
    }

    fn consumed(expr: &Expr<str, &'static str>, text: &str) -> Option<usize> {
        match run(expr, text) {
            (Ok(()), state, _) => Some(state.position().get()),
            _ => None,
        }
    }

    #[rstest]
    #[case("abc", Some(3))]
    #[case("abd", None)]
    #[case("ab", None)]
    #[case("", None)]
    fn string_terminal(#[case] text: &str, #[case] expected: Option<usize>) {
        assert_eq!(consumed(&string("abc"), text), expected);
    }

    #[rstest]
    #[case("<?xml", Some(5))]
    #[case("<?XML", Some(5))]
    #[case("<?XmL version", Some(5))]
    #[case("<?xm", None)]
    #[case("<!xml", None)]
    fn case_insensitive_terminal(#[case] text: &str, #[case] expected: Option<usize>) {
        assert_eq!(consumed(&case_insensitive("<?xml"), text), expected);
    }

    #[rstest]
    #[case("+", Some(1))]
    #[case("-", Some(1))]
    #[case("*", None)]
    fn one_of_set(#[case] text: &str, #[case] expected: Option<usize>) {
        assert_eq!(consumed(&one_of("+-".chars()), text), expected);
    }

    #[test]
    fn primitives() {
        assert_eq!(consumed(&range('a', 'f'), "f"), Some(1));
        assert_eq!(consumed(&range('a', 'f'), "g"), None);
        assert_eq!(consumed(&predicate(|c: &char| c.is_uppercase()), "Éa"), Some(2));
        assert_eq!(consumed(&any(), "é"), Some(2));
        assert_eq!(consumed(&any(), ""), None);
        assert_eq!(consumed(&end(), ""), Some(0));
        assert_eq!(consumed(&end(), "x"), None);
        assert_eq!(consumed(&digit(), "7"), Some(1));
        assert_eq!(consumed(&whitespace(), "\t"), Some(1));
    }

    #[test]
    fn choice_is_ordered_not_longest() {
        let e = string("a") | string("ab");
        assert_eq!(consumed(&e, "ab"), Some(1));
        let e = string("ab") | string("a");
        assert_eq!(consumed(&e, "ab"), Some(2));
    }

    #[test]
    fn sequence_rewinds_fully() {
        let e = (terminal('a').tag("a") >> 'b').tag("ab") >> 'c';
        let (result, state, matches) = run(&e, "abx");
        assert_eq!(result, Err(ParseError::Mismatch));
        assert_eq!(state.position(), Position::new(0));
        assert!(matches.is_empty());
    }

    #[test]
    fn loops() {
        assert_eq!(consumed(&zero_or_more('a'), "aaab"), Some(3));
        assert_eq!(consumed(&zero_or_more('a'), "b"), Some(0));
        assert_eq!(consumed(&one_or_more('a'), "aab"), Some(2));
        assert_eq!(consumed(&one_or_more('a'), "b"), None);
        // a loop over an expression that can succeed without consuming still terminates
        assert_eq!(consumed(&zero_or_more(optional('a')), "aab"), Some(2));
        assert_eq!(consumed(&one_or_more(zero_or_more('x')), "ab"), Some(0));
    }

    #[test]
    fn lookahead_never_consumes() {
        assert_eq!(consumed(&logical_and('a'), "a"), Some(0));
        assert_eq!(consumed(&logical_and('a'), "b"), None);
        assert_eq!(consumed(&logical_not('a'), "b"), Some(0));
        assert_eq!(consumed(&logical_not('a'), "a"), None);
        let (_, _, matches) = run(&logical_and(terminal('a').tag("a")), "a");
        assert!(matches.is_empty());
    }

    #[test]
    fn tag_reparents_inner_matches() {
        let number = one_or_more(digit()).tag("num");
        let e = (number.clone() >> '+' >> number).tag("add");
        let (result, _, matches) = run(&e, "12+3");
        assert_eq!(result, Ok(()));
        assert_eq!(matches.len(), 1);
        let add = &matches[0];
        assert_eq!(*add.id(), "add");
        let spans: Vec<_> = add
            .children()
            .iter()
            .map(|m| (m.id().to_owned(), m.start_position().get(), m.end_position().get()))
            .collect();
        assert_eq!(spans, vec![("num", 0, 2), ("num", 3, 4)]);
    }

    #[test]
    fn function_failure_is_rewound() {
        let e: Expr<str, &'static str> = function(|ctx: &mut ParseContext<'_, str, &'static str>| {
            ctx.advance(2);
            if ctx.remaining_text().starts_with('!') {
                Ok(())
            } else {
                Err(ParseError::Mismatch)
            }
        });
        assert_eq!(consumed(&e, "ab!"), Some(2));
        let (result, state, _) = run(&e, "abc");
        assert_eq!(result, Err(ParseError::Mismatch));
        assert_eq!(state.position(), Position::new(0));
    }
}
