//! Report-and-skip error recovery.
use crate::{Expr, Parse, ParseContext, ParseError, ParseResult, Source};
use log::debug;

/// See [`Expr::on_error`].
#[derive(Debug)]
pub struct OnError<S: ?Sized, Id> {
    expr: Expr<S, Id>,
    id: Id,
    fallback: Expr<S, Id>,
}

impl<S: ?Sized, Id> OnError<S, Id> {
    pub fn new(expr: Expr<S, Id>, id: Id, fallback: Expr<S, Id>) -> Self {
        Self { expr, id, fallback }
    }
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for OnError<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        if ctx.is_end() {
            return self.expr.parse(ctx);
        }

        // The error is reported at the furthest point the primary grammar reached,
        // measured from here rather than from anything parsed before.
        let state = ctx.save();
        let outer_furthest = ctx.reset_furthest();
        let result = self.expr.parse(ctx);
        let error_position = ctx.furthest_position();
        ctx.merge_furthest(outer_furthest);
        if !matches!(result, Err(ParseError::Mismatch)) {
            return result;
        }

        // The fallback scans from where the primary started, so a primary that read past
        // the synchronization point cannot make the fallback skip it.
        ctx.restore(state);
        match self.fallback.parse(ctx) {
            Ok(()) => {
                let resume = ctx.current_position();
                debug!("syntax error at {error_position}, resuming at {resume}");
                ctx.add_error(self.id.clone(), error_position, state.position()..resume);
                Ok(())
            }
            Err(e) => {
                ctx.restore(state);
                Err(e)
            }
        }
    }
}

/// See [`skip_before`].
#[derive(Debug)]
pub struct SkipBefore<S: ?Sized, Id> {
    token: Expr<S, Id>,
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for SkipBefore<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        skip_until(&self.token, ctx, false)
    }
}

/// See [`skip_after`].
#[derive(Debug)]
pub struct SkipAfter<S: ?Sized, Id> {
    token: Expr<S, Id>,
}

impl<S: Source + ?Sized, Id: Clone> Parse<S, Id> for SkipAfter<S, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        skip_until(&self.token, ctx, true)
    }
}

fn skip_until<S, Id>(
    token: &Expr<S, Id>,
    ctx: &mut ParseContext<'_, S, Id>,
    consume_token: bool,
) -> ParseResult
where
    S: Source + ?Sized,
    Id: Clone,
{
    while !ctx.is_end() {
        let state = ctx.save();
        match token.parse(ctx) {
            Ok(()) => {
                let after = ctx.current_position();
                ctx.restore(state);
                if consume_token {
                    ctx.set_current_position(after);
                }
                return Ok(());
            }
            Err(ParseError::Mismatch) => {
                ctx.advance(1);
            }
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// Skips elements until `token` matches, stopping just before it (or at the end of input).
pub fn skip_before<S, Id>(token: impl Into<Expr<S, Id>>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    Expr::new(SkipBefore {
        token: token.into(),
    })
}

/// Skips elements until `token` matches, stopping just after it (or at the end of input).
///
/// Matches recorded by `token` itself are discarded.
pub fn skip_after<S, Id>(token: impl Into<Expr<S, Id>>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    Expr::new(SkipAfter {
        token: token.into(),
    })
}

pub fn on_error<S, Id>(
    expr: impl Into<Expr<S, Id>>,
    id: Id,
    fallback: impl Into<Expr<S, Id>>,
) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    expr.into().on_error(id, fallback)
}
