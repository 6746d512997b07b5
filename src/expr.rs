use crate::components::{
    Choice, Literal, LogicalAnd, LogicalNot, OneOrMore, Optional, Repeat, Sequence, Tag, Terminal,
    ZeroOrMore,
};
use crate::recovery::OnError;
use crate::rule::{self, Rule, RuleId};
use crate::{ParseContext, ParseResult, Source};
use std::ops::{BitOr, Mul, Neg, Not, Shr, Sub};
use std::rc::Rc;

/// A grammar expression.
///
/// On success the context is advanced past the consumed input and the requested matches are
/// recorded. On failure the context must be left exactly as it was found.
pub trait Parse<S: ?Sized, Id> {
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult;
}

/// A type-erased, cheaply clonable grammar expression.
pub struct Expr<S: ?Sized, Id>(Inner<S, Id>);

enum Inner<S: ?Sized, Id> {
    Sequence(Rc<Sequence<S, Id>>),
    Choice(Rc<Choice<S, Id>>),
    Rule(RuleId),
    Parser(Rc<dyn Parse<S, Id>>),
}

impl<S: ?Sized, Id> Expr<S, Id> {
    pub fn new<P: Parse<S, Id> + 'static>(parser: P) -> Self {
        Self(Inner::Parser(Rc::new(parser)))
    }

    pub(crate) fn rule(id: RuleId) -> Self {
        Self(Inner::Rule(id))
    }

    pub fn zero_or_more(self) -> Self
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        Expr::new(ZeroOrMore::new(self))
    }

    pub fn one_or_more(self) -> Self
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        Expr::new(OneOrMore::new(self))
    }

    pub fn optional(self) -> Self
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        Expr::new(Optional::new(self))
    }

    pub fn logical_and(self) -> Self
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        Expr::new(LogicalAnd::new(self))
    }

    pub fn logical_not(self) -> Self
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        Expr::new(LogicalNot::new(self))
    }

    /// Records a [`Match`](crate::Match) with the given id whenever this expression succeeds.
    pub fn tag(self, id: Id) -> Self
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        Expr::new(Tag::new(self, id))
    }

    pub fn repeat(self, times: usize) -> Self
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        Expr::new(Repeat::new(self, times))
    }

    /// On failure, records a syntax error with the given id and lets `fallback` pick the resume point.
    pub fn on_error(self, id: Id, fallback: impl Into<Expr<S, Id>>) -> Self
    where
        S: Source + 'static,
        Id: Clone + 'static,
    {
        Expr::new(OnError::new(self, id, fallback.into()))
    }

    fn into_sequence_items(self) -> Vec<Self> {
        match self.0 {
            Inner::Sequence(sequence) => sequence.items().to_vec(),
            inner => vec![Self(inner)],
        }
    }

    fn into_choice_items(self) -> Vec<Self> {
        match self.0 {
            Inner::Choice(choice) => choice.items().to_vec(),
            inner => vec![Self(inner)],
        }
    }
}

impl<S: ?Sized, Id> Clone for Expr<S, Id> {
    fn clone(&self) -> Self {
        Self(match &self.0 {
            Inner::Sequence(x) => Inner::Sequence(Rc::clone(x)),
            Inner::Choice(x) => Inner::Choice(Rc::clone(x)),
            Inner::Rule(x) => Inner::Rule(*x),
            Inner::Parser(x) => Inner::Parser(Rc::clone(x)),
        })
    }
}

impl<S: ?Sized, Id> std::fmt::Debug for Expr<S, Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.0 {
            Inner::Sequence(x) => f.debug_tuple("Sequence").field(&x.items().len()).finish(),
            Inner::Choice(x) => f.debug_tuple("Choice").field(&x.items().len()).finish(),
            Inner::Rule(x) => f.debug_tuple("Rule").field(x).finish(),
            Inner::Parser(_) => f.write_str("Parser"),
        }
    }
}

impl<S, Id> Parse<S, Id> for Expr<S, Id>
where
    S: Source + ?Sized,
    Id: Clone,
{
    fn parse(&self, ctx: &mut ParseContext<'_, S, Id>) -> ParseResult {
        match &self.0 {
            Inner::Sequence(x) => x.parse(ctx),
            Inner::Choice(x) => x.parse(ctx),
            Inner::Rule(x) => rule::parse_rule(*x, ctx),
            Inner::Parser(x) => x.parse(ctx),
        }
    }
}

impl<S: ?Sized, Id> From<Rule<S, Id>> for Expr<S, Id> {
    fn from(rule: Rule<S, Id>) -> Self {
        Expr::rule(rule.id())
    }
}

impl<S, Id> From<char> for Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    S::Element: PartialEq<char>,
    Id: 'static,
{
    fn from(c: char) -> Self {
        Expr::new(Terminal::new(c))
    }
}

impl<S, Id> From<&'static str> for Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    S::Element: PartialEq<char>,
    Id: 'static,
{
    fn from(s: &'static str) -> Self {
        Expr::new(Literal::new(s.chars()))
    }
}

pub(crate) fn sequence<S: ?Sized, Id>(left: Expr<S, Id>, right: Expr<S, Id>) -> Expr<S, Id> {
    let mut items = left.into_sequence_items();
    items.extend(right.into_sequence_items());
    Expr(Inner::Sequence(Rc::new(Sequence::new(items))))
}

pub(crate) fn choice<S: ?Sized, Id>(left: Expr<S, Id>, right: Expr<S, Id>) -> Expr<S, Id> {
    let mut items = left.into_choice_items();
    items.extend(right.into_choice_items());
    Expr(Inner::Choice(Rc::new(Choice::new(items))))
}

/// `a - b` parses `a` unless `b` matches at the same position.
pub(crate) fn exclusion<S, Id>(left: Expr<S, Id>, right: Expr<S, Id>) -> Expr<S, Id>
where
    S: Source + ?Sized + 'static,
    Id: Clone + 'static,
{
    sequence(right.logical_not(), left)
}

// Operators. `Rule` handles get the same algebra through their `Expr` conversion.
macro_rules! impl_binary_operators {
    ($ty:ident) => {
        impl<S: ?Sized, Id, R: Into<Expr<S, Id>>> Shr<R> for $ty<S, Id> {
            type Output = Expr<S, Id>;

            fn shr(self, rhs: R) -> Expr<S, Id> {
                sequence(self.into(), rhs.into())
            }
        }

        impl<S: ?Sized, Id, R: Into<Expr<S, Id>>> BitOr<R> for $ty<S, Id> {
            type Output = Expr<S, Id>;

            fn bitor(self, rhs: R) -> Expr<S, Id> {
                choice(self.into(), rhs.into())
            }
        }

        impl<S, Id, R> Sub<R> for $ty<S, Id>
        where
            S: Source + ?Sized + 'static,
            Id: Clone + 'static,
            R: Into<Expr<S, Id>>,
        {
            type Output = Expr<S, Id>;

            fn sub(self, rhs: R) -> Expr<S, Id> {
                exclusion(self.into(), rhs.into())
            }
        }

        impl<S: Source + ?Sized + 'static, Id: Clone + 'static> Mul<usize> for $ty<S, Id> {
            type Output = Expr<S, Id>;

            fn mul(self, times: usize) -> Expr<S, Id> {
                Expr::from(self).repeat(times)
            }
        }

        impl<S: Source + ?Sized + 'static, Id: Clone + 'static> Neg for $ty<S, Id> {
            type Output = Expr<S, Id>;

            fn neg(self) -> Expr<S, Id> {
                Expr::from(self).optional()
            }
        }

        impl<S: Source + ?Sized + 'static, Id: Clone + 'static> Not for $ty<S, Id> {
            type Output = Expr<S, Id>;

            fn not(self) -> Expr<S, Id> {
                Expr::from(self).logical_not()
            }
        }
    };
}

impl_binary_operators!(Expr);
impl_binary_operators!(Rule);

// Literal terminals on the left-hand side, e.g. `'(' >> expr >> ')'`.
macro_rules! impl_literal_operators {
    ($lit:ty, $rhs:ident) => {
        impl<S, Id> Shr<$rhs<S, Id>> for $lit
        where
            S: Source + ?Sized + 'static,
            S::Element: PartialEq<char>,
            Id: 'static,
        {
            type Output = Expr<S, Id>;

            fn shr(self, rhs: $rhs<S, Id>) -> Expr<S, Id> {
                sequence(self.into(), rhs.into())
            }
        }

        impl<S, Id> BitOr<$rhs<S, Id>> for $lit
        where
            S: Source + ?Sized + 'static,
            S::Element: PartialEq<char>,
            Id: 'static,
        {
            type Output = Expr<S, Id>;

            fn bitor(self, rhs: $rhs<S, Id>) -> Expr<S, Id> {
                choice(self.into(), rhs.into())
            }
        }
    };
}

impl_literal_operators!(char, Expr);
impl_literal_operators!(char, Rule);
impl_literal_operators!(&'static str, Expr);
impl_literal_operators!(&'static str, Rule);
