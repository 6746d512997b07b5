//! A PEG parser-combinator library.
//!
//! Grammars are built from [`Expr`]essions combined with operators:
//!
//! | operator   | meaning                                   |
//! |------------|-------------------------------------------|
//! | `a >> b`   | sequence                                  |
//! | `a \| b`   | ordered choice                            |
//! | `-a`       | optional                                  |
//! | `!a`       | negative lookahead                        |
//! | `a - b`    | `a`, unless `b` matches at the same place |
//! | `a * n`    | exactly `n` repetitions                   |
//!
//! Recursive (including left-recursive) grammars are written with named [`Rule`]s declared in a
//! [`Grammar`]:
//!
//! ```
//! use pegparse::{digit, one_or_more, Grammar, Span};
//!
//! let mut grammar = Grammar::<str, &str>::new();
//! let num = grammar.define_rule("num", one_or_more(digit()).tag("num"));
//! let add = grammar.rule("add");
//! grammar.define(add, (add >> '+' >> num).tag("add") | num)?;
//!
//! let outcome = grammar.parse("1+2+3", add)?;
//! assert!(outcome.success);
//! let top = &outcome.matches[0];
//! assert_eq!(top.children()[0].text("1+2+3"), "1+2");
//! # Ok::<(), pegparse::Error>(())
//! ```
//!
//! Parsing is traced through the [`log`] facade; enable it with e.g. `RUST_LOG=pegparse=trace`.
pub mod ast;
pub mod components;
mod context;
pub mod diagnostic;
mod error;
mod expr;
pub mod lexer;
mod matches;
pub mod recovery;
mod rule;
mod source;
mod span;

pub use self::ast::{AstFactory, AstNode, DefaultFactory};
pub use self::components::{
    any, case_insensitive, digit, end, function, logical_and, logical_not, one_of, one_or_more,
    optional, predicate, range, sequence_of, string, terminal, whitespace, zero_or_more,
};
pub use self::context::{ParseContext, ParseError, ParseResult, State, SyntaxError};
pub use self::diagnostic::ErrorMessageBuilder;
pub use self::error::Error;
pub use self::expr::{Expr, Parse};
pub use self::lexer::{tokenize, Token};
pub use self::matches::Match;
pub use self::recovery::{on_error, skip_after, skip_before};
pub use self::rule::{Grammar, ParseOptions, ParseOutcome, Rule, RuleId};
pub use self::source::Source;
pub use self::span::{Position, Span};
