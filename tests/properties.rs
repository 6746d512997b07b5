//! Property-based tests for the parsing engine.
//!
//! - A failed expression leaves the context exactly as it found it.
//! - Loops terminate, even over expressions that can succeed without consuming input.
//! - Left-recursive rules accept any chain of operands and nest it to the left.

use pegparse::{
    digit, function, logical_and, logical_not, one_or_more, optional, zero_or_more, Expr,
    Grammar, Parse, ParseContext, ParseError, Position, Rule,
};
use proptest::prelude::*;

type Id = &'static str;

fn sum_grammar() -> (Grammar<str, Id>, Rule<str, Id>) {
    let mut g = Grammar::new();
    let sum = g.rule("sum");
    let num = one_or_more(digit()).tag("num");
    let group = g.rule("group");
    g.define(sum, (sum >> '+' >> group).tag("add") | group)
        .expect("sum is defined once");
    g.define(group, ('(' >> sum >> ')') | num)
        .expect("group is defined once");
    (g, sum)
}

fn tagged(c: char) -> Expr<str, Id> {
    Expr::from(c).tag("c")
}

// Reads one element, records it, and then fails unless an `x` follows.
fn advance_then_check() -> Expr<str, Id> {
    function(|ctx: &mut ParseContext<'_, str, Id>| {
        let (start, end) = ctx.advance(1);
        ctx.add_match("read", start, end, 0);
        match ctx.peek() {
            Some('x') => Ok(()),
            _ => Err(ParseError::Mismatch),
        }
    })
}

fn expressions(sum: Rule<str, Id>) -> Vec<Expr<str, Id>> {
    vec![
        (Expr::from('a') >> 'b' >> 'c').tag("abc"),
        (tagged('a') >> 'b') | (tagged('a') >> 'c'),
        one_or_more(Expr::from("ab").tag("ab")) >> 'x',
        sum.tag("wrapped") >> ';',
        Expr::from('(') - "((",
        (tagged('a') * 2) >> 'b',
        optional(tagged('a')) >> 'b',
        logical_and(tagged('a') >> 'b') >> 'a' >> 'c',
        logical_not(tagged('a') >> 'c') >> tagged('a') >> 'b',
        (tagged('a') >> 'b').on_error("recovered", tagged('c') >> 'x'),
        (sum >> ';').on_error("recovered", tagged('(') >> '+'),
        advance_then_check() >> 'x',
        -advance_then_check() >> 'b',
    ]
}

proptest! {
    #[test]
    fn failure_restores_context(text in "[abcx()+1;]{0,12}", offset in 0usize..13) {
        let (grammar, sum) = sum_grammar();
        for expr in expressions(sum) {
            let mut ctx = ParseContext::new(&grammar, text.as_str());
            ctx.set_current_position(Position::new(offset));
            let before = ctx.save();
            if expr.parse(&mut ctx).is_err() {
                prop_assert_eq!(ctx.save(), before);
            } else {
                prop_assert!(ctx.current_position() >= before.position());
            }
        }
    }

    #[test]
    fn loops_terminate(text in "[ab ]{0,20}") {
        let grammar = Grammar::<str, Id>::new();
        let expr = zero_or_more(optional('a') | logical_and('b'));
        let mut ctx = ParseContext::new(&grammar, text.as_str());
        prop_assert!(expr.parse(&mut ctx).is_ok());
        let leading_a = text.chars().take_while(|c| *c == 'a').count();
        prop_assert_eq!(ctx.current_position().get(), leading_a);
    }

    #[test]
    fn sums_nest_to_the_left(operands in prop::collection::vec(0u32..1000, 1..30)) {
        let (grammar, sum) = sum_grammar();
        let text = operands.iter().map(u32::to_string).collect::<Vec<_>>().join("+");
        let outcome = grammar.parse(text.as_str(), sum).expect("grammar is complete");
        prop_assert!(outcome.success);
        prop_assert_eq!(outcome.matches.len(), 1);

        let mut depth = 0;
        let mut node = &outcome.matches[0];
        while *node.id() == "add" {
            depth += 1;
            node = &node.children()[0];
        }
        prop_assert_eq!(depth, operands.len() - 1);
        prop_assert_eq!(outcome.matches[0].count(), 2 * operands.len() - 1);
    }

    #[test]
    fn furthest_position_is_never_behind(text in "[0-9+()]{0,16}") {
        let (grammar, sum) = sum_grammar();
        let outcome = grammar.parse(text.as_str(), sum).expect("grammar is complete");
        prop_assert!(outcome.furthest_position >= outcome.stop_position);
        prop_assert!(outcome.stop_position.get() <= text.len());
    }
}
