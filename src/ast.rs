//! Conversion of a [`Match`] forest into an abstract syntax tree.
//!
//! The builder walks the matches depth-first and hands each match, together with the nodes
//! already built for its children, to an [`AstFactory`]. Parents are therefore always
//! created after all of their children.
use crate::{Match, Position, Span};
use std::cell::RefCell;
use std::convert::Infallible;
use std::fmt::Write;
use std::marker::PhantomData;
use std::ops::Range;
use std::rc::{Rc, Weak};

/// Creates one AST node per match.
pub trait AstFactory<Id> {
    type Node;
    type Error;

    /// `children` holds the nodes built for the match's children, in source order.
    fn create(
        &mut self,
        id: &Id,
        span: Range<Position>,
        children: Vec<Self::Node>,
    ) -> Result<Self::Node, Self::Error>;
}

/// Builds one root node per top-level match.
///
/// The first factory error aborts the build; nodes built so far are dropped.
pub fn build<Id, F>(matches: &[Match<Id>], factory: &mut F) -> Result<Vec<F::Node>, F::Error>
where
    F: AstFactory<Id>,
{
    enum Step<'a, Id> {
        Enter(&'a Match<Id>),
        Exit(&'a Match<Id>, usize),
    }

    let mut steps: Vec<Step<Id>> = matches.iter().rev().map(Step::Enter).collect();
    let mut nodes = Vec::new();
    while let Some(step) = steps.pop() {
        match step {
            Step::Enter(m) => {
                steps.push(Step::Exit(m, nodes.len()));
                steps.extend(m.children().iter().rev().map(Step::Enter));
            }
            Step::Exit(m, first_child) => {
                let children = nodes.split_off(first_child);
                nodes.push(factory.create(m.id(), m.range(), children)?);
            }
        }
    }
    Ok(nodes)
}

/// Like [`build`], with a closure as the factory.
pub fn build_with<Id, N, E, F>(matches: &[Match<Id>], f: F) -> Result<Vec<N>, E>
where
    F: FnMut(&Id, Range<Position>, Vec<N>) -> Result<N, E>,
{
    build(
        matches,
        &mut FnFactory {
            f,
            _node: PhantomData,
        },
    )
}

struct FnFactory<F, N, E> {
    f: F,
    _node: PhantomData<fn() -> (N, E)>,
}

impl<Id, N, E, F> AstFactory<Id> for FnFactory<F, N, E>
where
    F: FnMut(&Id, Range<Position>, Vec<N>) -> Result<N, E>,
{
    type Node = N;
    type Error = E;

    fn create(&mut self, id: &Id, span: Range<Position>, children: Vec<N>) -> Result<N, E> {
        (self.f)(id, span, children)
    }
}

/// Factory of [`AstNode`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultFactory;

impl<Id: Clone> AstFactory<Id> for DefaultFactory {
    type Node = Rc<AstNode<Id>>;
    type Error = Infallible;

    fn create(
        &mut self,
        id: &Id,
        span: Range<Position>,
        children: Vec<Self::Node>,
    ) -> Result<Self::Node, Infallible> {
        Ok(AstNode::new(id.clone(), span, children))
    }
}

/// A generic AST node that links back to its parent.
#[derive(Debug, Span)]
pub struct AstNode<Id> {
    id: Id,
    start: Position,
    end: Position,
    parent: RefCell<Weak<AstNode<Id>>>,
    children: Vec<Rc<AstNode<Id>>>,
}

impl<Id> AstNode<Id> {
    pub fn new(id: Id, span: Range<Position>, children: Vec<Rc<AstNode<Id>>>) -> Rc<Self> {
        Rc::new_cyclic(|this| {
            for child in &children {
                *child.parent.borrow_mut() = this.clone();
            }
            Self {
                id,
                start: span.start,
                end: span.end,
                parent: RefCell::new(Weak::new()),
                children,
            }
        })
    }

    pub fn id(&self) -> &Id {
        &self.id
    }

    /// Returns `None` for a root node, or when the parent has been dropped.
    pub fn parent(&self) -> Option<Rc<AstNode<Id>>> {
        self.parent.borrow().upgrade()
    }

    pub fn children(&self) -> &[Rc<AstNode<Id>>] {
        &self.children
    }

    /// Returns `true` if `node` is this node or one of its descendants.
    pub fn contains(&self, node: &Rc<AstNode<Id>>) -> bool {
        let mut current = Some(Rc::clone(node));
        while let Some(n) = current {
            if std::ptr::eq(Rc::as_ptr(&n), self) {
                return true;
            }
            current = n.parent();
        }
        false
    }

    /// Renders the tree one node per line, indenting `tab_size` spaces per level.
    /// Leaves are followed by the source text they cover.
    ///
    /// Positions are taken as byte offsets into `text`, which holds for trees parsed from a
    /// `str`. For trees parsed from tokens, use [`AstNode::print_with`] and map each leaf
    /// through [`crate::lexer::text_span`].
    pub fn print(&self, text: &str, tab_size: usize) -> String
    where
        Id: std::fmt::Debug,
    {
        self.print_with(tab_size, |node| {
            text.get(node.start.get()..node.end.get())
                .unwrap_or_default()
                .to_owned()
        })
    }

    /// Like [`AstNode::print`], with the text after each leaf produced by `leaf`.
    pub fn print_with(&self, tab_size: usize, leaf: impl Fn(&Self) -> String) -> String
    where
        Id: std::fmt::Debug,
    {
        let mut s = String::new();
        // Writing into a `String` cannot fail.
        let _ = self.write_tree(&mut s, 0, tab_size, &leaf);
        s
    }

    fn write_tree(
        &self,
        out: &mut impl Write,
        depth: usize,
        tab_size: usize,
        leaf: &dyn Fn(&Self) -> String,
    ) -> std::fmt::Result
    where
        Id: std::fmt::Debug,
    {
        write!(out, "{:indent$}{:?}", "", self.id, indent = depth * tab_size)?;
        if self.children.is_empty() {
            writeln!(out, " : {}", leaf(self))
        } else {
            writeln!(out)?;
            self.children
                .iter()
                .try_for_each(|child| child.write_tree(out, depth + 1, tab_size, leaf))
        }
    }
}

/// Same layout as [`AstNode::print`] with a tab size of 4, showing leaf positions instead of text.
impl<Id: std::fmt::Debug> std::fmt::Display for AstNode<Id> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.write_tree(f, 0, 4, &|node: &Self| {
            format!("{}..{}", node.start, node.end)
        })
    }
}
