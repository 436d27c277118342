//! Syntax tree shared by the input and the resolved output.
//!
//! Nodes live in an `indextree` arena owned by a [`Tree`]; handles are
//! [`NodeId`]s. Every node carries its source position, a tri-state
//! visibility flag and the `blocks_output` bit set by reference imports.

use crate::value::Value;
use core::fmt;
use css_media_queries::FeatureList;
use css_selectors::{ExtendClause, Selector};
use css_syntax::{Condition, Expr};
use indextree::{Arena, NodeId};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Where a node came from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub file: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl SourcePos {
    #[inline]
    pub fn new(file: &str, line: u32, column: u32) -> Self {
        Self {
            file: Arc::from(file),
            line,
            column,
        }
    }
}

impl fmt::Display for SourcePos {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}:{}:{}", self.file, self.line, self.column)
    }
}

/// Explicit visibility override of a node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// Decided by the nearest blocking ancestor.
    #[default]
    Inherit,
    /// Emitted even below a blocking ancestor.
    VisibleTrue,
    /// Never emitted.
    VisibleFalse,
}

/// A formal parameter of a mixin definition.
#[derive(Clone, Debug, PartialEq)]
pub enum MixinParam {
    /// `@name` or `@name: default`.
    Named { name: String, default: Option<Expr> },
    /// A literal the positional argument must equal (`dark`, `10px`).
    Pattern(Expr),
}

/// Trailing variadic parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Variadic {
    /// `...`, only reachable through `@arguments`.
    Anonymous,
    /// `@rest...`
    Named(String),
}

/// Header of a mixin definition (`.m(@a; @b: 2px) when (@a > 0)`).
#[derive(Clone, Debug, PartialEq)]
pub struct MixinSignature {
    /// Selector-style name including its prefix (`.m`, `#m`).
    pub name: String,
    pub params: Vec<MixinParam>,
    pub variadic: Option<Variadic>,
    pub guard: Option<Condition>,
}

/// Value of one invocation argument.
#[derive(Clone, Debug, PartialEq)]
pub enum ArgValue {
    Expr(Expr),
    /// A detached ruleset (`{ ... }`); `child` indexes the invocation node's
    /// children, each of which is a `DetachedBlock` holding the body.
    Ruleset { child: usize },
}

/// One invocation argument, optionally named (`@size: 2px`).
#[derive(Clone, Debug, PartialEq)]
pub struct MixinArg {
    pub name: Option<String>,
    pub value: ArgValue,
}

/// A mixin call site.
#[derive(Clone, Debug, PartialEq)]
pub struct MixinCall {
    pub name: String,
    pub args: Vec<MixinArg>,
    /// `!important` after the call marks every produced declaration.
    pub important: bool,
}

/// Options of an `@import (...)` directive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct ImportOptions {
    /// Definitions are usable but nothing is emitted unless invoked.
    pub reference: bool,
    /// Pass through as a literal `@import` instead of resolving.
    pub opaque: bool,
    /// Import the same path again even if it was already imported.
    pub multiple: bool,
    /// A failed resolution is ignored.
    pub optional: bool,
}

/// The closed set of node kinds. Input and output trees share it.
#[derive(Clone, Debug, PartialEq)]
pub enum NodeKind {
    Root,
    /// Qualified rule; children are its body.
    RuleBlock {
        selectors: Vec<Selector>,
        guard: Option<Condition>,
    },
    /// Input property with an unevaluated value.
    Declaration {
        name: String,
        value: Expr,
        important: bool,
    },
    /// Output property.
    ResolvedDeclaration {
        name: String,
        value: Value,
        important: bool,
    },
    /// `@name: value;`, name stored without `@`.
    VariableDecl { name: String, value: Expr },
    /// Children are the mixin body.
    MixinDefinition(MixinSignature),
    MixinInvocation(MixinCall),
    /// `@media`, `@container`, `@supports`; children are the body.
    ConditionalAtRule { name: String, features: FeatureList },
    /// Any other block at-rule (`@font-face`, `@keyframes`).
    AtRule { name: String, prelude: String },
    /// In-body `&:extend(...)`.
    Extend { clauses: Vec<ExtendClause> },
    /// `@name: { ... }`; children are the body.
    DetachedBlock { name: String },
    /// `@name();`
    DetachedCall { name: String },
    Import { path: String, options: ImportOptions },
    Comment { text: String },
}

/// A tree node: kind plus bookkeeping shared by every kind.
#[derive(Clone, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: SourcePos,
    pub visibility: Visibility,
    pub blocks_output: bool,
    /// Rule blocks only: per selector, the extenders that produced it.
    /// Shorter than the selector list when trailing selectors are original.
    pub extended_by: Vec<BTreeSet<String>>,
}

impl Node {
    #[inline]
    pub const fn new(kind: NodeKind, pos: SourcePos) -> Self {
        Self {
            kind,
            pos,
            visibility: Visibility::Inherit,
            blocks_output: false,
            extended_by: Vec::new(),
        }
    }
}

/// An arena-backed tree with a `Root` node.
#[derive(Clone, Debug)]
pub struct Tree {
    arena: Arena<Node>,
    root: NodeId,
    file: Arc<str>,
    next_line: u32,
}

impl Default for Tree {
    #[inline]
    fn default() -> Self {
        Self::new("")
    }
}

impl Tree {
    /// An empty tree whose generated positions point into `file`.
    pub fn new(file: &str) -> Self {
        let file: Arc<str> = Arc::from(file);
        let mut arena = Arena::new();
        let root = arena.new_node(Node::new(
            NodeKind::Root,
            SourcePos {
                file: Arc::clone(&file),
                line: 0,
                column: 0,
            },
        ));
        Self {
            arena,
            root,
            file,
            next_line: 1,
        }
    }

    #[inline]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn file(&self) -> &str {
        &self.file
    }

    /// Append a node of `kind` under `parent`, positioned on the next
    /// generated line of this tree's file.
    pub fn append(&mut self, parent: NodeId, kind: NodeKind) -> NodeId {
        let pos = SourcePos {
            file: Arc::clone(&self.file),
            line: self.next_line,
            column: 1,
        };
        self.next_line = self.next_line.saturating_add(1);
        self.append_at(parent, kind, pos)
    }

    /// Append a node with an explicit position.
    pub fn append_at(&mut self, parent: NodeId, kind: NodeKind, pos: SourcePos) -> NodeId {
        self.append_node(parent, Node::new(kind, pos))
    }

    pub fn append_node(&mut self, parent: NodeId, node: Node) -> NodeId {
        let id = self.arena.new_node(node);
        parent.append(id, &mut self.arena);
        id
    }

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.arena.get(id).map(indextree::Node::get)
    }

    #[inline]
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.arena.get_mut(id).map(indextree::Node::get_mut)
    }

    #[inline]
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node(id).map(|node| &node.kind)
    }

    #[inline]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.arena.get(id).and_then(indextree::Node::parent)
    }

    /// Children of `id`, collected so the tree can be mutated while walking.
    pub fn children(&self, id: NodeId) -> Vec<NodeId> {
        id.children(&self.arena).collect()
    }

    /// Strict ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        id.ancestors(&self.arena).skip(1)
    }

    /// `id` and everything below it in document order.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        id.descendants(&self.arena).collect()
    }

    /// Unlink `id` (with its subtree) from its parent.
    pub fn detach(&mut self, id: NodeId) {
        id.detach(&mut self.arena);
    }

    /// Move a detached node right after `sibling`.
    pub fn insert_after(&mut self, sibling: NodeId, id: NodeId) {
        sibling.insert_after(id, &mut self.arena);
    }

    /// Remove `id` and its subtree.
    pub fn remove(&mut self, id: NodeId) {
        id.remove_subtree(&mut self.arena);
    }

    /// Deep-copy the children of `source`'s root under `parent`. Returns the
    /// copies of the top-level children in order.
    pub fn graft(&mut self, parent: NodeId, source: &Self) -> Vec<NodeId> {
        source
            .children(source.root)
            .into_iter()
            .filter_map(|child| self.copy_subtree(parent, source, child))
            .collect()
    }

    fn copy_subtree(&mut self, parent: NodeId, source: &Self, from: NodeId) -> Option<NodeId> {
        let node = source.node(from)?.clone();
        let copy = self.append_node(parent, node);
        for child in source.children(from) {
            self.copy_subtree(copy, source, child);
        }
        Some(copy)
    }
}
