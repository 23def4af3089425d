use std::collections::HashMap;

use crate::ast::Position;

/// The kind of a syntax tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Whole document
    File,
    /// `let:` section
    Let,
    /// `in:` section
    In,
    /// `let` or `in`
    Keyword,
    /// `name = value` inside the `let:` section
    Binding,
    /// `name = value` inside an object literal
    Assignment,
    /// `name = value` inside a function call
    Argument,
    Identifier,
    FuncCall,
    FuncName,
    List,
    ListElement,
    Object,
    String,
    Number,
    Bool,
    Null,
    Comment,
    /// Any punctuation token; the literal holds the character
    Punctuation,
}

/// Stable identifier of a node inside its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub kind: NodeKind,
    /// Position of the node's first token
    pub position: Position,
    /// Present only for literal-bearing kinds
    pub literal: Option<String>,
    /// Children in source order
    pub children: Vec<NodeId>,
}

/// Immutable syntax tree produced by the parser.
///
/// Nodes live in an arena and are addressed by [`NodeId`]. A position index
/// is built once so [`Tree::find`] does not have to search the tree.
#[derive(Debug, Clone)]
pub struct Tree {
    nodes: Vec<Node>,
    root: NodeId,
    by_position: HashMap<Position, NodeId>,
}

impl Tree {
    pub fn root(&self) -> &Node {
        self.node(self.root)
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    pub fn children<'a>(&'a self, node: &'a Node) -> impl Iterator<Item = &'a Node> + 'a {
        node.children.iter().map(move |id| self.node(*id))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visits every node in pre-order. Stops at the first error.
    pub fn walk<E, F>(&self, mut visit: F) -> Result<(), E>
    where
        F: FnMut(&Node) -> Result<(), E>,
    {
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            let node = self.node(id);
            visit(node)?;
            stack.extend(node.children.iter().rev().copied());
        }
        Ok(())
    }

    /// Returns the innermost node that starts exactly at `position`.
    pub fn find(&self, position: Position) -> Option<&Node> {
        self.by_position.get(&position).map(|id| self.node(*id))
    }
}

/// Arena builder used by the parser.
///
/// Parents are pushed before their children, so ids grow with depth and
/// the last node registered for a position is the innermost one.
#[derive(Debug, Default)]
pub(crate) struct TreeBuilder {
    nodes: Vec<Node>,
}

impl TreeBuilder {
    pub(crate) fn push(
        &mut self,
        kind: NodeKind,
        position: Position,
        literal: Option<String>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            id,
            kind,
            position,
            literal,
            children: Vec::new(),
        });
        id
    }

    pub(crate) fn attach(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[parent.0].children.push(child);
    }

    pub(crate) fn finish(self, root: NodeId) -> Tree {
        let by_position = self
            .nodes
            .iter()
            .map(|node| (node.position, node.id))
            .collect();
        Tree {
            nodes: self.nodes,
            root,
            by_position,
        }
    }
}
