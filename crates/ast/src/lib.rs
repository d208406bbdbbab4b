mod jsdoc;
pub mod node_util;
mod token;

pub use jsdoc::{FunctionTypeExpr, JSDocFlags, JSDocInfo, TypeExpr};
pub use token::Token;

use bitflags::bitflags;
use index::{newtype_index, vec::IndexVec};
use std::fmt::{self, Write};
use std::ops::Index;

pub type JsWord = string_cache::DefaultAtom;

newtype_index!(pub struct NodeId { DEBUG_FORMAT = "NodeId({})" });

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// An object literal key written as a string literal.
        const QUOTED = 1 << 0;
        /// The node was parsed from an externs file.
        const FROM_EXTERNS = 1 << 1;
        /// `x++` rather than `++x`.
        const POSTFIX = 1 << 2;
        /// A property key written as a number literal.
        const NUMERIC_KEY = 1 << 3;
    }
}

/// A position in a source file, 1-based line and 0-based column.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct SourcePos {
    pub source_name: JsWord,
    pub line: u32,
    pub col: u32,
}

/// One syntax node. Nodes are owned by an [Ast] and addressed by [NodeId].
#[derive(Clone, Debug)]
pub struct Node {
    pub token: Token,
    pub parent: Option<NodeId>,
    pub children: Vec<NodeId>,
    /// Names, string literal values, property names, object literal keys and labels.
    pub string: JsWord,
    pub number: f64,
    pub jsdoc: Option<Box<JSDocInfo>>,
    pub flags: NodeFlags,
    pub pos: SourcePos,
    /// Position of this node in its parent's children.
    index_in_parent: u32,
}

/// An arena holding a whole program. The root is a `Root` node whose
/// children are `Script` nodes.
#[derive(Clone, Debug)]
pub struct Ast {
    nodes: IndexVec<NodeId, Node>,
    root: NodeId,
}

impl Default for Ast {
    fn default() -> Self {
        Self::new()
    }
}

impl Index<NodeId> for Ast {
    type Output = Node;

    fn index(&self, index: NodeId) -> &Node {
        &self.nodes[index]
    }
}

impl Ast {
    pub fn new() -> Self {
        let mut nodes = IndexVec::new();
        let root = nodes.push(Node {
            token: Token::Root,
            parent: None,
            children: Vec::new(),
            string: JsWord::from(""),
            number: 0.0,
            jsdoc: None,
            flags: NodeFlags::empty(),
            pos: SourcePos::default(),
            index_in_parent: 0,
        });
        Self { nodes, root }
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // The root always exists.
        false
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> {
        self.nodes.indices()
    }

    // ---- construction ----

    pub fn new_node(&mut self, token: Token, pos: SourcePos) -> NodeId {
        self.nodes.push(Node {
            token,
            parent: None,
            children: Vec::new(),
            string: JsWord::from(""),
            number: 0.0,
            jsdoc: None,
            flags: NodeFlags::empty(),
            pos,
            index_in_parent: 0,
        })
    }

    pub fn new_string_node(&mut self, token: Token, string: JsWord, pos: SourcePos) -> NodeId {
        let id = self.new_node(token, pos);
        self.nodes[id].string = string;
        id
    }

    pub fn new_number_node(&mut self, value: f64, pos: SourcePos) -> NodeId {
        let id = self.new_node(Token::Number, pos);
        self.nodes[id].number = value;
        id
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        debug_assert!(self.nodes[child].parent.is_none(), "node already has a parent");
        let index = self.nodes[parent].children.len();
        self.nodes[parent].children.push(child);
        let node = &mut self.nodes[child];
        node.parent = Some(parent);
        node.index_in_parent = index as u32;
    }

    pub fn set_jsdoc(&mut self, node: NodeId, info: JSDocInfo) {
        self.nodes[node].jsdoc = Some(Box::new(info));
    }

    pub fn set_flag(&mut self, node: NodeId, flag: NodeFlags) {
        self.nodes[node].flags.insert(flag);
    }

    pub fn set_string(&mut self, node: NodeId, string: JsWord) {
        self.nodes[node].string = string;
    }

    // ---- navigation ----

    #[inline]
    pub fn token(&self, node: NodeId) -> Token {
        self.nodes[node].token
    }

    #[inline]
    pub fn is(&self, node: NodeId, token: Token) -> bool {
        self.nodes[node].token == token
    }

    #[inline]
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].parent
    }

    #[inline]
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].children
    }

    pub fn first_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].children.first().copied()
    }

    pub fn second_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].children.get(1).copied()
    }

    pub fn last_child(&self, node: NodeId) -> Option<NodeId> {
        self.nodes[node].children.last().copied()
    }

    pub fn child_at(&self, node: NodeId, index: usize) -> Option<NodeId> {
        self.nodes[node].children.get(index).copied()
    }

    pub fn child_count(&self, node: NodeId) -> usize {
        self.nodes[node].children.len()
    }

    pub fn has_children(&self, node: NodeId) -> bool {
        !self.nodes[node].children.is_empty()
    }

    /// The next sibling.
    pub fn next(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node].parent?;
        let index = self.nodes[node].index_in_parent as usize;
        self.nodes[parent].children.get(index + 1).copied()
    }

    /// The previous sibling.
    pub fn previous(&self, node: NodeId) -> Option<NodeId> {
        let parent = self.nodes[node].parent?;
        let index = self.nodes[node].index_in_parent as usize;
        if index == 0 {
            None
        } else {
            self.nodes[parent].children.get(index - 1).copied()
        }
    }

    pub fn index_in_parent(&self, node: NodeId) -> usize {
        self.nodes[node].index_in_parent as usize
    }

    /// `node` followed by all of its following siblings.
    pub fn siblings(&self, node: NodeId) -> &[NodeId] {
        match self.nodes[node].parent {
            Some(parent) => &self.nodes[parent].children[self.index_in_parent(node)..],
            None => std::slice::from_ref(&self.root),
        }
    }

    pub fn ancestors(&self, node: NodeId) -> Ancestors<'_> {
        Ancestors {
            ast: self,
            current: self.nodes[node].parent,
        }
    }

    #[inline]
    pub fn string(&self, node: NodeId) -> &JsWord {
        &self.nodes[node].string
    }

    #[inline]
    pub fn number(&self, node: NodeId) -> f64 {
        self.nodes[node].number
    }

    #[inline]
    pub fn jsdoc(&self, node: NodeId) -> Option<&JSDocInfo> {
        self.nodes[node].jsdoc.as_deref()
    }

    pub fn is_quoted(&self, node: NodeId) -> bool {
        self.nodes[node].flags.contains(NodeFlags::QUOTED)
    }

    pub fn is_from_externs(&self, node: NodeId) -> bool {
        self.nodes[node].flags.contains(NodeFlags::FROM_EXTERNS)
    }

    pub fn source_name(&self, node: NodeId) -> &JsWord {
        &self.nodes[node].pos.source_name
    }

    pub fn line(&self, node: NodeId) -> u32 {
        self.nodes[node].pos.line
    }

    pub fn col(&self, node: NodeId) -> u32 {
        self.nodes[node].pos.col
    }

    /// Renders the subtree rooted at `node`, one node per line.
    pub fn to_tree_string(&self, node: NodeId) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail.
        let _ = self.write_tree(node, 0, &mut out);
        out
    }

    fn write_tree(&self, node: NodeId, depth: usize, out: &mut String) -> fmt::Result {
        let n = &self.nodes[node];
        for _ in 0..depth {
            out.push_str("    ");
        }
        write!(out, "{:?}", n.token)?;
        match n.token {
            Token::Number => write!(out, " {}", n.number)?,
            _ if !n.string.is_empty() => write!(out, " {}", n.string)?,
            _ => {}
        }
        out.push('\n');
        for &child in &n.children {
            self.write_tree(child, depth + 1, out)?;
        }
        Ok(())
    }
}

pub struct Ancestors<'a> {
    ast: &'a Ast,
    current: Option<NodeId>,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.current?;
        self.current = self.ast.parent(current);
        Some(current)
    }
}
