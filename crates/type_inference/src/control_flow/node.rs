use ast::NodeId;
use std::fmt::Debug;
use std::hash::Hash;

pub trait CfgNode: Copy + Eq + Hash + Debug {
    fn implicit_return() -> Self;
}

/// A control flow graph node: an AST node, or the implicit return.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct Node {
    pub node_id: Option<NodeId>,
}

impl Node {
    pub const ImplicitReturn: Node = Node { node_id: None };

    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id: Some(node_id),
        }
    }
}

impl CfgNode for Node {
    fn implicit_return() -> Self {
        Node::ImplicitReturn
    }
}

impl From<NodeId> for Node {
    fn from(node_id: NodeId) -> Self {
        Node::new(node_id)
    }
}
