use super::ControlFlowGraph::is_entering_new_cfg_node;
use ast::{Ast, NodeId, Token};
use rustc_hash::FxHashMap;
use std::hash::Hash;

/// Determines whether the given node is a FOR, DO, or WHILE node.
pub fn is_loop_structure(ast: &Ast, n: NodeId) -> bool {
    matches!(
        ast.token(n),
        Token::For | Token::ForIn | Token::Do | Token::While
    )
}

/// Computes the destination node of n when we want to fallthrough into the
/// subtree of n. We don't always create a CFG edge into n itself because of
/// DOs and FORs.
pub fn compute_fall_through(ast: &Ast, n: NodeId) -> NodeId {
    match ast.token(n) {
        Token::Do => match ast.first_child(n) {
            Some(body) => compute_fall_through(ast, body),
            None => n,
        },
        Token::For => match ast.first_child(n) {
            Some(init) => compute_fall_through(ast, init),
            None => n,
        },
        // The collection is evaluated first.
        Token::ForIn => ast.second_child(n).unwrap_or(n),
        Token::Label => match ast.last_child(n) {
            Some(statement) => compute_fall_through(ast, statement),
            None => n,
        },
        _ => n,
    }
}

/// Determines whether the given node can be terminated with a BREAK node.
fn is_break_structure(ast: &Ast, n: NodeId, labeled: bool) -> bool {
    match ast.token(n) {
        Token::For | Token::ForIn | Token::Do | Token::While | Token::Switch => true,
        Token::Block | Token::Root | Token::If | Token::Try => labeled,
        _ => false,
    }
}

/// Determines if the subtree might throw an exception.
pub fn may_throw_exception(ast: &Ast, n: NodeId) -> bool {
    match ast.token(n) {
        Token::Call
        | Token::GetProp
        | Token::GetElem
        | Token::Throw
        | Token::New
        | Token::Assign
        | Token::Inc
        | Token::Dec
        | Token::InstanceOf
        | Token::In => return true,
        Token::Function => return false,
        _ => {}
    }
    ast.children(n)
        .iter()
        .any(|&c| !is_entering_new_cfg_node(ast, c) && may_throw_exception(ast, c))
}

/// Checks if target is actually the break target of labeled continue. The
/// label can be null if it is an unlabeled break.
pub fn is_break_target(ast: &Ast, target: NodeId, label: Option<&str>) -> bool {
    is_break_structure(ast, target, label.is_some()) && match_label(ast, ast.parent(target), label)
}

/// Checks if target is actually the continue target of labeled continue. The
/// label can be null if it is an unlabeled continue.
pub fn is_continue_target(ast: &Ast, target: NodeId, label: Option<&str>) -> bool {
    is_loop_structure(ast, target) && match_label(ast, ast.parent(target), label)
}

/// Check if label is actually referencing the target control structure. If
/// label is null, it always returns true.
pub fn match_label(ast: &Ast, mut target: Option<NodeId>, label: Option<&str>) -> bool {
    let label = match label {
        Some(label) => label,
        None => return true,
    };
    while let Some(t) = target {
        if !ast.is(t, Token::Label) {
            break;
        }
        if &**ast.string(t) == label {
            return true;
        }
        target = ast.parent(t);
    }
    false
}

/// A `try` with a `finally` block.
pub fn has_finally(ast: &Ast, try_node: NodeId) -> bool {
    debug_assert!(ast.is(try_node, Token::Try));
    ast.child_count(try_node) == 3
}

/// The block holding the optional `catch` of a `try`.
pub fn get_catch_block(ast: &Ast, try_node: NodeId) -> Option<NodeId> {
    debug_assert!(ast.is(try_node, Token::Try));
    ast.second_child(try_node)
}

pub fn has_catch_handler(ast: &Ast, catch_block: NodeId) -> bool {
    ast.has_children(catch_block)
}

#[derive(PartialEq, Clone, Debug)]
pub struct MultiMap<K, V>(FxHashMap<K, Vec<V>>)
where
    K: Eq + Hash;

impl<K, V> MultiMap<K, V>
where
    K: Eq + Hash,
    V: PartialEq,
{
    pub fn put(&mut self, key: K, value: V) {
        let existing = self.0.get_mut(&key);

        match existing {
            Some(vec) => {
                if !vec.contains(&value) {
                    vec.push(value);
                }
            }
            None => {
                self.0.insert(key, vec![value]);
            }
        }
    }

    pub fn get(&self, key: &K) -> Option<&Vec<V>> {
        self.0.get(key)
    }
}

impl<K, V> std::default::Default for MultiMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self(Default::default())
    }
}
