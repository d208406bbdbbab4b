//! Structural queries over an [Ast].

use crate::{Ast, JSDocInfo, JsWord, NodeId, Token};

/// Returns the qualified name of `n` (`a`, `this`, `a.b.c`), or `None` if `n`
/// is not a qualified name.
pub fn get_qualified_name(ast: &Ast, n: NodeId) -> Option<JsWord> {
    match ast.token(n) {
        Token::Name => {
            let name = ast.string(n);
            if name.is_empty() {
                None
            } else {
                Some(name.clone())
            }
        }
        Token::This => Some(JsWord::from("this")),
        Token::GetProp => {
            let owner = get_qualified_name(ast, ast.first_child(n)?)?;
            Some(JsWord::from(format!("{}.{}", owner, ast.string(n))))
        }
        _ => None,
    }
}

pub fn is_qualified_name(ast: &Ast, n: NodeId) -> bool {
    match ast.token(n) {
        Token::Name => !ast.string(n).is_empty(),
        Token::This => true,
        Token::GetProp => ast
            .first_child(n)
            .map_or(false, |owner| is_qualified_name(ast, owner)),
        _ => false,
    }
}

/// Whether `n` is a qualified name that does not start with `this`.
pub fn is_unscoped_qualified_name(ast: &Ast, n: NodeId) -> bool {
    match ast.token(n) {
        Token::Name => !ast.string(n).is_empty(),
        Token::GetProp => ast
            .first_child(n)
            .map_or(false, |owner| is_unscoped_qualified_name(ast, owner)),
        _ => false,
    }
}

/// `a` for `a.b.c`.
pub fn get_root_of_qualified_name(ast: &Ast, mut n: NodeId) -> NodeId {
    while ast.is(n, Token::GetProp) {
        match ast.first_child(n) {
            Some(owner) => n = owner,
            None => break,
        }
    }
    n
}

/// The first segment of a dotted name.
pub fn root_of_qualified_name_str(name: &str) -> &str {
    match name.find('.') {
        Some(index) => &name[..index],
        None => name,
    }
}

/// The function name node, or `None` for the synthesized root.
pub fn function_name(ast: &Ast, function: NodeId) -> Option<NodeId> {
    debug_assert!(ast.is(function, Token::Function));
    ast.first_child(function)
}

pub fn function_params(ast: &Ast, function: NodeId) -> Option<NodeId> {
    debug_assert!(ast.is(function, Token::Function));
    ast.second_child(function)
}

pub fn function_body(ast: &Ast, function: NodeId) -> Option<NodeId> {
    debug_assert!(ast.is(function, Token::Function));
    ast.last_child(function)
}

pub fn function_has_name(ast: &Ast, function: NodeId) -> bool {
    function_name(ast, function).map_or(false, |name| !ast.string(name).is_empty())
}

/// Whether `n` is a function declaration statement (`function f() {}`).
pub fn is_function_declaration(ast: &Ast, n: NodeId) -> bool {
    ast.is(n, Token::Function)
        && function_has_name(ast, n)
        && ast
            .parent(n)
            .map_or(false, |parent| ast.token(parent).is_statement_parent())
}

/// Whether `n` is a function declaration whose name is hoisted to the top of
/// the enclosing scope.
pub fn is_hoisted_function_declaration(ast: &Ast, n: NodeId) -> bool {
    is_function_declaration(ast, n)
        && ast.parent(n).map_or(false, |parent| {
            matches!(ast.token(parent), Token::Script | Token::Root)
                || ast
                    .parent(parent)
                    .map_or(false, |grandparent| ast.is(grandparent, Token::Function))
        })
}

pub fn is_function_expression(ast: &Ast, n: NodeId) -> bool {
    ast.is(n, Token::Function) && !is_function_declaration(ast, n)
}

/// Whether `n` is the name of a named function expression, which is only
/// visible inside the function's own body.
pub fn is_bleeding_function_name(ast: &Ast, n: NodeId) -> bool {
    ast.is(n, Token::Name)
        && !ast.string(n).is_empty()
        && ast.parent(n).map_or(false, |parent| {
            ast.is(parent, Token::Function)
                && ast.first_child(parent) == Some(n)
                && is_function_expression(ast, parent)
        })
}

pub fn is_statement_parent(ast: &Ast, n: NodeId) -> bool {
    ast.token(n).is_statement_parent()
}

pub fn is_statement(ast: &Ast, n: NodeId) -> bool {
    ast.parent(n)
        .map_or(false, |parent| is_statement_parent(ast, parent))
}

pub fn is_control_structure(ast: &Ast, n: NodeId) -> bool {
    ast.token(n).is_control_structure()
}

pub fn is_object_lit_key(ast: &Ast, n: NodeId) -> bool {
    ast.token(n).is_object_lit_key()
}

/// The key name of an object literal member.
pub fn get_object_lit_key_name<'a>(ast: &'a Ast, key: NodeId) -> &'a JsWord {
    debug_assert!(is_object_lit_key(ast, key));
    ast.string(key)
}

/// Whether `n` is assigned to: the target of an assignment, a `var`
/// binding, a parameter, a catch binding, an increment or the target of a
/// `for-in`.
pub fn is_lvalue(ast: &Ast, n: NodeId) -> bool {
    if !matches!(ast.token(n), Token::Name | Token::GetProp | Token::GetElem) {
        return false;
    }
    let parent = match ast.parent(n) {
        Some(parent) => parent,
        None => return false,
    };
    match ast.token(parent) {
        t if t.is_assignment() => ast.first_child(parent) == Some(n),
        Token::Var | Token::ParamList | Token::Inc | Token::Dec => true,
        Token::Catch => ast.first_child(parent) == Some(n),
        Token::ForIn => ast.first_child(parent) == Some(n),
        Token::Function => ast.first_child(parent) == Some(n),
        _ => false,
    }
}

/// Returns the node that a function or object literal is assigned to, if any:
///
/// * `function f() {}` gives the name of `f`.
/// * `var f = function() {}` gives the `NAME` of `f`.
/// * `a.b = function() {}` gives `a.b`.
/// * `{a: function() {}}` gives the key `a`.
///
/// Hooks, `||`, `&&` and commas on the way are looked through.
pub fn get_best_lvalue(ast: &Ast, n: NodeId) -> Option<NodeId> {
    let parent = ast.parent(n)?;
    if is_function_declaration(ast, n) {
        return function_name(ast, n);
    }
    match ast.token(parent) {
        Token::Name => Some(parent),
        t if t.is_assignment() => ast.first_child(parent),
        t if t.is_object_lit_key() => Some(parent),
        Token::Hook | Token::Or | Token::And => {
            if ast.first_child(parent) == Some(n) {
                None
            } else {
                get_best_lvalue(ast, parent)
            }
        }
        Token::Comma => {
            if ast.last_child(parent) == Some(n) {
                get_best_lvalue(ast, parent)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Returns the qualified name of the best l-value, joining object literal
/// keys onto the name of their literal: `a.b = {c: function() {}}` gives
/// `a.b.c` for the function.
pub fn get_best_lvalue_name(ast: &Ast, lvalue: Option<NodeId>) -> Option<JsWord> {
    let lvalue = lvalue?;
    if is_object_lit_key(ast, lvalue) {
        let literal = ast.parent(lvalue)?;
        let owner = get_best_lvalue(ast, literal);
        let owner_name = get_best_lvalue_name(ast, owner)?;
        return Some(JsWord::from(format!(
            "{}.{}",
            owner_name,
            get_object_lit_key_name(ast, lvalue)
        )));
    }
    get_qualified_name(ast, lvalue)
}

/// Returns the owner of the best l-value: `a.b` for `a.b.c = ...`, and the
/// l-value of the literal for an object literal key.
pub fn get_best_lvalue_owner(ast: &Ast, lvalue: Option<NodeId>) -> Option<NodeId> {
    let lvalue = lvalue?;
    if is_object_lit_key(ast, lvalue) {
        get_best_lvalue(ast, ast.parent(lvalue)?)
    } else if ast.is(lvalue, Token::GetProp) {
        ast.first_child(lvalue)
    } else {
        None
    }
}

/// The JSDoc describing `n`: its own, or that of the declaration, assignment
/// or object literal key it is the value of.
pub fn get_best_jsdoc(ast: &Ast, n: NodeId) -> Option<&JSDocInfo> {
    if let Some(info) = ast.jsdoc(n) {
        return Some(info);
    }
    let parent = ast.parent(n)?;
    match ast.token(parent) {
        Token::Name => get_best_jsdoc(ast, parent),
        t if t.is_assignment() || t.is_object_lit_key() => ast.jsdoc(parent),
        Token::Function => ast.jsdoc(parent),
        Token::Var if ast.child_count(parent) == 1 => ast.jsdoc(parent),
        Token::Or | Token::And => get_best_jsdoc(ast, parent),
        Token::Hook | Token::Comma if ast.first_child(parent) != Some(n) => {
            get_best_jsdoc(ast, parent)
        }
        _ => None,
    }
}

/// Returns the assigned value of a name, declaration or assignment target.
pub fn get_rvalue_of_lvalue(ast: &Ast, lvalue: NodeId) -> Option<NodeId> {
    let parent = ast.parent(lvalue)?;
    match ast.token(parent) {
        Token::Assign => ast.second_child(parent),
        Token::Var => ast.first_child(lvalue),
        Token::Function => Some(parent),
        _ => None,
    }
}

/// The condition child of a control structure whose outgoing edges are
/// conditional, or `None` for `for(;;)` and structures without one.
pub fn get_condition_expression(ast: &Ast, n: NodeId) -> Option<NodeId> {
    match ast.token(n) {
        Token::If | Token::While => ast.first_child(n),
        Token::Do => ast.last_child(n),
        Token::For => {
            let condition = ast.second_child(n)?;
            if ast.is(condition, Token::Empty) {
                None
            } else {
                Some(condition)
            }
        }
        Token::ForIn | Token::Case | Token::DefaultCase => None,
        _ => None,
    }
}

/// Whether `n` is a `for` loop without a condition, or one whose
/// condition is the literal `true`.
pub fn is_infinite_loop_condition(ast: &Ast, condition: Option<NodeId>) -> bool {
    match condition {
        None => true,
        Some(condition) => ast.is(condition, Token::True),
    }
}

/// Whether evaluating `n` may run user code that was not written at `n`:
/// calls, constructions, assignments, increments and deletes.
pub fn may_have_side_effects(ast: &Ast, n: NodeId) -> bool {
    match ast.token(n) {
        Token::Call | Token::New | Token::Inc | Token::Dec | Token::DelProp => true,
        t if t.is_assignment() => true,
        Token::Function => false,
        _ => ast
            .children(n)
            .iter()
            .any(|&child| may_have_side_effects(ast, child)),
    }
}

/// Whether `name` is a valid JavaScript identifier.
pub fn is_valid_simple_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c == '_' || c == '$' || c.is_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_alphanumeric())
}

/// Pre-order walk of the subtree rooted at `root`. `visit` returns whether to
/// descend into the children of the node it was given.
pub fn pre_order<F>(ast: &Ast, root: NodeId, visit: &mut F)
where
    F: FnMut(NodeId) -> bool,
{
    if visit(root) {
        for &child in ast.children(root) {
            pre_order(ast, child, visit);
        }
    }
}
