use super::node::Node;
use super::ControlFlowAnalysis::{ControlFlowAnalysis, ControlFlowAnalysisResult};
use super::ControlFlowGraph::{Branch, ControlFlowGraph};
use ast::{node_util, Ast, NodeId, Token};
use petgraph::visit::EdgeRef;
use pretty_assertions::assert_eq;

type Cfg = ControlFlowGraph<Node, ()>;

fn create_cfg(src: &str) -> (Ast, NodeId, ControlFlowAnalysisResult<Node, (), ()>) {
    let mut ast = Ast::new();
    let script = parser::parse_script(&mut ast, "test.js", src).unwrap();
    let result = ControlFlowAnalysis::<(), ()>::analyze(&ast, script, true).unwrap();
    (ast, script, result)
}

fn test_script<F>(src: &str, op: F)
where
    F: FnOnce(&Ast, &Cfg),
{
    let (ast, _, result) = create_cfg(src);
    op(&ast, &result.cfg);
}

fn token_of(ast: &Ast, n: Node) -> Option<Token> {
    n.node_id.map(|id| ast.token(id))
}

fn is_ancestor(ast: &Ast, ancestor: Node, n: Node) -> bool {
    match (ancestor.node_id, n.node_id) {
        (Some(ancestor), Some(n)) => ast.ancestors(n).any(|a| a == ancestor),
        _ => false,
    }
}

/// All edges from a `start` node to an `end` node. `None` stands for the
/// implicit return.
fn get_all_edges(
    ast: &Ast,
    cfg: &Cfg,
    start: Token,
    end: Option<Token>,
    edge_type: Option<Branch>,
) -> Vec<(Node, Node)> {
    cfg.graph
        .edge_references()
        .filter_map(|e| {
            let source = cfg.graph[e.source()];
            let target = cfg.graph[e.target()];
            let matches = token_of(ast, source) == Some(start)
                && token_of(ast, target) == end
                && edge_type.map_or(true, |t| t == *e.weight());
            if matches {
                Some((source, target))
            } else {
                None
            }
        })
        .collect()
}

fn assert_no_edge(ast: &Ast, cfg: &Cfg, start: Token, end: Token) {
    assert!(
        get_all_edges(ast, cfg, start, Some(end), None).is_empty(),
        "Unexpected edge between {:?} and {:?}",
        start,
        end
    );
}

/// Asserts that there exists a control flow edge of the given type from a
/// node of the start token to one of its descendants with the end token.
fn assert_down_edge(ast: &Ast, cfg: &Cfg, start: Token, end: Token, edge_type: Branch) {
    assert!(
        get_all_edges(ast, cfg, start, Some(end), Some(edge_type))
            .iter()
            .any(|&(source, target)| is_ancestor(ast, source, target)),
        "No down edge found between {:?} and {:?}",
        start,
        end
    );
}

/// Asserts that there exists a control flow edge of the given type from a
/// node of the start token to one of its ancestors with the end token.
fn assert_up_edge(ast: &Ast, cfg: &Cfg, start: Token, end: Token, edge_type: Branch) {
    assert!(
        get_all_edges(ast, cfg, start, Some(end), Some(edge_type))
            .iter()
            .any(|&(source, target)| is_ancestor(ast, target, source)),
        "No up edge found between {:?} and {:?}",
        start,
        end
    );
}

/// Asserts that there exists a control flow edge of the given type between
/// two nodes where neither is an ancestor of the other.
fn assert_cross_edge(ast: &Ast, cfg: &Cfg, start: Token, end: Token, edge_type: Branch) {
    assert!(
        get_all_edges(ast, cfg, start, Some(end), Some(edge_type))
            .iter()
            .any(|&(source, target)| !is_ancestor(ast, source, target)
                && !is_ancestor(ast, target, source)),
        "No cross edge found between {:?} and {:?}",
        start,
        end
    );
}

fn assert_return_edge(ast: &Ast, cfg: &Cfg, start: Token) {
    assert!(
        !get_all_edges(ast, cfg, start, None, None).is_empty(),
        "No return edge found from {:?}",
        start
    );
}

fn assert_no_return_edge(ast: &Ast, cfg: &Cfg, start: Token) {
    assert!(
        get_all_edges(ast, cfg, start, None, None).is_empty(),
        "Unexpected return edge from {:?}",
        start
    );
}

fn find_all(ast: &Ast, root: NodeId, token: Token) -> Vec<NodeId> {
    let mut found = Vec::new();
    node_util::pre_order(ast, root, &mut |n| {
        if ast.is(n, token) {
            found.push(n);
        }
        true
    });
    found
}

fn find(ast: &Ast, root: NodeId, token: Token) -> NodeId {
    find_all(ast, root, token)[0]
}

/// The statement `name();`.
fn call_stmt(ast: &Ast, root: NodeId, name: &str) -> Node {
    let stmt = find_all(ast, root, Token::ExprResult)
        .into_iter()
        .find(|&stmt| {
            let call = ast.first_child(stmt).unwrap();
            ast.is(call, Token::Call) && &**ast.string(ast.first_child(call).unwrap()) == name
        })
        .unwrap();
    Node::new(stmt)
}

#[test]
fn testSimpleStatementsInScript() {
    let src = "var a; a = a; a = a";
    test_script(src, |ast, cfg| {
        assert_down_edge(ast, cfg, Token::Script, Token::Var, Branch::UNCOND);
        assert_cross_edge(ast, cfg, Token::Var, Token::ExprResult, Branch::UNCOND);
        assert_cross_edge(ast, cfg, Token::ExprResult, Token::ExprResult, Branch::UNCOND);
        assert_return_edge(ast, cfg, Token::ExprResult);
    });
}

// Test a simple IF control flow.
#[test]
fn testSimpleIf() {
    let src = "var x; if (x) { x() } else { x() };";
    test_script(src, |ast, cfg| {
        assert_down_edge(ast, cfg, Token::Script, Token::Var, Branch::UNCOND);
        assert_cross_edge(ast, cfg, Token::Var, Token::If, Branch::UNCOND);
        assert_down_edge(ast, cfg, Token::If, Token::Block, Branch::ON_TRUE);
        assert_down_edge(ast, cfg, Token::Block, Token::ExprResult, Branch::UNCOND);
        assert_no_edge(ast, cfg, Token::ExprResult, Token::Call);
        assert_down_edge(ast, cfg, Token::If, Token::Block, Branch::ON_FALSE);
        assert_cross_edge(ast, cfg, Token::ExprResult, Token::Empty, Branch::UNCOND);
        assert_return_edge(ast, cfg, Token::Empty);
    });
}

#[test]
fn testIfWithoutElse() {
    let src = "var x; if (x) { x() } x();";
    let (ast, script, result) = create_cfg(src);
    let if_node = Node::new(find(&ast, script, Token::If));
    let last = Node::new(ast.last_child(script).unwrap());
    assert!(result.cfg.is_connected(if_node, Branch::ON_FALSE, last));
}

#[test]
fn testBreakingBlock() {
    // BREAK to a block.
    let src = "var x; a: { if (x) { break a; } x(); } x();";
    let (ast, script, result) = create_cfg(src);
    let break_node = Node::new(find(&ast, script, Token::Break));
    let last = Node::new(ast.last_child(script).unwrap());
    assert!(result.cfg.is_connected(break_node, Branch::UNCOND, last));
    assert_cross_edge(&ast, &result.cfg, Token::Break, Token::ExprResult, Branch::UNCOND);
}

#[test]
fn testBreakingWhile() {
    let src = "var x; while (x) { x(); if (x) { break; } x(); }";
    test_script(src, |ast, cfg| {
        assert_down_edge(ast, cfg, Token::While, Token::Block, Branch::ON_TRUE);
        assert_return_edge(ast, cfg, Token::Break);
        assert_up_edge(ast, cfg, Token::ExprResult, Token::While, Branch::UNCOND);
        assert!(!get_all_edges(ast, cfg, Token::While, None, Some(Branch::ON_FALSE)).is_empty());
    });
}

#[test]
fn testInifiteLoopWhile() {
    let src = "var x; while (true) { x(); }";
    test_script(src, |ast, cfg| {
        assert_down_edge(ast, cfg, Token::While, Token::Block, Branch::ON_TRUE);
        assert_up_edge(ast, cfg, Token::ExprResult, Token::While, Branch::UNCOND);
        assert_no_return_edge(ast, cfg, Token::While);
    });
}

#[test]
fn testSimpleFor() {
    let src = "var x; for (var i = 0; i < 10; i++) { x(); }";
    test_script(src, |ast, cfg| {
        assert_up_edge(ast, cfg, Token::Var, Token::For, Branch::UNCOND);
        assert_down_edge(ast, cfg, Token::For, Token::Block, Branch::ON_TRUE);
        assert_cross_edge(ast, cfg, Token::ExprResult, Token::Inc, Branch::UNCOND);
        assert_up_edge(ast, cfg, Token::Inc, Token::For, Branch::UNCOND);
        assert!(!get_all_edges(ast, cfg, Token::For, None, Some(Branch::ON_FALSE)).is_empty());
    });
}

#[test]
fn testInifiteLoopFor_emptyCond() {
    let src = "var x; for (;;) { x(); }";
    test_script(src, |ast, cfg| {
        assert_down_edge(ast, cfg, Token::For, Token::Block, Branch::ON_TRUE);
        assert_no_return_edge(ast, cfg, Token::For);
        assert_no_edge(ast, cfg, Token::For, Token::ExprResult);
    });
}

#[test]
fn testContinueInFor() {
    let src = "var x; for (var i = 0; i < 10; i++) { if (x) { continue; } x(); }";
    test_script(src, |ast, cfg| {
        assert_cross_edge(ast, cfg, Token::Continue, Token::Inc, Branch::UNCOND);
    });
}

#[test]
fn testForIn() {
    let src = "var a, b; for (a in b) { a(); }";
    test_script(src, |ast, cfg| {
        assert_cross_edge(ast, cfg, Token::Var, Token::Name, Branch::UNCOND);
        assert_up_edge(ast, cfg, Token::Name, Token::ForIn, Branch::UNCOND);
        assert_down_edge(ast, cfg, Token::ForIn, Token::Block, Branch::ON_TRUE);
        assert_up_edge(ast, cfg, Token::ExprResult, Token::ForIn, Branch::UNCOND);
        assert_return_edge(ast, cfg, Token::ForIn);
    });
}

#[test]
fn testDoWhile() {
    let src = "var x; do { x(); } while (x); x();";
    let (ast, script, result) = create_cfg(src);
    let cfg = &result.cfg;
    let do_node = find(&ast, script, Token::Do);
    let body = Node::new(ast.first_child(do_node).unwrap());
    let body_stmt = Node::new(find(&ast, do_node, Token::ExprResult));
    let var = Node::new(ast.first_child(script).unwrap());
    let last = Node::new(ast.last_child(script).unwrap());
    // Control falls into the body, not the condition.
    assert!(cfg.is_connected(var, Branch::UNCOND, body));
    assert!(cfg.is_connected(body_stmt, Branch::UNCOND, Node::new(do_node)));
    assert!(cfg.is_connected(Node::new(do_node), Branch::ON_TRUE, body));
    assert!(cfg.is_connected(Node::new(do_node), Branch::ON_FALSE, last));
}

#[test]
fn testSimpleSwitch() {
    let src = "var x; switch (x) { case 1: x(); case 2: x(); default: x(); }";
    test_script(src, |ast, cfg| {
        assert_cross_edge(ast, cfg, Token::Var, Token::Switch, Branch::UNCOND);
        assert_down_edge(ast, cfg, Token::Switch, Token::Case, Branch::UNCOND);
        assert_cross_edge(ast, cfg, Token::Case, Token::Case, Branch::ON_FALSE);
        assert_cross_edge(ast, cfg, Token::Case, Token::DefaultCase, Branch::ON_FALSE);
        assert_down_edge(ast, cfg, Token::Case, Token::Block, Branch::ON_TRUE);
        assert_down_edge(ast, cfg, Token::DefaultCase, Token::Block, Branch::UNCOND);
        // Falling through to the body of the next case.
        assert_cross_edge(ast, cfg, Token::ExprResult, Token::Block, Branch::UNCOND);
        assert_return_edge(ast, cfg, Token::ExprResult);
    });
}

#[test]
fn testSwitchDefaultFirst() {
    // DEFAULT first with no other cases.
    let src = "var x; switch (x) { default: x(); }";
    test_script(src, |ast, cfg| {
        assert_down_edge(ast, cfg, Token::Switch, Token::DefaultCase, Branch::UNCOND);
        assert_down_edge(ast, cfg, Token::DefaultCase, Token::Block, Branch::UNCOND);
    });
}

#[test]
fn testSwitchNoCases() {
    let src = "var x; switch (x) {}";
    test_script(src, |ast, cfg| {
        assert_return_edge(ast, cfg, Token::Switch);
    });
}

#[test]
fn testSimpleTryCatchFinally() {
    let src = "try { a(); } catch (e) { b(); } finally { c(); }";
    let (ast, script, result) = create_cfg(src);
    let cfg = &result.cfg;
    let try_node = find(&ast, script, Token::Try);
    let catch_block = Node::new(ast.second_child(try_node).unwrap());
    let finally = Node::new(ast.last_child(try_node).unwrap());
    let a = call_stmt(&ast, script, "a");
    let b = call_stmt(&ast, script, "b");
    let c = call_stmt(&ast, script, "c");

    assert!(cfg.is_connected(Node::new(try_node), Branch::UNCOND, Node::new(ast.first_child(try_node).unwrap())));
    assert!(cfg.is_connected(a, Branch::ON_EX, catch_block));
    assert!(cfg.is_connected(a, Branch::UNCOND, finally));
    assert_down_edge(&ast, cfg, Token::Block, Token::Catch, Branch::UNCOND);
    assert_down_edge(&ast, cfg, Token::Catch, Token::Block, Branch::UNCOND);
    assert!(cfg.is_connected(b, Branch::ON_EX, finally));
    assert!(cfg.is_connected(b, Branch::UNCOND, finally));
    assert!(cfg.is_connected(c, Branch::UNCOND, Node::ImplicitReturn));
    assert!(!cfg.is_connected(c, Branch::ON_EX, finally));
}

#[test]
fn testThrow() {
    let src = "var x; try { throw x; } catch (e) { x(); }";
    let (ast, script, result) = create_cfg(src);
    let try_node = find(&ast, script, Token::Try);
    let throw = Node::new(find(&ast, script, Token::Throw));
    let catch_block = Node::new(ast.second_child(try_node).unwrap());
    assert!(result.cfg.is_connected(throw, Branch::ON_EX, catch_block));
    // A throw never falls through.
    assert_eq!(result.cfg.get_out_edges(throw).len(), 1);
}

#[test]
fn testThrowOutsideTry() {
    let src = "var x; throw x;";
    let (ast, script, result) = create_cfg(src);
    let throw = Node::new(find(&ast, script, Token::Throw));
    assert!(result.cfg.get_out_edges(throw).is_empty());
}

#[test]
fn testBreakWithFinally() {
    let src = "var x; while (x) { try { break; } finally { f(); } }";
    let (ast, script, result) = create_cfg(src);
    let cfg = &result.cfg;
    let try_node = find(&ast, script, Token::Try);
    let finally = Node::new(ast.last_child(try_node).unwrap());
    let break_node = Node::new(find(&ast, script, Token::Break));
    let while_node = Node::new(find(&ast, script, Token::While));
    let f = call_stmt(&ast, script, "f");

    assert!(cfg.is_connected(break_node, Branch::UNCOND, finally));
    assert!(cfg.is_connected(f, Branch::ON_EX, Node::ImplicitReturn));
    assert!(cfg.is_connected(f, Branch::UNCOND, while_node));
}

#[test]
fn testLabeledContinue() {
    let src = "var x, y; a: while (x) { while (y) { continue a; } }";
    let (ast, script, result) = create_cfg(src);
    let label = find(&ast, script, Token::Label);
    let outer = Node::new(ast.first_child(label).unwrap());
    let continue_node = Node::new(find(&ast, script, Token::Continue));
    assert!(result.cfg.is_connected(continue_node, Branch::UNCOND, outer));
    // The label falls through into the loop.
    assert_cross_edge(&ast, &result.cfg, Token::Var, Token::While, Branch::UNCOND);
}

#[test]
fn testFunction() {
    let src = "function f() { return; } f();";
    let (ast, script, result) = create_cfg(src);
    let cfg = &result.cfg;
    let function = Node::new(find(&ast, script, Token::Function));
    let f = call_stmt(&ast, script, "f");
    assert!(cfg.is_connected(Node::new(script), Branch::UNCOND, f));
    assert_down_edge(&ast, cfg, Token::Function, Token::Block, Branch::UNCOND);
    assert_return_edge(&ast, cfg, Token::Return);
    assert!(!cfg.is_connected(Node::new(script), Branch::UNCOND, function));
}

#[test]
fn testFunctionsAreSkippedWhenNotTraversed() {
    let mut ast = Ast::new();
    let script = parser::parse_script(&mut ast, "test.js", "function f() { f(); } f();").unwrap();
    let result = ControlFlowAnalysis::<(), ()>::analyze(&ast, script, false).unwrap();
    let function = Node::new(find(&ast, script, Token::Function));
    assert!(!result.cfg.has_node(function));
}

#[test]
fn testReturnThroughFinally() {
    let src = "function f() { try { return 1; } finally { g(); } }";
    let (ast, script, result) = create_cfg(src);
    let cfg = &result.cfg;
    let try_node = find(&ast, script, Token::Try);
    let finally = Node::new(ast.last_child(try_node).unwrap());
    let return_node = Node::new(find(&ast, script, Token::Return));
    let g = call_stmt(&ast, script, "g");
    assert!(cfg.is_connected(return_node, Branch::UNCOND, finally));
    assert!(!cfg.is_connected(return_node, Branch::UNCOND, Node::ImplicitReturn));
    assert!(cfg.is_connected(g, Branch::ON_EX, Node::ImplicitReturn));
}

#[test]
fn testNodePriorities() {
    let src = "var x; if (x) { x(); } x();";
    let (_, _, result) = create_cfg(src);
    let priorities = &result.node_priorities;
    assert_eq!(priorities.len(), result.cfg.graph.node_count());
    // The implicit return is always the first graph node and the last
    // to be processed. The entry comes first.
    let max = *priorities.iter().max().unwrap();
    assert_eq!(priorities[0], max);
    assert_eq!(priorities[1], 0);

    let mut sorted = priorities.clone();
    sorted.sort_unstable();
    sorted.dedup();
    assert_eq!(sorted.len(), priorities.len());
}

#[test]
fn testToDot() {
    let (ast, _, result) = create_cfg("var x; if (x) { x(); }");
    let dot = result.cfg.to_dot(|n| match n.node_id {
        Some(id) => format!("{:?}", ast.token(id)),
        None => "RETURN".to_string(),
    });
    assert!(dot.starts_with("digraph"));
    assert!(dot.contains("ON_TRUE"));
    assert!(dot.contains("RETURN"));
}
