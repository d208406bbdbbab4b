use super::node::{CfgNode, Node};
use super::util::*;
use super::ControlFlowGraph::{Annotation, Branch, ControlFlowGraph};
use crate::error::{InferenceError, InferenceResult};
use ast::{Ast, NodeId, Token};
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;
use std::collections::BinaryHeap;

pub type NodePriority = usize;

pub struct ControlFlowAnalysisResult<N: CfgNode, NA: Annotation, EA: Annotation> {
    pub cfg: ControlFlowGraph<N, NA, EA>,
    /// The priority of every graph node, indexed by its `NodeIndex`.
    pub node_priorities: Vec<NodePriority>,
}

pub struct ControlFlowAnalysis<'a, NA: Annotation, EA: Annotation> {
    ast: &'a Ast,
    cfg: ControlFlowGraph<Node, NA, EA>,
    astPosition: FxHashMap<Node, usize>,
    nodePriorities: FxHashMap<Node, NodePriority>,
    astPositionCounter: usize,
    priorityCounter: usize,
    // We need to store where we started, in case we aren't doing a flow analysis
    // for the whole scope. This happens, for example, when running type inference
    // on only the externs.
    root: NodeId,
    should_traverse_functions: bool,
    /// This stack captures the structure of nested TRY blocks. The top of the
    /// stack is the inner most TRY block. A FUNCTION node in this stack implies
    /// that the handler is determined by the caller of the function at runtime.
    exception_handler: Vec<NodeId>,
    /// This map is used to handle the follow of FINALLY. For example:
    /// ```js
    /// while(x) {
    ///  try {
    ///    try {
    ///      break;
    ///    } catch (a) {
    ///    } finally {
    ///      foo();
    ///    }
    ///    fooFollow();
    ///  } catch (b) {
    ///  } finally {
    ///    bar();
    ///  }
    ///  barFollow();
    /// }
    /// END();
    /// ```
    ///
    /// In this case `finally_map` will contain a map from:
    ///    first FINALLY -> bar()
    ///    second FINALLY -> END()
    ///
    /// When we are connecting foo() and bar() to to their respective follow, we
    /// must also look up this map and connect:
    ///   foo() -> bar()
    ///   bar() -> END
    ///
    finally_map: MultiMap<NodeId, Node>,
}

impl<'a, NA, EA> ControlFlowAnalysis<'a, NA, EA>
where
    NA: Annotation,
    EA: Annotation,
{
    /// Builds the control flow graph of `root`, a function, script or the
    /// AST root. Nested functions are only entered when
    /// `should_traverse_functions` is set.
    pub fn analyze(
        ast: &'a Ast,
        root: NodeId,
        should_traverse_functions: bool,
    ) -> InferenceResult<ControlFlowAnalysisResult<Node, NA, EA>> {
        let mut cfa = Self {
            ast,
            cfg: ControlFlowGraph::new(Node::new(compute_fall_through(ast, root))),
            astPosition: FxHashMap::default(),
            nodePriorities: FxHashMap::default(),
            astPositionCounter: 0,
            priorityCounter: 0,
            root,
            should_traverse_functions,
            exception_handler: Vec::new(),
            finally_map: MultiMap::default(),
        };

        cfa.traverse(root, None)?;

        cfa.prioritize_node(cfa.cfg.implicit_return); // the implicit return is last.

        // Now, generate the priority of nodes by doing a depth-first
        // search on the CFG.
        let entry = cfa.cfg.entry;
        cfa.prioritizeFromEntryNode(entry);

        if cfa.should_traverse_functions {
            // If we're traversing inner functions, we need to rank the
            // priority of them too.

            // prioritizeFromEntryNode doesn't modify the graph, so we don't have
            // to worry about skipping nodes.
            for i in 0..cfa.cfg.graph.node_count() {
                let candidate = cfa.cfg.graph.raw_nodes()[i].weight;
                if candidate
                    .node_id
                    .map_or(false, |id| ast.is(id, Token::Function))
                {
                    cfa.prioritizeFromEntryNode(candidate);
                }
            }
        }

        // At this point, all reachable nodes have been given a priority, but
        // unreachable nodes have not been given a priority. Put them last.
        // Presumably, it doesn't really matter what priority they get, since
        // this shouldn't happen in real code.
        for &candidate in cfa.cfg.graph.node_weights() {
            if let Entry::Vacant(entry) = cfa.nodePriorities.entry(candidate) {
                entry.insert(cfa.priorityCounter);
                cfa.priorityCounter += 1;
            }
        }

        // Again, the implicit return node is always last.
        cfa.nodePriorities
            .insert(cfa.cfg.implicit_return, cfa.priorityCounter);

        let node_priorities = cfa
            .cfg
            .graph
            .node_indices()
            .map(|i| cfa.nodePriorities[&cfa.cfg.graph[i]])
            .collect();

        Ok(ControlFlowAnalysisResult {
            cfg: cfa.cfg,
            node_priorities,
        })
    }

    /**
     * Given an entry node, find all the nodes reachable from that node
     * and prioritize them.
     */
    fn prioritizeFromEntryNode(&mut self, entry: Node) {
        #[derive(Debug)]
        struct PrioritizedNode(usize, Node);

        impl PartialEq for PrioritizedNode {
            fn eq(&self, other: &Self) -> bool {
                self.0 == other.0
            }
        }

        impl Eq for PrioritizedNode {}

        impl std::cmp::Ord for PrioritizedNode {
            fn cmp(&self, other: &Self) -> std::cmp::Ordering {
                // Reversed so lower positions are visited first.
                other.0.cmp(&self.0)
            }
        }

        impl std::cmp::PartialOrd for PrioritizedNode {
            fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
                Some(self.cmp(other))
            }
        }

        let mk = |s: &Self, node: Node| {
            let position = s.astPosition.get(&node).copied().unwrap_or(usize::MAX);
            PrioritizedNode(position, node)
        };

        let mut worklist = BinaryHeap::with_capacity(10);
        worklist.push(mk(self, entry));

        while let Some(PrioritizedNode(_, current)) = worklist.pop() {
            if self.nodePriorities.contains_key(&current) {
                continue;
            }

            self.nodePriorities.insert(current, self.priorityCounter);
            self.priorityCounter += 1;

            let successors = self
                .cfg
                .get_directed_succ_nodes(current)
                .map(|n| mk(self, self.cfg.graph[n]));
            worklist.extend(successors);
        }
    }

    fn prioritize_node(&mut self, node: Node) {
        debug_assert!(
            !self.astPosition.contains_key(&node),
            "node has already been prioritized {:?}",
            node
        );
        self.astPosition.insert(node, self.astPositionCounter);
        self.astPositionCounter += 1;
    }

    fn traverse(&mut self, n: NodeId, parent: Option<NodeId>) -> InferenceResult<()> {
        if !self.should_traverse(n, parent) {
            return Ok(());
        }
        let ast = self.ast;
        for &child in ast.children(n) {
            self.traverse(child, Some(n))?;
        }
        self.visit(n)
    }

    /*
     * We are going to stop the traversal depending on what the node's parent
     * is.
     *
     * We are only interested in adding edges between nodes that change control
     * flow. The most obvious ones are loops and IF-ELSE's. A statement
     * transfers control to its next sibling.
     *
     * In case of an expression tree, there is no control flow within the tree
     * even when there are short circuited operators and conditionals. When we
     * are doing data flow analysis, we will simply synthesize lattices up the
     * expression tree by finding the meet at each expression node.
     *
     * For example: within a Token.SWITCH, the expression in question does not
     * change the control flow and need not to be considered.
     */
    fn should_traverse(&mut self, n: NodeId, parent: Option<NodeId>) -> bool {
        let ast = self.ast;
        self.prioritize_node(Node::new(n));

        match ast.token(n) {
            Token::Function => {
                if self.should_traverse_functions || Node::new(n) == self.cfg.entry {
                    self.exception_handler.push(n);
                    return true;
                }
                return false;
            }
            Token::Try => {
                self.exception_handler.push(n);
                return true;
            }
            _ => {}
        }

        let parent = match parent {
            Some(parent) => parent,
            None => return true,
        };
        match ast.token(parent) {
            // Only traverse the body of the for loop.
            Token::For | Token::ForIn => ast.last_child(parent) == Some(n),
            // Skip the conditions.
            Token::If | Token::While => ast.first_child(parent) != Some(n),
            Token::Do => ast.second_child(parent) != Some(n),
            // Only traverse the body of the cases.
            Token::Switch | Token::Case | Token::Catch => ast.first_child(parent) != Some(n),
            Token::Function => ast.last_child(parent) == Some(n),
            Token::Continue
            | Token::Break
            | Token::ExprResult
            | Token::Var
            | Token::Return
            | Token::Throw => false,
            Token::Try => {
                // When we are done with the TRY block and there is no FINALLY
                // block, no more exceptions can be handled at this TRY
                // statement. With a FINALLY, the same holds once the CATCH is
                // done.
                let done = if has_finally(ast, parent) {
                    ast.child_at(parent, 2) == Some(n)
                } else {
                    ast.second_child(parent) == Some(n)
                };
                if done {
                    debug_assert_eq!(self.exception_handler.last(), Some(&parent));
                    self.exception_handler.pop();
                }
                true
            }
            _ => true,
        }
    }

    fn visit(&mut self, n: NodeId) -> InferenceResult<()> {
        match self.ast.token(n) {
            Token::If => self.handle_if(n),
            Token::While => self.handle_while(n),
            Token::Do => self.handle_do(n),
            Token::For => self.handle_for(n),
            Token::ForIn => self.handle_for_in(n),
            Token::Switch => self.handle_switch(n),
            Token::Case => self.handle_case(n),
            Token::DefaultCase => self.handle_default(n),
            Token::Root | Token::Script | Token::Block => self.handle_stmt_list(n),
            Token::Function => self.handle_function(n),
            Token::ExprResult => self.handle_expr(n),
            Token::Throw => self.handle_throw(n),
            Token::Try => self.handle_try(n),
            Token::Catch => self.handle_catch(n),
            Token::Break => return self.handle_break(n),
            Token::Continue => return self.handle_continue(n),
            Token::Return => self.handle_return(n),
            Token::Label => {}
            _ => self.handle_stmt(n),
        }
        Ok(())
    }

    fn create_edge(&mut self, from: NodeId, branch: Branch, to: Node) {
        self.cfg.create_edge(Node::new(from), branch, to);
    }

    fn fall_through(&self, n: NodeId) -> Node {
        Node::new(compute_fall_through(self.ast, n))
    }

    fn handle_if(&mut self, if_node: NodeId) {
        let ast = self.ast;
        let then_block = ast.second_child(if_node);
        let else_block = ast.child_at(if_node, 2);

        if let Some(then_block) = then_block {
            let to = self.fall_through(then_block);
            self.create_edge(if_node, Branch::ON_TRUE, to);
        }
        match else_block {
            Some(else_block) => {
                let to = self.fall_through(else_block);
                self.create_edge(if_node, Branch::ON_FALSE, to);
            }
            None => {
                // not taken branch
                let to = self.compute_follow_node(if_node, if_node);
                self.create_edge(if_node, Branch::ON_FALSE, to);
            }
        }
        if let Some(condition) = ast.first_child(if_node) {
            self.connect_to_possible_exception_handler(if_node, condition);
        }
    }

    fn handle_while(&mut self, while_node: NodeId) {
        let ast = self.ast;
        // Control goes to the first statement if the condition evaluates to true.
        if let Some(body) = ast.second_child(while_node) {
            let to = self.fall_through(body);
            self.create_edge(while_node, Branch::ON_TRUE, to);
        }

        // We add the on-false branch unless the loop test is the `true` keyword
        // (i.e. `while (true) {}`), in which case the loop is infinite and
        // there is no on-false branch.
        let condition = ast.first_child(while_node);
        if !ast::node_util::is_infinite_loop_condition(ast, condition) {
            // Control goes to the follow() if the condition evaluates to false.
            let follow_node = self.compute_follow_node(while_node, while_node);
            self.create_edge(while_node, Branch::ON_FALSE, follow_node);
        }

        if let Some(condition) = condition {
            self.connect_to_possible_exception_handler(while_node, condition);
        }
    }

    fn handle_do(&mut self, do_node: NodeId) {
        let ast = self.ast;
        // The first edge can be the initial iteration as well as the iterations
        // after.
        if let Some(body) = ast.first_child(do_node) {
            let to = self.fall_through(body);
            self.create_edge(do_node, Branch::ON_TRUE, to);
        }
        // The edge that leaves the do loop if the condition fails.
        let follow_node = self.compute_follow_node(do_node, do_node);
        self.create_edge(do_node, Branch::ON_FALSE, follow_node);

        if let Some(condition) = ast.last_child(do_node) {
            self.connect_to_possible_exception_handler(do_node, condition);
        }
    }

    fn handle_for(&mut self, for_node: NodeId) {
        let ast = self.ast;
        // We have for (init; cond; iter) { body }
        let (init, cond, iter, body) = match ast.children(for_node) {
            &[init, cond, iter, body] => (init, cond, iter, body),
            _ => return,
        };
        // After initialization, we transfer to the FOR which is in charge of
        // checking the condition (for the first time).
        self.create_edge(init, Branch::UNCOND, Node::new(for_node));
        // The edge that transfer control to the beginning of the loop body.
        let to = self.fall_through(body);
        self.create_edge(for_node, Branch::ON_TRUE, to);
        // The edge to end of the loop.
        if !ast.is(cond, Token::Empty) {
            let follow_node = self.compute_follow_node(for_node, for_node);
            self.create_edge(for_node, Branch::ON_FALSE, follow_node);
        }
        // The end of the body will have a unconditional branch to our iter
        // (handled by calling computeFollowNode of the last instruction of the
        // body. Our iter will jump to the forNode again to another condition
        // check.
        self.create_edge(iter, Branch::UNCOND, Node::new(for_node));
        self.connect_to_possible_exception_handler(init, init);
        self.connect_to_possible_exception_handler(for_node, cond);
        self.connect_to_possible_exception_handler(iter, iter);
    }

    fn handle_for_in(&mut self, for_node: NodeId) {
        let ast = self.ast;
        // We have for (item in collection) { body }
        let (collection, body) = match ast.children(for_node) {
            &[_, collection, body] => (collection, body),
            _ => return,
        };
        // The collection behaves like init.
        self.create_edge(collection, Branch::UNCOND, Node::new(for_node));
        // The edge that transfer control to the beginning of the loop body.
        let to = self.fall_through(body);
        self.create_edge(for_node, Branch::ON_TRUE, to);
        // The edge to end of the loop.
        let follow_node = self.compute_follow_node(for_node, for_node);
        self.create_edge(for_node, Branch::ON_FALSE, follow_node);
        self.connect_to_possible_exception_handler(for_node, collection);
    }

    fn handle_switch(&mut self, switch_node: NodeId) {
        let ast = self.ast;
        let cases = &ast.children(switch_node)[1..];
        // Transfer to the first non-DEFAULT CASE. If there are none, transfer
        // to the DEFAULT or the follow of the switch.
        match cases.iter().find(|&&case| ast.is(case, Token::Case)) {
            Some(&next) => self.create_edge(switch_node, Branch::UNCOND, Node::new(next)),
            None => match cases.first() {
                // Has no CASE but possibly a DEFAULT
                Some(&default) => {
                    self.create_edge(switch_node, Branch::UNCOND, Node::new(default))
                }
                // No CASE, no DEFAULT
                None => {
                    let follow_node = self.compute_follow_node(switch_node, switch_node);
                    self.create_edge(switch_node, Branch::UNCOND, follow_node);
                }
            },
        }
        if let Some(discriminant) = ast.first_child(switch_node) {
            self.connect_to_possible_exception_handler(switch_node, discriminant);
        }
    }

    fn handle_case(&mut self, case_node: NodeId) {
        let ast = self.ast;
        // Case is a bit tricky. First it goes into the body if condition is true.
        if let Some(body) = ast.second_child(case_node) {
            self.create_edge(case_node, Branch::ON_TRUE, Node::new(body));
        }
        // Look for the next CASE, skipping over DEFAULT.
        let next = ast.siblings(case_node)[1..]
            .iter()
            .copied()
            .find(|&sibling| ast.is(sibling, Token::Case));
        match next {
            Some(next) => {
                // Found a CASE
                self.create_edge(case_node, Branch::ON_FALSE, Node::new(next));
            }
            None => {
                // No more CASE found, go back and search for a DEFAULT.
                let default = ast.parent(case_node).and_then(|switch| {
                    ast.children(switch)
                        .iter()
                        .copied()
                        .find(|&case| ast.is(case, Token::DefaultCase))
                });
                match default {
                    Some(default) => {
                        self.create_edge(case_node, Branch::ON_FALSE, Node::new(default))
                    }
                    None => {
                        // No DEFAULT found, go to the follow of the SWITCH.
                        let follow_node = self.compute_follow_node(case_node, case_node);
                        self.create_edge(case_node, Branch::ON_FALSE, follow_node);
                    }
                }
            }
        }
        if let Some(test) = ast.first_child(case_node) {
            self.connect_to_possible_exception_handler(case_node, test);
        }
    }

    fn handle_default(&mut self, default_node: NodeId) {
        // Directly goes to the body. It should not transfer to the next case.
        if let Some(body) = self.ast.first_child(default_node) {
            self.create_edge(default_node, Branch::UNCOND, Node::new(body));
        }
    }

    fn handle_stmt_list(&mut self, node: NodeId) {
        let ast = self.ast;
        // Special case, don't add a block of empty CATCH block to the graph.
        if let Some(parent) = ast.parent(node) {
            if ast.is(parent, Token::Try)
                && get_catch_block(ast, parent) == Some(node)
                && !has_catch_handler(ast, node)
            {
                return;
            }
        }

        // A block transfer control to its first child if it is not empty.
        // Function declarations are skipped since control doesn't go into that
        // function (unless it is called)
        let child = ast
            .children(node)
            .iter()
            .copied()
            .find(|&child| !ast.is(child, Token::Function));

        match child {
            Some(child) => {
                let to = self.fall_through(child);
                self.create_edge(node, Branch::UNCOND, to);
            }
            None => {
                let follow_node = self.compute_follow_node(node, node);
                self.create_edge(node, Branch::UNCOND, follow_node);
            }
        }
    }

    fn handle_function(&mut self, function: NodeId) {
        // A function transfers control to its body.
        if let Some(body) = self.ast.last_child(function) {
            let to = self.fall_through(body);
            self.create_edge(function, Branch::UNCOND, to);
        }
        debug_assert_eq!(self.exception_handler.last(), Some(&function));
        self.exception_handler.pop();
    }

    fn handle_expr(&mut self, node: NodeId) {
        let follow_node = self.compute_follow_node(node, node);
        self.create_edge(node, Branch::UNCOND, follow_node);
        self.connect_to_possible_exception_handler(node, node);
    }

    fn handle_throw(&mut self, node: NodeId) {
        self.connect_to_possible_exception_handler(node, node);
    }

    fn handle_try(&mut self, node: NodeId) {
        if let Some(block) = self.ast.first_child(node) {
            self.create_edge(node, Branch::UNCOND, Node::new(block));
        }
    }

    fn handle_catch(&mut self, node: NodeId) {
        if let Some(block) = self.ast.last_child(node) {
            self.create_edge(node, Branch::UNCOND, Node::new(block));
        }
    }

    fn handle_stmt(&mut self, node: NodeId) {
        // Simply transfer to the next line.
        let follow_node = self.compute_follow_node(node, node);
        self.create_edge(node, Branch::UNCOND, follow_node);
        self.connect_to_possible_exception_handler(node, node);
    }

    fn handle_break(&mut self, node: NodeId) -> InferenceResult<()> {
        let ast = self.ast;
        let label = label_of(ast, node);
        let mut cur = node;
        let mut previous = None;
        let mut last_jump = node;

        /*
         * Continuously look up the ancestor tree for the BREAK target or the target
         * with the corresponding label and connect to it. If along the path we
         * discover a FINALLY, we will connect the BREAK to that FINALLY. From then
         * on, we will just record the control flow changes in the finallyMap. This
         * is due to the fact that we need to connect any node that leaves its own
         * FINALLY block to the outer FINALLY or the BREAK's target but those nodes
         * are not known yet due to the way we traverse the nodes.
         */
        while !is_break_target(ast, cur, label) {
            if ast.is(cur, Token::Try) && has_finally(ast, cur) && ast.last_child(cur) != previous {
                if let Some(finally) = ast.last_child(cur) {
                    let to = self.fall_through(finally);
                    if last_jump == node {
                        self.create_edge(last_jump, Branch::UNCOND, to);
                    } else {
                        self.finally_map.put(last_jump, to);
                    }
                    last_jump = cur;
                }
            }
            previous = Some(cur);
            cur = match ast.parent(cur) {
                Some(parent) if cur != self.root => parent,
                _ => {
                    return Err(InferenceError::MalformedAst {
                        node,
                        message: "cannot find break target",
                    })
                }
            };
        }

        let follow_node = self.compute_follow_node(cur, cur);
        if last_jump == node {
            self.create_edge(last_jump, Branch::UNCOND, follow_node);
        } else {
            self.finally_map.put(last_jump, follow_node);
        }
        Ok(())
    }

    fn handle_continue(&mut self, node: NodeId) -> InferenceResult<()> {
        let ast = self.ast;
        let label = label_of(ast, node);
        let mut cur = node;
        let mut previous = None;
        let mut last_jump = node;

        // Similar to handBreak's logic with a few minor variation.
        while !is_continue_target(ast, cur, label) {
            if ast.is(cur, Token::Try) && has_finally(ast, cur) && ast.last_child(cur) != previous {
                if let Some(finally) = ast.last_child(cur) {
                    if last_jump == node {
                        self.create_edge(last_jump, Branch::UNCOND, Node::new(finally));
                    } else {
                        let to = self.fall_through(finally);
                        self.finally_map.put(last_jump, to);
                    }
                    last_jump = cur;
                }
            }
            previous = Some(cur);
            cur = match ast.parent(cur) {
                Some(parent) if cur != self.root => parent,
                _ => {
                    return Err(InferenceError::MalformedAst {
                        node,
                        message: "cannot find continue target",
                    })
                }
            };
        }

        let mut iter = cur;
        if ast.is(cur, Token::For) {
            // the increment happens after the continue
            if let Some(incr) = ast.child_at(cur, 2) {
                iter = incr;
            }
        }

        if last_jump == node {
            self.create_edge(node, Branch::UNCOND, Node::new(iter));
        } else {
            self.finally_map.put(last_jump, Node::new(iter));
        }
        Ok(())
    }

    fn handle_return(&mut self, node: NodeId) {
        let ast = self.ast;
        let mut last_jump = None;
        for i in (0..self.exception_handler.len()).rev() {
            let cur_handler = self.exception_handler[i];
            if ast.is(cur_handler, Token::Function) {
                break;
            }
            if has_finally(ast, cur_handler) {
                if let Some(finally) = ast.last_child(cur_handler) {
                    match last_jump {
                        None => self.create_edge(node, Branch::UNCOND, Node::new(finally)),
                        Some(last_jump) => {
                            let to = self.fall_through(finally);
                            self.finally_map.put(last_jump, to);
                        }
                    }
                    last_jump = Some(cur_handler);
                }
            }
        }

        if let Some(value) = ast.first_child(node) {
            self.connect_to_possible_exception_handler(node, value);
        }

        match last_jump {
            None => {
                let implicit_return = self.cfg.implicit_return;
                self.create_edge(node, Branch::UNCOND, implicit_return);
            }
            Some(last_jump) => {
                self.finally_map.put(last_jump, self.cfg.implicit_return);
            }
        }
    }

    /**
     * Connects cfgNode to the proper CATCH block if target subtree might throw
     * an exception. If there are FINALLY blocks reached before a CATCH, it will
     * make the corresponding entry in finallyMap.
     */
    fn connect_to_possible_exception_handler(&mut self, cfg_node: NodeId, target: NodeId) {
        let ast = self.ast;
        if !may_throw_exception(ast, target) || self.exception_handler.is_empty() {
            return;
        }
        let mut last_jump = cfg_node;
        for i in (0..self.exception_handler.len()).rev() {
            let handler = self.exception_handler[i];
            if ast.is(handler, Token::Function) {
                return;
            }
            debug_assert!(ast.is(handler, Token::Try));
            let catch_block = get_catch_block(ast, handler);

            let mut last_jump_in_catch_block = false;
            for ancestor in ast.ancestors(last_jump) {
                if ancestor == handler {
                    break;
                } else if Some(ancestor) == catch_block {
                    last_jump_in_catch_block = true;
                    break;
                }
            }

            let has_catch = catch_block.map_or(false, |block| has_catch_handler(ast, block));
            // No catch but a FINALLY, or lastJump is inside the catch block.
            if !has_catch || last_jump_in_catch_block {
                if let Some(finally) = ast.last_child(handler) {
                    if last_jump == cfg_node {
                        self.create_edge(cfg_node, Branch::ON_EX, Node::new(finally));
                    } else {
                        self.finally_map.put(last_jump, Node::new(finally));
                    }
                }
            } else if let Some(catch_block) = catch_block {
                // Has a catch.
                if last_jump == cfg_node {
                    self.create_edge(cfg_node, Branch::ON_EX, Node::new(catch_block));
                    return;
                } else {
                    self.finally_map.put(last_jump, Node::new(catch_block));
                }
            }
            last_jump = handler;
        }
    }

    /**
     * Computes the follow() node of a given node and its parent. There is a side
     * effect when calling this function. If this function computed an edge that
     * exists a FINALLY, it'll attempt to connect the fromNode to the outer
     * FINALLY according to the finallyMap.
     *
     * @param fromNode The original source node since {@code node} is changed
     *        during recursion.
     * @param node The node that follow() should compute.
     */
    fn compute_follow_node(&mut self, from_node: NodeId, mut node: NodeId) -> Node {
        let ast = self.ast;
        loop {
            /*
             * This is the case where:
             *
             * 1. Parent is null implies that we are transferring control to the end of
             * the script.
             *
             * 2. Parent is a function implies that we are transferring control back to
             * the caller of the function.
             *
             * 3. If the node is root then we have reached the end of what we have been
             * asked to traverse.
             *
             * In all cases we should transfer control to a "symbolic return" node.
             * This will make life easier for DFAs.
             */
            let parent = match ast.parent(node) {
                Some(parent) if node != self.root && !ast.is(parent, Token::Function) => parent,
                _ => return Node::ImplicitReturn,
            };

            match ast.token(parent) {
                // The follow() of any of the path from IF would be what follows IF.
                Token::If => {
                    node = parent;
                    continue;
                }
                Token::Case | Token::DefaultCase => {
                    // After the body of a CASE, the control goes to the body of the next
                    // case, without having to go to the case condition.
                    match ast.next(parent) {
                        Some(next_case) => {
                            return Node::new(ast.last_child(next_case).unwrap_or(next_case))
                        }
                        None => {
                            node = parent;
                            continue;
                        }
                    }
                }
                Token::ForIn => return Node::new(parent),
                Token::For => return Node::new(ast.child_at(parent, 2).unwrap_or(parent)),
                Token::While | Token::Do => return Node::new(parent),
                Token::Try => {
                    let has_finally = has_finally(ast, parent);
                    // If we are coming out of the TRY block...
                    if ast.first_child(parent) == Some(node) {
                        if let (true, Some(finally)) = (has_finally, ast.last_child(parent)) {
                            // and have FINALLY block.
                            return self.fall_through(finally);
                        }
                        // and have no FINALLY.
                        node = parent;
                        continue;
                    // CATCH block.
                    } else if get_catch_block(ast, parent) == Some(node) {
                        if let (true, Some(finally)) = (has_finally, ast.next(node)) {
                            return self.fall_through(finally);
                        }
                        node = parent;
                        continue;
                    // If we are coming out of the FINALLY block...
                    } else if ast.last_child(parent) == Some(node) {
                        if let Some(targets) = self.finally_map.get(&parent).cloned() {
                            for finally_node in targets {
                                self.create_edge(from_node, Branch::ON_EX, finally_node);
                            }
                        }
                        // Control is transferred up the AST to the parent's follow
                        // node.
                        node = parent;
                        continue;
                    }
                }
                _ => {}
            }

            // Now that we are done with the special cases follow should be its
            // immediate sibling, unless its sibling is a function.
            let next_sibling = ast.siblings(node)[1..]
                .iter()
                .copied()
                // Skip function declarations because control doesn't get passed into it.
                .find(|&sibling| !ast.is(sibling, Token::Function));

            match next_sibling {
                Some(next_sibling) => return self.fall_through(next_sibling),
                None => {
                    // If there are no more siblings, control is transferred up
                    // the AST to the parent's follow node.
                    node = parent;
                }
            }
        }
    }
}

fn label_of(ast: &Ast, jump: NodeId) -> Option<&str> {
    let label = ast.string(jump);
    if label.is_empty() {
        None
    } else {
        Some(&**label)
    }
}
