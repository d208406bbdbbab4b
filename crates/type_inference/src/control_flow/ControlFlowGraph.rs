use super::node::CfgNode;
use ast::{node_util, Ast, NodeId, Token};
use petgraph::{
    dot::Dot,
    graph::{DiGraph, EdgeIndex, Neighbors, NodeIndex},
    visit::EdgeRef,
    EdgeDirection::{Incoming, Outgoing},
};
use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::Index;

pub trait Annotation {}

impl Annotation for () {}

/**
 * Control flow graph.
 *
 * @param <N> The instruction type of the control flow graph.
 * @param <NA> The annotation stored on each node.
 * @param <EA> The annotation stored on each edge.
 */
#[derive(Debug)]
pub struct ControlFlowGraph<N: CfgNode, NA: Annotation, EA: Annotation = ()> {
    pub map: FxHashMap<N, NodeIndex>,
    /**
     * A special node marked by the node value key null to a singleton
     * "return" when control is transferred outside of the current control flow
     * graph.
     */
    pub implicit_return: N,
    pub entry: N,
    pub graph: DiGraph<N, Branch>,
    pub node_annotations: FxHashMap<N, NA>,
    pub edge_annotations: FxHashMap<EdgeIndex, EA>,
}

impl<N, NA, EA> ControlFlowGraph<N, NA, EA>
where
    N: CfgNode,
    NA: Annotation,
    EA: Annotation,
{
    pub fn new(entry: N) -> Self {
        let mut graph = DiGraph::<N, Branch>::new();
        let implicit_return = N::implicit_return();
        let implicit_return_index = graph.add_node(implicit_return);
        let entry_index = graph.add_node(entry);

        let mut map = FxHashMap::with_capacity_and_hasher(2, Default::default());
        map.insert(implicit_return, implicit_return_index);
        map.insert(entry, entry_index);

        Self {
            implicit_return,
            entry,
            graph,
            map,
            node_annotations: Default::default(),
            edge_annotations: Default::default(),
        }
    }

    pub fn create_node(&mut self, value: N) -> NodeIndex {
        match self.map.get(&value) {
            Some(index) => *index,
            None => {
                let index = self.graph.add_node(value);

                self.map.insert(value, index);

                index
            }
        }
    }

    /**
     * Connects the two nodes in the control flow graph.
     *
     * @param fromNode Source.
     * @param toNode Destination.
     */
    pub fn create_edge(&mut self, from: N, branch: Branch, to: N) {
        let from_node = self.create_node(from);
        let to_node = self.create_node(to);
        self.connect_if_not_found(from_node, branch, to_node);
    }

    /**
     * Checks whether two nodes in the graph are connected by the given
     * edge type.
     */
    pub fn is_connected(&self, n1: N, edge: Branch, n2: N) -> bool {
        match (self.map.get(&n1), self.map.get(&n2)) {
            (Some(&n1), Some(&n2)) => self.is_connected_index(n1, edge, n2),
            _ => false,
        }
    }

    fn is_connected_index(&self, n1: NodeIndex, edge: Branch, n2: NodeIndex) -> bool {
        self.graph
            .edges_connecting(n1, n2)
            .any(|e| *e.weight() == edge)
    }

    /**
     * Connects two nodes in the graph with an edge if such edge does not already
     * exists between the nodes.
     */
    fn connect_if_not_found(&mut self, n1: NodeIndex, edge: Branch, n2: NodeIndex) {
        if !self.is_connected_index(n1, edge, n2) {
            self.graph.add_edge(n1, n2, edge);
        }
    }

    pub fn has_node(&self, node: N) -> bool {
        self.map.contains_key(&node)
    }

    /// Note: neighbor are listed in reverse order of their addition to the graph,
    /// so the most recently added edge's neighbor is listed first.
    pub fn get_directed_succ_nodes(&self, node: N) -> Neighbors<'_, Branch> {
        self.graph
            .neighbors_directed(self.index_of(node), Outgoing)
    }

    pub fn get_directed_pred_nodes(&self, node: N) -> Neighbors<'_, Branch> {
        self.graph.neighbors_directed(self.index_of(node), Incoming)
    }

    /// The outgoing edges of `node` in the order they were created.
    pub fn get_out_edges(&self, node: N) -> Vec<(EdgeIndex, Branch, N)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(self.index_of(node), Outgoing)
            .map(|e| (e.id(), *e.weight(), self.graph[e.target()]))
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);
        edges
    }

    /// The incoming edges of `node` in the order they were created.
    pub fn get_in_edges(&self, node: N) -> Vec<(EdgeIndex, Branch, N)> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(self.index_of(node), Incoming)
            .map(|e| (e.id(), *e.weight(), self.graph[e.source()]))
            .collect();
        edges.sort_by_key(|(id, _, _)| *id);
        edges
    }

    pub fn get_edge_annotation(&self, edge: EdgeIndex) -> Option<&EA> {
        self.edge_annotations.get(&edge)
    }

    fn index_of(&self, node: N) -> NodeIndex {
        // Note: We use ::end() as a sentinel value here. It should never be
        // assigned to a node, and asking petgraph for the neighbors of an
        // unused index conveniently returns an empty iterator.
        self.map.get(&node).copied().unwrap_or_else(NodeIndex::end)
    }

    /// Renders the graph in the dot format, labelling nodes with `label`.
    pub fn to_dot<F>(&self, label: F) -> String
    where
        F: Fn(N) -> String,
    {
        struct Label(String);

        impl fmt::Debug for Label {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        let graph = self.graph.map(|_, n| Label(label(*n)), |_, e| *e);
        let dot = format!("{:?}", Dot::with_config(&graph, &[]));
        recolour_graph(dot, graph.node_count())
    }
}

impl<N, NA, EA> Index<NodeIndex> for ControlFlowGraph<N, NA, EA>
where
    N: CfgNode,
    NA: Annotation,
    EA: Annotation,
{
    type Output = N;

    fn index(&self, index: NodeIndex) -> &N {
        &self.graph[index]
    }
}

/**
 * The edge object for the control flow graph.
 */
#[derive(PartialEq, Eq, Debug, Clone, Copy, Hash)]
pub enum Branch {
    /** Edge is taken if the condition is true. */
    ON_TRUE,
    /** Edge is taken if the condition is false. */
    ON_FALSE,
    /** Unconditional branch. */
    UNCOND,
    /**
     * Exception-handling code paths.
     * Conflates two kind of control flow passing:
     * - An exception is thrown, and falls into a catch or finally block
     * - During exception handling, a finally block finishes and control
     *   passes to the next finally block.
     * In theory, we need 2 different edge types. In practice, we
     * can just treat them as "the edges we can't really optimize".
     */
    ON_EX,
}

/**
 * @return True if n should be represented by a new CFG node in the control
 * flow graph.
 */
pub fn is_entering_new_cfg_node(ast: &Ast, n: NodeId) -> bool {
    let parent = match ast.parent(n) {
        Some(parent) => parent,
        None => return true,
    };
    match ast.token(parent) {
        Token::Root | Token::Script | Token::Block | Token::Try => true,
        Token::Function => {
            // A function node represents the start of a function where the name
            // bleeds into the local scope and parameters are assigned
            // to the formal argument names. The node includes the name of the
            // function and the PARAM_LIST since we assume the whole set up process
            // is atomic without change in control flow. The next change of
            // control is going into the function's body, represented by the last
            // child.
            ast.last_child(parent) == Some(n)
        }
        Token::While | Token::Do | Token::If => {
            // These control structures are represented by a node that holds the
            // condition. Each of them is a branch node based on its condition.
            node_util::get_condition_expression(ast, parent) != Some(n)
        }
        Token::For => {
            // The FOR(;;) node differs from other control structures in that
            // it has an initialization and an increment statement. Those
            // two statements have corresponding CFG nodes to represent them.
            // The FOR node only represents the condition check for each iteration.
            // That way the following:
            // for(var x = 0; x < 10; x++) { } has a graph that is isomorphic to
            // var x = 0; while(x<10) {  x++; }
            ast.second_child(parent) != Some(n)
        }
        Token::ForIn => ast.last_child(parent) == Some(n),
        Token::Switch | Token::Case | Token::Catch => ast.first_child(parent) != Some(n),
        _ => false,
    }
}

/// Changes the colours of control flow edges so they can be visually distinguished.
fn recolour_graph(mut dot: String, node_count: usize) -> String {
    dot = dot.replacen("[ ", "[color=lightblue2, style=filled, ", node_count);

    dot = dot
        .replace(
            "[ label = \"UNCOND\" ]",
            "[label=\"UNCOND\", fontcolor=\"purple\", color=\"purple\"]",
        )
        .replace(
            "[ label = \"ON_FALSE\" ]",
            "[label=\"ON_FALSE\", fontcolor=\"orange\", color=\"orange\"]",
        )
        .replace(
            "[ label = \"ON_TRUE\" ]",
            "[label=\"ON_TRUE\", fontcolor=\"green\", color=\"green\"]",
        )
        .replace(
            "[ label = \"ON_EX\" ]",
            "[label=\"ON_EX\", fontcolor=\"red\", color=\"red\"]",
        );

    dot
}
