use std::collections::BTreeSet;
use std::marker::PhantomData;
use std::ops::Index;

use index::newtype_index;
use petgraph::graph::{EdgeIndex, NodeIndex};

use crate::control_flow::ControlFlowAnalysis::NodePriority;
use crate::control_flow::{node::CfgNode, ControlFlowGraph::*};
use crate::error::{InferenceError, InferenceResult};


/// The maximum number of steps per individual CFG node before we assume the analysis is divergent.
pub const MAX_STEPS_PER_NODE: usize = 20000;

pub struct DataFlowAnalysis<'p, N, I, L, J>
where
    N: CfgNode,
    I: DataFlowAnalysisInner<N, L, J>,
    L: LatticeElement,
    J: FlowJoiner<L, I>,
{
    pub inner: I,

    /// The set of nodes that need to be considered, ordered by their priority
    /// as determined by control flow analysis and data flow direction.
    work_queue: UniqueQueue<'p>,

    max_steps_per_node: usize,

    _phantom1: PhantomData<L>,
    _phantom2: PhantomData<J>,
    _phantom3: PhantomData<N>,
}

impl<'p, N, I, L, J> DataFlowAnalysis<'p, N, I, L, J>
where
    N: CfgNode,
    I: DataFlowAnalysisInner<N, L, J>,
    L: LatticeElement,
    J: FlowJoiner<L, I>,
{
    /// Constructs a data flow analysis.
    ///
    /// `analyze` annotates the result to the control flow graph without any modification of the graph
    /// itself. Additional calls to `analyze` recomputes the analysis which can be useful if the
    /// control flow graph has been modified.
    pub fn new(inner: I, node_priorities: &'p [NodePriority]) -> Self {
        Self::with_max_steps(inner, node_priorities, MAX_STEPS_PER_NODE)
    }

    pub fn with_max_steps(
        inner: I,
        node_priorities: &'p [NodePriority],
        max_steps_per_node: usize,
    ) -> Self {
        Self {
            work_queue: UniqueQueue::new(node_priorities, inner.is_forward()),

            inner,
            max_steps_per_node,

            _phantom1: PhantomData,
            _phantom2: PhantomData,
            _phantom3: PhantomData,
        }
    }

    /// Finds a fixed-point solution. The function has the side effect of replacing the existing node
    /// annotations with the computed solutions.
    ///
    /// Initially, each node's input and output flow state contains the value given by
    /// `create_initial_estimate_lattice` (with the exception of the entry node of the graph which
    /// takes on the `create_entry_lattice` value). Each node will use the output state of its
    /// predecessor and compute an output state according to the instruction. At that time, any nodes
    /// that depend on the node's newly modified output value will need to recompute their output state
    /// again. Each step will perform a computation at one node until no extra computation will modify
    /// any existing output state any more.
    ///
    /// Branched analyses additionally annotate every edge with the state flowing along it.
    pub fn analyze(&mut self) -> InferenceResult<()> {
        self.analyze_inner().map_err(|node| InferenceError::Divergence {
            node: format!("{:?}", node),
            steps: self.max_steps_per_node,
        })
    }

    fn analyze_inner(&mut self) -> Result<(), N> {
        debug_assert!(
            !self.inner.is_branched() || self.inner.is_forward(),
            "branched analyses must be forward"
        );
        self.initialize();
        while let Some(cur_node_idx) = self.work_queue.pop() {
            let cur_node = self.inner.cfg().graph[cur_node_idx];
            if self.inner.cfg().node_annotations[&cur_node].step_count > self.max_steps_per_node {
                return Err(cur_node);
            }
            self.update_flow_state(cur_node, |state| state.step_count += 1);

            self.join_inputs(cur_node);
            if self.flow(cur_node) {
                // If there is a change in the current node, we want to grab the list
                // of nodes that this node affects.
                let next_nodes: Vec<NodeIndex> = if self.inner.is_forward() {
                    self.inner.cfg().get_directed_succ_nodes(cur_node).collect()
                } else {
                    self.inner.cfg().get_directed_pred_nodes(cur_node).collect()
                };

                for next_node in next_nodes {
                    let node = self.inner.cfg()[next_node];
                    if node != self.inner.cfg().implicit_return {
                        self.work_queue.push(next_node);
                    }
                }
            }
        }
        if self.inner.is_forward() {
            self.join_inputs(self.inner.cfg().implicit_return);
        }
        Ok(())
    }

    /// Initializes the work list and the control flow graph.
    fn initialize(&mut self) {
        self.work_queue.clear();

        let indices: Vec<NodeIndex> = self.inner.cfg().graph.node_indices().collect();
        for i in indices {
            let node = self.inner.cfg().graph[i];
            let in_ = self.inner.create_initial_estimate_lattice();
            let out = self.inner.create_initial_estimate_lattice();
            self.inner
                .cfg_mut()
                .node_annotations
                .insert(node, LinearFlowState::new(in_, out));
            if node != self.inner.cfg().implicit_return {
                self.work_queue.push(i);
            }
        }

        if self.inner.is_branched() {
            let edges: Vec<EdgeIndex> = self.inner.cfg().graph.edge_indices().collect();
            for edge in edges {
                let estimate = self.inner.create_initial_estimate_lattice();
                self.inner.cfg_mut().edge_annotations.insert(edge, estimate);
            }
        }
    }

    /// Performs a single flow through a node.
    /// Returns `true` if the flow state differs from the previous state.
    fn flow(&mut self, node: N) -> bool {
        let state = self.inner.cfg().node_annotations[&node];
        if self.inner.is_branched() {
            let out_edges = self.inner.cfg().get_out_edges(node);
            let outputs = self.inner.branched_flow_through(node, state.in_);
            debug_assert_eq!(outputs.len(), out_edges.len());

            let mut changed = false;
            for (&(edge, _, _), &output) in out_edges.iter().zip(outputs.iter()) {
                let before = self.inner.cfg().get_edge_annotation(edge).copied();
                if before.map_or(true, |before| self.inner[before] != self.inner[output]) {
                    changed = true;
                }
                self.inner.cfg_mut().edge_annotations.insert(edge, output);
            }
            if let Some(&first) = outputs.first() {
                self.update_flow_state(node, |state| state.out = first);
            }
            changed
        } else if self.inner.is_forward() {
            let out_before = state.out;
            let new_out = self.inner.flow_through(node, state.in_);
            self.update_flow_state(node, |state| state.out = new_out);
            self.inner[out_before] != self.inner[new_out]
        } else {
            let in_before = state.in_;
            let new_in = self.inner.flow_through(node, state.out);
            self.update_flow_state(node, |state| state.in_ = new_in);
            self.inner[in_before] != self.inner[new_in]
        }
    }

    /// Computes the new flow state at a given node's entry by merging the output (input) lattice
    /// of the node's predecessor (successor).
    fn join_inputs(&mut self, node: N) {
        if self.inner.is_forward() && self.inner.cfg().entry == node {
            let entry = self.inner.create_entry_lattice();
            self.update_flow_state(node, |state| state.in_ = entry);
            return;
        }

        let edges = if self.inner.is_forward() {
            self.inner.cfg().get_in_edges(node)
        } else {
            self.inner.cfg().get_out_edges(node)
        };

        let result = match edges.as_slice() {
            // No relevant edges.
            [] => return,
            // Only one relevant edge.
            [(edge, _, other)] => get_input_from_edge(&mut self.inner, *edge, *other),
            _ => {
                let mut joiner = self.inner.create_flow_joiner();
                for &(edge, _, other) in &edges {
                    let input = get_input_from_edge(&mut self.inner, edge, other);
                    joiner.join_flow(&mut self.inner, input);
                }
                self.inner.add_lattice_element(joiner.finish())
            }
        };

        if self.inner.is_forward() {
            self.update_flow_state(node, |state| state.in_ = result);
        } else {
            self.update_flow_state(node, |state| state.out = result);
        }
    }

    fn update_flow_state<F>(&mut self, node: N, op: F)
    where
        F: FnOnce(&mut LinearFlowState),
    {
        // All nodes have had their state initialized.
        if let Some(state) = self.inner.cfg_mut().node_annotations.get_mut(&node) {
            op(state);
        }
    }
}

/// The state flowing along `edge`, whose other endpoint is `other`.
fn get_input_from_edge<N, I, L, J>(inner: &mut I, edge: EdgeIndex, other: N) -> LatticeElementId
where
    N: CfgNode,
    I: DataFlowAnalysisInner<N, L, J>,
    L: LatticeElement,
    J: FlowJoiner<L, I>,
{
    if inner.is_forward() {
        if inner.is_branched() {
            if let Some(&annotation) = inner.cfg().get_edge_annotation(edge) {
                return annotation;
            }
        }
        inner.cfg().node_annotations[&other].out
    } else {
        if other == inner.cfg().implicit_return {
            return inner.create_entry_lattice();
        }
        inner.cfg().node_annotations[&other].in_
    }
}

/// A framework to help writing static program analysis.
///
/// Implementers should specify how a single node changes the state of a program.
/// This class finds a safe estimate (a fixed-point) for the whole program. The proven facts about
/// the program will be annotated to the given control flow graph's nodes in form of [LatticeElement]
/// after calling `analyze`.
///
/// As a guideline, the following is a list of behaviors that any analysis can take:
///
/// * Flow Direction: Is the analysis a forward or backward analysis?
/// * Lattice Elements: How does the analysis represent the state of the program at any given
///   point?
/// * JOIN Operation: Given two incoming paths and a lattice state value, what can the compiler
///   conclude at the join point?
/// * Flow Equations: How does an instruction modify the state of program in terms of lattice
///   values?
/// * Initial Entry Value: What can the compiler assume at the beginning of the program?
/// * Initial Estimate: What can the compiler assume at each point of the program? (What is the
///   BOTTOM value of the lattice) By definition this lattice JOIN `x` for any `x`
///   must also be `x`.
///
/// To make these behaviors known to the framework, the following steps must be taken.
///
/// * Flow Direction: Implement [DataFlowAnalysisInner::is_forward].
/// * Lattice Elements: Implement [LatticeElement].
/// * JOIN Operation: Implement [FlowJoiner::join_flow].
/// * Flow Equations: Implement [DataFlowAnalysisInner::flow_through].
/// * Initial Entry Value: Implement [DataFlowAnalysisInner::create_entry_lattice].
/// * Initial Estimate: Implement [DataFlowAnalysisInner::create_initial_estimate_lattice].
///
/// Forward analyses that learn something from the branch taken (for example
/// that `x` is not null on the `ON_TRUE` edge of `if (x)`) return true from
/// [DataFlowAnalysisInner::is_branched] and implement
/// [DataFlowAnalysisInner::branched_flow_through].
///
/// Upon execution of the `analyze` method, nodes of the input control flow graph will be
/// annotated with a `LinearFlowState` object that represents maximum fixed point solution. Any
/// previous annotations at the nodes of the control flow graph will be lost.
///
/// - `N` The control flow graph's node value type.
/// - `L` Lattice element type.
pub trait DataFlowAnalysisInner<N, L, J>: Index<LatticeElementId, Output = L>
where
    N: CfgNode,
    L: LatticeElement,
    J: FlowJoiner<L, Self>,
    Self: Sized,
{
    fn add_lattice_element(&mut self, element: L) -> LatticeElementId;
    /// Checks whether the analysis is a forward flow analysis or backward flow analysis.
    fn is_forward(&self) -> bool;
    /// Gets the incoming state of the entry node.
    fn create_entry_lattice(&mut self) -> LatticeElementId;
    /// Gets the state of the initial estimation at each node.
    fn create_initial_estimate_lattice(&mut self) -> LatticeElementId;
    /// Gets a new joiner for an analysis step.
    ///
    /// The joiner is invoked once for each input edge and then the final joined result is
    /// retrieved. No joiner will be created for a single input.
    fn create_flow_joiner(&self) -> J;
    /// Computes the output state for a given node given its input state.
    fn flow_through(&mut self, node: N, input: LatticeElementId) -> LatticeElementId;

    /// Whether the analysis computes a separate output for every outgoing edge.
    fn is_branched(&self) -> bool {
        false
    }

    /// Computes one output state per outgoing edge of `node`, in the order
    /// returned by [ControlFlowGraph::get_out_edges].
    fn branched_flow_through(&mut self, node: N, input: LatticeElementId) -> Vec<LatticeElementId> {
        let output = self.flow_through(node, input);
        vec![output; self.cfg().get_out_edges(node).len()]
    }

    fn cfg(&self) -> &ControlFlowGraph<N, LinearFlowState, LatticeElementId>;
    fn cfg_mut(&mut self) -> &mut ControlFlowGraph<N, LinearFlowState, LatticeElementId>;
}

/// A reducer that joins flow states from distinct input states into a single input state.
pub trait FlowJoiner<L, I> {
    fn join_flow(&mut self, inner: &mut I, input: LatticeElementId);

    fn finish(self) -> L;
}

pub trait LatticeElement: Annotation + PartialEq {}

/// The in and out states of a node.
#[derive(Debug, Clone, Copy)]
pub struct LinearFlowState {
    pub step_count: usize,
    pub in_: LatticeElementId,
    pub out: LatticeElementId,
}

impl LinearFlowState {
    pub fn new(in_: LatticeElementId, out: LatticeElementId) -> Self {
        Self {
            step_count: 0,
            in_,
            out,
        }
    }
}

impl Annotation for LinearFlowState {}

newtype_index!(pub struct LatticeElementId { .. });

impl Annotation for LatticeElementId {}

#[derive(Debug)]
pub struct PrioritizedNode(NodePriority, NodeIndex);

impl PartialEq for PrioritizedNode {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

impl Eq for PrioritizedNode {}

impl std::cmp::Ord for PrioritizedNode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl std::cmp::PartialOrd for PrioritizedNode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Debug)]
pub struct UniqueQueue<'p> {
    inner: BTreeSet<PrioritizedNode>,
    priorities: &'p [NodePriority],
    forwards: bool,
}

impl<'p> UniqueQueue<'p> {
    pub fn new(priorities: &'p [NodePriority], forwards: bool) -> Self {
        Self {
            inner: BTreeSet::new(),
            priorities,
            forwards,
        }
    }

    pub fn pop(&mut self) -> Option<NodeIndex> {
        if self.forwards {
            // Forwards analyses visit nodes with lower priorities first.
            self.inner.pop_first().map(|p| p.1)
        } else {
            // Backwards analyses visit nodes with higher priorities first.
            self.inner.pop_last().map(|p| p.1)
        }
    }

    pub fn push(&mut self, node: NodeIndex) {
        let priority = self.priorities.get(node.index()).copied().unwrap_or(NodePriority::MAX);
        self.inner.insert(PrioritizedNode(priority, node));
    }

    pub fn clear(&mut self) {
        self.inner.clear()
    }
}
