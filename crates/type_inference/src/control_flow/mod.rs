pub mod ControlFlowAnalysis;
pub mod ControlFlowGraph;
pub mod node;
pub mod util;

#[cfg(test)]
#[allow(non_snake_case)]
mod tests;
