use crate::control_flow::node::Node;
use crate::control_flow::ControlFlowAnalysis::{ControlFlowAnalysis, ControlFlowAnalysisResult};
use crate::ctx::Ctx;
use crate::diagnostics::JSError;
use crate::error::InferenceResult;
use crate::linked_flow_scope::{FlowScopeJoinOp, LinkedFlowScope};
use crate::options::InferenceOptions;
use crate::reverse_abstract_interpreter::{create_reverse_interpreter, ReverseAbstractInterpreter};
use crate::type_inference::TypeInference;
use crate::typed_scope::ScopeId;
use crate::typed_scope_creator::TypedScopeCreator;
use crate::typing::TypeId;
use crate::DataFlowAnalysis::{DataFlowAnalysis, LatticeElementId, LinearFlowState};
use ast::{Ast, NodeId, Token};

#[cfg(test)]
mod tests;

/**
 * A compiler pass to run the type inference analysis.
 *
 * Type analysis happens in two major phases: finding all the symbols of a
 * scope, then propagating the inferred types through its body. Scopes are
 * analysed outermost first, so that function literals typed from the call
 * they are passed to have their types before their own scope is built.
 */
pub struct TypeInferencePass {
    scopeCreator: TypedScopeCreator,
    reverseInterpreter: Box<dyn ReverseAbstractInterpreter>,
}

impl TypeInferencePass {
    pub fn new(ctx: &Ctx) -> Self {
        Self {
            scopeCreator: TypedScopeCreator::new(),
            reverseInterpreter: create_reverse_interpreter(ctx.options.coding_convention),
        }
    }

    /// Infers types over the externs and the scripts under the AST root.
    pub fn process(&mut self, ctx: &mut Ctx) -> InferenceResult<ScopeId> {
        let root = ctx.ast.root();
        self.inferAllScopes(ctx, root)
    }

    /// Entry point for type inference when running over part of the tree.
    /// Returns the scope of `inferenceRoot`.
    pub fn inferAllScopes(&mut self, ctx: &mut Ctx, inferenceRoot: NodeId) -> InferenceResult<ScopeId> {
        let _span = tracing::debug_span!("type_inference", root = ?inferenceRoot).entered();
        let parent = ctx.ast.parent(inferenceRoot).and_then(|parent| enclosing_scope(ctx, parent));
        let topScope = self.scopeCreator.createScope(ctx, inferenceRoot, parent);
        self.inferScope(ctx, inferenceRoot, topScope)?;
        self.inferNestedScopes(ctx, inferenceRoot, topScope)?;
        tracing::debug!(
            scopes = ctx.scopes.len(),
            diagnostics = ctx.diagnostics.errors().len(),
            "type inference finished"
        );
        Ok(topScope)
    }

    /// Creates and analyses the scope of every function under `n`, in
    /// pre-order.
    fn inferNestedScopes(&mut self, ctx: &mut Ctx, n: NodeId, scope: ScopeId) -> InferenceResult<()> {
        let ast = ctx.ast;
        for &child in ast.children(n) {
            if ast.is(child, Token::Function) {
                let functionScope = self.scopeCreator.createScope(ctx, child, Some(scope));
                self.inferScope(ctx, child, functionScope)?;
                self.inferNestedScopes(ctx, child, functionScope)?;
            } else {
                self.inferNestedScopes(ctx, child, scope)?;
            }
        }
        Ok(())
    }

    fn inferScope(&mut self, ctx: &mut Ctx, n: NodeId, scope: ScopeId) -> InferenceResult<()> {
        let _span = tracing::trace_span!("infer_scope", root = ?n).entered();
        let ControlFlowAnalysisResult {
            cfg,
            node_priorities,
        } = ControlFlowAnalysis::<LinearFlowState, LatticeElementId>::analyze(ctx.ast, n, false)?;
        let maxSteps = ctx.options.max_steps_per_node;

        let inference = TypeInference::new(ctx, cfg, &*self.reverseInterpreter, scope);
        let mut analysis: DataFlowAnalysis<'_, Node, _, LinkedFlowScope, FlowScopeJoinOp> =
            DataFlowAnalysis::with_max_steps(inference, &node_priorities, maxSteps);
        if let Err(e) = analysis.analyze() {
            tracing::warn!(root = ?n, "{}", e);
            return Err(e);
        }
        Ok(())
    }
}

/// The scope of the nearest function enclosing `n`, or the global scope.
fn enclosing_scope(ctx: &Ctx, n: NodeId) -> Option<ScopeId> {
    let ast = ctx.ast;
    std::iter::once(n)
        .chain(ast.ancestors(n))
        .filter(|&ancestor| ast.is(ancestor, Token::Function) || ancestor == ast.root())
        .find_map(|ancestor| ctx.scope_for_root(ancestor))
}

/// The result of type inference over a whole program: the type of every
/// expression, the typed scopes and the diagnostics reported.
pub struct TypedProgram<'ast> {
    pub ctx: Ctx<'ast>,
    pub global_scope: ScopeId,
}

impl<'ast> TypedProgram<'ast> {
    pub fn node_type(&self, n: NodeId) -> Option<TypeId> {
        self.ctx.type_registry.get_type(n)
    }

    /// The typed scope of a function or of the AST root.
    pub fn scope_for(&self, root: NodeId) -> Option<ScopeId> {
        self.ctx.scope_for_root(root)
    }

    pub fn diagnostics(&self) -> &[JSError] {
        self.ctx.diagnostics.errors()
    }
}

/// Builds the typed scopes of `ast` and infers the type of every
/// expression in it.
pub fn infer_types(ast: &Ast, options: InferenceOptions) -> InferenceResult<TypedProgram<'_>> {
    let mut ctx = Ctx::new(ast, options);
    let mut pass = TypeInferencePass::new(&ctx);
    let global_scope = pass.process(&mut ctx)?;
    Ok(TypedProgram { ctx, global_scope })
}
