use crate::coding_convention::{create_coding_convention, CodingConvention};
use crate::diagnostics::{DiagnosticSink, DiagnosticType, JSError};
use crate::first_order_function_analyzer::FunctionAnalysisResults;
use crate::options::InferenceOptions;
use crate::typed_scope::{ScopeId, TypedScope};
use crate::typed_var::{TypedVar, TypedVarId};
use crate::typing::{TypeId, TypeRegistry};
use ast::{Ast, JsWord, NodeId};
use index::vec::IndexVec;
use rustc_hash::{FxHashMap, FxHashSet};

/// The state shared by scope creation and type inference over one
/// compilation: the AST, every typed scope and variable, the type registry
/// and the diagnostics reported so far.
pub struct Ctx<'ast> {
    pub ast: &'ast Ast,
    pub scopes: IndexVec<ScopeId, TypedScope>,
    pub vars: IndexVec<TypedVarId, TypedVar>,
    pub type_registry: TypeRegistry,
    pub diagnostics: DiagnosticSink,
    pub options: InferenceOptions,
    pub convention: Box<dyn CodingConvention>,

    /// Typed scopes by root node (the AST root or a FUNCTION).
    scope_roots: FxHashMap<NodeId, ScopeId>,
    lattice_bottom: Option<ScopeId>,

    pub(crate) function_analysis: Option<FunctionAnalysisResults>,
    /// Function literals whose type was inferred from the context they are
    /// passed in, rather than declared.
    pub(crate) inferred_functions: FxHashSet<NodeId>,
}

impl<'ast> Ctx<'ast> {
    pub fn new(ast: &'ast Ast, options: InferenceOptions) -> Self {
        Self {
            ast,
            scopes: IndexVec::new(),
            vars: IndexVec::new(),
            type_registry: TypeRegistry::new(),
            diagnostics: DiagnosticSink::new(options.check_levels.clone()),
            convention: create_coding_convention(options.coding_convention),
            options,
            scope_roots: FxHashMap::default(),
            lattice_bottom: None,
            function_analysis: None,
            inferred_functions: FxHashSet::default(),
        }
    }

    pub fn report(&mut self, node: NodeId, kind: DiagnosticType, args: &[&str]) {
        self.diagnostics.report(JSError::make(self.ast, node, kind, args));
    }

    pub fn scope_for_root(&self, root: NodeId) -> Option<ScopeId> {
        self.scope_roots.get(&root).copied()
    }

    pub(crate) fn push_scope<F>(&mut self, root: NodeId, create: F) -> ScopeId
    where
        F: FnOnce(ScopeId) -> TypedScope,
    {
        let id = self.scopes.next_index();
        let scope = create(id);
        self.scopes.push(scope);
        self.scope_roots.insert(root, id);
        id
    }

    /// The empty scope flow states start from before they are reached.
    pub(crate) fn lattice_bottom(&mut self) -> ScopeId {
        if let Some(bottom) = self.lattice_bottom {
            return bottom;
        }
        let root = self.ast.root();
        let id = self.scopes.next_index();
        self.scopes.push(TypedScope::createLatticeBottom(id, root));
        self.lattice_bottom = Some(id);
        id
    }

    /// Looks up a name in `scope` and then its parents.
    pub fn getVar(&self, scope: ScopeId, name: &str) -> Option<TypedVarId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            let scope = &self.scopes[id];
            if let Some(var) = scope.getOwnSlot(name) {
                return Some(var);
            }
            current = scope.get_parent();
        }
        None
    }

    /// The type of a name in `scope`: `None` if it is undeclared or has no
    /// type yet.
    pub fn getVarType(&self, scope: ScopeId, name: &str) -> Option<TypeId> {
        self.getVar(scope, name).and_then(|var| self.vars[var].ty)
    }

    pub fn declare(
        &mut self,
        scope: ScopeId,
        name: &JsWord,
        nameNode: Option<NodeId>,
        ty: Option<TypeId>,
        inferred: bool,
    ) -> TypedVarId {
        let var = self.vars.push(TypedVar::new(inferred, name, nameNode, ty, scope));
        self.scopes[scope].declareInternal(name, var);
        var
    }

    pub fn undeclare(&mut self, scope: ScopeId, name: &str) {
        self.scopes[scope].undeclareInternal(name);
    }

    pub fn getTypeOfThis(&self, scope: ScopeId) -> TypeId {
        self.scopes[scope]
            .getTypeOfThis()
            .unwrap_or(self.type_registry.common_types.UNKNOWN_TYPE)
    }
}
