use crate::ctx::Ctx;
use crate::typed_var::TypedVarId;
use crate::typing::TypeId;
use ast::{JsWord, NodeId};
use indexmap::IndexMap;

index::newtype_index! {
    pub struct ScopeId {
        DEBUG_FORMAT = "ScopeId({})"
    }
}

/// The static symbol table of the program (rooted at the AST root) or of a
/// single function (rooted at the FUNCTION node).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedScope {
    id: ScopeId,
    vars: IndexMap<JsWord, TypedVarId>,
    rootNode: NodeId,

    parent: Option<ScopeId>,
    depth: usize,

    /// Whether this is a bottom scope for the purposes of type inference.
    isBottom: bool,

    typeOfThis: Option<TypeId>,
}

impl TypedScope {
    /**
     * Creates a empty Scope (bottom of the lattice).
     *
     * @param rootNode Typically a FUNCTION node or the global ROOT.
     * @param isBottom Whether this is the bottom of a lattice. Otherwise, it must be a global scope.
     */
    fn new_empty(id: ScopeId, rootNode: NodeId, is_bottom: bool, typeOfThis: Option<TypeId>) -> Self {
        Self {
            id,
            vars: IndexMap::new(),
            rootNode,
            parent: None,
            depth: 0,
            isBottom: is_bottom,
            typeOfThis,
        }
    }

    pub fn createGlobalScope(id: ScopeId, rootNode: NodeId, typeOfThis: TypeId) -> Self {
        TypedScope::new_empty(id, rootNode, false, Some(typeOfThis))
    }

    pub fn createLatticeBottom(id: ScopeId, rootNode: NodeId) -> Self {
        TypedScope::new_empty(id, rootNode, true, None)
    }

    /// A function scope nested in `parent`.
    pub fn createChildScope(id: ScopeId, parent: &TypedScope, rootNode: NodeId) -> Self {
        Self {
            id,
            vars: IndexMap::new(),
            rootNode,
            parent: Some(parent.id),
            depth: parent.depth + 1,
            isBottom: false,
            typeOfThis: None,
        }
    }

    pub fn id(&self) -> ScopeId {
        self.id
    }

    /** Whether this is the bottom of the lattice. */
    pub fn isBottom(&self) -> bool {
        self.isBottom
    }

    pub fn get_depth(&self) -> usize {
        self.depth
    }

    pub fn get_parent(&self) -> Option<ScopeId> {
        self.parent
    }

    /** Gets the container node of the scope: the FUNCTION node or the global ROOT. */
    pub fn getRootNode(&self) -> NodeId {
        self.rootNode
    }

    /// The type of `this` inside the scope. Unknown when the function has
    /// no declared receiver.
    pub fn getTypeOfThis(&self) -> Option<TypeId> {
        self.typeOfThis
    }

    pub(crate) fn setTypeOfThis(&mut self, ty: TypeId) {
        self.typeOfThis = Some(ty);
    }

    /// Like `Ctx::getVar`, but does not look in parent scopes.
    pub fn getOwnSlot(&self, name: &str) -> Option<TypedVarId> {
        self.vars.get(&JsWord::from(name)).copied()
    }

    pub fn hasOwnSlot(&self, name: &str) -> bool {
        self.vars.contains_key(&JsWord::from(name))
    }

    /// Variables in declaration order.
    pub fn getVarIterable(&self) -> impl Iterator<Item = TypedVarId> + '_ {
        self.vars.values().copied()
    }

    /** Returns number of variables in this scope. */
    pub fn getVarCount(&self) -> usize {
        self.vars.len()
    }

    /** Returns whether this is the global scope. */
    pub fn isGlobal(&self) -> bool {
        self.parent.is_none() && !self.isBottom
    }

    /** Returns whether this is a local scope (i.e. not the global scope). */
    pub fn isLocal(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn declareInternal(&mut self, name: &JsWord, var: TypedVarId) {
        debug_assert!(!self.vars.contains_key(name), "Illegal shadow: {}", name);
        self.vars.insert(name.clone(), var);
    }

    pub(crate) fn undeclareInternal(&mut self, name: &str) -> Option<TypedVarId> {
        self.vars.shift_remove(&JsWord::from(name))
    }

    /** Walks up the tree to find the global scope. */
    pub fn getGlobalScope(&self, ctx: &Ctx) -> ScopeId {
        let mut result = self.id;
        while let Some(parent) = ctx.scopes[result].parent {
            result = parent;
        }
        result
    }

    /** Returns the nearest common parent between two scopes. */
    pub fn getCommonParent(&self, ctx: &Ctx, other: ScopeId) -> ScopeId {
        let mut left = Some(self.id);
        let mut right = Some(other);
        while let (Some(left_id), Some(right_id)) = (left, right) {
            if left_id == right_id {
                break;
            }
            let left_depth = ctx.scopes[left_id].get_depth();
            let right_depth = ctx.scopes[right_id].get_depth();
            if left_depth >= right_depth {
                left = ctx.scopes[left_id].parent;
            }
            if left_depth <= right_depth {
                right = ctx.scopes[right_id].parent;
            }
        }
        match (left, right) {
            (Some(left), Some(right)) if left == right => left,
            // Scopes of different trees only meet at the global scope.
            _ => self.getGlobalScope(ctx),
        }
    }
}
