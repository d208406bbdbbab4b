use crate::control_flow::ControlFlowGraph::Annotation;
use crate::ctx::Ctx;
use crate::typed_scope::ScopeId;
use crate::typed_var::TypedVarId;
use crate::typing::TypeId;
use crate::DataFlowAnalysis::{FlowJoiner, LatticeElement, LatticeElementId};
use ast::{node_util, JsWord, NodeId};
use im_rc::HashMap;
use std::hash::Hash;
use std::ops::Index;

#[cfg(test)]
mod tests;

trait Reconcile<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
{
    /// Merges two maps. Keys present in both maps with equal values are
    /// copied; every other key is passed to `joiner` with the value from
    /// each side.
    fn reconcile<J>(&self, other: &HashMap<K, V>, joiner: J) -> HashMap<K, V>
    where
        J: FnMut(&K, Option<&V>, Option<&V>) -> V;
}

impl<K, V> Reconcile<K, V> for HashMap<K, V>
where
    K: Hash + Eq + Clone,
    V: Clone + PartialEq,
{
    fn reconcile<J>(&self, other: &HashMap<K, V>, mut joiner: J) -> HashMap<K, V>
    where
        J: FnMut(&K, Option<&V>, Option<&V>) -> V,
    {
        let mut out = HashMap::new();
        for (key, this_value) in self.iter() {
            let that_value = other.get(key);
            if that_value == Some(this_value) {
                // There's no need to call the joiner fn when the values are equal.
                out.insert(key.clone(), this_value.clone());
                continue;
            }
            out.insert(key.clone(), joiner(key, Some(this_value), that_value));
        }
        for (key, that_value) in other.iter() {
            if !self.contains_key(key) {
                out.insert(key.clone(), joiner(key, None, Some(that_value)));
            }
        }
        out
    }
}

/**
 * A flow scope that tries to store as little symbol information as possible,
 * instead delegating to its parents. Optimized for low memory use.
 */
#[derive(Debug, Clone)]
pub struct LinkedFlowScope {
    /// Map from TypedScope to OverlayScope.
    scopes: HashMap<ScopeId, OverlayScope>,
    functionScope: ScopeId,
    /// The TypedScope for the block that this flow scope is defined for.
    syntacticScope: ScopeId,
}

impl PartialEq for LinkedFlowScope {
    // The syntactic scope is reset at the start of every CFG node, so it
    // takes no part in convergence.
    fn eq(&self, other: &Self) -> bool {
        self.functionScope == other.functionScope && self.scopes == other.scopes
    }
}

impl Annotation for LinkedFlowScope {}

impl LatticeElement for LinkedFlowScope {}

impl LinkedFlowScope {
    fn new(
        scopes: HashMap<ScopeId, OverlayScope>,
        syntacticScope: ScopeId,
        functionScope: ScopeId,
    ) -> Self {
        Self {
            scopes,
            syntacticScope,
            functionScope,
        }
    }

    /**
     * Returns the scope map, trimmed to the common ancestor between this FlowScope's syntacticScope
     * and the given scope. Any inferred types on variables in deeper scopes cannot be propagated past
     * this point (since they're no longer in scope), and trimming them eagerly allows us to ignore
     * these irrelevant types when checking equality and joining.
     */
    fn trimScopes(&self, ctx: &Ctx, scope: ScopeId) -> HashMap<ScopeId, OverlayScope> {
        let mut thisScope = Some(self.syntacticScope);
        let mut thatScope = Some(scope);
        let mut thisDepth = ctx.scopes[self.syntacticScope].get_depth();
        let mut thatDepth = ctx.scopes[scope].get_depth();
        let mut result = self.scopes.clone();
        while thatDepth > thisDepth {
            match thatScope {
                Some(that) => thatScope = ctx.scopes[that].get_parent(),
                None => break,
            }
            thatDepth -= 1;
        }
        while thisDepth > thatDepth {
            match thisScope {
                Some(this) => {
                    result = result.without(&this);
                    thisScope = ctx.scopes[this].get_parent();
                }
                None => break,
            }
            thisDepth -= 1;
        }
        while let (Some(this), Some(that)) = (thisScope, thatScope) {
            if this == that {
                break;
            }
            result = result.without(&this);
            thisScope = ctx.scopes[this].get_parent();
            thatScope = ctx.scopes[that].get_parent();
        }
        result
    }

    /** Whether this flows from a bottom scope. */
    pub fn flowsFromBottom(&self, ctx: &Ctx) -> bool {
        ctx.scopes[self.functionScope].isBottom()
    }

    /** Creates an entry lattice for the flow. */
    pub fn createEntryLattice(scope: ScopeId) -> LinkedFlowScope {
        LinkedFlowScope::new(HashMap::new(), scope, scope)
    }

    /// The element standing for unreachable code.
    pub fn createLatticeBottom(ctx: &mut Ctx) -> LinkedFlowScope {
        LinkedFlowScope::createEntryLattice(ctx.lattice_bottom())
    }

    pub fn inferSlotType(self, ctx: &Ctx, symbol: &JsWord, ty: TypeId) -> LinkedFlowScope {
        let scope_id = self.getVarScope(ctx, symbol);
        let scope = match self.scopes.get(&scope_id) {
            Some(scope) => scope.clone(),
            None => OverlayScope::new(scope_id),
        };
        let newScope = scope.infer(symbol, ty);
        // Aggressively remove empty scopes to maintain a reasonable equivalence.
        let newScopes = if !newScope.slots.is_empty() {
            self.scopes.update(scope_id, newScope)
        } else {
            self.scopes.without(&scope_id)
        };
        if newScopes != self.scopes {
            LinkedFlowScope::new(newScopes, self.syntacticScope, self.functionScope)
        } else {
            self
        }
    }

    /// Records the type of a qualified name. Inside functions a name seen for
    /// the first time is declared on the scope that owns its root; global
    /// qualified names are declared by the scope creator.
    pub fn inferQualifiedSlot(
        self,
        ctx: &mut Ctx,
        node: NodeId,
        symbol: &JsWord,
        bottomType: TypeId,
        inferredType: TypeId,
        declared: bool,
    ) -> LinkedFlowScope {
        if ctx.scopes[self.functionScope].isLocal() {
            let mut var = ctx.getVar(self.syntacticScope, symbol);
            if var.is_none() {
                let root = node_util::root_of_qualified_name_str(symbol);
                let rootScope = match ctx.getVar(self.syntacticScope, root) {
                    Some(rootVar) => ctx.vars[rootVar].scope,
                    None => ctx.scopes[self.syntacticScope].getGlobalScope(ctx),
                };
                var = Some(ctx.declare(rootScope, symbol, Some(node), Some(bottomType), !declared));
            }

            if let Some(var) = var {
                let var = &ctx.vars[var];
                if !var.typeInferred {
                    // Use the inferred type over the declared type only if the
                    // inferred type is a strict subtype of the declared type.
                    let registry = &ctx.type_registry;
                    let narrower = var.ty.map_or(false, |declaredType| {
                        registry.is_subtype(inferredType, declaredType)
                            && !registry.is_subtype(declaredType, inferredType)
                    });
                    if !narrower {
                        return self;
                    }
                }
            }
        }
        self.inferSlotType(ctx, symbol, inferredType)
    }

    /** Get the slot for the given symbol. */
    pub fn getSlot(&self, ctx: &Ctx, name: &str) -> Option<Slot> {
        let scope = self.getVarScope(ctx, name);
        match self.scopes.get(&scope) {
            Some(overlay) => overlay.getSlot(ctx, name),
            None => ctx.getVar(self.syntacticScope, name).map(Slot::Typed),
        }
    }

    pub fn getTypeOfThis(&self, ctx: &Ctx) -> TypeId {
        ctx.getTypeOfThis(self.functionScope)
    }

    /// The typed scope owning `name`, or owning its root for qualified names
    /// not declared yet.
    fn getVarScope(&self, ctx: &Ctx, name: &str) -> ScopeId {
        if let Some(var) = ctx.getVar(self.syntacticScope, name) {
            return ctx.vars[var].scope;
        }
        let root = node_util::root_of_qualified_name_str(name);
        ctx.getVar(self.syntacticScope, root)
            .map(|var| ctx.vars[var].scope)
            .unwrap_or(self.functionScope)
    }

    pub fn withSyntacticScope(self, ctx: &Ctx, scope: ScopeId) -> LinkedFlowScope {
        if scope != self.syntacticScope {
            LinkedFlowScope::new(self.trimScopes(ctx, scope), scope, self.functionScope)
        } else {
            self
        }
    }

    pub fn getDeclarationScope(&self) -> ScopeId {
        self.syntacticScope
    }

    pub fn getCommonParentDeclarationScope(
        ctx: &Ctx,
        left: &LinkedFlowScope,
        right: &LinkedFlowScope,
    ) -> ScopeId {
        if left.flowsFromBottom(ctx) {
            return right.syntacticScope;
        } else if right.flowsFromBottom(ctx) {
            return left.syntacticScope;
        }
        ctx.scopes[left.syntacticScope].getCommonParent(ctx, right.syntacticScope)
    }

    /// Joins the flow facts of two scopes reaching the same point.
    pub fn join_scopes(ctx: &mut Ctx, a: &LinkedFlowScope, b: &LinkedFlowScope) -> LinkedFlowScope {
        if a.scopes == b.scopes && a.functionScope == b.functionScope {
            return a.clone();
        }
        let common = LinkedFlowScope::getCommonParentDeclarationScope(ctx, a, b);
        let functionScope = if a.flowsFromBottom(ctx) {
            b.functionScope
        } else {
            a.functionScope
        };
        LinkedFlowScope::new(LinkedFlowScope::join(ctx, a, b, common), common, functionScope)
    }

    fn join(
        ctx: &mut Ctx,
        linkedA: &LinkedFlowScope,
        linkedB: &LinkedFlowScope,
        commonParent: ScopeId,
    ) -> HashMap<ScopeId, OverlayScope> {
        let aFromBottom = linkedA.flowsFromBottom(ctx);
        let bFromBottom = linkedB.flowsFromBottom(ctx);
        let trimmedA = linkedA.trimScopes(ctx, commonParent);
        let trimmedB = linkedB.trimScopes(ctx, commonParent);
        trimmedA.reconcile(&trimmedB, |&scopeKey, scopeA, scopeB| {
            // Types only present on one side are joined with the declared type
            // of the other side, unless that side is unreachable.
            let typedScopeA = (!aFromBottom).then_some(scopeKey);
            let typedScopeB = (!bFromBottom).then_some(scopeKey);
            let empty = HashMap::new();
            let slotsA = scopeA.map_or(&empty, |scope| &scope.slots);
            let slotsB = scopeB.map_or(&empty, |scope| &scope.slots);
            let slots = slotsA.reconcile(slotsB, |name, slotA, slotB| {
                // There are 5 different join cases:
                // 1) The type is present in joinedScopeA, not in joinedScopeB,
                //    and not in functionScope. Just use the one in A.
                // 2) The type is present in joinedScopeB, not in joinedScopeA,
                //    and not in functionScope. Just use the one in B.
                // 3) The type is present in functionScope and joinedScopeA, but
                //    not in joinedScopeB. Join the two types.
                // 4) The type is present in functionScope and joinedScopeB, but
                //    not in joinedScopeA. Join the two types.
                // 5) The type is present in joinedScopeA and joinedScopeB. Join
                //    the two types.
                match (slotA, slotB) {
                    (Some(slotA), None) => {
                        let fnSlotType = typedScopeB.and_then(|scope| ctx.getVarType(scope, name));
                        match fnSlotType {
                            // Case #1
                            None => slotA.clone(),
                            Some(fnSlotType) if fnSlotType == slotA.ty => slotA.clone(),
                            // Case #3
                            Some(fnSlotType) => slotA.join(ctx, fnSlotType),
                        }
                    }
                    (None, Some(slotB)) => {
                        let fnSlotType = typedScopeA.and_then(|scope| ctx.getVarType(scope, name));
                        match fnSlotType {
                            // Case #2
                            None => slotB.clone(),
                            Some(fnSlotType) if fnSlotType == slotB.ty => slotB.clone(),
                            // Case #4
                            Some(fnSlotType) => slotB.join(ctx, fnSlotType),
                        }
                    }
                    // Case #5
                    (Some(slotA), Some(slotB)) => slotA.join(ctx, slotB.ty),
                    (None, None) => unreachable!("reconcile passes at least one slot"),
                }
            });
            OverlayScope::new_with_slots(scopeKey, slots)
        })
    }
}

/** Join the two FlowScopes. */
pub struct FlowScopeJoinOp {
    result: Option<LinkedFlowScope>,
    /// Joining no inputs gives the bottom element.
    bottom: LinkedFlowScope,
}

impl FlowScopeJoinOp {
    pub fn new(bottom: LinkedFlowScope) -> Self {
        Self {
            result: None,
            bottom,
        }
    }
}

/// Analyses whose lattice elements are flow scopes.
pub trait FlowScopeLattice<'ast>: Index<LatticeElementId, Output = LinkedFlowScope> {
    fn ctx_mut(&mut self) -> &mut Ctx<'ast>;
}

impl<'ast, I: FlowScopeLattice<'ast>> FlowJoiner<LinkedFlowScope, I> for FlowScopeJoinOp {
    // NOTE(sdh): When joining flow scopes with different syntactic scopes,
    // we do not attempt to recover the correct syntactic scope.  This is
    // okay because joins only occur in two situations: (1) performed by
    // the DataFlowAnalysis class automatically between CFG nodes, and (2)
    // requested manually while traversing a single expression within a CFG
    // node.  The syntactic scope is always set at the beginning of flowing
    // through a CFG node.  In the case of (1), the join result's syntactic
    // scope is immediately replaced with the correct one when we flow through
    // the next node.  In the case of (2), both inputs will always have the
    // same syntactic scope.  So simply propagating either input's scope is
    // perfectly fine.
    fn join_flow(&mut self, inner: &mut I, input: LatticeElementId) {
        let input = inner[input].clone();
        let joined = match &self.result {
            None => input,
            Some(result) => LinkedFlowScope::join_scopes(inner.ctx_mut(), result, &input),
        };
        self.result = Some(joined);
    }

    fn finish(self) -> LinkedFlowScope {
        self.result.unwrap_or(self.bottom)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OverlayScope {
    scope: ScopeId,
    slots: HashMap<JsWord, OverlaySlot>,
}

impl OverlayScope {
    fn new(scope: ScopeId) -> Self {
        Self {
            scope,
            slots: HashMap::new(),
        }
    }

    fn new_with_slots(scope: ScopeId, slots: HashMap<JsWord, OverlaySlot>) -> Self {
        Self { scope, slots }
    }

    fn infer(&self, name: &JsWord, ty: TypeId) -> OverlayScope {
        if let Some(slot) = self.slots.get(name) {
            if slot.ty == ty {
                return self.clone();
            }
        }
        OverlayScope::new_with_slots(
            self.scope,
            self.slots.update(name.clone(), OverlaySlot::new(name.clone(), ty)),
        )
    }

    fn getSlot(&self, ctx: &Ctx, name: &str) -> Option<Slot> {
        match self.slots.get(&JsWord::from(name)) {
            Some(slot) => Some(Slot::Overlay(slot.ty)),
            None => ctx.getVar(self.scope, name).map(Slot::Typed),
        }
    }
}

/// A name visible to a flow scope: a declared variable, or a type inferred
/// by the flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Typed(TypedVarId),
    Overlay(TypeId),
}

impl Slot {
    pub fn getType(&self, ctx: &Ctx) -> Option<TypeId> {
        match *self {
            Slot::Typed(var) => ctx.vars[var].ty,
            Slot::Overlay(ty) => Some(ty),
        }
    }

    pub fn isTypeInferred(&self, ctx: &Ctx) -> bool {
        match *self {
            Slot::Typed(var) => ctx.vars[var].typeInferred,
            Slot::Overlay(_) => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct OverlaySlot {
    name: JsWord,
    ty: TypeId,
}

impl OverlaySlot {
    fn new(name: JsWord, ty: TypeId) -> Self {
        Self { name, ty }
    }

    fn join(&self, ctx: &mut Ctx, other: TypeId) -> OverlaySlot {
        let joinedType = ctx.type_registry.get_least_supertype(self.ty, other);
        if joinedType == self.ty {
            self.clone()
        } else {
            OverlaySlot::new(self.name.clone(), joinedType)
        }
    }
}
