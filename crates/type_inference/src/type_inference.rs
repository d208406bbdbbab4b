//! Flow-sensitive type inference over the body of one function, or over the
//! global scope.

use crate::control_flow::node::Node;
use crate::control_flow::ControlFlowGraph::{Branch, ControlFlowGraph};
use crate::ctx::Ctx;
use crate::diagnostics::FUNCTION_LITERAL_UNDEFINED_THIS;
use crate::linked_flow_scope::{FlowScopeJoinOp, FlowScopeLattice, LinkedFlowScope, Slot};
use crate::reverse_abstract_interpreter::ReverseAbstractInterpreter;
use crate::typed_scope::ScopeId;
use crate::typed_var::TypedVarId;
use crate::typing::{BooleanLiteralSet, TemplateTypeMap, TyKind, TypeId, TypeRegistry};
use crate::DataFlowAnalysis::{DataFlowAnalysisInner, LatticeElementId, LinearFlowState};
use ast::{node_util, Ast, JsWord, NodeId, Token};
use index::vec::IndexVec;
use once_cell::unsync::OnceCell;
use std::ops::Index;

#[cfg(test)]
mod tests;

/**
 * Type inference within a script node or a function body, using the data
 * flow analysis framework.
 *
 * Every expression node of the analysed body is annotated with its type in
 * the type registry. Flow scopes record what is known about the types of
 * names at each program point; conditions narrow them on the branch they
 * guard.
 */
pub struct TypeInference<'a, 'ast> {
    ctx: &'a mut Ctx<'ast>,
    cfg: ControlFlowGraph<Node, LinearFlowState, LatticeElementId>,
    reverseInterpreter: &'a dyn ReverseAbstractInterpreter,
    lattice_elements: IndexVec<LatticeElementId, LinkedFlowScope>,

    // either the global scope or a function scope
    containerScope: ScopeId,
    functionScope: LatticeElementId,
    bottomScope: LatticeElementId,

    /// `@template` types of the analysed function, for casts.
    templateScope: Vec<(JsWord, TypeId)>,
    /// The types `+` adds as numbers.
    numberAdditionSupertype: TypeId,
    stringValueOrObject: TypeId,
}

impl<'a, 'ast> TypeInference<'a, 'ast> {
    pub fn new(
        ctx: &'a mut Ctx<'ast>,
        cfg: ControlFlowGraph<Node, LinearFlowState, LatticeElementId>,
        reverseInterpreter: &'a dyn ReverseAbstractInterpreter,
        syntacticScope: ScopeId,
    ) -> Self {
        let c = ctx.type_registry.common_types;
        let numberAdditionSupertype = ctx.type_registry.create_union(&[
            c.VOID_TYPE,
            c.NULL_TYPE,
            c.NUMBER_TYPE,
            c.NUMBER_OBJECT_TYPE,
            c.BOOLEAN_TYPE,
            c.BOOLEAN_OBJECT_TYPE,
        ]);
        let stringValueOrObject = ctx
            .type_registry
            .create_union(&[c.STRING_TYPE, c.STRING_OBJECT_TYPE]);
        let templateScope = template_scope(ctx, syntacticScope);

        let mut lattice_elements = IndexVec::new();
        let bottomScope = lattice_elements.push(LinkedFlowScope::createLatticeBottom(ctx));

        let mut inference = Self {
            ctx,
            cfg,
            reverseInterpreter,
            lattice_elements,
            containerScope: syntacticScope,
            functionScope: bottomScope,
            bottomScope,
            templateScope,
            numberAdditionSupertype,
            stringValueOrObject,
        };

        let entryFlowScope = LinkedFlowScope::createEntryLattice(syntacticScope);
        let entryFlowScope = inference.inferDeclarativelyUnboundVarsWithoutTypes(entryFlowScope);
        inference.functionScope = inference.lattice_elements.push(entryFlowScope);
        inference
    }

    /// Every `var` without a declared type starts out as `undefined`.
    fn inferDeclarativelyUnboundVarsWithoutTypes(&mut self, mut flow: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let vars: Vec<TypedVarId> = self.ctx.scopes[self.containerScope]
            .getVarIterable()
            .collect();
        let void = self.ctx.type_registry.common_types.VOID_TYPE;
        for var in vars {
            let typedVar = &self.ctx.vars[var];
            if typedVar.ty.is_some() {
                continue;
            }
            let declarativelyUnbound = typedVar.getNameNode().map_or(false, |name| {
                !ast.is_from_externs(name)
                    && ast.parent(name).map_or(false, |parent| ast.is(parent, Token::Var))
            });
            if !declarativelyUnbound || self.isUnflowable(Some(var)) {
                continue;
            }
            let name = typedVar.getName().clone();
            flow = flow.inferSlotType(self.ctx, &name, void);
        }
        flow
    }

    fn flowThrough(&mut self, n: NodeId, input: LinkedFlowScope) -> LinkedFlowScope {
        let input = input.withSyntacticScope(self.ctx, self.containerScope);
        self.traverse(n, input)
    }

    fn branchedFlowThrough(&mut self, source: NodeId, input: LinkedFlowScope) -> Vec<LinkedFlowScope> {
        let ast = self.ctx.ast;
        let output = self.flowThrough(source, input);
        let branchEdges = self.cfg.get_out_edges(Node::new(source));

        let mut result = Vec::with_capacity(branchEdges.len());
        let mut conditionFlowScope: Option<LinkedFlowScope> = None;
        let mut conditionOutcomes: Option<BooleanOutcomePair> = None;
        for (_, branch, _) in branchEdges {
            let newScope = match branch {
                Branch::ON_TRUE if ast.is(source, Token::ForIn) => {
                    self.flowIntoForInBody(source, output.clone())
                }
                Branch::ON_TRUE | Branch::ON_FALSE => {
                    let outcome = branch == Branch::ON_TRUE;
                    let mut condition = node_util::get_condition_expression(ast, source);
                    if condition.is_none() && ast.is(source, Token::Case) {
                        condition = Some(source);
                        if conditionFlowScope.is_none() {
                            conditionFlowScope = Some(match ast.first_child(source) {
                                Some(caseValue) => self.traverse(caseValue, output.clone()),
                                None => output.clone(),
                            });
                        }
                    }
                    match condition {
                        Some(condition) if matches!(ast.token(condition), Token::And | Token::Or) => {
                            if conditionOutcomes.is_none() {
                                conditionOutcomes = Some(self.traverseShortCircuitingBinOp(
                                    condition,
                                    output.clone(),
                                    ast.is(condition, Token::And),
                                ));
                            }
                            let informed = match &conditionOutcomes {
                                Some(outcomes) => {
                                    outcomes.getOutcomeFlowScope(self.ctx, ast.token(condition), outcome)
                                }
                                None => output.clone(),
                            };
                            self.reverseInterpreter.getPreciserScopeKnowingConditionOutcome(
                                self.ctx, condition, informed, outcome,
                            )
                        }
                        Some(condition) => {
                            if conditionFlowScope.is_none() {
                                conditionFlowScope = Some(self.traverse(condition, output.clone()));
                            }
                            let informed = conditionFlowScope.clone().unwrap_or_else(|| output.clone());
                            self.reverseInterpreter.getPreciserScopeKnowingConditionOutcome(
                                self.ctx, condition, informed, outcome,
                            )
                        }
                        None => output.clone(),
                    }
                }
                _ => output.clone(),
            };
            result.push(newScope);
        }
        result
    }

    /// The loop variable of a `for-in` holds the keys of the iterated object:
    /// strings, or the object's index type when that is narrower.
    fn flowIntoForInBody(&mut self, forIn: NodeId, output: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let (mut item, obj) = match (ast.first_child(forIn), ast.second_child(forIn)) {
            (Some(item), Some(obj)) => (item, obj),
            _ => return output,
        };
        let informed = self.traverse(obj, output);
        if ast.is(item, Token::Var) {
            match ast.first_child(item) {
                Some(name) => item = name,
                None => return informed,
            }
        }
        if !ast.is(item, Token::Name) {
            return informed;
        }

        let registry = &mut self.ctx.type_registry;
        let mut iterKeyType = registry.common_types.STRING_TYPE;
        let objType = self.getJSType(obj);
        let registry = &mut self.ctx.type_registry;
        let objIndexType = registry
            .dereference(objType)
            .and_then(|objType| registry.get_index_type(objType));
        if let Some(objIndexType) = objIndexType {
            if !registry.is_unknown_type(objIndexType) {
                let narrowedKeyType = registry.get_greatest_subtype(iterKeyType, objIndexType);
                if !registry.is_empty_type(narrowedKeyType) {
                    iterKeyType = narrowedKeyType;
                }
            }
        }
        self.redeclareSimpleVar(informed, item, iterKeyType)
    }

    fn traverse(&mut self, n: NodeId, mut scope: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let c = self.ctx.type_registry.common_types;
        match ast.token(n) {
            Token::Assign => scope = self.traverseAssign(n, scope),

            Token::Name => scope = self.traverseName(n, scope),

            Token::GetProp => scope = self.traverseGetProp(n, scope),

            Token::And => scope = self.traverseShortCircuitingBinOp(n, scope, true).getJoinedFlowScope(self.ctx),

            Token::Or => scope = self.traverseShortCircuitingBinOp(n, scope, false).getJoinedFlowScope(self.ctx),

            Token::Hook => scope = self.traverseHook(n, scope),

            Token::ObjectLit => scope = self.traverseObjectLiteral(n, scope),

            Token::Call => scope = self.traverseCall(n, scope),

            Token::New => scope = self.traverseNew(n, scope),

            Token::AssignAdd | Token::Add => scope = self.traverseAdd(n, scope),

            Token::Pos | Token::Neg => {
                if let Some(operand) = ast.first_child(n) {
                    scope = self.traverse(operand, scope);
                }
                self.setType(n, c.NUMBER_TYPE);
            }

            Token::ArrayLit => {
                scope = self.traverseChildren(n, scope);
                self.setType(n, c.ARRAY_TYPE);
            }

            Token::This => {
                let thisType = scope.getTypeOfThis(self.ctx);
                self.setType(n, thisType);
            }

            Token::AssignLsh
            | Token::AssignRsh
            | Token::Lsh
            | Token::Rsh
            | Token::AssignUrsh
            | Token::Ursh
            | Token::AssignDiv
            | Token::AssignMod
            | Token::AssignBitAnd
            | Token::AssignBitXor
            | Token::AssignBitOr
            | Token::AssignMul
            | Token::AssignSub
            | Token::Div
            | Token::Mod
            | Token::BitAnd
            | Token::BitXor
            | Token::BitOr
            | Token::Mul
            | Token::Sub
            | Token::Dec
            | Token::Inc
            | Token::BitNot => {
                scope = self.traverseChildren(n, scope);
                self.setType(n, c.NUMBER_TYPE);
            }

            Token::ParamList => {
                if let Some(first) = ast.first_child(n) {
                    scope = self.traverse(first, scope);
                    if let Some(ty) = self.nodeType(first) {
                        self.setType(n, ty);
                    }
                }
            }

            Token::Comma => {
                scope = self.traverseChildren(n, scope);
                if let Some(ty) = ast.last_child(n).and_then(|last| self.nodeType(last)) {
                    self.setType(n, ty);
                }
            }

            Token::TypeOf => {
                scope = self.traverseChildren(n, scope);
                self.setType(n, c.STRING_TYPE);
            }

            Token::DelProp
            | Token::Lt
            | Token::Le
            | Token::Gt
            | Token::Ge
            | Token::Not
            | Token::Eq
            | Token::Ne
            | Token::ShEq
            | Token::ShNe
            | Token::InstanceOf
            | Token::In => {
                scope = self.traverseChildren(n, scope);
                self.setType(n, c.BOOLEAN_TYPE);
            }

            Token::GetElem => scope = self.traverseGetElem(n, scope),

            Token::ExprResult => {
                scope = self.traverseChildren(n, scope);
                if let Some(expr) = ast.first_child(n) {
                    if ast.is(expr, Token::GetProp) {
                        self.ensurePropertyDeclared(expr);
                    }
                }
            }

            Token::Switch | Token::Case => {
                if let Some(value) = ast.first_child(n) {
                    scope = self.traverse(value, scope);
                }
            }

            Token::Return => scope = self.traverseReturn(n, scope),

            Token::Var | Token::Throw => scope = self.traverseChildren(n, scope),

            Token::Catch => scope = self.traverseCatch(n, scope),

            // Function bodies are analysed on their own.
            Token::Function => return scope,

            _ => {}
        }

        if let Some(info) = ast.jsdoc(n) {
            if let Some(castExpr) = &info.ty {
                let castType = self
                    .ctx
                    .type_registry
                    .evaluate_type_expression(castExpr, &self.templateScope);

                // A stubbed type declaration on a qualified name should take
                // effect for all subsequent accesses of that name, so treat it
                // the same as an assignment to that name.
                let isStandaloneName = node_util::is_qualified_name(ast, n)
                    && ast.parent(n).map_or(false, |parent| ast.is(parent, Token::ExprResult));
                if isStandaloneName {
                    let leftType = self.nodeType(n);
                    scope = self.updateScopeForTypeChange(scope, n, leftType, castType);
                }

                self.setType(n, castType);
            }
        }

        scope
    }

    /// Traverses a return value, making record-typed returns acquire the
    /// properties of the declared return type.
    fn traverseReturn(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let scope = self.traverseChildren(n, scope);

        if let Some(retValue) = self.ctx.ast.first_child(n) {
            let root = self.ctx.scopes[self.containerScope].getRootNode();
            let registry = &mut self.ctx.type_registry;
            let returnType = registry
                .get_type(root)
                .and_then(|fnType| registry.get_function(fnType))
                .map(|f| f.return_type);
            if let (Some(returnType), Some(retType)) = (returnType, registry.get_type(retValue)) {
                registry.match_constraint(retType, returnType);
            }
        }
        scope
    }

    /// Catch blocks need to declare their exception variable freshly every
    /// time they are entered.
    fn traverseCatch(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let name = match self.ctx.ast.first_child(n) {
            Some(name) => name,
            None => return scope,
        };
        let unknown = self.ctx.type_registry.common_types.UNKNOWN_TYPE;
        self.setType(name, unknown);
        self.redeclareSimpleVar(scope, name, unknown)
    }

    fn traverseAssign(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let (left, right) = match (ast.first_child(n), ast.last_child(n)) {
            (Some(left), Some(right)) => (left, right),
            _ => return scope,
        };
        let scope = self.traverseChildren(n, scope);

        let leftType = self.nodeType(left);
        let resultType = self.getJSType(right);
        self.setType(n, resultType);

        self.updateScopeForTypeChange(scope, left, leftType, resultType)
    }

    /// Updates the scope according to the result of a type change, like an
    /// assignment or a type cast.
    fn updateScopeForTypeChange(
        &mut self,
        scope: LinkedFlowScope,
        left: NodeId,
        leftType: Option<TypeId>,
        resultType: TypeId,
    ) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        match ast.token(left) {
            Token::Name => {
                let varName = ast.string(left).clone();
                let var = self.ctx.getVar(self.containerScope, &varName);
                let varTypeInferred = var.map_or(false, |var| self.ctx.vars[var].typeInferred);
                let isVarDeclaration = ast.has_children(left);

                // Declared types win over the initializers of their own
                // declarations: `/** @type {Object<string>} */ var x = {};`.
                let isVarTypeBetter = !isVarDeclaration || var.is_none() || varTypeInferred;
                let scope = if isVarTypeBetter {
                    self.redeclareSimpleVar(scope, left, resultType)
                } else {
                    scope
                };

                if isVarDeclaration || leftType.is_none() {
                    self.setType(left, resultType);
                } else {
                    self.ctx.type_registry.clear_type(left);
                }

                if let Some(var) = var.filter(|_| varTypeInferred) {
                    let newType = match self.ctx.vars[var].ty {
                        Some(oldType) => self.ctx.type_registry.get_least_supertype(oldType, resultType),
                        None => resultType,
                    };
                    self.ctx.vars[var].setType(newType);
                }
                scope
            }
            Token::GetProp => {
                let mut scope = scope;
                if let Some(qualifiedName) = node_util::get_qualified_name(ast, left) {
                    let unknown = self.ctx.type_registry.common_types.UNKNOWN_TYPE;
                    scope = scope.inferQualifiedSlot(
                        self.ctx,
                        left,
                        &qualifiedName,
                        leftType.unwrap_or(unknown),
                        resultType,
                        false,
                    );
                }
                self.setType(left, resultType);
                self.ensurePropertyDefined(left, resultType);
                scope
            }
            _ => scope,
        }
    }

    /// Defines a property if the property has not been defined yet.
    fn ensurePropertyDefined(&mut self, getprop: NodeId, rightType: TypeId) {
        let ast = self.ctx.ast;
        let propName = ast.string(getprop).clone();
        let owner = match ast.first_child(getprop) {
            Some(owner) => owner,
            None => return,
        };
        let nodeType = self.getJSType(owner);
        let registry = &mut self.ctx.type_registry;
        let restricted = registry.restrict_by_not_null_or_undefined(nodeType);
        let objectType = match registry.to_object_type(restricted) {
            Some(objectType) => objectType,
            None => {
                registry.register_property_on_type(&propName, nodeType);
                return;
            }
        };

        if self.ensurePropertyDeclaredHelper(getprop, objectType) {
            return;
        }

        let registry = &mut self.ctx.type_registry;
        if registry.is_property_type_declared(objectType, &propName) {
            return;
        }
        // We do not want a "stray" assignment to define an inferred property
        // for every object of this type in the program. So we use a heuristic
        // approach to determine whether to infer the property.
        //
        // 1) If the property is already defined, join it with the previously
        //    inferred type.
        // 2) If this isn't an instance object, define it.
        // 3) If the property of an object is being assigned in the constructor,
        //    define it.
        // 4) If this is a stub, define it.
        // 5) Otherwise, do not define the type, but declare it in the registry
        //    so that we can use it for missing properties checks.
        if registry.has_property(objectType, &propName) || !registry.is_instance_type(objectType) {
            if propName.as_ref() == "prototype" {
                registry.define_declared_property(objectType, &propName, rightType, Some(getprop));
            } else {
                registry.define_inferred_property(objectType, &propName, rightType, Some(getprop));
            }
        } else if ast.is(owner, Token::This) && self.rootFunctionIsConstructor() {
            self.ctx
                .type_registry
                .define_inferred_property(objectType, &propName, rightType, Some(getprop));
        } else {
            self.ctx.type_registry.register_property_on_type(&propName, objectType);
        }
    }

    fn rootFunctionIsConstructor(&self) -> bool {
        let root = self.ctx.scopes[self.containerScope].getRootNode();
        let registry = &self.ctx.type_registry;
        registry
            .get_type(root)
            .map_or(false, |fnType| registry.is_constructor(fnType))
    }

    /// Defines a declared property if it has not been defined yet.
    ///
    /// This handles the case where a property is declared on an object where
    /// the object type is inferred, and so the object type will not be known
    /// in the scope creator.
    fn ensurePropertyDeclared(&mut self, getprop: NodeId) {
        let owner = match self.ctx.ast.first_child(getprop) {
            Some(owner) => owner,
            None => return,
        };
        let ownerType = self.getJSType(owner);
        let registry = &mut self.ctx.type_registry;
        let restricted = registry.restrict_by_not_null_or_undefined(ownerType);
        if let Some(objectType) = registry.to_object_type(restricted) {
            self.ensurePropertyDeclaredHelper(getprop, objectType);
        }
    }

    /// Declares a property on its owner, if necessary.
    /// Returns whether a property was declared.
    fn ensurePropertyDeclaredHelper(&mut self, getprop: NodeId, objectType: TypeId) -> bool {
        let ast = self.ctx.ast;
        let propName = ast.string(getprop).clone();
        let qName = match node_util::get_qualified_name(ast, getprop) {
            Some(qName) => qName,
            None => return false,
        };
        let var = match self.ctx.getVar(self.containerScope, &qName) {
            Some(var) => &self.ctx.vars[var],
            None => return false,
        };
        if var.typeInferred {
            return false;
        }
        let varType = var.ty;
        let isExtern = var.getNameNode().map_or(false, |name| ast.is_from_externs(name));

        let registry = &mut self.ctx.type_registry;
        let declarable = propName.as_ref() == "prototype"
            || (!registry.has_own_property(objectType, &propName)
                && (!registry.is_instance_type(objectType)
                    || (isExtern && !registry.is_native_object_type(objectType))));
        if !declarable {
            return false;
        }
        let ty = varType.unwrap_or(registry.common_types.UNKNOWN_TYPE);
        registry.define_declared_property(objectType, &propName, ty, Some(getprop))
    }

    fn traverseName(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let varName = ast.string(n).clone();
        let mut ty = self.nodeType(n);

        if let Some(value) = ast.first_child(n) {
            let scope = self.traverse(value, scope);
            let valueType = self.getJSType(value);
            return self.updateScopeForTypeChange(scope, n, ty, valueType);
        }

        if let Some(slot) = scope.getSlot(self.ctx, &varName) {
            let syntacticScope = scope.getDeclarationScope();
            let var = self.ctx.getVar(syntacticScope, &varName);

            // Escaped locals assigned in an inner function keep their
            // declared type: `function f() { var x = 3; function g() { x = null } (x); }`
            let isInferred = slot.isTypeInferred(self.ctx);
            let unflowable = isInferred && self.isUnflowable(var);

            // An inferred outer variable assigned more than once may hold any
            // of its types when read here:
            // `var t = null; function f() { (t); } doStuff(); t = {};`
            let mut nonLocalInferredSlot = false;
            if isInferred && self.ctx.scopes[syntacticScope].isLocal() {
                let maybeOuterVar = self.ctx.scopes[syntacticScope]
                    .get_parent()
                    .and_then(|parent| self.ctx.getVar(parent, &varName));
                if let Some(outer) = maybeOuterVar {
                    if var == Some(outer) && !self.ctx.vars[outer].isMarkedAssignedExactlyOnce() {
                        nonLocalInferredSlot = true;
                    }
                }
            }

            if !unflowable && !nonLocalInferredSlot {
                ty = Some(
                    slot.getType(self.ctx)
                        .unwrap_or(self.ctx.type_registry.common_types.UNKNOWN_TYPE),
                );
            }
        }
        if let Some(ty) = ty {
            self.setType(n, ty);
        }
        scope
    }

    /// Traverse a node's children.
    fn traverseChildren(&mut self, n: NodeId, mut scope: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        for &child in ast.children(n) {
            scope = self.traverse(child, scope);
        }
        scope
    }

    fn traverseObjectLiteral(&mut self, n: NodeId, mut scope: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        for &key in ast.children(n) {
            if let Some(value) = ast.first_child(key) {
                scope = self.traverse(value, scope);
            }
        }

        // Anonymous object literals and `@lends` literals get the types of
        // their values as inferred properties. Named types were already
        // taken care of by the scope creator.
        let objectType = match self
            .nodeType(n)
            .and_then(|ty| self.ctx.type_registry.to_object_type(ty))
        {
            Some(objectType) => objectType,
            None => return scope,
        };
        let hasLendsName = ast
            .jsdoc(n)
            .map_or(false, |info| info.get_lends_name().is_some());
        if self.ctx.type_registry.get_reference_name(objectType).is_some() && !hasLendsName {
            return scope;
        }

        let qObjName = node_util::get_best_lvalue_name(ast, node_util::get_best_lvalue(ast, n));
        let unknown = self.ctx.type_registry.common_types.UNKNOWN_TYPE;
        for &key in ast.children(n) {
            let memberName = node_util::get_object_lit_key_name(ast, key).clone();
            let rawValueType = ast.first_child(key).and_then(|value| self.nodeType(value));
            let valueType = rawValueType
                .and_then(|rawValueType| self.objectLitKeyType(key, rawValueType))
                .unwrap_or(unknown);
            self.ctx
                .type_registry
                .define_inferred_property(objectType, &memberName, valueType, Some(key));

            // Do normal flow inference if this is a direct property assignment.
            if let Some(qObjName) = &qObjName {
                if ast.is(key, Token::StringKey) {
                    let qKeyName: JsWord = format!("{}.{}", qObjName, memberName).into();
                    let var = self.ctx.getVar(self.containerScope, &qKeyName);
                    let oldType = var.and_then(|var| self.ctx.vars[var].ty);
                    if let Some(var) = var.filter(|&var| self.ctx.vars[var].typeInferred) {
                        let newType = match oldType {
                            Some(oldType) => self.ctx.type_registry.get_least_supertype(oldType, valueType),
                            None => valueType,
                        };
                        self.ctx.vars[var].setType(newType);
                    }
                    scope = scope.inferQualifiedSlot(
                        self.ctx,
                        key,
                        &qKeyName,
                        oldType.unwrap_or(unknown),
                        valueType,
                        false,
                    );
                }
            }
        }
        scope
    }

    /// The type a getter or setter key contributes to its object: the
    /// getter's return type, the setter's parameter type.
    fn objectLitKeyType(&self, key: NodeId, valueType: TypeId) -> Option<TypeId> {
        let registry = &self.ctx.type_registry;
        match self.ctx.ast.token(key) {
            Token::GetterDef => registry.get_function(valueType).map(|f| f.return_type),
            Token::SetterDef => registry
                .get_function(valueType)
                .and_then(|f| f.params.first())
                .map(|param| param.ty),
            _ => Some(valueType),
        }
    }

    fn traverseAdd(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let (left, right) = match (ast.first_child(n), ast.last_child(n)) {
            (Some(left), Some(right)) => (left, right),
            _ => return scope,
        };
        let scope = self.traverseChildren(n, scope);

        let leftType = self.nodeType(left);
        let rightType = self.nodeType(right);
        let c = self.ctx.type_registry.common_types;

        let mut ty = c.UNKNOWN_TYPE;
        if let (Some(leftType), Some(rightType)) = (leftType, rightType) {
            let registry = &self.ctx.type_registry;
            let leftIsUnknown = registry.is_unknown_type(leftType);
            let rightIsUnknown = registry.is_unknown_type(rightType);
            ty = if leftIsUnknown && rightIsUnknown {
                c.UNKNOWN_TYPE
            } else if (!leftIsUnknown && self.isString(leftType))
                || (!rightIsUnknown && self.isString(rightType))
            {
                c.STRING_TYPE
            } else if leftIsUnknown || rightIsUnknown {
                c.UNKNOWN_TYPE
            } else if self.isAddedAsNumber(leftType) && self.isAddedAsNumber(rightType) {
                c.NUMBER_TYPE
            } else {
                self.ctx
                    .type_registry
                    .create_union(&[c.STRING_TYPE, c.NUMBER_TYPE])
            };
        }
        self.setType(n, ty);

        if ast.is(n, Token::AssignAdd) {
            return self.updateScopeForTypeChange(scope, left, leftType, ty);
        }
        scope
    }

    /// Whether `ty` is, or may be, a string.
    fn isString(&self, ty: TypeId) -> bool {
        let registry = &self.ctx.type_registry;
        if registry.is_empty_type(ty) {
            return false;
        }
        if registry.is_subtype(ty, self.stringValueOrObject) {
            return true;
        }
        registry.union_alternates(ty).map_or(false, |alternates| {
            alternates
                .iter()
                .any(|&alternate| registry.is_subtype(alternate, self.stringValueOrObject))
        })
    }

    fn isAddedAsNumber(&self, ty: TypeId) -> bool {
        self.ctx
            .type_registry
            .is_subtype(ty, self.numberAdditionSupertype)
    }

    fn traverseHook(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let (condition, trueNode, falseNode) =
            match (ast.first_child(n), ast.second_child(n), ast.last_child(n)) {
                (Some(condition), Some(trueNode), Some(falseNode)) => (condition, trueNode, falseNode),
                _ => return scope,
            };

        // verify the condition
        let scope = self.traverse(condition, scope);

        // reverse abstract interpret the condition to produce two new scopes
        let trueScope = self.reverseInterpreter.getPreciserScopeKnowingConditionOutcome(
            self.ctx,
            condition,
            scope.clone(),
            true,
        );
        let falseScope = self.reverseInterpreter.getPreciserScopeKnowingConditionOutcome(
            self.ctx,
            condition,
            scope.clone(),
            false,
        );

        // traverse the true node with the trueScope
        self.traverse(trueNode, trueScope);

        // traverse the false node with the falseScope
        self.traverse(falseNode, falseScope);

        // meet true and false nodes' types and assign
        let trueType = self.nodeType(trueNode);
        let falseType = self.nodeType(falseNode);
        let ty = match (trueType, falseType) {
            (Some(trueType), Some(falseType)) => {
                self.ctx.type_registry.get_least_supertype(trueType, falseType)
            }
            _ => self.ctx.type_registry.common_types.UNKNOWN_TYPE,
        };
        self.setType(n, ty);

        scope
    }

    fn traverseCall(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let scope = self.traverseChildren(n, scope);

        let left = match self.ctx.ast.first_child(n) {
            Some(left) => left,
            None => return scope,
        };
        let calleeType = self.getJSType(left);
        let registry = &mut self.ctx.type_registry;
        let functionType = registry.restrict_by_not_null_or_undefined(calleeType);
        if registry.is_function_type(functionType) {
            if let Some(returnType) = registry.get_function(functionType).map(|f| f.return_type) {
                self.setType(n, returnType);
            }
            self.backwardsInferenceFromCallSite(n, functionType);
        } else {
            if registry.is_checked_unknown_type(functionType) {
                let checkedUnknown = registry.common_types.CHECKED_UNKNOWN_TYPE;
                self.setType(n, checkedUnknown);
            }
            // Natives do not declare `Function.prototype.bind`.
            self.updateBind(n);
        }

        self.tightenTypesAfterAssertions(scope, n)
    }

    fn tightenTypesAfterAssertions(&mut self, scope: LinkedFlowScope, callNode: NodeId) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let left = match ast.first_child(callNode) {
            Some(left) => left,
            None => return scope,
        };
        let calleeName = match node_util::get_qualified_name(ast, left) {
            Some(name) => name,
            None => return scope,
        };
        let spec = match self
            .ctx
            .convention
            .getAssertionFunctions()
            .iter()
            .find(|spec| spec.functionName == calleeName.as_ref())
        {
            Some(spec) => *spec,
            None => return scope,
        };
        let assertedNode = match spec.getAssertedParam(ast, callNode) {
            Some(assertedNode) => assertedNode,
            None => return scope,
        };

        let mut scope = scope;
        let assertedType = spec.getAssertedType(ast, callNode, &self.ctx.type_registry);
        let narrowed = match assertedType {
            None => {
                scope = self.reverseInterpreter.getPreciserScopeKnowingConditionOutcome(
                    self.ctx,
                    assertedNode,
                    scope,
                    true,
                );
                let ty = self.getJSType(assertedNode);
                self.ctx.type_registry.restrict_by_not_null_or_undefined(ty)
            }
            Some(assertedType) => {
                let ty = self.getJSType(assertedNode);
                let narrowed = self.ctx.type_registry.get_greatest_subtype(ty, assertedType);
                if node_util::is_qualified_name(ast, assertedNode) && ty != narrowed {
                    scope = self.narrowScope(scope, assertedNode, narrowed);
                }
                narrowed
            }
        };

        if self.getJSType(callNode) != narrowed {
            self.setType(callNode, narrowed);
        }
        scope
    }

    fn narrowScope(&mut self, scope: LinkedFlowScope, node: NodeId, narrowed: TypeId) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        match ast.token(node) {
            Token::This => scope,
            Token::GetProp => match node_util::get_qualified_name(ast, node) {
                Some(qName) => {
                    let ty = self.getJSType(node);
                    scope.inferQualifiedSlot(self.ctx, node, &qName, ty, narrowed, false)
                }
                None => scope,
            },
            Token::Name => self.redeclareSimpleVar(scope, node, narrowed),
            _ => scope,
        }
    }

    /**
     * We only do forward type inference. We do not do full backwards type
     * inference.
     *
     * In other words, if we have, `var x = f(); g(x);` a forward type-inference
     * engine would try to figure out the type of "x" from the return type of
     * "f". A backwards type-inference engine would try to figure out the type
     * of "x" from the parameter type of "g".
     *
     * However, there are a few special syntactic forms where we do some some
     * half-assed backwards type-inference, because programmers expect it in
     * this day and age. To take an example from java,
     * `List<String> x = Lists.newArrayList();`
     * The Java compiler will be able to infer the generic type of the List
     * returned by newArrayList().
     *
     * In much the same way, we do some special-case backwards inference for
     * JS. Those cases are enumerated here.
     */
    fn backwardsInferenceFromCallSite(&mut self, n: NodeId, mut fnType: TypeId) {
        let updatedFnType = self.inferTemplatedTypesForCall(n, fnType);
        if updatedFnType {
            if let Some(callee) = self.ctx.ast.first_child(n) {
                fnType = self.getJSType(callee);
            }
        }
        self.updateTypeOfParameters(n, fnType);
        self.updateBind(n);
    }

    /// When `f.bind` or `goog.bind` is called, the result is the target
    /// function curried by the bound arguments.
    fn updateBind(&mut self, n: NodeId) {
        let bind = match self.ctx.convention.describeFunctionBind(self.ctx.ast, n) {
            Some(bind) => bind,
            None => return,
        };
        let targetType = self.getJSType(bind.target);
        let registry = &mut self.ctx.type_registry;
        let callTargetFn = registry.restrict_by_not_null_or_undefined(targetType);
        if !registry.is_function_type(callTargetFn) {
            return;
        }
        let boundType = registry.get_bind_return_type(callTargetFn, bind.getBoundParameterCount() + 1);
        self.setType(n, boundType);
    }

    /// Matches each argument against the declared type of its parameter.
    ///
    /// Untyped function literals passed where a function is expected take the
    /// expected function type.
    fn updateTypeOfParameters(&mut self, n: NodeId, fnType: TypeId) {
        let ast = self.ctx.ast;
        let params = match self.ctx.type_registry.get_function(fnType) {
            Some(function) => function.params.clone(),
            None => return,
        };
        let childCount = ast.child_count(n);
        for (i, parameter) in params.iter().enumerate() {
            if i + 1 >= childCount {
                return;
            }
            let iArgument = match ast.child_at(n, i + 1) {
                Some(argument) => argument,
                None => return,
            };
            let iArgumentType = self.getJSType(iArgument);
            let registry = &mut self.ctx.type_registry;
            registry.match_constraint(iArgumentType, parameter.ty);

            let iParameterType = registry.restrict_by_not_null_or_undefined(parameter.ty);
            if !registry.is_function_type(iParameterType) {
                continue;
            }
            let isUntypedLiteral = ast.is(iArgument, Token::Function)
                && registry.is_function_type(iArgumentType)
                && ast.jsdoc(iArgument).is_none();
            if !isUntypedLiteral || iArgumentType == iParameterType {
                continue;
            }
            let undefinedThis = registry
                .get_function(iParameterType)
                .map_or(false, |f| f.type_of_this.is_none());
            self.setType(iArgument, iParameterType);
            self.ctx.inferred_functions.insert(iArgument);
            if undefinedThis && references_this(ast, iArgument) {
                self.ctx.report(iArgument, FUNCTION_LITERAL_UNDEFINED_THIS, &[]);
            }
        }
    }

    /// Binds the template types of a generic callee from the argument types
    /// and substitutes them into the callee and the call result.
    /// Returns whether the callee type changed.
    fn inferTemplatedTypesForCall(&mut self, n: NodeId, fnType: TypeId) -> bool {
        let ast = self.ctx.ast;
        let function = match self.ctx.type_registry.get_function(fnType) {
            Some(function) if !function.template_types.is_empty() => function.clone(),
            _ => return false,
        };

        let mut inferred = TemplateTypeMap::default();
        let args: Vec<NodeId> = ast.children(n).iter().skip(1).copied().collect();
        for (parameter, &arg) in function.params.iter().zip(args.iter()) {
            let argType = self.getJSType(arg);
            self.ctx
                .type_registry
                .infer_template_types(parameter.ty, argType, &mut inferred);
        }

        let registry = &mut self.ctx.type_registry;
        let replacementFnType = registry.substitute_templates(fnType, &inferred, true);
        if replacementFnType == fnType {
            return false;
        }
        let replacementReturnType = registry.get_function(replacementFnType).map(|f| f.return_type);
        if let Some(callTarget) = ast.first_child(n) {
            self.setType(callTarget, replacementFnType);
        }
        if ast.is(n, Token::Call) {
            if let Some(returnType) = replacementReturnType {
                self.setType(n, returnType);
            }
        }
        true
    }

    fn traverseNew(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let scope = self.traverseChildren(n, scope);

        let constructor = match self.ctx.ast.first_child(n) {
            Some(constructor) => constructor,
            None => return scope,
        };
        let constructorType = self.nodeType(constructor);
        let mut ty = None;
        if let Some(constructorType) = constructorType {
            let registry = &mut self.ctx.type_registry;
            let constructorType = registry.restrict_by_not_null_or_undefined(constructorType);
            if registry.is_unknown_type(constructorType) {
                ty = Some(registry.common_types.UNKNOWN_TYPE);
            } else {
                let instanceType = registry
                    .get_function(constructorType)
                    .filter(|ct| ct.isConstructor() || ct.isInterface())
                    .map(|ct| ct.instance_type);
                if let Some(instanceType) = instanceType {
                    ty = instanceType;
                    self.backwardsInferenceFromCallSite(n, constructorType);
                }
            }
        }
        match ty {
            Some(ty) => self.setType(n, ty),
            None => {
                self.ctx.type_registry.clear_type(n);
            }
        }
        scope
    }

    fn traverseShortCircuitingBinOp(
        &mut self,
        n: NodeId,
        scope: LinkedFlowScope,
        condition: bool,
    ) -> BooleanOutcomePair {
        let ast = self.ctx.ast;
        let (left, right) = match (ast.first_child(n), ast.last_child(n)) {
            (Some(left), Some(right)) => (left, right),
            _ => return self.newBooleanOutcomePair(None, scope),
        };

        // type the left node
        let leftLiterals = self.traverseWithinShortCircuitingBinOp(left, scope);
        let leftType = self.nodeType(left);

        // reverse abstract interpret the left node to produce the correct
        // scope in which to verify the right node
        let leftOutcomeScope = leftLiterals.getOutcomeFlowScope(self.ctx, ast.token(left), condition);
        let rightScope = self.reverseInterpreter.getPreciserScopeKnowingConditionOutcome(
            self.ctx,
            left,
            leftOutcomeScope,
            condition,
        );

        // type the right node
        let rightLiterals = self.traverseWithinShortCircuitingBinOp(right, rightScope);
        let rightType = self.nodeType(right);

        let (ty, literals) = match (leftType, rightType) {
            (Some(leftType), Some(rightType)) => {
                let leftType = self
                    .ctx
                    .type_registry
                    .get_restricted_type_given_to_boolean_outcome(leftType, !condition);
                let (mut ty, literals) =
                    if leftLiterals.toBooleanOutcomes == BooleanLiteralSet::get(!condition) {
                        // Use the restricted left type, since the right side never
                        // gets evaluated.
                        (leftType, leftLiterals)
                    } else {
                        // Use the join of the restricted left type knowing the
                        // outcome of the ToBoolean predicate and of the right type.
                        let ty = self.ctx.type_registry.get_least_supertype(leftType, rightType);
                        (ty, getBooleanOutcomePair(self.ctx, leftLiterals, rightLiterals, condition))
                    };

                let registry = &mut self.ctx.type_registry;
                // Exclude the boolean type if the literal set is empty because a
                // boolean can never actually be returned.
                let c = registry.common_types;
                if literals.booleanValues == BooleanLiteralSet::EMPTY
                    && registry.is_subtype(c.BOOLEAN_TYPE, ty)
                    && registry.is_union_type(ty)
                {
                    ty = restricted_union(registry, ty, c.BOOLEAN_TYPE);
                }
                (Some(ty), literals)
            }
            _ => {
                let literals = BooleanOutcomePair::new(
                    BooleanLiteralSet::BOTH,
                    BooleanLiteralSet::BOTH,
                    leftLiterals.getJoinedFlowScope(self.ctx),
                    rightLiterals.getJoinedFlowScope(self.ctx),
                );
                (None, literals)
            }
        };
        match ty {
            Some(ty) => self.setType(n, ty),
            None => {
                self.ctx.type_registry.clear_type(n);
            }
        }
        literals
    }

    fn traverseWithinShortCircuitingBinOp(&mut self, n: NodeId, scope: LinkedFlowScope) -> BooleanOutcomePair {
        match self.ctx.ast.token(n) {
            Token::And => self.traverseShortCircuitingBinOp(n, scope, true),
            Token::Or => self.traverseShortCircuitingBinOp(n, scope, false),
            _ => {
                let scope = self.traverse(n, scope);
                let ty = self.nodeType(n);
                self.newBooleanOutcomePair(ty, scope)
            }
        }
    }

    fn newBooleanOutcomePair(&self, jsType: Option<TypeId>, flowScope: LinkedFlowScope) -> BooleanOutcomePair {
        let jsType = match jsType {
            Some(jsType) => jsType,
            None => {
                return BooleanOutcomePair::new(
                    BooleanLiteralSet::BOTH,
                    BooleanLiteralSet::BOTH,
                    flowScope.clone(),
                    flowScope,
                )
            }
        };
        let registry = &self.ctx.type_registry;
        let booleanValues = if registry.is_subtype(registry.common_types.BOOLEAN_TYPE, jsType) {
            BooleanLiteralSet::BOTH
        } else {
            BooleanLiteralSet::EMPTY
        };
        BooleanOutcomePair::new(
            registry.get_possible_to_boolean_outcomes(jsType),
            booleanValues,
            flowScope.clone(),
            flowScope,
        )
    }

    fn traverseGetElem(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let scope = self.traverseChildren(n, scope);
        let owner = match self.ctx.ast.first_child(n) {
            Some(owner) => owner,
            None => return scope,
        };
        let ownerType = self.getJSType(owner);
        let registry = &mut self.ctx.type_registry;
        let restricted = registry.restrict_by_not_null_or_undefined(ownerType);
        if let Some(objType) = registry.to_object_type(restricted) {
            let elementType = registry.get_template_element_type(objType);
            self.setType(n, elementType);
        }
        self.dereferencePointer(owner, scope)
    }

    fn traverseGetProp(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        let objNode = match ast.first_child(n) {
            Some(objNode) => objNode,
            None => return scope,
        };
        let scope = self.traverseChildren(n, scope);
        let objType = self.nodeType(objNode);
        let propertyType = self.getPropertyType(objType, ast.string(n), n, &scope);
        self.setType(n, propertyType);
        self.dereferencePointer(objNode, scope)
    }

    /// If we access a property of a symbol, then that symbol is not null or
    /// undefined.
    fn dereferencePointer(&mut self, n: NodeId, scope: LinkedFlowScope) -> LinkedFlowScope {
        if !node_util::is_qualified_name(self.ctx.ast, n) {
            return scope;
        }
        let ty = self.getJSType(n);
        let narrowed = self.ctx.type_registry.restrict_by_not_null_or_undefined(ty);
        if ty != narrowed {
            return self.narrowScope(scope, n, narrowed);
        }
        scope
    }

    fn getPropertyType(
        &mut self,
        objType: Option<TypeId>,
        propName: &JsWord,
        n: NodeId,
        scope: &LinkedFlowScope,
    ) -> TypeId {
        // Scopes sometimes contain inferred type info about qualified names.
        let qualifiedName = node_util::get_qualified_name(self.ctx.ast, n);
        let mut propertyType = None;
        let mut isLocallyInferred = false;
        if let Some(qualifiedName) = &qualifiedName {
            if let Some(slot) = scope.getSlot(self.ctx, qualifiedName) {
                if let Some(varType) = slot.getType(self.ctx) {
                    let isDeclared = !slot.isTypeInferred(self.ctx);
                    isLocallyInferred = match slot {
                        Slot::Overlay(_) => true,
                        Slot::Typed(var) => {
                            self.ctx.getVar(self.containerScope, qualifiedName) != Some(var)
                        }
                    };
                    if isDeclared || isLocallyInferred {
                        propertyType = Some(varType);
                    }
                }
            }
        }

        let registry = &mut self.ctx.type_registry;
        if propertyType.is_none() {
            if let Some(objType) = objType {
                propertyType = registry.find_property_type(objType, propName);
            }
        }

        let unresolved = propertyType.map_or(true, |ty| registry.is_unknown_type(ty));
        if unresolved {
            if let Some(qualifiedName) = &qualifiedName {
                // If we find this node in the registry, then we can infer its
                // type.
                if let Some(regType) = registry.get_type_by_name(qualifiedName) {
                    if registry.to_object_type(regType).is_some() {
                        propertyType = constructor_of(registry, regType);
                    }
                }
            }
        }

        let c = registry.common_types;
        match propertyType {
            None => c.UNKNOWN_TYPE,
            Some(ty) if ty == c.UNKNOWN_TYPE && isLocallyInferred => c.CHECKED_UNKNOWN_TYPE,
            Some(ty) => ty,
        }
    }

    fn redeclareSimpleVar(&mut self, scope: LinkedFlowScope, nameNode: NodeId, varType: TypeId) -> LinkedFlowScope {
        let ast = self.ctx.ast;
        if !ast.is(nameNode, Token::Name) {
            return scope;
        }
        let varName = ast.string(nameNode);
        if self.isUnflowable(self.ctx.getVar(self.containerScope, varName)) {
            return scope;
        }
        scope.inferSlotType(self.ctx, varName, varType)
    }

    /// Locals escaped into an inner function that assigns them keep their
    /// declared type in the function declaring them.
    fn isUnflowable(&self, v: Option<TypedVarId>) -> bool {
        v.map_or(false, |v| {
            let var = &self.ctx.vars[v];
            self.ctx.scopes[var.scope].isLocal()
                && var.isMarkedEscaped()
                && var.scope == self.containerScope
        })
    }

    /// The type of a node, unknown when it has none.
    fn getJSType(&self, n: NodeId) -> TypeId {
        self.nodeType(n)
            .unwrap_or(self.ctx.type_registry.common_types.UNKNOWN_TYPE)
    }

    fn nodeType(&self, n: NodeId) -> Option<TypeId> {
        self.ctx.type_registry.get_type(n)
    }

    fn setType(&mut self, n: NodeId, ty: TypeId) {
        self.ctx.type_registry.set_type(n, ty);
    }
}

impl Index<LatticeElementId> for TypeInference<'_, '_> {
    type Output = LinkedFlowScope;

    fn index(&self, index: LatticeElementId) -> &Self::Output {
        &self.lattice_elements[index]
    }
}

impl<'a, 'ast> FlowScopeLattice<'ast> for TypeInference<'a, 'ast> {
    fn ctx_mut(&mut self) -> &mut Ctx<'ast> {
        &mut *self.ctx
    }
}

impl<'a, 'ast> DataFlowAnalysisInner<Node, LinkedFlowScope, FlowScopeJoinOp> for TypeInference<'a, 'ast> {
    fn add_lattice_element(&mut self, element: LinkedFlowScope) -> LatticeElementId {
        self.lattice_elements.push(element)
    }

    fn is_forward(&self) -> bool {
        true
    }

    fn create_entry_lattice(&mut self) -> LatticeElementId {
        self.functionScope
    }

    fn create_initial_estimate_lattice(&mut self) -> LatticeElementId {
        self.bottomScope
    }

    fn create_flow_joiner(&self) -> FlowScopeJoinOp {
        FlowScopeJoinOp::new(self.lattice_elements[self.bottomScope].clone())
    }

    fn flow_through(&mut self, node: Node, input: LatticeElementId) -> LatticeElementId {
        let n = match node.node_id {
            Some(n) => n,
            None => return input,
        };
        // Unreachable code stays unreachable.
        if self.lattice_elements[input].flowsFromBottom(self.ctx) {
            return input;
        }
        let output = self.flowThrough(n, self.lattice_elements[input].clone());
        self.add_lattice_element(output)
    }

    fn is_branched(&self) -> bool {
        true
    }

    fn branched_flow_through(&mut self, node: Node, input: LatticeElementId) -> Vec<LatticeElementId> {
        let edgeCount = self.cfg.get_out_edges(node).len();
        let n = match node.node_id {
            Some(n) if !self.lattice_elements[input].flowsFromBottom(self.ctx) => n,
            _ => return vec![input; edgeCount],
        };
        let outputs = self.branchedFlowThrough(n, self.lattice_elements[input].clone());
        outputs
            .into_iter()
            .map(|output| self.add_lattice_element(output))
            .collect()
    }

    fn cfg(&self) -> &ControlFlowGraph<Node, LinearFlowState, LatticeElementId> {
        &self.cfg
    }

    fn cfg_mut(&mut self) -> &mut ControlFlowGraph<Node, LinearFlowState, LatticeElementId> {
        &mut self.cfg
    }
}

/**
 * The results of traversing a short-circuiting `&&` or `||`: the boolean
 * values the expression may take, the outcomes its truthiness may have and
 * the flow scopes after evaluating only the left operand or both.
 */
struct BooleanOutcomePair {
    toBooleanOutcomes: BooleanLiteralSet,
    booleanValues: BooleanLiteralSet,

    // The scope if only half of the expression executed, when applicable.
    leftScope: LinkedFlowScope,

    // The scope when the whole expression executed.
    rightScope: LinkedFlowScope,

    // The scope when we don't know how much of the expression is executed.
    joinedScope: OnceCell<LinkedFlowScope>,
}

impl BooleanOutcomePair {
    fn new(
        toBooleanOutcomes: BooleanLiteralSet,
        booleanValues: BooleanLiteralSet,
        leftScope: LinkedFlowScope,
        rightScope: LinkedFlowScope,
    ) -> Self {
        Self {
            toBooleanOutcomes,
            booleanValues,
            leftScope,
            rightScope,
            joinedScope: OnceCell::new(),
        }
    }

    /// Gets the safe estimated scope without knowing if all of the
    /// subexpressions will be evaluated.
    fn getJoinedFlowScope(&self, ctx: &mut Ctx) -> LinkedFlowScope {
        self.joinedScope
            .get_or_init(|| {
                if self.leftScope == self.rightScope {
                    self.rightScope.clone()
                } else {
                    LinkedFlowScope::join_scopes(ctx, &self.leftScope, &self.rightScope)
                }
            })
            .clone()
    }

    /// Gets the outcome scope if we do know the outcome of the entire
    /// expression.
    fn getOutcomeFlowScope(&self, ctx: &mut Ctx, nodeType: Token, outcome: bool) -> LinkedFlowScope {
        if (nodeType == Token::And && outcome) || (nodeType == Token::Or && !outcome) {
            // We know that the whole expression must have executed.
            self.rightScope.clone()
        } else {
            self.getJoinedFlowScope(ctx)
        }
    }
}

/// Combines the pairs of the operands of `left && right` (`left || right`).
/// Either operand may itself have short-circuited, so both contribute their
/// joined scopes.
fn getBooleanOutcomePair(
    ctx: &mut Ctx,
    left: BooleanOutcomePair,
    right: BooleanOutcomePair,
    condition: bool,
) -> BooleanOutcomePair {
    let shortCircuit = BooleanLiteralSet::get(!condition);
    BooleanOutcomePair::new(
        getBooleanOutcomes(left.toBooleanOutcomes, right.toBooleanOutcomes, shortCircuit),
        getBooleanOutcomes(left.booleanValues, right.booleanValues, shortCircuit),
        left.getJoinedFlowScope(ctx),
        right.getJoinedFlowScope(ctx),
    )
}

/// The outcomes of `left && right` (`left || right`): those of the right
/// operand, plus those of the left one that short-circuit.
fn getBooleanOutcomes(
    left: BooleanLiteralSet,
    right: BooleanLiteralSet,
    shortCircuit: BooleanLiteralSet,
) -> BooleanLiteralSet {
    right.union(left.intersection(shortCircuit))
}

/// `ty` without the alternates that are subtypes of `excluded`.
fn restricted_union(registry: &mut TypeRegistry, ty: TypeId, excluded: TypeId) -> TypeId {
    let alternates: Vec<TypeId> = match registry.union_alternates(ty) {
        Some(alternates) => alternates
            .iter()
            .copied()
            .filter(|&alternate| !registry.is_subtype(alternate, excluded))
            .collect(),
        None => return ty,
    };
    if alternates.is_empty() {
        return registry.common_types.NO_TYPE;
    }
    registry.create_union(&alternates)
}

fn constructor_of(registry: &TypeRegistry, object: TypeId) -> Option<TypeId> {
    registry.ty(registry.resolve(object)).object()?.constructor
}

/// The `@template` types declared by the function owning `scope`, by name.
fn template_scope(ctx: &Ctx, scope: ScopeId) -> Vec<(JsWord, TypeId)> {
    let root = ctx.scopes[scope].getRootNode();
    let registry = &ctx.type_registry;
    registry
        .get_type(root)
        .and_then(|fnType| registry.get_function(fnType))
        .map(|function| {
            function
                .template_types
                .iter()
                .filter_map(|&template| match registry.kind(template) {
                    TyKind::TEMPLATE(t) => Some((t.name.clone(), template)),
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Whether the body of `function` reads `this`, not counting nested
/// functions, which have their own.
fn references_this(ast: &Ast, function: NodeId) -> bool {
    let mut pending: Vec<NodeId> = node_util::function_body(ast, function).into_iter().collect();
    while let Some(n) = pending.pop() {
        match ast.token(n) {
            Token::This => return true,
            Token::Function => {}
            _ => pending.extend(ast.children(n).iter().copied()),
        }
    }
    false
}
