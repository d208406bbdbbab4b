//! Narrowing of flow scopes from the outcome of a condition: knowing that
//! `x != null` held, `x` cannot be null on that branch.

use crate::ctx::Ctx;
use crate::linked_flow_scope::LinkedFlowScope;
use crate::options::CodingConventionKind;
use crate::typing::{TyKind, TypeId};
use ast::{node_util, NodeId, Token};

#[cfg(test)]
mod tests;

/**
 * The reverse abstract interpreter computes, given a condition and a flow
 * scope, the scope in which the condition evaluated to a given outcome.
 */
pub trait ReverseAbstractInterpreter {
    /**
     * Calculates a preciser scope on the basis of the information that `condition` evaluated to
     * `outcome`. The returned scope is `blindScope` itself when nothing can be learned.
     */
    fn getPreciserScopeKnowingConditionOutcome(
        &self,
        ctx: &mut Ctx,
        condition: NodeId,
        blindScope: LinkedFlowScope,
        outcome: bool,
    ) -> LinkedFlowScope;
}

/// The interpreter for a coding convention: the Closure one understands the
/// `goog.is*` predicates and falls back on plain JavaScript semantics.
pub fn create_reverse_interpreter(kind: CodingConventionKind) -> Box<dyn ReverseAbstractInterpreter> {
    match kind {
        CodingConventionKind::Default => Box::new(SemanticReverseAbstractInterpreter),
        CodingConventionKind::Closure => Box::new(ClosureReverseAbstractInterpreter {
            next: SemanticReverseAbstractInterpreter,
        }),
    }
}

/// What a condition learns about the type of a value: the value's type on
/// the branch where the condition held, or where it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeTest {
    /// `typeof x == "..."`, and the `goog.isString` family.
    TypeOf(TypeOfResult),
    /// `x === null`, `goog.isNull(x)`.
    Null,
    /// `x === undefined`, `!goog.isDef(x)`.
    Undefined,
    /// `x == null`, `!goog.isDefAndNotNull(x)`.
    NullOrUndefined,
    Array,
    /// `goog.isObject(x)`: a non-null object or a function.
    ObjectOrFunction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TypeOfResult {
    String,
    Number,
    Boolean,
    Undefined,
    Function,
    Object,
}

impl TypeOfResult {
    fn parse(value: &str) -> Option<TypeOfResult> {
        match value {
            "string" => Some(TypeOfResult::String),
            "number" => Some(TypeOfResult::Number),
            "boolean" => Some(TypeOfResult::Boolean),
            "undefined" => Some(TypeOfResult::Undefined),
            "function" => Some(TypeOfResult::Function),
            "object" => Some(TypeOfResult::Object),
            _ => None,
        }
    }
}

/// Whether a value of type `ty` passes `test`. `None` when values of the type
/// may or may not pass.
fn passes(ctx: &Ctx, ty: TypeId, test: TypeTest) -> Option<bool> {
    let registry = &ctx.type_registry;
    let ty = registry.resolve(ty);
    let c = &registry.common_types;
    if registry.is_unknown_type(ty) || registry.is_all_type(ty) {
        return None;
    }
    if let TyKind::ENUM_ELEMENT(element) = registry.kind(ty) {
        return passes(ctx, element.primitive_type, test);
    }
    let is_object = registry.is_object_type(ty);
    let is_function = registry.is_function_type(ty);
    Some(match test {
        TypeTest::TypeOf(TypeOfResult::String) => ty == c.STRING_TYPE,
        TypeTest::TypeOf(TypeOfResult::Number) => ty == c.NUMBER_TYPE,
        TypeTest::TypeOf(TypeOfResult::Boolean) => ty == c.BOOLEAN_TYPE,
        TypeTest::TypeOf(TypeOfResult::Undefined) | TypeTest::Undefined => ty == c.VOID_TYPE,
        TypeTest::TypeOf(TypeOfResult::Function) => is_function,
        TypeTest::TypeOf(TypeOfResult::Object) => ty == c.NULL_TYPE || (is_object && !is_function),
        TypeTest::Null => ty == c.NULL_TYPE,
        TypeTest::NullOrUndefined => ty == c.NULL_TYPE || ty == c.VOID_TYPE,
        TypeTest::Array => registry.is_subtype(ty, c.ARRAY_TYPE),
        TypeTest::ObjectOrFunction => is_object,
    })
}

/// The type a value has when nothing was known about it and it passed `test`.
fn type_passing(ctx: &mut Ctx, test: TypeTest) -> TypeId {
    let c = &ctx.type_registry.common_types;
    match test {
        TypeTest::TypeOf(TypeOfResult::String) => c.STRING_TYPE,
        TypeTest::TypeOf(TypeOfResult::Number) => c.NUMBER_TYPE,
        TypeTest::TypeOf(TypeOfResult::Boolean) => c.BOOLEAN_TYPE,
        TypeTest::TypeOf(TypeOfResult::Undefined) | TypeTest::Undefined => c.VOID_TYPE,
        TypeTest::TypeOf(TypeOfResult::Function) => c.FUNCTION_INSTANCE_TYPE,
        TypeTest::TypeOf(TypeOfResult::Object) => {
            let (object, null) = (c.OBJECT_TYPE, c.NULL_TYPE);
            ctx.type_registry.create_union(&[object, null])
        }
        TypeTest::Null => c.NULL_TYPE,
        TypeTest::NullOrUndefined => c.NULL_VOID,
        TypeTest::Array => c.ARRAY_TYPE,
        TypeTest::ObjectOrFunction => c.OBJECT_TYPE,
    }
}

/// Restricts `ty` to the values for which `test` gives `outcome`.
fn restrict_by_test(ctx: &mut Ctx, ty: TypeId, test: TypeTest, outcome: bool) -> TypeId {
    let ty = ctx.type_registry.resolve(ty);
    let registry = &ctx.type_registry;
    if registry.is_unknown_type(ty) || registry.is_all_type(ty) {
        return if outcome { type_passing(ctx, test) } else { ty };
    }
    if let Some(alternates) = registry.union_alternates(ty).map(<[TypeId]>::to_vec) {
        let kept: Vec<TypeId> = alternates
            .into_iter()
            .map(|alternate| restrict_by_test(ctx, alternate, test, outcome))
            .collect();
        return ctx.type_registry.create_union(&kept);
    }
    match passes(ctx, ty, test) {
        Some(passed) if passed != outcome => ctx.type_registry.common_types.NO_TYPE,
        _ => ty,
    }
}

/// The semantics of plain JavaScript conditions.
#[derive(Debug, Clone, Copy, Default)]
pub struct SemanticReverseAbstractInterpreter;

impl ReverseAbstractInterpreter for SemanticReverseAbstractInterpreter {
    fn getPreciserScopeKnowingConditionOutcome(
        &self,
        ctx: &mut Ctx,
        condition: NodeId,
        blindScope: LinkedFlowScope,
        outcome: bool,
    ) -> LinkedFlowScope {
        self.preciserScope(self, ctx, condition, blindScope, outcome)
    }
}

impl SemanticReverseAbstractInterpreter {
    /// Narrows `blindScope` knowing the outcome of `condition`. Operands of
    /// `!`, `&&`, `||` and `,` are narrowed by `first`, the outermost
    /// interpreter of the chain.
    fn preciserScope(
        &self,
        first: &dyn ReverseAbstractInterpreter,
        ctx: &mut Ctx,
        condition: NodeId,
        blindScope: LinkedFlowScope,
        outcome: bool,
    ) -> LinkedFlowScope {
        let ast = ctx.ast;
        match ast.token(condition) {
            Token::Eq | Token::Ne | Token::ShEq | Token::ShNe => {
                let (left, right) = match (ast.first_child(condition), ast.last_child(condition)) {
                    (Some(left), Some(right)) => (left, right),
                    _ => return blindScope,
                };
                let equality = matches!(ast.token(condition), Token::Eq | Token::ShEq);
                let shallow = matches!(ast.token(condition), Token::ShEq | Token::ShNe);
                let outcome = if equality { outcome } else { !outcome };

                // typeof x == "string"
                if let Some((operand, typeOfResult)) = typeof_comparison(ctx, left, right)
                    .or_else(|| typeof_comparison(ctx, right, left))
                {
                    return self.caseTestOf(ctx, operand, TypeTest::TypeOf(typeOfResult), blindScope, outcome);
                }

                // x == null, x === undefined
                for (operand, literal) in [(left, right), (right, left)] {
                    let test = match literal_test(ctx, literal) {
                        Some(TypeTest::Null) | Some(TypeTest::Undefined) if !shallow => {
                            TypeTest::NullOrUndefined
                        }
                        Some(test) => test,
                        None => continue,
                    };
                    return self.caseTestOf(ctx, operand, test, blindScope, outcome);
                }
                blindScope
            }

            Token::And => {
                let (left, right) = match (ast.first_child(condition), ast.last_child(condition)) {
                    (Some(left), Some(right)) => (left, right),
                    _ => return blindScope,
                };
                if outcome {
                    caseAndOrNotShortCircuiting(first, ctx, left, right, blindScope, true)
                } else {
                    caseAndOrMaybeShortCircuiting(first, ctx, left, right, blindScope, false)
                }
            }

            Token::Or => {
                let (left, right) = match (ast.first_child(condition), ast.last_child(condition)) {
                    (Some(left), Some(right)) => (left, right),
                    _ => return blindScope,
                };
                if !outcome {
                    caseAndOrNotShortCircuiting(first, ctx, left, right, blindScope, false)
                } else {
                    caseAndOrMaybeShortCircuiting(first, ctx, left, right, blindScope, true)
                }
            }

            Token::Name | Token::GetProp => self.caseNameOrGetProp(ctx, condition, blindScope, outcome),

            Token::Not => match ast.first_child(condition) {
                Some(operand) => first.getPreciserScopeKnowingConditionOutcome(ctx, operand, blindScope, !outcome),
                None => blindScope,
            },

            Token::InstanceOf => match (ast.first_child(condition), ast.last_child(condition)) {
                (Some(left), Some(right)) => self.caseInstanceOf(ctx, left, right, blindScope, outcome),
                _ => blindScope,
            },

            Token::Comma => match ast.last_child(condition) {
                Some(last) => first.getPreciserScopeKnowingConditionOutcome(ctx, last, blindScope, outcome),
                None => blindScope,
            },

            _ => blindScope,
        }
    }
}

/// `typeof operand == "value"` seen from `typeof operand`.
fn typeof_comparison(ctx: &Ctx, typeof_node: NodeId, value: NodeId) -> Option<(NodeId, TypeOfResult)> {
    let ast = ctx.ast;
    if !ast.is(typeof_node, Token::TypeOf) || !ast.is(value, Token::String) {
        return None;
    }
    let operand = ast.first_child(typeof_node)?;
    Some((operand, TypeOfResult::parse(ast.string(value))?))
}

/// The test a comparison against the literal `null` or `undefined` makes.
fn literal_test(ctx: &Ctx, literal: NodeId) -> Option<TypeTest> {
    let ast = ctx.ast;
    match ast.token(literal) {
        Token::Null => Some(TypeTest::Null),
        Token::Void => Some(TypeTest::Undefined),
        Token::Name if &**ast.string(literal) == "undefined" => Some(TypeTest::Undefined),
        _ => None,
    }
}

impl SemanticReverseAbstractInterpreter {
    /**
     * Returns the type of a node in the given scope if the node corresponds to a name whose type
     * is capable of being refined.
     */
    fn getTypeIfRefinable(&self, ctx: &Ctx, node: NodeId, scope: &LinkedFlowScope) -> Option<TypeId> {
        let ast = ctx.ast;
        match ast.token(node) {
            Token::Name => {
                let slot = scope.getSlot(ctx, ast.string(node))?;
                slot.getType(ctx).or_else(|| ctx.type_registry.get_type(node))
            }
            Token::GetProp => {
                let qualifiedName = node_util::get_qualified_name(ast, node)?;
                let propVarType = scope
                    .getSlot(ctx, &qualifiedName)
                    .and_then(|slot| slot.getType(ctx))
                    .or_else(|| ctx.type_registry.get_type(node));
                Some(propVarType.unwrap_or(ctx.type_registry.common_types.UNKNOWN_TYPE))
            }
            _ => None,
        }
    }

    /**
     * Declares a refined type in `scope` for the name represented by `node`. It must be possible
     * to refine the type of the given node in the given scope, as determined by
     * `getTypeIfRefinable`.
     */
    fn declareNameInScope(
        &self,
        ctx: &mut Ctx,
        scope: LinkedFlowScope,
        node: NodeId,
        ty: TypeId,
    ) -> LinkedFlowScope {
        let ast = ctx.ast;
        match ast.token(node) {
            Token::Name => scope.inferSlotType(ctx, ast.string(node), ty),
            Token::GetProp => match node_util::get_qualified_name(ast, node) {
                Some(qualifiedName) => {
                    let origType = ctx
                        .type_registry
                        .get_type(node)
                        .unwrap_or(ctx.type_registry.common_types.UNKNOWN_TYPE);
                    scope.inferQualifiedSlot(ctx, node, &qualifiedName, origType, ty, false)
                }
                None => scope,
            },
            _ => scope,
        }
    }

    /** Returns a version of the scope in which `node` has the restricted type, if it differs. */
    fn maybeRestrictName(
        &self,
        ctx: &mut Ctx,
        blindScope: LinkedFlowScope,
        node: NodeId,
        originalType: TypeId,
        restrictedType: Option<TypeId>,
    ) -> LinkedFlowScope {
        match restrictedType {
            Some(restrictedType) if restrictedType != originalType => {
                self.declareNameInScope(ctx, blindScope, node, restrictedType)
            }
            _ => blindScope,
        }
    }

    fn caseNameOrGetProp(
        &self,
        ctx: &mut Ctx,
        name: NodeId,
        blindScope: LinkedFlowScope,
        outcome: bool,
    ) -> LinkedFlowScope {
        match self.getTypeIfRefinable(ctx, name, &blindScope) {
            Some(ty) => {
                let restrictedType = ctx
                    .type_registry
                    .get_restricted_type_given_to_boolean_outcome(ty, outcome);
                self.maybeRestrictName(ctx, blindScope, name, ty, Some(restrictedType))
            }
            None => blindScope,
        }
    }

    /// Applies a type test to a refinable operand.
    fn caseTestOf(
        &self,
        ctx: &mut Ctx,
        operand: NodeId,
        test: TypeTest,
        blindScope: LinkedFlowScope,
        outcome: bool,
    ) -> LinkedFlowScope {
        match self.getTypeIfRefinable(ctx, operand, &blindScope) {
            Some(ty) => {
                let restricted = restrict_by_test(ctx, ty, test, outcome);
                self.maybeRestrictName(ctx, blindScope, operand, ty, Some(restricted))
            }
            None => blindScope,
        }
    }

    fn caseInstanceOf(
        &self,
        ctx: &mut Ctx,
        left: NodeId,
        right: NodeId,
        blindScope: LinkedFlowScope,
        outcome: bool,
    ) -> LinkedFlowScope {
        let leftType = match self.getTypeIfRefinable(ctx, left, &blindScope) {
            Some(leftType) => leftType,
            None => return blindScope,
        };
        let registry = &ctx.type_registry;
        let instance = registry
            .get_type(right)
            .and_then(|rightType| registry.get_function(rightType))
            .filter(|function| function.hasInstanceType())
            .and_then(|function| function.instance_type);
        let instance = match instance {
            Some(instance) => instance,
            None => return blindScope,
        };
        let restricted = restrict_by_instance_of(ctx, leftType, instance, outcome);
        self.maybeRestrictName(ctx, blindScope, left, leftType, Some(restricted))
    }
}

/**
 * Both operands were evaluated and both agree with `condition`: `a && b` was true, or `a || b` was
 * false.
 */
fn caseAndOrNotShortCircuiting(
    first: &dyn ReverseAbstractInterpreter,
    ctx: &mut Ctx,
    left: NodeId,
    right: NodeId,
    blindScope: LinkedFlowScope,
    condition: bool,
) -> LinkedFlowScope {
    let scope = first.getPreciserScopeKnowingConditionOutcome(ctx, left, blindScope, condition);
    first.getPreciserScopeKnowingConditionOutcome(ctx, right, scope, condition)
}

/**
 * Either the left operand decided the outcome, or the left operand did not and the right one did.
 * What holds afterwards is what holds on both paths.
 */
fn caseAndOrMaybeShortCircuiting(
    first: &dyn ReverseAbstractInterpreter,
    ctx: &mut Ctx,
    left: NodeId,
    right: NodeId,
    blindScope: LinkedFlowScope,
    condition: bool,
) -> LinkedFlowScope {
    let leftScope = first.getPreciserScopeKnowingConditionOutcome(ctx, left, blindScope.clone(), condition);
    let rightScope = first.getPreciserScopeKnowingConditionOutcome(ctx, left, blindScope.clone(), !condition);
    let rightScope = first.getPreciserScopeKnowingConditionOutcome(ctx, right, rightScope, condition);
    if leftScope == blindScope || rightScope == blindScope {
        return blindScope;
    }
    LinkedFlowScope::join_scopes(ctx, &leftScope, &rightScope)
}

/// Restricts `ty` to the values that are (or are not) instances of `instance`.
fn restrict_by_instance_of(ctx: &mut Ctx, ty: TypeId, instance: TypeId, outcome: bool) -> TypeId {
    let ty = ctx.type_registry.resolve(ty);
    let registry = &ctx.type_registry;
    if registry.is_unknown_type(ty) || registry.is_all_type(ty) {
        return if outcome { instance } else { ty };
    }
    if let Some(alternates) = registry.union_alternates(ty).map(<[TypeId]>::to_vec) {
        let kept: Vec<TypeId> = alternates
            .into_iter()
            .map(|alternate| restrict_by_instance_of(ctx, alternate, instance, outcome))
            .collect();
        return ctx.type_registry.create_union(&kept);
    }
    let registry = &ctx.type_registry;
    let no = registry.common_types.NO_TYPE;
    if !registry.is_object_type(ty) {
        // Primitives are never instances.
        return if outcome { no } else { ty };
    }
    let is_instance = registry.is_subtype(ty, instance);
    match (outcome, is_instance) {
        (true, true) => ty,
        // A supertype of the instance type may hold an instance.
        (true, false) if registry.is_subtype(instance, ty) => instance,
        (true, false) => no,
        (false, true) => no,
        (false, false) => ty,
    }
}

/// The Closure library's type predicates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClosureReverseAbstractInterpreter {
    next: SemanticReverseAbstractInterpreter,
}

impl ClosureReverseAbstractInterpreter {
    /// The test made by a `goog.is*` predicate, and whether a `true` result
    /// means the test passed.
    fn predicate(name: &str) -> Option<(TypeTest, bool)> {
        Some(match name {
            "goog.isDef" => (TypeTest::Undefined, false),
            "goog.isNull" => (TypeTest::Null, true),
            "goog.isDefAndNotNull" => (TypeTest::NullOrUndefined, false),
            "goog.isString" => (TypeTest::TypeOf(TypeOfResult::String), true),
            "goog.isNumber" => (TypeTest::TypeOf(TypeOfResult::Number), true),
            "goog.isBoolean" => (TypeTest::TypeOf(TypeOfResult::Boolean), true),
            "goog.isFunction" => (TypeTest::TypeOf(TypeOfResult::Function), true),
            "goog.isObject" => (TypeTest::ObjectOrFunction, true),
            "goog.isArray" => (TypeTest::Array, true),
            _ => return None,
        })
    }
}

impl ReverseAbstractInterpreter for ClosureReverseAbstractInterpreter {
    fn getPreciserScopeKnowingConditionOutcome(
        &self,
        ctx: &mut Ctx,
        condition: NodeId,
        blindScope: LinkedFlowScope,
        outcome: bool,
    ) -> LinkedFlowScope {
        let ast = ctx.ast;
        if ast.is(condition, Token::Call) && ast.child_count(condition) == 2 {
            let predicate = ast
                .first_child(condition)
                .and_then(|callee| node_util::get_qualified_name(ast, callee))
                .and_then(|name| ClosureReverseAbstractInterpreter::predicate(&name));
            if let (Some((test, passedOnTrue)), Some(param)) = (predicate, ast.second_child(condition)) {
                if let Some(ty) = self.next.getTypeIfRefinable(ctx, param, &blindScope) {
                    let passed = outcome == passedOnTrue;
                    let restricted = restrict_by_test(ctx, ty, test, passed);
                    return self.next.maybeRestrictName(ctx, blindScope, param, ty, Some(restricted));
                }
            }
        }
        self.next.preciserScope(self, ctx, condition, blindScope, outcome)
    }
}
