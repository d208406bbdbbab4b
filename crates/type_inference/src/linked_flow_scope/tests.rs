use super::*;
use crate::options::InferenceOptions;
use crate::typed_scope_creator::TypedScopeCreator;
use ast::{Ast, Token};
use pretty_assertions::assert_eq;

const SRC: &str = "
    function f() {
      var a;
      var b;
      /** @type {?number} */ var n;
    }";

fn parse(src: &str) -> Ast {
    let mut ast = Ast::new();
    parser::parse_script(&mut ast, "test.js", src).unwrap();
    ast
}

/// A context holding the global scope and the scope of the first function.
fn function_scope(ast: &Ast) -> (Ctx<'_>, ScopeId) {
    let mut ctx = Ctx::new(ast, InferenceOptions::default());
    let mut creator = TypedScopeCreator::new();
    let global = creator.createScope(&mut ctx, ast.root(), None);
    let mut function = None;
    node_util::pre_order(ast, ast.root(), &mut |n| {
        if function.is_none() && ast.is(n, Token::Function) {
            function = Some(n);
        }
        function.is_none()
    });
    let local = creator.createScope(&mut ctx, function.unwrap(), Some(global));
    (ctx, local)
}

fn infer(ctx: &Ctx, flow: LinkedFlowScope, name: &str, ty: TypeId) -> LinkedFlowScope {
    flow.inferSlotType(ctx, &JsWord::from(name), ty)
}

fn type_of(ctx: &Ctx, flow: &LinkedFlowScope, name: &str) -> String {
    match flow.getSlot(ctx, name).and_then(|slot| slot.getType(ctx)) {
        Some(ty) => ctx.type_registry.type_to_string(ty),
        None => "<none>".to_string(),
    }
}

#[test]
fn testEntryLatticeHasNoInferredSlots() {
    let ast = parse(SRC);
    let (ctx, local) = function_scope(&ast);
    let entry = LinkedFlowScope::createEntryLattice(local);

    assert!(!entry.flowsFromBottom(&ctx));
    assert_eq!(entry.getDeclarationScope(), local);
    assert_eq!(entry.getSlot(&ctx, "a"), ctx.getVar(local, "a").map(Slot::Typed));
    assert_eq!(type_of(&ctx, &entry, "n"), "(null|number)");
}

#[test]
fn testInferringTheSameTypeKeepsTheScope() {
    let ast = parse(SRC);
    let (ctx, local) = function_scope(&ast);
    let c = ctx.type_registry.common_types;
    let flow = infer(&ctx, LinkedFlowScope::createEntryLattice(local), "a", c.NUMBER_TYPE);

    let again = infer(&ctx, flow.clone(), "a", c.NUMBER_TYPE);
    assert_eq!(again, flow);
    assert_eq!(flow.getSlot(&ctx, "a"), Some(Slot::Overlay(c.NUMBER_TYPE)));
    assert!(flow.getSlot(&ctx, "a").unwrap().isTypeInferred(&ctx));
}

#[test]
fn testJoinIsIdempotent() {
    let ast = parse(SRC);
    let (mut ctx, local) = function_scope(&ast);
    let c = ctx.type_registry.common_types;
    let flow = LinkedFlowScope::createEntryLattice(local);
    let flow = infer(&ctx, flow, "a", c.NUMBER_TYPE);
    let flow = infer(&ctx, flow, "b", c.STRING_TYPE);

    let joined = LinkedFlowScope::join_scopes(&mut ctx, &flow, &flow);
    assert_eq!(joined, flow);
    assert_eq!(type_of(&ctx, &joined, "a"), "number");
    assert_eq!(type_of(&ctx, &joined, "b"), "string");
}

#[test]
fn testBottomIsAbsorbedByJoin() {
    let ast = parse(SRC);
    let (mut ctx, local) = function_scope(&ast);
    let c = ctx.type_registry.common_types;
    let bottom = LinkedFlowScope::createLatticeBottom(&mut ctx);
    let flow = infer(&ctx, LinkedFlowScope::createEntryLattice(local), "n", c.NUMBER_TYPE);

    assert!(bottom.flowsFromBottom(&ctx));
    let left = LinkedFlowScope::join_scopes(&mut ctx, &bottom, &flow);
    let right = LinkedFlowScope::join_scopes(&mut ctx, &flow, &bottom);
    assert_eq!(left, flow);
    assert_eq!(right, flow);
    // The declared type of the unreachable side takes no part.
    assert_eq!(type_of(&ctx, &left, "n"), "number");
    assert!(!left.flowsFromBottom(&ctx));
}

#[test]
fn testSlotsOnOneSideWithoutDeclaredTypeAreKept() {
    let ast = parse(SRC);
    let (mut ctx, local) = function_scope(&ast);
    let c = ctx.type_registry.common_types;
    let entry = LinkedFlowScope::createEntryLattice(local);
    let left = infer(&ctx, entry.clone(), "a", c.NUMBER_TYPE);
    let right = infer(&ctx, entry, "b", c.STRING_TYPE);

    let joined = LinkedFlowScope::join_scopes(&mut ctx, &left, &right);
    assert_eq!(type_of(&ctx, &joined, "a"), "number");
    assert_eq!(type_of(&ctx, &joined, "b"), "string");
}

#[test]
fn testSlotsOnOneSideAreJoinedWithTheDeclaredType() {
    let ast = parse(SRC);
    let (mut ctx, local) = function_scope(&ast);
    let c = ctx.type_registry.common_types;
    let entry = LinkedFlowScope::createEntryLattice(local);
    let narrowed = infer(&ctx, entry.clone(), "n", c.NUMBER_TYPE);

    let left = LinkedFlowScope::join_scopes(&mut ctx, &narrowed, &entry);
    let right = LinkedFlowScope::join_scopes(&mut ctx, &entry, &narrowed);
    assert_eq!(type_of(&ctx, &left, "n"), "(null|number)");
    assert_eq!(type_of(&ctx, &right, "n"), "(null|number)");
}

#[test]
fn testSlotsOnBothSidesAreJoined() {
    let ast = parse(SRC);
    let (mut ctx, local) = function_scope(&ast);
    let c = ctx.type_registry.common_types;
    let entry = LinkedFlowScope::createEntryLattice(local);
    let left = infer(&ctx, entry.clone(), "a", c.NUMBER_TYPE);
    let right = infer(&ctx, entry, "a", c.STRING_TYPE);

    let joined = LinkedFlowScope::join_scopes(&mut ctx, &left, &right);
    assert_eq!(type_of(&ctx, &joined, "a"), "(number|string)");
}
