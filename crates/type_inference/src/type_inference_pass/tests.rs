use super::*;
use crate::error::InferenceError;
use ast::node_util;
use pretty_assertions::assert_eq;

fn parse(externs: &str, src: &str) -> Ast {
    let mut ast = Ast::new();
    parser::parse_externs(&mut ast, "externs.js", externs).unwrap();
    parser::parse_script(&mut ast, "test.js", src).unwrap();
    ast
}

fn functions(ast: &Ast) -> Vec<NodeId> {
    let mut found = Vec::new();
    node_util::pre_order(ast, ast.root(), &mut |n| {
        if ast.is(n, Token::Function) {
            found.push(n);
        }
        true
    });
    found
}

#[test]
fn testEveryFunctionGetsAScope() {
    let src = "function outer() { function inner() { var z; } var y = function() {}; }";
    let ast = parse("", src);
    let program = infer_types(&ast, InferenceOptions::default()).unwrap();

    assert_eq!(program.scope_for(ast.root()), Some(program.global_scope));
    let fns = functions(&ast);
    assert_eq!(fns.len(), 3);
    let scopes: Vec<ScopeId> = fns.iter().map(|&f| program.scope_for(f).unwrap()).collect();

    // Scopes are created outermost first.
    assert!(program.global_scope < scopes[0]);
    assert!(scopes[0] < scopes[1]);
    assert_eq!(program.ctx.scopes[scopes[1]].get_parent(), Some(scopes[0]));
    assert_eq!(program.ctx.scopes[scopes[2]].get_parent(), Some(scopes[0]));
    assert_eq!(program.ctx.scopes[scopes[0]].get_parent(), Some(program.global_scope));
}

#[test]
fn testCallSiteTypesFunctionLiteralParameters() {
    let src = "
        /** @param {function(string)} cb */
        function each(cb) {}
        each(function(item) { var copy = item; });";
    let ast = parse("", src);
    let program = infer_types(&ast, InferenceOptions::default()).unwrap();

    let literal = functions(&ast)[1];
    let scope = program.scope_for(literal).unwrap();
    let item = program.ctx.getVarType(scope, "item").unwrap();
    assert_eq!(program.ctx.type_registry.type_to_string(item), "string");

    let mut copy = None;
    node_util::pre_order(&ast, literal, &mut |n| {
        if ast.is(n, Token::Name) && &**ast.string(n) == "copy" {
            copy = Some(n);
        }
        true
    });
    let copyType = program.node_type(copy.unwrap()).unwrap();
    assert_eq!(program.ctx.type_registry.type_to_string(copyType), "string");
}

#[test]
fn testExpressionsAreTyped() {
    let ast = parse("", "var x = 1 + 2;");
    let program = infer_types(&ast, InferenceOptions::default()).unwrap();

    let mut add = None;
    node_util::pre_order(&ast, ast.root(), &mut |n| {
        if ast.is(n, Token::Add) {
            add = Some(n);
        }
        true
    });
    let c = program.ctx.type_registry.common_types;
    assert_eq!(program.node_type(add.unwrap()), Some(c.NUMBER_TYPE));
    assert!(program.diagnostics().is_empty());
}

#[test]
fn testInferSubtree() {
    let ast = parse("", "var a = 1; function f() { var b = a; }");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let mut pass = TypeInferencePass::new(&ctx);
    let global = pass.process(&mut ctx).unwrap();

    // Running again over a function reuses the scopes already built.
    let f = functions(&ast)[0];
    let local = pass.inferAllScopes(&mut ctx, f).unwrap();
    assert_eq!(ctx.scope_for_root(f), Some(local));
    assert_eq!(ctx.scopes[local].get_parent(), Some(global));
}

#[test]
fn testStepLimitIsReported() {
    let src = "
        function f() {
          var x = 0;
          while (x < 10) { x = 'a' + x; }
        }";
    let ast = parse("", src);
    let options = InferenceOptions {
        max_steps_per_node: 0,
        ..InferenceOptions::default()
    };
    let result = infer_types(&ast, options);

    assert!(matches!(result, Err(InferenceError::Divergence { .. })));
}
