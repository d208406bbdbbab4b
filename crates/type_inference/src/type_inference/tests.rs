use super::TypeInference;
use crate::control_flow::node::Node;
use crate::control_flow::ControlFlowAnalysis::ControlFlowAnalysis;
use crate::ctx::Ctx;
use crate::diagnostics::FUNCTION_LITERAL_UNDEFINED_THIS;
use crate::options::{CodingConventionKind, InferenceOptions};
use crate::reverse_abstract_interpreter::create_reverse_interpreter;
use crate::type_inference_pass::{infer_types, TypedProgram};
use crate::typed_scope_creator::TypedScopeCreator;
use crate::DataFlowAnalysis::{DataFlowAnalysisInner, LatticeElementId, LinearFlowState};
use ast::{node_util, Ast, NodeId, Token};
use pretty_assertions::assert_eq;

fn parse(externs: &str, src: &str) -> Ast {
    let mut ast = Ast::new();
    parser::parse_externs(&mut ast, "externs.js", externs).unwrap();
    parser::parse_script(&mut ast, "test.js", src).unwrap();
    ast
}

fn infer(ast: &Ast) -> TypedProgram<'_> {
    infer_types(ast, InferenceOptions::default()).unwrap()
}

/// The `var` declaration of `name`.
fn declaration_of(ast: &Ast, name: &str) -> NodeId {
    let mut found = None;
    node_util::pre_order(ast, ast.root(), &mut |n| {
        if ast.is(n, Token::Name)
            && &**ast.string(n) == name
            && ast.parent(n).map_or(false, |parent| ast.is(parent, Token::Var))
        {
            found = Some(n);
        }
        true
    });
    found.unwrap()
}

/// The type a `var` was initialized with.
fn initialized_type(program: &TypedProgram, name: &str) -> String {
    let decl = declaration_of(program.ctx.ast, name);
    match program.node_type(decl) {
        Some(ty) => program.ctx.type_registry.type_to_string(ty),
        None => "<none>".to_string(),
    }
}

fn diagnostic_keys(program: &TypedProgram) -> Vec<&'static str> {
    program.diagnostics().iter().map(|e| e.kind.key).collect()
}

#[test]
fn testLiterals() {
    let ast = parse("", "var a = 1; var b = 'x'; var c = true; var d = null; var e = [1]; var f = -a;");
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "a"), "number");
    assert_eq!(initialized_type(&program, "b"), "string");
    assert_eq!(initialized_type(&program, "c"), "boolean");
    assert_eq!(initialized_type(&program, "d"), "null");
    assert_eq!(initialized_type(&program, "e"), "Array");
    assert_eq!(initialized_type(&program, "f"), "number");
}

#[test]
fn testAdd() {
    let src = "
        var s = 'a' + 1;
        var n = 1 + true;
        var o = ({}) + 1;
        /** @param {?} u */
        function f(u) {
          var us = u + 'a';
          var uu = u + u;
          var un = u + 1;
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "s"), "string");
    assert_eq!(initialized_type(&program, "n"), "number");
    assert_eq!(initialized_type(&program, "o"), "(number|string)");
    assert_eq!(initialized_type(&program, "us"), "string");
    assert_eq!(initialized_type(&program, "uu"), "?");
    assert_eq!(initialized_type(&program, "un"), "?");
}

#[test]
fn testAddOfStringUnionIsString() {
    let src = "/** @param {(string|number)} x */ function f(x) { var r = x + 1; }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "r"), "string");
}

#[test]
fn testAssignAddUpdatesTheName() {
    let src = "function f() { var x = 1; x += 'a'; var r = x; }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "r"), "string");
}

#[test]
fn testDeclaredVarStartsUndefined() {
    let ast = parse("", "function f() { var x; var before = x; x = 3; var after = x; }");
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "before"), "undefined");
    assert_eq!(initialized_type(&program, "after"), "number");
}

#[test]
fn testAssignmentFlows() {
    let src = "
        /** @param {boolean} b */
        function f(b) {
          var x = 1;
          if (b) { x = 'a'; }
          var joined = x;
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "joined"), "(number|string)");
}

#[test]
fn testIfNarrowsOnTruthiness() {
    let src = "
        /** @param {?string} x */
        function f(x) {
          if (x) { var inside = x; } else { var otherwise = x; }
          var after = x;
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "inside"), "string");
    assert_eq!(initialized_type(&program, "otherwise"), "(null|string)");
    assert_eq!(initialized_type(&program, "after"), "(null|string)");
}

#[test]
fn testNullCheckNarrows() {
    let src = "
        /** @param {(number|null|undefined)} x */
        function f(x) {
          if (x != null) { var a = x; }
          if (x === null) { var b = x; }
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "a"), "number");
    assert_eq!(initialized_type(&program, "b"), "null");
}

#[test]
fn testTypeofNarrows() {
    let src = "
        /** @param {(number|string)} x */
        function f(x) {
          if (typeof x == 'string') { var s = x; } else { var n = x; }
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "s"), "string");
    assert_eq!(initialized_type(&program, "n"), "number");
}

#[test]
fn testAndNarrowsTheRightOperand() {
    let src = "
        /** @constructor */ function Foo() {}
        /** @return {number} */ Foo.prototype.bar = function() { return 1; };
        /** @param {Foo} x */
        function f(x) {
          var r = x && x.bar();
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    let mut bar_owner = None;
    node_util::pre_order(&ast, ast.root(), &mut |n| {
        if ast.is(n, Token::GetProp) && &**ast.string(n) == "bar" {
            bar_owner = ast.first_child(n);
        }
        true
    });
    let owner = bar_owner.unwrap();
    let ownerType = program.node_type(owner).unwrap();
    assert_eq!(program.ctx.type_registry.type_to_string(ownerType), "Foo");
    assert_eq!(initialized_type(&program, "r"), "(null|number)");
}

#[test]
fn testNestedShortCircuitKeepsSkippedAssignments() {
    let src = "
        function f(a, c) {
          var x = null;
          var v = a && (x = 3) && c;
          var afterAnd = x;
        }
        function g(a, c) {
          var y = null;
          var w = a || (y = 3) || c;
          var afterOr = y;
        }
        function h(a, c) {
          var z = null;
          if (a && (z = 3) && c) {} else { var r = z; }
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "afterAnd"), "(null|number)");
    assert_eq!(initialized_type(&program, "afterOr"), "(null|number)");
    assert_eq!(initialized_type(&program, "r"), "(null|number)");
}

#[test]
fn testOrDefault() {
    let src = "/** @param {?string} x */ function f(x) { var r = x || 'default'; }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "r"), "string");
}

#[test]
fn testHookBranchesAreNarrowedSeparately() {
    let src = "
        /** @param {?number} x */
        function f(x) {
          var r = x ? x : 'none';
          var after = x;
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "r"), "(number|string)");
    assert_eq!(initialized_type(&program, "after"), "(null|number)");
}

#[test]
fn testHookWithUntypedBranchIsUnknown() {
    let src = "/** @param {boolean} b */ function f(b) { var r = b ? undeclared : 1; }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "r"), "?");
}

#[test]
fn testForInKeysAreStrings() {
    let src = "
        function f(o) { for (var k in o) { var key = k; } }
        /** @param {!Object<number, string>} o */
        function g(o) { for (var i in o) { var index = i; } }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "key"), "string");
    assert_eq!(initialized_type(&program, "index"), "string");
}

#[test]
fn testForInKeysTakeTheEnumIndexType() {
    let src = "
        /** @enum {string} */ var E = {A: 'a', B: 'b'};
        /** @param {!Object<E, number>} o */
        function f(o) { for (var k in o) { var key = k; } }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "key"), "E");
}

#[test]
fn testGetElemOfTypedArray() {
    let src = "/** @param {!Array<number>} arr */ function f(arr) { var e = arr[0]; }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "e"), "number");
}

#[test]
fn testCatchNameIsUnknown() {
    let ast = parse("", "function f(g) { try { g(); } catch (e) { var caught = e; } }");
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "caught"), "?");
}

#[test]
fn testEscapedVarIsNotNarrowed() {
    let src = "function f() { var x = 1; function g() { x = 'a'; } var r = x; }";
    let ast = parse("", src);

    let program = infer(&ast);
    assert_eq!(initialized_type(&program, "r"), "?");

    let options = InferenceOptions {
        record_escaped_vars: false,
        ..InferenceOptions::default()
    };
    let program = infer_types(&ast, options).unwrap();
    assert_eq!(initialized_type(&program, "r"), "number");
}

#[test]
fn testTemplateTypeOfCall() {
    let src = "
        /**
         * @param {T} t
         * @return {T}
         * @template T
         */
        function identity(t) { return t; }
        var s = identity('a');
        var n = identity(1);";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "s"), "string");
    assert_eq!(initialized_type(&program, "n"), "number");
}

#[test]
fn testBind() {
    let src = "
        /**
         * @param {number} a
         * @param {string} b
         * @return {boolean}
         */
        function f(a, b) { return true; }
        var g = f.bind(null, 1);";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "g"), "function (string): boolean");
}

#[test]
fn testFunctionLiteralArgumentTakesParameterType() {
    let src = "
        /** @param {function(number): string} cb */
        function run(cb) {}
        run(function(x) { return ''; });";
    let ast = parse("", src);
    let program = infer(&ast);

    let mut literal = None;
    node_util::pre_order(&ast, ast.root(), &mut |n| {
        if ast.is(n, Token::Function) && ast.parent(n).map_or(false, |p| ast.is(p, Token::Call)) {
            literal = Some(n);
        }
        true
    });
    let literal = literal.unwrap();
    let ty = program.node_type(literal).unwrap();
    assert_eq!(program.ctx.type_registry.type_to_string(ty), "function (number): string");
    assert!(diagnostic_keys(&program).is_empty());
}

#[test]
fn testFunctionLiteralUndefinedThis() {
    let src = "
        /** @param {function()} cb */
        function run(cb) {}
        run(function() { return this; });
        run(function() { return 1; });";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(diagnostic_keys(&program), vec![FUNCTION_LITERAL_UNDEFINED_THIS.key]);
}

#[test]
fn testAssertionNarrows() {
    let externs = "
        var goog = {};
        goog.asserts = {};
        /** @return {?} */
        goog.asserts.assertString = function(value) {};";
    let src = "
        /** @param {(number|string)} x */
        function f(x) {
          goog.asserts.assertString(x);
          var s = x;
        }";
    let ast = parse(externs, src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "s"), "string");
}

#[test]
fn testNewGivesInstanceType() {
    let src = "/** @constructor */ function Foo() {} var foo = new Foo(); var bar = new Undeclared();";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "foo"), "Foo");
    assert_eq!(initialized_type(&program, "bar"), "?");
}

#[test]
fn testThisInConstructor() {
    let src = "/** @constructor */ function Foo() { var self = this; }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "self"), "Foo");
}

#[test]
fn testPropertyAccessNarrowsOwner() {
    let src = "
        /** @param {?{a: number}} o */
        function f(o) {
          var a = o.a;
          var owner = o;
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "a"), "number");
    assert_eq!(initialized_type(&program, "owner"), "{a: number}");
}

#[test]
fn testLocallyInferredUnknownPropertyIsChecked() {
    let src = "function f() { var ns = {}; ns.foo = undeclared(); var r = ns.foo; }";
    let ast = parse("", src);
    let program = infer(&ast);

    let r = declaration_of(&ast, "r");
    let ty = program.node_type(r).unwrap();
    assert!(program.ctx.type_registry.is_checked_unknown_type(ty));
}

#[test]
fn testObjectLiteralPropertiesAreInferred() {
    let ast = parse("", "var o = {a: 1, b: 'x'}; var r = o.b;");
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "r"), "string");
}

#[test]
fn testComparisonsAreBoolean() {
    let src = "function f(a, b) { var lt = a < b; var eq = a == b; var t = typeof a; var c = (a, 1); }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "lt"), "boolean");
    assert_eq!(initialized_type(&program, "eq"), "boolean");
    assert_eq!(initialized_type(&program, "t"), "string");
    assert_eq!(initialized_type(&program, "c"), "number");
}

#[test]
fn testCastOverridesInferredType() {
    let src = "function f(a) { var n = /** @type {number} */ (a); }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "n"), "number");
}

#[test]
fn testLoopReachesFixedPoint() {
    let src = "
        function f() {
          var x = 0;
          var y = 0;
          while (x < 10) { y = x; x = x + 1; }
          var r = y;
        }";
    let ast = parse("", src);
    let program = infer(&ast);

    assert_eq!(initialized_type(&program, "r"), "number");
}

#[test]
fn testPropertyOnUnknownOwnerIsRegistered() {
    let ast = parse("", "function f(x) { x.foo = 1; }");
    let program = infer(&ast);

    let registry = &program.ctx.type_registry;
    assert!(registry.is_property_registered("foo"));
    assert!(!registry.is_property_registered("bar"));
}

fn first_of(ast: &Ast, token: Token) -> NodeId {
    let mut found = None;
    node_util::pre_order(ast, ast.root(), &mut |n| {
        if found.is_none() && ast.is(n, token) {
            found = Some(n);
        }
        found.is_none()
    });
    found.unwrap()
}

#[test]
fn testUnreachableInputIsNotTraversed() {
    let ast = parse("", "var x; x = 'a'; if (x) { x = 1; }");
    let root = ast.root();
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = TypedScopeCreator::new().createScope(&mut ctx, root, None);
    let cfa = ControlFlowAnalysis::<LinearFlowState, LatticeElementId>::analyze(&ast, root, false).unwrap();
    let interpreter = create_reverse_interpreter(CodingConventionKind::Closure);
    let mut inference = TypeInference::new(&mut ctx, cfa.cfg, &*interpreter, global);

    let assign = first_of(&ast, Token::Assign);
    let statement = ast.parent(assign).unwrap();
    let ifNode = first_of(&ast, Token::If);
    let bottom = inference.bottomScope;

    assert_eq!(inference.flow_through(Node::new(statement), bottom), bottom);
    assert_eq!(
        inference.branched_flow_through(Node::new(ifNode), bottom),
        vec![bottom, bottom]
    );
    assert_eq!(inference.ctx.type_registry.get_type(assign), None);

    let entry = inference.functionScope;
    assert_ne!(inference.flow_through(Node::new(statement), entry), entry);
    let c = inference.ctx.type_registry.common_types;
    assert_eq!(inference.ctx.type_registry.get_type(assign), Some(c.STRING_TYPE));
}
