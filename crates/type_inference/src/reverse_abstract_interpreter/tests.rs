use super::*;
use crate::options::InferenceOptions;
use crate::type_inference_pass::{infer_types, TypedProgram};
use ast::Ast;
use pretty_assertions::assert_eq;

/// Declares `x: (null|number|string|undefined)`, `foo: (Foo|null)`,
/// `bar: (Bar|string)` and `u: ?` around `body`.
fn parse(body: &str) -> Ast {
    let src = format!(
        "
        /** @constructor */ function Foo() {{}}
        /** @constructor @extends {{Foo}} */ function Bar() {{}}
        /**
         * @param {{(string|number|null|undefined)}} x
         * @param {{?Foo}} foo
         * @param {{(!Bar|string)}} bar
         * @param {{?}} u
         */
        function f(x, foo, bar, u) {{ {} }}",
        body
    );
    let mut ast = Ast::new();
    parser::parse_script(&mut ast, "test.js", &src).unwrap();
    ast
}

/// The expression statements of `f`, in order.
fn conditions(ast: &Ast) -> Vec<NodeId> {
    let mut function = None;
    node_util::pre_order(ast, ast.root(), &mut |n| {
        if ast.is(n, Token::Function)
            && node_util::function_name(ast, n).map_or(false, |name| &**ast.string(name) == "f")
        {
            function = Some(n);
        }
        true
    });
    let body = ast.last_child(function.unwrap()).unwrap();
    ast.children(body)
        .iter()
        .filter_map(|&statement| ast.first_child(statement))
        .collect()
}

fn narrowed_with(
    kind: CodingConventionKind,
    program: &mut TypedProgram,
    condition: NodeId,
    outcome: bool,
    name: &str,
) -> String {
    let ast = program.ctx.ast;
    let function = ast
        .ancestors(condition)
        .find(|&ancestor| ast.is(ancestor, Token::Function))
        .unwrap();
    let scope = program.scope_for(function).unwrap();
    let interpreter = create_reverse_interpreter(kind);
    let blindScope = LinkedFlowScope::createEntryLattice(scope);
    let scope =
        interpreter.getPreciserScopeKnowingConditionOutcome(&mut program.ctx, condition, blindScope, outcome);
    let ctx = &program.ctx;
    match scope.getSlot(ctx, name).and_then(|slot| slot.getType(ctx)) {
        Some(ty) => ctx.type_registry.type_to_string(ty),
        None => "<none>".to_string(),
    }
}

/// The type of `name` on the branch where `condition` gave `outcome`.
fn narrowed(program: &mut TypedProgram, condition: NodeId, outcome: bool, name: &str) -> String {
    narrowed_with(CodingConventionKind::Closure, program, condition, outcome, name)
}

#[test]
fn testTypeOf() {
    let ast = parse(
        "typeof x == 'string';
         typeof x != 'number';
         typeof x == 'object';
         'undefined' == typeof x;
         typeof u == 'number';",
    );
    let mut program = infer_types(&ast, InferenceOptions::default()).unwrap();
    let c = conditions(&ast);

    assert_eq!(narrowed(&mut program, c[0], true, "x"), "string");
    assert_eq!(narrowed(&mut program, c[0], false, "x"), "(null|number|undefined)");
    assert_eq!(narrowed(&mut program, c[1], true, "x"), "(null|string|undefined)");
    assert_eq!(narrowed(&mut program, c[1], false, "x"), "number");
    assert_eq!(narrowed(&mut program, c[2], true, "x"), "null");
    assert_eq!(narrowed(&mut program, c[2], false, "x"), "(number|string|undefined)");
    assert_eq!(narrowed(&mut program, c[3], true, "x"), "undefined");
    assert_eq!(narrowed(&mut program, c[3], false, "x"), "(null|number|string)");
    // Nothing is learned about an unknown value that failed a test.
    assert_eq!(narrowed(&mut program, c[4], true, "u"), "number");
    assert_eq!(narrowed(&mut program, c[4], false, "u"), "?");
}

#[test]
fn testNullAndUndefinedComparisons() {
    let ast = parse(
        "x == null;
         x === null;
         x !== undefined;
         null != x;",
    );
    let mut program = infer_types(&ast, InferenceOptions::default()).unwrap();
    let c = conditions(&ast);

    // Loose equality with null also matches undefined.
    assert_eq!(narrowed(&mut program, c[0], true, "x"), "(null|undefined)");
    assert_eq!(narrowed(&mut program, c[0], false, "x"), "(number|string)");
    assert_eq!(narrowed(&mut program, c[1], true, "x"), "null");
    assert_eq!(narrowed(&mut program, c[1], false, "x"), "(number|string|undefined)");
    assert_eq!(narrowed(&mut program, c[2], true, "x"), "(null|number|string)");
    assert_eq!(narrowed(&mut program, c[2], false, "x"), "undefined");
    assert_eq!(narrowed(&mut program, c[3], true, "x"), "(number|string)");
    assert_eq!(narrowed(&mut program, c[3], false, "x"), "(null|undefined)");
}

#[test]
fn testInstanceOf() {
    let ast = parse(
        "foo instanceof Bar;
         bar instanceof Foo;
         u instanceof Foo;",
    );
    let mut program = infer_types(&ast, InferenceOptions::default()).unwrap();
    let c = conditions(&ast);

    // A supertype may hold an instance of the subtype.
    assert_eq!(narrowed(&mut program, c[0], true, "foo"), "Bar");
    assert_eq!(narrowed(&mut program, c[0], false, "foo"), "(Foo|null)");
    assert_eq!(narrowed(&mut program, c[1], true, "bar"), "Bar");
    assert_eq!(narrowed(&mut program, c[1], false, "bar"), "string");
    assert_eq!(narrowed(&mut program, c[2], true, "u"), "Foo");
    assert_eq!(narrowed(&mut program, c[2], false, "u"), "?");
}

#[test]
fn testClosurePredicates() {
    let ast = parse(
        "goog.isString(x);
         goog.isDef(x);
         !goog.isNull(x);
         !goog.isDefAndNotNull(x);
         goog.isObject(foo);
         goog.isArray(u);",
    );
    let mut program = infer_types(&ast, InferenceOptions::default()).unwrap();
    let c = conditions(&ast);

    assert_eq!(narrowed(&mut program, c[0], true, "x"), "string");
    assert_eq!(narrowed(&mut program, c[0], false, "x"), "(null|number|undefined)");
    assert_eq!(narrowed(&mut program, c[1], true, "x"), "(null|number|string)");
    assert_eq!(narrowed(&mut program, c[1], false, "x"), "undefined");
    assert_eq!(narrowed(&mut program, c[2], true, "x"), "(number|string|undefined)");
    assert_eq!(narrowed(&mut program, c[2], false, "x"), "null");
    assert_eq!(narrowed(&mut program, c[3], true, "x"), "(null|undefined)");
    assert_eq!(narrowed(&mut program, c[3], false, "x"), "(number|string)");
    assert_eq!(narrowed(&mut program, c[4], true, "foo"), "Foo");
    assert_eq!(narrowed(&mut program, c[4], false, "foo"), "null");
    assert_eq!(narrowed(&mut program, c[5], true, "u"), "Array");
    assert_eq!(narrowed(&mut program, c[5], false, "u"), "?");
}

#[test]
fn testPredicatesNeedTheClosureConvention() {
    let ast = parse("goog.isString(x);");
    let mut program = infer_types(&ast, InferenceOptions::default()).unwrap();
    let c = conditions(&ast);

    let ty = narrowed_with(CodingConventionKind::Default, &mut program, c[0], true, "x");
    assert_eq!(ty, "(null|number|string|undefined)");
}

#[test]
fn testShortCircuitingConditions() {
    let ast = parse(
        "x == null || typeof x == 'string';
         x != null && typeof x == 'number';
         goog.isString(x) || goog.isNumber(x);",
    );
    let mut program = infer_types(&ast, InferenceOptions::default()).unwrap();
    let c = conditions(&ast);

    // Either operand may have decided a true `||`.
    assert_eq!(narrowed(&mut program, c[0], true, "x"), "(null|string|undefined)");
    assert_eq!(narrowed(&mut program, c[0], false, "x"), "number");
    assert_eq!(narrowed(&mut program, c[1], true, "x"), "number");
    assert_eq!(narrowed(&mut program, c[1], false, "x"), "(null|string|undefined)");
    // Operands are narrowed by the whole chain of interpreters.
    assert_eq!(narrowed(&mut program, c[2], true, "x"), "(number|string)");
    assert_eq!(narrowed(&mut program, c[2], false, "x"), "(null|undefined)");
}
