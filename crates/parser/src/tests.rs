use super::*;
use ast::{Ast, JSDocFlags, Token as T, TypeExpr};
use pretty_assertions::assert_eq;

fn parse(src: &str) -> (Ast, NodeId) {
    let mut ast = Ast::new();
    let script = parse_script(&mut ast, "test.js", src).unwrap();
    (ast, script)
}

fn test_tree(src: &str, expected: &str) {
    let (ast, script) = parse(src);
    assert_eq!(ast.to_tree_string(script), expected);
}

fn first_statement(ast: &Ast, script: NodeId) -> NodeId {
    ast.first_child(script).unwrap()
}

fn parse_error(src: &str) -> SyntaxError {
    let mut ast = Ast::new();
    parse_script(&mut ast, "test.js", src).unwrap_err().kind
}

#[test]
fn testVarAndPrecedence() {
    test_tree(
        "var a = 1 + 2 * 3, b;",
        "\
Script
    Var
        Name a
            Add
                Number 1
                Mul
                    Number 2
                    Number 3
        Name b
",
    );
}

#[test]
fn testLeftAssociativity() {
    test_tree(
        "a - b - c;",
        "\
Script
    ExprResult
        Sub
            Sub
                Name a
                Name b
            Name c
",
    );
}

#[test]
fn testMemberCallAndNew() {
    test_tree(
        "new a.B(1).c(x)[0];",
        "\
Script
    ExprResult
        GetElem
            Call
                GetProp c
                    New
                        GetProp B
                            Name a
                        Number 1
                Name x
            Number 0
",
    );
}

#[test]
fn testFunctionDeclaration() {
    test_tree(
        "function f(a, b) { return a; }",
        "\
Script
    Function
        Name f
        ParamList
            Name a
            Name b
        Block
            Return
                Name a
",
    );
}

#[test]
fn testIfBodiesAreBlocks() {
    test_tree(
        "if (x) y(); else z();",
        "\
Script
    If
        Name x
        Block
            ExprResult
                Call
                    Name y
        Block
            ExprResult
                Call
                    Name z
",
    );
}

#[test]
fn testForLoops() {
    test_tree(
        "for (;;) {} for (var k in o) {} for (a.b in o) {}",
        "\
Script
    For
        Empty
        Empty
        Empty
        Block
    ForIn
        Var
            Name k
        Name o
        Block
    ForIn
        GetProp b
            Name a
        Name o
        Block
",
    );
}

#[test]
fn testTryCatchFinally() {
    test_tree(
        "try { a(); } catch (e) { b(); } finally { c(); }",
        "\
Script
    Try
        Block
            ExprResult
                Call
                    Name a
        Block
            Catch
                Name e
                Block
                    ExprResult
                        Call
                            Name b
        Block
            ExprResult
                Call
                    Name c
",
    );
}

#[test]
fn testSwitch() {
    test_tree(
        "switch (x) { case 1: a(); break; default: b(); }",
        "\
Script
    Switch
        Name x
        Case
            Number 1
            Block
                ExprResult
                    Call
                        Name a
                Break
        DefaultCase
            Block
                ExprResult
                    Call
                        Name b
",
    );
}

#[test]
fn testLabelsAndJumps() {
    test_tree(
        "out: while (true) { do { continue out; } while (x) }",
        "\
Script
    Label out
        While
            True
            Block
                Do
                    Block
                        Continue out
                    Name x
",
    );
}

#[test]
fn testObjectLiteral() {
    test_tree(
        "x = {a: 1, 'b': 2, 3: c, get d() { return 1; }, set d(v) {}};",
        "\
Script
    ExprResult
        Assign
            Name x
            ObjectLit
                StringKey a
                    Number 1
                StringKey b
                    Number 2
                StringKey 3
                    Name c
                GetterDef d
                    Function
                        Name
                        ParamList
                        Block
                            Return
                                Number 1
                SetterDef d
                    Function
                        Name
                        ParamList
                            Name v
                        Block
",
    );
    let (ast, script) = parse("x = {'b': 2};");
    let assign = ast.first_child(first_statement(&ast, script)).unwrap();
    let key = ast.first_child(ast.second_child(assign).unwrap()).unwrap();
    assert!(ast.is_quoted(key));
}

#[test]
fn testHookAndLogical() {
    test_tree(
        "a ? b || c && d : e;",
        "\
Script
    ExprResult
        Hook
            Name a
            Or
                Name b
                And
                    Name c
                    Name d
            Name e
",
    );
}

#[test]
fn testUnaryAndPostfix() {
    let (ast, script) = parse("x++; --y; !typeof z;");
    let statements = ast.children(script).to_vec();
    let postfix = ast.first_child(statements[0]).unwrap();
    assert_eq!(ast.token(postfix), T::Inc);
    assert!(ast[postfix].flags.contains(ast::NodeFlags::POSTFIX));
    let prefix = ast.first_child(statements[1]).unwrap();
    assert_eq!(ast.token(prefix), T::Dec);
    assert!(!ast[prefix].flags.contains(ast::NodeFlags::POSTFIX));
    let not = ast.first_child(statements[2]).unwrap();
    assert_eq!(ast.token(not), T::Not);
    assert_eq!(ast.token(ast.first_child(not).unwrap()), T::TypeOf);
}

#[test]
fn testAutomaticSemicolons() {
    let (ast, script) = parse("a = 1\nb = 2\nfunction f() { return\n1 }");
    assert_eq!(ast.child_count(script), 3);
    let function = ast.child_at(script, 2).unwrap();
    let body = ast.last_child(function).unwrap();
    let ret = ast.first_child(body).unwrap();
    assert_eq!(ast.token(ret), T::Return);
    assert!(!ast.has_children(ret));
}

#[test]
fn testRegexAndDivision() {
    let (ast, script) = parse("x = a / b; y = /ab+c/gi;");
    let first = ast.first_child(first_statement(&ast, script)).unwrap();
    assert_eq!(ast.token(ast.second_child(first).unwrap()), T::Div);
    let second = ast.first_child(ast.child_at(script, 1).unwrap()).unwrap();
    let regex = ast.second_child(second).unwrap();
    assert_eq!(ast.token(regex), T::Regexp);
    assert_eq!(&**ast.string(regex), "/ab+c/gi");
}

#[test]
fn testJSDocOnStatements() {
    let (ast, script) = parse(
        "/** @type {number} */ var x = 1;\n\
         /** @constructor */ function Foo() {}\n\
         /** @return {string} */ a.b = function() {};",
    );
    let statements = ast.children(script).to_vec();
    let var_info = ast.jsdoc(statements[0]).unwrap();
    assert_eq!(var_info.ty, Some(TypeExpr::named("number")));
    assert!(ast.jsdoc(statements[1]).unwrap().is_constructor());
    let assign = ast.first_child(statements[2]).unwrap();
    assert_eq!(ast.token(assign), T::Assign);
    assert_eq!(
        ast.jsdoc(assign).unwrap().return_type,
        Some(TypeExpr::named("string"))
    );
}

#[test]
fn testInlineJSDoc() {
    let (ast, script) = parse("var /** string */ s; function f(/** number */ n) {}");
    let var = first_statement(&ast, script);
    let name = ast.first_child(var).unwrap();
    assert_eq!(ast.jsdoc(name).unwrap().ty, Some(TypeExpr::named("string")));
    let function = ast.second_child(script).unwrap();
    let params = ast.second_child(function).unwrap();
    let param = ast.first_child(params).unwrap();
    assert_eq!(ast.jsdoc(param).unwrap().ty, Some(TypeExpr::named("number")));
}

#[test]
fn testCastAndFunctionExpressionJSDoc() {
    let (ast, script) = parse(
        "x = /** @type {Foo} */ (y);\nz = /** @return {number} */ function() {};",
    );
    let cast = ast.first_child(first_statement(&ast, script)).unwrap();
    let y = ast.second_child(cast).unwrap();
    assert_eq!(ast.jsdoc(y).unwrap().ty, Some(TypeExpr::named("Foo")));
    let assign = ast.first_child(ast.second_child(script).unwrap()).unwrap();
    let function = ast.second_child(assign).unwrap();
    assert!(ast.jsdoc(assign).is_none());
    assert_eq!(
        ast.jsdoc(function).unwrap().return_type,
        Some(TypeExpr::named("number"))
    );
}

#[test]
fn testJSDocTags() {
    let info = parse_jsdoc(
        "\n * Does a thing.\n * @param {?string} a\n * @param {function(this:Foo, number=): !Bar} b\n * @template T, U\n * @enum\n * @deprecated\n ",
    );
    assert_eq!(
        info.get_parameter_type("a"),
        Some(&TypeExpr::Nullable(Box::new(TypeExpr::named("string"))))
    );
    match info.get_parameter_type("b") {
        Some(TypeExpr::Function(function)) => {
            assert_eq!(function.this_type.as_deref(), Some(&TypeExpr::named("Foo")));
            assert_eq!(
                function.params,
                vec![TypeExpr::Optional(Box::new(TypeExpr::named("number")))]
            );
            assert_eq!(
                function.return_type.as_deref(),
                Some(&TypeExpr::NonNull(Box::new(TypeExpr::named("Bar"))))
            );
        }
        other => panic!("unexpected parameter type {:?}", other),
    }
    assert_eq!(
        info.template_type_names,
        vec![JsWord::from("T"), JsWord::from("U")]
    );
    assert_eq!(info.enum_parameter_type, Some(TypeExpr::named("number")));
    assert!(info.flags.contains(JSDocFlags::DEPRECATED));
}

#[test]
fn testTypeExpressions() {
    let info = parse_jsdoc("@type {Array.<string>|{a: number, b}|*|?}");
    assert_eq!(
        info.ty,
        Some(TypeExpr::Union(vec![
            TypeExpr::Named {
                name: JsWord::from("Array"),
                args: vec![TypeExpr::named("string")],
            },
            TypeExpr::Record(vec![
                (JsWord::from("a"), TypeExpr::named("number")),
                (JsWord::from("b"), TypeExpr::Unknown),
            ]),
            TypeExpr::All,
            TypeExpr::Unknown,
        ]))
    );
    let info = parse_jsdoc("@type {undefined}");
    assert_eq!(info.ty, Some(TypeExpr::Void));
}

#[test]
fn testMalformedTypedef() {
    let info = parse_jsdoc("@typedef {(string|}");
    assert!(info.has_typedef_type());
    assert_eq!(info.typedef_type, None);
}

#[test]
fn testExternsFlag() {
    let mut ast = Ast::new();
    let script = parse_externs(&mut ast, "externs.js", "var x; function f(a) {}").unwrap();
    let mut all_from_externs = true;
    ast::node_util::pre_order(&ast, script, &mut |n| {
        all_from_externs &= ast.is_from_externs(n);
        true
    });
    assert!(all_from_externs);
}

#[test]
fn testSyntaxErrors() {
    assert!(matches!(parse_error("var = 1;"), SyntaxError::Expected { .. }));
    assert!(matches!(parse_error("1 = 2;"), SyntaxError::InvalidAssignTarget));
    assert!(matches!(parse_error("return 1;"), SyntaxError::ReturnOutsideFunction(_)));
    assert!(matches!(parse_error("var class;"), SyntaxError::ReservedWord(_)));
    assert!(matches!(parse_error("'abc"), SyntaxError::UnterminatedStr));
    assert!(matches!(parse_error("a b"), SyntaxError::Expected { .. }));
}

#[test]
fn testErrorDisplay() {
    let mut ast = Ast::new();
    let error = parse_script(&mut ast, "foo.js", "\n  1 = 2;").unwrap_err();
    assert_eq!(error.to_string(), "foo.js:2:4: invalid assignment target");
}
