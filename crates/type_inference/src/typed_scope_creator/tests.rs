use super::*;
use crate::options::InferenceOptions;
use ast::Ast;
use pretty_assertions::assert_eq;

fn parse(externs: &str, src: &str) -> Ast {
    let mut ast = Ast::new();
    parser::parse_externs(&mut ast, "externs.js", externs).unwrap();
    parser::parse_script(&mut ast, "test.js", src).unwrap();
    ast
}

fn create_global_scope(ctx: &mut Ctx) -> ScopeId {
    let root = ctx.ast.root();
    TypedScopeCreator::new().createScope(ctx, root, None)
}

fn function_named(ast: &Ast, name: &str) -> NodeId {
    let mut found = None;
    node_util::pre_order(ast, ast.root(), &mut |n| {
        if found.is_none() && ast.is(n, Token::Function) {
            let lvalue = node_util::get_best_lvalue(ast, n);
            if node_util::get_best_lvalue_name(ast, lvalue).as_deref() == Some(name) {
                found = Some(n);
            }
        }
        found.is_none()
    });
    found.unwrap()
}

fn var_type(ctx: &Ctx, scope: ScopeId, name: &str) -> String {
    let ty = ctx.getVarType(scope, name).unwrap();
    ctx.type_registry.type_to_string(ty)
}

fn diagnostic_keys(ctx: &Ctx) -> Vec<&'static str> {
    ctx.diagnostics.errors().iter().map(|e| e.kind.key).collect()
}

#[test]
fn testNativeConstructorsAreDeclared() {
    let ast = parse("", "");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let c = ctx.type_registry.common_types;
    assert_eq!(ctx.getVarType(global, "Array"), Some(c.ARRAY_FUNCTION_TYPE));
    assert_eq!(ctx.getVarType(global, "Object.prototype"), Some(c.OBJECT_PROTOTYPE));
    assert_eq!(ctx.getVarType(global, "undefined"), Some(c.VOID_TYPE));
    assert_eq!(ctx.getTypeOfThis(global), c.GLOBAL_THIS);
    assert_eq!(ctx.type_registry.get_type(ast.root()), Some(c.GLOBAL_THIS));
}

#[test]
fn testScopesAreMemoized() {
    let ast = parse("", "function f() { var x; }");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let mut creator = TypedScopeCreator::new();
    let global = creator.createScope(&mut ctx, ast.root(), None);
    let f = function_named(&ast, "f");
    let local = creator.createScope(&mut ctx, f, Some(global));

    assert_eq!(creator.createScope(&mut ctx, ast.root(), None), global);
    assert_eq!(creator.createScope(&mut ctx, f, Some(global)), local);
    assert_eq!(ctx.scopes[local].get_parent(), Some(global));
}

#[test]
fn testDeclaredAndInferredVars() {
    let ast = parse("", "/** @type {number} */ var x = 1; var y = 'a';");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let x = ctx.getVar(global, "x").unwrap();
    assert_eq!(var_type(&ctx, global, "x"), "number");
    assert!(!ctx.vars[x].isTypeInferred());

    let y = ctx.getVar(global, "y").unwrap();
    assert_eq!(ctx.vars[y].getType(), None);
    assert!(ctx.vars[y].isTypeInferred());
}

#[test]
fn testExternNamesWithoutTypeAreUnknown() {
    let ast = parse("var ext;", "");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let ext = ctx.getVar(global, "ext").unwrap();
    assert_eq!(var_type(&ctx, global, "ext"), "?");
    assert!(!ctx.vars[ext].isTypeInferred());
}

#[test]
fn testFunctionDeclaration() {
    let src = "/** @param {number} a @return {string} */ function f(a) { return ''; }";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert_eq!(var_type(&ctx, global, "f"), "function (number): string");
    let f = function_named(&ast, "f");
    assert_eq!(ctx.type_registry.get_type(f), ctx.getVarType(global, "f"));
}

#[test]
fn testHoistedFunctionIsDeclaredBeforeUse() {
    let src = "var g = f; /** @return {number} */ function f() { return 1; }";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert_eq!(var_type(&ctx, global, "f"), "function (): number");
}

#[test]
fn testForwardReferenceIsResolved() {
    let src = "/** @type {!Foo} */ var x; /** @constructor */ var Foo = function() {};";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let foo = ctx.getVarType(global, "Foo").unwrap();
    let instance = ctx.type_registry.instance_of_constructor(foo);
    assert_eq!(ctx.getVarType(global, "x"), instance);
    assert_eq!(var_type(&ctx, global, "x"), "Foo");
}

#[test]
fn testConstructorDeclaresPrototype() {
    let src = "/** @constructor */ function Foo() {}\n\
               Foo.prototype.bar = function() { return 1; };";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let foo = ctx.getVarType(global, "Foo").unwrap();
    let prototype = ctx.type_registry.prototype_of_constructor(foo);
    assert_eq!(ctx.getVarType(global, "Foo.prototype"), prototype);
    assert!(ctx.type_registry.has_own_property(prototype.unwrap(), "bar"));

    let bar = ctx.getVar(global, "Foo.prototype.bar").unwrap();
    assert!(!ctx.vars[bar].isTypeInferred());
    assert_eq!(var_type(&ctx, global, "Foo.prototype.bar"), "function (this:Foo): ?");
}

#[test]
fn testPrototypeObjectLiteralIsMerged() {
    let src = "/** @constructor */ function Foo() {}\n\
               Foo.prototype = { /** @return {number} */ bar: function() { return 1; } };";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let foo = ctx.getVarType(global, "Foo").unwrap();
    let prototype = ctx.type_registry.prototype_of_constructor(foo).unwrap();
    assert_eq!(ctx.getVarType(global, "Foo.prototype"), Some(prototype));
    let bar = ctx.type_registry.find_property_type(prototype, "bar").unwrap();
    assert_eq!(
        ctx.type_registry.type_to_string(bar),
        "function (this:Foo): number"
    );
}

#[test]
fn testFunctionLiteralAssignedToQualifiedName() {
    let src = "var ns = {}; /** @param {string} s */ ns.f = function(s) {};";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert_eq!(var_type(&ctx, global, "ns.f"), "function (string): undefined");
    let f = function_named(&ast, "ns.f");
    assert_eq!(ctx.type_registry.get_type(f), ctx.getVarType(global, "ns.f"));
}

#[test]
fn testFunctionAssignedInControlStructureIsInferred() {
    let src = "var ns = {}; if (ns) { ns.f = function() {}; }";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert_eq!(ctx.getVar(global, "ns.f"), None);
}

#[test]
fn testEnum() {
    let src = "/** @enum {string} */ var E = {A: 'a', B: 'b'};";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let e = ctx.getVarType(global, "E").unwrap();
    assert!(ctx.type_registry.is_enum_type(e));
    assert_eq!(var_type(&ctx, global, "E.A"), "E");
    assert!(ctx.type_registry.is_non_nullable_name("E"));
    assert_eq!(ctx.type_registry.get_type_by_name("E"), ctx.getVarType(global, "E.B"));
    assert!(diagnostic_keys(&ctx).is_empty());
}

#[test]
fn testEnumKeyMustBeConstant() {
    let ast = parse("", "/** @enum */ var E = {lower: 1};");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_ENUM_NOT_CONSTANT"]);
    assert_eq!(
        ctx.diagnostics.errors()[0].description,
        "enum key lower must be a syntactic constant"
    );
}

#[test]
fn testEnumInitializer() {
    let ast = parse("", "/** @enum */ var E;");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_ENUM_INITIALIZER_NOT_ENUM"]);
}

#[test]
fn testEnumAlias() {
    let src = "/** @enum */ var E = {A: 1}; /** @enum */ var F = E;";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert_eq!(ctx.getVarType(global, "F"), ctx.getVarType(global, "E"));
    assert!(diagnostic_keys(&ctx).is_empty());
}

#[test]
fn testTypedef() {
    let src = "/** @typedef {number|string} */ var T; /** @type {T} */ var x;";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert_eq!(var_type(&ctx, global, "x"), "(number|string)");
    assert!(ctx.type_registry.is_non_nullable_name("T"));
}

#[test]
fn testQualifiedTypedefIsDeclaredWithoutValue() {
    let src = "var ns = {}; /** @typedef {string} */ ns.T; /** @type {ns.T} */ var x;";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert_eq!(var_type(&ctx, global, "x"), "string");
    assert_eq!(var_type(&ctx, global, "ns.T"), "None");
}

#[test]
fn testMalformedTypedef() {
    let ast = parse("", "/** @typedef */ var T;");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_MALFORMED_TYPEDEF"]);
    assert_eq!(
        ctx.diagnostics.errors()[0].description,
        "Typedef for T does not have any type information"
    );
}

#[test]
fn testMultipleVarDef() {
    let ast = parse("", "/** @type {number} */ var a = 1, b = 2;");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_MULTIPLE_VAR_DEF"]);
}

#[test]
fn testConstructorInitializer() {
    let ast = parse("", "/** @constructor */ var Foo;");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_CTOR_INITIALIZER_NOT_CTOR"]);
    assert_eq!(
        ctx.diagnostics.errors()[0].description,
        "Constructor Foo must be initialized at declaration"
    );
}

#[test]
fn testInterfaceInitializer() {
    let ast = parse("", "/** @interface */ var Foo;");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_IFACE_INITIALIZER_NOT_IFACE"]);
}

#[test]
fn testExternConstructorNeedsNoInitializer() {
    let ast = parse("/** @constructor */ var Foo;", "");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert!(diagnostic_keys(&ctx).is_empty());
    let foo = ctx.getVarType(global, "Foo").unwrap();
    assert!(ctx.type_registry.is_constructor(foo));
}

#[test]
fn testDupVarDeclaration() {
    let src = "/** @type {number} */ var x = 1; /** @type {string} */ var x = 'a';";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_DUP_VAR_DECLARATION"]);
    assert!(ctx.diagnostics.errors()[0]
        .description
        .starts_with("variable x redefined with type string, original definition at test.js:"));
    // The first declaration wins.
    assert_eq!(var_type(&ctx, global, "x"), "number");
}

#[test]
fn testEquivalentRedeclarationIsAllowed() {
    let src = "/** @type {number} */ var x = 1; /** @type {number} */ var x = 2;";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert!(diagnostic_keys(&ctx).is_empty());
}

#[test]
fn testNativeRedeclarationKeepsNativeType() {
    let ast = parse("/** @constructor */ function Array() {}", "");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let c = ctx.type_registry.common_types;
    let array = ctx.getVar(global, "Array").unwrap();
    assert_eq!(ctx.vars[array].getType(), Some(c.ARRAY_FUNCTION_TYPE));
    assert!(ctx.vars[array].getNameNode().is_some());
    assert!(diagnostic_keys(&ctx).is_empty());
}

#[test]
fn testUnknownLends() {
    let ast = parse("", "f(/** @lends {missing} */ ({a: 1}));");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_UNKNOWN_LENDS"]);
}

#[test]
fn testLendsOnNonObject() {
    let src = "/** @type {number} */ var n = 3; f(/** @lends {n} */ ({a: 1}));";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_LENDS_ON_NON_OBJECT"]);
    assert_eq!(
        ctx.diagnostics.errors()[0].description,
        "May only lend properties to object types. n has type number."
    );
}

#[test]
fn testLendsAddsProperties() {
    let src = "/** @constructor */ function Foo() {}\n\
               f(/** @lends {Foo.prototype} */ ({ /** @type {number} */ x: 1 }));";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let prototype = ctx.getVarType(global, "Foo.prototype").unwrap();
    let x = ctx.type_registry.find_property_type(prototype, "x").unwrap();
    assert_eq!(x, ctx.type_registry.common_types.NUMBER_TYPE);
}

#[test]
fn testConstTakesLiteralType() {
    let src = "/** @const */ var s = 'a'; /** @const */ var goog = goog || {};";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let s = ctx.getVar(global, "s").unwrap();
    assert_eq!(var_type(&ctx, global, "s"), "string");
    assert!(!ctx.vars[s].isTypeInferred());

    let goog = ctx.getVarType(global, "goog").unwrap();
    assert!(ctx.type_registry.is_anonymous_object_type(goog));
}

#[test]
fn testStubDeclaration() {
    let src = "/** @constructor */ function Foo() {} Foo.prototype.bar;";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let bar = ctx.getVar(global, "Foo.prototype.bar").unwrap();
    assert!(ctx.vars[bar].isTypeInferred());
    assert_eq!(var_type(&ctx, global, "Foo.prototype.bar"), "?");

    let prototype = ctx.getVarType(global, "Foo.prototype").unwrap();
    assert!(ctx.type_registry.has_own_property(prototype, "bar"));
    assert!(ctx.type_registry.is_property_type_inferred(prototype, "bar"));
}

#[test]
fn testThisPropertiesAreCollected() {
    let src = "/** @constructor */ function Foo() { /** @type {number} */ this.x = 1; }";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let foo = ctx.getVarType(global, "Foo").unwrap();
    let instance = ctx.type_registry.instance_of_constructor(foo).unwrap();
    assert_eq!(
        ctx.type_registry.find_property_type(instance, "x"),
        Some(ctx.type_registry.common_types.NUMBER_TYPE)
    );
}

#[test]
fn testSubclassByCall() {
    let src = "/** @constructor */ function A() {}\n\
               /** @constructor */ function B() {}\n\
               goog.inherits(B, A);";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let global = create_global_scope(&mut ctx);

    let registry = &ctx.type_registry;
    let a = registry.instance_of_constructor(ctx.getVarType(global, "A").unwrap()).unwrap();
    let b = registry.instance_of_constructor(ctx.getVarType(global, "B").unwrap()).unwrap();
    assert!(registry.is_subtype(b, a));
    assert!(!registry.is_subtype(a, b));
}

#[test]
fn testConstructorExpected() {
    let ast = parse("", "goog.reflect.object(Missing, {a: 1});");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    create_global_scope(&mut ctx);

    assert_eq!(diagnostic_keys(&ctx), vec!["JSC_REFLECT_CONSTRUCTOR_EXPECTED"]);
}

#[test]
fn testParametersAreDeclared() {
    let src = "/** @param {number} a */ function f(a, b) {}";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let mut creator = TypedScopeCreator::new();
    let global = creator.createScope(&mut ctx, ast.root(), None);
    let f = function_named(&ast, "f");
    let local = creator.createScope(&mut ctx, f, Some(global));

    let a = ctx.scopes[local].getOwnSlot("a").unwrap();
    assert_eq!(var_type(&ctx, local, "a"), "number");
    assert!(!ctx.vars[a].isTypeInferred());
    assert_eq!(var_type(&ctx, local, "b"), "?");
    // A function declaration does not bleed into its own scope.
    assert!(!ctx.scopes[local].hasOwnSlot("f"));
}

#[test]
fn testBleedingFunctionName() {
    let ast = parse("", "var g = function f() {};");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let mut creator = TypedScopeCreator::new();
    let global = creator.createScope(&mut ctx, ast.root(), None);
    let g = function_named(&ast, "g");
    let local = creator.createScope(&mut ctx, g, Some(global));

    assert!(ctx.scopes[local].hasOwnSlot("f"));
    assert_eq!(ctx.getVarType(local, "f"), ctx.getVarType(global, "g"));
}

#[test]
fn testLocalScopeTypeOfThis() {
    let src = "/** @constructor */ function Foo() {} function f() {}";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let mut creator = TypedScopeCreator::new();
    let global = creator.createScope(&mut ctx, ast.root(), None);
    let foo = creator.createScope(&mut ctx, function_named(&ast, "Foo"), Some(global));
    let f = creator.createScope(&mut ctx, function_named(&ast, "f"), Some(global));

    assert_eq!(ctx.type_registry.type_to_string(ctx.getTypeOfThis(foo)), "Foo");
    assert_eq!(ctx.getTypeOfThis(f), ctx.type_registry.common_types.UNKNOWN_TYPE);
}

#[test]
fn testEscapedAndAssignedOnceVars() {
    let src = "function f() { var x = 1; var z = 2; var y; y = 2; function g() { x = 3; } }";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let mut creator = TypedScopeCreator::new();
    let global = creator.createScope(&mut ctx, ast.root(), None);
    let local = creator.createScope(&mut ctx, function_named(&ast, "f"), Some(global));

    let x = ctx.scopes[local].getOwnSlot("x").unwrap();
    let y = ctx.scopes[local].getOwnSlot("y").unwrap();
    let z = ctx.scopes[local].getOwnSlot("z").unwrap();
    assert!(ctx.vars[x].isMarkedEscaped());
    assert!(!ctx.vars[x].isMarkedAssignedExactlyOnce());
    assert!(!ctx.vars[y].isMarkedEscaped());
    assert!(!ctx.vars[y].isMarkedAssignedExactlyOnce());
    assert!(!ctx.vars[z].isMarkedEscaped());
    assert!(ctx.vars[z].isMarkedAssignedExactlyOnce());
}

#[test]
fn testLocalQualifiedNameIsDeclaredGlobally() {
    let src = "var ns = {}; function f() { /** @type {number} */ ns.x = 1; }";
    let ast = parse("", src);
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let mut creator = TypedScopeCreator::new();
    let global = creator.createScope(&mut ctx, ast.root(), None);
    let local = creator.createScope(&mut ctx, function_named(&ast, "f"), Some(global));

    assert!(ctx.scopes[global].hasOwnSlot("ns.x"));
    assert!(!ctx.scopes[local].hasOwnSlot("ns.x"));
    assert_eq!(var_type(&ctx, global, "ns.x"), "number");
}

#[test]
fn testCatchNameIsDeclaredInFunctionScope() {
    let ast = parse("", "function f() { try {} catch (e) {} }");
    let mut ctx = Ctx::new(&ast, InferenceOptions::default());
    let mut creator = TypedScopeCreator::new();
    let global = creator.createScope(&mut ctx, ast.root(), None);
    let local = creator.createScope(&mut ctx, function_named(&ast, "f"), Some(global));

    let e = ctx.scopes[local].getOwnSlot("e").unwrap();
    assert!(ctx.vars[e].isTypeInferred());
}
