use super::*;
use ast::{JsWord, TypeExpr};
use pretty_assertions::assert_eq;

fn word(s: &str) -> JsWord {
    JsWord::from(s)
}

fn constructor(registry: &mut TypeRegistry, name: &str) -> (TypeId, TypeId) {
    let ctor = registry.create_constructor_type(
        &word(name),
        None,
        Vec::new(),
        Vec::new(),
        FunctionKind::CONSTRUCTOR,
    );
    let instance = registry.instance_of_constructor(ctor).unwrap();
    registry.declare_type(&word(name), instance);
    (ctor, instance)
}

#[test]
fn testUnionFlattensAndDedupes() {
    let mut registry = TypeRegistry::new();
    let c = &registry.common_types;
    let (number, string, null) = (c.NUMBER_TYPE, c.STRING_TYPE, c.NULL_TYPE);
    let number_string = c.NUMBER_STRING;

    let union = registry.create_union(&[number_string, null, number]);
    assert_eq!(registry.type_to_string(union), "(null|number|string)");
    assert_eq!(registry.create_union(&[string, number]), number_string);
    assert_eq!(registry.create_union(&[number]), number);
    assert_eq!(registry.create_union(&[]), registry.common_types.NO_TYPE);
}

#[test]
fn testUnionWithUnknownOrAllCollapses() {
    let mut registry = TypeRegistry::new();
    let c = &registry.common_types;
    let (number, unknown, checked, all) = (
        c.NUMBER_TYPE,
        c.UNKNOWN_TYPE,
        c.CHECKED_UNKNOWN_TYPE,
        c.ALL_TYPE,
    );
    assert_eq!(registry.create_union(&[number, unknown]), unknown);
    assert_eq!(registry.create_union(&[unknown, checked]), checked);
    assert_eq!(registry.create_union(&[number, all, unknown]), all);
}

#[test]
fn testUnionAbsorbsSubtypes() {
    let mut registry = TypeRegistry::new();
    let (_, foo) = constructor(&mut registry, "Foo");
    let object = registry.common_types.OBJECT_TYPE;
    assert_eq!(registry.create_union(&[foo, object]), object);
    assert_eq!(registry.create_union(&[object, foo]), object);
}

#[test]
fn testInstanceSubtyping() {
    let mut registry = TypeRegistry::new();
    let (_, foo) = constructor(&mut registry, "Foo");
    let (bar_ctor, bar) = constructor(&mut registry, "Bar");
    registry.set_prototype_based_on(bar_ctor, foo);

    let object = registry.common_types.OBJECT_TYPE;
    assert!(registry.is_subtype(bar, foo));
    assert!(!registry.is_subtype(foo, bar));
    assert!(registry.is_subtype(foo, object));
    assert!(!registry.is_subtype(registry.common_types.NUMBER_TYPE, object));
    assert!(registry.is_subtype(bar, registry.common_types.UNKNOWN_TYPE));
}

#[test]
fn testRestrictByNotNullOrUndefined() {
    let mut registry = TypeRegistry::new();
    let c = &registry.common_types;
    let (null, void, string) = (c.NULL_TYPE, c.VOID_TYPE, c.STRING_TYPE);
    let nullable = registry.create_union(&[null, void, string]);
    assert_eq!(registry.restrict_by_not_null_or_undefined(nullable), string);
    assert_eq!(
        registry.restrict_by_not_null_or_undefined(null),
        registry.common_types.NO_TYPE
    );
}

#[test]
fn testBooleanOutcomes() {
    let mut registry = TypeRegistry::new();
    let c = &registry.common_types;
    let (null, number, object, unknown) = (c.NULL_TYPE, c.NUMBER_TYPE, c.OBJECT_TYPE, c.UNKNOWN_TYPE);
    assert_eq!(
        registry.get_possible_to_boolean_outcomes(null),
        BooleanLiteralSet::FALSE
    );
    assert_eq!(
        registry.get_possible_to_boolean_outcomes(object),
        BooleanLiteralSet::TRUE
    );
    assert_eq!(
        registry.get_possible_to_boolean_outcomes(number),
        BooleanLiteralSet::BOTH
    );
    assert_eq!(
        registry.get_possible_to_boolean_outcomes(unknown),
        BooleanLiteralSet::BOTH
    );

    let nullable_object = registry.create_union(&[null, object]);
    assert_eq!(
        registry.get_restricted_type_given_to_boolean_outcome(nullable_object, true),
        object
    );
    assert_eq!(
        registry.get_restricted_type_given_to_boolean_outcome(nullable_object, false),
        null
    );
}

#[test]
fn testGreatestSubtype() {
    let mut registry = TypeRegistry::new();
    let c = &registry.common_types;
    let (number, string, null, number_string) =
        (c.NUMBER_TYPE, c.STRING_TYPE, c.NULL_TYPE, c.NUMBER_STRING);
    assert_eq!(registry.get_greatest_subtype(number_string, string), string);
    assert_eq!(
        registry.get_greatest_subtype(number, null),
        registry.common_types.NO_TYPE
    );
}

#[test]
fn testInferredPropertiesJoin() {
    let mut registry = TypeRegistry::new();
    let object = registry.create_anonymous_object_type();
    let c = &registry.common_types;
    let (number, string) = (c.NUMBER_TYPE, c.STRING_TYPE);

    assert!(registry.define_inferred_property(object, &word("x"), number, None));
    assert!(registry.define_inferred_property(object, &word("x"), string, None));
    let x = registry.get_property_type(object, "x");
    assert_eq!(registry.type_to_string(x), "(number|string)");
    assert!(registry.is_property_type_inferred(object, "x"));
}

#[test]
fn testDeclaredPropertiesAreNotRedefined() {
    let mut registry = TypeRegistry::new();
    let (_, foo) = constructor(&mut registry, "Foo");
    let c = &registry.common_types;
    let (number, string) = (c.NUMBER_TYPE, c.STRING_TYPE);

    assert!(registry.define_declared_property(foo, &word("x"), number, None));
    assert!(!registry.define_declared_property(foo, &word("x"), string, None));
    registry.define_inferred_property(foo, &word("x"), string, None);
    assert_eq!(registry.get_property_type(foo, "x"), number);
}

#[test]
fn testPrototypePropertiesAreInherited() {
    let mut registry = TypeRegistry::new();
    let (ctor, foo) = constructor(&mut registry, "Foo");
    let prototype = registry.prototype_of_constructor(ctor).unwrap();
    let number = registry.common_types.NUMBER_TYPE;
    registry.define_declared_property(prototype, &word("bar"), number, None);

    assert!(registry.has_property(foo, "bar"));
    assert!(!registry.has_own_property(foo, "bar"));
    assert_eq!(registry.find_property_type(foo, "bar"), Some(number));
    assert_eq!(registry.get_property_type(ctor, "prototype"), prototype);
}

#[test]
fn testPrimitivePropertiesAreAutoboxed() {
    let mut registry = TypeRegistry::new();
    let c = &registry.common_types;
    let (string, number) = (c.STRING_TYPE, c.NUMBER_TYPE);
    assert_eq!(registry.find_property_type(string, "length"), Some(number));
}

#[test]
fn testTemplatizedPropertyTypes() {
    let mut registry = TypeRegistry::new();
    let c = &registry.common_types;
    let (array, t, string) = (c.ARRAY_TYPE, c.ARRAY_ELEMENT_TEMPLATE, c.STRING_TYPE);
    let array_ctor = c.ARRAY_FUNCTION_TYPE;
    let prototype = registry.prototype_of_constructor(array_ctor).unwrap();
    registry.define_declared_property(prototype, &word("first"), t, None);

    let strings = registry.create_templatized_type(array, vec![string]);
    assert_eq!(registry.type_to_string(strings), "Array<string>");
    assert_eq!(registry.find_property_type(strings, "first"), Some(string));
    assert_eq!(registry.get_template_element_type(strings), string);
    assert!(registry.is_subtype(strings, array));
}

#[test]
fn testTemplateSubstitution() {
    let mut registry = TypeRegistry::new();
    let t = registry.create_template_type(&word("T"));
    let c = &registry.common_types;
    let (number, null) = (c.NUMBER_TYPE, c.NULL_TYPE);
    let f = registry.create_function_type(vec![Parameter::new(t)], t);
    let nullable_t = registry.create_union(&[t, null]);

    let mut map = TemplateTypeMap::default();
    registry.infer_template_types(nullable_t, number, &mut map);
    assert_eq!(map.get(&t), Some(&number));

    let substituted = registry.substitute_templates(f, &map, true);
    assert_eq!(registry.type_to_string(substituted), "function (number): number");

    let empty = TemplateTypeMap::default();
    let unknown = registry.substitute_templates(f, &empty, true);
    assert_eq!(registry.type_to_string(unknown), "function (?): ?");
}

#[test]
fn testBindDropsBoundParameters() {
    let mut registry = TypeRegistry::new();
    let c = &registry.common_types;
    let (number, string, boolean) = (c.NUMBER_TYPE, c.STRING_TYPE, c.BOOLEAN_TYPE);
    let f = registry.create_function_type(
        vec![Parameter::new(number), Parameter::new(string)],
        boolean,
    );
    let bound = registry.get_bind_return_type(f, 2);
    assert_eq!(registry.type_to_string(bound), "function (string): boolean");
    let unbound = registry.get_bind_return_type(f, 1);
    assert_eq!(
        registry.type_to_string(unbound),
        "function (number, string): boolean"
    );
}

#[test]
fn testRecordConstraintAddsMissingProperties() {
    let mut registry = TypeRegistry::new();
    let number = registry.common_types.NUMBER_TYPE;
    let record = registry.create_record_type(vec![(word("a"), number)]);
    let literal = registry.create_anonymous_object_type();

    registry.match_constraint(literal, record);
    let a = registry.get_property_type(literal, "a");
    assert_eq!(registry.type_to_string(a), "(number|undefined)");
}

#[test]
fn testTypeExpressions() {
    let mut registry = TypeRegistry::new();
    constructor(&mut registry, "Foo");

    let foo = registry.evaluate_type_expression(&TypeExpr::named("Foo"), &[]);
    assert_eq!(registry.type_to_string(foo), "(Foo|null)");

    let non_null = TypeExpr::NonNull(Box::new(TypeExpr::named("Foo")));
    let non_null = registry.evaluate_type_expression(&non_null, &[]);
    assert_eq!(registry.type_to_string(non_null), "Foo");

    let optional = TypeExpr::Optional(Box::new(TypeExpr::named("number")));
    let optional = registry.evaluate_type_expression(&optional, &[]);
    assert_eq!(registry.type_to_string(optional), "(number|undefined)");

    let array = TypeExpr::Named {
        name: word("Array"),
        args: vec![TypeExpr::named("string")],
    };
    let array = registry.evaluate_type_expression(&array, &[]);
    assert_eq!(registry.type_to_string(array), "(Array<string>|null)");
}

#[test]
fn testForwardReferencesResolve() {
    let mut registry = TypeRegistry::new();
    let forward = registry.evaluate_type_expression(&TypeExpr::named("Later"), &[]);
    let missing = registry.evaluate_type_expression(&TypeExpr::named("Missing"), &[]);
    let (_, later) = constructor(&mut registry, "Later");
    registry.resolve_named_types();

    let forward = registry.restrict_by_not_null_or_undefined(forward);
    assert_eq!(registry.resolve(forward), later);
    let missing = registry.restrict_by_not_null_or_undefined(missing);
    assert!(registry.is_unknown_type(missing));
}

#[test]
fn testTemplateScopeShadowsNames() {
    let mut registry = TypeRegistry::new();
    let t = registry.create_template_type(&word("T"));
    let scope = [(word("T"), t)];
    assert_eq!(
        registry.evaluate_type_expression(&TypeExpr::named("T"), &scope),
        t
    );
}
