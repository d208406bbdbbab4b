//! Library-specific idioms the scope creator and type inference recognize:
//! subclassing calls, singleton getters, delegates, object literal casts,
//! `bind` and assertion functions.

use crate::options::CodingConventionKind;
use crate::typing::{Parameter, TypeId, TypeRegistry};
use ast::{node_util, Ast, JsWord, NodeId, Token};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubclassType {
    INHERITS,
    MIXIN,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubclassRelationship {
    pub type_: SubclassType,
    pub subclassName: JsWord,
    pub superclassName: JsWord,
}

/// `delegator` forwards to instances of subclasses of `delegateBase`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegateRelationship {
    pub delegateBase: JsWord,
    pub delegator: JsWord,
}

/// `goog.reflect.object(Foo, {...})` gives the literal the type of `Foo`
/// instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectLiteralCast {
    pub typeName: Option<JsWord>,
    pub objectNode: Option<NodeId>,
}

/// A call that binds a function to a receiver and leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bind {
    pub target: NodeId,
    pub thisValue: Option<NodeId>,
    pub parameters: Vec<NodeId>,
}

impl Bind {
    pub fn getBoundParameterCount(&self) -> usize {
        self.parameters.len()
    }
}

/// What an assertion function guarantees about its first argument when it
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssertedType {
    /// The argument is truthy.
    TRUTHY,
    STRING,
    NUMBER,
    BOOLEAN,
    ARRAY,
    FUNCTION,
    OBJECT,
    /// An instance of the constructor passed as the second argument.
    INSTANCEOF,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertionFunctionSpec {
    pub functionName: &'static str,
    pub assertedType: AssertedType,
}

impl AssertionFunctionSpec {
    pub const fn new(functionName: &'static str, assertedType: AssertedType) -> Self {
        Self {
            functionName,
            assertedType,
        }
    }

    /// The argument whose type is asserted.
    pub fn getAssertedParam(&self, ast: &Ast, call: NodeId) -> Option<NodeId> {
        ast.second_child(call)
    }

    /// The type the asserted argument has after the call, or `None` when the
    /// assertion only guarantees truthiness.
    pub fn getAssertedType(
        &self,
        ast: &Ast,
        call: NodeId,
        registry: &TypeRegistry,
    ) -> Option<TypeId> {
        let c = &registry.common_types;
        match self.assertedType {
            AssertedType::TRUTHY => None,
            AssertedType::STRING => Some(c.STRING_TYPE),
            AssertedType::NUMBER => Some(c.NUMBER_TYPE),
            AssertedType::BOOLEAN => Some(c.BOOLEAN_TYPE),
            AssertedType::ARRAY => Some(c.ARRAY_TYPE),
            AssertedType::FUNCTION => Some(c.FUNCTION_INSTANCE_TYPE),
            AssertedType::OBJECT => Some(c.OBJECT_TYPE),
            AssertedType::INSTANCEOF => {
                let ctor = ast.child_at(call, 2)?;
                let instance = registry
                    .get_type(ctor)
                    .and_then(|ty| registry.get_function(ty))
                    .filter(|f| f.isConstructor() || f.isInterface())
                    .and_then(|f| f.instance_type);
                Some(instance.unwrap_or(c.OBJECT_TYPE))
            }
        }
    }
}

pub trait CodingConvention {
    /// The classes related by a call like `goog.inherits(Sub, Super)`.
    fn getClassesDefinedByCall(&self, _ast: &Ast, _call: NodeId) -> Option<SubclassRelationship> {
        None
    }

    fn applySubclassRelationship(
        &self,
        _registry: &mut TypeRegistry,
        _parentCtor: TypeId,
        _childCtor: TypeId,
        _type: SubclassType,
    ) {
    }

    /// The class named by a call that adds a singleton getter to it.
    fn getSingletonGetterClassName(&self, _ast: &Ast, _call: NodeId) -> Option<JsWord> {
        None
    }

    fn applySingletonGetter(
        &self,
        _registry: &mut TypeRegistry,
        _ctor: TypeId,
        _getterType: TypeId,
        _instanceType: TypeId,
    ) {
    }

    fn getDelegateRelationship(&self, _ast: &Ast, _call: NodeId) -> Option<DelegateRelationship> {
        None
    }

    /// The name of the class all delegates extend.
    fn getDelegateSuperclassName(&self) -> Option<&'static str> {
        None
    }

    fn getObjectLiteralCast(&self, _ast: &Ast, _call: NodeId) -> Option<ObjectLiteralCast> {
        None
    }

    /// Recognizes `fn.bind(self, ...)`.
    fn describeFunctionBind(&self, ast: &Ast, call: NodeId) -> Option<Bind> {
        describe_native_bind(ast, call)
    }

    fn getAssertionFunctions(&self) -> &'static [AssertionFunctionSpec] {
        &[]
    }

    fn isValidEnumKey(&self, key: &str) -> bool {
        !key.is_empty() && node_util::is_valid_simple_name(key)
    }
}

fn callee_name(ast: &Ast, call: NodeId) -> Option<JsWord> {
    if !ast.is(call, Token::Call) {
        return None;
    }
    node_util::get_qualified_name(ast, ast.first_child(call)?)
}

fn describe_native_bind(ast: &Ast, call: NodeId) -> Option<Bind> {
    if !ast.is(call, Token::Call) {
        return None;
    }
    let callee = ast.first_child(call)?;
    if !ast.is(callee, Token::GetProp) || &**ast.string(callee) != "bind" {
        return None;
    }
    let target = ast.first_child(callee)?;
    let args = &ast.children(call)[1..];
    Some(Bind {
        target,
        thisValue: args.first().copied(),
        parameters: args.iter().skip(1).copied().collect(),
    })
}

/// Plain JavaScript.
#[derive(Debug, Default)]
pub struct DefaultCodingConvention;

impl CodingConvention for DefaultCodingConvention {}

/// The Closure Library's `goog.*` idioms.
#[derive(Debug, Default)]
pub struct ClosureCodingConvention;

static CLOSURE_ASSERTIONS: [AssertionFunctionSpec; 8] = [
    AssertionFunctionSpec::new("goog.asserts.assert", AssertedType::TRUTHY),
    AssertionFunctionSpec::new("goog.asserts.assertString", AssertedType::STRING),
    AssertionFunctionSpec::new("goog.asserts.assertNumber", AssertedType::NUMBER),
    AssertionFunctionSpec::new("goog.asserts.assertBoolean", AssertedType::BOOLEAN),
    AssertionFunctionSpec::new("goog.asserts.assertArray", AssertedType::ARRAY),
    AssertionFunctionSpec::new("goog.asserts.assertFunction", AssertedType::FUNCTION),
    AssertionFunctionSpec::new("goog.asserts.assertObject", AssertedType::OBJECT),
    AssertionFunctionSpec::new("goog.asserts.assertInstanceof", AssertedType::INSTANCEOF),
];

/// Both arguments of a two-argument call, as qualified names.
fn two_qualified_names(ast: &Ast, call: NodeId) -> Option<(JsWord, JsWord)> {
    if ast.child_count(call) != 3 {
        return None;
    }
    let first = node_util::get_qualified_name(ast, ast.child_at(call, 1)?)?;
    let second = node_util::get_qualified_name(ast, ast.child_at(call, 2)?)?;
    Some((first, second))
}

fn strip_prototype(name: &str) -> Option<JsWord> {
    name.strip_suffix(".prototype").map(JsWord::from)
}

impl CodingConvention for ClosureCodingConvention {
    fn getClassesDefinedByCall(&self, ast: &Ast, call: NodeId) -> Option<SubclassRelationship> {
        // Only calls used as statements define classes.
        let parent = ast.parent(call)?;
        if !ast.is(parent, Token::ExprResult) {
            return None;
        }
        match callee_name(ast, call)?.as_ref() {
            "goog.inherits" => {
                let (subclassName, superclassName) = two_qualified_names(ast, call)?;
                Some(SubclassRelationship {
                    type_: SubclassType::INHERITS,
                    subclassName,
                    superclassName,
                })
            }
            "goog.mixin" => {
                let (subclass, superclass) = two_qualified_names(ast, call)?;
                Some(SubclassRelationship {
                    type_: SubclassType::MIXIN,
                    subclassName: strip_prototype(&subclass)?,
                    superclassName: strip_prototype(&superclass)?,
                })
            }
            _ => None,
        }
    }

    fn applySubclassRelationship(
        &self,
        registry: &mut TypeRegistry,
        parentCtor: TypeId,
        childCtor: TypeId,
        type_: SubclassType,
    ) {
        if type_ != SubclassType::INHERITS {
            return;
        }
        let (parent_prototype, child_prototype) = match (
            registry.prototype_of_constructor(parentCtor),
            registry.prototype_of_constructor(childCtor),
        ) {
            (Some(parent), Some(child)) => (parent, child),
            _ => return,
        };
        registry.define_declared_property(childCtor, &JsWord::from("superClass_"), parent_prototype, None);
        registry.define_declared_property(child_prototype, &JsWord::from("constructor"), childCtor, None);

        // Without an @extends the call is what links the prototype chains.
        let object = registry.common_types.OBJECT_TYPE;
        let current = registry.ty(child_prototype).object().and_then(|o| o.implicit_prototype);
        if current == Some(object) {
            if let Some(parent_instance) = registry.instance_of_constructor(parentCtor) {
                registry.set_prototype_based_on(childCtor, parent_instance);
            }
        }
    }

    fn getSingletonGetterClassName(&self, ast: &Ast, call: NodeId) -> Option<JsWord> {
        if callee_name(ast, call)?.as_ref() != "goog.addSingletonGetter" || ast.child_count(call) != 2 {
            return None;
        }
        node_util::get_qualified_name(ast, ast.child_at(call, 1)?)
    }

    fn applySingletonGetter(
        &self,
        registry: &mut TypeRegistry,
        ctor: TypeId,
        getterType: TypeId,
        instanceType: TypeId,
    ) {
        registry.define_declared_property(ctor, &JsWord::from("getInstance"), getterType, None);
        registry.define_declared_property(ctor, &JsWord::from("instance_"), instanceType, None);
    }

    fn getDelegateRelationship(&self, ast: &Ast, call: NodeId) -> Option<DelegateRelationship> {
        if callee_name(ast, call)?.as_ref() != "goog.delegate" {
            return None;
        }
        let (delegateBase, delegator) = two_qualified_names(ast, call)?;
        Some(DelegateRelationship {
            delegateBase,
            delegator,
        })
    }

    fn getDelegateSuperclassName(&self) -> Option<&'static str> {
        Some("goog.Delegate")
    }

    fn getObjectLiteralCast(&self, ast: &Ast, call: NodeId) -> Option<ObjectLiteralCast> {
        if callee_name(ast, call)?.as_ref() != "goog.reflect.object" || ast.child_count(call) != 3 {
            return None;
        }
        let type_node = ast.child_at(call, 1)?;
        let object_node = ast.child_at(call, 2)?;
        Some(ObjectLiteralCast {
            typeName: node_util::get_qualified_name(ast, type_node),
            objectNode: Some(object_node).filter(|&n| ast.is(n, Token::ObjectLit)),
        })
    }

    fn describeFunctionBind(&self, ast: &Ast, call: NodeId) -> Option<Bind> {
        if let Some(bind) = describe_native_bind(ast, call) {
            return Some(bind);
        }
        let name = callee_name(ast, call)?;
        let args = &ast.children(call)[1..];
        match name.as_ref() {
            "goog.bind" => Some(Bind {
                target: *args.first()?,
                thisValue: args.get(1).copied(),
                parameters: args.iter().skip(2).copied().collect(),
            }),
            "goog.partial" => Some(Bind {
                target: *args.first()?,
                thisValue: None,
                parameters: args.iter().skip(1).copied().collect(),
            }),
            _ => None,
        }
    }

    fn getAssertionFunctions(&self) -> &'static [AssertionFunctionSpec] {
        &CLOSURE_ASSERTIONS
    }

    /// Enum keys are upper case constants: `A`, `FOO_BAR`, `V2`.
    fn isValidEnumKey(&self, key: &str) -> bool {
        let mut chars = key.chars();
        matches!(chars.next(), Some(c) if c.is_ascii_uppercase() || c == '_')
            && chars.all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
    }
}

pub fn create_coding_convention(kind: CodingConventionKind) -> Box<dyn CodingConvention> {
    match kind {
        CodingConventionKind::Default => Box::new(DefaultCodingConvention),
        CodingConventionKind::Closure => Box::new(ClosureCodingConvention),
    }
}

/// The type of a singleton getter: a function without parameters returning
/// the instance.
pub(crate) fn singleton_getter_type(registry: &mut TypeRegistry, instance: TypeId) -> TypeId {
    registry.create_function_type(Vec::<Parameter>::new(), instance)
}
