use super::function_type::FunctionType;
use ast::{JsWord, NodeId};
use indexmap::IndexMap;

#[derive(Clone, Debug, PartialEq)]
pub enum TyKind {
    ALL,
    BOOLEAN,
    ENUM(EnumType),
    ENUM_ELEMENT(EnumElementType),
    FUNCTION(FunctionType),
    INSTANCE_OBJECT(ObjectType),
    NAMED(NamedType),
    NO,
    NO_OBJECT,
    NULL,
    NUMBER,
    /// `Foo.prototype`, and anonymous object literal types.
    PROTOTYPE_OBJECT(ObjectType),
    RECORD(ObjectType),
    STRING,
    TEMPLATE(TemplateType),
    TEMPLATIZED(TemplatizedType),
    UNION(UnionType),
    UNKNOWN(UnknownType),
    VOID,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Ty {
    kind: TyKind,
}

impl Ty {
    pub fn new(kind: TyKind) -> Self {
        Self { kind }
    }

    pub fn kind(&self) -> &TyKind {
        &self.kind
    }

    pub(crate) fn kind_mut(&mut self) -> &mut TyKind {
        &mut self.kind
    }

    /// The property map of an object-like type.
    pub fn object(&self) -> Option<&ObjectType> {
        match &self.kind {
            TyKind::INSTANCE_OBJECT(object)
            | TyKind::PROTOTYPE_OBJECT(object)
            | TyKind::RECORD(object) => Some(object),
            TyKind::ENUM(enum_type) => Some(&enum_type.object),
            TyKind::FUNCTION(function) => Some(&function.object),
            _ => None,
        }
    }

    pub(crate) fn object_mut(&mut self) -> Option<&mut ObjectType> {
        match &mut self.kind {
            TyKind::INSTANCE_OBJECT(object)
            | TyKind::PROTOTYPE_OBJECT(object)
            | TyKind::RECORD(object) => Some(object),
            TyKind::ENUM(enum_type) => Some(&mut enum_type.object),
            TyKind::FUNCTION(function) => Some(&mut function.object),
            _ => None,
        }
    }

    pub fn function(&self) -> Option<&FunctionType> {
        match &self.kind {
            TyKind::FUNCTION(function) => Some(function),
            _ => None,
        }
    }

    pub(crate) fn function_mut(&mut self) -> Option<&mut FunctionType> {
        match &mut self.kind {
            TyKind::FUNCTION(function) => Some(function),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UnknownType {
    // See the explanation of checked unknown types in CommonTypes.
    pub isChecked: bool,
}

impl UnknownType {
    pub fn new(isChecked: bool) -> Self {
        Self { isChecked }
    }
}

/// A property of an object type.
#[derive(Clone, Debug, PartialEq)]
pub struct Property {
    pub ty: TypeId,
    /// Whether the type was inferred from an assignment rather than declared.
    pub inferred: bool,
    pub node: Option<NodeId>,
}

/// The state shared by every object-like type: a name, a prototype chain and
/// own properties.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ObjectType {
    /// `Foo` for instances of `Foo`, `Foo.prototype` for its prototype. Anonymous
    /// object literal types have none.
    pub reference_name: Option<JsWord>,
    pub implicit_prototype: Option<TypeId>,
    pub properties: IndexMap<JsWord, Property>,
    /// The constructor of an instance or prototype object.
    pub constructor: Option<TypeId>,
    pub is_native: bool,
}

impl ObjectType {
    pub fn new(reference_name: Option<JsWord>, implicit_prototype: Option<TypeId>) -> Self {
        Self {
            reference_name,
            implicit_prototype,
            ..Default::default()
        }
    }

    pub fn has_own_property(&self, name: &str) -> bool {
        self.properties.contains_key(&JsWord::from(name))
    }

    pub fn own_property(&self, name: &str) -> Option<&Property> {
        self.properties.get(&JsWord::from(name))
    }
}

/// The type of an `@enum` object. Its properties are the enum's elements.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumType {
    pub object: ObjectType,
    pub element_type: TypeId,
}

/// The type of an element of an enum.
#[derive(Clone, Debug, PartialEq)]
pub struct EnumElementType {
    pub name: JsWord,
    pub primitive_type: TypeId,
    pub enum_type: Option<TypeId>,
}

/// A reference to a type by name that is bound once all declarations have
/// been seen.
#[derive(Clone, Debug, PartialEq)]
pub struct NamedType {
    pub reference_name: JsWord,
    pub referenced: Option<TypeId>,
}

/// A `@template` type variable.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplateType {
    pub name: JsWord,
}

/// A generic type applied to arguments, `Array<string>`.
#[derive(Clone, Debug, PartialEq)]
pub struct TemplatizedType {
    pub base: TypeId,
    pub args: Vec<TypeId>,
}

/// A union of at least two types, none a subtype of another. Alternates are
/// kept sorted so that equal unions are interned to the same id.
#[derive(Clone, Debug, PartialEq)]
pub struct UnionType {
    pub alternates: Vec<TypeId>,
}

/// Constants corresponding to types that are built into a JavaScript engine
/// and other types that occur very often in the type system.
#[derive(Clone, Copy, Debug)]
pub struct CommonTypes {
    pub ALL_TYPE: TypeId,
    pub NO_TYPE: TypeId,
    pub NO_OBJECT_TYPE: TypeId,

    pub UNKNOWN_TYPE: TypeId,
    /// A checked unknown type is a type that we know something about,
    /// but we're not really sure what we know about it.
    ///
    /// Examples of checked unknown types include:
    /// ```js
    /// if (x) { // x is unknown
    ///   alert(x); // x is checked unknown
    /// }
    /// ```
    ///
    /// ```js
    /// /* @param {SomeForwardDeclaredType} x */
    /// function f(x) {
    ///   // x is checked unknown. We know it's some type, but the type
    ///   // has not been included in this binary.
    /// }
    /// ```
    ///
    /// This is useful for missing property warnings, where we don't
    /// want to emit warnings on things that have been checked.
    pub CHECKED_UNKNOWN_TYPE: TypeId,

    pub BOOLEAN_TYPE: TypeId,
    pub NULL_TYPE: TypeId,
    pub NUMBER_TYPE: TypeId,
    pub STRING_TYPE: TypeId,
    pub VOID_TYPE: TypeId,

    pub OBJECT_TYPE: TypeId,
    // The Object constructor
    pub OBJECT_FUNCTION_TYPE: TypeId,
    pub OBJECT_PROTOTYPE: TypeId,
    /// `K` of `Object<K,V>`.
    pub OBJECT_INDEX_TEMPLATE: TypeId,
    /// `V` of `Object<K,V>`.
    pub OBJECT_ELEMENT_TEMPLATE: TypeId,

    /// Instances of `Function`, the supertype of every function type.
    pub FUNCTION_INSTANCE_TYPE: TypeId,
    pub FUNCTION_FUNCTION_TYPE: TypeId,
    pub FUNCTION_PROTOTYPE: TypeId,

    pub ARRAY_TYPE: TypeId,
    pub ARRAY_FUNCTION_TYPE: TypeId,
    /// `T` of `Array<T>`.
    pub ARRAY_ELEMENT_TEMPLATE: TypeId,

    pub BOOLEAN_OBJECT_TYPE: TypeId,
    pub BOOLEAN_OBJECT_FUNCTION_TYPE: TypeId,

    pub NUMBER_OBJECT_TYPE: TypeId,
    pub NUMBER_OBJECT_FUNCTION_TYPE: TypeId,

    pub STRING_OBJECT_TYPE: TypeId,
    pub STRING_OBJECT_FUNCTION_TYPE: TypeId,

    pub DATE_TYPE: TypeId,
    pub DATE_FUNCTION_TYPE: TypeId,

    pub REGEXP_TYPE: TypeId,
    pub REGEXP_FUNCTION_TYPE: TypeId,

    pub ERROR_TYPE: TypeId,
    pub ERROR_FUNCTION_TYPE: TypeId,
    pub TYPE_ERROR_TYPE: TypeId,
    pub TYPE_ERROR_FUNCTION_TYPE: TypeId,
    pub RANGE_ERROR_TYPE: TypeId,
    pub RANGE_ERROR_FUNCTION_TYPE: TypeId,

    pub GLOBAL_THIS: TypeId,

    /// (null,undefined)
    pub NULL_VOID: TypeId,

    /// (number,string)
    pub NUMBER_STRING: TypeId,

    /// (boolean,number,string)
    pub NUMBER_STRING_BOOLEAN: TypeId,
}

index::newtype_index! {
    pub struct TypeId {
        DEBUG_FORMAT = "TypeId({})"
    }
}
