use super::types::{ObjectType, TypeId};
use ast::NodeId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionKind {
    ORDINARY,
    CONSTRUCTOR,
    INTERFACE,
}

/// A formal parameter of a function type.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    pub ty: TypeId,
    pub optional: bool,
    pub var_args: bool,
}

impl Parameter {
    pub fn new(ty: TypeId) -> Self {
        Self {
            ty,
            optional: false,
            var_args: false,
        }
    }
}

/// The type of a function, a constructor or an interface.
///
/// Constructors and interfaces own an instance type and a prototype object;
/// `Foo.prototype` is the implicit prototype of every instance of `Foo`.
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionType {
    pub kind: FunctionKind,
    pub params: Vec<Parameter>,
    pub return_type: TypeId,
    /// Whether the return type was inferred rather than declared with `@return`.
    pub inferred_return_type: bool,
    /// `@this`, or the instance type of the owner for prototype methods.
    pub type_of_this: Option<TypeId>,
    /// The `@template` types of this function, in declaration order.
    pub template_types: Vec<TypeId>,
    /// The `FUNCTION` node this type was created from.
    pub source: Option<NodeId>,
    pub instance_type: Option<TypeId>,
    pub prototype: Option<TypeId>,
    pub implemented_interfaces: Vec<TypeId>,
    /// Static properties.
    pub object: ObjectType,
}

impl FunctionType {
    pub fn new(params: Vec<Parameter>, return_type: TypeId, function_prototype: TypeId) -> Self {
        Self {
            kind: FunctionKind::ORDINARY,
            params,
            return_type,
            inferred_return_type: false,
            type_of_this: None,
            template_types: Vec::new(),
            source: None,
            instance_type: None,
            prototype: None,
            implemented_interfaces: Vec::new(),
            object: ObjectType::new(None, Some(function_prototype)),
        }
    }

    pub fn isConstructor(&self) -> bool {
        self.kind == FunctionKind::CONSTRUCTOR
    }

    pub fn isInterface(&self) -> bool {
        self.kind == FunctionKind::INTERFACE
    }

    pub fn hasInstanceType(&self) -> bool {
        self.isConstructor() || self.isInterface()
    }

    pub fn is_native(&self) -> bool {
        self.object.is_native
    }

    pub fn reference_name(&self) -> Option<&ast::JsWord> {
        self.object.reference_name.as_ref()
    }

    /// The parameter that receives argument `index`, following var-args.
    pub fn param_for_argument(&self, index: usize) -> Option<&Parameter> {
        match self.params.get(index) {
            Some(param) => Some(param),
            None => self.params.last().filter(|param| param.var_args),
        }
    }
}
