use crate::JsWord;
use bitflags::bitflags;

/// A type annotation as written in a JSDoc comment, before it is evaluated
/// against a scope.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeExpr {
    /// `?`
    Unknown,
    /// `*`
    All,
    /// `undefined` or `void`
    Void,
    /// A (possibly dotted) type name with optional template arguments,
    /// e.g. `Array<string>` or `ns.Foo`.
    Named { name: JsWord, args: Vec<TypeExpr> },
    /// `?T`
    Nullable(Box<TypeExpr>),
    /// `!T`
    NonNull(Box<TypeExpr>),
    /// `(A|B)`
    Union(Vec<TypeExpr>),
    /// `{a: number, b}`; a missing field type is unknown.
    Record(Vec<(JsWord, TypeExpr)>),
    Function(FunctionTypeExpr),
    /// `T=`
    Optional(Box<TypeExpr>),
    /// `...T`
    VarArgs(Box<TypeExpr>),
}

impl TypeExpr {
    pub fn named(name: &str) -> TypeExpr {
        TypeExpr::Named {
            name: JsWord::from(name),
            args: Vec::new(),
        }
    }
}

/// `function(new:T, this:U, A, B=, ...C): R`
#[derive(Clone, Debug, PartialEq)]
pub struct FunctionTypeExpr {
    pub params: Vec<TypeExpr>,
    pub return_type: Option<Box<TypeExpr>>,
    pub this_type: Option<Box<TypeExpr>>,
    pub new_type: Option<Box<TypeExpr>>,
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct JSDocFlags: u16 {
        const CONSTRUCTOR = 1 << 0;
        const INTERFACE = 1 << 1;
        const CONSTANT = 1 << 2;
        const NO_ALIAS = 1 << 3;
        const OVERRIDE = 1 << 4;
        const DEPRECATED = 1 << 5;
        /// `@typedef` was present, even if its type failed to parse.
        const TYPEDEF = 1 << 6;
        /// `@enum` was present.
        const ENUM = 1 << 7;
    }
}

/// The parsed content of a `/** ... */` comment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JSDocInfo {
    /// `@type`
    pub ty: Option<TypeExpr>,
    /// `@return`
    pub return_type: Option<TypeExpr>,
    /// `@param`, in declaration order.
    pub params: Vec<(JsWord, TypeExpr)>,
    /// `@this`
    pub this_type: Option<TypeExpr>,
    /// `@extends`
    pub base_type: Option<TypeExpr>,
    /// `@implements`
    pub implemented_interfaces: Vec<TypeExpr>,
    /// `@enum`
    pub enum_parameter_type: Option<TypeExpr>,
    /// `@typedef`
    pub typedef_type: Option<TypeExpr>,
    /// `@template`
    pub template_type_names: Vec<JsWord>,
    /// `@lends`
    pub lends_name: Option<JsWord>,
    pub flags: JSDocFlags,
}

impl JSDocInfo {
    pub fn has_type(&self) -> bool {
        self.ty.is_some()
    }

    pub fn has_return_type(&self) -> bool {
        self.return_type.is_some()
    }

    pub fn has_this_type(&self) -> bool {
        self.this_type.is_some()
    }

    pub fn has_enum_parameter_type(&self) -> bool {
        self.flags.contains(JSDocFlags::ENUM)
    }

    pub fn has_typedef_type(&self) -> bool {
        self.flags.contains(JSDocFlags::TYPEDEF)
    }

    pub fn get_parameter_type(&self, name: &str) -> Option<&TypeExpr> {
        self.params
            .iter()
            .find(|(param, _)| &**param == name)
            .map(|(_, ty)| ty)
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    pub fn is_constructor(&self) -> bool {
        self.flags.contains(JSDocFlags::CONSTRUCTOR)
    }

    pub fn is_interface(&self) -> bool {
        self.flags.contains(JSDocFlags::INTERFACE)
    }

    pub fn is_constant(&self) -> bool {
        self.flags.contains(JSDocFlags::CONSTANT)
    }

    pub fn get_lends_name(&self) -> Option<&JsWord> {
        self.lends_name.as_ref()
    }

    /// Whether the comment describes a function signature rather than a
    /// value type.
    pub fn is_function_type_declaration(&self) -> bool {
        self.parameter_count() > 0
            || self.has_return_type()
            || self.has_this_type()
            || self.is_constructor()
            || self.is_interface()
    }
}
