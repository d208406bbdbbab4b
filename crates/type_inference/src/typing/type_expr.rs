use super::function_type::{FunctionKind, Parameter};
use super::registry::TypeRegistry;
use super::types::{TyKind, TypeId};
use ast::{FunctionTypeExpr, JsWord, TypeExpr};

/// The template types in scope where a type expression is evaluated, by name.
pub type TemplateScope<'a> = &'a [(JsWord, TypeId)];

impl TypeRegistry {
    /// Converts a JSDoc type expression to a type. Object type names are
    /// implicitly nullable; primitives, enums and typedefs are not.
    pub fn evaluate_type_expression(&mut self, expr: &TypeExpr, templates: TemplateScope) -> TypeId {
        match expr {
            TypeExpr::Unknown => self.common_types.UNKNOWN_TYPE,
            TypeExpr::All => self.common_types.ALL_TYPE,
            TypeExpr::Void => self.common_types.VOID_TYPE,
            TypeExpr::Named { name, args } => self.evaluate_named(name, args, templates),
            TypeExpr::Nullable(inner) => {
                let inner = self.evaluate_type_expression(inner, templates);
                let null = self.common_types.NULL_TYPE;
                self.create_union(&[inner, null])
            }
            TypeExpr::NonNull(inner) => {
                let inner = self.evaluate_type_expression(inner, templates);
                self.restrict_by_not_null_or_undefined(inner)
            }
            TypeExpr::Union(alternates) => {
                let alternates: Vec<TypeId> = alternates
                    .iter()
                    .map(|alternate| self.evaluate_type_expression(alternate, templates))
                    .collect();
                self.create_union(&alternates)
            }
            TypeExpr::Record(fields) => {
                let fields: Vec<(JsWord, TypeId)> = fields
                    .iter()
                    .map(|(name, ty)| (name.clone(), self.evaluate_type_expression(ty, templates)))
                    .collect();
                self.create_record_type(fields)
            }
            TypeExpr::Function(function) => self.evaluate_function(function, templates),
            TypeExpr::Optional(inner) => {
                let inner = self.evaluate_type_expression(inner, templates);
                let void = self.common_types.VOID_TYPE;
                self.create_union(&[inner, void])
            }
            TypeExpr::VarArgs(inner) => self.evaluate_type_expression(inner, templates),
        }
    }

    fn evaluate_named(&mut self, name: &JsWord, args: &[TypeExpr], templates: TemplateScope) -> TypeId {
        if let Some(&(_, template)) = templates.iter().rev().find(|(t, _)| t == name) {
            return template;
        }
        match &**name {
            "undefined" | "void" => return self.common_types.VOID_TYPE,
            _ => {}
        }
        let base = match self.get_type_by_name(name) {
            Some(ty) => ty,
            None => self.create_named_type(name),
        };
        let ty = if args.is_empty() {
            base
        } else {
            let args: Vec<TypeId> = args
                .iter()
                .map(|arg| self.evaluate_type_expression(arg, templates))
                .collect();
            self.create_templatized_type(base, args)
        };
        if self.is_non_nullable_name(name) || !self.is_implicitly_nullable(ty) {
            ty
        } else {
            let null = self.common_types.NULL_TYPE;
            self.create_union(&[ty, null])
        }
    }

    fn is_implicitly_nullable(&self, ty: TypeId) -> bool {
        !matches!(
            self.kind(self.resolve(ty)),
            TyKind::BOOLEAN
                | TyKind::NUMBER
                | TyKind::STRING
                | TyKind::NULL
                | TyKind::VOID
                | TyKind::ENUM_ELEMENT(_)
                | TyKind::UNKNOWN(_)
                | TyKind::ALL
                | TyKind::TEMPLATE(_)
        )
    }

    fn evaluate_function(&mut self, function: &FunctionTypeExpr, templates: TemplateScope) -> TypeId {
        let params: Vec<Parameter> = function
            .params
            .iter()
            .map(|param| match param {
                TypeExpr::Optional(inner) => Parameter {
                    ty: self.evaluate_type_expression(inner, templates),
                    optional: true,
                    var_args: false,
                },
                TypeExpr::VarArgs(inner) => Parameter {
                    ty: self.evaluate_type_expression(inner, templates),
                    optional: true,
                    var_args: true,
                },
                _ => Parameter::new(self.evaluate_type_expression(param, templates)),
            })
            .collect();
        let return_type = match &function.return_type {
            Some(return_type) => self.evaluate_type_expression(return_type, templates),
            None => self.common_types.UNKNOWN_TYPE,
        };
        let this_type = function.this_type.as_ref().map(|this| {
            let this = self.evaluate_type_expression(this, templates);
            self.restrict_by_not_null_or_undefined(this)
        });
        let new_type = function.new_type.as_ref().map(|new| {
            let new = self.evaluate_type_expression(new, templates);
            self.restrict_by_not_null_or_undefined(new)
        });

        let ty = self.create_function_type(params, return_type);
        if let Some(function_type) = self.ty_mut(ty).function_mut() {
            match new_type {
                Some(instance) => {
                    function_type.kind = FunctionKind::CONSTRUCTOR;
                    function_type.instance_type = Some(instance);
                    function_type.type_of_this = Some(instance);
                }
                None => function_type.type_of_this = this_type,
            }
        }
        ty
    }
}
