use super::function_type::Parameter;
use super::registry::TypeRegistry;
use super::types::{Property, TyKind, TypeId};
use ast::JsWord;
use rustc_hash::FxHashMap;

/// Template type bindings, from template type to its replacement.
pub type TemplateTypeMap = FxHashMap<TypeId, TypeId>;

/// Nested generic types deeper than this are left as they are.
const MAX_REPLACEMENT_DEPTH: usize = 16;

impl TypeRegistry {
    /// Replaces the template types in `ty` with their bindings in `map`.
    /// Unbound template types become unknown when `unknown_for_missing` is set
    /// and are kept otherwise.
    pub fn substitute_templates(
        &mut self,
        ty: TypeId,
        map: &TemplateTypeMap,
        unknown_for_missing: bool,
    ) -> TypeId {
        TemplateTypeReplacer {
            map,
            unknown_for_missing,
        }
        .replace(self, ty, 0)
    }

    /// Binds the template types occurring in a declared parameter type by
    /// matching it against the type of the argument passed for it.
    pub fn infer_template_types(
        &mut self,
        param_type: TypeId,
        arg_type: TypeId,
        resolved: &mut TemplateTypeMap,
    ) {
        self.infer_template_types_at_depth(param_type, arg_type, resolved, 0);
    }

    fn infer_template_types_at_depth(
        &mut self,
        param_type: TypeId,
        arg_type: TypeId,
        resolved: &mut TemplateTypeMap,
        depth: usize,
    ) {
        if depth > MAX_REPLACEMENT_DEPTH {
            return;
        }
        let param_type = self.resolve(param_type);
        let arg_type = self.resolve(arg_type);
        match self.kind(param_type).clone() {
            TyKind::TEMPLATE(_) => {
                if self.is_unknown_type(arg_type) && !self.is_template_type(arg_type) {
                    return;
                }
                let bound = match resolved.get(&param_type) {
                    Some(&previous) => self.get_least_supertype(previous, arg_type),
                    None => arg_type,
                };
                resolved.insert(param_type, bound);
            }
            TyKind::UNION(union) => {
                for alternate in union.alternates {
                    self.infer_template_types_at_depth(alternate, arg_type, resolved, depth + 1);
                }
            }
            TyKind::FUNCTION(param_function) => {
                let arg_function = match self.get_function(arg_type) {
                    Some(function) => function.clone(),
                    None => return,
                };
                self.infer_template_types_at_depth(
                    param_function.return_type,
                    arg_function.return_type,
                    resolved,
                    depth + 1,
                );
                for (param, arg) in param_function.params.iter().zip(arg_function.params.iter()) {
                    self.infer_template_types_at_depth(param.ty, arg.ty, resolved, depth + 1);
                }
            }
            TyKind::TEMPLATIZED(param_templatized) => {
                let arg_templatized = match self.kind(arg_type) {
                    TyKind::TEMPLATIZED(templatized) if templatized.base == param_templatized.base => {
                        templatized.clone()
                    }
                    _ => return,
                };
                for (&param, &arg) in param_templatized
                    .args
                    .iter()
                    .zip(arg_templatized.args.iter())
                {
                    self.infer_template_types_at_depth(param, arg, resolved, depth + 1);
                }
            }
            TyKind::RECORD(record) => {
                for (name, property) in record.properties {
                    if let Some(arg_property) = self.find_property(arg_type, &name) {
                        self.infer_template_types_at_depth(
                            property.ty,
                            arg_property.ty,
                            resolved,
                            depth + 1,
                        );
                    }
                }
            }
            _ => {}
        }
    }
}

struct TemplateTypeReplacer<'a> {
    map: &'a TemplateTypeMap,
    unknown_for_missing: bool,
}

impl TemplateTypeReplacer<'_> {
    fn replace(&self, registry: &mut TypeRegistry, ty: TypeId, depth: usize) -> TypeId {
        if depth > MAX_REPLACEMENT_DEPTH {
            return ty;
        }
        let ty = registry.resolve(ty);
        match registry.kind(ty).clone() {
            TyKind::TEMPLATE(_) => match self.map.get(&ty) {
                Some(&replacement) => replacement,
                None if self.unknown_for_missing => registry.common_types.UNKNOWN_TYPE,
                None => ty,
            },
            TyKind::UNION(union) => {
                let replaced: Vec<TypeId> = union
                    .alternates
                    .iter()
                    .map(|&alternate| self.replace(registry, alternate, depth + 1))
                    .collect();
                if replaced == union.alternates {
                    ty
                } else {
                    registry.create_union(&replaced)
                }
            }
            TyKind::TEMPLATIZED(templatized) => {
                let args: Vec<TypeId> = templatized
                    .args
                    .iter()
                    .map(|&arg| self.replace(registry, arg, depth + 1))
                    .collect();
                if args == templatized.args {
                    ty
                } else {
                    registry.create_templatized_type(templatized.base, args)
                }
            }
            TyKind::FUNCTION(function) if !function.hasInstanceType() => {
                let params: Vec<Parameter> = function
                    .params
                    .iter()
                    .map(|param| Parameter {
                        ty: self.replace(registry, param.ty, depth + 1),
                        ..param.clone()
                    })
                    .collect();
                let return_type = self.replace(registry, function.return_type, depth + 1);
                let type_of_this = function
                    .type_of_this
                    .map(|this| self.replace(registry, this, depth + 1));
                if params == function.params
                    && return_type == function.return_type
                    && type_of_this == function.type_of_this
                {
                    return ty;
                }
                let replaced = registry.create_function_type(params, return_type);
                if let Some(replaced_function) = registry.ty_mut(replaced).function_mut() {
                    replaced_function.type_of_this = type_of_this;
                    replaced_function.inferred_return_type = function.inferred_return_type;
                    replaced_function.source = function.source;
                    replaced_function.template_types = function
                        .template_types
                        .iter()
                        .copied()
                        .filter(|template| !self.map.contains_key(template))
                        .collect();
                }
                replaced
            }
            TyKind::RECORD(record) => {
                let mut changed = false;
                let fields: Vec<(JsWord, TypeId)> = record
                    .properties
                    .iter()
                    .map(|(name, property): (&JsWord, &Property)| {
                        let replaced = self.replace(registry, property.ty, depth + 1);
                        changed |= replaced != property.ty;
                        (name.clone(), replaced)
                    })
                    .collect();
                if changed {
                    registry.create_record_type(fields)
                } else {
                    ty
                }
            }
            _ => ty,
        }
    }
}
