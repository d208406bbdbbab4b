use super::registry::TypeRegistry;
use super::types::{ObjectType, TyKind, TypeId};
use std::fmt::{self, Display, Formatter, Write};

const MAX_DISPLAY_DEPTH: usize = 8;

/// Renders a type in JSDoc notation: `(null|string)`, `Array<number>`,
/// `function (this:Foo, number=): string`.
pub struct TypeDisplay<'a> {
    registry: &'a TypeRegistry,
    ty: TypeId,
}

impl TypeRegistry {
    pub fn display(&self, ty: TypeId) -> TypeDisplay<'_> {
        TypeDisplay { registry: self, ty }
    }

    pub fn type_to_string(&self, ty: TypeId) -> String {
        self.display(ty).to_string()
    }
}

impl Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write_type(self.registry, self.ty, f, 0)
    }
}

fn write_type<W: Write>(registry: &TypeRegistry, ty: TypeId, f: &mut W, depth: usize) -> fmt::Result {
    if depth > MAX_DISPLAY_DEPTH {
        return f.write_str("...");
    }
    match registry.kind(ty) {
        TyKind::ALL => f.write_str("*"),
        TyKind::BOOLEAN => f.write_str("boolean"),
        TyKind::NO => f.write_str("None"),
        TyKind::NO_OBJECT => f.write_str("NoObject"),
        TyKind::NULL => f.write_str("null"),
        TyKind::NUMBER => f.write_str("number"),
        TyKind::STRING => f.write_str("string"),
        TyKind::VOID => f.write_str("undefined"),
        TyKind::UNKNOWN(_) => f.write_str("?"),
        TyKind::TEMPLATE(template) => f.write_str(&template.name),
        TyKind::NAMED(named) => f.write_str(&named.reference_name),
        TyKind::ENUM_ELEMENT(element) => f.write_str(&element.name),
        TyKind::ENUM(enum_type) => write_object(registry, &enum_type.object, f, depth),
        TyKind::INSTANCE_OBJECT(object) | TyKind::PROTOTYPE_OBJECT(object) => {
            write_object(registry, object, f, depth)
        }
        TyKind::RECORD(record) => write_properties(registry, record, f, depth),
        TyKind::UNION(union) => {
            let mut alternates: Vec<String> = union
                .alternates
                .iter()
                .map(|&alternate| {
                    let mut s = String::new();
                    let _ = write_type(registry, alternate, &mut s, depth + 1);
                    s
                })
                .collect();
            alternates.sort();
            write!(f, "({})", alternates.join("|"))
        }
        TyKind::TEMPLATIZED(templatized) => {
            write_type(registry, templatized.base, f, depth + 1)?;
            f.write_char('<')?;
            for (i, &arg) in templatized.args.iter().enumerate() {
                if i > 0 {
                    f.write_char(',')?;
                }
                write_type(registry, arg, f, depth + 1)?;
            }
            f.write_char('>')
        }
        TyKind::FUNCTION(function) => {
            f.write_str("function (")?;
            let mut first = true;
            let mut separator = |f: &mut W| -> fmt::Result {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                Ok(())
            };
            if function.hasInstanceType() {
                if let Some(instance) = function.instance_type {
                    separator(f)?;
                    f.write_str("new:")?;
                    write_type(registry, instance, f, depth + 1)?;
                }
            } else if let Some(this) = function.type_of_this {
                separator(f)?;
                f.write_str("this:")?;
                write_type(registry, this, f, depth + 1)?;
            }
            for param in &function.params {
                separator(f)?;
                if param.var_args {
                    f.write_str("...")?;
                    write_type(registry, param.ty, f, depth + 1)?;
                } else {
                    write_type(registry, param.ty, f, depth + 1)?;
                    if param.optional {
                        f.write_char('=')?;
                    }
                }
            }
            f.write_str("): ")?;
            write_type(registry, function.return_type, f, depth + 1)
        }
    }
}

fn write_object<W: Write>(
    registry: &TypeRegistry,
    object: &ObjectType,
    f: &mut W,
    depth: usize,
) -> fmt::Result {
    match &object.reference_name {
        Some(name) => f.write_str(name),
        None => write_properties(registry, object, f, depth),
    }
}

fn write_properties<W: Write>(
    registry: &TypeRegistry,
    object: &ObjectType,
    f: &mut W,
    depth: usize,
) -> fmt::Result {
    f.write_char('{')?;
    for (i, (name, property)) in object.properties.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}: ", name)?;
        write_type(registry, property.ty, f, depth + 1)?;
    }
    f.write_char('}')
}
