mod boolean_literal_set;
mod display;
pub mod function_type;
mod registry;
mod relations;
mod template;
mod type_expr;
pub mod types;

#[cfg(test)]
#[allow(non_snake_case)]
mod tests;

pub use boolean_literal_set::BooleanLiteralSet;
pub use display::TypeDisplay;
pub use function_type::{FunctionKind, FunctionType, Parameter};
pub use registry::TypeRegistry;
pub use template::TemplateTypeMap;
pub use type_expr::TemplateScope;
pub use types::{Property, TyKind, TypeId};
