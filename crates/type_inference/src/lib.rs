//! Flow-sensitive type inference for JavaScript annotated with Closure-style
//! JSDoc.
//!
//! [TypedScopeCreator] declares the names of the global scope and of each
//! function with their declared types; [TypeInference] then propagates
//! types through every function body, narrowing them along the branches of
//! conditions. [infer_types] runs both over a whole program.

#![allow(non_snake_case)]
#![allow(non_upper_case_globals)]

pub mod coding_convention;
pub mod control_flow;
mod ctx;
#[allow(non_snake_case)]
pub mod DataFlowAnalysis;
pub mod diagnostics;
mod error;
mod first_order_function_analyzer;
mod function_type_builder;
pub mod linked_flow_scope;
mod options;
pub mod reverse_abstract_interpreter;
mod type_inference;
mod type_inference_pass;
pub mod typed_scope;
mod typed_scope_creator;
pub mod typed_var;
pub mod typing;

pub use ctx::Ctx;
pub use diagnostics::{CheckLevel, DiagnosticType, JSError};
pub use error::{InferenceError, InferenceResult};
pub use options::{CodingConventionKind, InferenceOptions};
pub use type_inference::TypeInference;
pub use type_inference_pass::{infer_types, TypeInferencePass, TypedProgram};
pub use typed_scope::{ScopeId, TypedScope};
pub use typed_scope_creator::TypedScopeCreator;
pub use typed_var::{TypedVar, TypedVarId};
pub use typing::{TypeId, TypeRegistry};
