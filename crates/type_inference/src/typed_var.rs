use crate::typed_scope::ScopeId;
use crate::typing::TypeId;
use ast::{JsWord, NodeId};

index::newtype_index! {
    pub struct TypedVarId {
        DEBUG_FORMAT = "TypedVarId({})"
    }
}

/**
 * A variable or qualified name declared in a {@link TypedScope}, with its
 * declared or inferred type.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedVar {
    pub scope: ScopeId,

    pub ty: Option<TypeId>,

    // The next two fields are only used by type inference.
    pub markedEscaped: bool,
    pub markedAssignedExactlyOnce: bool,

    /**
     * Whether the variable's type has been inferred or is declared. An inferred
     * type may change over time (as more code is discovered), whereas a
     * declared type is a static contract that must be matched.
     */
    pub typeInferred: bool,
    name: JsWord,
    nameNode: Option<NodeId>,
}

impl TypedVar {
    pub fn new(
        inferred: bool,
        name: &JsWord,
        nameNode: Option<NodeId>,
        ty: Option<TypeId>,
        scope: ScopeId,
    ) -> Self {
        Self {
            scope,
            ty,
            markedEscaped: false,
            markedAssignedExactlyOnce: false,
            typeInferred: inferred,
            name: name.clone(),
            nameNode,
        }
    }

    pub fn getName(&self) -> &JsWord {
        &self.name
    }

    pub fn getNameNode(&self) -> Option<NodeId> {
        self.nameNode
    }

    pub fn getType(&self) -> Option<TypeId> {
        self.ty
    }

    pub fn isTypeInferred(&self) -> bool {
        self.typeInferred
    }

    pub fn setType(&mut self, ty: TypeId) {
        self.ty = Some(ty);
    }

    pub fn markEscaped(&mut self) {
        self.markedEscaped = true;
    }

    pub fn isMarkedEscaped(&self) -> bool {
        self.markedEscaped
    }

    pub fn markAssignedExactlyOnce(&mut self) {
        self.markedAssignedExactlyOnce = true;
    }

    pub fn isMarkedAssignedExactlyOnce(&self) -> bool {
        self.markedAssignedExactlyOnce
    }
}
