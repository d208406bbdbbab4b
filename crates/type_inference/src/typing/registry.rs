use super::function_type::{FunctionKind, FunctionType, Parameter};
use super::types::{
    CommonTypes, EnumElementType, EnumType, NamedType, ObjectType, Property, TemplateType,
    TemplatizedType, Ty, TyKind, TypeId, UnionType, UnknownType,
};
use ast::{JsWord, NodeId};
use index::vec::IndexVec;
use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};

/// The arena of every type created during a compilation, the table of named
/// types, and the type annotations of AST nodes.
#[derive(Debug)]
pub struct TypeRegistry {
    types: IndexVec<TypeId, Ty>,
    type_map: FxHashMap<NodeId, TypeId>,
    /// Named types visible to JSDoc annotations.
    type_names: FxHashMap<JsWord, TypeId>,
    /// Names that JSDoc does not implicitly make nullable: enums and typedefs.
    non_nullable_type_names: FxHashSet<JsWord>,
    /// Named proxies created for forward references.
    unresolved_named_types: Vec<TypeId>,
    named_proxies: FxHashMap<JsWord, TypeId>,
    unions: FxHashMap<Vec<TypeId>, TypeId>,
    templatized_types: FxHashMap<(TypeId, Vec<TypeId>), TypeId>,
    /// For each property name, the types a property of that name was assigned
    /// to without a known owner.
    types_indexed_by_property: FxHashMap<JsWord, IndexSet<TypeId>>,
    pub common_types: CommonTypes,
}

/// The three types behind a native constructor.
struct NativeConstructor {
    ctor: TypeId,
    prototype: TypeId,
    instance: TypeId,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeRegistry {
    pub fn new() -> Self {
        let mut types = IndexVec::with_capacity(64);

        let mut mk = |kind: TyKind| types.push(Ty::new(kind));
        let ALL_TYPE = mk(TyKind::ALL);
        let NO_TYPE = mk(TyKind::NO);
        let NO_OBJECT_TYPE = mk(TyKind::NO_OBJECT);
        let UNKNOWN_TYPE = mk(TyKind::UNKNOWN(UnknownType::new(false)));
        let CHECKED_UNKNOWN_TYPE = mk(TyKind::UNKNOWN(UnknownType::new(true)));
        let BOOLEAN_TYPE = mk(TyKind::BOOLEAN);
        let NULL_TYPE = mk(TyKind::NULL);
        let NUMBER_TYPE = mk(TyKind::NUMBER);
        let STRING_TYPE = mk(TyKind::STRING);
        let VOID_TYPE = mk(TyKind::VOID);
        let OBJECT_INDEX_TEMPLATE = mk(TyKind::TEMPLATE(TemplateType {
            name: JsWord::from("K"),
        }));
        let OBJECT_ELEMENT_TEMPLATE = mk(TyKind::TEMPLATE(TemplateType {
            name: JsWord::from("V"),
        }));
        let ARRAY_ELEMENT_TEMPLATE = mk(TyKind::TEMPLATE(TemplateType {
            name: JsWord::from("T"),
        }));

        let mut unions = FxHashMap::default();
        let mut mk_union = |types: &mut IndexVec<TypeId, Ty>, mut alternates: Vec<TypeId>| {
            alternates.sort();
            let id = types.push(Ty::new(TyKind::UNION(UnionType {
                alternates: alternates.clone(),
            })));
            unions.insert(alternates, id);
            id
        };
        let NULL_VOID = mk_union(&mut types, vec![NULL_TYPE, VOID_TYPE]);
        let NUMBER_STRING = mk_union(&mut types, vec![NUMBER_TYPE, STRING_TYPE]);
        let NUMBER_STRING_BOOLEAN =
            mk_union(&mut types, vec![NUMBER_TYPE, STRING_TYPE, BOOLEAN_TYPE]);

        let optional_all = || Parameter {
            ty: ALL_TYPE,
            optional: true,
            var_args: false,
        };
        let var_args_all = || Parameter {
            ty: ALL_TYPE,
            optional: true,
            var_args: true,
        };

        // Object and Function refer to each other's prototypes, so the
        // function prototype of both is patched in once it exists.
        let object = native_constructor(
            &mut types,
            "Object",
            vec![optional_all()],
            None,
            None,
            vec![OBJECT_INDEX_TEMPLATE, OBJECT_ELEMENT_TEMPLATE],
            TypeId::MAX,
        );
        let function = native_constructor(
            &mut types,
            "Function",
            vec![var_args_all()],
            None,
            Some(object.instance),
            Vec::new(),
            TypeId::MAX,
        );
        for ctor in [object.ctor, function.ctor] {
            if let Some(function_type) = types[ctor].function_mut() {
                function_type.object.implicit_prototype = Some(function.prototype);
            }
        }
        let FUNCTION_PROTOTYPE = function.prototype;
        let OBJECT_TYPE = object.instance;

        let native = |types: &mut IndexVec<TypeId, Ty>,
                          name: &str,
                          params: Vec<Parameter>,
                          return_type: Option<TypeId>,
                          base: TypeId,
                          template_types: Vec<TypeId>| {
            native_constructor(
                types,
                name,
                params,
                return_type,
                Some(base),
                template_types,
                FUNCTION_PROTOTYPE,
            )
        };
        let array = native(
            &mut types,
            "Array",
            vec![var_args_all()],
            None,
            OBJECT_TYPE,
            vec![ARRAY_ELEMENT_TEMPLATE],
        );
        let boolean = native(
            &mut types,
            "Boolean",
            vec![optional_all()],
            Some(BOOLEAN_TYPE),
            OBJECT_TYPE,
            Vec::new(),
        );
        let number = native(
            &mut types,
            "Number",
            vec![optional_all()],
            Some(NUMBER_TYPE),
            OBJECT_TYPE,
            Vec::new(),
        );
        let string = native(
            &mut types,
            "String",
            vec![optional_all()],
            Some(STRING_TYPE),
            OBJECT_TYPE,
            Vec::new(),
        );
        let date = native(
            &mut types,
            "Date",
            vec![var_args_all()],
            Some(STRING_TYPE),
            OBJECT_TYPE,
            Vec::new(),
        );
        let regexp = native(
            &mut types,
            "RegExp",
            vec![optional_all(), optional_all()],
            None,
            OBJECT_TYPE,
            Vec::new(),
        );
        let error = native(
            &mut types,
            "Error",
            vec![optional_all()],
            None,
            OBJECT_TYPE,
            Vec::new(),
        );
        let type_error = native(
            &mut types,
            "TypeError",
            vec![optional_all()],
            None,
            error.instance,
            Vec::new(),
        );
        let range_error = native(
            &mut types,
            "RangeError",
            vec![optional_all()],
            None,
            error.instance,
            Vec::new(),
        );

        let mut global_this = ObjectType::new(Some(JsWord::from("global this")), Some(OBJECT_TYPE));
        global_this.is_native = true;
        let GLOBAL_THIS = types.push(Ty::new(TyKind::INSTANCE_OBJECT(global_this)));

        let common_types = CommonTypes {
            ALL_TYPE,
            NO_TYPE,
            NO_OBJECT_TYPE,
            UNKNOWN_TYPE,
            CHECKED_UNKNOWN_TYPE,
            BOOLEAN_TYPE,
            NULL_TYPE,
            NUMBER_TYPE,
            STRING_TYPE,
            VOID_TYPE,
            OBJECT_TYPE,
            OBJECT_FUNCTION_TYPE: object.ctor,
            OBJECT_PROTOTYPE: object.prototype,
            OBJECT_INDEX_TEMPLATE,
            OBJECT_ELEMENT_TEMPLATE,
            FUNCTION_INSTANCE_TYPE: function.instance,
            FUNCTION_FUNCTION_TYPE: function.ctor,
            FUNCTION_PROTOTYPE,
            ARRAY_TYPE: array.instance,
            ARRAY_FUNCTION_TYPE: array.ctor,
            ARRAY_ELEMENT_TEMPLATE,
            BOOLEAN_OBJECT_TYPE: boolean.instance,
            BOOLEAN_OBJECT_FUNCTION_TYPE: boolean.ctor,
            NUMBER_OBJECT_TYPE: number.instance,
            NUMBER_OBJECT_FUNCTION_TYPE: number.ctor,
            STRING_OBJECT_TYPE: string.instance,
            STRING_OBJECT_FUNCTION_TYPE: string.ctor,
            DATE_TYPE: date.instance,
            DATE_FUNCTION_TYPE: date.ctor,
            REGEXP_TYPE: regexp.instance,
            REGEXP_FUNCTION_TYPE: regexp.ctor,
            ERROR_TYPE: error.instance,
            ERROR_FUNCTION_TYPE: error.ctor,
            TYPE_ERROR_TYPE: type_error.instance,
            TYPE_ERROR_FUNCTION_TYPE: type_error.ctor,
            RANGE_ERROR_TYPE: range_error.instance,
            RANGE_ERROR_FUNCTION_TYPE: range_error.ctor,
            GLOBAL_THIS,
            NULL_VOID,
            NUMBER_STRING,
            NUMBER_STRING_BOOLEAN,
        };

        let mut registry = Self {
            types,
            type_map: FxHashMap::default(),
            type_names: FxHashMap::default(),
            non_nullable_type_names: FxHashSet::default(),
            unresolved_named_types: Vec::new(),
            named_proxies: FxHashMap::default(),
            unions,
            templatized_types: FxHashMap::default(),
            types_indexed_by_property: FxHashMap::default(),
            common_types,
        };
        registry.init_native_names();
        registry.init_native_properties();
        registry
    }

    fn init_native_names(&mut self) {
        let c = &self.common_types;
        let names = [
            ("boolean", c.BOOLEAN_TYPE),
            ("number", c.NUMBER_TYPE),
            ("string", c.STRING_TYPE),
            ("null", c.NULL_TYPE),
            ("Object", c.OBJECT_TYPE),
            ("Function", c.FUNCTION_INSTANCE_TYPE),
            ("Array", c.ARRAY_TYPE),
            ("Boolean", c.BOOLEAN_OBJECT_TYPE),
            ("Number", c.NUMBER_OBJECT_TYPE),
            ("String", c.STRING_OBJECT_TYPE),
            ("Date", c.DATE_TYPE),
            ("RegExp", c.REGEXP_TYPE),
            ("Error", c.ERROR_TYPE),
            ("TypeError", c.TYPE_ERROR_TYPE),
            ("RangeError", c.RANGE_ERROR_TYPE),
        ];
        for (name, ty) in names {
            self.type_names.insert(JsWord::from(name), ty);
        }
        for name in ["boolean", "number", "string", "null"] {
            self.non_nullable_type_names.insert(JsWord::from(name));
        }
    }

    fn init_native_properties(&mut self) {
        let c = &self.common_types;
        let (number, string) = (c.NUMBER_TYPE, c.STRING_TYPE);
        let string_prototype = self.prototype_of_constructor(c.STRING_OBJECT_FUNCTION_TYPE);
        let array_prototype = self.prototype_of_constructor(c.ARRAY_FUNCTION_TYPE);
        let object_prototype = c.OBJECT_PROTOTYPE;
        let to_string = self.create_function_type(Vec::new(), string);

        for (owner, name, ty) in [
            (string_prototype, "length", number),
            (array_prototype, "length", number),
            (Some(object_prototype), "toString", to_string),
        ] {
            if let Some(owner) = owner {
                self.define_declared_property(owner, &JsWord::from(name), ty, None);
            }
        }
    }

    // ---- arena ----

    pub fn ty(&self, id: TypeId) -> &Ty {
        &self.types[id]
    }

    pub(crate) fn ty_mut(&mut self, id: TypeId) -> &mut Ty {
        &mut self.types[id]
    }

    pub fn kind(&self, id: TypeId) -> &TyKind {
        self.types[id].kind()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub(crate) fn push(&mut self, kind: TyKind) -> TypeId {
        self.types.push(Ty::new(kind))
    }

    // ---- node annotations ----

    pub fn get_type(&self, node: NodeId) -> Option<TypeId> {
        self.type_map.get(&node).copied()
    }

    pub fn set_type(&mut self, node: NodeId, ty: TypeId) -> Option<TypeId> {
        self.type_map.insert(node, ty)
    }

    /// Forgets the type of a node, e.g. a name whose declared type must not
    /// be taken from its last assignment.
    pub fn clear_type(&mut self, node: NodeId) -> Option<TypeId> {
        self.type_map.remove(&node)
    }

    // ---- named types ----

    pub fn get_type_by_name(&self, name: &str) -> Option<TypeId> {
        self.type_names.get(&JsWord::from(name)).copied()
    }

    /// Declares a named type. Returns false if the name is already taken.
    pub fn declare_type(&mut self, name: &JsWord, ty: TypeId) -> bool {
        if self.type_names.contains_key(name) {
            return false;
        }
        self.type_names.insert(name.clone(), ty);
        true
    }

    pub fn overwrite_declared_type(&mut self, name: &JsWord, ty: TypeId) {
        self.type_names.insert(name.clone(), ty);
    }

    /// Marks a name whose JSDoc references are not implicitly nullable.
    pub fn set_non_nullable_name(&mut self, name: &JsWord) {
        self.non_nullable_type_names.insert(name.clone());
    }

    pub fn is_non_nullable_name(&self, name: &str) -> bool {
        self.non_nullable_type_names.contains(&JsWord::from(name))
    }

    /// A proxy for a type name that is not declared yet. Every reference to
    /// the same name shares one proxy.
    pub fn create_named_type(&mut self, name: &JsWord) -> TypeId {
        if let Some(&id) = self.named_proxies.get(name) {
            return id;
        }
        let id = self.push(TyKind::NAMED(NamedType {
            reference_name: name.clone(),
            referenced: None,
        }));
        self.unresolved_named_types.push(id);
        self.named_proxies.insert(name.clone(), id);
        id
    }

    /// Binds every named proxy to the type now declared under its name.
    /// Names that are still unknown become the unknown type.
    pub fn resolve_named_types(&mut self) {
        let pending = std::mem::take(&mut self.unresolved_named_types);
        for id in pending {
            let name = match self.kind(id) {
                TyKind::NAMED(named) if named.referenced.is_none() => named.reference_name.clone(),
                _ => continue,
            };
            let resolved = match self.type_names.get(&name).copied() {
                // A name bound to itself is still unresolved.
                Some(target) if target != id => target,
                _ => {
                    tracing::trace!(name = %name, "unresolved type name");
                    self.common_types.UNKNOWN_TYPE
                }
            };
            if let TyKind::NAMED(named) = self.ty_mut(id).kind_mut() {
                named.referenced = Some(resolved);
            }
        }
    }

    /// Follows named proxies to the type they stand for.
    pub fn resolve(&self, mut id: TypeId) -> TypeId {
        // Bounded in case of a cycle of typedef aliases.
        for _ in 0..32 {
            match self.kind(id) {
                TyKind::NAMED(NamedType {
                    referenced: Some(target),
                    ..
                }) => id = *target,
                _ => return id,
            }
        }
        self.common_types.UNKNOWN_TYPE
    }

    // ---- construction ----

    pub fn create_function_type(&mut self, params: Vec<Parameter>, return_type: TypeId) -> TypeId {
        let function = FunctionType::new(params, return_type, self.common_types.FUNCTION_PROTOTYPE);
        self.push(TyKind::FUNCTION(function))
    }

    /// Creates a constructor or interface named `name` together with its
    /// prototype object and instance type.
    pub fn create_constructor_type(
        &mut self,
        name: &JsWord,
        source: Option<NodeId>,
        params: Vec<Parameter>,
        template_types: Vec<TypeId>,
        kind: FunctionKind,
    ) -> TypeId {
        let ctor = native_constructor(
            &mut self.types,
            name,
            params,
            Some(self.common_types.VOID_TYPE),
            Some(self.common_types.OBJECT_TYPE),
            template_types,
            self.common_types.FUNCTION_PROTOTYPE,
        );
        for id in [ctor.ctor, ctor.prototype, ctor.instance] {
            if let Some(object) = self.types[id].object_mut() {
                object.is_native = false;
            }
        }
        if let Some(function) = self.types[ctor.ctor].function_mut() {
            function.kind = kind;
            function.source = source;
        }
        ctor.ctor
    }

    /// An object literal type without a name.
    pub fn create_anonymous_object_type(&mut self) -> TypeId {
        let object = ObjectType::new(None, Some(self.common_types.OBJECT_TYPE));
        self.push(TyKind::PROTOTYPE_OBJECT(object))
    }

    pub fn create_record_type(&mut self, fields: Vec<(JsWord, TypeId)>) -> TypeId {
        let mut object = ObjectType::new(None, Some(self.common_types.OBJECT_TYPE));
        for (name, ty) in fields {
            object.properties.insert(
                name,
                Property {
                    ty,
                    inferred: false,
                    node: None,
                },
            );
        }
        self.push(TyKind::RECORD(object))
    }

    /// Creates an enum whose elements have the given primitive type. Returns
    /// the enum object type; its element type is reachable through it.
    pub fn create_enum_type(&mut self, name: &JsWord, primitive_type: TypeId) -> TypeId {
        let element_type = self.push(TyKind::ENUM_ELEMENT(EnumElementType {
            name: name.clone(),
            primitive_type,
            enum_type: None,
        }));
        let object = ObjectType::new(
            Some(JsWord::from(format!("enum{{{}}}", name))),
            Some(self.common_types.OBJECT_TYPE),
        );
        let enum_type = self.push(TyKind::ENUM(EnumType {
            object,
            element_type,
        }));
        if let TyKind::ENUM_ELEMENT(element) = self.ty_mut(element_type).kind_mut() {
            element.enum_type = Some(enum_type);
        }
        enum_type
    }

    pub fn create_template_type(&mut self, name: &JsWord) -> TypeId {
        self.push(TyKind::TEMPLATE(TemplateType { name: name.clone() }))
    }

    /// `base<args>`, interned.
    pub fn create_templatized_type(&mut self, base: TypeId, args: Vec<TypeId>) -> TypeId {
        if args.is_empty() {
            return base;
        }
        let key = (base, args);
        if let Some(&id) = self.templatized_types.get(&key) {
            return id;
        }
        let id = self.push(TyKind::TEMPLATIZED(TemplatizedType {
            base: key.0,
            args: key.1.clone(),
        }));
        self.templatized_types.insert(key, id);
        id
    }

    pub(crate) fn interned_union(&self, alternates: &[TypeId]) -> Option<TypeId> {
        self.unions.get(alternates).copied()
    }

    pub(crate) fn intern_union(&mut self, alternates: Vec<TypeId>) -> TypeId {
        let id = self.push(TyKind::UNION(UnionType {
            alternates: alternates.clone(),
        }));
        self.unions.insert(alternates, id);
        id
    }

    // ---- properties ----

    /// Records that a property named `name` was assigned on a value of type
    /// `owner` whose object type could not be determined.
    pub fn register_property_on_type(&mut self, name: &JsWord, owner: TypeId) {
        self.types_indexed_by_property
            .entry(name.clone())
            .or_default()
            .insert(owner);
    }

    /// Whether a property of this name was ever registered without an owner.
    pub fn is_property_registered(&self, name: &str) -> bool {
        self.types_indexed_by_property.contains_key(&JsWord::from(name))
    }

    /// The prototype object of a constructor or interface.
    pub fn prototype_of_constructor(&self, ctor: TypeId) -> Option<TypeId> {
        self.ty(ctor).function().and_then(|f| f.prototype)
    }

    pub fn instance_of_constructor(&self, ctor: TypeId) -> Option<TypeId> {
        self.ty(ctor).function().and_then(|f| f.instance_type)
    }

    /// Makes the prototype of `ctor` inherit from `base_instance`, as
    /// `@extends` and `goog.inherits` do.
    pub fn set_prototype_based_on(&mut self, ctor: TypeId, base_instance: TypeId) {
        if let Some(prototype) = self.prototype_of_constructor(ctor) {
            self.set_implicit_prototype(prototype, base_instance);
        }
    }

    pub fn set_implicit_prototype(&mut self, object: TypeId, prototype: TypeId) {
        if object == prototype {
            return;
        }
        if let Some(object) = self.ty_mut(object).object_mut() {
            object.implicit_prototype = Some(prototype);
        }
    }
}

fn native_constructor(
    types: &mut IndexVec<TypeId, Ty>,
    name: &str,
    params: Vec<Parameter>,
    return_type: Option<TypeId>,
    prototype_base: Option<TypeId>,
    template_types: Vec<TypeId>,
    function_prototype: TypeId,
) -> NativeConstructor {
    let name = JsWord::from(name);

    let mut prototype = ObjectType::new(
        Some(JsWord::from(format!("{}.prototype", name))),
        prototype_base,
    );
    prototype.is_native = true;
    let prototype = types.push(Ty::new(TyKind::PROTOTYPE_OBJECT(prototype)));

    let mut instance = ObjectType::new(Some(name.clone()), Some(prototype));
    instance.is_native = true;
    let instance = types.push(Ty::new(TyKind::INSTANCE_OBJECT(instance)));

    let mut function = FunctionType::new(params, return_type.unwrap_or(instance), function_prototype);
    function.kind = FunctionKind::CONSTRUCTOR;
    function.object.reference_name = Some(name);
    function.object.is_native = true;
    function.instance_type = Some(instance);
    function.prototype = Some(prototype);
    function.template_types = template_types;
    function.type_of_this = Some(instance);
    let ctor = types.push(Ty::new(TyKind::FUNCTION(function)));

    for id in [prototype, instance] {
        if let Some(object) = types[id].object_mut() {
            object.constructor = Some(ctor);
        }
    }

    NativeConstructor {
        ctor,
        prototype,
        instance,
    }
}
