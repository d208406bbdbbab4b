//! Subtyping, joins and property lookup over the types of a [TypeRegistry].

use super::boolean_literal_set::BooleanLiteralSet;
use super::function_type::{FunctionType, Parameter};
use super::registry::TypeRegistry;
use super::types::{NamedType, Property, TyKind, TypeId};
use ast::{JsWord, NodeId};

/// Bound on prototype chain walks, which could otherwise loop on a
/// `Foo.prototype = new Foo()` cycle.
const MAX_CHAIN_LENGTH: usize = 64;

impl TypeRegistry {
    // ---- classification ----

    pub fn is_unknown_type(&self, ty: TypeId) -> bool {
        match self.kind(self.resolve(ty)) {
            TyKind::UNKNOWN(_) | TyKind::TEMPLATE(_) => true,
            TyKind::NAMED(NamedType {
                referenced: None, ..
            }) => true,
            _ => false,
        }
    }

    pub fn is_checked_unknown_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(self.resolve(ty)), TyKind::UNKNOWN(unknown) if unknown.isChecked)
    }

    pub fn is_all_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(self.resolve(ty)), TyKind::ALL)
    }

    /// Whether the type is the bottom of the lattice, `None` or `NoObject`.
    pub fn is_empty_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(self.resolve(ty)), TyKind::NO | TyKind::NO_OBJECT)
    }

    pub fn is_union_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(self.resolve(ty)), TyKind::UNION(_))
    }

    pub fn union_alternates(&self, ty: TypeId) -> Option<&[TypeId]> {
        match self.kind(self.resolve(ty)) {
            TyKind::UNION(union) => Some(&union.alternates),
            _ => None,
        }
    }

    pub fn is_object_type(&self, ty: TypeId) -> bool {
        self.to_object_type(ty).is_some()
    }

    pub fn is_function_type(&self, ty: TypeId) -> bool {
        self.get_function(ty).is_some()
    }

    pub fn is_constructor(&self, ty: TypeId) -> bool {
        self.get_function(ty).map_or(false, |f| f.isConstructor())
    }

    pub fn is_interface(&self, ty: TypeId) -> bool {
        self.get_function(ty).map_or(false, |f| f.isInterface())
    }

    /// Whether `ty` is the instance type of a constructor.
    pub fn is_instance_type(&self, ty: TypeId) -> bool {
        match self.kind(self.resolve(ty)) {
            TyKind::INSTANCE_OBJECT(object) => object.constructor.is_some(),
            TyKind::TEMPLATIZED(templatized) => self.is_instance_type(templatized.base),
            _ => false,
        }
    }

    pub fn is_enum_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(self.resolve(ty)), TyKind::ENUM(_))
    }

    pub fn is_record_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(self.resolve(ty)), TyKind::RECORD(_))
    }

    pub fn is_template_type(&self, ty: TypeId) -> bool {
        matches!(self.kind(self.resolve(ty)), TyKind::TEMPLATE(_))
    }

    /// Whether this is a native type such as `Object` or `Array`.
    pub fn is_native_object_type(&self, ty: TypeId) -> bool {
        self.ty(self.resolve(ty))
            .object()
            .map_or(false, |object| object.is_native)
    }

    /// An object type without a reference name, as created for object literals.
    pub fn is_anonymous_object_type(&self, ty: TypeId) -> bool {
        matches!(
            self.kind(self.resolve(ty)),
            TyKind::PROTOTYPE_OBJECT(object) if object.reference_name.is_none()
        )
    }

    pub fn get_function(&self, ty: TypeId) -> Option<&FunctionType> {
        self.ty(self.resolve(ty)).function()
    }

    /// The name of a named object type: `Foo`, `Foo.prototype`, `Array`.
    pub fn get_reference_name(&self, ty: TypeId) -> Option<&JsWord> {
        let ty = self.resolve(ty);
        match self.kind(ty) {
            TyKind::TEMPLATIZED(templatized) => self.get_reference_name(templatized.base),
            TyKind::ENUM_ELEMENT(element) => Some(&element.name),
            _ => self
                .ty(ty)
                .object()
                .and_then(|object| object.reference_name.as_ref()),
        }
    }

    // ---- subtyping ----

    /// Whether `this` is a subtype of `that`. Unknown types are both
    /// subtypes and supertypes of everything.
    pub fn is_subtype(&self, this: TypeId, that: TypeId) -> bool {
        let this = self.resolve(this);
        let that = self.resolve(that);
        if this == that {
            return true;
        }
        if self.is_unknown_type(this) || self.is_unknown_type(that) {
            return true;
        }
        let c = &self.common_types;
        match (self.kind(this), self.kind(that)) {
            (_, TyKind::ALL) => true,
            (TyKind::NO, _) => true,
            (TyKind::UNION(union), _) => union
                .alternates
                .iter()
                .all(|&alternate| self.is_subtype(alternate, that)),
            (_, TyKind::UNION(union)) => union
                .alternates
                .iter()
                .any(|&alternate| self.is_subtype(this, alternate)),
            (TyKind::NO_OBJECT, _) => self.is_object_type(that),
            (TyKind::ENUM_ELEMENT(element), _) => self.is_subtype(element.primitive_type, that),
            (TyKind::TEMPLATIZED(this_t), TyKind::TEMPLATIZED(that_t)) => {
                if this_t.base == that_t.base {
                    this_t
                        .args
                        .iter()
                        .zip(that_t.args.iter())
                        .all(|(&a, &b)| self.is_subtype(a, b))
                } else {
                    self.is_subtype(this_t.base, that_t.base)
                }
            }
            (TyKind::TEMPLATIZED(templatized), _) => self.is_subtype(templatized.base, that),
            (_, TyKind::TEMPLATIZED(templatized)) => self.is_subtype(this, templatized.base),
            (TyKind::FUNCTION(_), _) if that == c.FUNCTION_INSTANCE_TYPE => true,
            (TyKind::FUNCTION(this_f), TyKind::FUNCTION(that_f)) => {
                self.is_function_subtype(this_f, that_f)
            }
            (_, TyKind::RECORD(record)) => {
                if !self.is_object_type(this) {
                    return false;
                }
                record.properties.iter().all(|(name, property)| {
                    self.find_property(this, name)
                        .map_or(false, |found| self.is_subtype(found.ty, property.ty))
                })
            }
            (_, TyKind::INSTANCE_OBJECT(_)) | (_, TyKind::PROTOTYPE_OBJECT(_)) => {
                if !self.is_object_type(this) {
                    return false;
                }
                if self.is_interface_instance(that) {
                    return self.implements_interface(this, that);
                }
                self.is_in_prototype_chain(this, that)
            }
            _ => false,
        }
    }

    fn is_function_subtype(&self, this: &FunctionType, that: &FunctionType) -> bool {
        if this.hasInstanceType() || that.hasInstanceType() {
            // Constructors are nominal.
            return this.instance_type == that.instance_type && this.instance_type.is_some();
        }
        for (index, that_param) in that.params.iter().enumerate() {
            if let Some(this_param) = this.param_for_argument(index) {
                if !self.is_subtype(that_param.ty, this_param.ty) {
                    return false;
                }
            }
        }
        self.is_subtype(this.return_type, that.return_type)
    }

    /// Whether `ancestor` is `object` or on its implicit prototype chain.
    fn is_in_prototype_chain(&self, object: TypeId, ancestor: TypeId) -> bool {
        let mut current = Some(self.resolve(object));
        for _ in 0..MAX_CHAIN_LENGTH {
            let id = match current {
                Some(id) => id,
                None => return false,
            };
            if id == ancestor {
                return true;
            }
            current = match self.kind(id) {
                TyKind::TEMPLATIZED(templatized) => Some(templatized.base),
                _ => self
                    .ty(id)
                    .object()
                    .and_then(|object| object.implicit_prototype),
            };
        }
        false
    }

    fn is_interface_instance(&self, ty: TypeId) -> bool {
        match self.kind(ty) {
            TyKind::INSTANCE_OBJECT(object) => object
                .constructor
                .map_or(false, |ctor| self.is_interface(ctor)),
            _ => false,
        }
    }

    fn implements_interface(&self, object: TypeId, interface_instance: TypeId) -> bool {
        let mut current = Some(self.resolve(object));
        for _ in 0..MAX_CHAIN_LENGTH {
            let id = match current {
                Some(id) => id,
                None => return false,
            };
            if id == interface_instance {
                return true;
            }
            let object = match self.ty(id).object() {
                Some(object) => object,
                None => return false,
            };
            if let Some(ctor) = object.constructor.and_then(|ctor| self.get_function(ctor)) {
                if ctor.implemented_interfaces.iter().any(|&implemented| {
                    implemented == interface_instance
                        || self.is_in_prototype_chain(implemented, interface_instance)
                }) {
                    return true;
                }
            }
            current = object.implicit_prototype;
        }
        false
    }

    /// Whether both types are subtypes of each other, ignoring the leniency
    /// of unknown types.
    pub fn is_equivalent(&self, a: TypeId, b: TypeId) -> bool {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if a == b {
            return true;
        }
        if self.is_unknown_type(a) || self.is_unknown_type(b) {
            return self.is_unknown_type(a)
                && self.is_unknown_type(b)
                && self.is_checked_unknown_type(a) == self.is_checked_unknown_type(b)
                && !self.is_template_type(a)
                && !self.is_template_type(b);
        }
        self.is_subtype(a, b) && self.is_subtype(b, a)
    }

    // ---- unions ----

    pub fn get_least_supertype(&mut self, a: TypeId, b: TypeId) -> TypeId {
        if a == b {
            return a;
        }
        self.create_union(&[a, b])
    }

    /// Creates the union of `types`, flattening nested unions and dropping
    /// alternates that are subtypes of other alternates.
    pub fn create_union(&mut self, types: &[TypeId]) -> TypeId {
        let mut flat = Vec::with_capacity(types.len());
        for &ty in types {
            let ty = self.resolve(ty);
            match self.kind(ty) {
                TyKind::UNION(union) => flat.extend(union.alternates.iter().copied()),
                _ => flat.push(ty),
            }
        }

        let mut unknown = None;
        let mut alternates: Vec<TypeId> = Vec::with_capacity(flat.len());
        for ty in flat {
            match self.kind(ty) {
                TyKind::ALL => return ty,
                TyKind::UNKNOWN(u) => {
                    if unknown.is_none() || u.isChecked {
                        unknown = Some(ty);
                    }
                }
                TyKind::NO => {}
                _ => self.add_alternate(&mut alternates, ty),
            }
        }
        if let Some(unknown) = unknown {
            return unknown;
        }
        match alternates.len() {
            0 => self.common_types.NO_TYPE,
            1 => alternates[0],
            _ => {
                alternates.sort();
                match self.interned_union(&alternates) {
                    Some(id) => id,
                    None => self.intern_union(alternates),
                }
            }
        }
    }

    fn add_alternate(&self, alternates: &mut Vec<TypeId>, ty: TypeId) {
        if alternates.contains(&ty) {
            return;
        }
        let absorbable = self.is_absorbable(ty);
        if absorbable
            && alternates
                .iter()
                .any(|&existing| self.is_absorbable(existing) && self.is_subtype(ty, existing))
        {
            return;
        }
        if absorbable {
            alternates
                .retain(|&existing| !(self.is_absorbable(existing) && self.is_subtype(existing, ty)));
        }
        alternates.push(ty);
    }

    /// Unresolved names and template types stand for an unknown type and
    /// must survive in unions until they are bound.
    fn is_absorbable(&self, ty: TypeId) -> bool {
        !self.is_unknown_type(ty)
    }

    /// The most specific type that is a subtype of both inputs.
    pub fn get_greatest_subtype(&mut self, a: TypeId, b: TypeId) -> TypeId {
        let a = self.resolve(a);
        let b = self.resolve(b);
        if a == b || self.is_equivalent(a, b) {
            return a;
        }
        if self.is_unknown_type(a) || self.is_unknown_type(b) {
            return self.common_types.UNKNOWN_TYPE;
        }
        if let Some(alternates) = self.union_alternates(a).map(<[TypeId]>::to_vec) {
            let parts: Vec<TypeId> = alternates
                .into_iter()
                .map(|alternate| self.get_greatest_subtype(alternate, b))
                .collect();
            return self.create_union(&parts);
        }
        if let Some(alternates) = self.union_alternates(b).map(<[TypeId]>::to_vec) {
            let parts: Vec<TypeId> = alternates
                .into_iter()
                .map(|alternate| self.get_greatest_subtype(a, alternate))
                .collect();
            return self.create_union(&parts);
        }
        if self.is_subtype(a, b) {
            a
        } else if self.is_subtype(b, a) {
            b
        } else if self.is_object_type(a) && self.is_object_type(b) {
            self.common_types.NO_OBJECT_TYPE
        } else {
            self.common_types.NO_TYPE
        }
    }

    /// Removes `null` and `undefined` from a type.
    pub fn restrict_by_not_null_or_undefined(&mut self, ty: TypeId) -> TypeId {
        let ty = self.resolve(ty);
        let c = &self.common_types;
        let (null, void, no) = (c.NULL_TYPE, c.VOID_TYPE, c.NO_TYPE);
        match self.kind(ty) {
            TyKind::NULL | TyKind::VOID => no,
            TyKind::UNION(union) => {
                let restricted: Vec<TypeId> = union
                    .alternates
                    .iter()
                    .copied()
                    .filter(|&alternate| alternate != null && alternate != void)
                    .collect();
                if restricted.len() == union.alternates.len() {
                    ty
                } else {
                    self.create_union(&restricted)
                }
            }
            _ => ty,
        }
    }

    // ---- boolean outcomes ----

    /// The values `!!v` may take for a value `v` of this type.
    pub fn get_possible_to_boolean_outcomes(&self, ty: TypeId) -> BooleanLiteralSet {
        let ty = self.resolve(ty);
        match self.kind(ty) {
            TyKind::NULL | TyKind::VOID => BooleanLiteralSet::FALSE,
            TyKind::BOOLEAN | TyKind::NUMBER | TyKind::STRING => BooleanLiteralSet::BOTH,
            TyKind::ENUM_ELEMENT(element) => {
                self.get_possible_to_boolean_outcomes(element.primitive_type)
            }
            TyKind::UNION(union) => union
                .alternates
                .iter()
                .fold(BooleanLiteralSet::EMPTY, |acc, &alternate| {
                    acc.union(self.get_possible_to_boolean_outcomes(alternate))
                }),
            TyKind::NO => BooleanLiteralSet::EMPTY,
            TyKind::INSTANCE_OBJECT(_)
            | TyKind::PROTOTYPE_OBJECT(_)
            | TyKind::RECORD(_)
            | TyKind::ENUM(_)
            | TyKind::FUNCTION(_)
            | TyKind::TEMPLATIZED(_)
            | TyKind::NO_OBJECT => BooleanLiteralSet::TRUE,
            TyKind::ALL | TyKind::UNKNOWN(_) | TyKind::TEMPLATE(_) | TyKind::NAMED(_) => {
                BooleanLiteralSet::BOTH
            }
        }
    }

    /// The subset of this type whose values convert to `outcome`.
    pub fn get_restricted_type_given_to_boolean_outcome(
        &mut self,
        ty: TypeId,
        outcome: bool,
    ) -> TypeId {
        let ty = self.resolve(ty);
        if self.is_unknown_type(ty) || self.is_all_type(ty) {
            return ty;
        }
        if let Some(alternates) = self.union_alternates(ty).map(<[TypeId]>::to_vec) {
            let restricted: Vec<TypeId> = alternates
                .into_iter()
                .map(|alternate| self.get_restricted_type_given_to_boolean_outcome(alternate, outcome))
                .collect();
            return self.create_union(&restricted);
        }
        if self.get_possible_to_boolean_outcomes(ty).contains(outcome) {
            ty
        } else {
            self.common_types.NO_TYPE
        }
    }

    // ---- objects and properties ----

    /// The object type of `ty` if it is one, looking through named proxies.
    pub fn to_object_type(&self, ty: TypeId) -> Option<TypeId> {
        let ty = self.resolve(ty);
        match self.kind(ty) {
            TyKind::INSTANCE_OBJECT(_)
            | TyKind::PROTOTYPE_OBJECT(_)
            | TyKind::RECORD(_)
            | TyKind::ENUM(_)
            | TyKind::FUNCTION(_)
            | TyKind::TEMPLATIZED(_)
            | TyKind::NO_OBJECT => Some(ty),
            _ => None,
        }
    }

    /// The wrapper object type of a primitive, or the type itself.
    pub fn autobox(&self, ty: TypeId) -> TypeId {
        let ty = self.resolve(ty);
        let c = &self.common_types;
        match self.kind(ty) {
            TyKind::NUMBER => c.NUMBER_OBJECT_TYPE,
            TyKind::STRING => c.STRING_OBJECT_TYPE,
            TyKind::BOOLEAN => c.BOOLEAN_OBJECT_TYPE,
            TyKind::ENUM_ELEMENT(element) => self.autobox(element.primitive_type),
            _ => ty,
        }
    }

    /// The object type a property access on a value of this type reads from.
    pub fn dereference(&mut self, ty: TypeId) -> Option<TypeId> {
        let restricted = self.restrict_by_not_null_or_undefined(ty);
        let boxed = self.autobox(restricted);
        self.to_object_type(boxed)
    }

    /// The type whose property map holds the properties of `ty`.
    fn property_owner(&self, ty: TypeId) -> Option<TypeId> {
        let ty = self.resolve(ty);
        match self.kind(ty) {
            TyKind::TEMPLATIZED(templatized) => self.property_owner(templatized.base),
            _ => self.ty(ty).object().map(|_| ty),
        }
    }

    fn find_own_property(&self, owner: TypeId, name: &str) -> Option<Property> {
        let ty = self.ty(owner);
        if name == "prototype" {
            if let Some(prototype) = ty.function().and_then(|f| f.prototype) {
                return Some(Property {
                    ty: prototype,
                    inferred: false,
                    node: None,
                });
            }
        }
        ty.object()
            .and_then(|object| object.own_property(name))
            .cloned()
    }

    /// Looks up a property on an object type and its prototype chain.
    pub fn find_property(&self, ty: TypeId, name: &str) -> Option<Property> {
        let mut current = self.property_owner(ty);
        for _ in 0..MAX_CHAIN_LENGTH {
            let owner = current?;
            if let Some(property) = self.find_own_property(owner, name) {
                return Some(property);
            }
            current = self
                .ty(owner)
                .object()
                .and_then(|object| object.implicit_prototype)
                .and_then(|prototype| self.property_owner(prototype));
        }
        None
    }

    pub fn has_property(&self, ty: TypeId, name: &str) -> bool {
        self.find_property(ty, name).is_some()
    }

    pub fn has_own_property(&self, ty: TypeId, name: &str) -> bool {
        self.property_owner(ty)
            .map_or(false, |owner| self.find_own_property(owner, name).is_some())
    }

    pub fn is_property_type_declared(&self, ty: TypeId, name: &str) -> bool {
        self.find_property(ty, name)
            .map_or(false, |property| !property.inferred)
    }

    pub fn is_property_type_inferred(&self, ty: TypeId, name: &str) -> bool {
        self.find_property(ty, name)
            .map_or(false, |property| property.inferred)
    }

    /// The type of a property of an object type, unknown when absent.
    pub fn get_property_type(&mut self, ty: TypeId, name: &str) -> TypeId {
        self.find_property_type(ty, name)
            .unwrap_or(self.common_types.UNKNOWN_TYPE)
    }

    /// The type of property `name` on a value of type `ty`, if the property
    /// is known. Primitives are looked up on their wrapper types, unions join
    /// the property over every alternate and generic instances substitute
    /// their type arguments.
    pub fn find_property_type(&mut self, ty: TypeId, name: &str) -> Option<TypeId> {
        let ty = self.resolve(ty);
        let boxed = self.autobox(ty);
        if boxed != ty {
            return self.find_property_type(boxed, name);
        }
        if let Some(alternates) = self.union_alternates(ty).map(<[TypeId]>::to_vec) {
            let found: Vec<TypeId> = alternates
                .into_iter()
                .filter_map(|alternate| self.find_property_type(alternate, name))
                .collect();
            if found.is_empty() {
                return None;
            }
            return Some(self.create_union(&found));
        }
        match self.kind(ty) {
            TyKind::UNKNOWN(_) | TyKind::TEMPLATE(_) => Some(ty),
            TyKind::NAMED(_) => Some(self.common_types.UNKNOWN_TYPE),
            TyKind::TEMPLATIZED(templatized) => {
                let (base, args) = (templatized.base, templatized.args.clone());
                let property = self.find_property(base, name)?;
                let map = self.template_type_map(base, &args);
                Some(self.substitute_templates(property.ty, &map, false))
            }
            _ => self.find_property(ty, name).map(|property| property.ty),
        }
    }

    pub fn define_declared_property(
        &mut self,
        owner: TypeId,
        name: &JsWord,
        ty: TypeId,
        node: Option<NodeId>,
    ) -> bool {
        self.define_property(owner, name, ty, false, node)
    }

    /// Defines an inferred property, joining with a previously inferred
    /// type. Declared properties are left untouched.
    pub fn define_inferred_property(
        &mut self,
        owner: TypeId,
        name: &JsWord,
        ty: TypeId,
        node: Option<NodeId>,
    ) -> bool {
        let mut ty = ty;
        if let Some(existing) = self.find_property(owner, name) {
            if !existing.inferred {
                // Already declared.
                return true;
            }
            ty = self.get_least_supertype(existing.ty, ty);
        }
        self.define_property(owner, name, ty, true, node)
    }

    fn define_property(
        &mut self,
        owner: TypeId,
        name: &JsWord,
        ty: TypeId,
        inferred: bool,
        node: Option<NodeId>,
    ) -> bool {
        let owner = match self.property_owner(owner) {
            Some(owner) => owner,
            None => return false,
        };
        if &**name == "prototype" && self.get_function(owner).map_or(false, |f| f.prototype.is_some())
        {
            return self.define_prototype(owner, ty);
        }
        let object = match self.ty_mut(owner).object_mut() {
            Some(object) => object,
            None => return false,
        };
        if let Some(existing) = object.properties.get(name) {
            if !existing.inferred {
                return false;
            }
        }
        object.properties.insert(
            name.clone(),
            Property {
                ty,
                inferred,
                node,
            },
        );
        true
    }

    /// `Foo.prototype = value`: an object literal contributes its properties
    /// to the existing prototype, any other object becomes its parent.
    fn define_prototype(&mut self, ctor: TypeId, value: TypeId) -> bool {
        let prototype = match self.prototype_of_constructor(ctor) {
            Some(prototype) => prototype,
            None => return false,
        };
        let value = self.resolve(value);
        if value == prototype {
            return true;
        }
        if self.is_anonymous_object_type(value) {
            let properties: Vec<(JsWord, Property)> = self
                .ty(value)
                .object()
                .map(|object| {
                    object
                        .properties
                        .iter()
                        .map(|(name, property)| (name.clone(), property.clone()))
                        .collect()
                })
                .unwrap_or_default();
            for (name, property) in properties {
                self.define_property(prototype, &name, property.ty, property.inferred, property.node);
            }
            return true;
        }
        match self.to_object_type(value) {
            Some(base) => {
                self.set_implicit_prototype(prototype, base);
                true
            }
            None => false,
        }
    }

    // ---- templates and functions ----

    /// The value type of an indexed collection: `T` of `Array<T>`, `V` of
    /// `Object<K,V>`.
    pub fn get_template_element_type(&self, ty: TypeId) -> TypeId {
        let ty = self.resolve(ty);
        let c = &self.common_types;
        match self.kind(ty) {
            TyKind::TEMPLATIZED(templatized) if templatized.base == c.ARRAY_TYPE => {
                templatized.args[0]
            }
            TyKind::TEMPLATIZED(templatized) if templatized.base == c.OBJECT_TYPE => {
                match templatized.args.as_slice() {
                    [value] | [_, value] => *value,
                    _ => c.UNKNOWN_TYPE,
                }
            }
            _ => c.UNKNOWN_TYPE,
        }
    }

    /// The key type of `Object<K,V>`.
    pub fn get_index_type(&self, ty: TypeId) -> Option<TypeId> {
        let ty = self.restricted_object(ty)?;
        match self.kind(ty) {
            TyKind::TEMPLATIZED(templatized)
                if templatized.base == self.common_types.OBJECT_TYPE && templatized.args.len() == 2 =>
            {
                Some(templatized.args[0])
            }
            _ => None,
        }
    }

    fn restricted_object(&self, ty: TypeId) -> Option<TypeId> {
        let ty = self.resolve(ty);
        let c = &self.common_types;
        match self.kind(ty) {
            TyKind::UNION(union) => {
                let mut objects = union
                    .alternates
                    .iter()
                    .copied()
                    .filter(|&alternate| alternate != c.NULL_TYPE && alternate != c.VOID_TYPE);
                let first = objects.next()?;
                if objects.next().is_some() {
                    None
                } else {
                    Some(self.resolve(first))
                }
            }
            _ => Some(ty),
        }
    }

    /// Maps the template types of a generic instance type's constructor to
    /// the given arguments.
    pub fn template_type_map(
        &self,
        base: TypeId,
        args: &[TypeId],
    ) -> rustc_hash::FxHashMap<TypeId, TypeId> {
        let templates = self
            .ty(self.resolve(base))
            .object()
            .and_then(|object| object.constructor)
            .and_then(|ctor| self.get_function(ctor))
            .map(|f| f.template_types.clone())
            .unwrap_or_default();
        templates.into_iter().zip(args.iter().copied()).collect()
    }

    /// The type of `f.bind(obj, a1, ..., an)` where `args_to_bind` is `n + 1`.
    pub fn get_bind_return_type(&mut self, function: TypeId, args_to_bind: usize) -> TypeId {
        let function = match self.get_function(function) {
            Some(function) => function.clone(),
            None => return self.common_types.UNKNOWN_TYPE,
        };
        let mut params: Vec<Parameter> = function.params.clone();
        let mut to_remove = args_to_bind.saturating_sub(1);
        while to_remove > 0 && !params.is_empty() {
            if params[0].var_args {
                break;
            }
            params.remove(0);
            to_remove -= 1;
        }
        let bound = self.create_function_type(params, function.return_type);
        if let Some(bound_function) = self.ty_mut(bound).function_mut() {
            bound_function.template_types = function.template_types;
            bound_function.inferred_return_type = function.inferred_return_type;
        }
        bound
    }

    /// Makes an anonymous object passed where a record is expected acquire
    /// the record's properties as inferred properties.
    pub fn match_constraint(&mut self, value: TypeId, constraint: TypeId) {
        let value = self.resolve(value);
        let constraint = self.resolve(constraint);
        if self.is_unknown_type(value) || self.is_unknown_type(constraint) {
            return;
        }
        if let Some(alternates) = self.union_alternates(constraint).map(<[TypeId]>::to_vec) {
            for alternate in alternates {
                if self.is_record_type(alternate) {
                    self.match_constraint(value, alternate);
                }
            }
            return;
        }
        if let Some(alternates) = self.union_alternates(value).map(<[TypeId]>::to_vec) {
            for alternate in alternates {
                self.match_constraint(alternate, constraint);
            }
            return;
        }
        if !self.is_record_type(constraint) || !self.is_anonymous_object_type(value) {
            return;
        }
        let fields: Vec<(JsWord, TypeId)> = self
            .ty(constraint)
            .object()
            .map(|record| {
                record
                    .properties
                    .iter()
                    .map(|(name, property)| (name.clone(), property.ty))
                    .collect()
            })
            .unwrap_or_default();
        let void = self.common_types.VOID_TYPE;
        for (name, field_type) in fields {
            if self.is_property_type_declared(value, &name) {
                continue;
            }
            let inferred = if self.has_property(value, &name) {
                field_type
            } else {
                self.get_least_supertype(void, field_type)
            };
            self.define_inferred_property(value, &name, inferred, None);
        }
    }
}
