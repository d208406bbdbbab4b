use crate::ctx::Ctx;
use crate::diagnostics::{
    CONSTRUCTOR_EXPECTED, CTOR_INITIALIZER, DUP_VAR_DECLARATION, ENUM_INITIALIZER,
    ENUM_NOT_CONSTANT, IFACE_INITIALIZER, LENDS_ON_NON_OBJECT, MALFORMED_TYPEDEF,
    MULTIPLE_VAR_DEF, UNKNOWN_LENDS,
};
use crate::first_order_function_analyzer::FirstOrderFunctionAnalyzer;
use crate::coding_convention::singleton_getter_type;
use crate::function_type_builder::FunctionTypeBuilder;
use crate::typed_scope::{ScopeId, TypedScope};
use crate::typed_var::TypedVarId;
use crate::typing::{Parameter, TyKind, TypeId, TypeRegistry};
use ast::{node_util, Ast, JSDocInfo, JsWord, NodeId, Token, TypeExpr};

#[cfg(test)]
#[allow(non_snake_case)]
mod tests;

/**
 * Creates the typed scopes of a program. The global scope declares the
 * native constructors, every global name and every qualified name whose type
 * is known before inference; function scopes declare parameters, locals and
 * the function's own name when it bleeds into its body.
 *
 * Scopes are memoized by root node, so asking twice for the same function is
 * free.
 */
#[derive(Default)]
pub struct TypedScopeCreator;

impl TypedScopeCreator {
    pub fn new() -> Self {
        Self
    }

    /**
     * Creates a scope with all types declared. Declares newly discovered types
     * and type properties in the type registry.
     */
    pub fn createScope(&mut self, ctx: &mut Ctx, root: NodeId, parent: Option<ScopeId>) -> ScopeId {
        match ctx.scope_for_root(root) {
            Some(scope) => scope,
            None => self.createScopeInternal(ctx, root, parent),
        }
    }

    fn createScopeInternal(
        &mut self,
        ctx: &mut Ctx,
        root: NodeId,
        parent: Option<ScopeId>,
    ) -> ScopeId {
        let _span = tracing::debug_span!("create_scope", root = ?root).entered();
        let scope = match parent {
            None => self.createInitialScope(ctx, root),
            Some(parent) => {
                let id = ctx.scopes.next_index();
                let child = TypedScope::createChildScope(id, &ctx.scopes[parent], root);
                let scope = ctx.push_scope(root, |_| child);
                let registry = &ctx.type_registry;
                let typeOfThis = match ctx.type_registry.get_type(root) {
                    Some(fnType) if registry.is_function_type(fnType) => registry
                        .get_function(fnType)
                        .and_then(|function| function.type_of_this)
                        .unwrap_or(registry.common_types.UNKNOWN_TYPE),
                    _ => ctx.getTypeOfThis(parent),
                };
                ctx.scopes[scope].setTypeOfThis(typeOfThis);
                scope
            }
        };

        let mut builder = ScopeBuilder::new(ctx, scope, parent.is_none());
        builder.build();
        builder.resolveStubDeclarations();
        builder.resolveTypes();
        if parent.is_none() {
            builder.collectPropertiesOfFunctions();
        }

        tracing::debug!(vars = ctx.scopes[scope].getVarCount(), "created typed scope");
        scope
    }

    /// The global scope: analyzes all functions once, then declares the
    /// native constructors and `undefined`.
    fn createInitialScope(&mut self, ctx: &mut Ctx, root: NodeId) -> ScopeId {
        let analyzer = FirstOrderFunctionAnalyzer::new(ctx.ast, ctx.options.record_escaped_vars);
        ctx.function_analysis = Some(analyzer.process(root));

        mark_enums_and_typedefs_non_nullable(ctx, root);

        let c = ctx.type_registry.common_types;
        ctx.type_registry.set_type(root, c.GLOBAL_THIS);
        let scope = ctx.push_scope(root, |id| {
            TypedScope::createGlobalScope(id, root, c.GLOBAL_THIS)
        });

        for ctor in [
            c.ARRAY_FUNCTION_TYPE,
            c.BOOLEAN_OBJECT_FUNCTION_TYPE,
            c.DATE_FUNCTION_TYPE,
            c.ERROR_FUNCTION_TYPE,
            c.FUNCTION_FUNCTION_TYPE,
            c.NUMBER_OBJECT_FUNCTION_TYPE,
            c.OBJECT_FUNCTION_TYPE,
            c.RANGE_ERROR_FUNCTION_TYPE,
            c.REGEXP_FUNCTION_TYPE,
            c.STRING_OBJECT_FUNCTION_TYPE,
            c.TYPE_ERROR_FUNCTION_TYPE,
        ] {
            declare_native_function_type(ctx, scope, ctor);
        }
        ctx.declare(scope, &JsWord::from("undefined"), None, Some(c.VOID_TYPE), false);
        scope
    }
}

/// Declares a native constructor and its prototype, e.g. `Array` and
/// `Array.prototype`.
fn declare_native_function_type(ctx: &mut Ctx, scope: ScopeId, ctor: TypeId) {
    let registry = &ctx.type_registry;
    let name = match registry.get_function(ctor).and_then(|f| f.reference_name()) {
        Some(name) => name.clone(),
        None => return,
    };
    let prototype = registry.prototype_of_constructor(ctor);
    ctx.declare(scope, &name, None, Some(ctor), false);
    if let Some(prototype) = prototype {
        let prototypeName = JsWord::from(format!("{}.prototype", name));
        ctx.declare(scope, &prototypeName, None, Some(prototype), false);
    }
}

/// Enum and typedef names are non-nullable wherever they are referenced, even
/// before their declaration is reached.
fn mark_enums_and_typedefs_non_nullable(ctx: &mut Ctx, root: NodeId) {
    let ast = ctx.ast;
    let mut names = Vec::new();
    node_util::pre_order(ast, root, &mut |n| {
        match ast.token(n) {
            Token::Var => {
                for &child in ast.children(n) {
                    identify_enum_or_typedef(ast, child, node_util::get_best_jsdoc(ast, child), &mut names);
                }
            }
            Token::ExprResult => {
                if let Some(first) = ast.first_child(n) {
                    if ast.is(first, Token::Assign) {
                        if let Some(lhs) = ast.first_child(first) {
                            identify_enum_or_typedef(ast, lhs, ast.jsdoc(first), &mut names);
                        }
                    } else {
                        identify_enum_or_typedef(ast, first, ast.jsdoc(first), &mut names);
                    }
                }
            }
            _ => {}
        }
        true
    });
    for name in names {
        ctx.type_registry.set_non_nullable_name(&name);
    }
}

fn identify_enum_or_typedef(
    ast: &Ast,
    nameNode: NodeId,
    info: Option<&JSDocInfo>,
    names: &mut Vec<JsWord>,
) {
    let info = match info {
        Some(info) if info.has_enum_parameter_type() || info.has_typedef_type() => info,
        _ => return,
    };
    if let Some(name) = node_util::get_qualified_name(ast, nameNode) {
        tracing::trace!(name = &*name, typedef = info.has_typedef_type(), "non-nullable name");
        names.push(name);
    }
}

/// The value a declared name is initialized with.
fn initial_value(ast: &Ast, nameNode: NodeId) -> Option<NodeId> {
    if node_util::is_object_lit_key(ast, nameNode) {
        ast.first_child(nameNode)
    } else {
        node_util::get_rvalue_of_lvalue(ast, nameNode)
    }
}

/// The constructor of an instance or prototype object.
fn constructor_of(registry: &TypeRegistry, object: TypeId) -> Option<TypeId> {
    registry.ty(registry.resolve(object)).object()?.constructor
}

/// The constructor whose `prototype` this object is.
fn prototype_owner_function(registry: &TypeRegistry, ty: TypeId) -> Option<TypeId> {
    let ty = registry.resolve(ty);
    match registry.kind(ty) {
        TyKind::PROTOTYPE_OBJECT(object) => {
            let ctor = object.constructor?;
            (registry.prototype_of_constructor(ctor) == Some(ty)).then_some(ctor)
        }
        _ => None,
    }
}

fn enum_element_type(registry: &TypeRegistry, ty: TypeId) -> Option<TypeId> {
    match registry.kind(registry.resolve(ty)) {
        TyKind::ENUM(enumType) => Some(enumType.element_type),
        _ => None,
    }
}

/// A `a.b;` statement naming a property whose type could not be determined
/// when it was reached.
struct StubDeclaration {
    node: NodeId,
    isExtern: bool,
    ownerName: JsWord,
}

struct ScopeBuilder<'c, 'ast> {
    ctx: &'c mut Ctx<'ast>,
    scope: ScopeId,
    isGlobal: bool,
    /// Template names visible to type expressions in this scope.
    templateScope: Vec<(JsWord, TypeId)>,
    /// Nodes whose types may still be named proxies; resolved once the scope
    /// is complete.
    deferredSetTypes: Vec<(NodeId, TypeId)>,
    nonExternFunctions: Vec<NodeId>,
    stubDeclarations: Vec<StubDeclaration>,
    /// `@lends` object literals, defined at the end of their statement.
    lentObjectLiterals: Vec<NodeId>,
}

impl<'c, 'ast> ScopeBuilder<'c, 'ast> {
    fn new(ctx: &'c mut Ctx<'ast>, scope: ScopeId, isGlobal: bool) -> Self {
        let root = ctx.scopes[scope].getRootNode();
        let registry = &ctx.type_registry;
        let templateScope = registry
            .get_type(root)
            .and_then(|fnType| registry.get_function(fnType))
            .map(|function| {
                function
                    .template_types
                    .iter()
                    .filter_map(|&template| match registry.kind(template) {
                        TyKind::TEMPLATE(t) => Some((t.name.clone(), template)),
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default();
        Self {
            ctx,
            scope,
            isGlobal,
            templateScope,
            deferredSetTypes: Vec::new(),
            nonExternFunctions: Vec::new(),
            stubDeclarations: Vec::new(),
            lentObjectLiterals: Vec::new(),
        }
    }

    fn root(&self) -> NodeId {
        self.ctx.scopes[self.scope].getRootNode()
    }

    fn build(&mut self) {
        let root = self.root();
        self.traverse(root, None);
        if !self.isGlobal {
            self.markEscapedAndAssignedOnceVars(root);
        }
    }

    fn traverse(&mut self, n: NodeId, parent: Option<NodeId>) {
        if !self.shouldTraverse(n, parent) {
            return;
        }
        let ast = self.ctx.ast;
        for &child in ast.children(n) {
            self.traverse(child, Some(n));
        }
        self.visit(n, parent);
    }

    /// Stays out of nested function bodies, which get scopes of their own.
    /// Hoisted function declarations are defined when their block is entered.
    fn shouldTraverse(&mut self, n: NodeId, parent: Option<NodeId>) -> bool {
        let ast = self.ctx.ast;
        let descend = match parent {
            None => true,
            Some(parent) => {
                !ast.is(parent, Token::Function)
                    || ast.first_child(parent) == Some(n)
                    || parent == self.root()
            }
        };
        if descend && node_util::is_statement_parent(ast, n) {
            for &child in ast.children(n) {
                if node_util::is_hoisted_function_declaration(ast, child) {
                    self.defineFunctionLiteral(child);
                }
            }
        }
        descend
    }

    fn visit(&mut self, n: NodeId, parent: Option<NodeId>) {
        let ast = self.ctx.ast;
        if !self.isGlobal {
            let root = self.root();
            if n == root {
                return;
            }
            if ast.is(n, Token::ParamList) && parent == Some(root) {
                self.handleFunctionInputs(root);
                return;
            }
        }

        self.attachLiteralTypes(n);

        match ast.token(n) {
            Token::Call => self.checkForClassDefiningCalls(n),
            Token::Function => {
                if !ast.is_from_externs(n) {
                    self.nonExternFunctions.push(n);
                }
                // Hoisted declarations were defined on entering their block.
                if !node_util::is_hoisted_function_declaration(ast, n) {
                    self.defineFunctionLiteral(n);
                }
            }
            Token::Assign => {
                if let (Some(lhs), Some(rhs)) = (ast.first_child(n), ast.second_child(n)) {
                    if ast.is(lhs, Token::GetProp) && node_util::is_qualified_name(ast, lhs) {
                        self.maybeDeclareQualifiedName(ast.jsdoc(n), lhs, n, Some(rhs));
                    }
                }
            }
            Token::Catch => self.defineCatch(n),
            Token::Var => {
                self.defineVar(n);
                if self.isGlobal && ast.child_count(n) == 1 {
                    if let Some(name) = ast.first_child(n) {
                        self.checkForTypedef(name, ast.jsdoc(n));
                    }
                }
            }
            Token::GetProp => {
                if let Some(parent) = parent {
                    if ast.is(parent, Token::ExprResult) && node_util::is_qualified_name(ast, n) {
                        self.maybeDeclareQualifiedName(ast.jsdoc(n), n, parent, None);
                    }
                }
            }
            _ => {}
        }

        if parent.is_some()
            && node_util::is_statement(ast, n)
            && !self.lentObjectLiterals.is_empty()
        {
            for objectLit in std::mem::take(&mut self.lentObjectLiterals) {
                self.defineObjectLiteral(objectLit);
            }
        }
    }

    fn attachLiteralTypes(&mut self, n: NodeId) {
        let ast = self.ctx.ast;
        let c = self.ctx.type_registry.common_types;
        let ty = match ast.token(n) {
            Token::Null => c.NULL_TYPE,
            Token::Void => c.VOID_TYPE,
            Token::String => c.STRING_TYPE,
            Token::Number => c.NUMBER_TYPE,
            Token::True | Token::False => c.BOOLEAN_TYPE,
            Token::Regexp => c.REGEXP_TYPE,
            Token::ObjectLit => {
                if ast.jsdoc(n).and_then(JSDocInfo::get_lends_name).is_some() {
                    self.lentObjectLiterals.push(n);
                } else {
                    self.defineObjectLiteral(n);
                }
                return;
            }
            _ => return,
        };
        self.ctx.type_registry.set_type(n, ty);
    }

    fn setDeferredType(&mut self, n: NodeId, ty: TypeId) {
        self.ctx.type_registry.set_type(n, ty);
        self.deferredSetTypes.push((n, ty));
    }

    fn evaluate(&mut self, expr: &TypeExpr) -> TypeId {
        self.ctx
            .type_registry
            .evaluate_type_expression(expr, &self.templateScope)
    }

    fn defineObjectLiteral(&mut self, objectLit: NodeId) {
        let ast = self.ctx.ast;
        let mut ty = None;

        if let Some(lendsName) = ast.jsdoc(objectLit).and_then(JSDocInfo::get_lends_name) {
            match self.ctx.getVar(self.scope, lendsName) {
                None => self.ctx.report(objectLit, UNKNOWN_LENDS, &[&**lendsName]),
                Some(lendsVar) => {
                    let registry = &self.ctx.type_registry;
                    let lendsType = self.ctx.vars[lendsVar]
                        .getType()
                        .unwrap_or(registry.common_types.UNKNOWN_TYPE);
                    if registry.is_subtype(lendsType, registry.common_types.OBJECT_TYPE) {
                        ty = Some(lendsType);
                    } else {
                        let lendsTypeName = registry.type_to_string(lendsType);
                        self.ctx.report(
                            objectLit,
                            LENDS_ON_NON_OBJECT,
                            &[&**lendsName, lendsTypeName.as_str()],
                        );
                    }
                }
            }
        }

        let info = node_util::get_best_jsdoc(ast, objectLit);
        let lValue = node_util::get_best_lvalue(ast, objectLit);
        let lValueName = node_util::get_best_lvalue_name(ast, lValue);
        let mut createdEnumType = false;
        if let Some(info) = info.filter(|info| info.has_enum_parameter_type()) {
            ty = Some(self.createEnumTypeFromNodes(Some(objectLit), lValueName, info));
            createdEnumType = true;
        }

        let ty = match ty {
            Some(ty) => ty,
            None => self.ctx.type_registry.create_anonymous_object_type(),
        };
        self.setDeferredType(objectLit, ty);

        // Enum members were declared when the enum was created.
        self.processObjectLitProperties(objectLit, ty, !createdEnumType);
    }

    /// Declares the keys of an object literal: as qualified names when the
    /// literal has a name, and as properties of its type.
    fn processObjectLitProperties(&mut self, objectLit: NodeId, objectLitType: TypeId, declareOnOwner: bool) {
        let ast = self.ctx.ast;
        let enumElementType = enum_element_type(&self.ctx.type_registry, objectLitType);
        for &keyNode in ast.children(objectLit) {
            let value = ast.first_child(keyNode);
            let memberName = node_util::get_object_lit_key_name(ast, keyNode);
            let info = ast.jsdoc(keyNode);
            let keyType = match enumElementType {
                Some(elementType) => Some(elementType),
                None => self
                    .getDeclaredType(info, keyNode, value)
                    .and_then(|valueType| self.objectLitKeyType(keyNode, valueType)),
            };

            match node_util::get_best_lvalue_name(ast, Some(keyNode)) {
                Some(qualifiedName) => {
                    self.defineSlot(keyNode, objectLit, &qualifiedName, keyType, keyType.is_none())
                }
                None => {
                    if let Some(keyType) = keyType {
                        self.setDeferredType(keyNode, keyType);
                    }
                }
            }

            if let (Some(keyType), true) = (keyType, declareOnOwner) {
                self.ctx.type_registry.define_declared_property(
                    objectLitType,
                    memberName,
                    keyType,
                    Some(keyNode),
                );
            }
        }
    }

    /// Getters declare their return type, setters their parameter type.
    fn objectLitKeyType(&self, keyNode: NodeId, valueType: TypeId) -> Option<TypeId> {
        let ast = self.ctx.ast;
        let registry = &self.ctx.type_registry;
        match ast.token(keyNode) {
            Token::GetterDef => registry.get_function(valueType).map(|f| f.return_type),
            Token::SetterDef => registry
                .get_function(valueType)
                .and_then(|f| f.params.first())
                .map(|param| param.ty),
            _ => Some(valueType),
        }
    }

    fn getDeclaredTypeInAnnotation(&mut self, node: NodeId, info: Option<&JSDocInfo>) -> Option<TypeId> {
        let info = info?;
        if let Some(ty) = &info.ty {
            Some(self.evaluate(ty))
        } else if info.is_function_type_declaration() {
            let name = node_util::get_qualified_name(self.ctx.ast, node);
            Some(self.createFunctionTypeFromNodes(None, name, Some(info), Some(node)))
        } else {
            None
        }
    }

    fn defineCatch(&mut self, n: NodeId) {
        let ast = self.ctx.ast;
        if let Some(name) = ast.first_child(n) {
            self.defineSlotForNode(name, n, None, true);
        }
    }

    fn defineVar(&mut self, n: NodeId) {
        let ast = self.ctx.ast;
        let info = ast.jsdoc(n);
        if ast.child_count(n) > 1 {
            if info.is_some() {
                self.ctx.report(n, MULTIPLE_VAR_DEF, &[]);
            }
            for &name in ast.children(n) {
                self.defineName(name, n, ast.jsdoc(name));
            }
        } else if let Some(name) = ast.first_child(n) {
            self.defineName(name, n, info.or_else(|| ast.jsdoc(name)));
        }
    }

    fn defineName(&mut self, name: NodeId, var: NodeId, info: Option<&JSDocInfo>) {
        let ast = self.ctx.ast;
        let value = ast.first_child(name);
        let unknown = self.ctx.type_registry.common_types.UNKNOWN_TYPE;
        // Extern names without a type are unknown rather than inferred.
        let ty = self
            .getDeclaredType(info, name, value)
            .or_else(|| ast.is_from_externs(name).then_some(unknown));
        self.defineSlotForNode(name, var, ty, ty.is_none());
    }

    /// Whether a function literal assigned to `lValue` provides its type.
    fn shouldUseFunctionLiteralType(
        &self,
        fnType: Option<TypeId>,
        info: Option<&JSDocInfo>,
        lValue: Option<NodeId>,
    ) -> bool {
        let ast = self.ctx.ast;
        if info.is_some() {
            return true;
        }
        if lValue.map_or(false, |lValue| node_util::is_object_lit_key(ast, lValue)) {
            return false;
        }
        self.isGlobal
            || fnType
                .and_then(|fnType| self.ctx.type_registry.get_function(fnType))
                .map_or(false, |function| !function.inferred_return_type)
    }

    fn defineFunctionLiteral(&mut self, n: NodeId) {
        let ast = self.ctx.ast;
        let lValue = node_util::get_best_lvalue(ast, n);
        let info = node_util::get_best_jsdoc(ast, n);
        let functionName = node_util::get_best_lvalue_name(ast, lValue);
        let functionType = self.createFunctionTypeFromNodes(Some(n), functionName, info, lValue);

        self.setDeferredType(n, functionType);

        if node_util::is_function_declaration(ast, n) {
            if let Some(name) = node_util::function_name(ast, n) {
                self.defineSlotForNode(name, n, Some(functionType), false);
            }
        }
    }

    /**
     * Creates a function type from its literal, its JSDoc and its position.
     *
     * `rValue` is the function literal, or a qualified name aliasing another
     * constructor. `lvalueNode` is where the function is assigned; its owner
     * decides the overridden method and the type of `this`.
     */
    fn createFunctionTypeFromNodes(
        &mut self,
        rValue: Option<NodeId>,
        name: Option<JsWord>,
        info: Option<&JSDocInfo>,
        lvalueNode: Option<NodeId>,
    ) -> TypeId {
        let ast = self.ctx.ast;

        // Aliases of user-defined constructors in the global scope.
        if let Some(rValue) = rValue {
            if self.isGlobal && node_util::is_qualified_name(ast, rValue) {
                let aliased = node_util::get_qualified_name(ast, rValue)
                    .and_then(|qname| self.ctx.getVarType(self.scope, &qname));
                if let Some(aliased) = aliased {
                    let registry = &self.ctx.type_registry;
                    let isUserClass = registry.get_function(aliased).map_or(false, |f| {
                        (f.isConstructor() || f.isInterface()) && !f.is_native()
                    });
                    if isUserClass {
                        let instance = registry.instance_of_constructor(aliased);
                        if let (Some(name), Some(instance)) = (&name, instance) {
                            self.ctx.type_registry.declare_type(name, instance);
                        }
                        return aliased;
                    }
                }
            }
        }

        let fnRoot = rValue.filter(|&rValue| ast.is(rValue, Token::Function));
        let parametersNode = fnRoot.and_then(|fnRoot| node_util::function_params(ast, fnRoot));

        if let Some(ty) = info.and_then(|info| info.ty.as_ref()) {
            let ty = self.evaluate(ty);
            let ty = self.ctx.type_registry.restrict_by_not_null_or_undefined(ty);
            if self.ctx.type_registry.is_function_type(ty) {
                return ty;
            }
        }

        let ownerNode = node_util::get_best_lvalue_owner(ast, lvalueNode);
        let ownerName = node_util::get_best_lvalue_name(ast, ownerNode);
        let mut ownerType = None;
        let mut propName = None;
        if let Some(ownerName) = &ownerName {
            ownerType = self
                .ctx
                .getVarType(self.scope, ownerName)
                .and_then(|ty| self.ctx.type_registry.to_object_type(ty));
            propName = name
                .as_ref()
                .and_then(|name| name.strip_prefix(&**ownerName))
                .and_then(|rest| rest.strip_prefix('.'))
                .map(JsWord::from);
        }

        let overriddenType = match (ownerType, &propName) {
            (Some(ownerType), Some(propName)) => self.findOverriddenFunction(ownerType, propName),
            _ => None,
        };

        // The owner of a prototype method, or the enclosing `this`.
        let thisFromOwner = match ownerType
            .and_then(|owner| prototype_owner_function(&self.ctx.type_registry, owner))
        {
            Some(ctor) => Some(self.ctx.type_registry.instance_of_constructor(ctor)),
            None if ownerNode.map_or(false, |owner| ast.is(owner, Token::This)) => {
                Some(Some(self.ctx.getTypeOfThis(self.scope)))
            }
            None => None,
        };

        let scope = self.scope;
        let builder = FunctionTypeBuilder::new(self.ctx, name, scope)
            .setContents(fnRoot)
            .inferFromOverriddenFunction(overriddenType, parametersNode)
            .inferTemplateTypeName(info)
            .inferReturnType(info)
            .inferInheritance(info);
        let builder = match thisFromOwner {
            Some(owner) => builder.inferThisTypeFrom(info, owner),
            None => builder.inferThisType(info),
        };
        builder
            .inferParameterTypes(parametersNode, info)
            .buildAndRegister()
    }

    /// The function a method named `propName` on `ownerType` overrides: an
    /// inherited one, or one declared by an implemented interface.
    fn findOverriddenFunction(&mut self, ownerType: TypeId, propName: &str) -> Option<TypeId> {
        let registry = &mut self.ctx.type_registry;
        if let Some(propType) = registry.find_property_type(ownerType, propName) {
            if registry.is_function_type(propType) {
                return Some(propType);
            }
        }
        let interfaces = prototype_owner_function(registry, ownerType)
            .and_then(|ctor| registry.get_function(ctor))
            .map(|ctor| ctor.implemented_interfaces.clone())
            .unwrap_or_default();
        for interface in interfaces {
            if let Some(propType) = registry.find_property_type(interface, propName) {
                if registry.is_function_type(propType) {
                    return Some(propType);
                }
            }
        }
        None
    }

    /// Creates the type of an `@enum`, or reuses the aliased one.
    fn createEnumTypeFromNodes(
        &mut self,
        rValue: Option<NodeId>,
        name: Option<JsWord>,
        info: &JSDocInfo,
    ) -> TypeId {
        let ast = self.ctx.ast;
        let aliased = rValue
            .filter(|&rValue| node_util::is_qualified_name(ast, rValue))
            .and_then(|rValue| node_util::get_qualified_name(ast, rValue))
            .and_then(|qname| self.ctx.getVarType(self.scope, &qname))
            .filter(|&ty| self.ctx.type_registry.is_enum_type(ty));

        let enumType = match aliased {
            Some(aliased) => aliased,
            None => {
                let elementsType = match &info.enum_parameter_type {
                    Some(expr) => self.evaluate(expr),
                    None => self.ctx.type_registry.common_types.NUMBER_TYPE,
                };
                let enumType = self
                    .ctx
                    .type_registry
                    .create_enum_type(&name.clone().unwrap_or_default(), elementsType);
                let elementType = enum_element_type(&self.ctx.type_registry, enumType);

                if let (Some(objectLit), Some(elementType)) = (
                    rValue.filter(|&rValue| ast.is(rValue, Token::ObjectLit)),
                    elementType,
                ) {
                    for &key in ast.children(objectLit) {
                        let keyName = node_util::get_object_lit_key_name(ast, key);
                        if ast.is(key, Token::StringKey) && self.ctx.convention.isValidEnumKey(keyName) {
                            self.ctx.type_registry.define_declared_property(
                                enumType,
                                keyName,
                                elementType,
                                Some(key),
                            );
                        } else {
                            self.ctx.report(key, ENUM_NOT_CONSTANT, &[&**keyName]);
                        }
                    }
                }
                enumType
            }
        };

        if let Some(name) = &name {
            if self.isGlobal {
                if let Some(elementType) = enum_element_type(&self.ctx.type_registry, enumType) {
                    self.ctx.type_registry.declare_type(name, elementType);
                }
            }
        }
        enumType
    }

    fn defineSlotForNode(&mut self, n: NodeId, parent: NodeId, ty: Option<TypeId>, inferred: bool) {
        let ast = self.ctx.ast;
        let name = if ast.is(n, Token::Name) {
            ast.string(n).clone()
        } else {
            match node_util::get_qualified_name(ast, n) {
                Some(name) => name,
                None => return,
            }
        };
        self.defineSlot(n, parent, &name, ty, inferred);
    }

    /**
     * Declares `variableName`, the name of `n`, in the current scope, or in
     * the global scope for qualified names rooted there.
     *
     * `inferred` tells whether the type will be refined by inference; a
     * declared type is fixed.
     */
    fn defineSlot(
        &mut self,
        n: NodeId,
        parent: NodeId,
        variableName: &JsWord,
        ty: Option<TypeId>,
        inferred: bool,
    ) {
        if variableName.is_empty() {
            return;
        }
        let ast = self.ctx.ast;
        let isGlobalVar = ast.is(n, Token::Name) && self.isGlobal;
        let shouldDeclareOnGlobalThis =
            isGlobalVar && matches!(ast.token(parent), Token::Var | Token::Function);

        let mut scopeToDeclareIn = self.scope;
        if ast.is(n, Token::GetProp) && !self.isGlobal && self.isQnameRootedInGlobalScope(n) {
            let globalScope = self.ctx.scopes[self.scope].getGlobalScope(self.ctx);
            if !self.ctx.scopes[globalScope].hasOwnSlot(variableName) {
                scopeToDeclareIn = globalScope;
            }
        }

        let newVar = match self.ctx.scopes[scopeToDeclareIn].getOwnSlot(variableName) {
            Some(oldVar) => self.validateRedeclaration(n, parent, oldVar, variableName, ty),
            None => {
                if let Some(ty) = ty {
                    self.setDeferredType(n, ty);
                }
                let newVar = self
                    .ctx
                    .declare(scopeToDeclareIn, variableName, Some(n), ty, inferred);

                if ty.map_or(false, |ty| self.ctx.type_registry.is_enum_type(ty)) {
                    let validInitializer = initial_value(ast, n).map_or(false, |value| {
                        ast.is(value, Token::ObjectLit) || node_util::is_qualified_name(ast, value)
                    });
                    if !validInitializer {
                        self.ctx.report(n, ENUM_INITIALIZER, &[]);
                    }
                }
                newVar
            }
        };

        if let Some(ty) = ty {
            let registry = &self.ctx.type_registry;
            let definesClass = !registry.is_empty_type(ty)
                && registry.get_function(ty).map_or(false, |function| {
                    (function.isConstructor() || function.isInterface())
                        && function.reference_name() == Some(variableName)
                });
            if definesClass {
                self.finishConstructorDefinition(n, variableName, ty, scopeToDeclareIn, newVar);
            }
        }

        if shouldDeclareOnGlobalThis {
            let c = self.ctx.type_registry.common_types;
            if inferred {
                self.ctx.type_registry.define_inferred_property(
                    c.GLOBAL_THIS,
                    variableName,
                    ty.unwrap_or(c.NO_TYPE),
                    Some(n),
                );
            } else if let Some(ty) = ty {
                self.ctx
                    .type_registry
                    .define_declared_property(c.GLOBAL_THIS, variableName, ty, Some(n));
            }
        }
    }

    /// A second declaration of an existing name. Natives take the new
    /// declaration node but keep their type; a conflicting declared type is
    /// reported.
    fn validateRedeclaration(
        &mut self,
        n: NodeId,
        parent: NodeId,
        oldVar: TypedVarId,
        variableName: &JsWord,
        newType: Option<TypeId>,
    ) -> TypedVarId {
        let ast = self.ctx.ast;
        let registry = &self.ctx.type_registry;
        let var = &self.ctx.vars[oldVar];
        let (varType, newType) = match (var.getType(), newType) {
            (Some(varType), Some(newType))
                if !registry.is_unknown_type(varType) && !registry.is_unknown_type(newType) =>
            {
                (varType, newType)
            }
            _ => return oldVar,
        };

        let oldNode = match var.getNameNode() {
            Some(oldNode) => oldNode,
            None => {
                let scope = var.scope;
                self.ctx.undeclare(scope, variableName);
                let newVar = self.ctx.declare(scope, variableName, Some(n), Some(varType), false);
                self.ctx.type_registry.set_type(n, varType);
                if ast.is(parent, Token::Function) {
                    self.ctx.type_registry.set_type(parent, varType);
                }
                return newVar;
            }
        };

        if !registry.is_equivalent(newType, varType) {
            let newTypeName = registry.type_to_string(newType);
            let varTypeName = registry.type_to_string(varType);
            let line = ast.line(oldNode).to_string();
            self.ctx.report(
                n,
                DUP_VAR_DECLARATION,
                &[
                    &**variableName,
                    newTypeName.as_str(),
                    &**ast.source_name(oldNode),
                    line.as_str(),
                    varTypeName.as_str(),
                ],
            );
        }
        oldVar
    }

    /// Declares `Foo.prototype` for a newly defined constructor or interface
    /// `Foo`, and checks that the class was initialized.
    fn finishConstructorDefinition(
        &mut self,
        n: NodeId,
        variableName: &JsWord,
        fnType: TypeId,
        scopeToDeclareIn: ScopeId,
        newVar: TypedVarId,
    ) {
        let ast = self.ctx.ast;
        let registry = &self.ctx.type_registry;
        let prototype = match registry.prototype_of_constructor(fnType) {
            Some(prototype) => prototype,
            None => return,
        };
        // The prototype is declared only when a superclass was given.
        let hasSuperclass = registry
            .ty(prototype)
            .object()
            .and_then(|object| object.implicit_prototype)
            .map_or(false, |base| {
                registry.resolve(base) != registry.common_types.OBJECT_TYPE
            });

        let prototypeName = JsWord::from(format!("{}.prototype", variableName));
        if self.ctx.scopes[scopeToDeclareIn].hasOwnSlot(&prototypeName) {
            self.ctx.undeclare(scopeToDeclareIn, &prototypeName);
        }
        self.ctx.declare(
            scopeToDeclareIn,
            &prototypeName,
            Some(n),
            Some(prototype),
            !hasSuperclass,
        );

        let nameNode = self.ctx.vars[newVar].getNameNode();
        let initialized = nameNode.map_or(false, |nameNode| initial_value(ast, nameNode).is_some());
        if !initialized && !ast.is_from_externs(n) {
            let kind = if self.ctx.type_registry.is_constructor(fnType) {
                CTOR_INITIALIZER
            } else {
                IFACE_INITIALIZER
            };
            self.ctx.report(n, kind, &[&**variableName]);
        }
    }

    fn isQnameRootedInGlobalScope(&self, n: NodeId) -> bool {
        let ast = self.ctx.ast;
        let root = node_util::get_root_of_qualified_name(ast, n);
        if !ast.is(root, Token::Name) {
            return false;
        }
        self.ctx
            .getVar(self.scope, ast.string(root))
            .map_or(false, |var| self.ctx.scopes[self.ctx.vars[var].scope].isGlobal())
    }

    /**
     * The declared type of a name, from its JSDoc or its value:
     *
     * * `@type` gives the type directly.
     * * A function literal gives its own type.
     * * `@enum`, `@constructor` and `@interface` create a type.
     * * `@const` takes the type of a literal initializer, also for
     *   `x = x || value`.
     */
    fn getDeclaredType(
        &mut self,
        info: Option<&JSDocInfo>,
        lValue: NodeId,
        rValue: Option<NodeId>,
    ) -> Option<TypeId> {
        let ast = self.ctx.ast;
        if info.map_or(false, JSDocInfo::has_type) {
            return self.getDeclaredTypeInAnnotation(lValue, info);
        }

        if let Some(rValue) = rValue.filter(|&rValue| ast.is(rValue, Token::Function)) {
            let fnType = self.ctx.type_registry.get_type(rValue);
            if self.shouldUseFunctionLiteralType(fnType, info, Some(lValue)) {
                return fnType;
            }
        }

        if let Some(info) = info {
            if info.has_enum_parameter_type() {
                if let Some(objectLit) = rValue.filter(|&rValue| ast.is(rValue, Token::ObjectLit)) {
                    return self.ctx.type_registry.get_type(objectLit);
                }
                let name = node_util::get_qualified_name(ast, lValue);
                return Some(self.createEnumTypeFromNodes(rValue, name, info));
            } else if info.is_constructor() || info.is_interface() {
                let name = node_util::get_qualified_name(ast, lValue);
                return Some(self.createFunctionTypeFromNodes(rValue, name, Some(info), Some(lValue)));
            } else if info.is_constant() {
                if let Some(rValue) = rValue {
                    if let Some(cast) = ast.jsdoc(rValue).and_then(|cast| cast.ty.as_ref()) {
                        return Some(self.evaluate(cast));
                    }
                    let registry = &self.ctx.type_registry;
                    if let Some(rValueType) = registry.get_type(rValue) {
                        if !registry.is_unknown_type(rValueType) {
                            return Some(rValueType);
                        }
                    }
                    if ast.is(rValue, Token::Or) {
                        if let (Some(first), Some(second)) = (ast.first_child(rValue), ast.second_child(rValue)) {
                            let sameName = ast.is(first, Token::Name)
                                && ast.is(lValue, Token::Name)
                                && ast.string(first) == ast.string(lValue);
                            if sameName {
                                if let Some(secondType) = registry.get_type(second) {
                                    if !registry.is_unknown_type(secondType) {
                                        return Some(secondType);
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        self.getDeclaredTypeInAnnotation(lValue, info)
    }

    fn getFunctionType(&self, name: &str) -> Option<TypeId> {
        let registry = &self.ctx.type_registry;
        let ty = self.ctx.getVarType(self.scope, name)?;
        registry.get_function(ty).map(|_| registry.resolve(ty))
    }

    /// Calls that relate classes: subclassing, singleton getters, delegates
    /// and object literal casts.
    fn checkForClassDefiningCalls(&mut self, n: NodeId) {
        let ast = self.ctx.ast;

        if let Some(relationship) = self.ctx.convention.getClassesDefinedByCall(ast, n) {
            let superCtor = self.getFunctionType(&relationship.superclassName);
            let subCtor = self.getFunctionType(&relationship.subclassName);
            if let (Some(superCtor), Some(subCtor)) = (superCtor, subCtor) {
                let registry = &self.ctx.type_registry;
                if registry.is_constructor(superCtor) && registry.is_constructor(subCtor) {
                    tracing::trace!(
                        sub = &*relationship.subclassName,
                        sup = &*relationship.superclassName,
                        "subclass relationship"
                    );
                    self.ctx.convention.applySubclassRelationship(
                        &mut self.ctx.type_registry,
                        superCtor,
                        subCtor,
                        relationship.type_,
                    );
                }
            }
        }

        if let Some(className) = self.ctx.convention.getSingletonGetterClassName(ast, n) {
            let registry = &self.ctx.type_registry;
            let objectType = registry
                .get_type_by_name(&className)
                .and_then(|ty| registry.to_object_type(ty));
            if let Some(objectType) = objectType {
                if let Some(ctor) = constructor_of(registry, objectType) {
                    let getterType = singleton_getter_type(&mut self.ctx.type_registry, objectType);
                    self.ctx.convention.applySingletonGetter(
                        &mut self.ctx.type_registry,
                        ctor,
                        getterType,
                        objectType,
                    );
                }
            }
        }

        self.applyDelegateRelationship(n);

        if let Some(cast) = self.ctx.convention.getObjectLiteralCast(ast, n) {
            let registry = &self.ctx.type_registry;
            let castType = cast
                .typeName
                .as_ref()
                .and_then(|name| registry.get_type_by_name(name))
                .and_then(|ty| registry.to_object_type(ty))
                .filter(|&ty| constructor_of(registry, ty).is_some());
            match (castType, cast.objectNode) {
                (Some(castType), Some(objectNode)) => self.setDeferredType(objectNode, castType),
                (None, _) => self.ctx.report(n, CONSTRUCTOR_EXPECTED, &[]),
                _ => {}
            }
        }
    }

    /// Gives the delegator's prototype a `findDelegate` method returning the
    /// delegate base.
    fn applyDelegateRelationship(&mut self, n: NodeId) {
        let ast = self.ctx.ast;
        let relationship = match self.ctx.convention.getDelegateRelationship(ast, n) {
            Some(relationship) => relationship,
            None => return,
        };
        let registry = &self.ctx.type_registry;
        let lookup = |name: &str| {
            registry
                .get_type_by_name(name)
                .and_then(|ty| registry.to_object_type(ty))
        };
        let delegateSuper = self.ctx.convention.getDelegateSuperclassName().and_then(lookup);
        let delegator = lookup(&relationship.delegator);
        let delegateBase = lookup(&relationship.delegateBase);
        let (delegator, delegateBase) = match (delegator, delegateBase, delegateSuper) {
            (Some(delegator), Some(delegateBase), Some(_)) => (delegator, delegateBase),
            _ => return,
        };
        let delegatorCtor = match constructor_of(registry, delegator) {
            Some(ctor) if constructor_of(registry, delegateBase).is_some() => ctor,
            _ => return,
        };
        let prototype = registry.prototype_of_constructor(delegatorCtor);
        let c = registry.common_types;

        let registry = &mut self.ctx.type_registry;
        let findDelegateReturn = registry.create_union(&[delegateBase, c.NULL_TYPE]);
        let findDelegate =
            registry.create_function_type(vec![Parameter::new(c.UNKNOWN_TYPE)], findDelegateReturn);
        if let Some(prototype) = prototype {
            registry.define_declared_property(
                prototype,
                &JsWord::from("findDelegate"),
                findDelegate,
                None,
            );
        }
    }

    /**
     * Declares a qualified name such as `a.b.c`, from an assignment `a.b.c =
     * rhsValue` or a stub `a.b.c;`. Declared types become properties of the
     * owner as well.
     */
    fn maybeDeclareQualifiedName(
        &mut self,
        info: Option<&JSDocInfo>,
        n: NodeId,
        parent: NodeId,
        rhsValue: Option<NodeId>,
    ) {
        let ast = self.ctx.ast;
        if self.isGlobal {
            self.checkForTypedef(n, info);
        }

        let ownerNode = match ast.first_child(n) {
            Some(ownerNode) => ownerNode,
            None => return,
        };
        let (ownerName, qName) = match (
            node_util::get_qualified_name(ast, ownerNode),
            node_util::get_qualified_name(ast, n),
        ) {
            (Some(ownerName), Some(qName)) => (ownerName, qName),
            _ => return,
        };
        let propName = ast.string(n).clone();

        let mut valueType = self.getDeclaredType(info, n, rhsValue);
        if valueType.is_none() {
            valueType = rhsValue.and_then(|rhsValue| self.ctx.type_registry.get_type(rhsValue));
        }

        if &*propName == "prototype" {
            if let Some(qVar) = self.ctx.getVar(self.scope, &qName) {
                let registry = &self.ctx.type_registry;
                let qVarType = self.ctx.vars[qVar]
                    .getType()
                    .and_then(|ty| registry.to_object_type(ty));
                let literal = rhsValue.filter(|&rhs| ast.is(rhs, Token::ObjectLit));
                if let (Some(prototype), Some(literal)) = (qVarType, literal) {
                    // Merged into the existing prototype, not a reset of the
                    // implicit prototype chain: the constructor's instance
                    // type already points at this prototype object.
                    let ctor = prototype_owner_function(registry, prototype);
                    if let (Some(ctor), Some(literalType)) = (ctor, registry.get_type(literal)) {
                        self.ctx
                            .type_registry
                            .define_declared_property(ctor, &propName, literalType, Some(n));
                    }
                    return;
                }
                if !self.ctx.vars[qVar].isTypeInferred() {
                    return;
                }
                if self.ctx.vars[qVar].scope == self.scope {
                    self.ctx.undeclare(self.scope, &qName);
                }
            }
        }

        let valueType = match valueType {
            Some(valueType) => valueType,
            None => {
                if ast.is(parent, Token::ExprResult) {
                    self.stubDeclarations.push(StubDeclaration {
                        node: n,
                        isExtern: ast.is_from_externs(n),
                        ownerName,
                    });
                }
                return;
            }
        };

        let inferred = self.isQualifiedNameInferred(&qName, n, info, rhsValue, valueType);
        if !inferred {
            if let Some(ownerType) = self.getObjectSlot(&ownerName) {
                let isExtern = ast.is_from_externs(n);
                let registry = &self.ctx.type_registry;
                let undeclared = !registry.has_own_property(ownerType, &propName)
                    || registry.is_property_type_inferred(ownerType, &propName);
                let ownerTakesProperty = (isExtern && !registry.is_native_object_type(ownerType))
                    || !registry.is_instance_type(ownerType);
                if undeclared && ownerTakesProperty {
                    self.ctx.type_registry.define_declared_property(
                        ownerType,
                        &propName,
                        valueType,
                        Some(n),
                    );
                }
            }
            self.defineSlot(n, parent, &qName, Some(valueType), inferred);
        } else if rhsValue.map_or(false, |rhs| ast.is(rhs, Token::True)) {
            // `Foo.prototype.isDelegateProxy = true` style flags on delegates.
            let ownerType = self.getObjectSlot(&ownerName);
            let registry = &self.ctx.type_registry;
            if let Some(ownerFn) = ownerType.and_then(|owner| registry.get_function(owner)) {
                let thisType = ownerFn.type_of_this.unwrap_or(registry.common_types.UNKNOWN_TYPE);
                let delegateType = self
                    .ctx
                    .convention
                    .getDelegateSuperclassName()
                    .and_then(|name| registry.get_type_by_name(name));
                if delegateType.map_or(false, |delegate| registry.is_subtype(thisType, delegate)) {
                    let boolean = registry.common_types.BOOLEAN_TYPE;
                    self.defineSlot(n, parent, &qName, Some(boolean), true);
                }
            }
        }
    }

    /**
     * Whether the type of a qualified name may change through inference.
     * Annotated names are declared. An unannotated function assigned once, at
     * the top level of its function, outside of any control structure, is
     * declared too unless the name escapes.
     */
    fn isQualifiedNameInferred(
        &self,
        qName: &JsWord,
        n: NodeId,
        info: Option<&JSDocInfo>,
        rhsValue: Option<NodeId>,
        valueType: TypeId,
    ) -> bool {
        let ast = self.ctx.ast;
        let registry = &self.ctx.type_registry;
        let mut inferred = true;
        if let Some(info) = info {
            inferred = !(info.has_type()
                || info.has_enum_parameter_type()
                || (info.is_constant() && !registry.is_unknown_type(valueType))
                || info.is_function_type_declaration());
        }

        if inferred && rhsValue.map_or(false, |rhs| ast.is(rhs, Token::Function)) {
            if info.is_some() {
                return false;
            }
            if !self.ctx.scopes[self.scope].hasOwnSlot(qName)
                && node_util::is_unscoped_qualified_name(ast, n)
            {
                let mut current = ast.parent(n);
                while let Some(ancestor) = current {
                    if ast.is(ancestor, Token::Script) || ast.is(ancestor, Token::Function) {
                        break;
                    }
                    if node_util::is_control_structure(ast, ancestor) {
                        return true;
                    }
                    current = ast.parent(ancestor);
                }

                let root = self.root();
                let escaped = self
                    .ctx
                    .function_analysis
                    .as_ref()
                    .and_then(|results| results.get(root))
                    .map_or(false, |contents| contents.getEscapedQualifiedNames().contains(qName));
                if !escaped {
                    return false;
                }
            }
        }
        inferred
    }

    /// The object type of the name `slotName`, if it has one.
    fn getObjectSlot(&mut self, slotName: &str) -> Option<TypeId> {
        let ty = self.ctx.getVarType(self.scope, slotName)?;
        let registry = &mut self.ctx.type_registry;
        let restricted = registry.restrict_by_not_null_or_undefined(ty);
        registry.to_object_type(restricted)
    }

    /// Declares the `a.b;` stubs that no other declaration covered.
    fn resolveStubDeclarations(&mut self) {
        let ast = self.ctx.ast;
        let stubs = std::mem::take(&mut self.stubDeclarations);
        tracing::trace!(count = stubs.len(), "resolving stub declarations");
        for stub in stubs {
            let n = stub.node;
            let (parent, qName) = match (ast.parent(n), node_util::get_qualified_name(ast, n)) {
                (Some(parent), Some(qName)) => (parent, qName),
                _ => continue,
            };
            if self.ctx.scopes[self.scope].hasOwnSlot(&qName) {
                continue;
            }
            let propName = ast.string(n).clone();
            let ownerType = self.getObjectSlot(&stub.ownerName);
            let unknown = self.ctx.type_registry.common_types.UNKNOWN_TYPE;
            self.defineSlot(n, parent, &qName, Some(unknown), true);

            let registry = &mut self.ctx.type_registry;
            match ownerType {
                Some(ownerType)
                    if stub.isExtern || prototype_owner_function(registry, ownerType).is_some() =>
                {
                    registry.define_inferred_property(ownerType, &propName, unknown, Some(n));
                }
                _ => registry.register_property_on_type(&propName, ownerType.unwrap_or(unknown)),
            }
        }
    }

    /// Replaces named proxies recorded during the build with the types they
    /// name.
    fn resolveTypes(&mut self) {
        let registry = &mut self.ctx.type_registry;
        registry.resolve_named_types();
        for (n, ty) in std::mem::take(&mut self.deferredSetTypes) {
            let resolved = registry.resolve(ty);
            registry.set_type(n, resolved);
        }
        let vars: Vec<TypedVarId> = self.ctx.scopes[self.scope].getVarIterable().collect();
        for var in vars {
            if let Some(ty) = self.ctx.vars[var].getType() {
                let resolved = self.ctx.type_registry.resolve(ty);
                self.ctx.vars[var].setType(resolved);
            }
        }
    }

    /// Declares a `@typedef` name as a type and its qualified name as a
    /// slot with no value.
    fn checkForTypedef(&mut self, candidate: NodeId, info: Option<&JSDocInfo>) {
        let ast = self.ctx.ast;
        let info = match info {
            Some(info) if info.has_typedef_type() => info,
            _ => return,
        };
        let typedef = match node_util::get_qualified_name(ast, candidate) {
            Some(typedef) => typedef,
            None => return,
        };

        let c = self.ctx.type_registry.common_types;
        // Recursive references see an unknown type.
        self.ctx.type_registry.declare_type(&typedef, c.UNKNOWN_TYPE);
        let realType = match &info.typedef_type {
            Some(expr) => self.evaluate(expr),
            None => {
                self.ctx.report(candidate, MALFORMED_TYPEDEF, &[&*typedef]);
                c.UNKNOWN_TYPE
            }
        };
        self.ctx.type_registry.overwrite_declared_type(&typedef, realType);

        if ast.is(candidate, Token::GetProp) {
            if let Some(parent) = ast.parent(candidate) {
                self.defineSlot(candidate, parent, &typedef, Some(c.NO_TYPE), false);
            }
        }
    }

    /// Declares the function's name when it bleeds into its body, then its
    /// parameters.
    fn handleFunctionInputs(&mut self, fnNode: NodeId) {
        let ast = self.ctx.ast;
        let fnType = self
            .ctx
            .type_registry
            .get_type(fnNode)
            .filter(|&ty| self.ctx.type_registry.is_function_type(ty));

        if let (Some(nameNode), Some(fnType)) = (node_util::function_name(ast, fnNode), fnType) {
            let fnName = ast.string(nameNode).clone();
            if !fnName.is_empty() {
                let bleeds = match self.ctx.getVar(self.scope, &fnName) {
                    None => true,
                    Some(fnVar) => self.ctx.vars[fnVar]
                        .getNameNode()
                        .map_or(false, |declared| initial_value(ast, declared) != Some(fnNode)),
                };
                if bleeds {
                    self.defineSlot(nameNode, fnNode, &fnName, Some(fnType), false);
                }
            }
        }

        self.declareArguments(fnNode);
    }

    /// Declares each parameter with its position's type in the function type.
    fn declareArguments(&mut self, fnNode: NodeId) {
        let ast = self.ctx.ast;
        let params = match node_util::function_params(ast, fnNode) {
            Some(params) => params,
            None => return,
        };
        let registry = &self.ctx.type_registry;
        let jsDocParameters = match registry
            .get_type(fnNode)
            .and_then(|fnType| registry.get_function(fnType))
        {
            Some(function) => function.params.clone(),
            None => return,
        };
        let isFnTypeInferred = self.ctx.inferred_functions.contains(&fnNode);

        for (index, &astParameter) in ast.children(params).iter().enumerate() {
            match jsDocParameters.get(index) {
                Some(jsDocParameter) => self.defineSlotForNode(
                    astParameter,
                    fnNode,
                    Some(jsDocParameter.ty),
                    isFnTypeInferred,
                ),
                None => self.defineSlotForNode(astParameter, fnNode, None, true),
            }
        }
    }

    fn markEscapedAndAssignedOnceVars(&mut self, root: NodeId) {
        let (escaped, assignedOnce): (Vec<JsWord>, Vec<JsWord>) = match self
            .ctx
            .function_analysis
            .as_ref()
            .and_then(|results| results.get(root))
        {
            Some(contents) => (
                contents.getEscapedVarNames().iter().cloned().collect(),
                contents
                    .getAssignedNameCounts()
                    .iter()
                    .filter(|(_, count)| **count == 1)
                    .map(|(name, _)| name.clone())
                    .collect(),
            ),
            None => return,
        };

        for name in escaped {
            if let Some(var) = self.ctx.scopes[self.scope].getOwnSlot(&name) {
                self.ctx.vars[var].markEscaped();
            }
        }
        for name in assignedOnce {
            if let Some(var) = self.ctx.scopes[self.scope].getOwnSlot(&name) {
                self.ctx.vars[var].markAssignedExactlyOnce();
            }
        }
    }

    /// Declares `this.x` properties annotated in the bodies of functions
    /// with a known `this`.
    fn collectPropertiesOfFunctions(&mut self) {
        for function in std::mem::take(&mut self.nonExternFunctions) {
            let registry = &self.ctx.type_registry;
            let thisType = registry
                .get_type(function)
                .and_then(|fnType| registry.get_function(fnType))
                .and_then(|function| function.type_of_this)
                .filter(|&thisType| !registry.is_unknown_type(thisType));
            let body = node_util::function_body(self.ctx.ast, function);
            if let (Some(thisType), Some(body)) = (thisType, body) {
                self.collectProperties(body, thisType);
            }
        }
    }

    fn collectProperties(&mut self, n: NodeId, thisType: TypeId) {
        let ast = self.ctx.ast;
        if ast.is(n, Token::ExprResult) {
            if let Some(child) = ast.first_child(n) {
                match ast.token(child) {
                    Token::Assign => {
                        if let Some(member) = ast.first_child(child) {
                            self.maybeCollectMember(member, child, ast.second_child(child), thisType);
                        }
                    }
                    Token::GetProp => self.maybeCollectMember(child, child, None, thisType),
                    _ => {}
                }
            }
        }
        if node_util::is_control_structure(ast, n) || node_util::is_statement_parent(ast, n) {
            for &child in ast.children(n) {
                self.collectProperties(child, thisType);
            }
        }
    }

    fn maybeCollectMember(
        &mut self,
        member: NodeId,
        nodeWithJsDocInfo: NodeId,
        value: Option<NodeId>,
        thisType: TypeId,
    ) {
        let ast = self.ctx.ast;
        let info = match ast.jsdoc(nodeWithJsDocInfo) {
            Some(info) => info,
            None => return,
        };
        if !ast.is(member, Token::GetProp) {
            return;
        }
        match ast.first_child(member) {
            Some(object) if ast.is(object, Token::This) => {
                self.ctx.type_registry.set_type(object, thisType);
            }
            _ => return,
        }
        if let Some(jsType) = self.getDeclaredType(Some(info), member, value) {
            let name = ast.string(member).clone();
            self.ctx
                .type_registry
                .define_declared_property(thisType, &name, jsType, Some(member));
        }
    }
}
