use crate::ctx::Ctx;
use crate::typed_scope::ScopeId;
use crate::typing::{FunctionKind, Parameter, TyKind, TypeId};
use ast::{node_util, JSDocInfo, JsWord, NodeId, Token, TypeExpr};

/**
 * Builds the type of a function from its JSDoc, its literal and the function
 * it overrides, if any. Calls are chained in a fixed order:
 *
 * ```text
 * FunctionTypeBuilder::new(ctx, name, scope)
 *     .setContents(fnNode)
 *     .inferFromOverriddenFunction(overridden, paramsNode)
 *     .inferTemplateTypeName(info)
 *     .inferReturnType(info)
 *     .inferInheritance(info)
 *     .inferThisType(info)
 *     .inferParameterTypes(paramsNode, info)
 *     .buildAndRegister()
 * ```
 *
 * Constructors and interfaces declared in the global scope are registered
 * under their name.
 */
pub(crate) struct FunctionTypeBuilder<'c, 'ast> {
    ctx: &'c mut Ctx<'ast>,
    fnName: JsWord,
    scope: ScopeId,
    sourceNode: Option<NodeId>,
    isFromExterns: bool,
    mayHaveNonEmptyReturns: bool,
    mayHaveSingleThrow: bool,
    returnType: Option<TypeId>,
    returnTypeInferred: bool,
    baseType: Option<TypeId>,
    implementedInterfaces: Vec<TypeId>,
    thisType: Option<TypeId>,
    isConstructor: bool,
    isInterface: bool,
    parameters: Option<Vec<Parameter>>,
    templateScope: Vec<(JsWord, TypeId)>,
}

impl<'c, 'ast> FunctionTypeBuilder<'c, 'ast> {
    pub(crate) fn new(
        ctx: &'c mut Ctx<'ast>,
        fnName: Option<JsWord>,
        scope: ScopeId,
    ) -> Self {
        Self {
            ctx,
            fnName: fnName.unwrap_or_default(),
            scope,
            sourceNode: None,
            isFromExterns: true,
            mayHaveNonEmptyReturns: true,
            mayHaveSingleThrow: false,
            returnType: None,
            returnTypeInferred: false,
            baseType: None,
            implementedInterfaces: Vec::new(),
            thisType: None,
            isConstructor: false,
            isInterface: false,
            parameters: None,
            templateScope: Vec::new(),
        }
    }

    /// Records what the function literal itself tells about the type. Without
    /// a literal the function is treated as an extern.
    pub(crate) fn setContents(mut self, function: Option<NodeId>) -> Self {
        let function = match function {
            Some(function) => function,
            None => return self,
        };
        let ast = self.ctx.ast;
        self.sourceNode = Some(function);
        self.isFromExterns = ast.is_from_externs(function);
        self.mayHaveNonEmptyReturns = self
            .ctx
            .function_analysis
            .as_ref()
            .and_then(|results| results.get(function))
            .map_or(true, |contents| contents.mayHaveNonEmptyReturns());
        self.mayHaveSingleThrow = node_util::function_body(ast, function).map_or(false, |body| {
            ast.child_count(body) == 1
                && ast
                    .first_child(body)
                    .map_or(false, |statement| ast.is(statement, Token::Throw))
        });
        self
    }

    /// Starts from the signature of the function this one overrides. When a
    /// literal is given, its parameter list decides how many parameters are
    /// taken positionally; the rest of the overridden ones become optional.
    pub(crate) fn inferFromOverriddenFunction(
        mut self,
        overridden: Option<TypeId>,
        paramsNode: Option<NodeId>,
    ) -> Self {
        let (oldParams, returnType, returnTypeInferred) = match overridden
            .and_then(|overridden| self.ctx.type_registry.get_function(overridden))
        {
            Some(function) => (
                function.params.clone(),
                function.return_type,
                function.inferred_return_type,
            ),
            None => return self,
        };
        self.returnType = Some(returnType);
        self.returnTypeInferred = returnTypeInferred;

        let paramsNode = match paramsNode {
            Some(paramsNode) => paramsNode,
            None => {
                self.parameters = Some(oldParams);
                return self;
            }
        };

        let ast = self.ctx.ast;
        let unknown = self.ctx.type_registry.common_types.UNKNOWN_TYPE;
        let literalParams = ast.children(paramsNode);
        let mut params = Vec::with_capacity(literalParams.len().max(oldParams.len()));
        let mut hitOptionalArgs = false;
        for (index, _) in literalParams.iter().enumerate() {
            match oldParams.get(index) {
                Some(old) => {
                    let mut param = old.clone();
                    hitOptionalArgs = hitOptionalArgs || old.var_args || old.optional;
                    // A subclass may spell out var_args as individual parameters.
                    if index + 1 < literalParams.len() && param.var_args {
                        param.var_args = false;
                        param.optional = true;
                    }
                    params.push(param);
                }
                None => params.push(Parameter {
                    ty: unknown,
                    optional: hitOptionalArgs,
                    var_args: false,
                }),
            }
        }
        for old in oldParams.iter().skip(literalParams.len()) {
            params.push(Parameter {
                optional: true,
                ..old.clone()
            });
        }
        self.parameters = Some(params);
        self
    }

    pub(crate) fn inferTemplateTypeName(mut self, info: Option<&JSDocInfo>) -> Self {
        if let Some(info) = info {
            for name in &info.template_type_names {
                let template = self.ctx.type_registry.create_template_type(name);
                self.templateScope.push((name.clone(), template));
            }
        }
        self
    }

    pub(crate) fn inferReturnType(mut self, info: Option<&JSDocInfo>) -> Self {
        if let Some(returnType) = info.and_then(|info| info.return_type.as_ref()) {
            self.returnType = Some(self.evaluate(returnType));
            self.returnTypeInferred = false;
        }
        self
    }

    /// `@constructor`, `@interface`, `@extends` and `@implements`.
    pub(crate) fn inferInheritance(mut self, info: Option<&JSDocInfo>) -> Self {
        let info = match info {
            Some(info) => info,
            None => return self,
        };
        self.isConstructor = info.is_constructor();
        self.isInterface = info.is_interface();
        if !(self.isConstructor || self.isInterface) {
            return self;
        }
        if let Some(base) = &info.base_type {
            let base = self.evaluate(base);
            let base = self.ctx.type_registry.restrict_by_not_null_or_undefined(base);
            if !self.ctx.type_registry.is_empty_type(base) {
                self.baseType = Some(base);
            }
        }
        for interface in &info.implemented_interfaces {
            let interface = self.evaluate(interface);
            let interface = self
                .ctx
                .type_registry
                .restrict_by_not_null_or_undefined(interface);
            if !self.ctx.type_registry.is_empty_type(interface) {
                self.implementedInterfaces.push(interface);
            }
        }
        self
    }

    /// `@this`, if present.
    pub(crate) fn inferThisType(mut self, info: Option<&JSDocInfo>) -> Self {
        if let Some(thisType) = info.and_then(|info| info.this_type.as_ref()) {
            let thisType = self.evaluate(thisType);
            let thisType = self
                .ctx
                .type_registry
                .restrict_by_not_null_or_undefined(thisType);
            if self.ctx.type_registry.is_object_type(thisType)
                || self.ctx.type_registry.is_unknown_type(thisType)
            {
                self.thisType = Some(thisType);
            }
        }
        self
    }

    /// `@this`, or else the given owner object, unless the function is
    /// declared through `@type`.
    pub(crate) fn inferThisTypeFrom(self, info: Option<&JSDocInfo>, owner: Option<TypeId>) -> Self {
        let mut builder = self.inferThisType(info);
        if builder.thisType.is_none() {
            if let Some(owner) = owner {
                let hasType = info.map_or(false, JSDocInfo::has_type);
                if !hasType && builder.ctx.type_registry.is_object_type(owner) {
                    builder.thisType = Some(owner);
                }
            }
        }
        builder
    }

    /// Parameter types come from `@param`, then from the overridden
    /// function, and are unknown otherwise.
    pub(crate) fn inferParameterTypes(
        mut self,
        paramsNode: Option<NodeId>,
        info: Option<&JSDocInfo>,
    ) -> Self {
        let paramsNode = match paramsNode {
            Some(paramsNode) => paramsNode,
            None => {
                if let Some(info) = info {
                    let params = info
                        .params
                        .iter()
                        .map(|(_, expr)| self.evaluate_parameter(expr))
                        .collect();
                    self.parameters = Some(params);
                }
                return self;
            }
        };

        let ast = self.ctx.ast;
        let unknown = self.ctx.type_registry.common_types.UNKNOWN_TYPE;
        let oldParams = self.parameters.take().unwrap_or_default();
        let mut params = Vec::with_capacity(ast.child_count(paramsNode));
        let mut isVarArgs = false;
        for (index, &arg) in ast.children(paramsNode).iter().enumerate() {
            let name = ast.string(arg);
            let param = match info.and_then(|info| info.get_parameter_type(name)) {
                Some(expr) => self.evaluate_parameter(expr),
                None => match oldParams.get(index) {
                    Some(old) => old.clone(),
                    None => Parameter::new(unknown),
                },
            };
            isVarArgs = param.var_args;
            params.push(param);
        }
        if !isVarArgs {
            params.extend(oldParams.into_iter().skip(params.len()));
        }
        self.parameters = Some(params);
        self
    }

    pub(crate) fn buildAndRegister(self) -> TypeId {
        let Self {
            ctx,
            fnName,
            scope,
            sourceNode,
            isFromExterns,
            mayHaveNonEmptyReturns,
            mayHaveSingleThrow,
            returnType,
            returnTypeInferred,
            baseType,
            implementedInterfaces,
            thisType,
            isConstructor,
            isInterface,
            parameters,
            templateScope,
            ..
        } = self;
        let common = &ctx.type_registry.common_types;
        let (returnType, returnTypeInferred) = match returnType {
            Some(returnType) => (returnType, returnTypeInferred),
            // Only obviously empty functions get an inferred return type.
            None if !mayHaveNonEmptyReturns && !mayHaveSingleThrow && !isFromExterns => {
                (common.VOID_TYPE, true)
            }
            None => (common.UNKNOWN_TYPE, true),
        };
        let params = parameters.unwrap_or_default();
        let templateTypes: Vec<TypeId> = templateScope.iter().map(|(_, ty)| *ty).collect();

        let fnType = if isConstructor || isInterface {
            let kind = if isInterface {
                FunctionKind::INTERFACE
            } else {
                FunctionKind::CONSTRUCTOR
            };
            match existing_constructor(ctx, &fnName) {
                Some(existing) => {
                    if let Some(function) = ctx.type_registry.ty_mut(existing).function_mut() {
                        if function.source.is_none() {
                            function.source = sourceNode;
                        }
                    }
                    existing
                }
                None => {
                    let ctor = ctx.type_registry.create_constructor_type(
                        &fnName,
                        sourceNode,
                        params,
                        templateTypes,
                        kind,
                    );
                    if let (Some(base), false) = (baseType, isInterface) {
                        ctx.type_registry.set_prototype_based_on(ctor, base);
                    }
                    if ctx.scopes[scope].isGlobal() && !fnName.is_empty() {
                        if let Some(instance) = ctx.type_registry.instance_of_constructor(ctor) {
                            ctx.type_registry.declare_type(&fnName, instance);
                        }
                    }
                    ctor
                }
            }
        } else {
            let function = ctx.type_registry.create_function_type(params, returnType);
            if let Some(fnType) = ctx.type_registry.ty_mut(function).function_mut() {
                fnType.inferred_return_type = returnTypeInferred;
                fnType.type_of_this = thisType;
                fnType.template_types = templateTypes;
                fnType.source = sourceNode;
            }
            function
        };

        if !implementedInterfaces.is_empty() {
            if let Some(function) = ctx.type_registry.ty_mut(fnType).function_mut() {
                function.implemented_interfaces = implementedInterfaces;
            }
        }
        tracing::trace!(
            name = &*fnName,
            ty = %ctx.type_registry.type_to_string(fnType),
            "built function type"
        );
        fnType
    }

    fn evaluate(&mut self, expr: &TypeExpr) -> TypeId {
        self.ctx
            .type_registry
            .evaluate_type_expression(expr, &self.templateScope)
    }

    fn evaluate_parameter(&mut self, expr: &TypeExpr) -> Parameter {
        match expr {
            TypeExpr::VarArgs(inner) => Parameter {
                ty: self.evaluate(inner),
                optional: true,
                var_args: true,
            },
            TypeExpr::Optional(_) => Parameter {
                ty: self.evaluate(expr),
                optional: true,
                var_args: false,
            },
            _ => Parameter::new(self.evaluate(expr)),
        }
    }
}

/// The constructor already registered under `name`, which a redeclaration
/// such as an externs definition of a native class reuses.
fn existing_constructor(ctx: &Ctx, name: &str) -> Option<TypeId> {
    if name.is_empty() {
        return None;
    }
    let registry = &ctx.type_registry;
    if name == "Function" {
        return Some(registry.common_types.FUNCTION_FUNCTION_TYPE);
    }
    let existing = registry.resolve(registry.get_type_by_name(name)?);
    if !registry.is_instance_type(existing) {
        return None;
    }
    let ctor = match registry.kind(existing) {
        TyKind::INSTANCE_OBJECT(object) => object.constructor?,
        _ => return None,
    };
    if registry.is_constructor(ctor) || registry.is_interface(ctor) {
        Some(ctor)
    } else {
        None
    }
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use crate::first_order_function_analyzer::FirstOrderFunctionAnalyzer;
    use crate::options::InferenceOptions;
    use crate::typed_scope::TypedScope;
    use ast::{Ast, JSDocFlags};
    use pretty_assertions::assert_eq;

    fn global_ctx(ast: &Ast) -> Ctx<'_> {
        let mut ctx = Ctx::new(ast, InferenceOptions::default());
        let root = ast.root();
        ctx.function_analysis = Some(FirstOrderFunctionAnalyzer::new(ast, true).process(root));
        let this = ctx.type_registry.common_types.GLOBAL_THIS;
        ctx.push_scope(root, |id| TypedScope::createGlobalScope(id, root, this));
        ctx
    }

    fn first_function(ast: &Ast) -> NodeId {
        let mut found = None;
        node_util::pre_order(ast, ast.root(), &mut |n| {
            if found.is_none() && ast.is(n, Token::Function) {
                found = Some(n);
            }
            found.is_none()
        });
        found.unwrap()
    }

    fn build(ctx: &mut Ctx, name: &str, function: NodeId, info: Option<&JSDocInfo>) -> TypeId {
        let ast = ctx.ast;
        let scope = ctx.scope_for_root(ast.root()).unwrap();
        let params = node_util::function_params(ast, function);
        FunctionTypeBuilder::new(ctx, Some(JsWord::from(name)), scope)
            .setContents(Some(function))
            .inferTemplateTypeName(info)
            .inferReturnType(info)
            .inferInheritance(info)
            .inferThisType(info)
            .inferParameterTypes(params, info)
            .buildAndRegister()
    }

    #[test]
    fn testEmptyFunctionReturnsVoid() {
        let mut ast = Ast::new();
        parser::parse_script(&mut ast, "test.js", "function f(a, b) {}").unwrap();
        let mut ctx = global_ctx(&ast);
        let function = first_function(&ast);
        let fnType = build(&mut ctx, "f", function, None);

        let registry = &ctx.type_registry;
        let f = registry.get_function(fnType).unwrap();
        assert_eq!(f.return_type, registry.common_types.VOID_TYPE);
        assert!(f.inferred_return_type);
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].ty, registry.common_types.UNKNOWN_TYPE);
    }

    #[test]
    fn testSingleThrowReturnsUnknown() {
        let mut ast = Ast::new();
        parser::parse_script(&mut ast, "test.js", "function f() { throw 1; }").unwrap();
        let mut ctx = global_ctx(&ast);
        let function = first_function(&ast);
        let fnType = build(&mut ctx, "f", function, None);

        let registry = &ctx.type_registry;
        assert_eq!(
            registry.get_function(fnType).unwrap().return_type,
            registry.common_types.UNKNOWN_TYPE
        );
    }

    #[test]
    fn testAnnotatedParametersAndReturn() {
        let mut ast = Ast::new();
        parser::parse_script(&mut ast, "test.js", "function f(a, b) { return a; }").unwrap();
        let mut ctx = global_ctx(&ast);
        let function = first_function(&ast);
        let info = JSDocInfo {
            params: vec![
                (JsWord::from("a"), TypeExpr::named("number")),
                (
                    JsWord::from("b"),
                    TypeExpr::Optional(Box::new(TypeExpr::named("string"))),
                ),
            ],
            return_type: Some(TypeExpr::named("number")),
            ..JSDocInfo::default()
        };
        let fnType = build(&mut ctx, "f", function, Some(&info));

        assert_eq!(
            ctx.type_registry.type_to_string(fnType),
            "function (number, (string|undefined)=): number"
        );
        let f = ctx.type_registry.get_function(fnType).unwrap();
        assert!(!f.inferred_return_type);
        assert!(f.params[1].optional);
    }

    #[test]
    fn testConstructorIsRegisteredGlobally() {
        let mut ast = Ast::new();
        parser::parse_script(&mut ast, "test.js", "function Foo() {}").unwrap();
        let mut ctx = global_ctx(&ast);
        let function = first_function(&ast);
        let info = JSDocInfo {
            flags: JSDocFlags::CONSTRUCTOR,
            ..JSDocInfo::default()
        };
        let ctor = build(&mut ctx, "Foo", function, Some(&info));

        let registry = &ctx.type_registry;
        assert!(registry.is_constructor(ctor));
        assert_eq!(
            registry.get_type_by_name("Foo"),
            registry.instance_of_constructor(ctor)
        );

        // A second definition reuses the registered constructor.
        let again = build(&mut ctx, "Foo", function, Some(&info));
        assert_eq!(again, ctor);
    }

    #[test]
    fn testOverriddenFunctionFillsMissingParameters() {
        let mut ast = Ast::new();
        parser::parse_script(&mut ast, "test.js", "var g = function(a) {};").unwrap();
        let mut ctx = global_ctx(&ast);
        let function = first_function(&ast);
        let common = ctx.type_registry.common_types;
        let overridden = ctx.type_registry.create_function_type(
            vec![Parameter::new(common.NUMBER_TYPE), Parameter::new(common.STRING_TYPE)],
            common.BOOLEAN_TYPE,
        );
        let scope = ctx.scope_for_root(ast.root()).unwrap();
        let params = node_util::function_params(&ast, function);
        let fnType = FunctionTypeBuilder::new(&mut ctx, Some(JsWord::from("g")), scope)
            .setContents(Some(function))
            .inferFromOverriddenFunction(Some(overridden), params)
            .inferParameterTypes(params, None)
            .buildAndRegister();

        let f = ctx.type_registry.get_function(fnType).unwrap();
        assert_eq!(f.return_type, common.BOOLEAN_TYPE);
        assert_eq!(f.params.len(), 2);
        assert_eq!(f.params[0].ty, common.NUMBER_TYPE);
        assert!(f.params[1].optional);
    }
}
