use ast::{node_util, Ast, JsWord, NodeId, Token};
use rustc_hash::{FxHashMap, FxHashSet};

/// What a single function does to the names around it, as far as can be told
/// without types.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AstFunctionContents {
    hasNonEmptyReturns: bool,
    /// Locals of this function assigned from an inner function.
    escapedVarNames: FxHashSet<JsWord>,
    /// Qualified names rooted at a local of this function and assigned from an
    /// inner function.
    escapedQualifiedNames: FxHashSet<JsWord>,
    assignedVarNames: FxHashMap<JsWord, usize>,
}

impl AstFunctionContents {
    pub fn mayHaveNonEmptyReturns(&self) -> bool {
        self.hasNonEmptyReturns
    }

    pub fn getEscapedVarNames(&self) -> &FxHashSet<JsWord> {
        &self.escapedVarNames
    }

    pub fn getEscapedQualifiedNames(&self) -> &FxHashSet<JsWord> {
        &self.escapedQualifiedNames
    }

    /// How many times each local of this function is assigned, counting its
    /// declaration.
    pub fn getAssignedNameCounts(&self) -> &FxHashMap<JsWord, usize> {
        &self.assignedVarNames
    }

    fn recordNonEmptyReturn(&mut self) {
        self.hasNonEmptyReturns = true;
    }

    fn recordEscapedVarName(&mut self, name: &JsWord) {
        self.escapedVarNames.insert(name.clone());
    }

    fn recordEscapedQualifiedName(&mut self, name: JsWord) {
        self.escapedQualifiedNames.insert(name);
    }

    fn recordAssignedName(&mut self, name: &JsWord) {
        *self.assignedVarNames.entry(name.clone()).or_insert(0) += 1;
    }
}

/// [AstFunctionContents] for every function of a program, by FUNCTION node.
#[derive(Debug, Clone, Default)]
pub struct FunctionAnalysisResults {
    data: FxHashMap<NodeId, AstFunctionContents>,
}

impl FunctionAnalysisResults {
    pub fn get(&self, function: NodeId) -> Option<&AstFunctionContents> {
        self.data.get(&function)
    }
}

/// A lexical scope as seen before any types exist: the names declared
/// directly in the program or in one function.
struct SyntacticScope {
    root: NodeId,
    names: FxHashSet<JsWord>,
}

/**
 * Collects, in one walk over the whole program, the facts about every
 * function that scope creation and type inference need before either of them
 * looks at a function body: which locals are assigned and how often, which
 * are assigned from inner functions, and whether the function returns a
 * value.
 */
pub struct FirstOrderFunctionAnalyzer<'a> {
    ast: &'a Ast,
    recordEscapedVars: bool,
    scopes: Vec<SyntacticScope>,
    data: FxHashMap<NodeId, AstFunctionContents>,
}

impl<'a> FirstOrderFunctionAnalyzer<'a> {
    pub fn new(ast: &'a Ast, recordEscapedVars: bool) -> Self {
        Self {
            ast,
            recordEscapedVars,
            scopes: Vec::new(),
            data: FxHashMap::default(),
        }
    }

    pub fn process(mut self, root: NodeId) -> FunctionAnalysisResults {
        self.enterScope(root);
        for &child in self.ast.children(root) {
            self.traverse(child);
        }
        self.scopes.pop();
        tracing::debug!(functions = self.data.len(), "analyzed functions");
        FunctionAnalysisResults { data: self.data }
    }

    fn inGlobalScope(&self) -> bool {
        self.scopes.len() <= 1
    }

    fn enterScope(&mut self, root: NodeId) {
        let names = collect_declared_names(self.ast, root);
        if !self.scopes.is_empty() {
            self.data.insert(root, AstFunctionContents::default());
        }
        self.scopes.push(SyntacticScope { root, names });
    }

    fn traverse(&mut self, n: NodeId) {
        if self.ast.is(n, Token::Function) {
            // A declared function's name belongs to the enclosing scope.
            if let Some(name) = node_util::function_name(self.ast, n) {
                self.visit(name);
            }
            self.enterScope(n);
            for &child in &self.ast.children(n)[1..] {
                self.traverse(child);
            }
            self.scopes.pop();
            return;
        }
        self.visit(n);
        for &child in self.ast.children(n) {
            self.traverse(child);
        }
    }

    /// The index of the innermost scope declaring `name`.
    fn getOwnerScope(&self, name: &str) -> Option<usize> {
        self.scopes.iter().rposition(|scope| scope.names.contains(&JsWord::from(name)))
    }

    fn visit(&mut self, n: NodeId) {
        if self.inGlobalScope() {
            return;
        }
        let ast = self.ast;
        let current = self.scopes.len() - 1;
        let scopeRoot = self.scopes[current].root;

        if ast.is(n, Token::Return) && ast.has_children(n) {
            if let Some(contents) = self.data.get_mut(&scopeRoot) {
                contents.recordNonEmptyReturn();
            }
        }

        if ast.is(n, Token::Name)
            && node_util::is_lvalue(ast, n)
            && !node_util::is_bleeding_function_name(ast, n)
        {
            let name = ast.string(n);
            if let Some(owner) = self.getOwnerScope(name) {
                // Index 0 is the global scope.
                if owner == 0 {
                    return;
                }
                let ownerRoot = self.scopes[owner].root;
                let recordEscapedVars = self.recordEscapedVars;
                if let Some(contents) = self.data.get_mut(&ownerRoot) {
                    contents.recordAssignedName(name);
                    if recordEscapedVars && owner != current {
                        contents.recordEscapedVarName(name);
                    }
                }
            }
        } else if ast.is(n, Token::GetProp)
            && node_util::is_unscoped_qualified_name(ast, n)
            && node_util::is_lvalue(ast, n)
        {
            let root = node_util::get_root_of_qualified_name(ast, n);
            if let Some(owner) = self.getOwnerScope(ast.string(root)) {
                if owner != 0 && owner != current {
                    let ownerRoot = self.scopes[owner].root;
                    if let (Some(contents), Some(qname)) = (
                        self.data.get_mut(&ownerRoot),
                        node_util::get_qualified_name(ast, n),
                    ) {
                        contents.recordEscapedQualifiedName(qname);
                    }
                }
            }
        }
    }
}

/// The names declared directly in the scope rooted at `root`: `var`s,
/// function declarations and catch bindings of its body, and for a function
/// its parameters and, for a function expression, its own name.
pub(crate) fn collect_declared_names(ast: &Ast, root: NodeId) -> FxHashSet<JsWord> {
    let mut names = FxHashSet::default();
    let body = if ast.is(root, Token::Function) {
        if node_util::is_function_expression(ast, root) && node_util::function_has_name(ast, root) {
            if let Some(name) = node_util::function_name(ast, root) {
                names.insert(ast.string(name).clone());
            }
        }
        if let Some(params) = node_util::function_params(ast, root) {
            for &param in ast.children(params) {
                names.insert(ast.string(param).clone());
            }
        }
        match node_util::function_body(ast, root) {
            Some(body) => body,
            None => return names,
        }
    } else {
        root
    };

    node_util::pre_order(ast, body, &mut |n| match ast.token(n) {
        Token::Function => {
            if node_util::is_function_declaration(ast, n) {
                if let Some(name) = node_util::function_name(ast, n) {
                    names.insert(ast.string(name).clone());
                }
            }
            false
        }
        Token::Var => {
            for &name in ast.children(n) {
                names.insert(ast.string(name).clone());
            }
            true
        }
        Token::Catch => {
            if let Some(name) = ast.first_child(n) {
                names.insert(ast.string(name).clone());
            }
            true
        }
        _ => true,
    });
    names
}

#[cfg(test)]
#[allow(non_snake_case)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn analyze(src: &str, recordEscapedVars: bool) -> (Ast, FunctionAnalysisResults) {
        let mut ast = Ast::new();
        parser::parse_script(&mut ast, "test.js", src).unwrap();
        let results = FirstOrderFunctionAnalyzer::new(&ast, recordEscapedVars).process(ast.root());
        (ast, results)
    }

    fn function_named(ast: &Ast, name: &str) -> NodeId {
        ast.node_ids()
            .find(|&n| {
                ast.is(n, Token::Function)
                    && node_util::function_name(ast, n).map_or(false, |f| &**ast.string(f) == name)
            })
            .unwrap()
    }

    #[test]
    fn testAssignmentCounts() {
        let (ast, results) = analyze("function f(a) { var x = 1; var y; y = 2; y = 3; a = 4; }", true);
        let contents = results.get(function_named(&ast, "f")).unwrap();
        let counts = contents.getAssignedNameCounts();
        assert_eq!(counts.get(&JsWord::from("x")), Some(&1));
        // The declaration counts as an assignment.
        assert_eq!(counts.get(&JsWord::from("y")), Some(&3));
        // So does binding the parameter.
        assert_eq!(counts.get(&JsWord::from("a")), Some(&2));
    }

    #[test]
    fn testGlobalAssignmentsAreNotRecorded() {
        let (ast, results) = analyze("var g; function f() { g = 1; }", true);
        let contents = results.get(function_named(&ast, "f")).unwrap();
        assert!(contents.getAssignedNameCounts().is_empty());
        assert!(contents.getEscapedVarNames().is_empty());
    }

    #[test]
    fn testEscapedVarNames() {
        let src = "function f() { var x = 1; var y = 2; function g() { x = 2; return y; } }";
        let (ast, results) = analyze(src, true);
        let contents = results.get(function_named(&ast, "f")).unwrap();
        assert!(contents.getEscapedVarNames().contains(&JsWord::from("x")));
        assert!(!contents.getEscapedVarNames().contains(&JsWord::from("y")));

        let (ast, results) = analyze(src, false);
        let contents = results.get(function_named(&ast, "f")).unwrap();
        assert!(contents.getEscapedVarNames().is_empty());
        assert_eq!(contents.getAssignedNameCounts().get(&JsWord::from("x")), Some(&2));
    }

    #[test]
    fn testShadowedNameDoesNotEscape() {
        let src = "function f() { var x = 1; function g() { var x; x = 2; } }";
        let (ast, results) = analyze(src, true);
        let f = results.get(function_named(&ast, "f")).unwrap();
        assert!(f.getEscapedVarNames().is_empty());
        let g = results.get(function_named(&ast, "g")).unwrap();
        assert_eq!(g.getAssignedNameCounts().get(&JsWord::from("x")), Some(&2));
    }

    #[test]
    fn testEscapedQualifiedNames() {
        let src = "function f() { var a = {}; a.b = 1; function g() { a.c = 2; } }";
        let (ast, results) = analyze(src, true);
        let contents = results.get(function_named(&ast, "f")).unwrap();
        let escaped: Vec<_> = contents.getEscapedQualifiedNames().iter().cloned().collect();
        assert_eq!(escaped, vec![JsWord::from("a.c")]);
    }

    #[test]
    fn testNonEmptyReturns() {
        let (ast, results) = analyze("function f() { return 1; } function g() { return; }", true);
        assert!(results.get(function_named(&ast, "f")).unwrap().mayHaveNonEmptyReturns());
        assert!(!results.get(function_named(&ast, "g")).unwrap().mayHaveNonEmptyReturns());
    }

    #[test]
    fn testCollectDeclaredNames() {
        let mut ast = Ast::new();
        parser::parse_script(
            &mut ast,
            "test.js",
            "var h = function inner(p) { var v; try {} catch (e) {} function d() { var hidden; } };",
        )
        .unwrap();
        let function = function_named(&ast, "inner");
        let mut names: Vec<String> = collect_declared_names(&ast, function)
            .into_iter()
            .map(|name| name.to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["d", "e", "inner", "p", "v"]);
    }
}
