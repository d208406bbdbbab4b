#![allow(non_upper_case_globals)]

use ast::{Ast, JsWord, NodeId};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CheckLevel {
    OFF,
    WARNING,
    ERROR,
}

impl fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CheckLevel::OFF => "OFF",
            CheckLevel::WARNING => "WARNING",
            CheckLevel::ERROR => "ERROR",
        })
    }
}

/// A kind of problem found in the analysed program. `format` holds `{0}`
/// style placeholders filled from the report's arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DiagnosticType {
    pub key: &'static str,
    pub format: &'static str,
    pub default_level: CheckLevel,
}

impl DiagnosticType {
    pub const fn warning(key: &'static str, format: &'static str) -> Self {
        Self {
            key,
            format,
            default_level: CheckLevel::WARNING,
        }
    }

    pub fn format(&self, args: &[&str]) -> String {
        let mut description = self.format.to_string();
        for (i, arg) in args.iter().enumerate() {
            description = description.replace(&format!("{{{}}}", i), arg);
        }
        description
    }
}

pub const MALFORMED_TYPEDEF: DiagnosticType = DiagnosticType::warning(
    "JSC_MALFORMED_TYPEDEF",
    "Typedef for {0} does not have any type information",
);

pub const ENUM_INITIALIZER: DiagnosticType = DiagnosticType::warning(
    "JSC_ENUM_INITIALIZER_NOT_ENUM",
    "enum initializer must be an object literal or an enum",
);

pub const CTOR_INITIALIZER: DiagnosticType = DiagnosticType::warning(
    "JSC_CTOR_INITIALIZER_NOT_CTOR",
    "Constructor {0} must be initialized at declaration",
);

pub const IFACE_INITIALIZER: DiagnosticType = DiagnosticType::warning(
    "JSC_IFACE_INITIALIZER_NOT_IFACE",
    "Interface {0} must be initialized at declaration",
);

pub const CONSTRUCTOR_EXPECTED: DiagnosticType = DiagnosticType::warning(
    "JSC_REFLECT_CONSTRUCTOR_EXPECTED",
    "Constructor expected as first argument",
);

pub const UNKNOWN_LENDS: DiagnosticType = DiagnosticType::warning(
    "JSC_UNKNOWN_LENDS",
    "Variable {0} not declared before @lends annotation.",
);

pub const LENDS_ON_NON_OBJECT: DiagnosticType = DiagnosticType::warning(
    "JSC_LENDS_ON_NON_OBJECT",
    "May only lend properties to object types. {0} has type {1}.",
);

pub const MULTIPLE_VAR_DEF: DiagnosticType = DiagnosticType::warning(
    "JSC_MULTIPLE_VAR_DEF",
    "declaration of multiple variables with shared type information",
);

pub const ENUM_NOT_CONSTANT: DiagnosticType = DiagnosticType::warning(
    "JSC_ENUM_NOT_CONSTANT",
    "enum key {0} must be a syntactic constant",
);

pub const DUP_VAR_DECLARATION: DiagnosticType = DiagnosticType::warning(
    "JSC_DUP_VAR_DECLARATION",
    "variable {0} redefined with type {1}, original definition at {2}:{3} with type {4}",
);

pub const FUNCTION_LITERAL_UNDEFINED_THIS: DiagnosticType = DiagnosticType::warning(
    "JSC_FUNCTION_LITERAL_UNDEFINED_THIS",
    "Function literal argument refers to undefined this argument",
);

pub const ALL_DIAGNOSTICS: &[DiagnosticType] = &[
    MALFORMED_TYPEDEF,
    ENUM_INITIALIZER,
    CTOR_INITIALIZER,
    IFACE_INITIALIZER,
    CONSTRUCTOR_EXPECTED,
    UNKNOWN_LENDS,
    LENDS_ON_NON_OBJECT,
    MULTIPLE_VAR_DEF,
    ENUM_NOT_CONSTANT,
    DUP_VAR_DECLARATION,
    FUNCTION_LITERAL_UNDEFINED_THIS,
];

/// One reported problem.
#[derive(Debug, Clone, PartialEq)]
pub struct JSError {
    pub kind: DiagnosticType,
    pub description: String,
    pub source_name: JsWord,
    pub line: u32,
    pub col: u32,
    pub level: CheckLevel,
}

impl JSError {
    pub fn make(ast: &Ast, node: NodeId, kind: DiagnosticType, args: &[&str]) -> Self {
        Self {
            kind,
            description: kind.format(args),
            source_name: ast.source_name(node).clone(),
            line: ast.line(node),
            col: ast.col(node),
            level: kind.default_level,
        }
    }
}

impl fmt::Display for JSError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} - {}",
            self.source_name, self.line, self.level, self.description
        )
    }
}

/// Collects the diagnostics of a compilation, applying the configured
/// severity of each diagnostic key.
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    levels: FxHashMap<String, CheckLevel>,
    errors: Vec<JSError>,
}

impl DiagnosticSink {
    pub fn new(levels: FxHashMap<String, CheckLevel>) -> Self {
        Self {
            levels,
            errors: Vec::new(),
        }
    }

    pub fn report(&mut self, mut error: JSError) {
        let level = self
            .levels
            .get(error.kind.key)
            .copied()
            .unwrap_or(error.kind.default_level);
        if level == CheckLevel::OFF {
            tracing::trace!(key = error.kind.key, "diagnostic suppressed");
            return;
        }
        error.level = level;
        tracing::debug!(key = error.kind.key, "{}", error);
        self.errors.push(error);
    }

    pub fn errors(&self) -> &[JSError] {
        &self.errors
    }

    pub fn error_count(&self) -> usize {
        self.count(CheckLevel::ERROR)
    }

    pub fn warning_count(&self) -> usize {
        self.count(CheckLevel::WARNING)
    }

    fn count(&self, level: CheckLevel) -> usize {
        self.errors.iter().filter(|e| e.level == level).count()
    }
}
