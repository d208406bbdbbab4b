#![allow(non_snake_case)]

use anyhow::{bail, Context, Result};
use ast::{node_util, Ast, Token};
use clap::{Parser, ValueEnum};
use config::{load_config, Config};
use std::{fs::read_to_string, path::PathBuf};
use tracing_subscriber::EnvFilter;
use type_inference::{infer_types, CheckLevel, CodingConventionKind, ScopeId, TypedProgram};

mod config;

/// Infers the types of JavaScript annotated with Closure JSDoc and reports
/// the problems found while doing so.
#[derive(Parser, Debug)]
#[command(name = "jsinfer", version)]
struct Args {
    /// Source files, analysed in order.
    #[arg(required = true)]
    files: Vec<PathBuf>,

    /// Externs files declaring the environment, read before the sources.
    #[arg(long = "externs", value_name = "FILE")]
    externs: Vec<PathBuf>,

    /// JSON configuration file.
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Overrides the configured coding convention.
    #[arg(long, value_enum)]
    convention: Option<Convention>,

    /// Narrow locals even when an inner function assigns them.
    #[arg(long)]
    no_escaped_vars: bool,

    /// Silences a diagnostic key, e.g. `JSC_UNKNOWN_LENDS`.
    #[arg(long = "off", value_name = "KEY")]
    off: Vec<String>,

    /// Prints the inferred type of every declared name, scope by scope.
    #[arg(long)]
    dump_types: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Convention {
    Default,
    Closure,
}

impl From<Convention> for CodingConventionKind {
    fn from(convention: Convention) -> Self {
        match convention {
            Convention::Default => CodingConventionKind::Default,
            Convention::Closure => CodingConventionKind::Closure,
        }
    }
}

/// Installs a stderr subscriber filtered by `JSINFER_LOG`, falling back to
/// `RUST_LOG`. Nothing is installed when neither is set.
fn init_tracing() {
    let filter = match std::env::var("JSINFER_LOG") {
        Ok(val) => EnvFilter::builder().parse_lossy(val),
        Err(_) if std::env::var("RUST_LOG").is_ok() => EnvFilter::from_default_env(),
        Err(_) => return,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    apply_args(&mut config, &args);

    let mut ast = Ast::new();
    for path in config.externs.iter().chain(args.externs.iter()) {
        let src = read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        parser::parse_externs(&mut ast, &path.to_string_lossy(), &src)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
    }
    for path in &args.files {
        let src = read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        parser::parse_script(&mut ast, &path.to_string_lossy(), &src)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
    }
    tracing::debug!(nodes = ast.len(), "parsed");

    let program = infer_types(&ast, config.inference).context("Type inference failed")?;

    for error in program.diagnostics() {
        println!("{}", error);
    }
    if args.dump_types {
        print!("{}", dump_types(&program));
    }

    let diagnostics = &program.ctx.diagnostics;
    println!(
        "{} error(s), {} warning(s)",
        diagnostics.error_count(),
        diagnostics.warning_count()
    );
    if diagnostics.error_count() > 0 {
        bail!("type inference reported errors");
    }
    Ok(())
}

fn apply_args(config: &mut Config, args: &Args) {
    let options = &mut config.inference;
    if let Some(convention) = args.convention {
        options.coding_convention = convention.into();
    }
    if args.no_escaped_vars {
        options.record_escaped_vars = false;
    }
    for key in &args.off {
        options.check_levels.insert(key.clone(), CheckLevel::OFF);
    }
}

/// Every scope with the names declared in the analysed sources and their
/// types. Names from externs and natives are left out.
fn dump_types(program: &TypedProgram) -> String {
    let ctx = &program.ctx;
    let ast = ctx.ast;
    let mut out = String::new();
    for scope in ctx.scopes.iter() {
        if scope.isBottom() {
            continue;
        }
        out.push_str(&scope_title(program, scope.id()));
        out.push('\n');
        for var in scope.getVarIterable() {
            let var = &ctx.vars[var];
            let fromSource = var
                .getNameNode()
                .map_or(false, |name| !ast.is_from_externs(name));
            if !fromSource {
                continue;
            }
            let ty = match var.getType() {
                Some(ty) => ctx.type_registry.type_to_string(ty),
                None => "?".to_string(),
            };
            out.push_str(&format!("  {}: {}\n", var.getName(), ty));
        }
    }
    out
}

fn scope_title(program: &TypedProgram, scope: ScopeId) -> String {
    let ast = program.ctx.ast;
    let root = program.ctx.scopes[scope].getRootNode();
    if !ast.is(root, Token::Function) {
        return "global".to_string();
    }
    let name = node_util::get_best_lvalue_name(ast, node_util::get_best_lvalue(ast, root));
    format!(
        "function {} ({}:{})",
        name.as_deref().unwrap_or("<anonymous>"),
        ast.source_name(root),
        ast.line(root)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use type_inference::InferenceOptions;

    #[test]
    fn testArgsOverrideConfig() {
        let args = Args::parse_from([
            "jsinfer",
            "--convention",
            "default",
            "--no-escaped-vars",
            "--off",
            "JSC_UNKNOWN_LENDS",
            "a.js",
        ]);
        let mut config = Config::default();
        apply_args(&mut config, &args);

        assert_eq!(args.files, vec![PathBuf::from("a.js")]);
        assert_eq!(config.inference.coding_convention, CodingConventionKind::Default);
        assert!(!config.inference.record_escaped_vars);
        assert_eq!(
            config.inference.check_levels.get("JSC_UNKNOWN_LENDS"),
            Some(&CheckLevel::OFF)
        );
    }

    #[test]
    fn testDumpTypes() {
        let mut ast = Ast::new();
        parser::parse_script(&mut ast, "a.js", "var x = 1;\nfunction f(a) { var y = 'b'; }").unwrap();
        let program = infer_types(&ast, InferenceOptions::default()).unwrap();

        let dump = dump_types(&program);
        assert!(dump.starts_with("global\n"));
        assert!(dump.contains("  x: number\n"));
        assert!(dump.contains("function f (a.js:2)\n"));
        assert!(dump.contains("  y: string\n"));
    }
}
