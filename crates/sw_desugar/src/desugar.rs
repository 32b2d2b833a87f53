//! Top-level entry points.
//!
//! Parses the source, analyzes scopes, runs the [`Desugarer`] and prints the
//! module back out. A module in which nothing was rewritten is returned as
//! the exact input text.

use sw_ast::{Config, Module, TransformSet};
use sw_parser::{emit_module, parse_source};
use swc_ecma_visit::VisitMutWith;

use crate::diagnostics::{DiagnosticSink, NullSink, TracingSink};
use crate::driver::Desugarer;
use crate::error::TransformError;

/// Filename assumed by [`transform`], which picks the TSX grammar.
pub const DEFAULT_FILENAME: &str = "input.tsx";

pub struct Desugared {
    pub module: Module,
    /// Nodes changed by the pass. Zero means the module is untouched.
    pub rewrites: usize,
}

/// Run every enabled transform over an already parsed module.
pub fn desugar_module(
    mut module: Module,
    transforms: TransformSet,
    sink: &mut dyn DiagnosticSink,
) -> Result<Desugared, TransformError> {
    let tree = sw_scope::analyze(&module);
    let mut desugarer = Desugarer::new(&tree, transforms, sink);
    module.visit_mut_with(&mut desugarer);
    let rewrites = desugarer.finish()?;
    Ok(Desugared { module, rewrites })
}

/// Transform source text with the given configuration.
pub fn transform(source: &str, config: &Config) -> Result<String, TransformError> {
    transform_file(source, DEFAULT_FILENAME, config)
}

/// Like [`transform`], choosing the grammar from `filename`.
///
/// With `config.debug` set, every rewrite is logged through `tracing`.
pub fn transform_file(source: &str, filename: &str, config: &Config) -> Result<String, TransformError> {
    if config.debug {
        transform_with_sink(source, filename, config.transforms, &mut TracingSink)
    } else {
        transform_with_sink(source, filename, config.transforms, &mut NullSink)
    }
}

pub fn transform_with_sink(
    source: &str,
    filename: &str,
    transforms: TransformSet,
    sink: &mut dyn DiagnosticSink,
) -> Result<String, TransformError> {
    let _span = tracing::debug_span!("transform", filename).entered();
    let parsed = parse_source(source, filename)?;
    let desugared = desugar_module(parsed.module, transforms, sink)?;
    if desugared.rewrites == 0 {
        tracing::debug!("nothing to rewrite");
        return Ok(source.to_string());
    }
    let emitted = emit_module(&desugared.module, &parsed.source_map, Some(&parsed.comments), false)?;
    tracing::debug!(rewrites = desugared.rewrites, bytes = emitted.code.len(), "emitted");
    Ok(emitted.code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::EventLog;
    use indoc::indoc;
    use pretty_assertions::assert_eq;
    use sw_ast::Transform;

    fn squash(s: &str) -> String {
        s.chars().filter(|c| !c.is_whitespace()).collect()
    }

    fn run(src: &str) -> String {
        transform(src, &Config::default()).unwrap()
    }

    fn assert_contains(output: &str, fragment: &str) {
        assert!(
            squash(output).contains(&squash(fragment)),
            "expected output to contain\n{fragment}\n---- output ----\n{output}"
        );
    }

    #[test]
    fn empty_source_is_returned_as_is() {
        assert_eq!(run(""), "");
    }

    #[test]
    fn untouched_source_is_byte_identical() {
        let src = "const  x = a === b ;\n// keep me\nfoo( 1 )\n";
        assert_eq!(run(src), src);
    }

    #[test]
    fn syntax_errors_are_reported() {
        let err = transform("if (( {", &Config::default()).unwrap_err();
        assert!(matches!(err, TransformError::Parse(_)), "{err}");
    }

    #[test]
    fn strict_equality() {
        let out = run("if (a == b && c != d) {}");
        assert_contains(&out, "a === b && c !== d");
        assert!(!squash(&out).contains("a==b"));
    }

    #[test]
    fn println_with_string_literal() {
        let out = run(r#"println("Hello World");"#);
        assert_contains(&out, r#"console.log(`${"Hello World"}\n`);"#);
    }

    #[test]
    fn println_without_arguments_is_unchanged() {
        assert_eq!(run("println();"), "println();");
    }

    #[test]
    fn defer_wraps_function_body() {
        let out = run(indoc! {"
            function read(path) {
                const fd = open(path);
                defer(() => close(fd));
                return consume(fd);
            }
        "});
        assert_contains(
            &out,
            indoc! {"
                function read(path) {
                    const _defers = [];
                    try {
                        const fd = open(path);
                        _defers.push(() => close(fd));
                        return consume(fd);
                    } finally {
                        for (let i = _defers.length - 1; i >= 0; i--) {
                            try {
                                _defers[i]();
                            } catch (e) {
                                console.log(e);
                            }
                        }
                    }
                }
            "},
        );
    }

    #[test]
    fn shadowed_defer_is_left_alone() {
        let src = "function f(defer) {\n    defer(() => 1);\n}\n";
        assert_eq!(run(src), src);
    }

    #[test]
    fn async_functions_stay_async() {
        let out = run("async function f() { defer(() => done()); await work(); }");
        assert_contains(&out, "async function f() { const _defers = [];");
        assert_contains(&out, "await work();");
    }

    #[test]
    fn generated_name_avoids_existing_identifiers() {
        let out = run("const _defers = 1; function f() { defer(g); }");
        assert_contains(&out, "const _defers2 = [];");
        assert_contains(&out, "_defers2.push(g);");
    }

    #[test]
    fn transforms_can_be_disabled() {
        let config = Config {
            debug: false,
            transforms: [Transform::Println].into_iter().collect(),
        };
        let out = transform("function f() { defer(g); println(a == b); }", &config).unwrap();
        assert_contains(&out, "defer(g);");
        assert_contains(&out, "console.log(`${a == b}\\n`);");
    }

    #[test]
    fn sink_sees_every_rewrite() {
        let mut log = EventLog::new();
        transform_with_sink(
            "function f() { defer(g); } x != y;",
            "input.js",
            TransformSet::default(),
            &mut log,
        )
        .unwrap();
        assert_eq!(log.count(Transform::Defer), 1);
        assert_eq!(log.count(Transform::Equality), 1);
    }

    #[test]
    fn typescript_is_accepted() {
        let out = run("function f(x: number): void { defer(() => g(x)); }");
        assert_contains(&out, "function f(x: number): void {");
        assert_contains(&out, "_defers.push(() => g(x));");
    }
}
