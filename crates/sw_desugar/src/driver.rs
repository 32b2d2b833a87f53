//! The pass that applies every enabled transform in one walk of the module.

use std::collections::HashSet;

use sw_ast::TransformSet;
use sw_scope::{fresh_name, ScopeTree};
use swc_common::Span;
use swc_ecma_ast as ast;
use swc_ecma_visit::{VisitMut, VisitMutWith};

use crate::defer::{self, ACCUMULATOR_BASE};
use crate::diagnostics::{DiagnosticSink, Event};
use crate::equality;
use crate::error::TransformError;
use crate::make;
use crate::println::{self, PrintLowering};

/// Mutable visitor that rewrites a module in place.
///
/// `tree` must be the result of analyzing the module before any rewriting;
/// scopes are found by the spans of the nodes that opened them, and the
/// rewrites keep those spans.
pub struct Desugarer<'a> {
    tree: &'a ScopeTree,
    transforms: TransformSet,
    sink: &'a mut dyn DiagnosticSink,
    /// Accumulator names handed out in this pass.
    reserved: HashSet<String>,
    rewrites: usize,
    error: Option<TransformError>,
}

impl<'a> Desugarer<'a> {
    pub fn new(tree: &'a ScopeTree, transforms: TransformSet, sink: &'a mut dyn DiagnosticSink) -> Self {
        Self {
            tree,
            transforms,
            sink,
            reserved: HashSet::new(),
            rewrites: 0,
            error: None,
        }
    }

    /// Number of rewrites performed, or the first invariant violation seen.
    pub fn finish(self) -> Result<usize, TransformError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.rewrites),
        }
    }

    fn fail(&mut self, span: Span, message: &str) {
        tracing::error!(lo = span.lo.0, "{message}");
        if self.error.is_none() {
            self.error = Some(TransformError::Invariant {
                offset: span.lo.0,
                message: message.to_string(),
            });
        }
    }

    fn record(&mut self, event: Event) {
        if event.is_rewrite() {
            self.rewrites += 1;
        }
        self.sink.record(event);
    }

    /// Apply the defer rewrite to a function body (if it qualifies) and then
    /// visit the body for the other transforms and nested functions.
    fn visit_function_body(&mut self, span: Span, body: Option<&mut ast::BlockStmt>) {
        let Some(body) = body else {
            return;
        };
        if !self.transforms.defer {
            body.visit_mut_with(self);
            return;
        }
        let Some(scope) = self.tree.scope_of(span) else {
            self.fail(span, "function has no recorded scope");
            return;
        };

        let found = defer::scan_body(self.tree, scope, &body.stmts);
        for (site, binding) in &found.shadowed {
            self.record(Event::DeferShadowed {
                range: (*site).into(),
                binding: *binding,
            });
        }
        for site in &found.expression_sites {
            self.record(Event::DeferNotStatement {
                range: (*site).into(),
            });
        }
        if !found.is_eligible() {
            body.visit_mut_with(self);
            return;
        }

        let name = fresh_name(self.tree, ACCUMULATOR_BASE, &self.reserved);
        self.reserved.insert(name.clone());
        let accumulator = make::ident(&name);
        let registrations = defer::desugar_body(self.tree, scope, body, &accumulator);
        self.record(Event::DeferDesugared {
            range: span.into(),
            accumulator: name,
            registrations,
        });

        // Only the user's statements need visiting; the generated cleanup
        // code contains nothing to rewrite.
        match body.stmts.last_mut() {
            Some(ast::Stmt::Try(guarded)) => guarded.block.visit_mut_with(self),
            _ => self.fail(span, "desugared body lost its guarded block"),
        }
    }
}

impl VisitMut for Desugarer<'_> {
    fn visit_mut_function(&mut self, n: &mut ast::Function) {
        n.decorators.visit_mut_with(self);
        n.params.visit_mut_with(self);
        self.visit_function_body(n.span, n.body.as_mut());
    }

    fn visit_mut_arrow_expr(&mut self, n: &mut ast::ArrowExpr) {
        n.params.visit_mut_with(self);
        match &mut *n.body {
            ast::BlockStmtOrExpr::BlockStmt(body) => self.visit_function_body(n.span, Some(body)),
            ast::BlockStmtOrExpr::Expr(expr) => expr.visit_mut_with(self),
        }
    }

    fn visit_mut_constructor(&mut self, n: &mut ast::Constructor) {
        n.key.visit_mut_with(self);
        n.params.visit_mut_with(self);
        self.visit_function_body(n.span, n.body.as_mut());
    }

    fn visit_mut_getter_prop(&mut self, n: &mut ast::GetterProp) {
        n.key.visit_mut_with(self);
        self.visit_function_body(n.span, n.body.as_mut());
    }

    fn visit_mut_setter_prop(&mut self, n: &mut ast::SetterProp) {
        n.key.visit_mut_with(self);
        n.this_param.visit_mut_with(self);
        n.param.visit_mut_with(self);
        self.visit_function_body(n.span, n.body.as_mut());
    }

    fn visit_mut_bin_expr(&mut self, n: &mut ast::BinExpr) {
        n.visit_mut_children_with(self);
        if !self.transforms.equality {
            return;
        }
        if let Some(from) = equality::normalize_equality(n) {
            self.record(Event::EqualityNormalized {
                range: n.span.into(),
                from: equality::operator_text(from),
                to: equality::operator_text(n.op),
            });
        }
    }

    fn visit_mut_expr(&mut self, n: &mut ast::Expr) {
        if let ast::Expr::Invalid(invalid) = n {
            let span = invalid.span;
            self.fail(span, "invalid expression in parsed module");
            return;
        }

        if self.transforms.println {
            let lowering = match n {
                ast::Expr::Call(call) => println::lower_println(call),
                _ => None,
            };
            match lowering {
                Some(PrintLowering::Lowered {
                    span,
                    expr,
                    dropped_args,
                }) => {
                    *n = expr;
                    self.record(Event::PrintLowered {
                        range: span.into(),
                        dropped_args,
                    });
                }
                Some(PrintLowering::NoArguments { span }) => self.record(Event::PrintSkipped {
                    range: span.into(),
                    reason: "no arguments",
                }),
                Some(PrintLowering::SpreadArgument { span }) => self.record(Event::PrintSkipped {
                    range: span.into(),
                    reason: "spread argument",
                }),
                None => {}
            }
        }

        n.visit_mut_children_with(self);
    }

    fn visit_mut_pat(&mut self, n: &mut ast::Pat) {
        if let ast::Pat::Invalid(invalid) = n {
            let span = invalid.span;
            self.fail(span, "invalid pattern in parsed module");
            return;
        }
        n.visit_mut_children_with(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::EventLog;
    use sw_ast::Transform;
    use sw_parser::parse_source;
    use swc_common::DUMMY_SP;

    fn run(src: &str, transforms: TransformSet) -> (ast::Module, EventLog, Result<usize, TransformError>) {
        let mut module = parse_source(src, "test.js").unwrap().module;
        let tree = sw_scope::analyze(&module);
        let mut log = EventLog::new();
        let result = {
            let mut desugarer = Desugarer::new(&tree, transforms, &mut log);
            module.visit_mut_with(&mut desugarer);
            desugarer.finish()
        };
        (module, log, result)
    }

    #[test]
    fn counts_rewrites_per_transform() {
        let src = "function f() { defer(a); if (x == 1) println(x); }";
        let (_, log, result) = run(src, TransformSet::default());
        assert_eq!(result.unwrap(), 3);
        assert_eq!(log.count(Transform::Equality), 1);
        assert_eq!(log.count(Transform::Println), 1);
        assert_eq!(log.count(Transform::Defer), 1);
    }

    #[test]
    fn disabled_transforms_are_skipped() {
        let src = "function f() { defer(a); if (x == 1) println(x); }";
        let only_equality: TransformSet = [Transform::Equality].into_iter().collect();
        let (_, log, result) = run(src, only_equality);
        assert_eq!(result.unwrap(), 1);
        assert_eq!(log.count(Transform::Println), 0);
        assert_eq!(log.count(Transform::Defer), 0);
    }

    #[test]
    fn nested_functions_get_distinct_accumulators() {
        let src = "function a() { defer(x); function b() { defer(y); const c = () => { defer(z); }; } }";
        let (_, log, result) = run(src, TransformSet::default());
        assert_eq!(result.unwrap(), 3);
        let names: Vec<_> = log
            .events()
            .iter()
            .filter_map(|e| match e {
                Event::DeferDesugared { accumulator, .. } => Some(accumulator.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(names, ["_defers", "_defers2", "_defers3"]);
    }

    #[test]
    fn shadowed_and_value_sites_are_reported() {
        let src = "function f(defer) { defer(a); } function g() { return defer(b); }";
        let (_, log, result) = run(src, TransformSet::default());
        assert_eq!(result.unwrap(), 1);
        assert!(matches!(log.events()[0], Event::DeferShadowed { binding: "parameter", .. }));
        assert!(matches!(log.events()[1], Event::DeferNotStatement { .. }));
        assert!(matches!(log.events()[2], Event::DeferDesugared { registrations: 0, .. }));
    }

    #[test]
    fn invalid_nodes_fail_closed() {
        let mut module = parse_source("f(x);", "test.js").unwrap().module;
        let tree = sw_scope::analyze(&module);
        if let ast::ModuleItem::Stmt(ast::Stmt::Expr(stmt)) = &mut module.body[0] {
            stmt.expr = Box::new(ast::Expr::Invalid(ast::Invalid { span: DUMMY_SP }));
        }
        let mut log = EventLog::new();
        let mut desugarer = Desugarer::new(&tree, TransformSet::default(), &mut log);
        module.visit_mut_with(&mut desugarer);
        assert!(matches!(
            desugarer.finish(),
            Err(TransformError::Invariant { .. })
        ));
    }
}
