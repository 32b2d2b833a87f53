//! Desugaring for `defer(fn)` cleanup registration.
//!
//! ```js
//! function f() {
//!     const db = open();
//!     defer(() => db.close());
//!     work(db);
//! }
//! ```
//!
//! becomes
//!
//! ```js
//! function f() {
//!     const _defers = [];
//!     try {
//!         const db = open();
//!         _defers.push(() => db.close());
//!         work(db);
//!     } finally {
//!         for (let i = _defers.length - 1; i >= 0; i--) {
//!             try { _defers[i](); } catch (e) { console.log(e); }
//!         }
//!     }
//! }
//! ```
//!
//! A call qualifies when `defer` has no binding in any scope enclosing the
//! call, or when it is bound to the `defer` export of the runtime module.
//! Calls inside nested functions and classes belong to those functions.

use sw_ast::{DEFER_KEYWORD, RUNTIME_MODULE};
use sw_scope::{BindingKind, ScopeId, ScopeTree};
use swc_common::{Span, DUMMY_SP};
use swc_ecma_ast as ast;
use swc_ecma_visit::{Visit, VisitWith};

use crate::make;

/// Base name for the generated cleanup array.
pub const ACCUMULATOR_BASE: &str = "_defers";

/// What the name `defer` refers to at a call site.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution<'a> {
    /// Not bound anywhere; the ambient keyword.
    Ambient,
    /// `import { defer } from "sweetener/runtime"`.
    RuntimeImport,
    Shadowed(&'a BindingKind),
}

impl Resolution<'_> {
    pub fn qualifies(&self) -> bool {
        !matches!(self, Resolution::Shadowed(_))
    }
}

pub fn resolve_call_site(tree: &ScopeTree, scope: ScopeId) -> Resolution<'_> {
    match tree.lookup(scope, DEFER_KEYWORD) {
        None => Resolution::Ambient,
        Some(binding) => match &binding.kind {
            BindingKind::Import(import) if import.is_export_of(RUNTIME_MODULE, DEFER_KEYWORD) => {
                Resolution::RuntimeImport
            }
            kind => Resolution::Shadowed(kind),
        },
    }
}

/// Whether the callee is the bare identifier `defer`.
///
/// A renamed runtime import (`import { defer as d }`) is not recognized;
/// the callee text must be `defer`.
pub fn is_defer_call(call: &ast::CallExpr) -> bool {
    match &call.callee {
        ast::Callee::Expr(callee) => matches!(&**callee, ast::Expr::Ident(i) if &*i.sym == DEFER_KEYWORD),
        _ => false,
    }
}

/// `defer` call sites directly inside one function body.
#[derive(Debug, Default)]
pub struct Eligibility {
    /// Qualifying calls in statement position. These become pushes.
    pub statement_sites: usize,
    /// Qualifying calls used as values.
    pub expression_sites: Vec<Span>,
    /// Calls that resolve to a local binding, with what that binding is.
    pub shadowed: Vec<(Span, &'static str)>,
}

impl Eligibility {
    pub fn is_eligible(&self) -> bool {
        self.statement_sites > 0 || !self.expression_sites.is_empty()
    }
}

/// Scan a function body for `defer` calls that belong to it.
pub fn scan_body(tree: &ScopeTree, scope: ScopeId, stmts: &[ast::Stmt]) -> Eligibility {
    let mut scanner = Scanner {
        tree,
        scope,
        found: Eligibility::default(),
    };
    for stmt in stmts {
        stmt.visit_with(&mut scanner);
    }
    scanner.found
}

struct Scanner<'a> {
    tree: &'a ScopeTree,
    scope: ScopeId,
    found: Eligibility,
}

impl Scanner<'_> {
    fn in_scope(&mut self, span: Span, f: impl FnOnce(&mut Self)) {
        let outer = self.scope;
        self.scope = self.tree.scope_of(span).unwrap_or(outer);
        f(self);
        self.scope = outer;
    }

    fn classify(&mut self, call: &ast::CallExpr, statement: bool) {
        match resolve_call_site(self.tree, self.scope) {
            Resolution::Shadowed(kind) => self.found.shadowed.push((call.span, kind.describe())),
            _ if statement => self.found.statement_sites += 1,
            _ => self.found.expression_sites.push(call.span),
        }
    }
}

impl Visit for Scanner<'_> {
    fn visit_expr_stmt(&mut self, n: &ast::ExprStmt) {
        if let ast::Expr::Call(call) = &*n.expr {
            if is_defer_call(call) {
                self.classify(call, true);
                call.args.visit_with(self);
                return;
            }
        }
        n.visit_children_with(self);
    }

    fn visit_call_expr(&mut self, n: &ast::CallExpr) {
        if is_defer_call(n) {
            self.classify(n, false);
        }
        n.visit_children_with(self);
    }

    fn visit_block_stmt(&mut self, n: &ast::BlockStmt) {
        self.in_scope(n.span, |s| n.visit_children_with(s));
    }

    fn visit_for_stmt(&mut self, n: &ast::ForStmt) {
        self.in_scope(n.span, |s| n.visit_children_with(s));
    }

    fn visit_for_in_stmt(&mut self, n: &ast::ForInStmt) {
        self.in_scope(n.span, |s| n.visit_children_with(s));
    }

    fn visit_for_of_stmt(&mut self, n: &ast::ForOfStmt) {
        self.in_scope(n.span, |s| n.visit_children_with(s));
    }

    fn visit_catch_clause(&mut self, n: &ast::CatchClause) {
        self.in_scope(n.span, |s| n.visit_children_with(s));
    }

    fn visit_switch_stmt(&mut self, n: &ast::SwitchStmt) {
        n.discriminant.visit_with(self);
        self.in_scope(n.span, |s| n.cases.visit_with(s));
    }

    // Nested functions own their own defer calls.
    fn visit_function(&mut self, _: &ast::Function) {}
    fn visit_arrow_expr(&mut self, _: &ast::ArrowExpr) {}
    fn visit_class(&mut self, _: &ast::Class) {}

    fn visit_getter_prop(&mut self, n: &ast::GetterProp) {
        n.key.visit_with(self);
    }

    fn visit_setter_prop(&mut self, n: &ast::SetterProp) {
        n.key.visit_with(self);
    }
}

/// Rewrite a function body into accumulator form. `scope` is the function's
/// own scope. Returns the number of calls turned into pushes.
///
/// The resulting body is `[directives.., const <acc> = [], try { .. } finally { .. }]`
/// with the original statements inside the `try` block. A leading directive
/// prologue (`"use strict"`) stays in front so it still applies.
pub fn desugar_body(
    tree: &ScopeTree,
    scope: ScopeId,
    body: &mut ast::BlockStmt,
    accumulator: &ast::Ident,
) -> usize {
    let rewrite = Rewrite { tree, accumulator };
    let mut stmts = std::mem::take(&mut body.stmts);
    let prologue = stmts.iter().take_while(|s| is_directive(s)).count();
    let mut protected = ast::BlockStmt {
        span: body.span,
        ctxt: body.ctxt,
        stmts: stmts.split_off(prologue),
    };
    let registrations = rewrite.stmts(&mut protected.stmts, scope);

    let init = Box::new(ast::Expr::Array(ast::ArrayLit {
        span: DUMMY_SP,
        elems: vec![],
    }));
    body.stmts = stmts;
    body.stmts.extend([
        ast::Stmt::Decl(ast::Decl::Var(Box::new(make::var_decl(
            ast::VarDeclKind::Const,
            accumulator,
            init,
        )))),
        ast::Stmt::Try(Box::new(ast::TryStmt {
            span: DUMMY_SP,
            block: protected,
            handler: None,
            finalizer: Some(cleanup_block(accumulator)),
        })),
    ]);
    registrations
}

fn is_directive(stmt: &ast::Stmt) -> bool {
    matches!(stmt, ast::Stmt::Expr(s) if matches!(&*s.expr, ast::Expr::Lit(ast::Lit::Str(_))))
}

struct Rewrite<'a> {
    tree: &'a ScopeTree,
    accumulator: &'a ast::Ident,
}

impl Rewrite<'_> {
    fn nested(&self, span: Span, scope: ScopeId) -> ScopeId {
        self.tree.scope_of(span).unwrap_or(scope)
    }

    fn stmts(&self, stmts: &mut [ast::Stmt], scope: ScopeId) -> usize {
        stmts.iter_mut().map(|s| self.stmt(s, scope)).sum()
    }

    fn stmt(&self, stmt: &mut ast::Stmt, scope: ScopeId) -> usize {
        match stmt {
            ast::Stmt::Expr(s) => self.registration(s, scope),
            ast::Stmt::Block(s) => self.stmts(&mut s.stmts, self.nested(s.span, scope)),
            ast::Stmt::If(s) => {
                self.stmt(&mut s.cons, scope) + s.alt.as_deref_mut().map_or(0, |alt| self.stmt(alt, scope))
            }
            ast::Stmt::For(s) => self.stmt(&mut s.body, self.nested(s.span, scope)),
            ast::Stmt::ForIn(s) => self.stmt(&mut s.body, self.nested(s.span, scope)),
            ast::Stmt::ForOf(s) => self.stmt(&mut s.body, self.nested(s.span, scope)),
            ast::Stmt::While(s) => self.stmt(&mut s.body, scope),
            ast::Stmt::DoWhile(s) => self.stmt(&mut s.body, scope),
            ast::Stmt::Labeled(s) => self.stmt(&mut s.body, scope),
            ast::Stmt::With(s) => self.stmt(&mut s.body, scope),
            ast::Stmt::Try(s) => {
                let mut count = self.stmts(&mut s.block.stmts, self.nested(s.block.span, scope));
                if let Some(handler) = &mut s.handler {
                    count += self.stmts(&mut handler.body.stmts, self.nested(handler.span, scope));
                }
                if let Some(finalizer) = &mut s.finalizer {
                    count += self.stmts(&mut finalizer.stmts, self.nested(finalizer.span, scope));
                }
                count
            }
            ast::Stmt::Switch(s) => {
                let inner = self.nested(s.span, scope);
                s.cases.iter_mut().map(|case| self.stmts(&mut case.cons, inner)).sum()
            }
            _ => 0,
        }
    }

    /// `defer(args)` → `<acc>.push(args)`
    fn registration(&self, stmt: &mut ast::ExprStmt, scope: ScopeId) -> usize {
        let ast::Expr::Call(call) = &mut *stmt.expr else {
            return 0;
        };
        if !is_defer_call(call) || !resolve_call_site(self.tree, scope).qualifies() {
            return 0;
        }
        let span = call.span;
        let args = std::mem::take(&mut call.args);
        let push = make::member(DUMMY_SP, make::ident_expr(self.accumulator), "push");
        *stmt.expr = make::call(span, push, args);
        1
    }
}

/// Runs registered cleanups last-in first-out. A throwing cleanup is logged
/// and the remaining ones still run.
fn cleanup_block(accumulator: &ast::Ident) -> ast::BlockStmt {
    let index = make::ident("i");
    let error = make::ident("e");

    let length = make::member(DUMMY_SP, make::ident_expr(accumulator), "length");
    let init = make::var_decl(
        ast::VarDeclKind::Let,
        &index,
        Box::new(make::bin(ast::BinaryOp::Sub, Box::new(length), make::num(1.0))),
    );
    let test = make::bin(ast::BinaryOp::GtEq, make::ident_expr(&index), make::num(0.0));
    let update = ast::Expr::Update(ast::UpdateExpr {
        span: DUMMY_SP,
        op: ast::UpdateOp::MinusMinus,
        prefix: false,
        arg: make::ident_expr(&index),
    });

    let run = make::expr_stmt(make::call(
        DUMMY_SP,
        make::computed_member(make::ident_expr(accumulator), make::ident_expr(&index)),
        vec![],
    ));
    let report = make::expr_stmt(make::call(
        DUMMY_SP,
        make::member(DUMMY_SP, make::ident_expr(&make::ident("console")), "log"),
        vec![make::arg(make::ident_expr(&error))],
    ));
    let guarded = ast::Stmt::Try(Box::new(ast::TryStmt {
        span: DUMMY_SP,
        block: make::block(vec![run]),
        handler: Some(ast::CatchClause {
            span: DUMMY_SP,
            param: Some(ast::Pat::Ident(error.into())),
            body: make::block(vec![report]),
        }),
        finalizer: None,
    }));

    make::block(vec![ast::Stmt::For(ast::ForStmt {
        span: DUMMY_SP,
        init: Some(ast::VarDeclOrExpr::VarDecl(Box::new(init))),
        test: Some(Box::new(test)),
        update: Some(Box::new(update)),
        body: Box::new(ast::Stmt::Block(make::block(vec![guarded]))),
    })])
}

#[cfg(test)]
mod tests {
    use super::*;
    use sw_parser::parse_source;

    /// Module and the body of its first function declaration.
    fn function_body(src: &str) -> (ScopeTree, ScopeId, ast::BlockStmt) {
        let module = parse_source(src, "test.js").unwrap().module;
        let tree = sw_scope::analyze(&module);
        let function = module
            .body
            .into_iter()
            .find_map(|item| match item {
                ast::ModuleItem::Stmt(ast::Stmt::Decl(ast::Decl::Fn(f))) => Some(f.function),
                _ => None,
            })
            .expect("function declaration");
        let scope = tree.scope_of(function.span).expect("function scope");
        (tree, scope, function.body.expect("function body"))
    }

    #[test]
    fn ambient_defer_is_eligible() {
        let (tree, scope, body) = function_body("function f() { defer(() => 1); }");
        let found = scan_body(&tree, scope, &body.stmts);
        assert_eq!(found.statement_sites, 1);
        assert!(found.is_eligible());
    }

    #[test]
    fn parameter_shadows_defer() {
        let (tree, scope, body) = function_body("function f(defer) { defer(() => 1); }");
        let found = scan_body(&tree, scope, &body.stmts);
        assert!(!found.is_eligible());
        assert_eq!(found.shadowed.len(), 1);
        assert_eq!(found.shadowed[0].1, "parameter");
    }

    #[test]
    fn block_local_binding_shadows_only_inside_block() {
        let src = "function f() { defer(a); { const defer = g; defer(b); } }";
        let (tree, scope, body) = function_body(src);
        let found = scan_body(&tree, scope, &body.stmts);
        assert_eq!(found.statement_sites, 1);
        assert_eq!(found.shadowed.len(), 1);
    }

    #[test]
    fn runtime_import_qualifies_other_imports_do_not() {
        let ok = r#"import { defer } from "sweetener/runtime"; function f() { defer(a); }"#;
        let (tree, scope, body) = function_body(ok);
        assert_eq!(resolve_call_site(&tree, scope), Resolution::RuntimeImport);
        assert!(scan_body(&tree, scope, &body.stmts).is_eligible());

        let other = r#"import { defer } from "./tasks"; function f() { defer(a); }"#;
        let (tree, scope, body) = function_body(other);
        assert!(!scan_body(&tree, scope, &body.stmts).is_eligible());
    }

    #[test]
    fn nested_functions_are_not_scanned() {
        let src = "function f() { const g = () => { defer(a); }; function h() { defer(b); } }";
        let (tree, scope, body) = function_body(src);
        assert!(!scan_body(&tree, scope, &body.stmts).is_eligible());
    }

    #[test]
    fn value_position_is_reported() {
        let (tree, scope, body) = function_body("function f() { const x = defer(a); }");
        let found = scan_body(&tree, scope, &body.stmts);
        assert_eq!(found.statement_sites, 0);
        assert_eq!(found.expression_sites.len(), 1);
        assert!(found.is_eligible());
    }

    #[test]
    fn body_is_wrapped_and_calls_become_pushes() {
        let src = "function f() { open(); if (x) { defer(a); } else defer(b); for (;;) defer(c); }";
        let (tree, scope, mut body) = function_body(src);
        let acc = make::ident(ACCUMULATOR_BASE);
        assert_eq!(desugar_body(&tree, scope, &mut body, &acc), 3);

        let [ast::Stmt::Decl(ast::Decl::Var(decl)), ast::Stmt::Try(guarded)] = body.stmts.as_slice() else {
            panic!("unexpected body shape: {:?}", body.stmts);
        };
        assert_eq!(decl.kind, ast::VarDeclKind::Const);
        assert!(guarded.handler.is_none());
        assert!(guarded.finalizer.is_some());
        assert_eq!(guarded.block.stmts.len(), 3);
    }

    #[test]
    fn directive_prologue_stays_first() {
        let src = r#"function f() { "use strict"; defer(a); }"#;
        let (tree, scope, mut body) = function_body(src);
        let acc = make::ident(ACCUMULATOR_BASE);
        assert_eq!(desugar_body(&tree, scope, &mut body, &acc), 1);
        assert_eq!(body.stmts.len(), 3);
        assert!(is_directive(&body.stmts[0]));
        assert!(matches!(body.stmts[2], ast::Stmt::Try(_)));
    }

    #[test]
    fn shadowed_calls_are_not_rewritten() {
        let src = "function f() { defer(a); { let defer = g; defer(b); } }";
        let (tree, scope, mut body) = function_body(src);
        let acc = make::ident(ACCUMULATOR_BASE);
        assert_eq!(desugar_body(&tree, scope, &mut body, &acc), 1);
    }
}
