//! Builds a [`ScopeTree`] from a parsed module.
//!
//! Scope rules:
//! - functions, arrows, constructors, getters and setters open a function
//!   scope holding their parameters and the top-level declarations of their
//!   body (the body block does not open a second scope)
//! - every other block, each `for`/`for-in`/`for-of` head, each `catch`
//!   clause and each `switch` body opens its own scope
//! - `var` hoists to the nearest function or module scope, everything else
//!   binds where it is declared
//! - ambient declarations (`declare ...`, type-only imports, the bodies of
//!   TypeScript namespaces) bind nothing at runtime and are skipped

use swc_common::Span;
use swc_ecma_ast::*;
use swc_ecma_visit::{Visit, VisitWith};

use crate::scope::{Binding, BindingKind, ImportBinding, ImportedName, ScopeId, ScopeKind, ScopeTree};

/// Bind every declaration of `module` into a fresh scope arena.
pub fn analyze(module: &Module) -> ScopeTree {
    let mut binder = Binder {
        tree: ScopeTree::new(module.span),
        current: ScopeId::ROOT,
    };
    module.visit_with(&mut binder);
    tracing::debug!(scopes = binder.tree.len(), "bound module");
    binder.tree
}

struct Binder {
    tree: ScopeTree,
    current: ScopeId,
}

impl Binder {
    fn with_scope(&mut self, kind: ScopeKind, span: Span, f: impl FnOnce(&mut Self)) {
        let parent = self.current;
        self.current = self.tree.push_scope(kind, Some(parent), span);
        f(self);
        self.current = parent;
    }

    fn declare(&mut self, scope: ScopeId, ident: &Ident, kind: BindingKind) {
        self.tree.declare(
            scope,
            Binding {
                name: ident.sym.to_string(),
                kind,
                span: ident.span,
            },
        );
    }

    fn declare_pat(&mut self, scope: ScopeId, pat: &Pat, kind: BindingKind) {
        let mut idents = Vec::new();
        pat_idents(pat, &mut idents);
        for ident in idents {
            self.declare(scope, ident, kind.clone());
        }
    }

    fn bind_params<'a>(&mut self, params: impl IntoIterator<Item = &'a Pat>) {
        let scope = self.current;
        for pat in params {
            self.declare_pat(scope, pat, BindingKind::Param);
            pat.visit_with(self);
        }
    }

    fn bind_function(&mut self, function: &Function) {
        for param in &function.params {
            param.decorators.visit_with(self);
        }
        self.bind_params(function.params.iter().map(|p| &p.pat));
        if let Some(body) = &function.body {
            body.stmts.visit_with(self);
        }
    }
}

impl Visit for Binder {
    fn visit_import_decl(&mut self, n: &ImportDecl) {
        let source = n.src.value.as_str().unwrap_or_default().to_string();
        let scope = self.current;
        for specifier in &n.specifiers {
            if n.type_only || specifier.is_type_only() {
                self.tree.note_name(&specifier.local().sym);
                continue;
            }
            let (local, imported) = match specifier {
                ImportSpecifier::Named(s) => {
                    let imported = match &s.imported {
                        Some(name) => export_name(name),
                        None => s.local.sym.to_string(),
                    };
                    (&s.local, ImportedName::Named(imported))
                }
                ImportSpecifier::Default(s) => (&s.local, ImportedName::Default),
                ImportSpecifier::Namespace(s) => (&s.local, ImportedName::Namespace),
            };
            let kind = BindingKind::Import(ImportBinding {
                source: source.clone(),
                imported,
            });
            self.declare(scope, local, kind);
        }
    }

    fn visit_fn_decl(&mut self, n: &FnDecl) {
        if n.declare {
            self.tree.note_name(&n.ident.sym);
        } else {
            let scope = self.current;
            self.declare(scope, &n.ident, BindingKind::Function);
        }
        n.function.visit_with(self);
    }

    fn visit_fn_expr(&mut self, n: &FnExpr) {
        self.with_scope(ScopeKind::Function, n.function.span, |b| {
            if let Some(ident) = &n.ident {
                let scope = b.current;
                b.declare(scope, ident, BindingKind::Function);
            }
            n.function.decorators.visit_with(b);
            b.bind_function(&n.function);
        });
    }

    fn visit_export_default_decl(&mut self, n: &ExportDefaultDecl) {
        let scope = self.current;
        match &n.decl {
            DefaultDecl::Fn(FnExpr {
                ident: Some(ident), ..
            }) => self.declare(scope, ident, BindingKind::Function),
            DefaultDecl::Class(ClassExpr {
                ident: Some(ident), ..
            }) => self.declare(scope, ident, BindingKind::Class),
            _ => {}
        }
        n.visit_children_with(self);
    }

    fn visit_function(&mut self, n: &Function) {
        self.with_scope(ScopeKind::Function, n.span, |b| {
            n.decorators.visit_with(b);
            b.bind_function(n);
        });
    }

    fn visit_arrow_expr(&mut self, n: &ArrowExpr) {
        self.with_scope(ScopeKind::Function, n.span, |b| {
            b.bind_params(&n.params);
            match &*n.body {
                BlockStmtOrExpr::BlockStmt(body) => body.stmts.visit_with(b),
                BlockStmtOrExpr::Expr(expr) => expr.visit_with(b),
            }
        });
    }

    fn visit_constructor(&mut self, n: &Constructor) {
        n.key.visit_with(self);
        self.with_scope(ScopeKind::Function, n.span, |b| {
            let scope = b.current;
            for param in &n.params {
                match param {
                    ParamOrTsParamProp::Param(p) => {
                        p.decorators.visit_with(b);
                        b.declare_pat(scope, &p.pat, BindingKind::Param);
                        p.pat.visit_with(b);
                    }
                    ParamOrTsParamProp::TsParamProp(p) => {
                        p.decorators.visit_with(b);
                        match &p.param {
                            TsParamPropParam::Ident(ident) => {
                                b.declare(scope, &ident.id, BindingKind::Param);
                            }
                            TsParamPropParam::Assign(assign) => {
                                b.declare_pat(scope, &assign.left, BindingKind::Param);
                            }
                        }
                        p.param.visit_with(b);
                    }
                }
            }
            if let Some(body) = &n.body {
                body.stmts.visit_with(b);
            }
        });
    }

    fn visit_getter_prop(&mut self, n: &GetterProp) {
        n.key.visit_with(self);
        self.with_scope(ScopeKind::Function, n.span, |b| {
            if let Some(body) = &n.body {
                body.stmts.visit_with(b);
            }
        });
    }

    fn visit_setter_prop(&mut self, n: &SetterProp) {
        n.key.visit_with(self);
        self.with_scope(ScopeKind::Function, n.span, |b| {
            b.bind_params(n.this_param.iter().chain(std::iter::once(&*n.param)));
            if let Some(body) = &n.body {
                body.stmts.visit_with(b);
            }
        });
    }

    fn visit_class_decl(&mut self, n: &ClassDecl) {
        if n.declare {
            self.tree.note_name(&n.ident.sym);
        } else {
            let scope = self.current;
            self.declare(scope, &n.ident, BindingKind::Class);
        }
        n.class.visit_with(self);
    }

    fn visit_class_expr(&mut self, n: &ClassExpr) {
        match &n.ident {
            Some(ident) => self.with_scope(ScopeKind::Class, n.class.span, |b| {
                let scope = b.current;
                b.declare(scope, ident, BindingKind::Class);
                n.class.visit_with(b);
            }),
            None => n.class.visit_with(self),
        }
    }

    fn visit_var_decl(&mut self, n: &VarDecl) {
        if n.declare {
            n.visit_children_with(self);
            return;
        }
        let (scope, kind) = match n.kind {
            VarDeclKind::Var => (self.tree.var_target(self.current), BindingKind::Var),
            VarDeclKind::Let => (self.current, BindingKind::Let),
            VarDeclKind::Const => (self.current, BindingKind::Const),
        };
        for decl in &n.decls {
            self.declare_pat(scope, &decl.name, kind.clone());
        }
        n.visit_children_with(self);
    }

    fn visit_ts_module_decl(&mut self, n: &TsModuleDecl) {
        self.with_scope(ScopeKind::Block, n.span, |b| n.body.visit_with(b));
    }

    fn visit_block_stmt(&mut self, n: &BlockStmt) {
        self.with_scope(ScopeKind::Block, n.span, |b| n.stmts.visit_with(b));
    }

    fn visit_for_stmt(&mut self, n: &ForStmt) {
        self.with_scope(ScopeKind::Loop, n.span, |b| n.visit_children_with(b));
    }

    fn visit_for_in_stmt(&mut self, n: &ForInStmt) {
        self.with_scope(ScopeKind::Loop, n.span, |b| n.visit_children_with(b));
    }

    fn visit_for_of_stmt(&mut self, n: &ForOfStmt) {
        self.with_scope(ScopeKind::Loop, n.span, |b| n.visit_children_with(b));
    }

    fn visit_catch_clause(&mut self, n: &CatchClause) {
        self.with_scope(ScopeKind::Catch, n.span, |b| {
            if let Some(param) = &n.param {
                let scope = b.current;
                b.declare_pat(scope, param, BindingKind::CatchParam);
                param.visit_with(b);
            }
            n.body.stmts.visit_with(b);
        });
    }

    fn visit_switch_stmt(&mut self, n: &SwitchStmt) {
        n.discriminant.visit_with(self);
        self.with_scope(ScopeKind::Switch, n.span, |b| n.cases.visit_with(b));
    }

    fn visit_ident(&mut self, n: &Ident) {
        self.tree.note_name(&n.sym);
    }
}

fn export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::Ident(ident) => ident.sym.to_string(),
        ModuleExportName::Str(s) => s.value.as_str().unwrap_or_default().to_string(),
    }
}

/// Collect the identifiers a binding pattern declares.
fn pat_idents<'a>(pat: &'a Pat, out: &mut Vec<&'a Ident>) {
    match pat {
        Pat::Ident(binding) => out.push(&binding.id),
        Pat::Array(array) => {
            for elem in array.elems.iter().flatten() {
                pat_idents(elem, out);
            }
        }
        Pat::Rest(rest) => pat_idents(&rest.arg, out),
        Pat::Object(object) => {
            for prop in &object.props {
                match prop {
                    ObjectPatProp::KeyValue(kv) => pat_idents(&kv.value, out),
                    ObjectPatProp::Assign(assign) => out.push(&assign.key.id),
                    ObjectPatProp::Rest(rest) => pat_idents(&rest.arg, out),
                }
            }
        }
        Pat::Assign(assign) => pat_idents(&assign.left, out),
        Pat::Expr(_) | Pat::Invalid(_) => {}
    }
}
