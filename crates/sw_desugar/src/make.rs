//! Constructors for the nodes the transforms generate.
//!
//! Generated nodes carry `DUMMY_SP` unless they replace a node from the
//! input, in which case the caller passes the original span along.

use swc_common::{Span, SyntaxContext, DUMMY_SP};
use swc_ecma_ast as ast;

pub(crate) fn ident(name: &str) -> ast::Ident {
    ast::Ident::new_no_ctxt(name.into(), DUMMY_SP)
}

pub(crate) fn ident_expr(ident: &ast::Ident) -> Box<ast::Expr> {
    Box::new(ast::Expr::Ident(ident.clone()))
}

pub(crate) fn num(value: f64) -> Box<ast::Expr> {
    Box::new(ast::Expr::Lit(ast::Lit::Num(ast::Number {
        span: DUMMY_SP,
        value,
        raw: None,
    })))
}

pub(crate) fn arg(expr: Box<ast::Expr>) -> ast::ExprOrSpread {
    ast::ExprOrSpread { spread: None, expr }
}

/// `obj.prop`
pub(crate) fn member(span: Span, obj: Box<ast::Expr>, prop: &str) -> ast::Expr {
    ast::Expr::Member(ast::MemberExpr {
        span,
        obj,
        prop: ast::MemberProp::Ident(ast::IdentName::new(prop.into(), span)),
    })
}

/// `obj[index]`
pub(crate) fn computed_member(obj: Box<ast::Expr>, index: Box<ast::Expr>) -> ast::Expr {
    ast::Expr::Member(ast::MemberExpr {
        span: DUMMY_SP,
        obj,
        prop: ast::MemberProp::Computed(ast::ComputedPropName {
            span: DUMMY_SP,
            expr: index,
        }),
    })
}

/// `callee(args...)`
pub(crate) fn call(span: Span, callee: ast::Expr, args: Vec<ast::ExprOrSpread>) -> ast::Expr {
    ast::Expr::Call(ast::CallExpr {
        span,
        callee: ast::Callee::Expr(Box::new(callee)),
        args,
        type_args: None,
        ..Default::default()
    })
}

pub(crate) fn bin(op: ast::BinaryOp, left: Box<ast::Expr>, right: Box<ast::Expr>) -> ast::Expr {
    ast::Expr::Bin(ast::BinExpr {
        span: DUMMY_SP,
        op,
        left,
        right,
    })
}

pub(crate) fn expr_stmt(expr: ast::Expr) -> ast::Stmt {
    ast::Stmt::Expr(ast::ExprStmt {
        span: DUMMY_SP,
        expr: Box::new(expr),
    })
}

pub(crate) fn block(stmts: Vec<ast::Stmt>) -> ast::BlockStmt {
    ast::BlockStmt {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        stmts,
    }
}

/// `let name = init` / `const name = init`
pub(crate) fn var_decl(kind: ast::VarDeclKind, name: &ast::Ident, init: Box<ast::Expr>) -> ast::VarDecl {
    ast::VarDecl {
        span: DUMMY_SP,
        ctxt: SyntaxContext::empty(),
        kind,
        declare: false,
        decls: vec![ast::VarDeclarator {
            span: DUMMY_SP,
            name: ast::Pat::Ident(name.clone().into()),
            init: Some(init),
            definite: false,
        }],
    }
}
