//! Lowering for the convenience print call.
//!
//! `println(x)` → ``console.log(`${x}\n`)``
//!
//! Only the first argument is printed. A call with no arguments, or whose
//! first argument is a spread, is left as written.

use sw_ast::PRINT_KEYWORD;
use swc_common::{Span, DUMMY_SP};
use swc_ecma_ast as ast;

use crate::make;

/// What happened to a `println(...)` call.
#[derive(Debug)]
pub enum PrintLowering {
    Lowered {
        span: Span,
        expr: ast::Expr,
        dropped_args: usize,
    },
    NoArguments {
        span: Span,
    },
    SpreadArgument {
        span: Span,
    },
}

/// Whether the callee is the bare identifier `println`.
pub fn is_print_call(call: &ast::CallExpr) -> bool {
    match &call.callee {
        ast::Callee::Expr(callee) => matches!(&**callee, ast::Expr::Ident(i) if &*i.sym == PRINT_KEYWORD),
        _ => false,
    }
}

/// Build the replacement for a print call. Returns `None` if `call` is not a
/// print call. On success the arguments have been moved out of `call`, so the
/// caller must replace the call with the returned expression.
pub fn lower_println(call: &mut ast::CallExpr) -> Option<PrintLowering> {
    if !is_print_call(call) {
        return None;
    }
    let span = call.span;
    match call.args.first() {
        None => return Some(PrintLowering::NoArguments { span }),
        Some(first) if first.spread.is_some() => return Some(PrintLowering::SpreadArgument { span }),
        Some(_) => {}
    }

    let mut args = std::mem::take(&mut call.args).into_iter();
    let value = args.next()?.expr;
    let dropped_args = args.len();

    let console_log = make::member(DUMMY_SP, make::ident_expr(&make::ident("console")), "log");
    let line = newline_template(span, value);
    Some(PrintLowering::Lowered {
        span,
        expr: make::call(span, console_log, vec![make::arg(Box::new(line))]),
        dropped_args,
    })
}

/// `` `${value}\n` ``
fn newline_template(span: Span, value: Box<ast::Expr>) -> ast::Expr {
    ast::Expr::Tpl(ast::Tpl {
        span,
        exprs: vec![value],
        quasis: vec![quasi("", "", false), quasi("\\n", "\n", true)],
    })
}

fn quasi(raw: &str, cooked: &str, tail: bool) -> ast::TplElement {
    ast::TplElement {
        span: DUMMY_SP,
        tail,
        cooked: Some(cooked.into()),
        raw: raw.into(),
    }
}
