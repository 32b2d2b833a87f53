//! Loose equality to strict equality.
//!
//! `a == b` → `a === b`, `a != b` → `a !== b`. Every other operator is left
//! alone, including the ones that are already strict.

use swc_ecma_ast::{BinExpr, BinaryOp};

pub fn strict_equivalent(op: BinaryOp) -> Option<BinaryOp> {
    match op {
        BinaryOp::EqEq => Some(BinaryOp::EqEqEq),
        BinaryOp::NotEq => Some(BinaryOp::NotEqEq),
        _ => None,
    }
}

/// Rewrite the operator of `expr` in place. Returns the operator that was
/// replaced, or `None` if nothing changed.
pub fn normalize_equality(expr: &mut BinExpr) -> Option<BinaryOp> {
    let strict = strict_equivalent(expr.op)?;
    Some(std::mem::replace(&mut expr.op, strict))
}

pub(crate) fn operator_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::EqEq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::EqEqEq => "===",
        BinaryOp::NotEqEq => "!==",
        _ => "?",
    }
}
