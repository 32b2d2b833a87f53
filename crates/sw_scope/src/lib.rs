//! Scope model for sweetener.
//!
//! The binder walks a parsed module once and records every lexical scope in
//! a flat arena ([`ScopeTree`]). Scopes point at their parent by index, so
//! lookups walk upward without any ownership cycles. The transforms only
//! read the tree; names they introduce come from [`fresh_name`], which is
//! collision-free by construction.

mod binder;
mod hygiene;
mod scope;

pub use binder::analyze;
pub use hygiene::fresh_name;
pub use scope::{
    Binding, BindingKind, ImportBinding, ImportedName, Scope, ScopeId, ScopeKind, ScopeTree,
};
