//! The companion runtime module, `sweetener/runtime`.
//!
//! Imports of `defer` from this module are rewritten exactly like the ambient
//! keyword. The module itself only matters for code that skips the transform.

pub use sw_ast::RUNTIME_MODULE;

/// JavaScript source of the runtime module.
pub const RUNTIME_SOURCE: &str = include_str!("../../../runtime/runtime.js");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exports_both_helpers() {
        assert!(RUNTIME_SOURCE.contains("export function println(value)"));
        assert!(RUNTIME_SOURCE.contains("export function defer(fn)"));
    }

    #[test]
    fn println_matches_the_lowered_form() {
        assert!(RUNTIME_SOURCE.contains("console.log(`${value}\\n`);"));
        assert!(!RUNTIME_SOURCE.contains("value + "));
    }

    #[test]
    fn runtime_parses_as_a_module() {
        let parsed = sw_parser::parse_source(RUNTIME_SOURCE, "runtime.js").unwrap();
        assert_eq!(parsed.module.body.len(), 2);
    }
}
