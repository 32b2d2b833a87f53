use std::collections::HashSet;

use crate::scope::ScopeTree;

/// Generate an identifier that cannot collide with anything in the module.
///
/// Candidates are `base`, `base2`, `base3`, ... The first one that is
/// neither declared nor referenced anywhere in the module, and not in
/// `reserved`, is returned. Callers add the result to `reserved` so that
/// later requests in the same pass get a different name.
pub fn fresh_name(tree: &ScopeTree, base: &str, reserved: &HashSet<String>) -> String {
    (1u32..)
        .map(|n| {
            if n == 1 {
                base.to_string()
            } else {
                format!("{base}{n}")
            }
        })
        .find(|candidate| !tree.is_name_used(candidate) && !reserved.contains(candidate))
        .unwrap_or_else(|| base.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binder::analyze;
    use sw_parser::parse_source;

    fn tree(src: &str) -> ScopeTree {
        analyze(&parse_source(src, "test.js").unwrap().module)
    }

    #[test]
    fn base_name_when_unused() {
        let tree = tree("function f() {}");
        assert_eq!(fresh_name(&tree, "_defers", &HashSet::new()), "_defers");
    }

    #[test]
    fn skips_declared_and_referenced_names() {
        let tree = tree("const _defers = []; use(_defers2);");
        assert_eq!(fresh_name(&tree, "_defers", &HashSet::new()), "_defers3");
    }

    #[test]
    fn skips_reserved_names() {
        let tree = tree("");
        let mut reserved = HashSet::new();
        for expected in ["_defers", "_defers2", "_defers3"] {
            let name = fresh_name(&tree, "_defers", &reserved);
            assert_eq!(name, expected);
            reserved.insert(name);
        }
    }

    #[test]
    fn names_declared_in_nested_scopes_are_taken() {
        let tree = tree("function f() { { let _defers = 1; } }");
        assert_eq!(fresh_name(&tree, "_defers", &HashSet::new()), "_defers2");
    }
}
