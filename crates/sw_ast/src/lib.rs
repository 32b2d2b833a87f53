//! ECMAScript/TypeScript AST for sweetener.
//!
//! Re-exports the standard SWC AST and adds the names the engine treats
//! specially:
//! - `defer(fn)`, the cleanup registration keyword
//! - `println(value)`, the convenience print call
//! - the runtime module both of them are exported from

pub use swc_ecma_ast::*;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Callee name of a cleanup registration, `defer(() => res.close())`.
pub const DEFER_KEYWORD: &str = "defer";

/// Callee name of the convenience print call, `println(value)`.
pub const PRINT_KEYWORD: &str = "println";

/// Module whose `defer` export is treated exactly like the ambient keyword.
pub const RUNTIME_MODULE: &str = "sweetener/runtime";

/// One of the sugar-removal passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transform {
    /// `==` / `!=` become `===` / `!==`.
    Equality,
    /// `println(x)` becomes ``console.log(`${x}\n`)``.
    Println,
    /// `defer(fn)` becomes an accumulator push guarded by `try`/`finally`.
    Defer,
}

impl Transform {
    pub const ALL: [Transform; 3] = [Transform::Equality, Transform::Println, Transform::Defer];

    pub fn name(self) -> &'static str {
        match self {
            Transform::Equality => "equality",
            Transform::Println => "println",
            Transform::Defer => "defer",
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Transform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Transform::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| {
                format!("unknown transform `{s}` (expected one of: equality, println, defer)")
            })
    }
}

/// Flags controlling which transforms are active.
///
/// Serialized as a list of transform names, e.g. `["equality", "defer"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Transform>", into = "Vec<Transform>")]
pub struct TransformSet {
    pub equality: bool,
    pub println: bool,
    pub defer: bool,
}

impl TransformSet {
    /// A set with every transform disabled.
    pub fn none() -> Self {
        Self {
            equality: false,
            println: false,
            defer: false,
        }
    }

    pub fn contains(&self, transform: Transform) -> bool {
        match transform {
            Transform::Equality => self.equality,
            Transform::Println => self.println,
            Transform::Defer => self.defer,
        }
    }

    pub fn insert(&mut self, transform: Transform) {
        match transform {
            Transform::Equality => self.equality = true,
            Transform::Println => self.println = true,
            Transform::Defer => self.defer = true,
        }
    }
}

impl Default for TransformSet {
    fn default() -> Self {
        Self {
            equality: true,
            println: true,
            defer: true,
        }
    }
}

impl FromIterator<Transform> for TransformSet {
    fn from_iter<I: IntoIterator<Item = Transform>>(iter: I) -> Self {
        let mut set = TransformSet::none();
        for transform in iter {
            set.insert(transform);
        }
        set
    }
}

impl From<Vec<Transform>> for TransformSet {
    fn from(transforms: Vec<Transform>) -> Self {
        transforms.into_iter().collect()
    }
}

impl From<TransformSet> for Vec<Transform> {
    fn from(set: TransformSet) -> Self {
        Transform::ALL
            .into_iter()
            .filter(|t| set.contains(*t))
            .collect()
    }
}

/// Engine configuration.
///
/// Deserializes from `{"debug": true, "transforms": ["equality"]}`; every
/// field is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Emit a diagnostic trace of which rewrites fired.
    pub debug: bool,
    /// Transforms to run. Defaults to all of them.
    pub transforms: TransformSet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transform_set_default_enables_all() {
        let s = TransformSet::default();
        assert!(s.equality);
        assert!(s.println);
        assert!(s.defer);
    }

    #[test]
    fn transform_names_parse() {
        assert_eq!("defer".parse::<Transform>(), Ok(Transform::Defer));
        assert_eq!("println".parse::<Transform>(), Ok(Transform::Println));
        assert!("strict".parse::<Transform>().is_err());
    }

    #[test]
    fn config_defaults_from_empty_json() {
        let config: Config = serde_json::from_str("{}").unwrap();
        assert_eq!(config, Config::default());
        assert!(!config.debug);
        assert_eq!(config.transforms, TransformSet::default());
    }

    #[test]
    fn config_with_transform_subset() {
        let config: Config =
            serde_json::from_str(r#"{"debug": true, "transforms": ["equality"]}"#).unwrap();
        assert!(config.debug);
        assert!(config.transforms.equality);
        assert!(!config.transforms.println);
        assert!(!config.transforms.defer);
    }

    #[test]
    fn config_rejects_unknown_transform() {
        let err = serde_json::from_str::<Config>(r#"{"transforms": ["strict"]}"#);
        assert!(err.is_err());
    }

    #[test]
    fn transform_set_serializes_as_names() {
        let set: TransformSet = [Transform::Defer, Transform::Equality].into_iter().collect();
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"["equality","defer"]"#);
    }
}
