use std::collections::{HashMap, HashSet};

use swc_common::Span;

/// Index of a [`Scope`] in its [`ScopeTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u32);

impl ScopeId {
    pub const ROOT: ScopeId = ScopeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// What opened a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    /// The module itself. Imports and top-level declarations live here.
    Module,
    /// A function, arrow, constructor, getter or setter. Parameters and the
    /// top-level declarations of the body share this scope.
    Function,
    /// A `{ ... }` block that is not a function body.
    Block,
    /// The head of a `for`, `for-in` or `for-of` statement.
    Loop,
    /// A `catch` clause: its parameter and its body.
    Catch,
    /// The case bodies of a `switch` statement.
    Switch,
    /// The name of a named class expression.
    Class,
}

impl ScopeKind {
    /// `var` declarations hoist to the nearest scope of this kind.
    pub fn is_var_target(self) -> bool {
        matches!(self, ScopeKind::Module | ScopeKind::Function)
    }
}

/// Name an import specifier brings in from its module.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportedName {
    /// `import { a }` or `import { a as b }`; holds `a`.
    Named(String),
    /// `import a from "m"`.
    Default,
    /// `import * as a from "m"`.
    Namespace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    /// Module specifier string, e.g. `"sweetener/runtime"`.
    pub source: String,
    pub imported: ImportedName,
}

impl ImportBinding {
    /// Whether this binding is the export `name` of `module`.
    pub fn is_export_of(&self, module: &str, name: &str) -> bool {
        self.source == module && matches!(&self.imported, ImportedName::Named(n) if n == name)
    }
}

/// How a name became defined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingKind {
    Param,
    Var,
    Let,
    Const,
    Function,
    Class,
    CatchParam,
    Import(ImportBinding),
}

impl BindingKind {
    pub fn describe(&self) -> &'static str {
        match self {
            BindingKind::Param => "parameter",
            BindingKind::Var => "var declaration",
            BindingKind::Let => "let declaration",
            BindingKind::Const => "const declaration",
            BindingKind::Function => "function declaration",
            BindingKind::Class => "class declaration",
            BindingKind::CatchParam => "catch parameter",
            BindingKind::Import(_) => "import",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub name: String,
    pub kind: BindingKind,
    /// Span of the declaring identifier.
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Span of the node that opened the scope.
    pub span: Span,
    pub bindings: HashMap<String, Binding>,
}

impl Scope {
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }
}

/// All scopes of one module, indexed by [`ScopeId`].
///
/// Scopes are also keyed by the span of the node that opened them, which is
/// how transforms find the scope of a function or block they are looking at.
#[derive(Debug, Clone)]
pub struct ScopeTree {
    scopes: Vec<Scope>,
    by_span: HashMap<Span, ScopeId>,
    /// Every identifier that is declared or referenced anywhere.
    names: HashSet<String>,
}

impl ScopeTree {
    pub(crate) fn new(module_span: Span) -> Self {
        let mut tree = ScopeTree {
            scopes: Vec::new(),
            by_span: HashMap::new(),
            names: HashSet::new(),
        };
        tree.push_scope(ScopeKind::Module, None, module_span);
        tree
    }

    pub fn root(&self) -> ScopeId {
        ScopeId::ROOT
    }

    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScopeId, &Scope)> + '_ {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, scope)| (ScopeId(i as u32), scope))
    }

    /// The scope opened by the node with this span, if any. Never the
    /// module scope; use [`ScopeTree::root`] for that.
    pub fn scope_of(&self, span: Span) -> Option<ScopeId> {
        self.by_span.get(&span).copied()
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: ScopeId) -> impl Iterator<Item = ScopeId> + '_ {
        std::iter::successors(Some(id), move |&s| self.scope(s).parent)
    }

    /// Resolve `name` starting at `from` and walking outward.
    pub fn lookup(&self, from: ScopeId, name: &str) -> Option<&Binding> {
        self.ancestors(from)
            .find_map(|id| self.scope(id).binding(name))
    }

    /// Whether `name` is declared or referenced anywhere in the module.
    pub fn is_name_used(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Nearest enclosing scope that receives hoisted `var` declarations.
    pub(crate) fn var_target(&self, from: ScopeId) -> ScopeId {
        self.ancestors(from)
            .find(|&id| self.scope(id).kind.is_var_target())
            .unwrap_or(ScopeId::ROOT)
    }

    pub(crate) fn push_scope(&mut self, kind: ScopeKind, parent: Option<ScopeId>, span: Span) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            kind,
            parent,
            span,
            bindings: HashMap::new(),
        });
        // The module is reached through `root()`. A function spanning the
        // whole file shares its span and must not resolve to it.
        if parent.is_some() {
            self.by_span.entry(span).or_insert(id);
        }
        id
    }

    /// Record a binding. The first declaration of a name in a scope wins.
    pub(crate) fn declare(&mut self, scope: ScopeId, binding: Binding) {
        self.names.insert(binding.name.clone());
        self.scopes[scope.index()]
            .bindings
            .entry(binding.name.clone())
            .or_insert(binding);
    }

    pub(crate) fn note_name(&mut self, name: &str) {
        if !self.names.contains(name) {
            self.names.insert(name.to_string());
        }
    }
}
