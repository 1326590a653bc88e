//! Where names are introduced and referenced.
//!
//! Scope and namespace entries alias nodes in the AST arena; they never own
//! them. Lexical scopes live in the [`FileSet`] and are addressed by
//! [`ScopeId`].

use super::{ClassDecl, Constant, ExprId, FunctionDecl, InterfaceDecl, StmtId};
use serde::Serialize;
use std::collections::HashMap;

/// Name of the namespace everything is registered in.
pub const DEFAULT_NAMESPACE: &str = "\\";

/// Variables that are visible in every scope.
pub const SUPER_GLOBALS: &[&str] = &[
    "GLOBALS", "_SERVER", "_GET", "_POST", "_FILES", "_COOKIE", "_SESSION", "_REQUEST", "_ENV",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ScopeId(u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct FileId(u32);

impl FileId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A namespace paired with the lexical scope at its top level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlobalScope {
    pub namespace: String,
    pub scope: ScopeId,
}

#[derive(Debug, Default)]
pub struct SuperGlobalScope<'ast> {
    identifiers: HashMap<&'ast str, Vec<ExprId<'ast>>>,
}

impl<'ast> SuperGlobalScope<'ast> {
    pub fn is_super_global(name: &str) -> bool {
        SUPER_GLOBALS.contains(&name)
    }

    pub fn variables(&self, name: &str) -> &[ExprId<'ast>] {
        self.identifiers.get(name).map_or(&[], Vec::as_slice)
    }

    fn register(&mut self, name: &'ast str, var: ExprId<'ast>) {
        self.identifiers.entry(name).or_default().push(var);
    }
}

#[derive(Debug)]
pub struct Scope<'ast> {
    identifiers: HashMap<&'ast str, Vec<ExprId<'ast>>>,
    dynamic: Vec<ExprId<'ast>>,
    enclosing: Option<ScopeId>,
    global: GlobalScope,
}

impl<'ast> Scope<'ast> {
    /// Every reference to `$name` in this scope, in parse order.
    pub fn variables(&self, name: &str) -> &[ExprId<'ast>] {
        self.identifiers.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &'ast str> + '_ {
        self.identifiers.keys().copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.identifiers.contains_key(name)
    }

    /// References whose names are computed at runtime, like `$$a` or `${expr}`.
    pub fn dynamic_variables(&self) -> &[ExprId<'ast>] {
        &self.dynamic
    }

    pub fn enclosing(&self) -> Option<ScopeId> {
        self.enclosing
    }

    pub fn global(&self) -> &GlobalScope {
        &self.global
    }

    /// Total number of references registered here.
    pub fn len(&self) -> usize {
        self.identifiers.values().map(Vec::len).sum::<usize>() + self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ClassLike<'ast> {
    Class(&'ast ClassDecl<'ast>),
    Interface(&'ast InterfaceDecl<'ast>),
}

impl<'ast> ClassLike<'ast> {
    pub fn name(&self) -> &'ast str {
        match self {
            ClassLike::Class(decl) => decl.name,
            ClassLike::Interface(decl) => decl.name,
        }
    }
}

/// A constant is either declared with `const` or referenced by a bare name.
#[derive(Debug, Clone, Copy)]
pub enum ConstantEntry<'ast> {
    Definition(&'ast Constant<'ast>),
    Reference(ExprId<'ast>),
}

#[derive(Debug)]
pub struct Namespace<'ast> {
    name: String,
    classes: HashMap<&'ast str, ClassLike<'ast>>,
    constants: HashMap<&'ast str, Vec<ConstantEntry<'ast>>>,
    functions: HashMap<&'ast str, &'ast FunctionDecl<'ast>>,
}

impl<'ast> Namespace<'ast> {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            classes: HashMap::new(),
            constants: HashMap::new(),
            functions: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class(&self, name: &str) -> Option<ClassLike<'ast>> {
        self.classes.get(name).copied()
    }

    pub fn classes(&self) -> impl Iterator<Item = ClassLike<'ast>> + '_ {
        self.classes.values().copied()
    }

    pub fn function(&self, name: &str) -> Option<&'ast FunctionDecl<'ast>> {
        self.functions.get(name).copied()
    }

    pub fn functions(&self) -> impl Iterator<Item = &'ast FunctionDecl<'ast>> + '_ {
        self.functions.values().copied()
    }

    pub fn constants(&self, name: &str) -> &[ConstantEntry<'ast>] {
        self.constants.get(name).map_or(&[], Vec::as_slice)
    }

    pub fn constant_names(&self) -> impl Iterator<Item = &'ast str> + '_ {
        self.constants.keys().copied()
    }

    /// Returns false if the name was already taken; the newer one wins.
    pub(crate) fn add_class(&mut self, class: ClassLike<'ast>) -> bool {
        self.classes.insert(class.name(), class).is_none()
    }

    pub(crate) fn add_function(&mut self, function: &'ast FunctionDecl<'ast>) -> bool {
        self.functions.insert(function.name, function).is_none()
    }

    pub(crate) fn add_constant(&mut self, name: &'ast str, entry: ConstantEntry<'ast>) {
        self.constants.entry(name).or_default().push(entry);
    }
}

#[derive(Debug)]
pub struct File<'ast> {
    pub name: String,
    pub namespace: String,
    pub statements: &'ast [StmtId<'ast>],
}

/// Every file parsed together, with the namespaces and scopes they populate.
#[derive(Debug)]
pub struct FileSet<'ast> {
    files: Vec<File<'ast>>,
    namespaces: HashMap<String, Namespace<'ast>>,
    scopes: Vec<Scope<'ast>>,
    super_globals: SuperGlobalScope<'ast>,
}

impl Default for FileSet<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'ast> FileSet<'ast> {
    pub fn new() -> Self {
        let mut namespaces = HashMap::new();
        namespaces.insert(
            DEFAULT_NAMESPACE.to_string(),
            Namespace::new(DEFAULT_NAMESPACE),
        );
        let root = Scope {
            identifiers: HashMap::new(),
            dynamic: Vec::new(),
            enclosing: None,
            global: GlobalScope {
                namespace: DEFAULT_NAMESPACE.to_string(),
                scope: ScopeId(0),
            },
        };
        Self {
            files: Vec::new(),
            namespaces,
            scopes: vec![root],
            super_globals: SuperGlobalScope::default(),
        }
    }

    pub fn root_scope(&self) -> ScopeId {
        ScopeId(0)
    }

    pub fn scope(&self, id: ScopeId) -> &Scope<'ast> {
        &self.scopes[id.index()]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope<'ast>)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, scope)| (ScopeId(i as u32), scope))
    }

    /// A fresh lexical scope nested in `enclosing`.
    pub fn new_scope(&mut self, enclosing: ScopeId) -> ScopeId {
        let global = self.scope(enclosing).global.clone();
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope {
            identifiers: HashMap::new(),
            dynamic: Vec::new(),
            enclosing: Some(enclosing),
            global,
        });
        id
    }

    /// Records a variable reference in `scope`, by name when the name is known.
    pub fn register_variable(&mut self, scope: ScopeId, var: ExprId<'ast>) {
        match var.variable_name() {
            Some(name) => {
                if SuperGlobalScope::is_super_global(name) {
                    self.super_globals.register(name, var);
                }
                self.scopes[scope.index()]
                    .identifiers
                    .entry(name)
                    .or_default()
                    .push(var);
            }
            None => self.scopes[scope.index()].dynamic.push(var),
        }
    }

    pub fn super_globals(&self) -> &SuperGlobalScope<'ast> {
        &self.super_globals
    }

    pub fn namespace(&self, name: &str) -> Option<&Namespace<'ast>> {
        self.namespaces.get(name)
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &Namespace<'ast>> {
        self.namespaces.values()
    }

    pub fn default_namespace(&self) -> &Namespace<'ast> {
        self.namespace_ref(DEFAULT_NAMESPACE)
    }

    fn namespace_ref(&self, name: &str) -> &Namespace<'ast> {
        match self.namespaces.get(name) {
            Some(ns) => ns,
            None => &self.namespaces[DEFAULT_NAMESPACE],
        }
    }

    /// Looks up a namespace, creating it on first use.
    pub(crate) fn namespace_mut(&mut self, name: &str) -> &mut Namespace<'ast> {
        self.namespaces
            .entry(name.to_string())
            .or_insert_with(|| Namespace::new(name))
    }

    pub fn files(&self) -> &[File<'ast>] {
        &self.files
    }

    pub fn file(&self, id: FileId) -> &File<'ast> {
        &self.files[id.index()]
    }

    pub(crate) fn add_file(&mut self, file: File<'ast>) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(file);
        id
    }
}
