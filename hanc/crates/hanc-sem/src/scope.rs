//! Scope tree and symbol table.
//!
//! Scopes and symbols live in two typed-index arenas owned by a single
//! [`SymbolTable`]; scopes refer to their parents (and module symbols to
//! their inner scopes) by index, so the tree needs no owning
//! back-pointers and is freed as a whole at the end of compilation.
//!
//! Invariants:
//! - names are unique within a single scope (duplicate insertion is
//!   rejected and reported by the caller),
//! - symbol iteration order within a scope equals declaration order,
//! - lookup walks parent scopes,
//! - module scopes are reachable through the module symbol in their
//!   parent scope.

use hanc_par::ast::Visibility;
use hanc_par::Type;
use hanc_util::{newtype_index, IndexVec, Symbol, SymbolId};
use indexmap::IndexMap;

newtype_index! {
    /// Index of a scope in the table's scope arena
    pub struct ScopeId;
}

/// What a scope belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Module,
    Function,
    Block,
}

/// A single scope
#[derive(Debug)]
pub struct Scope {
    pub kind: ScopeKind,
    pub parent: Option<ScopeId>,
    /// Module name for module scopes
    pub name: Option<Symbol>,
    /// Name → symbol, in declaration order
    pub symbols: IndexMap<Symbol, SymbolId>,
}

/// The classification of a symbol
#[derive(Clone, Debug, PartialEq)]
pub enum SymbolKind {
    Variable { is_const: bool },
    Function,
    Struct,
    Enum,
    EnumMember { value: i64 },
    Module { scope: ScopeId },
    ImportAlias { target: ScopeId },
}

/// Everything known about one declared name
#[derive(Clone, Debug)]
pub struct SymbolInfo {
    pub name: Symbol,
    pub kind: SymbolKind,
    pub ty: Type,
    /// The scope the symbol was declared in (not the scope it may have
    /// been injected into by an import)
    pub decl_scope: ScopeId,
    pub visibility: Visibility,
}

/// The compilation's scope tree and symbol arena
pub struct SymbolTable {
    pub scopes: IndexVec<ScopeId, Scope>,
    pub symbols: IndexVec<SymbolId, SymbolInfo>,
    pub global: ScopeId,
}

impl SymbolTable {
    /// Create a table containing only the global scope
    pub fn new() -> Self {
        let mut scopes = IndexVec::new();
        let global = scopes.push(Scope {
            kind: ScopeKind::Global,
            parent: None,
            name: None,
            symbols: IndexMap::new(),
        });
        Self {
            scopes,
            symbols: IndexVec::new(),
            global,
        }
    }

    /// Create a child scope
    pub fn new_scope(&mut self, kind: ScopeKind, parent: ScopeId) -> ScopeId {
        self.scopes.push(Scope {
            kind,
            parent: Some(parent),
            name: None,
            symbols: IndexMap::new(),
        })
    }

    /// Create a module scope carrying the module's name
    pub fn new_module_scope(&mut self, name: Symbol, parent: ScopeId) -> ScopeId {
        let id = self.new_scope(ScopeKind::Module, parent);
        self.scopes[id].name = Some(name);
        id
    }

    /// Declare a symbol in a scope
    ///
    /// Fails with the existing symbol's id when the name is already
    /// declared in that scope; the new declaration is discarded.
    pub fn insert(
        &mut self,
        scope: ScopeId,
        kind: SymbolKind,
        name: Symbol,
        ty: Type,
        visibility: Visibility,
    ) -> Result<SymbolId, SymbolId> {
        if let Some(&existing) = self.scopes[scope].symbols.get(&name) {
            return Err(existing);
        }
        let id = self.symbols.push(SymbolInfo {
            name,
            kind,
            ty,
            decl_scope: scope,
            visibility,
        });
        self.scopes[scope].symbols.insert(name, id);
        Ok(id)
    }

    /// Inject an already-declared symbol into another scope under its
    /// own name (import injection)
    ///
    /// The symbol keeps its original declaring scope.
    pub fn inject(&mut self, scope: ScopeId, id: SymbolId) -> Result<(), SymbolId> {
        let name = self.symbols[id].name;
        if let Some(&existing) = self.scopes[scope].symbols.get(&name) {
            return Err(existing);
        }
        self.scopes[scope].symbols.insert(name, id);
        Ok(())
    }

    /// Look up a name in exactly one scope
    pub fn lookup_in(&self, scope: ScopeId, name: Symbol) -> Option<SymbolId> {
        self.scopes[scope].symbols.get(&name).copied()
    }

    /// Look up a name, walking parent scopes
    pub fn lookup(&self, scope: ScopeId, name: Symbol) -> Option<SymbolId> {
        let mut current = Some(scope);
        while let Some(id) = current {
            if let Some(&sym) = self.scopes[id].symbols.get(&name) {
                return Some(sym);
            }
            current = self.scopes[id].parent;
        }
        None
    }

    pub fn symbol(&self, id: SymbolId) -> &SymbolInfo {
        &self.symbols[id]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut SymbolInfo {
        &mut self.symbols[id]
    }

    /// The module name of a scope, when it is a module scope
    pub fn module_name_of(&self, scope: ScopeId) -> Option<Symbol> {
        let scope = &self.scopes[scope];
        if scope.kind == ScopeKind::Module {
            scope.name
        } else {
            None
        }
    }

    /// Whether `ancestor` is the scope itself or one of its ancestors
    pub fn is_ancestor(&self, ancestor: ScopeId, scope: ScopeId) -> bool {
        let mut current = Some(scope);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.scopes[id].parent;
        }
        false
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn var_kind() -> SymbolKind {
        SymbolKind::Variable { is_const: false }
    }

    #[test]
    fn test_insert_and_lookup() {
        let mut table = SymbolTable::new();
        let name = Symbol::intern("x");
        let id = table
            .insert(table.global, var_kind(), name, Type::Int, Visibility::Private)
            .unwrap();
        assert_eq!(table.lookup(table.global, name), Some(id));
        assert_eq!(table.symbol(id).ty, Type::Int);
    }

    #[test]
    fn test_duplicate_rejected() {
        let mut table = SymbolTable::new();
        let name = Symbol::intern("x");
        let first = table
            .insert(table.global, var_kind(), name, Type::Int, Visibility::Private)
            .unwrap();
        let err = table
            .insert(table.global, var_kind(), name, Type::Float, Visibility::Private)
            .unwrap_err();
        assert_eq!(err, first);
        // The original symbol survives.
        assert_eq!(table.symbol(table.lookup(table.global, name).unwrap()).ty, Type::Int);
    }

    #[test]
    fn test_lookup_walks_parents() {
        let mut table = SymbolTable::new();
        let outer = Symbol::intern("外");
        let id = table
            .insert(table.global, var_kind(), outer, Type::Int, Visibility::Private)
            .unwrap();
        let func = table.new_scope(ScopeKind::Function, table.global);
        let block = table.new_scope(ScopeKind::Block, func);
        assert_eq!(table.lookup(block, outer), Some(id));
        assert_eq!(table.lookup_in(block, outer), None);
    }

    #[test]
    fn test_shadowing_resolves_innermost() {
        let mut table = SymbolTable::new();
        let name = Symbol::intern("x");
        table
            .insert(table.global, var_kind(), name, Type::Int, Visibility::Private)
            .unwrap();
        let inner = table.new_scope(ScopeKind::Block, table.global);
        let shadow = table
            .insert(inner, var_kind(), name, Type::Float, Visibility::Private)
            .unwrap();
        assert_eq!(table.lookup(inner, name), Some(shadow));
    }

    #[test]
    fn test_declaration_order_preserved() {
        let mut table = SymbolTable::new();
        for name in ["甲", "乙", "丙"] {
            table
                .insert(
                    table.global,
                    var_kind(),
                    Symbol::intern(name),
                    Type::Int,
                    Visibility::Private,
                )
                .unwrap();
        }
        let names: Vec<_> = table.scopes[table.global]
            .symbols
            .keys()
            .map(|s| s.as_str())
            .collect();
        assert_eq!(names, vec!["甲", "乙", "丙"]);
    }

    #[test]
    fn test_module_scope_name() {
        let mut table = SymbolTable::new();
        let name = Symbol::intern("数学");
        let scope = table.new_module_scope(name, table.global);
        assert_eq!(table.module_name_of(scope), Some(name));
        assert_eq!(table.module_name_of(table.global), None);
    }

    #[test]
    fn test_inject_keeps_decl_scope() {
        let mut table = SymbolTable::new();
        let module = table.new_module_scope(Symbol::intern("M"), table.global);
        let x = Symbol::intern("x");
        let id = table
            .insert(module, var_kind(), x, Type::Int, Visibility::Public)
            .unwrap();
        table.inject(table.global, id).unwrap();
        let found = table.lookup(table.global, x).unwrap();
        assert_eq!(found, id);
        assert_eq!(table.symbol(found).decl_scope, module);
    }

    #[test]
    fn test_is_ancestor() {
        let mut table = SymbolTable::new();
        let func = table.new_scope(ScopeKind::Function, table.global);
        let block = table.new_scope(ScopeKind::Block, func);
        assert!(table.is_ancestor(table.global, block));
        assert!(table.is_ancestor(func, block));
        assert!(!table.is_ancestor(block, func));
    }
}
