// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! The symbol table: global symbols plus an arena of block scopes.

use std::collections::HashMap;

use kiln_ast::ty::Type;
use kiln_ast::NodeId;

use crate::natives::NativeKind;

/// Index of a scope record in the table's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ScopeId(pub u32);

/// What a global name refers to.
#[derive(Debug, Clone)]
pub enum SymbolInfo {
    Function { params: Vec<Type>, ret: Type },
    Native { params: Vec<Type>, ret: Type, kind: NativeKind },
    Static { ty: Type },
    Const { ty: Type },
}

/// One lexical block scope: its bindings and a link to the enclosing scope.
#[derive(Debug, Default)]
struct Scope {
    parent: Option<ScopeId>,
    variables: HashMap<String, Type>,
}

/// Global symbols plus the scope arena built from every function body.
///
/// Scopes form a tree through parent indices; blocks are mapped to their
/// scope by node id, which is how later passes re-enter the tree.
#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolInfo>,
    scopes: Vec<Scope>,
    block_scopes: HashMap<NodeId, ScopeId>,
}

impl SymbolTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Register a global symbol. Returns false when the name is taken; the
    /// first definition wins and is not overwritten.
    pub(crate) fn register_symbol(&mut self, name: &str, info: SymbolInfo) -> bool {
        if self.symbols.contains_key(name) {
            return false;
        }
        self.symbols.insert(name.to_string(), info);
        true
    }

    /// Create a scope for a block and link it to its parent.
    pub(crate) fn register_scope(&mut self, block: NodeId, parent: Option<ScopeId>) -> ScopeId {
        if self.block_scopes.contains_key(&block) {
            panic!("scope for block {:?} already exists", block);
        }
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(Scope { parent, variables: HashMap::new() });
        self.block_scopes.insert(block, id);
        id
    }

    /// Register a variable in a scope. Returns false on redeclaration within
    /// that same scope.
    pub(crate) fn register_variable(&mut self, scope: ScopeId, name: &str, ty: Type) -> bool {
        let variables = &mut self.scopes[scope.0 as usize].variables;
        if variables.contains_key(name) {
            return false;
        }
        variables.insert(name.to_string(), ty);
        true
    }

    pub fn lookup_symbol(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.get(name)
    }

    /// Look up a callable symbol's (parameter types, return type).
    pub fn lookup_function(&self, name: &str) -> Option<(&[Type], Type)> {
        match self.symbols.get(name)? {
            SymbolInfo::Function { params, ret } | SymbolInfo::Native { params, ret, .. } => {
                Some((params.as_slice(), *ret))
            }
            SymbolInfo::Static { .. } | SymbolInfo::Const { .. } => None,
        }
    }

    /// The scope created for a block.
    ///
    /// Panics when no scope was registered; that is a missed builder
    /// traversal, a bug in the compiler rather than in the program.
    pub fn scope_of(&self, block: NodeId) -> ScopeId {
        match self.block_scopes.get(&block) {
            Some(id) => *id,
            None => panic!("no scope registered for block {:?}", block),
        }
    }

    /// Resolve a variable reference: walk the scope chain outward, then fall
    /// back to global statics and consts.
    pub fn resolve_variable(&self, scope: ScopeId, name: &str) -> Option<Type> {
        let mut current = Some(scope);

        while let Some(id) = current {
            let scope = &self.scopes[id.0 as usize];
            if let Some(ty) = scope.variables.get(name) {
                return Some(*ty);
            }
            current = scope.parent;
        }

        match self.symbols.get(name) {
            Some(SymbolInfo::Static { ty }) | Some(SymbolInfo::Const { ty }) => Some(*ty),
            _ => None,
        }
    }
}
