// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Local variable slots and scope bookkeeping for one generated method.

use std::collections::HashMap;

use kiln_ast::symbol::Binding;
use kiln_ast::ty::Type;
use kiln_ast::NodeId;
use kiln_classfile::Label;

/// A named local bound to a numeric slot.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Variable {
    pub slot: u16,
    pub ty: Type,
}

/// One entry per entered block: enough to restore the lookup position and
/// the active loop's break label on exit.
#[derive(Debug, Clone, Copy)]
struct ScopeFrame {
    scope: NodeId,
    brk: Option<Label>,
}

/// The variable-slot table for one method.
///
/// Bindings are keyed by (name, declaring block), with parent links walked
/// for lookup, so inner scopes shadow outer ones. Slot indices are assigned
/// once per declaration and never reused, even after the declaring scope
/// exits.
#[derive(Debug)]
pub(crate) struct Variables {
    bindings: HashMap<(String, NodeId), Variable>,
    parents: HashMap<NodeId, Option<NodeId>>,
    states: Vec<ScopeFrame>,
    current: Option<NodeId>,
    brk: Option<Label>,
    next_slot: u16,
}

impl Variables {
    /// A fresh table; instance methods reserve slot 0 for the receiver.
    pub fn new(is_static: bool) -> Self {
        Self {
            bindings: HashMap::new(),
            parents: HashMap::new(),
            states: Vec::new(),
            current: None,
            brk: None,
            next_slot: if is_static { 0 } else { 1 },
        }
    }

    /// Bind the function parameters into the body block's scope, in order.
    pub fn define_params(&mut self, params: &[Binding], body: NodeId) {
        for param in params {
            let variable = self.alloc(param.ty.value);
            self.bindings.insert((param.name.value.clone(), body), variable);
        }
    }

    /// Enter a block scope.
    pub fn push_scope(&mut self, scope: NodeId) {
        self.parents.insert(scope, self.current);
        self.states.push(ScopeFrame { scope, brk: self.brk });
        self.current = Some(scope);
    }

    /// Leave the current block scope, restoring the enclosing bindings view
    /// and the enclosing loop's break label.
    pub fn pop_scope(&mut self) {
        self.states.pop().expect("scope stack underflow");

        match self.states.last() {
            Some(restored) => {
                self.current = Some(restored.scope);
                self.brk = restored.brk;
            }
            None => {
                self.current = None;
                self.brk = None;
            }
        }
    }

    /// Declare a variable in the current scope on a fresh slot.
    pub fn define(&mut self, name: &str, ty: Type) -> Variable {
        let scope = self.current.expect("declaration outside of any scope");
        let variable = self.alloc(ty);
        self.bindings.insert((name.to_string(), scope), variable);
        variable
    }

    fn alloc(&mut self, ty: Type) -> Variable {
        let variable = Variable { slot: self.next_slot, ty };
        self.next_slot += 1;
        variable
    }

    /// Resolve a name through the scope chain.
    pub fn lookup(&self, name: &str) -> Option<Variable> {
        let mut scope = self.current;

        while let Some(id) = scope {
            if let Some(variable) = self.bindings.get(&(name.to_string(), id)) {
                return Some(*variable);
            }
            scope = *self.parents.get(&id)?;
        }

        None
    }

    /// Make `label` the break target for the loop about to be entered.
    pub fn enter_loop(&mut self, label: Label) {
        self.brk = Some(label);
    }

    /// The innermost enclosing loop's break label.
    pub fn break_label(&self) -> Option<Label> {
        self.brk
    }
}
