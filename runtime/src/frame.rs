//! Activation records.
use crate::exceptions::Exception;
use crate::holder::Holder;
use crate::table::{SymbolTable, SymbolTableStack};
use crate::value::Value;
use gc::{Finalize, Trace};
use std::collections::{BTreeMap, BTreeSet};

/// One activation on the call stack.
///
/// A frame's symbol stack is seeded with the builtin table at its base, the
/// module table of the running code (if different from the locals), and a
/// fresh table for locals on top.
#[derive(Clone, Trace, Finalize)]
pub struct StackFrame {
    owner: Value,
    name: String,
    symbols: SymbolTableStack,

    /// Top-level table of the module or program the running code was
    /// declared in.
    module_table: SymbolTable,

    /// Open storage for bookkeeping attached to this activation, such as
    /// names pending export.
    #[unsafe_ignore_trace]
    data_store: BTreeMap<String, BTreeSet<String>>,
}

impl StackFrame {
    /// Create a frame whose locals also serve as its module table. Used for
    /// the main program and module bodies.
    pub fn new(owner: Value, name: impl Into<String>, builtins: &SymbolTable) -> Self {
        let locals = SymbolTable::new();
        let mut symbols = SymbolTableStack::new();
        symbols.push(builtins.clone());
        symbols.push(locals.clone());

        Self {
            owner,
            name: name.into(),
            symbols,
            module_table: locals,
            data_store: BTreeMap::new(),
        }
    }

    /// Create a frame for code declared in the given module table.
    pub fn nested(owner: Value, name: impl Into<String>, builtins: &SymbolTable, module_table: Option<&SymbolTable>) -> Self {
        let mut frame = Self::new(owner, name, builtins);

        if let Some(module_table) = module_table {
            let locals = frame.symbols.pop().unwrap_or_default();
            frame.symbols.push(module_table.clone());
            frame.symbols.push(locals);
            frame.module_table = module_table.clone();
        }

        frame
    }

    pub fn owner(&self) -> &Value {
        &self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn renamed(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn symbols(&self) -> &SymbolTableStack {
        &self.symbols
    }

    pub fn symbols_mut(&mut self) -> &mut SymbolTableStack {
        &mut self.symbols
    }

    pub fn module_table(&self) -> &SymbolTable {
        &self.module_table
    }

    /// The innermost scope, where declarations go.
    pub fn locals(&self) -> Result<&SymbolTable, Exception> {
        self.symbols
            .peek()
            .ok_or_else(|| Exception::Symbol(format!("frame '{}' has no open scope", self.name)))
    }

    /// Declare a name in the innermost scope.
    pub fn define(&self, name: impl Into<String>, holder: Holder) -> Result<(), Exception> {
        self.locals()?.add(name, holder)
    }

    pub fn lookup(&self, name: &str) -> Option<Holder> {
        self.symbols.lookup(name)
    }

    /// Record a value under a data store key.
    pub fn record(&mut self, key: &str, value: impl Into<String>) {
        self.data_store.entry(key.to_owned()).or_default().insert(value.into());
    }

    /// Values recorded under a data store key, in name order.
    pub fn recorded(&self, key: &str) -> Vec<String> {
        self.data_store
            .get(key)
            .map(|values| values.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Copy this frame for a closure. Every table is duplicated so that later
    /// changes in the original activation are not observed by the copy.
    pub fn capture(&self) -> StackFrame {
        let symbols = self.symbols.capture();
        let module_table = self.symbols
            .tables()
            .iter()
            .position(|table| table.ptr_eq(&self.module_table))
            .and_then(|index| symbols.tables().get(index).cloned())
            .unwrap_or_else(|| self.module_table.capture());

        Self {
            owner: self.owner.clone(),
            name: self.name.clone(),
            symbols,
            module_table,
            data_store: self.data_store.clone(),
        }
    }
}
