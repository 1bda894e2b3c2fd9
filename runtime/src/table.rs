//! Named-binding scopes.
//!
//! A [`SymbolTable`] maps names to [`Holder`]s and falls back to an optional
//! parent table on a miss. Chains and stacks compose tables into a single
//! search order.
use crate::exceptions::Exception;
use crate::holder::Holder;
use crate::runtime::Runtime;
use crate::value::Value;
use gc::{Finalize, Gc, GcCell, Trace};
use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;
use std::fmt;

lazy_static! {
    static ref SYMBOL: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
    static ref MODULE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").unwrap();
}

/// Names a hook table accepts.
pub const HOOKS: &[&str] = &["()", "[]", ".", "+", "-", "*", "/", "+=", "-=", "*=", "/=", "isa"];

/// Decides which names a table accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Validator {
    Symbol,
    Hook,
    Module,
}

impl Validator {
    pub fn accepts(self, name: &str) -> bool {
        match self {
            Validator::Symbol => SYMBOL.is_match(name),
            Validator::Hook => HOOKS.contains(&name),
            Validator::Module => MODULE.is_match(name),
        }
    }

    fn describe(self) -> &'static str {
        match self {
            Validator::Symbol => "symbol",
            Validator::Hook => "hook",
            Validator::Module => "module name",
        }
    }
}

#[derive(Trace, Finalize)]
struct TableData {
    symbols: BTreeMap<String, Holder>,
    parent: Option<SymbolTable>,
    #[unsafe_ignore_trace]
    validator: Validator,
}

/// A table of named holders. Cloning the handle shares the table.
#[derive(Clone, Trace, Finalize)]
pub struct SymbolTable(Gc<GcCell<TableData>>);

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Create an empty symbol table with no parent.
    pub fn new() -> Self {
        Self::with_parent(None, Validator::Symbol)
    }

    pub fn with_validator(validator: Validator) -> Self {
        Self::with_parent(None, validator)
    }

    pub fn with_parent(parent: Option<SymbolTable>, validator: Validator) -> Self {
        Self(Gc::new(GcCell::new(TableData {
            symbols: BTreeMap::new(),
            parent,
            validator,
        })))
    }

    pub fn validator(&self) -> Validator {
        self.0.borrow().validator
    }

    pub fn parent(&self) -> Option<SymbolTable> {
        self.0.borrow().parent.clone()
    }

    /// Bind a new name in this table.
    ///
    /// Fails if the validator rejects the name, or if the name is already
    /// bound locally. Names bound in a parent may be shadowed.
    pub fn add(&self, name: impl Into<String>, holder: Holder) -> Result<(), Exception> {
        let name = name.into();
        let validator = self.validator();

        if !validator.accepts(&name) {
            return Err(Exception::Symbol(format!("Invalid {} '{}'", validator.describe(), name)));
        }

        let mut data = self.0.borrow_mut();

        if data.symbols.contains_key(&name) {
            return Err(Exception::SymbolContent(name));
        }

        data.symbols.insert(name, holder);
        Ok(())
    }

    /// Find the holder for a name, searching parents on a miss.
    pub fn lookup(&self, name: &str) -> Option<Holder> {
        let data = self.0.borrow();

        match data.symbols.get(name) {
            Some(holder) => Some(holder.clone()),
            None => data.parent.as_ref().and_then(|parent| parent.lookup(name)),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Whether the name is bound in this table itself, ignoring parents.
    pub fn contains_local(&self, name: &str) -> bool {
        self.0.borrow().symbols.contains_key(name)
    }

    pub fn get(&self, runtime: &mut Runtime, name: &str) -> Result<Value, Exception> {
        match self.lookup(name) {
            Some(holder) => holder.get(runtime, None),
            None => Err(Exception::SymbolUnknown(name.to_owned())),
        }
    }

    /// Assign to an existing binding, wherever in the parent chain it lives.
    pub fn set(&self, runtime: &mut Runtime, name: &str, value: Value) -> Result<(), Exception> {
        match self.lookup(name) {
            Some(holder) => holder.set(runtime, None, value),
            None => Err(Exception::SymbolUnknown(name.to_owned())),
        }
    }

    /// Local bindings in name order.
    pub fn holders(&self) -> Vec<(String, Holder)> {
        self.0.borrow().symbols.iter().map(|(name, holder)| (name.clone(), holder.clone())).collect()
    }

    pub fn len(&self) -> usize {
        self.0.borrow().symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deep copy this table and its parents into fresh tables.
    pub fn capture(&self) -> SymbolTable {
        let data = self.0.borrow();

        Self(Gc::new(GcCell::new(TableData {
            symbols: data.symbols.iter().map(|(name, holder)| (name.clone(), holder.capture())).collect(),
            parent: data.parent.as_ref().map(SymbolTable::capture),
            validator: data.validator,
        })))
    }

    pub fn ptr_eq(&self, other: &SymbolTable) -> bool {
        std::ptr::eq(&*self.0, &*other.0)
    }
}

impl fmt::Debug for SymbolTable {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_set().entries(self.0.borrow().symbols.keys()).finish()
    }
}

/// Either a single table or a chain of scopes.
#[derive(Clone)]
pub enum Scope {
    Table(SymbolTable),
    Chain(SymbolTableChain),
}

impl Scope {
    pub fn lookup(&self, name: &str) -> Option<Holder> {
        match self {
            Scope::Table(table) => table.lookup(name),
            Scope::Chain(chain) => chain.lookup(name),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }
}

impl From<SymbolTable> for Scope {
    fn from(table: SymbolTable) -> Self {
        Scope::Table(table)
    }
}

impl From<SymbolTableChain> for Scope {
    fn from(chain: SymbolTableChain) -> Self {
        Scope::Chain(chain)
    }
}

/// An ordered list of scopes searched as one. The first match wins.
#[derive(Clone)]
pub struct SymbolTableChain {
    scopes: Vec<Scope>,
}

impl SymbolTableChain {
    pub fn new(scopes: impl IntoIterator<Item = Scope>) -> Self {
        Self {
            scopes: scopes.into_iter().collect(),
        }
    }

    pub fn lookup(&self, name: &str) -> Option<Holder> {
        self.scopes.iter().find_map(|scope| scope.lookup(name))
    }
}

/// A LIFO of tables for one activation, searched innermost first.
#[derive(Clone, Default, Trace, Finalize)]
pub struct SymbolTableStack {
    tables: Vec<SymbolTable>,
}

impl SymbolTableStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: SymbolTable) {
        self.tables.push(table);
    }

    pub fn pop(&mut self) -> Option<SymbolTable> {
        self.tables.pop()
    }

    /// The innermost table.
    pub fn peek(&self) -> Option<&SymbolTable> {
        self.tables.last()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    pub fn lookup(&self, name: &str) -> Option<Holder> {
        self.tables.iter().rev().find_map(|table| table.lookup(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    pub fn tables(&self) -> &[SymbolTable] {
        &self.tables
    }

    /// Deep copy every table on the stack.
    pub fn capture(&self) -> SymbolTableStack {
        Self {
            tables: self.tables.iter().map(SymbolTable::capture).collect(),
        }
    }
}
