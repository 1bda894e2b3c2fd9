//! Module system implementation.
//!
//! A module body runs once, in its own frame. Every top-level binding of the
//! body becomes private to the module; names listed by `export` are published
//! through read-only wrapper holders. Modules live in a registry keyed by
//! dotted name, and `import` copies published holders into the importing
//! scope.
use crate::eval;
use crate::frame::StackFrame;
use crate::holder::Holder;
use crate::prelude::*;
use crate::syntax::ast;
use crate::table::SymbolTable;
use crate::value::Kind;
use gc::{Finalize, Trace};

/// Data store key under which a frame collects exported names.
pub(crate) const EXPORTS: &str = "exports";

#[derive(Trace, Finalize)]
pub struct Module {
    name: String,
    private_table: SymbolTable,
    public_table: SymbolTable,
}

impl Module {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Every top-level binding of the module body.
    pub fn private_table(&self) -> &SymbolTable {
        &self.private_table
    }

    /// Exported bindings only.
    pub fn public_table(&self) -> &SymbolTable {
        &self.public_table
    }
}

/// Evaluate a module declaration and register the resulting module.
pub(crate) fn declare_module(runtime: &mut Runtime, decl: &ast::ModuleDecl) -> Result<Value, Exception> {
    if runtime.modules().contains_local(&decl.name) {
        return Err(Exception::Symbol(format!("Module '{}' is already defined", decl.name)));
    }

    let types = runtime.types().clone();
    let module = Value::new(Some(types.root.clone()), Kind::Module(Module {
        name: decl.name.clone(),
        private_table: SymbolTable::new(),
        public_table: SymbolTable::new(),
    }));
    module.wire_level();
    module.set_typeobj(types.module.clone());

    let frame = StackFrame::new(module.clone(), decl.name.clone(), runtime.builtins());
    let (locals, exports) = runtime.with_frame(frame, |runtime| {
        // A top-level `return` only ends the body early.
        let _ = eval::execute_block(runtime, &decl.body)?;

        let frame = runtime.peek_frame(0)?;
        Ok((frame.module_table().clone(), frame.recorded(EXPORTS)))
    })?;

    if let Kind::Module(definition) = module.kind() {
        for (name, holder) in locals.holders() {
            definition.private_table.add(name, holder)?;
        }

        for name in exports {
            let holder = definition.private_table
                .lookup(&name)
                .ok_or_else(|| Exception::SymbolUnknown(name.clone()))?;
            definition.public_table.add(name, Holder::wrap(holder))?;
        }

        log::debug!("registered module '{}' exporting {} name(s)", definition.name, definition.public_table.len());
    }

    runtime.register_module(module.clone())?;

    Ok(module)
}

/// Record names to export when the enclosing module body finishes.
pub(crate) fn export(runtime: &mut Runtime, names: &[String]) -> Result<(), Exception> {
    let frame = runtime.peek_frame_mut(0)?;
    if !matches!(frame.owner().kind(), Kind::Module(_)) {
        return Err(Exception::Symbol(String::from("Cannot export outside of a module")));
    }

    for name in names {
        frame.record(EXPORTS, name.clone());
    }

    Ok(())
}

/// Bring a registered module's exports into the current scope.
pub(crate) fn import(runtime: &mut Runtime, statement: &ast::ImportStmt) -> Result<(), Exception> {
    let module = runtime.module(&statement.module)?;
    let public = match module.kind() {
        Kind::Module(definition) => definition.public_table().clone(),
        _ => return Err(Exception::InvalidType(format!("'{}' is not a module", statement.module))),
    };

    match &statement.binding {
        ast::ImportBinding::All => {
            for (name, holder) in public.holders() {
                runtime.declare(name, holder)?;
            }
        }

        ast::ImportBinding::Only(names) => {
            for name in names {
                let holder = public.lookup(name).ok_or_else(|| Exception::SymbolUnknown(name.clone()))?;
                runtime.declare(name.clone(), holder)?;
            }
        }

        ast::ImportBinding::Alias(alias) => {
            let types = runtime.types().clone();
            let value = Value::new(Some(types.root.clone()), Kind::ModuleAlias(module));
            value.wire_level();
            value.set_typeobj(types.module.clone());
            runtime.declare(alias.clone(), Holder::constant(value))?;
        }
    }

    Ok(())
}
