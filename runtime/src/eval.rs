//! This module contains the core logic of the interpreter.

use crate::callable;
use crate::class;
use crate::controlflow::{BreakAction, ControlFlow};
use crate::holder::Holder;
use crate::modules;
use crate::prelude::*;
use crate::syntax::ast::*;
use crate::table::SymbolTable;

/// Evaluate the body of a callable in a fresh scope for its locals. The result
/// is the value of an executed `return`, or else the value of the last
/// statement.
pub(crate) fn evaluate_body(runtime: &mut Runtime, block: &Block) -> Result<Value, Exception> {
    runtime.with_scope(SymbolTable::new(), |runtime| {
        match execute_block(runtime, block)? {
            ControlFlow::Continue(value) => Ok(value),
            ControlFlow::Break(BreakAction::Return(value)) => Ok(value),
        }
    })
}

/// Execute each statement of a block in the current scope.
pub(crate) fn execute_block(runtime: &mut Runtime, block: &Block) -> Result<ControlFlow<Value>, Exception> {
    let mut last_value = runtime.nothing()?;

    for statement in block.statements.iter() {
        match execute_statement(runtime, statement)? {
            ControlFlow::Continue(value) => last_value = value,
            flow => return Ok(flow),
        }
    }

    Ok(ControlFlow::Continue(last_value))
}

/// Execute a single statement. Errors escaping the statement become fatal,
/// tagged with the statement's source.
fn execute_statement(runtime: &mut Runtime, statement: &Statement) -> Result<ControlFlow<Value>, Exception> {
    execute_statement_kind(runtime, &statement.kind).map_err(|e| e.at(&statement.text))
}

fn execute_statement_kind(runtime: &mut Runtime, kind: &StatementKind) -> Result<ControlFlow<Value>, Exception> {
    let value = match kind {
        StatementKind::Val { name, value } => {
            let value = evaluate(runtime, value)?;
            runtime.declare(name.clone(), Holder::constant(value.clone()))?;
            value
        }

        StatementKind::Var { name, value } => {
            let value = match value {
                Some(value) => evaluate(runtime, value)?,
                None => runtime.nothing()?,
            };
            runtime.declare(name.clone(), Holder::mutable(value.clone()))?;
            value
        }

        StatementKind::Assign { target, op, value } => evaluate_assignment(runtime, target, *op, value)?,

        StatementKind::Return(value) => {
            let value = match value {
                Some(value) => evaluate(runtime, value)?,
                None => runtime.nothing()?,
            };
            return Ok(ControlFlow::Break(BreakAction::Return(value)));
        }

        StatementKind::Function(decl) => {
            let function = callable::declare_function(runtime, decl)?;
            if let Some(name) = &decl.name {
                runtime.declare(name.clone(), Holder::constant(function.clone()))?;
            }
            function
        }

        StatementKind::Class(decl) => {
            let class = class::declare_class(runtime, decl)?;
            runtime.declare(decl.name.clone(), Holder::constant(class.clone()))?;
            class
        }

        StatementKind::Module(decl) => modules::declare_module(runtime, decl)?,

        StatementKind::Import(statement) => {
            modules::import(runtime, statement)?;
            runtime.nothing()?
        }

        StatementKind::Export(names) => {
            modules::export(runtime, names)?;
            runtime.nothing()?
        }

        StatementKind::Expr(expr) => evaluate(runtime, expr)?,
    };

    Ok(ControlFlow::Continue(value))
}

fn evaluate_assignment(runtime: &mut Runtime, target: &AssignTarget, op: AssignOp, value: &Expr) -> Result<Value, Exception> {
    match target {
        AssignTarget::Name(name) => {
            let value = match op.hook() {
                None => evaluate(runtime, value)?,
                Some(hook) => {
                    let current = runtime.get(name)?;
                    let rhs = evaluate(runtime, value)?;
                    runtime.dispatch(&current, hook, vec![rhs])?
                }
            };

            runtime.set(name, value.clone())?;
            Ok(value)
        }

        AssignTarget::Member { target, name } => {
            let target = evaluate(runtime, target)?;
            let value = match op.hook() {
                None => evaluate(runtime, value)?,
                Some(hook) => {
                    let current = runtime.get_member(&target, name)?;
                    let rhs = evaluate(runtime, value)?;
                    runtime.dispatch(&current, hook, vec![rhs])?
                }
            };

            runtime.set_member(&target, name, value.clone())?;
            Ok(value)
        }
    }
}

/// Evaluate an expression to a value.
pub(crate) fn evaluate(runtime: &mut Runtime, expr: &Expr) -> Result<Value, Exception> {
    match expr {
        Expr::Integer(value) => runtime.make_integer(*value),
        Expr::Float(value) => runtime.make_float(*value),
        Expr::String(value) => runtime.make_string(value.clone()),
        Expr::Reference(name) => runtime.get(name),

        Expr::Binary { lhs, op, rhs } => {
            let lhs = evaluate(runtime, lhs)?;
            let rhs = evaluate(runtime, rhs)?;
            runtime.dispatch(&lhs, op.hook(), vec![rhs])
        }

        // A call through a member access keeps the target as the receiver.
        Expr::Call { callee, args } => {
            if let Expr::Member { target, name } = &**callee {
                let target = evaluate(runtime, target)?;
                let args = evaluate_args(runtime, args)?;
                return runtime.call_member(&target, name, args);
            }

            let callee = evaluate(runtime, callee)?;
            let args = evaluate_args(runtime, args)?;
            runtime.call(&callee, args)
        }

        Expr::Index { target, args } => {
            let target = evaluate(runtime, target)?;
            let args = evaluate_args(runtime, args)?;
            runtime.dispatch(&target, "[]", args)
        }

        Expr::Member { target, name } => {
            let target = evaluate(runtime, target)?;
            runtime.get_member(&target, name)
        }

        Expr::Function(decl) => callable::declare_function(runtime, decl),
        Expr::Closure(decl) => callable::declare_closure(runtime, decl),
    }
}

fn evaluate_args(runtime: &mut Runtime, args: &[Expr]) -> Result<Vec<Value>, Exception> {
    args.iter().map(|arg| evaluate(runtime, arg)).collect()
}
