//! The Cacti runtime.
use crate::builtins::{self, Types};
use crate::class;
use crate::controlflow::{BreakAction, ControlFlow};
use crate::eval;
use crate::exceptions::Exception;
use crate::frame::StackFrame;
use crate::holder::Holder;
use crate::syntax;
use crate::syntax::source::SourceFile;
use crate::table::{Scope, SymbolTable, SymbolTableChain, Validator};
use crate::value::{Kind, Value};
use std::fmt;
use std::io::{self, Write};
use std::time::Instant;

/// Holds all of the state of a Cacti runtime.
pub struct Runtime {
    /// Current call stack. The main program frame sits at the bottom.
    stack: Vec<StackFrame>,

    /// Builtin bindings, seeded at the base of every frame.
    builtins: SymbolTable,

    /// Registered modules by dotted name.
    modules: SymbolTable,

    /// The foundational type objects created before the runtime itself.
    types: Types,

    /// Where `print` writes to.
    output: Box<dyn Write>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("stack", &self.stack.iter().map(StackFrame::name).collect::<Vec<_>>())
            .field("builtins", &self.builtins)
            .field("modules", &self.modules)
            .finish()
    }
}

impl Runtime {
    /// Create a runtime writing program output to stdout.
    pub fn new() -> Result<Self, Exception> {
        Self::with_output(io::stdout())
    }

    /// Create a runtime writing program output to the given sink.
    pub fn with_output(output: impl Write + 'static) -> Result<Self, Exception> {
        let start_time = Instant::now();

        let mut runtime = Self {
            stack: Vec::new(),
            builtins: SymbolTable::new(),
            modules: SymbolTable::with_validator(Validator::Module),
            types: builtins::types(),
            output: Box::new(output),
        };

        builtins::init(&mut runtime)?;

        let main = runtime.make_object()?;
        let frame = StackFrame::new(main, "main", &runtime.builtins);
        runtime.push_frame(frame);

        log::debug!("runtime took {:?} to initialize", start_time.elapsed());

        Ok(runtime)
    }

    pub fn types(&self) -> &Types {
        &self.types
    }

    /// Get the table holding every builtin binding.
    pub fn builtins(&self) -> &SymbolTable {
        &self.builtins
    }

    /// Get the module registry.
    pub fn modules(&self) -> &SymbolTable {
        &self.modules
    }

    /// Look up a builtin by name.
    pub fn builtin(&mut self, name: &str) -> Result<Value, Exception> {
        let holder = self.builtins.lookup(name).ok_or_else(|| Exception::SymbolUnknown(name.to_owned()))?;

        holder.get(self, None)
    }

    pub(crate) fn register_module(&mut self, module: Value) -> Result<(), Exception> {
        let name = module.definition_name().unwrap_or_default().to_owned();

        if self.modules.contains_local(&name) {
            return Err(Exception::Symbol(format!("Module '{}' is already defined", name)));
        }

        self.modules.add(name, Holder::constant(module))
    }

    /// Look up a registered module by its dotted name.
    pub fn module(&mut self, name: &str) -> Result<Value, Exception> {
        let holder = self.modules.lookup(name).ok_or_else(|| Exception::SymbolUnknown(name.to_owned()))?;

        holder.get(self, None)
    }

    pub fn push_frame(&mut self, frame: StackFrame) {
        log::trace!("push frame '{}' (depth {})", frame.name(), self.stack.len() + 1);
        self.stack.push(frame);
    }

    pub fn pop_frame(&mut self) -> Option<StackFrame> {
        let frame = self.stack.pop();

        if let Some(frame) = frame.as_ref() {
            log::trace!("pop frame '{}' (depth {})", frame.name(), self.stack.len());
        }

        frame
    }

    /// Get the frame `n` levels below the top of the call stack.
    pub fn peek_frame(&self, n: usize) -> Result<&StackFrame, Exception> {
        self.stack.iter().rev().nth(n).ok_or_else(|| Self::missing_frame(n))
    }

    pub fn peek_frame_mut(&mut self, n: usize) -> Result<&mut StackFrame, Exception> {
        self.stack.iter_mut().rev().nth(n).ok_or_else(|| Self::missing_frame(n))
    }

    fn missing_frame(n: usize) -> Exception {
        Exception::Symbol(format!("no stack frame at depth {}", n))
    }

    /// Name of the running activation.
    pub fn frame_name(&self) -> String {
        self.stack
            .last()
            .map(|frame| frame.name().to_owned())
            .unwrap_or_else(|| String::from("<runtime>"))
    }

    /// Run a function inside a new frame. The frame is popped however the
    /// function exits.
    pub fn with_frame<T>(&mut self, frame: StackFrame, f: impl FnOnce(&mut Runtime) -> Result<T, Exception>) -> Result<T, Exception> {
        self.push_frame(frame);

        let mut runtime = scopeguard::guard(self, |runtime| {
            runtime.pop_frame();
        });

        f(&mut **runtime)
    }

    /// Run a function with an extra table pushed onto the current frame's
    /// symbol stack.
    pub fn with_scope<T>(&mut self, table: SymbolTable, f: impl FnOnce(&mut Runtime) -> Result<T, Exception>) -> Result<T, Exception> {
        self.peek_frame_mut(0)?.symbols_mut().push(table);

        let mut runtime = scopeguard::guard(self, |runtime| {
            if let Ok(frame) = runtime.peek_frame_mut(0) {
                frame.symbols_mut().pop();
            }
        });

        f(&mut **runtime)
    }

    /// Find the holder bound to a name in the current frame.
    pub fn lookup(&self, name: &str) -> Option<Holder> {
        self.stack.last().and_then(|frame| frame.lookup(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lookup(name).is_some()
    }

    /// Read a name visible from the current frame.
    pub fn get(&mut self, name: &str) -> Result<Value, Exception> {
        let holder = self.lookup(name).ok_or_else(|| Exception::SymbolUnknown(name.to_owned()))?;

        holder.get(self, None)
    }

    /// Assign to an existing name visible from the current frame.
    pub fn set(&mut self, name: &str, value: Value) -> Result<(), Exception> {
        let holder = self.lookup(name).ok_or_else(|| Exception::SymbolUnknown(name.to_owned()))?;

        holder.set(self, None, value)
    }

    /// Bind a new name in the innermost scope of the current frame.
    pub fn declare(&mut self, name: impl Into<String>, holder: Holder) -> Result<(), Exception> {
        self.peek_frame(0)?.define(name, holder)
    }

    /// The members of `target` visible to code running as `accessor`.
    pub(crate) fn member_scope(accessor: &Value, target: &Value) -> Scope {
        if accessor == target {
            target.private_table()
        } else if &accessor.selfobj() == target && !matches!(target.kind(), Kind::Module(_) | Kind::ModuleAlias(_)) {
            SymbolTableChain::new(vec![
                Scope::from(target.property_table().clone()),
                Scope::from(accessor.field_table().clone()),
            ]).into()
        } else {
            target.public_table()
        }
    }

    /// Read a member of an object through its `.` hook.
    pub fn get_member(&mut self, target: &Value, name: &str) -> Result<Value, Exception> {
        let name = self.make_string(name)?;

        self.dispatch(target, ".", vec![name])
    }

    /// Write a member of an object as seen from the current frame's owner.
    pub fn set_member(&mut self, target: &Value, name: &str, value: Value) -> Result<(), Exception> {
        let accessor = self.peek_frame(0)?.owner().clone();
        let holder = Self::member_scope(&accessor, target)
            .lookup(name)
            .ok_or_else(|| Exception::SymbolUnknown(name.to_owned()))?;

        holder.set(self, Some(target), value)
    }

    /// Read a member and call it with `target` as the receiver.
    pub fn call_member(&mut self, target: &Value, name: &str, args: Vec<Value>) -> Result<Value, Exception> {
        let member = self.get_member(target, name)?;

        self.invoke(&member, Some(target), args)
    }

    /// Invoke the hook bound to `op` on the target.
    pub fn dispatch(&mut self, target: &Value, op: &str, args: Vec<Value>) -> Result<Value, Exception> {
        let hook = target.hook_table().lookup(op).ok_or_else(|| Exception::OperationNotSupported {
            type_name: target.type_name(),
            operation: op.to_owned(),
        })?;
        let hook = hook.get(self, Some(target))?;

        // Callables are their own `()` hook.
        if &hook == target {
            self.invoke(&hook, None, args)
        } else {
            self.invoke(&hook, Some(target), args)
        }
    }

    /// Call a value with the given arguments.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, Exception> {
        self.invoke(callee, None, args)
    }

    pub(crate) fn invoke(&mut self, callable: &Value, receiver: Option<&Value>, args: Vec<Value>) -> Result<Value, Exception> {
        match callable.kind() {
            Kind::Method(method) => method.call(self, receiver, args),
            Kind::Function(function) => function.call(self, callable, args),
            Kind::Closure(closure) => closure.call(self, callable, args),
            _ => self.dispatch(callable, "()", args),
        }
    }

    pub fn make_integer(&mut self, value: i64) -> Result<Value, Exception> {
        let class = self.builtin("Integer")?;
        class::instantiate(self, &class, Kind::Integer(value))
    }

    pub fn make_float(&mut self, value: f64) -> Result<Value, Exception> {
        let class = self.builtin("Float")?;
        class::instantiate(self, &class, Kind::Float(value))
    }

    pub fn make_string(&mut self, value: impl Into<String>) -> Result<Value, Exception> {
        let class = self.builtin("String")?;
        class::instantiate(self, &class, Kind::String(value.into()))
    }

    /// Get the builtin `true` or `false`.
    pub fn make_boolean(&mut self, value: bool) -> Result<Value, Exception> {
        self.builtin(if value { "true" } else { "false" })
    }

    /// Create a plain `Object` instance.
    pub fn make_object(&mut self) -> Result<Value, Exception> {
        let class = self.builtin("Object")?;
        class::instantiate(self, &class, Kind::Instance)
    }

    pub fn nothing(&mut self) -> Result<Value, Exception> {
        self.builtin("nothing")
    }

    /// Text form of a value: its `string` member as read through the `.`
    /// hook, or the default description if it has none.
    pub fn to_text(&mut self, value: &Value) -> Result<String, Exception> {
        match self.get_member(value, "string") {
            Ok(text) => Ok(text.as_string().unwrap_or_else(|| text.describe())),
            Err(Exception::SymbolUnknown(_)) => Ok(value.describe()),
            Err(e) => Err(e),
        }
    }

    /// Write a line of program output.
    pub fn write_line(&mut self, text: &str) -> Result<(), Exception> {
        writeln!(self.output, "{}", text)?;
        self.output.flush()?;
        Ok(())
    }

    /// Parse and execute a whole program in the main frame.
    ///
    /// If the source fails to parse, a syntax exception is returned.
    pub fn execute(&mut self, file: impl Into<SourceFile>) -> Result<Value, Exception> {
        let file = file.into();
        log::debug!("executing '{}'", file.name());

        let block = syntax::parse(file)?;
        self.evaluate(&block)
    }

    /// Evaluate a parsed program in the current frame.
    pub fn evaluate(&mut self, block: &syntax::ast::Block) -> Result<Value, Exception> {
        match eval::execute_block(self, block)? {
            ControlFlow::Continue(value) => Ok(value),
            ControlFlow::Break(BreakAction::Return(value)) => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_in_the_main_frame() {
        let runtime = Runtime::new().unwrap();

        assert_eq!(runtime.frame_name(), "main");
        assert!(runtime.peek_frame(1).is_err());
        assert!(runtime.contains("Object"));
        assert!(runtime.contains("print"));
    }

    #[test]
    fn frames_are_popped_on_error() {
        let mut runtime = Runtime::new().unwrap();
        let owner = runtime.make_object().unwrap();
        let frame = StackFrame::new(owner, "failing", runtime.builtins());

        let result: Result<(), Exception> = runtime.with_frame(frame, |runtime| {
            assert_eq!(runtime.frame_name(), "failing");
            Err(Exception::ConstantValue)
        });

        assert!(matches!(result, Err(Exception::ConstantValue)));
        assert_eq!(runtime.frame_name(), "main");
    }

    #[test]
    fn scopes_are_popped_on_error() {
        let mut runtime = Runtime::new().unwrap();
        let depth = runtime.peek_frame(0).unwrap().symbols().len();

        let result: Result<(), Exception> = runtime.with_scope(SymbolTable::new(), |runtime| {
            assert_eq!(runtime.peek_frame(0).unwrap().symbols().len(), depth + 1);
            Err(Exception::ConstantValue)
        });

        assert!(result.is_err());
        assert_eq!(runtime.peek_frame(0).unwrap().symbols().len(), depth);
    }

    #[test]
    fn unknown_hooks_are_not_supported() {
        let mut runtime = Runtime::new().unwrap();
        let value = runtime.make_object().unwrap();

        match runtime.dispatch(&value, "+", Vec::new()) {
            Err(Exception::OperationNotSupported { type_name, operation }) => {
                assert_eq!(type_name, "Object");
                assert_eq!(operation, "+");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn builtin_values() {
        let mut runtime = Runtime::new().unwrap();

        let yes = runtime.make_boolean(true).unwrap();
        assert_eq!(yes, runtime.make_boolean(true).unwrap());
        assert_eq!(yes.as_boolean(), Some(true));
        assert_eq!(runtime.nothing().unwrap().describe(), "nothing");
        assert!(matches!(runtime.builtin("missing"), Err(Exception::SymbolUnknown(_))));
    }
}
