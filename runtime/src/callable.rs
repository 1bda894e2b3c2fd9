//! Callables and their bindings: methods, functions and closures.
use crate::eval;
use crate::foreign::ForeignFn;
use crate::frame::StackFrame;
use crate::holder::Holder;
use crate::prelude::*;
use crate::syntax::ast;
use crate::table::SymbolTable;
use crate::value::Kind;
use gc::{Finalize, Trace};
use std::rc::Rc;

/// The code a callable runs.
#[derive(Clone, Debug)]
pub enum Body {
    Foreign(ForeignFn),
    Block(Rc<ast::Block>),
}

#[derive(Clone, Debug)]
enum Params {
    Fixed(Vec<String>),

    /// Accepts any number of arguments without binding them by name.
    Variadic,
}

/// A named, parameterized body.
#[derive(Clone, Trace, Finalize)]
pub struct Callable {
    name: String,

    #[unsafe_ignore_trace]
    params: Params,

    #[unsafe_ignore_trace]
    body: Body,

    /// Module table of the code that declared this callable.
    module: Option<SymbolTable>,
}

impl Callable {
    pub fn foreign(name: impl Into<String>, params: &[&str], f: impl Into<ForeignFn>) -> Self {
        Self {
            name: name.into(),
            params: Params::Fixed(params.iter().map(|param| param.to_string()).collect()),
            body: Body::Foreign(f.into()),
            module: None,
        }
    }

    pub fn variadic(name: impl Into<String>, f: impl Into<ForeignFn>) -> Self {
        Self {
            name: name.into(),
            params: Params::Variadic,
            body: Body::Foreign(f.into()),
            module: None,
        }
    }

    pub fn block(name: impl Into<String>, params: Vec<String>, body: Rc<ast::Block>, module: Option<SymbolTable>) -> Self {
        Self {
            name: name.into(),
            params: Params::Fixed(params),
            body: Body::Block(body),
            module,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared parameter count, or `None` if any count is accepted.
    pub fn arity(&self) -> Option<usize> {
        match &self.params {
            Params::Fixed(params) => Some(params.len()),
            Params::Variadic => None,
        }
    }

    pub fn module(&self) -> Option<&SymbolTable> {
        self.module.as_ref()
    }

    /// Check arity, bind the arguments as constants in a fresh scope on the
    /// current frame, and run the body inside that scope.
    pub(crate) fn invoke(&self, runtime: &mut Runtime, caller: &str, this: &Value, args: Vec<Value>) -> Result<Value, Exception> {
        let params = SymbolTable::new();

        if let Params::Fixed(names) = &self.params {
            if names.len() != args.len() {
                return Err(Exception::Arity {
                    caller: caller.to_owned(),
                    name: self.name.clone(),
                    expected: names.len(),
                    actual: args.len(),
                });
            }

            for (name, value) in names.iter().zip(&args) {
                params.add(name.clone(), Holder::constant(value.clone()))?;
            }
        }

        runtime.with_scope(params, |runtime| match &self.body {
            Body::Foreign(f) => f.call(runtime, this, &args),
            Body::Block(block) => eval::evaluate_body(runtime, block),
        })
    }
}

/// A callable bound to the object level it was defined on.
#[derive(Trace, Finalize)]
pub struct Method {
    owner: Value,
    callable: Callable,
}

impl Method {
    pub fn name(&self) -> &str {
        self.callable.name()
    }

    pub fn owner(&self) -> &Value {
        &self.owner
    }

    /// Run the method in a new frame owned by its owner, with `self` and
    /// `super` bound. `self` is the facade of the receiver if one was given,
    /// otherwise the facade of the owner.
    pub(crate) fn call(&self, runtime: &mut Runtime, receiver: Option<&Value>, args: Vec<Value>) -> Result<Value, Exception> {
        let this = receiver.unwrap_or(&self.owner).clone();
        let superobj = match self.owner.superobj() {
            Some(superobj) => superobj.clone(),
            None => runtime.nothing()?,
        };

        let caller = runtime.frame_name();
        let frame = StackFrame::nested(self.owner.clone(), self.callable.name(), runtime.builtins(), self.callable.module());
        frame.define("self", Holder::constant(this.selfobj()))?;
        frame.define("super", Holder::constant(superobj))?;

        runtime.with_frame(frame, |runtime| self.callable.invoke(runtime, &caller, &this, args))
    }
}

#[derive(Trace, Finalize)]
pub struct Function {
    callable: Callable,
}

impl Function {
    pub fn name(&self) -> &str {
        self.callable.name()
    }

    /// Run the function in a new frame owned by the function object itself.
    pub(crate) fn call(&self, runtime: &mut Runtime, this: &Value, args: Vec<Value>) -> Result<Value, Exception> {
        let caller = runtime.frame_name();
        let frame = StackFrame::nested(this.clone(), self.callable.name(), runtime.builtins(), self.callable.module());

        runtime.with_frame(frame, |runtime| self.callable.invoke(runtime, &caller, this, args))
    }
}

/// A callable carrying a copy of the frame it was created in.
#[derive(Trace, Finalize)]
pub struct Closure {
    callable: Callable,
    frame: StackFrame,
}

impl Closure {
    pub fn name(&self) -> &str {
        self.callable.name()
    }

    /// Run the closure on its captured tables. Bindings changed by the closure
    /// persist across its calls; changes in the frame it was created in after
    /// the capture are not seen.
    pub(crate) fn call(&self, runtime: &mut Runtime, this: &Value, args: Vec<Value>) -> Result<Value, Exception> {
        let caller = runtime.frame_name();
        let frame = self.frame.clone().renamed(self.callable.name());

        runtime.with_frame(frame, |runtime| self.callable.invoke(runtime, &caller, this, args))
    }
}

/// Callables answer their own `()` hook.
fn bind_call_hook(callable: &Value) -> Result<(), Exception> {
    callable.hook_table().add("()", Holder::constant(callable.clone()))
}

/// Bind a callable to an owner as a method object.
pub(crate) fn make_method(runtime: &Runtime, owner: &Value, callable: Callable) -> Result<Value, Exception> {
    let method = Value::new(Some(runtime.types().root.clone()), Kind::Method(Method {
        owner: owner.clone(),
        callable,
    }));
    method.wire_level();
    method.set_typeobj(runtime.types().method.clone());
    bind_call_hook(&method)?;

    Ok(method)
}

pub(crate) fn make_function(runtime: &mut Runtime, callable: Callable) -> Result<Value, Exception> {
    let class = runtime.builtin("Function")?;
    let function = crate::class::instantiate(runtime, &class, Kind::Function(Function {
        callable,
    }))?;
    bind_call_hook(&function)?;

    Ok(function)
}

pub(crate) fn make_closure(runtime: &mut Runtime, callable: Callable, frame: StackFrame) -> Result<Value, Exception> {
    let class = runtime.builtin("Closure")?;
    let closure = crate::class::instantiate(runtime, &class, Kind::Closure(Closure {
        callable,
        frame,
    }))?;
    bind_call_hook(&closure)?;

    Ok(closure)
}

/// Build a function object from a declaration.
pub(crate) fn declare_function(runtime: &mut Runtime, decl: &ast::FunctionDecl) -> Result<Value, Exception> {
    let module = runtime.peek_frame(0)?.module_table().clone();
    let name = decl.name.clone().unwrap_or_else(|| String::from("<anonymous>"));

    make_function(runtime, Callable::block(name, decl.params.clone(), decl.body.clone(), Some(module)))
}

/// Build a closure object capturing the current frame.
pub(crate) fn declare_closure(runtime: &mut Runtime, decl: &ast::FunctionDecl) -> Result<Value, Exception> {
    let frame = runtime.peek_frame(0)?.capture();
    let module = frame.module_table().clone();
    let callable = Callable::block("<closure>", decl.params.clone(), decl.body.clone(), Some(module));

    make_closure(runtime, callable, frame)
}
