//! Class definitions and instantiation.
use crate::callable::{self, Callable};
use crate::eval;
use crate::frame::StackFrame;
use crate::holder::Holder;
use crate::prelude::*;
use crate::syntax::ast;
use crate::table::SymbolTable;
use crate::value::Kind;
use gc::{Finalize, Trace};
use std::rc::Rc;

/// A method template. Becomes a live method when bound to an owner.
#[derive(Clone, Trace, Finalize)]
pub struct MethodDefinition {
    callable: Callable,
}

impl MethodDefinition {
    pub fn new(callable: Callable) -> Self {
        Self {
            callable,
        }
    }

    pub fn name(&self) -> &str {
        self.callable.name()
    }

    fn bind(&self, runtime: &Runtime, owner: &Value) -> Result<Value, Exception> {
        callable::make_method(runtime, owner, self.callable.clone())
    }
}

/// A property template. A property with neither accessor is plain storage
/// starting out as `nothing`.
#[derive(Clone, Trace, Finalize)]
pub struct PropertyDefinition {
    name: String,
    getter: Option<MethodDefinition>,
    setter: Option<MethodDefinition>,
}

impl PropertyDefinition {
    pub fn new(name: impl Into<String>, getter: Option<MethodDefinition>, setter: Option<MethodDefinition>) -> Self {
        Self {
            name: name.into(),
            getter,
            setter,
        }
    }

    /// A read-only computed property.
    pub fn computed(getter: Callable) -> Self {
        Self::new(getter.name().to_owned(), Some(MethodDefinition::new(getter)), None)
    }
}

/// A field template with an optional initializer.
#[derive(Clone, Trace, Finalize)]
pub struct FieldDefinition {
    name: String,

    #[unsafe_ignore_trace]
    initializer: Option<Rc<ast::Expr>>,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, initializer: Option<Rc<ast::Expr>>) -> Self {
        Self {
            name: name.into(),
            initializer,
        }
    }
}

/// A constant field.
pub type ValDefinition = FieldDefinition;

/// A mutable field.
pub type VarDefinition = FieldDefinition;

/// Deferred member definitions plus the superclass they extend.
#[derive(Trace, Finalize)]
pub struct ClassDefinition {
    name: String,
    superclass: Option<Value>,
    hooks: Vec<MethodDefinition>,
    methods: Vec<MethodDefinition>,
    properties: Vec<PropertyDefinition>,
    vals: Vec<ValDefinition>,
    vars: Vec<VarDefinition>,

    /// Module table initializers run against.
    module: Option<SymbolTable>,
}

impl ClassDefinition {
    pub fn new(name: impl Into<String>, superclass: Option<Value>) -> Self {
        Self {
            name: name.into(),
            superclass,
            hooks: Vec::new(),
            methods: Vec::new(),
            properties: Vec::new(),
            vals: Vec::new(),
            vars: Vec::new(),
            module: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn superclass(&self) -> Option<&Value> {
        self.superclass.as_ref()
    }

    pub fn with_module(mut self, module: SymbolTable) -> Self {
        self.module = Some(module);
        self
    }

    pub fn add_hook(&mut self, hook: MethodDefinition) {
        self.hooks.push(hook);
    }

    pub fn add_method(&mut self, method: MethodDefinition) {
        self.methods.push(method);
    }

    pub fn add_property(&mut self, property: PropertyDefinition) {
        self.properties.push(property);
    }

    pub fn add_val(&mut self, val: ValDefinition) {
        self.vals.push(val);
    }

    pub fn add_var(&mut self, var: VarDefinition) {
        self.vars.push(var);
    }

    /// Populate an object level from this definition: hooks, methods,
    /// properties, vals, then vars.
    pub(crate) fn apply(&self, runtime: &mut Runtime, object: &Value) -> Result<(), Exception> {
        for hook in &self.hooks {
            let method = hook.bind(runtime, object)?;
            object.hook_table().add(hook.name(), Holder::constant(method))?;
        }

        for method in &self.methods {
            let bound = method.bind(runtime, object)?;
            object.property_table().add(method.name(), Holder::constant(bound))?;
        }

        for property in &self.properties {
            let holder = match (&property.getter, &property.setter) {
                (None, None) => Holder::mutable(runtime.nothing()?),
                (Some(getter), setter) => {
                    let setter = match setter {
                        Some(setter) => Some(setter.bind(runtime, object)?),
                        None => None,
                    };
                    Holder::computed(getter.bind(runtime, object)?, setter)
                }
                (None, Some(_)) => {
                    return Err(Exception::InvalidType(format!("property '{}' has a setter but no getter", property.name)));
                }
            };

            object.property_table().add(property.name.clone(), holder)?;
        }

        for val in &self.vals {
            let value = self.initialize(runtime, object, val)?;
            object.field_table().add(val.name.clone(), Holder::constant(value))?;
        }

        for var in &self.vars {
            let value = self.initialize(runtime, object, var)?;
            object.field_table().add(var.name.clone(), Holder::mutable(value))?;
        }

        Ok(())
    }

    /// Evaluate a field initializer in a temporary frame owned by the object.
    fn initialize(&self, runtime: &mut Runtime, object: &Value, field: &FieldDefinition) -> Result<Value, Exception> {
        let initializer = match &field.initializer {
            Some(initializer) => initializer,
            None => return runtime.nothing(),
        };

        let superobj = match object.superobj() {
            Some(superobj) => superobj.clone(),
            None => runtime.nothing()?,
        };

        let frame = StackFrame::nested(object.clone(), format!("{}.{}", self.name, field.name), runtime.builtins(), self.module.as_ref());
        frame.define("self", Holder::constant(object.selfobj()))?;
        frame.define("super", Holder::constant(superobj))?;

        runtime.with_frame(frame, |runtime| eval::evaluate(runtime, initializer))
    }
}

/// Create a new object from a class.
///
/// The superclass's `()` hook builds the chain below the new object, this
/// class's definitions populate the new level, and finally every level is
/// pointed at the new object as its facade.
pub(crate) fn instantiate(runtime: &mut Runtime, class: &Value, kind: Kind) -> Result<Value, Exception> {
    let definition = match class.kind() {
        Kind::Class(definition) => definition,
        _ => return Err(Exception::InvalidType(format!("'{}' is not a class", class.describe()))),
    };

    let superobj = match definition.superclass() {
        Some(superclass) => Some(runtime.dispatch(superclass, "()", Vec::new())?),
        None => None,
    };

    let object = Value::new(superobj, kind);
    definition.apply(runtime, &object)?;
    object.wire_selfobj();
    object.set_typeobj(class.clone());

    Ok(object)
}

/// Create a class object. Classes are typed by `Class`, answer `()` and
/// `new` by instantiating themselves, and expose their `name`.
pub(crate) fn make_class(runtime: &mut Runtime, definition: ClassDefinition) -> Result<Value, Exception> {
    let types = runtime.types().clone();
    let name = definition.name().to_owned();
    let class = Value::new(Some(types.root.clone()), Kind::Class(definition));
    class.wire_level();
    class.set_typeobj(types.class.clone());

    let new = Callable::foreign("new", &[], |runtime: &mut Runtime, this: &Value, _: &[Value]| {
        instantiate(runtime, &this.selfobj(), Kind::Instance)
    });
    let new = callable::make_method(runtime, &class, new)?;
    class.hook_table().add("()", Holder::constant(new.clone()))?;
    class.property_table().add("new", Holder::constant(new))?;
    add_name_property(runtime, &class)?;

    log::trace!("created class '{}'", name);
    Ok(class)
}

/// Expose the definition name of a type-like object as a read-only property.
pub(crate) fn add_name_property(runtime: &Runtime, object: &Value) -> Result<(), Exception> {
    let getter = Callable::foreign("name", &[], |runtime: &mut Runtime, this: &Value, _: &[Value]| {
        let name = this.selfobj().definition_name().unwrap_or_default().to_owned();
        runtime.make_string(name)
    });
    let getter = callable::make_method(runtime, object, getter)?;

    object.property_table().add("name", Holder::computed(getter, None))
}

/// Build a class object from a declaration.
pub(crate) fn declare_class(runtime: &mut Runtime, decl: &ast::ClassDecl) -> Result<Value, Exception> {
    let superclass = match &decl.superclass {
        Some(expr) => eval::evaluate(runtime, expr)?,
        None => runtime.builtin("Object")?,
    };

    if !matches!(superclass.kind(), Kind::Class(_)) {
        return Err(Exception::InvalidType(format!("'{}' is not a class", superclass.describe())));
    }

    let module = runtime.peek_frame(0)?.module_table().clone();
    let method = |decl: &ast::FunctionDecl| {
        let name = decl.name.clone().unwrap_or_default();
        MethodDefinition::new(Callable::block(name, decl.params.clone(), decl.body.clone(), Some(module.clone())))
    };

    let mut definition = ClassDefinition::new(decl.name.clone(), Some(superclass));

    for member in &decl.members {
        match member {
            ast::ClassMember::Val { name, value } => definition.add_val(FieldDefinition::new(name.clone(), Some(value.clone()))),
            ast::ClassMember::Var { name, value } => definition.add_var(FieldDefinition::new(name.clone(), value.clone())),
            ast::ClassMember::Method(decl) => definition.add_method(method(decl)),
            ast::ClassMember::Operator(decl) => definition.add_hook(method(decl)),
            ast::ClassMember::Property(property) => definition.add_property(PropertyDefinition::new(
                property.name.clone(),
                property.getter.as_deref().map(|decl| method(decl)),
                property.setter.as_deref().map(|decl| method(decl)),
            )),
        }
    }

    let definition = definition.with_module(module);
    make_class(runtime, definition)
}

/// Whether `value` is an instance of `kind`, walking `typeobj` down the
/// superobj chain of the value's facade.
pub fn isa(value: &Value, kind: &Value) -> Result<bool, Exception> {
    if !kind.is_type() {
        return Err(Exception::InvalidType(format!("'{}' is not a type", kind.describe())));
    }

    let mut level = Some(value.selfobj());

    while let Some(object) = level {
        if object.typeobj().as_ref() == Some(kind) {
            return Ok(true);
        }

        level = object.superobj().cloned();
    }

    Ok(false)
}
