//! The object model.
//!
//! Every runtime value is an object: plain instances, types, classes,
//! callables, modules and primitives all share [`ObjectDefinition`]. Objects
//! form chains through `superobj`; every level of a chain shares one
//! `selfobj`, the most-derived facade.
use crate::callable::{Closure, Function, Method};
use crate::class::ClassDefinition;
use crate::modules::Module;
use crate::table::*;
use gc::{Finalize, Gc, GcCell, Trace};
use std::fmt;

/// What an object is, beyond its tables. Primitive payloads live on the
/// most-derived level of a chain.
#[derive(Trace, Finalize)]
pub enum Kind {
    Instance,

    /// A named type that is not a class, such as `Type` or `Method`.
    Type(String),

    Class(ClassDefinition),
    Method(Method),
    Function(Function),
    Closure(Closure),
    Module(Module),

    /// A named view onto a module's exports.
    ModuleAlias(Value),

    Integer(i64),
    Float(f64),
    String(String),
    Boolean(bool),
    Nothing,
}

#[derive(Trace, Finalize)]
pub struct ObjectDefinition {
    superobj: Option<Value>,
    selfobj: GcCell<Option<Value>>,
    typeobj: GcCell<Option<Value>>,

    /// Instance storage. Never inherited.
    field_table: SymbolTable,

    /// Operator bindings, parent-linked to the superobj's hooks.
    hook_table: SymbolTable,

    /// Properties and methods, parent-linked to the superobj's properties.
    property_table: SymbolTable,

    kind: Kind,
}

/// A reference to an object. Equality is identity.
#[derive(Clone, Trace, Finalize)]
pub struct Value(Gc<ObjectDefinition>);

impl Value {
    /// Allocate an object on top of an optional superobj chain.
    pub fn new(superobj: Option<Value>, kind: Kind) -> Self {
        let hook_table = SymbolTable::with_parent(superobj.as_ref().map(|s| s.hook_table().clone()), Validator::Hook);
        let property_table = SymbolTable::with_parent(superobj.as_ref().map(|s| s.property_table().clone()), Validator::Symbol);

        Value(Gc::new(ObjectDefinition {
            superobj,
            selfobj: GcCell::new(None),
            typeobj: GcCell::new(None),
            field_table: SymbolTable::new(),
            hook_table,
            property_table,
            kind,
        }))
    }

    pub fn kind(&self) -> &Kind {
        &self.0.kind
    }

    pub fn superobj(&self) -> Option<&Value> {
        self.0.superobj.as_ref()
    }

    /// The most-derived object of this chain. An object that has not been
    /// wired yet is its own facade.
    pub fn selfobj(&self) -> Value {
        self.0.selfobj.borrow().clone().unwrap_or_else(|| self.clone())
    }

    pub fn typeobj(&self) -> Option<Value> {
        self.0.typeobj.borrow().clone()
    }

    pub(crate) fn set_typeobj(&self, typeobj: Value) {
        *self.0.typeobj.borrow_mut() = Some(typeobj);
    }

    /// Point every level of this chain at this object as its facade.
    pub(crate) fn wire_selfobj(&self) {
        let mut level = Some(self.clone());

        while let Some(object) = level {
            *object.0.selfobj.borrow_mut() = Some(self.clone());
            level = object.superobj().cloned();
        }
    }

    /// Point only this level at itself. Types, classes, modules and methods
    /// all sit on the shared root, whose facade must stay the root.
    pub(crate) fn wire_level(&self) {
        *self.0.selfobj.borrow_mut() = Some(self.clone());
    }

    pub fn field_table(&self) -> &SymbolTable {
        &self.0.field_table
    }

    pub fn hook_table(&self) -> &SymbolTable {
        &self.0.hook_table
    }

    pub fn property_table(&self) -> &SymbolTable {
        &self.0.property_table
    }

    /// Members visible to code outside this object.
    pub fn public_table(&self) -> Scope {
        match self.kind() {
            Kind::Module(module) => module.public_table().clone().into(),
            Kind::ModuleAlias(module) => module.public_table(),
            _ => self.property_table().clone().into(),
        }
    }

    /// Members visible to code running as this object.
    pub fn private_table(&self) -> Scope {
        match self.kind() {
            Kind::Module(module) => module.private_table().clone().into(),
            Kind::ModuleAlias(module) => module.public_table(),
            _ => SymbolTableChain::new(vec![
                Scope::from(self.property_table().clone()),
                Scope::from(self.field_table().clone()),
            ]).into(),
        }
    }

    /// Unique identity of this object while it is alive.
    pub fn id(&self) -> usize {
        &*self.0 as *const ObjectDefinition as usize
    }

    /// Whether this object can appear as a `typeobj`.
    pub fn is_type(&self) -> bool {
        matches!(self.kind(), Kind::Type(_) | Kind::Class(_) | Kind::Module(_))
    }

    /// The name of a type, class or module object.
    pub fn definition_name(&self) -> Option<&str> {
        match self.kind() {
            Kind::Type(name) => Some(name.as_str()),
            Kind::Class(class) => Some(class.name()),
            Kind::Module(module) => Some(module.name()),
            _ => None,
        }
    }

    /// Name of the type describing the facade of this object.
    pub fn type_name(&self) -> String {
        self.selfobj()
            .typeobj()
            .and_then(|typeobj| typeobj.definition_name().map(str::to_owned))
            .unwrap_or_else(|| String::from("<unknown>"))
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self.selfobj().kind() {
            Kind::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self.selfobj().kind() {
            Kind::Float(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self.selfobj().kind() {
            Kind::Boolean(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_string(&self) -> Option<String> {
        match self.selfobj().kind() {
            Kind::String(value) => Some(value.clone()),
            _ => None,
        }
    }

    /// Default text form of this object.
    pub fn describe(&self) -> String {
        let facade = self.selfobj();

        match facade.kind() {
            Kind::Instance => format!("<{}>", facade.type_name()),
            Kind::Type(name) => format!("<Type '{}'>", name),
            Kind::Class(class) => format!("<Class '{}'>", class.name()),
            Kind::Method(method) => format!("<Method '{}'>", method.name()),
            Kind::Function(function) => format!("<Function '{}'>", function.name()),
            Kind::Closure(closure) => format!("<Closure '{}'>", closure.name()),
            Kind::Module(module) => format!("<Module '{}'>", module.name()),
            Kind::ModuleAlias(module) => module.describe(),
            Kind::Integer(value) => value.to_string(),
            Kind::Float(value) => format!("{:?}", value),
            Kind::String(value) => value.clone(),
            Kind::Boolean(value) => value.to_string(),
            Kind::Nothing => String::from("nothing"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Value) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Value {}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_share_a_facade() {
        let base = Value::new(None, Kind::Instance);
        let middle = Value::new(Some(base.clone()), Kind::Instance);
        let top = Value::new(Some(middle.clone()), Kind::Instance);

        assert_eq!(base.selfobj(), base);
        top.wire_selfobj();

        assert_eq!(base.selfobj(), top);
        assert_eq!(middle.selfobj(), top);
        assert_eq!(top.selfobj(), top);
        assert_ne!(base, top);
    }

    #[test]
    fn tables_inherit_through_the_chain() {
        let base = Value::new(None, Kind::Instance);
        let top = Value::new(Some(base.clone()), Kind::Integer(4));

        assert!(base.property_table().parent().is_none());
        assert!(top.property_table().parent().map_or(false, |parent| parent.ptr_eq(base.property_table())));
        assert!(top.hook_table().parent().map_or(false, |parent| parent.ptr_eq(base.hook_table())));
        assert!(top.field_table().parent().is_none());
        assert_eq!(top.as_integer(), Some(4));
        assert_eq!(top.describe(), "4");
    }
}
