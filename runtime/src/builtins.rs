//! Bootstrap of the foundational types and the builtin bindings that are
//! always available.
//!
//! The order matters: `Type` must exist before anything can be typed, `Method`
//! before anything can be bound, and `Object` before any class can be
//! instantiated.
use crate::callable::{self, Callable};
use crate::class::{self, ClassDefinition, MethodDefinition, PropertyDefinition};
use crate::holder::Holder;
use crate::prelude::*;
use crate::value::Kind;

/// Type objects that exist before the runtime itself.
#[derive(Clone)]
pub struct Types {
    /// The bottom of every type, class and module chain. Carries the `Object`
    /// members once bootstrap has run.
    pub root: Value,

    /// `Type`, which is its own type.
    pub type_type: Value,

    pub method: Value,
    pub class: Value,
    pub module: Value,
}

/// Create the root sentinel and the types every other object depends on.
pub(crate) fn types() -> Types {
    let root = Value::new(None, Kind::Instance);

    let type_type = Value::new(Some(root.clone()), Kind::Type(String::from("Type")));
    type_type.wire_level();
    type_type.set_typeobj(type_type.clone());

    let make_type = |name: &str| {
        let typeobj = Value::new(Some(root.clone()), Kind::Type(name.to_owned()));
        typeobj.wire_level();
        typeobj.set_typeobj(type_type.clone());
        typeobj
    };

    let method = make_type("Method");
    let class = make_type("Class");
    let module = make_type("Module");

    Types {
        root,
        type_type,
        method,
        class,
        module,
    }
}

/// Populate the builtin table of a fresh runtime.
pub(crate) fn init(runtime: &mut Runtime) -> Result<(), Exception> {
    let types = runtime.types().clone();
    let builtins = runtime.builtins().clone();

    for typeobj in [&types.type_type, &types.method, &types.class, &types.module] {
        class::add_name_property(runtime, typeobj)?;
    }

    let object = class::make_class(runtime, object_class())?;
    if let Kind::Class(definition) = object.kind() {
        definition.apply(runtime, &types.root)?;
    }
    types.root.set_typeobj(object.clone());

    builtins.add("Object", Holder::constant(object.clone()))?;
    builtins.add("Type", Holder::constant(types.type_type.clone()))?;
    builtins.add("Class", Holder::constant(types.class.clone()))?;
    builtins.add("Method", Holder::constant(types.method.clone()))?;
    builtins.add("Module", Holder::constant(types.module.clone()))?;

    let classes = vec![
        plain_class("Function", &object),
        plain_class("Closure", &object),
        string_class(&object),
        number_class("Integer", &object),
        number_class("Float", &object),
        plain_class("Boolean", &object),
        plain_class("Nothing", &object),
    ];

    for definition in classes {
        let name = definition.name().to_owned();
        let typeobj = class::make_class(runtime, definition)?;
        builtins.add(name, Holder::constant(typeobj))?;
    }

    for (name, class_name, kind) in [
        ("nothing", "Nothing", Kind::Nothing),
        ("true", "Boolean", Kind::Boolean(true)),
        ("false", "Boolean", Kind::Boolean(false)),
    ] {
        let typeobj = runtime.builtin(class_name)?;
        let value = class::instantiate(runtime, &typeobj, kind)?;
        builtins.add(name, Holder::constant(value))?;
    }

    let print = callable::make_function(runtime, Callable::foreign("print", &["value"], print))?;
    builtins.add("print", Holder::constant(print))?;

    log::debug!("registered {} builtins", builtins.len());

    Ok(())
}

/// Hooks every object answers. All but `.` and `isa` refuse the operation
/// until a subclass overrides them.
const UNSUPPORTED: &[&str] = &["()", "[]", "+", "-", "*", "/", "+=", "-=", "*=", "/="];

fn object_class() -> ClassDefinition {
    let mut definition = ClassDefinition::new("Object", None);

    definition.add_hook(MethodDefinition::new(Callable::foreign(".", &["name"], member)));
    definition.add_hook(MethodDefinition::new(Callable::foreign("isa", &["kind"], isa)));

    for &op in UNSUPPORTED {
        definition.add_hook(MethodDefinition::new(Callable::variadic(op, unsupported(op))));
    }

    definition.add_method(MethodDefinition::new(Callable::foreign("isa", &["kind"], isa)));
    definition.add_property(PropertyDefinition::computed(Callable::foreign("string", &[], string)));
    definition.add_property(PropertyDefinition::computed(Callable::foreign("type", &[], type_of)));
    definition.add_property(PropertyDefinition::computed(Callable::foreign("id", &[], id)));

    definition
}

/// A class deriving from `Object` that only adds its own `string` property.
fn plain_class(name: &str, object: &Value) -> ClassDefinition {
    let mut definition = ClassDefinition::new(name, Some(object.clone()));
    definition.add_property(PropertyDefinition::computed(Callable::foreign("string", &[], string)));
    definition
}

fn string_class(object: &Value) -> ClassDefinition {
    let mut definition = plain_class("String", object);

    definition.add_hook(MethodDefinition::new(Callable::foreign("+", &["other"], concat)));
    definition.add_hook(MethodDefinition::new(Callable::foreign("+=", &["other"], concat)));
    definition.add_hook(MethodDefinition::new(Callable::foreign("*", &["count"], repeat)));

    definition
}

fn number_class(name: &str, object: &Value) -> ClassDefinition {
    let mut definition = plain_class(name, object);

    for (hook, op) in [
        ("+", Operator::Add),
        ("-", Operator::Sub),
        ("*", Operator::Mul),
        ("/", Operator::Div),
        ("+=", Operator::Add),
        ("-=", Operator::Sub),
        ("*=", Operator::Mul),
        ("/=", Operator::Div),
    ] {
        definition.add_hook(MethodDefinition::new(Callable::foreign(hook, &["other"], arithmetic(op))));
    }

    definition
}

/// Resolves a member name against the object the hook was dispatched on, as
/// seen from the calling frame.
fn member(runtime: &mut Runtime, this: &Value, args: &[Value]) -> Result<Value, Exception> {
    let name = args[0]
        .as_string()
        .ok_or_else(|| Exception::InvalidType(format!("Member name must be a String, found '{}'", args[0].type_name())))?;

    let caller = runtime.peek_frame(1)?.owner().clone();
    let holder = Runtime::member_scope(&caller, this)
        .lookup(&name)
        .ok_or_else(|| Exception::SymbolUnknown(name.clone()))?;

    holder.get(runtime, Some(this))
}

fn isa(runtime: &mut Runtime, this: &Value, args: &[Value]) -> Result<Value, Exception> {
    let result = class::isa(this, &args[0])?;
    runtime.make_boolean(result)
}

fn unsupported(op: &'static str) -> impl Fn(&mut Runtime, &Value, &[Value]) -> Result<Value, Exception> {
    move |_: &mut Runtime, this: &Value, _: &[Value]| -> Result<Value, Exception> {
        Err(Exception::OperationNotSupported {
            type_name: this.type_name(),
            operation: op.to_owned(),
        })
    }
}

fn string(runtime: &mut Runtime, this: &Value, _: &[Value]) -> Result<Value, Exception> {
    runtime.make_string(this.describe())
}

fn type_of(runtime: &mut Runtime, this: &Value, _: &[Value]) -> Result<Value, Exception> {
    match this.selfobj().typeobj() {
        Some(typeobj) => Ok(typeobj),
        None => runtime.nothing(),
    }
}

fn id(runtime: &mut Runtime, this: &Value, _: &[Value]) -> Result<Value, Exception> {
    runtime.make_integer(this.selfobj().id() as i64)
}

fn expect_string(value: &Value) -> Result<String, Exception> {
    value
        .as_string()
        .ok_or_else(|| Exception::InvalidType(format!("Expected a String, found '{}'", value.type_name())))
}

fn concat(runtime: &mut Runtime, this: &Value, args: &[Value]) -> Result<Value, Exception> {
    let mut text = expect_string(this)?;
    text.push_str(&runtime.to_text(&args[0])?);

    runtime.make_string(text)
}

fn repeat(runtime: &mut Runtime, this: &Value, args: &[Value]) -> Result<Value, Exception> {
    let text = expect_string(this)?;
    let count = args[0]
        .as_integer()
        .ok_or_else(|| Exception::InvalidType(format!("Expected an Integer, found '{}'", args[0].type_name())))?;
    let count = usize::try_from(count).map_err(|_| Exception::InvalidType(format!("Cannot repeat a String {} times", count)))?;
    if text.len().checked_mul(count).map_or(true, |len| len > isize::MAX as usize) {
        return Err(Exception::Arithmetic(format!("Repeating a String {} times is too large", count)));
    }

    runtime.make_string(text.repeat(count))
}

/// Writes the text form of a value and a newline to the runtime's output.
fn print(runtime: &mut Runtime, _: &Value, args: &[Value]) -> Result<Value, Exception> {
    let text = runtime.to_text(&args[0])?;
    runtime.write_line(&text)?;

    runtime.nothing()
}

#[derive(Clone, Copy, Debug)]
enum Number {
    Integer(i64),
    Float(f64),
}

impl Number {
    fn of(value: &Value) -> Result<Self, Exception> {
        match value.selfobj().kind() {
            Kind::Integer(value) => Ok(Number::Integer(*value)),
            Kind::Float(value) => Ok(Number::Float(*value)),
            _ => Err(Exception::InvalidType(format!("Expected a number, found '{}'", value.type_name()))),
        }
    }

    fn to_float(self) -> f64 {
        match self {
            Number::Integer(value) => value as f64,
            Number::Float(value) => value,
        }
    }
}

#[derive(Clone, Copy, Debug)]
enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    fn symbol(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
        }
    }

    fn integers(self, lhs: i64, rhs: i64) -> Result<i64, Exception> {
        let result = match self {
            Operator::Add => lhs.checked_add(rhs),
            Operator::Sub => lhs.checked_sub(rhs),
            Operator::Mul => lhs.checked_mul(rhs),
            Operator::Div if rhs == 0 => return Err(Exception::Arithmetic(String::from("Division by zero"))),
            Operator::Div => lhs.checked_div(rhs),
        };

        result.ok_or_else(|| Exception::Arithmetic(format!("Integer overflow in {} {} {}", lhs, self.symbol(), rhs)))
    }

    fn floats(self, lhs: f64, rhs: f64) -> Result<f64, Exception> {
        match self {
            Operator::Add => Ok(lhs + rhs),
            Operator::Sub => Ok(lhs - rhs),
            Operator::Mul => Ok(lhs * rhs),
            Operator::Div if rhs == 0.0 => Err(Exception::Arithmetic(String::from("Division by zero"))),
            Operator::Div => Ok(lhs / rhs),
        }
    }
}

/// A numeric operator hook. Two integers stay integral; any float operand
/// promotes the result to a float.
fn arithmetic(op: Operator) -> impl Fn(&mut Runtime, &Value, &[Value]) -> Result<Value, Exception> {
    move |runtime: &mut Runtime, this: &Value, args: &[Value]| -> Result<Value, Exception> {
        match (Number::of(this)?, Number::of(&args[0])?) {
            (Number::Integer(lhs), Number::Integer(rhs)) => {
                let result = op.integers(lhs, rhs)?;
                runtime.make_integer(result)
            }
            (lhs, rhs) => {
                let result = op.floats(lhs.to_float(), rhs.to_float())?;
                runtime.make_float(result)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_is_its_own_type() {
        let types = types();

        assert_eq!(types.type_type.typeobj(), Some(types.type_type.clone()));
        assert_eq!(types.class.typeobj(), Some(types.type_type.clone()));
        assert_eq!(types.method.superobj(), Some(&types.root));
        assert_eq!(types.root.selfobj(), types.root);
    }

    #[test]
    fn builtin_classes_derive_from_object() {
        let mut runtime = Runtime::new().unwrap();
        let object = runtime.builtin("Object").unwrap();

        for name in ["Function", "Closure", "String", "Integer", "Float", "Boolean", "Nothing"] {
            let class = runtime.builtin(name).unwrap();
            match class.kind() {
                Kind::Class(definition) => assert_eq!(definition.superclass(), Some(&object)),
                _ => panic!("'{}' is not a class", name),
            }
        }

        let root = runtime.types().root.clone();
        assert_eq!(root.typeobj(), Some(object));
    }

    #[test]
    fn integer_arithmetic() {
        let mut runtime = Runtime::new().unwrap();
        let seven = runtime.make_integer(7).unwrap();
        let two = runtime.make_integer(2).unwrap();

        let quotient = runtime.dispatch(&seven, "/", vec![two.clone()]).unwrap();
        assert_eq!(quotient.as_integer(), Some(3));

        let half = runtime.make_float(0.5).unwrap();
        let sum = runtime.dispatch(&seven, "+", vec![half]).unwrap();
        assert_eq!(sum.as_float(), Some(7.5));

        let zero = runtime.make_integer(0).unwrap();
        assert!(matches!(runtime.dispatch(&seven, "/", vec![zero]), Err(Exception::Arithmetic(_))));

        let max = runtime.make_integer(i64::MAX).unwrap();
        assert!(matches!(runtime.dispatch(&max, "*", vec![two]), Err(Exception::Arithmetic(_))));
    }

    #[test]
    fn string_operators() {
        let mut runtime = Runtime::new().unwrap();
        let text = runtime.make_string("ab").unwrap();
        let three = runtime.make_integer(3).unwrap();

        let joined = runtime.dispatch(&text, "+", vec![three.clone()]).unwrap();
        assert_eq!(joined.as_string().as_deref(), Some("ab3"));

        let repeated = runtime.dispatch(&text, "*", vec![three]).unwrap();
        assert_eq!(repeated.as_string().as_deref(), Some("ababab"));

        let other = runtime.make_string("x").unwrap();
        assert!(matches!(runtime.dispatch(&text, "-", vec![other]), Err(Exception::OperationNotSupported { .. })));
    }

    #[test]
    fn oversized_repeats_are_refused() {
        let mut runtime = Runtime::new().unwrap();
        let text = runtime.make_string("ab").unwrap();
        let huge = runtime.make_integer(i64::MAX).unwrap();

        assert!(matches!(runtime.dispatch(&text, "*", vec![huge]), Err(Exception::Arithmetic(_))));

        let negative = runtime.make_integer(-1).unwrap();
        assert!(matches!(runtime.dispatch(&text, "*", vec![negative]), Err(Exception::InvalidType(_))));
    }

    #[test]
    fn numbers_reject_other_operands() {
        let mut runtime = Runtime::new().unwrap();
        let one = runtime.make_integer(1).unwrap();
        let text = runtime.make_string("1").unwrap();

        assert!(matches!(runtime.dispatch(&one, "+", vec![text]), Err(Exception::InvalidType(_))));
    }
}
