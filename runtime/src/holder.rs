//! Storage cells with a mutation policy.
use crate::exceptions::Exception;
use crate::runtime::Runtime;
use crate::value::Value;
use gc::{Finalize, Gc, GcCell, Trace};

/// A storage cell wrapping one value.
///
/// The variant of a holder is fixed when it is created.
#[derive(Trace, Finalize)]
pub enum ValueHolder {
    /// Freely readable and writable.
    Mutable(GcCell<Value>),

    /// Readable, never writable.
    Constant(Value),

    /// Reads invoke a getter method; writes are rejected.
    ComputedGet(Value),

    /// Reads invoke a getter method, writes invoke a setter method.
    ComputedGetSet(Value, Value),

    /// A read-only view of another holder. Reads see later updates of the
    /// wrapped holder.
    ConstantWrapper(Holder),
}

/// Shared handle to a [`ValueHolder`]. Symbol tables, captured frames and
/// module exports may all point at the same holder.
#[derive(Clone, Trace, Finalize)]
pub struct Holder(Gc<ValueHolder>);

impl Holder {
    pub fn mutable(value: Value) -> Self {
        Self(Gc::new(ValueHolder::Mutable(GcCell::new(value))))
    }

    pub fn constant(value: Value) -> Self {
        Self(Gc::new(ValueHolder::Constant(value)))
    }

    /// A computed holder backed by bound getter and optional setter methods.
    pub fn computed(getter: Value, setter: Option<Value>) -> Self {
        Self(Gc::new(match setter {
            Some(setter) => ValueHolder::ComputedGetSet(getter, setter),
            None => ValueHolder::ComputedGet(getter),
        }))
    }

    /// Wrap another holder in a read-only view.
    pub fn wrap(holder: Holder) -> Self {
        Self(Gc::new(ValueHolder::ConstantWrapper(holder)))
    }

    /// Read the held value. Computed holders invoke their getter with the
    /// given receiver.
    pub fn get(&self, runtime: &mut Runtime, receiver: Option<&Value>) -> Result<Value, Exception> {
        match &*self.0 {
            ValueHolder::Mutable(cell) => Ok(cell.borrow().clone()),
            ValueHolder::Constant(value) => Ok(value.clone()),
            ValueHolder::ComputedGet(getter) | ValueHolder::ComputedGetSet(getter, _) => {
                runtime.invoke(getter, receiver, Vec::new())
            }
            ValueHolder::ConstantWrapper(holder) => holder.get(runtime, receiver),
        }
    }

    /// Write a value through this holder.
    pub fn set(&self, runtime: &mut Runtime, receiver: Option<&Value>, value: Value) -> Result<(), Exception> {
        match &*self.0 {
            ValueHolder::Mutable(cell) => {
                *cell.borrow_mut() = value;
                Ok(())
            }
            ValueHolder::ComputedGetSet(_, setter) => runtime.invoke(setter, receiver, vec![value]).map(drop),
            _ => Err(Exception::ConstantValue),
        }
    }

    /// Copy this holder for a captured scope. Mutable holders get a fresh cell
    /// holding the current value; holders that can never be written through
    /// are shared.
    pub fn capture(&self) -> Holder {
        match &*self.0 {
            ValueHolder::Mutable(cell) => Holder::mutable(cell.borrow().clone()),
            _ => self.clone(),
        }
    }

    pub fn ptr_eq(&self, other: &Holder) -> bool {
        std::ptr::eq(&*self.0, &*other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_rejects_writes() {
        let mut runtime = Runtime::new().unwrap();
        let holder = Holder::constant(runtime.make_integer(1).unwrap());

        assert_eq!(holder.get(&mut runtime, None).unwrap().as_integer(), Some(1));

        let value = runtime.make_integer(2).unwrap();
        assert!(matches!(holder.set(&mut runtime, None, value), Err(Exception::ConstantValue)));
        assert_eq!(holder.get(&mut runtime, None).unwrap().as_integer(), Some(1));
    }

    #[test]
    fn wrapper_reads_through() {
        let mut runtime = Runtime::new().unwrap();
        let original = Holder::mutable(runtime.make_integer(1).unwrap());
        let wrapper = Holder::wrap(original.clone());

        let value = runtime.make_integer(2).unwrap();
        original.set(&mut runtime, None, value).unwrap();
        assert_eq!(wrapper.get(&mut runtime, None).unwrap().as_integer(), Some(2));

        let value = runtime.make_integer(3).unwrap();
        assert!(matches!(wrapper.set(&mut runtime, None, value), Err(Exception::ConstantValue)));
    }

    #[test]
    fn capture_detaches_mutable_holders() {
        let mut runtime = Runtime::new().unwrap();
        let original = Holder::mutable(runtime.make_integer(10).unwrap());
        let copy = original.capture();

        let value = runtime.make_integer(99).unwrap();
        original.set(&mut runtime, None, value).unwrap();

        assert!(!copy.ptr_eq(&original));
        assert_eq!(copy.get(&mut runtime, None).unwrap().as_integer(), Some(10));
    }
}
