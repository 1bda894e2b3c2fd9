use crate::prelude::*;
use std::fmt;
use std::rc::Rc;

/// A native function that can be invoked by scripts through a runtime as well
/// as in native code.
///
/// Foreign functions receive the object they were invoked on and the
/// arguments, which have already been checked against the declared arity.
#[derive(Clone)]
pub struct ForeignFn(Rc<dyn Fn(&mut Runtime, &Value, &[Value]) -> Result<Value, Exception>>);

impl ForeignFn {
    pub fn new(f: impl Fn(&mut Runtime, &Value, &[Value]) -> Result<Value, Exception> + 'static) -> Self {
        Self(Rc::new(f))
    }

    pub fn call(&self, runtime: &mut Runtime, this: &Value, args: &[Value]) -> Result<Value, Exception> {
        (self.0)(runtime, this, args)
    }
}

impl<F> From<F> for ForeignFn
where
    F: Fn(&mut Runtime, &Value, &[Value]) -> Result<Value, Exception> + 'static,
{
    fn from(f: F) -> Self {
        ForeignFn::new(f)
    }
}

impl fmt::Debug for ForeignFn {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "<foreign fn@{:p}>", Rc::as_ptr(&self.0))
    }
}
