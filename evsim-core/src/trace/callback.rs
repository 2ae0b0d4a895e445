use crate::trace::TraceContext;
use std::{any::Any, fmt, rc::Rc};

/// A sink for the events of trace sources with argument type `A`
///
/// Callbacks are compared by identity: a clone of a callback can be used
/// to disconnect it.
pub struct Callback<A: 'static> {
    f: Rc<dyn Fn(&TraceContext, &A)>,
}

impl<A: 'static> Callback<A> {
    pub fn new(f: impl Fn(&TraceContext, &A) + 'static) -> Self {
        Self { f: Rc::new(f) }
    }

    #[inline]
    pub fn call(&self, context: &TraceContext, args: &A) {
        (self.f)(context, args)
    }

    /// both callbacks are the same function object
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.f), Rc::as_ptr(&other.f))
    }

    /// the type-erased form, used to walk the trace resolvers
    pub fn base(&self) -> CallbackBase {
        CallbackBase {
            inner: Rc::new(self.clone()),
        }
    }
}

impl<A: 'static> Clone for Callback<A> {
    fn clone(&self) -> Self {
        Self { f: Rc::clone(&self.f) }
    }
}

impl<A: 'static> fmt::Debug for Callback<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Callback<{}>({:p})", std::any::type_name::<A>(), Rc::as_ptr(&self.f))
    }
}

/// A [`Callback`] of any argument type
///
/// A trace source only accepts the callbacks whose argument type is the
/// one it emits.
#[derive(Clone)]
pub struct CallbackBase {
    inner: Rc<dyn Any>,
}

impl CallbackBase {
    /// the callback, if it takes arguments of type `A`
    pub fn downcast<A: 'static>(&self) -> Option<Callback<A>> {
        self.inner.downcast_ref::<Callback<A>>().cloned()
    }
}

impl fmt::Debug for CallbackBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CallbackBase")
    }
}
