//! User functions over tuple columns.
//!
//! Closures of arity 1 to 4 taking their arguments by reference are accepted
//! through [`TupleFn`] and erased into a [`Function`], which remembers the
//! argument types (checked against the stream when the network is built) and
//! carries a descriptor identity used for node sharing.

use std::fmt;
use std::sync::Arc;

use crate::fact::{downcast_checked, Fact, FactType, FactValue};

/// A function of the columns of a tuple, with its types erased.
pub struct Function<Out> {
    call: Arc<dyn Fn(&[Fact]) -> Out + Send + Sync>,
    arg_types: Arc<[FactType]>,
    id: usize,
}

impl<Out> Clone for Function<Out> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
            arg_types: Arc::clone(&self.arg_types),
            id: self.id,
        }
    }
}

impl<Out: 'static> Function<Out> {
    pub(crate) fn new(
        arg_types: Vec<FactType>,
        call: impl Fn(&[Fact]) -> Out + Send + Sync + 'static,
    ) -> Self {
        let call: Arc<dyn Fn(&[Fact]) -> Out + Send + Sync> = Arc::new(call);
        let id = Arc::as_ptr(&call) as *const () as usize;
        Self {
            call,
            arg_types: arg_types.into(),
            id,
        }
    }

    /// Post-processes the output. The result keeps the descriptor identity of
    /// `self`, which stays alive inside it.
    pub(crate) fn map<O2: 'static>(
        self,
        post: impl Fn(Out) -> O2 + Send + Sync + 'static,
    ) -> Function<O2> {
        let id = self.id;
        let arg_types = Arc::clone(&self.arg_types);
        let inner = self.call;
        Function {
            call: Arc::new(move |facts: &[Fact]| post(inner(facts))),
            arg_types,
            id,
        }
    }

    #[inline]
    pub fn call(&self, facts: &[Fact]) -> Out {
        (self.call)(facts)
    }

    pub fn arity(&self) -> usize {
        self.arg_types.len()
    }

    pub fn arg_types(&self) -> &[FactType] {
        &self.arg_types
    }

    /// Build-time identity: two functions share it only when one was cloned
    /// from the other.
    pub(crate) fn id(&self) -> usize {
        self.id
    }
}

impl<Out> fmt::Debug for Function<Out> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Function{:?}#{:x}", self.arg_types, self.id)
    }
}

/// Marker argument list of an already erased [`Function`].
pub struct Erased;

/// Anything that can become a [`Function`] over tuple columns.
///
/// Implemented for `Fn(&A) -> Out` up to `Fn(&A, &B, &C, &D) -> Out`, and for
/// `Function<Out>` itself so that a function can be reused, keeping its
/// identity, in several streams.
pub trait TupleFn<Args, Out>: Send + Sync + 'static {
    fn into_function(self) -> Function<Out>;
}

impl<Out: 'static> TupleFn<Erased, Out> for Function<Out> {
    fn into_function(self) -> Function<Out> {
        self
    }
}

macro_rules! impl_tuple_fn {
    ($($arg:ident $idx:tt),+) => {
        impl<F, Out, $($arg),+> TupleFn<($($arg,)+), Out> for F
        where
            F: Fn($(&$arg),+) -> Out + Send + Sync + 'static,
            Out: 'static,
            $($arg: FactValue,)+
        {
            fn into_function(self) -> Function<Out> {
                Function::new(
                    vec![$(FactType::of::<$arg>()),+],
                    move |facts: &[Fact]| self($(downcast_checked::<$arg>(&facts[$idx])),+),
                )
            }
        }
    };
}

impl_tuple_fn!(A 0);
impl_tuple_fn!(A 0, B 1);
impl_tuple_fn!(A 0, B 1, C 2);
impl_tuple_fn!(A 0, B 1, C 2, D 3);

/// Erases a closure into a [`Function`], e.g. to reuse one predicate in
/// several constraints.
pub fn function<Args, Out: 'static>(f: impl TupleFn<Args, Out>) -> Function<Out> {
    f.into_function()
}
