//! Member operators: composable setup steps applied with [`Mock::setup()`].
//!
//! Each operator corresponds to one of the `Mock` builder methods, e.g., [`setup_function()`]
//! to [`Mock::setup_function()`]. Operators are useful to describe several members
//! at once, or to share setup between tests.
//!
//! # Examples
//!
//! ```
//! use decoy::{operators::*, Dynamic, Mock, Value, Verify};
//!
//! let mock = Mock::<Dynamic>::create();
//! mock.setup([
//!     setup_function_with("greet", |_, args: &[Value]| {
//!         let name = args[0].as_str().unwrap_or("stranger");
//!         Value::from(format!("Hello, {name}!"))
//!     }),
//!     setup_property("language", "en"),
//!     setup_static_function("reset"),
//! ]);
//!
//! let fake = mock.instance();
//! assert_eq!(fake.call("greet", vec!["Alice".into()]), Value::from("Hello, Alice!"));
//! assert_eq!(fake.get("language"), Value::from("en"));
//! mock.with_getter("language").was_called_once()?;
//! mock.with_static_function("reset").was_not_called()?;
//! # Ok::<_, decoy::VerificationError>(())
//! ```

use core::fmt;
use std::sync::Arc;

use crate::{Fake, FakeConstructor, Mock, Shape, Value};

type GetFn = dyn Fn() -> Value + Send + Sync;
type SetFn = dyn Fn(Value) + Send + Sync;

/// User-supplied accessor pair for [`Mock::define_property()`]. Both accessors are optional;
/// calls are recorded regardless.
#[derive(Clone, Default)]
pub struct Accessors {
    get: Option<Arc<GetFn>>,
    set: Option<Arc<SetFn>>,
}

impl fmt::Debug for Accessors {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Accessors")
            .field("get", &self.get.is_some())
            .field("set", &self.set.is_some())
            .finish()
    }
}

impl Accessors {
    /// Creates accessors with neither a getter nor a setter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the getter.
    #[must_use]
    pub fn get<F>(mut self, getter: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.get = Some(Arc::new(getter));
        self
    }

    /// Sets the setter.
    #[must_use]
    pub fn set<F>(mut self, setter: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.set = Some(Arc::new(setter));
        self
    }

    pub(crate) fn run_get(&self) -> Value {
        self.get.as_ref().map_or(Value::Undefined, |get| get())
    }

    pub(crate) fn run_set(&self, value: Value) {
        if let Some(set) = &self.set {
            set(value);
        }
    }
}

/// Setup step applicable to a [`Mock`].
pub struct Operator<S> {
    apply: Box<dyn FnOnce(&Mock<S>)>,
}

impl<S> fmt::Debug for Operator<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Operator").finish_non_exhaustive()
    }
}

impl<S: Shape> Operator<S> {
    /// Creates an operator from a closure.
    pub fn new(apply: impl FnOnce(&Mock<S>) + 'static) -> Self {
        Self {
            apply: Box::new(apply),
        }
    }

    /// Applies this operator to the `mock`.
    pub fn apply(self, mock: &Mock<S>) {
        (self.apply)(mock);
    }
}

/// Sets up an instance function without implementation. See [`Mock::setup_function()`].
pub fn setup_function<S: Shape>(name: S::Member) -> Operator<S> {
    Operator::new(move |mock| {
        mock.setup_function(name);
    })
}

/// Sets up an instance function. See [`Mock::setup_function_with()`].
pub fn setup_function_with<S, F>(name: S::Member, implementation: F) -> Operator<S>
where
    S: Shape,
    F: Fn(&Fake<S>, &[Value]) -> Value + Send + Sync + 'static,
{
    Operator::new(move |mock| {
        mock.setup_function_with(name, implementation);
    })
}

/// Sets up a static function without implementation. See [`Mock::setup_static_function()`].
pub fn setup_static_function<S: Shape>(name: S::StaticMember) -> Operator<S> {
    Operator::new(move |mock| {
        mock.setup_static_function(name);
    })
}

/// Sets up a static function. See [`Mock::setup_static_function_with()`].
pub fn setup_static_function_with<S, F>(name: S::StaticMember, implementation: F) -> Operator<S>
where
    S: Shape,
    F: Fn(&FakeConstructor<S>, &[Value]) -> Value + Send + Sync + 'static,
{
    Operator::new(move |mock| {
        mock.setup_static_function_with(name, implementation);
    })
}

/// Sets up an instance property. See [`Mock::setup_property()`].
pub fn setup_property<S: Shape>(name: S::Member, value: impl Into<Value>) -> Operator<S> {
    let value = value.into();
    Operator::new(move |mock| {
        mock.setup_property(name, value);
    })
}

/// Sets up a static property. See [`Mock::setup_static_property()`].
pub fn setup_static_property<S: Shape>(
    name: S::StaticMember,
    value: impl Into<Value>,
) -> Operator<S> {
    let value = value.into();
    Operator::new(move |mock| {
        mock.setup_static_property(name, value);
    })
}

/// Defines instance property accessors. See [`Mock::define_property()`].
pub fn define_property<S: Shape>(name: S::Member, accessors: Accessors) -> Operator<S> {
    Operator::new(move |mock| {
        mock.define_property(name, accessors);
    })
}

/// Defines static property accessors. See [`Mock::define_static_property()`].
pub fn define_static_property<S: Shape>(
    name: S::StaticMember,
    accessors: Accessors,
) -> Operator<S> {
    Operator::new(move |mock| {
        mock.define_static_property(name, accessors);
    })
}
