//! Mock factory.

use core::{any, fmt, marker::PhantomData};
use std::sync::Arc;

use crate::{
    fake::{FunctionBody, Record},
    ledger::{Call, MemberKind, Namespace},
    operators::{Accessors, Operator},
    verifiers::{FunctionVerifier, GetterVerifier, PropertyVerifier, SetterVerifier},
    Fake, FakeConstructor, Registry, Value,
};

/// Name of a mocked member.
///
/// Implemented for `&'static str` (used by the [`Dynamic`] shape) and for member enums
/// generated by `#[fake]` or `#[derive(Member)]`.
pub trait MemberName: Copy + fmt::Debug + Send + Sync + 'static {
    /// Returns the member name as recorded in call ledgers and shown in diagnostics.
    fn name(&self) -> &'static str;
}

impl MemberName for &'static str {
    fn name(&self) -> &'static str {
        self
    }
}

/// Description of a mocked interface: the names of its instance and static members.
///
/// Shapes are usually generated by the `#[fake]` attribute macro. Shapes are not meant
/// to be instantiated; `#[fake]` generates them as empty enums.
pub trait Shape: Sized + 'static {
    /// Names of instance members.
    type Member: MemberName;
    /// Names of static members.
    type StaticMember: MemberName;

    /// Returns the registry of the active static namespace for this shape.
    fn registry() -> &'static Registry<Self>;
}

/// Shape with members named by arbitrary strings.
///
/// # Examples
///
/// ```
/// use decoy::{Dynamic, Mock, Value, Verify};
///
/// let mock = Mock::<Dynamic>::create();
/// mock.setup_function_with("double", |_, args: &[Value]| {
///     Value::from(args[0].as_f64().unwrap_or(0.0) * 2.0)
/// });
/// let fake = mock.instance();
/// assert_eq!(fake.call("double", vec![21.into()]), Value::from(42));
///
/// mock.with_function("double").with_parameters((21,)).was_called_once()?;
/// # Ok::<_, decoy::VerificationError>(())
/// ```
#[derive(Debug)]
pub enum Dynamic {}

impl Shape for Dynamic {
    type Member = &'static str;
    type StaticMember = &'static str;

    fn registry() -> &'static Registry<Self> {
        static REGISTRY: Registry<Dynamic> = Registry::new();
        &REGISTRY
    }
}

/// Mock: a fake instance, a fake constructor and six call ledgers (functions, getters
/// and setters, each for instance and static members).
///
/// Members are added lazily by the builder methods (`setup_*`, `define_*`), which install
/// a fake implementation and create an empty ledger entry for the member. Verification
/// methods (`with_*`) inspect the ledgers.
///
/// Cloning a mock produces another handle to the same state.
pub struct Mock<S> {
    record: Arc<Record>,
    _shape: PhantomData<fn() -> S>,
}

impl<S> Clone for Mock<S> {
    fn clone(&self) -> Self {
        Self {
            record: Arc::clone(&self.record),
            _shape: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Mock<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Mock")
            .field("shape", &any::type_name::<S>())
            .field("record", &self.record)
            .finish()
    }
}

/// Creates a new [`Mock`]. Equivalent to [`Mock::create()`].
pub fn create<S: Shape>() -> Mock<S> {
    Mock::create()
}

impl<S: Shape> Mock<S> {
    /// Creates a new mock and makes it the active static namespace for `S`
    /// on the current thread.
    pub fn create() -> Self {
        let record = Record::new();
        S::registry().activate(&record);
        tracing::debug!(shape = any::type_name::<S>(), "created mock");
        Self {
            record,
            _shape: PhantomData,
        }
    }

    /// Makes this mock the active static namespace for `S` on the current thread.
    /// This is only necessary if several mocks for the same shape are alive at the same time.
    pub fn activate(&self) {
        S::registry().activate(&self.record);
    }

    /// Returns the fake instance.
    pub fn instance(&self) -> Fake<S> {
        Fake::from_record(Arc::clone(&self.record))
    }

    /// Returns the fake constructor.
    pub fn constructor(&self) -> FakeConstructor<S> {
        FakeConstructor::from_record(Arc::clone(&self.record))
    }

    /// Applies `operators` in order.
    pub fn setup(&self, operators: impl IntoIterator<Item = Operator<S>>) -> &Self {
        for operator in operators {
            operator.apply(self);
        }
        self
    }

    fn install_function(
        &self,
        namespace: Namespace,
        name: &'static str,
        body: Option<FunctionBody>,
    ) -> FunctionVerifier {
        Record::install_function(&self.record, namespace, name, body);
        FunctionVerifier::new(Arc::clone(&self.record), namespace.function_kind(), name)
    }

    /// Sets up an instance function that returns [`Value::Undefined`].
    ///
    /// Repeated setup keeps the recorded calls for the function.
    pub fn setup_function(&self, name: S::Member) -> FunctionVerifier {
        self.install_function(Namespace::Instance, name.name(), None)
    }

    /// Sets up an instance function with the specified implementation. The implementation
    /// receives the fake instance and call args.
    ///
    /// Repeated setup replaces the implementation, but keeps the recorded calls.
    pub fn setup_function_with<F>(&self, name: S::Member, implementation: F) -> FunctionVerifier
    where
        F: Fn(&Fake<S>, &[Value]) -> Value + Send + Sync + 'static,
    {
        let body: FunctionBody = Arc::new(move |record: &Arc<Record>, args: &[Value]| {
            implementation(&Fake::from_record(Arc::clone(record)), args)
        });
        self.install_function(Namespace::Instance, name.name(), Some(body))
    }

    /// Sets up a static function that returns [`Value::Undefined`].
    pub fn setup_static_function(&self, name: S::StaticMember) -> FunctionVerifier {
        self.install_function(Namespace::Static, name.name(), None)
    }

    /// Sets up a static function with the specified implementation. The implementation
    /// receives the fake constructor and call args.
    pub fn setup_static_function_with<F>(
        &self,
        name: S::StaticMember,
        implementation: F,
    ) -> FunctionVerifier
    where
        F: Fn(&FakeConstructor<S>, &[Value]) -> Value + Send + Sync + 'static,
    {
        let body: FunctionBody = Arc::new(move |record: &Arc<Record>, args: &[Value]| {
            implementation(&FakeConstructor::from_record(Arc::clone(record)), args)
        });
        self.install_function(Namespace::Static, name.name(), Some(body))
    }

    fn install_accessors(
        &self,
        namespace: Namespace,
        name: &'static str,
        accessors: Accessors,
    ) -> PropertyVerifier {
        self.record.install_accessors(namespace, name, accessors);
        let (getter, setter) = namespace.accessor_kinds();
        PropertyVerifier::new(
            GetterVerifier::new(Arc::clone(&self.record), getter, name),
            SetterVerifier::new(Arc::clone(&self.record), setter, name),
        )
    }

    /// Sets up an instance property returning a fixed value. Assignments to the property
    /// are recorded, but do not change the returned value.
    ///
    /// Setting up a property clears the recorded getter and setter calls for it.
    pub fn setup_property(&self, name: S::Member, value: impl Into<Value>) -> PropertyVerifier {
        let value = value.into();
        let accessors = Accessors::new().get(move || value.clone());
        self.install_accessors(Namespace::Instance, name.name(), accessors)
    }

    /// Sets up a static property returning a fixed value.
    pub fn setup_static_property(
        &self,
        name: S::StaticMember,
        value: impl Into<Value>,
    ) -> PropertyVerifier {
        let value = value.into();
        let accessors = Accessors::new().get(move || value.clone());
        self.install_accessors(Namespace::Static, name.name(), accessors)
    }

    /// Defines instance property accessors. Getter and setter calls are recorded
    /// even if the corresponding accessor is not specified. Previously recorded accessor
    /// calls for the property are cleared.
    ///
    /// # Examples
    ///
    /// ```
    /// # use decoy::{operators::Accessors, Dynamic, Mock, Value, Verify};
    /// # use std::sync::{Arc, Mutex};
    /// let mock = Mock::<Dynamic>::create();
    /// let storage = Arc::new(Mutex::new(Value::Null));
    /// let accessors = Accessors::new()
    ///     .get({
    ///         let storage = Arc::clone(&storage);
    ///         move || storage.lock().unwrap().clone()
    ///     })
    ///     .set(move |value| *storage.lock().unwrap() = value);
    /// let property = mock.define_property("name", accessors);
    ///
    /// let fake = mock.instance();
    /// fake.set("name", "Alice");
    /// assert_eq!(fake.get("name"), Value::from("Alice"));
    /// property.setter().with_parameters("Alice").was_called_once()?;
    /// property.getter().was_called_once()?;
    /// # Ok::<_, decoy::VerificationError>(())
    /// ```
    pub fn define_property(&self, name: S::Member, accessors: Accessors) -> PropertyVerifier {
        self.install_accessors(Namespace::Instance, name.name(), accessors)
    }

    /// Defines static property accessors.
    pub fn define_static_property(
        &self,
        name: S::StaticMember,
        accessors: Accessors,
    ) -> PropertyVerifier {
        self.install_accessors(Namespace::Static, name.name(), accessors)
    }

    /// Returns a verifier for an instance function.
    pub fn with_function(&self, name: S::Member) -> FunctionVerifier {
        FunctionVerifier::new(Arc::clone(&self.record), MemberKind::Function, name.name())
    }

    /// Returns a verifier for a static function.
    pub fn with_static_function(&self, name: S::StaticMember) -> FunctionVerifier {
        let kind = MemberKind::StaticFunction;
        FunctionVerifier::new(Arc::clone(&self.record), kind, name.name())
    }

    /// Returns a verifier for an instance property getter.
    pub fn with_getter(&self, name: S::Member) -> GetterVerifier {
        GetterVerifier::new(Arc::clone(&self.record), MemberKind::Getter, name.name())
    }

    /// Returns a verifier for a static property getter.
    pub fn with_static_getter(&self, name: S::StaticMember) -> GetterVerifier {
        let kind = MemberKind::StaticGetter;
        GetterVerifier::new(Arc::clone(&self.record), kind, name.name())
    }

    /// Returns a verifier for an instance property setter.
    pub fn with_setter(&self, name: S::Member) -> SetterVerifier {
        SetterVerifier::new(Arc::clone(&self.record), MemberKind::Setter, name.name())
    }

    /// Returns a verifier for a static property setter.
    pub fn with_static_setter(&self, name: S::StaticMember) -> SetterVerifier {
        let kind = MemberKind::StaticSetter;
        SetterVerifier::new(Arc::clone(&self.record), kind, name.name())
    }

    pub(crate) fn calls(&self, kind: MemberKind, name: &str) -> Option<Vec<Call>> {
        self.record.ledgers.calls(kind, name)
    }

    /// Returns recorded calls of an instance function, or `None` if the function
    /// was not set up.
    pub fn function_calls(&self, name: S::Member) -> Option<Vec<Call>> {
        self.calls(MemberKind::Function, name.name())
    }

    /// Returns recorded calls of a static function.
    pub fn static_function_calls(&self, name: S::StaticMember) -> Option<Vec<Call>> {
        self.calls(MemberKind::StaticFunction, name.name())
    }

    /// Returns recorded calls of an instance property getter.
    pub fn getter_calls(&self, name: S::Member) -> Option<Vec<Call>> {
        self.calls(MemberKind::Getter, name.name())
    }

    /// Returns recorded calls of a static property getter.
    pub fn static_getter_calls(&self, name: S::StaticMember) -> Option<Vec<Call>> {
        self.calls(MemberKind::StaticGetter, name.name())
    }

    /// Returns recorded calls of an instance property setter.
    pub fn setter_calls(&self, name: S::Member) -> Option<Vec<Call>> {
        self.calls(MemberKind::Setter, name.name())
    }

    /// Returns recorded calls of a static property setter.
    pub fn static_setter_calls(&self, name: S::StaticMember) -> Option<Vec<Call>> {
        self.calls(MemberKind::StaticSetter, name.name())
    }
}
