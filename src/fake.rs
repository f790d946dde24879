//! Fake instance and fake constructor.

use parking_lot::Mutex;

use core::{fmt, marker::PhantomData};
use std::{collections::HashMap, sync::Arc};

use crate::{
    ledger::{Ledgers, MemberKind, Namespace},
    operators::Accessors,
    Func, MemberName, Shape, Value,
};

pub(crate) type FunctionBody = Arc<dyn Fn(&Arc<Record>, &[Value]) -> Value + Send + Sync>;

#[derive(Clone)]
pub(crate) enum Slot {
    Function {
        body: Option<FunctionBody>,
        handle: Func,
    },
    Accessor(Accessors),
    Data(Value),
}

#[derive(Default)]
struct Members {
    slots: Mutex<HashMap<&'static str, Slot>>,
}

impl Members {
    fn get(&self, name: &str) -> Option<Slot> {
        self.slots.lock().get(name).cloned()
    }

    fn insert(&self, name: &'static str, slot: Slot) {
        self.slots.lock().insert(name, slot);
    }

    fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.slots.lock().keys().copied().collect();
        names.sort_unstable();
        names
    }
}

/// State shared by a mock, its fake instance and its fake constructor.
#[derive(Default)]
pub(crate) struct Record {
    instance: Members,
    statics: Members,
    pub(crate) ledgers: Ledgers,
}

impl fmt::Debug for Record {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Record")
            .field("instance", &self.instance.names())
            .field("statics", &self.statics.names())
            .finish_non_exhaustive()
    }
}

impl Record {
    pub(crate) fn new() -> Arc<Self> {
        Arc::default()
    }

    fn members(&self, namespace: Namespace) -> &Members {
        match namespace {
            Namespace::Instance => &self.instance,
            Namespace::Static => &self.statics,
        }
    }

    pub(crate) fn install_function(
        this: &Arc<Self>,
        namespace: Namespace,
        name: &'static str,
        body: Option<FunctionBody>,
    ) {
        let kind = namespace.function_kind();
        this.ledgers.ensure(kind, name);

        let record = Arc::downgrade(this);
        let handle_body = body.clone();
        let handle = Func::new(move |args| match record.upgrade() {
            Some(record) => Self::run_function(&record, kind, name, handle_body.as_ref(), args),
            None => Value::Undefined,
        });
        this.members(namespace)
            .insert(name, Slot::Function { body, handle });
        tracing::debug!(%kind, member = name, "installed function");
    }

    pub(crate) fn install_accessors(
        &self,
        namespace: Namespace,
        name: &'static str,
        accessors: Accessors,
    ) {
        let (getter, setter) = namespace.accessor_kinds();
        self.ledgers.reset(getter, name);
        self.ledgers.reset(setter, name);
        self.members(namespace)
            .insert(name, Slot::Accessor(accessors));
        tracing::debug!(%getter, %setter, member = name, "installed accessors");
    }

    fn run_function(
        this: &Arc<Self>,
        kind: MemberKind,
        name: &'static str,
        body: Option<&FunctionBody>,
        args: &[Value],
    ) -> Value {
        let returned = body.map_or(Value::Undefined, |body| body(this, args));
        this.ledgers.record(kind, name, args.to_vec());
        returned
    }

    pub(crate) fn call(
        this: &Arc<Self>,
        namespace: Namespace,
        name: &'static str,
        args: &[Value],
    ) -> Value {
        let slot = this.members(namespace).get(name);
        match slot {
            Some(Slot::Function { body, .. }) => {
                Self::run_function(this, namespace.function_kind(), name, body.as_ref(), args)
            }
            Some(slot) => match this.read(namespace, name, slot) {
                Value::Function(function) => function.call(args),
                other => panic!(
                    "{} `{name}` is not a function: {other}",
                    namespace_label(namespace)
                ),
            },
            None => panic!(
                "{} `{name}` is not set up on the fake",
                namespace_label(namespace)
            ),
        }
    }

    pub(crate) fn get(&self, namespace: Namespace, name: &'static str) -> Value {
        match self.members(namespace).get(name) {
            Some(slot) => self.read(namespace, name, slot),
            None => Value::Undefined,
        }
    }

    fn read(&self, namespace: Namespace, name: &'static str, slot: Slot) -> Value {
        match slot {
            Slot::Function { handle, .. } => Value::Function(handle),
            Slot::Accessor(accessors) => {
                let (getter, _) = namespace.accessor_kinds();
                self.ledgers.record(getter, name, Vec::new());
                accessors.run_get()
            }
            Slot::Data(value) => value,
        }
    }

    pub(crate) fn set(&self, namespace: Namespace, name: &'static str, value: Value) {
        let mut slots = self.members(namespace).slots.lock();
        let accessors = match slots.get(name) {
            Some(Slot::Accessor(accessors)) => accessors.clone(),
            _ => {
                slots.insert(name, Slot::Data(value));
                return;
            }
        };
        drop(slots);

        let (_, setter) = namespace.accessor_kinds();
        self.ledgers.record(setter, name, vec![value.clone()]);
        accessors.run_set(value);
    }
}

fn namespace_label(namespace: Namespace) -> &'static str {
    match namespace {
        Namespace::Instance => "member",
        Namespace::Static => "static member",
    }
}

/// Fake instance created by a [`Mock`](crate::Mock).
///
/// Members are dispatched by name to the slots installed on the mock. For typed shapes
/// generated by `#[fake]`, the fake also implements the mocked trait.
///
/// # Panics
///
/// [`Self::call()`] panics if the member is not set up or is not callable.
pub struct Fake<S> {
    record: Arc<Record>,
    _shape: PhantomData<fn() -> S>,
}

impl<S> Clone for Fake<S> {
    fn clone(&self) -> Self {
        Self {
            record: Arc::clone(&self.record),
            _shape: PhantomData,
        }
    }
}

impl<S> fmt::Debug for Fake<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Fake")
            .field("members", &self.record.instance.names())
            .finish()
    }
}

impl<S: Shape> Fake<S> {
    pub(crate) fn from_record(record: Arc<Record>) -> Self {
        Self {
            record,
            _shape: PhantomData,
        }
    }

    /// Calls an instance function.
    pub fn call(&self, name: S::Member, args: Vec<Value>) -> Value {
        Record::call(&self.record, Namespace::Instance, name.name(), &args)
    }

    /// Reads an instance property. Returns [`Value::Undefined`] for members without a slot.
    pub fn get(&self, name: S::Member) -> Value {
        self.record.get(Namespace::Instance, name.name())
    }

    /// Writes an instance property. Members without accessors are overwritten with
    /// an untracked data value.
    pub fn set(&self, name: S::Member, value: impl Into<Value>) {
        self.record
            .set(Namespace::Instance, name.name(), value.into());
    }

    /// Returns the fake constructor aliasing this instance.
    pub fn constructor(&self) -> FakeConstructor<S> {
        FakeConstructor::from_record(Arc::clone(&self.record))
    }

    /// Checks whether two fakes share the same state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}

/// Fake constructor (aka static namespace) created by a [`Mock`](crate::Mock).
pub struct FakeConstructor<S> {
    record: Arc<Record>,
    _shape: PhantomData<fn() -> S>,
}

impl<S> Clone for FakeConstructor<S> {
    fn clone(&self) -> Self {
        Self {
            record: Arc::clone(&self.record),
            _shape: PhantomData,
        }
    }
}

impl<S> fmt::Debug for FakeConstructor<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("FakeConstructor")
            .field("members", &self.record.statics.names())
            .finish()
    }
}

impl<S: Shape> FakeConstructor<S> {
    pub(crate) fn from_record(record: Arc<Record>) -> Self {
        Self {
            record,
            _shape: PhantomData,
        }
    }

    /// Returns the constructor of the mock for `S` that is active on the current thread.
    ///
    /// # Panics
    ///
    /// Panics if no mock for `S` is active on the current thread.
    pub fn current() -> Self {
        S::registry().constructor().unwrap_or_else(|| {
            panic!(
                "no active mock for `{}` on the current thread",
                core::any::type_name::<S>()
            );
        })
    }

    /// Calls a static function.
    pub fn call(&self, name: S::StaticMember, args: Vec<Value>) -> Value {
        Record::call(&self.record, Namespace::Static, name.name(), &args)
    }

    /// Reads a static property.
    pub fn get(&self, name: S::StaticMember) -> Value {
        self.record.get(Namespace::Static, name.name())
    }

    /// Writes a static property.
    pub fn set(&self, name: S::StaticMember, value: impl Into<Value>) {
        self.record.set(Namespace::Static, name.name(), value.into());
    }

    /// Returns the fake instance. All constructed instances alias the same state,
    /// so calls on them are recorded in the same ledgers.
    pub fn construct(&self) -> Fake<S> {
        Fake::from_record(Arc::clone(&self.record))
    }

    /// Checks whether two constructors share the same state.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.record, &other.record)
    }
}
