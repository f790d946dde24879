//! Call ledgers: per-member logs of recorded calls.

use parking_lot::Mutex;

use core::fmt;
use std::collections::HashMap;

use crate::Value;

/// Arguments of a single recorded call. Getter calls are recorded with no arguments,
/// setter calls with a single argument (the assigned value).
pub type Call = Vec<Value>;

/// Kind of a mocked member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Instance function.
    Function,
    /// Static function.
    StaticFunction,
    /// Instance property getter.
    Getter,
    /// Static property getter.
    StaticGetter,
    /// Instance property setter.
    Setter,
    /// Static property setter.
    StaticSetter,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.label())
    }
}

impl MemberKind {
    /// All member kinds.
    pub const ALL: [Self; 6] = [
        Self::Function,
        Self::StaticFunction,
        Self::Getter,
        Self::StaticGetter,
        Self::Setter,
        Self::StaticSetter,
    ];

    /// Checks whether this kind belongs to the static namespace (i.e., the fake constructor).
    pub fn is_static(self) -> bool {
        matches!(
            self,
            Self::StaticFunction | Self::StaticGetter | Self::StaticSetter
        )
    }

    /// Returns a human-readable label used in diagnostic messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::StaticFunction => "static function",
            Self::Getter => "property getter",
            Self::StaticGetter => "static property getter",
            Self::Setter => "property setter",
            Self::StaticSetter => "static property setter",
        }
    }

    pub(crate) fn capitalized_label(self) -> &'static str {
        match self {
            Self::Function => "Function",
            Self::StaticFunction => "Static function",
            Self::Getter => "Property getter",
            Self::StaticGetter => "Static property getter",
            Self::Setter => "Property setter",
            Self::StaticSetter => "Static property setter",
        }
    }

    /// Returns the `Mock` method(s) that set up a member of this kind.
    pub fn setup_hint(self) -> &'static str {
        match self {
            Self::Function => "Mock::setup_function()",
            Self::StaticFunction => "Mock::setup_static_function()",
            Self::Getter | Self::Setter => "Mock::setup_property() or Mock::define_property()",
            Self::StaticGetter | Self::StaticSetter => {
                "Mock::setup_static_property() or Mock::define_static_property()"
            }
        }
    }

    fn index(self) -> usize {
        match self {
            Self::Function => 0,
            Self::StaticFunction => 1,
            Self::Getter => 2,
            Self::StaticGetter => 3,
            Self::Setter => 4,
            Self::StaticSetter => 5,
        }
    }
}

/// Member namespace: the fake instance or the fake constructor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Namespace {
    Instance,
    Static,
}

impl Namespace {
    pub(crate) fn function_kind(self) -> MemberKind {
        match self {
            Self::Instance => MemberKind::Function,
            Self::Static => MemberKind::StaticFunction,
        }
    }

    pub(crate) fn accessor_kinds(self) -> (MemberKind, MemberKind) {
        match self {
            Self::Instance => (MemberKind::Getter, MemberKind::Setter),
            Self::Static => (MemberKind::StaticGetter, MemberKind::StaticSetter),
        }
    }
}

type Ledger = HashMap<&'static str, Vec<Call>>;

/// Six call ledgers, one per [`MemberKind`]. An entry for a member exists iff the member
/// was set up.
#[derive(Debug, Default)]
pub(crate) struct Ledgers {
    inner: Mutex<[Ledger; 6]>,
}

impl Ledgers {
    /// Creates an empty entry unless one exists. Existing history is kept.
    pub(crate) fn ensure(&self, kind: MemberKind, name: &'static str) {
        self.inner.lock()[kind.index()].entry(name).or_default();
    }

    /// Replaces the entry with an empty one, dropping recorded calls.
    pub(crate) fn reset(&self, kind: MemberKind, name: &'static str) {
        self.inner.lock()[kind.index()].insert(name, Vec::new());
    }

    pub(crate) fn record(&self, kind: MemberKind, name: &'static str, call: Call) {
        tracing::trace!(%kind, member = name, args = call.len(), "recorded call");
        self.inner.lock()[kind.index()]
            .entry(name)
            .or_default()
            .push(call);
    }

    pub(crate) fn calls(&self, kind: MemberKind, name: &str) -> Option<Vec<Call>> {
        self.inner.lock()[kind.index()].get(name).cloned()
    }
}
