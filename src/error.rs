//! Error types.

use thiserror::Error;

use crate::ledger::MemberKind;

/// Error raised when a verification fails.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum VerificationError {
    /// The verified member was never set up on the mock.
    #[error(
        "{} \"{name}\" has not been set up. Please set it up using {} before verifying calls.",
        .kind.capitalized_label(),
        .kind.setup_hint()
    )]
    NotSetUp {
        /// Kind of the member.
        kind: MemberKind,
        /// Name of the member.
        name: String,
    },

    /// The number of recorded calls does not match the expectation.
    #[error("{message}")]
    CallCount {
        /// Kind of the member.
        kind: MemberKind,
        /// Name of the member.
        name: String,
        /// Expected number of matching calls; `None` means "at least one".
        expected: Option<usize>,
        /// Number of calls accepted by the parameter matchers.
        matching: usize,
        /// Total number of recorded calls.
        total: usize,
        /// Full diagnostic message.
        message: String,
    },

    /// A parameter matcher violated its contract.
    #[error(transparent)]
    MatcherContract(#[from] MatcherContractError),
}

/// Error raised when a predicate used as a parameter matcher panics or does not return
/// a boolean.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum MatcherContractError {
    /// The predicate panicked.
    #[error("Parameter matcher {matcher} panicked while checking {actual}: {cause}")]
    Panicked {
        /// Display value of the matcher.
        matcher: String,
        /// Rendered actual value.
        actual: String,
        /// Panic message.
        cause: String,
    },

    /// The predicate returned a non-boolean value.
    #[error(
        "Parameter matcher {matcher} returned {returned} instead of a boolean while checking {actual}"
    )]
    NotBoolean {
        /// Display value of the matcher.
        matcher: String,
        /// Rendered actual value.
        actual: String,
        /// Rendered value returned by the predicate.
        returned: String,
    },
}

/// Error converting a [`Value`](crate::Value) into a Rust type.
#[derive(Debug, Clone, Error)]
#[error("cannot convert {actual} into {expected}")]
pub struct ConversionError {
    pub(crate) expected: &'static str,
    pub(crate) actual: String,
}

impl ConversionError {
    /// Returns the name of the expected type.
    pub fn expected(&self) -> &'static str {
        self.expected
    }
}
