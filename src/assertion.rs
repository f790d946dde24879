//! Assertion-style adapter for verifiers.
//!
//! Test code may prefer assertions that panic over [`Result`]s returned by [`Verify`]
//! methods. This module provides such assertions via [`expect()`], and a process-wide registry
//! of named custom matchers producing [`Outcome`]s. The registry is populated with
//! the built-in matchers by [`register_matchers()`], which can be called any number of times.
//!
//! # Examples
//!
//! ```
//! use decoy::{assertion::{expect, register_matchers}, Dynamic, Mock};
//!
//! register_matchers();
//! let mock = Mock::<Dynamic>::create();
//! let verifier = mock.setup_function("run");
//! mock.instance().call("run", vec![]);
//!
//! expect(&verifier).to_be_called_once();
//! let outcome = expect(&verifier).outcome("to_be_called_times", Some(2));
//! assert!(!outcome.pass());
//! assert!(outcome.message().starts_with("Expected function \"run\" to be called 2 times"));
//! ```

use once_cell::sync::{Lazy, OnceCell};
use parking_lot::Mutex;

use core::fmt;
use std::{collections::HashMap, sync::Arc};

use crate::{VerificationError, Verify};

type MessageFn = dyn Fn() -> String + Send + Sync;

/// Message of an [`Outcome`].
#[derive(Clone)]
pub enum Message {
    /// Eagerly rendered message.
    Text(String),
    /// Lazily rendered message.
    Deferred(Arc<MessageFn>),
}

impl fmt::Debug for Message {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => formatter.debug_tuple("Text").field(text).finish(),
            Self::Deferred(_) => formatter.debug_tuple("Deferred").field(&"_").finish(),
        }
    }
}

impl Message {
    /// Renders this message.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.clone(),
            Self::Deferred(render) => render(),
        }
    }
}

/// Pass / fail outcome of a custom matcher together with the diagnostic message.
#[derive(Debug, Clone)]
pub struct Outcome {
    pass: bool,
    message: Message,
}

impl Outcome {
    /// Converts the result of a verification. A successful verification has
    /// an empty message.
    pub fn from_result(result: Result<(), VerificationError>) -> Self {
        match result {
            Ok(()) => Self {
                pass: true,
                message: Message::Text(String::new()),
            },
            Err(err) => Self {
                pass: false,
                message: Message::Text(err.to_string()),
            },
        }
    }

    /// Checks whether the verification passed.
    pub fn pass(&self) -> bool {
        self.pass
    }

    /// Renders the message.
    pub fn message(&self) -> String {
        self.message.render()
    }

    /// Returns the raw message.
    pub fn raw_message(&self) -> &Message {
        &self.message
    }

    /// Converts the message into the deferred form. The rendered text is unchanged.
    #[must_use]
    pub fn into_deferred(self) -> Self {
        let message = match self.message {
            Message::Text(text) => Message::Deferred(Arc::new(move || text.clone())),
            deferred @ Message::Deferred(_) => deferred,
        };
        Self {
            pass: self.pass,
            message,
        }
    }
}

/// Custom matcher: takes a verifier and an optional expected number of calls.
pub type CustomMatcher = fn(&dyn Verify, Option<usize>) -> Outcome;

static MATCHERS: Lazy<Mutex<HashMap<String, CustomMatcher>>> = Lazy::new(Mutex::default);
static DEFAULTS: OnceCell<()> = OnceCell::new();

fn to_be_called(verifier: &dyn Verify, _: Option<usize>) -> Outcome {
    Outcome::from_result(verifier.was_called())
}

fn to_be_called_once(verifier: &dyn Verify, _: Option<usize>) -> Outcome {
    Outcome::from_result(verifier.was_called_once())
}

fn to_be_called_times(verifier: &dyn Verify, times: Option<usize>) -> Outcome {
    match times {
        Some(times) => Outcome::from_result(verifier.was_called_times(times)),
        None => {
            let message = "`to_be_called_times` requires the expected number of calls";
            Outcome {
                pass: false,
                message: Message::Text(message.to_owned()),
            }
        }
    }
}

fn not_to_be_called(verifier: &dyn Verify, _: Option<usize>) -> Outcome {
    Outcome::from_result(verifier.was_not_called())
}

const BUILTIN_MATCHERS: [(&str, CustomMatcher); 4] = [
    ("to_be_called", to_be_called),
    ("to_be_called_once", to_be_called_once),
    ("to_be_called_times", to_be_called_times),
    ("not_to_be_called", not_to_be_called),
];

/// Registers built-in custom matchers. Only the first call has an effect; matchers
/// re-registered with [`register_matcher()`] are not overwritten.
pub fn register_matchers() {
    DEFAULTS.get_or_init(|| {
        let mut matchers = MATCHERS.lock();
        for (name, matcher) in BUILTIN_MATCHERS {
            matchers.entry(name.to_owned()).or_insert(matcher);
        }
        tracing::debug!(count = matchers.len(), "registered custom matchers");
    });
}

/// Adds or replaces a custom matcher.
pub fn register_matcher(name: impl Into<String>, matcher: CustomMatcher) {
    MATCHERS.lock().insert(name.into(), matcher);
}

/// Returns sorted names of registered custom matchers.
pub fn registered_matchers() -> Vec<String> {
    let mut names: Vec<_> = MATCHERS.lock().keys().cloned().collect();
    names.sort_unstable();
    names
}

fn custom_matcher(name: &str) -> Option<CustomMatcher> {
    MATCHERS.lock().get(name).copied()
}

/// Starts an assertion on a verifier.
pub fn expect<V: Verify + ?Sized>(verifier: &V) -> Expectation<'_, V> {
    Expectation { verifier }
}

/// Assertion on a verifier created by [`expect()`].
#[derive(Debug)]
pub struct Expectation<'a, V: ?Sized> {
    verifier: &'a V,
}

impl<V: Verify + ?Sized> Expectation<'_, V> {
    #[track_caller]
    fn assert(result: Result<(), VerificationError>) {
        if let Err(err) = result {
            panic!("{err}");
        }
    }

    /// Asserts that the member was called at least once.
    ///
    /// # Panics
    ///
    /// Panics with the verification message if the assertion fails.
    #[track_caller]
    pub fn to_be_called(&self) {
        Self::assert(self.verifier.was_called());
    }

    /// Asserts that the member was called exactly `times` times.
    ///
    /// # Panics
    ///
    /// Panics with the verification message if the assertion fails.
    #[track_caller]
    pub fn to_be_called_times(&self, times: usize) {
        Self::assert(self.verifier.was_called_times(times));
    }

    /// Asserts that the member was called exactly once.
    ///
    /// # Panics
    ///
    /// Panics with the verification message if the assertion fails.
    #[track_caller]
    pub fn to_be_called_once(&self) {
        Self::assert(self.verifier.was_called_once());
    }

    /// Asserts that the member was not called.
    ///
    /// # Panics
    ///
    /// Panics with the verification message if the assertion fails.
    #[track_caller]
    pub fn not_to_be_called(&self) {
        Self::assert(self.verifier.was_not_called());
    }

    /// Evaluates a registered custom matcher.
    ///
    /// # Panics
    ///
    /// Panics if no matcher with the specified name is registered.
    pub fn outcome(&self, matcher: &str, times: Option<usize>) -> Outcome {
        let matcher = custom_matcher(matcher)
            .unwrap_or_else(|| panic!("custom matcher `{matcher}` is not registered"));
        matcher(&Forward(self.verifier), times)
    }
}

/// Forwards to a possibly unsized verifier.
struct Forward<'a, V: ?Sized>(&'a V);

impl<V: Verify + ?Sized> Verify for Forward<'_, V> {
    fn verify(&self, times: Option<usize>) -> Result<(), VerificationError> {
        self.0.verify(times)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Dynamic, Mock};

    #[test]
    fn registering_matchers_is_idempotent() {
        for _ in 0..3 {
            register_matchers();
            let names = registered_matchers();
            for (name, _) in BUILTIN_MATCHERS {
                let count = names.iter().filter(|registered| *registered == name).count();
                assert_eq!(count, 1, "{name}");
            }
        }
    }

    #[test]
    fn registering_custom_matcher() {
        fn always_pass(_: &dyn Verify, _: Option<usize>) -> Outcome {
            Outcome::from_result(Ok(()))
        }

        register_matcher("always_pass", always_pass);
        register_matchers();
        let mock = Mock::<Dynamic>::create();
        let outcome = expect(&mock.with_function("missing")).outcome("always_pass", None);
        assert!(outcome.pass());
        assert_eq!(outcome.message(), "");
    }

    #[test]
    fn builtin_count_matchers() {
        register_matchers();
        let mock = Mock::<Dynamic>::create();
        let verifier = mock.setup_function("test");
        mock.instance().call("test", vec![]);

        assert!(expect(&verifier).outcome("to_be_called", None).pass());
        assert!(expect(&verifier).outcome("to_be_called", Some(5)).pass());
        assert!(expect(&verifier).outcome("to_be_called_times", Some(1)).pass());
        assert!(!expect(&verifier).outcome("to_be_called_times", Some(2)).pass());

        let outcome = expect(&verifier).outcome("to_be_called_times", None);
        assert!(!outcome.pass());
        assert_eq!(
            outcome.message(),
            "`to_be_called_times` requires the expected number of calls"
        );
    }

    #[test]
    fn deferred_messages_are_identical() {
        register_matchers();
        let mock = Mock::<Dynamic>::create();
        let verifier = mock.setup_function("test");
        mock.instance().call("test", vec![1.into()]);

        let outcome = expect(&verifier).outcome("not_to_be_called", None);
        assert!(!outcome.pass());
        let text = outcome.message();
        let deferred = outcome.into_deferred();
        assert!(matches!(deferred.raw_message(), Message::Deferred(_)));
        assert_eq!(deferred.message(), text);
        assert_eq!(
            text,
            "Expected function \"test\" to be called 0 times but it was called 1 time \
             with matching parameters and 1 time in total.\nRecorded calls:\n  1. [1]"
        );
    }

    #[test]
    #[should_panic(expected = "Expected property getter \"value\" to be called 2 times")]
    fn failed_expectation_panics() {
        let mock = Mock::<Dynamic>::create();
        let property = mock.setup_property("value", 1);
        expect(&property.getter()).to_be_called_times(2);
    }

    #[test]
    fn expectation_on_trait_object() {
        let mock = Mock::<Dynamic>::create();
        let verifier: Box<dyn Verify> = Box::new(mock.setup_static_function("test"));
        expect(verifier.as_ref()).not_to_be_called();
    }
}
