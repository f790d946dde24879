//! Mocks and spies with call ledgers, parameter matchers and strict verification.
//!
//! A [`Mock`] bundles a fake instance ([`Fake`]), a fake constructor ([`FakeConstructor`])
//! holding static members, and call ledgers for six member kinds: instance / static functions,
//! property getters and property setters. Members are added to the fake lazily via builder
//! methods such as [`Mock::setup_function()`]; every call of a set-up member is recorded.
//! Afterwards, test code obtains a verifier (e.g., via [`Mock::with_function()`]),
//! optionally narrows it down with parameter [`matchers`], and asserts on the number of calls.
//!
//! Arguments and return values are dynamically typed [`Value`]s. The mocked interface
//! is described by a [`Shape`], which defines member names; names are thus checked
//! at compile time. For quick tests, the [`Dynamic`] shape allows arbitrary string names.
//! With the `derive` crate feature (on by default), the [`fake`] attribute macro derives
//! a shape from a trait and implements the trait for the fake.
//!
//! # Features and limitations
//!
//! - Instance and static members are tracked independently, even if they share a name.
//!   Instances returned by [`FakeConstructor::construct()`] alias the mock's fake instance.
//! - Re-setting up a function replaces its implementation, but keeps its recorded calls.
//!   Setting up a property again clears the recorded getter and setter calls.
//! - Parameters are matched positionally with exact arity. Literal parameters are compared
//!   by identity in [`with_parameters()`](FunctionVerifier::with_parameters())
//!   and structurally in
//!   [`with_parameters_equal_to()`](FunctionVerifier::with_parameters_equal_to()).
//!   See [`Value`] for details on identity.
//! - Failure messages are stable. Call count mismatches list all recorded calls.
//! - Static members of typed fakes are resolved via a thread-local registry, so they must
//!   be called on the thread that created the mock.
//!
//! # Crate features
//!
//! ## `derive`
//!
//! *(On by default)*
//!
//! Re-exports the [`fake`] and [`Member`](macro@Member) procedural macros.
//!
//! # Examples
//!
//! ## Basics
//!
//! ```
//! use decoy::{matchers::to_be, Dynamic, Mock, Value, Verify};
//!
//! let mock = Mock::<Dynamic>::create();
//! mock.setup_function_with("functionOne", |_, args: &[Value]| {
//!     Value::from(args.len())
//! });
//! let fake = mock.instance();
//! fake.call("functionOne", vec!["x".into(), 1.into()]);
//! fake.call("functionOne", vec!["y".into(), 2.into()]);
//!
//! let verifier = mock.with_function("functionOne");
//! verifier.clone().with_parameters(("x", to_be(1))).was_called_once()?;
//! verifier.clone().was_called_times(2)?;
//!
//! let err = verifier
//!     .with_parameters(("x", 1))
//!     .strict()
//!     .was_called_once()
//!     .unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Expected function \"functionOne\" to be called 1 time with params [\"x\", 1] \
//!      and no other params but it was called 1 time with matching parameters \
//!      and 2 times in total.\n\
//!      Recorded calls:\n  1. [\"x\", 1]\n  2. [\"y\", 2]"
//! );
//! # Ok::<_, decoy::VerificationError>(())
//! ```
//!
//! ## Typed fakes
//!
//! ```
//! use decoy::{fake, matchers::any, Mock, Value, Verify};
//!
//! #[fake]
//! pub trait Repository {
//!     fn find(&self, id: u32) -> Option<String>;
//!     fn save(&mut self, id: u32, name: &str) -> bool;
//!     #[fake(get)]
//!     fn len(&self) -> usize;
//!     fn connect(url: &str) -> Self
//!     where
//!         Self: Sized;
//! }
//!
//! // Code under test.
//! fn rename<R: Repository>(repo: &mut R, id: u32, name: &str) -> bool {
//!     repo.find(id).is_some() && repo.save(id, name)
//! }
//!
//! let mock = Mock::<RepositoryShape>::create();
//! mock.setup_function_with(RepositoryMember::Find, |_, args: &[Value]| {
//!     if args[0] == Value::from(1) { Value::from("Alice") } else { Value::Null }
//! });
//! mock.setup_function_with(RepositoryMember::Save, |_, _| Value::from(true));
//! mock.setup_property(RepositoryMember::Len, 1);
//! mock.setup_static_function(RepositoryStaticMember::Connect);
//!
//! let mut repo = decoy::Fake::<RepositoryShape>::connect("memory://");
//! assert!(rename(&mut repo, 1, "Bob"));
//! assert!(!rename(&mut repo, 2, "Carol"));
//! assert_eq!(repo.len(), 1);
//!
//! mock.with_function(RepositoryMember::Save)
//!     .with_parameters((1, any()))
//!     .strict()
//!     .was_called_once()?;
//! mock.with_function(RepositoryMember::Find).was_called_times(2)?;
//! mock.with_static_function(RepositoryStaticMember::Connect)
//!     .with_parameters(("memory://",))
//!     .was_called_once()?;
//! mock.with_getter(RepositoryMember::Len).was_called_once()?;
//! # Ok::<_, decoy::VerificationError>(())
//! ```

// Documentation settings.
#![doc(html_root_url = "https://docs.rs/decoy/0.1.0")]
// Linter settings.
#![warn(missing_debug_implementations, missing_docs, bare_trait_objects)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::must_use_candidate, clippy::module_name_repetitions)]

// Allows generated code to refer to `::decoy` in this crate's own tests.
extern crate self as decoy;

pub mod assertion;
mod error;
mod fake;
mod ledger;
pub mod matchers;
mod mock;
pub mod operators;
mod registry;
mod value;
mod verifiers;

pub use crate::{
    error::{ConversionError, MatcherContractError, VerificationError},
    fake::{Fake, FakeConstructor},
    ledger::{Call, MemberKind},
    mock::{create, Dynamic, MemberName, Mock, Shape},
    registry::Registry,
    value::{FromValue, Func, Value},
    verifiers::{FunctionVerifier, GetterVerifier, PropertyVerifier, SetterVerifier, Verify},
};
#[cfg(feature = "derive")]
pub use decoy_derive::{fake, Member};

#[cfg(doctest)]
doc_comment::doctest!("../README.md");

#[doc(hidden)] // only used in macros
pub mod __private {
    use crate::{FromValue, MemberName, Value};

    /// Converts a value returned by a fake member into the declared return type.
    ///
    /// # Panics
    ///
    /// Panics if the value cannot be converted.
    #[track_caller]
    pub fn convert_return<M: MemberName, R: FromValue>(member: M, value: Value) -> R {
        R::from_value(value).unwrap_or_else(|err| {
            panic!(
                "cannot convert value returned by member `{}`: {err}",
                member.name()
            );
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converting_return_values() {
        let value: Option<String> = __private::convert_return("test", Value::Null);
        assert_eq!(value, None);
        let value: u8 = __private::convert_return("test", Value::from(42));
        assert_eq!(value, 42);
    }

    #[test]
    #[should_panic(expected = "cannot convert value returned by member `test`")]
    fn converting_incompatible_return_value() {
        let _: bool = __private::convert_return("test", Value::from("true"));
    }
}
