//! Verification of recorded calls.

use core::fmt::Write as _;
use std::sync::Arc;

use crate::{
    error::{MatcherContractError, VerificationError},
    fake::Record,
    ledger::{Call, MemberKind},
    matchers::{Equality, IntoParameters, Matcher, ParameterMatcher},
    Value,
};

/// Terminal verification operations shared by all verifiers.
///
/// Bring this trait into scope to call `was_called()` and friends on verifiers.
pub trait Verify {
    /// Verifies recorded calls. If `times` is `None`, at least one matching call is required;
    /// otherwise, exactly `times` matching calls are required.
    ///
    /// # Errors
    ///
    /// Returns an error if the member was not set up, if the number of calls does not match,
    /// or if a parameter matcher violates its contract.
    fn verify(&self, times: Option<usize>) -> Result<(), VerificationError>;

    /// Verifies that the member was called at least once.
    ///
    /// # Errors
    ///
    /// See [`Self::verify()`].
    fn was_called(&self) -> Result<(), VerificationError> {
        self.verify(None)
    }

    /// Verifies that the member was called exactly `times` times.
    ///
    /// # Errors
    ///
    /// See [`Self::verify()`].
    fn was_called_times(&self, times: usize) -> Result<(), VerificationError> {
        self.verify(Some(times))
    }

    /// Verifies that the member was called exactly once.
    ///
    /// # Errors
    ///
    /// See [`Self::verify()`].
    fn was_called_once(&self) -> Result<(), VerificationError> {
        self.verify(Some(1))
    }

    /// Verifies that the member was not called.
    ///
    /// # Errors
    ///
    /// See [`Self::verify()`].
    fn was_not_called(&self) -> Result<(), VerificationError> {
        self.verify(Some(0))
    }
}

#[derive(Debug, Clone)]
struct Verification {
    record: Arc<Record>,
    kind: MemberKind,
    name: &'static str,
    matchers: Option<Vec<Matcher>>,
    strict: bool,
}

impl Verification {
    fn new(record: Arc<Record>, kind: MemberKind, name: &'static str) -> Self {
        Self {
            record,
            kind,
            name,
            matchers: None,
            strict: false,
        }
    }

    fn set_matchers(&mut self, params: Vec<ParameterMatcher>, equality: Equality) {
        let matchers = params
            .into_iter()
            .map(|param| param.normalize(equality))
            .collect();
        self.matchers = Some(matchers);
    }

    fn matches(&self, call: &[Value]) -> Result<bool, MatcherContractError> {
        let matchers = match &self.matchers {
            Some(matchers) => matchers,
            None => return Ok(true),
        };
        if matchers.len() != call.len() {
            return Ok(false);
        }
        for (matcher, actual) in matchers.iter().zip(call) {
            if !matcher.is_expected_value(actual)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn run(&self, times: Option<usize>) -> Result<(), VerificationError> {
        let calls = self
            .record
            .ledgers
            .calls(self.kind, self.name)
            .ok_or_else(|| VerificationError::NotSetUp {
                kind: self.kind,
                name: self.name.to_owned(),
            })?;

        let mut matching = 0;
        for call in &calls {
            if self.matches(call)? {
                matching += 1;
            }
        }
        let total = calls.len();
        let is_success = match times {
            None => matching >= 1,
            Some(times) => matching == times && (!self.strict || total == times),
        };
        if is_success {
            return Ok(());
        }

        tracing::debug!(
            kind = %self.kind,
            member = self.name,
            ?times,
            matching,
            total,
            "verification failed"
        );
        Err(VerificationError::CallCount {
            kind: self.kind,
            name: self.name.to_owned(),
            expected: times,
            matching,
            total,
            message: self.failure_message(times, matching, &calls),
        })
    }

    fn failure_message(&self, times: Option<usize>, matching: usize, calls: &[Call]) -> String {
        let label = self.kind.label();
        let name = self.name;
        let params = self.matchers.as_ref().map_or_else(String::new, |matchers| {
            let displays: Vec<_> = matchers.iter().map(Matcher::expected_display_value).collect();
            format!(" with params [{}]", displays.join(", "))
        });

        let mut message = if let Some(times) = times {
            let strict = if self.strict && self.matchers.is_some() {
                " and no other params"
            } else {
                ""
            };
            let total = calls.len();
            format!(
                "Expected {label} \"{name}\" to be called {times} {}{params}{strict} \
                 but it was called {matching} {} with matching parameters \
                 and {total} {} in total.",
                pluralize(times),
                pluralize(matching),
                pluralize(total)
            )
        } else {
            format!("Expected {label} \"{name}\" to be called{params} but it was not.")
        };

        // Only exact-count failures list the recorded calls.
        if times.is_some() && !calls.is_empty() {
            message.push_str("\nRecorded calls:");
            for (i, call) in calls.iter().enumerate() {
                let args: Vec<_> = call
                    .iter()
                    .enumerate()
                    .map(|(position, arg)| self.render_arg(position, arg))
                    .collect();
                write!(message, "\n  {}. [{}]", i + 1, args.join(", ")).ok();
            }
        }
        message
    }

    fn render_arg(&self, position: usize, arg: &Value) -> String {
        let matcher = self
            .matchers
            .as_ref()
            .and_then(|matchers| matchers.get(position));
        match matcher {
            Some(matcher) => matcher.parameter_to_string(arg),
            None => arg.to_string(),
        }
    }
}

fn pluralize(count: usize) -> &'static str {
    if count == 1 {
        "time"
    } else {
        "times"
    }
}

/// Verifier for instance or static functions.
///
/// # Examples
///
/// ```
/// use decoy::{matchers::{any, to_be}, Dynamic, Mock, Verify};
///
/// let mock = Mock::<Dynamic>::create();
/// let verifier = mock.setup_function("log");
/// let fake = mock.instance();
/// fake.call("log", vec!["x".into(), 1.into()]);
/// fake.call("log", vec!["y".into(), 2.into()]);
///
/// verifier.clone().with_parameters(("x", to_be(1))).was_called_once()?;
/// verifier.clone().with_parameters((any(), any())).was_called_times(2)?;
/// verifier.was_called_times(2)?;
///
/// let err = mock
///     .with_function("log")
///     .with_parameters(("x", 1))
///     .strict()
///     .was_called_once()
///     .unwrap_err();
/// assert!(err.to_string().starts_with(
///     "Expected function \"log\" to be called 1 time with params [\"x\", 1] and no other params \
///      but it was called 1 time with matching parameters and 2 times in total."
/// ));
/// # Ok::<_, decoy::VerificationError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FunctionVerifier {
    inner: Verification,
}

impl FunctionVerifier {
    pub(crate) fn new(record: Arc<Record>, kind: MemberKind, name: &'static str) -> Self {
        Self {
            inner: Verification::new(record, kind, name),
        }
    }

    /// Returns the kind of the verified member.
    pub fn kind(&self) -> MemberKind {
        self.inner.kind
    }

    /// Returns the name of the verified member.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Only counts calls with the specified parameters. Literal parameters are compared
    /// by identity (see [`to_be()`](crate::matchers::to_be())).
    #[must_use]
    pub fn with_parameters(mut self, params: impl IntoParameters) -> Self {
        self.inner
            .set_matchers(params.into_parameters(), Equality::Identity);
        self
    }

    /// Only counts calls with the specified parameters. Literal parameters are compared
    /// structurally (see [`to_equal()`](crate::matchers::to_equal())).
    #[must_use]
    pub fn with_parameters_equal_to(mut self, params: impl IntoParameters) -> Self {
        self.inner.set_matchers(params.into_parameters(), Equality::Deep);
        self
    }

    /// Additionally requires that the function was not called with any other parameters.
    /// Only has effect if the expected number of calls is specified.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.inner.strict = true;
        self
    }
}

impl Verify for FunctionVerifier {
    fn verify(&self, times: Option<usize>) -> Result<(), VerificationError> {
        self.inner.run(times)
    }
}

/// Verifier for instance or static property getters.
#[derive(Debug, Clone)]
pub struct GetterVerifier {
    inner: Verification,
}

impl GetterVerifier {
    pub(crate) fn new(record: Arc<Record>, kind: MemberKind, name: &'static str) -> Self {
        Self {
            inner: Verification::new(record, kind, name),
        }
    }

    /// Returns the kind of the verified member.
    pub fn kind(&self) -> MemberKind {
        self.inner.kind
    }

    /// Returns the name of the verified member.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }
}

impl Verify for GetterVerifier {
    fn verify(&self, times: Option<usize>) -> Result<(), VerificationError> {
        self.inner.run(times)
    }
}

/// Verifier for instance or static property setters. The assigned value is the only
/// parameter of a setter call.
#[derive(Debug, Clone)]
pub struct SetterVerifier {
    inner: Verification,
}

impl SetterVerifier {
    pub(crate) fn new(record: Arc<Record>, kind: MemberKind, name: &'static str) -> Self {
        Self {
            inner: Verification::new(record, kind, name),
        }
    }

    /// Returns the kind of the verified member.
    pub fn kind(&self) -> MemberKind {
        self.inner.kind
    }

    /// Returns the name of the verified member.
    pub fn name(&self) -> &'static str {
        self.inner.name
    }

    /// Only counts assignments of the specified value, compared by identity.
    #[must_use]
    pub fn with_parameters(mut self, value: impl Into<ParameterMatcher>) -> Self {
        self.inner.set_matchers(vec![value.into()], Equality::Identity);
        self
    }

    /// Only counts assignments of the specified value, compared structurally.
    #[must_use]
    pub fn with_parameters_equal_to(mut self, value: impl Into<ParameterMatcher>) -> Self {
        self.inner.set_matchers(vec![value.into()], Equality::Deep);
        self
    }

    /// Additionally requires that no other values were assigned.
    #[must_use]
    pub fn strict(mut self) -> Self {
        self.inner.strict = true;
        self
    }
}

impl Verify for SetterVerifier {
    fn verify(&self, times: Option<usize>) -> Result<(), VerificationError> {
        self.inner.run(times)
    }
}

/// Verifiers for a property, returned by [`Mock::setup_property()`](crate::Mock::setup_property())
/// and similar methods.
#[derive(Debug, Clone)]
pub struct PropertyVerifier {
    getter: GetterVerifier,
    setter: SetterVerifier,
}

impl PropertyVerifier {
    pub(crate) fn new(getter: GetterVerifier, setter: SetterVerifier) -> Self {
        Self { getter, setter }
    }

    /// Returns the getter verifier.
    pub fn getter(&self) -> GetterVerifier {
        self.getter.clone()
    }

    /// Returns the setter verifier.
    pub fn setter(&self) -> SetterVerifier {
        self.setter.clone()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{matchers::Matcher, Dynamic, Mock};

    fn called_mock() -> Mock<Dynamic> {
        let mock = Mock::<Dynamic>::create();
        mock.setup_function("functionOne");
        let fake = mock.instance();
        fake.call("functionOne", vec!["x".into(), 1.into()]);
        fake.call("functionOne", vec!["y".into(), 2.into()]);
        mock
    }

    #[test]
    fn not_set_up_messages() {
        let mock = Mock::<Dynamic>::create();
        let err = mock.with_getter("propertyOne").was_called().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Property getter \"propertyOne\" has not been set up. Please set it up using \
             Mock::setup_property() or Mock::define_property() before verifying calls."
        );
        let err = mock.with_static_function("test").was_not_called().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Static function \"test\" has not been set up. Please set it up using \
             Mock::setup_static_function() before verifying calls."
        );
    }

    #[test]
    fn count_mismatch_message() {
        let mock = called_mock();
        let err = mock
            .with_function("functionOne")
            .was_called_times(3)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected function \"functionOne\" to be called 3 times but it was called \
             2 times with matching parameters and 2 times in total.\n\
             Recorded calls:\n  1. [\"x\", 1]\n  2. [\"y\", 2]"
        );
        assert!(matches!(
            err,
            VerificationError::CallCount {
                expected: Some(3),
                matching: 2,
                total: 2,
                ..
            }
        ));
    }

    #[test]
    fn at_least_once_message_without_calls() {
        let mock = Mock::<Dynamic>::create();
        mock.setup_static_property("value", 1);
        let err = mock
            .with_static_setter("value")
            .with_parameters(5)
            .was_called()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected static property setter \"value\" to be called with params [5] but it was not."
        );
    }

    #[test]
    fn strict_suffix_requires_matchers() {
        let mock = called_mock();
        let err = mock
            .with_function("functionOne")
            .strict()
            .was_called_once()
            .unwrap_err();
        assert!(!err.to_string().contains("no other params"), "{err}");

        let err = mock
            .with_function("functionOne")
            .with_parameters(("x", 1))
            .strict()
            .was_called_once()
            .unwrap_err();
        let first_line = err.to_string().lines().next().unwrap().to_owned();
        assert_eq!(
            first_line,
            "Expected function \"functionOne\" to be called 1 time with params [\"x\", 1] \
             and no other params but it was called 1 time with matching parameters \
             and 2 times in total."
        );
    }

    #[test]
    fn strict_is_ignored_without_count() {
        let mock = called_mock();
        mock.with_function("functionOne")
            .with_parameters(("x", 1))
            .strict()
            .was_called()
            .unwrap();
    }

    #[test]
    fn arity_is_checked_before_matchers() {
        let mock = called_mock();
        let panicking = crate::matchers::predicate(|_| panic!("should not be called"));
        mock.with_function("functionOne")
            .with_parameters((panicking,))
            .was_not_called()
            .unwrap();
    }

    #[test]
    fn custom_parameter_rendering() {
        let mock = called_mock();
        let secret = Matcher::new("<secret>", |_| true).with_parameter_to_string(|_| "***".into());
        let err = mock
            .with_function("functionOne")
            .with_parameters((secret, 5))
            .was_called_once()
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected function \"functionOne\" to be called 1 time with params [<secret>, 5] \
             but it was called 0 times with matching parameters and 2 times in total.\n\
             Recorded calls:\n  1. [***, 1]\n  2. [***, 2]"
        );
    }

    #[test]
    fn contract_violation_aborts_verification() {
        let mock = called_mock();
        let failing = crate::matchers::predicate(|value| {
            assert!(value.as_str() != Some("y"), "unexpected y");
            true
        });
        let err = mock
            .with_function("functionOne")
            .with_parameters((failing, 1))
            .was_called_once()
            .unwrap_err();
        assert!(matches!(err, VerificationError::MatcherContract(_)));
        assert_eq!(
            err.to_string(),
            "Parameter matcher [Function] panicked while checking \"y\": unexpected y"
        );
    }

    #[test]
    fn getter_calls_have_no_params() {
        let mock = Mock::<Dynamic>::create();
        let property = mock.setup_property("value", Value::Null);
        let fake = mock.instance();
        fake.get("value");
        fake.set("value", 1);
        fake.set("value", 1);

        property.getter().was_called_once().unwrap();
        let err = property.setter().was_called_once().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Expected property setter \"value\" to be called 1 time but it was called \
             2 times with matching parameters and 2 times in total.\n\
             Recorded calls:\n  1. [1]\n  2. [1]"
        );
        assert_eq!(property.getter().kind(), MemberKind::Getter);
        assert_eq!(property.setter().name(), "value");
    }
}
