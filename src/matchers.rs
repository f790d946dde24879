//! Parameter matchers used to filter recorded calls during verification.
//!
//! A parameter can be specified in three ways, unified by [`ParameterMatcher`]:
//!
//! - A [`Matcher`], e.g., one returned by [`to_be()`], [`any()`] or created with
//!   [`Matcher::new()`].
//! - A predicate: a [`Func`] value, or a closure wrapped with [`predicate()`].
//!   A predicate must return a boolean; if it panics or returns anything else,
//!   verification fails with a [`MatcherContractError`].
//! - A literal value. Literals are compared by identity in
//!   [`with_parameters()`](crate::FunctionVerifier::with_parameters()), and structurally in
//!   [`with_parameters_equal_to()`](crate::FunctionVerifier::with_parameters_equal_to()).

use core::fmt;
use std::{
    any::Any,
    borrow::Cow,
    panic::{self, AssertUnwindSafe},
    slice,
    sync::Arc,
};

use crate::{error::MatcherContractError, Func, Value};

type CheckFn = dyn Fn(&Value) -> Result<bool, MatcherContractError> + Send + Sync;
type RenderFn = dyn Fn(&Value) -> String + Send + Sync;

/// Structural parameter matcher.
///
/// # Examples
///
/// ```
/// # use decoy::{matchers::Matcher, Value};
/// let short_string = Matcher::new("<string shorter than 5 chars>", |value| {
///     value.as_str().map_or(false, |s| s.len() < 5)
/// })
/// .with_parameter_to_string(|value| format!("<{} chars>", value.as_str().map_or(0, str::len)));
///
/// assert!(short_string.is_expected_value(&"test".into()).unwrap());
/// assert_eq!(short_string.parameter_to_string(&"testing".into()), "<7 chars>");
/// ```
#[derive(Clone)]
pub struct Matcher {
    is_expected_value: Arc<CheckFn>,
    expected_display_value: String,
    parameter_to_string: Option<Arc<RenderFn>>,
}

impl fmt::Debug for Matcher {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Matcher")
            .field("expected_display_value", &self.expected_display_value)
            .field("custom_display", &self.parameter_to_string.is_some())
            .finish_non_exhaustive()
    }
}

impl Matcher {
    /// Creates a matcher from a predicate over actual values and a display string
    /// for the expected value.
    pub fn new<F>(expected_display_value: impl Into<String>, is_expected_value: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self {
            is_expected_value: Arc::new(move |value| Ok(is_expected_value(value))),
            expected_display_value: expected_display_value.into(),
            parameter_to_string: None,
        }
    }

    /// Sets a custom renderer for actual values checked by this matcher. The renderer is used
    /// for the corresponding parameter in the recorded call dump of verification failures.
    #[must_use]
    pub fn with_parameter_to_string<F>(mut self, render: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        self.parameter_to_string = Some(Arc::new(render));
        self
    }

    /// Wraps a predicate function, checking that it does not panic and returns a boolean.
    fn from_predicate(function: Func) -> Self {
        let display = function.to_string();
        let matcher = display.clone();
        let check = move |actual: &Value| {
            let call = AssertUnwindSafe(|| function.call(slice::from_ref(actual)));
            let returned = panic::catch_unwind(call).map_err(|payload| {
                MatcherContractError::Panicked {
                    matcher: matcher.clone(),
                    actual: actual.to_string(),
                    cause: panic_message(payload.as_ref()).into_owned(),
                }
            })?;
            match returned {
                Value::Bool(flag) => Ok(flag),
                other => Err(MatcherContractError::NotBoolean {
                    matcher: matcher.clone(),
                    actual: actual.to_string(),
                    returned: other.to_string(),
                }),
            }
        };

        Self {
            is_expected_value: Arc::new(check),
            expected_display_value: display,
            parameter_to_string: None,
        }
    }

    /// Checks whether the `actual` value is accepted by this matcher.
    ///
    /// # Errors
    ///
    /// Returns an error if the matcher wraps a predicate that panicked or returned
    /// a non-boolean value.
    pub fn is_expected_value(&self, actual: &Value) -> Result<bool, MatcherContractError> {
        (self.is_expected_value)(actual)
    }

    /// Returns the display string for the expected value.
    pub fn expected_display_value(&self) -> &str {
        &self.expected_display_value
    }

    /// Renders an actual value, using the custom renderer if one is set.
    pub fn parameter_to_string(&self, actual: &Value) -> String {
        match &self.parameter_to_string {
            Some(render) => render(actual),
            None => actual.to_string(),
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> Cow<'_, str> {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        Cow::Borrowed(message)
    } else if let Some(message) = payload.downcast_ref::<String>() {
        Cow::Borrowed(message)
    } else {
        Cow::Borrowed("(non-string panic payload)")
    }
}

/// Comparison applied to literal parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Equality {
    Identity,
    Deep,
}

/// Positional parameter matcher: a literal value, a predicate or a structural matcher.
///
/// Conversions resolve the kind once: [`Matcher`]s are structural, [`Func`]s (including
/// [`Value::Function`]s) are predicates, and everything else is a literal.
#[derive(Debug, Clone)]
pub enum ParameterMatcher {
    /// Literal value compared using the default equality of the verification entry point.
    Literal(Value),
    /// Predicate function that must return a boolean.
    Predicate(Func),
    /// Structural matcher.
    Structural(Matcher),
}

impl ParameterMatcher {
    pub(crate) fn normalize(self, fallback: Equality) -> Matcher {
        match self {
            Self::Literal(value) => match fallback {
                Equality::Identity => to_be(value),
                Equality::Deep => to_equal(value),
            },
            Self::Predicate(function) => Matcher::from_predicate(function),
            Self::Structural(matcher) => matcher,
        }
    }
}

impl From<Matcher> for ParameterMatcher {
    fn from(matcher: Matcher) -> Self {
        Self::Structural(matcher)
    }
}

impl From<Func> for ParameterMatcher {
    fn from(function: Func) -> Self {
        Self::Predicate(function)
    }
}

impl From<Value> for ParameterMatcher {
    fn from(value: Value) -> Self {
        match value {
            Value::Function(function) => Self::Predicate(function),
            literal => Self::Literal(literal),
        }
    }
}

impl From<&Value> for ParameterMatcher {
    fn from(value: &Value) -> Self {
        Self::from(value.clone())
    }
}

macro_rules! impl_from_literal {
    ($($ty:ty),+) => {
        $(
        impl From<$ty> for ParameterMatcher {
            fn from(value: $ty) -> Self {
                Self::Literal(value.into())
            }
        }
        )+
    };
}

impl_from_literal!(
    (), bool, char, &str, String, &String, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize,
    f32, f64
);

impl<T: Into<Value>> From<Option<T>> for ParameterMatcher {
    fn from(value: Option<T>) -> Self {
        Self::Literal(value.into())
    }
}

impl<T: Into<Value>> From<Vec<T>> for ParameterMatcher {
    fn from(items: Vec<T>) -> Self {
        Self::Literal(items.into())
    }
}

/// List of positional parameter matchers.
///
/// Implemented for tuples (up to 8 elements), arrays and vectors of items convertible
/// to [`ParameterMatcher`]. Tuples allow mixing literals and matchers:
/// `("x", to_be(1))`. The unit type `()` stands for "no parameters".
pub trait IntoParameters {
    /// Performs the conversion.
    fn into_parameters(self) -> Vec<ParameterMatcher>;
}

impl IntoParameters for () {
    fn into_parameters(self) -> Vec<ParameterMatcher> {
        Vec::new()
    }
}

impl<T: Into<ParameterMatcher>, const N: usize> IntoParameters for [T; N] {
    fn into_parameters(self) -> Vec<ParameterMatcher> {
        self.into_iter().map(Into::into).collect()
    }
}

impl<T: Into<ParameterMatcher>> IntoParameters for Vec<T> {
    fn into_parameters(self) -> Vec<ParameterMatcher> {
        self.into_iter().map(Into::into).collect()
    }
}

macro_rules! impl_into_parameters_for_tuple {
    ($($param:ident),+) => {
        impl<$($param,)+> IntoParameters for ($($param,)+)
        where
            $($param: Into<ParameterMatcher>,)+
        {
            #[allow(non_snake_case)]
            fn into_parameters(self) -> Vec<ParameterMatcher> {
                let ($($param,)+) = self;
                vec![$($param.into(),)+]
            }
        }
    };
}

impl_into_parameters_for_tuple!(A);
impl_into_parameters_for_tuple!(A, B);
impl_into_parameters_for_tuple!(A, B, C);
impl_into_parameters_for_tuple!(A, B, C, D);
impl_into_parameters_for_tuple!(A, B, C, D, E);
impl_into_parameters_for_tuple!(A, B, C, D, E, F);
impl_into_parameters_for_tuple!(A, B, C, D, E, F, G);
impl_into_parameters_for_tuple!(A, B, C, D, E, F, G, H);

/// Matches values strictly equal to `expected` (see [`Value::is_identical()`]).
pub fn to_be(expected: impl Into<Value>) -> Matcher {
    let expected = expected.into();
    Matcher::new(expected.to_string(), move |actual| {
        actual.is_identical(&expected)
    })
}

/// Matches values structurally equal to `expected` (see [`Value::deep_equals()`]).
pub fn to_equal(expected: impl Into<Value>) -> Matcher {
    let expected = expected.into();
    Matcher::new(expected.to_string(), move |actual| {
        actual.deep_equals(&expected)
    })
}

/// Matches any value.
pub fn any() -> Matcher {
    Matcher::new("<any>", |_| true)
}

/// Matches any value except [`Value::Undefined`]. [`Value::Null`] is matched.
pub fn to_be_defined() -> Matcher {
    Matcher::new("<defined>", |actual| !actual.is_undefined())
}

/// Matches any value except [`Value::Undefined`] and [`Value::Null`].
pub fn has_value() -> Matcher {
    Matcher::new("<has value>", |actual| {
        !actual.is_undefined() && !actual.is_null()
    })
}

/// Wraps a closure into a predicate matcher.
///
/// Unlike [`Matcher::new()`], panics in the closure are caught and reported
/// as a [`MatcherContractError`].
pub fn predicate<F>(predicate: F) -> ParameterMatcher
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    let function = Func::new(move |args| {
        let actual = args.first().cloned().unwrap_or_default();
        Value::Bool(predicate(&actual))
    });
    ParameterMatcher::Predicate(function)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_fallbacks() {
        let object = Value::object([("a", 1)]);
        let identity = ParameterMatcher::from(&object).normalize(Equality::Identity);
        assert!(identity.is_expected_value(&object).unwrap());
        assert!(!identity
            .is_expected_value(&Value::object([("a", 1)]))
            .unwrap());

        let deep = ParameterMatcher::from(&object).normalize(Equality::Deep);
        assert!(deep.is_expected_value(&Value::object([("a", 1)])).unwrap());
        assert_eq!(deep.expected_display_value(), r#"{"a": 1}"#);
    }

    #[test]
    fn builtin_matchers() {
        let values = [
            Value::Undefined,
            Value::Null,
            Value::from(0),
            Value::from(""),
        ];
        let defined: Vec<_> = values
            .iter()
            .map(|value| to_be_defined().is_expected_value(value).unwrap())
            .collect();
        assert_eq!(defined, [false, true, true, true]);
        let with_value: Vec<_> = values
            .iter()
            .map(|value| has_value().is_expected_value(value).unwrap())
            .collect();
        assert_eq!(with_value, [false, false, true, true]);
        assert!(values
            .iter()
            .all(|value| any().is_expected_value(value).unwrap()));

        assert_eq!(any().expected_display_value(), "<any>");
        assert_eq!(to_be("test").expected_display_value(), r#""test""#);
        assert_eq!(to_equal(Value::Undefined).expected_display_value(), "undefined");
    }

    #[test]
    fn function_values_are_predicates() {
        let is_positive = Func::with_signature("|value|", |args| {
            Value::Bool(args[0].as_f64().map_or(false, |number| number > 0.0))
        });
        let matcher = ParameterMatcher::from(Value::from(is_positive));
        assert!(matches!(matcher, ParameterMatcher::Predicate(_)));

        let matcher = matcher.normalize(Equality::Identity);
        assert_eq!(matcher.expected_display_value(), "function(value)");
        assert!(matcher.is_expected_value(&5.into()).unwrap());
        assert!(!matcher.is_expected_value(&(-5).into()).unwrap());
    }

    #[test]
    fn predicate_returning_non_boolean() {
        let matcher = ParameterMatcher::from(Func::new(|_| Value::from("yes")));
        let err = matcher
            .normalize(Equality::Deep)
            .is_expected_value(&1.into())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            r#"Parameter matcher [Function] returned "yes" instead of a boolean while checking 1"#
        );
    }

    #[test]
    fn panicking_predicate() {
        let matcher = predicate(|value| value.as_str().expect("not a string").is_empty());
        let err = matcher
            .normalize(Equality::Identity)
            .is_expected_value(&Value::Null)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Parameter matcher [Function] panicked while checking null: not a string"
        );
    }

    #[test]
    fn converting_tuples() {
        let params = ("x", to_be(1), Value::Null, Some(2_u8)).into_parameters();
        assert_eq!(params.len(), 4);
        assert!(matches!(&params[0], ParameterMatcher::Literal(Value::String(s)) if s == "x"));
        assert!(matches!(&params[1], ParameterMatcher::Structural(_)));
        assert!(matches!(&params[2], ParameterMatcher::Literal(Value::Null)));
        assert!(matches!(&params[3], ParameterMatcher::Literal(Value::Number(_))));

        assert!(().into_parameters().is_empty());
        assert_eq!([1, 2, 3].into_parameters().len(), 3);
    }
}
