//! Dynamic values passed to and returned from fake members.

use serde::Serialize;

use core::fmt;
use std::{borrow::Cow, sync::Arc};

use crate::error::ConversionError;

/// Dynamically typed value recorded in call ledgers and exchanged with fake members.
///
/// Primitive variants compare by value. Composite variants ([`Array`](Self::Array),
/// [`Object`](Self::Object), [`Function`](Self::Function)) are reference-counted:
/// cloning a value preserves its *identity*, while building a new composite value
/// (even with the same contents) produces a distinct identity. This distinction
/// is what separates [`Value::is_identical()`] from [`Value::deep_equals()`].
///
/// The [`Display`](fmt::Display) implementation renders the value the way
/// it appears in verification failure messages.
///
/// # Examples
///
/// ```
/// # use decoy::Value;
/// let point = Value::object([("x", 1), ("y", 2)]);
/// let same_point = point.clone();
/// let other_point = Value::object([("y", 2), ("x", 1)]);
///
/// assert!(point.is_identical(&same_point));
/// assert!(!point.is_identical(&other_point));
/// assert!(point.deep_equals(&other_point));
/// assert_eq!(point.to_string(), r#"{"x": 1, "y": 2}"#);
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// Absent value. Returned by members without an implementation.
    #[default]
    Undefined,
    /// Explicitly empty value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Number. All numeric types are converted to `f64`.
    Number(f64),
    /// String.
    String(String),
    /// Ordered list of values.
    Array(Arc<Vec<Value>>),
    /// Object with string keys; keys are unique and keep insertion order.
    Object(Arc<Vec<(String, Value)>>),
    /// Function value.
    Function(Func),
}

impl fmt::Debug for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, formatter)
    }
}

impl Value {
    /// Creates an array value.
    pub fn array<T: Into<Value>>(items: impl IntoIterator<Item = T>) -> Self {
        Self::Array(Arc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Creates an object value. If a key is repeated, the last value wins, and the key
    /// keeps the position of its first occurrence.
    pub fn object<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut fields: Vec<(String, Value)> = Vec::new();
        for (key, value) in entries {
            let key = key.into();
            let value = value.into();
            if let Some(field) = fields.iter_mut().find(|(existing, _)| *existing == key) {
                field.1 = value;
            } else {
                fields.push((key, value));
            }
        }
        Self::Object(Arc::new(fields))
    }

    /// Converts a serializable value using its JSON data model.
    ///
    /// # Errors
    ///
    /// Propagates serialization errors, e.g., for maps with non-string keys.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Self::from)
    }

    /// Checks whether this value is [`Undefined`](Self::Undefined).
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// Checks whether this value is [`Null`](Self::Null).
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the number, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the string slice, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns array items, if this is an array.
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the function, if this is a function.
    pub fn as_function(&self) -> Option<&Func> {
        match self {
            Self::Function(function) => Some(function),
            _ => None,
        }
    }

    /// Gets an object field by key. Returns `None` for non-objects and missing keys.
    pub fn field(&self, key: &str) -> Option<&Value> {
        match self {
            Self::Object(fields) => fields
                .iter()
                .find_map(|(name, value)| (name == key).then_some(value)),
            _ => None,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Function(_) => "function",
        }
    }

    /// Strict equality. Primitives compare by value with IEEE semantics for numbers
    /// (`NaN` is not identical to itself, `0` is identical to `-0`); composite values
    /// compare by identity.
    pub fn is_identical(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(x), Self::Bool(y)) => x == y,
            #[allow(clippy::float_cmp)]
            (Self::Number(x), Self::Number(y)) => x == y,
            (Self::String(x), Self::String(y)) => x == y,
            (Self::Array(x), Self::Array(y)) => Arc::ptr_eq(x, y),
            (Self::Object(x), Self::Object(y)) => Arc::ptr_eq(x, y),
            (Self::Function(x), Self::Function(y)) => x.ptr_eq(y),
            _ => false,
        }
    }

    /// Structural equality. Arrays are compared item-wise, objects key-wise regardless
    /// of key order. `NaN` is equal to itself. Functions are compared by identity.
    pub fn deep_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Number(x), Self::Number(y)) => (x.is_nan() && y.is_nan()) || x == y,
            (Self::Array(x), Self::Array(y)) => {
                Arc::ptr_eq(x, y)
                    || (x.len() == y.len() && x.iter().zip(y.iter()).all(|(x, y)| x.deep_equals(y)))
            }
            (Self::Object(x), Self::Object(y)) => {
                Arc::ptr_eq(x, y)
                    || (x.len() == y.len()
                        && x.iter().all(|(key, value)| {
                            y.iter().any(|(other_key, other)| {
                                key == other_key && value.deep_equals(other)
                            })
                        }))
            }
            _ => self.is_identical(other),
        }
    }
}

/// Deep equality, see [`Value::deep_equals()`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.deep_equals(other)
    }
}

fn fmt_number(value: f64, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    if value.is_nan() {
        formatter.write_str("NaN")
    } else if value.is_infinite() {
        formatter.write_str(if value > 0.0 { "Infinity" } else { "-Infinity" })
    } else if value == 0.0 {
        formatter.write_str("0")
    } else if value.abs() >= 1e21 || value.abs() < 1e-6 {
        let exp = format!("{value:e}");
        match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                write!(formatter, "{mantissa}e+{power}")
            }
            _ => formatter.write_str(&exp),
        }
    } else {
        write!(formatter, "{value}")
    }
}

fn fmt_string(value: &str, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
    match serde_json::to_string(value) {
        Ok(quoted) => formatter.write_str(&quoted),
        Err(_) => write!(formatter, "{value:?}"),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => formatter.write_str("undefined"),
            Self::Null => formatter.write_str("null"),
            Self::Bool(value) => write!(formatter, "{value}"),
            Self::Number(value) => fmt_number(*value, formatter),
            Self::String(value) => fmt_string(value, formatter),
            Self::Array(items) => {
                formatter.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    fmt::Display::fmt(item, formatter)?;
                }
                formatter.write_str("]")
            }
            Self::Object(fields) => {
                formatter.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        formatter.write_str(", ")?;
                    }
                    fmt_string(key, formatter)?;
                    formatter.write_str(": ")?;
                    fmt::Display::fmt(value, formatter)?;
                }
                formatter.write_str("}")
            }
            Self::Function(function) => fmt::Display::fmt(function, formatter),
        }
    }
}

type FuncBody = dyn Fn(&[Value]) -> Value + Send + Sync;

/// Function value.
///
/// A function may carry a declared signature, which is used when the function is rendered
/// in diagnostics: `function(a, b, ...rest)`. Functions without a signature
/// are rendered as `[Function]`.
///
/// # Examples
///
/// ```
/// # use decoy::{Func, Value};
/// let add = Func::with_signature("|x: f64, y: f64| x + y", |args| {
///     let sum: f64 = args.iter().filter_map(Value::as_f64).sum();
///     Value::from(sum)
/// });
/// assert_eq!(add.to_string(), "function(x, y)");
/// assert_eq!(add.call(&[Value::from(1), Value::from(2)]), Value::from(3));
///
/// let callback = Func::with_signature("(err, data = {}, ...rest) => {}", |_| Value::Undefined);
/// assert_eq!(callback.to_string(), "function(err, data, ...rest)");
/// ```
#[derive(Clone)]
pub struct Func {
    inner: Arc<FuncInner>,
}

struct FuncInner {
    signature: Option<String>,
    body: Box<FuncBody>,
}

impl fmt::Debug for Func {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Func")
            .field("signature", &self.inner.signature)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Func {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.inner.signature {
            Some(signature) => formatter.write_str(signature),
            None => formatter.write_str("[Function]"),
        }
    }
}

impl Func {
    /// Creates a function without a known signature.
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(FuncInner {
                signature: None,
                body: Box::new(body),
            }),
        }
    }

    /// Creates a function with the signature extracted from `source`. The source may be
    /// a parameter list (`(a, b)`), a closure head or the full closure / function text
    /// (`|a, b| a + b`, `function name(a, b = 1) { .. }`, `x => x * 2`). Parameter defaults,
    /// type annotations and bodies are stripped. If the parameters cannot be extracted,
    /// the function is rendered as `[Function]`.
    pub fn with_signature<F>(source: &str, body: F) -> Self
    where
        F: Fn(&[Value]) -> Value + Send + Sync + 'static,
    {
        let signature =
            parse_parameters(source).map(|params| format!("function({})", params.join(", ")));
        Self {
            inner: Arc::new(FuncInner {
                signature,
                body: Box::new(body),
            }),
        }
    }

    /// Returns the rendered signature, if known.
    pub fn signature(&self) -> Option<&str> {
        self.inner.signature.as_deref()
    }

    /// Calls this function.
    pub fn call(&self, args: &[Value]) -> Value {
        (self.inner.body)(args)
    }

    /// Checks whether two handles refer to the same function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .map_or(false, |ch| ch.is_alphabetic() || ch == '_' || ch == '$')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}

/// Scans `s` and returns byte positions of chars for which `predicate` holds
/// and which are not nested in brackets or string literals.
fn top_level_positions(s: &str, mut predicate: impl FnMut(usize, char) -> bool) -> Vec<usize> {
    let bytes = s.as_bytes();
    let mut positions = vec![];
    let mut depth = 0_usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (pos, ch) in s.char_indices() {
        if let Some(quote_char) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote_char {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '`' => quote = Some(ch),
            '\'' => {
                let char_literal =
                    bytes.get(pos + 2) == Some(&b'\'') || bytes.get(pos + 1) == Some(&b'\\');
                if char_literal || !is_lifetime(s, pos) {
                    quote = Some(ch);
                }
            }
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' if depth > 0 => depth -= 1,
            _ if depth == 0 && predicate(pos, ch) => positions.push(pos),
            _ => { /* do nothing */ }
        }
    }
    positions
}

/// Checks whether the `'` at `pos` starts a lifetime (`&'a`, `Ref<'a>`, `+ 'static`)
/// rather than a single-quoted string.
fn is_lifetime(s: &str, pos: usize) -> bool {
    let rest = &s[pos + 1..];
    let ident_len = rest
        .find(|ch: char| !ch.is_alphanumeric() && ch != '_')
        .unwrap_or(rest.len());
    let starts_ident = rest.starts_with(|ch: char| ch.is_alphabetic() || ch == '_');
    if !starts_ident || rest[ident_len..].starts_with('\'') {
        return false;
    }

    let head = &s[..pos];
    match head.trim_end().chars().last() {
        Some('&') => true,
        Some('<' | ',' | '+') => head.contains('<'),
        _ => false,
    }
}

/// Returns the contents between the opening delimiter at `open` and its closing counterpart.
fn enclosed(s: &str, open: usize) -> Option<&str> {
    let closing = if s[open..].starts_with('|') { '|' } else { ')' };
    let inner = &s[open + 1..];
    let close = *top_level_positions(inner, |_, ch| ch == closing).first()?;
    Some(&inner[..close])
}

fn clean_parameter(param: &str) -> Option<String> {
    let param = param.trim();
    let param = param.strip_prefix("mut ").unwrap_or(param).trim();
    if param.is_empty() {
        return None;
    }
    let bytes = param.as_bytes();
    let cut = top_level_positions(param, |pos, ch| {
        ch == ':' || (ch == '=' && !matches!(bytes.get(pos + 1), Some(b'>' | b'=')))
    });
    let param = match cut.first() {
        Some(&pos) => param[..pos].trim_end(),
        None => param,
    };
    Some(param.to_owned())
}

fn parse_parameters(source: &str) -> Option<Vec<String>> {
    let source = source.trim();
    let source = source.strip_prefix("async ").unwrap_or(source).trim_start();
    let source = source.strip_prefix("move ").unwrap_or(source).trim_start();
    if source.starts_with("||") {
        return Some(vec![]);
    }

    let open = source.find(|ch| ch == '(' || ch == '|');
    let arrow = source.find("=>");
    if let Some(arrow) = arrow {
        if open.map_or(true, |open| arrow < open) {
            // Single-param arrow function: `x => ..`
            let head = source[..arrow].trim();
            return is_identifier(head).then(|| vec![head.to_owned()]);
        }
    }

    let list = enclosed(source, open?)?;
    let mut params = vec![];
    let mut start = 0;
    for pos in top_level_positions(list, |_, ch| ch == ',') {
        params.push(&list[start..pos]);
        start = pos + 1;
    }
    params.push(&list[start..]);
    Some(params.into_iter().filter_map(clean_parameter).collect())
}

macro_rules! impl_from_number {
    ($($ty:ty),+) => {
        $(
        impl From<$ty> for Value {
            #[allow(clippy::cast_precision_loss, clippy::cast_lossless)]
            fn from(value: $ty) -> Self {
                Self::Number(value as f64)
            }
        }
        )+
    };
}

impl_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<()> for Value {
    fn from((): ()) -> Self {
        Self::Undefined
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<char> for Value {
    fn from(value: char) -> Self {
        Self::String(value.to_string())
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl From<Cow<'_, str>> for Value {
    fn from(value: Cow<'_, str>) -> Self {
        Self::String(value.into_owned())
    }
}

/// Clones the value, preserving its identity.
impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<Func> for Value {
    fn from(function: Func) -> Self {
        Self::Function(function)
    }
}

/// `None` is converted to [`Value::Null`].
impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Self::array(items)
    }
}

impl<T: Clone + Into<Value>> From<&[T]> for Value {
    fn from(items: &[T]) -> Self {
        Self::array(items.iter().cloned())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(value) => Self::Bool(value),
            serde_json::Value::Number(number) => Self::Number(number.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(value) => Self::String(value),
            serde_json::Value::Array(items) => Self::array(items),
            serde_json::Value::Object(fields) => Self::object(fields),
        }
    }
}

/// Conversion from a [`Value`] returned by a fake member into a Rust type.
///
/// Used by typed fakes generated with [`fake`](crate::fake) to convert return values.
pub trait FromValue: Sized {
    /// Performs the conversion.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has an unexpected type or is out of range.
    fn from_value(value: Value) -> Result<Self, ConversionError>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }
}

/// Accepts any value, discarding it.
impl FromValue for () {
    fn from_value(_: Value) -> Result<Self, ConversionError> {
        Ok(())
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value
            .as_bool()
            .ok_or_else(|| ConversionError::new("boolean", &value))
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::String(value) => Ok(value),
            other => Err(ConversionError::new("string", &other)),
        }
    }
}

impl FromValue for char {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let mut chars = value.as_str().map(str::chars);
        match chars.as_mut().map(|chars| (chars.next(), chars.next())) {
            Some((Some(ch), None)) => Ok(ch),
            _ => Err(ConversionError::new("single-char string", &value)),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        value
            .as_f64()
            .ok_or_else(|| ConversionError::new("number", &value))
    }
}

impl FromValue for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|value| value as f32)
    }
}

macro_rules! impl_from_value_for_int {
    ($($ty:ident),+) => {
        $(
        impl FromValue for $ty {
            #[allow(
                clippy::cast_possible_truncation,
                clippy::cast_precision_loss,
                clippy::cast_sign_loss,
                clippy::cast_lossless
            )]
            fn from_value(value: Value) -> Result<Self, ConversionError> {
                match value {
                    Value::Number(number)
                        if number.fract() == 0.0
                            && number >= $ty::MIN as f64
                            && number < ($ty::MAX / 2 + 1) as f64 * 2.0 =>
                    {
                        Ok(number as $ty)
                    }
                    other => Err(ConversionError::new(stringify!($ty), &other)),
                }
            }
        }
        )+
    };
}

impl_from_value_for_int!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

/// [`Undefined`](Value::Undefined) and [`Null`](Value::Null) are converted to `None`.
impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Undefined | Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Array(items) => items.iter().cloned().map(T::from_value).collect(),
            other => Err(ConversionError::new("array", &other)),
        }
    }
}

impl ConversionError {
    pub(crate) fn new(expected: &'static str, actual: &Value) -> Self {
        let actual = match actual {
            Value::Undefined | Value::Null => actual.to_string(),
            _ => format!("{} {actual}", actual.type_name()),
        };
        Self { expected, actual }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_and_deep_equality() {
        let array = Value::array([1, 2, 3]);
        assert!(array.is_identical(&array.clone()));
        assert!(!array.is_identical(&Value::array([1, 2, 3])));
        assert!(array.deep_equals(&Value::array([1, 2, 3])));
        assert!(!array.deep_equals(&Value::array([3, 2, 1])));

        assert!(Value::from("test").is_identical(&Value::from(String::from("test"))));
        assert!(!Value::Null.is_identical(&Value::Undefined));
        assert!(!Value::Null.deep_equals(&Value::Undefined));
        assert!(Value::from(0.0).is_identical(&Value::from(-0.0)));
    }

    #[test]
    fn nan_equality() {
        let nan = Value::from(f64::NAN);
        assert!(!nan.is_identical(&nan.clone()));
        assert!(nan.deep_equals(&Value::from(f64::NAN)));
        assert_eq!(Value::array([f64::NAN]), Value::array([f64::NAN]));
    }

    #[test]
    fn object_equality_ignores_key_order() {
        let nested = Value::object([("inner", Value::array(["a", "b"]))]);
        let object = Value::object([("a", Value::from(1)), ("b", nested.clone())]);
        let reordered = Value::object([("b", nested), ("a", Value::from(1))]);
        assert!(object.deep_equals(&reordered));
        assert!(!object.is_identical(&reordered));

        let extra = Value::object([("a", 1), ("b", 2), ("c", 3)]);
        assert!(!Value::object([("a", 1), ("b", 2)]).deep_equals(&extra));
    }

    #[test]
    fn object_keys_are_deduplicated() {
        let object = Value::object([("a", 1), ("b", 2), ("a", 3)]);
        assert_eq!(object.to_string(), r#"{"a": 3, "b": 2}"#);
        assert_eq!(object.field("a"), Some(&Value::from(3)));
        assert_eq!(object.field("c"), None);
    }

    #[test]
    fn functions_compare_by_identity() {
        let function = Func::new(|_| Value::Null);
        let value = Value::from(function.clone());
        assert!(value.is_identical(&Value::Function(function)));
        assert!(!value.deep_equals(&Value::from(Func::new(|_| Value::Null))));
    }

    #[test]
    fn rendering_primitives() {
        assert_eq!(Value::Undefined.to_string(), "undefined");
        assert_eq!(Value::Null.to_string(), "null");
        assert_eq!(Value::from(true).to_string(), "true");
        assert_eq!(Value::from(42_u8).to_string(), "42");
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::from(-0.0).to_string(), "0");
        assert_eq!(Value::from(f64::NAN).to_string(), "NaN");
        assert_eq!(Value::from(f64::NEG_INFINITY).to_string(), "-Infinity");
        assert_eq!(Value::from(1e20).to_string(), "100000000000000000000");
        assert_eq!(Value::from(1e21).to_string(), "1e+21");
        assert_eq!(Value::from(-2.5e30).to_string(), "-2.5e+30");
        assert_eq!(Value::from(0.000_001).to_string(), "0.000001");
        assert_eq!(Value::from(1e-7).to_string(), "1e-7");
        assert_eq!(Value::from(1.5e-10).to_string(), "1.5e-10");
        assert_eq!(Value::from("say \"hi\"").to_string(), r#""say \"hi\"""#);
    }

    #[test]
    fn rendering_nested_functions() {
        let handler =
            Func::with_signature("(event, options = { once: true })", |_| Value::Undefined);
        let value = Value::object([
            ("name", Value::from("click")),
            ("handlers", Value::array([Value::from(handler), Func::new(|_| Value::Null).into()])),
        ]);
        assert_eq!(
            value.to_string(),
            r#"{"name": "click", "handlers": [function(event, options), [Function]]}"#
        );
    }

    #[test]
    fn parsing_signatures() {
        let cases: &[(&str, Option<&[&str]>)] = &[
            ("()", Some(&[])),
            ("||", Some(&[])),
            ("move |x| x + 1", Some(&["x"])),
            ("|a: &'a str, (b, c): (u8, u8)| a.len()", Some(&["a", "(b, c)"])),
            ("(a, b = 5, c?, ...rest) => {}", Some(&["a", "b", "c?", "...rest"])),
            ("function named(a, { b, c } = {}) { return a; }", Some(&["a", "{ b, c }"])),
            ("(a: string, b?: number): void", Some(&["a", "b?"])),
            ("(s = \"a, b\", t = ')')", Some(&["s", "t"])),
            ("(s = 'a, b', t) => {}", Some(&["s", "t"])),
            ("function f(s = 'x)', t) {}", Some(&["s", "t"])),
            ("(a = 'it\\'s', b = 'c' + 'd')", Some(&["a", "b"])),
            ("|a: Ref<'a>, b: Box<dyn Fn() + 'static>| a", Some(&["a", "b"])),
            ("x => x * 2", Some(&["x"])),
            ("async (a) => a", Some(&["a"])),
            ("(a, b,)", Some(&["a", "b"])),
            ("nothing to see", None),
            ("(unclosed", None),
        ];
        for &(source, expected) in cases {
            let params = parse_parameters(source);
            let expected = expected.map(|params| {
                params.iter().map(|&s| s.to_owned()).collect::<Vec<_>>()
            });
            assert_eq!(params, expected, "{source}");
        }
    }

    #[test]
    fn converting_from_json() {
        #[derive(Serialize)]
        struct Order {
            id: u32,
            items: Vec<&'static str>,
            note: Option<String>,
        }

        let order = Order {
            id: 5,
            items: vec!["apple", "pear"],
            note: None,
        };
        let value = Value::from_serialize(&order).unwrap();
        let expected = Value::object([
            ("id", Value::from(5)),
            ("items", Value::array(["apple", "pear"])),
            ("note", Value::Null),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn converting_into_rust_types() {
        assert_eq!(u32::from_value(Value::from(42)).unwrap(), 42);
        assert!(u8::from_value(Value::from(256)).is_err());
        assert_eq!(u8::from_value(Value::from(255)).unwrap(), 255);
        assert_eq!(i8::from_value(Value::from(-128)).unwrap(), -128);
        assert!(i8::from_value(Value::from(128)).is_err());
        assert!(u64::from_value(Value::from(18_446_744_073_709_551_616.0)).is_err());
        assert!(i64::from_value(Value::from(9_223_372_036_854_775_808.0)).is_err());
        assert_eq!(
            i64::from_value(Value::from(-9_223_372_036_854_775_808.0)).unwrap(),
            i64::MIN
        );
        assert_eq!(u64::from_value(Value::from(1_u64 << 53)).unwrap(), 1 << 53);
        assert!(i32::from_value(Value::from(1.5)).is_err());
        assert_eq!(String::from_value("test".into()).unwrap(), "test");
        assert_eq!(char::from_value("x".into()).unwrap(), 'x');
        assert!(char::from_value("xy".into()).is_err());
        assert_eq!(Option::<bool>::from_value(Value::Undefined).unwrap(), None);
        assert_eq!(Option::<bool>::from_value(true.into()).unwrap(), Some(true));
        assert_eq!(Vec::<u8>::from_value(Value::array([1, 2])).unwrap(), [1, 2]);

        let err = bool::from_value(Value::from("true")).unwrap_err();
        assert_eq!(err.to_string(), r#"cannot convert string "true" into boolean"#);
        let err = u16::from_value(Value::Undefined).unwrap_err();
        assert_eq!(err.to_string(), "cannot convert undefined into u16");
    }
}
