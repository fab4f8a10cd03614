//! Dynamic value representation.
//!
//! This module provides the `Value` enum carried through promise chains as
//! resolution values, rejection reasons and progress updates.

use crate::{Failure, Thenable};
use std::fmt;
use std::rc::Rc;

/// Represents any value a promise can settle with.
///
/// Scalars are stored inline. Thenables (promises and anything else that
/// exposes a `then`-like interface) are shared by reference, so a value
/// holding one is neither `Send` nor `Sync`; promise state never leaves the
/// loop thread.
///
/// # Examples
///
/// ```
/// use core_types::Value;
///
/// let nil = Value::Nil;
/// let number = Value::Integer(42);
/// let tag = Value::symbol("foo");
///
/// assert!(!nil.is_truthy());
/// assert!(number.is_truthy());
/// assert_eq!(tag.type_name(), "symbol");
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// The absence of a value
    #[default]
    Nil,
    /// Boolean (true or false)
    Boolean(bool),
    /// Signed 64-bit integer
    Integer(i64),
    /// IEEE 754 double-precision floating point
    Float(f64),
    /// UTF-8 string
    String(std::string::String),
    /// Interned-style tag such as `:foo`
    Symbol(std::string::String),
    /// Ordered collection, e.g. the result of `all`
    List(Vec<Value>),
    /// Structured failure raised by a continuation or background job
    Error(Failure),
    /// Awaitable value exposing a `then`-like interface
    Thenable(Rc<dyn Thenable>),
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "Nil"),
            Value::Boolean(b) => f.debug_tuple("Boolean").field(b).finish(),
            Value::Integer(n) => f.debug_tuple("Integer").field(n).finish(),
            Value::Float(n) => f.debug_tuple("Float").field(n).finish(),
            Value::String(s) => f.debug_tuple("String").field(s).finish(),
            Value::Symbol(s) => write!(f, ":{}", s),
            Value::List(items) => f.debug_list().entries(items).finish(),
            Value::Error(failure) => f.debug_tuple("Error").field(failure).finish(),
            Value::Thenable(t) => write!(f, "Thenable({})", t.describe()),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Error(a), Value::Error(b)) => a == b,
            // Thenables compare by identity
            (Value::Thenable(a), Value::Thenable(b)) => {
                std::ptr::eq(
                    Rc::as_ptr(a) as *const (),
                    Rc::as_ptr(b) as *const (),
                )
            }
            _ => false,
        }
    }
}

impl Value {
    /// Creates a symbol value.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::symbol("foo"), Value::Symbol("foo".to_string()));
    /// ```
    pub fn symbol(name: impl Into<std::string::String>) -> Self {
        Value::Symbol(name.into())
    }

    /// Creates an error value carrying a raised failure with `message`.
    pub fn error(message: impl Into<std::string::String>) -> Self {
        Value::Error(Failure::raised(message))
    }

    /// Returns whether this value is truthy.
    ///
    /// `Nil` and `false` are falsy; everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Boolean(false))
    }

    /// Returns true if this value exposes a `then`-like interface.
    ///
    /// This is the capability check used to refuse awaitables as rejection
    /// reasons.
    pub fn is_thenable(&self) -> bool {
        matches!(self, Value::Thenable(_))
    }

    /// Borrows the thenable inside this value, if any.
    pub fn as_thenable(&self) -> Option<&Rc<dyn Thenable>> {
        match self {
            Value::Thenable(t) => Some(t),
            _ => None,
        }
    }

    /// Borrows the failure inside this value, if any.
    pub fn as_failure(&self) -> Option<&Failure> {
        match self {
            Value::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Borrows the items of a list value, if any.
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns a short name for the kind of value.
    ///
    /// ```
    /// use core_types::Value;
    ///
    /// assert_eq!(Value::Nil.type_name(), "nil");
    /// assert_eq!(Value::Integer(1).type_name(), "integer");
    /// assert_eq!(Value::List(vec![]).type_name(), "list");
    /// ```
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
            Value::Error(_) => "error",
            Value::Thenable(_) => "thenable",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(n) => write!(f, "{}", n),
            Value::Float(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Symbol(s) => write!(f, ":{}", s),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
            Value::Error(failure) => write!(f, "{}", failure),
            Value::Thenable(t) => write!(f, "#<{}>", t.describe()),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Integer(i64::from(n))
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<std::string::String> for Value {
    fn from(s: std::string::String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Failure> for Value {
    fn from(failure: Failure) -> Self {
        Value::Error(failure)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Nil
    }
}
