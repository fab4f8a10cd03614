//! Core value and failure types.
//!
//! This crate provides the foundational types shared by the reactor and the
//! promise engine: the dynamic value carried through promise chains and the
//! structured failures used as rejection reasons.
//!
//! # Overview
//!
//! - [`Value`] - Tagged representation of resolution values and reasons
//! - [`Failure`] - Structured failure with a [`FailureKind`]
//! - [`Thenable`] - Capability trait implemented by awaitable values
//!
//! # Examples
//!
//! ```
//! use core_types::{Failure, FailureKind, Value};
//!
//! let value = Value::symbol("foo");
//! assert!(value.is_truthy());
//! assert!(!value.is_thenable());
//!
//! let reason: Value = Failure::raised("boom").into();
//! assert_eq!(reason.as_failure().map(|f| f.kind), Some(FailureKind::Raised));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

mod error;
mod thenable;
mod value;

pub use error::{Failure, FailureKind};
pub use thenable::Thenable;
pub use value::Value;
