//! Capability trait for awaitable values.

use std::any::Any;

/// A value that exposes a `then`-like interface.
///
/// Promise engines implement this for their promise handle so that a
/// promise can travel inside a [`Value`](crate::Value). Consumers detect
/// awaitables through [`Value::is_thenable`](crate::Value::is_thenable)
/// and recover the concrete type through [`Thenable::as_any`].
pub trait Thenable {
    /// Returns `self` as `Any` for downcasting to the concrete handle type.
    fn as_any(&self) -> &dyn Any;

    /// Short human-readable description used by `Debug` and `Display`.
    fn describe(&self) -> String;
}
