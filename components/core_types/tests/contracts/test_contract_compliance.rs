//! Contract compliance tests for core_types
//!
//! These tests pin the public surface other components rely on.

use core_types::{Failure, FailureKind, Thenable, Value};

#[cfg(test)]
mod value_contract_tests {
    use super::*;

    #[test]
    fn test_value_has_scalar_variants() {
        let _: Value = Value::Nil;
        let _: Value = Value::Boolean(true);
        let _: Value = Value::Integer(i64::MAX);
        let _: Value = Value::Float(0.0);
        let _: Value = Value::String(String::new());
        let _: Value = Value::Symbol(String::new());
    }

    #[test]
    fn test_value_has_composite_variants() {
        let _: Value = Value::List(Vec::new());
        let _: Value = Value::Error(Failure::raised("x"));
    }

    #[test]
    fn test_value_is_clone() {
        let value = Value::List(vec![Value::symbol("a")]);
        assert_eq!(value.clone(), value);
    }

    #[test]
    fn test_is_thenable_returns_bool() {
        let _: bool = Value::Nil.is_thenable();
    }
}

#[cfg(test)]
mod failure_contract_tests {
    use super::*;

    #[test]
    fn test_failure_fields_are_public() {
        let failure = Failure {
            kind: FailureKind::Work,
            message: "x".to_string(),
        };
        assert_eq!(failure.kind, FailureKind::Work);
        assert_eq!(failure.message, "x");
    }

    #[test]
    fn test_thenable_is_object_safe() {
        fn takes(_: Option<&dyn Thenable>) {}
        takes(None);
    }
}
