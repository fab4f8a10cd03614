//! Unit tests for Failure and FailureKind

use core_types::{Failure, FailureKind, Value};

#[cfg(test)]
mod failure_kind_tests {
    use super::*;

    #[test]
    fn test_failure_kind_display_matches_as_str() {
        for kind in [
            FailureKind::Raised,
            FailureKind::Panic,
            FailureKind::Work,
            FailureKind::Usage,
        ] {
            assert_eq!(kind.to_string(), kind.as_str());
        }
    }

    #[test]
    fn test_failure_kind_is_copy() {
        let kind = FailureKind::Usage;
        let copy = kind;
        assert_eq!(kind, copy);
    }
}

#[cfg(test)]
mod failure_tests {
    use super::*;

    #[test]
    fn test_constructors_set_kind() {
        assert_eq!(Failure::raised("a").kind, FailureKind::Raised);
        assert_eq!(Failure::panic("b").kind, FailureKind::Panic);
        assert_eq!(Failure::work("c").kind, FailureKind::Work);
        assert_eq!(Failure::usage("d").kind, FailureKind::Usage);
    }

    #[test]
    fn test_failure_is_std_error() {
        fn assert_error<E: std::error::Error>(_: &E) {}
        let failure = Failure::work("disk full");
        assert_error(&failure);
        assert_eq!(failure.to_string(), "work: disk full");
    }

    #[test]
    fn test_failure_clone_equality() {
        let failure = Failure::raised("baz");
        assert_eq!(failure.clone(), failure);
        assert_ne!(failure, Failure::panic("baz"));
    }

    #[test]
    fn test_failure_into_value() {
        let value: Value = Failure::raised("bob").into();
        assert!(matches!(value, Value::Error(ref f) if f.message == "bob"));
    }
}
