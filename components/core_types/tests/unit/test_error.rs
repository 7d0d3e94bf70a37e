//! Unit tests for JsError and ErrorKind

use core_types::{ErrorKind, JsError, Value};

#[cfg(test)]
mod error_kind_tests {
    use super::*;

    #[test]
    fn test_error_kind_display_names() {
        assert_eq!(ErrorKind::TypeError.to_string(), "TypeError");
        assert_eq!(ErrorKind::RangeError.to_string(), "RangeError");
    }
}

#[cfg(test)]
mod js_error_tests {
    use super::*;

    #[test]
    fn test_self_resolution_is_type_error() {
        let err = JsError::self_resolution();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.is_self_resolution());
    }

    #[test]
    fn test_thenable_cycle_is_type_error() {
        let err = JsError::thenable_cycle();
        assert_eq!(err.kind, ErrorKind::TypeError);
        assert!(err.is_thenable_cycle());
        assert!(!err.is_self_resolution());
    }

    #[test]
    fn test_adoption_limit_mentions_limit() {
        let err = JsError::adoption_limit(64);
        assert_eq!(err.kind, ErrorKind::RangeError);
        assert!(err.message.contains("64"));
    }

    #[test]
    fn test_js_error_is_std_error() {
        fn takes_error(_: &dyn std::error::Error) {}
        takes_error(&JsError::type_error("x"));
    }

    #[test]
    fn test_error_converts_into_value() {
        let value: Value = JsError::new(ErrorKind::RangeError, "plain").into();
        let err = value.as_error().unwrap();
        assert_eq!(err.message, "plain");
        assert_eq!(err.kind, ErrorKind::RangeError);
    }
}
