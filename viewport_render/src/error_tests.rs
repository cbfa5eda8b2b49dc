//! Unit tests for error.rs
//!
//! Tests Error and DrawRequestError display, conversion and propagation.

use crate::error::{DrawRequestError, Error, Result};

// ============================================================================
// ERROR DISPLAY TESTS
// ============================================================================

#[test]
fn test_invalid_state_display() {
    let err = Error::InvalidState("draw before update".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Invalid state"));
    assert!(display.contains("draw before update"));
}

#[test]
fn test_invalid_request_display() {
    let err = Error::InvalidRequest(DrawRequestError::NotProcessed);
    assert_eq!(format!("{}", err), "Invalid draw request: not processed");
}

#[test]
fn test_backend_error_display() {
    let err = Error::BackendError("upload of 'sphere' failed".to_string());
    let display = format!("{}", err);
    assert!(display.contains("Backend error"));
    assert!(display.contains("sphere"));
}

#[test]
fn test_invalid_resource_display() {
    let err = Error::InvalidResource("unknown cache name".to_string());
    assert!(format!("{}", err).starts_with("Invalid resource"));
}

// ============================================================================
// DRAW REQUEST CODES
// ============================================================================

#[test]
fn test_draw_request_error_names_are_distinct() {
    let codes = [
        DrawRequestError::NoSuchId,
        DrawRequestError::NotProcessed,
        DrawRequestError::NotInPass,
        DrawRequestError::AlreadyProcessed,
        DrawRequestError::MismatchedInstanceData,
    ];
    for (i, a) in codes.iter().enumerate() {
        for b in &codes[i + 1..] {
            assert_ne!(a.as_str(), b.as_str());
        }
    }
}

#[test]
fn test_draw_request_error_converts_into_error() {
    let err: Error = DrawRequestError::NoSuchId.into();
    match err {
        Error::InvalidRequest(code) => assert_eq!(code, DrawRequestError::NoSuchId),
        other => panic!("unexpected variant: {:?}", other),
    }
}

#[test]
fn test_error_is_std_error() {
    let err = Error::InvalidState("x".to_string());
    let _: &dyn std::error::Error = &err;
    let _: &dyn std::error::Error = &DrawRequestError::NotInPass;
}

// ============================================================================
// ERROR PROPAGATION TESTS
// ============================================================================

#[test]
fn test_question_mark_converts_draw_request_error() {
    fn lookup() -> std::result::Result<u32, DrawRequestError> {
        Err(DrawRequestError::NotProcessed)
    }

    fn outer() -> Result<u32> {
        let value = lookup()?;
        Ok(value + 1)
    }

    match outer() {
        Err(Error::InvalidRequest(DrawRequestError::NotProcessed)) => {}
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
fn test_error_clone_keeps_message() {
    let err1 = Error::BackendError("device lost".to_string());
    let err2 = err1.clone();
    assert_eq!(format!("{}", err1), format!("{}", err2));
}
