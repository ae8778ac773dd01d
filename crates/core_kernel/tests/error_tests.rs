//! Tests for core_kernel error types

use core_kernel::error::CoreError;
use core_kernel::ports::PortError;

#[test]
fn test_core_error_validation() {
    let error = CoreError::validation("Invalid input");

    match error {
        CoreError::Validation(msg) => assert_eq!(msg, "Invalid input"),
        _ => panic!("Expected Validation error"),
    }
}

#[test]
fn test_core_error_invalid_identifier() {
    let error = CoreError::invalid_identifier("CNT-abc");

    match error {
        CoreError::InvalidIdentifier(msg) => assert!(msg.contains("CNT-abc")),
        _ => panic!("Expected InvalidIdentifier error"),
    }
}

#[test]
fn test_core_error_not_found() {
    let error = CoreError::not_found("Deal not found");

    match error {
        CoreError::NotFound(msg) => assert_eq!(msg, "Deal not found"),
        _ => panic!("Expected NotFound error"),
    }
}

#[test]
fn test_core_error_display() {
    let error = CoreError::validation("Test error");
    let display = format!("{}", error);

    assert!(display.contains("Validation error"));
}

#[test]
fn test_port_error_connection_is_transient() {
    let error = PortError::connection("connection refused");
    assert!(error.is_transient());
    assert!(error.to_string().contains("connection refused"));
}

#[test]
fn test_port_error_transformation_display() {
    let error = PortError::transformation("missing field `Id`");
    assert!(!error.is_transient());
    assert!(error.to_string().starts_with("Transformation error"));
}
