//! Unified error codes
//!
//! Error codes are shared by the server, kitchen displays and cashier clients.
//! They are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 4xxx: Order errors
//! - 5xxx: Payment errors
//! - 6xxx: Catalog errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,

    // ==================== 1xxx: Auth ====================
    /// Caller identity missing or malformed
    NotAuthenticated = 1001,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has already been paid
    OrderAlreadyPaid = 4002,
    /// Operation not allowed in the order's current status
    OrderInvalidState = 4008,
    /// Requested status is not a valid successor of the current one
    OrderInvalidTransition = 4009,

    // ==================== 5xxx: Payment ====================
    /// Insufficient payment amount
    PaymentInsufficientAmount = 5002,
    /// Payment not found
    PaymentNotFound = 5006,
    /// Reported amount differs from the recorded payment
    PaymentAmountMismatch = 5007,
    /// Operation not allowed in the payment's current status
    PaymentInvalidState = 5008,
    /// Payment recorded but the linked order was not advanced
    PaymentOrderNotAdvanced = 5009,

    // ==================== 6xxx: Catalog ====================
    /// Menu item not found in the catalog
    ProductNotFound = 6001,
    /// Menu item is currently unavailable
    ProductUnavailable = 6003,
    /// Catalog service unreachable
    CatalogUnavailable = 6010,

    // ==================== 9xxx: System ====================
    /// Database error
    DatabaseError = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",

            // Auth
            ErrorCode::NotAuthenticated => "Authentication required",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Required role is missing",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderAlreadyPaid => "Order has already been paid",
            ErrorCode::OrderInvalidState => "Operation not allowed in current order status",
            ErrorCode::OrderInvalidTransition => "Invalid order status transition",

            // Payment
            ErrorCode::PaymentInsufficientAmount => "Insufficient payment amount",
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::PaymentAmountMismatch => "Payment amount mismatch",
            ErrorCode::PaymentInvalidState => "Operation not allowed in current payment status",
            ErrorCode::PaymentOrderNotAdvanced => {
                "Payment recorded but order status was not advanced"
            }

            // Catalog
            ErrorCode::ProductNotFound => "Menu item not found",
            ErrorCode::ProductUnavailable => "Menu item is unavailable",
            ErrorCode::CatalogUnavailable => "Catalog service unavailable",

            // System
            ErrorCode::DatabaseError => "Database error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderAlreadyPaid),
            4008 => Ok(ErrorCode::OrderInvalidState),
            4009 => Ok(ErrorCode::OrderInvalidTransition),

            // Payment
            5002 => Ok(ErrorCode::PaymentInsufficientAmount),
            5006 => Ok(ErrorCode::PaymentNotFound),
            5007 => Ok(ErrorCode::PaymentAmountMismatch),
            5008 => Ok(ErrorCode::PaymentInvalidState),
            5009 => Ok(ErrorCode::PaymentOrderNotAdvanced),

            // Catalog
            6001 => Ok(ErrorCode::ProductNotFound),
            6003 => Ok(ErrorCode::ProductUnavailable),
            6010 => Ok(ErrorCode::CatalogUnavailable),

            // System
            9002 => Ok(ErrorCode::DatabaseError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: &[ErrorCode] = &[
        ErrorCode::ValidationFailed,
        ErrorCode::NotAuthenticated,
        ErrorCode::PermissionDenied,
        ErrorCode::RoleRequired,
        ErrorCode::OrderNotFound,
        ErrorCode::OrderAlreadyPaid,
        ErrorCode::OrderInvalidState,
        ErrorCode::OrderInvalidTransition,
        ErrorCode::PaymentInsufficientAmount,
        ErrorCode::PaymentNotFound,
        ErrorCode::PaymentAmountMismatch,
        ErrorCode::PaymentInvalidState,
        ErrorCode::PaymentOrderNotAdvanced,
        ErrorCode::ProductNotFound,
        ErrorCode::ProductUnavailable,
        ErrorCode::CatalogUnavailable,
        ErrorCode::DatabaseError,
    ];

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::NotAuthenticated.code(), 1001);
        assert_eq!(ErrorCode::OrderInvalidTransition.code(), 4009);
        assert_eq!(ErrorCode::PaymentAmountMismatch.code(), 5007);
        assert_eq!(ErrorCode::CatalogUnavailable.code(), 6010);
        assert_eq!(ErrorCode::DatabaseError.code(), 9002);
    }

    #[test]
    fn test_every_code_converts_back() {
        for code in ALL {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(*code));
        }
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(4242), Err(InvalidErrorCode(4242)));
        assert_eq!(
            InvalidErrorCode(4242).to_string(),
            "invalid error code: 4242"
        );
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::OrderAlreadyPaid).unwrap();
        assert_eq!(json, "4002");

        let code: ErrorCode = serde_json::from_str("5009").unwrap();
        assert_eq!(code, ErrorCode::PaymentOrderNotAdvanced);

        assert!(serde_json::from_str::<ErrorCode>("4242").is_err());
    }

    #[test]
    fn test_message_and_display() {
        assert_eq!(ErrorCode::PaymentNotFound.message(), "Payment not found");
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
    }
}
