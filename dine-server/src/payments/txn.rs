//! Transaction ids and provider payloads

use rand::RngCore;
use rust_decimal::Decimal;

/// Prefix of refund transaction ids
pub const REFUND_PREFIX: &str = "REFUND-";

/// `RD<unix seconds><16 hex chars>`
pub fn generate_transaction_id() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!("RD{}{}", chrono::Utc::now().timestamp(), hex::encode(bytes))
}

/// Opaque scan-to-pay payload handed to the customer's device
pub fn qr_payload(merchant_id: &str, amount: Decimal, transaction_id: &str, callback_url: &str) -> String {
    format!(
        "QRIS:{}:{:.2}:{}:{}",
        merchant_id, amount, transaction_id, callback_url
    )
}

/// `REFUND-<orig>` for the first refund, `REFUND-<orig>-<n>` afterwards
pub fn refund_transaction_id(original: &str, sequence: usize) -> String {
    if sequence <= 1 {
        format!("{REFUND_PREFIX}{original}")
    } else {
        format!("{REFUND_PREFIX}{original}-{sequence}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_id_shape() {
        let id = generate_transaction_id();
        assert!(id.starts_with("RD"));
        // 10-digit seconds + 16 hex chars
        assert_eq!(id.len(), 2 + 10 + 16);
        assert!(id[2..].chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(id, generate_transaction_id());
    }

    #[test]
    fn test_qr_payload() {
        assert_eq!(
            qr_payload("RECURSIVE_DINE", Decimal::new(275, 1), "RD1", "http://cb"),
            "QRIS:RECURSIVE_DINE:27.50:RD1:http://cb"
        );
    }

    #[test]
    fn test_refund_ids_stay_unique() {
        assert_eq!(refund_transaction_id("RD1", 1), "REFUND-RD1");
        assert_eq!(refund_transaction_id("RD1", 2), "REFUND-RD1-2");
        assert_eq!(refund_transaction_id("RD1", 3), "REFUND-RD1-3");
    }
}
