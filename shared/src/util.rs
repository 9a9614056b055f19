/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Minutes expressed in milliseconds
pub const fn minutes_millis(minutes: i64) -> i64 {
    minutes * 60 * 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minutes_millis() {
        assert_eq!(minutes_millis(15), 900_000);
        assert!(now_millis() > 1_700_000_000_000);
    }
}
