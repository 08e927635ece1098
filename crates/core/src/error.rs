//! Core error types for Hookwire

#[derive(thiserror::Error, Debug)]
pub enum HookwireError {
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// A decode consumed a different number of bytes than the frame carried.
    #[error("Framing error: payload is {expected} bytes but decode consumed {consumed}")]
    Framing { expected: usize, consumed: usize },

    #[error("Index out of range: {index} (expected: 0 to {})", last_index(.count))]
    IndexOutOfRange { index: i64, count: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

fn last_index(count: &usize) -> usize {
    count.saturating_sub(1)
}

pub type Result<T> = std::result::Result<T, HookwireError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_error_message() {
        let err = HookwireError::IndexOutOfRange { index: -1, count: 255 };
        assert_eq!(err.to_string(), "Index out of range: -1 (expected: 0 to 254)");
    }

    #[test]
    fn test_framing_error_message() {
        let err = HookwireError::Framing { expected: 5, consumed: 3 };
        assert!(err.to_string().contains("5 bytes"));
    }
}
