//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// True when the string parses as a UUID
pub fn is_uuid(s: &str) -> bool {
    Uuid::parse_str(s.trim()).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_uuid() {
        assert!(is_uuid("93de5cc5-9437-4ca7-95f3-3b2f31b24093"));
        assert!(is_uuid("  93de5cc5-9437-4ca7-95f3-3b2f31b24093 "));
        assert!(!is_uuid("24"));
        assert!(!is_uuid("not-a-uuid"));
    }
}
