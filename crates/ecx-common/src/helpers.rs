//! Common helper functions.

use subtle::ConstantTimeEq;

/// Performs a constant-time comparison of two byte strings.
///
/// Inputs of different length compare unequal immediately.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Interpret an environment-style boolean (`1`, `true`, `yes`, `on`).
pub fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
