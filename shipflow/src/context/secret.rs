//! Opaque secret handles that never leak into logs or serialized output.

use std::fmt;

/// A credential value that redacts itself everywhere.
///
/// `Debug` and `Display` print a placeholder, and the type deliberately
/// does not implement `Serialize`. The raw value is only reachable through
/// [`Secret::reveal`], at the point an external action actually needs it.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Wraps a raw credential value.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the raw value.
    #[must_use]
    pub fn reveal(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(***)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "***")
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts() {
        let secret = Secret::new("hunter2");
        assert_eq!(format!("{secret:?}"), "Secret(***)");
        assert_eq!(secret.to_string(), "***");
    }

    #[test]
    fn test_reveal_returns_raw_value() {
        let secret = Secret::new("hunter2");
        assert_eq!(secret.reveal(), "hunter2");
    }

    #[test]
    fn test_debug_never_contains_value() {
        let secret = Secret::new("registry-token-abc");
        let printed = format!("{secret:?} {secret}");
        assert!(!printed.contains("registry-token-abc"));
    }
}
