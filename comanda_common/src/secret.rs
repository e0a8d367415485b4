use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A value that must never end up in logs, such as the session bearer token.
///
/// `Debug` and `Display` both print a mask. Use [`Secret::reveal`] at the single point where the value is needed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl Secret<String> {
    pub fn is_empty(&self) -> bool {
        self.value.trim().is_empty()
    }

    /// The first few characters followed by a mask, for log lines that need to tell two tokens apart.
    pub fn hint(&self) -> String {
        let prefix = self.value.chars().take(6).collect::<String>();
        format!("{prefix}******")
    }
}

impl From<String> for Secret<String> {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for Secret<String> {
    fn from(value: &str) -> Self {
        Self::new(value.to_string())
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn secrets_are_masked() {
        let token = Secret::from("eyJhbGciOiJIUzI1NiJ9.payload.sig");
        assert_eq!(format!("{token}"), "****");
        assert_eq!(format!("{token:?}"), "****");
        assert_eq!(token.hint(), "eyJhbG******");
        assert_eq!(token.reveal(), "eyJhbGciOiJIUzI1NiJ9.payload.sig");
        assert!(!token.is_empty());
        assert!(Secret::from("  ").is_empty());
    }
}
