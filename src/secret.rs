use std::fmt;

use serde::{Deserialize, Deserializer};

/// A wrapper that keeps server-only key material out of logs and output.
///
/// The reputation service issues a back key that must never reach the
/// client or a log line. `Secret<T>` holds it and only releases it through
/// [`expose_secret`](Self::expose_secret), which is called when the
/// verification and registration form fields are assembled.
///
/// # Security Properties
///
/// - Does NOT implement `Deref`, `AsRef`, `Borrow`, `Clone`, or `Copy`
/// - Debug and Display output is always `[REDACTED]`
/// - No type information is leaked in formatted output
///
/// # Examples
///
/// ```
/// use admission_gate::Secret;
///
/// let back_key = Secret::new("bk-1234567890".to_string());
///
/// assert_eq!(format!("{:?}", back_key), "[REDACTED]");
/// assert_eq!(format!("{}", back_key), "[REDACTED]");
///
/// assert_eq!(back_key.expose_secret(), "bk-1234567890");
/// ```
// BREAKING CHANGE WARNING: Do NOT add Clone or Copy derives.
// Duplicated key material ends up in places nobody audits.
pub struct Secret<T> {
    // BREAKING CHANGE WARNING: This field MUST remain private (CWE-532).
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value in a `Secret`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// Only call this where the value leaves the process over the wire to
    /// the reputation service.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl Secret<String> {
    /// Returns `true` if the wrapped key is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.inner.trim().is_empty()
    }
}

impl<T: Default> Default for Secret<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Secret<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Secret::new)
    }
}

impl<T> fmt::Debug for Secret<T> {
    /// BREAKING CHANGE WARNING: This MUST unconditionally return "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    /// BREAKING CHANGE WARNING: This MUST unconditionally return "[REDACTED]".
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
