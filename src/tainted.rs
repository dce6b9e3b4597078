use std::fmt;

/// A wrapper for untrusted request-origin data.
///
/// Server variables and forwarding headers are attacker controlled. Any such
/// value enters the crate as `Tainted<T>` and can only be turned into
/// something usable through a [`Sanitizer`](crate::Sanitizer).
///
/// # Examples
///
/// ```
/// use admission_gate::Tainted;
///
/// let forwarded = Tainted::new("203.0.113.7, 10.0.0.1".to_string());
/// assert!(format!("{:?}", forwarded).contains("Tainted"));
/// ```
#[derive(Clone)]
pub struct Tainted<T> {
    // BREAKING CHANGE WARNING: This field MUST remain private.
    // External code must go through a Sanitizer to access the value.
    inner: T,
}

impl<T> Tainted<T> {
    /// Wraps an untrusted value in `Tainted`.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Extracts the inner value for sanitization.
    ///
    /// Only sanitizer implementations inside this crate may call this.
    pub(crate) fn into_inner(self) -> T {
        self.inner
    }
}

impl<T: fmt::Debug> fmt::Debug for Tainted<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tainted")
            .field("inner", &self.inner)
            .finish()
    }
}
