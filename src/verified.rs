/// A value that has passed a [`Sanitizer`](crate::Sanitizer).
///
/// `Verified<T>` cannot be built by code outside this crate; the only way
/// to obtain one is to sanitize a [`Tainted<T>`](crate::Tainted) value. The
/// IP extractor relies on this to guarantee that whatever it reports as the
/// client address actually parsed as one.
///
/// ```compile_fail
/// use admission_gate::Verified;
///
/// // No public constructor:
/// let verified = Verified::new("203.0.113.7".to_string());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verified<T> {
    inner: T,
}

impl<T> Verified<T> {
    /// Wraps a value without validation.
    ///
    /// Callers inside the crate must have validated `value` first.
    pub(crate) fn new_unchecked(value: T) -> Self {
        Self { inner: value }
    }

    /// Consumes the `Verified<T>` and returns the inner value.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl<T> AsRef<T> for Verified<T> {
    fn as_ref(&self) -> &T {
        &self.inner
    }
}
