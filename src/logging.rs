use std::fmt;

/// Request-scoped structured logging for admission decisions.
///
/// Every event carries the request id so a decision can be correlated with
/// the host's own access log. Key material must never be passed in; the
/// back key is a [`Secret`](crate::Secret) and formats as `[REDACTED]` if it
/// ever is.
#[derive(Debug, Clone, Copy)]
pub struct GateLog<'a> {
    request_id: &'a str,
}

impl<'a> GateLog<'a> {
    /// Creates a logger bound to `request_id`.
    pub fn new(request_id: &'a str) -> Self {
        Self { request_id }
    }

    /// Returns the request ID associated with this logger.
    pub fn request_id(&self) -> &str {
        self.request_id
    }

    /// Logs a bypassed request (gate disabled, unconfigured, or excluded).
    pub fn bypass(&self, reason: impl fmt::Display) {
        tracing::debug!(request_id = %self.request_id, %reason, "admission check bypassed");
    }

    /// Logs the outcome of a verification call.
    pub fn verdict(&self, client_ip: impl fmt::Display, decision: impl fmt::Display) {
        tracing::info!(
            request_id = %self.request_id,
            %client_ip,
            %decision,
            "admission decided"
        );
    }

    /// Logs a verification call that failed at the transport level.
    pub fn transport_failure(&self, client_ip: impl fmt::Display, error: impl fmt::Display) {
        tracing::warn!(
            request_id = %self.request_id,
            %client_ip,
            %error,
            "reputation service unreachable"
        );
    }
}
