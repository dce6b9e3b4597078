//! Extraction boundary trait for web integration.

use crate::request::PageRequest;

/// Builds a [`PageRequest`] from a framework-specific request.
///
/// Implementations only map framework types onto the gate's request type.
/// They do not decide anything and do not validate origin signals; the IP
/// extractor does that.
///
/// # Examples
///
/// ```
/// use admission_gate::web::ExtractPageRequest;
/// use admission_gate::{OriginSignal, OriginSignals, PageRequest};
///
/// struct MyFrameworkRequest {
///     id: String,
///     peer: String,
///     uri: String,
/// }
///
/// impl ExtractPageRequest for MyFrameworkRequest {
///     fn extract_page_request(&self) -> PageRequest {
///         PageRequest {
///             request_id: self.id.clone(),
///             origin: OriginSignals::new().with(OriginSignal::RemoteAddr, self.peer.clone()),
///             url: self.uri.clone(),
///             ..PageRequest::default()
///         }
///     }
/// }
/// ```
pub trait ExtractPageRequest {
    /// Extracts the gate's view of the request.
    fn extract_page_request(&self) -> PageRequest;
}
