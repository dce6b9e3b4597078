//! Request adapter for mapping host requests to the gate's request type.

use std::collections::{BTreeSet, HashMap};

use crate::ip::OriginSignals;
use crate::request::PageRequest;

use super::ExtractPageRequest;

/// Query parameter naming the component a request routes to.
pub const RESOURCE_TYPE_PARAM: &str = "option";

/// Framework-agnostic collector for the request data the gate needs.
///
/// Holds simple owned data so any host can fill it in. The resource type is
/// taken from an explicit [`set_resource_type`](Self::set_resource_type) if
/// given, otherwise from the `option` query parameter.
///
/// # Examples
///
/// ```
/// use admission_gate::web::{ExtractPageRequest, RequestAdapter};
///
/// let mut adapter = RequestAdapter::new("req-12345".to_string());
/// adapter.add_server_var("REMOTE_ADDR", "192.0.2.33");
/// adapter.add_server_var("HTTP_USER_AGENT", "curl/8.0");
/// adapter.set_url("https://site.test/index.php?option=com_users");
/// adapter.add_query_param("option", "com_users");
/// adapter.add_role("2");
///
/// let request = adapter.extract_page_request();
/// assert_eq!(request.request_id, "req-12345");
/// assert_eq!(request.resource_type, "com_users");
/// assert_eq!(request.origin.len(), 1);
/// assert!(request.user_roles.contains("2"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct RequestAdapter {
    request_id: String,
    server_vars: Vec<(String, String)>,
    query_params: HashMap<String, String>,
    url: String,
    resource_type: Option<String>,
    roles: BTreeSet<String>,
}

impl RequestAdapter {
    /// Creates an adapter for the given request ID with everything else empty.
    pub fn new(request_id: String) -> Self {
        Self {
            request_id,
            ..Self::default()
        }
    }

    /// Adds a CGI-style server variable. Unrelated variables are ignored at
    /// extraction time.
    pub fn add_server_var(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.server_vars.push((name.into(), value.into()));
    }

    /// Adds a query parameter.
    pub fn add_query_param(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.query_params.insert(key.into(), value.into());
    }

    /// Sets the full requested URL.
    pub fn set_url(&mut self, url: impl Into<String>) {
        self.url = url.into();
    }

    /// Overrides the resource type.
    pub fn set_resource_type(&mut self, resource_type: impl Into<String>) {
        self.resource_type = Some(resource_type.into());
    }

    /// Adds a role held by the current user.
    pub fn add_role(&mut self, role: impl Into<String>) {
        self.roles.insert(role.into());
    }

    /// Returns the request ID.
    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    fn resource_type(&self) -> String {
        self.resource_type
            .clone()
            .or_else(|| self.query_params.get(RESOURCE_TYPE_PARAM).cloned())
            .unwrap_or_default()
    }
}

impl ExtractPageRequest for RequestAdapter {
    fn extract_page_request(&self) -> PageRequest {
        let origin = OriginSignals::from_server_vars(
            self.server_vars
                .iter()
                .map(|(name, value)| (name.as_str(), value.as_str())),
        );

        PageRequest {
            request_id: self.request_id.clone(),
            origin,
            url: self.url.clone(),
            resource_type: self.resource_type(),
            user_roles: self.roles.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ip::extract_client_ip;

    #[test]
    fn explicit_resource_type_wins_over_query() {
        let mut adapter = RequestAdapter::new("req-1".to_string());
        adapter.add_query_param("option", "com_content");
        adapter.set_resource_type("com_ajax");

        assert_eq!(adapter.extract_page_request().resource_type, "com_ajax");
    }

    #[test]
    fn missing_resource_type_is_empty() {
        let adapter = RequestAdapter::new("req-2".to_string());
        assert_eq!(adapter.extract_page_request().resource_type, "");
    }

    #[test]
    fn server_vars_feed_ip_extraction() {
        let mut adapter = RequestAdapter::new("req-3".to_string());
        adapter.add_server_var("HTTP_X_FORWARDED_FOR", "203.0.113.4");
        adapter.add_server_var("REMOTE_ADDR", "unix:socket");

        let request = adapter.extract_page_request();
        assert_eq!(extract_client_ip(&request.origin).to_string(), "203.0.113.4");
    }

    #[test]
    fn later_server_var_replaces_earlier() {
        let mut adapter = RequestAdapter::new("req-4".to_string());
        adapter.add_server_var("REMOTE_ADDR", "192.0.2.1");
        adapter.add_server_var("REMOTE_ADDR", "192.0.2.2");

        let request = adapter.extract_page_request();
        assert_eq!(extract_client_ip(&request.origin).to_string(), "192.0.2.2");
    }
}
