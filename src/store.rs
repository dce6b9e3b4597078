//! Persistence seam for gate configuration.

use crate::config::{Credentials, GateConfig, SiteIdentity};
use crate::error::StoreError;

/// Host-owned storage of the gate configuration.
///
/// The gate never caches what `load` returns; every operation reloads.
pub trait ConfigStore {
    /// Reads the current configuration.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the configuration cannot be read.
    fn load(&self) -> Result<GateConfig, StoreError>;

    /// Replaces the cached site identifier.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn persist_site_key(&mut self, site: &SiteIdentity) -> Result<(), StoreError>;

    /// Sets the gate to disabled and removes the cached site identifier.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the write fails.
    fn disable_and_clear_site_key(&mut self) -> Result<(), StoreError>;
}

/// An in-memory [`ConfigStore`] that counts writes.
///
/// # Examples
///
/// ```
/// use admission_gate::{ConfigStore, Credentials, GateConfig, MemoryConfigStore, SiteIdentity};
///
/// let mut store = MemoryConfigStore::new(GateConfig::new(Credentials::new("fk", "bk")));
/// store.persist_site_key(&SiteIdentity::new("8")).unwrap();
///
/// assert_eq!(store.load().unwrap().site_key.as_deref(), Some("8"));
/// assert_eq!(store.writes(), 1);
/// ```
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
    config: GateConfig,
    writes: usize,
}

impl MemoryConfigStore {
    /// Creates a store holding `config`.
    pub fn new(config: GateConfig) -> Self {
        Self { config, writes: 0 }
    }

    /// Borrows the stored configuration.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }

    /// Number of successful writes since creation.
    pub fn writes(&self) -> usize {
        self.writes
    }
}

impl ConfigStore for MemoryConfigStore {
    fn load(&self) -> Result<GateConfig, StoreError> {
        let stored = &self.config;
        Ok(GateConfig {
            credentials: Credentials::new(
                stored.credentials.front_key.clone(),
                stored.credentials.back_key.expose_secret().clone(),
            ),
            site_key: stored.site_key.clone(),
            enabled: stored.enabled,
            exclusions: stored.exclusions.clone(),
            service: stored.service.clone(),
            transport_failure: stored.transport_failure,
        })
    }

    fn persist_site_key(&mut self, site: &SiteIdentity) -> Result<(), StoreError> {
        self.config.site_key = Some(site.as_str().to_string());
        self.writes += 1;
        Ok(())
    }

    fn disable_and_clear_site_key(&mut self) -> Result<(), StoreError> {
        self.config.enabled = false;
        self.config.site_key = None;
        self.writes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GateState;

    #[test]
    fn load_returns_fresh_copy() {
        let store =
            MemoryConfigStore::new(GateConfig::new(Credentials::new("fk", "bk")).with_site("3"));

        let loaded = store.load().unwrap();
        assert_eq!(loaded.credentials.front_key, "fk");
        assert_eq!(loaded.credentials.back_key.expose_secret(), "bk");
        assert_eq!(loaded.site_key.as_deref(), Some("3"));
        assert_eq!(store.writes(), 0);
    }

    #[test]
    fn disable_clears_site() {
        let mut store = MemoryConfigStore::new(GateConfig::default().with_site("3"));
        store.disable_and_clear_site_key().unwrap();

        assert_eq!(store.config().gate_state(), GateState::Disabled);
        assert!(store.config().site_key.is_none());
        assert_eq!(store.writes(), 1);
    }
}
