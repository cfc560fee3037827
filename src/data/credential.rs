//! Credential Store
//!
//! Manages the OpenAlgo host URL, the validated API key and the preferences
//! hydrated alongside it.

use crate::data::keys;
use crate::data::store::{SharedStore, StoreError};
use crate::data::PreferenceBag;

/// Credential store over the shared key-value store
#[derive(Clone)]
pub struct CredentialStore {
    store: SharedStore,
    default_host: String,
}

impl CredentialStore {
    /// Create a new credential store
    pub fn new(store: SharedStore, default_host: impl Into<String>) -> Self {
        Self {
            store,
            default_host: default_host.into(),
        }
    }

    /// Stored host URL, or the default when none is stored
    pub fn host_url(&self) -> String {
        self.store
            .get(keys::HOST_URL)
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| self.default_host.clone())
    }

    pub fn save_host_url(&self, host_url: &str) -> Result<(), StoreError> {
        self.store.set(keys::HOST_URL, host_url)
    }

    /// Stored API key, if any
    pub fn api_key(&self) -> Option<String> {
        self.store.get(keys::API_KEY).filter(|key| !key.is_empty())
    }

    /// Persist an API key. Only call this after the server accepted it.
    pub fn save_api_key(&self, api_key: &str) -> Result<(), StoreError> {
        self.store.set(keys::API_KEY, api_key)
    }

    /// Write every preference into the store and mark hydration as done.
    ///
    /// The sentinel is left unset if any write failed, so the later cloud
    /// sync still runs. Returns the number of preferences written.
    pub fn hydrate_preferences(&self, prefs: &PreferenceBag) -> usize {
        let mut written = 0;
        let mut failed = false;

        for (key, value) in prefs.iter() {
            match self.store.set(key, value) {
                Ok(()) => written += 1,
                Err(e) => {
                    failed = true;
                    tracing::warn!("Could not store preference {}: {}", key, e);
                }
            }
        }

        if failed {
            return written;
        }

        if let Err(e) = self.store.set(keys::CLOUD_SYNC_DONE, "true") {
            tracing::warn!("Could not mark preferences as hydrated: {}", e);
        } else {
            tracing::info!("Hydrated {} preferences from server", written);
        }
        written
    }

    /// Whether preferences were hydrated from a validation response
    pub fn is_hydrated(&self) -> bool {
        self.store.get(keys::CLOUD_SYNC_DONE).as_deref() == Some("true")
    }
}
