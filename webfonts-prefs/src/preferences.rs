//! The preference set and where it is persisted.
//!
//! Anonymous identities keep preferences in a [`LocalStore`]; named
//! identities persist them as one server-side option through an
//! [`OptionsClient`]. Either way the whole set is saved as a single JSON
//! object under [`PREFERENCE_NAME`], and a failed save is reported as
//! `false`, never as a panic.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::store::{LocalStore, StoreError};
use crate::token::{ApiError, OptionsApi, OptionsClient};

/// Name of the stored preference object.
pub const PREFERENCE_NAME: &str = "uls-preferences";

#[derive(Error, Debug)]
pub enum PreferenceError {
    #[error("Local store error: {0}")]
    Store(#[from] StoreError),
    #[error("Options API error: {0}")]
    Api(#[from] ApiError),
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Where a preference set is loaded from and saved to.
pub trait PreferenceBackend {
    /// Initial values for preference object `name`. Unreadable data yields
    /// an empty set.
    fn load(&mut self, name: &str) -> Map<String, Value>;

    fn persist(
        &mut self,
        name: &str,
        values: &Map<String, Value>,
    ) -> impl Future<Output = Result<(), PreferenceError>>;
}

/// Backend for anonymous identities: a local store only.
#[derive(Debug)]
pub struct LocalBackend<S> {
    store: S,
}

impl<S: LocalStore> LocalBackend<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }
}

impl<S: LocalStore> PreferenceBackend for LocalBackend<S> {
    fn load(&mut self, name: &str) -> Map<String, Value> {
        match self.store.get(name) {
            Ok(Some(Value::Object(values))) => values,
            Ok(_) => Map::new(),
            Err(e) => {
                log::warn!("Preferences: could not read local preferences: {e}");
                Map::new()
            }
        }
    }

    async fn persist(&mut self, name: &str, values: &Map<String, Value>) -> Result<(), PreferenceError> {
        self.store.set(name, &Value::Object(values.clone()))?;
        Ok(())
    }
}

/// Backend for named identities: server-side options.
#[derive(Debug)]
pub struct RemoteBackend<A> {
    user: String,
    /// Option value the server delivered with the page, if any.
    initial: Option<String>,
    client: Arc<OptionsClient<A>>,
}

impl<A: OptionsApi> RemoteBackend<A> {
    pub fn new(user: impl Into<String>, initial: Option<String>, client: Arc<OptionsClient<A>>) -> Self {
        Self {
            user: user.into(),
            initial,
            client,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

impl<A: OptionsApi> PreferenceBackend for RemoteBackend<A> {
    fn load(&mut self, _name: &str) -> Map<String, Value> {
        let Some(raw) = self.initial.as_deref() else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(values)) => values,
            _ => {
                log::warn!("Preferences: ignoring unparsable options for {}", self.user);
                Map::new()
            }
        }
    }

    async fn persist(&mut self, name: &str, values: &Map<String, Value>) -> Result<(), PreferenceError> {
        let json = serde_json::to_string(values)?;
        self.client.save_option(name, &json).await?;
        Ok(())
    }
}

/// A user's preference set.
#[derive(Debug)]
pub struct Preferences<B> {
    name: String,
    values: Map<String, Value>,
    backend: B,
}

impl<S: LocalStore> Preferences<LocalBackend<S>> {
    /// Preferences of an anonymous identity.
    pub fn anonymous(store: S) -> Self {
        Self::new(LocalBackend::new(store))
    }
}

impl<A: OptionsApi> Preferences<RemoteBackend<A>> {
    /// Preferences of a named identity. `initial` is the option value the
    /// server already delivered, if any.
    pub fn named(user: impl Into<String>, initial: Option<String>, client: Arc<OptionsClient<A>>) -> Self {
        Self::new(RemoteBackend::new(user, initial, client))
    }
}

impl<B: PreferenceBackend> Preferences<B> {
    pub fn new(backend: B) -> Self {
        Self::with_name(PREFERENCE_NAME, backend)
    }

    pub fn with_name(name: impl Into<String>, mut backend: B) -> Self {
        let name = name.into();
        let values = backend.load(&name);
        Self { name, values, backend }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Typed read; `None` when absent or of another shape.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.values
            .get(key)
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Persist the whole set. Returns whether it was saved.
    pub async fn save(&mut self) -> bool {
        match self.backend.persist(&self.name, &self.values).await {
            Ok(()) => {
                log::debug!("Preferences: saved {} entries", self.values.len());
                true
            }
            Err(e) => {
                log::warn!("Preferences: save failed: {e}");
                false
            }
        }
    }

    /// Persist the set and report the outcome to `callback`.
    pub async fn save_with<F: FnOnce(bool)>(&mut self, callback: F) {
        let saved = self.save().await;
        callback(saved);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    #[test]
    fn test_anonymous_starts_empty() {
        let prefs = Preferences::anonymous(MemoryStore::new());
        assert!(prefs.values().is_empty());
    }

    #[test]
    fn test_non_object_local_value_is_ignored() {
        let mut store = MemoryStore::new();
        store.set(PREFERENCE_NAME, &json!([1, 2, 3])).unwrap();
        let prefs = Preferences::anonymous(store);
        assert!(prefs.values().is_empty());
    }

    #[tokio::test]
    async fn test_anonymous_round_trip() {
        let mut prefs = Preferences::anonymous(MemoryStore::new());
        prefs.set("webfonts", json!({ "fonts": { "he": "Taamey" }, "enabled": true }));
        assert!(prefs.save().await);

        let stored = prefs.backend().store().clone();
        let reloaded = Preferences::anonymous(stored);
        assert_eq!(
            reloaded.get("webfonts"),
            Some(&json!({ "fonts": { "he": "Taamey" }, "enabled": true }))
        );
    }

    #[test]
    fn test_get_as() {
        let mut prefs = Preferences::anonymous(MemoryStore::new());
        prefs.set("enabled", true);
        prefs.set("language", "ml");
        assert_eq!(prefs.get_as::<bool>("enabled"), Some(true));
        assert_eq!(prefs.get_as::<String>("language").as_deref(), Some("ml"));
        assert_eq!(prefs.get_as::<u32>("language"), None);
        assert_eq!(prefs.remove("language"), Some(json!("ml")));
    }

    #[tokio::test]
    async fn test_save_with_reports_outcome() {
        let mut prefs = Preferences::anonymous(MemoryStore::new());
        let mut outcome = None;
        prefs.save_with(|saved| outcome = Some(saved)).await;
        assert_eq!(outcome, Some(true));
    }
}
