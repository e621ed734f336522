//! A thread-safe (region, credentialed) -> client cache, shared by every
//! worker a provider dispatches to. The lock is held only for the
//! duration of a single map operation.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use aws_sdk_s3::Client;

#[derive(Clone)]
pub struct ClientRegistry {
    inner: Arc<Mutex<HashMap<(String, bool), Arc<Client>>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::with_capacity(cap))),
        }
    }

    pub fn get(&self, region: &str, credentialed: bool) -> Option<Arc<Client>> {
        self.inner
            .lock()
            .expect("client registry mutex poisoned")
            .get(&(region.to_string(), credentialed))
            .cloned()
    }

    pub fn set(&self, region: impl Into<String>, credentialed: bool, client: Arc<Client>) {
        self.inner
            .lock()
            .expect("client registry mutex poisoned")
            .insert((region.into(), credentialed), client);
    }

    pub fn len(&self) -> usize {
        self.inner.lock().expect("client registry mutex poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs `f` once per `(region, credentialed, client)` entry while
    /// holding the lock, matching the upstream `Each` helper.
    pub fn each(&self, mut f: impl FnMut(&str, bool, &Arc<Client>)) {
        let guard = self.inner.lock().expect("client registry mutex poisoned");
        for ((region, credentialed), client) in guard.iter() {
            f(region, *credentialed, client);
        }
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_config::Region;
    use aws_sdk_s3::config::{Builder as S3ConfigBuilder, Credentials, SharedCredentialsProvider};

    fn dummy_client() -> Arc<Client> {
        let creds = Credentials::new("ak", "sk", None, None, "test");
        let cfg = S3ConfigBuilder::new()
            .region(Region::new("us-east-1"))
            .credentials_provider(SharedCredentialsProvider::new(creds))
            .behavior_version(aws_config::BehaviorVersion::latest())
            .build();
        Arc::new(Client::from_conf(cfg))
    }

    #[test]
    fn get_set_round_trip() {
        let registry = ClientRegistry::new();
        assert!(registry.get("us-east-1", false).is_none());
        registry.set("us-east-1", false, dummy_client());
        assert!(registry.get("us-east-1", false).is_some());
        assert!(registry.get("us-east-1", true).is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn region_and_credentialed_flag_are_independent_keys() {
        let registry = ClientRegistry::new();
        registry.set("us-east-1", false, dummy_client());
        registry.set("us-east-1", true, dummy_client());
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn each_visits_every_entry() {
        let registry = ClientRegistry::new();
        registry.set("us-east-1", false, dummy_client());
        registry.set("eu-west-1", false, dummy_client());
        let mut seen = Vec::new();
        registry.each(|region, _credentialed, _client| seen.push(region.to_string()));
        seen.sort();
        assert_eq!(seen, vec!["eu-west-1".to_string(), "us-east-1".to_string()]);
    }
}
