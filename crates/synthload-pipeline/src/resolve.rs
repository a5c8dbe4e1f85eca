use std::collections::HashMap;

use serde::Serialize;

use crate::errors::ReferenceStoreError;
use crate::record::{Activation, ResolvedActivation, SurrogateId};

/// Read-only lookups against the authoritative customer/device/service data.
///
/// Implementations return `Ok(None)` when a natural key has no match and
/// reserve `Err` for the store itself failing.
pub trait ReferenceStore {
    fn resolve_customer(&self, customer_name: &str)
    -> Result<Option<SurrogateId>, ReferenceStoreError>;

    fn resolve_service(&self, service_name: &str)
    -> Result<Option<SurrogateId>, ReferenceStoreError>;

    fn resolve_customer_device(
        &self,
        customer_name: &str,
        device_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError>;
}

/// Reference data held in memory, keyed by natural key.
#[derive(Debug, Clone, Default)]
pub struct InMemoryReferenceStore {
    customers: HashMap<String, SurrogateId>,
    services: HashMap<String, SurrogateId>,
    customer_devices: HashMap<(String, String), SurrogateId>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_customer(&mut self, customer_name: &str, id: SurrogateId) {
        self.customers.insert(customer_name.to_string(), id);
    }

    pub fn add_service(&mut self, service_name: &str, id: SurrogateId) {
        self.services.insert(service_name.to_string(), id);
    }

    pub fn add_customer_device(&mut self, customer_name: &str, device_name: &str, id: SurrogateId) {
        self.customer_devices
            .insert((customer_name.to_string(), device_name.to_string()), id);
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn resolve_customer(
        &self,
        customer_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        Ok(self.customers.get(customer_name).copied())
    }

    fn resolve_service(
        &self,
        service_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        Ok(self.services.get(service_name).copied())
    }

    fn resolve_customer_device(
        &self,
        customer_name: &str,
        device_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        Ok(self
            .customer_devices
            .get(&(customer_name.to_string(), device_name.to_string()))
            .copied())
    }
}

/// Outcome of checking an activation's references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(ResolvedActivation),
    /// Names of the reference fields that did not resolve.
    Unresolved(Vec<&'static str>),
}

/// Lookup statistics for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolverStats {
    pub store_queries: u64,
    pub cache_hits: u64,
}

/// Memoizing front for a [`ReferenceStore`].
///
/// One cache per key shape. Misses are cached too: the store is treated as
/// append-only for the duration of a run, so an entry never changes once set.
pub struct ReferenceResolver<S> {
    store: S,
    customers: HashMap<String, Option<SurrogateId>>,
    services: HashMap<String, Option<SurrogateId>>,
    customer_devices: HashMap<(String, String), Option<SurrogateId>>,
    stats: ResolverStats,
}

impl<S: ReferenceStore> ReferenceResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            customers: HashMap::new(),
            services: HashMap::new(),
            customer_devices: HashMap::new(),
            stats: ResolverStats::default(),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn stats(&self) -> ResolverStats {
        self.stats
    }

    /// Drop every cached entry. Called when a new run starts.
    pub fn clear(&mut self) {
        self.customers.clear();
        self.services.clear();
        self.customer_devices.clear();
        self.stats = ResolverStats::default();
    }

    pub fn customer_id(
        &mut self,
        customer_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        if let Some(cached) = self.customers.get(customer_name) {
            self.stats.cache_hits += 1;
            return Ok(*cached);
        }
        self.stats.store_queries += 1;
        let resolved = self.store.resolve_customer(customer_name)?;
        self.customers.insert(customer_name.to_string(), resolved);
        Ok(resolved)
    }

    pub fn service_id(
        &mut self,
        service_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        if let Some(cached) = self.services.get(service_name) {
            self.stats.cache_hits += 1;
            return Ok(*cached);
        }
        self.stats.store_queries += 1;
        let resolved = self.store.resolve_service(service_name)?;
        self.services.insert(service_name.to_string(), resolved);
        Ok(resolved)
    }

    pub fn customer_device_id(
        &mut self,
        customer_name: &str,
        device_name: &str,
    ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
        let key = (customer_name.to_string(), device_name.to_string());
        if let Some(cached) = self.customer_devices.get(&key) {
            self.stats.cache_hits += 1;
            return Ok(*cached);
        }
        self.stats.store_queries += 1;
        let resolved = self
            .store
            .resolve_customer_device(customer_name, device_name)?;
        self.customer_devices.insert(key, resolved);
        Ok(resolved)
    }

    /// Resolve all three references. Every lookup runs so that the
    /// rejection names each unresolved field.
    pub fn check(&mut self, activation: Activation) -> Result<Resolution, ReferenceStoreError> {
        let customer = self.customer_id(&activation.customer_name)?;
        let service = self.service_id(&activation.service_name)?;
        let customer_device =
            self.customer_device_id(&activation.customer_name, &activation.device_name)?;

        match (customer, service, customer_device) {
            (Some(customer_id), Some(service_id), Some(customer_device_id)) => {
                Ok(Resolution::Resolved(ResolvedActivation {
                    activation,
                    customer_id,
                    service_id,
                    customer_device_id,
                }))
            }
            _ => {
                let mut unresolved = Vec::new();
                if customer.is_none() {
                    unresolved.push("customer_name");
                }
                if service.is_none() {
                    unresolved.push("service_name");
                }
                if customer_device.is_none() {
                    unresolved.push("customer_name,device_name");
                }
                Ok(Resolution::Unresolved(unresolved))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    #[derive(Default)]
    struct CountingStore {
        inner: InMemoryReferenceStore,
        lookups: Cell<u64>,
    }

    impl ReferenceStore for CountingStore {
        fn resolve_customer(&self, name: &str) -> Result<Option<SurrogateId>, ReferenceStoreError> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.resolve_customer(name)
        }

        fn resolve_service(&self, name: &str) -> Result<Option<SurrogateId>, ReferenceStoreError> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.resolve_service(name)
        }

        fn resolve_customer_device(
            &self,
            customer_name: &str,
            device_name: &str,
        ) -> Result<Option<SurrogateId>, ReferenceStoreError> {
            self.lookups.set(self.lookups.get() + 1);
            self.inner.resolve_customer_device(customer_name, device_name)
        }
    }

    fn activation(customer: &str, device: &str, service: &str) -> Activation {
        Activation {
            customer_name: customer.to_string(),
            device_name: device.to_string(),
            service_name: service.to_string(),
            start_date: "2022-07-10T11:12:13+00:00".to_string(),
            latitude: "35°21.2833′N".to_string(),
            longitude: "082°31.6333′W".to_string(),
        }
    }

    fn store() -> CountingStore {
        let mut inner = InMemoryReferenceStore::new();
        inner.add_customer("Jones", 1);
        inner.add_service("voice", 10);
        inner.add_customer_device("Jones", "phone", 100);
        CountingStore {
            inner,
            lookups: Cell::new(0),
        }
    }

    #[test]
    fn repeated_key_queries_store_once() {
        let mut resolver = ReferenceResolver::new(store());
        assert_eq!(resolver.customer_id("Jones").expect("lookup"), Some(1));
        assert_eq!(resolver.customer_id("Jones").expect("lookup"), Some(1));
        assert_eq!(resolver.store().lookups.get(), 1);
        assert_eq!(
            resolver.stats(),
            ResolverStats {
                store_queries: 1,
                cache_hits: 1
            }
        );
    }

    #[test]
    fn misses_are_memoized() {
        let mut resolver = ReferenceResolver::new(store());
        assert_eq!(resolver.service_id("fax").expect("lookup"), None);
        assert_eq!(resolver.service_id("fax").expect("lookup"), None);
        assert_eq!(resolver.store().lookups.get(), 1);
    }

    #[test]
    fn check_resolves_all_keys() {
        let mut resolver = ReferenceResolver::new(store());
        let resolution = resolver
            .check(activation("Jones", "phone", "voice"))
            .expect("check");
        match resolution {
            Resolution::Resolved(resolved) => {
                assert_eq!(resolved.customer_id, 1);
                assert_eq!(resolved.service_id, 10);
                assert_eq!(resolved.customer_device_id, 100);
            }
            other => panic!("expected resolved, got {other:?}"),
        }

        resolver
            .check(activation("Jones", "phone", "voice"))
            .expect("check");
        assert_eq!(resolver.store().lookups.get(), 3);
    }

    #[test]
    fn check_names_every_unresolved_field() {
        let mut resolver = ReferenceResolver::new(store());
        let resolution = resolver
            .check(activation("Smith", "phone", "fax"))
            .expect("check");
        assert_eq!(
            resolution,
            Resolution::Unresolved(vec![
                "customer_name",
                "service_name",
                "customer_name,device_name"
            ])
        );
    }

    #[test]
    fn device_is_scoped_to_customer() {
        let mut resolver = ReferenceResolver::new(store());
        let mut other = store();
        other.inner.add_customer("Smith", 2);
        let mut resolver_other = ReferenceResolver::new(other);

        assert_eq!(resolver.customer_device_id("Jones", "phone").expect("lookup"), Some(100));
        assert_eq!(
            resolver_other
                .check(activation("Smith", "phone", "voice"))
                .expect("check"),
            Resolution::Unresolved(vec!["customer_name,device_name"])
        );
    }

    #[test]
    fn clear_forgets_cached_entries() {
        let mut resolver = ReferenceResolver::new(store());
        resolver.customer_id("Jones").expect("lookup");
        resolver.clear();
        resolver.customer_id("Jones").expect("lookup");
        assert_eq!(resolver.store().lookups.get(), 2);
        assert_eq!(resolver.stats().store_queries, 1);
    }
}
