//! # Registries Aggregate
//!
//! Owns every registry plus the cross-cutting state (code store, balance
//! book, router, event log) and wires peer arguments for calls that span
//! registries. Holding everything in one struct keeps mutation
//! single-threaded: callers take `&mut Registries` and the borrow checker
//! rules out interleaved half-applied operations.

use atr_core::Address;

use crate::artifact::CodeStore;
use crate::attestation::AttestationRegistry;
use crate::balance::Balances;
use crate::event::EventLog;
use crate::module::ModuleRegistry;
use crate::portal::PortalRegistry;
use crate::router::{RegistryRole, Router};
use crate::schema::SchemaRegistry;

/// The full registry state of one deployment.
#[derive(Debug)]
pub struct Registries {
    /// Claim-schema descriptors.
    pub schemas: SchemaRegistry,
    /// Validation modules.
    pub modules: ModuleRegistry,
    /// Issuer portals, allowlist, and permissive-mode flag.
    pub portals: PortalRegistry,
    /// The append-only attestation ledger.
    pub attestations: AttestationRegistry,
    /// Role-to-address resolution.
    pub router: Router,
    /// Installed module and portal implementations.
    pub code: CodeStore,
    /// Value accumulated per address.
    pub balances: Balances,
    /// The append-only public log.
    pub events: EventLog,
}

impl Registries {
    /// Stand up a fresh deployment owned by `registry_owner`.
    ///
    /// Every registry role is bound in the router at construction, so
    /// `resolve` never fails on a well-known role.
    pub fn new(registry_owner: Address) -> Self {
        let mut events = EventLog::new();
        let mut router = Router::new();
        router.bind(
            &mut events,
            RegistryRole::SchemaRegistry,
            Address::derive("schema-registry"),
        );
        router.bind(
            &mut events,
            RegistryRole::ModuleRegistry,
            Address::derive("module-registry"),
        );
        router.bind(
            &mut events,
            RegistryRole::PortalRegistry,
            Address::derive("portal-registry"),
        );
        router.bind(
            &mut events,
            RegistryRole::AttestationRegistry,
            Address::derive("attestation-registry"),
        );

        Self {
            schemas: SchemaRegistry::new(),
            modules: ModuleRegistry::new(),
            portals: PortalRegistry::new(registry_owner),
            attestations: AttestationRegistry::new(),
            router,
            code: CodeStore::new(),
            balances: Balances::new(),
            events,
        }
    }

    /// The identity that administers this deployment.
    pub fn registry_owner(&self) -> Address {
        self.portals.registry_owner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_binds_all_roles() {
        let registries = Registries::new(Address::derive("owner"));
        for role in [
            RegistryRole::SchemaRegistry,
            RegistryRole::ModuleRegistry,
            RegistryRole::PortalRegistry,
            RegistryRole::AttestationRegistry,
        ] {
            assert!(registries.router.is_bound(role), "role {role} unbound");
        }
        assert_eq!(registries.events.len(), 4);
    }

    #[test]
    fn test_owner_flows_to_portal_registry() {
        let owner = Address::derive("owner");
        let registries = Registries::new(owner);
        assert_eq!(registries.registry_owner(), owner);
    }
}
