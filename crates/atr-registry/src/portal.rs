//! # Portal Registry
//!
//! Registers issuer endpoints ("portals") and enforces who may register
//! them. A portal record captures the portal's declared module chain at
//! registration time, its owning identity, its metadata, and whether
//! attestations issued through it can be revoked.
//!
//! ## Access Control
//!
//! Registration is gated by the issuer allowlist. On a permissive
//! ("testnet") deployment every caller is implicitly allowed; otherwise
//! only addresses the registry owner has explicitly marked as issuers
//! pass. Allowlist administration and portal revocation are reserved to
//! the registry owner.
//!
//! ## Id Discipline
//!
//! A portal id is unique for the lifetime of the deployment. Revoking a
//! portal removes it from the active set but tombstones the id — it is
//! never reused or recycled.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use atr_core::{Address, ModuleId, PortalId, PORTAL_INTERFACE};

use crate::artifact::CodeStore;
use crate::event::{EventLog, RegistryEvent};

/// A registered portal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortalRecord {
    /// The portal's address identity.
    pub id: PortalId,
    /// The identity that registered and owns the portal.
    pub owner: Address,
    /// The module chain declared by the portal at registration time.
    pub modules: Vec<ModuleId>,
    /// Whether attestations issued through this portal can be revoked.
    pub is_revocable: bool,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Display name of the owning identity.
    pub owner_name: String,
}

/// Errors raised by portal registry preconditions.
#[derive(Error, Debug)]
pub enum PortalError {
    /// A portal with this id is already registered (or was registered and
    /// later revoked — ids are never recycled).
    #[error("portal {0} already exists")]
    PortalAlreadyExists(PortalId),

    /// The portal address has no installed artifact.
    #[error("portal address {0} has no executable code")]
    PortalAddressInvalid(PortalId),

    /// The portal name is empty.
    #[error("portal name must not be empty")]
    PortalNameMissing,

    /// The portal description is empty.
    #[error("portal description must not be empty")]
    PortalDescriptionMissing,

    /// The portal owner name is empty.
    #[error("portal owner name must not be empty")]
    PortalOwnerNameMissing,

    /// The artifact at the portal address does not implement the portal
    /// capability interface.
    #[error("portal {0} does not implement the portal interface")]
    PortalInvalid(PortalId),

    /// No portal with this id is registered.
    #[error("portal {0} is not registered")]
    PortalNotRegistered(PortalId),

    /// The caller is not on the issuer allowlist.
    #[error("caller {0} is not allowlisted")]
    OnlyAllowlisted(Address),

    /// The caller is not the registry owner.
    #[error("caller {0} is not the registry owner")]
    OnlyRegistryOwner(Address),

    /// The address is already marked as an issuer.
    #[error("issuer {0} is already set")]
    IssuerAlreadySet(Address),

    /// The address is not marked as an issuer.
    #[error("issuer {0} is not set")]
    IssuerNotSet(Address),

    /// The permissive-mode flag already has this value.
    #[error("testnet status is already {0}")]
    TestnetStatusAlreadyUpdated(bool),
}

/// Registry of issuer endpoints and the issuer allowlist.
#[derive(Debug)]
pub struct PortalRegistry {
    /// The administrative owner of this registry.
    owner: Address,
    portals: HashMap<PortalId, PortalRecord>,
    /// Ids of revoked portals; never recycled.
    retired: HashSet<PortalId>,
    issuers: HashSet<Address>,
    is_testnet: bool,
}

impl PortalRegistry {
    /// Create a registry administered by `owner`, in restrictive mode.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            portals: HashMap::new(),
            retired: HashSet::new(),
            issuers: HashSet::new(),
            is_testnet: false,
        }
    }

    /// The administrative owner of this registry.
    pub fn registry_owner(&self) -> Address {
        self.owner
    }

    /// Whether `user` may register portals: permissive mode, or an
    /// explicitly marked issuer.
    pub fn is_allowlisted(&self, user: Address) -> bool {
        self.is_testnet || self.issuers.contains(&user)
    }

    /// Whether the registry is in permissive ("testnet") mode.
    pub fn is_testnet(&self) -> bool {
        self.is_testnet
    }

    /// Check that the portal metadata fields are all non-empty.
    ///
    /// Shared by [`register`](Self::register) and the default-portal
    /// deployment path, which validates before installing any artifact.
    pub fn validate_metadata(
        name: &str,
        description: &str,
        owner_name: &str,
    ) -> Result<(), PortalError> {
        if name.is_empty() {
            return Err(PortalError::PortalNameMissing);
        }
        if description.is_empty() {
            return Err(PortalError::PortalDescriptionMissing);
        }
        if owner_name.is_empty() {
            return Err(PortalError::PortalOwnerNameMissing);
        }
        Ok(())
    }

    /// Register a portal.
    ///
    /// Captures the portal's declared module chain at registration time.
    ///
    /// # Errors
    ///
    /// - `OnlyAllowlisted` if the caller may not register portals.
    /// - `PortalAlreadyExists` if the id is taken (including retired ids).
    /// - `PortalNameMissing` / `PortalDescriptionMissing` /
    ///   `PortalOwnerNameMissing` for empty metadata.
    /// - `PortalAddressInvalid` if the id has no installed artifact.
    /// - `PortalInvalid` if the artifact fails capability introspection.
    #[allow(clippy::too_many_arguments)]
    pub fn register(
        &mut self,
        code: &CodeStore,
        events: &mut EventLog,
        caller: Address,
        portal_id: PortalId,
        name: &str,
        description: &str,
        is_revocable: bool,
        owner_name: &str,
    ) -> Result<(), PortalError> {
        if !self.is_allowlisted(caller) {
            return Err(PortalError::OnlyAllowlisted(caller));
        }
        if self.portals.contains_key(&portal_id) || self.retired.contains(&portal_id) {
            return Err(PortalError::PortalAlreadyExists(portal_id));
        }
        Self::validate_metadata(name, description, owner_name)?;
        if !code.has_code(portal_id.address()) {
            return Err(PortalError::PortalAddressInvalid(portal_id));
        }
        let artifact = match code.portal(portal_id.address()) {
            Some(artifact) if artifact.supports_interface(PORTAL_INTERFACE) => artifact,
            _ => return Err(PortalError::PortalInvalid(portal_id)),
        };

        let modules = artifact.modules();
        self.portals.insert(
            portal_id,
            PortalRecord {
                id: portal_id,
                owner: caller,
                modules,
                is_revocable,
                name: name.to_string(),
                description: description.to_string(),
                owner_name: owner_name.to_string(),
            },
        );
        events.emit(RegistryEvent::PortalRegistered {
            portal_id,
            name: name.to_string(),
            owner: caller,
        });
        tracing::info!(portal_id = %portal_id, owner = %caller, name, "portal registered");
        Ok(())
    }

    /// Revoke a portal, removing it from the active set.
    ///
    /// Registry-owner-only. The id is tombstoned and never recycled.
    pub fn revoke(
        &mut self,
        events: &mut EventLog,
        caller: Address,
        portal_id: PortalId,
    ) -> Result<(), PortalError> {
        if caller != self.owner {
            return Err(PortalError::OnlyRegistryOwner(caller));
        }
        if self.portals.remove(&portal_id).is_none() {
            return Err(PortalError::PortalNotRegistered(portal_id));
        }
        self.retired.insert(portal_id);
        events.emit(RegistryEvent::PortalRevoked { portal_id });
        tracing::info!(portal_id = %portal_id, "portal revoked");
        Ok(())
    }

    /// Mark `issuer` as allowed to register portals. Registry-owner-only;
    /// rejects the no-op transition.
    pub fn set_issuer(
        &mut self,
        events: &mut EventLog,
        caller: Address,
        issuer: Address,
    ) -> Result<(), PortalError> {
        if caller != self.owner {
            return Err(PortalError::OnlyRegistryOwner(caller));
        }
        if !self.issuers.insert(issuer) {
            return Err(PortalError::IssuerAlreadySet(issuer));
        }
        events.emit(RegistryEvent::IssuerAdded { issuer });
        Ok(())
    }

    /// Remove `issuer` from the allowlist. Registry-owner-only; rejects
    /// the no-op transition.
    pub fn remove_issuer(
        &mut self,
        events: &mut EventLog,
        caller: Address,
        issuer: Address,
    ) -> Result<(), PortalError> {
        if caller != self.owner {
            return Err(PortalError::OnlyRegistryOwner(caller));
        }
        if !self.issuers.remove(&issuer) {
            return Err(PortalError::IssuerNotSet(issuer));
        }
        events.emit(RegistryEvent::IssuerRemoved { issuer });
        Ok(())
    }

    /// Set the permissive-mode flag. Registry-owner-only; rejects the
    /// no-op transition.
    pub fn set_is_testnet(
        &mut self,
        events: &mut EventLog,
        caller: Address,
        is_testnet: bool,
    ) -> Result<(), PortalError> {
        if caller != self.owner {
            return Err(PortalError::OnlyRegistryOwner(caller));
        }
        if self.is_testnet == is_testnet {
            return Err(PortalError::TestnetStatusAlreadyUpdated(is_testnet));
        }
        self.is_testnet = is_testnet;
        events.emit(RegistryEvent::IsTestnetUpdated { is_testnet });
        tracing::info!(is_testnet, "testnet status updated");
        Ok(())
    }

    /// Look up a portal record by id.
    pub fn get_portal_by_address(&self, portal_id: PortalId) -> Result<&PortalRecord, PortalError> {
        self.portals
            .get(&portal_id)
            .ok_or(PortalError::PortalNotRegistered(portal_id))
    }

    /// The owning identity of a portal.
    pub fn get_portal_owner(&self, portal_id: PortalId) -> Result<Address, PortalError> {
        Ok(self.get_portal_by_address(portal_id)?.owner)
    }

    /// Whether attestations issued through a portal can be revoked.
    pub fn get_portal_revocability(&self, portal_id: PortalId) -> Result<bool, PortalError> {
        Ok(self.get_portal_by_address(portal_id)?.is_revocable)
    }

    /// Whether a portal is in the active set.
    pub fn is_registered(&self, portal_id: PortalId) -> bool {
        self.portals.contains_key(&portal_id)
    }

    /// Number of active portals.
    pub fn portal_count(&self) -> usize {
        self.portals.len()
    }
}
