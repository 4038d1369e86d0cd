//! The stock portal implementation and its deploy-and-register helper.

use std::sync::Arc;

use atr_core::{Address, InterfaceId, ModuleId, PortalId, PORTAL_INTERFACE};
use atr_registry::{PortalRegistry, Registries};

use crate::pipeline::PipelineError;

/// A portal that composes a fixed module chain and accepts every
/// lifecycle hook.
///
/// Issuers that need no custom pre-commit behavior deploy this instead of
/// writing their own [`atr_core::PortalContract`].
#[derive(Debug, Clone)]
pub struct DefaultPortal {
    modules: Vec<ModuleId>,
}

impl DefaultPortal {
    /// A default portal composing `modules`, in order.
    pub fn new(modules: Vec<ModuleId>) -> Self {
        Self { modules }
    }
}

impl atr_core::PortalContract for DefaultPortal {
    fn supports_interface(&self, interface: InterfaceId) -> bool {
        interface == PORTAL_INTERFACE
    }

    fn modules(&self) -> Vec<ModuleId> {
        self.modules.clone()
    }
}

/// Instantiate a [`DefaultPortal`] at a fresh address, install it, and
/// register it in one step.
///
/// All-or-nothing: metadata is validated before anything is installed,
/// and a registration failure uninstalls the artifact again, so a failed
/// deploy leaves no orphaned code behind.
pub fn deploy_default_portal(
    registries: &mut Registries,
    caller: Address,
    modules: Vec<ModuleId>,
    name: &str,
    description: &str,
    is_revocable: bool,
    owner_name: &str,
) -> Result<PortalId, PipelineError> {
    PortalRegistry::validate_metadata(name, description, owner_name)?;

    let portal_id = PortalId(Address::random());
    registries
        .code
        .install_portal(portal_id.address(), Arc::new(DefaultPortal::new(modules)));

    let r = &mut *registries;
    if let Err(err) = r.portals.register(
        &r.code,
        &mut r.events,
        caller,
        portal_id,
        name,
        description,
        is_revocable,
        owner_name,
    ) {
        r.code.remove(portal_id.address());
        return Err(err.into());
    }
    tracing::info!(portal_id = %portal_id, name, "default portal deployed");
    Ok(portal_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use atr_core::PortalContract;
    use atr_registry::PortalError;

    fn owner() -> Address {
        Address::derive("deploy-owner")
    }

    fn registries() -> Registries {
        let mut registries = Registries::new(owner());
        let o = owner();
        registries.portals.set_issuer(&mut registries.events, o, o).unwrap();
        registries
    }

    #[test]
    fn test_default_portal_capability_and_modules() {
        let chain = vec![ModuleId(Address::derive("m1")), ModuleId(Address::derive("m2"))];
        let portal = DefaultPortal::new(chain.clone());
        assert!(portal.supports_interface(PORTAL_INTERFACE));
        assert_eq!(portal.modules(), chain);
    }

    #[test]
    fn test_deploy_installs_and_registers() {
        let mut registries = registries();
        let portal_id = deploy_default_portal(
            &mut registries,
            owner(),
            Vec::new(),
            "Stock",
            "stock portal",
            true,
            "Acme",
        )
        .unwrap();
        assert!(registries.portals.is_registered(portal_id));
        assert!(registries.code.has_code(portal_id.address()));
        assert_eq!(
            registries.portals.get_portal_owner(portal_id).unwrap(),
            owner()
        );
    }

    #[test]
    fn test_deploy_rejects_empty_metadata_before_installing() {
        let mut registries = registries();
        let count_before = registries.portals.portal_count();
        let err = deploy_default_portal(
            &mut registries,
            owner(),
            Vec::new(),
            "",
            "stock portal",
            true,
            "Acme",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Portal(PortalError::PortalNameMissing)
        ));
        assert_eq!(registries.portals.portal_count(), count_before);
    }

    #[test]
    fn test_failed_registration_uninstalls_artifact() {
        let mut registries = registries();
        let stranger = Address::derive("not-allowlisted");
        let err = deploy_default_portal(
            &mut registries,
            stranger,
            Vec::new(),
            "Stock",
            "stock portal",
            true,
            "Acme",
        )
        .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Portal(PortalError::OnlyAllowlisted(_))
        ));
        assert_eq!(registries.portals.portal_count(), 0);
    }
}
