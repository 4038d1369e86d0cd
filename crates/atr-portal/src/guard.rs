//! Ownership guards applied ahead of the lifecycle hook.
//!
//! The guard runs in the pipeline itself, not in the portal's hook, so a
//! portal implementation cannot opt out of it.

use atr_core::{Address, OperationKind, PortalId};
use atr_registry::PortalRegistry;

use crate::pipeline::PipelineError;

/// Whether `operation` is reserved to the portal owner.
///
/// Issuance is open to any caller the modules accept; rewriting history
/// (replace) and ending it (revoke) are not.
pub fn requires_owner(operation: OperationKind) -> bool {
    matches!(
        operation,
        OperationKind::Replace
            | OperationKind::BulkReplace
            | OperationKind::Revoke
            | OperationKind::BulkRevoke
    )
}

/// Fail with `OnlyPortalOwner` unless `caller` owns `portal_id`.
pub fn ensure_portal_owner(
    portals: &PortalRegistry,
    portal_id: PortalId,
    caller: Address,
) -> Result<(), PipelineError> {
    let owner = portals.get_portal_owner(portal_id)?;
    if caller != owner {
        return Err(PipelineError::OnlyPortalOwner { portal_id, caller });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_gate_covers_replace_and_revoke_only() {
        assert!(requires_owner(OperationKind::Replace));
        assert!(requires_owner(OperationKind::BulkReplace));
        assert!(requires_owner(OperationKind::Revoke));
        assert!(requires_owner(OperationKind::BulkRevoke));
        assert!(!requires_owner(OperationKind::Attest));
        assert!(!requires_owner(OperationKind::BulkAttest));
    }
}
