//! # Portal Session
//!
//! One caller's write access to one registered portal. Every mutating
//! operation runs three steps in strict order:
//!
//! 1. the portal's declared module chain (skipped for revoke, which
//!    carries no new payload),
//! 2. the ownership guard and the portal's lifecycle hook,
//! 3. the ledger commit and value credit.
//!
//! Steps 1 and 2 are read-only, so a failure at any step leaves every
//! registry untouched.

use thiserror::Error;

use atr_core::{Address, AttestationId, AttestationPayload, OperationKind, PortalId};
use atr_registry::{
    AttestationError, BalanceError, ModuleError, PortalError, Registries, SchemaError,
};

use crate::guard;

/// Errors raised by the portal pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Schema registry precondition failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Module registry precondition or module rejection.
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// Portal registry precondition failed.
    #[error(transparent)]
    Portal(#[from] PortalError),

    /// Ledger precondition failed.
    #[error(transparent)]
    Attestation(#[from] AttestationError),

    /// The operation is reserved to the portal owner.
    #[error("caller {caller} is not the owner of portal {portal_id}")]
    OnlyPortalOwner {
        /// The portal whose owner gate failed.
        portal_id: PortalId,
        /// The rejected caller.
        caller: Address,
    },

    /// The portal's lifecycle hook refused the operation.
    #[error("lifecycle hook rejected {operation}: {reason}")]
    HookRejected {
        /// The refused operation.
        operation: OperationKind,
        /// The hook's stated reason.
        reason: String,
    },

    /// The withdrawal could not be funded.
    #[error("withdraw failed: {0}")]
    WithdrawFail(#[from] BalanceError),
}

/// A caller's session against one registered portal.
#[derive(Debug)]
pub struct PortalSession<'a> {
    registries: &'a mut Registries,
    portal_id: PortalId,
    caller: Address,
}

impl<'a> PortalSession<'a> {
    /// Open a session for `caller` against `portal_id`.
    ///
    /// # Errors
    ///
    /// `PortalNotRegistered` if the portal is unknown or revoked.
    pub fn open(
        registries: &'a mut Registries,
        portal_id: PortalId,
        caller: Address,
    ) -> Result<Self, PipelineError> {
        if !registries.portals.is_registered(portal_id) {
            return Err(PortalError::PortalNotRegistered(portal_id).into());
        }
        Ok(Self {
            registries,
            portal_id,
            caller,
        })
    }

    /// The portal this session writes through.
    pub fn portal_id(&self) -> PortalId {
        self.portal_id
    }

    /// The identity driving this session.
    pub fn caller(&self) -> Address {
        self.caller
    }

    // ─── Issuance ────────────────────────────────────────────────────

    /// Issue one attestation, legacy call shape: modules see only the
    /// transferred value.
    pub fn attest(
        &mut self,
        payload: &AttestationPayload,
        validation_payloads: &[Vec<u8>],
        value: u128,
    ) -> Result<AttestationId, PipelineError> {
        let chain = self.module_chain()?;
        self.registries.modules.run_modules(
            &self.registries.code,
            &chain,
            payload,
            validation_payloads,
            value,
        )?;
        self.hook(OperationKind::Attest, value)?;
        self.commit_attest(payload, value)
    }

    /// Issue one attestation, forwarding caller and attester identities
    /// and the operation kind to the modules.
    pub fn attest_v2(
        &mut self,
        payload: &AttestationPayload,
        validation_payloads: &[Vec<u8>],
        value: u128,
    ) -> Result<AttestationId, PipelineError> {
        let chain = self.module_chain()?;
        self.registries.modules.run_modules_v2(
            &self.registries.code,
            &chain,
            payload,
            validation_payloads,
            value,
            self.caller,
            self.caller,
            OperationKind::Attest,
        )?;
        self.hook(OperationKind::Attest, value)?;
        self.commit_attest(payload, value)
    }

    /// Issue a batch of attestations as one atomic unit, legacy shape.
    pub fn bulk_attest(
        &mut self,
        payloads: &[AttestationPayload],
        validation_payloads: &[Vec<Vec<u8>>],
        value: u128,
    ) -> Result<Vec<AttestationId>, PipelineError> {
        let chain = self.module_chain()?;
        self.registries.modules.bulk_run_modules(
            &self.registries.code,
            &chain,
            payloads,
            validation_payloads,
            value,
        )?;
        self.hook(OperationKind::BulkAttest, value)?;
        self.commit_bulk_attest(payloads, value)
    }

    /// Issue a batch of attestations as one atomic unit, full context.
    pub fn bulk_attest_v2(
        &mut self,
        payloads: &[AttestationPayload],
        validation_payloads: &[Vec<Vec<u8>>],
        value: u128,
    ) -> Result<Vec<AttestationId>, PipelineError> {
        let chain = self.module_chain()?;
        self.registries.modules.bulk_run_modules_v2(
            &self.registries.code,
            &chain,
            payloads,
            validation_payloads,
            value,
            self.caller,
            self.caller,
            OperationKind::BulkAttest,
        )?;
        self.hook(OperationKind::BulkAttest, value)?;
        self.commit_bulk_attest(payloads, value)
    }

    // ─── Replacement (portal-owner-only) ─────────────────────────────

    /// Supersede one attestation, legacy call shape.
    pub fn replace(
        &mut self,
        attestation_id: AttestationId,
        payload: &AttestationPayload,
        validation_payloads: &[Vec<u8>],
        value: u128,
    ) -> Result<AttestationId, PipelineError> {
        let chain = self.module_chain()?;
        self.registries.modules.run_modules(
            &self.registries.code,
            &chain,
            payload,
            validation_payloads,
            value,
        )?;
        self.hook(OperationKind::Replace, value)?;
        self.commit_replace(attestation_id, payload, value)
    }

    /// Supersede one attestation, full context.
    pub fn replace_v2(
        &mut self,
        attestation_id: AttestationId,
        payload: &AttestationPayload,
        validation_payloads: &[Vec<u8>],
        value: u128,
    ) -> Result<AttestationId, PipelineError> {
        let chain = self.module_chain()?;
        self.registries.modules.run_modules_v2(
            &self.registries.code,
            &chain,
            payload,
            validation_payloads,
            value,
            self.caller,
            self.caller,
            OperationKind::Replace,
        )?;
        self.hook(OperationKind::Replace, value)?;
        self.commit_replace(attestation_id, payload, value)
    }

    /// Supersede a batch of attestations as one atomic unit, legacy shape.
    pub fn bulk_replace(
        &mut self,
        items: &[(AttestationId, AttestationPayload)],
        validation_payloads: &[Vec<Vec<u8>>],
        value: u128,
    ) -> Result<Vec<AttestationId>, PipelineError> {
        let chain = self.module_chain()?;
        let payloads: Vec<AttestationPayload> =
            items.iter().map(|(_, payload)| payload.clone()).collect();
        self.registries.modules.bulk_run_modules(
            &self.registries.code,
            &chain,
            &payloads,
            validation_payloads,
            value,
        )?;
        self.hook(OperationKind::BulkReplace, value)?;
        self.commit_bulk_replace(items, value)
    }

    /// Supersede a batch of attestations as one atomic unit, full context.
    pub fn bulk_replace_v2(
        &mut self,
        items: &[(AttestationId, AttestationPayload)],
        validation_payloads: &[Vec<Vec<u8>>],
        value: u128,
    ) -> Result<Vec<AttestationId>, PipelineError> {
        let chain = self.module_chain()?;
        let payloads: Vec<AttestationPayload> =
            items.iter().map(|(_, payload)| payload.clone()).collect();
        self.registries.modules.bulk_run_modules_v2(
            &self.registries.code,
            &chain,
            &payloads,
            validation_payloads,
            value,
            self.caller,
            self.caller,
            OperationKind::BulkReplace,
        )?;
        self.hook(OperationKind::BulkReplace, value)?;
        self.commit_bulk_replace(items, value)
    }

    // ─── Revocation (portal-owner-only, no module chain) ─────────────

    /// Terminally revoke one attestation.
    ///
    /// Revocation carries no new payload, so the module chain does not
    /// run; the ownership guard and hook still do.
    pub fn revoke(&mut self, attestation_id: AttestationId) -> Result<(), PipelineError> {
        self.hook(OperationKind::Revoke, 0)?;
        let r = &mut *self.registries;
        r.attestations
            .revoke(&r.portals, &mut r.events, self.portal_id, attestation_id)?;
        Ok(())
    }

    /// Terminally revoke a batch of attestations as one atomic unit.
    pub fn bulk_revoke(
        &mut self,
        attestation_ids: &[AttestationId],
    ) -> Result<(), PipelineError> {
        self.hook(OperationKind::BulkRevoke, 0)?;
        let r = &mut *self.registries;
        r.attestations
            .bulk_revoke(&r.portals, &mut r.events, self.portal_id, attestation_ids)?;
        Ok(())
    }

    // ─── Value ───────────────────────────────────────────────────────

    /// Move accumulated value out of the portal's balance.
    /// Portal-owner-only.
    pub fn withdraw(&mut self, to: Address, amount: u128) -> Result<(), PipelineError> {
        guard::ensure_portal_owner(&self.registries.portals, self.portal_id, self.caller)?;
        self.registries
            .balances
            .transfer(self.portal_id.address(), to, amount)?;
        tracing::info!(portal_id = %self.portal_id, %to, amount, "portal balance withdrawn");
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────

    /// The module chain declared by this portal at registration time.
    fn module_chain(&self) -> Result<Vec<atr_core::ModuleId>, PipelineError> {
        Ok(self
            .registries
            .portals
            .get_portal_by_address(self.portal_id)?
            .modules
            .clone())
    }

    /// The ownership guard, then the portal's lifecycle hook. Read-only.
    fn hook(&self, operation: OperationKind, value: u128) -> Result<(), PipelineError> {
        if guard::requires_owner(operation) {
            guard::ensure_portal_owner(&self.registries.portals, self.portal_id, self.caller)?;
        }
        let artifact = self
            .registries
            .code
            .portal(self.portal_id.address())
            .ok_or(PortalError::PortalAddressInvalid(self.portal_id))?;
        artifact
            .lifecycle_hook(operation, self.caller, value)
            .map_err(|rejection| PipelineError::HookRejected {
                operation,
                reason: rejection.reason,
            })
    }

    fn commit_attest(
        &mut self,
        payload: &AttestationPayload,
        value: u128,
    ) -> Result<AttestationId, PipelineError> {
        let r = &mut *self.registries;
        let id = r.attestations.attest(
            &r.schemas,
            &r.portals,
            &mut r.events,
            self.portal_id,
            payload,
            self.caller,
        )?;
        r.balances.deposit(self.portal_id.address(), value);
        Ok(id)
    }

    fn commit_bulk_attest(
        &mut self,
        payloads: &[AttestationPayload],
        value: u128,
    ) -> Result<Vec<AttestationId>, PipelineError> {
        let r = &mut *self.registries;
        let ids = r.attestations.bulk_attest(
            &r.schemas,
            &r.portals,
            &mut r.events,
            self.portal_id,
            payloads,
            self.caller,
        )?;
        r.balances.deposit(self.portal_id.address(), value);
        Ok(ids)
    }

    fn commit_replace(
        &mut self,
        attestation_id: AttestationId,
        payload: &AttestationPayload,
        value: u128,
    ) -> Result<AttestationId, PipelineError> {
        let r = &mut *self.registries;
        let id = r.attestations.replace(
            &r.schemas,
            &r.portals,
            &mut r.events,
            self.portal_id,
            attestation_id,
            payload,
            self.caller,
        )?;
        r.balances.deposit(self.portal_id.address(), value);
        Ok(id)
    }

    fn commit_bulk_replace(
        &mut self,
        items: &[(AttestationId, AttestationPayload)],
        value: u128,
    ) -> Result<Vec<AttestationId>, PipelineError> {
        let r = &mut *self.registries;
        let ids = r.attestations.bulk_replace(
            &r.schemas,
            &r.portals,
            &mut r.events,
            self.portal_id,
            items,
            self.caller,
        )?;
        r.balances.deposit(self.portal_id.address(), value);
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use atr_core::{
        InterfaceId, ModuleContext, ModuleId, PortalContract, Rejection, SchemaId,
        ValidationModule, MODULE_INTERFACE, PORTAL_INTERFACE,
    };

    use crate::default_portal::deploy_default_portal;

    struct RequireToken;

    impl ValidationModule for RequireToken {
        fn supports_interface(&self, interface: InterfaceId) -> bool {
            interface == MODULE_INTERFACE
        }

        fn validate(
            &self,
            _payload: &AttestationPayload,
            validation_payload: &[u8],
            _ctx: &ModuleContext,
        ) -> Result<(), Rejection> {
            if validation_payload == b"ok" {
                Ok(())
            } else {
                Err(Rejection::new("missing token"))
            }
        }
    }

    /// A portal whose hook refuses every bulk operation.
    struct NoBulkPortal;

    impl PortalContract for NoBulkPortal {
        fn supports_interface(&self, interface: InterfaceId) -> bool {
            interface == PORTAL_INTERFACE
        }

        fn modules(&self) -> Vec<ModuleId> {
            Vec::new()
        }

        fn lifecycle_hook(
            &self,
            operation: OperationKind,
            _caller: Address,
            _value: u128,
        ) -> Result<(), Rejection> {
            match operation {
                OperationKind::BulkAttest
                | OperationKind::BulkReplace
                | OperationKind::BulkRevoke => Err(Rejection::new("bulk operations disabled")),
                _ => Ok(()),
            }
        }
    }

    fn owner() -> Address {
        Address::derive("pipeline-owner")
    }

    struct World {
        registries: Registries,
        portal_id: PortalId,
        schema_id: SchemaId,
    }

    /// Registry owner allowlisted as issuer, one schema, one token-gated
    /// module, one revocable default portal composing that module.
    fn world() -> World {
        let mut registries = Registries::new(owner());
        let o = owner();
        registries.portals.set_issuer(&mut registries.events, o, o).unwrap();
        let schema_id = registries
            .schemas
            .register(&mut registries.events, "KYC", "basic KYC", "bool passed")
            .unwrap();

        let module_id = ModuleId(Address::derive("token-module"));
        registries
            .code
            .install_module(module_id.address(), Arc::new(RequireToken));
        let r = &mut registries;
        r.modules
            .register(&r.code, &mut r.events, module_id, "token", "")
            .unwrap();

        let portal_id = deploy_default_portal(
            &mut registries,
            o,
            vec![module_id],
            "Portal",
            "test portal",
            true,
            "Acme",
        )
        .unwrap();

        World {
            registries,
            portal_id,
            schema_id,
        }
    }

    fn payload(schema_id: SchemaId) -> AttestationPayload {
        AttestationPayload {
            schema_id,
            expiration_date: None,
            subject: b"did:example:alice".to_vec(),
            attestation_data: b"\x01".to_vec(),
        }
    }

    #[test]
    fn test_open_unknown_portal_fails() {
        let mut w = world();
        let ghost = PortalId(Address::derive("ghost"));
        let err = PortalSession::open(&mut w.registries, ghost, owner()).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Portal(PortalError::PortalNotRegistered(_))
        ));
    }

    #[test]
    fn test_attest_runs_chain_then_commits() {
        let mut w = world();
        let p = payload(w.schema_id);
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, owner()).unwrap();
        let id = session.attest(&p, &[b"ok".to_vec()], 7).unwrap();
        assert_eq!(id, AttestationId(1));
        assert_eq!(
            w.registries.balances.balance_of(w.portal_id.address()),
            7
        );
    }

    #[test]
    fn test_module_rejection_aborts_before_commit() {
        let mut w = world();
        let p = payload(w.schema_id);
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, owner()).unwrap();
        let err = session.attest(&p, &[b"bad".to_vec()], 7).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Module(ModuleError::ModulePayloadRejected { .. })
        ));
        assert_eq!(w.registries.attestations.attestation_count(), 0);
        assert_eq!(w.registries.balances.balance_of(w.portal_id.address()), 0);
    }

    #[test]
    fn test_replace_requires_portal_owner() {
        let mut w = world();
        let p = payload(w.schema_id);
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, owner()).unwrap();
        let id = session.attest(&p, &[b"ok".to_vec()], 0).unwrap();

        let stranger = Address::derive("stranger");
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, stranger).unwrap();
        let err = session.replace(id, &p, &[b"ok".to_vec()], 0).unwrap_err();
        assert!(matches!(err, PipelineError::OnlyPortalOwner { .. }));
        assert!(!w.registries.attestations.is_replaced(id).unwrap());
    }

    #[test]
    fn test_revoke_requires_portal_owner() {
        let mut w = world();
        let p = payload(w.schema_id);
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, owner()).unwrap();
        let id = session.attest(&p, &[b"ok".to_vec()], 0).unwrap();

        let stranger = Address::derive("stranger");
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, stranger).unwrap();
        let err = session.revoke(id).unwrap_err();
        assert!(matches!(err, PipelineError::OnlyPortalOwner { .. }));

        let mut session = PortalSession::open(&mut w.registries, w.portal_id, owner()).unwrap();
        session.revoke(id).unwrap();
        assert!(w.registries.attestations.is_revoked(id).unwrap());
    }

    #[test]
    fn test_custom_hook_can_refuse_bulk_ops() {
        let mut registries = Registries::new(owner());
        let o = owner();
        registries.portals.set_issuer(&mut registries.events, o, o).unwrap();
        let schema_id = registries
            .schemas
            .register(&mut registries.events, "S", "", "ctx")
            .unwrap();

        let portal_id = PortalId(Address::derive("no-bulk"));
        registries
            .code
            .install_portal(portal_id.address(), Arc::new(NoBulkPortal));
        let r = &mut registries;
        r.portals
            .register(&r.code, &mut r.events, o, portal_id, "NB", "d", true, "o")
            .unwrap();

        let payloads = vec![payload(schema_id), payload(schema_id)];
        let vps = vec![Vec::new(), Vec::new()];
        let mut session = PortalSession::open(&mut registries, portal_id, o).unwrap();
        // Single issuance passes the hook.
        session.attest(&payloads[0], &[], 0).unwrap();
        // Bulk is refused by the hook, before any commit.
        let err = session.bulk_attest(&payloads, &vps, 0).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::HookRejected {
                operation: OperationKind::BulkAttest,
                ..
            }
        ));
        assert_eq!(registries.attestations.attestation_count(), 1);
    }

    #[test]
    fn test_withdraw_owner_gated_and_funded() {
        let mut w = world();
        let p = payload(w.schema_id);
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, owner()).unwrap();
        session.attest(&p, &[b"ok".to_vec()], 100).unwrap();

        let sink = Address::derive("sink");
        let stranger = Address::derive("stranger");
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, stranger).unwrap();
        assert!(matches!(
            session.withdraw(sink, 10).unwrap_err(),
            PipelineError::OnlyPortalOwner { .. }
        ));

        let mut session = PortalSession::open(&mut w.registries, w.portal_id, owner()).unwrap();
        assert!(matches!(
            session.withdraw(sink, 1000).unwrap_err(),
            PipelineError::WithdrawFail(_)
        ));
        session.withdraw(sink, 60).unwrap();
        assert_eq!(w.registries.balances.balance_of(sink), 60);
        assert_eq!(w.registries.balances.balance_of(w.portal_id.address()), 40);
    }

    #[test]
    fn test_bulk_attest_value_credited_once() {
        let mut w = world();
        let payloads = vec![payload(w.schema_id), payload(w.schema_id)];
        let vps = vec![vec![b"ok".to_vec()], vec![b"ok".to_vec()]];
        let mut session = PortalSession::open(&mut w.registries, w.portal_id, owner()).unwrap();
        let ids = session.bulk_attest(&payloads, &vps, 9).unwrap();
        assert_eq!(ids.len(), 2);
        assert_eq!(w.registries.balances.balance_of(w.portal_id.address()), 9);
    }
}
