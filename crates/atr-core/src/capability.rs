//! # Capability Interfaces
//!
//! The behavioral interfaces that deployed artifacts implement: validation
//! modules and portals. Before an artifact is trusted in either role it
//! must pass a capability-introspection check — `supports_interface` with
//! the role's interface tag — and the check is repeated before every
//! invocation, not just at registration.
//!
//! ## Reentrancy
//!
//! Both traits take `&self` and receive only payload data and context.
//! A module or hook cannot reach back into a registry, so no external
//! call can observe or mutate ledger state before the commit step of the
//! portal pipeline.

use thiserror::Error;

use crate::identity::{Address, ModuleId};
use crate::payload::{AttestationPayload, ModuleContext, OperationKind};

/// A behavioral interface tag, checked at registration and invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct InterfaceId(pub [u8; 4]);

/// The validation-module capability.
pub const MODULE_INTERFACE: InterfaceId = InterfaceId(*b"mod1");

/// The portal capability.
pub const PORTAL_INTERFACE: InterfaceId = InterfaceId(*b"ptl1");

/// A module or hook refused the operation.
#[derive(Debug, Clone, Error)]
#[error("{reason}")]
pub struct Rejection {
    /// Why the operation was refused.
    pub reason: String,
}

impl Rejection {
    /// Create a rejection with the given reason.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// A unit of pluggable validation logic invoked in a portal's issuance
/// pipeline.
///
/// Implementations are pure checks over the payload: return `Ok(())` to
/// accept it, or a [`Rejection`] to abort the enclosing operation. A
/// rejection from any module in a chain voids the entire operation,
/// including every other item of a bulk call.
pub trait ValidationModule: Send + Sync {
    /// Capability introspection: does this artifact implement `interface`?
    fn supports_interface(&self, interface: InterfaceId) -> bool;

    /// Validate one attestation payload.
    ///
    /// `validation_payload` is the caller-supplied opaque input addressed
    /// to this module (one entry per module in the chain). `ctx` carries
    /// the transferred value and, when forwarded, the caller identity,
    /// attester identity, and operation kind.
    fn validate(
        &self,
        payload: &AttestationPayload,
        validation_payload: &[u8],
        ctx: &ModuleContext,
    ) -> Result<(), Rejection>;
}

/// An issuer-controlled endpoint mediating attestation issuance,
/// replacement, and revocation.
///
/// A portal declares the module chain it composes and may override the
/// pre-commit lifecycle hook. The hook runs after the module chain and
/// before the ledger commit; the pipeline has already applied the
/// owner-identity guard for replace and revoke operations by the time the
/// hook is invoked.
pub trait PortalContract: Send + Sync {
    /// Capability introspection: does this artifact implement `interface`?
    fn supports_interface(&self, interface: InterfaceId) -> bool;

    /// The ordered module chain this portal composes.
    ///
    /// Captured by the portal registry at registration time.
    fn modules(&self) -> Vec<ModuleId>;

    /// Pre-commit extension point. Default: accept.
    fn lifecycle_hook(
        &self,
        operation: OperationKind,
        caller: Address,
        value: u128,
    ) -> Result<(), Rejection> {
        let _ = (operation, caller, value);
        Ok(())
    }
}
