//! # atr-portal — Portal Execution Pipeline
//!
//! Drives attestation issuance, replacement, and revocation through a
//! registered portal. Every write funnels through a [`PortalSession`],
//! which runs the portal's declared module chain, then the portal's
//! lifecycle hook, then — only if both accepted — the ledger commit.
//!
//! ## Security Invariant
//!
//! The module chain and the lifecycle hook run strictly before the ledger
//! commit, and neither can reach back into any registry. No pluggable code
//! ever observes half-applied state or a not-yet-final attestation id.
//!
//! Replace, revoke, and withdraw are gated on the portal owner's identity
//! before the portal's own hook is consulted, so a custom portal cannot
//! waive the ownership requirement by overriding its hook.

pub mod default_portal;
pub mod guard;
pub mod pipeline;

pub use default_portal::{deploy_default_portal, DefaultPortal};
pub use pipeline::{PipelineError, PortalSession};
