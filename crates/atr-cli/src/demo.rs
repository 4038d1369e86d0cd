//! # Demo Subcommand
//!
//! Stands up a fresh in-memory deployment and walks it through a full
//! lifecycle: schema and module registration, default-portal deployment,
//! issuance, replacement, revocation, and withdrawal. Prints the event
//! log as JSON so the run can be inspected or piped to an indexer.

use std::sync::Arc;

use clap::Args;

use atr_core::{
    Address, AttestationPayload, InterfaceId, ModuleContext, ModuleId, Rejection,
    ValidationModule, MODULE_INTERFACE,
};
use atr_portal::{deploy_default_portal, PortalSession};
use atr_registry::Registries;

/// Arguments for the demo subcommand.
#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Number of attestations to issue in the bulk step.
    #[arg(long, default_value_t = 3)]
    pub batch: usize,

    /// Pretty-print the event log.
    #[arg(long)]
    pub pretty: bool,
}

/// Accepts every payload whose subject is non-empty.
struct RequireSubject;

impl ValidationModule for RequireSubject {
    fn supports_interface(&self, interface: InterfaceId) -> bool {
        interface == MODULE_INTERFACE
    }

    fn validate(
        &self,
        payload: &AttestationPayload,
        _validation_payload: &[u8],
        _ctx: &ModuleContext,
    ) -> Result<(), Rejection> {
        if payload.subject.is_empty() {
            Err(Rejection::new("subject must not be empty"))
        } else {
            Ok(())
        }
    }
}

/// Run the demo scenario end to end.
pub fn run(args: &DemoArgs) -> anyhow::Result<()> {
    let owner = Address::derive("demo-registry-owner");
    let mut registries = Registries::new(owner);
    registries
        .portals
        .set_issuer(&mut registries.events, owner, owner)?;

    let schema_id = registries.schemas.register(
        &mut registries.events,
        "KYC",
        "basic KYC claim",
        "{\"passed\": \"bool\"}",
    )?;

    let module_id = ModuleId(Address::derive("demo-subject-module"));
    registries
        .code
        .install_module(module_id.address(), Arc::new(RequireSubject));
    let r = &mut registries;
    r.modules.register(
        &r.code,
        &mut r.events,
        module_id,
        "require-subject",
        "rejects payloads without a subject",
    )?;

    let portal_id = deploy_default_portal(
        &mut registries,
        owner,
        vec![module_id],
        "Demo Portal",
        "issues demo KYC attestations",
        true,
        "Demo Operator",
    )?;

    let payload = AttestationPayload {
        schema_id,
        expiration_date: None,
        subject: b"did:example:alice".to_vec(),
        attestation_data: b"{\"passed\": true}".to_vec(),
    };

    let mut session = PortalSession::open(&mut registries, portal_id, owner)?;
    let first = session.attest_v2(&payload, &[Vec::new()], 10)?;
    let replacement = session.replace_v2(first, &payload, &[Vec::new()], 10)?;
    session.revoke(replacement)?;

    let payloads = vec![payload; args.batch];
    let vps = vec![vec![Vec::new()]; args.batch];
    let bulk_ids = session.bulk_attest_v2(&payloads, &vps, 5)?;
    tracing::info!(issued = bulk_ids.len(), "bulk issuance committed");

    let sink = Address::derive("demo-treasury");
    session.withdraw(sink, 20)?;

    let log = registries.events.to_json()?;
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&log)?
    } else {
        serde_json::to_string(&log)?
    };
    println!("{rendered}");
    Ok(())
}
