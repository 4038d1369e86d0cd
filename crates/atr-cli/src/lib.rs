//! # atr-cli — Attestation Registry Stack Command-Line Interface
//!
//! Structured clap-based CLI over the registry and portal crates.
//!
//! ## Subcommands
//!
//! - `demo` — stand up a fresh deployment and run an issue/replace/revoke
//!   scenario, printing the resulting event log
//! - `schema-id` — derive the content-derived schema identifier for a
//!   context string
//!
//! ## Crate Policy
//!
//! CLI construction (argument parsing) is separated from business logic;
//! handler functions delegate to the domain crates.

pub mod demo;
pub mod schema_id;
