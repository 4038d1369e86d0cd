//! # Schema Registry
//!
//! Immutable claim-schema descriptors keyed by a content-derived id. The
//! id is the SHA-256 digest of the canonical bytes of the context string,
//! so the same claim structure resolves to the same id everywhere; name
//! and description are display metadata and do not participate in
//! identity.
//!
//! There is no update or delete operation — a schema, once registered,
//! is published forever.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use atr_core::error::CanonicalizationError;
use atr_core::{sha256_digest, CanonicalBytes, SchemaId};

use crate::event::{EventLog, RegistryEvent};

/// A registered claim-schema descriptor.
///
/// The schema content itself is the opaque `context` string; this stack
/// does not prescribe a claim-schema encoding language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    /// Content-derived identifier.
    pub id: SchemaId,
    /// Display name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// The structural context string the id is derived from.
    pub context: String,
}

/// Errors raised by schema registry preconditions.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// A schema with the same content-derived id is already registered.
    #[error("schema {0} is already registered")]
    SchemaAlreadyExists(SchemaId),

    /// The schema name is empty.
    #[error("schema name must not be empty")]
    SchemaNameMissing,

    /// The schema context string is empty.
    #[error("schema context must not be empty")]
    SchemaContextMissing,

    /// No schema with this id is registered.
    #[error("schema {0} is not registered")]
    SchemaNotFound(SchemaId),

    /// Canonicalization of the context string failed.
    #[error("schema canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

/// Registry of immutable claim schemas.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<SchemaId, Schema>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the content-derived id for a context string.
    ///
    /// Any party can compute a schema's id ahead of registration and check
    /// whether it is already published.
    pub fn schema_id_for(context: &str) -> Result<SchemaId, SchemaError> {
        let bytes = CanonicalBytes::new(&context)?;
        Ok(SchemaId(sha256_digest(&bytes)))
    }

    /// Register a new schema.
    ///
    /// # Errors
    ///
    /// - `SchemaNameMissing` / `SchemaContextMissing` for empty metadata.
    /// - `SchemaAlreadyExists` if the content-derived id collides with a
    ///   registered schema. Prior state is left unchanged.
    pub fn register(
        &mut self,
        events: &mut EventLog,
        name: &str,
        description: &str,
        context: &str,
    ) -> Result<SchemaId, SchemaError> {
        if name.is_empty() {
            return Err(SchemaError::SchemaNameMissing);
        }
        if context.is_empty() {
            return Err(SchemaError::SchemaContextMissing);
        }
        let id = Self::schema_id_for(context)?;
        if self.schemas.contains_key(&id) {
            return Err(SchemaError::SchemaAlreadyExists(id));
        }

        self.schemas.insert(
            id,
            Schema {
                id,
                name: name.to_string(),
                description: description.to_string(),
                context: context.to_string(),
            },
        );
        events.emit(RegistryEvent::SchemaRegistered {
            schema_id: id,
            name: name.to_string(),
        });
        tracing::info!(schema_id = %id, name, "schema registered");
        Ok(id)
    }

    /// Look up a schema by id.
    pub fn get_schema(&self, id: SchemaId) -> Result<&Schema, SchemaError> {
        self.schemas.get(&id).ok_or(SchemaError::SchemaNotFound(id))
    }

    /// Whether a schema with this id is registered.
    pub fn is_registered(&self, id: SchemaId) -> bool {
        self.schemas.contains_key(&id)
    }

    /// Number of registered schemas.
    pub fn schema_count(&self) -> usize {
        self.schemas.len()
    }

    /// Ids of all registered schemas, sorted for stable output.
    pub fn schema_ids(&self) -> Vec<SchemaId> {
        let mut ids: Vec<SchemaId> = self.schemas.keys().copied().collect();
        ids.sort();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_and_log() -> (SchemaRegistry, EventLog) {
        (SchemaRegistry::new(), EventLog::new())
    }

    #[test]
    fn test_register_assigns_content_derived_id() {
        let (mut registry, mut events) = registry_and_log();
        let id = registry
            .register(&mut events, "KYC", "basic KYC claim", "bool passed")
            .unwrap();
        assert_eq!(id, SchemaRegistry::schema_id_for("bool passed").unwrap());
        assert_eq!(registry.schema_count(), 1);
        assert!(registry.is_registered(id));
    }

    #[test]
    fn test_id_stable_across_lookups() {
        let (mut registry, mut events) = registry_and_log();
        let id = registry
            .register(&mut events, "KYC", "", "bool passed")
            .unwrap();
        assert_eq!(registry.get_schema(id).unwrap().id, id);
        assert_eq!(registry.get_schema(id).unwrap().context, "bool passed");
    }

    #[test]
    fn test_duplicate_context_rejected() {
        let (mut registry, mut events) = registry_and_log();
        registry
            .register(&mut events, "KYC", "", "bool passed")
            .unwrap();
        let err = registry
            .register(&mut events, "KYC v2", "same content", "bool passed")
            .unwrap_err();
        assert!(matches!(err, SchemaError::SchemaAlreadyExists(_)));
        // Prior state unchanged: one schema, one event.
        assert_eq!(registry.schema_count(), 1);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_empty_metadata_rejected() {
        let (mut registry, mut events) = registry_and_log();
        assert!(matches!(
            registry.register(&mut events, "", "d", "ctx"),
            Err(SchemaError::SchemaNameMissing)
        ));
        assert!(matches!(
            registry.register(&mut events, "n", "d", ""),
            Err(SchemaError::SchemaContextMissing)
        ));
        assert_eq!(registry.schema_count(), 0);
        assert!(events.is_empty());
    }

    #[test]
    fn test_unknown_schema_not_found() {
        let (registry, _) = registry_and_log();
        let id = SchemaRegistry::schema_id_for("never registered").unwrap();
        assert!(matches!(
            registry.get_schema(id),
            Err(SchemaError::SchemaNotFound(_))
        ));
    }

    #[test]
    fn test_register_emits_event() {
        let (mut registry, mut events) = registry_and_log();
        let id = registry
            .register(&mut events, "KYC", "", "bool passed")
            .unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(
            events.records()[0].event,
            RegistryEvent::SchemaRegistered {
                schema_id: id,
                name: "KYC".to_string(),
            }
        );
    }

    #[test]
    fn test_schema_ids_sorted_and_complete() {
        let (mut registry, mut events) = registry_and_log();
        let a = registry.register(&mut events, "A", "", "ctx-a").unwrap();
        let b = registry.register(&mut events, "B", "", "ctx-b").unwrap();
        let ids = registry.schema_ids();
        assert_eq!(ids.len(), 2);
        assert!(ids.contains(&a));
        assert!(ids.contains(&b));
        assert!(ids.windows(2).all(|w| w[0] <= w[1]));
    }
}
