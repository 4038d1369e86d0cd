//! # Schema-Id Subcommand
//!
//! Derives the content-derived schema identifier for a context string, so
//! issuers can check whether a schema is already published before
//! registering it.

use clap::Args;

use atr_registry::SchemaRegistry;

/// Arguments for the schema-id subcommand.
#[derive(Args, Debug)]
pub struct SchemaIdArgs {
    /// The schema context string to derive the id from.
    pub context: String,
}

/// Print the schema id for the given context.
pub fn run(args: &SchemaIdArgs) -> anyhow::Result<()> {
    let id = SchemaRegistry::schema_id_for(&args.context)?;
    println!("{id}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_context_same_id() {
        let a = SchemaRegistry::schema_id_for("bool passed").unwrap();
        let b = SchemaRegistry::schema_id_for("bool passed").unwrap();
        assert_eq!(a, b);
    }
}
