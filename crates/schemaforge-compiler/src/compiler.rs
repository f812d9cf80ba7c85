//! Schema compilation orchestrator.

use std::time::Instant;

use indexmap::IndexMap;
use schemaforge_config::CompilerConfig;
use schemaforge_core::{discover_indexes, SchemaError, SchemaNode, Value};
use tracing::{info, trace, warn};

use crate::code::{CodeModel, Operation};
use crate::compiled::CompiledSchema;
use crate::error::{CompileError, Result};
use crate::fingerprint::fingerprint;
use crate::handlers::HandlerChain;
use crate::synth::{synthesize, Bindings};
use crate::walker::walk;

/// Compiles a schema into a [`CompiledSchema`].
///
/// ```
/// use schemaforge_compiler::SchemaCompiler;
/// use schemaforge_core::{s, Value};
///
/// let schema = s::object([("id", s::string().key()), ("name", s::string())]);
/// let compiled = SchemaCompiler::new(&schema, "people").compile().unwrap();
///
/// let entity = Value::from(serde_json::json!({"id": "p1", "name": "Ada"}));
/// assert_eq!(compiled.get_id(&entity), Value::from("p1"));
/// ```
pub struct SchemaCompiler {
    schema: SchemaNode,
    collection: String,
    config: CompilerConfig,
    injections: IndexMap<String, Value>,
    chains: Vec<HandlerChain>,
}

impl SchemaCompiler {
    pub fn new(schema: &SchemaNode, collection: impl Into<String>) -> Self {
        Self {
            schema: schema.clone(),
            collection: collection.into(),
            config: CompilerConfig::default(),
            injections: IndexMap::new(),
            chains: HandlerChain::all(),
        }
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    /// Provides the dependency that `.inject(name)` properties receive.
    pub fn inject(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.injections.insert(name.into(), value.into());
        self
    }

    /// Replaces the standard chain of `chain`'s operation.
    pub fn with_chain(mut self, chain: HandlerChain) -> Self {
        match self.chains.iter_mut().find(|c| c.operation() == chain.operation()) {
            Some(slot) => *slot = chain,
            None => self.chains.push(chain),
        }
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Walks the schema once, runs every handler chain per property and
    /// links the resulting code models.
    pub fn compile(&self) -> Result<CompiledSchema> {
        let started = Instant::now();
        info!(
            event = "compile_start",
            collection = %self.collection,
            max_depth = self.config.max_depth,
        );

        let compiled = self.build().map_err(|source| {
            warn!(event = "compile_failed", collection = %self.collection, error = %source);
            CompileError::new(&self.collection, source)
        })?;

        info!(
            event = "compile_end",
            collection = %self.collection,
            property_count = compiled.all_properties.len(),
            key_count = compiled.id_properties.len(),
            index_count = compiled.indexes.len(),
            fingerprint = %format!("{:016x}", compiled.id),
            duration_us = started.elapsed().as_micros() as u64,
        );
        Ok(compiled)
    }

    fn build(&self) -> schemaforge_core::Result<CompiledSchema> {
        let mut models: Vec<CodeModel> = self
            .chains
            .iter()
            .map(|chain| CodeModel::new(chain.operation()))
            .collect();

        let tree = walk(&self.schema, self.config.max_depth, |property| {
            for (chain, model) in self.chains.iter().zip(models.iter_mut()) {
                chain.handle(property, model)?;
            }
            Ok(())
        })?;

        let id_properties: Vec<_> = tree.all.iter().filter(|p| p.is_key()).cloned().collect();
        if id_properties.is_empty() {
            return Err(SchemaError::NoKeyProperty);
        }

        let models: IndexMap<Operation, CodeModel> =
            models.into_iter().map(|model| (model.operation(), model)).collect();
        let listings: IndexMap<Operation, String> = models
            .iter()
            .map(|(operation, model)| (*operation, model.to_string()))
            .collect();
        if self.config.trace_code_model {
            for (operation, listing) in &listings {
                trace!(event = "code_model", operation = operation.name(), listing = %listing);
            }
        }

        let bindings = Bindings {
            collection: self.collection.clone(),
            injections: self.injections.clone(),
        };
        let ops = synthesize(&models, &self.config, &bindings)?;

        Ok(CompiledSchema {
            collection: self.collection.clone(),
            id: fingerprint(tree.all.iter().map(|p| p.path()), &self.collection),
            indexes: discover_indexes(&tree.all),
            properties: tree.roots,
            all_properties: tree.all,
            id_properties,
            default_tracking: self.config.tracking_mode(),
            listings,
            ops,
        })
    }
}

/// Compiles `schema` for `collection` with the default configuration.
pub fn compile(schema: &SchemaNode, collection: &str) -> Result<CompiledSchema> {
    SchemaCompiler::new(schema, collection).compile()
}
