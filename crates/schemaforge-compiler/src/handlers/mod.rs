//! Per-operation handler chains.
//!
//! A [`HandlerChain`] is an ordered list of [`Handler`]s for one operation.
//! Each property is offered to the handlers in order; the first handler whose
//! predicate accepts it writes into the operation's code model and the chain
//! stops. Handlers that accept a property but emit nothing are how a chain
//! skips properties (unmapped fields, computed values) before the general
//! handlers see them.

mod lifecycle;
mod literal;
mod scalar;


use schemaforge_core::{PropertyInfo, Result};

use crate::code::{CodeModel, Operation};

/// Predicate deciding whether a handler takes a property.
pub type Accepts = fn(&PropertyInfo) -> bool;

/// Writes a property's contribution into a code model.
pub type Emit = fn(&PropertyInfo, &mut CodeModel) -> Result<()>;

/// One step of a chain.
#[derive(Clone, Copy)]
pub struct Handler {
    pub name: &'static str,
    pub accepts: Accepts,
    pub emit: Emit,
}

impl Handler {
    pub const fn new(name: &'static str, accepts: Accepts, emit: Emit) -> Self {
        Self { name, accepts, emit }
    }

    /// A handler that takes matching properties and contributes nothing.
    pub const fn skip(name: &'static str, accepts: Accepts) -> Self {
        Self {
            name,
            accepts,
            emit: emit_nothing,
        }
    }
}

fn emit_nothing(_: &PropertyInfo, _: &mut CodeModel) -> Result<()> {
    Ok(())
}

/// Ordered handlers of one operation.
pub struct HandlerChain {
    operation: Operation,
    handlers: Vec<Handler>,
}

impl HandlerChain {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            handlers: Vec::new(),
        }
    }

    /// Appends a handler to the end of the chain.
    pub fn with(mut self, handler: Handler) -> Self {
        self.handlers.push(handler);
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn handlers(&self) -> &[Handler] {
        &self.handlers
    }

    /// Offers `property` to each handler in turn.
    ///
    /// Returns the name of the handler that took it, or `None` when every
    /// handler declined.
    pub fn handle(&self, property: &PropertyInfo, model: &mut CodeModel) -> Result<Option<&'static str>> {
        for handler in &self.handlers {
            if (handler.accepts)(property) {
                (handler.emit)(property, model)?;
                return Ok(Some(handler.name));
            }
        }
        Ok(None)
    }

    /// The built-in chain for `operation`.
    pub fn standard(operation: Operation) -> Self {
        let handlers = match operation {
            Operation::Enrich => lifecycle::enrich(),
            Operation::Merge => lifecycle::merge(),
            Operation::ChangeTracking => lifecycle::change_tracking(),
            Operation::Freeze => lifecycle::freeze(),
            Operation::Prepare => literal::prepare(),
            Operation::Strip => literal::strip(),
            Operation::Clone => literal::clone(),
            Operation::Deserialize => literal::deserialize(),
            Operation::Serialize => literal::serialize(),
            Operation::Compare => scalar::compare(),
            Operation::Hash => scalar::hash(),
            Operation::HashType => scalar::hash_type(),
            Operation::IdSelector => scalar::id_selector(),
        };
        handlers
            .into_iter()
            .fold(Self::new(operation), HandlerChain::with)
    }

    /// Standard chains for every operation, in [`Operation::ALL`] order.
    pub fn all() -> Vec<Self> {
        Operation::ALL.into_iter().map(Self::standard).collect()
    }
}

fn is_data_leaf(p: &PropertyInfo) -> bool {
    p.is_leaf()
}

fn is_object(p: &PropertyInfo) -> bool {
    p.is_object()
}

fn is_computed(p: &PropertyInfo) -> bool {
    p.is_computed()
}

fn is_function(p: &PropertyInfo) -> bool {
    p.is_function()
}

fn is_derived(p: &PropertyInfo) -> bool {
    p.is_computed() || p.is_function()
}

fn is_unmapped(p: &PropertyInfo) -> bool {
    p.is_effectively_unmapped()
}

fn is_key_leaf(p: &PropertyInfo) -> bool {
    p.is_leaf() && p.is_key()
}
