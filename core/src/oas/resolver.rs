#![deny(missing_docs)]

//! # Reference Resolver
//!
//! Resolves reference tokens against a document's named schemas.
//!
//! Handles:
//! - Alias chains (a named schema that is itself a `$ref`).
//! - Cycle detection through a visited set scoped to one chain.
//!
//! No state outlives a call: every traversal owns its own [`RefPath`], so
//! resolution is reentrant.

use crate::error::{AppError, AppResult};
use crate::oas::models::DocumentModel;
use crate::oas::schemas::{RefToken, SchemaNode};
use indexmap::IndexSet;

/// The reference tokens followed so far along one alias chain.
///
/// Entering a token that is already on the path is a cycle.
#[derive(Debug, Clone, Default)]
pub struct RefPath {
    tokens: IndexSet<RefToken>,
}

impl RefPath {
    /// Creates an empty path.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes `token`, failing with [`AppError::CyclicReference`] if it is already on the path.
    pub fn enter(&mut self, token: &RefToken) -> AppResult<()> {
        if self.tokens.contains(token) {
            let mut chain: Vec<String> = self.tokens.iter().map(|t| t.to_string()).collect();
            chain.push(token.to_string());
            return Err(AppError::CyclicReference { chain });
        }
        self.tokens.insert(token.clone());
        Ok(())
    }
}

/// Looks up the schema a token names, without following further references.
pub fn lookup<'a>(doc: &'a DocumentModel, token: &RefToken) -> AppResult<&'a SchemaNode> {
    token
        .schema_name()
        .and_then(|name| doc.schemas.get(&name))
        .ok_or_else(|| AppError::UnresolvedReference(token.to_string()))
}

/// Resolves `token` to the first non-reference schema on its alias chain.
///
/// # Errors
///
/// * [`AppError::UnresolvedReference`] if any link of the chain has no named schema.
/// * [`AppError::CyclicReference`] if the chain revisits one of its tokens.
pub fn resolve<'a>(doc: &'a DocumentModel, token: &RefToken) -> AppResult<&'a SchemaNode> {
    let mut path = RefPath::new();
    let mut current = token;
    loop {
        path.enter(current)?;
        match lookup(doc, current)? {
            SchemaNode::Reference(next) => current = next,
            node => return Ok(node),
        }
    }
}
