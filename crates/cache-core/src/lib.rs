//! Engine-boundary types for the query result cache.
//!
//! The cache observes a query engine from the outside: it is handed a
//! syntax-tree handle, an output schema, per-query settings and the chunks
//! a pipeline produces. This crate defines those boundary types so the
//! cache crate stays independent of any particular engine.

pub mod ast;
pub mod chunk;
pub mod error;
pub mod schema;
pub mod settings;
pub mod source;
pub mod types;

pub use ast::{AstRef, SyntaxTree, TextTree, TreeHash};
pub use chunk::{chunk_allocated_bytes, concat_chunks};
pub use error::{CacheError, Result};
pub use schema::{Field, Schema};
pub use settings::Settings;
pub use source::{ChunkSource, ReplaySource};
pub use types::DataType;
