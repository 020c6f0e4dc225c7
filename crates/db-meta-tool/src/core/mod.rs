//! Core abstractions shared by the runner, reconstructor, and exporter.
//!
//! - [`schema`]: domain, table, column, and procedure descriptors
//! - [`traits`]: the database client seam ([`ScriptTarget`], [`CatalogSource`], [`Connector`])
//!
//! Driver modules implement the traits; everything else is written against
//! them so it can be tested with in-memory implementations.

pub mod schema;
pub mod traits;

pub use schema::{
    ColumnDescriptor, DomainDescriptor, FieldSpec, ParameterDescriptor, ParameterDirection,
    ProcedureDescriptor, TableDescriptor,
};
pub use traits::{CatalogSource, Connector, ScriptTarget};
