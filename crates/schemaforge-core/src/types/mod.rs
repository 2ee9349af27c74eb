//! Data types shared across the engine.
//!
//! Descriptors are the read-only input handed over by the repository's
//! metadata layer; the model types are what the builder produces from them.

mod common;
mod database;
mod descriptor;
mod model;

pub use common::{issue_codes, Issue, IssueCount, Severity};
pub use database::DatabaseKind;
pub use descriptor::{
    ColumnDescriptor, ItemDescriptor, RawColumnType, ReferenceTarget, RepositoryDescriptor,
    TableDescriptor,
};
pub(crate) use model::table_key;
pub use model::{
    ColumnModel, ForeignKeyEdge, IndexModel, JdbcType, SchemaModel, TableModel,
};
