//! Schema modeling: descriptors in, table models out.

mod builder;
mod tracker;
mod type_names;

pub use builder::{SchemaBuild, SchemaModelBuilder};
pub use tracker::{SchemaTracker, TableClaim};
pub use type_names::{TypeNameMap, TypeNameOverrides};
