//! Output formatting modules.

pub mod json;
pub mod sql;
pub mod text;

pub use json::{format_json, Report};
pub use sql::format_sql;
pub use text::format_text;
