//! JSON output formatting.

use crate::plan::{ApplyReport, Plan};
use serde::Serialize;

/// The plan and, when it was applied, what happened.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report<'a> {
    pub plan: &'a Plan,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied: Option<&'a ApplyReport>,
}

/// Format any serializable value as JSON.
///
/// If `compact` is true, outputs minified JSON without whitespace.
pub fn format_json<T: Serialize + ?Sized>(value: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(value).expect("serialization cannot fail")
    } else {
        serde_json::to_string_pretty(value).expect("serialization cannot fail")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Inputs;
    use crate::plan::build_plan;
    use schemaforge_core::{CreateStatement, DatabaseKind, SchemaModel, TypeNameMap};

    fn plan() -> Plan {
        let inputs = Inputs {
            statements: vec![
                CreateStatement::parse("CREATE TABLE orders (id INT, c INT references customers(id))")
                    .unwrap(),
                CreateStatement::parse("CREATE TABLE customers (id INT)").unwrap(),
            ],
            ..Default::default()
        };
        build_plan(inputs, SchemaModel::new(), DatabaseKind::Default, &TypeNameMap::standard())
            .unwrap()
    }

    #[test]
    fn test_json_pretty() {
        let plan = plan();
        let json = format_json(&Report { plan: &plan, applied: None }, false);
        assert!(json.contains('\n'));
        assert!(json.contains("dropOrder"));
        assert!(!json.contains("applied"));
    }

    #[test]
    fn test_json_compact() {
        let plan = plan();
        let json = format_json(&Report { plan: &plan, applied: None }, true);
        assert!(!json.starts_with("{\n"));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["plan"]["statements"][0]["tableName"], "customers");
        assert_eq!(value["plan"]["database"], "default");
    }
}
