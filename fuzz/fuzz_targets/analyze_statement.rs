#![no_main]

use libfuzzer_sys::fuzz_target;
use schemaforge_core::{order_statements, CreateStatement};

fuzz_target!(|data: &[u8]| {
    if let Ok(sql) = std::str::from_utf8(data) {
        let statements: Vec<CreateStatement> = sql
            .split("\n\n")
            .filter_map(|text| CreateStatement::parse(text).ok())
            .collect();

        let _ = order_statements(statements);
    }
});
