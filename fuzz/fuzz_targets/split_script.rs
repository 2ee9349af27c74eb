#![no_main]

use libfuzzer_sys::fuzz_target;
use schemaforge_core::{split_script, DatabaseKind};
use std::path::Path;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    if let Ok(sql) = std::str::from_utf8(rest) {
        let kind = DatabaseKind::ALL[usize::from(selector) % DatabaseKind::ALL.len()];
        let _ = split_script(sql, kind, Path::new("fuzz.sql"));
    }
});
