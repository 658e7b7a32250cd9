//! Fuzz target for export.toml parsing.

#![no_main]

use gdpr_core::ExportConfig;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = ExportConfig::from_toml(text);
    }
});
