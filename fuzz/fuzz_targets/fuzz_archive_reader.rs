//! Fuzz target for export archive reading.
//!
//! Archives handed to `dispose` and `inspect` are caller-supplied files;
//! reading them must return errors, never panic.

#![no_main]

use gdpr_bundle::ArchiveReader;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(mut reader) = ArchiveReader::from_bytes(data.to_vec()) {
        for name in reader.entry_names() {
            let _ = reader.read(&name);
        }
    }
});
