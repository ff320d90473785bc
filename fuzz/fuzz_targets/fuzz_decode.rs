#![no_main]
use jot::{header, log};
use libfuzzer_sys::fuzz_target;
use std::io::Cursor;

// Arbitrary bytes behind a valid header must decode to records or a typed
// error, never a panic or an oversized allocation.
fuzz_target!(|data: &[u8]| {
    let mut bytes = jot::Header::new().to_bytes().to_vec();
    bytes.extend_from_slice(data);
    let mut file = Cursor::new(bytes);

    let _ = log::list(&mut file);
    if let Ok(report) = log::check(&mut file) {
        assert!(report.valid_len <= report.file_len);
    }

    // Raw input as a whole file exercises header validation too
    let mut raw = Cursor::new(data.to_vec());
    if header::init_or_validate(&mut raw).is_ok() {
        let _ = log::list(&mut raw);
    }
});
