#![no_main]
use libfuzzer_sys::fuzz_target;
use privaudit::{audit, AuditConfig, ObjectImage};

fuzz_target!(|data: &[u8]| {
    if let Ok(image) = ObjectImage::parse(data) {
        let _ = audit(&image, &AuditConfig::default().with_scan_unaligned(true));
    }
});
