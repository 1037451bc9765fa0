//! Fuzz target for EntryName validation and collision resolution.
//!
//! Run with: cargo +nightly fuzz run entry_name
//!
//! Properties checked:
//! - Accepted names fit the fixed-width name field
//! - Accepted names never contain a path separator or NUL
//! - Collision candidates are either valid names or rejected, never panics

#![no_main]

use assetpack::EntryName;
use assetpack::name::MAX_NAME_LENGTH;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(name) = EntryName::new(s) else {
        return;
    };

    assert!(name.len() <= MAX_NAME_LENGTH);
    assert!(!name.as_str().contains(['/', '\\', '\0']));
    assert_eq!(EntryName::from_field(&name.to_field()).as_ref(), Some(&name));

    let (stem, ext) = name.split_extension();
    assert_eq!(format!("{}{}", stem, ext), name.as_str());

    if let Ok(next) = name.unique(|n| n == s) {
        assert_ne!(next.as_str(), s);
    }
});
