//! Fuzz target for drop payload classification.
//!
//! Feeds arbitrary text to the classifier, checking for panics or hangs in
//! the brace trimming and pattern matching.

#![no_main]

use droplabel::source::classify_with;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 1024 * 1024 {
        return;
    }

    if let Ok(text) = std::str::from_utf8(data) {
        let _ = classify_with(text, |_| false);
    }
});
