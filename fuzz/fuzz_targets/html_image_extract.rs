//! Fuzz target for HTML image extraction.
//!
//! Arbitrary documents must never panic the tag scanner or URL joining.

#![no_main]

use droplabel::resolve::extract_image_url;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() > 10 * 1024 * 1024 {
        return;
    }

    let html = String::from_utf8_lossy(data);
    if let Ok(page) = url::Url::parse("https://example.com/articles/page.html") {
        let _ = extract_image_url(&html, &page);
    }
});
