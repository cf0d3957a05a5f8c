#![allow(dead_code)]

use proptest::prelude::*;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

/// Any mix of braces and whitespace that a drop payload may be wrapped in.
pub fn arb_wrapping() -> impl Strategy<Value = String> {
    proptest::collection::vec(prop_oneof![Just('{'), Just('}'), Just(' '), Just('\t'), Just('\n')], 0..6)
        .prop_map(|chars| chars.into_iter().collect())
}

/// File names that never contain braces or surrounding whitespace.
pub fn arb_file_stem() -> impl Strategy<Value = String> {
    "[A-Za-z0-9_-]{1,12}"
}

/// Plain URLs with an optional path, never ending in an image extension.
pub fn arb_page_url() -> impl Strategy<Value = String> {
    ("[a-z]{1,10}", "[a-z0-9/]{0,16}").prop_map(|(host, path)| format!("https://{host}.example/{path}"))
}

/// Names an output directory might contain: ordinals of varying width plus noise.
pub fn arb_dir_entry() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..20_000).prop_map(|n| format!("image_{n:04}.jpg")),
        (0u32..1_000).prop_map(|n| format!("image_{n}.jpg")),
        "[a-z]{1,8}\\.(txt|png|jpg)",
        Just("image_.jpg".to_string()),
        Just("image_00x1.jpg".to_string()),
    ]
}

/// Reference implementation: ordinal of a strictly matching name.
pub fn strict_ordinal(name: &str) -> Option<u32> {
    let digits = name.strip_prefix("image_")?.strip_suffix(".jpg")?;
    if digits.len() >= 4 && digits.chars().all(|c| c.is_ascii_digit()) {
        digits.parse().ok()
    } else {
        None
    }
}
