//! Classification of raw drop/paste payloads into image references.
//!
//! Drag-and-drop and clipboard payloads arrive as loosely structured text:
//! bare paths (sometimes wrapped in braces), URLs, or chunks of HTML copied
//! out of a browser. [`classify`] turns such a string into a [`Reference`]
//! without touching the network.
//!
//! Rules are tried in order and the first match wins:
//! 1. strip enclosing braces and whitespace
//! 2. an existing local file
//! 3. a string that starts with `http://` or `https://`
//! 4. an `<img ... src="...">` fragment
//! 5. the first `http(s)://` token anywhere in the text

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

static IMG_SRC: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<img[^>]+src=["']([^"']+)["']"#).expect("valid img regex")
});

static URL_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("valid url regex"));

/// What a raw input string denotes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    /// A file that exists on the local filesystem.
    LocalFile(PathBuf),
    /// A remote URL, possibly still indirect (see [`crate::resolve`]).
    RemoteUrl(String),
    /// Nothing usable was found.
    Unresolvable,
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reference::LocalFile(path) => write!(f, "local file: {}", path.display()),
            Reference::RemoteUrl(url) => write!(f, "remote url: {}", url),
            Reference::Unresolvable => write!(f, "unresolvable"),
        }
    }
}

/// Classifies a raw payload, checking the local filesystem for rule 2.
pub fn classify(raw: &str) -> Reference {
    classify_with(raw, |path| path.is_file())
}

/// Classifies a raw payload using `is_file` to decide whether a candidate
/// string names an existing local file.
pub fn classify_with<F>(raw: &str, is_file: F) -> Reference
where
    F: Fn(&Path) -> bool,
{
    let data = trim_payload(raw);

    if !data.is_empty() && is_file(Path::new(data)) {
        return Reference::LocalFile(PathBuf::from(data));
    }

    if data.starts_with("http://") || data.starts_with("https://") {
        return Reference::RemoteUrl(data.to_string());
    }

    if let Some(src) = IMG_SRC.captures(data).and_then(|caps| caps.get(1)) {
        return Reference::RemoteUrl(src.as_str().to_string());
    }

    if let Some(token) = URL_TOKEN.find(data) {
        return Reference::RemoteUrl(token.as_str().to_string());
    }

    Reference::Unresolvable
}

/// Strips any mix of enclosing braces and whitespace.
fn trim_payload(raw: &str) -> &str {
    raw.trim_matches(|c: char| c == '{' || c == '}' || c.is_whitespace())
}
