//! Unwinding indirect image URLs.
//!
//! A dropped URL often points at a page about an image rather than the image
//! itself: a wiki `File:` page, a search engine redirect wrapper, or an
//! arbitrary article. [`Resolver`] runs an ordered chain of
//! [`ResolveStrategy`] values over the URL until one of them settles on a
//! final address.
//!
//! Resolution never fails. A strategy error is recorded as a degradation
//! warning and the chain continues with the URL unchanged, so the fetch stage
//! can still try the input directly.

mod html;
mod redirect;
mod wiki;

pub use html::{extract_image_url, HtmlPage};
pub use redirect::RedirectParam;
pub use wiki::WikiFilePage;

use crate::http::HttpClient;

/// Extensions that are fetched directly without looking at HTML.
pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp"];

/// Outcome of a single strategy.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Step {
    /// The strategy does not apply to this URL.
    Pass,
    /// Substitute the URL and keep going.
    Rewrite(String),
    /// Stop here with this URL.
    Done(String),
}

/// One link in the resolution chain.
pub trait ResolveStrategy {
    /// Short name used in logs and warnings.
    fn name(&self) -> &'static str;

    /// Inspects `url`, possibly using the network.
    ///
    /// An `Err` means the strategy applied but could not complete; the
    /// resolver logs it and continues with `url` unchanged.
    fn attempt(&self, url: &str, http: &dyn HttpClient) -> Result<Step, String>;
}

/// Result of resolving a URL.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolution {
    /// Best-effort direct image URL.
    pub url: String,
    /// Names of strategies that changed or settled the URL, in order.
    pub applied: Vec<&'static str>,
    /// Degradation warnings, one per failed strategy.
    pub warnings: Vec<String>,
}

impl Resolution {
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Ordered chain of resolution strategies.
pub struct Resolver {
    strategies: Vec<Box<dyn ResolveStrategy>>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new(vec![
            Box::new(WikiFilePage),
            Box::new(RedirectParam::google()),
            Box::new(DirectExtension),
            Box::new(HtmlPage),
        ])
    }
}

impl Resolver {
    pub fn new(strategies: Vec<Box<dyn ResolveStrategy>>) -> Self {
        Self { strategies }
    }

    /// Resolves `url` to a best-effort direct image URL.
    pub fn resolve(&self, url: &str, http: &dyn HttpClient) -> Resolution {
        let mut current = url.to_string();
        let mut applied = Vec::new();
        let mut warnings = Vec::new();

        for strategy in &self.strategies {
            match strategy.attempt(&current, http) {
                Ok(Step::Pass) => {}
                Ok(Step::Rewrite(next)) => {
                    tracing::debug!(strategy = strategy.name(), from = %current, to = %next, "rewrote url");
                    applied.push(strategy.name());
                    current = next;
                }
                Ok(Step::Done(last)) => {
                    tracing::debug!(strategy = strategy.name(), from = %current, to = %last, "resolved url");
                    applied.push(strategy.name());
                    current = last;
                    break;
                }
                Err(message) => {
                    tracing::warn!(strategy = strategy.name(), url = %current, %message, "resolution degraded");
                    warnings.push(format!("{}: {}", strategy.name(), message));
                }
            }
        }

        Resolution {
            url: current,
            applied,
            warnings,
        }
    }
}

/// Settles on URLs whose path already ends in a known image extension.
///
/// A wiki `File:` page whose API lookup failed also ends in an extension, so
/// it settles here and reaches the decoder as HTML.
#[derive(Clone, Copy, Debug, Default)]
pub struct DirectExtension;

impl ResolveStrategy for DirectExtension {
    fn name(&self) -> &'static str {
        "direct-extension"
    }

    fn attempt(&self, url: &str, _http: &dyn HttpClient) -> Result<Step, String> {
        if has_image_extension(url) {
            Ok(Step::Done(url.to_string()))
        } else {
            Ok(Step::Pass)
        }
    }
}

/// Whether the path of `url` ends in one of [`IMAGE_EXTENSIONS`].
///
/// Query strings and fragments are ignored. Strings that do not parse as URLs
/// are checked as-is.
pub fn has_image_extension(url: &str) -> bool {
    let path = match url::Url::parse(url) {
        Ok(parsed) => parsed.path().to_ascii_lowercase(),
        Err(_) => url.to_ascii_lowercase(),
    };
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}
