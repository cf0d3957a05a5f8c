use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use url::Url;

use super::{ResolveStrategy, Step};
use crate::http::HttpClient;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<(meta|img|base)\b([^>]*)>").expect("valid tag regex")
});

static ATTR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([A-Za-z_:][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+))"#)
        .expect("valid attribute regex")
});

/// Fetches a generic HTML page and picks the image it advertises.
///
/// Preference order: the `og:image` meta tag, then the `src` of the first
/// `<img>` element. When neither yields a URL the page URL itself is returned.
#[derive(Clone, Copy, Debug, Default)]
pub struct HtmlPage;

impl ResolveStrategy for HtmlPage {
    fn name(&self) -> &'static str {
        "html-page"
    }

    fn attempt(&self, url: &str, http: &dyn HttpClient) -> Result<Step, String> {
        let page = Url::parse(url).map_err(|e| format!("invalid URL: {e}"))?;
        if !matches!(page.scheme(), "http" | "https") {
            return Err(format!("unsupported scheme '{}'", page.scheme()));
        }

        let body = http.get_text(page.as_str()).map_err(|e| e.to_string())?;
        match extract_image_url(&body, &page) {
            Some(found) => Ok(Step::Done(found)),
            None => {
                tracing::debug!(url, "no image advertised by page");
                Ok(Step::Done(url.to_string()))
            }
        }
    }
}

/// Extracts the advertised image URL from an HTML document, resolved against
/// `page` (or the document's `<base href>` when present).
pub fn extract_image_url(html: &str, page: &Url) -> Option<String> {
    let mut og_image = None;
    // Only the first <img> counts, even when it has no src.
    let mut first_img: Option<Option<String>> = None;
    let mut base = None;

    for caps in TAG.captures_iter(html) {
        let tag = caps[1].to_ascii_lowercase();
        let attrs = parse_attrs(&caps[2]);

        match tag.as_str() {
            "meta" if og_image.is_none() => {
                let is_og = ["property", "name"]
                    .iter()
                    .any(|key| attrs.get(*key).is_some_and(|v| v.eq_ignore_ascii_case("og:image")));
                if is_og {
                    og_image = attrs.get("content").filter(|v| !v.trim().is_empty()).cloned();
                }
            }
            "img" if first_img.is_none() => {
                first_img = Some(attrs.get("src").filter(|v| !v.trim().is_empty()).cloned());
            }
            "base" if base.is_none() => {
                base = attrs.get("href").and_then(|href| page.join(href.trim()).ok());
            }
            _ => {}
        }
    }

    let base = base.unwrap_or_else(|| page.clone());
    og_image
        .or(first_img.flatten())
        .and_then(|raw| base.join(raw.trim()).ok())
        .map(String::from)
}

fn parse_attrs(raw: &str) -> HashMap<String, String> {
    ATTR.captures_iter(raw)
        .map(|caps| {
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            (caps[1].to_ascii_lowercase(), value)
        })
        .collect()
}

/// Decodes the handful of entities that show up in attribute URLs.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&#x2F;", "/")
        .replace("&amp;", "&")
}
