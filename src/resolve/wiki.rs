use std::collections::BTreeMap;

use serde::Deserialize;

use super::{ResolveStrategy, Step};
use crate::http::HttpClient;

/// Swaps a MediaWiki `File:` page for the asset URL reported by the wiki's
/// image-info API.
///
/// The API endpoint is derived from the page host, so language editions and
/// Commons work alike.
#[derive(Clone, Copy, Debug, Default)]
pub struct WikiFilePage;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    query: Option<ApiQuery>,
}

#[derive(Debug, Deserialize)]
struct ApiQuery {
    #[serde(default)]
    pages: BTreeMap<String, ApiPage>,
}

#[derive(Debug, Deserialize)]
struct ApiPage {
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    url: Option<String>,
}

impl ResolveStrategy for WikiFilePage {
    fn name(&self) -> &'static str {
        "wiki-file-page"
    }

    fn attempt(&self, url: &str, http: &dyn HttpClient) -> Result<Step, String> {
        let Some((host, title)) = file_page_title(url) else {
            return Ok(Step::Pass);
        };

        let api_url = image_info_url(&host, &title)?;
        let body = http.get_text(api_url.as_str()).map_err(|e| e.to_string())?;
        let asset = asset_url_from_response(&body)?;
        Ok(Step::Rewrite(asset))
    }
}

/// Returns `(host, title)` when `url` addresses a `File:` (or legacy
/// `Image:`) page under `/wiki/`.
fn file_page_title(url: &str) -> Option<(String, String)> {
    let parsed = url::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_string();
    let encoded = parsed.path().strip_prefix("/wiki/")?;
    let title = percent_encoding::percent_decode_str(encoded)
        .decode_utf8()
        .ok()?
        .into_owned();

    let namespace = title.split_once(':')?.0;
    if namespace.eq_ignore_ascii_case("file") || namespace.eq_ignore_ascii_case("image") {
        Some((host, title))
    } else {
        None
    }
}

fn image_info_url(host: &str, title: &str) -> Result<url::Url, String> {
    let mut api = url::Url::parse(&format!("https://{host}/w/api.php"))
        .map_err(|e| format!("invalid API endpoint for host '{host}': {e}"))?;
    api.query_pairs_mut()
        .append_pair("action", "query")
        .append_pair("titles", title)
        .append_pair("prop", "imageinfo")
        .append_pair("iiprop", "url")
        .append_pair("format", "json");
    Ok(api)
}

fn asset_url_from_response(body: &str) -> Result<String, String> {
    let response: ApiResponse =
        serde_json::from_str(body).map_err(|e| format!("malformed image-info response: {e}"))?;

    response
        .query
        .into_iter()
        .flat_map(|query| query.pages.into_values())
        .flat_map(|page| page.imageinfo)
        .find_map(|info| info.url)
        .ok_or_else(|| "image-info response carried no image URL".to_string())
}
