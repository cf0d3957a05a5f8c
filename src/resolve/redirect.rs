use super::{ResolveStrategy, Step};
use crate::http::HttpClient;

/// Unwraps a redirect-wrapper URL whose true destination travels in a single
/// query parameter, e.g. `https://www.google.com/url?url=<destination>`.
#[derive(Clone, Debug)]
pub struct RedirectParam {
    /// Registrable host the wrapper lives on; subdomains match too.
    pub host: &'static str,
    /// Exact path of the wrapper endpoint.
    pub path: &'static str,
    /// Query parameter carrying the destination.
    pub param: &'static str,
}

impl RedirectParam {
    /// Google's search-result click-through wrapper.
    pub fn google() -> Self {
        Self {
            host: "google.com",
            path: "/url",
            param: "url",
        }
    }

    fn matches_host(&self, host: &str) -> bool {
        host == self.host
            || host
                .strip_suffix(self.host)
                .is_some_and(|prefix| prefix.ends_with('.'))
    }
}

impl ResolveStrategy for RedirectParam {
    fn name(&self) -> &'static str {
        "redirect-param"
    }

    fn attempt(&self, url: &str, _http: &dyn HttpClient) -> Result<Step, String> {
        let Ok(parsed) = url::Url::parse(url) else {
            return Ok(Step::Pass);
        };
        let Some(host) = parsed.host_str() else {
            return Ok(Step::Pass);
        };
        if !self.matches_host(host) || parsed.path() != self.path {
            return Ok(Step::Pass);
        }

        let Some(destination) = parsed
            .query_pairs()
            .find(|(key, _)| key == self.param)
            .map(|(_, value)| value.into_owned())
        else {
            return Ok(Step::Pass);
        };

        match url::Url::parse(&destination) {
            Ok(target) if matches!(target.scheme(), "http" | "https") => {
                Ok(Step::Rewrite(destination))
            }
            _ => Err(format!(
                "'{}' parameter is not an http(s) URL: {destination}",
                self.param
            )),
        }
    }
}
