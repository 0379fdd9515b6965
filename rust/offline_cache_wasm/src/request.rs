// Request description and the URL helpers the fetch path relies on

use url::{Origin, Url};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Destination {
    /// Top-level page navigation.
    Document,
    Other,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestInfo {
    pub method: String,
    pub url: String,
    pub destination: Destination,
}

impl RequestInfo {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: url.to_string(),
            destination: Destination::Other,
        }
    }

    pub fn navigate(url: &str) -> Self {
        Self {
            destination: Destination::Document,
            ..Self::get(url)
        }
    }

    pub fn is_get(&self) -> bool {
        self.method.eq_ignore_ascii_case("GET")
    }
}

fn tuple_origin(url: &str) -> Option<Origin> {
    let origin = Url::parse(url).ok()?.origin();
    origin.is_tuple().then_some(origin)
}

/// `scheme://host[:port]` of an absolute URL, with the default port dropped.
/// `None` for relative input and for URLs without a network origin.
pub fn origin_of(url: &str) -> Option<String> {
    tuple_origin(url).map(|origin| origin.ascii_serialization())
}

/// True when `url` and `origin` share scheme, host and port.
pub fn is_same_origin(url: &str, origin: &str) -> bool {
    match (tuple_origin(url), tuple_origin(origin)) {
        (Some(left), Some(right)) => left == right,
        _ => false,
    }
}

/// Resolves a manifest entry (`./x`, `../x`, `/x`, `x` or absolute) against
/// the worker scope, yielding the normalized key the browser caches it under.
pub fn resolve_url(scope: &str, target: &str) -> Result<String, url::ParseError> {
    Ok(Url::parse(scope)?.join(target)?.to_string())
}
