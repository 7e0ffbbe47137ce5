//! URL normalization to a single site key: lowercase
//! scheme+host, strip default ports, drop trailing `/`, drop fragment,
//! preserve path and query.

use url::Url;

/// Normalizes a URL to the key used to collapse capture records into one
/// `SiteData`. Returns `None` for strings that don't parse as URLs at all
/// (counted as `malformed` by the caller).
pub fn normalize(raw: &str) -> Option<String> {
    let mut parsed = Url::parse(raw).ok()?;

    parsed.set_fragment(None);

    let scheme = parsed.scheme().to_lowercase();
    let default_port = match scheme.as_str() {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    };
    if parsed.port() == default_port {
        let _ = parsed.set_port(None);
    }

    let host = parsed.host_str()?.to_lowercase();
    let _ = parsed.set_host(Some(&host));
    let _ = parsed.set_scheme(&scheme);

    let mut normalized = parsed.to_string();
    if normalized.ends_with('/') {
        normalized.pop();
    }

    Some(normalized)
}
