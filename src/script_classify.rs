//! Script URL classifier: a pure lookup + regex table mapping a
//! `<script>` reference to a canonical pattern key.
//!
//! Family precedence, in order: CMS path family, then known
//! library, then known tracking host, then third-party domain, then inline
//! signature, else an `other:{hash8}` bucket.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use url::Url;

static PATH_FAMILIES: &[(&str, &str)] = &[
    ("/wp-content/", "wp-content"),
    ("/wp-includes/", "wp-includes"),
    ("/sites/all/", "sites-all"),
    ("/sites/default/", "sites-default"),
    ("/media/", "media"),
    ("/skin/", "skin"),
    ("/templates/", "templates"),
    ("/modules/", "modules"),
];

static LIBRARY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(jquery|bootstrap|angular|react|vue|modernizr|underscore|lodash|backbone|ember)(?:[.\-][0-9a-z.\-]*)?\.js")
        .unwrap()
});

static TRACKING_HOSTS: &[(&str, &str)] = &[
    ("google-analytics.com", "google-analytics"),
    ("www.google-analytics.com", "google-analytics"),
    ("googletagmanager.com", "google-tag-manager"),
    ("www.googletagmanager.com", "google-tag-manager"),
    ("connect.facebook.net", "facebook-pixel"),
    ("static.hotjar.com", "hotjar"),
    ("cdn.segment.com", "segment"),
    ("cdn.mxpnl.com", "mixpanel"),
    ("analytics.twitter.com", "twitter-analytics"),
    ("snap.licdn.com", "linkedin-insight"),
];

static INLINE_SIGNATURES: &[(&str, &str)] = &[
    ("gtag(", "google-analytics-inline"),
    ("fbq(", "facebook-pixel-inline"),
    ("_gaq.push", "google-analytics-legacy-inline"),
    ("hj(", "hotjar-inline"),
];

fn hash8(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().take(4).map(|b| format!("{b:02x}")).collect()
}

/// Second-level domain of a host, e.g. `cdn.example.co.uk` -> `example.co.uk`
/// is out of scope (no public-suffix list); this keeps the common case of
/// `sub.example.com` -> `example.com`.
fn second_level_domain(host: &str) -> String {
    let parts: Vec<&str> = host.split('.').collect();
    if parts.len() <= 2 {
        host.to_string()
    } else {
        parts[parts.len() - 2..].join(".")
    }
}

/// Classify one script reference. `site_host` is the normalized host of the
/// page the script was observed on, used to decide first- vs third-party for
/// the `domain:*` family; pass `None` when unknown.
pub fn classify_script(src: Option<&str>, inline_content: Option<&str>, site_host: Option<&str>) -> String {
    if let Some(src) = src {
        let lower = src.to_lowercase();

        for (needle, family) in PATH_FAMILIES {
            if lower.contains(needle) {
                return format!("path:{family}");
            }
        }

        if let Some(m) = LIBRARY_PATTERN.find(&lower) {
            let name = LIBRARY_PATTERN
                .captures(m.as_str())
                .and_then(|c| c.get(1))
                .map(|g| g.as_str())
                .unwrap_or("unknown");
            return format!("library:{name}");
        }

        if let Ok(parsed) = Url::parse(src).or_else(|_| Url::parse(&format!("https://placeholder.invalid{src}"))) {
            if let Some(host) = parsed.host_str() {
                let host = host.to_lowercase();
                if let Some((_, name)) = TRACKING_HOSTS.iter().find(|(h, _)| *h == host) {
                    return format!("tracking:{name}");
                }

                let is_third_party = site_host
                    .map(|own| second_level_domain(own) != second_level_domain(&host))
                    .unwrap_or_else(|| src.starts_with("http://") || src.starts_with("https://") || src.starts_with("//"));

                if is_third_party && src.contains("://") {
                    return format!("domain:{}", second_level_domain(&host));
                }
            }
        }

        return format!("other:{}", hash8(src));
    }

    if let Some(content) = inline_content {
        for (needle, signature) in INLINE_SIGNATURES {
            if content.contains(needle) {
                return format!("inline:{signature}");
            }
        }
        return format!("inline:{}", hash8(content.trim()));
    }

    format!("other:{}", hash8(""))
}
