//! Input shape: one `CaptureRecord` per crawled site.
//!
//! Produced externally by the crawler and the CMS detectors; consumed once
//! by the preprocessor and never mutated afterward.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// One or more raw header values, accepting both JSON shapes a crawler might
/// emit: a bare string for a single value, or an array for a repeated
/// header.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl OneOrMany {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(v) => vec![v],
            Self::Many(v) => v,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CaptureRecord {
    pub url: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "httpHeaders", default)]
    pub http_headers: HashMap<String, OneOrMany>,
    #[serde(rename = "metaTags", default)]
    pub meta_tags: Vec<MetaTagRecord>,
    #[serde(default)]
    pub scripts: Vec<ScriptRecord>,
    #[serde(rename = "detectionResults", default)]
    pub detection_results: Vec<DetectionResultRecord>,
    #[serde(rename = "robotsTxt", default)]
    pub robots_txt: Option<RobotsTxtRecord>,
}

/// The kind of HTML meta tag a pattern/value pair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MetaKind {
    Name,
    Property,
    HttpEquiv,
}

impl MetaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Property => "property",
            Self::HttpEquiv => "httpEquiv",
        }
    }
}

/// A single meta tag, normalized from whichever of `name` / `property` /
/// `httpEquiv` the crawler populated.
#[derive(Debug, Clone)]
pub struct MetaTagRecord {
    pub kind: MetaKind,
    pub key: String,
    pub content: String,
}

impl MetaTagRecord {
    /// Canonical pattern key, e.g. `name:generator`, `property:og:type`.
    pub fn pattern_key(&self) -> String {
        format!("{}:{}", self.kind.as_str(), self.key)
    }
}

/// Raw on-the-wire shape: exactly one of `name`/`property`/`httpEquiv` plus
/// `content`. Deserialized manually since the discriminant is the field
/// name itself, not a tag value.
impl<'de> Deserialize<'de> for MetaTagRecord {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct Raw {
            #[serde(default)]
            name: Option<String>,
            #[serde(default)]
            property: Option<String>,
            #[serde(rename = "httpEquiv", default)]
            http_equiv: Option<String>,
            #[serde(default)]
            content: String,
        }

        let raw = Raw::deserialize(deserializer)?;
        let (kind, key) = if let Some(name) = raw.name {
            (MetaKind::Name, name)
        } else if let Some(property) = raw.property {
            (MetaKind::Property, property)
        } else if let Some(http_equiv) = raw.http_equiv {
            (MetaKind::HttpEquiv, http_equiv)
        } else {
            return Err(serde::de::Error::custom(
                "meta tag must have one of name, property, or httpEquiv",
            ));
        };

        Ok(MetaTagRecord {
            kind,
            key,
            content: raw.content,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptRecord {
    #[serde(default)]
    pub src: Option<String>,
    #[serde(rename = "inlineContent", default)]
    pub inline_content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DetectionResultRecord {
    pub cms: String,
    pub confidence: f64,
    #[serde(default)]
    pub version: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RobotsTxtRecord {
    #[serde(rename = "httpHeaders", default)]
    pub http_headers: HashMap<String, OneOrMany>,
}

/// The unknown/no-detection CMS label used throughout the pipeline.
pub const UNKNOWN_CMS: &str = "Unknown";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meta_tag_picks_name_variant() {
        let json = r#"{"name": "generator", "content": "WordPress 6.2"}"#;
        let tag: MetaTagRecord = serde_json::from_str(json).unwrap();
        assert_eq!(tag.kind, MetaKind::Name);
        assert_eq!(tag.pattern_key(), "name:generator");
    }

    #[test]
    fn meta_tag_picks_property_variant() {
        let json = r#"{"property": "og:type", "content": "website"}"#;
        let tag: MetaTagRecord = serde_json::from_str(json).unwrap();
        assert_eq!(tag.kind, MetaKind::Property);
        assert_eq!(tag.pattern_key(), "property:og:type");
    }

    #[test]
    fn header_value_accepts_scalar_and_array() {
        let json = r#"{"server": "nginx", "set-cookie": ["a=1", "b=2"]}"#;
        let map: HashMap<String, OneOrMany> = serde_json::from_str(json).unwrap();
        assert_eq!(map.get("server").unwrap().clone().into_vec(), vec!["nginx"]);
        assert_eq!(
            map.get("set-cookie").unwrap().clone().into_vec(),
            vec!["a=1", "b=2"]
        );
    }

    #[test]
    fn full_capture_record_parses() {
        let json = r#"{
            "url": "https://example.com",
            "timestamp": "2024-01-15T00:00:00Z",
            "httpHeaders": {"server": "nginx", "x-pingback": "https://example.com/xmlrpc.php"},
            "metaTags": [{"name": "generator", "content": "WordPress 6.2"}],
            "scripts": [{"src": "/wp-content/themes/t/a.js"}],
            "detectionResults": [{"cms": "WordPress", "confidence": 0.95, "version": "6.2.1"}],
            "robotsTxt": {"httpHeaders": {"content-type": "text/plain"}}
        }"#;
        let record: CaptureRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.url, "https://example.com");
        assert_eq!(record.detection_results[0].cms, "WordPress");
        assert_eq!(record.robots_txt.unwrap().http_headers.len(), 1);
    }
}
