//! KDL schema for config.kdl.

use kdl::{KdlDocument, KdlEntry, KdlNode, KdlValue};
use serde::{Deserialize, Serialize};

/// Output format preference for CLI commands.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// JSON output (default, machine-readable)
    #[default]
    Json,
    /// Human-readable output
    Human,
}

impl OutputFormat {
    /// Parse from string, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(OutputFormat::Json),
            "human" => Some(OutputFormat::Human),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Json => "json",
            OutputFormat::Human => "human",
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Keys accepted in config.kdl and by `lens config set`.
pub const CONFIG_KEYS: [&str; 4] = ["output-format", "tmdb-api-key", "tmdb-pages", "tmdb-base-url"];

/// Upper bound on pages, matching the movie API's own limit.
pub const MAX_TMDB_PAGES: u32 = 500;

/// Preferences stored in config.kdl.
///
/// # KDL Schema
///
/// ```kdl
/// output-format "human"  // or "json"
/// tmdb-api-key "0123456789abcdef"
/// tmdb-pages 50
/// tmdb-base-url "https://api.themoviedb.org/3"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LensConfig {
    pub output_format: Option<OutputFormat>,

    /// API key for the movie-catalog source
    pub tmdb_api_key: Option<String>,

    /// Number of popular-movie pages to pull
    pub tmdb_pages: Option<u32>,

    pub tmdb_base_url: Option<String>,
}

fn first_string<'a>(doc: &'a KdlDocument, key: &str) -> Option<&'a str> {
    doc.get(key)?.entries().first()?.value().as_string()
}

fn first_integer(doc: &KdlDocument, key: &str) -> Option<i128> {
    doc.get(key)?.entries().first()?.value().as_integer()
}

fn string_node(name: &str, value: &str) -> KdlNode {
    let mut node = KdlNode::new(name);
    node.push(KdlEntry::new(KdlValue::String(value.to_string())));
    node
}

impl LensConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the config values.
    pub fn validate(&self) -> Result<(), String> {
        if let Some(pages) = self.tmdb_pages {
            if pages == 0 || pages > MAX_TMDB_PAGES {
                return Err(format!(
                    "tmdb-pages must be 1-{}, got {}",
                    MAX_TMDB_PAGES, pages
                ));
            }
        }
        if let Some(ref url) = self.tmdb_base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(format!("tmdb-base-url must be an http(s) URL, got {}", url));
            }
        }
        Ok(())
    }

    /// Parse config from a KDL document. Invalid values are ignored.
    pub fn from_kdl(doc: &KdlDocument) -> Self {
        let mut config = Self::new();

        config.output_format = first_string(doc, "output-format").and_then(OutputFormat::parse);
        config.tmdb_api_key = first_string(doc, "tmdb-api-key").map(str::to_string);
        config.tmdb_pages = first_integer(doc, "tmdb-pages")
            .filter(|p| (1..=MAX_TMDB_PAGES as i128).contains(p))
            .map(|p| p as u32);
        config.tmdb_base_url = first_string(doc, "tmdb-base-url").map(str::to_string);

        config
    }

    /// Convert config to a KDL document.
    pub fn to_kdl(&self) -> KdlDocument {
        let mut doc = KdlDocument::new();

        if let Some(format) = self.output_format {
            doc.nodes_mut().push(string_node("output-format", format.as_str()));
        }

        if let Some(ref key) = self.tmdb_api_key {
            doc.nodes_mut().push(string_node("tmdb-api-key", key));
        }

        if let Some(pages) = self.tmdb_pages {
            let mut node = KdlNode::new("tmdb-pages");
            node.push(KdlEntry::new(KdlValue::Integer(pages as i128)));
            doc.nodes_mut().push(node);
        }

        if let Some(ref url) = self.tmdb_base_url {
            doc.nodes_mut().push(string_node("tmdb-base-url", url));
        }

        doc.autoformat();
        doc
    }

    /// Merge another config into this one.
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &LensConfig) {
        if other.output_format.is_some() {
            self.output_format = other.output_format;
        }
        if other.tmdb_api_key.is_some() {
            self.tmdb_api_key = other.tmdb_api_key.clone();
        }
        if other.tmdb_pages.is_some() {
            self.tmdb_pages = other.tmdb_pages;
        }
        if other.tmdb_base_url.is_some() {
            self.tmdb_base_url = other.tmdb_base_url.clone();
        }
    }

    /// Set one key from its string form, as given on the command line.
    ///
    /// The config is left unchanged when the value is rejected.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), String> {
        let mut next = self.clone();
        match key {
            "output-format" => {
                next.output_format = Some(OutputFormat::parse(value).ok_or_else(|| {
                    format!("output-format must be json or human, got {}", value)
                })?);
            }
            "tmdb-api-key" => next.tmdb_api_key = Some(value.to_string()),
            "tmdb-pages" => {
                let pages = value
                    .parse::<u32>()
                    .map_err(|_| format!("tmdb-pages must be a number, got {}", value))?;
                next.tmdb_pages = Some(pages);
            }
            "tmdb-base-url" => next.tmdb_base_url = Some(value.to_string()),
            _ => {
                return Err(format!(
                    "unknown config key '{}' (expected one of: {})",
                    key,
                    CONFIG_KEYS.join(", ")
                ));
            }
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Mask a secret for display, keeping the first and last four characters.
pub fn mask_secret(secret: &str) -> String {
    let chars: Vec<char> = secret.chars().collect();
    if chars.len() <= 12 {
        let head: String = chars.iter().take(4.min(chars.len())).collect();
        format!("{}...", head)
    } else {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_parse() {
        assert_eq!(OutputFormat::parse("JSON"), Some(OutputFormat::Json));
        assert_eq!(OutputFormat::parse("human"), Some(OutputFormat::Human));
        assert_eq!(OutputFormat::parse("yaml"), None);
    }

    #[test]
    fn test_kdl_round_trip() {
        let config = LensConfig {
            output_format: Some(OutputFormat::Human),
            tmdb_api_key: Some("secret".to_string()),
            tmdb_pages: Some(5),
            tmdb_base_url: Some("http://localhost:8080/3".to_string()),
        };

        let text = config.to_kdl().to_string();
        let doc: KdlDocument = text.parse().unwrap();
        assert_eq!(LensConfig::from_kdl(&doc), config);
    }

    #[test]
    fn test_from_kdl_ignores_invalid_values() {
        let doc: KdlDocument = "output-format \"yaml\"\ntmdb-pages 0\n".parse().unwrap();
        let config = LensConfig::from_kdl(&doc);
        assert_eq!(config.output_format, None);
        assert_eq!(config.tmdb_pages, None);
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = LensConfig {
            output_format: Some(OutputFormat::Json),
            tmdb_pages: Some(50),
            ..Default::default()
        };
        base.merge(&LensConfig {
            tmdb_pages: Some(3),
            ..Default::default()
        });
        assert_eq!(base.output_format, Some(OutputFormat::Json));
        assert_eq!(base.tmdb_pages, Some(3));
    }

    #[test]
    fn test_set_validates() {
        let mut config = LensConfig::new();
        assert!(config.set("output-format", "human").is_ok());
        assert!(config.set("tmdb-pages", "0").is_err());
        assert!(config.set("tmdb-pages", "many").is_err());
        assert!(config.set("tmdb-base-url", "ftp://example.com").is_err());
        assert!(config.set("editor", "vim").is_err());
    }

    #[test]
    fn test_mask_secret() {
        assert_eq!(mask_secret("abc"), "abc...");
        assert_eq!(mask_secret("0123456789abcdef"), "0123...cdef");
    }
}
