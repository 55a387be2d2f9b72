// ABOUTME: Whitelist configuration for the sanitizer, including BetaScope, HeadingJoin, OpaqueRule and Options.
// ABOUTME: SanitizerBuilder provides a fluent API for constructing Sanitizer instances with custom settings.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::SanitizeError;
use crate::logging::{Logger, TracingLogger};
use crate::sanitizer::Sanitizer;

/// Which elements receive the beta marker class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BetaScope {
    #[default]
    All,
    Whitelisted,
}

/// How unified heading fragments are joined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeadingJoin {
    /// Fragments are concatenated; only explicit breaks separate them.
    #[default]
    Concatenate,
    /// A break marker follows every non-break fragment.
    BreakBetween,
}

/// An element/class combination passed through verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueRule {
    pub category: String,
    pub selector: String,
}

impl OpaqueRule {
    pub fn new(category: impl Into<String>, selector: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            selector: selector.into(),
        }
    }
}

/// Whitelist and policy configuration, read-only during processing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub allowed_tags: BTreeSet<String>,
    pub allowed_attrs: BTreeMap<String, Vec<String>>,
    pub beta_suffix: String,
    pub beta_scope: BetaScope,
    pub opaque_blocks: Vec<OpaqueRule>,
    pub heading_tags: Vec<String>,
    pub heading_join: HeadingJoin,
    pub max_depth: usize,
}

const DEFAULT_ALLOWED_TAGS: &[&str] = &[
    "h2", "h3", "p", "strong", "em", "img", "hr", "ul", "ol", "li", "br", "a", "iframe",
    "summary", "details", "section",
];

const DEFAULT_ALLOWED_ATTRS: &[(&str, &[&str])] = &[
    ("img", &["src", "alt"]),
    ("a", &["href", "target"]),
    ("p", &["class", "id"]),
    ("h2", &["class", "id"]),
];

impl Default for Options {
    fn default() -> Self {
        Self {
            allowed_tags: DEFAULT_ALLOWED_TAGS.iter().map(|t| t.to_string()).collect(),
            allowed_attrs: DEFAULT_ALLOWED_ATTRS
                .iter()
                .map(|(tag, attrs)| {
                    (
                        tag.to_string(),
                        attrs.iter().map(|a| a.to_string()).collect(),
                    )
                })
                .collect(),
            beta_suffix: "-beta".to_string(),
            beta_scope: BetaScope::All,
            opaque_blocks: vec![
                OpaqueRule::new("PRODUCT_INFO", "div.product-info"),
                OpaqueRule::new("IFRAME_CONTAINER", "div.fx-iframeContainer"),
                OpaqueRule::new("IFRAME_TAG", "iframe"),
            ],
            heading_tags: vec!["h2".to_string(), "h3".to_string()],
            heading_join: HeadingJoin::Concatenate,
            max_depth: 512,
        }
    }
}

impl Options {
    /// Parse options from JSON; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SanitizeError> {
        serde_json::from_str(json)
            .map_err(|e| SanitizeError::config(format!("invalid options JSON: {}", e)))
    }

    /// Read options from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SanitizeError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            SanitizeError::config(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json_str(&json)
    }

    pub fn is_allowed_tag(&self, tag: &str) -> bool {
        self.allowed_tags.contains(tag)
    }

    /// Case-insensitive attribute check; tags without an entry allow nothing.
    pub fn is_allowed_attr(&self, tag: &str, attr: &str) -> bool {
        self.allowed_attrs
            .get(tag)
            .is_some_and(|attrs| attrs.iter().any(|a| a.eq_ignore_ascii_case(attr)))
    }

    pub fn is_heading(&self, tag: &str) -> bool {
        self.heading_tags.iter().any(|h| h == tag)
    }

    /// The marker class for a tag, e.g. `p-beta`.
    pub fn beta_class(&self, tag: &str) -> String {
        format!("{}{}", tag, self.beta_suffix)
    }
}

/// Builder for constructing Sanitizer instances with custom configuration.
#[derive(Debug, Clone)]
pub struct SanitizerBuilder {
    opts: Options,
    logger: Arc<dyn Logger>,
}

impl SanitizerBuilder {
    /// Create a new SanitizerBuilder with default options.
    pub fn new() -> Self {
        Self {
            opts: Options::default(),
            logger: Arc::new(TracingLogger),
        }
    }

    /// Replace every option at once.
    pub fn options(mut self, opts: Options) -> Self {
        self.opts = opts;
        self
    }

    /// Allow a tag with the given attributes.
    pub fn allow_tag<I, S>(mut self, tag: impl Into<String>, attrs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tag = tag.into();
        let attrs: Vec<String> = attrs.into_iter().map(Into::into).collect();
        if !attrs.is_empty() {
            self.opts.allowed_attrs.insert(tag.clone(), attrs);
        }
        self.opts.allowed_tags.insert(tag);
        self
    }

    /// Disallow a tag; its elements will be dissolved.
    pub fn deny_tag(mut self, tag: &str) -> Self {
        self.opts.allowed_tags.remove(tag);
        self.opts.allowed_attrs.remove(tag);
        self
    }

    /// Set the marker class suffix.
    pub fn beta_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.opts.beta_suffix = suffix.into();
        self
    }

    /// Set which elements receive the marker class.
    pub fn beta_scope(mut self, scope: BetaScope) -> Self {
        self.opts.beta_scope = scope;
        self
    }

    /// Add an opaque block rule.
    pub fn preserve(mut self, category: impl Into<String>, selector: impl Into<String>) -> Self {
        self.opts
            .opaque_blocks
            .push(OpaqueRule::new(category, selector));
        self
    }

    /// Set the heading join policy used by unification.
    pub fn heading_join(mut self, join: HeadingJoin) -> Self {
        self.opts.heading_join = join;
        self
    }

    /// Set the maximum element nesting depth accepted by the parser.
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.opts.max_depth = depth;
        self
    }

    /// Use a custom logger.
    pub fn logger(mut self, logger: Arc<dyn Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Build the Sanitizer, compiling the opaque block selectors.
    pub fn build(self) -> Result<Sanitizer, SanitizeError> {
        Sanitizer::new(self.opts, self.logger)
    }
}

impl Default for SanitizerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_catalog_whitelist() {
        let opts = Options::default();
        assert!(opts.is_allowed_tag("section"));
        assert!(!opts.is_allowed_tag("div"));
        assert!(opts.is_allowed_attr("img", "SRC"));
        assert!(opts.is_allowed_attr("a", "target"));
        assert!(!opts.is_allowed_attr("img", "style"));
        assert!(!opts.is_allowed_attr("h3", "class"));
        assert_eq!(opts.beta_class("h3"), "h3-beta");
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let opts =
            Options::from_json_str(r#"{"beta_suffix": "-v2", "heading_join": "break_between"}"#)
                .unwrap();
        assert_eq!(opts.beta_suffix, "-v2");
        assert_eq!(opts.heading_join, HeadingJoin::BreakBetween);
        assert_eq!(opts.allowed_tags, Options::default().allowed_tags);
        assert_eq!(opts.opaque_blocks.len(), 3);
    }

    #[test]
    fn bad_json_is_a_config_error() {
        let err = Options::from_json_str("{not json").unwrap_err();
        assert!(err.is_config());
    }

    #[test]
    fn reads_options_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"beta_scope": "whitelisted"}"#).unwrap();
        let opts = Options::from_json_file(&path).unwrap();
        assert_eq!(opts.beta_scope, BetaScope::Whitelisted);
    }

    #[test]
    fn builder_allows_and_denies_tags() {
        let sanitizer = SanitizerBuilder::new()
            .allow_tag("span", ["title"])
            .deny_tag("section")
            .build()
            .unwrap();
        let opts = sanitizer.options();
        assert!(opts.is_allowed_tag("span"));
        assert!(opts.is_allowed_attr("span", "title"));
        assert!(!opts.is_allowed_tag("section"));
    }
}
