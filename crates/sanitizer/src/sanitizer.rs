// ABOUTME: Sanitizer entry point: validates, parses, runs every cleaning pass in order and minifies.
// ABOUTME: Any failure falls back to the original input, logged with the product identifier.

//! Per-description sanitize state machine.
//!
//! ```text
//! Validate ──invalid──▶ abort (input returned, warn)
//!    │
//! Parse ─────failed───▶ abort (input returned, warn)
//!    │
//! Transform(pass…) ─failed─▶ abort (input returned, error)
//!    │
//! Minify ──▶ Done (beta-tagged markup, preserved blocks restored)
//! ```
//!
//! Every description is processed independently; a `Sanitizer` only holds
//! read-only configuration and can be shared across threads.

use std::sync::Arc;

use scraper::Html;

use crate::dom::brs::normalize_void_tags;
use crate::dom::cleaners::Pass;
use crate::dom::preserve::BlockPreserver;
use crate::dom::tree::{find_unterminated, Fragment, OpaqueMatches, TreeError};
use crate::error::{SanitizeError, Stage};
use crate::extractors::headings::HeadingExtractor;
use crate::logging::Logger;
use crate::options::{Options, SanitizerBuilder};
use crate::result::HeadingReport;

/// Cleans product descriptions according to a whitelist configuration.
#[derive(Debug, Clone)]
pub struct Sanitizer {
    opts: Options,
    preserver: BlockPreserver,
    logger: Arc<dyn Logger>,
}

impl Sanitizer {
    /// Create a sanitizer; fails when an opaque block selector does not parse.
    pub fn new(opts: Options, logger: Arc<dyn Logger>) -> Result<Self, SanitizeError> {
        let preserver = BlockPreserver::compile(&opts.opaque_blocks)?;
        Ok(Self {
            opts,
            preserver,
            logger,
        })
    }

    /// Create a new SanitizerBuilder for custom configuration.
    pub fn builder() -> SanitizerBuilder {
        SanitizerBuilder::new()
    }

    pub fn options(&self) -> &Options {
        &self.opts
    }

    /// Sanitize one description, returning `raw` unchanged on any failure.
    pub fn sanitize(&self, raw: &str, product_id: Option<&str>) -> String {
        self.or_original(raw, product_id, self.try_sanitize(raw, product_id))
    }

    /// Step failures are logged at error level, rejected input at warn.
    fn or_original(
        &self,
        raw: &str,
        product_id: Option<&str>,
        outcome: Result<String, SanitizeError>,
    ) -> String {
        match outcome {
            Ok(html) => html,
            Err(err) => {
                let message = err.to_string();
                if err.is_step() {
                    self.logger.error(product_id, &message);
                } else {
                    self.logger.warn(product_id, &message);
                }
                raw.to_string()
            }
        }
    }

    /// Sanitize one description, surfacing the failure instead of falling back.
    pub fn try_sanitize(&self, raw: &str, product_id: Option<&str>) -> Result<String, SanitizeError> {
        self.run(raw, product_id, Pass::apply)
    }

    fn run<F>(&self, raw: &str, product_id: Option<&str>, apply: F) -> Result<String, SanitizeError>
    where
        F: Fn(Pass, &mut Fragment, &Options) -> Result<(), TreeError>,
    {
        validate(raw).map_err(|e| e.with_product_id(product_id))?;

        let mut frag = self
            .parse(raw)
            .map_err(|e| e.with_product_id(product_id))?;

        for pass in Pass::ORDER {
            apply(pass, &mut frag, &self.opts).map_err(|e| {
                SanitizeError::step(Stage::Transform(pass), e.to_string())
                    .with_product_id(product_id)
            })?;
        }

        let html = normalize_void_tags(&frag.to_minified_html());
        let preserved: Vec<String> = frag.preserved().iter().map(|b| b.placeholder()).collect();
        self.logger.info(
            product_id,
            &format!(
                "sanitized {} bytes into {} bytes, preserved [{}]",
                raw.len(),
                html.len(),
                preserved.join(", ")
            ),
        );
        Ok(html)
    }

    /// Normalize void spellings, parse, and swap opaque blocks for markers.
    fn parse(&self, raw: &str) -> Result<Fragment, SanitizeError> {
        let normalized = normalize_void_tags(raw);
        if let Some(offset) = find_unterminated(&normalized) {
            return Err(SanitizeError::parse(format!(
                "unterminated tag at byte {}",
                offset
            )));
        }
        let doc = Html::parse_fragment(&normalized);
        let opaque = if self.preserver.is_empty() {
            OpaqueMatches::new()
        } else {
            self.preserver.find(&doc)
        };
        Fragment::from_html(&doc, &opaque, self.opts.max_depth)
            .map_err(|e| SanitizeError::parse(e.to_string()))
    }

    /// Extract heading structure; see [`HeadingExtractor`].
    pub fn extract_headings(&self, raw: &str) -> Result<HeadingReport, SanitizeError> {
        HeadingExtractor::new(&self.opts).extract(raw)
    }
}

/// Input must be non-empty and contain at least one angle bracket.
fn validate(raw: &str) -> Result<(), SanitizeError> {
    if raw.is_empty() {
        return Err(SanitizeError::invalid_input("empty description"));
    }
    if !raw.contains('<') && !raw.contains('>') {
        return Err(SanitizeError::invalid_input("description contains no markup"));
    }
    Ok(())
}
