// ABOUTME: Main library entry point for the catalog description sanitizer.
// ABOUTME: Re-exports the public API: Sanitizer, SanitizerBuilder, Options, SanitizeError, HeadingReport.

//! Catalog sanitizer - cleans product description HTML against a whitelist.
//!
//! Descriptions are parsed into an editable tree, opaque blocks (product-info
//! panels, iframe embeds) are set aside, a fixed sequence of passes rewrites
//! the rest, and the result is minified with every surviving element tagged
//! with a beta marker class. Any failure returns the input unchanged.
//!
//! # Example
//!
//! ```
//! use catalog_sanitizer::Sanitizer;
//!
//! let sanitizer = Sanitizer::builder().build().expect("default options are valid");
//! let html = sanitizer.sanitize(r#"<div><img src="a.jpg"></div>"#, Some("SKU-1"));
//! assert_eq!(html, r#"<p class="p-beta"><img src="a.jpg" class="img-beta"></p>"#);
//! ```

pub mod dom;
pub mod error;
pub mod extractors;
pub mod logging;
pub mod options;
pub mod result;
pub mod sanitizer;

use once_cell::sync::Lazy;

pub use crate::dom::cleaners::Pass;
pub use crate::error::{ErrorCode, SanitizeError, Stage};
pub use crate::extractors::headings::{extract_heading_data, HeadingExtractor};
pub use crate::logging::{Logger, NoopLogger, TracingLogger};
pub use crate::options::{BetaScope, HeadingJoin, OpaqueRule, Options, SanitizerBuilder};
pub use crate::result::HeadingReport;
pub use crate::sanitizer::Sanitizer;

static DEFAULT: Lazy<Result<Sanitizer, SanitizeError>> = Lazy::new(|| Sanitizer::builder().build());

/// Sanitize with the default whitelist, returning `raw` unchanged on any failure.
pub fn sanitize(raw: &str, product_id: Option<&str>) -> String {
    match DEFAULT.as_ref() {
        Ok(sanitizer) => sanitizer.sanitize(raw, product_id),
        Err(err) => {
            tracing::error!(product_id = product_id.unwrap_or("-"), "{}", err);
            raw.to_string()
        }
    }
}
