// ABOUTME: Opaque block matching for vendor info blocks and embedded frames.
// ABOUTME: Compiles configured CSS rules once and finds the outermost matches in a parsed document.

//! Opaque block preservation.
//!
//! Blocks matched here are swapped for inert marker nodes while the fragment
//! is imported, so no cleaning pass can touch them. The recorded markup is
//! spliced back in at serialization.

use scraper::{Html, Selector};

use crate::dom::tree::OpaqueMatches;
use crate::error::SanitizeError;
use crate::options::OpaqueRule;

/// A rule with its selector compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub category: String,
    selector: Selector,
}

/// Finds opaque subtrees according to an ordered rule list.
#[derive(Debug, Clone, Default)]
pub struct BlockPreserver {
    rules: Vec<CompiledRule>,
}

impl BlockPreserver {
    /// Compiles every rule; an unparsable selector is a configuration error.
    pub fn compile(rules: &[OpaqueRule]) -> Result<Self, SanitizeError> {
        let rules = rules
            .iter()
            .map(|rule| {
                Selector::parse(&rule.selector)
                    .map(|selector| CompiledRule {
                        category: rule.category.clone(),
                        selector,
                    })
                    .map_err(|e| {
                        SanitizeError::config(format!(
                            "invalid selector {:?} for {}: {}",
                            rule.selector, rule.category, e
                        ))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Maps every matching element to its category; the first rule wins on overlap.
    ///
    /// Nested matches are kept in the map but never reached during import,
    /// because the enclosing block is captured whole.
    pub fn find<'a>(&'a self, doc: &Html) -> OpaqueMatches<'a> {
        let mut matches = OpaqueMatches::new();
        for rule in &self.rules {
            for el in doc.select(&rule.selector) {
                matches.entry(el.id()).or_insert(rule.category.as_str());
            }
        }
        matches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::tree::Fragment;
    use crate::options::Options;
    use pretty_assertions::assert_eq;

    fn preserve(html: &str) -> Fragment {
        let preserver = BlockPreserver::compile(&Options::default().opaque_blocks).unwrap();
        let doc = Html::parse_fragment(html);
        Fragment::from_html(&doc, &preserver.find(&doc), 64).unwrap()
    }

    #[test]
    fn replaces_blocks_with_markers_in_document_order() {
        let frag = preserve(
            r#"<div class="product-info"><b>A</b></div><p>x</p><iframe src="v1"></iframe><iframe src="v2"></iframe>"#,
        );
        let blocks = frag.preserved();
        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[0].placeholder(), "___PRODUCT_INFO_PLACEHOLDER_0___");
        assert_eq!(blocks[0].html, r#"<div class="product-info"><b>A</b></div>"#);
        assert_eq!(blocks[1].placeholder(), "___IFRAME_TAG_PLACEHOLDER_0___");
        assert_eq!(blocks[2].placeholder(), "___IFRAME_TAG_PLACEHOLDER_1___");
        assert_eq!(frag.elements_named(&["p"]).len(), 1);
        assert!(frag.elements_named(&["div", "iframe", "b"]).is_empty());
    }

    #[test]
    fn nested_matches_stay_inside_the_outer_block() {
        let frag = preserve(
            r#"<div class="fx-iframeContainer"><iframe src="v"></iframe></div>"#,
        );
        let blocks = frag.preserved();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].category, "IFRAME_CONTAINER");
        assert_eq!(
            frag.to_html(),
            r#"<div class="fx-iframeContainer"><iframe src="v"></iframe></div>"#
        );
    }

    #[test]
    fn invalid_selector_is_a_config_error() {
        let rules = vec![OpaqueRule::new("BROKEN", "div[[")];
        let err = BlockPreserver::compile(&rules).unwrap_err();
        assert!(err.is_config());
    }
}
