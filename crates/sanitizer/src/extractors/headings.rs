// ABOUTME: Read-only heading extraction and unification for auditing descriptions.
// ABOUTME: Collects <h3>/<h2> data and merges every <h3> into one <h3><em> block.

//! Heading extraction.
//!
//! Works on its own parsed copy of the description and never requires the
//! sanitizer to have run first. Unification takes, per `<h3>`, the content of
//! its `<em>` child when there is one (else the heading's own content), keeps
//! line breaks as break markers, literal text as text and other elements as
//! markup, then joins everything into one `<h3><em>…</em></h3>`.

use crate::dom::brs::{collapse_break_runs, normalize_void_tags, trim_trailing_break, BREAK};
use crate::dom::tags::{self, ITALIC, LEVEL2_HEADING, LINE_BREAK, UNIFIED_HEADING};
use crate::dom::tree::{is_blank, Fragment, NodeData, NodeId, TreeError};
use crate::error::{SanitizeError, Stage};
use crate::options::{HeadingJoin, Options};
use crate::result::HeadingReport;

/// One unit of unified heading content.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Part {
    Break,
    Markup(String),
}

/// Extracts heading data according to the configured options.
#[derive(Debug, Clone, Copy)]
pub struct HeadingExtractor<'a> {
    opts: &'a Options,
}

impl<'a> HeadingExtractor<'a> {
    pub fn new(opts: &'a Options) -> Self {
        Self { opts }
    }

    /// Builds the heading report for one description.
    pub fn extract(&self, raw: &str) -> Result<HeadingReport, SanitizeError> {
        let normalized = normalize_void_tags(raw);
        let mut frag = Fragment::parse(&normalized, self.opts.max_depth)
            .map_err(|e| SanitizeError::parse(e.to_string()))?;

        let headings = frag.elements_named(&[UNIFIED_HEADING]);
        let beta_class = self.opts.beta_class(UNIFIED_HEADING);
        let beta_heading_texts: Vec<String> = headings
            .iter()
            .filter(|&&h| frag.element(h).is_some_and(|el| el.has_class(&beta_class)))
            .map(|&h| frag.text_content(h).trim().to_string())
            .collect();

        let mut report = HeadingReport {
            heading_inner_html: headings.iter().map(|&h| frag.inner_html(h)).collect(),
            heading_full_html: headings.iter().map(|&h| frag.outer_html(h)).collect(),
            heading_texts: headings
                .iter()
                .map(|&h| frag.text_content(h).trim().to_string())
                .collect(),
            heading_count: headings.len(),
            level2_heading_count: frag.elements_named(&[LEVEL2_HEADING]).len(),
            beta_heading_count: beta_heading_texts.len(),
            beta_heading_texts,
            tag_sequence: frag.tag_sequence(),
            ..Default::default()
        };

        report.unified_heading_html = self.unify(&mut frag, &headings).map_err(unify_error)?;
        if let Some(&first) = headings.first() {
            if !report.unified_heading_html.is_empty() {
                self.replace_headings(&mut frag, first, &headings, &report.unified_heading_html)
                    .map_err(unify_error)?;
            }
        }
        report.rewritten_html = frag.to_html();
        Ok(report)
    }

    /// Merge every heading's content into one `<h3><em>` block.
    fn unify(&self, frag: &mut Fragment, headings: &[NodeId]) -> Result<String, TreeError> {
        for &heading in headings {
            for d in frag.descendants(heading) {
                if frag.name(d).is_some_and(tags::is_bold) {
                    frag.unwrap(d)?;
                }
            }
        }

        let mut parts = Vec::new();
        for &heading in headings {
            let source = frag
                .children(heading)
                .iter()
                .copied()
                .find(|&c| frag.is_named(c, ITALIC))
                .unwrap_or(heading);
            for &child in frag.children(source) {
                match frag.data(child) {
                    Some(NodeData::Element(el)) if el.name == LINE_BREAK => parts.push(Part::Break),
                    Some(NodeData::Element(_)) => parts.push(Part::Markup(frag.outer_html(child))),
                    Some(NodeData::Text(t)) if !is_blank(t) => {
                        parts.push(Part::Markup(frag.outer_html(child)))
                    }
                    _ => {}
                }
            }
        }

        while parts.last() == Some(&Part::Break) {
            parts.pop();
        }
        if parts.is_empty() {
            return Ok(String::new());
        }

        let mut joined = String::new();
        for part in &parts {
            match part {
                Part::Break => joined.push_str(BREAK),
                Part::Markup(markup) => {
                    joined.push_str(markup);
                    if self.opts.heading_join == HeadingJoin::BreakBetween {
                        joined.push_str(BREAK);
                    }
                }
            }
        }
        let joined = trim_trailing_break(&collapse_break_runs(&joined));
        Ok(format!(
            "<{h}><{em}>{}</{em}></{h}>",
            joined,
            h = UNIFIED_HEADING,
            em = ITALIC
        ))
    }

    /// Put the unified block where the first heading was and drop every original heading.
    fn replace_headings(
        &self,
        frag: &mut Fragment,
        first: NodeId,
        headings: &[NodeId],
        unified: &str,
    ) -> Result<(), TreeError> {
        for node in frag.import_markup(unified, self.opts.max_depth)? {
            frag.insert_before(first, node)?;
        }
        for &heading in headings {
            frag.detach(heading)?;
        }
        Ok(())
    }
}

fn unify_error(err: TreeError) -> SanitizeError {
    SanitizeError::step(Stage::Unify, err.to_string())
}

/// Heading report using default options.
pub fn extract_heading_data(raw: &str) -> Result<HeadingReport, SanitizeError> {
    HeadingExtractor::new(&Options::default()).extract(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn bold_dissolved_and_headings_merged() {
        let report =
            extract_heading_data("<h3><strong>Size</strong></h3><p>Body</p><h3>Color</h3>").unwrap();
        assert_eq!(report.unified_heading_html, "<h3><em>SizeColor</em></h3>");
        assert_eq!(report.rewritten_html, "<h3><em>SizeColor</em></h3><p>Body</p>");
        assert_eq!(
            report.heading_inner_html,
            vec!["<strong>Size</strong>", "Color"]
        );
        assert_eq!(
            report.heading_full_html,
            vec!["<h3><strong>Size</strong></h3>", "<h3>Color</h3>"]
        );
        assert_eq!(report.heading_texts, vec!["Size", "Color"]);
        assert_eq!(report.heading_count, 2);
        assert_eq!(report.level2_heading_count, 0);
    }

    #[test]
    fn em_content_preferred_and_explicit_breaks_kept() {
        let report = extract_heading_data("<h3><em>A<br/>B</em></h3><h3>C<br></h3>").unwrap();
        assert_eq!(report.unified_heading_html, "<h3><em>A<br>BC</em></h3>");
    }

    #[test]
    fn break_between_policy_separates_fragments() {
        let opts = Options {
            heading_join: HeadingJoin::BreakBetween,
            ..Options::default()
        };
        let report = HeadingExtractor::new(&opts)
            .extract("<h3><em>A<br>B</em></h3><h3>C</h3>")
            .unwrap();
        assert_eq!(report.unified_heading_html, "<h3><em>A<br>B<br>C</em></h3>");
    }

    #[test]
    fn inline_elements_kept_as_markup() {
        let report = extract_heading_data(r#"<h3>See <a href="/x">guide</a></h3>"#).unwrap();
        assert_eq!(
            report.unified_heading_html,
            r#"<h3><em>See <a href="/x">guide</a></em></h3>"#
        );
    }

    #[test]
    fn no_headings_means_no_unified_block() {
        let report = extract_heading_data("<h2>Top</h2><p>Body</p>").unwrap();
        assert_eq!(report.unified_heading_html, "");
        assert_eq!(report.heading_count, 0);
        assert_eq!(report.level2_heading_count, 1);
        assert_eq!(report.rewritten_html, "<h2>Top</h2><p>Body</p>");
    }

    #[test]
    fn blank_headings_left_in_place() {
        let report = extract_heading_data("<h3> </h3><p>x</p>").unwrap();
        assert_eq!(report.unified_heading_html, "");
        assert_eq!(report.rewritten_html, "<h3> </h3><p>x</p>");
    }

    #[test]
    fn beta_headings_counted() {
        let report = extract_heading_data(
            r#"<h3 class="h3-beta"><em class="em-beta">New</em></h3><h3>Old</h3>"#,
        )
        .unwrap();
        assert_eq!(report.beta_heading_count, 1);
        assert_eq!(report.beta_heading_texts, vec!["New"]);
        assert_eq!(report.joined_texts(), "New | Old");
    }

    #[test]
    fn tag_sequence_taken_before_rewriting() {
        let report = extract_heading_data("<h3><strong>a</strong></h3><h3>b</h3>").unwrap();
        assert_eq!(
            report.tag_sequence,
            vec!["<h3>", "<strong>", "</strong>", "</h3>", "<h3>", "</h3>"]
        );
    }
}
