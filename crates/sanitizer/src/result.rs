// ABOUTME: HeadingReport: structural audit of one description's headings.
// ABOUTME: Serializable so batch front ends can emit it as extra record columns.

use serde::{Deserialize, Serialize};

/// Heading structure of one description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingReport {
    /// Inner markup of every `<h3>`, in document order.
    pub heading_inner_html: Vec<String>,
    /// Outer markup of every `<h3>`, in document order.
    pub heading_full_html: Vec<String>,
    /// Trimmed text of every `<h3>`.
    pub heading_texts: Vec<String>,
    pub heading_count: usize,
    pub level2_heading_count: usize,
    /// Text of the `<h3>` elements already carrying the beta class.
    pub beta_heading_texts: Vec<String>,
    pub beta_heading_count: usize,
    /// `<h3><em>…</em></h3>` merging every heading, or empty when nothing was collected.
    pub unified_heading_html: String,
    /// The description with the first heading replaced by the unified one and the rest removed.
    pub rewritten_html: String,
    /// Open/close tag tokens of the whole description.
    pub tag_sequence: Vec<String>,
}

impl HeadingReport {
    /// Heading texts joined with `" | "`.
    pub fn joined_texts(&self) -> String {
        self.heading_texts.join(" | ")
    }

    /// Beta heading texts joined with `" | "`.
    pub fn joined_beta_texts(&self) -> String {
        self.beta_heading_texts.join(" | ")
    }
}
