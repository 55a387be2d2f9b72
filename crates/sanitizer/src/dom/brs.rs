// ABOUTME: Line-break and void-element helpers shared by the sanitizer and heading unification.
// ABOUTME: Canonicalizes <br/>/<hr/> spellings, reduces adjacent <br> runs, collapses break markers in strings.

use aho_corasick::AhoCorasick;
use once_cell::sync::Lazy;
use regex::Regex;

use super::tags::LINE_BREAK;
use super::tree::{Fragment, TreeError};

/// Self-closing spellings and their canonical replacements.
const VOID_SPELLINGS: &[(&str, &str)] = &[
    ("<br/>", "<br>"),
    ("<br />", "<br>"),
    ("<hr/>", "<hr>"),
    ("<hr />", "<hr>"),
];

static VOID_MATCHER: Lazy<AhoCorasick> =
    Lazy::new(|| AhoCorasick::new(VOID_SPELLINGS.iter().map(|(from, _)| *from)).unwrap());

// Two or more breaks, optionally separated by whitespace, in any spelling
static BREAK_RUN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(?:<br\s*/?>\s*){2,}").unwrap());

static TRAILING_BREAK_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)<br\s*/?>\s*$").unwrap());

/// The canonical break marker used when joining markup.
pub const BREAK: &str = "<br>";

/// Rewrite `<br/>`, `<br />`, `<hr/>`, `<hr />` to their bare forms.
pub fn normalize_void_tags(html: &str) -> String {
    let replacements: Vec<&str> = VOID_SPELLINGS.iter().map(|(_, to)| *to).collect();
    VOID_MATCHER.replace_all(html, &replacements)
}

/// Collapse any run of consecutive break markers into a single `<br>`.
pub fn collapse_break_runs(html: &str) -> String {
    BREAK_RUN_RE.replace_all(html, BREAK).into_owned()
}

/// Remove one trailing break marker.
pub fn trim_trailing_break(html: &str) -> String {
    TRAILING_BREAK_RE.replace(html, "").into_owned()
}

/// Delete every `<br>` whose previous sibling is also a `<br>`, per parent.
pub fn reduce_break_runs(frag: &mut Fragment) -> Result<(), TreeError> {
    let mut parents = vec![super::tree::ROOT];
    parents.extend(frag.elements());

    for parent in parents {
        let mut doomed = Vec::new();
        let mut prev_was_break = false;
        for &child in frag.children(parent) {
            let is_break = frag.is_named(child, LINE_BREAK);
            if is_break && prev_was_break {
                doomed.push(child);
            }
            prev_was_break = is_break;
        }
        for id in doomed {
            frag.detach(id)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn normalizes_self_closing_spellings() {
        assert_eq!(
            normalize_void_tags("a<br/>b<br />c<hr/>d<hr />e<br>"),
            "a<br>b<br>c<hr>d<hr>e<br>"
        );
        assert_eq!(normalize_void_tags("no tags"), "no tags");
    }

    #[test]
    fn collapses_break_runs() {
        assert_eq!(collapse_break_runs("a<br><br>b"), "a<br>b");
        assert_eq!(collapse_break_runs("a<br/>\n <BR /><br>b"), "a<br>b");
        assert_eq!(collapse_break_runs("a<br>b<br>c"), "a<br>b<br>c");
    }

    #[test]
    fn trims_one_trailing_break() {
        assert_eq!(trim_trailing_break("a<br>b<br> "), "a<br>b");
        assert_eq!(trim_trailing_break("a<br>b"), "a<br>b");
    }

    #[test]
    fn reduces_adjacent_breaks_per_parent() {
        let mut frag = Fragment::parse("<p>a<br><br><br>b<br>c</p><br><br>", 64).unwrap();
        reduce_break_runs(&mut frag).unwrap();
        assert_eq!(frag.to_html(), "<p>a<br>b<br>c</p><br>");
    }

    #[test]
    fn text_between_breaks_keeps_both() {
        let mut frag = Fragment::parse("<p>a<br> <br>b</p>", 64).unwrap();
        reduce_break_runs(&mut frag).unwrap();
        assert_eq!(frag.to_html(), "<p>a<br> <br>b</p>");
    }
}
