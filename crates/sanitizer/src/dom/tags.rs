// ABOUTME: Tag classification table consulted by the cleaning passes.
// ABOUTME: Centralizes the convertible, inline, void, bold and heading tag sets.

/// Generic containers that become `<p>` or dissolve.
const CONVERTIBLE_TAGS: &[&str] = &["span", "div", "font"];

/// Children that still allow a container to become a paragraph.
const INLINE_TAGS: &[&str] = &["strong", "em", "a", "img", "hr", "br"];

/// Bold emphasis dissolved inside headings.
const BOLD_TAGS: &[&str] = &["strong", "b"];

/// Elements a parser keeps inside an open `<p>`.
const PHRASING_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "dfn", "em", "font", "i",
    "iframe", "img", "kbd", "mark", "q", "s", "samp", "small", "span", "strong", "sub", "sup",
    "time", "u", "var", "wbr",
];

const VOID_TAGS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub const PARAGRAPH: &str = "p";
pub const IMAGE: &str = "img";
pub const LINE_BREAK: &str = "br";
pub const RULE: &str = "hr";
pub const ITALIC: &str = "em";
pub const LIST_ITEM: &str = "li";
pub const UNIFIED_HEADING: &str = "h3";
pub const LEVEL2_HEADING: &str = "h2";

/// Classification of a tag name, resolved once per lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    Convertible,
    Inline,
    Other,
}

impl TagKind {
    pub fn of(name: &str) -> Self {
        if CONVERTIBLE_TAGS.contains(&name) {
            TagKind::Convertible
        } else if INLINE_TAGS.contains(&name) {
            TagKind::Inline
        } else {
            TagKind::Other
        }
    }
}

pub fn is_convertible(name: &str) -> bool {
    TagKind::of(name) == TagKind::Convertible
}

pub fn is_inline(name: &str) -> bool {
    TagKind::of(name) == TagKind::Inline
}

pub fn is_bold(name: &str) -> bool {
    BOLD_TAGS.contains(&name)
}

pub fn is_phrasing(name: &str) -> bool {
    PHRASING_TAGS.contains(&name)
}

/// Check if tag is a void element
pub fn is_void(name: &str) -> bool {
    VOID_TAGS.contains(&name)
}

/// Elements that are never considered empty.
pub fn is_never_empty(name: &str) -> bool {
    name == LINE_BREAK || name == RULE
}
