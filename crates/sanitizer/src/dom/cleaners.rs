// ABOUTME: Tree-rewriting passes that turn vendor markup into the whitelisted catalog subset.
// ABOUTME: Container conversion, attribute filtering, pruning, flattening, heading wrapping, image wrapping, beta tagging.

use std::fmt;

use super::brs::reduce_break_runs;
use super::tags::{self, IMAGE, ITALIC, LIST_ITEM, PARAGRAPH, RULE};
use super::tree::{is_blank, Fragment, NodeData, NodeId, TreeError};
use crate::options::{BetaScope, Options};

/// One step of the cleaning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    TagRewrite,
    AttributeFilter,
    EmptyPrune,
    Flatten,
    HeadingNormalize,
    RunReduce,
    ImageWrap,
    ParagraphPrune,
    ClassTag,
}

impl Pass {
    /// Fixed execution order; later passes rely on the output of earlier ones.
    pub const ORDER: [Pass; 9] = [
        Pass::TagRewrite,
        Pass::AttributeFilter,
        Pass::EmptyPrune,
        Pass::Flatten,
        Pass::HeadingNormalize,
        Pass::RunReduce,
        Pass::ImageWrap,
        Pass::ParagraphPrune,
        Pass::ClassTag,
    ];

    pub fn apply(self, frag: &mut Fragment, opts: &Options) -> Result<(), TreeError> {
        match self {
            Pass::TagRewrite => convert_containers(frag),
            Pass::AttributeFilter => filter_attributes(frag, opts),
            Pass::EmptyPrune => prune_empty(frag, opts),
            Pass::Flatten => flatten_paragraphs(frag, opts),
            Pass::HeadingNormalize => normalize_headings(frag, opts),
            Pass::RunReduce => reduce_break_runs(frag),
            Pass::ImageWrap => wrap_images(frag),
            Pass::ParagraphPrune => prune_paragraphs(frag),
            Pass::ClassTag => tag_beta(frag, opts),
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Pass::TagRewrite => "tag-rewrite",
            Pass::AttributeFilter => "attribute-filter",
            Pass::EmptyPrune => "empty-prune",
            Pass::Flatten => "flatten",
            Pass::HeadingNormalize => "heading-normalize",
            Pass::RunReduce => "run-reduce",
            Pass::ImageWrap => "image-wrap",
            Pass::ParagraphPrune => "paragraph-prune",
            Pass::ClassTag => "class-tag",
        };
        write!(f, "{}", s)
    }
}

/// Turn span/div/font into paragraphs when they hold only inline content, else dissolve them.
///
/// A preserved block counts as inline only when its root element may sit in a paragraph.
pub fn convert_containers(frag: &mut Fragment) -> Result<(), TreeError> {
    for id in frag.elements() {
        if !frag.name(id).is_some_and(tags::is_convertible) {
            continue;
        }
        let inline_only = frag.children(id).iter().all(|&c| match frag.data(c) {
            Some(NodeData::Element(el)) => tags::is_inline(&el.name),
            Some(NodeData::Preserved(i)) => frag.preserved().get(*i).is_some_and(|b| b.is_phrasing()),
            _ => true,
        });
        if inline_only {
            frag.rename(id, PARAGRAPH)?;
        } else {
            frag.unwrap(id)?;
        }
    }
    Ok(())
}

/// Strip attributes outside the tag's whitelist and dissolve tags outside the whitelist.
pub fn filter_attributes(frag: &mut Fragment, opts: &Options) -> Result<(), TreeError> {
    for id in frag.elements() {
        let Some(name) = frag.name(id).map(str::to_string) else {
            continue;
        };
        if !opts.is_allowed_tag(&name) {
            frag.unwrap(id)?;
            continue;
        }
        if let Some(el) = frag.element_mut(id) {
            el.retain_attrs(|attr| opts.is_allowed_attr(&name, attr));
        }
    }
    Ok(())
}

/// Check whether a whitelisted element holds nothing worth keeping.
pub fn is_empty_element(frag: &Fragment, id: NodeId) -> bool {
    let Some(el) = frag.element(id) else {
        return false;
    };
    if el.name == IMAGE {
        return el.attr("src").map_or(true, is_blank);
    }
    if tags::is_never_empty(&el.name) {
        return false;
    }
    let has_element_child = frag
        .children(id)
        .iter()
        .any(|&c| frag.element(c).is_some());
    !has_element_child && !frag.has_content(id)
}

/// Remove empty whitelisted elements, children first, sparing anything holding an image.
pub fn prune_empty(frag: &mut Fragment, opts: &Options) -> Result<(), TreeError> {
    for id in frag.elements().into_iter().rev() {
        if !frag.is_attached(id) {
            continue;
        }
        let allowed = frag.name(id).is_some_and(|n| opts.is_allowed_tag(n));
        if !allowed || !is_empty_element(frag, id) {
            continue;
        }
        if frag.has_descendant_named(id, IMAGE) {
            continue;
        }
        frag.detach(id)?;
    }
    Ok(())
}

/// Unwrap paragraphs nested in paragraphs, headings or list items, then lift rules out of paragraphs.
pub fn flatten_paragraphs(frag: &mut Fragment, opts: &Options) -> Result<(), TreeError> {
    for id in frag.elements_named(&[PARAGRAPH]) {
        let nested = frag.ancestors(id).any(|a| {
            frag.name(a)
                .is_some_and(|n| n == PARAGRAPH || n == LIST_ITEM || opts.is_heading(n))
        });
        if nested {
            frag.unwrap(id)?;
        }
    }

    // A parser closes an open <p> at <hr>, so a rule never stays inside one.
    for rule in frag.elements_named(&[RULE]) {
        let para = frag.ancestors(rule).find(|&a| frag.is_named(a, PARAGRAPH));
        if let Some(para) = para {
            lift_out(frag, para, rule, Landing::Bare)?;
        }
    }
    Ok(())
}

/// Dissolve bold inside headings, then wrap the heading content in a single `<em>`.
pub fn normalize_headings(frag: &mut Fragment, opts: &Options) -> Result<(), TreeError> {
    let names: Vec<&str> = opts.heading_tags.iter().map(String::as_str).collect();
    for heading in frag.elements_named(&names) {
        for d in frag.descendants(heading) {
            if frag.name(d).is_some_and(tags::is_bold) {
                frag.unwrap(d)?;
            }
        }

        let children = frag.children(heading).to_vec();
        if let [only] = children.as_slice() {
            if frag.is_named(*only, ITALIC) {
                continue;
            }
        }
        let em = frag.create_element(ITALIC);
        for child in children {
            frag.append(em, child)?;
        }
        frag.append(heading, em)?;
    }
    Ok(())
}

/// Give every image a paragraph of its own.
///
/// An image already inside a paragraph with other content is lifted out of
/// it, splitting the paragraph and any inline wrappers around the image, so
/// paragraphs never end up nested.
pub fn wrap_images(frag: &mut Fragment) -> Result<(), TreeError> {
    for img in frag.elements_named(&[IMAGE]) {
        if frag.parent(img).is_none() {
            continue;
        }
        let para = frag.ancestors(img).find(|&a| frag.is_named(a, PARAGRAPH));
        let Some(para) = para else {
            let p = frag.create_element(PARAGRAPH);
            frag.insert_before(img, p)?;
            frag.append(p, img)?;
            continue;
        };
        if !stands_alone(frag, para, img) {
            lift_out(frag, para, img, Landing::OwnParagraph)?;
        }
    }
    Ok(())
}

/// True when everything in `para` besides `img` and its wrappers is blank text.
fn stands_alone(frag: &Fragment, para: NodeId, img: NodeId) -> bool {
    let wrappers: Vec<NodeId> = frag.ancestors(img).take_while(|&a| a != para).collect();
    frag.descendants(para).into_iter().all(|d| {
        d == img
            || wrappers.contains(&d)
            || matches!(frag.data(d), Some(NodeData::Text(t)) if is_blank(t))
    })
}

/// Where a node lifted out of a paragraph lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Landing {
    /// A new paragraph holding copies of the node's inline wrappers.
    OwnParagraph,
    /// Directly after the paragraph, without wrappers.
    Bare,
}

/// Move `target` out of `para`, keeping document order.
///
/// Content before `target` stays in `para`; content after it moves to a new
/// trailing paragraph. Each inline wrapper between `para` and `target` is
/// copied onto the trailing side, and wrappers left empty are removed.
fn lift_out(
    frag: &mut Fragment,
    para: NodeId,
    target: NodeId,
    landing: Landing,
) -> Result<(), TreeError> {
    let mut wrappers: Vec<NodeId> = frag.ancestors(target).take_while(|&a| a != para).collect();
    wrappers.reverse();

    // Trailing side: a paragraph with one wrapper copy per level.
    let tail = frag.create_element(PARAGRAPH);
    let mut tails = vec![tail];
    for &w in &wrappers {
        let copy = frag.clone_element(w)?;
        if let Some(&outer) = tails.last() {
            frag.append(outer, copy)?;
        }
        tails.push(copy);
    }

    let mut levels = vec![para];
    levels.extend(&wrappers);
    for (depth, (&parent, &tail_level)) in levels.iter().zip(&tails).enumerate() {
        let on_path = wrappers.get(depth).copied().unwrap_or(target);
        let children = frag.children(parent).to_vec();
        let index = children
            .iter()
            .position(|&c| c == on_path)
            .ok_or(TreeError::Orphan(on_path))?;
        for &c in &children[index + 1..] {
            frag.append(tail_level, c)?;
        }
    }

    let anchor = match landing {
        Landing::OwnParagraph => {
            let holder = frag.create_element(PARAGRAPH);
            let mut inner = holder;
            for &w in &wrappers {
                let copy = frag.clone_element(w)?;
                frag.append(inner, copy)?;
                inner = copy;
            }
            frag.append(inner, target)?;
            frag.insert_after(para, holder)?;
            holder
        }
        Landing::Bare => {
            frag.insert_after(para, target)?;
            target
        }
    };

    for &w in wrappers.iter().rev().chain(tails[1..].iter().rev()) {
        if is_empty_element(frag, w) {
            frag.detach(w)?;
        }
    }
    if !frag.children(tail).is_empty() {
        frag.insert_after(anchor, tail)?;
    }
    Ok(())
}

/// Remove paragraphs with no text and no image.
pub fn prune_paragraphs(frag: &mut Fragment) -> Result<(), TreeError> {
    for p in frag.elements_named(&[PARAGRAPH]).into_iter().rev() {
        if !frag.is_attached(p) {
            continue;
        }
        if !frag.has_content(p) && !frag.has_descendant_named(p, IMAGE) {
            frag.detach(p)?;
        }
    }
    Ok(())
}

/// Append the `<tag><suffix>` marker class.
pub fn tag_beta(frag: &mut Fragment, opts: &Options) -> Result<(), TreeError> {
    for id in frag.elements() {
        let Some(name) = frag.name(id).map(str::to_string) else {
            continue;
        };
        if opts.beta_scope == BetaScope::Whitelisted && !opts.is_allowed_tag(&name) {
            continue;
        }
        let class = opts.beta_class(&name);
        if let Some(el) = frag.element_mut(id) {
            el.add_class(&class);
        }
    }
    Ok(())
}
