//! HTML/XHTML chapter normalization

use crate::container::path;
use crate::types::{Block, Inline, LinkTarget, Target};
use ego_tree::NodeRef;
use scraper::node::Element;
use scraper::{ElementRef, Html, Node};
use std::collections::HashSet;

/// Elements dropped together with everything inside them
const SKIPPED: &[&str] = &[
    "script", "style", "noscript", "template", "iframe", "video", "audio", "object", "embed",
    "form", "button", "input", "select", "textarea", "nav", "head", "link", "meta", "title",
];

/// Elements that stay inside a paragraph
const INLINE: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "big", "br", "cite", "code", "data", "del", "dfn", "em",
    "font", "i", "ins", "kbd", "mark", "q", "rb", "rp", "rt", "ruby", "s", "samp", "small",
    "span", "strike", "strong", "sub", "sup", "time", "tt", "u", "var", "wbr",
];

fn is_skipped(name: &str) -> bool {
    SKIPPED.contains(&name)
}

fn is_inline(name: &str) -> bool {
    INLINE.contains(&name)
}

/// Normalizes one markup document. Holds the document's own href so that
/// relative links and image sources resolve to archive paths.
pub(crate) struct HtmlNormalizer<'a> {
    href: &'a str,
    dir: &'a str,
}

impl<'a> HtmlNormalizer<'a> {
    pub fn new(href: &'a str) -> Self {
        Self {
            href,
            dir: path::parent_dir(href),
        }
    }

    /// Convert a document to blocks plus the ids it defines
    pub fn normalize(&self, html: &str) -> (Vec<Block>, Vec<String>) {
        let document = Html::parse_document(html);
        let root = document.root_element();

        let body = root
            .descendants()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "body")
            .unwrap_or(root);

        let blocks = self.flow_to_blocks(*body, None);
        let anchors = self.collect_anchors(*body);
        (blocks, anchors)
    }

    /// Element ids in document order, skipping removed subtrees
    fn collect_anchors(&self, node: NodeRef<'_, Node>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut anchors = Vec::new();
        let mut stack = vec![node];

        while let Some(current) = stack.pop() {
            if let Some(el) = current.value().as_element() {
                if is_skipped(el.name()) {
                    continue;
                }
                for id in [el.attr("id"), anchor_name(el)].into_iter().flatten() {
                    if seen.insert(id.to_string()) {
                        anchors.push(id.to_string());
                    }
                }
            }
            // reversed so the stack pops in document order
            let children: Vec<_> = current.children().collect();
            stack.extend(children.into_iter().rev());
        }

        anchors
    }

    /// Convert mixed content (text, inline and block elements) to blocks.
    /// Runs of inline content become paragraphs.
    fn flow_to_blocks(&self, node: NodeRef<'_, Node>, lead_anchor: Option<&str>) -> Vec<Block> {
        let mut blocks = Vec::new();
        let mut pending: Vec<Inline> = lead_anchor
            .map(|id| vec![Inline::Anchor(id.to_string())])
            .unwrap_or_default();

        for child in node.children() {
            match child.value() {
                Node::Text(text) => pending.push(Inline::Text(collapse(text))),
                Node::Element(el) => {
                    let name = el.name();
                    if is_skipped(name) {
                        continue;
                    }
                    if is_inline(name) {
                        pending.extend(self.element_to_inlines(el, child));
                    } else {
                        flush_paragraph(&mut pending, &mut blocks);
                        blocks.extend(self.element_to_blocks(el, child));
                    }
                }
                _ => {}
            }
        }

        flush_paragraph(&mut pending, &mut blocks);
        blocks
    }

    /// Convert a block-level element
    fn element_to_blocks(&self, element: &Element, node: NodeRef<'_, Node>) -> Vec<Block> {
        let tag = element.name();
        let id = element.attr("id");

        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                let level = tag[1..].parse::<u8>().unwrap_or(1);
                let content = trim_inlines(self.children_to_inlines(node));
                vec![Block::Header {
                    level,
                    content,
                    anchor: id.map(str::to_string),
                }]
            }
            "p" => self.flow_to_blocks(node, id),
            "ul" | "ol" => {
                let mut items = Vec::new();
                for child in node.children() {
                    if let Some(el) = child.value().as_element() {
                        if el.name() == "li" {
                            items.push(self.flow_to_blocks(child, el.attr("id")));
                        }
                    }
                }
                if items.is_empty() {
                    return Vec::new();
                }
                with_anchor(
                    id,
                    Block::List {
                        items,
                        ordered: tag == "ol",
                    },
                )
            }
            "blockquote" => with_anchor(id, Block::Blockquote(self.flow_to_blocks(node, None))),
            "pre" => with_anchor(id, Block::Preformatted(text_content(node))),
            "hr" => vec![Block::ThematicBreak],
            "img" => self.image(element).into_iter().collect(),
            "svg" => node
                .descendants()
                .filter_map(|d| d.value().as_element())
                .filter(|el| el.name() == "image")
                .filter_map(|el| self.image(el))
                .collect(),
            _ => {
                // Generic container: keep its content, and its id if it has one
                let content = self.flow_to_blocks(node, None);
                match id {
                    Some(id) => vec![Block::Section {
                        anchor: Some(id.to_string()),
                        content,
                    }],
                    None => content,
                }
            }
        }
    }

    fn image(&self, element: &Element) -> Option<Block> {
        let src = element
            .attr("src")
            .or_else(|| element.attr("href"))
            .or_else(|| element.attr("xlink:href"))
            .or_else(|| {
                element
                    .attrs()
                    .find(|(name, _)| name.ends_with("href"))
                    .map(|(_, v)| v)
            })?;
        let href = self.resolve_resource(src);
        let alt = element.attr("alt").unwrap_or_default().to_string();
        Some(Block::Image { href, alt })
    }

    /// Convert children to inline elements
    fn children_to_inlines(&self, node: NodeRef<'_, Node>) -> Vec<Inline> {
        let mut inlines = Vec::new();
        for child in node.children() {
            match child.value() {
                Node::Text(text) => inlines.push(Inline::Text(collapse(text))),
                Node::Element(el) if !is_skipped(el.name()) => {
                    inlines.extend(self.element_to_inlines(el, child));
                }
                _ => {}
            }
        }
        inlines
    }

    /// Convert an element met in inline context
    fn element_to_inlines(&self, element: &Element, node: NodeRef<'_, Node>) -> Vec<Inline> {
        let tag = element.name();
        let mut out = Vec::new();

        if tag != "a" {
            if let Some(id) = element.attr("id") {
                out.push(Inline::Anchor(id.to_string()));
            }
        }

        match tag {
            "b" | "strong" => out.push(Inline::Bold(self.children_to_inlines(node))),
            "i" | "em" | "cite" | "dfn" | "var" => {
                out.push(Inline::Italic(self.children_to_inlines(node)))
            }
            "code" | "kbd" | "samp" | "tt" => out.push(Inline::Code(text_content(node))),
            "sup" => out.push(Inline::Superscript(self.children_to_inlines(node))),
            "sub" => out.push(Inline::Subscript(self.children_to_inlines(node))),
            "s" | "strike" | "del" => out.push(Inline::Strikethrough(self.children_to_inlines(node))),
            "br" => out.push(Inline::Break),
            "rp" | "rt" => {}
            "a" => {
                for id in [element.attr("id"), anchor_name(element)].into_iter().flatten() {
                    out.push(Inline::Anchor(id.to_string()));
                }
                let children = self.children_to_inlines(node);
                match element.attr("href") {
                    Some(href) if !href.trim().is_empty() => out.push(Inline::Link {
                        children,
                        target: self.resolve_link(href),
                    }),
                    _ => out.extend(children),
                }
            }
            // span, font, u, and block elements nested in inline context
            _ => out.extend(self.children_to_inlines(node)),
        }

        out
    }

    /// Resolve a link relative to this document
    fn resolve_link(&self, raw: &str) -> LinkTarget {
        let raw = raw.trim();
        if path::has_scheme(raw) {
            return LinkTarget::External(raw.to_string());
        }
        let parsed = Target::parse(raw);
        let href = if parsed.href.is_empty() {
            self.href.to_string()
        } else {
            path::resolve(self.dir, &parsed.href)
        };
        LinkTarget::Internal(Target {
            href,
            fragment: parsed.fragment,
        })
    }

    fn resolve_resource(&self, raw: &str) -> String {
        let raw = raw.trim();
        if path::has_scheme(raw) {
            raw.to_string()
        } else {
            path::resolve(self.dir, Target::parse(raw).href.as_str())
        }
    }
}

/// Legacy `<a name="...">` anchors
fn anchor_name(element: &Element) -> Option<&str> {
    if element.name() == "a" {
        element.attr("name")
    } else {
        None
    }
}

fn with_anchor(id: Option<&str>, block: Block) -> Vec<Block> {
    match id {
        Some(id) => vec![Block::Section {
            anchor: Some(id.to_string()),
            content: vec![block],
        }],
        None => vec![block],
    }
}

/// Get text content of a node, whitespace preserved
fn text_content(node: NodeRef<'_, Node>) -> String {
    let mut text = String::new();
    for descendant in node.descendants() {
        if let Node::Text(t) = descendant.value() {
            text.push_str(t);
        }
    }
    text
}

/// Collapse whitespace runs to single spaces, keeping edge spaces
fn collapse(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

/// Merge adjacent text runs, trim the edges of the run and drop empty text
fn trim_inlines(inlines: Vec<Inline>) -> Vec<Inline> {
    let mut merged: Vec<Inline> = Vec::with_capacity(inlines.len());
    for inline in inlines {
        if let (Some(Inline::Text(prev)), Inline::Text(next)) = (merged.last_mut(), &inline) {
            if prev.ends_with(' ') && next.starts_with(' ') {
                prev.push_str(&next[1..]);
            } else {
                prev.push_str(next);
            }
            continue;
        }
        merged.push(inline);
    }

    if let Some(Inline::Text(first)) = merged.iter_mut().find(|i| !matches!(i, Inline::Anchor(_))) {
        *first = first.trim_start().to_string();
    }
    if let Some(Inline::Text(last)) = merged.iter_mut().rev().find(|i| !matches!(i, Inline::Anchor(_))) {
        *last = last.trim_end().to_string();
    }

    merged.retain(|i| !matches!(i, Inline::Text(t) if t.is_empty()));
    merged
}

fn has_content(inlines: &[Inline]) -> bool {
    inlines.iter().any(|i| match i {
        Inline::Text(t) => !t.trim().is_empty(),
        _ => true,
    })
}

fn flush_paragraph(pending: &mut Vec<Inline>, blocks: &mut Vec<Block>) {
    if pending.is_empty() {
        return;
    }
    let inlines = trim_inlines(std::mem::take(pending));
    if has_content(&inlines) {
        blocks.push(Block::Paragraph(inlines));
    }
}
