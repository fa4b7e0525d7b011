//! Normalized chapter content tree

use super::Target;
use serde::{Deserialize, Serialize};

/// Block-level content element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Block {
    /// Heading (h1-h6)
    Header {
        level: u8,
        content: Vec<Inline>,
        anchor: Option<String>,
    },

    /// Paragraph of text
    Paragraph(Vec<Inline>),

    /// Ordered or unordered list
    List {
        items: Vec<Vec<Block>>,
        ordered: bool,
    },

    /// Image, `href` resolved to an archive path
    Image { href: String, alt: String },

    /// Preformatted text, whitespace preserved
    Preformatted(String),

    /// Block quote
    Blockquote(Vec<Block>),

    /// Grouping container (div, section, ...) that carries an anchor
    Section {
        anchor: Option<String>,
        content: Vec<Block>,
    },

    /// Horizontal rule / thematic break
    ThematicBreak,
}

/// Where a link points
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkTarget {
    /// Another location inside the book
    Internal(Target),

    /// Anything with a URI scheme (http, mailto, ...)
    External(String),
}

/// Inline content element
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Inline {
    /// Plain text
    Text(String),

    /// Bold/strong text
    Bold(Vec<Inline>),

    /// Italic/emphasized text
    Italic(Vec<Inline>),

    /// Inline code
    Code(String),

    /// Hyperlink
    Link {
        children: Vec<Inline>,
        target: LinkTarget,
    },

    /// Superscript text
    Superscript(Vec<Inline>),

    /// Subscript text
    Subscript(Vec<Inline>),

    /// Strikethrough text
    Strikethrough(Vec<Inline>),

    /// Inline anchor (an element id with no block of its own)
    Anchor(String),

    /// Line break
    Break,
}

impl Inline {
    /// Create a plain text inline
    pub fn text(s: impl Into<String>) -> Self {
        Inline::Text(s.into())
    }

    /// Create a bold inline
    pub fn bold(children: Vec<Inline>) -> Self {
        Inline::Bold(children)
    }

    /// Create an italic inline
    pub fn italic(children: Vec<Inline>) -> Self {
        Inline::Italic(children)
    }

    /// Create a link to another place in the book
    pub fn internal_link(children: Vec<Inline>, target: Target) -> Self {
        Inline::Link {
            children,
            target: LinkTarget::Internal(target),
        }
    }

    fn write_text(&self, out: &mut String) {
        match self {
            Inline::Text(s) | Inline::Code(s) => out.push_str(s),
            Inline::Bold(children)
            | Inline::Italic(children)
            | Inline::Superscript(children)
            | Inline::Subscript(children)
            | Inline::Strikethrough(children)
            | Inline::Link { children, .. } => inlines_to_text(children, out),
            Inline::Anchor(_) => {}
            Inline::Break => out.push('\n'),
        }
    }

    fn write_html(&self, out: &mut String) {
        match self {
            Inline::Text(s) => out.push_str(&html_escape::encode_text(s)),
            Inline::Code(s) => {
                out.push_str("<code>");
                out.push_str(&html_escape::encode_text(s));
                out.push_str("</code>");
            }
            Inline::Bold(children) => wrap_inlines("strong", children, out),
            Inline::Italic(children) => wrap_inlines("em", children, out),
            Inline::Superscript(children) => wrap_inlines("sup", children, out),
            Inline::Subscript(children) => wrap_inlines("sub", children, out),
            Inline::Strikethrough(children) => wrap_inlines("s", children, out),
            Inline::Link { children, target } => {
                let href = match target {
                    LinkTarget::Internal(t) => t.to_string(),
                    LinkTarget::External(url) => url.clone(),
                };
                out.push_str("<a href=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(&href));
                out.push_str("\">");
                inlines_to_html(children, out);
                out.push_str("</a>");
            }
            Inline::Anchor(id) => {
                out.push_str("<span id=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(id));
                out.push_str("\"></span>");
            }
            Inline::Break => out.push_str("<br/>"),
        }
    }
}

impl Block {
    /// Create a paragraph from inline elements
    pub fn paragraph(content: Vec<Inline>) -> Self {
        Block::Paragraph(content)
    }

    /// Create a header
    pub fn header(level: u8, content: Vec<Inline>) -> Self {
        Block::Header {
            level: level.clamp(1, 6),
            content,
            anchor: None,
        }
    }

    /// Plain text of the heading, if this block is one
    pub fn heading_text(&self) -> Option<String> {
        match self {
            Block::Header { content, .. } => {
                let mut out = String::new();
                inlines_to_text(content, &mut out);
                Some(out)
            }
            Block::Section { content, .. } => content.iter().find_map(Block::heading_text),
            _ => None,
        }
    }

    pub(crate) fn write_text(&self, out: &mut String) {
        match self {
            Block::Header { content, .. } | Block::Paragraph(content) => {
                inlines_to_text(content, out);
                out.push_str("\n\n");
            }
            Block::List { items, ordered } => {
                for (i, item) in items.iter().enumerate() {
                    if *ordered {
                        out.push_str(&format!("{}. ", i + 1));
                    } else {
                        out.push_str("- ");
                    }
                    let mut inner = String::new();
                    for block in item {
                        block.write_text(&mut inner);
                    }
                    out.push_str(inner.trim_end());
                    out.push('\n');
                }
                out.push('\n');
            }
            Block::Image { alt, .. } => {
                if !alt.is_empty() {
                    out.push_str(&format!("[{}]\n\n", alt));
                }
            }
            Block::Preformatted(code) => {
                out.push_str(code);
                out.push_str("\n\n");
            }
            Block::Blockquote(inner) | Block::Section { content: inner, .. } => {
                for block in inner {
                    block.write_text(out);
                }
            }
            Block::ThematicBreak => out.push_str("* * *\n\n"),
        }
    }

    pub(crate) fn write_html(&self, out: &mut String) {
        match self {
            Block::Header {
                level,
                content,
                anchor,
            } => {
                out.push_str(&format!("<h{}", level));
                push_id(anchor.as_deref(), out);
                out.push('>');
                inlines_to_html(content, out);
                out.push_str(&format!("</h{}>", level));
            }
            Block::Paragraph(content) => wrap_inlines("p", content, out),
            Block::List { items, ordered } => {
                let tag = if *ordered { "ol" } else { "ul" };
                out.push_str(&format!("<{}>", tag));
                for item in items {
                    out.push_str("<li>");
                    for block in item {
                        block.write_html(out);
                    }
                    out.push_str("</li>");
                }
                out.push_str(&format!("</{}>", tag));
            }
            Block::Image { href, alt } => {
                out.push_str("<img src=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(href));
                out.push_str("\" alt=\"");
                out.push_str(&html_escape::encode_double_quoted_attribute(alt));
                out.push_str("\"/>");
            }
            Block::Preformatted(code) => {
                out.push_str("<pre>");
                out.push_str(&html_escape::encode_text(code));
                out.push_str("</pre>");
            }
            Block::Blockquote(inner) => {
                out.push_str("<blockquote>");
                for block in inner {
                    block.write_html(out);
                }
                out.push_str("</blockquote>");
            }
            Block::Section { anchor, content } => {
                out.push_str("<div");
                push_id(anchor.as_deref(), out);
                out.push('>');
                for block in content {
                    block.write_html(out);
                }
                out.push_str("</div>");
            }
            Block::ThematicBreak => out.push_str("<hr/>"),
        }
    }
}

fn inlines_to_text(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        inline.write_text(out);
    }
}

fn inlines_to_html(inlines: &[Inline], out: &mut String) {
    for inline in inlines {
        inline.write_html(out);
    }
}

fn wrap_inlines(tag: &str, children: &[Inline], out: &mut String) {
    out.push_str(&format!("<{}>", tag));
    inlines_to_html(children, out);
    out.push_str(&format!("</{}>", tag));
}

fn push_id(anchor: Option<&str>, out: &mut String) {
    if let Some(id) = anchor {
        out.push_str(" id=\"");
        out.push_str(&html_escape::encode_double_quoted_attribute(id));
        out.push('"');
    }
}
