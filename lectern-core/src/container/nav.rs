//! Navigation parsing: legacy NCX and the modern XHTML nav document
//!
//! Both parsers produce the same raw tree of labels and unresolved `src`
//! references; resolution against the manifest happens in the loader.

use ego_tree::NodeRef;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use scraper::{ElementRef, Html, Node};

/// One navigation point before its target is resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct NavPoint {
    pub label: String,
    /// Reference as written in the navigation document
    pub src: Option<String>,
    pub children: Vec<NavPoint>,
}

#[derive(Debug)]
pub(crate) enum NavParseError {
    Xml(String),
    TooDeep(usize),
}

/// Parse an NCX document's `navMap`
pub(crate) fn parse_ncx(content: &str, max_depth: usize) -> Result<Vec<NavPoint>, NavParseError> {
    let mut reader = Reader::from_str(content);
    reader.config_mut().trim_text(true);

    // The bottom of the stack collects top-level points.
    let mut stack: Vec<NavPoint> = vec![NavPoint {
        label: String::new(),
        src: None,
        children: Vec::new(),
    }];
    let mut in_label = false;
    let mut in_nav_map = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| NavParseError::Xml(e.to_string()))?;
        match event {
            Event::Start(e) => match e.local_name().as_ref() {
                b"navMap" => in_nav_map = true,
                b"navPoint" if in_nav_map => {
                    if stack.len() > max_depth {
                        return Err(NavParseError::TooDeep(max_depth));
                    }
                    stack.push(NavPoint {
                        label: String::new(),
                        src: None,
                        children: Vec::new(),
                    });
                }
                b"text" if in_nav_map => in_label = true,
                b"content" if in_nav_map => {
                    if let Some(point) = stack.last_mut() {
                        point.src = src_attr(&e);
                    }
                }
                _ => {}
            },
            Event::Empty(e) if in_nav_map && e.local_name().as_ref() == b"content" => {
                if let Some(point) = stack.last_mut() {
                    point.src = src_attr(&e);
                }
            }
            Event::Text(e) if in_label => {
                let text = e
                    .unescape()
                    .map(|t| t.into_owned())
                    .unwrap_or_else(|_| String::from_utf8_lossy(&e).into_owned());
                if let Some(point) = stack.last_mut() {
                    point.label.push_str(&text);
                }
            }
            Event::End(e) => match e.local_name().as_ref() {
                b"text" => in_label = false,
                b"navMap" => in_nav_map = false,
                b"navPoint" if stack.len() > 1 => {
                    if let Some(mut point) = stack.pop() {
                        point.label = point.label.trim().to_string();
                        if let Some(parent) = stack.last_mut() {
                            parent.children.push(point);
                        }
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(stack.swap_remove(0).children)
}

fn src_attr(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"src")
        .map(|a| {
            a.unescape_value()
                .map(|v| v.into_owned())
                .unwrap_or_else(|_| String::from_utf8_lossy(&a.value).into_owned())
        })
}

/// Parse an XHTML navigation document's `toc` nav
pub(crate) fn parse_nav_document(
    content: &str,
    max_depth: usize,
) -> Result<Vec<NavPoint>, NavParseError> {
    let document = Html::parse_document(content);
    let navs: Vec<ElementRef> = document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == "nav")
        .collect();
    let toc_nav = navs
        .iter()
        .find(|nav| {
            nav.value().attrs().any(|(name, value)| {
                name.ends_with("type") && value.split_whitespace().any(|v| v == "toc")
            })
        })
        .or_else(|| navs.first());

    let Some(nav) = toc_nav else {
        return Ok(Vec::new());
    };

    match child_element(**nav, "ol") {
        Some(list) => parse_nav_list(list, 1, max_depth),
        None => Ok(Vec::new()),
    }
}

fn parse_nav_list(
    list: NodeRef<'_, Node>,
    depth: usize,
    max_depth: usize,
) -> Result<Vec<NavPoint>, NavParseError> {
    if depth > max_depth {
        return Err(NavParseError::TooDeep(max_depth));
    }

    let mut points = Vec::new();
    for item in list.children() {
        let Some(li) = ElementRef::wrap(item) else {
            continue;
        };
        if li.value().name() != "li" {
            continue;
        }

        let label_el = child_element(item, "a").or_else(|| child_element(item, "span"));
        let (label, src) = match label_el.and_then(ElementRef::wrap) {
            Some(el) => (
                el.text().collect::<String>(),
                el.value().attr("href").map(str::to_string),
            ),
            None => (String::new(), None),
        };

        let children = match child_element(item, "ol") {
            Some(nested) => parse_nav_list(nested, depth + 1, max_depth)?,
            None => Vec::new(),
        };

        points.push(NavPoint {
            label: collapse_whitespace(&label),
            src,
            children,
        });
    }
    Ok(points)
}

fn child_element<'a>(node: NodeRef<'a, Node>, name: &str) -> Option<NodeRef<'a, Node>> {
    node.children().find(|c| {
        c.value()
            .as_element()
            .map(|el| el.name() == name)
            .unwrap_or(false)
    })
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
