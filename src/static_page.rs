//! Script-free rendering backend.
//!
//! Fetches the page over HTTP and parses it with `scraper`. There is no
//! layout or cascade: style comes from inline `style` attributes, inherited
//! text properties are carried down from the parent, and `display` falls back
//! to user-agent defaults. Bounding boxes are zero.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Node};

use crate::backend::{PageSession, RenderingBackend};
use crate::dom::{ComputedStyle, DomNode, RenderedDom};
use crate::{Error, RenderConfig, Result};

const CAPTURED_ATTRS: [&str; 7] = ["role", "href", "alt", "type", "src", "value", "aria-label"];
const SKIPPED_TAGS: [&str; 4] = ["script", "style", "noscript", "template"];
const INHERITED: [&str; 7] = [
    "color", "font-family", "font-size", "font-weight", "line-height", "letter-spacing",
    "text-align",
];
const MAX_TEXT: usize = 500;

/// User-agent `display` for elements without an inline override.
fn default_display(tag: &str) -> &'static str {
    match tag {
        "html" | "body" | "div" | "section" | "header" | "footer" | "main" | "nav" | "aside"
        | "article" | "p" | "h1" | "h2" | "h3" | "h4" | "h5" | "h6" | "ul" | "ol" | "form"
        | "figure" | "figcaption" | "blockquote" | "pre" | "hr" | "address" | "fieldset"
        | "dl" | "dd" | "dt" | "details" | "summary" => "block",
        "li" => "list-item",
        "head" | "title" | "meta" | "link" | "base" => "none",
        "table" => "table",
        "tr" => "table-row",
        "td" | "th" => "table-cell",
        "button" | "input" | "select" | "textarea" => "inline-block",
        _ => "inline",
    }
}

/// Parse `prop: value; prop: value` into lowercase property names.
fn parse_inline_style(decls: &str) -> Vec<(String, String)> {
    decls
        .split(';')
        .filter_map(|d| {
            let (prop, value) = d.split_once(':')?;
            let prop = prop.trim().to_ascii_lowercase();
            let value = value.trim().trim_end_matches("!important").trim();
            (!prop.is_empty() && !value.is_empty()).then(|| (prop, value.to_string()))
        })
        .collect()
}

fn collect_text(el: ElementRef<'_>, out: &mut String) {
    for child in el.children() {
        match child.value() {
            Node::Text(t) => {
                out.push_str(t);
                out.push(' ');
            }
            Node::Element(e) if !SKIPPED_TAGS.contains(&e.name()) => {
                if let Some(child_el) = ElementRef::wrap(child) {
                    collect_text(child_el, out);
                }
            }
            _ => {}
        }
    }
}

fn visible_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(el, &mut raw);
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    crate::normalize::truncate_chars(&collapsed, MAX_TEXT)
}

fn style_for(el: ElementRef<'_>, inherited: &ComputedStyle) -> ComputedStyle {
    let tag = el.value().name();
    let mut style = inherited.pick(&INHERITED);
    style.set("display", default_display(tag));
    if let Some(decls) = el.value().attr("style") {
        for (prop, value) in parse_inline_style(decls) {
            style.set(&prop, &value);
        }
    }
    style
}

fn to_node(el: ElementRef<'_>, style: ComputedStyle) -> DomNode {
    let e = el.value();
    let tag = e.name().to_ascii_lowercase();
    let mut node = DomNode::new(&tag);
    node.id = e.id().unwrap_or("").to_string();
    node.classes = e.classes().map(|c| c.to_string()).collect();
    for name in CAPTURED_ATTRS {
        if let Some(v) = e.attr(name) {
            node.attrs.insert(name.to_string(), v.to_string());
        }
    }
    if tag != "html" && tag != "body" {
        node.text = visible_text(el);
    }
    node.style = style;
    node
}

/// Reduce an HTML document to a [`RenderedDom`].
pub fn parse_html(html: &str, url: &str, max_nodes: usize) -> RenderedDom {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut dom = RenderedDom::new("", url);
    let mut stack: Vec<(ElementRef<'_>, Option<usize>, ComputedStyle)> =
        vec![(root, None, ComputedStyle::new())];
    while let Some((el, parent, inherited)) = stack.pop() {
        if dom.len() >= max_nodes {
            break;
        }
        let name = el.value().name();
        if SKIPPED_TAGS.contains(&name) {
            continue;
        }
        if name == "title" && dom.title.is_empty() {
            dom.title = el.text().collect::<String>().trim().to_string();
        }

        let style = style_for(el, &inherited);
        let idx = dom.push(parent, to_node(el, style.clone()));

        let children: Vec<ElementRef<'_>> = el.children().filter_map(ElementRef::wrap).collect();
        for child in children.into_iter().rev() {
            stack.push((child, Some(idx), style.clone()));
        }
    }
    debug!("Parsed {} elements from {}", dom.len(), url);
    dom
}

/// Fetches pages with a blocking HTTP client; no JavaScript.
pub struct StaticBackend {
    client: Client,
    config: RenderConfig,
}

impl StaticBackend {
    pub fn new(config: RenderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.navigation_timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::ConfigError(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }
}

struct StaticSession {
    html: String,
    url: String,
    max_nodes: usize,
}

impl RenderingBackend for StaticBackend {
    fn name(&self) -> &'static str {
        "static"
    }

    fn open(&self, url: &str) -> Result<Box<dyn PageSession>> {
        let res = self.client.get(url).send().map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(self.config.navigation_timeout_ms)
            } else {
                Error::LoadError(format!("HTTP GET failed: {}", e))
            }
        })?;
        let status = res.status();
        if !status.is_success() {
            return Err(Error::LoadError(format!("{} returned {}", url, status.as_u16())));
        }
        let final_url = res.url().to_string();
        let html = res
            .text()
            .map_err(|e| Error::LoadError(format!("Failed to read response body: {}", e)))?;

        Ok(Box::new(StaticSession {
            html,
            url: final_url,
            max_nodes: self.config.max_nodes,
        }))
    }
}

impl PageSession for StaticSession {
    fn capture(&mut self) -> Result<RenderedDom> {
        let dom = parse_html(&self.html, &self.url, self.max_nodes);
        if dom.is_empty() {
            return Err(Error::ExtractionError("Document has no elements".into()));
        }
        Ok(dom)
    }

    fn close(self: Box<Self>) -> Result<()> {
        Ok(())
    }
}
