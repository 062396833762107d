//! Style & structure sampler.
//!
//! Walks a [`RenderedDom`] once per concern and collects colors, typography,
//! spacing, heading hierarchy, sections, navigation links, landmark counts
//! and layout patterns. Output is unbounded and crate-private; the
//! normalizer applies every cap. Nothing here fails on missing elements:
//! an empty selection is an empty collection.

use std::collections::HashSet;

use crate::dom::{DomNode, RenderedDom};
use crate::snapshot::{
    HeadingLevel, Hierarchy, LayoutPattern, LayoutPatterns, NavigationLink, RegionCount,
    SectionDescriptor, SectionHeading, Spacing, StructureCounts, Typography,
};

/// Tags whose colors make up the palette.
const COLOR_TAGS: &[&str] = &[
    "body", "header", "nav", "main", "footer", "section", "button", "a", "h1", "h2", "h3", "h4",
    "h5", "h6", "p", "div", "article", "aside", "span", "li",
];
const COLOR_PROPS: &[&str] = &["background-color", "color", "border-color"];

const TYPOGRAPHY_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6", "p"];

/// Block-level containers sampled for spacing.
const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "header", "footer", "main", "nav", "article", "aside",
];

const HEADING_STYLE_PROPS: &[&str] = &[
    "font-family", "font-size", "font-weight", "line-height", "color", "margin",
    "letter-spacing", "text-transform",
];
const BODY_STYLE_PROPS: &[&str] = &[
    "font-family", "font-size", "font-weight", "line-height", "color", "background-color",
    "margin", "padding",
];
const SECTION_STYLE_PROPS: &[&str] = &[
    "display", "background-color", "color", "padding", "margin", "gap", "text-align",
    "flex-direction", "justify-content", "align-items", "flex-wrap", "grid-template-columns",
    "max-width", "border-radius", "box-shadow",
];
const NAV_STYLE_PROPS: &[&str] = &[
    "color", "background-color", "font-family", "font-size", "font-weight", "padding",
    "text-decoration", "text-transform",
];

/// Unbounded output of [`sample`], consumed by the normalizer.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct RawExtraction {
    pub title: String,
    pub source_url: String,
    pub colors: Vec<String>,
    pub typography: Typography,
    pub spacing: Spacing,
    pub hierarchy: Hierarchy,
    pub sections: Vec<SectionDescriptor>,
    pub navigation_links: Vec<NavigationLink>,
    pub structure_counts: StructureCounts,
    pub layout_patterns: LayoutPatterns,
}

/// Insertion-ordered set of strings.
#[derive(Default)]
struct FirstSeen {
    seen: HashSet<String>,
    items: Vec<String>,
}

impl FirstSeen {
    fn insert(&mut self, value: &str) {
        let v = value.trim();
        if v.is_empty() || self.seen.contains(v) {
            return;
        }
        self.seen.insert(v.to_string());
        self.items.push(v.to_string());
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Sample every concern from `dom`.
pub(crate) fn sample(dom: &RenderedDom) -> RawExtraction {
    RawExtraction {
        title: dom.title.trim().to_string(),
        source_url: dom.url.clone(),
        colors: sample_colors(dom),
        typography: sample_typography(dom),
        spacing: sample_spacing(dom),
        hierarchy: sample_hierarchy(dom),
        sections: sample_sections(dom),
        navigation_links: sample_navigation(dom),
        structure_counts: sample_structure(dom),
        layout_patterns: sample_layout_patterns(dom),
    }
}

fn is_visible_color(value: &str) -> bool {
    let v = value.trim().to_ascii_lowercase();
    if v.is_empty() || v == "transparent" || v == "initial" || v == "inherit" {
        return false;
    }
    let compact: String = v.chars().filter(|c| !c.is_whitespace()).collect();
    !(compact.starts_with("rgba(") && (compact.ends_with(",0)") || compact.ends_with(",0.0)")))
}

fn is_zero_spacing(value: &str) -> bool {
    let v = value.trim();
    if v.is_empty() || v == "normal" {
        return true;
    }
    v.split_whitespace().all(|part| {
        let digits = part.trim_end_matches(|c: char| c.is_ascii_alphabetic() || c == '%');
        digits.parse::<f64>().map(|n| n == 0.0).unwrap_or(false)
    })
}

fn tag_in(node: &DomNode, tags: &[&str]) -> bool {
    tags.contains(&node.tag.as_str())
}

fn sample_colors(dom: &RenderedDom) -> Vec<String> {
    let mut palette = FirstSeen::default();
    for (_, node) in dom.iter().filter(|(_, n)| tag_in(n, COLOR_TAGS)) {
        for prop in COLOR_PROPS {
            let value = node.style.get(prop);
            if is_visible_color(value) {
                palette.insert(value);
            }
        }
    }
    palette.into_vec()
}

fn sample_typography(dom: &RenderedDom) -> Typography {
    let mut fonts = FirstSeen::default();
    let mut sizes = FirstSeen::default();
    let mut weights = FirstSeen::default();
    for (_, node) in dom.iter().filter(|(_, n)| tag_in(n, TYPOGRAPHY_TAGS)) {
        fonts.insert(node.style.get("font-family"));
        sizes.insert(node.style.get("font-size"));
        weights.insert(node.style.get("font-weight"));
    }
    Typography {
        fonts: fonts.into_vec(),
        sizes: sizes.into_vec(),
        weights: weights.into_vec(),
    }
}

fn sample_spacing(dom: &RenderedDom) -> Spacing {
    let mut paddings = FirstSeen::default();
    let mut margins = FirstSeen::default();
    let mut gaps = FirstSeen::default();
    for (_, node) in dom.iter().filter(|(_, n)| tag_in(n, CONTAINER_TAGS)) {
        for (prop, set) in [
            ("padding", &mut paddings),
            ("margin", &mut margins),
            ("gap", &mut gaps),
        ] {
            let value = node.style.get(prop);
            if !is_zero_spacing(value) {
                set.insert(value);
            }
        }
    }
    Spacing {
        paddings: paddings.into_vec(),
        margins: margins.into_vec(),
        gaps: gaps.into_vec(),
    }
}

fn heading_level(dom: &RenderedDom, tag: &str) -> HeadingLevel {
    let matches = dom.select(|n| n.is(tag));
    HeadingLevel {
        count: matches.len(),
        first_style: matches
            .first()
            .and_then(|i| dom.node(*i))
            .map(|n| n.style.pick(HEADING_STYLE_PROPS)),
    }
}

fn sample_hierarchy(dom: &RenderedDom) -> Hierarchy {
    Hierarchy {
        h1: heading_level(dom, "h1"),
        h2: heading_level(dom, "h2"),
        h3: heading_level(dom, "h3"),
        body: dom
            .first_by_tag("body")
            .and_then(|i| dom.node(i))
            .map(|n| n.style.pick(BODY_STYLE_PROPS))
            .unwrap_or_default(),
    }
}

fn is_button(node: &DomNode) -> bool {
    node.is("button")
        || node.role() == Some("button")
        || (node.is("input")
            && matches!(node.attr("type"), Some("submit") | Some("button") | Some("reset")))
}

fn is_navigation(node: &DomNode) -> bool {
    node.is("nav") || node.role() == Some("navigation")
}

/// Best label for an interactive element: text, then aria-label, then value.
fn label_of(node: &DomNode) -> String {
    [
        Some(node.text.as_str()),
        node.attr("aria-label"),
        node.attr("value"),
    ]
    .into_iter()
    .flatten()
    .map(|s| s.trim())
    .find(|s| !s.is_empty())
    .unwrap_or("")
    .to_string()
}

fn non_empty(values: impl Iterator<Item = String>) -> Vec<String> {
    values.filter(|v| !v.is_empty()).collect()
}

fn is_section(dom: &RenderedDom, node: &DomNode) -> bool {
    node.is("section")
        || node.has_class_containing("section")
        || node
            .parent
            .and_then(|p| dom.node(p))
            .map(|p| p.is("main"))
            .unwrap_or(false)
}

fn describe_section(dom: &RenderedDom, index: usize, idx: usize) -> Option<SectionDescriptor> {
    let node = dom.node(idx)?;
    let mut scope = vec![idx];
    scope.extend(dom.descendants(idx));
    let nodes: Vec<&DomNode> = scope.iter().filter_map(|i| dom.node(*i)).collect();

    let heading = nodes.iter().find(|n| n.is_heading()).map(|h| SectionHeading {
        text: h.text.clone(),
        tag: h.tag.clone(),
    });
    let buttons: Vec<&&DomNode> = nodes.iter().filter(|n| is_button(n)).collect();
    let images: Vec<&&DomNode> = nodes.iter().filter(|n| n.is("img")).collect();
    let links: Vec<&&DomNode> = nodes.iter().filter(|n| n.is("a")).collect();
    let paragraphs: Vec<&&DomNode> = nodes.iter().filter(|n| n.is("p")).collect();

    Some(SectionDescriptor {
        index,
        heading,
        layout: LayoutPattern::classify(node.style.get("display")),
        style: node.style.pick(SECTION_STYLE_PROPS),
        button_count: buttons.len(),
        image_count: images.len(),
        link_count: links.len(),
        form_count: nodes.iter().filter(|n| n.is("form")).count(),
        paragraph_count: paragraphs.len(),
        list_count: nodes.iter().filter(|n| n.is("ul") || n.is("ol")).count(),
        button_texts: non_empty(buttons.iter().map(|n| label_of(n))),
        image_alts: non_empty(images.iter().map(|n| n.attr("alt").unwrap_or("").trim().to_string())),
        link_texts: non_empty(links.iter().map(|n| label_of(n))),
        paragraphs: non_empty(paragraphs.iter().map(|n| n.text.trim().to_string())),
        bounding_box: node.rect,
        class_name: node.class_name(),
        id: node.id.clone(),
    })
}

fn sample_sections(dom: &RenderedDom) -> Vec<SectionDescriptor> {
    dom.select(|n| is_section(dom, n))
        .into_iter()
        .enumerate()
        .filter_map(|(index, idx)| describe_section(dom, index, idx))
        .collect()
}

fn sample_navigation(dom: &RenderedDom) -> Vec<NavigationLink> {
    let containers: Vec<usize> = dom
        .select(is_navigation)
        .into_iter()
        .filter(|i| !dom.has_ancestor(*i, is_navigation))
        .collect();

    containers
        .into_iter()
        .flat_map(|c| dom.select_within(c, |n| n.is("a")))
        .filter_map(|i| dom.node(i))
        .map(|a| NavigationLink {
            text: label_of(a),
            href: a.attr("href").unwrap_or("").to_string(),
            bounding_box: a.rect,
            style: a.style.pick(NAV_STYLE_PROPS),
        })
        .collect()
}

fn region<F, S>(dom: &RenderedDom, pred: F, sample_of: S) -> RegionCount
where
    F: Fn(&DomNode) -> bool,
    S: Fn(&DomNode) -> String,
{
    let matches = dom.select(pred);
    RegionCount {
        count: matches.len(),
        samples: non_empty(matches.iter().filter_map(|i| dom.node(*i)).map(sample_of)),
    }
}

fn sample_structure(dom: &RenderedDom) -> StructureCounts {
    let text = |n: &DomNode| n.text.trim().to_string();
    StructureCounts {
        header: region(dom, |n| n.is("header") || n.role() == Some("banner"), text),
        main: region(dom, |n| n.is("main") || n.role() == Some("main"), text),
        sidebar: region(
            dom,
            |n| n.is("aside") || n.role() == Some("complementary") || n.has_class_containing("sidebar"),
            text,
        ),
        footer: region(dom, |n| n.is("footer") || n.role() == Some("contentinfo"), text),
        buttons: region(dom, is_button, label_of),
        forms: region(dom, |n| n.is("form"), |n| {
            n.attr("aria-label").map(|s| s.to_string()).unwrap_or_else(|| n.id.clone())
        }),
        images: region(dom, |n| n.is("img"), |n| n.attr("alt").unwrap_or("").trim().to_string()),
        links: region(dom, |n| n.is("a"), label_of),
    }
}

fn first_layout<F>(dom: &RenderedDom, pred: F) -> Option<LayoutPattern>
where
    F: Fn(&DomNode) -> bool,
{
    dom.nodes
        .iter()
        .find(|n| pred(n))
        .map(|n| LayoutPattern::classify(n.style.get("display")))
}

fn sample_layout_patterns(dom: &RenderedDom) -> LayoutPatterns {
    LayoutPatterns {
        body: first_layout(dom, |n| n.is("body")).unwrap_or(LayoutPattern::Other),
        header: first_layout(dom, |n| n.is("header") || n.role() == Some("banner")),
        main: first_layout(dom, |n| n.is("main") || n.role() == Some("main")),
    }
}
