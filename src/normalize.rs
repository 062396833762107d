//! Snapshot normalizer: the one place collection caps are enforced.
//!
//! Every collection keeps its first N items in sampler order. No reordering,
//! no random selection, so the same rendered DOM always yields the same
//! snapshot.

use crate::dom::RenderedDom;
use crate::sampler::{self, RawExtraction};
use crate::snapshot::{RegionCount, SectionDescriptor, StructureCounts, WebsiteSnapshot};

/// Collection caps.
pub mod limits {
    pub const COLORS: usize = 20;
    pub const FONTS: usize = 5;
    pub const FONT_SIZES: usize = 10;
    pub const FONT_WEIGHTS: usize = 5;
    pub const PADDINGS: usize = 10;
    pub const MARGINS: usize = 10;
    pub const GAPS: usize = 5;
    pub const SECTIONS: usize = 15;
    pub const NAVIGATION_LINKS: usize = 20;

    pub const SECTION_BUTTONS: usize = 5;
    pub const SECTION_IMAGES: usize = 5;
    pub const SECTION_LINKS: usize = 5;
    pub const SECTION_PARAGRAPHS: usize = 2;
    pub const PARAGRAPH_CHARS: usize = 200;

    pub const REGION_SAMPLES: usize = 5;
    pub const REGION_SAMPLE_CHARS: usize = 100;
    pub const LABEL_CHARS: usize = 120;
}

/// Sample and normalize a rendered page in one step.
pub fn extract(dom: &RenderedDom) -> WebsiteSnapshot {
    normalize(sampler::sample(dom))
}

/// Truncate `s` to at most `max` characters.
pub fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((byte_idx, _)) => s[..byte_idx].to_string(),
        None => s.to_string(),
    }
}

fn cap(mut items: Vec<String>, max: usize) -> Vec<String> {
    items.truncate(max);
    items
}

fn cap_texts(items: Vec<String>, max_items: usize, max_chars: usize) -> Vec<String> {
    items
        .into_iter()
        .take(max_items)
        .map(|s| truncate_chars(&s, max_chars))
        .collect()
}

fn normalize_section(mut s: SectionDescriptor) -> SectionDescriptor {
    s.button_texts = cap_texts(s.button_texts, limits::SECTION_BUTTONS, limits::LABEL_CHARS);
    s.image_alts = cap_texts(s.image_alts, limits::SECTION_IMAGES, limits::LABEL_CHARS);
    s.link_texts = cap_texts(s.link_texts, limits::SECTION_LINKS, limits::LABEL_CHARS);
    s.paragraphs = cap_texts(s.paragraphs, limits::SECTION_PARAGRAPHS, limits::PARAGRAPH_CHARS);
    if let Some(h) = s.heading.as_mut() {
        h.text = truncate_chars(&h.text, limits::LABEL_CHARS);
    }
    s
}

fn normalize_region(r: RegionCount) -> RegionCount {
    RegionCount {
        count: r.count,
        samples: cap_texts(r.samples, limits::REGION_SAMPLES, limits::REGION_SAMPLE_CHARS),
    }
}

fn normalize_structure(s: StructureCounts) -> StructureCounts {
    StructureCounts {
        header: normalize_region(s.header),
        main: normalize_region(s.main),
        sidebar: normalize_region(s.sidebar),
        footer: normalize_region(s.footer),
        buttons: normalize_region(s.buttons),
        forms: normalize_region(s.forms),
        images: normalize_region(s.images),
        links: normalize_region(s.links),
    }
}

/// Apply every cap to a raw extraction.
pub(crate) fn normalize(raw: RawExtraction) -> WebsiteSnapshot {
    let mut typography = raw.typography;
    typography.fonts = cap(typography.fonts, limits::FONTS);
    typography.sizes = cap(typography.sizes, limits::FONT_SIZES);
    typography.weights = cap(typography.weights, limits::FONT_WEIGHTS);

    let mut spacing = raw.spacing;
    spacing.paddings = cap(spacing.paddings, limits::PADDINGS);
    spacing.margins = cap(spacing.margins, limits::MARGINS);
    spacing.gaps = cap(spacing.gaps, limits::GAPS);

    let sections = raw
        .sections
        .into_iter()
        .take(limits::SECTIONS)
        .map(normalize_section)
        .collect();

    let navigation_links = raw
        .navigation_links
        .into_iter()
        .take(limits::NAVIGATION_LINKS)
        .map(|mut l| {
            l.text = truncate_chars(&l.text, limits::LABEL_CHARS);
            l
        })
        .collect();

    WebsiteSnapshot {
        title: raw.title,
        source_url: raw.source_url,
        color_palette: cap(raw.colors, limits::COLORS),
        typography,
        spacing,
        hierarchy: raw.hierarchy,
        sections,
        navigation_links,
        structure_counts: normalize_structure(raw.structure_counts),
        layout_patterns: raw.layout_patterns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::DomNode;

    fn busy_page() -> RenderedDom {
        let mut dom = RenderedDom::new("Busy", "https://busy.test/");
        let html = dom.push(None, DomNode::new("html"));
        let body = dom.push(Some(html), DomNode::new("body"));
        let nav = dom.push(Some(body), DomNode::new("nav"));
        for i in 0..30 {
            dom.push(Some(nav), DomNode::new("a").with_text(&format!("Link {}", i)));
        }
        for i in 0..25 {
            let section = dom.push(
                Some(body),
                DomNode::new("section")
                    .with_style("background-color", &format!("rgb({}, 0, 0)", i + 1))
                    .with_style("padding", &format!("{}px", i + 1))
                    .with_style("margin", &format!("{}px auto", i + 1))
                    .with_style("gap", &format!("{}px", i + 1)),
            );
            for b in 0..8 {
                dom.push(Some(section), DomNode::new("button").with_text(&format!("B{}", b)));
            }
            dom.push(Some(section), DomNode::new("p").with_text(&"x".repeat(450)));
            dom.push(Some(section), DomNode::new("p").with_text("second"));
            dom.push(Some(section), DomNode::new("p").with_text("third"));
            dom.push(
                Some(section),
                DomNode::new("h2")
                    .with_style("font-size", &format!("{}px", 10 + i))
                    .with_style("font-family", &format!("Family {}, sans-serif", i))
                    .with_style("font-weight", &(100 * (i % 9 + 1)).to_string()),
            );
        }
        dom
    }

    #[test]
    fn caps_hold_on_busy_pages() {
        let snap = extract(&busy_page());
        assert_eq!(snap.color_palette().len(), limits::COLORS);
        assert_eq!(snap.sections().len(), limits::SECTIONS);
        assert_eq!(snap.navigation_links().len(), limits::NAVIGATION_LINKS);
        assert_eq!(snap.typography().sizes.len(), limits::FONT_SIZES);
        assert_eq!(snap.typography().fonts.len(), limits::FONTS);
        assert_eq!(snap.typography().weights.len(), limits::FONT_WEIGHTS);
        assert_eq!(snap.spacing().paddings.len(), limits::PADDINGS);
        assert_eq!(snap.spacing().margins.len(), limits::MARGINS);
        assert_eq!(snap.spacing().gaps.len(), limits::GAPS);

        let first = &snap.sections()[0];
        assert_eq!(first.button_count, 8);
        assert_eq!(first.button_texts.len(), limits::SECTION_BUTTONS);
        assert_eq!(first.paragraphs.len(), limits::SECTION_PARAGRAPHS);
        assert_eq!(first.paragraphs[0].chars().count(), limits::PARAGRAPH_CHARS);
        assert_eq!(first.paragraphs[1], "second");
    }

    #[test]
    fn caps_keep_first_items_in_order() {
        let snap = extract(&busy_page());
        assert_eq!(snap.navigation_links()[0].text, "Link 0");
        assert_eq!(snap.navigation_links()[19].text, "Link 19");
        assert_eq!(snap.color_palette()[0], "rgb(1, 0, 0)");
        assert_eq!(snap.typography().fonts[4], "Family 4, sans-serif");
        assert_eq!(snap.typography().weights, vec!["100", "200", "300", "400", "500"]);
        assert_eq!(snap.spacing().gaps[0], "1px");
        assert_eq!(snap.sections()[14].index, 14);
    }

    #[test]
    fn extraction_is_deterministic() {
        let dom = busy_page();
        let a = extract(&dom);
        let b = extract(&dom);
        assert_eq!(a, b);
        assert_eq!(a.to_json(), b.to_json());
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn truncation_counts_characters() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }
}
