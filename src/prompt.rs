//! Prompt compiler.
//!
//! Renders a [`WebsiteSnapshot`] into the instruction document sent to the
//! generation service. Sections always appear in the same order and every
//! enumerable fact (colors, navigation texts, button texts, headings,
//! section samples) is written out verbatim as a literal constraint. The
//! output is a pure function of its inputs: no clock, no randomness.

use crate::dom::ComputedStyle;
use crate::snapshot::{HeadingLevel, RegionCount, SectionDescriptor, WebsiteSnapshot};

/// Role and fidelity contract sent as the system message.
pub const SYSTEM_INSTRUCTION: &str = "You are an expert front-end engineer who rebuilds existing web pages as \
high-fidelity HTML/CSS wireframes. You are given a structured analysis of a real page. \
Treat every value in it as a hard constraint: copy texts verbatim, keep navigation order, \
use only the listed colors, fonts and spacing values, and reproduce each section's layout \
pattern. Never invent content or substitute generic placeholder styles. Respond with one \
complete HTML document (starting with <!DOCTYPE html>) with all CSS in a <style> element \
in the <head>, and nothing else.";

/// Request-level knobs that shape the generation options block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub design_system: String,
    pub include_responsive: bool,
    pub include_accessibility: bool,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            design_system: "microsoft".to_string(),
            include_responsive: true,
            include_accessibility: true,
        }
    }
}

/// The rendered instruction document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptDocument {
    text: String,
}

impl PromptDocument {
    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// First `max_chars` characters, with `...` appended when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let cut = crate::normalize::truncate_chars(&self.text, max_chars);
        if cut.len() < self.text.len() {
            format!("{}...", cut)
        } else {
            cut
        }
    }

    /// Whether a `## {heading}` section was rendered.
    pub fn has_section(&self, heading: &str) -> bool {
        self.text
            .lines()
            .any(|l| l.strip_prefix("## ").map(|h| h.starts_with(heading)).unwrap_or(false))
    }
}

/// Compile the snapshot into an instruction document.
pub fn compile(snapshot: &WebsiteSnapshot) -> PromptDocument {
    PromptDocument {
        text: render_sections(snapshot).join("\n\n"),
    }
}

/// Compile the snapshot and append the generation options block.
pub fn compile_with_options(snapshot: &WebsiteSnapshot, options: &PromptOptions) -> PromptDocument {
    let mut sections = render_sections(snapshot);
    sections.push(options_section(options));
    PromptDocument {
        text: sections.join("\n\n"),
    }
}

fn render_sections(snapshot: &WebsiteSnapshot) -> Vec<String> {
    [
        Some(intro_section(snapshot)),
        Some(typography_section(snapshot)),
        Some(hierarchy_section(snapshot)),
        Some(spacing_section(snapshot)),
        Some(layout_section(snapshot)),
        Some(palette_section(snapshot)),
        navigation_section(snapshot),
        Some(sections_section(snapshot)),
        Some(components_section(snapshot)),
        Some(footer_section(snapshot)),
        Some(fidelity_section(snapshot)),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn quoted(items: &[String]) -> String {
    items
        .iter()
        .map(|s| format!("\"{}\"", s))
        .collect::<Vec<_>>()
        .join(", ")
}

fn listed(items: &[String]) -> String {
    if items.is_empty() {
        "none captured".to_string()
    } else {
        items.join(" | ")
    }
}

fn style_summary(style: &ComputedStyle) -> String {
    style
        .iter()
        .map(|(k, v)| format!("{}: {}", k, v))
        .collect::<Vec<_>>()
        .join("; ")
}

fn intro_section(snapshot: &WebsiteSnapshot) -> String {
    let title = if snapshot.title().is_empty() {
        "(untitled)"
    } else {
        snapshot.title()
    };
    format!(
        "# Wireframe brief\n\nRecreate the page \"{}\" ({}) as one self-contained HTML document. \
Everything below was measured on the live page; treat it as ground truth.",
        title,
        snapshot.source_url()
    )
}

fn typography_section(snapshot: &WebsiteSnapshot) -> String {
    let t = snapshot.typography();
    format!(
        "## Typography\n- Font families (use exactly): {}\n- Font sizes: {}\n- Font weights: {}",
        listed(&t.fonts),
        listed(&t.sizes),
        listed(&t.weights)
    )
}

fn heading_line(tag: &str, level: &HeadingLevel) -> String {
    match &level.first_style {
        Some(style) if level.count > 0 => format!(
            "- {}: {} on the page; style of the first one: {}",
            tag,
            level.count,
            style_summary(style)
        ),
        _ => format!("- {}: none on the page", tag),
    }
}

fn hierarchy_section(snapshot: &WebsiteSnapshot) -> String {
    let h = snapshot.hierarchy();
    let mut lines = vec!["## Heading hierarchy".to_string()];
    lines.extend(h.levels().iter().map(|(tag, level)| heading_line(tag, level)));
    if !h.body.is_empty() {
        lines.push(format!("- body: {}", style_summary(&h.body)));
    }
    lines.join("\n")
}

fn spacing_section(snapshot: &WebsiteSnapshot) -> String {
    let s = snapshot.spacing();
    format!(
        "## Spacing\n- Paddings: {}\n- Margins: {}\n- Gaps: {}",
        listed(&s.paddings),
        listed(&s.margins),
        listed(&s.gaps)
    )
}

fn layout_section(snapshot: &WebsiteSnapshot) -> String {
    let l = snapshot.layout_patterns();
    let region = |p: Option<crate::snapshot::LayoutPattern>| {
        p.map(|p| p.as_str().to_string())
            .unwrap_or_else(|| "not present".to_string())
    };
    format!(
        "## Layout patterns\n- body: {}\n- header: {}\n- main: {}",
        l.body.as_str(),
        region(l.header),
        region(l.main)
    )
}

fn palette_section(snapshot: &WebsiteSnapshot) -> String {
    let colors = snapshot.color_palette();
    if colors.is_empty() {
        return "## Color palette\nNo colors were captured; keep the page monochrome rather than inventing a palette."
            .to_string();
    }
    let mut lines = vec![
        "## Color palette".to_string(),
        "Use this exact color palette, not generic grays:".to_string(),
    ];
    lines.extend(colors.iter().enumerate().map(|(i, c)| format!("{}. {}", i + 1, c)));
    lines.join("\n")
}

fn navigation_section(snapshot: &WebsiteSnapshot) -> Option<String> {
    let links = snapshot.navigation_links();
    if links.is_empty() {
        return None;
    }
    let mut lines = vec![
        "## Navigation".to_string(),
        format!(
            "Use these exact {} navigation texts in this exact order:",
            links.len()
        ),
    ];
    lines.extend(links.iter().enumerate().map(|(i, l)| {
        let style = style_summary(&l.style);
        let mut line = format!("{}. \"{}\" -> {}", i + 1, l.text, l.href);
        if !style.is_empty() {
            line.push_str(&format!(" ({})", style));
        }
        line
    }));
    Some(lines.join("\n"))
}

fn section_block(s: &SectionDescriptor) -> String {
    let title = match &s.heading {
        Some(h) => format!("<{}> \"{}\"", h.tag, h.text),
        None => "(no heading)".to_string(),
    };
    let mut lines = vec![format!("### Section {}: {}", s.index + 1, title)];
    lines.push(format!("- Layout: {}", s.layout.as_str()));
    if !s.class_name.is_empty() || !s.id.is_empty() {
        lines.push(format!("- Identifier: class \"{}\", id \"{}\"", s.class_name, s.id));
    }
    lines.push(format!(
        "- Size: {}x{}px",
        s.bounding_box.width.round(),
        s.bounding_box.height.round()
    ));
    if !s.style.is_empty() {
        lines.push(format!("- Style: {}", style_summary(&s.style)));
    }
    if s.has_buttons() {
        lines.push(format!("- Buttons ({}): {}", s.button_count, quoted(&s.button_texts)));
    }
    if s.has_images() {
        lines.push(format!("- Images ({}), alt texts: {}", s.image_count, quoted(&s.image_alts)));
    }
    if s.link_count > 0 {
        lines.push(format!("- Links ({}): {}", s.link_count, quoted(&s.link_texts)));
    }
    if !s.paragraphs.is_empty() {
        lines.push(format!("- Paragraph text: {}", quoted(&s.paragraphs)));
    }
    if s.has_forms() {
        lines.push(format!("- Forms: {}", s.form_count));
    }
    if s.has_lists() {
        lines.push(format!("- Lists: {}", s.list_count));
    }
    lines.join("\n")
}

fn sections_section(snapshot: &WebsiteSnapshot) -> String {
    let sections = snapshot.sections();
    if sections.is_empty() {
        return "## Sections\nNo distinct sections were detected; build the body from the landmarks in the component summary."
            .to_string();
    }
    let mut blocks = vec![format!(
        "## Sections\n{} sections, in page order. Reproduce each one with its layout and content:",
        sections.len()
    )];
    blocks.extend(sections.iter().map(section_block));
    blocks.join("\n\n")
}

fn region_line(label: &str, r: &RegionCount) -> String {
    if r.samples.is_empty() {
        format!("- {}: {}", label, r.count)
    } else {
        format!("- {}: {} (e.g. {})", label, r.count, quoted(&r.samples))
    }
}

fn components_section(snapshot: &WebsiteSnapshot) -> String {
    let c = snapshot.structure_counts();
    [
        "## Component summary".to_string(),
        region_line("Header regions", &c.header),
        region_line("Main regions", &c.main),
        region_line("Sidebars", &c.sidebar),
        region_line("Buttons", &c.buttons),
        region_line("Forms", &c.forms),
        region_line("Images", &c.images),
        region_line("Links", &c.links),
    ]
    .join("\n")
}

fn footer_section(snapshot: &WebsiteSnapshot) -> String {
    let footer = &snapshot.structure_counts().footer;
    if footer.count == 0 {
        return "## Footer\nThe page has no footer; do not add one.".to_string();
    }
    format!(
        "## Footer\nInclude {} footer region(s) with this exact text: {}",
        footer.count,
        quoted(&footer.samples)
    )
}

fn fidelity_section(snapshot: &WebsiteSnapshot) -> String {
    let mut rules = vec![
        "Use the exact text content listed above. Do not paraphrase, translate or invent copy.".to_string(),
        "Use this exact color palette, not generic grays such as #ccc, #eee or #333.".to_string(),
        "Use the exact layout pattern given for the body, header, main and every section: grid stays grid, flexbox stays flexbox.".to_string(),
        "Use the exact spacing values listed; do not round them to a different scale.".to_string(),
        "Use the listed font families, sizes and weights; do not fall back to Arial or Helvetica.".to_string(),
    ];
    if !snapshot.navigation_links().is_empty() {
        rules.push(
            "Use these exact navigation texts in this exact order; do not add, drop or reorder links."
                .to_string(),
        );
    }
    rules.push("Output only the HTML document, starting with <!DOCTYPE html>.".to_string());

    let mut lines = vec!["## Fidelity rules".to_string()];
    lines.extend(rules.iter().enumerate().map(|(i, r)| format!("{}. {}", i + 1, r)));
    lines.join("\n")
}

fn options_section(options: &PromptOptions) -> String {
    let mut lines = vec![
        "## Generation options".to_string(),
        format!(
            "- Design system: follow {} conventions only where the measurements above are silent.",
            options.design_system
        ),
    ];
    lines.push(if options.include_responsive {
        "- Responsive: add media queries so the layout collapses cleanly below 768px.".to_string()
    } else {
        "- Responsive: desktop layout only.".to_string()
    });
    if options.include_accessibility {
        lines.push(
            "- Accessibility: use semantic landmarks, alt text on every image and labels on every form control."
                .to_string(),
        );
    }
    lines.join("\n")
}
