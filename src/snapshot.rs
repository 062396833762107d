//! The bounded, ordered record of one page's visual and structural facts.
//!
//! A [`WebsiteSnapshot`] can only be built by the normalizer
//! ([`crate::normalize`]), which is where every collection cap is applied.
//! Downstream stages (prompt compiler, style synthesizer, response
//! assembler) read it through accessors and may assume bounded inputs.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::dom::{BoundingBox, ComputedStyle};

/// Layout classification derived from `display`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutPattern {
    Grid,
    Flexbox,
    Block,
    Other,
}

impl LayoutPattern {
    /// Classify a computed `display` value: grid beats flex beats block.
    pub fn classify(display: &str) -> Self {
        let d = display.trim().to_ascii_lowercase();
        if d.contains("grid") {
            LayoutPattern::Grid
        } else if d.contains("flex") {
            LayoutPattern::Flexbox
        } else if d == "block" || d == "flow-root" {
            LayoutPattern::Block
        } else {
            LayoutPattern::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutPattern::Grid => "grid",
            LayoutPattern::Flexbox => "flexbox",
            LayoutPattern::Block => "block",
            LayoutPattern::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Typography {
    pub fonts: Vec<String>,
    pub sizes: Vec<String>,
    pub weights: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spacing {
    pub paddings: Vec<String>,
    pub margins: Vec<String>,
    pub gaps: Vec<String>,
}

/// Count of one heading level plus the style of its first occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingLevel {
    pub count: usize,
    pub first_style: Option<ComputedStyle>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Hierarchy {
    pub h1: HeadingLevel,
    pub h2: HeadingLevel,
    pub h3: HeadingLevel,
    pub body: ComputedStyle,
}

impl Hierarchy {
    /// `(tag, level)` pairs in h1, h2, h3 order.
    pub fn levels(&self) -> [(&'static str, &HeadingLevel); 3] {
        [("h1", &self.h1), ("h2", &self.h2), ("h3", &self.h3)]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionHeading {
    pub text: String,
    pub tag: String,
}

/// One detected page section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDescriptor {
    /// Zero-based position among detected sections
    pub index: usize,
    pub heading: Option<SectionHeading>,
    pub layout: LayoutPattern,
    pub style: ComputedStyle,
    pub button_count: usize,
    pub image_count: usize,
    pub link_count: usize,
    pub form_count: usize,
    pub paragraph_count: usize,
    pub list_count: usize,
    pub button_texts: Vec<String>,
    pub image_alts: Vec<String>,
    pub link_texts: Vec<String>,
    pub paragraphs: Vec<String>,
    pub bounding_box: BoundingBox,
    pub class_name: String,
    pub id: String,
}

impl SectionDescriptor {
    pub fn has_buttons(&self) -> bool {
        self.button_count > 0
    }

    pub fn has_images(&self) -> bool {
        self.image_count > 0
    }

    pub fn has_forms(&self) -> bool {
        self.form_count > 0
    }

    pub fn has_lists(&self) -> bool {
        self.list_count > 0
    }

    /// Buttons, images, links and forms inside this section.
    pub fn component_count(&self) -> usize {
        self.button_count + self.image_count + self.link_count + self.form_count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NavigationLink {
    pub text: String,
    pub href: String,
    pub bounding_box: BoundingBox,
    pub style: ComputedStyle,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RegionCount {
    pub count: usize,
    pub samples: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct StructureCounts {
    pub header: RegionCount,
    pub main: RegionCount,
    pub sidebar: RegionCount,
    pub footer: RegionCount,
    pub buttons: RegionCount,
    pub forms: RegionCount,
    pub images: RegionCount,
    pub links: RegionCount,
}

impl StructureCounts {
    /// Number of landmark regions (header, main, sidebar, footer) on the page.
    pub fn region_count(&self) -> usize {
        self.header.count + self.main.count + self.sidebar.count + self.footer.count
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayoutPatterns {
    pub body: LayoutPattern,
    pub header: Option<LayoutPattern>,
    pub main: Option<LayoutPattern>,
}

impl Default for LayoutPatterns {
    fn default() -> Self {
        Self {
            body: LayoutPattern::Block,
            header: None,
            main: None,
        }
    }
}

/// Bounded extraction of one rendered page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WebsiteSnapshot {
    pub(crate) title: String,
    pub(crate) source_url: String,
    pub(crate) color_palette: Vec<String>,
    pub(crate) typography: Typography,
    pub(crate) spacing: Spacing,
    pub(crate) hierarchy: Hierarchy,
    pub(crate) sections: Vec<SectionDescriptor>,
    pub(crate) navigation_links: Vec<NavigationLink>,
    pub(crate) structure_counts: StructureCounts,
    pub(crate) layout_patterns: LayoutPatterns,
}

impl WebsiteSnapshot {
    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn source_url(&self) -> &str {
        &self.source_url
    }

    pub fn color_palette(&self) -> &[String] {
        &self.color_palette
    }

    pub fn typography(&self) -> &Typography {
        &self.typography
    }

    pub fn spacing(&self) -> &Spacing {
        &self.spacing
    }

    pub fn hierarchy(&self) -> &Hierarchy {
        &self.hierarchy
    }

    pub fn sections(&self) -> &[SectionDescriptor] {
        &self.sections
    }

    pub fn navigation_links(&self) -> &[NavigationLink] {
        &self.navigation_links
    }

    pub fn structure_counts(&self) -> &StructureCounts {
        &self.structure_counts
    }

    pub fn layout_patterns(&self) -> &LayoutPatterns {
        &self.layout_patterns
    }

    /// Sum of per-section component counts.
    pub fn component_count(&self) -> usize {
        self.sections.iter().map(|s| s.component_count()).sum()
    }

    /// Canonical JSON encoding.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Hex SHA-256 of the canonical JSON encoding.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.to_json().as_bytes());
        hex::encode(hasher.finalize())
    }
}
