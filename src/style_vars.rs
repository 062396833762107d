//! Style variable synthesizer.
//!
//! Turns a snapshot into named CSS custom properties (`--color-1`,
//! `--font-1`, `--fontsize-1`, `--padding-1`, `--gap-1`, ...) plus heading
//! rules. Indices are 1-based positions in the already capped collections.

use serde::Serialize;

use crate::snapshot::{HeadingLevel, WebsiteSnapshot};

/// Token families, in the order they are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenCategory {
    Color,
    Font,
    FontSize,
    Padding,
    Gap,
}

impl TokenCategory {
    pub const ALL: [TokenCategory; 5] = [
        TokenCategory::Color,
        TokenCategory::Font,
        TokenCategory::FontSize,
        TokenCategory::Padding,
        TokenCategory::Gap,
    ];

    pub fn prefix(&self) -> &'static str {
        match self {
            TokenCategory::Color => "color",
            TokenCategory::Font => "font",
            TokenCategory::FontSize => "fontsize",
            TokenCategory::Padding => "padding",
            TokenCategory::Gap => "gap",
        }
    }
}

/// One named value, e.g. `color-2 = rgb(10, 20, 30)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleToken {
    pub category: TokenCategory,
    /// 1-based
    pub index: usize,
    pub value: String,
}

impl StyleToken {
    /// `color-2`
    pub fn name(&self) -> String {
        format!("{}-{}", self.category.prefix(), self.index)
    }

    /// `var(--color-2)`
    pub fn reference(&self) -> String {
        format!("var(--{})", self.name())
    }
}

/// CSS rule for one heading level.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingRule {
    pub tag: &'static str,
    pub font_size: String,
    pub font_weight: String,
    pub font_family: Option<String>,
    pub color: Option<String>,
    pub line_height: Option<String>,
    /// True when the page had no heading at this level
    pub from_baseline: bool,
}

impl HeadingRule {
    fn to_css(&self) -> String {
        let mut decls = vec![
            format!("font-size: {};", self.font_size),
            format!("font-weight: {};", self.font_weight),
        ];
        if let Some(f) = &self.font_family {
            decls.push(format!("font-family: {};", f));
        }
        if let Some(c) = &self.color {
            decls.push(format!("color: {};", c));
        }
        if let Some(l) = &self.line_height {
            decls.push(format!("line-height: {};", l));
        }
        format!("{} {{ {} }}", self.tag, decls.join(" "))
    }
}

/// Fallbacks used when a heading level is absent from the page.
const HEADING_BASELINES: [(&str, &str, &str); 3] = [
    ("h1", "48px", "700"),
    ("h2", "32px", "600"),
    ("h3", "24px", "600"),
];

/// Named style tokens plus heading rules for one request.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StyleVariableSet {
    pub tokens: Vec<StyleToken>,
    pub heading_rules: Vec<HeadingRule>,
}

impl StyleVariableSet {
    /// Tokens of one category, in index order.
    pub fn pool(&self, category: TokenCategory) -> Vec<&StyleToken> {
        self.tokens.iter().filter(|t| t.category == category).collect()
    }

    pub fn pool_size(&self, category: TokenCategory) -> usize {
        self.tokens.iter().filter(|t| t.category == category).count()
    }

    pub fn get(&self, category: TokenCategory, index: usize) -> Option<&StyleToken> {
        self.tokens
            .iter()
            .find(|t| t.category == category && t.index == index)
    }

    /// Render as a `:root` custom-property block followed by heading rules.
    pub fn to_css(&self) -> String {
        let mut out = String::from("/* Extracted design tokens */\n:root {\n");
        for t in &self.tokens {
            out.push_str(&format!("  --{}: {};\n", t.name(), t.value));
        }
        out.push_str("}\n");
        for rule in &self.heading_rules {
            out.push_str(&rule.to_css());
            out.push('\n');
        }
        out
    }
}

fn numbered(category: TokenCategory, values: &[String]) -> impl Iterator<Item = StyleToken> + '_ {
    values.iter().enumerate().map(move |(i, v)| StyleToken {
        category,
        index: i + 1,
        value: v.clone(),
    })
}

fn non_empty(v: &str) -> Option<String> {
    let v = v.trim();
    (!v.is_empty()).then(|| v.to_string())
}

fn heading_rule(tag: &'static str, size: &str, weight: &str, level: &HeadingLevel) -> HeadingRule {
    match &level.first_style {
        Some(style) => HeadingRule {
            tag,
            font_size: non_empty(style.get("font-size")).unwrap_or_else(|| size.to_string()),
            font_weight: non_empty(style.get("font-weight")).unwrap_or_else(|| weight.to_string()),
            font_family: non_empty(style.get("font-family")),
            color: non_empty(style.get("color")),
            line_height: non_empty(style.get("line-height")),
            from_baseline: false,
        },
        None => HeadingRule {
            tag,
            font_size: size.to_string(),
            font_weight: weight.to_string(),
            font_family: None,
            color: None,
            line_height: None,
            from_baseline: true,
        },
    }
}

/// Build the variable set for `snapshot`.
pub fn synthesize(snapshot: &WebsiteSnapshot) -> StyleVariableSet {
    let typography = snapshot.typography();
    let spacing = snapshot.spacing();

    let tokens = numbered(TokenCategory::Color, snapshot.color_palette())
        .chain(numbered(TokenCategory::Font, &typography.fonts))
        .chain(numbered(TokenCategory::FontSize, &typography.sizes))
        .chain(numbered(TokenCategory::Padding, &spacing.paddings))
        .chain(numbered(TokenCategory::Gap, &spacing.gaps))
        .collect();

    let levels = snapshot.hierarchy().levels();
    let heading_rules = HEADING_BASELINES
        .iter()
        .zip(levels.iter())
        .map(|(&(tag, size, weight), (_, level))| heading_rule(tag, size, weight, level))
        .collect();

    StyleVariableSet {
        tokens,
        heading_rules,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::{DomNode, RenderedDom};
    use crate::normalize::extract;

    fn snapshot() -> WebsiteSnapshot {
        let mut dom = RenderedDom::new("t", "https://t.test/");
        let html = dom.push(None, DomNode::new("html"));
        let body = dom.push(
            Some(html),
            DomNode::new("body")
                .with_style("color", "rgb(1, 2, 3)")
                .with_style("background-color", "rgb(250, 250, 250)"),
        );
        let main = dom.push(Some(body), DomNode::new("main").with_style("padding", "24px"));
        dom.push(
            Some(main),
            DomNode::new("h2")
                .with_style("font-size", "30px")
                .with_style("font-weight", "500")
                .with_style("font-family", "Georgia, serif"),
        );
        dom.push(Some(main), DomNode::new("div").with_style("gap", "12px"));
        extract(&dom)
    }

    #[test]
    fn tokens_are_one_based_in_collection_order() {
        let vars = synthesize(&snapshot());
        let colors: Vec<String> = vars.pool(TokenCategory::Color).iter().map(|t| t.name()).collect();
        assert_eq!(colors, vec!["color-1", "color-2"]);
        assert_eq!(vars.get(TokenCategory::Color, 1).unwrap().value, "rgb(250, 250, 250)");
        assert_eq!(vars.get(TokenCategory::Font, 1).unwrap().value, "Georgia, serif");
        assert_eq!(vars.get(TokenCategory::Padding, 1).unwrap().reference(), "var(--padding-1)");
        assert_eq!(vars.pool_size(TokenCategory::Gap), 1);
        assert_eq!(vars.pool_size(TokenCategory::FontSize), 1);
    }

    #[test]
    fn headings_fall_back_to_baselines() {
        let vars = synthesize(&snapshot());
        let h1 = &vars.heading_rules[0];
        assert!(h1.from_baseline);
        assert_eq!((h1.font_size.as_str(), h1.font_weight.as_str()), ("48px", "700"));

        let h2 = &vars.heading_rules[1];
        assert!(!h2.from_baseline);
        assert_eq!(h2.font_size, "30px");
        assert_eq!(h2.font_family.as_deref(), Some("Georgia, serif"));

        let h3 = &vars.heading_rules[2];
        assert_eq!((h3.font_size.as_str(), h3.font_weight.as_str()), ("24px", "600"));
    }

    #[test]
    fn css_contains_root_block_and_heading_rules() {
        let css = synthesize(&snapshot()).to_css();
        assert!(css.contains(":root {"));
        assert!(css.contains("  --color-1: rgb(250, 250, 250);"));
        assert!(css.contains("  --gap-1: 12px;"));
        assert!(css.contains("h1 { font-size: 48px; font-weight: 700; }"));
        assert!(css.contains("h2 { font-size: 30px; font-weight: 500; font-family: Georgia, serif; }"));
    }

    #[test]
    fn synthesis_is_pure() {
        let snap = snapshot();
        assert_eq!(synthesize(&snap), synthesize(&snap));
    }
}
