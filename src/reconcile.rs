//! Fidelity enforcement post-processor.
//!
//! The generation service is not trusted with exact visual values, so its
//! markup is forced back toward the extracted ground truth in two steps:
//!
//! 1. **Substitution**: inside CSS contexts (`<style>` bodies and `style`
//!    attributes) every catalogue color and every `font-family` whose leading
//!    family is a catalogue font is replaced with a `var(--token)` reference.
//!    Tokens are handed out round-robin per category in document order.
//! 2. **Injection**: the style variable CSS is prepended inside the first
//!    `<style>` element after any leading `@charset`/`@import` statements
//!    (the candidate's own rules stay below it), or a new
//!    `<style>` is placed before `</head>`. Without a head a minimal
//!    `<head><style>` wrapper is inserted.
//!
//! Substitution runs on the candidate before injection so the injected token
//! definitions are never rewritten into self-references.

use std::collections::HashSet;
use std::path::Path;

use log::debug;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

use crate::style_vars::{StyleVariableSet, TokenCategory};
use crate::{Error, Result};

/// Placeholder values the generator tends to fall back on.
///
/// Loaded from JSON so it can be tuned without a rebuild:
/// `{"version": 2, "colors": ["#ccc"], "fonts": ["arial"]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericValueCatalogue {
    pub version: u32,
    /// Hex (`#ccc`) or functional (`rgb(204, 204, 204)`) colors
    pub colors: Vec<String>,
    /// Font family names, matched case-insensitively
    pub fonts: Vec<String>,
}

impl Default for GenericValueCatalogue {
    fn default() -> Self {
        let colors = [
            "#ccc", "#cccccc", "#ddd", "#dddddd", "#eee", "#eeeeee", "#e0e0e0", "#e5e5e5",
            "#f0f0f0", "#f4f4f4", "#f5f5f5", "#f8f8f8", "#fafafa", "#d3d3d3", "#999", "#999999",
            "#888", "#888888", "#666", "#666666", "#555", "#555555", "#444", "#444444", "#333",
            "#333333", "#222", "#222222", "rgb(204, 204, 204)", "rgb(221, 221, 221)",
            "rgb(238, 238, 238)", "rgb(245, 245, 245)", "rgb(153, 153, 153)",
            "rgb(102, 102, 102)", "rgb(51, 51, 51)",
        ];
        let fonts = [
            "arial", "helvetica", "helvetica neue", "sans-serif", "serif", "times new roman",
            "system-ui", "-apple-system", "blinkmacsystemfont", "segoe ui", "verdana",
        ];
        Self {
            version: 1,
            colors: colors.iter().map(|s| s.to_string()).collect(),
            fonts: fonts.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl GenericValueCatalogue {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| Error::ConfigError(format!("Invalid generic value catalogue: {}", e)))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path).map_err(|e| {
            Error::ConfigError(format!("Failed to read catalogue {}: {}", path.display(), e))
        })?;
        Self::from_json(&data)
    }
}

/// Where the variable CSS ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum InjectionSite {
    /// Prepended inside the candidate's first `<style>` element
    ExistingStyle,
    /// New `<style>` inserted before `</head>`
    BeforeHeadClose,
    /// New `<head>` inserted after the `<html>` start tag
    NewHead,
    /// New `<head>` prepended to a fragment without `<html>`
    Prepended,
}

/// One forced replacement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub category: TokenCategory,
    pub original: String,
    /// Token name, e.g. `color-2`
    pub token: String,
    /// Zero-based position in the category pool; always `< pool size`
    pub pool_index: usize,
}

/// Result of reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reconciled {
    pub html: String,
    pub substitutions: Vec<Substitution>,
    pub injection: InjectionSite,
}

/// Round-robin token dispenser shared across all CSS regions of a document.
struct Dispenser {
    pools: Vec<(TokenCategory, Vec<String>)>,
    cursors: Vec<usize>,
    log: Vec<Substitution>,
}

impl Dispenser {
    fn new(vars: &StyleVariableSet) -> Self {
        let pools: Vec<(TokenCategory, Vec<String>)> = [TokenCategory::Color, TokenCategory::Font]
            .into_iter()
            .map(|c| (c, vars.pool(c).iter().map(|t| t.name()).collect()))
            .collect();
        let cursors = vec![0; pools.len()];
        Self {
            pools,
            cursors,
            log: Vec::new(),
        }
    }

    /// Next `var(--token)` for `category`, or `None` when the pool is empty.
    fn next(&mut self, category: TokenCategory, original: &str) -> Option<String> {
        let slot = self.pools.iter().position(|(c, _)| *c == category)?;
        let pool = &self.pools[slot].1;
        if pool.is_empty() {
            return None;
        }
        let pool_index = self.cursors[slot] % pool.len();
        self.cursors[slot] += 1;
        let token = pool[pool_index].clone();
        self.log.push(Substitution {
            category,
            original: original.to_string(),
            token: token.clone(),
            pool_index,
        });
        Some(format!("var(--{})", token))
    }
}

/// Applies substitution and injection with a fixed catalogue.
pub struct Reconciler {
    catalogue: GenericValueCatalogue,
    generic_fonts: HashSet<String>,
    color_values: Option<Regex>,
    font_decl: Regex,
    style_block: Regex,
    style_attr: Regex,
    style_open: Regex,
    head_close: Regex,
    html_open: Regex,
    leading_at_rules: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::ConfigError(format!("Bad pattern {}: {}", pattern, e)))
}

/// Regex fragment matching one catalogue color as a whole token.
fn color_pattern(value: &str) -> String {
    let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.contains('(') {
        compact
            .chars()
            .map(|c| match c {
                '(' => r"\(\s*".to_string(),
                ')' => r"\s*\)".to_string(),
                ',' => r"\s*,\s*".to_string(),
                other => regex::escape(&other.to_string()),
            })
            .collect()
    } else if compact.starts_with('#') {
        format!(r"{}\b", regex::escape(&compact))
    } else {
        format!(r"\b{}\b", regex::escape(&compact))
    }
}

fn leading_family(value: &str) -> String {
    value
        .split(',')
        .next()
        .unwrap_or("")
        .trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .to_ascii_lowercase()
}

impl Reconciler {
    pub fn new(catalogue: GenericValueCatalogue) -> Result<Self> {
        let mut colors: Vec<&String> = catalogue.colors.iter().filter(|c| !c.trim().is_empty()).collect();
        // Longest first so `#cccccc` wins over `#ccc` in the alternation.
        colors.sort_by_key(|c| std::cmp::Reverse(c.len()));
        let color_values = if colors.is_empty() {
            None
        } else {
            let alternation = colors
                .iter()
                .map(|c| color_pattern(c))
                .collect::<Vec<_>>()
                .join("|");
            Some(compile(&format!("(?i)(?:{})", alternation))?)
        };

        Ok(Self {
            generic_fonts: catalogue.fonts.iter().map(|f| f.trim().to_ascii_lowercase()).collect(),
            catalogue,
            color_values,
            font_decl: compile(r"(?i)(font-family\s*:\s*)([^;}]+)")?,
            style_block: compile(r"(?is)<style\b[^>]*>(.*?)</style\s*>")?,
            style_attr: compile(r#"(?i)\sstyle\s*=\s*(?:"([^"]*)"|'([^']*)')"#)?,
            style_open: compile(r"(?i)<style\b[^>]*>")?,
            head_close: compile(r"(?i)</head\s*>")?,
            html_open: compile(r"(?i)<html\b[^>]*>")?,
            leading_at_rules: compile(r#"(?is)\A(?:\s*(?:/\*.*?\*/|@(?:charset|import)\b(?:[^;"']|"[^"]*"|'[^']*')*;))*"#)?,
        })
    }

    pub fn catalogue(&self) -> &GenericValueCatalogue {
        &self.catalogue
    }

    /// Substitute generic values, then inject the variable set.
    pub fn reconcile(&self, candidate: &str, vars: &StyleVariableSet) -> Reconciled {
        let mut dispenser = Dispenser::new(vars);
        let mut out = String::with_capacity(candidate.len() + 2048);
        let mut last = 0;
        for (start, end) in self.css_regions(candidate) {
            out.push_str(&candidate[last..start]);
            out.push_str(&self.rewrite_css(&candidate[start..end], &mut dispenser));
            last = end;
        }
        out.push_str(&candidate[last..]);

        let (html, injection) = self.inject(&out, &vars.to_css());
        debug!(
            "Reconciled markup: {} substitutions, variables injected at {:?}",
            dispenser.log.len(),
            injection
        );
        Reconciled {
            html,
            substitutions: dispenser.log,
            injection,
        }
    }

    /// Byte ranges of CSS text in document order, non-overlapping.
    fn css_regions(&self, html: &str) -> Vec<(usize, usize)> {
        let mut regions: Vec<(usize, usize)> = self
            .style_block
            .captures_iter(html)
            .filter_map(|c| c.get(1))
            .chain(
                self.style_attr
                    .captures_iter(html)
                    .filter_map(|c| c.get(1).or_else(|| c.get(2))),
            )
            .map(|m| (m.start(), m.end()))
            .collect();
        regions.sort();

        let mut out: Vec<(usize, usize)> = Vec::with_capacity(regions.len());
        for r in regions {
            match out.last() {
                Some(&(_, prev_end)) if r.0 < prev_end => continue,
                _ => out.push(r),
            }
        }
        out
    }

    fn rewrite_css(&self, css: &str, dispenser: &mut Dispenser) -> String {
        let with_colors = match &self.color_values {
            Some(re) => re
                .replace_all(css, |caps: &Captures| {
                    let original = &caps[0];
                    dispenser
                        .next(TokenCategory::Color, original)
                        .unwrap_or_else(|| original.to_string())
                })
                .into_owned(),
            None => css.to_string(),
        };

        self.font_decl
            .replace_all(&with_colors, |caps: &Captures| {
                let prefix = &caps[1];
                let value = &caps[2];
                let body = value.trim_end();
                let trailing = &value[body.len()..];
                let (families, important) = if body.to_ascii_lowercase().ends_with("!important") {
                    (body[..body.len() - "!important".len()].trim_end(), " !important")
                } else {
                    (body, "")
                };
                if !self.generic_fonts.contains(&leading_family(families)) {
                    return caps[0].to_string();
                }
                match dispenser.next(TokenCategory::Font, families) {
                    Some(reference) => format!("{}{}{}{}", prefix, reference, important, trailing),
                    None => caps[0].to_string(),
                }
            })
            .into_owned()
    }

    fn inject(&self, html: &str, css: &str) -> (String, InjectionSite) {
        if let Some(m) = self.style_open.find(html) {
            // @charset and @import must stay ahead of any other rule
            let at = m.end()
                + self
                    .leading_at_rules
                    .find(&html[m.end()..])
                    .map_or(0, |p| p.end());
            let mut out = String::with_capacity(html.len() + css.len() + 2);
            out.push_str(&html[..at]);
            out.push('\n');
            out.push_str(css);
            out.push_str(&html[at..]);
            return (out, InjectionSite::ExistingStyle);
        }

        let block = format!("<style>\n{}</style>\n", css);
        if let Some(m) = self.head_close.find(html) {
            let out = format!("{}{}{}", &html[..m.start()], block, &html[m.start()..]);
            return (out, InjectionSite::BeforeHeadClose);
        }

        let head = format!("<head>\n{}</head>\n", block);
        if let Some(m) = self.html_open.find(html) {
            let out = format!("{}\n{}{}", &html[..m.end()], head, &html[m.end()..]);
            return (out, InjectionSite::NewHead);
        }

        (format!("{}{}", head, html), InjectionSite::Prepended)
    }
}
