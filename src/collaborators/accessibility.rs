/// Accessibility validation and auto-fix for generated wireframes
use log::debug;
use regex::{Captures, Regex};
use serde::Serialize;

use super::{pattern, with_attribute};
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityIssue {
    /// Short rule id, e.g. `html-lang`
    pub rule: String,
    pub message: String,
    /// Whether the checker repaired it in `fixed_html`
    pub fixed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessibilityReport {
    pub is_valid: bool,
    pub issues: Vec<AccessibilityIssue>,
    /// Repaired markup, present only when at least one fix was applied
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fixed_html: Option<String>,
}

impl AccessibilityReport {
    pub fn applied_fixes(&self) -> Vec<String> {
        self.issues
            .iter()
            .filter(|i| i.fixed)
            .map(|i| i.message.clone())
            .collect()
    }
}

pub trait AccessibilityChecker: Send + Sync {
    /// Validate `html`, optionally returning repaired markup.
    fn check(&self, html: &str) -> Result<AccessibilityReport>;
}

/// Checker that reports everything as valid
pub struct NoopAccessibilityChecker;

impl NoopAccessibilityChecker {
    pub fn new() -> Self {
        NoopAccessibilityChecker
    }
}

impl Default for NoopAccessibilityChecker {
    fn default() -> Self {
        Self::new()
    }
}

impl AccessibilityChecker for NoopAccessibilityChecker {
    fn check(&self, _html: &str) -> Result<AccessibilityReport> {
        Ok(AccessibilityReport {
            is_valid: true,
            issues: Vec::new(),
            fixed_html: None,
        })
    }
}

/// Small rule set: document language, image alt text, button names.
///
/// Missing `lang` and `alt` attributes are repaired; unnamed buttons are only
/// reported since there is no text to invent.
pub struct BasicAccessibilityChecker {
    lang: String,
    html_tag: Regex,
    img_tag: Regex,
    button: Regex,
    lang_attr: Regex,
    alt_attr: Regex,
    label_attr: Regex,
    markup: Regex,
}

impl BasicAccessibilityChecker {
    pub fn new() -> Result<Self> {
        Self::with_language("en")
    }

    /// Use `lang` when adding a missing document language.
    pub fn with_language(lang: &str) -> Result<Self> {
        Ok(Self {
            lang: lang.to_string(),
            html_tag: pattern(r"(?i)<html\b[^>]*>")?,
            img_tag: pattern(r"(?i)<img\b[^>]*>")?,
            button: pattern(r"(?is)<button\b([^>]*)>(.*?)</button\s*>")?,
            lang_attr: pattern(r"(?i)\slang\s*=")?,
            alt_attr: pattern(r"(?i)\salt\s*=")?,
            label_attr: pattern(r"(?i)\s(aria-label|aria-labelledby|title)\s*=")?,
            markup: pattern(r"<[^>]*>")?,
        })
    }
}

fn issue(rule: &str, message: String, fixed: bool) -> AccessibilityIssue {
    AccessibilityIssue {
        rule: rule.to_string(),
        message,
        fixed,
    }
}

impl AccessibilityChecker for BasicAccessibilityChecker {
    fn check(&self, html: &str) -> Result<AccessibilityReport> {
        let mut issues = Vec::new();

        let mut fixed = self
            .html_tag
            .replace(html, |caps: &Captures| {
                let tag = &caps[0];
                if self.lang_attr.is_match(tag) {
                    return tag.to_string();
                }
                issues.push(issue(
                    "html-lang",
                    format!("Added lang=\"{}\" to <html>", self.lang),
                    true,
                ));
                with_attribute(tag, "lang", &self.lang)
            })
            .into_owned();

        let mut missing_alt = 0usize;
        fixed = self
            .img_tag
            .replace_all(&fixed, |caps: &Captures| {
                let tag = &caps[0];
                if self.alt_attr.is_match(tag) {
                    return tag.to_string();
                }
                missing_alt += 1;
                with_attribute(tag, "alt", "")
            })
            .into_owned();
        if missing_alt > 0 {
            issues.push(issue(
                "img-alt",
                format!("Added empty alt text to {} image(s)", missing_alt),
                true,
            ));
        }

        let unnamed = self
            .button
            .captures_iter(&fixed)
            .filter(|caps| {
                let text = self.markup.replace_all(&caps[2], "");
                text.trim().is_empty() && !self.label_attr.is_match(&caps[1])
            })
            .count();
        if unnamed > 0 {
            issues.push(issue(
                "button-name",
                format!("{} button(s) have no accessible name", unnamed),
                false,
            ));
        }

        debug!("Accessibility check found {} issue(s)", issues.len());
        let any_fixed = issues.iter().any(|i| i.fixed);
        Ok(AccessibilityReport {
            is_valid: issues.is_empty(),
            issues,
            fixed_html: any_fixed.then_some(fixed),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn noop_checker_accepts_everything() {
        let r = NoopAccessibilityChecker::new().check("<img>").unwrap();
        assert!(r.is_valid);
        assert!(r.fixed_html.is_none());
    }

    #[test]
    fn clean_markup_is_valid() {
        let html = r#"<html lang="de"><body><img src="a.png" alt="Logo"><button>Go</button></body></html>"#;
        let r = BasicAccessibilityChecker::new().unwrap().check(html).unwrap();
        assert!(r.is_valid);
        assert!(r.issues.is_empty());
        assert!(r.fixed_html.is_none());
    }

    #[test]
    fn missing_lang_and_alt_are_fixed() {
        let html = r#"<html><body><img src="a.png"><img src="b.png" alt="B"/><img src="c.png"/></body></html>"#;
        let r = BasicAccessibilityChecker::new().unwrap().check(html).unwrap();
        assert!(!r.is_valid);
        let fixed = r.fixed_html.as_deref().unwrap();
        assert!(fixed.starts_with(r#"<html lang="en">"#));
        assert!(fixed.contains(r#"<img src="a.png" alt="">"#));
        assert!(fixed.contains(r#"<img src="b.png" alt="B"/>"#));
        assert!(fixed.contains(r#"<img src="c.png" alt="" />"#));
        assert_eq!(r.applied_fixes().len(), 2);
    }

    #[test]
    fn unnamed_buttons_are_reported_not_fixed() {
        let html = r#"<html lang="en"><button><svg></svg></button><button aria-label="Close"></button></html>"#;
        let r = BasicAccessibilityChecker::new().unwrap().check(html).unwrap();
        assert!(!r.is_valid);
        assert_eq!(r.issues.len(), 1);
        assert_eq!(r.issues[0].rule, "button-name");
        assert!(r.issues[0].message.starts_with("1 button"));
        assert!(r.fixed_html.is_none());
        assert!(r.applied_fixes().is_empty());
    }
}
