//! Post-generation collaborators: accessibility checking and image placeholders.
//!
//! Both sit behind small traits so the pipeline can be driven with fakes in
//! tests. Each ships a simple default and a noop variant.

pub mod accessibility;
pub mod images;

pub use accessibility::{
    AccessibilityChecker, AccessibilityIssue, AccessibilityReport, BasicAccessibilityChecker,
    NoopAccessibilityChecker,
};
pub use images::{ImagePlaceholderRewriter, NoopImages, PlaceholderImages};

use regex::Regex;

use crate::{Error, Result};

pub(crate) fn pattern(p: &str) -> Result<Regex> {
    Regex::new(p).map_err(|e| Error::ConfigError(format!("Bad pattern {}: {}", p, e)))
}

/// Insert ` name="value"` at the end of a start tag, before `>` or `/>`.
pub(crate) fn with_attribute(tag: &str, name: &str, value: &str) -> String {
    let (head, close) = match tag.strip_suffix("/>") {
        Some(head) => (head.trim_end(), " />"),
        None => (tag.strip_suffix('>').unwrap_or(tag).trim_end(), ">"),
    };
    format!("{} {}=\"{}\"{}", head, name, value, close)
}
