/// Image placeholder rewriting for generated wireframes
use regex::{Captures, Regex};

use super::{pattern, with_attribute};
use crate::Result;

pub trait ImagePlaceholderRewriter: Send + Sync {
    /// Point unusable image sources at placeholders. Never fails.
    fn rewrite(&self, html: &str) -> String;
}

/// Leaves markup untouched
pub struct NoopImages;

impl NoopImages {
    pub fn new() -> Self {
        NoopImages
    }
}

impl Default for NoopImages {
    fn default() -> Self {
        Self::new()
    }
}

impl ImagePlaceholderRewriter for NoopImages {
    fn rewrite(&self, html: &str) -> String {
        html.to_string()
    }
}

/// Replaces empty, `#`, relative and `data:` image sources with a sized
/// placeholder URL. Absolute `http(s)` and protocol-relative sources are kept.
pub struct PlaceholderImages {
    base_url: String,
    default_size: (u32, u32),
    img_tag: Regex,
    src_attr: Regex,
    width_attr: Regex,
    height_attr: Regex,
}

impl PlaceholderImages {
    pub fn new() -> Result<Self> {
        Self::with_base("https://placehold.co", (400, 300))
    }

    pub fn with_base(base_url: &str, default_size: (u32, u32)) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            default_size,
            img_tag: pattern(r"(?i)<img\b[^>]*>")?,
            src_attr: pattern(r#"(?i)(\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)'|([^\s>"']+))"#)?,
            width_attr: pattern(r#"(?i)\swidth\s*=\s*["']?(\d+)"#)?,
            height_attr: pattern(r#"(?i)\sheight\s*=\s*["']?(\d+)"#)?,
        })
    }

    fn placeholder_for(&self, tag: &str) -> String {
        let dim = |re: &Regex, fallback: u32| {
            re.captures(tag)
                .and_then(|c| c[1].parse::<u32>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(fallback)
        };
        let w = dim(&self.width_attr, self.default_size.0);
        let h = dim(&self.height_attr, self.default_size.1);
        format!("{}/{}x{}", self.base_url, w, h)
    }
}

fn needs_placeholder(src: &str) -> bool {
    let src = src.trim();
    let lower = src.to_ascii_lowercase();
    src.is_empty()
        || src == "#"
        || lower.starts_with("data:")
        || !(lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//"))
}

impl ImagePlaceholderRewriter for PlaceholderImages {
    fn rewrite(&self, html: &str) -> String {
        self.img_tag
            .replace_all(html, |caps: &Captures| {
                let tag = &caps[0];
                let placeholder = self.placeholder_for(tag);
                match self.src_attr.captures(tag) {
                    Some(src) => {
                        let value = src
                            .get(2)
                            .or_else(|| src.get(3))
                            .or_else(|| src.get(4))
                            .map(|m| m.as_str())
                            .unwrap_or("");
                        if !needs_placeholder(value) {
                            return tag.to_string();
                        }
                        let Some(whole) = src.get(0) else {
                            return tag.to_string();
                        };
                        format!(
                            "{}{}\"{}\"{}",
                            &tag[..whole.start()],
                            &src[1],
                            placeholder,
                            &tag[whole.end()..]
                        )
                    }
                    None => with_attribute(tag, "src", &placeholder),
                }
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(html: &str) -> String {
        PlaceholderImages::new().unwrap().rewrite(html)
    }

    #[test]
    fn stub_sources_are_replaced() {
        assert_eq!(rewrite(r#"<img src="" alt="x">"#), r#"<img src="https://placehold.co/400x300" alt="x">"#);
        assert_eq!(rewrite(r#"<img src='#'>"#), r#"<img src="https://placehold.co/400x300">"#);
        assert_eq!(
            rewrite(r#"<img src="images/hero.jpg" width="800" height="450">"#),
            r#"<img src="https://placehold.co/800x450" width="800" height="450">"#
        );
        assert_eq!(
            rewrite(r#"<img src="data:image/png;base64,AAAA">"#),
            r#"<img src="https://placehold.co/400x300">"#
        );
    }

    #[test]
    fn missing_src_is_added() {
        assert_eq!(rewrite("<img alt=\"a\">"), "<img alt=\"a\" src=\"https://placehold.co/400x300\">");
    }

    #[test]
    fn absolute_sources_are_kept() {
        let html = r#"<p>x</p><img src="https://cdn.test/a.png"><img src="//cdn.test/b.png">"#;
        assert_eq!(rewrite(html), html);
    }

    #[test]
    fn noop_is_identity() {
        assert_eq!(NoopImages::new().rewrite("<img src=\"\">"), "<img src=\"\">");
    }
}
